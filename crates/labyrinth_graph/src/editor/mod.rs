//! Grid-based construction engine.
//!
//! The author selects cells on a bounded grid; grid adjacency between
//! selected cells becomes graph adjacency. Every mutation checks its
//! preconditions first and is a silent no-op when they fail, so callers get a
//! `bool` or `Option` back instead of an error. Completeness problems are
//! reported by [`LabyrinthEditor::validate`] as an [`AuthoringFailure`]
//! tagged with the step to return to.

mod cell;
mod limits;
mod step;

pub use cell::{Cell, GridPosition, PlacedItem};
pub use limits::{EditorLimits, ITEM_SLOTS};
pub use step::{AuthoringFailure, AuthoringStep};

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::wire::{LabyrinthDocument, TileDocument};
use crate::{Item, ItemId, Labyrinth, Orientation, RelationMap, Role, TileKey};

/// Corner placement of the n-th item slot inside a room.
const SLOT_ORIENTATIONS: [[Orientation; 2]; ITEM_SLOTS] = [
    [Orientation::North, Orientation::West],
    [Orientation::North, Orientation::East],
    [Orientation::South, Orientation::East],
    [Orientation::South, Orientation::West],
];

/// An item the author is asked to place.
///
/// A role-exclusive item can only be used by `exclusive_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOption {
    /// Asset reference of the item.
    pub model_name: String,
    /// Role that alone can use the item.
    #[serde(default)]
    pub exclusive_to: Option<Role>,
}

impl ItemOption {
    /// An item usable by every role.
    pub fn shared(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            exclusive_to: None,
        }
    }

    /// An item usable by one role only.
    pub fn exclusive(model_name: impl Into<String>, role: Role) -> Self {
        Self {
            model_name: model_name.into(),
            exclusive_to: Some(role),
        }
    }
}

/// Interactive builder for a labyrinth.
#[derive(Debug, Clone)]
pub struct LabyrinthEditor {
    rows: usize,
    columns: usize,
    limits: EditorLimits,
    cells: Vec<Cell>,
    next_key: TileKey,
    next_item_id: ItemId,
    seed: Option<GridPosition>,
    starts: Vec<GridPosition>,
    end: Option<GridPosition>,
    item_options: Vec<ItemOption>,
    name: String,
    mode: AuthoringStep,
}

impl LabyrinthEditor {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringFailure`] tagged [`AuthoringStep::Tiles`] when the
    /// grid is empty or exceeds the configured maximum.
    #[instrument(skip(limits))]
    pub fn new(rows: usize, columns: usize, limits: EditorLimits) -> Result<Self, AuthoringFailure> {
        if rows == 0 || columns == 0 || rows > limits.max_rows || columns > limits.max_columns {
            return Err(AuthoringFailure::new(
                AuthoringStep::Tiles,
                format!(
                    "Grid {}x{} must be between 1x1 and {}x{}",
                    rows, columns, limits.max_rows, limits.max_columns
                ),
            ));
        }

        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| Cell::new(GridPosition::new(row, column))))
            .collect();

        info!(rows, columns, "Created labyrinth editor");
        Ok(Self {
            rows,
            columns,
            limits,
            cells,
            next_key: 1,
            next_item_id: 1,
            seed: None,
            starts: Vec::new(),
            end: None,
            item_options: Vec::new(),
            name: String::new(),
            mode: AuthoringStep::Tiles,
        })
    }

    /// Supplies the items the author must place.
    pub fn with_item_options(mut self, options: Vec<ItemOption>) -> Self {
        self.item_options = options;
        self
    }

    /// Grid height.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid width.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Active limits.
    pub fn limits(&self) -> &EditorLimits {
        &self.limits
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell at a position.
    pub fn cell(&self, position: GridPosition) -> Option<&Cell> {
        self.index(position).map(|i| &self.cells[i])
    }

    /// Item options not yet placed.
    pub fn item_options(&self) -> &[ItemOption] {
        &self.item_options
    }

    /// Current labyrinth name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the labyrinth name.
    #[instrument(skip(self))]
    pub fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    /// Current authoring mode.
    pub fn mode(&self) -> AuthoringStep {
        self.mode
    }

    /// Switches authoring mode.
    pub fn set_mode(&mut self, mode: AuthoringStep) {
        debug!(from = %self.mode, to = %mode, "Switching authoring mode");
        self.mode = mode;
    }

    /// Number of selected cells.
    pub fn selected_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_selected()).count()
    }

    /// Start positions in placement order.
    pub fn start_positions(&self) -> &[GridPosition] {
        &self.starts
    }

    /// The end position, if placed.
    pub fn end_position(&self) -> Option<GridPosition> {
        self.end
    }

    /// True when the position is a start tile.
    pub fn is_start(&self, position: GridPosition) -> bool {
        self.starts.contains(&position)
    }

    /// True when the position is the end tile.
    pub fn is_end(&self, position: GridPosition) -> bool {
        self.end == Some(position)
    }

    /// True when the position may be selected next.
    pub fn is_selectable(&self, position: GridPosition) -> bool {
        self.cell(position).is_some_and(Cell::is_selectable)
    }

    /// Number of selected grid neighbors of a position.
    pub fn selected_neighbors(&self, position: GridPosition) -> usize {
        self.neighbor_positions(position)
            .filter(|p| self.is_selected(*p))
            .count()
    }

    /// Selects a cell, returning its freshly assigned relation key.
    ///
    /// Rejected unless the cell is currently selectable.
    #[instrument(skip(self))]
    pub fn select(&mut self, position: GridPosition) -> Option<TileKey> {
        let index = self.index(position)?;
        if !self.cells[index].selectable {
            debug!("Cell is not selectable");
            return None;
        }

        let key = self.next_key;
        self.next_key += 1;
        self.cells[index].relation_key = Some(key);
        if self.seed.is_none() {
            self.seed = Some(position);
        }
        self.refresh_selectable();

        debug!(key, "Cell selected");
        Some(key)
    }

    /// True when removing the cell cannot disconnect the selection and the
    /// cell carries no annotation.
    pub fn can_remove(&self, position: GridPosition) -> bool {
        let Some(cell) = self.cell(position) else {
            return false;
        };
        if !cell.is_selected() {
            return false;
        }
        if self.is_start(position) || self.is_end(position) {
            return false;
        }
        if !cell.restrictions.is_empty() || !cell.items.is_empty() {
            return false;
        }
        if self.selected_neighbors(position) > 1 {
            return false;
        }
        // The seed anchors the selection until it is the last cell standing.
        !(self.seed == Some(position) && self.selected_count() > 1)
    }

    /// Deselects a cell. The relation key is retired, never reused.
    #[instrument(skip(self))]
    pub fn remove(&mut self, position: GridPosition) -> bool {
        if !self.can_remove(position) {
            debug!("Cell cannot be removed");
            return false;
        }
        let Some(index) = self.index(position) else {
            return false;
        };

        self.cells[index].relation_key = None;
        if self.selected_count() == 0 {
            self.seed = None;
        }
        self.refresh_selectable();
        debug!("Cell removed");
        true
    }

    /// Marks a selected cell as a start tile.
    #[instrument(skip(self))]
    pub fn add_start_tile(&mut self, position: GridPosition) -> bool {
        let eligible = self.cell(position).is_some_and(|c| {
            c.is_selected()
                && c.restrictions.is_empty()
                && !self.is_end(position)
                && !self.is_start(position)
        });
        if !eligible || self.starts.len() >= self.limits.max_start_positions {
            debug!(starts = self.starts.len(), "Start tile rejected");
            return false;
        }
        self.starts.push(position);
        true
    }

    /// Clears a start tile.
    #[instrument(skip(self))]
    pub fn remove_start_tile(&mut self, position: GridPosition) -> bool {
        let before = self.starts.len();
        self.starts.retain(|p| *p != position);
        before != self.starts.len()
    }

    /// Marks a dead-end cell as the end tile, replacing any previous one.
    #[instrument(skip(self))]
    pub fn add_end_tile(&mut self, position: GridPosition) -> bool {
        let eligible = self.cell(position).is_some_and(|c| {
            c.is_selected()
                && c.restrictions.is_empty()
                && c.items.is_empty()
                && !self.is_start(position)
        });
        if !eligible || self.selected_neighbors(position) != 1 {
            debug!("End tile rejected");
            return false;
        }
        if let Some(previous) = self.end.replace(position) {
            debug!(%previous, "Replaced previous end tile");
        }
        true
    }

    /// Clears the end tile if it sits at this position.
    #[instrument(skip(self))]
    pub fn remove_end_tile(&mut self, position: GridPosition) -> bool {
        if self.is_end(position) {
            self.end = None;
            true
        } else {
            false
        }
    }

    /// Forbids a role from entering a cell.
    ///
    /// Rejected on start and end tiles, on a cell that already forbids the
    /// other role, and on a cell holding an item only `role` could use.
    #[instrument(skip(self))]
    pub fn restrict(&mut self, position: GridPosition, role: Role) -> bool {
        if self.is_start(position) || self.is_end(position) {
            debug!("Restriction rejected on start or end tile");
            return false;
        }
        let Some(index) = self.index(position) else {
            return false;
        };
        let cell = &self.cells[index];
        let conflicting = !cell.is_selected()
            || cell.restrictions.contains(&role.partner())
            || cell
                .items
                .iter()
                .any(|item| item.option.exclusive_to == Some(role));
        if conflicting {
            debug!("Restriction rejected");
            return false;
        }
        self.cells[index].restrictions.insert(role)
    }

    /// Lifts a role restriction.
    #[instrument(skip(self))]
    pub fn clear_restriction(&mut self, position: GridPosition, role: Role) -> bool {
        match self.index(position) {
            Some(index) => self.cells[index].restrictions.remove(&role),
            None => false,
        }
    }

    /// Places the item option at `option_index` on a cell, consuming it.
    ///
    /// Returns the new item's id, or `None` when the placement breaks a rule.
    #[instrument(skip(self))]
    pub fn add_item(&mut self, position: GridPosition, option_index: usize) -> Option<ItemId> {
        let option = self.item_options.get(option_index)?;
        let index = self.index(position)?;
        let cell = &self.cells[index];

        if !cell.is_selected()
            || self.is_end(position)
            || cell.items.len() >= self.limits.effective_max_items()
        {
            debug!("Item placement rejected");
            return None;
        }

        if let Some(owner) = option.exclusive_to {
            let agrees = cell.restrictions.is_empty()
                || cell.restrictions.iter().all(|r| *r == owner.partner());
            if !agrees {
                debug!(%owner, "Item exclusivity conflicts with restriction");
                return None;
            }
        }

        let slot = (0..ITEM_SLOTS).find(|s| cell.items.iter().all(|item| item.slot != *s))?;
        let option = self.item_options.remove(option_index);
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.cells[index].items.push(PlacedItem { id, option, slot });

        debug!(item = id, slot, "Item placed");
        Some(id)
    }

    /// Takes an item off a cell and returns its option to the pool.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, position: GridPosition, item: ItemId) -> bool {
        let Some(index) = self.index(position) else {
            return false;
        };
        let items = &mut self.cells[index].items;
        match items.iter().position(|p| p.id == item) {
            Some(at) => {
                let placed = items.remove(at);
                self.item_options.push(placed.option);
                true
            }
            None => false,
        }
    }

    /// Graph adjacency of the current selection, keyed by relation key.
    pub fn relation_map(&self) -> BTreeMap<TileKey, RelationMap> {
        self.cells
            .iter()
            .filter_map(|cell| {
                let key = cell.relation_key?;
                let mut relations = RelationMap::new();
                for orientation in Orientation::all() {
                    let neighbor = cell
                        .position
                        .step(orientation)
                        .and_then(|p| self.cell(p))
                        .and_then(Cell::relation_key);
                    relations.set(orientation, neighbor);
                }
                Some((key, relations))
            })
            .collect()
    }

    /// True when the selected cells form a single connected component.
    pub fn is_connected(&self) -> bool {
        let graph = self.relation_map();
        let Some(&first) = graph.keys().next() else {
            return true;
        };
        let mut visited = BTreeSet::from([first]);
        let mut queue = VecDeque::from([first]);
        while let Some(key) = queue.pop_front() {
            for next in graph[&key].neighbors() {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited.len() == graph.len()
    }

    /// Checks that the labyrinth is complete enough to save.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthoringFailure`] in authoring order.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), AuthoringFailure> {
        let selected = self.selected_count();
        if selected < self.limits.min_tiles {
            return Err(AuthoringFailure::new(
                AuthoringStep::Tiles,
                format!("Select at least {} tiles ({} selected)", self.limits.min_tiles, selected),
            ));
        }

        if self.starts.len() < self.limits.min_start_positions {
            return Err(AuthoringFailure::new(
                AuthoringStep::StartPositions,
                format!(
                    "Place at least {} start positions ({} placed)",
                    self.limits.min_start_positions,
                    self.starts.len()
                ),
            ));
        }

        match self.end {
            None => {
                return Err(AuthoringFailure::new(AuthoringStep::EndTile, "Place an end tile"));
            }
            Some(end) if self.selected_neighbors(end) != 1 => {
                return Err(AuthoringFailure::new(
                    AuthoringStep::EndTile,
                    format!("End tile {} is no longer a dead end", end),
                ));
            }
            Some(_) => {}
        }

        if !self.item_options.is_empty() {
            return Err(AuthoringFailure::new(
                AuthoringStep::Items,
                format!("{} item(s) still need a place", self.item_options.len()),
            ));
        }

        if self.name.is_empty() {
            return Err(AuthoringFailure::new(AuthoringStep::Name, "Give the labyrinth a name"));
        }

        Ok(())
    }

    /// Validates and serializes into the wire document.
    ///
    /// Grid coordinates are discarded here; only relation keys survive.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringFailure`] when [`LabyrinthEditor::validate`] fails.
    #[instrument(skip(self), fields(name = %self.name))]
    pub fn to_document(&self) -> Result<LabyrinthDocument, AuthoringFailure> {
        self.validate()?;

        let relations = self.relation_map();
        let mut tile_map = BTreeMap::new();
        for cell in self.cells.iter().filter(|c| c.is_selected()) {
            let Some(key) = cell.relation_key else {
                continue;
            };
            let objects_in_room = cell
                .items
                .iter()
                .map(|placed| {
                    Item::new(
                        placed.id,
                        placed.option.model_name.clone(),
                        SLOT_ORIENTATIONS[placed.slot].to_vec(),
                    )
                })
                .collect();
            let tile_relation_map: BTreeMap<String, Option<TileKey>> = relations
                .get(&key)
                .map(|r| r.iter().map(|(o, k)| (o.to_string(), k)).collect())
                .unwrap_or_default();

            tile_map.insert(
                key.to_string(),
                TileDocument {
                    tile_id: key,
                    objects_in_room,
                    restrictions: cell.restrictions.iter().map(ToString::to_string).collect(),
                    tile_relation_map,
                },
            );
        }

        let key_at = |position: GridPosition| self.cell(position).and_then(Cell::relation_key);
        let document = LabyrinthDocument {
            labyrinth_name: self.name.clone(),
            end_tile_key: self.end.and_then(key_at).unwrap_or_default(),
            player_start_tile_keys: self.starts.iter().filter_map(|p| key_at(*p)).collect(),
            tile_map,
        };

        info!(tiles = document.tile_map.len(), "Serialized labyrinth");
        Ok(document)
    }

    /// Validates, serializes and loads the result as a graph.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringFailure`] when the editor state is incomplete or
    /// the resulting graph fails structural validation.
    #[instrument(skip(self))]
    pub fn build(&self) -> Result<Labyrinth, AuthoringFailure> {
        let document = self.to_document()?;
        Labyrinth::from_document(&document).map_err(|e| {
            let step = match e {
                crate::ValidationError::StartTileCount { .. }
                | crate::ValidationError::DuplicateStartTile(_)
                | crate::ValidationError::RestrictedStartTile(_)
                | crate::ValidationError::StartIsEnd(_) => AuthoringStep::StartPositions,
                crate::ValidationError::UnknownEndTile(_)
                | crate::ValidationError::RestrictedEndTile(_) => AuthoringStep::EndTile,
                crate::ValidationError::UnknownRole { .. } => AuthoringStep::Restrictions,
                crate::ValidationError::ItemOrientations { .. } => AuthoringStep::Items,
                _ => AuthoringStep::Tiles,
            };
            AuthoringFailure::new(step, e.to_string())
        })
    }

    fn index(&self, position: GridPosition) -> Option<usize> {
        (position.row < self.rows && position.column < self.columns)
            .then(|| position.row * self.columns + position.column)
    }

    fn is_selected(&self, position: GridPosition) -> bool {
        self.cell(position).is_some_and(Cell::is_selected)
    }

    fn neighbor_positions(&self, position: GridPosition) -> impl Iterator<Item = GridPosition> + '_ {
        Orientation::all()
            .filter_map(move |o| position.step(o))
            .filter(|p| p.row < self.rows && p.column < self.columns)
    }

    fn refresh_selectable(&mut self) {
        let empty = self.selected_count() == 0;
        let selectable: Vec<bool> = self
            .cells
            .iter()
            .map(|cell| {
                !cell.is_selected()
                    && (empty || self.selected_neighbors(cell.position) > 0)
            })
            .collect();
        for (cell, selectable) in self.cells.iter_mut().zip(selectable) {
            cell.selectable = selectable;
        }
    }
}
