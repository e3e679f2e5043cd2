//! Authoring plans: a labyrinth described as a sequence of editor steps.
//!
//! A plan lists cells in selection order, then the annotations. Replaying
//! it through [`LabyrinthEditor`] enforces exactly the rules an author at
//! the grid would hit.

use std::path::Path;

use derive_getters::Getters;
use labyrinth_graph::{
    AuthoringFailure, AuthoringStep, EditorLimits, GridPosition, ItemOption, LabyrinthDocument,
    LabyrinthEditor, Role,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::ConfigError;

/// A role kept out of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionPlan {
    /// Restricted cell.
    pub position: GridPosition,
    /// Role kept out.
    pub role: Role,
}

/// An item placed on one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPlan {
    /// Cell holding the item.
    pub position: GridPosition,
    /// The item.
    #[serde(flatten)]
    pub option: ItemOption,
}

/// Everything needed to author one labyrinth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct AuthoringPlan {
    name: String,
    rows: usize,
    columns: usize,
    /// Selection order matters: each cell must touch an earlier one.
    cells: Vec<GridPosition>,
    starts: Vec<GridPosition>,
    end: GridPosition,
    #[serde(default)]
    restrictions: Vec<RestrictionPlan>,
    #[serde(default)]
    items: Vec<ItemPlan>,
}

impl AuthoringPlan {
    /// Loads a plan from TOML.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read plan: {}", e)))?;
        let plan: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse plan: {}", e)))?;
        debug!(name = %plan.name, cells = plan.cells.len(), "Plan loaded");
        Ok(plan)
    }

    /// Replays the plan and returns the editor in its final state.
    ///
    /// # Errors
    ///
    /// Returns the first rejected step. The editor's own validation is not
    /// run; see [`AuthoringPlan::author`].
    #[instrument(skip(self, limits), fields(name = %self.name))]
    pub fn replay(&self, limits: EditorLimits) -> Result<LabyrinthEditor, AuthoringFailure> {
        let options = self.items.iter().map(|item| item.option.clone()).collect();
        let mut editor =
            LabyrinthEditor::new(self.rows, self.columns, limits)?.with_item_options(options);

        editor.set_mode(AuthoringStep::Tiles);
        for position in &self.cells {
            if editor.select(*position).is_none() {
                return Err(rejected(AuthoringStep::Tiles, "select", *position));
            }
        }

        editor.set_mode(AuthoringStep::StartPositions);
        for position in &self.starts {
            if !editor.add_start_tile(*position) {
                return Err(rejected(AuthoringStep::StartPositions, "start", *position));
            }
        }

        editor.set_mode(AuthoringStep::EndTile);
        if !editor.add_end_tile(self.end) {
            return Err(rejected(AuthoringStep::EndTile, "end", self.end));
        }

        editor.set_mode(AuthoringStep::Restrictions);
        for restriction in &self.restrictions {
            if !editor.restrict(restriction.position, restriction.role) {
                return Err(rejected(
                    AuthoringStep::Restrictions,
                    "restrict",
                    restriction.position,
                ));
            }
        }

        editor.set_mode(AuthoringStep::Items);
        for item in &self.items {
            let index = editor
                .item_options()
                .iter()
                .position(|option| *option == item.option)
                .ok_or_else(|| {
                    AuthoringFailure::new(
                        AuthoringStep::Items,
                        format!("no {} left to place", item.option.model_name),
                    )
                })?;
            if editor.add_item(item.position, index).is_none() {
                return Err(rejected(AuthoringStep::Items, "place an item on", item.position));
            }
        }

        editor.set_mode(AuthoringStep::Name);
        editor.set_name(&self.name);
        Ok(editor)
    }

    /// Replays and validates the plan, producing the wire document.
    ///
    /// # Errors
    ///
    /// Returns the first rejected step or the first failed validation.
    pub fn author(&self, limits: EditorLimits) -> Result<LabyrinthDocument, AuthoringFailure> {
        let document = self.replay(limits)?.to_document()?;
        info!(
            name = %document.labyrinth_name,
            tiles = document.tile_map.len(),
            "Labyrinth authored"
        );
        Ok(document)
    }
}

fn rejected(step: AuthoringStep, action: &str, position: GridPosition) -> AuthoringFailure {
    AuthoringFailure::new(step, format!("could not {} cell {}", action, position))
}
