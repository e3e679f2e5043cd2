//! HTTP implementation of [`LobbyBackend`].

use std::collections::BTreeMap;
use std::time::Duration;

use labyrinth_graph::LabyrinthDocument;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{Endpoint, LobbyBackend, RpcError};
use crate::protocol::{EventMessage, LobbyKey};

#[derive(Debug, Deserialize)]
struct CreatedLobby {
    key: LobbyKey,
}

/// Talks to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] if the HTTP client cannot be built.
    #[instrument]
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and maps non-2xx answers to the endpoint's cause.
    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<Response, RpcError> {
        let response = request.send().await.map_err(|e| {
            warn!(%endpoint, error = %e, "Backend request failed");
            RpcError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%endpoint, status = %status, "Backend rejected request");
            return Err(RpcError::status(endpoint, status.as_u16()));
        }

        debug!(%endpoint, status = %status, "Backend call succeeded");
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
    ) -> Result<T, RpcError> {
        let response = self.send(endpoint, self.client.get(self.url(path))).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RpcError::new(format!("Malformed {} response: {}", endpoint, e)))
    }
}

#[async_trait::async_trait]
impl LobbyBackend for RestBackend {
    #[instrument(skip(self))]
    async fn create_lobby(&self, username: &str) -> Result<LobbyKey, RpcError> {
        let request = self
            .client
            .post(self.url("/lobby/create"))
            .body(username.to_string());
        let created = self
            .send(Endpoint::CreateLobby, request)
            .await?
            .json::<CreatedLobby>()
            .await
            .map_err(|e| RpcError::new(format!("Malformed create-lobby response: {}", e)))?;
        Ok(created.key)
    }

    #[instrument(skip(self))]
    async fn join_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError> {
        let request = self
            .client
            .post(self.url(&format!("/lobby/join/{}", lobby_key)))
            .body(username.to_string());
        self.send(Endpoint::JoinLobby, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn leave_lobby(&self, lobby_key: &str, username: &str) -> Result<(), RpcError> {
        let request = self
            .client
            .post(self.url(&format!("/lobby/leave/{}", lobby_key)))
            .body(username.to_string());
        self.send(Endpoint::LeaveLobby, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lobby_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError> {
        self.get_json(Endpoint::LobbyUsers, &format!("/lobby/users/{}", lobby_key))
            .await
    }

    #[instrument(skip(self))]
    async fn ready_users(&self, lobby_key: &str) -> Result<Vec<String>, RpcError> {
        self.get_json(
            Endpoint::ReadyUsers,
            &format!("/lobby/users/ready/{}", lobby_key),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn lobby_roles(&self, lobby_key: &str) -> Result<BTreeMap<String, String>, RpcError> {
        self.get_json(
            Endpoint::LobbyRoles,
            &format!("/lobby/users/roles/{}", lobby_key),
        )
        .await
    }

    #[instrument(skip(self), fields(lobby_key = %message.lobby_key, username = %message.username))]
    async fn select_role(&self, message: &EventMessage) -> Result<(), RpcError> {
        let request = self.client.post(self.url("/lobby/select-role")).json(message);
        self.send(Endpoint::SelectRole, request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(lobby_key = %message.lobby_key, username = %message.username))]
    async fn pick_labyrinth(&self, message: &EventMessage) -> Result<(), RpcError> {
        let request = self
            .client
            .post(self.url("/lobby/labyrinth-pick"))
            .json(message);
        self.send(Endpoint::LabyrinthPick, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn submit_ready(
        &self,
        lobby_key: &str,
        username: &str,
        labyrinth_name: &str,
    ) -> Result<(), RpcError> {
        let request = self
            .client
            .post(self.url(&format!("/lobby/ready/{}", lobby_key)))
            .json(&[username, labyrinth_name]);
        self.send(Endpoint::SubmitReady, request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn labyrinth_names(&self) -> Result<Vec<String>, RpcError> {
        self.get_json(Endpoint::LabyrinthNames, "/labyrinth/names").await
    }

    #[instrument(skip(self))]
    async fn fetch_labyrinth(&self, name: &str) -> Result<LabyrinthDocument, RpcError> {
        self.get_json(Endpoint::FetchLabyrinth, &format!("/labyrinth/{}", name))
            .await
    }

    #[instrument(skip(self))]
    async fn lobby_labyrinth(&self, lobby_key: &str) -> Result<LabyrinthDocument, RpcError> {
        self.get_json(
            Endpoint::LobbyLabyrinth,
            &format!("/lobby/labyrinth/{}", lobby_key),
        )
        .await
    }

    #[instrument(skip(self, document), fields(name = %document.labyrinth_name))]
    async fn save_labyrinth(&self, document: &LabyrinthDocument) -> Result<(), RpcError> {
        let request = self.client.post(self.url("/labyrinth/save")).json(document);
        self.send(Endpoint::SaveLabyrinth, request).await?;
        Ok(())
    }

    #[instrument(skip(self, contents), fields(size = contents.len()))]
    async fn upload_labyrinth(&self, file_name: &str, contents: Vec<u8>) -> Result<(), RpcError> {
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/labyrinth/read"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The read endpoint answers with an explanatory body.
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, response = %text, "Labyrinth upload rejected");
            let mut err = RpcError::status(Endpoint::ReadLabyrinth, status.as_u16());
            if !text.trim().is_empty() {
                err.message = text.trim().to_string();
            }
            return Err(err);
        }
        Ok(())
    }
}
