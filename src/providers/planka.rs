use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DestinationApi;
use crate::error::{check_response, require_parent, ApiError};
use crate::model::planka::{CardPayload, Created, Envelope, LabelPayload, NewCard};

const PROJECT_DESCRIPTION: &str = "Imported from Trello";

pub struct PlankaClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl PlankaClient {
    /// Exchange username/password for a bearer token. Done once per run.
    pub async fn login(base_url: &str, username: &str, password: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::new();
        let body = serde_json::json!({ "emailOrUsername": username, "password": password });

        let response = client
            .post(format!("{base_url}/access-tokens"))
            .json(&body)
            .send()
            .await?;
        let token: Envelope<String> = check_response(response).await?.json().await?;

        Self::with_token(base_url, token.item)
    }

    pub fn with_token(base_url: impl Into<String>, token: String) -> Result<Self, ApiError> {
        if token.is_empty() {
            return Err(ApiError::MissingToken);
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(%url, "planka POST");
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(body)
            .send()
            .await?;
        let envelope: Envelope<T> = check_response(response).await?.json().await?;
        Ok(envelope.item)
    }
}

#[async_trait]
impl DestinationApi for PlankaClient {
    async fn create_project(&self, name: &str) -> Result<Created, ApiError> {
        let body = serde_json::json!({
            "name": name,
            "description": PROJECT_DESCRIPTION,
            "isPublic": false,
        });
        self.post("projects", &body).await
    }

    async fn create_board(&self, project_id: &str, name: &str) -> Result<Created, ApiError> {
        require_parent(project_id, "board", "project")?;
        let body = serde_json::json!({ "name": name, "position": 0, "isPublic": false });
        self.post(&format!("projects/{project_id}/boards"), &body)
            .await
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<Created, ApiError> {
        require_parent(board_id, "list", "board")?;
        let body = serde_json::json!({ "name": name, "position": 0, "boardId": board_id });
        self.post(&format!("boards/{board_id}/lists"), &body).await
    }

    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Created, ApiError> {
        require_parent(list_id, "card", "list")?;
        let payload = CardPayload::new(list_id, card);
        self.post(&format!("lists/{list_id}/cards"), &payload).await
    }

    async fn create_task(
        &self,
        card_id: &str,
        name: &str,
        completed: bool,
    ) -> Result<Created, ApiError> {
        require_parent(card_id, "task", "card")?;
        let body = serde_json::json!({
            "cardId": card_id,
            "name": name,
            "isCompleted": completed,
            "position": 0,
        });
        self.post(&format!("cards/{card_id}/tasks"), &body).await
    }

    async fn create_comment(&self, card_id: &str, text: &str) -> Result<Created, ApiError> {
        require_parent(card_id, "comment", "card")?;
        let body = serde_json::json!({ "text": text, "cardId": card_id });
        self.post(&format!("cards/{card_id}/comment-actions"), &body)
            .await
    }

    async fn create_attachment(&self, card_id: &str, file: &Path) -> Result<Created, ApiError> {
        require_parent(card_id, "attachment", "card")?;
        let url = format!("{}/cards/{card_id}/attachments", self.base_url);
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".into());
        let bytes = tokio::fs::read(file).await?;
        tracing::debug!(%url, %file_name, size = bytes.len(), "planka upload");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;
        let envelope: Envelope<Created> = check_response(response).await?.json().await?;
        Ok(envelope.item)
    }

    async fn create_label(
        &self,
        board_id: &str,
        name: &str,
        color: &str,
    ) -> Result<Created, ApiError> {
        require_parent(board_id, "label", "board")?;
        let payload = LabelPayload {
            board_id,
            position: 0,
            color,
            name: Some(name).filter(|n| !n.trim().is_empty()),
        };
        self.post(&format!("boards/{board_id}/labels"), &payload)
            .await
    }

    async fn add_label_to_card(&self, card_id: &str, label_id: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "labelId": label_id });
        let _: serde_json::Value = self.post(&format!("cards/{card_id}/labels"), &body).await?;
        Ok(())
    }

    async fn update_card_cover(
        &self,
        card_id: &str,
        attachment_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let url = format!("{}/cards/{card_id}", self.base_url);
        let body = serde_json::json!({ "coverAttachmentId": attachment_id });
        tracing::debug!(%url, ?attachment_id, "planka PATCH cover");
        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}
