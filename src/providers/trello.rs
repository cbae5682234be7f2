use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use super::SourceApi;
use crate::error::{check_response, ApiError};
use crate::model::trello::{
    Attachment, Board, Card, CardCover, Checklist, CommentAction, TrelloList, Workspace,
};

const COMMENT_PAGE_SIZE: &str = "50";

pub struct TrelloClient {
    base_url: String,
    api_key: String,
    token: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(base_url: impl Into<String>, api_key: String, token: String) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> [(&str, &str); 2] {
        [("key", &self.api_key), ("token", &self.token)]
    }

    fn oauth_header(&self) -> String {
        format!(
            r#"OAuth oauth_consumer_key="{}", oauth_token="{}""#,
            self.api_key, self.token
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(%url, "trello GET");
        let response = self
            .client
            .get(&url)
            .query(&self.auth_params())
            .query(extra)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SourceApi for TrelloClient {
    async fn workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        self.get("members/me/organizations", &[]).await
    }

    async fn boards(&self, workspace_id: &str) -> Result<Vec<Board>, ApiError> {
        self.get(&format!("organizations/{workspace_id}/boards"), &[])
            .await
    }

    async fn lists(&self, board_id: &str) -> Result<Vec<TrelloList>, ApiError> {
        self.get(&format!("boards/{board_id}/lists"), &[]).await
    }

    async fn cards(&self, list_id: &str) -> Result<Vec<Card>, ApiError> {
        self.get(&format!("lists/{list_id}/cards"), &[]).await
    }

    async fn cover_attachment_id(&self, card_id: &str) -> Result<Option<String>, ApiError> {
        let cover: CardCover = self
            .get(
                &format!("cards/{card_id}"),
                &[("fields", "idAttachmentCover")],
            )
            .await?;
        Ok(cover.id_attachment_cover.filter(|id| !id.is_empty()))
    }

    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>, ApiError> {
        self.get(&format!("cards/{card_id}/checklists"), &[]).await
    }

    async fn attachments(&self, card_id: &str) -> Result<Vec<Attachment>, ApiError> {
        self.get(&format!("cards/{card_id}/attachments"), &[]).await
    }

    async fn comments(&self, card_id: &str) -> Result<Vec<CommentAction>, ApiError> {
        let path = format!("cards/{card_id}/actions");
        let mut all = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let mut params = vec![("filter", "commentCard"), ("limit", COMMENT_PAGE_SIZE)];
            if let Some(id) = &before {
                params.push(("before", id.as_str()));
            }
            let page: Vec<CommentAction> = self.get(&path, &params).await?;
            let Some(last) = page.last() else {
                break;
            };
            before = Some(last.id.clone());
            all.extend(page);
        }

        Ok(all)
    }

    async fn download_attachment(
        &self,
        card_id: &str,
        attachment_id: &str,
        file_name: &str,
        dest: &Path,
    ) -> Result<u64, ApiError> {
        let url = format!(
            "{}/cards/{card_id}/attachments/{attachment_id}/download/{}",
            self.base_url,
            urlencoding::encode(file_name)
        );
        tracing::debug!(%url, dest = %dest.display(), "trello download");

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.oauth_header())
            .send()
            .await?;
        let mut response = check_response(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
