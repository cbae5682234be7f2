pub mod planka;
pub mod trello;

use std::path::Path;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::planka::{Created, NewCard};
use crate::model::trello::{
    Attachment, Board, Card, Checklist, CommentAction, TrelloList, Workspace,
};

/// Read side of the migration.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn workspaces(&self) -> Result<Vec<Workspace>, ApiError>;
    async fn boards(&self, workspace_id: &str) -> Result<Vec<Board>, ApiError>;
    async fn lists(&self, board_id: &str) -> Result<Vec<TrelloList>, ApiError>;
    async fn cards(&self, list_id: &str) -> Result<Vec<Card>, ApiError>;
    async fn cover_attachment_id(&self, card_id: &str) -> Result<Option<String>, ApiError>;
    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>, ApiError>;
    async fn attachments(&self, card_id: &str) -> Result<Vec<Attachment>, ApiError>;
    /// All comment actions on the card, newest first, across every page.
    async fn comments(&self, card_id: &str) -> Result<Vec<CommentAction>, ApiError>;
    /// Streams the attachment body into `dest`, returning the bytes written.
    async fn download_attachment(
        &self,
        card_id: &str,
        attachment_id: &str,
        file_name: &str,
        dest: &Path,
    ) -> Result<u64, ApiError>;
}

/// Write side of the migration. Every call creates; nothing is looked up.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    async fn create_project(&self, name: &str) -> Result<Created, ApiError>;
    async fn create_board(&self, project_id: &str, name: &str) -> Result<Created, ApiError>;
    async fn create_list(&self, board_id: &str, name: &str) -> Result<Created, ApiError>;
    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Created, ApiError>;
    async fn create_task(
        &self,
        card_id: &str,
        name: &str,
        completed: bool,
    ) -> Result<Created, ApiError>;
    async fn create_comment(&self, card_id: &str, text: &str) -> Result<Created, ApiError>;
    async fn create_attachment(&self, card_id: &str, file: &Path) -> Result<Created, ApiError>;
    async fn create_label(
        &self,
        board_id: &str,
        name: &str,
        color: &str,
    ) -> Result<Created, ApiError>;
    async fn add_label_to_card(&self, card_id: &str, label_id: &str) -> Result<(), ApiError>;
    /// `None` clears the cover.
    async fn update_card_cover(
        &self,
        card_id: &str,
        attachment_id: Option<&str>,
    ) -> Result<(), ApiError>;
}
