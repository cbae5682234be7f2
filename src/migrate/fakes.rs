use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::attachments::AttachmentOptions;
use super::order::TraversalOrder;
use super::{MigrationOptions, Migrator};
use crate::error::ApiError;
use crate::logging::MemorySink;
use crate::model::planka::{Created, NewCard};
use crate::model::trello::{
    Attachment, Board, Card, Checklist, CommentAction, CommentData, Label, MemberCreator,
    TrelloList, Workspace,
};
use crate::pacing::Pacer;
use crate::providers::{DestinationApi, SourceApi};

fn rejected(what: &str) -> ApiError {
    ApiError::Status {
        status: 422,
        url: format!("fake://{what}"),
        body: "rejected".into(),
    }
}

#[derive(Default)]
struct SourceState {
    workspaces: Vec<Workspace>,
    boards: HashMap<String, Vec<Board>>,
    lists: HashMap<String, Vec<TrelloList>>,
    cards: HashMap<String, Vec<Card>>,
    attachments: HashMap<String, Vec<Attachment>>,
    covers: HashMap<String, String>,
    checklists: HashMap<String, Vec<Checklist>>,
    comments: HashMap<String, Vec<CommentAction>>,
    deleted_boards: HashSet<String>,
    broken_boards: HashSet<String>,
    failing_downloads: HashSet<String>,
    downloads: Vec<String>,
}

/// In-memory Trello. Clones share state so tests can seed it after the
/// migrator took ownership of a copy.
#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<SourceState>>,
}

impl FakeSource {
    fn with<R>(&self, f: impl FnOnce(&mut SourceState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_workspace(&self, id: &str, name: &str) {
        self.with(|s| {
            s.workspaces.push(Workspace {
                id: id.into(),
                display_name: name.into(),
            })
        });
    }

    pub fn add_board(&self, workspace_id: &str, id: &str, name: &str) {
        self.with(|s| {
            s.boards
                .entry(workspace_id.into())
                .or_default()
                .push(Board {
                    id: id.into(),
                    name: name.into(),
                })
        });
    }

    pub fn add_list(&self, board_id: &str, id: &str, name: &str) {
        self.with(|s| {
            s.lists
                .entry(board_id.into())
                .or_default()
                .push(TrelloList {
                    id: id.into(),
                    name: name.into(),
                })
        });
    }

    pub fn add_card(&self, list_id: &str, card: Card) {
        self.with(|s| s.cards.entry(list_id.into()).or_default().push(card));
    }

    pub fn set_attachments(&self, card_id: &str, attachments: Vec<Attachment>) {
        self.with(|s| s.attachments.insert(card_id.into(), attachments));
    }

    pub fn set_cover(&self, card_id: &str, attachment_id: &str) {
        self.with(|s| s.covers.insert(card_id.into(), attachment_id.into()));
    }

    pub fn set_checklists(&self, card_id: &str, checklists: Vec<Checklist>) {
        self.with(|s| s.checklists.insert(card_id.into(), checklists));
    }

    pub fn set_comments(&self, card_id: &str, comments: Vec<CommentAction>) {
        self.with(|s| s.comments.insert(card_id.into(), comments));
    }

    pub fn mark_board_deleted(&self, board_id: &str) {
        self.with(|s| s.deleted_boards.insert(board_id.into()));
    }

    pub fn fail_board_lists(&self, board_id: &str) {
        self.with(|s| s.broken_boards.insert(board_id.into()));
    }

    pub fn fail_download(&self, attachment_id: &str) {
        self.with(|s| s.failing_downloads.insert(attachment_id.into()));
    }

    pub fn downloads(&self) -> Vec<String> {
        self.with(|s| s.downloads.clone())
    }
}

#[async_trait]
impl SourceApi for FakeSource {
    async fn workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        Ok(self.with(|s| s.workspaces.clone()))
    }

    async fn boards(&self, workspace_id: &str) -> Result<Vec<Board>, ApiError> {
        Ok(self.with(|s| s.boards.get(workspace_id).cloned().unwrap_or_default()))
    }

    async fn lists(&self, board_id: &str) -> Result<Vec<TrelloList>, ApiError> {
        self.with(|s| {
            if s.deleted_boards.contains(board_id) {
                return Err(ApiError::NotFound {
                    url: format!("fake://boards/{board_id}/lists"),
                });
            }
            if s.broken_boards.contains(board_id) {
                return Err(ApiError::Status {
                    status: 500,
                    url: format!("fake://boards/{board_id}/lists"),
                    body: "internal error".into(),
                });
            }
            Ok(s.lists.get(board_id).cloned().unwrap_or_default())
        })
    }

    async fn cards(&self, list_id: &str) -> Result<Vec<Card>, ApiError> {
        Ok(self.with(|s| s.cards.get(list_id).cloned().unwrap_or_default()))
    }

    async fn cover_attachment_id(&self, card_id: &str) -> Result<Option<String>, ApiError> {
        Ok(self.with(|s| s.covers.get(card_id).cloned()))
    }

    async fn checklists(&self, card_id: &str) -> Result<Vec<Checklist>, ApiError> {
        Ok(self.with(|s| s.checklists.get(card_id).cloned().unwrap_or_default()))
    }

    async fn attachments(&self, card_id: &str) -> Result<Vec<Attachment>, ApiError> {
        Ok(self.with(|s| s.attachments.get(card_id).cloned().unwrap_or_default()))
    }

    async fn comments(&self, card_id: &str) -> Result<Vec<CommentAction>, ApiError> {
        Ok(self.with(|s| s.comments.get(card_id).cloned().unwrap_or_default()))
    }

    async fn download_attachment(
        &self,
        _card_id: &str,
        attachment_id: &str,
        _file_name: &str,
        dest: &Path,
    ) -> Result<u64, ApiError> {
        let fails = self.with(|s| {
            s.downloads.push(attachment_id.to_string());
            s.failing_downloads.contains(attachment_id)
        });
        if fails {
            return Err(ApiError::Status {
                status: 401,
                url: format!("fake://download/{attachment_id}"),
                body: "unauthorized".into(),
            });
        }
        let body = format!("data-{attachment_id}");
        std::fs::write(dest, &body)?;
        Ok(body.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateProject { name: String },
    CreateBoard { project_id: String, name: String },
    CreateList { board_id: String, name: String },
    CreateCard { list_id: String, name: String },
    CreateTask { card_id: String, name: String, completed: bool },
    CreateComment { card_id: String, text: String },
    CreateAttachment { card_id: String, file_name: String },
    CreateLabel { board_id: String, name: String, color: String },
    AddLabel { card_id: String, label_id: String },
    UpdateCover { card_id: String, cover: Option<String> },
}

#[derive(Default)]
struct DestState {
    calls: Vec<Call>,
    next_id: usize,
    failing_label_names: HashSet<String>,
    failing_uploads: HashSet<String>,
    fail_binding: bool,
    uploaded_files_present: HashMap<String, bool>,
}

impl DestState {
    fn record(&mut self, call: Call) -> Created {
        self.calls.push(call);
        self.next_id += 1;
        Created {
            id: format!("dest-{}", self.next_id),
        }
    }
}

/// In-memory Planka that records every successful write.
#[derive(Clone, Default)]
pub struct FakeDestination {
    state: Arc<Mutex<DestState>>,
}

impl FakeDestination {
    fn with<R>(&self, f: impl FnOnce(&mut DestState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateAttachment { file_name, .. } => Some(file_name),
                _ => None,
            })
            .collect()
    }

    pub fn file_existed_at_upload(&self, file_name: &str) -> bool {
        self.with(|s| {
            s.uploaded_files_present
                .get(file_name)
                .copied()
                .unwrap_or(false)
        })
    }

    pub fn fail_label_named(&self, name: &str) {
        self.with(|s| s.failing_label_names.insert(name.into()));
    }

    pub fn fail_label_binding(&self) {
        self.with(|s| s.fail_binding = true);
    }

    pub fn fail_upload(&self, file_name: &str) {
        self.with(|s| s.failing_uploads.insert(file_name.into()));
    }
}

#[async_trait]
impl DestinationApi for FakeDestination {
    async fn create_project(&self, name: &str) -> Result<Created, ApiError> {
        Ok(self.with(|s| s.record(Call::CreateProject { name: name.into() })))
    }

    async fn create_board(&self, project_id: &str, name: &str) -> Result<Created, ApiError> {
        Ok(self.with(|s| {
            s.record(Call::CreateBoard {
                project_id: project_id.into(),
                name: name.into(),
            })
        }))
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<Created, ApiError> {
        Ok(self.with(|s| {
            s.record(Call::CreateList {
                board_id: board_id.into(),
                name: name.into(),
            })
        }))
    }

    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Created, ApiError> {
        Ok(self.with(|s| {
            s.record(Call::CreateCard {
                list_id: list_id.into(),
                name: card.name.clone(),
            })
        }))
    }

    async fn create_task(
        &self,
        card_id: &str,
        name: &str,
        completed: bool,
    ) -> Result<Created, ApiError> {
        Ok(self.with(|s| {
            s.record(Call::CreateTask {
                card_id: card_id.into(),
                name: name.into(),
                completed,
            })
        }))
    }

    async fn create_comment(&self, card_id: &str, text: &str) -> Result<Created, ApiError> {
        Ok(self.with(|s| {
            s.record(Call::CreateComment {
                card_id: card_id.into(),
                text: text.into(),
            })
        }))
    }

    async fn create_attachment(&self, card_id: &str, file: &Path) -> Result<Created, ApiError> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let present = file.exists();
        self.with(|s| {
            s.uploaded_files_present.insert(file_name.clone(), present);
            if s.failing_uploads.contains(&file_name) {
                return Err(rejected("attachments"));
            }
            Ok(s.record(Call::CreateAttachment {
                card_id: card_id.into(),
                file_name,
            }))
        })
    }

    async fn create_label(
        &self,
        board_id: &str,
        name: &str,
        color: &str,
    ) -> Result<Created, ApiError> {
        self.with(|s| {
            if s.failing_label_names.contains(name) {
                return Err(rejected("labels"));
            }
            Ok(s.record(Call::CreateLabel {
                board_id: board_id.into(),
                name: name.into(),
                color: color.into(),
            }))
        })
    }

    async fn add_label_to_card(&self, card_id: &str, label_id: &str) -> Result<(), ApiError> {
        self.with(|s| {
            if s.fail_binding {
                return Err(rejected("card-labels"));
            }
            s.record(Call::AddLabel {
                card_id: card_id.into(),
                label_id: label_id.into(),
            });
            Ok(())
        })
    }

    async fn update_card_cover(
        &self,
        card_id: &str,
        attachment_id: Option<&str>,
    ) -> Result<(), ApiError> {
        self.with(|s| {
            s.record(Call::UpdateCover {
                card_id: card_id.into(),
                cover: attachment_id.map(String::from),
            })
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct CountingPacer {
    pauses: Arc<AtomicUsize>,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub source: FakeSource,
    pub dest: FakeDestination,
    pub log: MemorySink,
    pub scratch: tempfile::TempDir,
    pacer: CountingPacer,
}

impl Harness {
    pub fn pauses(&self) -> usize {
        self.pacer.pauses.load(Ordering::SeqCst)
    }
}

pub fn harness() -> (Migrator, Harness) {
    let h = Harness {
        source: FakeSource::default(),
        dest: FakeDestination::default(),
        log: MemorySink::new(),
        scratch: tempfile::tempdir().unwrap(),
        pacer: CountingPacer::default(),
    };
    let options = MigrationOptions {
        attachments: AttachmentOptions {
            add_date_to_filename: true,
            timezone: chrono_tz::UTC,
            scratch_dir: h.scratch.path().to_path_buf(),
        },
        order: TraversalOrder::Reverse,
        show_progress: false,
    };
    let migrator = Migrator::new(
        Box::new(h.source.clone()),
        Box::new(h.dest.clone()),
        Box::new(h.log.clone()),
        Box::new(h.pacer.clone()),
        options,
    );
    (migrator, h)
}

pub fn card_with_labels(id: &str, labels: &[(&str, Option<&str>)]) -> Card {
    Card {
        id: id.into(),
        name: format!("card {id}"),
        desc: None,
        due: None,
        due_complete: false,
        labels: labels
            .iter()
            .map(|(name, color)| Label {
                name: name.to_string(),
                color: color.map(String::from),
            })
            .collect(),
    }
}

pub fn attachment(
    id: &str,
    name: Option<&str>,
    file_name: Option<&str>,
    date: Option<&str>,
) -> Attachment {
    Attachment {
        id: id.into(),
        name: name.map(String::from),
        file_name: file_name.map(String::from),
        date: date.map(String::from),
    }
}

pub fn comment(id: &str, text: &str) -> CommentAction {
    CommentAction {
        id: id.into(),
        date: "2024-03-01T09:15:00.000Z".into(),
        data: CommentData { text: text.into() },
        member_creator: MemberCreator {
            full_name: "Grace Hopper".into(),
            username: "grace".into(),
        },
    }
}
