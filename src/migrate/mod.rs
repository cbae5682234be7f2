pub mod attachments;
pub mod labels;
pub mod order;
pub mod report;

#[cfg(test)]
pub(crate) mod fakes;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::ApiError;
use crate::logging::LogSink;
use crate::model::planka::NewCard;
use crate::model::trello::{Board, Card, CommentAction, TrelloList};
use crate::pacing::Pacer;
use crate::providers::{DestinationApi, SourceApi};

use attachments::AttachmentOptions;
use labels::LabelCache;
use order::TraversalOrder;
use report::{Reconciliation, Tally};

pub struct MigrationOptions {
    pub attachments: AttachmentOptions,
    pub order: TraversalOrder,
    pub show_progress: bool,
}

/// Walks the Trello hierarchy and replays it into Planka, one call at a time.
pub struct Migrator {
    source: Box<dyn SourceApi>,
    dest: Box<dyn DestinationApi>,
    sink: Box<dyn LogSink>,
    pacer: Box<dyn Pacer>,
    options: MigrationOptions,
    labels: LabelCache,
}

impl Migrator {
    pub fn new(
        source: Box<dyn SourceApi>,
        dest: Box<dyn DestinationApi>,
        sink: Box<dyn LogSink>,
        pacer: Box<dyn Pacer>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            dest,
            sink,
            pacer,
            options,
            labels: LabelCache::new(),
        }
    }

    pub(crate) fn log(&self, line: &str) {
        self.sink.append(line);
    }

    fn progress(&self, message: &'static str) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} {pos}") {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar
    }

    /// Lists of a board, or `None` when the board was deleted after it was
    /// listed.
    async fn board_lists(&self, board: &Board) -> Result<Option<Vec<TrelloList>>> {
        match self.source.lists(&board.id).await {
            Ok(lists) => Ok(Some(lists)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to list lists of board {}", board.name))
            }
        }
    }

    /// Dry walk over Trello that only counts what the migration should move.
    pub async fn count_source(&self) -> Result<Tally> {
        let mut tally = Tally::default();
        let bar = self.progress("Counting Trello items");

        let workspaces = self
            .source
            .workspaces()
            .await
            .context("Failed to list workspaces")?;
        tally.workspaces = workspaces.len();

        for ws in &workspaces {
            let boards = self.source.boards(&ws.id).await?;
            tally.boards += boards.len();

            for board in &boards {
                let Some(lists) = self.board_lists(board).await? else {
                    continue;
                };
                tally.lists += lists.len();

                for list in &lists {
                    let cards = self.source.cards(&list.id).await?;
                    tally.cards += cards.len();

                    for card in &cards {
                        tally.attachments += self.source.attachments(&card.id).await?.len();
                        tally.comments += self.source.comments(&card.id).await?.len();
                        bar.inc(1);
                    }
                }
            }
        }

        bar.finish_and_clear();
        Ok(tally)
    }

    /// Full run: count, migrate, reconcile. A fatal error is written to the
    /// log before it is returned.
    pub async fn run(&mut self) -> Result<Reconciliation> {
        let result = self.run_to_report().await;
        if let Err(e) = &result {
            self.log(&format!("Migration aborted: {e:#}"));
        }
        result
    }

    async fn run_to_report(&mut self) -> Result<Reconciliation> {
        let found = self.count_source().await?;
        self.log("");
        self.log("Discovered elements in Trello:");
        for line in found.found_lines() {
            self.log(&line);
        }

        let transferred = self.migrate_workspaces().await?;

        let report = Reconciliation::new(found, transferred);
        self.log("");
        self.log(&format!("Labels created in Planka: {}", self.labels.len()));
        self.log("Migration complete!");
        for line in report.lines() {
            self.log(&line);
        }
        Ok(report)
    }

    pub async fn migrate_workspaces(&mut self) -> Result<Tally> {
        let mut moved = Tally::default();
        let order = self.options.order;

        let workspaces = self
            .source
            .workspaces()
            .await
            .context("Failed to list workspaces")?;
        for ws in order.arrange(workspaces) {
            self.log(&format!("migrate workspaces: {}", ws.display_name));
            let project = self
                .dest
                .create_project(&ws.display_name)
                .await
                .with_context(|| format!("Failed to create project {}", ws.display_name))?;
            self.pacer.pause().await;
            moved.workspaces += 1;

            let boards = self.source.boards(&ws.id).await?;
            for board in order.arrange(boards) {
                self.migrate_board(&project.id, &board, &mut moved).await?;
            }
        }

        Ok(moved)
    }

    async fn migrate_board(
        &mut self,
        project_id: &str,
        board: &Board,
        moved: &mut Tally,
    ) -> Result<()> {
        let order = self.options.order;
        self.log(&format!("board migration: {}", board.name));
        let planka_board = self
            .dest
            .create_board(project_id, &board.name)
            .await
            .with_context(|| format!("Failed to create board {}", board.name))?;
        self.pacer.pause().await;
        moved.boards += 1;

        let Some(lists) = self.board_lists(board).await? else {
            self.log(&format!(
                "A deleted board was missed: {} ({})",
                board.name, board.id
            ));
            return Ok(());
        };

        for list in order.arrange(lists) {
            self.log(&format!("list migration: {}", list.name));
            let planka_list = self
                .dest
                .create_list(&planka_board.id, &list.name)
                .await
                .with_context(|| format!("Failed to create list {}", list.name))?;
            self.pacer.pause().await;
            moved.lists += 1;

            let cards = self.source.cards(&list.id).await?;
            for card in order.arrange(cards) {
                self.migrate_card(&planka_board.id, &planka_list.id, &card, moved)
                    .await?;
            }
        }
        Ok(())
    }

    async fn migrate_card(
        &mut self,
        board_id: &str,
        list_id: &str,
        card: &Card,
        moved: &mut Tally,
    ) -> Result<()> {
        let order = self.options.order;
        self.log(&format!("Card migration: {}", card.name));
        let new_card = NewCard {
            name: card.name.clone(),
            description: card.desc.clone(),
            due_date: card.due.clone(),
            completed: card.due_complete,
        };
        let planka_card = self
            .dest
            .create_card(list_id, &new_card)
            .await
            .with_context(|| format!("Failed to create card {}", card.name))?;
        self.pacer.pause().await;
        moved.cards += 1;

        moved.attachments += self.migrate_attachments(&planka_card.id, &card.id).await?;

        self.migrate_card_labels(board_id, &planka_card.id, card).await;

        let checklists = self.source.checklists(&card.id).await?;
        for checklist in order.arrange(checklists) {
            for item in order.arrange(checklist.check_items) {
                self.dest
                    .create_task(&planka_card.id, &item.name, item.is_complete())
                    .await
                    .with_context(|| format!("Failed to create task {}", item.name))?;
                self.pacer.pause().await;
            }
        }

        let comments = self.source.comments(&card.id).await?;
        for comment in order.arrange(comments) {
            self.migrate_comment(&planka_card.id, &comment).await?;
            moved.comments += 1;
        }
        Ok(())
    }

    async fn migrate_comment(
        &self,
        card_id: &str,
        comment: &CommentAction,
    ) -> Result<(), ApiError> {
        let preview: String = comment.data.text.chars().take(30).collect();
        self.log(&format!("Adding a comment to a card: {preview}..."));
        let text = format_comment(
            &comment.data.text,
            &comment.member_creator.full_name,
            &comment.member_creator.username,
            &comment.date,
        );
        self.dest.create_comment(card_id, &text).await?;
        self.pacer.pause().await;
        Ok(())
    }
}

/// Comment body with a footer crediting the Trello author and time.
pub fn format_comment(
    text: &str,
    author_name: &str,
    author_username: &str,
    date: &str,
) -> String {
    let formatted_date =
        NaiveDateTime::parse_from_str(date.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
            .map(|dt| dt.format("%d-%m-%Y %H:%M:%S").to_string())
            .unwrap_or_else(|_| date.to_string());

    format!(
        "{text}\n\n---\n*Imported comment from Trello, originally posted by*  \n{author_name} ({author_username})  \n{formatted_date}"
    )
}
