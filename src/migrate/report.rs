/// Entity counts for one side of the migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub workspaces: usize,
    pub boards: usize,
    pub lists: usize,
    pub cards: usize,
    pub attachments: usize,
    pub comments: usize,
}

impl Tally {
    fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("workspaces", self.workspaces),
            ("boards", self.boards),
            ("lists", self.lists),
            ("cards", self.cards),
            ("attachments", self.attachments),
            ("comments", self.comments),
        ]
    }

    pub fn found_lines(&self) -> Vec<String> {
        self.rows()
            .iter()
            .map(|(what, n)| format!("Total {what} found in Trello: {n}"))
            .collect()
    }
}

pub const INCOMPLETE_WARNING: &str =
    "WARNING: Not all data has been migrated! Check the log for errors";

/// Trello totals from the counting pass against what actually reached Planka.
#[derive(Debug, Clone, Copy)]
pub struct Reconciliation {
    pub found: Tally,
    pub transferred: Tally,
}

impl Reconciliation {
    pub fn new(found: Tally, transferred: Tally) -> Self {
        Self { found, transferred }
    }

    /// Boards and lists are left out: a board deleted between the counting
    /// pass and the migration is skipped on purpose.
    pub fn is_incomplete(&self) -> bool {
        self.found.cards > self.transferred.cards
            || self.found.attachments > self.transferred.attachments
            || self.found.comments > self.transferred.comments
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .found
            .rows()
            .iter()
            .zip(self.transferred.rows())
            .map(|((what, found), (_, moved))| {
                format!("Total {what}: {found} found in Trello, {moved} transferred to Planka")
            })
            .collect();
        if self.is_incomplete() {
            lines.push(INCOMPLETE_WARNING.to_string());
        }
        lines
    }
}
