use std::collections::HashMap;

use super::Migrator;
use crate::model::trello::Card;

const DEFAULT_PLANKA_COLOR: &str = "desert-sand";

const TRELLO_TO_PLANKA_COLORS: [(&str, &str); 10] = [
    ("green", "tank-green"),
    ("yellow", "egg-yellow"),
    ("orange", "pumpkin-orange"),
    ("red", "berry-red"),
    ("purple", "midnight-blue"),
    ("blue", "lagoon-blue"),
    ("sky", "morning-sky"),
    ("pink", "pink-tulip"),
    ("black", "dark-granite"),
    ("lime", "bright-moss"),
];

/// Map a Trello label color to the closest Planka one. A missing color is
/// Trello's "gray", which Planka has no match for.
pub fn planka_label_color(trello_color: Option<&str>) -> &'static str {
    let color = trello_color.unwrap_or("gray");
    TRELLO_TO_PLANKA_COLORS
        .iter()
        .find(|(trello, _)| *trello == color)
        .map(|(_, planka)| *planka)
        .unwrap_or(DEFAULT_PLANKA_COLOR)
}

/// Planka label ids are board scoped, so the board is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelKey {
    pub board_id: String,
    pub name: String,
    pub color: &'static str,
}

impl LabelKey {
    pub fn new(board_id: &str, name: &str, color: &'static str) -> Self {
        Self {
            board_id: board_id.to_string(),
            name: name.trim().to_string(),
            color,
        }
    }
}

/// Planka labels created during this run. Grows monotonically.
#[derive(Debug, Default)]
pub struct LabelCache {
    labels: HashMap<LabelKey, String>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &LabelKey) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: LabelKey, label_id: String) {
        self.labels.insert(key, label_id);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

fn display(name: &str) -> &str {
    if name.is_empty() {
        "(no name)"
    } else {
        name
    }
}

impl Migrator {
    /// Recreate the card's labels on the Planka board, reusing labels that
    /// were already created on that board. Failures only skip the label.
    pub async fn migrate_card_labels(&mut self, board_id: &str, card_id: &str, card: &Card) {
        if card.labels.is_empty() {
            self.log("There are no labels on the card");
            return;
        }

        let colors: Vec<&str> = card
            .labels
            .iter()
            .map(|l| l.color.as_deref().unwrap_or("gray"))
            .collect();
        self.log(&format!("Labels transfer: {}", colors.join(", ")));

        // Planka prepends new labels; walk backwards to keep Trello's order.
        for label in card.labels.iter().rev() {
            let color = planka_label_color(label.color.as_deref());
            let key = LabelKey::new(board_id, &label.name, color);
            let name = key.name.clone();

            let cached = self.labels.get(&key).map(str::to_string);
            let label_id = match cached {
                Some(id) => {
                    self.log(&format!(
                        "The label '{}' ({color}) is already in the cache, use the ID {id}",
                        display(&name)
                    ));
                    id
                }
                None => match self.dest.create_label(board_id, &name, color).await {
                    Ok(created) => {
                        self.pacer.pause().await;
                        self.labels.insert(key, created.id.clone());
                        created.id
                    }
                    Err(e) => {
                        self.log(&format!(
                            "Label creation error: {} ({color}): {e}",
                            display(&name)
                        ));
                        continue;
                    }
                },
            };

            match self.dest.add_label_to_card(card_id, &label_id).await {
                Ok(()) => {
                    self.pacer.pause().await;
                    self.log(&format!(
                        "The label '{}' ({color}) has been added",
                        display(&name)
                    ));
                }
                Err(e) => self.log(&format!(
                    "Failed to bind label '{}' ({color}) to a card: {e}",
                    display(&name)
                )),
            }
        }
    }
}
