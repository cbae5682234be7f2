use serde::{Deserialize, Serialize};

/// Planka wraps every entity it returns in `{"item": ...}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub item: T,
}

/// Any entity Planka created; only its id matters to the migration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardPayload<'a> {
    pub name: &'a str,
    pub position: u32,
    pub list_id: &'a str,
    pub is_due_date_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> CardPayload<'a> {
    pub fn new(list_id: &'a str, card: &'a NewCard) -> Self {
        Self {
            name: &card.name,
            position: 0,
            list_id,
            is_due_date_completed: card.completed,
            due_date: card.due_date.as_deref().filter(|d| !d.is_empty()),
            description: card.description.as_deref().filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LabelPayload<'a> {
    pub board_id: &'a str,
    pub position: u32,
    pub color: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}
