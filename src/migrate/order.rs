use serde::Deserialize;

/// Order in which fetched siblings are replayed into Planka.
///
/// Planka shows freshly created items at the top, so replaying Trello's
/// natural order backwards reproduces Trello's visual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    Forward,
    #[default]
    Reverse,
}

impl TraversalOrder {
    pub fn arrange<T>(self, mut items: Vec<T>) -> Vec<T> {
        if self == TraversalOrder::Reverse {
            items.reverse();
        }
        items
    }
}
