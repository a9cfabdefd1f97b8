use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// What a ledger entry did to an item's stock.
///
/// The stored schema historically spelled consumption as `"used"`; that
/// spelling is still accepted on input so old documents deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventAction {
    #[serde(alias = "used", alias = "consume")]
    Consumed,
    #[serde(alias = "restock")]
    Restocked,
    Returned,
}

/// One append-only ledger record: a consumption, restock, or return of an
/// item by an actor (person or location).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockEvent {
    pub id: Uuid,
    /// Actor reference (person or location)
    pub actor_id: Uuid,
    pub actor_name: String,
    /// Item reference
    pub item_id: Uuid,
    pub item_name: String,
    pub action: EventAction,
    /// Always >= 1; validated at the HTTP boundary
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Denormalized stock level after this event was applied. Refreshed by
    /// timeline replay when an earlier event is edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resulting_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by_name: Option<String>,
}

impl StockEvent {
    pub fn new(
        actor_id: Uuid,
        actor_name: impl Into<String>,
        item_id: Uuid,
        item_name: impl Into<String>,
        action: EventAction,
        quantity: u32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            actor_name: actor_name.into(),
            item_id,
            item_name: item_name.into(),
            action,
            quantity,
            occurred_at,
            note: None,
            resulting_stock: None,
            recorded_by: None,
            recorded_by_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_action_spellings_deserialize() {
        let action: EventAction = serde_json::from_str("\"used\"").unwrap();
        assert_eq!(action, EventAction::Consumed);
        let action: EventAction = serde_json::from_str("\"restock\"").unwrap();
        assert_eq!(action, EventAction::Restocked);
    }

    #[test]
    fn actions_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&EventAction::Consumed).unwrap(),
            "\"consumed\""
        );
        assert_eq!(
            serde_json::to_string(&EventAction::Returned).unwrap(),
            "\"returned\""
        );
    }
}
