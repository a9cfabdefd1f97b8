use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A trackable supply unit.
///
/// `current_stock` is a denormalized cache of the net effect of all ledger
/// events referencing this item. The event append and the counter update
/// are separate store writes, so brief drift between the two is possible;
/// the ledger is the source of truth when they disagree.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    /// Icon glyph shown by clients (emoji)
    pub icon: String,
    pub current_stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stock: Option<i64>,
    /// Unit label ("rolls", "bottles", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Durable items (tools, linens) are checked out and returned rather
    /// than consumed.
    #[serde(default)]
    pub reusable: bool,
    /// Soft delete: items are never hard-deleted so the ledger keeps
    /// referential integrity.
    #[serde(default)]
    pub deleted: bool,
    /// Excluded from default views without being deleted
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Item {
    /// New items always start at zero stock; stock only moves through
    /// ledger events.
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: icon.into(),
            current_stock: 0,
            min_stock: 0,
            max_stock: None,
            unit: None,
            reusable: false,
            deleted: false,
            hidden: false,
            tags: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_low(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}
