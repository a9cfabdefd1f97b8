use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonRole {
    Resident,
    Guest,
    Temporary,
    Staff,
    Donor,
    Volunteer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationRole {
    Common,
    Kitchen,
    Bathroom,
    Bedroom,
    Garage,
    Utility,
    Outdoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityStatus {
    Active,
    MovedOut,
}

/// Kind-specific fields, resolved once at construction.
///
/// The stored schema kept persons and locations in one loosely-shaped
/// "residents" collection discriminated by field presence; here the two
/// variants are explicit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum EntityKind {
    Person {
        first_name: String,
        last_name: String,
        role: PersonRole,
        /// For temporary persons
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_departure: Option<NaiveDate>,
    },
    Location {
        display_name: String,
        role: LocationRole,
        /// For sleeping spaces ("twin", "queen", ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bed_size: Option<String>,
    },
}

/// An actor that can consume or restock items: a person, or a place items
/// are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Entity {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: EntityKind,
    /// Room assignment (persons live somewhere; locations may nest)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub status: EntityStatus,
    /// Set when the entity transitions to `MovedOut`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_out_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn person(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: PersonRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: EntityKind::Person {
                first_name: first_name.into(),
                last_name: last_name.into(),
                role,
                expected_departure: None,
            },
            room: None,
            status: EntityStatus::Active,
            moved_out_at: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location(display_name: impl Into<String>, role: LocationRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: EntityKind::Location {
                display_name: display_name.into(),
                role,
                bed_size: None,
            },
            room: None,
            status: EntityStatus::Active,
            moved_out_at: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown in pickers and event attribution.
    pub fn display_name(&self) -> String {
        match &self.kind {
            EntityKind::Person {
                first_name,
                last_name,
                ..
            } => format!("{} {}", first_name, last_name).trim().to_string(),
            EntityKind::Location { display_name, .. } => display_name.clone(),
        }
    }

    /// Moved-out entities keep their ledger history but are excluded from
    /// active listings and actor pickers.
    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }

    pub fn is_person(&self) -> bool {
        matches!(self.kind, EntityKind::Person { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_display_name_joins_parts() {
        let e = Entity::person("Alex", "Johnson", PersonRole::Resident);
        assert_eq!(e.display_name(), "Alex Johnson");
        assert!(e.is_person());
        assert!(e.is_active());
    }

    #[test]
    fn kind_round_trips_with_tag() {
        let e = Entity::location("Kitchen", LocationRole::Kitchen);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["entity_type"], "location");
        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back.display_name(), "Kitchen");
    }
}
