use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Access level a collaborator holds on someone else's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    View,
    Edit,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollaboratorGrant {
    pub permission: PermissionLevel,
    pub granted_at: DateTime<Utc>,
    pub granted_by: String,
}

/// The multi-tenant container scoping items, entities, and events.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Inventory {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// uid -> grant
    #[serde(default)]
    pub collaborators: HashMap<String, CollaboratorGrant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Effective permissions of one user on one inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Permissions {
    pub is_owner: bool,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_manage_access: bool,
}

impl Permissions {
    pub const NONE: Permissions = Permissions {
        is_owner: false,
        can_view: false,
        can_edit: false,
        can_delete: false,
        can_manage_access: false,
    };

    /// Owner gets everything; a collaborator gets what their grant says.
    /// Delete and access management stay owner-only.
    pub fn compute(inventory: &Inventory, user_id: &str) -> Permissions {
        if user_id.is_empty() {
            return Permissions::NONE;
        }
        let is_owner = inventory.owner_id == user_id;
        let grant = inventory.collaborators.get(user_id).map(|g| g.permission);
        let has_edit = grant == Some(PermissionLevel::Edit);
        let has_view = grant == Some(PermissionLevel::View);

        Permissions {
            is_owner,
            can_view: is_owner || has_edit || has_view,
            can_edit: is_owner || has_edit,
            can_delete: is_owner,
            can_manage_access: is_owner,
        }
    }

    /// Demo mode runs with full local authority.
    pub fn full() -> Permissions {
        Permissions {
            is_owner: true,
            can_view: true,
            can_edit: true,
            can_delete: true,
            can_manage_access: true,
        }
    }
}
