pub mod entity;
pub mod event;
pub mod inventory;
pub mod item;

pub use entity::{Entity, EntityKind, EntityStatus, LocationRole, PersonRole};
pub use event::{EventAction, StockEvent};
pub use inventory::{CollaboratorGrant, Inventory, PermissionLevel, Permissions};
pub use item::Item;
