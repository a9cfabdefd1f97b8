pub mod inventory;
pub mod ledger;
pub mod registry;
pub mod stats;

pub use inventory::{
    EntityPatch, EventPatch, InventoryService, ItemPatch, NewEventRequest, UserContext,
};
pub use registry::CatalogRegistry;
