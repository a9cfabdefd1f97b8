pub mod catalogs;
pub mod entities;
pub mod health;
pub mod items;
pub mod logs;
pub mod stats;
