//! Core library surface for the book inventory.
//!
//! `Inventory` and `Book` are the catalog itself; `ui` and `export` are the
//! presentation shell layered on top, and `config`/`logging` wire the binary
//! together.
pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod ui;

pub use error::InventoryError;
pub use inventory::Inventory;
pub use models::{Book, BookPatch};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
