//! Ratatui front-end for the book inventory. The UI never owns catalog state
//! of its own: every action goes through the `Inventory` handed to `App`, and
//! the list is redrawn straight from `Inventory::list()`.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
