//! Ratatui front end: categories, their lists, list steps and loose items.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
