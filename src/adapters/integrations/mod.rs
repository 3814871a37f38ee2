//! External service integrations (task trackers).

pub mod trello;

pub use trello::TrelloAdapter;
