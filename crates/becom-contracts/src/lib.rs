//! Pure data and contracts shared by the generation engine and the CLI.

pub mod age;
pub mod chat;
pub mod domain;
pub mod events;
pub mod models;
pub mod schema;
pub mod session;
