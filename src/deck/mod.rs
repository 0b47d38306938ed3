//! Decks and their serialization into the collection database

mod models;
pub mod schema;
mod storage;

pub use models::Deck;
pub use schema::APKG_SCHEMA;
