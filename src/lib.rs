pub mod action;
pub mod catalog;
mod challenge;
pub mod character;
pub mod config;
pub mod deck;
pub mod error;
pub mod event;
pub mod game;
mod moves;
pub mod player;
pub mod turn;
pub mod variant;

pub use action::{ActionId, Command, Decision};
pub use catalog::{ActionCatalog, ActionDescriptor};
pub use character::{Character, CharacterCard, Faction};
pub use config::GameConfig;
pub use deck::CharacterDeck;
pub use error::{CoupError, TargetError};
pub use event::Event;
pub use game::{Game, Outcome, Stage};
pub use player::{Identity, Player};
pub use turn::{Phase, Turn};
pub use variant::{Variant, VariantSet};
