use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
pub const STARTING_COINS: u32 = 2;
// at this many coins a player must coup
pub const FORCED_COUP_COINS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    // None draws a seed from the thread rng at construction
    pub seed: Option<u64>,
    pub copies_per_character: usize,
    // two-player games open with each player picking a character from a private pool
    pub pick_starting_character: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            copies_per_character: 3,
            pick_starting_character: true,
        }
    }
}

impl GameConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
