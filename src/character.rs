use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke, Inquisitor};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Character {
    Duke,
    Captain,
    Assassin,
    Contessa,
    Ambassador,
    Inquisitor,
}

pub static BASE_CHARACTERS: [Character; 5] = [
    Duke,
    Captain,
    Assassin,
    Contessa,
    Ambassador,
];

// the inquisitor expansion swaps the ambassador out of the court
pub static INQUISITOR_CHARACTERS: [Character; 5] = [
    Duke,
    Captain,
    Assassin,
    Contessa,
    Inquisitor,
];

/// A single influence card. Face-up cards are spent and can never be used again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCard {
    pub character: Character,
    pub face_up: bool,
}

impl CharacterCard {
    pub fn hidden(character: Character) -> Self {
        Self { character, face_up: false }
    }

    pub fn is_influence(&self) -> bool {
        !self.face_up
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Faction {
    Loyalist,
    Reformist,
}

impl Faction {
    pub fn opposite(self) -> Faction {
        match self {
            Faction::Loyalist => Faction::Reformist,
            Faction::Reformist => Faction::Loyalist,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use crate::{Character, Faction};

    #[test]
    fn parses_tokens() {
        assert_eq!(Character::from_str("duke").unwrap(), Character::Duke);
        assert_eq!(Character::from_str("Contessa").unwrap(), Character::Contessa);
        assert!(Character::from_str("jester").is_err());
        assert_eq!(Character::Inquisitor.to_string(), "inquisitor");
    }

    #[test]
    fn factions_flip() {
        assert_eq!(Faction::Loyalist.opposite(), Faction::Reformist);
        assert_eq!(Faction::Reformist.opposite().opposite(), Faction::Reformist);
    }
}
