use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, EnumString};

use crate::Character;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, StrumDisplay, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionId {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Steal,
    Exchange,
    Examine,
    Convert,
    Embezzle,
}

/// Payload for `Game::decide`. Card indexes refer to slots in the deciding player's hand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    // answer a challenge by showing one card
    Reveal(usize),
    // answer an absence challenge by showing the whole hand
    RevealAll,
    Lose(usize),
    // indexes into the hidden hand followed by the drawn cards, one per influence kept
    Exchange(Vec<usize>),
    // examined player picks the card the inquisitor gets to see
    Show(usize),
    Keep,
    Discard,
    Pick(Character),
}

/// Every move a player can make, as accepted by `Game::apply`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command<P> {
    Act { actor: P, action: ActionId, target: Option<P> },
    Block { actor: P, character: Character },
    Pass(P),
    Challenge(P),
    Decide { actor: P, decision: Decision },
}

impl<P> Command<P> {
    pub fn actor(&self) -> &P {
        match self {
            Command::Act { actor, .. } => actor,
            Command::Block { actor, .. } => actor,
            Command::Pass(actor) => actor,
            Command::Challenge(actor) => actor,
            Command::Decide { actor, .. } => actor,
        }
    }
}

impl<P: Display> Display for Command<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Act { actor, action, target: Some(target) } => {
                write!(f, "{actor} uses {action} on {target}")
            }
            Command::Act { actor, action, target: None } => {
                write!(f, "{actor} uses {action}")
            }
            Command::Block { actor, character } => {
                write!(f, "{actor} blocks with {character}")
            }
            Command::Pass(actor) => {
                write!(f, "{actor} passes")
            }
            Command::Challenge(actor) => {
                write!(f, "{actor} challenges")
            }
            Command::Decide { actor, decision } => {
                write!(f, "{actor} decides {:?}", decision)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use crate::{ActionId, Command};
    use crate::Character::Duke;

    #[test]
    fn action_tokens() {
        assert_eq!(ActionId::from_str("foreign_aid").unwrap(), ActionId::ForeignAid);
        assert_eq!(ActionId::from_str("TAX").unwrap(), ActionId::Tax);
        assert_eq!(ActionId::Embezzle.to_string(), "embezzle");
    }

    #[test]
    fn narrates_commands() {
        let steal = Command::Act { actor: "ada", action: ActionId::Steal, target: Some("bo") };
        assert_eq!(steal.to_string(), "ada uses steal on bo");
        assert_eq!(Command::Block { actor: "bo", character: Duke }.to_string(), "bo blocks with duke");
        assert_eq!(*Command::Pass("cy").actor(), "cy");
    }
}
