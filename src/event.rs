use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{ActionId, Character, Faction, Variant};

/// Something that happened, in the order it happened. Front-ends render these verbatim
/// or translate them; `ShownPrivately` must only reach the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub enum Event<P> {
    Joined(P),
    Left(P),
    Started { order: Vec<P>, variants: Vec<Variant> },
    AwaitingPick(P),
    Picked(P),
    TurnBegan { player: P, coins: u32 },
    Acted { actor: P, action: ActionId, target: Option<P> },
    Paid { player: P, amount: u32, to_bank: bool },
    Refunded { player: P, amount: u32 },
    Passed(P),
    Blocked { blocker: P, character: Character },
    Challenged { challenger: P, claimant: P },
    Revealed { player: P, character: Character },
    ClaimProven { player: P },
    ClaimFailed { player: P },
    CardReplaced { player: P },
    AwaitingDecision { player: P },
    LostInfluence { player: P, character: Character },
    Eliminated(P),
    Forfeited(P),
    GainedCoins { player: P, amount: u32 },
    Stole { thief: P, victim: P, amount: u32 },
    Embezzled { player: P, amount: u32 },
    Exchanged(P),
    ShownPrivately { viewer: P, owner: P, character: Character },
    ExamineKept { examiner: P, target: P },
    ExamineDiscarded { examiner: P, target: P },
    Converted { player: P, faction: Faction },
    BlockStood { blocker: P },
    BlockWithdrawn { blocker: P },
    ActionVoided { actor: P, action: ActionId },
    Winner(P),
}

impl<P: Display> Display for Event<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Joined(player) => write!(f, "{player} joined the game"),
            Event::Left(player) => write!(f, "{player} left the game"),
            Event::Started { order, variants } => {
                let order = order.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
                if variants.is_empty() {
                    write!(f, "the game begins, turn order: {order}")
                } else {
                    let variants = variants.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                    write!(f, "the game begins ({variants}), turn order: {order}")
                }
            }
            Event::AwaitingPick(player) => write!(f, "{player} must pick a starting character"),
            Event::Picked(player) => write!(f, "{player} picked a starting character"),
            Event::TurnBegan { player, coins } => write!(f, "it is {player}'s turn ({coins} coins)"),
            Event::Acted { actor, action, target: Some(target) } => {
                write!(f, "{actor} used {} on {target}", action.to_string().to_uppercase())
            }
            Event::Acted { actor, action, target: None } => {
                write!(f, "{actor} used {}", action.to_string().to_uppercase())
            }
            Event::Paid { player, amount, to_bank: true } => write!(f, "{player} pays {amount} coins into the bank"),
            Event::Paid { player, amount, to_bank: false } => write!(f, "{player} pays {amount} coins"),
            Event::Refunded { player, amount } => write!(f, "{player} gets {amount} coins back"),
            Event::Passed(player) => write!(f, "{player} passes"),
            Event::Blocked { blocker, character } => write!(f, "{blocker} blocks with the {character}"),
            Event::Challenged { challenger, claimant } => write!(f, "{challenger} challenges {claimant}"),
            Event::Revealed { player, character } => write!(f, "{player} reveals {character}"),
            Event::ClaimProven { player } => write!(f, "{player} told the truth"),
            Event::ClaimFailed { player } => write!(f, "{player} was bluffing"),
            Event::CardReplaced { player } => write!(f, "{player} shuffles the revealed card back and draws a new one"),
            Event::AwaitingDecision { player } => write!(f, "waiting for {player} to decide"),
            Event::LostInfluence { player, character } => write!(f, "{player} loses influence over {character}"),
            Event::Eliminated(player) => write!(f, "{player} has lost all influence and is out"),
            Event::Forfeited(player) => write!(f, "{player} forfeits"),
            Event::GainedCoins { player, amount } => write!(f, "{player} takes {amount} coins"),
            Event::Stole { thief, victim, amount } => write!(f, "{thief} steals {amount} coins from {victim}"),
            Event::Embezzled { player, amount } => write!(f, "{player} embezzles {amount} coins from the bank"),
            Event::Exchanged(player) => write!(f, "{player} exchanges cards with the court"),
            Event::ShownPrivately { viewer, owner, .. } => write!(f, "{owner} shows a card to {viewer}"),
            Event::ExamineKept { examiner, target } => write!(f, "{examiner} lets {target} keep the card"),
            Event::ExamineDiscarded { examiner, target } => {
                write!(f, "{examiner} makes {target} swap the card for a new one")
            }
            Event::Converted { player, faction } => write!(f, "{player} is now a {faction}"),
            Event::BlockStood { blocker } => write!(f, "{blocker}'s block stands"),
            Event::BlockWithdrawn { blocker } => write!(f, "{blocker}'s block falls away"),
            Event::ActionVoided { actor, action } => {
                write!(f, "{actor}'s {} has no effect", action.to_string().to_uppercase())
            }
            Event::Winner(player) => write!(f, "{player} wins the game"),
        }
    }
}
