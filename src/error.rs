use crate::turn::Phase;
use crate::{ActionId, Character, Faction, Variant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("cannot target yourself")]
    SelfTarget,
    #[error("{0} is not seated at the table")]
    NotSeated(String),
    #[error("this action needs a target")]
    Missing,
    #[error("this action does not take a target")]
    Unexpected,
    #[error("{actor} players may not act against fellow {target} players")]
    FactionRestricted { actor: Faction, target: Faction },
}

#[derive(Debug, thiserror::Error)]
pub enum CoupError {
    #[error("{player} cannot do that during {phase:?}")]
    InvalidPhase { player: String, phase: Phase },
    #[error("the game has not started")]
    NotStarted,
    #[error("the game has already started")]
    AlreadyStarted,
    #[error("the game is over")]
    GameOver,
    #[error("{action} costs {cost} but only {balance} coins are available")]
    InsufficientFunds { action: ActionId, cost: u32, balance: u32 },
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),
    #[error("unknown variant(s): {}", .0.join(", "))]
    UnknownVariant(Vec<String>),
    #[error("{action} is only available with: {}", variant_list(.enabled_by))]
    ActionNotInMode { action: ActionId, enabled_by: Vec<Variant> },
    #[error("{0} makes no claim that can be challenged")]
    NotChallengeable(ActionId),
    #[error("an absence claim must be proven by revealing every face-down card")]
    MustRevealAll,
    #[error("{0} may not react right now")]
    NotEligibleReactor(String),
    #[error("{0} has already passed")]
    AlreadyPassed(String),
    #[error("cannot draw {requested} cards, only {remaining} remain in the deck")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("no {0} is left in the court")]
    NotInCourt(Character),
    #[error("{0} has 10 or more coins and must coup")]
    MustCoup(String),
    #[error("card {0} is not a face-down influence card")]
    InvalidCard(usize),
    #[error("{0}")]
    InvalidDecision(&'static str),
    #[error("{0} cannot block with the {1}")]
    InvalidBlock(String, Character),
    #[error("{0} is not seated at the table")]
    NotSeated(String),
    #[error("{0} is already seated")]
    AlreadySeated(String),
    #[error("the table is full")]
    TableFull,
    #[error("at least 2 players are needed to start")]
    NotEnoughPlayers,
    #[error("{variant} needs exactly {needed} players, {seated} are seated")]
    VariantSeatCount { variant: Variant, needed: usize, seated: usize },
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

fn variant_list(variants: &[Variant]) -> String {
    variants.iter().map(|variant| variant.to_string()).collect::<Vec<_>>().join(", ")
}
