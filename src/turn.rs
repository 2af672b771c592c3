use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{ActionId, Character, CoupError, Identity};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    // waiting for the active player to declare
    Action,
    // anyone but the actor may challenge the claim
    ActionChallenge,
    // the actor answers a challenge by revealing
    ActionChallengeReply,
    // the unsuccessful challenger picks an influence to lose
    ActionChallengeLoser,
    // eligible players may block
    Block,
    // anyone but the blocker may challenge the block
    BlockChallenge,
    BlockChallengeReply,
    BlockChallengeLoser,
    // a designated player resolves a consequence
    Decision,
    End,
}

use Phase::*;

static TRANSITIONS: [(Phase, &[Phase]); 10] = [
    (Action, &[ActionChallenge, Block, Decision, End]),
    (ActionChallenge, &[ActionChallengeReply, Block, Decision, End]),
    (ActionChallengeReply, &[ActionChallengeLoser, Block, Decision, End]),
    (ActionChallengeLoser, &[Block, Decision, End]),
    (Block, &[BlockChallenge, Decision, End]),
    (BlockChallenge, &[BlockChallengeReply, Decision, End]),
    (BlockChallengeReply, &[BlockChallengeLoser, Decision, End]),
    (BlockChallengeLoser, &[End]),
    (Decision, &[Decision, End]),
    (End, &[]),
];

impl Phase {
    pub fn successors(self) -> &'static [Phase] {
        TRANSITIONS
            .iter()
            .find(|(phase, _)| *phase == self)
            .map_or(&[], |(_, next)| *next)
    }

    pub fn can_advance_to(self, next: Phase) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_reaction_window(self) -> bool {
        matches!(self, ActionChallenge | Block | BlockChallenge)
    }

    pub fn is_challenge_window(self) -> bool {
        matches!(self, ActionChallenge | BlockChallenge)
    }

    /// Phases where somebody other than the reactors owes the engine an answer.
    pub fn awaits_decision(self) -> bool {
        matches!(
            self,
            ActionChallengeReply | ActionChallengeLoser | BlockChallengeReply | BlockChallengeLoser | Decision
        )
    }

    // whether a challenge in this phase targets the block rather than the action
    fn concerns_block(self) -> bool {
        matches!(self, Block | BlockChallenge | BlockChallengeReply | BlockChallengeLoser)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    Pending,
    Passed,
}

/// What the current decider owes the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pending {
    Reveal,
    LoseInfluence,
    Exchange { drawn: Vec<Character> },
    Show,
    Verdict { card: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counteraction<P> {
    pub blocker: P,
    pub character: Character,
}

/// What happens to the turn when one of its players is eliminated out of turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Departure {
    // nothing is left to resolve
    Abandon,
    // a losing challenger's forfeit pays what they owed
    Resume,
    // the block has nobody behind it and the action goes ahead
    Unblock,
    Bystander,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub amount: u32,
    pub to_bank: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub struct Turn<P> {
    actor: P,
    action: Option<ActionId>,
    target: Option<P>,
    block: Option<Counteraction<P>>,
    challenger: Option<P>,
    reactions: Vec<(P, Reaction)>,
    decider: Option<P>,
    pending: Option<Pending>,
    phase: Phase,
    charge: Charge,
}

impl<P: Identity> Turn<P> {
    pub fn new(actor: P) -> Self {
        Self {
            actor,
            action: None,
            target: None,
            block: None,
            challenger: None,
            reactions: Vec::new(),
            decider: None,
            pending: None,
            phase: Action,
            charge: Charge::default(),
        }
    }

    pub fn actor(&self) -> &P {
        &self.actor
    }

    pub fn action(&self) -> Option<ActionId> {
        self.action
    }

    pub fn target(&self) -> Option<&P> {
        self.target.as_ref()
    }

    pub fn block(&self) -> Option<&Counteraction<P>> {
        self.block.as_ref()
    }

    pub fn challenger(&self) -> Option<&P> {
        self.challenger.as_ref()
    }

    pub fn decider(&self) -> Option<&P> {
        self.decider.as_ref()
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn charge(&self) -> Charge {
        self.charge
    }

    pub fn reactions(&self) -> &[(P, Reaction)] {
        &self.reactions
    }

    /// The player whose claim a challenge would currently dispute.
    pub fn challengee(&self) -> &P {
        match (&self.block, self.phase.concerns_block()) {
            (Some(block), true) => &block.blocker,
            _ => &self.actor,
        }
    }

    /// True when the pending claim is the counteraction rather than the action.
    pub fn challenging_block(&self) -> bool {
        self.block.is_some() && self.phase.concerns_block()
    }

    /// How the turn carries on once `player` is gone. A bare target is not enough to
    /// stop it: effects against absent players simply do nothing.
    pub fn departure(&self, player: &P) -> Departure {
        let deciding = self.decider.as_ref() == Some(player);
        let blocking = self.block.as_ref().is_some_and(|block| block.blocker == *player);
        let examined = self.target.as_ref() == Some(player)
            && matches!(self.pending, Some(Pending::Show | Pending::Verdict { .. }));

        if self.actor == *player {
            return Departure::Abandon;
        }

        match self.phase {
            ActionChallengeLoser | BlockChallengeLoser if deciding => Departure::Resume,
            BlockChallenge | BlockChallengeReply if blocking => Departure::Unblock,
            Decision if deciding || examined => Departure::Abandon,
            _ => Departure::Bystander,
        }
    }

    pub(crate) fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal turn transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!("{}'s turn: {:?} -> {:?}", self.actor, self.phase, next);

        self.phase = next;
        self.decider = None;
        self.pending = None;
        if !next.is_reaction_window() {
            self.reactions.clear();
        }
    }

    pub(crate) fn declare(&mut self, action: ActionId, target: Option<P>, charge: Charge) {
        debug_assert!(self.action.is_none(), "an action was already declared this turn");
        self.action = Some(action);
        self.target = target;
        self.charge = charge;
    }

    /// Opens a reaction window; earlier passes never carry over.
    pub(crate) fn open_window(&mut self, window: Phase, reactors: Vec<P>) {
        debug_assert!(window.is_reaction_window());
        self.advance(window);
        self.challenger = None;
        self.reactions = reactors.into_iter().map(|player| (player, Reaction::Pending)).collect();
    }

    pub(crate) fn withdraw_block(&mut self) {
        self.block = None;
    }

    pub(crate) fn register_block(&mut self, blocker: P, character: Character) {
        debug_assert!(self.block.is_none(), "at most one counteraction per turn");
        self.block = Some(Counteraction { blocker, character });
    }

    pub(crate) fn register_challenge(&mut self, challenger: P) {
        self.challenger = Some(challenger);
    }

    pub(crate) fn await_decision(&mut self, phase: Phase, decider: P, pending: Pending) {
        debug_assert!(phase.awaits_decision());
        self.advance(phase);
        self.decider = Some(decider);
        self.pending = Some(pending);
    }

    pub fn is_reactor(&self, player: &P) -> bool {
        self.reactions.iter().any(|(reactor, _)| reactor == player)
    }

    pub fn pass(&mut self, player: &P) -> Result<(), CoupError> {
        let reaction = self
            .reactions
            .iter_mut()
            .find(|(reactor, _)| reactor == player)
            .map(|(_, reaction)| reaction)
            .ok_or_else(|| CoupError::NotEligibleReactor(player.to_string()))?;

        if *reaction == Reaction::Passed {
            return Err(CoupError::AlreadyPassed(player.to_string()));
        }

        *reaction = Reaction::Passed;
        trace!("{player} passed during {:?}", self.phase);
        Ok(())
    }

    pub fn all_passed(&self) -> bool {
        self.reactions.iter().all(|(_, reaction)| *reaction == Reaction::Passed)
    }

    pub(crate) fn remove_reactor(&mut self, player: &P) {
        self.reactions.retain(|(reactor, _)| reactor != player);
    }
}
