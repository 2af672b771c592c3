use itertools::Itertools;

use crate::catalog::{ActionCatalog, Claim, Targeting};
use crate::game::{Outcome, Stage};
use crate::turn::{Pending, Phase, Reaction};
use crate::{Command, Decision, Game, Identity};

impl<P: Identity> Game<P> {
    /// Single entry point for front-ends that work with `Command` values.
    pub fn apply(&mut self, command: Command<P>) -> Outcome<P> {
        match command {
            Command::Act { actor, action, target } => self.act(&actor, action, target.as_ref()),
            Command::Block { actor, character } => self.block(&actor, character),
            Command::Pass(actor) => self.pass(&actor),
            Command::Challenge(actor) => self.challenge(&actor),
            Command::Decide { actor, decision } => self.decide(&actor, decision),
        }
    }

    /// Every command `apply` would currently accept. Passing again after a pass is left out.
    pub fn legal_commands(&self) -> Vec<Command<P>> {
        match self.stage() {
            Stage::Lobby | Stage::Finished { .. } => vec![],
            Stage::Picking { pools } => pools
                .iter()
                .flat_map(|(id, pool)| {
                    pool.iter().unique().map(move |&character| Command::Decide {
                        actor: id.clone(),
                        decision: Decision::Pick(character),
                    })
                })
                .collect(),
            Stage::Playing => {
                let phase = self.turn_ref().phase();
                if phase == Phase::Action {
                    self.legal_actions()
                } else if phase.is_reaction_window() {
                    self.legal_reactions()
                } else if phase.awaits_decision() {
                    self.legal_decisions()
                } else {
                    vec![]
                }
            }
        }
    }

    fn legal_actions(&self) -> Vec<Command<P>> {
        let actor = self.turn_ref().actor();
        let others = self.others(actor);
        let mut commands = vec![];

        for descriptor in ActionCatalog::available(self.variants()) {
            let mut targets: Vec<Option<P>> = match descriptor.targeting {
                Targeting::None => vec![None],
                Targeting::Optional => vec![None],
                Targeting::Required => vec![],
            };
            if descriptor.targeting != Targeting::None {
                targets.extend(others.iter().cloned().map(Some));
            }
            if descriptor.targeting == Targeting::Required && descriptor.self_target {
                targets.push(Some(actor.clone()));
            }

            commands.extend(
                targets
                    .into_iter()
                    .filter(|target| self.validate_act(actor, descriptor.id, target.as_ref()).is_ok())
                    .map(|target| Command::Act {
                        actor: actor.clone(),
                        action: descriptor.id,
                        target,
                    }),
            );
        }

        commands
    }

    fn legal_reactions(&self) -> Vec<Command<P>> {
        let turn = self.turn_ref();
        let mut commands = vec![];

        for (reactor, reaction) in turn.reactions() {
            if *reaction == Reaction::Passed {
                continue;
            }

            commands.push(Command::Pass(reactor.clone()));

            if self.validate_challenge(reactor).is_ok() {
                commands.push(Command::Challenge(reactor.clone()));
            }

            if turn.phase() == Phase::Block {
                for &character in self.current_descriptor().blockers {
                    if self.validate_block(reactor, character).is_ok() {
                        commands.push(Command::Block { actor: reactor.clone(), character });
                    }
                }
            }
        }

        commands
    }

    fn legal_decisions(&self) -> Vec<Command<P>> {
        let turn = self.turn_ref();
        let (Some(decider), Some(pending)) = (turn.decider(), turn.pending()) else {
            return vec![];
        };
        let Some(player) = self.player(decider) else {
            return vec![];
        };

        let decisions: Vec<Decision> = match pending {
            Pending::Reveal => match self.pending_claim() {
                Some(Claim::Lacks(_)) => vec![Decision::RevealAll],
                _ => player.face_down().map(Decision::Reveal).collect(),
            },
            Pending::LoseInfluence => player.face_down().map(Decision::Lose).collect(),
            Pending::Exchange { drawn } => (0..player.influence() + drawn.len())
                .combinations(player.influence())
                .map(Decision::Exchange)
                .collect(),
            Pending::Show => player.face_down().map(Decision::Show).collect(),
            Pending::Verdict { .. } => vec![Decision::Keep, Decision::Discard],
        };

        decisions
            .into_iter()
            .map(|decision| Command::Decide { actor: decider.clone(), decision })
            .collect()
    }
}
