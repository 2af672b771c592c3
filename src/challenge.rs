//! Challenge resolution.
//!
//! A possession claim is settled by the card itself: holding the character proves it,
//! otherwise the claimant gives up a card of their choosing. An absence claim can only be
//! proven by showing the whole hand.

use log::debug;

use crate::catalog::Claim;
use crate::event::Event;
use crate::game::Outcome;
use crate::turn::{Pending, Phase};
use crate::{CoupError, Game, Identity};

impl<P: Identity> Game<P> {
    pub(crate) fn pending_claim(&self) -> Option<Claim> {
        let turn = self.turn_ref();
        match turn.block() {
            Some(block) if turn.challenging_block() => Some(Claim::Has(block.character)),
            _ => self.current_descriptor().claim,
        }
    }

    pub(crate) fn validate_challenge(&self, challenger: &P) -> Result<Claim, CoupError> {
        let turn = self.playing_turn()?;
        let phase = turn.phase();

        if !phase.is_reaction_window() {
            return Err(self.invalid_phase(challenger));
        }

        let claim = self.pending_claim();
        if !phase.is_challenge_window() {
            // the block window of an action nobody can challenge
            return match claim {
                None => Err(CoupError::NotChallengeable(self.current_descriptor().id)),
                Some(_) => Err(self.invalid_phase(challenger)),
            };
        }

        let claim = claim.ok_or(CoupError::NotChallengeable(self.current_descriptor().id))?;
        if !turn.is_reactor(challenger) {
            return Err(CoupError::NotEligibleReactor(challenger.to_string()));
        }

        Ok(claim)
    }

    pub fn challenge(&mut self, challenger: &P) -> Outcome<P> {
        self.transact(|game, events| {
            let claim = game.validate_challenge(challenger)?;
            let turn = game.turn_ref();
            let claimant = turn.challengee().clone();
            let reply = match turn.phase() {
                Phase::BlockChallenge => Phase::BlockChallengeReply,
                _ => Phase::ActionChallengeReply,
            };

            debug!("{challenger} challenges {claimant}'s claim {:?}", claim);
            game.turn_mut().register_challenge(challenger.clone());
            events.push(Event::Challenged { challenger: challenger.clone(), claimant: claimant.clone() });

            let hidden: Vec<usize> = game.seated(&claimant)?.face_down().collect();
            let player = game.seated(&claimant)?;

            match (claim, hidden.as_slice()) {
                (Claim::Has(character), _) if player.holds(character) => {
                    let card = player.find(character).expect("held character has a slot");
                    events.push(Event::Revealed { player: claimant.clone(), character });
                    game.turn_mut().advance(reply);
                    game.uphold_claim(&claimant, vec![card], events)
                }
                (Claim::Has(_), [only]) => {
                    let revealed = player.influence_card(*only)?;
                    events.push(Event::Revealed { player: claimant.clone(), character: revealed });
                    game.turn_mut().advance(reply);
                    game.break_claim(&claimant, *only, events)
                }
                (Claim::Lacks(character), [only]) => {
                    let revealed = player.influence_card(*only)?;
                    events.push(Event::Revealed { player: claimant.clone(), character: revealed });
                    game.turn_mut().advance(reply);
                    if revealed == character {
                        game.break_claim(&claimant, *only, events)
                    } else {
                        game.uphold_claim(&claimant, vec![*only], events)
                    }
                }
                _ => {
                    game.turn_mut().await_decision(reply, claimant.clone(), Pending::Reveal);
                    events.push(Event::AwaitingDecision { player: claimant });
                    Ok(())
                }
            }
        })
    }

    /// A single revealed card in answer to a possession challenge.
    pub(crate) fn answer_challenge(&mut self, claimant: &P, card: usize, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let claim = self.pending_claim().ok_or(CoupError::InvalidDecision("nothing was claimed"))?;
        let revealed = self.seated(claimant)?.influence_card(card)?;

        let Claim::Has(character) = claim else {
            return Err(CoupError::MustRevealAll);
        };

        events.push(Event::Revealed { player: claimant.clone(), character: revealed });
        if revealed == character {
            self.uphold_claim(claimant, vec![card], events)
        } else {
            self.break_claim(claimant, card, events)
        }
    }

    /// The whole hand in answer to an absence challenge.
    pub(crate) fn reveal_all(&mut self, claimant: &P, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let Some(Claim::Lacks(character)) = self.pending_claim() else {
            return Err(CoupError::InvalidDecision("reveal a single card to prove possession"));
        };

        let player = self.seated(claimant)?;
        let hand: Vec<usize> = player.face_down().collect();

        for &card in &hand {
            events.push(Event::Revealed { player: claimant.clone(), character: player.influence_card(card)? });
        }

        match player.find(character) {
            Some(card) => self.break_claim(claimant, card, events),
            None => self.uphold_claim(claimant, hand, events),
        }
    }

    // the claimant was honest: revealed cards go back to the court and the challenger pays
    fn uphold_claim(&mut self, claimant: &P, cards: Vec<usize>, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        debug!("{claimant} proves the claim with {} card(s)", cards.len());

        for card in cards {
            self.replace_influence_card(claimant, card)?;
            events.push(Event::CardReplaced { player: claimant.clone() });
        }
        events.push(Event::ClaimProven { player: claimant.clone() });

        let turn = self.turn_ref();
        let challenger = turn.challenger().cloned().expect("a challenge names its challenger");
        let loser = match turn.phase() {
            Phase::BlockChallengeReply => Phase::BlockChallengeLoser,
            _ => Phase::ActionChallengeLoser,
        };

        if self.inflict_loss(&challenger, loser, events)? {
            return Ok(());
        }

        self.after_challenger_lost(events)
    }

    // the claimant was bluffing: the revealed card is lost for good
    fn break_claim(&mut self, claimant: &P, card: usize, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        debug!("{claimant} fails to prove the claim");
        let blocked = self.turn_ref().challenging_block();

        events.push(Event::ClaimFailed { player: claimant.clone() });
        self.lose_card(claimant, card, events)?;

        if self.is_finished() {
            return Ok(());
        }

        if blocked {
            // the block falls away and the action goes ahead
            return self.resolve_action(events);
        }

        let action = self.current_descriptor().id;
        self.refund(events)?;
        events.push(Event::ActionVoided { actor: self.turn_ref().actor().clone(), action });
        self.end_turn(events)
    }

    pub(crate) fn after_challenger_lost(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        if self.is_finished() {
            return Ok(());
        }

        if self.turn_ref().challenging_block() {
            self.block_stands(events)
        } else {
            self.continue_action(events)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::game::tests::table;
    use crate::turn::Phase;
    use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke};
    use crate::{ActionId, CoupError, Decision, Event, Game};

    fn conserved(game: &Game<&'static str>) -> bool {
        game.variants().characters().iter().all(|&character| game.census(character) == 3)
    }

    #[test]
    fn proven_claim_replaces_the_card() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Contessa, Assassin]), ("cy", [Ambassador, Captain])]);

        game.act(&"ada", ActionId::Tax, None).unwrap();
        let events = game.challenge(&"bo").unwrap();

        assert!(events.contains(&Event::Revealed { player: "ada", character: Duke }));
        assert!(events.contains(&Event::ClaimProven { player: "ada" }));
        assert_eq!(game.player(&"ada").unwrap().influence(), 2);
        assert!(game.discard().is_empty());

        // bo has two cards and must pick one
        assert_eq!(game.turn().unwrap().phase(), Phase::ActionChallengeLoser);
        assert!(matches!(game.decide(&"ada", Decision::Lose(0)), Err(CoupError::InvalidPhase { .. })));
        game.decide(&"bo", Decision::Lose(0)).unwrap();

        assert_eq!(game.player(&"ada").unwrap().coins(), 5);
        assert_eq!(game.player(&"bo").unwrap().influence(), 1);
        assert_eq!(game.active_player(), Some(&"bo"));
        assert!(conserved(&game));
    }

    #[test]
    fn failed_claim_is_refunded() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Contessa, Assassin]), ("cy", [Ambassador, Captain])]);
        game.set_coins(&"ada", 3);

        game.act(&"ada", ActionId::Assassinate, Some(&"cy")).unwrap();
        assert_eq!(game.player(&"ada").unwrap().coins(), 0);

        game.challenge(&"cy").unwrap();
        assert_eq!(game.turn().unwrap().decider(), Some(&"ada"));
        let events = game.decide(&"ada", Decision::Reveal(1)).unwrap();

        assert!(events.contains(&Event::ClaimFailed { player: "ada" }));
        assert!(events.contains(&Event::Refunded { player: "ada", amount: 3 }));
        assert!(game.player(&"ada").unwrap().cards()[1].face_up);
        assert_eq!(game.player(&"ada").unwrap().coins(), 3);
        assert_eq!(game.player(&"cy").unwrap().influence(), 2);
        assert_eq!(game.active_player(), Some(&"bo"));
    }

    #[test]
    fn lone_card_answers_automatically() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Contessa, Assassin]), ("cy", [Ambassador, Captain])]);
        game.player_mut(&"ada").unwrap().lose(0).unwrap();

        game.act(&"ada", ActionId::Tax, None).unwrap();
        let events = game.challenge(&"cy").unwrap();

        assert!(events.contains(&Event::Eliminated("ada")));
        assert!(game.player(&"ada").is_none());
        assert_eq!(game.active_player(), Some(&"bo"));
        assert!(conserved(&game));
    }

    #[test]
    fn challenger_loses_last_card() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Contessa, Assassin]), ("cy", [Ambassador, Captain])]);
        game.player_mut(&"bo").unwrap().lose(0).unwrap();

        game.act(&"ada", ActionId::Tax, None).unwrap();
        let events = game.challenge(&"bo").unwrap();

        assert!(events.contains(&Event::Eliminated("bo")));
        assert_eq!(game.player(&"ada").unwrap().coins(), 5);
        assert_eq!(game.active_player(), Some(&"cy"));
    }

    #[test]
    fn block_challenge_upheld() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Contessa, Assassin]), ("cy", [Ambassador, Duke])]);

        game.act(&"ada", ActionId::ForeignAid, None).unwrap();
        game.block(&"cy", Duke).unwrap();
        game.challenge(&"ada").unwrap();

        assert_eq!(game.turn().unwrap().phase(), Phase::BlockChallengeLoser);
        let events = game.decide(&"ada", Decision::Lose(1)).unwrap();

        assert!(events.contains(&Event::BlockStood { blocker: "cy" }));
        assert_eq!(game.player(&"ada").unwrap().coins(), 2);
        assert_eq!(game.player(&"ada").unwrap().influence(), 1);
        assert_eq!(game.player(&"cy").unwrap().influence(), 2);
        assert!(conserved(&game));
    }

    #[test]
    fn challenging_outside_a_window() {
        let mut game = table(&["ada", "bo", "cy"], &[]);
        assert!(matches!(game.challenge(&"bo"), Err(CoupError::InvalidPhase { .. })));

        game.act(&"ada", ActionId::ForeignAid, None).unwrap();
        assert!(matches!(game.challenge(&"bo"), Err(CoupError::NotChallengeable(ActionId::ForeignAid))));

        game.block(&"bo", Duke).unwrap();
        assert!(matches!(game.challenge(&"bo"), Err(CoupError::NotEligibleReactor(_))));
    }

    #[test]
    fn absence_claim_needs_the_whole_hand() {
        let mut game = table(&["ada", "bo", "cy"], &["incorporation"]);
        game.rig(&[("ada", [Captain, Contessa]), ("bo", [Duke, Assassin]), ("cy", [Ambassador, Captain])]);

        game.act(&"ada", ActionId::Embezzle, None).unwrap();
        game.challenge(&"bo").unwrap();

        assert!(matches!(game.decide(&"ada", Decision::Reveal(0)), Err(CoupError::MustRevealAll)));
        let events = game.decide(&"ada", Decision::RevealAll).unwrap();

        assert!(events.contains(&Event::ClaimProven { player: "ada" }));
        assert_eq!(events.iter().filter(|e| matches!(e, Event::CardReplaced { .. })).count(), 2);
        assert_eq!(game.player(&"ada").unwrap().influence(), 2);
        assert_eq!(game.turn().unwrap().decider(), Some(&"bo"));
        assert!(conserved(&game));
    }

    #[test]
    fn lone_card_breaks_an_absence_claim() {
        let mut game = table(&["ada", "bo", "cy"], &["incorporation"]);
        game.rig(&[("ada", [Captain, Duke]), ("bo", [Duke, Assassin]), ("cy", [Ambassador, Captain])]);
        game.player_mut(&"ada").unwrap().lose(0).unwrap();

        game.act(&"ada", ActionId::Embezzle, None).unwrap();
        let events = game.challenge(&"bo").unwrap();

        assert!(events.contains(&Event::Revealed { player: "ada", character: Duke }));
        assert!(events.contains(&Event::ClaimFailed { player: "ada" }));
        assert!(events.contains(&Event::Eliminated("ada")));
        assert_eq!(game.player(&"bo").unwrap().influence(), 2);
        assert_eq!(game.active_player(), Some(&"bo"));
        assert!(conserved(&game));
    }

    #[test]
    fn lone_card_proves_an_absence_claim() {
        let mut game = table(&["ada", "bo", "cy"], &["incorporation"]);
        game.rig(&[("ada", [Duke, Captain]), ("bo", [Duke, Assassin]), ("cy", [Ambassador, Contessa])]);
        game.player_mut(&"ada").unwrap().lose(0).unwrap();

        game.act(&"ada", ActionId::Embezzle, None).unwrap();
        let events = game.challenge(&"bo").unwrap();

        assert!(events.contains(&Event::Revealed { player: "ada", character: Captain }));
        assert!(events.contains(&Event::CardReplaced { player: "ada" }));
        assert!(events.contains(&Event::ClaimProven { player: "ada" }));
        assert_eq!(game.player(&"ada").unwrap().influence(), 1);
        assert_eq!(game.turn().unwrap().phase(), Phase::ActionChallengeLoser);

        game.decide(&"bo", Decision::Lose(1)).unwrap();
        assert_eq!(game.player(&"bo").unwrap().influence(), 1);
        assert_eq!(game.active_player(), Some(&"bo"));
        assert!(conserved(&game));
    }

    #[test]
    fn absence_claim_broken_by_the_character() {
        let mut game = table(&["ada", "bo", "cy"], &["incorporation"]);
        game.rig(&[("ada", [Captain, Duke]), ("bo", [Duke, Assassin]), ("cy", [Ambassador, Captain])]);

        game.act(&"ada", ActionId::Embezzle, None).unwrap();
        game.challenge(&"cy").unwrap();
        let events = game.decide(&"ada", Decision::RevealAll).unwrap();

        assert!(events.contains(&Event::LostInfluence { player: "ada", character: Duke }));
        assert!(events.contains(&Event::ActionVoided { actor: "ada", action: ActionId::Embezzle }));
        assert_eq!(game.player(&"ada").unwrap().hidden_characters(), vec![Captain]);
        assert_eq!(game.active_player(), Some(&"bo"));
    }
}
