use std::fmt::{Display, Formatter};

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{ActionCatalog, ActionDescriptor, Op, Targeting};
use crate::config::{FORCED_COUP_COINS, MAX_PLAYERS, MIN_PLAYERS, STARTING_COINS};
use crate::turn::{Charge, Departure, Pending, Phase, Turn};
use crate::{
    ActionId, Character, CharacterDeck, CoupError, Decision, Event, Faction, GameConfig, Identity, Player,
    TargetError, Variant, VariantSet,
};

pub type Outcome<P> = Result<Vec<Event<P>>, CoupError>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub enum Stage<P> {
    Lobby,
    // two-player opening: each player picks one character from a private pool
    Picking { pools: Vec<(P, Vec<Character>)> },
    Playing,
    Finished { winner: P },
}

/// The whole table. Serialising a `Game` captures everything, RNG state included.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub struct Game<P> {
    config: GameConfig,
    // everyone who joined, in join order
    roster: Vec<P>,
    // living players in seating order
    players: Vec<Player<P>>,
    eliminated: Vec<P>,
    deck: CharacterDeck,
    discard: Vec<Character>,
    bank: Option<u32>,
    variants: VariantSet,
    stage: Stage<P>,
    turn: Option<Turn<P>>,
    // index into `players` of whoever's turn it is
    seat: usize,
    turn_number: usize,
    rng: Pcg64,
}

impl<P: Identity> Game<P> {
    pub fn new(config: GameConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| thread_rng().gen());
        let mut rng = Pcg64::seed_from_u64(seed);
        let deck = CharacterDeck::new(&[], 0, rng.gen());

        Self {
            config,
            roster: Vec::new(),
            players: Vec::new(),
            eliminated: Vec::new(),
            deck,
            discard: Vec::new(),
            bank: None,
            variants: VariantSet::base(),
            stage: Stage::Lobby,
            turn: None,
            seat: 0,
            turn_number: 0,
            rng,
        }
    }

    // runs `op` against a copy and only keeps the copy if every step succeeded
    pub(crate) fn transact<F>(&mut self, op: F) -> Outcome<P>
    where
        F: FnOnce(&mut Game<P>, &mut Vec<Event<P>>) -> Result<(), CoupError>,
    {
        let mut game = self.clone();
        let mut events = Vec::new();

        op(&mut game, &mut events)?;

        if game.is_finished() {
            game.conclude();
        }

        *self = game;
        Ok(events)
    }

    // the game froze mid-turn; put any cards still in flight back in the court
    fn conclude(&mut self) {
        if let Some(turn) = self.turn.take() {
            if let Some(Pending::Exchange { drawn }) = turn.pending() {
                self.deck.return_and_shuffle(drawn.iter().copied());
            }
        }
    }

    // ---- queries ----

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage<P> {
        &self.stage
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished { .. })
    }

    pub fn winner(&self) -> Option<&P> {
        match &self.stage {
            Stage::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn roster(&self) -> &[P] {
        &self.roster
    }

    pub fn players(&self) -> &[Player<P>] {
        &self.players
    }

    pub fn player(&self, id: &P) -> Option<&Player<P>> {
        self.players.iter().find(|player| player.id() == id)
    }

    pub fn eliminated(&self) -> &[P] {
        &self.eliminated
    }

    pub fn turn(&self) -> Option<&Turn<P>> {
        self.turn.as_ref()
    }

    pub fn turn_number(&self) -> usize {
        self.turn_number
    }

    pub fn active_player(&self) -> Option<&P> {
        self.turn.as_ref().map(|turn| turn.actor())
    }

    pub fn deck(&self) -> &CharacterDeck {
        &self.deck
    }

    pub fn discard(&self) -> &[Character] {
        &self.discard
    }

    pub fn bank(&self) -> Option<u32> {
        self.bank
    }

    pub fn variants(&self) -> &VariantSet {
        &self.variants
    }

    /// Every copy of `character` wherever it is: court, discard pile, hands, pick pools
    /// and cards drawn for an exchange that is still being decided.
    pub fn census(&self, character: Character) -> usize {
        let in_hands = self.players
            .iter()
            .flat_map(|player| player.cards())
            .filter(|card| card.character == character)
            .count();

        let in_pools = match &self.stage {
            Stage::Picking { pools } => pools
                .iter()
                .flat_map(|(_, pool)| pool)
                .filter(|&&card| card == character)
                .count(),
            _ => 0,
        };

        let in_exchange = match self.turn.as_ref().and_then(|turn| turn.pending()) {
            Some(Pending::Exchange { drawn }) => drawn.iter().filter(|&&card| card == character).count(),
            _ => 0,
        };

        self.deck.count(character)
            + self.discard.iter().filter(|&&card| card == character).count()
            + in_hands
            + in_pools
            + in_exchange
    }

    // ---- seating ----

    pub(crate) fn seat_of(&self, id: &P) -> Option<usize> {
        self.players.iter().position(|player| player.id() == id)
    }

    pub(crate) fn seated(&self, id: &P) -> Result<&Player<P>, CoupError> {
        self.player(id).ok_or_else(|| CoupError::NotSeated(id.to_string()))
    }

    pub(crate) fn player_mut(&mut self, id: &P) -> Result<&mut Player<P>, CoupError> {
        self.players
            .iter_mut()
            .find(|player| player.id() == id)
            .ok_or_else(|| CoupError::NotSeated(id.to_string()))
    }

    /// Everyone else still in the game, in seating order starting after `id`.
    pub(crate) fn others(&self, id: &P) -> Vec<P> {
        let start = self.seat_of(id).unwrap_or(self.seat);
        (1..=self.players.len())
            .map(|n| &self.players[(start + n) % self.players.len()])
            .filter(|player| player.id() != id)
            .map(|player| player.id().clone())
            .collect()
    }

    pub(crate) fn turn_ref(&self) -> &Turn<P> {
        self.turn.as_ref().expect("a turn is open while the game is being played")
    }

    pub(crate) fn turn_mut(&mut self) -> &mut Turn<P> {
        self.turn.as_mut().expect("a turn is open while the game is being played")
    }

    pub(crate) fn playing_turn(&self) -> Result<&Turn<P>, CoupError> {
        match self.stage {
            Stage::Lobby | Stage::Picking { .. } => Err(CoupError::NotStarted),
            Stage::Finished { .. } => Err(CoupError::GameOver),
            Stage::Playing => Ok(self.turn_ref()),
        }
    }

    pub(crate) fn invalid_phase(&self, player: &P) -> CoupError {
        CoupError::InvalidPhase {
            player: player.to_string(),
            phase: self.turn.as_ref().map_or(Phase::End, |turn| turn.phase()),
        }
    }

    pub(crate) fn current_descriptor(&self) -> &'static ActionDescriptor {
        let action = self.turn_ref().action().expect("an action is declared once the turn leaves the Action phase");
        ActionCatalog::lookup(action, &self.variants).expect("a declared action stays available for the whole game")
    }

    fn factions_divided(&self) -> bool {
        if !self.variants.has_factions() {
            return false;
        }

        let mut factions = self.players.iter().filter_map(|player| player.faction());
        match factions.next() {
            Some(first) => factions.any(|faction| faction != first),
            None => false,
        }
    }

    pub(crate) fn check_factions(&self, actor: &P, other: &P) -> Result<(), CoupError> {
        if !self.factions_divided() {
            return Ok(());
        }

        match (self.seated(actor)?.faction(), self.seated(other)?.faction()) {
            (Some(actor), Some(target)) if actor == target => {
                Err(TargetError::FactionRestricted { actor, target }.into())
            }
            _ => Ok(()),
        }
    }

    // ---- lobby ----

    pub fn join(&mut self, id: P) -> Outcome<P> {
        self.transact(|game, events| {
            if !matches!(game.stage, Stage::Lobby) {
                return Err(CoupError::AlreadyStarted);
            }
            if game.roster.contains(&id) {
                return Err(CoupError::AlreadySeated(id.to_string()));
            }
            if game.roster.len() >= MAX_PLAYERS {
                return Err(CoupError::TableFull);
            }

            debug!("{id} joined");
            game.roster.push(id.clone());
            game.players.push(Player::new(id.clone(), STARTING_COINS));
            events.push(Event::Joined(id));
            Ok(())
        })
    }

    pub fn leave(&mut self, id: &P) -> Outcome<P> {
        self.transact(|game, events| {
            if !matches!(game.stage, Stage::Lobby) {
                return Err(CoupError::AlreadyStarted);
            }
            let seat = game.seat_of(id).ok_or_else(|| CoupError::NotSeated(id.to_string()))?;

            debug!("{id} left");
            game.players.remove(seat);
            game.roster.retain(|joined| joined != id);
            events.push(Event::Left(id.clone()));
            Ok(())
        })
    }

    /// Back to the lobby with everyone who ever joined.
    pub fn reset(&mut self) {
        debug!("resetting the table");
        let config = self.config.clone();
        let roster = self.roster.clone();
        let seed = self.rng.gen();

        *self = Game::new(GameConfig { seed: Some(seed), ..config });
        self.players = roster.iter().map(|id| Player::new(id.clone(), STARTING_COINS)).collect();
        self.roster = roster;
    }

    pub fn start<S: AsRef<str>>(&mut self, tokens: &[S]) -> Outcome<P> {
        self.transact(|game, events| {
            if !matches!(game.stage, Stage::Lobby) {
                return Err(CoupError::AlreadyStarted);
            }

            let variants = VariantSet::parse(tokens)?;

            if game.players.len() < MIN_PLAYERS {
                return Err(CoupError::NotEnoughPlayers);
            }
            if variants.is_two_player() && game.players.len() != 2 {
                return Err(CoupError::VariantSeatCount {
                    variant: Variant::TwoPlayer,
                    needed: 2,
                    seated: game.players.len(),
                });
            }

            game.deal(variants, events)
        })
    }

    fn deal(&mut self, variants: VariantSet, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        self.deck = CharacterDeck::new(variants.characters(), self.config.copies_per_character, self.rng.gen());
        self.discard.clear();
        self.eliminated.clear();
        self.bank = if variants.has_bank() { Some(0) } else { None };

        self.players.shuffle(&mut self.rng);
        self.players = self.players
            .iter()
            .map(|player| Player::new(player.id().clone(), STARTING_COINS))
            .collect();

        if variants.has_factions() {
            // factions alternate around the table
            for (seat, player) in self.players.iter_mut().enumerate() {
                let faction = if seat % 2 == 0 { Faction::Loyalist } else { Faction::Reformist };
                player.set_faction(Some(faction));
            }
        }

        if variants.is_two_player() {
            // the starting player opens with one coin fewer
            self.players[0].pay(1);
        }

        self.variants = variants;
        self.seat = 0;
        self.turn_number = 0;
        self.turn = None;

        let order: Vec<P> = self.players.iter().map(|player| player.id().clone()).collect();
        info!(
            "starting a {} player game, variants {:?}, order {:?}",
            order.len(),
            self.variants,
            order
        );
        events.push(Event::Started { order, variants: self.variants.iter().collect() });

        if self.variants.is_two_player() && self.config.pick_starting_character {
            let characters = self.variants.characters();
            let mut pools = Vec::with_capacity(self.players.len());
            for player in &self.players {
                let pool = characters
                    .iter()
                    .map(|&character| self.deck.take(character))
                    .collect::<Result<Vec<_>, _>>()?;
                pools.push((player.id().clone(), pool));
                events.push(Event::AwaitingPick(player.id().clone()));
            }
            self.stage = Stage::Picking { pools };
            return Ok(());
        }

        for player in self.players.iter_mut() {
            for character in self.deck.draw(2)? {
                player.deal(character);
            }
        }

        self.stage = Stage::Playing;
        self.begin_turn(events);
        Ok(())
    }

    fn pick(&mut self, actor: &P, decision: Decision, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let Decision::Pick(character) = decision else {
            return Err(CoupError::InvalidDecision("pick a starting character first"));
        };

        let Stage::Picking { pools } = &self.stage else {
            unreachable!("picking outside the pick phase");
        };

        // a player who already picked has no pool left
        let owner = pools
            .iter()
            .position(|(id, _)| id == actor)
            .ok_or_else(|| self.invalid_phase(actor))?;
        let card = pools[owner]
            .1
            .iter()
            .position(|&pooled| pooled == character)
            .ok_or(CoupError::InvalidDecision("that character is not in your pool"))?;

        let Stage::Picking { pools } = &mut self.stage else {
            unreachable!("picking outside the pick phase");
        };
        let (_, mut pool) = pools.remove(owner);
        let everyone_picked = pools.is_empty();
        let picked = pool.remove(card);

        self.player_mut(actor)?.deal(picked);
        self.deck.return_and_shuffle(pool);
        events.push(Event::Picked(actor.clone()));

        if everyone_picked {
            for player in self.players.iter_mut() {
                for character in self.deck.draw(1)? {
                    player.deal(character);
                }
            }
            self.stage = Stage::Playing;
            self.begin_turn(events);
        }

        Ok(())
    }

    // ---- turn flow ----

    fn begin_turn(&mut self, events: &mut Vec<Event<P>>) {
        let player = &self.players[self.seat];
        let id = player.id().clone();
        let coins = player.coins();

        self.turn = Some(Turn::new(id.clone()));
        self.turn_number += 1;

        debug!("turn {} begins for {id}", self.turn_number);
        events.push(Event::TurnBegan { player: id, coins });
    }

    pub(crate) fn end_turn(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        if self.is_finished() {
            return Ok(());
        }

        if self.turn_ref().phase() != Phase::End {
            self.turn_mut().advance(Phase::End);
        }

        // an eliminated actor's seat is already taken by whoever sat after them
        let actor = self.turn_ref().actor().clone();
        self.seat = match self.seat_of(&actor) {
            Some(seat) => (seat + 1) % self.players.len(),
            None => self.seat % self.players.len(),
        };

        self.begin_turn(events);
        Ok(())
    }

    pub(crate) fn validate_act(
        &self,
        actor: &P,
        action: ActionId,
        target: Option<&P>,
    ) -> Result<(&'static ActionDescriptor, Option<P>, u32), CoupError> {
        let turn = self.playing_turn()?;
        if turn.phase() != Phase::Action || turn.actor() != actor {
            return Err(self.invalid_phase(actor));
        }

        let descriptor = ActionCatalog::lookup(action, &self.variants)?;
        let player = self.seated(actor)?;

        if player.coins() >= FORCED_COUP_COINS && action != ActionId::Coup {
            return Err(CoupError::MustCoup(actor.to_string()));
        }

        let target = self.validate_target(descriptor, actor, target)?;
        let cost = descriptor.cost_for(actor, target.as_ref());

        if player.coins() < cost {
            return Err(CoupError::InsufficientFunds {
                action,
                cost,
                balance: player.coins(),
            });
        }

        if descriptor.opposed {
            if let Some(target) = &target {
                self.check_factions(actor, target)?;
            }
        }

        Ok((descriptor, target, cost))
    }

    fn validate_target(
        &self,
        descriptor: &ActionDescriptor,
        actor: &P,
        target: Option<&P>,
    ) -> Result<Option<P>, CoupError> {
        match (descriptor.targeting, target) {
            (Targeting::None, Some(_)) => Err(TargetError::Unexpected.into()),
            (Targeting::Required, None) => Err(TargetError::Missing.into()),
            (_, None) => Ok(None),
            (_, Some(target)) => {
                if self.seat_of(target).is_none() {
                    return Err(TargetError::NotSeated(target.to_string()).into());
                }
                if target == actor && !descriptor.self_target {
                    return Err(TargetError::SelfTarget.into());
                }
                Ok(Some(target.clone()))
            }
        }
    }

    pub fn act(&mut self, actor: &P, action: ActionId, target: Option<&P>) -> Outcome<P> {
        self.transact(|game, events| {
            let (descriptor, target, cost) = game.validate_act(actor, action, target)?;
            debug!("{actor} declares {action} against {:?}", target);

            let to_bank = cost > 0 && game.bank.is_some() && (descriptor.pays_bank || game.variants.costs_to_bank());
            game.charge(actor, cost, to_bank, events)?;
            game.turn_mut().declare(action, target.clone(), Charge { amount: cost, to_bank });
            events.push(Event::Acted { actor: actor.clone(), action, target });

            if descriptor.is_challengeable() {
                let reactors = game.others(actor);
                game.turn_mut().open_window(Phase::ActionChallenge, reactors);
                Ok(())
            } else {
                game.continue_action(events)
            }
        })
    }

    fn charge(&mut self, player: &P, amount: u32, to_bank: bool, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        if amount == 0 {
            return Ok(());
        }

        self.player_mut(player)?.pay(amount);
        if to_bank {
            if let Some(bank) = self.bank.as_mut() {
                *bank += amount;
            }
        }

        events.push(Event::Paid { player: player.clone(), amount, to_bank });
        Ok(())
    }

    pub(crate) fn refund(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let turn = self.turn_ref();
        let charge = turn.charge();
        let actor = turn.actor().clone();

        if charge.amount == 0 || self.player(&actor).is_none() {
            return Ok(());
        }

        if charge.to_bank {
            if let Some(bank) = self.bank.as_mut() {
                *bank = bank.saturating_sub(charge.amount);
            }
        }

        self.player_mut(&actor)?.gain(charge.amount);
        events.push(Event::Refunded { player: actor, amount: charge.amount });
        Ok(())
    }

    /// The claim behind the action (if any) went unopposed: offer the block, or resolve.
    pub(crate) fn continue_action(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        if self.is_finished() {
            return Ok(());
        }

        let descriptor = self.current_descriptor();
        if descriptor.is_blockable() {
            let blockers = self.eligible_blockers();
            if !blockers.is_empty() {
                self.turn_mut().open_window(Phase::Block, blockers);
                return Ok(());
            }
        }

        self.resolve_action(events)
    }

    fn eligible_blockers(&self) -> Vec<P> {
        let turn = self.turn_ref();
        let actor = turn.actor();

        match turn.target() {
            Some(target) if target != actor && self.seat_of(target).is_some() => vec![target.clone()],
            Some(_) => vec![],
            None => self
                .others(actor)
                .into_iter()
                .filter(|other| self.check_factions(actor, other).is_ok())
                .collect(),
        }
    }

    pub(crate) fn resolve_action(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        if self.is_finished() {
            return Ok(());
        }

        let turn = self.turn_ref();
        let actor = turn.actor().clone();
        let target = turn.target().cloned();

        if self.seat_of(&actor).is_none() {
            return self.end_turn(events);
        }

        let descriptor = self.current_descriptor();
        debug!("resolving {} for {actor}", descriptor.id);

        for op in descriptor.effect.plan(self, &actor, target.as_ref()) {
            self.apply_op(op, events)?;
        }

        if self.is_finished() || self.turn_ref().phase() == Phase::Decision {
            return Ok(());
        }

        self.end_turn(events)
    }

    fn apply_op(&mut self, op: Op<P>, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        match op {
            Op::Credit(player, amount) => {
                self.player_mut(&player)?.gain(amount);
                events.push(Event::GainedCoins { player, amount });
            }
            Op::Transfer { from, to, amount } => {
                self.player_mut(&from)?.pay(amount);
                self.player_mut(&to)?.gain(amount);
                events.push(Event::Stole { thief: to, victim: from, amount });
            }
            Op::Withdraw { to, amount } => {
                if let Some(bank) = self.bank.as_mut() {
                    *bank = bank.saturating_sub(amount);
                }
                self.player_mut(&to)?.gain(amount);
                events.push(Event::Embezzled { player: to, amount });
            }
            Op::LoseInfluence(player) => {
                self.inflict_loss(&player, Phase::Decision, events)?;
            }
            Op::Exchange { player, draw } => {
                let drawn = self.deck.draw(draw)?;
                self.turn_mut().await_decision(Phase::Decision, player.clone(), Pending::Exchange { drawn });
                events.push(Event::AwaitingDecision { player });
            }
            Op::Examine { examiner, target } => {
                let hidden: Vec<usize> = self.seated(&target)?.face_down().collect();
                if let [only] = hidden.as_slice() {
                    // nothing to choose: the only card is shown
                    self.show_card(examiner, target, *only, events)?;
                } else {
                    self.turn_mut().await_decision(Phase::Decision, target.clone(), Pending::Show);
                    events.push(Event::AwaitingDecision { player: target });
                }
            }
            Op::Convert(player) => {
                let convert = self.player_mut(&player)?;
                if let Some(faction) = convert.faction() {
                    convert.set_faction(Some(faction.opposite()));
                    events.push(Event::Converted { player, faction: faction.opposite() });
                }
            }
        }

        Ok(())
    }

    /// Makes `player` give up an influence. Returns true when they have to choose which.
    pub(crate) fn inflict_loss(&mut self, player: &P, phase: Phase, events: &mut Vec<Event<P>>) -> Result<bool, CoupError> {
        let hidden: Vec<usize> = match self.player(player) {
            Some(victim) => victim.face_down().collect(),
            None => return Ok(false),
        };

        match hidden.as_slice() {
            [] => Ok(false),
            [only] => {
                self.lose_card(player, *only, events)?;
                Ok(false)
            }
            _ => {
                self.turn_mut().await_decision(phase, player.clone(), Pending::LoseInfluence);
                events.push(Event::AwaitingDecision { player: player.clone() });
                Ok(true)
            }
        }
    }

    pub(crate) fn lose_card(&mut self, player: &P, card: usize, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let character = self.player_mut(player)?.lose(card)?;
        events.push(Event::LostInfluence { player: player.clone(), character });

        if self.player(player).is_some_and(|p| p.is_eliminated()) {
            self.eliminate(player, events)?;
        }

        Ok(())
    }

    fn eliminate(&mut self, player: &P, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let seat = self.seat_of(player).ok_or_else(|| CoupError::NotSeated(player.to_string()))?;
        let mut removed = self.players.remove(seat);
        self.discard.extend(removed.surrender());

        if seat < self.seat {
            self.seat -= 1;
        }
        if let Some(turn) = self.turn.as_mut() {
            turn.remove_reactor(player);
        }

        debug!("{player} is eliminated, {} players remain", self.players.len());
        self.eliminated.push(player.clone());
        events.push(Event::Eliminated(player.clone()));

        if let [last] = self.players.as_slice() {
            let winner = last.id().clone();
            info!("{winner} wins after {} turns", self.turn_number);
            events.push(Event::Winner(winner.clone()));
            self.stage = Stage::Finished { winner };
        }

        Ok(())
    }

    pub(crate) fn block_stands(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let turn = self.turn_ref();
        let actor = turn.actor().clone();
        let action = self.current_descriptor().id;

        if let Some(block) = turn.block() {
            events.push(Event::BlockStood { blocker: block.blocker.clone() });
        }
        events.push(Event::ActionVoided { actor, action });
        self.end_turn(events)
    }

    // ---- reactions ----

    pub(crate) fn validate_block(&self, actor: &P, character: Character) -> Result<(), CoupError> {
        let turn = self.playing_turn()?;
        if turn.phase() != Phase::Block {
            return Err(self.invalid_phase(actor));
        }

        if !self.current_descriptor().can_block_with(character) {
            return Err(CoupError::InvalidBlock(actor.to_string(), character));
        }

        // blocking foreign aid is an opposed act too
        if turn.target().is_none() && self.seat_of(actor).is_some() {
            self.check_factions(turn.actor(), actor)?;
        }

        if !turn.is_reactor(actor) {
            return Err(CoupError::NotEligibleReactor(actor.to_string()));
        }

        Ok(())
    }

    pub fn block(&mut self, actor: &P, character: Character) -> Outcome<P> {
        self.transact(|game, events| {
            game.validate_block(actor, character)?;
            debug!("{actor} blocks with {character}");

            let reactors = game.others(actor);
            let turn = game.turn_mut();
            turn.register_block(actor.clone(), character);
            turn.open_window(Phase::BlockChallenge, reactors);

            events.push(Event::Blocked { blocker: actor.clone(), character });
            Ok(())
        })
    }

    pub fn pass(&mut self, actor: &P) -> Outcome<P> {
        self.transact(|game, events| {
            let phase = game.playing_turn()?.phase();
            if !phase.is_reaction_window() {
                return Err(game.invalid_phase(actor));
            }

            match game.turn_mut().pass(actor) {
                Ok(()) => {}
                // passing twice changes nothing
                Err(CoupError::AlreadyPassed(_)) => return Ok(()),
                Err(err) => return Err(err),
            }
            events.push(Event::Passed(actor.clone()));

            if game.turn_ref().all_passed() {
                game.close_window(events)?;
            }
            Ok(())
        })
    }

    pub(crate) fn close_window(&mut self, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        match self.turn_ref().phase() {
            Phase::ActionChallenge => self.continue_action(events),
            Phase::Block => self.resolve_action(events),
            Phase::BlockChallenge => self.block_stands(events),
            phase => unreachable!("{:?} is not a reaction window", phase),
        }
    }

    // ---- decisions ----

    pub fn decide(&mut self, actor: &P, decision: Decision) -> Outcome<P> {
        self.transact(|game, events| {
            if matches!(game.stage, Stage::Picking { .. }) {
                return game.pick(actor, decision, events);
            }

            let turn = game.playing_turn()?;
            if !turn.phase().awaits_decision() || turn.decider() != Some(actor) {
                return Err(game.invalid_phase(actor));
            }
            let pending = turn.pending().cloned().ok_or(CoupError::InvalidDecision("nothing to decide"))?;
            let examiner = turn.actor().clone();
            debug!("{actor} decides {:?} for {:?}", decision, pending);

            match (pending, decision) {
                (Pending::Reveal, Decision::Reveal(card)) => game.answer_challenge(actor, card, events),
                (Pending::Reveal, Decision::RevealAll) => game.reveal_all(actor, events),
                (Pending::LoseInfluence, Decision::Lose(card)) => game.settle_loss(actor, card, events),
                (Pending::Exchange { drawn }, Decision::Exchange(keep)) => {
                    game.finish_exchange(actor, drawn, keep, events)
                }
                (Pending::Show, Decision::Show(card)) => game.show_card(examiner, actor.clone(), card, events),
                (Pending::Verdict { card }, Decision::Keep) => game.verdict(card, false, events),
                (Pending::Verdict { card }, Decision::Discard) => game.verdict(card, true, events),
                _ => Err(CoupError::InvalidDecision("that does not answer the pending decision")),
            }
        })
    }

    fn settle_loss(&mut self, player: &P, card: usize, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let phase = self.turn_ref().phase();
        self.lose_card(player, card, events)?;

        match phase {
            Phase::ActionChallengeLoser | Phase::BlockChallengeLoser => self.after_challenger_lost(events),
            _ => self.end_turn(events),
        }
    }

    fn finish_exchange(
        &mut self,
        actor: &P,
        drawn: Vec<Character>,
        keep: Vec<usize>,
        events: &mut Vec<Event<P>>,
    ) -> Result<(), CoupError> {
        let player = self.seated(actor)?;
        let mut pool = player.hidden_characters();
        pool.extend(drawn);

        let mut distinct = keep.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != keep.len() || keep.len() != player.influence() || keep.iter().any(|&idx| idx >= pool.len()) {
            return Err(CoupError::InvalidDecision("keep exactly one card per remaining influence"));
        }

        let kept: Vec<Character> = keep.iter().map(|&idx| pool[idx]).collect();
        let returned: Vec<Character> = pool
            .iter()
            .enumerate()
            .filter(|(idx, _)| !keep.contains(idx))
            .map(|(_, &character)| character)
            .collect();

        self.player_mut(actor)?.rehand(kept);
        self.deck.return_and_shuffle(returned);
        events.push(Event::Exchanged(actor.clone()));

        self.end_turn(events)
    }

    fn show_card(&mut self, examiner: P, target: P, card: usize, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let character = self.seated(&target)?.influence_card(card)?;
        events.push(Event::ShownPrivately {
            viewer: examiner.clone(),
            owner: target,
            character,
        });

        self.turn_mut().await_decision(Phase::Decision, examiner.clone(), Pending::Verdict { card });
        events.push(Event::AwaitingDecision { player: examiner });
        Ok(())
    }

    fn verdict(&mut self, card: usize, discard: bool, events: &mut Vec<Event<P>>) -> Result<(), CoupError> {
        let turn = self.turn_ref();
        let examiner = turn.actor().clone();
        let target = turn.target().cloned().expect("examine always has a target");

        if discard {
            self.replace_influence_card(&target, card)?;
            events.push(Event::ExamineDiscarded { examiner, target });
        } else {
            events.push(Event::ExamineKept { examiner, target });
        }

        self.end_turn(events)
    }

    // the card goes back into the court and a fresh one comes out
    pub(crate) fn replace_influence_card(&mut self, player: &P, card: usize) -> Result<(), CoupError> {
        let character = self.seated(player)?.influence_card(card)?;
        let fresh = self.deck.replace(character);
        self.player_mut(player)?.swap(card, fresh);
        Ok(())
    }

    // ---- leaving mid-game ----

    /// Removes a player from a running game through the ordinary elimination path.
    pub fn forfeit(&mut self, id: &P) -> Outcome<P> {
        self.transact(|game, events| {
            match game.stage {
                Stage::Lobby => return Err(CoupError::NotStarted),
                Stage::Finished { .. } => return Err(CoupError::GameOver),
                _ => {}
            }
            game.seated(id)?;
            debug!("{id} forfeits");
            events.push(Event::Forfeited(id.clone()));

            if let Stage::Picking { pools } = &mut game.stage {
                let returned: Vec<Character> = pools.drain(..).flat_map(|(_, pool)| pool).collect();
                game.deck.return_and_shuffle(returned);
                return game.eliminate(id, events);
            }

            let turn = game.turn_ref();
            let departure = turn.departure(id);
            let was_reactor = turn.phase().is_reaction_window() && turn.is_reactor(id);
            let blocker = turn.block().map(|block| block.blocker.clone());
            debug!("{id} leaves the turn as {:?}", departure);

            if departure == Departure::Abandon {
                if let Some(Pending::Exchange { drawn }) = turn.pending() {
                    let drawn = drawn.clone();
                    game.deck.return_and_shuffle(drawn);
                }
                game.turn_mut().advance(Phase::End);
            }

            game.eliminate(id, events)?;
            if game.is_finished() {
                return Ok(());
            }

            match departure {
                Departure::Abandon => game.end_turn(events),
                // elimination covers the influence the challenger owed
                Departure::Resume => game.after_challenger_lost(events),
                Departure::Unblock => {
                    game.turn_mut().withdraw_block();
                    if let Some(blocker) = blocker {
                        events.push(Event::BlockWithdrawn { blocker });
                    }
                    game.resolve_action(events)
                }
                Departure::Bystander if was_reactor && game.turn_ref().all_passed() => game.close_window(events),
                Departure::Bystander => Ok(()),
            }
        })
    }
}

impl<P: Identity + Serialize> Game<P> {
    pub fn snapshot(&self) -> Result<String, CoupError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<P: Identity + DeserializeOwned> Game<P> {
    pub fn restore(json: &str) -> Result<Self, CoupError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<P: Identity> Display for Game<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let phase = self.turn.as_ref().map(|turn| turn.phase());
        writeln!(
            f,
            "T {} | P {} | {:?} | deck {} | bank {:?}",
            self.turn_number,
            self.active_player().map_or("-".to_string(), |p| p.to_string()),
            phase,
            self.deck.len(),
            self.bank
        )?;
        for player in &self.players {
            let cards: Vec<String> = player
                .cards()
                .iter()
                .map(|card| if card.face_up { format!("[{}]", card.character) } else { card.character.to_string() })
                .collect();
            write!(f, "\t{}: ${} | {}", player.id(), player.coins(), cards.join(", "))?;
            match player.faction() {
                Some(faction) => writeln!(f, " | {faction}")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl<P: Identity> Game<P> {
    /// Seats the players in the given order and restarts the first turn.
    pub(crate) fn arrange(&mut self, order: &[P]) {
        self.players.sort_by_key(|player| order.iter().position(|id| id == player.id()));
        self.seat = 0;
        self.turn = Some(Turn::new(self.players[0].id().clone()));
    }

    /// Returns every hand to the court and deals the requested ones instead.
    pub(crate) fn rig<H: AsRef<[Character]>>(&mut self, hands: &[(P, H)]) {
        for player in self.players.iter_mut() {
            let cards = player.surrender();
            self.deck.return_and_shuffle(cards);
        }
        for (id, hand) in hands {
            for &character in hand.as_ref() {
                let card = self.deck.take(character).expect("rigged card is in the court");
                self.player_mut(id).expect("rigged player is seated").deal(card);
            }
        }
    }

    pub(crate) fn set_coins(&mut self, id: &P, coins: u32) {
        let player = self.player_mut(id).expect("seated");
        let current = player.coins();
        player.pay(current);
        player.gain(coins);
    }

    pub(crate) fn set_faction(&mut self, id: &P, faction: Faction) {
        self.player_mut(id).expect("seated").set_faction(Some(faction));
    }
}
