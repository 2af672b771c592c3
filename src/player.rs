use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::{Character, CharacterCard, CoupError, Faction};

/// Anything the front-end uses to tell players apart.
pub trait Identity: Clone + PartialEq + Display + Debug {}

impl<T: Clone + PartialEq + Display + Debug> Identity for T {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player<P> {
    id: P,
    cards: Vec<CharacterCard>,
    coins: u32,
    faction: Option<Faction>,
}

impl<P: Identity> Player<P> {
    pub fn new(id: P, coins: u32) -> Self {
        Self {
            id,
            cards: Vec::with_capacity(2),
            coins,
            faction: None,
        }
    }

    pub fn id(&self) -> &P {
        &self.id
    }

    pub fn cards(&self) -> &[CharacterCard] {
        &self.cards
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn faction(&self) -> Option<Faction> {
        self.faction
    }

    pub(crate) fn set_faction(&mut self, faction: Option<Faction>) {
        self.faction = faction;
    }

    pub(crate) fn gain(&mut self, amount: u32) {
        self.coins += amount;
    }

    pub(crate) fn pay(&mut self, amount: u32) {
        debug_assert!(self.coins >= amount, "paying more than the balance");
        self.coins = self.coins.saturating_sub(amount);
    }

    pub(crate) fn deal(&mut self, character: Character) {
        self.cards.push(CharacterCard::hidden(character));
    }

    pub fn influence(&self) -> usize {
        self.cards.iter().filter(|card| card.is_influence()).count()
    }

    pub fn is_eliminated(&self) -> bool {
        self.influence() == 0
    }

    pub fn face_down(&self) -> impl Iterator<Item = usize> + '_ {
        self.cards
            .iter()
            .enumerate()
            .filter_map(|(idx, card)| if card.is_influence() { Some(idx) } else { None })
    }

    pub fn hidden_characters(&self) -> Vec<Character> {
        self.cards.iter().filter(|card| card.is_influence()).map(|card| card.character).collect()
    }

    // not revealed and is the claimed character
    pub fn find(&self, character: Character) -> Option<usize> {
        self.cards.iter().position(|card| card.is_influence() && card.character == character)
    }

    pub fn holds(&self, character: Character) -> bool {
        self.find(character).is_some()
    }

    pub(crate) fn influence_card(&self, card_idx: usize) -> Result<Character, CoupError> {
        match self.cards.get(card_idx) {
            Some(card) if card.is_influence() => Ok(card.character),
            _ => Err(CoupError::InvalidCard(card_idx)),
        }
    }

    /// 'losing' an influence means the card is flipped up and revealed and doesn't count
    pub(crate) fn lose(&mut self, card_idx: usize) -> Result<Character, CoupError> {
        let character = self.influence_card(card_idx)?;
        self.cards[card_idx].face_up = true;
        Ok(character)
    }

    pub(crate) fn swap(&mut self, card_idx: usize, character: Character) {
        debug_assert!(self.cards[card_idx].is_influence(), "shouldn't be able to replace a revealed card");
        self.cards[card_idx].character = character;
    }

    /// Replaces every face-down card with `hand`, keeping face-up cards where they are.
    pub(crate) fn rehand(&mut self, hand: Vec<Character>) {
        debug_assert_eq!(hand.len(), self.influence());
        let mut hand = hand.into_iter();
        for card in self.cards.iter_mut().filter(|card| card.is_influence()) {
            if let Some(character) = hand.next() {
                card.character = character;
            }
        }
    }

    /// Empties the hand for the discard pile.
    pub(crate) fn surrender(&mut self) -> Vec<Character> {
        self.cards.drain(..).map(|card| card.character).collect()
    }
}
