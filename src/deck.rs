use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{Character, CoupError};

/// The court: every face-down character card not currently held by a player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterDeck {
    cards: Vec<Character>,
    rng: Pcg64,
}

impl CharacterDeck {
    pub fn new(characters: &[Character], copies: usize, seed: u64) -> Self {
        let cards = characters.iter()
            .flat_map(|&card| std::iter::repeat(card).take(copies))
            .collect();

        let mut deck = Self {
            cards,
            rng: Pcg64::seed_from_u64(seed),
        };
        deck.shuffle();
        deck
    }

    fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn count(&self, character: Character) -> usize {
        self.cards.iter().filter(|&&card| card == character).count()
    }

    /// Removes `n` cards from the top of the shuffled pool. Never hands out fewer than asked for.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Character>, CoupError> {
        if n > self.cards.len() {
            return Err(CoupError::DeckExhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }

        Ok(self.cards.drain(0..n).collect())
    }

    /// Pulls one specific character out of the pool.
    pub fn take(&mut self, character: Character) -> Result<Character, CoupError> {
        let idx = self.cards
            .iter()
            .position(|&card| card == character)
            .ok_or(CoupError::NotInCourt(character))?;

        Ok(self.cards.remove(idx))
    }

    pub fn return_and_shuffle<I: IntoIterator<Item = Character>>(&mut self, cards: I) {
        self.cards.extend(cards);
        self.shuffle();
    }

    /// Puts `card` back and draws its replacement from the reshuffled pool.
    pub fn replace(&mut self, card: Character) -> Character {
        self.return_and_shuffle([card]);
        // the returned card is in the pool, so the pool can't be empty
        self.cards.remove(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::character::BASE_CHARACTERS;
    use crate::{CharacterDeck, CoupError};
    use crate::Character::{Ambassador, Contessa, Duke};

    #[test]
    fn builds_three_of_each() {
        let deck = CharacterDeck::new(&BASE_CHARACTERS, 3, 7);
        assert_eq!(deck.len(), 15);
        for character in BASE_CHARACTERS {
            assert_eq!(deck.count(character), 3);
        }
    }

    #[test]
    fn draw_removes_cards() {
        let mut deck = CharacterDeck::new(&BASE_CHARACTERS, 3, 7);
        let drawn = deck.draw(4).unwrap();
        assert_eq!(drawn.len(), 4);
        assert_eq!(deck.len(), 11);

        deck.return_and_shuffle(drawn);
        assert_eq!(deck.len(), 15);
        assert_eq!(deck.count(Duke), 3);
    }

    #[test]
    fn overdraw_leaves_deck_untouched() {
        let mut deck = CharacterDeck::new(&[Duke, Ambassador], 1, 3);
        let before = deck.cards.clone();

        match deck.draw(3) {
            Err(CoupError::DeckExhausted { requested, remaining }) => {
                assert_eq!(requested, 3);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected DeckExhausted, got {:?}", other),
        }

        assert_eq!(deck.cards, before);
    }

    #[test]
    fn take_a_missing_character() {
        let mut deck = CharacterDeck::new(&[Duke, Contessa], 1, 5);
        assert_eq!(deck.take(Duke).unwrap(), Duke);

        assert!(matches!(deck.take(Duke), Err(CoupError::NotInCourt(Duke))));
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn replace_keeps_size() {
        let mut deck = CharacterDeck::new(&[Duke], 2, 1);
        let replacement = deck.replace(Duke);
        assert_eq!(replacement, Duke);
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn seeded_decks_match() {
        let a = CharacterDeck::new(&BASE_CHARACTERS, 3, 99);
        let b = CharacterDeck::new(&BASE_CHARACTERS, 3, 99);
        assert_eq!(a.cards, b.cards);
    }
}
