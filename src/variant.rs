use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::character::{BASE_CHARACTERS, INQUISITOR_CHARACTERS};
use crate::{Character, CoupError};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    Reformation,
    Incorporation,
    Inquisitor,
    #[strum(serialize = "twoplayer")]
    TwoPlayer,
}

/// The active rule overlays. Only ever built from validated tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet(Vec<Variant>);

impl VariantSet {
    pub fn base() -> Self {
        Self::default()
    }

    /// Validates every token against the registry, naming all unknown ones at once.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, CoupError> {
        let mut variants = Vec::new();
        let mut unknown = Vec::new();

        for token in tokens {
            let token = token.as_ref().trim();
            match Variant::from_str(&token.to_ascii_lowercase()) {
                Ok(variant) => variants.push(variant),
                Err(_) => unknown.push(token.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(CoupError::UnknownVariant(unknown));
        }

        Ok(Self::from_iter(variants))
    }

    pub fn contains(&self, variant: Variant) -> bool {
        self.0.contains(&variant)
    }

    pub fn iter(&self) -> impl Iterator<Item = Variant> + '_ {
        self.0.iter().copied()
    }

    pub fn characters(&self) -> &'static [Character] {
        if self.contains(Variant::Inquisitor) {
            &INQUISITOR_CHARACTERS
        } else {
            &BASE_CHARACTERS
        }
    }

    pub fn has_factions(&self) -> bool {
        self.contains(Variant::Reformation)
    }

    pub fn has_bank(&self) -> bool {
        self.contains(Variant::Reformation) || self.contains(Variant::Incorporation)
    }

    // incorporation routes every action cost into the bank
    pub fn costs_to_bank(&self) -> bool {
        self.contains(Variant::Incorporation)
    }

    pub fn is_two_player(&self) -> bool {
        self.contains(Variant::TwoPlayer)
    }
}

impl FromIterator<Variant> for VariantSet {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut variants: Vec<Variant> = iter.into_iter().collect();
        variants.sort();
        variants.dedup();
        Self(variants)
    }
}
