//! The rules of every action as data.
//!
//! The orchestrator never branches on an action id: it asks the catalog for the
//! descriptor visible under the active variants, reads its flags to decide which
//! reaction windows to open, and applies the [`Op`]s its [`Effect`] plans.

use serde::{Deserialize, Serialize};

use crate::Character::{Ambassador, Assassin, Captain, Contessa, Duke, Inquisitor};
use crate::Variant::{Incorporation, Reformation};
use crate::{ActionId, Character, CoupError, Game, Identity, Variant, VariantSet};

/// What performing (or blocking with) an action asserts about the hidden hand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    Has(Character),
    Lacks(Character),
}

impl Claim {
    pub fn character(self) -> Character {
        match self {
            Claim::Has(character) | Claim::Lacks(character) => character,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Targeting {
    None,
    Optional,
    Required,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Gain(u32),
    // up to this many coins from the target
    Steal(u32),
    LoseInfluence,
    Exchange { draw: usize },
    Examine,
    Convert,
    Embezzle,
}

/// A state change planned by an effect, applied by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op<P> {
    Credit(P, u32),
    Transfer { from: P, to: P, amount: u32 },
    Withdraw { to: P, amount: u32 },
    LoseInfluence(P),
    Exchange { player: P, draw: usize },
    Examine { examiner: P, target: P },
    Convert(P),
}

impl Effect {
    pub fn needs_decision(self) -> bool {
        matches!(self, Effect::LoseInfluence | Effect::Exchange { .. } | Effect::Examine)
    }

    /// Plans the effect without touching the game. Effects against players who have
    /// left the table plan nothing.
    pub fn plan<P: Identity>(self, game: &Game<P>, actor: &P, target: Option<&P>) -> Vec<Op<P>> {
        let target_seated = target.filter(|target| game.player(target).is_some());

        match (self, target_seated) {
            (Effect::Gain(amount), _) => vec![Op::Credit(actor.clone(), amount)],
            (Effect::Steal(max), Some(target)) => {
                let amount = game.player(target).map_or(0, |player| player.coins().min(max));
                vec![Op::Transfer { from: target.clone(), to: actor.clone(), amount }]
            }
            (Effect::LoseInfluence, Some(target)) => vec![Op::LoseInfluence(target.clone())],
            (Effect::Exchange { draw }, _) => vec![Op::Exchange { player: actor.clone(), draw }],
            (Effect::Examine, Some(target)) => {
                vec![Op::Examine { examiner: actor.clone(), target: target.clone() }]
            }
            // converting nobody in particular converts yourself
            (Effect::Convert, _) => match target {
                None => vec![Op::Convert(actor.clone())],
                Some(_) => target_seated.map(|target| vec![Op::Convert(target.clone())]).unwrap_or_default(),
            },
            (Effect::Embezzle, _) => {
                vec![Op::Withdraw { to: actor.clone(), amount: game.bank().unwrap_or(0) }]
            }
            (_, None) => vec![],
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActionDescriptor {
    pub id: ActionId,
    pub cost: u32,
    // cost when aimed at somebody else, if different
    pub targeted_cost: Option<u32>,
    pub targeting: Targeting,
    pub self_target: bool,
    pub claim: Option<Claim>,
    pub blockers: &'static [Character],
    // faction-restricted while more than one faction is alive
    pub opposed: bool,
    pub pays_bank: bool,
    pub effect: Effect,
    pub enabled_by: &'static [Variant],
    pub disabled_by: &'static [Variant],
}

impl ActionDescriptor {
    pub fn is_visible(&self, variants: &VariantSet) -> bool {
        let enabled = self.enabled_by.is_empty() || self.enabled_by.iter().any(|&v| variants.contains(v));
        let disabled = self.disabled_by.iter().any(|&v| variants.contains(v));
        enabled && !disabled
    }

    pub fn is_challengeable(&self) -> bool {
        self.claim.is_some()
    }

    pub fn is_blockable(&self) -> bool {
        !self.blockers.is_empty()
    }

    pub fn opens_reaction(&self) -> bool {
        self.is_challengeable() || self.is_blockable()
    }

    pub fn needs_decision(&self) -> bool {
        self.effect.needs_decision()
    }

    pub fn can_block_with(&self, character: Character) -> bool {
        self.blockers.contains(&character)
    }

    pub fn cost_for<P: PartialEq>(&self, actor: &P, target: Option<&P>) -> u32 {
        match (target, self.targeted_cost) {
            (Some(target), Some(cost)) if target != actor => cost,
            _ => self.cost,
        }
    }
}

const fn descriptor(id: ActionId, effect: Effect) -> ActionDescriptor {
    ActionDescriptor {
        id,
        cost: 0,
        targeted_cost: None,
        targeting: Targeting::None,
        self_target: false,
        claim: None,
        blockers: &[],
        opposed: false,
        pays_bank: false,
        effect,
        enabled_by: &[],
        disabled_by: &[],
    }
}

pub static CATALOG: [ActionDescriptor; 12] = [
    descriptor(ActionId::Income, Effect::Gain(1)),
    ActionDescriptor {
        blockers: &[Duke],
        ..descriptor(ActionId::ForeignAid, Effect::Gain(2))
    },
    ActionDescriptor {
        cost: 7,
        targeting: Targeting::Required,
        opposed: true,
        ..descriptor(ActionId::Coup, Effect::LoseInfluence)
    },
    ActionDescriptor {
        claim: Some(Claim::Has(Duke)),
        ..descriptor(ActionId::Tax, Effect::Gain(3))
    },
    ActionDescriptor {
        cost: 3,
        targeting: Targeting::Required,
        claim: Some(Claim::Has(Assassin)),
        blockers: &[Contessa],
        opposed: true,
        ..descriptor(ActionId::Assassinate, Effect::LoseInfluence)
    },
    ActionDescriptor {
        targeting: Targeting::Required,
        claim: Some(Claim::Has(Captain)),
        blockers: &[Captain, Ambassador],
        opposed: true,
        disabled_by: &[Variant::Inquisitor],
        ..descriptor(ActionId::Steal, Effect::Steal(2))
    },
    ActionDescriptor {
        targeting: Targeting::Required,
        claim: Some(Claim::Has(Captain)),
        blockers: &[Captain, Inquisitor],
        opposed: true,
        enabled_by: &[Variant::Inquisitor],
        ..descriptor(ActionId::Steal, Effect::Steal(2))
    },
    ActionDescriptor {
        claim: Some(Claim::Has(Ambassador)),
        disabled_by: &[Variant::Inquisitor],
        ..descriptor(ActionId::Exchange, Effect::Exchange { draw: 2 })
    },
    ActionDescriptor {
        claim: Some(Claim::Has(Inquisitor)),
        enabled_by: &[Variant::Inquisitor],
        ..descriptor(ActionId::Exchange, Effect::Exchange { draw: 1 })
    },
    ActionDescriptor {
        targeting: Targeting::Required,
        claim: Some(Claim::Has(Inquisitor)),
        opposed: true,
        enabled_by: &[Variant::Inquisitor],
        ..descriptor(ActionId::Examine, Effect::Examine)
    },
    ActionDescriptor {
        cost: 1,
        targeted_cost: Some(2),
        targeting: Targeting::Optional,
        self_target: true,
        pays_bank: true,
        enabled_by: &[Reformation],
        ..descriptor(ActionId::Convert, Effect::Convert)
    },
    ActionDescriptor {
        claim: Some(Claim::Lacks(Duke)),
        enabled_by: &[Reformation, Incorporation],
        ..descriptor(ActionId::Embezzle, Effect::Embezzle)
    },
];

/// Read-only view of [`CATALOG`] filtered by variant.
pub struct ActionCatalog;

impl ActionCatalog {
    pub fn lookup(action: ActionId, variants: &VariantSet) -> Result<&'static ActionDescriptor, CoupError> {
        if let Some(descriptor) = CATALOG.iter().find(|d| d.id == action && d.is_visible(variants)) {
            return Ok(descriptor);
        }

        let mut enabled_by: Vec<Variant> = CATALOG
            .iter()
            .filter(|d| d.id == action)
            .flat_map(|d| d.enabled_by.iter().copied())
            .collect();
        enabled_by.sort();
        enabled_by.dedup();

        Err(CoupError::ActionNotInMode { action, enabled_by })
    }

    pub fn available(variants: &VariantSet) -> impl Iterator<Item = &'static ActionDescriptor> + '_ {
        CATALOG.iter().filter(move |d| d.is_visible(variants))
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{ActionCatalog, Claim, Targeting};
    use crate::Character::{Ambassador, Captain, Duke, Inquisitor};
    use crate::{ActionId, CoupError, Variant, VariantSet};

    #[test]
    fn base_catalog() {
        let base = VariantSet::base();
        let ids: Vec<ActionId> = ActionCatalog::available(&base).map(|d| d.id).collect();
        assert_eq!(ids, vec![
            ActionId::Income,
            ActionId::ForeignAid,
            ActionId::Coup,
            ActionId::Tax,
            ActionId::Assassinate,
            ActionId::Steal,
            ActionId::Exchange,
        ]);

        let income = ActionCatalog::lookup(ActionId::Income, &base).unwrap();
        assert!(!income.opens_reaction());
        assert!(!income.needs_decision());

        let coup = ActionCatalog::lookup(ActionId::Coup, &base).unwrap();
        assert_eq!(coup.cost, 7);
        assert_eq!(coup.targeting, Targeting::Required);
        assert!(!coup.opens_reaction());
        assert!(coup.needs_decision());
    }

    #[test]
    fn inquisitor_swaps_descriptors() {
        let inquisitor = VariantSet::from_iter([Variant::Inquisitor]);

        let steal = ActionCatalog::lookup(ActionId::Steal, &inquisitor).unwrap();
        assert!(steal.can_block_with(Inquisitor));
        assert!(steal.can_block_with(Captain));
        assert!(!steal.can_block_with(Ambassador));

        let exchange = ActionCatalog::lookup(ActionId::Exchange, &inquisitor).unwrap();
        assert_eq!(exchange.claim, Some(Claim::Has(Inquisitor)));

        let base_exchange = ActionCatalog::lookup(ActionId::Exchange, &VariantSet::base()).unwrap();
        assert_eq!(base_exchange.claim, Some(Claim::Has(Ambassador)));
    }

    #[test]
    fn names_enabling_variants() {
        match ActionCatalog::lookup(ActionId::Embezzle, &VariantSet::base()) {
            Err(CoupError::ActionNotInMode { action, enabled_by }) => {
                assert_eq!(action, ActionId::Embezzle);
                assert_eq!(enabled_by, vec![Variant::Reformation, Variant::Incorporation]);
            }
            other => panic!("expected ActionNotInMode, got {:?}", other),
        }

        let bank = VariantSet::from_iter([Variant::Incorporation]);
        let embezzle = ActionCatalog::lookup(ActionId::Embezzle, &bank).unwrap();
        assert_eq!(embezzle.claim, Some(Claim::Lacks(Duke)));
    }

    #[test]
    fn conversion_costs_more_for_others() {
        let reformation = VariantSet::from_iter([Variant::Reformation]);
        let convert = ActionCatalog::lookup(ActionId::Convert, &reformation).unwrap();
        assert_eq!(convert.cost_for(&"ada", None), 1);
        assert_eq!(convert.cost_for(&"ada", Some(&"ada")), 1);
        assert_eq!(convert.cost_for(&"ada", Some(&"bo")), 2);
    }
}
