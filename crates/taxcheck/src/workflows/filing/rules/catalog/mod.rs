//! The standard rule table, one file per stage.

mod adjustments;
mod credits;
mod deductions;
mod income;
mod optimization;
mod state;
mod totals;

use super::registry::{RuleDescriptor, Scenario};

pub(super) const FEDERAL: &[Scenario] = &[
    Scenario::FedW2,
    Scenario::Fed1099,
    Scenario::FedInvestments,
];
pub(super) const W2: &[Scenario] = &[Scenario::FedW2];
pub(super) const NEC: &[Scenario] = &[Scenario::Fed1099];
pub(super) const INVESTMENTS: &[Scenario] = &[Scenario::FedInvestments];
pub(super) const EARNED: &[Scenario] = &[Scenario::FedW2, Scenario::Fed1099];
pub(super) const STATE: &[Scenario] = &[
    Scenario::CaW2,
    Scenario::Ca1099,
    Scenario::NyW2,
    Scenario::Ny1099,
];
pub(super) const STATE_W2: &[Scenario] = &[Scenario::CaW2, Scenario::NyW2];
pub(super) const STATE_NEC: &[Scenario] = &[Scenario::Ca1099, Scenario::Ny1099];
pub(super) const CALIFORNIA: &[Scenario] = &[Scenario::CaW2, Scenario::Ca1099];

pub(super) fn standard_rules() -> Vec<RuleDescriptor> {
    let mut rules = Vec::new();
    rules.extend(income::rules());
    rules.extend(adjustments::rules());
    rules.extend(deductions::rules());
    rules.extend(credits::rules());
    rules.extend(totals::rules());
    rules.extend(optimization::rules());
    rules.extend(state::rules());
    rules
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn rule_ids_are_unique() {
        let rules = standard_rules();
        let ids = rules.iter().map(|rule| rule.id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn every_rule_carries_scenarios_and_citation() {
        for rule in standard_rules() {
            assert!(!rule.scenarios.is_empty(), "{} has no scenarios", rule.id);
            assert!(!rule.citation.section.is_empty(), "{} has no citation", rule.id);
        }
    }

    #[test]
    fn state_rules_never_carry_federal_tags() {
        for rule in state::rules() {
            assert!(
                rule.scenarios.iter().all(|scenario| !FEDERAL.contains(scenario)),
                "{} is tagged federal",
                rule.id
            );
        }
    }
}
