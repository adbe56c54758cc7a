use crate::models::{Campaign, OrgUnitId, Scope};
use std::collections::BTreeSet;
use tracing::warn;

/// District ids that were supposed to be surveyed in `round_number`. An
/// unknown round yields an empty set.
pub fn resolve_scope(campaign: &Campaign, round_number: u32) -> BTreeSet<OrgUnitId> {
    if !campaign.separate_scopes_per_round {
        return flatten(&campaign.scopes);
    }
    match campaign.round(round_number) {
        Some(round) => flatten(&round.scopes),
        None => {
            warn!(
                campaign = %campaign.id,
                "round {round_number} not found, no scope"
            );
            BTreeSet::new()
        }
    }
}

pub fn resolve_scope_for(campaign: Option<&Campaign>, round_number: u32) -> BTreeSet<OrgUnitId> {
    campaign
        .map(|campaign| resolve_scope(campaign, round_number))
        .unwrap_or_default()
}

fn flatten(scopes: &[Scope]) -> BTreeSet<OrgUnitId> {
    scopes
        .iter()
        .flat_map(|scope| scope.group.org_units.iter().copied())
        .collect()
}
