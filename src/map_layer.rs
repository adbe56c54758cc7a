use crate::models::{CampaignStats, MapLayerEntry, OrgUnitId, RoundDistrictData, Shape};
use crate::status::{Classifier, Status};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Joins one round of survey records onto the in-scope district shapes,
/// keeping shape order. Shapes without a record get [`Status::NoData`].
pub fn build_map_layer<C: Classifier + ?Sized>(
    stats: &BTreeMap<String, CampaignStats>,
    campaign_id: &str,
    round: u32,
    shapes: &[Shape],
    scope: &BTreeSet<OrgUnitId>,
    classifier: &C,
) -> Vec<MapLayerEntry> {
    if scope.is_empty() {
        return Vec::new();
    }

    let by_district = stats
        .get(campaign_id)
        .and_then(|campaign| campaign.round(round))
        .map(|round| index_by_district(&round.data))
        .unwrap_or_default();

    shapes
        .iter()
        .filter(|shape| scope.contains(&shape.id))
        .map(|shape| {
            let data = by_district.get(&shape.id).map(|(_, record)| *record);
            let status = data
                .map(|record| classifier.classify(record))
                .unwrap_or(Status::NoData);
            MapLayerEntry {
                shape: shape.clone(),
                status,
                data: data.cloned(),
            }
        })
        .collect()
}

/// One record per district id. When several names point at the same
/// district, the last one by name wins.
pub fn index_by_district(
    data: &BTreeMap<String, RoundDistrictData>,
) -> BTreeMap<OrgUnitId, (&str, &RoundDistrictData)> {
    data.iter()
        .filter_map(|(name, record)| record.district.map(|id| (id, (name.as_str(), record))))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LegendCounts {
    pub pass: usize,
    pub warning: usize,
    pub moderate: usize,
    pub poor: usize,
    pub fail: usize,
    pub no_data: usize,
    pub not_in_scope: usize,
}

impl LegendCounts {
    pub fn from_statuses<I: IntoIterator<Item = Status>>(statuses: I) -> Self {
        let mut counts = LegendCounts::default();
        for status in statuses {
            counts.add(status);
        }
        counts
    }

    pub fn from_entries(entries: &[MapLayerEntry]) -> Self {
        Self::from_statuses(entries.iter().map(|entry| entry.status))
    }

    pub fn add(&mut self, status: Status) {
        let slot = match status {
            Status::Pass => &mut self.pass,
            Status::Warning => &mut self.warning,
            Status::Moderate => &mut self.moderate,
            Status::Poor => &mut self.poor,
            Status::Fail => &mut self.fail,
            Status::NoData => &mut self.no_data,
            Status::NotInScope => &mut self.not_in_scope,
        };
        *slot += 1;
    }

    // not_in_scope is left out
    pub fn total(&self) -> usize {
        self.pass + self.warning + self.moderate + self.poor + self.fail + self.no_data
    }
}
