use crate::map_layer::{LegendCounts, index_by_district};
use crate::models::{CampaignStats, OrgUnitId, RegionSummary, RoundDistrictData, RoundSummary};
use crate::status::{Classifier, Status};
use crate::survey::SurveyType;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const NO_RATE: &str = "--";
const UNKNOWN_REGION: &str = "Unknown";
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedDistrict<'a> {
    pub id: OrgUnitId,
    pub name: &'a str,
    pub record: &'a RoundDistrictData,
    pub status: Status,
}

/// Classifies one record per district id. Records outside `scope` are marked
/// [`Status::NotInScope`] and never get a pass/fail status.
pub fn classify_round<'a, C: Classifier + ?Sized>(
    data: &'a BTreeMap<String, RoundDistrictData>,
    scope: &BTreeSet<OrgUnitId>,
    classifier: &C,
) -> Vec<ClassifiedDistrict<'a>> {
    index_by_district(data)
        .into_iter()
        .map(|(id, (name, record))| {
            let status = if scope.contains(&id) {
                classifier.classify(record)
            } else {
                Status::NotInScope
            };
            ClassifiedDistrict { id, name, record, status }
        })
        .collect()
}

pub fn build_summary(
    survey: SurveyType,
    stats: &BTreeMap<String, CampaignStats>,
    campaign_id: &str,
    round: u32,
    scope: &BTreeSet<OrgUnitId>,
) -> RoundSummary {
    let campaign_stats = stats.get(campaign_id);
    let empty = BTreeMap::new();
    let data = campaign_stats
        .and_then(|campaign| campaign.round(round))
        .map(|round| &round.data)
        .unwrap_or(&empty);

    let classified = classify_round(data, scope, &survey);
    let in_scope: Vec<&ClassifiedDistrict<'_>> = classified
        .iter()
        .filter(|district| district.status != Status::NotInScope)
        .collect();

    let mut counts = LegendCounts::from_statuses(classified.iter().map(|district| district.status));
    let reported: HashSet<OrgUnitId> = in_scope.iter().map(|district| district.id).collect();
    counts.no_data += scope.iter().filter(|id| !reported.contains(id)).count();

    let total_child_checked: u64 = in_scope.iter().map(|d| d.record.total_child_checked).sum();
    let total_child_fmd: u64 = in_scope.iter().map(|d| d.record.total_child_fmd).sum();
    let caregivers_informed: u64 = in_scope
        .iter()
        .filter_map(|d| d.record.care_giver_stats.as_ref())
        .map(|stats| stats.caregivers_informed)
        .sum();

    RoundSummary {
        survey,
        campaign: campaign_id.to_string(),
        round,
        has_scope: !scope.is_empty(),
        scope_count: scope.len(),
        counts,
        rate_passed: format_rate(counts.pass as u64, scope.len() as u64),
        total_child_checked,
        total_child_fmd,
        caregivers_informed,
        caregivers_informed_ratio: format_rate(caregivers_informed, total_child_checked),
        regions: summarize_regions(&in_scope),
        districts_not_found: campaign_stats
            .map(|campaign| campaign.districts_not_found.clone())
            .unwrap_or_default(),
    }
}

fn summarize_regions(districts: &[&ClassifiedDistrict<'_>]) -> Vec<RegionSummary> {
    let mut by_region: BTreeMap<&str, Vec<&ClassifiedDistrict<'_>>> = BTreeMap::new();
    for district in districts.iter().copied() {
        let region = district.record.region_name.as_deref().unwrap_or(UNKNOWN_REGION);
        by_region.entry(region).or_default().push(district);
    }

    by_region
        .into_iter()
        .map(|(name, members)| {
            let passed = members.iter().filter(|d| d.status == Status::Pass).count();
            RegionSummary {
                name: name.to_string(),
                districts: members.len(),
                passed,
                total_child_checked: members.iter().map(|d| d.record.total_child_checked).sum(),
                total_child_fmd: members.iter().map(|d| d.record.total_child_fmd).sum(),
                rate_passed: format_rate(passed as u64, members.len() as u64),
            }
        })
        .collect()
}

pub fn format_rate(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return NO_RATE.to_string();
    }
    round_percentage(numerator as f64 / denominator as f64 * 100.0)
}

pub fn round_percentage(raw: f64) -> String {
    if !raw.is_finite() {
        return NO_RATE.to_string();
    }
    let value = if raw.fract() == 0.0 && raw.abs() <= MAX_SAFE_INTEGER {
        raw
    } else {
        raw.round()
    };
    format!("{}", value as i64)
}
