use crate::map_layer::LegendCounts;
use crate::status::Status;
use crate::survey::SurveyType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

pub type OrgUnitId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatsPayload {
    #[serde(default)]
    pub stats: BTreeMap<String, CampaignStats>,
}

impl StatsPayload {
    /// Drops records without a district id or with more children marked
    /// than checked. Runs once, right after deserialization.
    pub fn validate(mut self) -> Self {
        for (campaign, stats) in self.stats.iter_mut() {
            for round in stats.rounds.iter_mut() {
                let number = round.number;
                round.data.retain(|name, record| {
                    if record.district.is_none() {
                        warn!(campaign = %campaign, round = number, district = %name, "dropping record without district id");
                        return false;
                    }
                    if record.total_child_fmd > record.total_child_checked {
                        warn!(
                            campaign = %campaign,
                            round = number,
                            district = %name,
                            "dropping record with {} marked out of {} checked",
                            record.total_child_fmd,
                            record.total_child_checked
                        );
                        return false;
                    }
                    true
                });
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CampaignStats {
    #[serde(default)]
    pub rounds: Vec<RoundStats>,
    #[serde(default)]
    pub districts_not_found: Vec<String>,
    #[serde(default)]
    pub country_id: Option<OrgUnitId>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub has_scope: bool,
}

impl CampaignStats {
    pub fn round(&self, number: u32) -> Option<&RoundStats> {
        self.rounds.iter().find(|round| round.number == number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoundStats {
    pub number: u32,
    #[serde(default)]
    pub data: BTreeMap<String, RoundDistrictData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDistrictData {
    #[serde(default)]
    pub district: Option<OrgUnitId>,
    #[serde(default)]
    pub total_child_checked: u64,
    #[serde(default)]
    pub total_child_fmd: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub care_giver_stats: Option<CareGiverStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    /// Server-computed status token, LQAS only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sites_visited: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CareGiverStats {
    #[serde(default)]
    pub caregivers_informed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregivers_informed_ratio: Option<f64>,
    /// Informer source (radio, town crier, ...) to ratio of caregivers.
    #[serde(flatten)]
    pub sources: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub obr_name: String,
    #[serde(default)]
    pub separate_scopes_per_round: bool,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl Campaign {
    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scope {
    #[serde(default)]
    pub group: ScopeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScopeGroup {
    #[serde(default)]
    pub org_units: Vec<OrgUnitId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Round {
    pub number: u32,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub started_at: Option<NaiveDate>,
    #[serde(default)]
    pub ended_at: Option<NaiveDate>,
    #[serde(default)]
    pub lqas_started_at: Option<NaiveDate>,
    #[serde(default)]
    pub lqas_ended_at: Option<NaiveDate>,
    #[serde(default)]
    pub im_started_at: Option<NaiveDate>,
    #[serde(default)]
    pub im_ended_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: OrgUnitId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<OrgUnitId>,
    #[serde(default)]
    pub geo_json: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCategory {
    Region,
    District,
}

impl ShapeCategory {
    pub fn as_param(self) -> &'static str {
        match self {
            ShapeCategory::Region => "REGION",
            ShapeCategory::District => "DISTRICT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: serde_json::Value,
    pub label: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OptionsPayload {
    List(Vec<DropdownOption>),
    Paged { results: Vec<DropdownOption> },
}

impl OptionsPayload {
    pub fn into_options(self) -> Vec<DropdownOption> {
        match self {
            OptionsPayload::List(options) => options,
            OptionsPayload::Paged { results } => results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayerEntry {
    pub shape: Shape,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RoundDistrictData>,
}

#[derive(Debug, Serialize)]
pub struct MapLayerResponse {
    pub survey: SurveyType,
    pub campaign: String,
    pub round: u32,
    pub has_scope: bool,
    pub districts_not_found: Vec<String>,
    pub legend: LegendCounts,
    pub entries: Vec<MapLayerEntry>,
    pub regions: Vec<Shape>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub name: String,
    pub districts: usize,
    pub passed: usize,
    pub total_child_checked: u64,
    pub total_child_fmd: u64,
    pub rate_passed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub survey: SurveyType,
    pub campaign: String,
    pub round: u32,
    pub has_scope: bool,
    pub scope_count: usize,
    pub counts: LegendCounts,
    pub rate_passed: String,
    pub total_child_checked: u64,
    pub total_child_fmd: u64,
    pub caregivers_informed: u64,
    pub caregivers_informed_ratio: String,
    pub regions: Vec<RegionSummary>,
    pub districts_not_found: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SideResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoundSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub left: SideResult,
    pub right: SideResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
