//! Dashboard selection state as carried in the URL.

use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Map,
    List,
}

impl Tab {
    pub fn parse(value: &str) -> Option<Tab> {
        match value.trim().to_ascii_lowercase().as_str() {
            "map" => Some(Tab::Map),
            "list" => Some(Tab::List),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Map => "map",
            Tab::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn parse(value: &str) -> Option<Side> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryUpdate {
    SetCountry(String),
    SetCampaign(String),
    SetRounds(Vec<u32>),
    SetTab(Tab),
    Clear,
}

impl QueryUpdate {
    pub fn parse(field: &str, value: &str) -> Option<QueryUpdate> {
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "country" if !value.is_empty() => Some(QueryUpdate::SetCountry(value.to_string())),
            "campaign" if !value.is_empty() => Some(QueryUpdate::SetCampaign(value.to_string())),
            "round" | "rounds" => Some(QueryUpdate::SetRounds(parse_rounds(value))),
            "tab" => Tab::parse(value).map(QueryUpdate::SetTab),
            "clear" => Some(QueryUpdate::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SideQuery {
    pub campaign: Option<String>,
    pub country: Option<String>,
    pub rounds: Vec<u32>,
}

impl SideQuery {
    pub fn from_params(params: &HashMap<String, String>, side: Option<Side>) -> Self {
        let get = |key: &str| {
            params
                .get(&param_name(side, key))
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };
        let rounds = get("rounds").or_else(|| get("round")).map(parse_rounds).unwrap_or_default();
        SideQuery {
            campaign: get("campaign").map(str::to_string),
            country: get("country").map(str::to_string),
            rounds,
        }
    }

    pub fn round(&self) -> Option<u32> {
        self.rounds.first().copied()
    }

    /// Country changes invalidate the campaign and rounds; campaign changes
    /// invalidate the rounds.
    pub fn reduce(&self, update: &QueryUpdate) -> Self {
        match update {
            QueryUpdate::SetCountry(country) if self.country.as_deref() != Some(country.as_str()) => {
                SideQuery {
                    country: Some(country.clone()),
                    ..SideQuery::default()
                }
            }
            QueryUpdate::SetCampaign(campaign) if self.campaign.as_deref() != Some(campaign.as_str()) => {
                SideQuery {
                    campaign: Some(campaign.clone()),
                    country: self.country.clone(),
                    rounds: Vec::new(),
                }
            }
            QueryUpdate::SetRounds(rounds) => SideQuery {
                rounds: rounds.clone(),
                ..self.clone()
            },
            QueryUpdate::Clear => SideQuery::default(),
            _ => self.clone(),
        }
    }

    pub fn to_params(&self, side: Option<Side>) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(campaign) = &self.campaign {
            params.push((param_name(side, "campaign"), campaign.clone()));
        }
        if let Some(country) = &self.country {
            params.push((param_name(side, "country"), country.clone()));
        }
        if !self.rounds.is_empty() {
            let rounds: Vec<String> = self.rounds.iter().map(u32::to_string).collect();
            params.push((param_name(side, "rounds"), rounds.join(",")));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardQuery {
    #[serde(flatten)]
    pub side: SideQuery,
    pub tab: Tab,
}

impl DashboardQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        DashboardQuery {
            side: SideQuery::from_params(params, None),
            tab: parse_tab(params),
        }
    }

    pub fn reduce(&self, update: &QueryUpdate) -> Self {
        match update {
            QueryUpdate::SetTab(tab) => DashboardQuery {
                tab: *tab,
                side: self.side.clone(),
            },
            QueryUpdate::Clear => DashboardQuery {
                tab: self.tab,
                side: SideQuery::default(),
            },
            other => DashboardQuery {
                side: self.side.reduce(other),
                tab: self.tab,
            },
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = self.side.to_params(None);
        params.push(("tab".to_string(), self.tab.as_str().to_string()));
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComparisonQuery {
    pub left: SideQuery,
    pub right: SideQuery,
    pub tab: Tab,
}

impl ComparisonQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        ComparisonQuery {
            left: SideQuery::from_params(params, Some(Side::Left)),
            right: SideQuery::from_params(params, Some(Side::Right)),
            tab: parse_tab(params),
        }
    }

    pub fn reduce(&self, side: Side, update: &QueryUpdate) -> Self {
        if let QueryUpdate::SetTab(tab) = update {
            return ComparisonQuery {
                tab: *tab,
                ..self.clone()
            };
        }
        let mut next = self.clone();
        match side {
            Side::Left => next.left = self.left.reduce(update),
            Side::Right => next.right = self.right.reduce(update),
        }
        next
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = self.left.to_params(Some(Side::Left));
        params.extend(self.right.to_params(Some(Side::Right)));
        params.push(("tab".to_string(), self.tab.as_str().to_string()));
        params
    }
}

fn param_name(side: Option<Side>, key: &str) -> String {
    match side {
        None => key.to_string(),
        Some(side) => {
            let mut chars = key.chars();
            let capitalized: String = match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            };
            format!("{}{}", side.prefix(), capitalized)
        }
    }
}

fn parse_tab(params: &HashMap<String, String>) -> Tab {
    params.get("tab").and_then(|value| Tab::parse(value)).unwrap_or_default()
}

fn parse_rounds(value: &str) -> Vec<u32> {
    let mut rounds = Vec::new();
    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.parse::<u32>() {
            Ok(round) if !rounds.contains(&round) => rounds.push(round),
            Ok(_) => {}
            Err(_) => warn!("ignoring invalid round {item:?}"),
        }
    }
    rounds
}
