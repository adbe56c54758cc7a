use crate::dates::{RoundDates, resolve_round_dates};
use crate::errors::AppError;
use crate::map_layer::{LegendCounts, build_map_layer};
use crate::models::{
    ComparisonResponse, DropdownOption, HealthResponse, MapLayerResponse, OrgUnitId, RoundSummary, ShapeCategory,
    SideResult,
};
use crate::query::{ComparisonQuery, DashboardQuery, QueryUpdate, Side, SideQuery};
use crate::scope::resolve_scope_for;
use crate::state::AppState;
use crate::stats::build_summary;
use crate::survey::SurveyType;
use crate::upstream::{OptionFilters, OptionsKind};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

type Params = Query<HashMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    country: OrgUnitId,
    campaign: String,
    round: u32,
}

impl Selection {
    fn from_side(side: &SideQuery) -> Result<Self, AppError> {
        let country = side
            .country
            .as_deref()
            .and_then(|value| value.parse::<OrgUnitId>().ok())
            .ok_or_else(|| AppError::missing_param("country"))?;
        let campaign = campaign_param(side)?;
        let round = side.round().ok_or_else(|| AppError::missing_param("round"))?;
        Ok(Self {
            country,
            campaign,
            round,
        })
    }
}

fn campaign_param(side: &SideQuery) -> Result<String, AppError> {
    side.campaign
        .as_deref()
        .filter(|value| value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .map(str::to_string)
        .ok_or_else(|| AppError::missing_param("campaign"))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_map(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Params,
) -> Result<Json<MapLayerResponse>, AppError> {
    let survey: SurveyType = survey.parse()?;
    let selection = Selection::from_side(&SideQuery::from_params(&params, None))?;
    let client = &state.client;

    let (payload, campaign, districts, regions) = tokio::try_join!(
        client.fetch_stats(survey, selection.country),
        client.fetch_campaign(&selection.campaign),
        client.fetch_shapes(selection.country, ShapeCategory::District),
        client.fetch_shapes(selection.country, ShapeCategory::Region),
    )?;

    let scope = resolve_scope_for(campaign.as_ref(), selection.round);
    let entries = build_map_layer(
        &payload.stats,
        &selection.campaign,
        selection.round,
        &districts,
        &scope,
        &survey,
    );
    let legend = LegendCounts::from_entries(&entries);
    let districts_not_found = payload
        .stats
        .get(&selection.campaign)
        .map(|stats| stats.districts_not_found.clone())
        .unwrap_or_default();

    info!(
        survey = %survey,
        campaign = %selection.campaign,
        round = selection.round,
        "map layer with {} of {} districts",
        entries.len(),
        districts.len()
    );

    Ok(Json(MapLayerResponse {
        survey,
        campaign: selection.campaign,
        round: selection.round,
        has_scope: !scope.is_empty(),
        districts_not_found,
        legend,
        entries,
        regions,
    }))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Params,
) -> Result<Json<RoundSummary>, AppError> {
    let survey: SurveyType = survey.parse()?;
    let side = SideQuery::from_params(&params, None);
    Ok(Json(summarize(&state, survey, &side).await?))
}

/// Left and right are independent pipelines; one failing does not affect
/// the other.
pub async fn get_comparison(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Params,
) -> Result<Json<ComparisonResponse>, AppError> {
    let survey: SurveyType = survey.parse()?;
    let query = ComparisonQuery::from_params(&params);
    let (left, right) = tokio::join!(
        summarize(&state, survey, &query.left),
        summarize(&state, survey, &query.right),
    );
    Ok(Json(ComparisonResponse {
        left: side_result(Side::Left, left),
        right: side_result(Side::Right, right),
    }))
}

fn side_result(side: Side, result: Result<RoundSummary, AppError>) -> SideResult {
    match result {
        Ok(summary) => SideResult {
            summary: Some(summary),
            error: None,
        },
        Err(err) => {
            warn!("{side:?} side of comparison failed: {err}");
            SideResult {
                summary: None,
                error: Some(err.message),
            }
        }
    }
}

async fn summarize(state: &AppState, survey: SurveyType, side: &SideQuery) -> Result<RoundSummary, AppError> {
    let selection = Selection::from_side(side)?;
    let client = &state.client;
    let (payload, campaign) = tokio::try_join!(
        client.fetch_stats(survey, selection.country),
        client.fetch_campaign(&selection.campaign),
    )?;
    let scope = resolve_scope_for(campaign.as_ref(), selection.round);
    Ok(build_summary(
        survey,
        &payload.stats,
        &selection.campaign,
        selection.round,
        &scope,
    ))
}

pub async fn get_dates(
    State(state): State<AppState>,
    Path(survey): Path<String>,
    Query(params): Params,
) -> Result<Json<RoundDates>, AppError> {
    let survey: SurveyType = survey.parse()?;
    let side = SideQuery::from_params(&params, None);
    let campaign_id = campaign_param(&side)?;
    let round = side.round().ok_or_else(|| AppError::missing_param("round"))?;

    let dates = match state.client.fetch_campaign(&campaign_id).await? {
        Some(campaign) => resolve_round_dates(&campaign, round, survey),
        None => RoundDates::default(),
    };
    Ok(Json(dates))
}

pub async fn get_options(
    State(state): State<AppState>,
    Path((survey, kind)): Path<(String, String)>,
    Query(filters): Query<OptionFilters>,
) -> Result<Json<Vec<DropdownOption>>, AppError> {
    let survey: SurveyType = survey.parse()?;
    let kind = match kind.as_str() {
        "countries" => OptionsKind::Countries,
        "campaigns" => OptionsKind::Campaigns,
        "rounds" => OptionsKind::Rounds,
        other => return Err(AppError::bad_request(format!("unknown option list '{other}'"))),
    };
    let options = state.client.fetch_options(kind, survey, &filters).await?;
    Ok(Json(options))
}

#[derive(Debug, Serialize)]
pub struct ReducedQuery<Q> {
    pub query: Q,
    pub params: Vec<(String, String)>,
}

pub async fn reduce_dashboard_query(Query(params): Params) -> Result<Json<ReducedQuery<DashboardQuery>>, AppError> {
    let update = update_param(&params)?;
    let query = DashboardQuery::from_params(&params).reduce(&update);
    let params = query.to_params();
    Ok(Json(ReducedQuery { query, params }))
}

pub async fn reduce_comparison_query(
    Query(params): Params,
) -> Result<Json<ReducedQuery<ComparisonQuery>>, AppError> {
    let update = update_param(&params)?;
    let side = params
        .get("side")
        .and_then(|value| Side::parse(value))
        .ok_or_else(|| AppError::missing_param("side"))?;
    let query = ComparisonQuery::from_params(&params).reduce(side, &update);
    let params = query.to_params();
    Ok(Json(ReducedQuery { query, params }))
}

fn update_param(params: &HashMap<String, String>) -> Result<QueryUpdate, AppError> {
    let field = params.get("set").ok_or_else(|| AppError::missing_param("set"))?;
    let value = params.get("value").map(String::as_str).unwrap_or_default();
    QueryUpdate::parse(field, value)
        .ok_or_else(|| AppError::bad_request(format!("cannot set '{field}' to '{value}'")))
}
