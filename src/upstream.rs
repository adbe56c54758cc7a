use crate::cache::ResponseCache;
use crate::config::ServiceConfig;
use crate::errors::AppError;
use crate::models::{Campaign, DropdownOption, OptionsPayload, OrgUnitId, Shape, ShapeCategory, StatsPayload};
use crate::survey::SurveyType;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsKind {
    Countries,
    Campaigns,
    Rounds,
}

impl OptionsKind {
    fn path(self) -> &'static str {
        match self {
            OptionsKind::Countries => "/api/polio/lqasim/countriesoptions/",
            OptionsKind::Campaigns => "/api/polio/lqasim/campaignoptions/",
            OptionsKind::Rounds => "/api/polio/lqasim/roundoptions/",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OptionFilters {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub campaign: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShapesPayload {
    List(Vec<Shape>),
    Paged {
        #[serde(alias = "orgUnits", alias = "orgunits")]
        results: Vec<Shape>,
    },
}

#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    cache: Arc<Mutex<ResponseCache>>,
}

impl PlatformClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(AppError::internal)?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
            cache: Arc::new(Mutex::new(ResponseCache::new(config.cache_ttl))),
        })
    }

    pub async fn fetch_stats(&self, survey: SurveyType, country: OrgUnitId) -> Result<StatsPayload, AppError> {
        let path = match survey {
            SurveyType::Lqas => format!("/api/polio/lqasstats/{country}/"),
            SurveyType::Im(kind) => format!("/api/polio/lqasimmap/country/{}_{country}/", kind.slug()),
        };
        let payload: StatsPayload = self.get_json(&path, &[]).await?;
        Ok(payload.validate())
    }

    /// `None` when the platform does not know the campaign.
    pub async fn fetch_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>, AppError> {
        let path = format!("/api/polio/campaigns/{campaign_id}/");
        match self.get_value(&path, &[]).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => {
                warn!("campaign {campaign_id} not found upstream");
                Ok(None)
            }
        }
    }

    pub async fn fetch_shapes(&self, country: OrgUnitId, category: ShapeCategory) -> Result<Vec<Shape>, AppError> {
        let query = [
            ("asLocation", "true".to_string()),
            ("limit", "3000".to_string()),
            ("order", "id".to_string()),
            ("orgUnitParentId", country.to_string()),
            ("orgUnitTypeCategory", category.as_param().to_string()),
            ("validation_status", "VALID".to_string()),
        ];
        let payload: ShapesPayload = self.get_json("/api/orgunits/", &query).await?;
        Ok(match payload {
            ShapesPayload::List(shapes) => shapes,
            ShapesPayload::Paged { results } => results,
        })
    }

    pub async fn fetch_options(
        &self,
        kind: OptionsKind,
        survey: SurveyType,
        filters: &OptionFilters,
    ) -> Result<Vec<DropdownOption>, AppError> {
        let mut query = vec![("category", survey.category().to_string())];
        if let Some(month) = filters.month {
            query.push(("month", month.to_string()));
        }
        if let Some(year) = filters.year {
            query.push(("year", year.to_string()));
        }
        if let Some(country) = &filters.country {
            query.push(("country", country.clone()));
        }
        if let Some(campaign) = &filters.campaign {
            query.push(("campaign", campaign.clone()));
        }
        let payload: OptionsPayload = self.get_json(kind.path(), &query).await?;
        Ok(payload.into_options())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, AppError> {
        match self.get_value(path, query).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(AppError::bad_gateway(format!("upstream has no resource at {path}"))),
        }
    }

    async fn get_value(&self, path: &str, query: &[(&str, String)]) -> Result<Option<Value>, AppError> {
        let mut builder = self.http.get(format!("{}{}", self.base_url, path)).query(query);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let request = builder.build()?;
        let key = request.url().to_string();

        if let Some(value) = self.cache.lock().await.get(&key) {
            debug!("cache hit {key}");
            return Ok(Some(value));
        }

        debug!("GET {key}");
        let response = self.http.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: Value = response.error_for_status()?.json().await?;
        self.cache.lock().await.insert(key, value.clone());
        Ok(Some(value))
    }
}
