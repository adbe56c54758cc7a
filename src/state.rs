use crate::config::ServiceConfig;
use crate::errors::AppError;
use crate::upstream::PlatformClient;

#[derive(Clone)]
pub struct AppState {
    pub client: PlatformClient,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: PlatformClient::new(config)?,
        })
    }
}
