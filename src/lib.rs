pub mod app;
pub mod cache;
pub mod config;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod map_layer;
pub mod models;
pub mod query;
pub mod scope;
pub mod state;
pub mod stats;
pub mod status;
pub mod survey;
pub mod upstream;

pub use app::router;
pub use config::ServiceConfig;
pub use state::AppState;
