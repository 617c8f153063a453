//! HTTP surface of the host agent.
//!
//! | Route | Auth | Handler |
//! |-------|------|---------|
//! | `GET /health` | none | liveness |
//! | `POST /search` | bearer | [`host_agent_tools::SearchService`] |
//! | `POST /get_files` | bearer | [`host_agent_tools::FileRetrievalService`] |
//! | `POST /backup/n8n` | bearer | [`host_agent_tools::BackupRunner`] |

mod auth;
mod error;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use host_agent_config::Settings;
use host_agent_tools::{BackupRunner, FileRetrievalService, RipgrepRunner, SearchService};

pub use auth::BearerAuth;
pub use error::ApiError;

/// Services shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub search: SearchService,
    pub files: FileRetrievalService,
    pub backup: BackupRunner,
    pub auth: BearerAuth,
}

impl AppState {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            search: SearchService::new(
                &settings.search_root,
                RipgrepRunner::new(&settings.rg_binary, settings.search_timeout),
            ),
            files: FileRetrievalService::new(&settings.search_root),
            backup: BackupRunner::new(&settings.backup_script, settings.backup_timeout),
            auth: BearerAuth::new(settings.bearer_token.as_str()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let auth = Arc::new(state.auth.clone());
    let protected = Router::new()
        .route("/search", post(routes::search))
        .route("/get_files", post(routes::get_files))
        .route("/backup/n8n", post(routes::backup_n8n))
        .route_layer(middleware::from_fn_with_state(auth, auth::require_bearer));

    Router::new()
        .route("/health", get(routes::health))
        .merge(protected)
        .with_state(Arc::new(state))
}
