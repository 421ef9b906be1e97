//! Course-management HTTP server (Axum + SQLite).

pub mod error;
pub mod extract;
pub mod mail;
pub mod routes;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mail::Mailer;
use storage::Db;

/// Mail backend shared across handlers.
pub type SharedMailer = Arc<dyn Mailer>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub mailer: SharedMailer,
}

/// Server configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_url: String,
    pub jwt_secret: String,
    pub data_dir: PathBuf,
    pub web_dir: PathBuf,
    pub port: u16,
    pub schools: Vec<(String, String)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            jwt_secret: String::new(),
            data_dir: PathBuf::from("data"),
            web_dir: PathBuf::from("web/build"),
            port: 3000,
            schools: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read `BASE_URL`, `JWT_SECRET`, `PORT`, `CLASSROOM_DATA_DIR`,
    /// `CLASSROOM_WEB_DIR` and `CLASSROOM_SCHOOLS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_nonempty("BASE_URL") {
            cfg.base_url = v;
        }
        if let Some(v) = env_nonempty("JWT_SECRET") {
            cfg.jwt_secret = v;
        } else {
            tracing::warn!("JWT_SECRET not set; login and /api/me are disabled");
        }
        if let Some(v) = env_nonempty("CLASSROOM_DATA_DIR") {
            cfg.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty("CLASSROOM_WEB_DIR") {
            cfg.web_dir = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty("PORT") {
            match v.parse() {
                Ok(port) => cfg.port = port,
                Err(e) => tracing::warn!("ignoring PORT={v:?}: {e}"),
            }
        }
        if let Some(v) = env_nonempty("CLASSROOM_SCHOOLS") {
            cfg.schools = parse_school_list(&v);
        }

        cfg
    }

    pub fn auth_enabled(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse `id=Name;id=Name`. Entries without an `=` or with a blank side are skipped.
pub fn parse_school_list(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|entry| {
            let (id, name) = entry.split_once('=')?;
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() || name.is_empty() {
                tracing::warn!("skipping malformed school entry {entry:?}");
                return None;
            }
            Some((id.to_string(), name.to_string()))
        })
        .collect()
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SharedMailer {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}

/// Seconds since the unix epoch.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// All `/api` routes plus tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Schools
        .route("/schools", get(routes::schools::list_schools))
        // Auth
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me))
        // Password reset
        .route("/forgot-password", post(routes::password::forgot_password))
        .route("/reset-password", post(routes::password::reset_password))
        // Course management
        .route(
            "/course-management/create-course",
            post(routes::courses::create_course),
        )
        .route(
            "/course-management/add-to-course",
            post(routes::courses::add_to_course),
        )
        .route(
            "/course-management/courses/{id}",
            get(routes::courses::get_course),
        )
        // User management
        .route(
            "/user-management/delete-row",
            delete(routes::users::delete_user),
        )
        .route(
            "/user-management/update-role",
            put(routes::users::update_role),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_list_parsing() {
        let schools = parse_school_list("inst001=National Institute; inst002 = City College ;bad;=x");
        assert_eq!(
            schools,
            vec![
                ("inst001".to_string(), "National Institute".to_string()),
                ("inst002".to_string(), "City College".to_string()),
            ]
        );
        assert!(parse_school_list("").is_empty());
    }
}
