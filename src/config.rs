use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,

    // Generation rate limit
    pub generation_limit: i32,
    pub generation_window_secs: i64,

    // Analytics
    pub tracked_features: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            allowed_origins: split_list(
                &env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string()),
            ),

            generation_limit: env::var("GENERATION_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GENERATION_LIMIT),
            generation_window_secs: env::var("GENERATION_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GENERATION_WINDOW_SECS),

            tracked_features: env::var("TRACKED_FEATURES")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| default_tracked_features()),
        })
    }

    /// Settings for running the router without a database or Redis, as the
    /// integration tests do.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            redis_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            generation_limit: DEFAULT_GENERATION_LIMIT,
            generation_window_secs: DEFAULT_GENERATION_WINDOW_SECS,
            tracked_features: default_tracked_features(),
        }
    }

    pub fn generation_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.generation_window_secs)
    }
}

pub const DEFAULT_GENERATION_LIMIT: i32 = 5;
pub const DEFAULT_GENERATION_WINDOW_SECS: i64 = 3600;

fn default_tracked_features() -> Vec<String> {
    [
        "idea_generation",
        "idea_validation",
        "file_generation",
        "github_import",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
