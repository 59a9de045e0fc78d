use crate::donors::ResultLimit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub env: Environment,
    pub log_level: String,
    pub geocoder_url: String,
    pub router_url: String,
    pub tile_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub geolocation_timeout_ms: u64,
    pub refresh_threshold_km: f64,
    pub default_limit: ResultLimit,
}
