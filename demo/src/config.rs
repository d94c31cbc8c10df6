use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_batch_size: usize,
    pub default_actor: String,
    pub seed_mock_data: bool,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let max_batch_size = env_string("ODATA_MAX_BATCH", "100")
            .parse::<usize>()
            .context("ODATA_MAX_BATCH must be a non-negative integer")?;

        let seed_mock_data = env_string("ODATA_SEED_MOCK_DATA", "true")
            .parse::<bool>()
            .context("ODATA_SEED_MOCK_DATA must be true or false")?;

        Ok(Self {
            max_batch_size,
            default_actor: env_string("ODATA_DEFAULT_ACTOR", "anonymous"),
            seed_mock_data,
            log_filter: env_string("ODATA_LOG", "demo=info,odata_application=info"),
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
