use serde::Deserialize;

use crate::engine::RandomWalk;
use crate::services::recommendations::Strategy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; ratings are kept in memory when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL, used to cache poster lookups
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Poster API key; poster lookups are disabled when unset
    #[serde(default)]
    pub poster_api_key: Option<String>,

    /// Poster API base URL
    #[serde(default = "default_poster_api_url")]
    pub poster_api_url: String,

    /// Directory holding `ratings.csv` and `movies.csv`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub recommendation_strategy: Strategy,

    /// Random-walk iteration cap
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Random-walk L1 convergence threshold
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Cut-off used by the offline evaluation
    #[serde(default = "default_eval_k")]
    pub eval_k: usize,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_poster_api_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_data_dir() -> String {
    "data/ml-latest-small".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_iterations() -> usize {
    RandomWalk::default().max_iterations
}

fn default_tolerance() -> f64 {
    RandomWalk::default().tolerance
}

fn default_eval_k() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn random_walk(&self) -> RandomWalk {
        RandomWalk::new(self.max_iterations, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.poster_api_key, None);
        assert_eq!(config.data_dir, "data/ml-latest-small");
        assert_eq!(config.port, 3000);
        assert_eq!(config.recommendation_strategy, Strategy::RandomWalk);
        assert_eq!(config.random_walk(), RandomWalk::default());
        assert_eq!(config.eval_k, 10);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/graphrec"),
            ("RECOMMENDATION_STRATEGY", "neighbors"),
            ("MAX_ITERATIONS", "50"),
            ("TOLERANCE", "0.001"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/graphrec")
        );
        assert_eq!(config.recommendation_strategy, Strategy::Neighbors);
        assert_eq!(config.random_walk(), RandomWalk::new(50, 0.001));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_strategy() {
        assert!(Config::from_vars(vars(&[("RECOMMENDATION_STRATEGY", "popular")])).is_err());
    }
}
