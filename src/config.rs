use serde::{Deserialize, Serialize};
use std::env;

/// CLI configuration, loaded from the environment with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub ledger_path: String,
    pub key_path: String,
    pub quorum_threshold: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let ledger_path =
            env::var("CHAINSEAL_LEDGER_PATH").unwrap_or_else(|_| "chainseal.ledger".to_string());

        let key_path =
            env::var("CHAINSEAL_KEY_PATH").unwrap_or_else(|_| "chainseal.key".to_string());

        let quorum_threshold = env::var("CHAINSEAL_QUORUM")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        Ok(AppConfig {
            ledger_path,
            key_path,
            quorum_threshold,
        })
    }
}
