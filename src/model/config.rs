use serde::{Deserialize, Serialize};

/// Default data file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "tasks.jsonl";

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSONL data file
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Path to a briefing template file replacing the built-in one.
    #[serde(default)]
    pub template: Option<String>,
    /// Extra instructions substituted for `{{instructions}}` in the briefing.
    #[serde(default)]
    pub instructions: Option<String>,
}
