use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub api: ApiConfig,
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the questionnaire REST API. Empty selects the built-in
    /// demo backend.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: String,
    /// Destination control is handed to when the questionnaire finishes.
    pub exit: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            project: ProjectConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: 30,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: "demo".to_string(),
            exit: "/summary/".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from defaults, an optional config file and
    /// environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&EngineConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("config").required(false));

        // Add environment variables with prefix "INTERVIEW_"
        config = config.add_source(
            config::Environment::with_prefix("INTERVIEW")
                .separator("_")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let engine_config: EngineConfig = config.try_deserialize()?;

        Ok(engine_config)
    }
}
