use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::compliance::{DurationRules, SamplingRules};

/// Main configuration structure for certflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CertflowConfig {
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Compliance rule tables injected into the calculators
    pub compliance: ComplianceConfig,
    /// Workflow engine settings
    pub workflow: WorkflowConfig,
    /// Database settings (optional)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
    /// Enable transition metrics collection
    pub metrics_enabled: bool,
}

/// Rule tables for the compliance calculators. Kept in configuration so a
/// jurisdiction-specific change (new duration band, different sampling cap)
/// does not require recompiling the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplianceConfig {
    pub sampling: SamplingRules,
    pub duration: DurationRules,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Capacity of the domain event channel
    pub event_channel_capacity: usize,
    /// Documentation sections required before submission to the CB
    pub required_documentation_sections: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for CertflowConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
                metrics_enabled: true,
            },
            compliance: ComplianceConfig {
                sampling: SamplingRules::default(),
                duration: DurationRules::default(),
            },
            workflow: WorkflowConfig {
                event_channel_capacity: 256,
                required_documentation_sections: vec![
                    "audit_plan".to_string(),
                    "audit_report".to_string(),
                    "findings_register".to_string(),
                    "evidence_index".to_string(),
                ],
            },
            database: Some(DatabaseConfig {
                url: ".certflow/certflow.db".to_string(),
                max_connections: 10,
                auto_migrate: true,
            }),
        }
    }
}

impl CertflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (certflow.toml, .certflow-rc)
    /// 3. Environment variables (prefixed with CERTFLOW_)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&CertflowConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("certflow.toml").exists() {
            builder = builder.add_source(File::with_name("certflow"));
        }

        if Path::new(".certflow-rc").exists() {
            builder = builder.add_source(File::with_name(".certflow-rc"));
        }

        builder = builder.add_source(
            Environment::with_prefix("CERTFLOW")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CertflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = CertflowConfig::load_env_file();
        CertflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CertflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
