// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layered Configuration
//!
//! Settings load from layered TOML files, highest precedence last:
//!
//! 1. `flowline.toml` (base, or the `--config` path)
//! 2. `flowline.{environment}.toml` (environment-specific)
//! 3. `flowline.local.toml` (developer overrides, not committed)
//! 4. `FLOWLINE_*` environment variables
//!
//! The environment resolves from an explicit setting, then the
//! `FLOWLINE_ENV` variable, then the conventional `APP_ENVIRONMENT`
//! variable, then defaults to `Production`.
//!
//! Recognized sections: `catalog` (data directory), `metadata` (export
//! directory and enabled providers), `pipelines` (per-pipeline
//! description, tags, validation overrides and typed parameters), and
//! `logging` (minimum level plus per-target overrides). Pipeline
//! parameters deserialize into strongly-typed structs and are validated
//! declaratively with `validator` annotations.

use config::{Config, Environment, File};
use flowline_domain::entry::InspectionLevel;
use flowline_domain::PipelineError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Default environment when nothing else names one.
pub const DEFAULT_ENVIRONMENT: &str = "Production";

/// Resolves the active environment name.
pub fn resolve_environment(explicit: Option<&str>) -> String {
    fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|candidate| !candidate.trim().is_empty())
    }

    non_empty(explicit.map(str::to_string))
        .or_else(|| non_empty(std::env::var("FLOWLINE_ENV").ok()))
        .or_else(|| non_empty(std::env::var("APP_ENVIRONMENT").ok()))
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// `catalog` section: where entry files live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub data_dir: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// `metadata` section: DAG export destination and enabled providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    pub output_dir: PathBuf,
    pub providers: Vec<String>,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("metadata"),
            providers: vec!["json".to_string()],
        }
    }
}

/// One `pipelines.<name>` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Per-entry inspection level overrides, keyed by entry key.
    pub validation: HashMap<String, InspectionLevel>,
    /// Free-form parameters, deserialized on demand into a typed struct.
    pub parameters: Option<toml::Value>,
}

impl PipelineSettings {
    /// Deserializes and declaratively validates the parameters section.
    pub fn parameters_as<P>(&self) -> Result<Option<P>, PipelineError>
    where
        P: DeserializeOwned + Validate,
    {
        let Some(value) = &self.parameters else {
            return Ok(None);
        };
        let params: P = value
            .clone()
            .try_into()
            .map_err(|error| PipelineError::invalid_config(format!("pipeline parameters: {}", error)))?;
        params
            .validate()
            .map_err(|error| PipelineError::invalid_config(format!("pipeline parameters: {}", error)))?;
        Ok(Some(params))
    }
}

/// `logging` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level for the whole binary.
    pub level: String,
    /// Per-target level overrides (`target = "level"`).
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            targets: HashMap::new(),
        }
    }
}

/// Root of the layered configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub environment: Option<String>,
    pub catalog: CatalogSettings,
    pub metadata: MetadataSettings,
    pub pipelines: HashMap<String, PipelineSettings>,
    pub logging: LoggingSettings,
}

impl AppSettings {
    /// Loads the layered configuration. Missing files are fine; a present
    /// but unparseable file is a configuration error.
    pub fn load(explicit_base: Option<&Path>) -> Result<Self, PipelineError> {
        let base_path = explicit_base.map_or_else(|| PathBuf::from("flowline.toml"), Path::to_path_buf);
        let stem = base_path.with_extension("");
        let stem = stem.to_string_lossy().into_owned();

        // The environment-specific layer needs the environment name, and
        // the base file's explicit `environment` setting has the highest
        // priority; read the base layer alone first.
        let base_only: AppSettings = Config::builder()
            .add_source(File::from(base_path.clone()).required(explicit_base.is_some()))
            .build()
            .map_err(|error| PipelineError::invalid_config(format!("configuration: {}", error)))?
            .try_deserialize()
            .map_err(|error| PipelineError::invalid_config(format!("configuration: {}", error)))?;
        let environment = resolve_environment(base_only.environment.as_deref());

        let settings: AppSettings = Config::builder()
            .add_source(File::from(base_path.clone()).required(explicit_base.is_some()))
            .add_source(File::with_name(&format!("{}.{}", stem, environment.to_lowercase())).required(false))
            .add_source(File::with_name(&format!("{}.local", stem)).required(false))
            .add_source(Environment::with_prefix("FLOWLINE").separator("__"))
            .build()
            .map_err(|error| PipelineError::invalid_config(format!("configuration: {}", error)))?
            .try_deserialize()
            .map_err(|error| PipelineError::invalid_config(format!("configuration: {}", error)))?;

        Ok(settings)
    }

    /// Settings for one pipeline, when a section exists.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineSettings> {
        self.pipelines.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_environment_resolution_priority() {
        assert_eq!(resolve_environment(Some("Staging")), "Staging");
        assert_eq!(resolve_environment(Some("  ")), resolve_environment(None));
    }

    #[test]
    fn test_default_settings_are_usable() {
        let settings = AppSettings::default();
        assert_eq!(settings.catalog.data_dir, PathBuf::from("data"));
        assert_eq!(settings.logging.level, "info");
        assert!(settings.pipelines.is_empty());
    }

    #[derive(Debug, Deserialize, Validate)]
    struct FakeParams {
        #[validate(range(min = 0.01, max = 0.99))]
        ratio: f64,
    }

    #[test]
    fn test_parameters_deserialize_and_validate() {
        let section: PipelineSettings = toml::from_str(
            r#"
            description = "split demo"
            [parameters]
            ratio = 0.4
            "#,
        )
        .unwrap();
        let params: FakeParams = section.parameters_as().unwrap().expect("present");
        assert!((params.ratio - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_parameters_are_rejected() {
        let section: PipelineSettings = toml::from_str(
            r#"
            [parameters]
            ratio = 1.4
            "#,
        )
        .unwrap();
        let err = section.parameters_as::<FakeParams>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_validation_overrides_parse_from_toml() {
        let section: PipelineSettings = toml::from_str(
            r#"
            [validation]
            raw_reviews = "deep"
            companies = "none"
            "#,
        )
        .unwrap();
        assert_eq!(section.validation.get("raw_reviews"), Some(&InspectionLevel::Deep));
        assert_eq!(section.validation.get("companies"), Some(&InspectionLevel::None));
    }
}
