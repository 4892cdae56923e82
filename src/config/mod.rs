#[cfg(feature = "cli")]
pub mod cli;

use crate::core::transform::{Operation, TransformSpec};
use crate::domain::model::{DestinationDescriptor, SourceDescriptor};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Everything one run needs, loaded once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalConfig>,
    #[serde(default)]
    pub data_sources: Vec<SourceDescriptor>,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Base directory for relative source and destination paths
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    pub destination: DestinationDescriptor,
}

impl AutomatorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Base directory for relative file paths. Defaults to the process's
    /// current directory.
    pub fn working_directory(&self) -> PathBuf {
        self.global
            .as_ref()
            .and_then(|g| g.working_directory.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// 替換環境變數 (例如 ${API_KEY}); unset variables stay as written.
fn substitute_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

impl Validate for AutomatorConfig {
    fn validate(&self) -> Result<()> {
        if self.data_sources.is_empty() {
            tracing::warn!("No data sources configured; the run will produce no records");
        }

        for (index, source) in self.data_sources.iter().enumerate() {
            let prefix = format!("data_sources[{}]", index);
            match source {
                SourceDescriptor::Api(api) => {
                    validate_url(&format!("{}.url", prefix), &api.url)?;
                    if let Some(timeout) = api.timeout_seconds {
                        validate_positive_number(
                            &format!("{}.timeout_seconds", prefix),
                            timeout,
                            1,
                        )?;
                    }
                }
                SourceDescriptor::File(file) => {
                    validate_path(&format!("{}.file_path", prefix), &file.path)?;
                }
            }

            if source.field_mapping().is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("{}.mapping", prefix),
                    value: "{}".to_string(),
                    reason: "Mapping must name at least one field".to_string(),
                });
            }
            for (output, native) in source.field_mapping() {
                validate_non_empty_string(&format!("{}.mapping", prefix), output)?;
                validate_non_empty_string(&format!("{}.mapping.{}", prefix, output), native)?;
            }
        }

        for (index, spec) in self.pipeline.transforms.iter().enumerate() {
            let prefix = format!("pipeline.transforms[{}]", index);
            validate_non_empty_string(&format!("{}.output", prefix), &spec.output)?;

            if let Operation::Concat { fields, .. } = &spec.operation {
                if fields.is_empty() {
                    return Err(EtlError::InvalidConfigValueError {
                        field: format!("{}.fields", prefix),
                        value: "[]".to_string(),
                        reason: "concat needs at least one field".to_string(),
                    });
                }
            }
            for field in spec.operation.referenced_fields() {
                validate_non_empty_string(&format!("{}.field", prefix), &field)?;
            }
        }

        let mut seen = std::collections::HashSet::new();
        for spec in &self.pipeline.transforms {
            if !seen.insert(spec.output.as_str()) {
                tracing::warn!(
                    "Transform output '{}' is declared more than once; the last rule wins",
                    spec.output
                );
            }
        }

        match &self.pipeline.destination {
            DestinationDescriptor::File(file) => {
                validate_path("pipeline.destination.file_path", &file.path)
            }
            DestinationDescriptor::Api(api) => {
                validate_url("pipeline.destination.url", &api.url)?;
                if let Some(timeout) = api.timeout_seconds {
                    validate_positive_number("pipeline.destination.timeout_seconds", timeout, 1)?;
                }
                Ok(())
            }
        }
    }
}
