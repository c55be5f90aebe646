//! Configuration loading facade.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::BrandlineConfig;
use crate::error::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the merged configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<BrandlineConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: BrandlineConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            providers = config.providers.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load a single explicit file over the built-in defaults.
    pub fn load_from_file(path: &Path) -> Result<BrandlineConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Load and validate, joining every validation problem into one error.
    pub fn load_validated(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<BrandlineConfig, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load(workspace_root)?,
        };
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ConfigError::Invalid(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(config)
    }
}
