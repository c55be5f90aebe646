//! CLI route: build the runtime from configuration and dispatch commands.

use super::parse::{Commands, ConfigCommands, RunArgs};
use super::presentation::{
    format_audit_table, format_provider_table, format_session_summary, format_stage_failure,
    format_stage_line,
};
use crate::adapter::{LlmAdapter, DEFAULT_TEMPERATURE};
use crate::config::{BrandlineConfig, ConfigLoader};
use crate::pipeline::CampaignPipeline;
use crate::provider::{ProviderFactory, ResponseFormat};
use crate::types::{CampaignBrief, StageId};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runtime context: workspace plus loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: BrandlineConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path.as_deref() {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn from_config(workspace_root: PathBuf, config: BrandlineConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &BrandlineConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Run(args) => self.run(args).await,
            Commands::Providers => Ok(format_provider_table(&self.config)),
            Commands::Config { command } => self.config_command(command),
        }
    }

    fn config_command(&self, command: &ConfigCommands) -> Result<String> {
        match command {
            ConfigCommands::Show => Ok(self.config.to_redacted_toml()?),
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok(format!(
                    "Configuration valid ({} providers, workspace {})",
                    self.config.providers.len(),
                    self.workspace_root.display()
                )),
                Err(errors) => {
                    let lines: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
                    Err(anyhow!(
                        "Configuration has {} problem(s):\n{}",
                        errors.len(),
                        lines.join("\n")
                    ))
                }
            },
        }
    }

    fn build_pipeline(&self, args: &RunArgs) -> Result<CampaignPipeline> {
        self.config.pipeline.validate().map_err(|e| anyhow!(e))?;
        let (provider_name, provider_config) =
            self.config.select_provider(args.provider.as_deref())?;
        let client = ProviderFactory::create_client(provider_config)
            .with_context(|| format!("create client for provider '{}'", provider_name))?;
        if let Some(temperature) = self.config.pipeline.temperature_override() {
            warn!(
                temperature,
                default = DEFAULT_TEMPERATURE,
                "Sampling temperature overridden by configuration"
            );
        }
        let options = self
            .config
            .pipeline
            .completion_options(provider_config.provider_type);
        if options.response_format == ResponseFormat::Text {
            debug!(provider = %provider_name, "Provider has no JSON mode; relying on output recovery");
        }
        let adapter = LlmAdapter::with_options(Arc::from(client), options);
        let mut pipeline = CampaignPipeline::new(adapter);
        if let Some(model) = args.model.as_ref().or(self.config.pipeline.model.as_ref()) {
            pipeline = pipeline.with_model(model.clone());
        }
        info!(provider = %provider_name, model = pipeline.model(), "Pipeline ready");
        Ok(pipeline)
    }

    fn brief(args: &RunArgs) -> Result<CampaignBrief> {
        let product = match (&args.product, &args.product_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("read product description {}", path.display()))?,
            (None, None) => return Err(anyhow!("Provide --product or --product-file")),
        };
        Ok(CampaignBrief::new(
            args.brand.clone(),
            args.audience.clone(),
            args.objective.clone(),
            product,
        ))
    }

    async fn run(&self, args: &RunArgs) -> Result<String> {
        let brief = Self::brief(args)?;
        let pipeline = self.build_pipeline(args)?;
        let session_id = pipeline.create_session();

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling in-flight stage");
                on_interrupt.cancel();
            }
        });

        let mut lines = Vec::new();
        let mut failure = None;
        for stage in StageId::ALL.into_iter().filter(|s| *s <= args.through) {
            eprintln!("running {} ...", stage);
            match pipeline
                .run_stage(stage, &session_id, brief.clone(), &cancel)
                .await
            {
                Ok(output) => lines.push(format_stage_line(&output)),
                Err(err) => {
                    lines.push(format_stage_failure(stage, &err));
                    failure = Some(err);
                    break;
                }
            }
        }
        interrupt.abort();

        let session = pipeline.get_session(&session_id)?;
        lines.push(format_session_summary(&session));
        if let Some(report) = session.audit_report() {
            lines.push(format_audit_table(report));
        }
        if let Some(path) = &args.output {
            std::fs::write(path, session.to_pretty_json()?)
                .with_context(|| format!("write snapshot {}", path.display()))?;
            lines.push(format!("Snapshot written to {}", path.display()));
        }

        let rendered = lines.join("\n");
        match failure {
            Some(err) => Err(anyhow::Error::new(err).context(rendered)),
            None => Ok(rendered),
        }
    }
}
