//! Integration tests for layered configuration

use brandline::cli::{Commands, ConfigCommands, RunContext};
use brandline::config::{ConfigLoader, ProviderType, WORKSPACE_CONFIG_FILE};
use brandline::provider::{ChatCompletionClient, ProviderFactory};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment access across the tests in this module.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Runs `f` with an isolated config home and the given variables set.
fn with_env<T>(temp: &TempDir, vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = ["XDG_CONFIG_HOME"]
        .iter()
        .map(|k| k.to_string())
        .chain(vars.iter().map(|(k, _)| k.to_string()))
        .map(|k| {
            let v = std::env::var(&k).ok();
            (k, v)
        })
        .collect();

    std::env::set_var("XDG_CONFIG_HOME", temp.path().join("xdg"));
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(&key, v),
            None => std::env::remove_var(&key),
        }
    }
    result
}

const WORKSPACE_TOML: &str = r#"
[providers.openai]
provider_type = "openai"
model = "gpt-4o-mini"
api_key = "sk-workspace"

[providers.ollama]
provider_type = "local"
model = "llama3"
endpoint = "http://localhost:11434/v1"

[pipeline]
provider = "openai"
temperature = 0.4
"#;

#[test]
fn test_workspace_file_is_loaded() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(WORKSPACE_CONFIG_FILE), WORKSPACE_TOML).unwrap();

    let config = with_env(&temp, &[], || ConfigLoader::load(temp.path())).unwrap();
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.providers["ollama"].provider_type, ProviderType::LocalCustom);
    assert_eq!(config.pipeline.temperature, 0.4);
    assert!(config.validate().is_ok());

    let (name, provider) = config.select_provider(None).unwrap();
    assert_eq!(name, "openai");
    let client = ProviderFactory::create_client(provider).unwrap();
    assert_eq!(client.provider_name(), "openai");
    assert_eq!(client.default_model(), "gpt-4o-mini");
}

#[test]
fn test_environment_file_overrides_workspace_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(WORKSPACE_CONFIG_FILE), WORKSPACE_TOML).unwrap();
    std::fs::create_dir_all(temp.path().join("config")).unwrap();
    std::fs::write(
        temp.path().join("config").join("staging.toml"),
        "[pipeline]\nprovider = \"ollama\"\n",
    )
    .unwrap();

    let config = with_env(&temp, &[("BRANDLINE_ENV", "staging")], || {
        ConfigLoader::load(temp.path())
    })
    .unwrap();
    assert_eq!(config.pipeline.provider.as_deref(), Some("ollama"));
    assert_eq!(config.pipeline.temperature, 0.4);
}

#[cfg(target_os = "linux")]
#[test]
fn test_global_file_sits_below_workspace_file() {
    let temp = TempDir::new().unwrap();
    let global_dir = temp.path().join("xdg").join("brandline");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        "[pipeline]\ntemperature = 1.1\nmax_tokens = 2048\n",
    )
    .unwrap();
    std::fs::write(temp.path().join(WORKSPACE_CONFIG_FILE), WORKSPACE_TOML).unwrap();

    let config = with_env(&temp, &[], || ConfigLoader::load(temp.path())).unwrap();
    assert_eq!(config.pipeline.temperature, 0.4);
    assert_eq!(config.pipeline.max_tokens, Some(2048));
}

#[test]
fn test_defaults_without_any_file() {
    let temp = TempDir::new().unwrap();
    let config = with_env(&temp, &[], || ConfigLoader::load(temp.path())).unwrap();
    assert!(config.providers.is_empty());
    assert_eq!(config.pipeline.temperature, 0.7);
    assert_eq!(config.logging.output, "stderr");
    assert!(config.select_provider(None).is_err());
}

#[test]
fn test_hosted_provider_without_key_is_rejected() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(WORKSPACE_CONFIG_FILE),
        r#"
[providers.claude]
provider_type = "anthropic"
model = "claude-sonnet"
api_key_env = "BRANDLINE_TEST_UNSET_KEY"
"#,
    )
    .unwrap();

    let config = with_env(&temp, &[], || ConfigLoader::load(temp.path())).unwrap();
    let (_, provider) = config.select_provider(None).unwrap();
    assert!(ProviderFactory::create_client(provider).is_err());
}

#[tokio::test]
async fn test_config_show_masks_api_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    std::fs::write(&path, WORKSPACE_TOML).unwrap();

    let context = RunContext::new(temp.path().to_path_buf(), Some(path)).unwrap();
    let shown = context
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .await
        .unwrap();
    assert!(shown.contains("[providers.openai]"));
    assert!(!shown.contains("sk-workspace"));

    let listed = context.execute(&Commands::Providers).await.unwrap();
    assert!(listed.contains("llama3"));
    assert!(listed.contains("gpt-4o-mini"));
}
