mod claude;
mod codex;
mod openai;

pub use claude::ClaudeRunner;
pub use codex::CodexRunner;
pub use openai::OpenAiRunner;

use crate::config::{Provider, ProvidersConfig};
use crate::error::{ClassifierError, ProviderError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub struct ProviderOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub exit_code: i32,
}

/// Sends one prompt to a model and returns its raw answer.
#[async_trait]
pub trait Runner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, prompt: &str, timeout: Duration)
        -> Result<ProviderOutput, ProviderError>;
}

/// Create a runner for the configured provider.
///
/// Fails with `ModelInitialization` when the provider cannot possibly work:
/// an empty model name, a missing API key, or a binary path that does not exist.
pub fn create_runner(
    provider: Provider,
    providers: &ProvidersConfig,
) -> Result<Arc<dyn Runner>, ClassifierError> {
    match provider {
        Provider::ClaudeCli => {
            let cfg = &providers.claude_cli;
            require_model(provider, &cfg.model)?;
            require_binary(provider, &cfg.binary)?;
            Ok(Arc::new(ClaudeRunner {
                binary: cfg.binary.clone(),
                model: cfg.model.clone(),
            }))
        }
        Provider::CodexCli => {
            let cfg = &providers.codex_cli;
            require_model(provider, &cfg.model)?;
            require_binary(provider, &cfg.binary)?;
            Ok(Arc::new(CodexRunner {
                binary: cfg.binary.clone(),
                model: cfg.model.clone(),
            }))
        }
        Provider::Openai => {
            let cfg = &providers.openai;
            require_model(provider, &cfg.model)?;
            let api_key = std::env::var(&cfg.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    ClassifierError::ModelInitialization(format!(
                        "environment variable {} is not set",
                        cfg.api_key_env
                    ))
                })?;
            let runner = OpenAiRunner::new(cfg.clone(), api_key)
                .map_err(|e| ClassifierError::ModelInitialization(e.to_string()))?;
            Ok(Arc::new(runner))
        }
    }
}

fn require_model(provider: Provider, model: &str) -> Result<(), ClassifierError> {
    if model.trim().is_empty() {
        return Err(ClassifierError::ModelInitialization(format!(
            "no model configured for {}",
            provider
        )));
    }
    Ok(())
}

fn require_binary(provider: Provider, binary: &Path) -> Result<(), ClassifierError> {
    // Plain command names are resolved through PATH at spawn time
    if is_path_like(binary) && !binary.exists() {
        return Err(ClassifierError::ModelInitialization(format!(
            "{} binary not found at {}",
            provider,
            binary.display()
        )));
    }
    Ok(())
}

fn is_path_like(binary: &Path) -> bool {
    let binary_str = binary.to_string_lossy();
    binary_str.contains('/') || binary_str.contains('\\')
}

/// Build a command, letting the OS search PATH for bare binary names.
fn command_for(binary: &Path) -> tokio::process::Command {
    if is_path_like(binary) {
        tokio::process::Command::new(binary)
    } else {
        tokio::process::Command::new(binary.to_string_lossy().as_ref())
    }
}
