use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Which provider backs the classifier
    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Run chunks concurrently or one at a time
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Maximum chunk summaries in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of chunks to aim for; the planner never produces more
    #[serde(default = "default_target_chunk_count")]
    pub target_chunk_count: usize,

    /// When set, chunks hold at most this many reviews and `target_chunk_count` is ignored
    #[serde(default)]
    pub max_reviews_per_chunk: Option<usize>,

    /// Timeout for one provider call
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,

    /// Wall-clock budget for summarizing one chunk, retries included
    #[serde(default = "default_chunk_timeout_sec")]
    pub chunk_timeout_sec: u64,

    #[serde(default = "default_launch_delay_ms")]
    pub launch_delay_ms: u64,

    /// Classify reviews that arrive without a sentiment before chunking
    #[serde(default = "default_true")]
    pub classify_unlabeled: bool,

    #[serde(default)]
    pub failed_chunk_policy: FailedChunkPolicy,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    ClaudeCli,
    CodexCli,
    Openai,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::ClaudeCli => write!(f, "claude_cli"),
            Provider::CodexCli => write!(f, "codex_cli"),
            Provider::Openai => write!(f, "openai"),
        }
    }
}

/// How reviews are partitioned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunking {
    /// At most this many chunks, the last one taking the remainder
    Target(usize),
    /// At most this many reviews per chunk
    MaxPerChunk(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Parallel,
    Sequential,
}

/// What to do with a chunk whose summary failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailedChunkPolicy {
    /// Exclude the chunk and report it in coverage
    #[default]
    Drop,
    /// Summarize each review of the chunk on its own and merge the results
    RetryIndividually,
    /// Split the chunk in two halves and summarize each once more
    Split,
}

impl std::fmt::Display for FailedChunkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedChunkPolicy::Drop => write!(f, "drop"),
            FailedChunkPolicy::RetryIndividually => write!(f, "retry_individually"),
            FailedChunkPolicy::Split => write!(f, "split"),
        }
    }
}

impl std::str::FromStr for FailedChunkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "drop" => Ok(FailedChunkPolicy::Drop),
            "retry_individually" | "retry" => Ok(FailedChunkPolicy::RetryIndividually),
            "split" => Ok(FailedChunkPolicy::Split),
            _ => Err(format!("Unknown failed chunk policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude_cli: ClaudeCliConfig,

    #[serde(default)]
    pub codex_cli: CodexCliConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ClaudeCliConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_claude_model")]
    pub model: String,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
            model: default_claude_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CodexCliConfig {
    #[serde(default = "default_codex_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_codex_model")]
    pub model: String,
}

impl Default for CodexCliConfig {
    fn default() -> Self {
        Self {
            binary: default_codex_binary(),
            model: default_codex_model(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            model: default_openai_model(),
            api_key_env: default_openai_api_key_env(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}
