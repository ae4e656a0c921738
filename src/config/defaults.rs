use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_concurrency() -> usize {
    6
}

pub fn default_target_chunk_count() -> usize {
    10
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

pub fn default_timeout_sec() -> u64 {
    120
}

pub fn default_chunk_timeout_sec() -> u64 {
    600
}

pub fn default_launch_delay_ms() -> u64 {
    100
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    // Fall back to PATH lookup
    PathBuf::from("claude")
}

pub fn default_claude_model() -> String {
    "sonnet".to_string()
}

pub fn default_codex_binary() -> PathBuf {
    PathBuf::from("codex")
}

pub fn default_codex_model() -> String {
    "gpt-4.1".to_string()
}

pub fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4".to_string()
}

pub fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_top_p() -> f32 {
    0.95
}

pub fn default_max_tokens() -> u32 {
    1024
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_true() -> bool {
    true
}
