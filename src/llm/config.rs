//! LLM configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_ANALYSIS_MAX_TOKENS: u32 = 500;
pub const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_FOLLOW_UP_MAX_TOKENS: u32 = 500;
pub const DEFAULT_FOLLOW_UP_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Anthropic,
    OpenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiApiMode {
    ChatCompletions,
    Responses,
}

/// `OpenAI` vision detail hint sent with every image part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDetail {
    Low,
    High,
    Auto,
}

impl ImageDetail {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: String,
    pub model: String,
    pub openai_mode: OpenAiApiMode,
    pub openai_base_url: String,
    pub image_detail: ImageDetail,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `LLM_PROVIDER`: `openai` (default) or `anthropic`
    /// - `LLM_API_KEY_ENV`: names the env var containing the key
    ///   (default `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`)
    /// - `LLM_MODEL`: provider default when absent
    /// - `LLM_OPENAI_MODE`: `chat_completions` (default) or `responses`
    /// - `LLM_OPENAI_BASE_URL`: default `OpenAI` API base URL
    /// - `IMAGE_DETAIL`: `high` (default), `low`, or `auto`
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error when the key variable is unset or an enumerated
    /// value is not recognized.
    pub fn from_env() -> Result<Self, LlmError> {
        let provider = parse_provider(std::env::var("LLM_PROVIDER").ok().as_deref())?;

        let key_var = std::env::var("LLM_API_KEY_ENV").unwrap_or_else(|_| default_key_var(provider).to_string());
        let api_key = std::env::var(&key_var).map_err(|_| LlmError::MissingApiKey { var: key_var.clone() })?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model(provider).to_string());
        let openai_mode = parse_openai_mode(std::env::var("LLM_OPENAI_MODE").ok().as_deref())?;
        let openai_base_url = std::env::var("LLM_OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let image_detail = parse_image_detail(std::env::var("IMAGE_DETAIL").ok().as_deref())?;
        let timeouts = LlmTimeouts {
            request_secs: env_parse("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { provider, api_key, model, openai_mode, openai_base_url, image_detail, timeouts })
    }
}

/// Output bound and sampling temperature for one kind of inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationSettings {
    /// Image analysis: low variance. `ANALYSIS_MAX_TOKENS`, `ANALYSIS_TEMPERATURE`.
    #[must_use]
    pub fn analysis_from_env() -> Self {
        Self {
            max_tokens: env_parse("ANALYSIS_MAX_TOKENS", DEFAULT_ANALYSIS_MAX_TOKENS),
            temperature: env_parse("ANALYSIS_TEMPERATURE", DEFAULT_ANALYSIS_TEMPERATURE),
        }
    }

    /// Follow-up chat: more variance. `FOLLOW_UP_MAX_TOKENS`, `FOLLOW_UP_TEMPERATURE`.
    #[must_use]
    pub fn follow_up_from_env() -> Self {
        Self {
            max_tokens: env_parse("FOLLOW_UP_MAX_TOKENS", DEFAULT_FOLLOW_UP_MAX_TOKENS),
            temperature: env_parse("FOLLOW_UP_TEMPERATURE", DEFAULT_FOLLOW_UP_TEMPERATURE),
        }
    }

    #[must_use]
    pub fn analysis_defaults() -> Self {
        Self { max_tokens: DEFAULT_ANALYSIS_MAX_TOKENS, temperature: DEFAULT_ANALYSIS_TEMPERATURE }
    }

    #[must_use]
    pub fn follow_up_defaults() -> Self {
        Self { max_tokens: DEFAULT_FOLLOW_UP_MAX_TOKENS, temperature: DEFAULT_FOLLOW_UP_TEMPERATURE }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_provider(raw: Option<&str>) -> Result<LlmProviderKind, LlmError> {
    match raw.unwrap_or("openai") {
        "anthropic" => Ok(LlmProviderKind::Anthropic),
        "openai" => Ok(LlmProviderKind::OpenAi),
        other => Err(LlmError::ConfigParse(format!("unknown LLM_PROVIDER: {other}"))),
    }
}

fn parse_openai_mode(raw: Option<&str>) -> Result<OpenAiApiMode, LlmError> {
    match raw.unwrap_or("chat_completions") {
        "responses" => Ok(OpenAiApiMode::Responses),
        "chat_completions" => Ok(OpenAiApiMode::ChatCompletions),
        other => Err(LlmError::ConfigParse(format!(
            "unsupported openai_api mode '{other}' (expected 'responses' or 'chat_completions')"
        ))),
    }
}

fn parse_image_detail(raw: Option<&str>) -> Result<ImageDetail, LlmError> {
    match raw.unwrap_or("high") {
        "high" => Ok(ImageDetail::High),
        "low" => Ok(ImageDetail::Low),
        "auto" => Ok(ImageDetail::Auto),
        other => Err(LlmError::ConfigParse(format!("unknown IMAGE_DETAIL: {other}"))),
    }
}

fn default_key_var(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        LlmProviderKind::OpenAi => "OPENAI_API_KEY",
    }
}

fn default_model(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Anthropic => "claude-sonnet-4-5-20250929",
        LlmProviderKind::OpenAi => "gpt-4o-mini",
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
