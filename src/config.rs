use std::env;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer the user's question clearly and concisely.";

/// Relay configuration, read once at startup.
///
/// The system prompt and target model are deployment choices, so they live
/// here rather than in handler logic. A missing API key is not fatal at
/// startup; the handler reports it per request as a configuration error.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub system_prompt: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            api_base: env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

pub fn server_port_from_env() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
}
