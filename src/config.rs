use std::env;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_rounds: usize,
    pub model: ModelConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let model = ModelConfig {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            model_id: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            base_url: env::var("OPENAI_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
        };
        Self {
            port: parse_env_or("PORT", 3001),
            max_rounds: parse_env_or("MAX_TOOL_ROUNDS", 8),
            model,
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
