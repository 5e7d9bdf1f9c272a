//! Raw-config resolution, resolved option state, and per-call option merging.
//!
//! ```rust
//! use chatproxy::{ConfigValueResolver, IdentityResolver, ResolvedOptions};
//! use serde_json::json;
//!
//! let resolver = IdentityResolver;
//! let options = ResolvedOptions::from_config(&resolver, &json!({"apikey": "secret"}));
//! assert_eq!(options.apikey.as_deref(), Some("secret"));
//! assert_eq!(options.max_tokens, 256);
//! ```

use serde_json::Value;

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-14B-Instruct-AWQ";
pub const DEFAULT_ENDPOINT: &str = "https://api.chatproxy.dev/v1/chat/completions";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Turns a possibly-indirect configuration entry into a concrete value.
///
/// Resolution strategy (environment lookup, secret stores, templating) lives
/// outside this crate; the client only calls it.
pub trait ConfigValueResolver: Send + Sync {
    fn resolve_value(&self, raw: &Value) -> Option<Value>;
}

/// Passes concrete values through unchanged; null is unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl ConfigValueResolver for IdentityResolver {
    fn resolve_value(&self, raw: &Value) -> Option<Value> {
        match raw {
            Value::Null => None,
            other => Some(other.clone()),
        }
    }
}

/// Concrete option state derived once per `set_config` call.
///
/// The default state carries no endpoint or API key; both are required at the
/// transport boundary, so a client that never resolved a config fails
/// pre-flight instead of dialing out.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub model: String,
    pub apikey: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            apikey: None,
            endpoint: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ResolvedOptions {
    /// Resolves every raw entry through the resolver and applies defaults for
    /// anything that stays unresolved. The API key entry accepts the aliases
    /// `apikey`, `proxy_token`, and `token`, first present wins.
    pub fn from_config(resolver: &dyn ConfigValueResolver, config: &Value) -> Self {
        let resolve = |key: &str| config.get(key).and_then(|raw| resolver.resolve_value(raw));

        let apikey_raw = config
            .get("apikey")
            .or_else(|| config.get("proxy_token"))
            .or_else(|| config.get("token"));

        Self {
            model: resolve("model")
                .and_then(string_like)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            apikey: apikey_raw
                .and_then(|raw| resolver.resolve_value(raw))
                .and_then(string_like),
            endpoint: Some(
                resolve("endpoint")
                    .and_then(string_like)
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ),
            temperature: resolve("temperature")
                .and_then(float_like)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: resolve("max_tokens")
                .and_then(int_like)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    /// Shallow merge, last write wins. Absent patch fields keep the current
    /// resolved value.
    pub fn apply(&mut self, patch: OptionsPatch) {
        if let Some(model) = patch.model {
            self.model = model;
        }

        if let Some(apikey) = patch.apikey {
            self.apikey = Some(apikey);
        }

        if let Some(endpoint) = patch.endpoint {
            self.endpoint = Some(endpoint);
        }

        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }

        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
    }
}

/// Partial option override for `set_options`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionsPatch {
    pub model: Option<String>,
    pub apikey: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl OptionsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_apikey(mut self, apikey: impl Into<String>) -> Self {
        self.apikey = Some(apikey.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

fn string_like(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn float_like(value: Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn int_like(value: Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_f64().map(|float| float as u32),
        Value::String(text) => text.trim().parse::<f64>().ok().map(|float| float as u32),
        _ => None,
    }
}
