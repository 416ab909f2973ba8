use anyhow::{Result, bail};
use std::fmt;
use std::time::Duration;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Settings for the vendor client that come from the command line.
#[derive(Debug, Clone)]
pub struct VendorOptions {
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
}

impl Default for VendorOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
            proxy: None,
        }
    }
}

/// Process-wide configuration, built once at startup and never mutated.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
    pub proxy: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl Config {
    pub fn from_env(options: VendorOptions) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), options)
    }

    pub fn from_lookup<F>(lookup: F, options: VendorOptions) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match lookup(API_KEY_ENV) {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!("{} is not set in the environment", API_KEY_ENV),
        };

        // Accept both "gemini-2.5-flash" and "models/gemini-2.5-flash"
        let model = options.model.trim();
        let model = model.strip_prefix("models/").unwrap_or(model).to_string();
        if model.is_empty() {
            bail!("model identifier must not be empty");
        }

        let api_base = options.api_base.trim().to_string();
        if api_base.is_empty() {
            bail!("vendor api base must not be empty");
        }

        Ok(Self {
            api_key,
            model,
            api_base,
            timeout: options.timeout,
            proxy: options.proxy,
        })
    }

    pub fn generate_content_url(&self) -> String {
        let path = format!("models/{}:generateContent", self.model);
        if self.api_base.ends_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }
}
