//! Environment variable loading with type conversion and validation.
//!
//! The same small, prefix-aware loader shape used throughout the ambient
//! configuration stack: `get`/`get_optional`/typed getters, with required
//! variables validated up front so a missing variable fails fast at startup
//! rather than deep inside a crawl.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment variable not set: {var}")]
    NotFound { var: String },

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

pub struct EnvConfigLoader {
    prefix: Option<String>,
    defaults: HashMap<String, String>,
}

impl EnvConfigLoader {
    pub fn new() -> Self {
        Self {
            prefix: None,
            defaults: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn default(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(var.into(), value.into());
        self
    }

    fn var_name(&self, var: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{}", var.to_uppercase()),
            None => var.to_uppercase(),
        }
    }

    pub fn get(&self, var: &str) -> Result<String, EnvError> {
        let full = self.var_name(var);
        env::var(&full).or_else(|_| {
            self.defaults
                .get(var)
                .cloned()
                .ok_or(EnvError::NotFound { var: full })
        })
    }

    pub fn get_optional(&self, var: &str) -> Option<String> {
        env::var(self.var_name(var))
            .ok()
            .or_else(|| self.defaults.get(var).cloned())
    }

    pub fn get_u64(&self, var: &str) -> Result<u64, EnvError> {
        let full = self.var_name(var);
        self.get(var)?.parse().map_err(|e| EnvError::InvalidValue {
            var: full,
            reason: format!("not an unsigned integer: {e}"),
        })
    }

    pub fn get_bool(&self, var: &str) -> Result<bool, EnvError> {
        let full = self.var_name(var);
        match self.get(var)?.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(EnvError::InvalidValue {
                var: full,
                reason: format!("not a boolean: {other}"),
            }),
        }
    }
}

impl Default for EnvConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_used_when_env_absent() {
        let loader = EnvConfigLoader::new()
            .with_prefix("AUDITCRAWL_TEST_NONCE_")
            .default("x", "42");
        assert_eq!(loader.get("x").unwrap(), "42");
    }

    #[test]
    fn missing_required_errors() {
        let loader = EnvConfigLoader::new().with_prefix("AUDITCRAWL_TEST_NONCE_");
        assert!(loader.get("definitely_unset_xyz").is_err());
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        std::env::set_var("AUDITCRAWL_TEST_FLAG", "yes");
        let loader = EnvConfigLoader::new().with_prefix("AUDITCRAWL_TEST_");
        assert!(loader.get_bool("flag").unwrap());
        std::env::remove_var("AUDITCRAWL_TEST_FLAG");
    }
}
