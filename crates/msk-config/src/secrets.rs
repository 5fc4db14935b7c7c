//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only the env var **NAME** (e.g. `MILKSYNC_API_TOKEN`).
//! - Callers invoke [`resolve_secrets`] once at startup and pass the returned
//!   [`ResolvedSecrets`] into constructors; never scatter `std::env::var`
//!   calls across the codebase.
//! - `Debug` output **redacts** the token value.
//! - Error messages reference the env var **NAME**, never the value.

use anyhow::{bail, Result};

use crate::AppConfig;

/// The bearer token resolved from the environment for one console run.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// `None` if the named env var was absent or empty.
    api_token: Option<String>,
    /// Name of the env var the token was read from; kept for error messages.
    token_env: String,
}

impl ResolvedSecrets {
    /// The token, or an error naming the env var that must be set.
    pub fn require_api_token(&self) -> Result<&str> {
        match self.api_token.as_deref() {
            Some(t) => Ok(t),
            None => bail!(
                "API token missing: set the {} environment variable",
                self.token_env
            ),
        }
    }

    pub fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token value.
        f.debug_struct("ResolvedSecrets")
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

/// Resolve all secrets for one console run. Empty env values count as absent.
pub fn resolve_secrets(config: &AppConfig) -> ResolvedSecrets {
    let token_env = config.api.token_env.clone();
    let api_token = std::env::var(&token_env)
        .ok()
        .filter(|v| !v.trim().is_empty());
    ResolvedSecrets {
        api_token,
        token_env,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token_env: &str) -> AppConfig {
        let loaded = crate::load_layered_yaml_from_strings(&[&format!(
            "api:\n  base_url: \"x\"\n  token_env: \"{token_env}\"\nactor:\n  role: admin\n  id: \"u\"\n  name: \"n\"\n"
        )])
        .unwrap();
        AppConfig::from_value(&loaded.config_json).unwrap()
    }

    #[test]
    fn missing_env_var_is_reported_by_name() {
        let secrets = resolve_secrets(&config("MSK_TEST_TOKEN_SURELY_UNSET"));
        assert!(!secrets.has_api_token());
        let err = secrets.require_api_token().unwrap_err();
        assert!(err.to_string().contains("MSK_TEST_TOKEN_SURELY_UNSET"));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let secrets = ResolvedSecrets {
            api_token: Some("eyJ.secret.token".to_string()),
            token_env: "T".to_string(),
        };
        let dbg = format!("{secrets:?}");
        assert!(dbg.contains("<REDACTED>"));
        assert!(!dbg.contains("secret"));
    }
}
