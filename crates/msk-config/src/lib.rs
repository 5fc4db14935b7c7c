//! msk-config
//!
//! Layered YAML configuration with canonical hashing and secret hygiene.
//!
//! - Later layers override earlier ones; maps merge deep, everything else
//!   replaces.
//! - The effective config is hashed (sorted-key compact JSON, SHA-256) so
//!   audit events and logs can carry config provenance.
//! - Config files store env var NAMES for secrets, never values. Loading
//!   aborts with CONFIG_SECRET_DETECTED when any leaf string looks like an
//!   embedded token.

mod secrets;

pub use secrets::{resolve_secrets, ResolvedSecrets};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

use msk_schemas::{ActorRole, ActorStamp};

/// Known secret-like prefixes. If any leaf string value in the effective
/// config starts with one of these, loading aborts with
/// CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "eyJ",        // JWT (base64 header): the backend bearer tokens
    "Bearer ",    // pasted Authorization header
    "sk-",        // generic api-key style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
];

// ---------------------------------------------------------------------------
// Typed surface
// ---------------------------------------------------------------------------

/// Effective configuration of the operator console.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub actor: ActorConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. `https://milksync.example.com/api`.
    pub base_url: String,
    /// NAME of the env var carrying the bearer token. Never the token itself.
    pub token_env: String,
}

/// Identity stamped onto every mutating request as `updated_by`. Explicit in
/// config rather than ambient, so the audit stamp is deterministic.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorConfig {
    pub role: ActorRole,
    pub id: String,
    pub name: String,
}

impl ActorConfig {
    pub fn stamp(&self) -> ActorStamp {
        ActorStamp {
            role: self.role,
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub path: String,
    pub hash_chain: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: "exports/journal.jsonl".to_string(),
            hash_chain: true,
        }
    }
}

impl AppConfig {
    /// Decode the typed surface out of a merged config document.
    pub fn from_value(v: &Value) -> Result<Self> {
        serde_json::from_value(v.clone()).context("invalid config shape")
    }
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Load and merge YAML files in order: earlier paths are base, later paths
/// override.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw = fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }
    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    // Enforce "no secrets as literal values" before anything is hashed or
    // logged.
    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

/// Compact JSON with recursively sorted keys, so the hash is insensitive to
/// YAML map ordering across layers.
fn canonicalize_json(v: &Value) -> Result<String> {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).context("canonical json serialize failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Secret hygiene
// ---------------------------------------------------------------------------

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(val) = v.pointer(&ptr) {
            if let Some(s) = val.as_str() {
                if looks_like_secret(s) {
                    bail!("CONFIG_SECRET_DETECTED leaf={ptr} value=REDACTED");
                }
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{prefix}/{i}");
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
api:
  base_url: "https://milksync.example.com/api"
  token_env: "MILKSYNC_API_TOKEN"
actor:
  role: admin
  id: "u-1"
  name: "Asha"
"#;

    #[test]
    fn overlay_overrides_base_deeply() {
        let overlay = "api:\n  base_url: \"http://localhost:5000/api\"\n";
        let loaded = load_layered_yaml_from_strings(&[BASE, overlay]).unwrap();
        let cfg = AppConfig::from_value(&loaded.config_json).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:5000/api");
        assert_eq!(cfg.api.token_env, "MILKSYNC_API_TOKEN", "untouched keys survive");
        assert_eq!(cfg.audit.path, "exports/journal.jsonl");
        assert!(cfg.audit.hash_chain);
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = "api:\n  base_url: \"x\"\n  token_env: \"T\"\n";
        let b = "api:\n  token_env: \"T\"\n  base_url: \"x\"\n";
        let ha = load_layered_yaml_from_strings(&[a]).unwrap().config_hash;
        let hb = load_layered_yaml_from_strings(&[b]).unwrap().config_hash;
        assert_eq!(ha, hb);
    }

    #[test]
    fn embedded_bearer_token_is_rejected() {
        let bad = "api:\n  base_url: \"x\"\n  token_env: \"eyJhbGciOiJIUzI1NiJ9.e30.x\"\n";
        let err = load_layered_yaml_from_strings(&[bad]).unwrap_err();
        assert!(err.to_string().contains("CONFIG_SECRET_DETECTED"));
    }
}
