use anyhow::{bail, Result};
use msk_audit::{verify_hash_chain, VerifyResult};
use msk_config::{load_layered_yaml, AppConfig};

/// `msk audit verify`: walk the journal and report chain integrity.
/// Exits nonzero on a broken chain so cron checks can alert.
pub fn verify(config_paths: &[String], path_override: Option<&str>) -> Result<()> {
    let path = match path_override {
        Some(p) => p.to_string(),
        None => {
            let paths: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&paths)?;
            AppConfig::from_value(&loaded.config_json)?.audit.path
        }
    };

    match verify_hash_chain(&path)? {
        VerifyResult::Valid { lines } => {
            println!("journal OK: {lines} event(s), chain intact");
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            bail!("journal BROKEN at line {line}: {reason}")
        }
    }
}
