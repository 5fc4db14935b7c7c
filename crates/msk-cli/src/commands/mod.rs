//! Shared wiring for console commands.

pub mod audit;
pub mod orders;
pub mod products;

use anyhow::{Context, Result};
use msk_audit::AuditWriter;
use msk_config::{load_layered_yaml, resolve_secrets, AppConfig};
use msk_orders::DeliveryGateway;
use msk_repo_http::HttpOrderRepository;
use msk_schemas::ActorStamp;

/// Everything a command needs: typed config, the gateway over the live
/// repository, the operator identity and the config hash for audit stamping.
pub struct Console {
    pub config: AppConfig,
    pub config_hash: String,
    pub gateway: DeliveryGateway<HttpOrderRepository>,
    pub actor: ActorStamp,
}

impl Console {
    pub fn build(config_paths: &[String]) -> Result<Self> {
        let paths: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        let loaded = load_layered_yaml(&paths)?;
        let config = AppConfig::from_value(&loaded.config_json)?;

        let secrets = resolve_secrets(&config);
        let token = secrets.require_api_token()?;

        let repo = HttpOrderRepository::new(&config.api.base_url, token);
        Ok(Self {
            actor: config.actor.stamp(),
            gateway: DeliveryGateway::new(repo),
            config_hash: loaded.config_hash,
            config,
        })
    }

    /// Journal writer, resuming the existing hash chain.
    pub fn journal(&self) -> Result<AuditWriter> {
        AuditWriter::resume(&self.config.audit.path, self.config.audit.hash_chain)
            .with_context(|| format!("open journal {}", self.config.audit.path))
    }
}

/// `msk config-hash`: print the layered hash and canonical JSON.
pub fn config_hash(config_paths: &[String]) -> Result<()> {
    let paths: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&paths)?;
    println!("config_hash: {}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}
