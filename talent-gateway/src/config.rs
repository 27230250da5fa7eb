//! Gateway configuration (spec §4.B, §6) and the adapter-factory registry
//! that replaces dynamic plugin loading (DESIGN.md REDESIGN FLAGS).

use crate::adapter::Adapter;
use crate::error::GatewayError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One entry of the `adapters` array in gateway configuration JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfigEntry {
    /// Whether this entry is the single platform-protocol adapter.
    #[serde(default)]
    pub platform: bool,
    /// Names the adapter implementation to resolve in the `AdapterFactory`.
    pub module: AdapterModule,
    /// Adapter-specific configuration, passed verbatim to its factory.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// The `module` sub-object naming an adapter implementation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterModule {
    /// The adapter identifier to resolve against the factory registry.
    pub name: String,
}

/// The full gateway configuration document (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// The adapters to load, in the order they should be started and
    /// fanned-out to.
    pub adapters: Vec<AdapterConfigEntry>,
    /// Whether this gateway only ever speaks the platform protocol — if
    /// set, a platform adapter must be present among `adapters` (spec
    /// §4.B: "gateway is platform-only but no platform adapter present").
    #[serde(default)]
    pub platform_only: bool,
}

impl GatewayConfig {
    /// Validate structural invariants before any adapter is loaded (spec
    /// §4.B): a non-empty `adapters` array, at most one entry marked
    /// `platform`, and a platform adapter present if `platform_only` is set.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.adapters.is_empty() {
            return Err(GatewayError::InvalidConfiguration("adapters list is missing or empty".to_string()));
        }

        let platform_count = self.adapters.iter().filter(|a| a.platform).count();
        if platform_count > 1 {
            return Err(GatewayError::InvalidConfiguration(format!(
                "more than one adapter marked platform ({platform_count})"
            )));
        }

        if self.platform_only && platform_count == 0 {
            return Err(GatewayError::InvalidConfiguration(
                "gateway is platform-only but no platform adapter is configured".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether exactly one adapter in this configuration is marked platform.
    pub fn has_platform_adapter(&self) -> bool {
        self.adapters.iter().any(|a| a.platform)
    }
}

/// Constructs an `Adapter` from its config fragment. The in-process
/// replacement for dynamic plugin loading (spec §4.B "Adapter loading" —
/// see DESIGN.md).
pub type AdapterCtor = Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Adapter>, GatewayError> + Send + Sync>;

/// A registry mapping adapter module names to constructors, supplied by
/// the embedding application. Resolution failures surface as
/// `GatewayError::PluginLoadFailure`/`PluginSymNotFound`.
#[derive(Default)]
pub struct AdapterFactory {
    ctors: HashMap<String, AdapterCtor>,
}

impl AdapterFactory {
    /// An empty factory registry.
    pub fn new() -> Self {
        Self { ctors: HashMap::new() }
    }

    /// Register a constructor under `name`.
    pub fn register(&mut self, name: impl Into<String>, ctor: AdapterCtor) -> &mut Self {
        self.ctors.insert(name.into(), ctor);
        self
    }

    /// Resolve `name` against a config fragment, building the adapter.
    pub fn build(&self, name: &str, config: &serde_json::Value) -> Result<Arc<dyn Adapter>, GatewayError> {
        let ctor = self.ctors.get(name).ok_or_else(|| GatewayError::PluginLoadFailure(name.to_string()))?;
        ctor(config).map_err(|e| match e {
            GatewayError::Adapter { message, .. } => GatewayError::PluginSymNotFound(name.to_string(), message),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_empty_adapters() {
        let cfg: GatewayConfig = serde_json::from_value(json!({"adapters": []})).unwrap();
        assert!(matches!(cfg.validate(), Err(GatewayError::InvalidConfiguration(_))));
    }

    #[test]
    fn rejects_multiple_platform_adapters() {
        let cfg: GatewayConfig = serde_json::from_value(json!({
            "adapters": [
                {"platform": true, "module": {"name": "a"}},
                {"platform": true, "module": {"name": "b"}},
            ]
        }))
        .unwrap();
        assert!(matches!(cfg.validate(), Err(GatewayError::InvalidConfiguration(_))));
    }

    #[test]
    fn accepts_single_platform_adapter() {
        let cfg: GatewayConfig = serde_json::from_value(json!({
            "adapters": [
                {"platform": true, "module": {"name": "local"}},
            ]
        }))
        .unwrap();
        assert!(cfg.validate().is_ok());
        assert!(cfg.has_platform_adapter());
    }

    #[test]
    fn platform_only_gateway_requires_a_platform_adapter() {
        let cfg: GatewayConfig = serde_json::from_value(json!({
            "platform_only": true,
            "adapters": [{"platform": false, "module": {"name": "local"}}],
        }))
        .unwrap();
        assert!(matches!(cfg.validate(), Err(GatewayError::InvalidConfiguration(_))));
    }

    #[test]
    fn unregistered_name_is_plugin_load_failure() {
        let factory = AdapterFactory::new();
        let err = factory.build("missing", &json!({})).unwrap_err();
        assert!(matches!(err, GatewayError::PluginLoadFailure(name) if name == "missing"));
    }
}
