use crate::config::{Config, DebuggerConfig};
use crate::device::registry::DeviceRegistry;
use crate::notify::Notifier;
use std::sync::{Arc, PoisonError, RwLock};

/// Process-wide extension state.
///
/// Created by the host at startup and shared by the configuration resolver and
/// the adapter descriptor provider. Configuration may be replaced at any time,
/// readers always observe the latest version.
pub struct ExtensionState {
    registry: Arc<dyn DeviceRegistry>,
    notifier: Arc<dyn Notifier>,
    config: RwLock<Config>,
}

impl ExtensionState {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self {
            registry,
            notifier,
            config: RwLock::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Runtime version required by the tooling.
    pub fn runtime_version(&self) -> String {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .runtime_version
            .clone()
    }

    pub fn debugger_config(&self) -> DebuggerConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .debugger
            .clone()
    }

    /// Replace current configuration.
    pub fn update_config(&self, config: Config) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}
