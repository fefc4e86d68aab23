use crate::dl_debug;
use crate::notify::HostCommand;
use crate::state::ExtensionState;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Host of the development server debug adapter.
pub const ADAPTER_HOST: &str = "localhost";
/// Port of the development server debug adapter. Other tooling relies on it, never change.
pub const ADAPTER_PORT: u16 = 8083;

/// Network location of an already running debug adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterDescriptor {
    pub host: String,
    pub port: u16,
}

impl Default for AdapterDescriptor {
    fn default() -> Self {
        Self {
            host: ADAPTER_HOST.to_string(),
            port: ADAPTER_PORT,
        }
    }
}

impl Display for AdapterDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Supplies the host with the endpoint of the debug adapter, which runs inside the
/// development server and is assumed to be up.
pub struct AdapterDescriptorProvider {
    state: Arc<ExtensionState>,
}

impl AdapterDescriptorProvider {
    pub fn new(state: Arc<ExtensionState>) -> Self {
        Self { state }
    }

    /// Return adapter endpoint. Surface the server terminal first if the
    /// `show_terminal_on_start` option is set.
    pub fn create_debug_adapter_descriptor(&self) -> AdapterDescriptor {
        if self.state.debugger_config().show_terminal_on_start {
            self.state
                .notifier()
                .execute_command(HostCommand::ShowServerTerminal);
        }

        let descriptor = AdapterDescriptor::default();
        dl_debug!(target: "descriptor", "debug adapter at {descriptor}");
        descriptor
    }
}
