use strum_macros::Display;

/// Fire-and-forget commands the resolver and descriptor provider may trigger in the host.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum HostCommand {
    /// Surface the development server terminal output.
    #[strum(serialize = "extension.devicescript.showServerTerminal")]
    ShowServerTerminal,
    /// Ask the operator to pick the active script manager device.
    #[strum(serialize = "extension.devicescript.pickDeviceScriptManager")]
    PickDeviceScriptManager,
}

/// Operator facing surface of the host (message popups and command palette).
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str);

    fn show_info(&self, message: &str);

    fn execute_command(&self, command: HostCommand);
}

/// Notifier for headless hosts, everything goes to the log.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_error(&self, message: &str) {
        log::error!(target: "notify", "{message}");
    }

    fn show_info(&self, message: &str) {
        log::info!(target: "notify", "{message}");
    }

    fn execute_command(&self, command: HostCommand) {
        log::info!(target: "notify", "execute command: {command}");
    }
}
