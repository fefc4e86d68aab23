use crate::device::ServiceClass;

/// Expected reasons for a launch request to produce no configuration.
///
/// The host treats all of them the same way (do not start a session), the only
/// difference is whether an operator message is shown, see [`Refusal::message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Refusal {
    #[error("resolution cancelled")]
    Cancelled,
    #[error("no program specified")]
    NoProgramSpecified,
    #[error("no device running service {0} available")]
    NoDeviceAvailable(ServiceClass),
    #[error("device {0} not found")]
    DeviceNotFound(String),
    #[error("runtime version incompatible")]
    VersionIncompatible,
    #[error("build failed")]
    BuildFailed,
}

impl Refusal {
    /// Return a message that must be shown to the operator, or [`None`] if the
    /// refusal is silent (cancellation, or a collaborator already reported it).
    pub fn message(&self) -> Option<String> {
        match self {
            Refusal::NoProgramSpecified => {
                Some("Debug cancelled. Cannot find a program to debug.".to_string())
            }
            Refusal::NoDeviceAvailable(_) => {
                Some("Debug cancelled. No DeviceScript device selected.".to_string())
            }
            Refusal::DeviceNotFound(id) => {
                Some(format!("Debug cancelled. Could not find device {id}."))
            }
            Refusal::Cancelled => None,
            Refusal::VersionIncompatible => None,
            Refusal::BuildFailed => None,
        }
    }
}

/// Device registry query errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no service instance of class {0} found")]
    NotFound(ServiceClass),
    #[error("registry unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

/// Unexpected faults of external collaborators, propagated to the caller as is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("version gate: {0:#}")]
    Gate(anyhow::Error),
    #[error("build: {0:#}")]
    Build(anyhow::Error),
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                if $crate::log::is_enabled() {
                    $log_fn!(target: "launch", "{:#}", e);
                }
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                if $crate::log::is_enabled() {
                    $log_fn!(target: "launch", concat!($msg, " {:#}"), e);
                }
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(::log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(::log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(::log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(::log::debug, $res, $msg)
    };
}
