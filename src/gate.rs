use crate::device::BoundService;
use crate::dl_debug;
use crate::notify::Notifier;
use crate::version::Version;
use async_trait::async_trait;
use std::sync::Arc;

/// Runtime compatibility check between the tooling and a discovered service.
///
/// Implementations report their own diagnostics, a caller only needs the verdict.
#[async_trait]
pub trait VersionGate: Send + Sync {
    async fn is_compatible(&self, required: &str, service: &BoundService) -> anyhow::Result<bool>;
}

/// Gate comparing the runtime version reported by a script manager with the
/// version required by the tooling (major and minor must match).
pub struct RuntimeVersionGate {
    notifier: Arc<dyn Notifier>,
}

impl RuntimeVersionGate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    fn check(&self, required: &str, service: &BoundService) -> Result<(), String> {
        let short_id = service.device().short_id();
        let required = Version::parse(required)
            .ok_or_else(|| format!("Invalid tooling runtime version {required}."))?;

        let Some(reported) = service.instance().runtime_version() else {
            return Err(format!(
                "Device {short_id} does not report a runtime version, expected {required}."
            ));
        };
        let actual = Version::parse(reported).ok_or_else(|| {
            format!("Device {short_id} reports an invalid runtime version {reported}.")
        })?;

        if !required.is_protocol_compatible(&actual) {
            return Err(format!(
                "Device {short_id} runtime version mismatch: device has {actual}, tools require {required}. Please update the device firmware or the tools."
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionGate for RuntimeVersionGate {
    async fn is_compatible(&self, required: &str, service: &BoundService) -> anyhow::Result<bool> {
        match self.check(required, service) {
            Ok(()) => {
                dl_debug!(
                    target: "gate",
                    "device {} runtime compatible with {required}",
                    service.device().short_id()
                );
                Ok(true)
            }
            Err(message) => {
                self.notifier.show_error(&message);
                Ok(false)
            }
        }
    }
}
