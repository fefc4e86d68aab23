//! Launch configuration resolution pipeline.
//!
//! A launch request goes through two entry points, composed by the host:
//!
//! 1. [`ConfigurationResolver::resolve_debug_configuration`] synthesizes a default
//!    request when the host has none and checks that a program is set.
//! 2. [`ConfigurationResolver::resolve_debug_configuration_with_substituted_variables`]
//!    picks the device, expands short ids, finds the script manager service, checks its
//!    runtime version and finally builds and deploys the program.
//!
//! Expected failures never surface as errors, they collapse into
//! [`Resolution::NoConfiguration`]. Cancellation is polled between steps only,
//! a step already running is never interrupted.

use crate::build::Builder;
use crate::device::{is_short_id, BoundService, ServiceClass};
use crate::error::{Error, RegistryError, Refusal};
use crate::gate::VersionGate;
use crate::launch::{EditorContext, LaunchRequest};
use crate::state::ExtensionState;
use crate::{dl_debug, dl_error, dl_info, dl_warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Request is valid and the program is deployed, a session may start.
    Resolved(LaunchRequest),
    /// Do not start a session.
    NoConfiguration(Refusal),
}

impl Resolution {
    /// Return resolved configuration, [`None`] means "do not start a session".
    pub fn into_config(self) -> Option<LaunchRequest> {
        match self {
            Resolution::Resolved(config) => Some(config),
            Resolution::NoConfiguration(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Reason to leave the pipeline early.
enum Abort {
    Refused(Refusal),
    Fault(Error),
}

impl From<Refusal> for Abort {
    fn from(refusal: Refusal) -> Self {
        Abort::Refused(refusal)
    }
}

impl From<Error> for Abort {
    fn from(err: Error) -> Self {
        Abort::Fault(err)
    }
}

impl From<RegistryError> for Abort {
    fn from(err: RegistryError) -> Self {
        Abort::Fault(Error::Registry(err))
    }
}

/// Cancellation checkpoint, must be passed before every step touching a collaborator.
fn checkpoint(cancel: &CancellationToken) -> Result<(), Abort> {
    if cancel.is_cancelled() {
        return Err(Refusal::Cancelled.into());
    }
    Ok(())
}

/// Resolves launch requests into deployed, ready to debug configurations.
pub struct ConfigurationResolver {
    state: Arc<ExtensionState>,
    gate: Arc<dyn VersionGate>,
    builder: Arc<dyn Builder>,
    service_class: ServiceClass,
}

impl ConfigurationResolver {
    pub fn new(
        state: Arc<ExtensionState>,
        gate: Arc<dyn VersionGate>,
        builder: Arc<dyn Builder>,
    ) -> Self {
        Self {
            state,
            gate,
            builder,
            service_class: ServiceClass::SCRIPT_MANAGER,
        }
    }

    /// Massage a launch request before host variables are substituted:
    /// synthesize a "launch current file" request if the host has no configuration
    /// and a script is active in the editor, refuse requests without a program.
    pub fn resolve_debug_configuration(
        &self,
        mut config: LaunchRequest,
        editor: &EditorContext,
    ) -> Resolution {
        if config.is_empty() && editor.is_script_active() {
            dl_debug!("empty launch request, launch active file");
            config.apply_defaults();
        }

        if !has_program(&config) {
            return self.refuse(Refusal::NoProgramSpecified);
        }
        Resolution::Resolved(config)
    }

    /// Resolve device and service for a launch request with substituted variables,
    /// check runtime compatibility and deploy the program.
    ///
    /// Return `Err` only if a collaborator faults (rather than reporting a failure).
    pub async fn resolve_debug_configuration_with_substituted_variables(
        &self,
        config: LaunchRequest,
        cancel: &CancellationToken,
    ) -> Result<Resolution, Error> {
        match self.run(config, cancel).await {
            Ok(config) => {
                dl_info!(
                    "debug configuration resolved, device {}",
                    config.device_id.as_deref().unwrap_or_default()
                );
                Ok(Resolution::Resolved(config))
            }
            Err(Abort::Refused(refusal)) => Ok(self.refuse(refusal)),
            Err(Abort::Fault(err)) => {
                dl_error!("debug configuration not resolved: {err}");
                Err(err)
            }
        }
    }

    /// Run both entry points, substituting host variables in between.
    pub async fn resolve_launch(
        &self,
        config: LaunchRequest,
        editor: &EditorContext,
        cancel: &CancellationToken,
    ) -> Result<Resolution, Error> {
        let mut config = match self.resolve_debug_configuration(config, editor) {
            Resolution::Resolved(config) => config,
            refused => return Ok(refused),
        };
        config.substitute_variables(editor);
        self.resolve_debug_configuration_with_substituted_variables(config, cancel)
            .await
    }

    async fn run(
        &self,
        mut config: LaunchRequest,
        cancel: &CancellationToken,
    ) -> Result<LaunchRequest, Abort> {
        let program = config
            .program
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(Refusal::NoProgramSpecified)?;

        checkpoint(cancel)?;
        let device_id = match config.device_id.take().filter(|id| !id.is_empty()) {
            Some(device_id) => device_id,
            None => {
                let service = self.default_service().await?;
                config.service_index = Some(service.service_index());
                service.device().device_id().to_string()
            }
        };

        checkpoint(cancel)?;
        let device_id = self.expand_short_id(device_id).await?;
        config.device_id = Some(device_id.clone());

        checkpoint(cancel)?;
        let service = self
            .find_service(&device_id, config.service_index_or_default())
            .await?;

        checkpoint(cancel)?;
        let required = self.state.runtime_version();
        let compatible = self
            .gate
            .is_compatible(&required, &service)
            .await
            .map_err(Error::Gate)?;
        if !compatible {
            return Err(Refusal::VersionIncompatible.into());
        }

        checkpoint(cancel)?;
        dl_debug!("build {program} for device {device_id}");
        let built = self
            .builder
            .build(&program, &device_id)
            .await
            .map_err(Error::Build)?;
        if !built {
            return Err(Refusal::BuildFailed.into());
        }

        Ok(config)
    }

    /// Ask the registry for the default script manager.
    async fn default_service(&self) -> Result<BoundService, Abort> {
        match self
            .state
            .registry()
            .resolve_default_service_instance(self.service_class)
            .await
        {
            Ok(service) => {
                dl_debug!(
                    "no device in launch request, use default device {} service #{}",
                    service.device().short_id(),
                    service.service_index()
                );
                Ok(service)
            }
            Err(RegistryError::NotFound(class)) => Err(Refusal::NoDeviceAvailable(class).into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace a short device id by the long-form id of the first matching device.
    /// Unknown short ids and long-form ids are returned as is.
    async fn expand_short_id(&self, device_id: String) -> Result<String, Abort> {
        if !is_short_id(&device_id) {
            return Ok(device_id);
        }

        let device = self
            .state
            .registry()
            .find_device_by_short_id(self.service_class, &device_id)
            .await?;
        Ok(match device {
            Some(device) => {
                dl_debug!("expand short id {device_id} to {}", device.device_id());
                device.device_id().to_string()
            }
            None => device_id,
        })
    }

    /// Find script manager number `service_index` on device `device_id`.
    async fn find_service(
        &self,
        device_id: &str,
        service_index: usize,
    ) -> Result<BoundService, Abort> {
        self.state
            .registry()
            .find_device_by_id(device_id)
            .await?
            .and_then(|device| device.bind_service(self.service_class, service_index))
            .ok_or_else(|| Refusal::DeviceNotFound(device_id.to_string()).into())
    }

    /// Show refusal message (if any) and produce "no configuration".
    fn refuse(&self, refusal: Refusal) -> Resolution {
        match refusal.message() {
            Some(message) => {
                let notifier = self.state.notifier();
                match refusal {
                    Refusal::NoProgramSpecified => notifier.show_info(&message),
                    _ => notifier.show_error(&message),
                }
                dl_info!("no debug configuration: {refusal}");
            }
            // the operator was already told (or asked to cancel)
            None => dl_warn!("no debug configuration: {refusal}"),
        }
        Resolution::NoConfiguration(refusal)
    }
}

fn has_program(config: &LaunchRequest) -> bool {
    config.program.as_deref().is_some_and(|p| !p.is_empty())
}
