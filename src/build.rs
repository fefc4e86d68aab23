use crate::config::BuildConfig;
use crate::notify::Notifier;
use crate::{dl_debug, dl_info};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use itertools::Itertools;
use std::sync::Arc;
use tokio::process::Command;

/// Build and deploy invoker.
///
/// Return `Ok(false)` when the build or deploy failed, the implementation is
/// responsible for reporting why.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(&self, program: &str, device_id: &str) -> anyhow::Result<bool>;
}

/// Builder spawning external build and deploy command lines.
pub struct CommandBuilder {
    config: BuildConfig,
    notifier: Arc<dyn Notifier>,
}

impl CommandBuilder {
    pub fn new(config: BuildConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Run a single step, return false if the step exits unsuccessfully.
    async fn run_step(&self, step: &str, argv: &[String]) -> anyhow::Result<bool> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("empty {step} command"))?;

        dl_debug!(target: "build", "{step}: {}", argv.iter().join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawn {step} command `{program}`"))?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        self.notifier.show_error(&if stderr.is_empty() {
            format!("DeviceScript {step} failed ({}).", output.status)
        } else {
            format!("DeviceScript {step} failed ({}): {stderr}", output.status)
        });
        Ok(false)
    }
}

/// Replace `{program}` and `{deviceId}` placeholders in every argument.
fn expand(argv: &[String], program: &str, device_id: &str) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            arg.replace("{program}", program)
                .replace("{deviceId}", device_id)
        })
        .collect()
}

#[async_trait]
impl Builder for CommandBuilder {
    async fn build(&self, program: &str, device_id: &str) -> anyhow::Result<bool> {
        let command = expand(&self.config.command, program, device_id);
        if !self.run_step("build", &command).await? {
            return Ok(false);
        }

        if !self.config.deploy.is_empty() {
            let deploy = expand(&self.config.deploy, program, device_id);
            if !self.run_step("deploy", &deploy).await? {
                return Ok(false);
            }
        }

        dl_info!(target: "build", "{program} deployed to {device_id}");
        Ok(true)
    }
}
