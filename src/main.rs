use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dslaunch::build::CommandBuilder;
use dslaunch::config::Config;
use dslaunch::descriptor::AdapterDescriptorProvider;
use dslaunch::device::registry::MemoryRegistry;
use dslaunch::device::ServiceClass;
use dslaunch::gate::RuntimeVersionGate;
use dslaunch::launch::{ActiveDocument, EditorContext, LaunchRequest};
use dslaunch::notify::{LogNotifier, Notifier};
use dslaunch::resolver::{ConfigurationResolver, Resolution};
use dslaunch::state::ExtensionState;
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ~/.config/dslaunch/config.toml)
    #[clap(long, env = "DSLAUNCH_CONFIG")]
    config: Option<PathBuf>,

    /// Device list in TOML format.
    #[clap(long, env = "DSLAUNCH_DEVICES")]
    devices: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Resolve a launch request, deploy the program and print the final configuration.
    Resolve {
        /// Launch request in JSON format, an empty request if omitted.
        #[clap(long)]
        launch: Option<PathBuf>,

        /// File active in the editor.
        #[clap(long)]
        active_file: Option<PathBuf>,

        /// Workspace folder.
        #[clap(long)]
        workspace: Option<PathBuf>,

        /// Pick the active script manager device (long or short id) before resolving.
        #[clap(long)]
        select: Option<String>,

        /// Script manager index on the picked device.
        #[clap(long, default_value_t = 0, requires = "select")]
        service_index: usize,

        /// Mute pipeline logging, print only the configuration and operator messages.
        #[clap(short, long)]
        quiet: bool,
    },
    /// Print debug adapter endpoint.
    Descriptor,
    /// List devices running a script manager.
    Devices,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let registry = match &args.devices {
        Some(path) => MemoryRegistry::from_file(path, notifier.clone())?,
        None => MemoryRegistry::new(notifier.clone()),
    };
    let registry = Arc::new(registry);
    let state = Arc::new(ExtensionState::new(
        registry.clone(),
        notifier.clone(),
        config.clone(),
    ));

    match args.command {
        Cmd::Resolve {
            launch,
            active_file,
            workspace,
            select,
            service_index,
            quiet,
        } => {
            if quiet {
                dslaunch::log::disable();
            }
            if let Some(name) = select {
                if !registry.select_by_name(&name, ServiceClass::SCRIPT_MANAGER, service_index) {
                    bail!("no script manager #{service_index} on device {name}");
                }
            }

            let request = match launch {
                Some(path) => {
                    let data = std::fs::read_to_string(&path)
                        .with_context(|| format!("read launch request {}", path.display()))?;
                    serde_json::from_str::<LaunchRequest>(&data).context("parse launch request")?
                }
                None => LaunchRequest::default(),
            };
            let editor = EditorContext {
                active_document: active_file.map(ActiveDocument::from_path),
                workspace_folder: workspace,
            };

            let resolver = ConfigurationResolver::new(
                state,
                Arc::new(RuntimeVersionGate::new(notifier.clone())),
                Arc::new(CommandBuilder::new(config.build, notifier)),
            );

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!(target: "launch", "interrupted, cancel resolution");
                        cancel.cancel();
                    }
                }
            });

            match resolver.resolve_launch(request, &editor, &cancel).await? {
                Resolution::Resolved(config) => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                    Ok(ExitCode::SUCCESS)
                }
                Resolution::NoConfiguration(refusal) => {
                    eprintln!("no debug configuration: {refusal}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Cmd::Descriptor => {
            let provider = AdapterDescriptorProvider::new(state);
            println!("{}", provider.create_debug_adapter_descriptor());
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Devices => {
            for device in registry.devices_with_service(ServiceClass::SCRIPT_MANAGER) {
                let versions = device
                    .services_of_class(ServiceClass::SCRIPT_MANAGER)
                    .map(|s| s.runtime_version().unwrap_or("?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{} {} [{versions}]", device.short_id(), device.device_id());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
