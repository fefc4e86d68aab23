use crate::common::TestEnvBuilder;
use dslaunch::config::{Config, DebuggerConfig};
use dslaunch::descriptor::{AdapterDescriptor, AdapterDescriptorProvider};
use dslaunch::notify::HostCommand;

#[test]
fn test_fixed_endpoint() {
    let env = TestEnvBuilder::new(vec![]).build();
    let provider = AdapterDescriptorProvider::new(env.state.clone());

    let descriptor = provider.create_debug_adapter_descriptor();
    assert_eq!(
        descriptor,
        AdapterDescriptor {
            host: "localhost".to_string(),
            port: 8083,
        }
    );
    assert_eq!(descriptor.to_string(), "localhost:8083");
    assert!(env.notifier.commands().is_empty());
}

#[test]
fn test_show_terminal_option_read_per_request() {
    let env = TestEnvBuilder::new(vec![]).build();
    let provider = AdapterDescriptorProvider::new(env.state.clone());

    env.state.update_config(Config {
        debugger: DebuggerConfig {
            show_terminal_on_start: true,
        },
        ..Config::default()
    });
    provider.create_debug_adapter_descriptor();
    assert_eq!(
        env.notifier.commands(),
        vec![HostCommand::ShowServerTerminal]
    );

    env.state.update_config(Config::default());
    let descriptor = provider.create_debug_adapter_descriptor();
    assert_eq!(descriptor, AdapterDescriptor::default());
    assert_eq!(env.notifier.commands().len(), 1);
}
