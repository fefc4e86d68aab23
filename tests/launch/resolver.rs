use crate::common::{other_service, script_manager, x7, TestEnvBuilder, REQUIRED_VERSION};
use dslaunch::device::{Device, ServiceClass};
use dslaunch::error::{Error, Refusal};
use dslaunch::launch::{ActiveDocument, EditorContext, LaunchRequest, SESSION_TYPE};
use dslaunch::notify::HostCommand;
use dslaunch::resolver::Resolution;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

fn request(program: &str, device_id: &str) -> LaunchRequest {
    LaunchRequest {
        device_id: Some(device_id.to_string()),
        ..LaunchRequest::for_program(program)
    }
}

#[tokio::test]
async fn test_default_device_selected() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest::for_program("app.ts"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let config = resolution.into_config().expect("resolved");
    assert_eq!(config.device_id.as_deref(), Some("7b3c0e5a9d1f2468"));
    assert_eq!(config.service_index, Some(0));
    assert_eq!(
        env.builder.calls(),
        vec![("app.ts".to_string(), "7b3c0e5a9d1f2468".to_string())]
    );
    assert_eq!(
        env.gate.calls(),
        vec![(REQUIRED_VERSION.to_string(), "7b3c0e5a9d1f2468".to_string(), 1)]
    );
    assert!(env.notifier.is_silent());
}

#[tokio::test]
async fn test_default_device_service_index() {
    let device = Device::new(
        "c0ffee0000000001",
        vec![script_manager(), other_service(), script_manager()],
    );
    let env = TestEnvBuilder::new(vec![device]).build();
    assert!(env
        .registry
        .inner
        .select("c0ffee0000000001", ServiceClass::SCRIPT_MANAGER, 1));

    let config = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest::for_program("app.ts"),
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .into_config()
        .unwrap();

    assert_eq!(config.device_id.as_deref(), Some("c0ffee0000000001"));
    assert_eq!(config.service_index, Some(1));
    assert_eq!(env.gate.calls()[0].2, 2);
}

#[tokio::test]
async fn test_no_device_available() {
    let env = TestEnvBuilder::new(vec![Device::new("1111", vec![other_service()])]).build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest::for_program("app.ts"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::NoDeviceAvailable(ServiceClass::SCRIPT_MANAGER))
    );
    assert_eq!(env.notifier.errors().len(), 1);
    assert!(env.gate.calls().is_empty());
    assert!(env.builder.calls().is_empty());
}

#[tokio::test]
async fn test_ambiguous_default_device_asks_to_pick() {
    let env = TestEnvBuilder::new(vec![
        Device::new("1111", vec![script_manager()]),
        Device::new("2222", vec![script_manager()]),
    ])
    .build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest::for_program("app.ts"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!resolution.is_resolved());
    assert_eq!(
        env.notifier.commands(),
        vec![HostCommand::PickDeviceScriptManager]
    );
    assert!(env.builder.calls().is_empty());
}

#[tokio::test]
async fn test_short_id_expansion() {
    let env = TestEnvBuilder::new(vec![
        Device::new("1a9b5a4c2f3e1d00", vec![script_manager()]).with_short_id("AB12"),
    ])
    .build();

    let config = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "ab12"),
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .into_config()
        .unwrap();

    assert_eq!(config.device_id.as_deref(), Some("1a9b5a4c2f3e1d00"));
    assert_eq!(env.registry.calls(), vec!["short_id", "device"]);
    assert_eq!(
        env.builder.calls(),
        vec![("app.ts".to_string(), "1a9b5a4c2f3e1d00".to_string())]
    );
}

#[tokio::test]
async fn test_short_id_first_match_wins() {
    let env = TestEnvBuilder::new(vec![
        Device::new("1111", vec![other_service()]).with_short_id("AB12"),
        Device::new("2222", vec![script_manager()]).with_short_id("AB12"),
        Device::new("3333", vec![script_manager()]).with_short_id("AB12"),
    ])
    .build();

    let config = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "AB12"),
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .into_config()
        .unwrap();

    assert_eq!(config.device_id.as_deref(), Some("2222"));
}

#[tokio::test]
async fn test_unknown_short_id_left_unchanged() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "QQ99"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::DeviceNotFound("QQ99".to_string()))
    );
    assert_eq!(
        env.notifier.errors(),
        vec!["Debug cancelled. Could not find device QQ99.".to_string()]
    );
}

#[tokio::test]
async fn test_not_a_short_id_is_not_expanded() {
    let env = TestEnvBuilder::new(vec![
        Device::new("1a9b5a4c2f3e1d00", vec![script_manager()]).with_short_id("A1B2"),
    ])
    .build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "a1b2"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::DeviceNotFound("a1b2".to_string()))
    );
    assert_eq!(env.registry.calls(), vec!["device"]);
}

#[tokio::test]
async fn test_unknown_device() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "ffff-long-form-unknown"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(resolution.into_config(), None);
    assert_eq!(
        env.notifier.errors(),
        vec!["Debug cancelled. Could not find device ffff-long-form-unknown.".to_string()]
    );
    assert!(env.gate.calls().is_empty());
    assert!(env.builder.calls().is_empty());
}

#[tokio::test]
async fn test_service_index_out_of_range() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let mut config = request("app.ts", "7b3c0e5a9d1f2468");
    config.service_index = Some(1);
    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::DeviceNotFound("7b3c0e5a9d1f2468".to_string()))
    );
}

#[tokio::test]
async fn test_omitted_service_index_is_zero() {
    let device = Device::new(
        "c0ffee0000000001",
        vec![other_service(), script_manager(), script_manager()],
    );
    let env = TestEnvBuilder::new(vec![device]).build();

    let mut explicit = request("app.ts", "c0ffee0000000001");
    explicit.service_index = Some(0);
    let explicit = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(explicit, &CancellationToken::new())
        .await
        .unwrap();
    let omitted = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "c0ffee0000000001"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(explicit.is_resolved());
    assert!(omitted.is_resolved());
    let gate_calls = env.gate.calls();
    assert_eq!(gate_calls.len(), 2);
    assert_eq!(gate_calls[0], gate_calls[1]);
    assert_eq!(gate_calls[0].2, 1);
}

#[tokio::test]
async fn test_version_incompatible() {
    let env = TestEnvBuilder::new(vec![x7()]).incompatible().build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "7b3c0e5a9d1f2468"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::VersionIncompatible)
    );
    assert_eq!(env.gate.calls().len(), 1);
    assert!(env.builder.calls().is_empty());
    assert!(env.notifier.is_silent());
}

#[tokio::test]
async fn test_build_failed() {
    let env = TestEnvBuilder::new(vec![x7()]).failing_build().build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            request("app.ts", "7b3c0e5a9d1f2468"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::NoConfiguration(Refusal::BuildFailed));
    assert_eq!(env.builder.calls().len(), 1);
    assert!(env.notifier.is_silent());
}

#[tokio::test]
async fn test_fully_specified_request_unchanged() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let mut config = request("app.ts", "7b3c0e5a9d1f2468");
    config.r#type = Some(SESSION_TYPE.to_string());
    config.request = Some("launch".to_string());
    config.name = Some("Deploy".to_string());
    config.service_index = Some(0);
    config.stop_on_entry = Some(false);
    config
        .extra
        .insert("trace".to_string(), serde_json::Value::Bool(true));

    let resolved = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            config.clone(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(resolved, Resolution::Resolved(config));
    assert_eq!(env.registry.calls(), vec!["device"]);
    assert_eq!(env.builder.calls().len(), 1);
}

#[tokio::test]
async fn test_missing_program() {
    let env = TestEnvBuilder::new(vec![x7()]).build();

    let resolution = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest {
                device_id: Some("7b3c0e5a9d1f2468".to_string()),
                ..Default::default()
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::NoProgramSpecified)
    );
    assert_eq!(
        env.notifier.infos(),
        vec!["Debug cancelled. Cannot find a program to debug.".to_string()]
    );
    assert!(env.registry.calls().is_empty());
}

#[tokio::test]
async fn test_registry_fault_propagates() {
    let env = TestEnvBuilder::new(vec![x7()])
        .unavailable_registry()
        .build();

    let result = env
        .resolver()
        .resolve_debug_configuration_with_substituted_variables(
            LaunchRequest::for_program("app.ts"),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(Error::Registry(_))));
    assert!(env.builder.calls().is_empty());
}

#[test]
fn test_empty_request_with_active_script() {
    let env = TestEnvBuilder::new(vec![]).build();
    let editor = EditorContext {
        active_document: Some(ActiveDocument::from_path("/work/src/main.ts")),
        workspace_folder: None,
    };

    let config = env
        .resolver()
        .resolve_debug_configuration(LaunchRequest::default(), &editor)
        .into_config()
        .unwrap();

    assert_eq!(config.r#type.as_deref(), Some(SESSION_TYPE));
    assert_eq!(config.name.as_deref(), Some("Launch"));
    assert_eq!(config.request.as_deref(), Some("launch"));
    assert_eq!(config.program.as_deref(), Some("${file}"));
    assert_eq!(config.stop_on_entry, Some(true));
    assert!(env.registry.calls().is_empty());
}

#[test]
fn test_blank_fields_request_with_active_script() {
    let env = TestEnvBuilder::new(vec![]).build();
    let editor = EditorContext {
        active_document: Some(ActiveDocument::from_path("/work/src/main.ts")),
        workspace_folder: None,
    };
    let request: LaunchRequest =
        serde_json::from_str(r#"{"type":"","request":"","name":""}"#).unwrap();

    let config = env
        .resolver()
        .resolve_debug_configuration(request, &editor)
        .into_config()
        .unwrap();

    assert_eq!(config.r#type.as_deref(), Some(SESSION_TYPE));
    assert_eq!(config.program.as_deref(), Some("${file}"));
    assert_eq!(config.stop_on_entry, Some(true));
    assert!(env.notifier.infos().is_empty());
}

#[test]
fn test_empty_request_without_script() {
    let env = TestEnvBuilder::new(vec![]).build();
    let editor = EditorContext {
        active_document: Some(ActiveDocument::from_path("/work/README.md")),
        workspace_folder: None,
    };

    let resolution = env
        .resolver()
        .resolve_debug_configuration(LaunchRequest::default(), &editor);

    assert_eq!(
        resolution,
        Resolution::NoConfiguration(Refusal::NoProgramSpecified)
    );
    assert_eq!(env.notifier.infos().len(), 1);
}

#[test]
fn test_named_request_keeps_fields() {
    let env = TestEnvBuilder::new(vec![]).build();
    let editor = EditorContext {
        active_document: Some(ActiveDocument::from_path("/work/src/main.ts")),
        workspace_folder: None,
    };
    let config = LaunchRequest {
        name: Some("Custom".to_string()),
        ..LaunchRequest::for_program("blinky.ts")
    };

    let resolution = env
        .resolver()
        .resolve_debug_configuration(config.clone(), &editor);
    assert_eq!(resolution, Resolution::Resolved(config));
}

#[tokio::test]
async fn test_resolve_launch_active_file() {
    let env = TestEnvBuilder::new(vec![x7()]).build();
    let editor = EditorContext {
        active_document: Some(ActiveDocument::from_path("/work/src/main.ts")),
        workspace_folder: Some(PathBuf::from("/work")),
    };

    let config = env
        .resolver()
        .resolve_launch(LaunchRequest::default(), &editor, &CancellationToken::new())
        .await
        .unwrap()
        .into_config()
        .unwrap();

    assert_eq!(config.program.as_deref(), Some("/work/src/main.ts"));
    assert_eq!(config.stop_on_entry, Some(true));
    assert_eq!(config.device_id.as_deref(), Some("7b3c0e5a9d1f2468"));
    assert_eq!(
        env.builder.calls(),
        vec![(
            "/work/src/main.ts".to_string(),
            "7b3c0e5a9d1f2468".to_string()
        )]
    );
}
