//! Launch configuration exchanged with the generic debug host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Session type tag of DeviceScript debug sessions.
pub const SESSION_TYPE: &str = "devicescript";
/// Language of editor documents the default launch request is synthesized for.
pub const SCRIPT_LANGUAGE: &str = "typescript";
/// Host variable expanding to the active editor file.
pub const CURRENT_FILE: &str = "${file}";
/// Host variable expanding to the workspace folder.
pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

/// Launch request, built incrementally during resolution.
///
/// Unknown fields are kept untouched and sent back to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Session type tag.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    /// Request kind, "launch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source file to run. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Long-form or short device id. Absent means "pick automatically".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Index of the script manager among same-class services of the device. Default is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_on_entry: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LaunchRequest {
    /// Create request for a program, everything else left unset.
    pub fn for_program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            ..Default::default()
        }
    }

    /// Return true if none of `type`, `request`, `name` is set (the host started
    /// debugging without any configuration). Empty strings count as unset.
    pub fn is_empty(&self) -> bool {
        [&self.r#type, &self.request, &self.name]
            .into_iter()
            .all(|field| field.as_deref().map_or(true, str::is_empty))
    }

    /// Fill in the default "launch current file" request.
    pub fn apply_defaults(&mut self) {
        self.r#type = Some(SESSION_TYPE.to_string());
        self.name = Some("Launch".to_string());
        self.request = Some("launch".to_string());
        self.program = Some(CURRENT_FILE.to_string());
        self.stop_on_entry = Some(true);
    }

    /// Index of the target service, 0 if not set.
    pub fn service_index_or_default(&self) -> usize {
        self.service_index.unwrap_or(0)
    }

    /// Expand host variables in `program` using editor context.
    pub fn substitute_variables(&mut self, editor: &EditorContext) {
        let Some(program) = self.program.as_mut() else {
            return;
        };

        if let Some(file) = editor.active_file() {
            *program = program.replace(CURRENT_FILE, &file.to_string_lossy());
        }
        if let Some(folder) = editor.workspace_folder() {
            *program = program.replace(WORKSPACE_FOLDER, &folder.to_string_lossy());
        }
    }
}

/// Document active in the host editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDocument {
    pub path: PathBuf,
    pub language_id: String,
}

impl ActiveDocument {
    /// Guess document language by file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let language_id = match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => SCRIPT_LANGUAGE,
            Some("js") | Some("mjs") | Some("cjs") => "javascript",
            Some("json") => "json",
            _ => "plaintext",
        };
        Self {
            path,
            language_id: language_id.to_string(),
        }
    }

    pub fn is_script(&self) -> bool {
        self.language_id == SCRIPT_LANGUAGE
    }
}

/// Editing context of the host at the moment debugging starts.
#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    pub active_document: Option<ActiveDocument>,
    pub workspace_folder: Option<PathBuf>,
}

impl EditorContext {
    pub fn active_file(&self) -> Option<&Path> {
        self.active_document.as_ref().map(|d| d.path.as_path())
    }

    pub fn workspace_folder(&self) -> Option<&Path> {
        self.workspace_folder.as_deref()
    }

    /// Return true if a script file is active in the editor.
    pub fn is_script_active(&self) -> bool {
        self.active_document
            .as_ref()
            .is_some_and(ActiveDocument::is_script)
    }
}
