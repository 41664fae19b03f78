/*!
workspace.rs - Persisted workspace document.

An opaque key-value document consumed by UI collaborators: current file,
recent files, analysis-done flags, and user-editable descriptions for
variables and functions. The core only round-trips it; nothing here
feeds back into analysis.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionMeta {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    pub current_file: String,
    pub recent_files: Vec<String>,
    pub is_disassembled: bool,
    pub is_decompiled: bool,
    pub variables: BTreeMap<String, VariableMeta>,
    pub functions: BTreeMap<String, FunctionMeta>,
}

impl WorkspaceDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Record a file as most-recently opened, deduplicating the list.
    pub fn touch_file(&mut self, path: &str) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_string());
        self.current_file = path.to_string();
    }
}
