/*
 * Transport-safe metadata records for files and folders, as delivered to the
 * script side. These are ephemeral view objects: they are rebuilt from live
 * file-system state on every request, own no resources, and carry no
 * back-references — a parent is described by a value summary, never by a
 * pointer into another entity.
 */
use crate::core::sandbox::SandboxRoot;
use serde::Serialize;

// Minimal description of a folder, used for parent references and for the
// subfolder list of a FolderEntry. Keeping grandchildren out of the payload
// bounds serialization to the direct children of the requested entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    pub name: String,
    pub relative_path: String,
    pub root: SandboxRoot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_excluding_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub relative_path: String,
    pub root: SandboxRoot,
    pub parent_folder: Option<FolderSummary>,
}

// A folder with one level of children: subfolders as summaries, direct
// files fully expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    pub relative_path: String,
    pub root: SandboxRoot,
    pub parent_folder: Option<FolderSummary>,
    pub subfolders: Vec<FolderSummary>,
    pub files: Vec<FileEntry>,
}
