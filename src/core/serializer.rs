/*
 * This module converts live file-system entries into the transport records
 * of `entity.rs`. Entries are rebuilt on every call — nothing is cached —
 * and folder serialization expands exactly one level: direct files in full,
 * direct subfolders as summaries. Relative paths are computed against the
 * entry's sandbox root; a path outside the root degrades to the absolute
 * path rather than failing (see `SandboxLayout::relative_path`).
 */
use crate::core::entity::{FileEntry, FolderEntry, FolderSummary};
use crate::core::sandbox::{SandboxLayout, SandboxRoot};
use std::io;
use std::path::Path;

/*
 * Describes a folder by name/relativePath/root only. Used for parent
 * references and subfolder lists.
 */
pub fn folder_summary(layout: &SandboxLayout, root: SandboxRoot, absolute: &Path) -> FolderSummary {
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.wire_name().to_string());
    FolderSummary {
        name,
        relative_path: layout.relative_path(root, absolute),
        root,
    }
}

// The parent summary of an entry, or None when the entry is the root
// directory itself.
fn parent_summary(
    layout: &SandboxLayout,
    root: SandboxRoot,
    absolute: &Path,
) -> Option<FolderSummary> {
    if absolute == layout.root_dir(root) {
        return None;
    }
    absolute
        .parent()
        .map(|parent| folder_summary(layout, root, parent))
}

/*
 * Builds the transport record for a single file. Pure path computation; the
 * caller is responsible for having checked that the file exists.
 */
pub fn serialize_file(layout: &SandboxLayout, root: SandboxRoot, absolute: &Path) -> FileEntry {
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_excluding_extension = absolute
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    let extension = absolute
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    FileEntry {
        name,
        name_excluding_extension,
        extension,
        relative_path: layout.relative_path(root, absolute),
        root,
        parent_folder: parent_summary(layout, root, absolute),
    }
}

/*
 * Builds the transport record for a folder and its immediate children.
 * Subfolders appear as summaries only, direct files are fully expanded with
 * their own parent summaries. Children are sorted by name so the payload is
 * deterministic. Unreadable directory entries are skipped with a warning.
 */
pub fn serialize_folder(
    layout: &SandboxLayout,
    root: SandboxRoot,
    absolute: &Path,
) -> io::Result<FolderEntry> {
    let mut subfolders: Vec<FolderSummary> = Vec::new();
    let mut files: Vec<FileEntry> = Vec::new();

    for entry_result in std::fs::read_dir(absolute)? {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("EntitySerializer: Skipping unreadable entry in {absolute:?}: {e}");
                continue;
            }
        };
        let child_path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {
                subfolders.push(folder_summary(layout, root, &child_path));
            }
            Ok(_) => {
                files.push(serialize_file(layout, root, &child_path));
            }
            Err(e) => {
                log::warn!("EntitySerializer: Could not read type of {child_path:?}: {e}");
            }
        }
    }

    subfolders.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.wire_name().to_string());

    Ok(FolderEntry {
        name,
        relative_path: layout.relative_path(root, absolute),
        root,
        parent_folder: parent_summary(layout, root, absolute),
        subfolders,
        files,
    })
}
