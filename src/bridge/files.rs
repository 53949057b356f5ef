/*
 * This module implements the `files` channel: the command dispatcher that
 * receives file/folder envelopes from the scripting side, performs the
 * operation against the sandbox layout, and answers through generated
 * callback invocations. Every command resolves its root and validates its
 * parameters before any file-system access; every domain failure is caught
 * here and translated into the operation's failure callback — nothing
 * propagates as a fault to the host.
 *
 * Interactive import is the one asynchronous operation: the request stores a
 * `PendingImport` and asks the host to present a picker; the actual copying
 * happens when the picker-completion event arrives. At most one import is
 * outstanding; a second request overwrites the first (last-write-wins).
 */
use crate::bridge::response::{CallbackPayload, emit};
use crate::bridge::types::{ChannelHandler, HostCommand, HostEvent, WindowId};
use crate::core::sandbox::{SandboxLayout, SandboxRoot};
use crate::core::serializer;
use crate::core::unique_name::{unique_file_name, unique_folder_name};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const FILES_CHANNEL: &str = "files";

// Settle delay before the post-rename verification read, tolerating
// file-system-metadata visibility latency. Not an ordering guarantee.
const RENAME_SETTLE_DELAY_MS: u64 = 50;

// Allow-list applied when an import request does not name its own filter:
// the scripting and plain-text formats the host can meaningfully open.
const DEFAULT_IMPORT_EXTENSIONS: &[&str] = &["js", "mjs", "json", "txt", "md", "html", "css"];

// --- Errors ---

/*
 * Failure taxonomy of the files channel. Each value becomes a human-readable
 * message delivered through the operation's failure callback; none of these
 * are fatal to the bridge.
 */
#[derive(Debug)]
pub enum FileCommandError {
    InvalidRoot(String),
    SubpathMissing,
    MissingParameter(&'static str),
    MalformedBody(String),
    FileNotFound(String),
    FolderNotFound(String),
    ParentFolderNotFound(String),
    CreateFailed(String),
    DeleteFailed(String),
    MoveFailed(String),
    RenameFailed(String),
    ReadFailed(String),
    WriteFailed(String),
    JsonEncodingFailed(String),
    ImportFailed(String),
    InvalidFileTypes,
    UnknownCommand(String),
    PresentingSurfaceUnavailable,
}

impl std::fmt::Display for FileCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileCommandError::InvalidRoot(name) => write!(f, "Invalid root: {name}"),
            FileCommandError::SubpathMissing => write!(f, "No subpath specified"),
            FileCommandError::MissingParameter(name) => {
                write!(f, "Missing required parameter '{name}'")
            }
            FileCommandError::MalformedBody(detail) => {
                write!(f, "Malformed message body: {detail}")
            }
            FileCommandError::FileNotFound(path) => write!(f, "File not found: {path}"),
            FileCommandError::FolderNotFound(path) => write!(f, "Folder not found: {path}"),
            FileCommandError::ParentFolderNotFound(path) => {
                write!(f, "Parent folder not found: {path}")
            }
            FileCommandError::CreateFailed(detail) => write!(f, "Create failed: {detail}"),
            FileCommandError::DeleteFailed(detail) => write!(f, "Delete failed: {detail}"),
            FileCommandError::MoveFailed(detail) => write!(f, "Move failed: {detail}"),
            FileCommandError::RenameFailed(detail) => write!(f, "Rename failed: {detail}"),
            FileCommandError::ReadFailed(detail) => write!(f, "Read failed: {detail}"),
            FileCommandError::WriteFailed(detail) => write!(f, "Write failed: {detail}"),
            FileCommandError::JsonEncodingFailed(detail) => {
                write!(f, "Could not encode response payload: {detail}")
            }
            FileCommandError::ImportFailed(detail) => write!(f, "Import failed: {detail}"),
            FileCommandError::InvalidFileTypes => write!(f, "Invalid file type filter"),
            FileCommandError::UnknownCommand(name) => write!(f, "Unknown command '{name}'"),
            FileCommandError::PresentingSurfaceUnavailable => {
                write!(f, "No presenting surface available")
            }
        }
    }
}

impl std::error::Error for FileCommandError {}

pub type Result<T> = std::result::Result<T, FileCommandError>;

// --- Typed commands ---

/*
 * One validated file/folder command. Envelope bodies are dynamically typed;
 * they are converted into these variants exactly once, at the dispatch
 * boundary, so the operations below never probe an untyped map.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum FileCommand {
    CreateFile {
        root: SandboxRoot,
        subpath: String,
        file_name: String,
    },
    CreateFolder {
        root: SandboxRoot,
        subpath: String,
        folder_name: String,
    },
    DeleteFile {
        root: SandboxRoot,
        subpath: String,
    },
    DeleteFolder {
        root: SandboxRoot,
        subpath: String,
    },
    GetFile {
        root: SandboxRoot,
        subpath: String,
    },
    GetFolder {
        root: SandboxRoot,
        subpath: String,
    },
    RenameFile {
        root: SandboxRoot,
        subpath: String,
        new_name: String,
    },
    RenameFolder {
        root: SandboxRoot,
        subpath: String,
        new_name: String,
    },
    MoveFile {
        old_root: SandboxRoot,
        old_subpath: String,
        new_root: SandboxRoot,
        new_subpath: String,
    },
    MoveFolder {
        old_root: SandboxRoot,
        old_subpath: String,
        new_root: SandboxRoot,
        new_subpath: String,
    },
    ReadFile {
        root: SandboxRoot,
        subpath: String,
    },
    WriteToFile {
        root: SandboxRoot,
        subpath: String,
        content: String,
        replace: bool,
        newline: bool,
    },
    ImportFile {
        root: SandboxRoot,
        subpath: String,
        extensions: Option<Vec<String>>,
    },
}

// Raw envelope body; every field optional, validated per command.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFileMessage {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    subpath: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    folder_name: Option<String>,
    #[serde(default)]
    old_root: Option<String>,
    #[serde(default)]
    old_subpath: Option<String>,
    #[serde(default)]
    new_root: Option<String>,
    #[serde(default)]
    new_subpath: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    replace: Option<bool>,
    #[serde(default)]
    newline: Option<bool>,
    #[serde(default)]
    file_extensions: Option<JsonValue>,
}

fn required_root(field: Option<String>) -> Result<SandboxRoot> {
    let name = field.ok_or_else(|| FileCommandError::InvalidRoot("not specified".to_string()))?;
    SandboxRoot::from_wire_name(&name).ok_or(FileCommandError::InvalidRoot(name))
}

fn required_subpath(field: Option<String>) -> Result<String> {
    field.ok_or(FileCommandError::SubpathMissing)
}

fn required_string(field: Option<String>, name: &'static str) -> Result<String> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(FileCommandError::MissingParameter(name)),
    }
}

/*
 * Validates an explicit import filter: a non-empty array of extension
 * strings. Entries are normalized to lowercase without a leading dot.
 */
fn validate_extension_filter(value: &JsonValue) -> Result<Vec<String>> {
    let entries = value.as_array().ok_or(FileCommandError::InvalidFileTypes)?;
    if entries.is_empty() {
        return Err(FileCommandError::InvalidFileTypes);
    }
    let mut extensions = Vec::with_capacity(entries.len());
    for entry in entries {
        let text = entry.as_str().ok_or(FileCommandError::InvalidFileTypes)?;
        let normalized = text.trim_start_matches('.').to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(FileCommandError::InvalidFileTypes);
        }
        extensions.push(normalized);
    }
    Ok(extensions)
}

impl FileCommand {
    /*
     * Builds the typed command for a known command name. The command name
     * itself has already been matched against the operation table; this
     * only validates parameters.
     */
    fn from_raw(command_name: &str, raw: RawFileMessage) -> Result<FileCommand> {
        match command_name {
            "createFile" => Ok(FileCommand::CreateFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                file_name: required_string(raw.file_name, "fileName")?,
            }),
            "createFolder" => Ok(FileCommand::CreateFolder {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                folder_name: required_string(raw.folder_name, "folderName")?,
            }),
            "deleteFile" => Ok(FileCommand::DeleteFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
            }),
            "deleteFolder" => Ok(FileCommand::DeleteFolder {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
            }),
            "getFile" => Ok(FileCommand::GetFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
            }),
            "getFolder" => Ok(FileCommand::GetFolder {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
            }),
            "renameFile" => Ok(FileCommand::RenameFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                new_name: required_string(raw.file_name, "fileName")?,
            }),
            "renameFolder" => Ok(FileCommand::RenameFolder {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                new_name: required_string(raw.folder_name, "folderName")?,
            }),
            "moveFile" => Ok(FileCommand::MoveFile {
                old_root: required_root(raw.old_root)?,
                old_subpath: required_subpath(raw.old_subpath)?,
                new_root: required_root(raw.new_root)?,
                new_subpath: required_subpath(raw.new_subpath)?,
            }),
            "moveFolder" => Ok(FileCommand::MoveFolder {
                old_root: required_root(raw.old_root)?,
                old_subpath: required_subpath(raw.old_subpath)?,
                new_root: required_root(raw.new_root)?,
                new_subpath: required_subpath(raw.new_subpath)?,
            }),
            "readFile" => Ok(FileCommand::ReadFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
            }),
            "writeToFile" => Ok(FileCommand::WriteToFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                content: raw
                    .content
                    .ok_or(FileCommandError::MissingParameter("content"))?,
                replace: raw.replace.unwrap_or(false),
                newline: raw.newline.unwrap_or(true),
            }),
            "importFile" => Ok(FileCommand::ImportFile {
                root: required_root(raw.root)?,
                subpath: required_subpath(raw.subpath)?,
                extensions: match raw.file_extensions {
                    Some(value) => Some(validate_extension_filter(&value)?),
                    None => None,
                },
            }),
            other => Err(FileCommandError::UnknownCommand(other.to_string())),
        }
    }
}

/*
 * The fixed per-operation callback contract: (success, failure) names on
 * the `files` channel object. An unknown command has no failure callback
 * and is therefore logged and dropped without a response.
 */
fn callback_names(command_name: &str) -> Option<(&'static str, &'static str)> {
    match command_name {
        "createFile" => Some(("_createFileSuccess", "_createFileFail")),
        "createFolder" => Some(("_createFolderSuccess", "_createFolderFail")),
        "deleteFile" => Some(("_deleteFileSuccess", "_deleteFileFail")),
        "deleteFolder" => Some(("_deleteFolderSuccess", "_deleteFolderFail")),
        "getFile" => Some(("_getFileSuccess", "_getFileFail")),
        "getFolder" => Some(("_getFolderSuccess", "_getFolderFail")),
        "renameFile" => Some(("_renameFileSuccess", "_renameFileFail")),
        "renameFolder" => Some(("_renameFolderSuccess", "_renameFolderFail")),
        "moveFile" => Some(("_moveFileSuccess", "_moveFileFail")),
        "moveFolder" => Some(("_moveFolderSuccess", "_moveFolderFail")),
        "readFile" => Some(("_readFileSuccess", "_readFileFail")),
        "writeToFile" => Some(("_writeToFileSuccess", "_writeToFileFail")),
        "importFile" => Some(("_importFileSuccess", "_importFileFail")),
        _ => None,
    }
}

// --- Import correlation ---

// Destination and filter of the single in-flight interactive import, held
// between the request and the picker-completion event.
#[derive(Debug, Clone)]
struct PendingImport {
    destination_root: SandboxRoot,
    destination_subpath: String,
    allowed_extensions: Vec<String>,
}

// How an operation concludes: an immediate response on the channel, or
// commands for the host (the import picker request).
enum Dispatch {
    Respond(CallbackPayload),
    Host(Vec<HostCommand>),
}

// --- The channel handler ---

pub struct FilesChannel {
    layout: SandboxLayout,
    window_id: Option<WindowId>,
    pending_import: Option<PendingImport>,
}

impl FilesChannel {
    pub fn new(layout: SandboxLayout) -> Self {
        FilesChannel {
            layout,
            window_id: None,
            pending_import: None,
        }
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<CallbackPayload> {
        serde_json::to_string(value)
            .map(CallbackPayload::Json)
            .map_err(|e| FileCommandError::JsonEncodingFailed(e.to_string()))
    }

    fn perform(&mut self, command: FileCommand) -> Result<Dispatch> {
        match command {
            FileCommand::CreateFile {
                root,
                subpath,
                file_name,
            } => self.create_file(root, &subpath, &file_name),
            FileCommand::CreateFolder {
                root,
                subpath,
                folder_name,
            } => self.create_folder(root, &subpath, &folder_name),
            FileCommand::DeleteFile { root, subpath } => self.delete_file(root, &subpath),
            FileCommand::DeleteFolder { root, subpath } => self.delete_folder(root, &subpath),
            FileCommand::GetFile { root, subpath } => self.get_file(root, &subpath),
            FileCommand::GetFolder { root, subpath } => self.get_folder(root, &subpath),
            FileCommand::RenameFile {
                root,
                subpath,
                new_name,
            } => self.rename_file(root, &subpath, &new_name),
            FileCommand::RenameFolder {
                root,
                subpath,
                new_name,
            } => self.rename_folder(root, &subpath, &new_name),
            FileCommand::MoveFile {
                old_root,
                old_subpath,
                new_root,
                new_subpath,
            } => self.move_file(old_root, &old_subpath, new_root, &new_subpath),
            FileCommand::MoveFolder {
                old_root,
                old_subpath,
                new_root,
                new_subpath,
            } => self.move_folder(old_root, &old_subpath, new_root, &new_subpath),
            FileCommand::ReadFile { root, subpath } => self.read_file(root, &subpath),
            FileCommand::WriteToFile {
                root,
                subpath,
                content,
                replace,
                newline,
            } => self.write_to_file(root, &subpath, &content, replace, newline),
            FileCommand::ImportFile {
                root,
                subpath,
                extensions,
            } => self.import_file(root, &subpath, extensions),
        }
    }

    // --- Operations ---

    fn create_file(&self, root: SandboxRoot, subpath: &str, file_name: &str) -> Result<Dispatch> {
        let folder = self.layout.resolve(root, subpath);
        if !folder.is_dir() {
            return Err(FileCommandError::ParentFolderNotFound(subpath.to_string()));
        }
        let unique = unique_file_name(file_name, |name| folder.join(name).exists());
        let file_path = folder.join(&unique);
        fs::write(&file_path, "")
            .map_err(|e| FileCommandError::CreateFailed(format!("{unique}: {e}")))?;
        log::debug!("FilesChannel: Created file {file_path:?}");
        let entry = serializer::serialize_file(&self.layout, root, &file_path);
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    fn create_folder(
        &self,
        root: SandboxRoot,
        subpath: &str,
        folder_name: &str,
    ) -> Result<Dispatch> {
        let parent = self.layout.resolve(root, subpath);
        if !parent.is_dir() {
            return Err(FileCommandError::ParentFolderNotFound(subpath.to_string()));
        }
        let unique = unique_folder_name(folder_name, |name| parent.join(name).exists());
        let folder_path = parent.join(&unique);
        fs::create_dir(&folder_path)
            .map_err(|e| FileCommandError::CreateFailed(format!("{unique}: {e}")))?;
        log::debug!("FilesChannel: Created folder {folder_path:?}");
        let entry = serializer::serialize_folder(&self.layout, root, &folder_path)
            .map_err(|e| FileCommandError::CreateFailed(e.to_string()))?;
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    fn delete_file(&self, root: SandboxRoot, subpath: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_file() {
            return Err(FileCommandError::FileNotFound(subpath.to_string()));
        }
        fs::remove_file(&path)
            .map_err(|e| FileCommandError::DeleteFailed(format!("{subpath}: {e}")))?;
        log::debug!("FilesChannel: Deleted file {path:?}");
        Ok(Dispatch::Respond(CallbackPayload::None))
    }

    fn delete_folder(&self, root: SandboxRoot, subpath: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_dir() {
            return Err(FileCommandError::FolderNotFound(subpath.to_string()));
        }
        fs::remove_dir_all(&path)
            .map_err(|e| FileCommandError::DeleteFailed(format!("{subpath}: {e}")))?;
        log::debug!("FilesChannel: Deleted folder {path:?} recursively");
        Ok(Dispatch::Respond(CallbackPayload::None))
    }

    fn get_file(&self, root: SandboxRoot, subpath: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_file() {
            return Err(FileCommandError::FileNotFound(subpath.to_string()));
        }
        let entry = serializer::serialize_file(&self.layout, root, &path);
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    fn get_folder(&self, root: SandboxRoot, subpath: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_dir() {
            return Err(FileCommandError::FolderNotFound(subpath.to_string()));
        }
        let entry = serializer::serialize_folder(&self.layout, root, &path)
            .map_err(|e| FileCommandError::ReadFailed(format!("{subpath}: {e}")))?;
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    /*
     * Renames a file in place, preserving the source extension: the
     * requested name's own extension (if any) is dropped and the source's
     * reattached, so dotted new names cannot change the file type.
     */
    fn rename_file(&self, root: SandboxRoot, subpath: &str, new_name: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_file() {
            return Err(FileCommandError::FileNotFound(subpath.to_string()));
        }
        let parent = path
            .parent()
            .ok_or_else(|| FileCommandError::RenameFailed("no parent folder".to_string()))?
            .to_path_buf();
        let current_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let desired = match path.extension().and_then(|e| e.to_str()) {
            Some(source_ext) => {
                let requested_base = Path::new(new_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(new_name);
                format!("{requested_base}.{source_ext}")
            }
            None => new_name.to_string(),
        };

        // The entry being renamed does not collide with itself.
        let unique = unique_file_name(&desired, |name| {
            name != current_name && parent.join(name).exists()
        });
        let new_path = parent.join(&unique);
        fs::rename(&path, &new_path)
            .map_err(|e| FileCommandError::RenameFailed(format!("{subpath}: {e}")))?;

        std::thread::sleep(Duration::from_millis(RENAME_SETTLE_DELAY_MS));
        if !new_path.is_file() {
            return Err(FileCommandError::RenameFailed(format!(
                "{unique} not visible after rename"
            )));
        }
        log::debug!("FilesChannel: Renamed {path:?} -> {new_path:?}");
        let entry = serializer::serialize_file(&self.layout, root, &new_path);
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    fn rename_folder(&self, root: SandboxRoot, subpath: &str, new_name: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_dir() {
            return Err(FileCommandError::FolderNotFound(subpath.to_string()));
        }
        let parent = path
            .parent()
            .ok_or_else(|| FileCommandError::RenameFailed("no parent folder".to_string()))?
            .to_path_buf();
        let current_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let unique = unique_folder_name(new_name, |name| {
            name != current_name && parent.join(name).exists()
        });
        let new_path = parent.join(&unique);
        fs::rename(&path, &new_path)
            .map_err(|e| FileCommandError::RenameFailed(format!("{subpath}: {e}")))?;

        std::thread::sleep(Duration::from_millis(RENAME_SETTLE_DELAY_MS));
        if !new_path.is_dir() {
            return Err(FileCommandError::RenameFailed(format!(
                "{unique} not visible after rename"
            )));
        }
        log::debug!("FilesChannel: Renamed folder {path:?} -> {new_path:?}");
        let entry = serializer::serialize_folder(&self.layout, root, &new_path)
            .map_err(|e| FileCommandError::RenameFailed(e.to_string()))?;
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    /*
     * Moves a file between two independently resolved locations, possibly
     * across roots. Always copy-then-delete; an interruption can leave the
     * file present at both ends, there is no atomicity across the steps.
     */
    fn move_file(
        &self,
        old_root: SandboxRoot,
        old_subpath: &str,
        new_root: SandboxRoot,
        new_subpath: &str,
    ) -> Result<Dispatch> {
        let source = self.layout.resolve(old_root, old_subpath);
        if !source.is_file() {
            return Err(FileCommandError::FileNotFound(old_subpath.to_string()));
        }
        let destination_folder = self.layout.resolve(new_root, new_subpath);
        if !destination_folder.is_dir() {
            return Err(FileCommandError::ParentFolderNotFound(
                new_subpath.to_string(),
            ));
        }
        let source_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FileCommandError::MoveFailed("source has no file name".to_string()))?
            .to_string();

        let unique = unique_file_name(&source_name, |name| {
            destination_folder.join(name).exists()
        });
        let destination = destination_folder.join(&unique);
        fs::copy(&source, &destination)
            .map_err(|e| FileCommandError::MoveFailed(format!("copy to {unique}: {e}")))?;
        fs::remove_file(&source).map_err(|e| {
            log::error!(
                "FilesChannel: Source {source:?} could not be removed after copy; file now exists at both ends."
            );
            FileCommandError::MoveFailed(format!("remove source {old_subpath}: {e}"))
        })?;
        log::debug!("FilesChannel: Moved file {source:?} -> {destination:?}");
        let entry = serializer::serialize_file(&self.layout, new_root, &destination);
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    /*
     * Moves a folder tree with a breadth-first walk: create the destination
     * folder, copy direct files, queue (source, destination) subfolder
     * pairs, repeat until the queue drains, then delete the original tree.
     */
    fn move_folder(
        &self,
        old_root: SandboxRoot,
        old_subpath: &str,
        new_root: SandboxRoot,
        new_subpath: &str,
    ) -> Result<Dispatch> {
        let source = self.layout.resolve(old_root, old_subpath);
        if !source.is_dir() {
            return Err(FileCommandError::FolderNotFound(old_subpath.to_string()));
        }
        let destination_parent = self.layout.resolve(new_root, new_subpath);
        if !destination_parent.is_dir() {
            return Err(FileCommandError::ParentFolderNotFound(
                new_subpath.to_string(),
            ));
        }
        let source_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FileCommandError::MoveFailed("source has no folder name".to_string()))?
            .to_string();

        let unique = unique_folder_name(&source_name, |name| {
            destination_parent.join(name).exists()
        });
        let destination = destination_parent.join(&unique);
        fs::create_dir(&destination)
            .map_err(|e| FileCommandError::MoveFailed(format!("create {unique}: {e}")))?;

        let mut queue: VecDeque<(std::path::PathBuf, std::path::PathBuf)> = VecDeque::new();
        queue.push_back((source.clone(), destination.clone()));
        while let Some((from, to)) = queue.pop_front() {
            let entries = fs::read_dir(&from)
                .map_err(|e| FileCommandError::MoveFailed(format!("read {from:?}: {e}")))?;
            for entry_result in entries {
                let entry = entry_result
                    .map_err(|e| FileCommandError::MoveFailed(format!("read {from:?}: {e}")))?;
                let child_source = entry.path();
                let child_destination = to.join(entry.file_name());
                if child_source.is_dir() {
                    fs::create_dir(&child_destination).map_err(|e| {
                        FileCommandError::MoveFailed(format!("create {child_destination:?}: {e}"))
                    })?;
                    queue.push_back((child_source, child_destination));
                } else {
                    fs::copy(&child_source, &child_destination).map_err(|e| {
                        FileCommandError::MoveFailed(format!("copy {child_source:?}: {e}"))
                    })?;
                }
            }
        }

        fs::remove_dir_all(&source)
            .map_err(|e| FileCommandError::MoveFailed(format!("remove source: {e}")))?;
        log::debug!("FilesChannel: Moved folder {source:?} -> {destination:?}");
        let entry = serializer::serialize_folder(&self.layout, new_root, &destination)
            .map_err(|e| FileCommandError::MoveFailed(e.to_string()))?;
        Ok(Dispatch::Respond(Self::encode(&entry)?))
    }

    fn read_file(&self, root: SandboxRoot, subpath: &str) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if !path.is_file() {
            return Err(FileCommandError::FileNotFound(subpath.to_string()));
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| FileCommandError::ReadFailed(format!("{subpath}: {e}")))?;
        Ok(Dispatch::Respond(CallbackPayload::Text(content)))
    }

    /*
     * Replace mode writes the content verbatim (creating the file if
     * needed). Append mode requires an existing file, reads it back, and
     * appends the content, separated by a newline unless disabled.
     */
    fn write_to_file(
        &self,
        root: SandboxRoot,
        subpath: &str,
        content: &str,
        replace: bool,
        newline: bool,
    ) -> Result<Dispatch> {
        let path = self.layout.resolve(root, subpath);
        if replace {
            fs::write(&path, content)
                .map_err(|e| FileCommandError::WriteFailed(format!("{subpath}: {e}")))?;
            return Ok(Dispatch::Respond(CallbackPayload::None));
        }

        if !path.is_file() {
            return Err(FileCommandError::FileNotFound(subpath.to_string()));
        }
        let mut combined = fs::read_to_string(&path)
            .map_err(|e| FileCommandError::WriteFailed(format!("{subpath}: {e}")))?;
        if newline {
            combined.push('\n');
        }
        combined.push_str(content);
        fs::write(&path, combined)
            .map_err(|e| FileCommandError::WriteFailed(format!("{subpath}: {e}")))?;
        Ok(Dispatch::Respond(CallbackPayload::None))
    }

    /*
     * Starts an interactive import: validates the presenting surface and
     * destination, stores the pending state, and asks the host to present
     * the picker. The copy happens in `finish_import` when the completion
     * event arrives.
     */
    fn import_file(
        &mut self,
        root: SandboxRoot,
        subpath: &str,
        extensions: Option<Vec<String>>,
    ) -> Result<Dispatch> {
        let window_id = self
            .window_id
            .ok_or(FileCommandError::PresentingSurfaceUnavailable)?;
        let destination = self.layout.resolve(root, subpath);
        if !destination.is_dir() {
            return Err(FileCommandError::FolderNotFound(subpath.to_string()));
        }
        let allowed_extensions = extensions.unwrap_or_else(|| {
            DEFAULT_IMPORT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect()
        });

        if self.pending_import.is_some() {
            log::warn!(
                "FilesChannel: An import is already pending; its destination is overwritten by the new request."
            );
        }
        self.pending_import = Some(PendingImport {
            destination_root: root,
            destination_subpath: subpath.to_string(),
            allowed_extensions: allowed_extensions.clone(),
        });

        Ok(Dispatch::Host(vec![HostCommand::PresentFilePicker {
            window_id,
            title: "Import Files".to_string(),
            allowed_extensions,
        }]))
    }

    /*
     * Completes the pending import for a picker result. Items whose
     * extension is not on the allow-list are skipped; the rest are copied
     * under collision-free names and returned as a serialized array. The
     * pending state has already been cleared by the caller, so a failure
     * here can never block future imports.
     */
    fn finish_import(
        &self,
        pending: &PendingImport,
        selection: &[std::path::PathBuf],
    ) -> Result<CallbackPayload> {
        let destination = self
            .layout
            .resolve(pending.destination_root, &pending.destination_subpath);
        if !destination.is_dir() {
            return Err(FileCommandError::ImportFailed(format!(
                "destination folder no longer exists: {}",
                pending.destination_subpath
            )));
        }

        let mut imported = Vec::new();
        for item in selection {
            let extension = item
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            let allowed = extension
                .as_deref()
                .is_some_and(|ext| pending.allowed_extensions.iter().any(|a| a == ext));
            if !allowed {
                log::debug!("FilesChannel: Skipping {item:?}; extension not in the allow-list.");
                continue;
            }
            let Some(name) = item.file_name().and_then(|n| n.to_str()) else {
                log::warn!("FilesChannel: Skipping {item:?}; no usable file name.");
                continue;
            };
            let unique = unique_file_name(name, |candidate| destination.join(candidate).exists());
            let target = destination.join(&unique);
            fs::copy(item, &target)
                .map_err(|e| FileCommandError::ImportFailed(format!("copy {name}: {e}")))?;
            imported.push(serializer::serialize_file(
                &self.layout,
                pending.destination_root,
                &target,
            ));
        }
        log::debug!(
            "FilesChannel: Imported {} of {} selected item(s).",
            imported.len(),
            selection.len()
        );
        Self::encode(&imported)
    }
}

impl ChannelHandler for FilesChannel {
    fn handle_message(&mut self, body: &JsonValue) -> Vec<HostCommand> {
        let Some(command_name) = body.get("command").and_then(JsonValue::as_str) else {
            log::warn!("FilesChannel: Envelope without a command string; dropped.");
            return Vec::new();
        };
        let Some((success_callback, fail_callback)) = callback_names(command_name) else {
            log::warn!("FilesChannel: Unknown command '{command_name}'; dropped.");
            return Vec::new();
        };

        let raw: RawFileMessage = match serde_json::from_value(body.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                let error = FileCommandError::MalformedBody(e.to_string());
                log::warn!("FilesChannel: {command_name} rejected: {error}");
                return vec![emit(
                    FILES_CHANNEL,
                    fail_callback,
                    CallbackPayload::Text(error.to_string()),
                )];
            }
        };

        let command = match FileCommand::from_raw(command_name, raw) {
            Ok(command) => command,
            Err(error) => {
                log::warn!("FilesChannel: {command_name} rejected: {error}");
                return vec![emit(
                    FILES_CHANNEL,
                    fail_callback,
                    CallbackPayload::Text(error.to_string()),
                )];
            }
        };

        log::trace!("FilesChannel: Dispatching {command_name}");
        match self.perform(command) {
            Ok(Dispatch::Respond(payload)) => {
                vec![emit(FILES_CHANNEL, success_callback, payload)]
            }
            Ok(Dispatch::Host(commands)) => commands,
            Err(error) => {
                log::warn!("FilesChannel: {command_name} failed: {error}");
                vec![emit(
                    FILES_CHANNEL,
                    fail_callback,
                    CallbackPayload::Text(error.to_string()),
                )]
            }
        }
    }

    fn handle_host_event(&mut self, event: &HostEvent) -> Vec<HostCommand> {
        match event {
            HostEvent::MainWindowReady { window_id } => {
                self.window_id = Some(*window_id);
                Vec::new()
            }
            HostEvent::WindowDestroyed { window_id } => {
                if self.window_id == Some(*window_id) {
                    self.window_id = None;
                    // A picker can no longer complete without its window.
                    if self.pending_import.take().is_some() {
                        log::warn!(
                            "FilesChannel: Presenting window destroyed with an import pending; import abandoned."
                        );
                    }
                }
                Vec::new()
            }
            HostEvent::FilePickerCompleted { result, .. } => {
                // Cleared unconditionally, before any copying can fail.
                let Some(pending) = self.pending_import.take() else {
                    log::warn!("FilesChannel: Picker completed with no import pending; ignored.");
                    return Vec::new();
                };
                match result {
                    None => {
                        log::debug!("FilesChannel: Import cancelled by the user.");
                        vec![emit(
                            FILES_CHANNEL,
                            "_importFileFail",
                            CallbackPayload::Text("Import was cancelled".to_string()),
                        )]
                    }
                    Some(selection) => match self.finish_import(&pending, selection) {
                        Ok(payload) => {
                            vec![emit(FILES_CHANNEL, "_importFileSuccess", payload)]
                        }
                        Err(error) => {
                            log::warn!("FilesChannel: Import failed: {error}");
                            vec![emit(
                                FILES_CHANNEL,
                                "_importFileFail",
                                CallbackPayload::Text(error.to_string()),
                            )]
                        }
                    },
                }
            }
        }
    }
}
