/*
 * This module defines the sandbox containers that scripts are allowed to
 * address. A script never sees an absolute path; it names one of four fixed
 * roots plus a relative subpath, and `SandboxLayout` maps that pair onto a
 * real directory owned by the host. Root identifiers are validated before
 * any file-system access is attempted.
 */
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/*
 * The four sandbox containers visible to scripts.
 * Wire names are the exact strings the script side sends in envelope bodies
 * ("Documents", "Library", "tmp", "Bundle"). The set is fixed for the
 * process lifetime.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SandboxRoot {
    Documents,
    Library,
    #[serde(rename = "tmp")]
    Temporary,
    Bundle,
}

impl SandboxRoot {
    /*
     * Parses a root identifier received from the script side.
     * Unknown identifiers yield `None`; callers reject the command before
     * touching the file system.
     */
    pub fn from_wire_name(name: &str) -> Option<SandboxRoot> {
        match name {
            "Documents" => Some(SandboxRoot::Documents),
            "Library" => Some(SandboxRoot::Library),
            "tmp" => Some(SandboxRoot::Temporary),
            "Bundle" => Some(SandboxRoot::Bundle),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            SandboxRoot::Documents => "Documents",
            SandboxRoot::Library => "Library",
            SandboxRoot::Temporary => "tmp",
            SandboxRoot::Bundle => "Bundle",
        }
    }
}

impl std::fmt::Display for SandboxRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/*
 * Maps each `SandboxRoot` to its backing directory.
 * The layout is constructed once by the host and stays fixed; the bridge
 * only ever joins subpaths onto these directories. No `..` normalization is
 * performed here — confinement relies on the host owning the four root
 * directories.
 */
#[derive(Debug, Clone)]
pub struct SandboxLayout {
    documents: PathBuf,
    library: PathBuf,
    temporary: PathBuf,
    bundle: PathBuf,
}

impl SandboxLayout {
    pub fn new(documents: PathBuf, library: PathBuf, temporary: PathBuf, bundle: PathBuf) -> Self {
        SandboxLayout {
            documents,
            library,
            temporary,
            bundle,
        }
    }

    /*
     * Derives the default layout for a named host application.
     * Documents and Library live under the per-application data directory,
     * Temporary under the OS temporary directory, and Bundle beside the
     * executable (read-only resources shipped with the host). Missing
     * directories are created; returns `None` if the platform directories
     * cannot be determined or created.
     */
    pub fn from_host_defaults(app_name: &str) -> Option<SandboxLayout> {
        log::trace!("SandboxLayout: Deriving host default layout for '{app_name}'");
        let proj_dirs = ProjectDirs::from("", "", app_name)?;

        let documents = proj_dirs.data_dir().join("Documents");
        let library = proj_dirs.data_dir().join("Library");
        let temporary = std::env::temp_dir().join(app_name);
        let bundle = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))?;

        for dir in [&documents, &library, &temporary] {
            if !dir.exists() {
                if let Err(e) = fs::create_dir_all(dir) {
                    log::error!("SandboxLayout: Failed to create sandbox directory {dir:?}: {e}");
                    return None;
                }
                log::debug!("SandboxLayout: Created sandbox directory {dir:?}");
            }
        }

        Some(SandboxLayout::new(documents, library, temporary, bundle))
    }

    /// The backing directory of a root.
    pub fn root_dir(&self, root: SandboxRoot) -> &Path {
        match root {
            SandboxRoot::Documents => &self.documents,
            SandboxRoot::Library => &self.library,
            SandboxRoot::Temporary => &self.temporary,
            SandboxRoot::Bundle => &self.bundle,
        }
    }

    /*
     * Resolves a (root, subpath) pair to an absolute path.
     * An empty subpath resolves to the root directory itself. The subpath is
     * joined as-is; `..` segments are not rewritten (see module docs).
     */
    pub fn resolve(&self, root: SandboxRoot, subpath: &str) -> PathBuf {
        if subpath.is_empty() {
            self.root_dir(root).to_path_buf()
        } else {
            self.root_dir(root).join(subpath)
        }
    }

    /*
     * Computes the root-relative path of an absolute path, as sent to the
     * script side. If the path does not lie under the root's directory the
     * full absolute path is returned instead of failing; that degenerate
     * output is tolerated rather than treated as an error.
     */
    pub fn relative_path(&self, root: SandboxRoot, absolute: &Path) -> String {
        match absolute.strip_prefix(self.root_dir(root)) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => {
                log::warn!(
                    "SandboxLayout: Path {absolute:?} is not under root {root}; returning it verbatim."
                );
                absolute.to_string_lossy().into_owned()
            }
        }
    }
}
