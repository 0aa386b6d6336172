/// Workspace access for the orchestrator
///
/// Everything the orchestrator knows about the project directory goes through
/// the [`Workspace`] trait: reading and writing small sidecar files, checking
/// existence, and reading modification timestamps. `FsWorkspace` is the real
/// filesystem rooted at the project directory; `MemoryWorkspace` keeps files
/// and timestamps in a map so tests can control mtimes directly.
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Modification time not representable for {0}")]
    InvalidTimestamp(PathBuf),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-value view of a project directory
///
/// Keys are paths relative to the workspace root.
pub trait Workspace {
    /// Whether `path` exists
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file as UTF-8
    fn read(&self, path: &Path) -> StoreResult<String>;

    /// Replace the file content, creating parent directories as needed
    fn write(&self, path: &Path, content: &str) -> StoreResult<()>;

    /// Remove the file; removing a missing file is not an error
    fn remove(&self, path: &Path) -> StoreResult<()>;

    /// Last modification time in nanoseconds since the Unix epoch
    fn modified_ns(&self, path: &Path) -> StoreResult<i128>;
}

/// Filesystem-backed workspace rooted at a project directory
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Signed nanoseconds since the epoch (pre-epoch mtimes are negative)
pub fn system_time_to_ns(time: SystemTime) -> Option<i128> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i128::try_from(after.as_nanos()).ok(),
        Err(before) => i128::try_from(before.duration().as_nanos())
            .ok()
            .map(|ns| -ns),
    }
}

/// Mode the replacement file should carry: the existing file's, else 0644
///
/// Temp files are created owner-only, which would otherwise leak onto the
/// dotfiles after the rename.
fn target_permissions(full: &Path) -> Option<fs::Permissions> {
    match fs::metadata(full) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

impl Workspace for FsWorkspace {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn read(&self, path: &Path) -> StoreResult<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(io_err(&full))
    }

    fn write(&self, path: &Path, content: &str) -> StoreResult<()> {
        let full = self.resolve(path);
        let parent = full
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).map_err(io_err(&parent))?;

        // Write to a sibling temp file and rename so readers never see a partial stamp
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(io_err(&parent))?;
        tmp.write_all(content.as_bytes()).map_err(io_err(&full))?;
        if let Some(permissions) = target_permissions(&full) {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(io_err(&full))?;
        }
        tmp.persist(&full).map_err(|e| io_err(&full)(e.error))?;

        debug!(
            operation = "write",
            path = %full.display(),
            size_bytes = content.len(),
            "workspace file written"
        );
        Ok(())
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        let full = self.resolve(path);
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&full)(e)),
        }
    }

    fn modified_ns(&self, path: &Path) -> StoreResult<i128> {
        let full = self.resolve(path);
        let modified = fs::metadata(&full)
            .and_then(|m| m.modified())
            .map_err(io_err(&full))?;
        system_time_to_ns(modified).ok_or(StoreError::InvalidTimestamp(full))
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified_ns: i128,
}

/// In-memory workspace
///
/// Every write bumps an internal clock so successive writes get strictly
/// increasing timestamps; `touch` sets a timestamp explicitly.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    clock: Mutex<i128>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> i128 {
        let mut clock = self.clock.lock().unwrap_or_else(|e| e.into_inner());
        *clock += 1_000;
        *clock
    }

    /// Set the modification time of an existing file, or create an empty one
    pub fn touch(&self, path: impl AsRef<Path>, modified_ns: i128) {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files
            .entry(path.as_ref().to_path_buf())
            .and_modify(|f| f.modified_ns = modified_ns)
            .or_insert(MemoryFile {
                content: String::new(),
                modified_ns,
            });
    }
}

impl Workspace for MemoryWorkspace {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    fn read(&self, path: &Path) -> StoreResult<String> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, content: &str) -> StoreResult<()> {
        let modified_ns = self.tick();
        self.files.lock().unwrap_or_else(|e| e.into_inner()).insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.to_string(),
                modified_ns,
            },
        );
        Ok(())
    }

    fn remove(&self, path: &Path) -> StoreResult<()> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
        Ok(())
    }

    fn modified_ns(&self, path: &Path) -> StoreResult<i128> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .map(|f| f.modified_ns)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_fs_workspace_write_and_read() {
        let temp = TempDir::new().unwrap();
        let ws = FsWorkspace::new(temp.path());

        ws.write(Path::new(".ts"), "123 456").unwrap();
        assert!(ws.exists(Path::new(".ts")));
        assert_eq!(ws.read(Path::new(".ts")).unwrap(), "123 456");

        // Overwrite, no trailing newline added
        ws.write(Path::new(".ts"), "789").unwrap();
        assert_eq!(fs::read_to_string(temp.path().join(".ts")).unwrap(), "789");
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_workspace_write_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let ws = FsWorkspace::new(temp.path());
        let mode = |name: &str| {
            fs::metadata(temp.path().join(name))
                .unwrap()
                .permissions()
                .mode()
                & 0o777
        };

        // New files are world-readable, not owner-only
        ws.write(Path::new(".ts"), "1").unwrap();
        assert_eq!(mode(".ts"), 0o644);

        // Existing modes survive a rewrite
        fs::write(temp.path().join(".cpreset"), "debug\n").unwrap();
        fs::set_permissions(
            temp.path().join(".cpreset"),
            fs::Permissions::from_mode(0o664),
        )
        .unwrap();
        ws.write(Path::new(".cpreset"), "release\n").unwrap();
        assert_eq!(mode(".cpreset"), 0o664);
        assert_eq!(ws.read(Path::new(".cpreset")).unwrap(), "release\n");
    }

    #[test]
    fn test_fs_workspace_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let ws = FsWorkspace::new(temp.path());

        ws.write(Path::new("out/build/stamp"), "x").unwrap();
        assert!(temp.path().join("out/build/stamp").is_file());
    }

    #[test]
    fn test_fs_workspace_missing_file() {
        let temp = TempDir::new().unwrap();
        let ws = FsWorkspace::new(temp.path());

        assert!(!ws.exists(Path::new("nope")));
        assert!(matches!(
            ws.read(Path::new("nope")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            ws.modified_ns(Path::new("nope")),
            Err(StoreError::NotFound(_))
        ));
        // Removing a missing file is fine
        ws.remove(Path::new("nope")).unwrap();
    }

    #[test]
    fn test_fs_workspace_modified_ns_tracks_mtime() {
        let temp = TempDir::new().unwrap();
        let ws = FsWorkspace::new(temp.path());
        let file = temp.path().join("CMakeLists.txt");
        fs::write(&file, "project(x)").unwrap();

        let stamp = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        assert_eq!(
            ws.modified_ns(Path::new("CMakeLists.txt")).unwrap(),
            1_700_000_000_123_456_789
        );
    }

    #[test]
    fn test_system_time_before_epoch_is_negative() {
        let before = UNIX_EPOCH - Duration::from_nanos(5);
        assert_eq!(system_time_to_ns(before), Some(-5));
    }

    #[test]
    fn test_memory_workspace_clock_advances() {
        let ws = MemoryWorkspace::new();
        ws.write(Path::new("a"), "1").unwrap();
        ws.write(Path::new("b"), "2").unwrap();

        let a = ws.modified_ns(Path::new("a")).unwrap();
        let b = ws.modified_ns(Path::new("b")).unwrap();
        assert!(b > a);

        ws.touch("a", 42);
        assert_eq!(ws.modified_ns(Path::new("a")).unwrap(), 42);
        assert_eq!(ws.read(Path::new("a")).unwrap(), "1");

        ws.remove(Path::new("a")).unwrap();
        assert!(!ws.exists(Path::new("a")));
    }
}
