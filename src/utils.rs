//! Path resolution and small host helpers.

use crate::constants;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves resource files shipped next to the program.
///
/// The executable's directory wins over the working directory, so a bundle
/// launched from anywhere still finds its `config.toml`, driver and socat.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    exe_dir: Option<PathBuf>,
    work_dir: PathBuf,
}

impl ResourceLocator {
    pub fn new(exe_dir: Option<PathBuf>, work_dir: PathBuf) -> Self {
        Self { exe_dir, work_dir }
    }

    /// Locator for the running process.
    ///
    /// # Errors
    ///
    /// Returns an error if the current working directory cannot be determined.
    pub fn from_env() -> io::Result<Self> {
        Ok(Self::new(executable_dir().ok(), std::env::current_dir()?))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Absolute path of a resource.
    ///
    /// Returns the first existing candidate (executable directory, then working
    /// directory). When neither exists the executable-directory candidate is
    /// returned anyway so error messages name a deterministic location.
    #[must_use]
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            return name.to_path_buf();
        }

        let exe_candidate = self.exe_dir.as_ref().map(|dir| dir.join(name));
        if let Some(candidate) = &exe_candidate {
            if candidate.exists() {
                return candidate.clone();
            }
        }

        let work_candidate = self.work_dir.join(name);
        if work_candidate.exists() {
            return work_candidate;
        }

        exe_candidate.unwrap_or(work_candidate)
    }
}

/// Directory containing the running executable, with symlinks resolved.
///
/// # Errors
///
/// Returns an error if the executable path cannot be determined or canonicalized.
pub fn executable_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?.canonicalize()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))
}

/// Get the application config directory (`~/.config/printbridge` or platform equivalent).
pub fn get_app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(constants::APP_NAME))
}

/// Get the logs directory, creating it if needed.
///
/// # Errors
///
/// Returns an error if no config directory exists for this user or it cannot be created.
pub fn get_logs_dir() -> io::Result<PathBuf> {
    let dir = get_app_config_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory"))?
        .join(constants::LOGS_DIR_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Whether the process runs with an effective uid of 0.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Quote a string for `/bin/sh` using single quotes.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Quote a string as an AppleScript string literal.
pub fn applescript_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', r"\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_prefers_executable_dir() {
        let exe = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(exe.path().join("config.toml"), "").unwrap();
        fs::write(work.path().join("config.toml"), "").unwrap();

        let locator = ResourceLocator::new(Some(exe.path().to_path_buf()), work.path().to_path_buf());
        assert_eq!(locator.resolve("config.toml"), exe.path().join("config.toml"));
    }

    #[test]
    fn test_resolve_falls_back_to_work_dir() {
        let exe = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(work.path().join("driver.pkg"), "").unwrap();

        let locator = ResourceLocator::new(Some(exe.path().to_path_buf()), work.path().to_path_buf());
        assert_eq!(locator.resolve("driver.pkg"), work.path().join("driver.pkg"));
    }

    #[test]
    fn test_resolve_missing_returns_exe_candidate() {
        let exe = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();

        let locator = ResourceLocator::new(Some(exe.path().to_path_buf()), work.path().to_path_buf());
        assert_eq!(locator.resolve("socat"), exe.path().join("socat"));

        let no_exe = ResourceLocator::new(None, work.path().to_path_buf());
        assert_eq!(no_exe.resolve("socat"), work.path().join("socat"));
    }

    #[test]
    fn test_resolve_absolute_path_unchanged() {
        let locator = ResourceLocator::new(None, PathBuf::from("/tmp"));
        assert_eq!(
            locator.resolve("/opt/drivers/a.pkg"),
            PathBuf::from("/opt/drivers/a.pkg")
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/tmp/a b.pkg"), "'/tmp/a b.pkg'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_applescript_quote() {
        assert_eq!(applescript_quote("a \"b\""), r#""a \"b\"""#);
        assert_eq!(applescript_quote(r"c:\x"), r#""c:\\x""#);
    }
}
