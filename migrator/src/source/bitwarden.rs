//! Bitwarden CLI adapter
//!
//! Runs `bw` as a child process for every call. The session key is handed
//! over in the `BW_SESSION` environment variable so it never shows up in the
//! process list.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::de::DeserializeOwned;
use tracing::debug;
use vaultport_shared::models::{SourceFolder, SourceItem};
use zeroize::Zeroizing;

use super::VaultSource;
use crate::error::{SourceError, SourceResult};

/// Used when neither the command line nor the config names a binary
pub const DEFAULT_BW_PATH: &str = "bw";

const SESSION_ENV: &str = "BW_SESSION";

/// Locate the `bw` executable.
///
/// Bare names are looked up on `PATH`; anything with a path separator must
/// point at an executable file.
pub fn resolve_bw_path(configured: &str) -> SourceResult<PathBuf> {
    which::which(configured).map_err(|_| SourceError::CliNotFound {
        path: configured.to_string(),
    })
}

/// `bw` command line client bound to an unlocked session
pub struct BitwardenCli {
    bw_path: PathBuf,
    session: Zeroizing<String>,
}

impl BitwardenCli {
    pub fn new<P: Into<PathBuf>>(bw_path: P, session: Zeroizing<String>) -> Self {
        Self {
            bw_path: bw_path.into(),
            session,
        }
    }

    pub fn bw_path(&self) -> &Path {
        &self.bw_path
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.bw_path);
        command
            .args(args)
            .arg("--nointeraction")
            .env(SESSION_ENV, self.session.as_str());
        command
    }

    fn run(&self, args: &[&str]) -> SourceResult<Vec<u8>> {
        let command_line = format!("bw {}", args.join(" "));
        debug!("Running `{}`", command_line);

        let Output {
            status,
            stdout,
            stderr,
        } = self.command(args).output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::CliNotFound {
                path: self.bw_path.display().to_string(),
            },
            _ => SourceError::Spawn {
                command: command_line.clone(),
                message: e.to_string(),
            },
        })?;

        if !status.success() {
            return Err(SourceError::CommandFailed {
                command: command_line,
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }

    fn list<T: DeserializeOwned>(&self, object: &str) -> SourceResult<Vec<T>> {
        let stdout = self.run(&["list", object])?;
        serde_json::from_slice(&stdout).map_err(|source| SourceError::Parse {
            command: format!("bw list {object}"),
            source,
        })
    }
}

impl VaultSource for BitwardenCli {
    fn list_folders(&self) -> SourceResult<Vec<SourceFolder>> {
        self.list("folders")
    }

    fn list_items(&self) -> SourceResult<Vec<SourceItem>> {
        self.list("items")
    }

    fn attachment_bytes(&self, attachment_id: &str, item_id: &str) -> SourceResult<Vec<u8>> {
        self.run(&["get", "attachment", attachment_id, "--raw", "--itemid", item_id])
    }
}

impl std::fmt::Debug for BitwardenCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitwardenCli")
            .field("bw_path", &self.bw_path)
            .field("session", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::ffi::OsStr;

    fn cli(path: &Path) -> BitwardenCli {
        BitwardenCli::new(path, Zeroizing::new("session-key".to_string()))
    }

    #[test]
    fn test_session_passed_in_environment() {
        let cli = cli(Path::new("bw"));
        let command = cli.command(&["list", "items"]);

        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args, vec!["list", "items", "--nointeraction"]);

        let session = command
            .get_envs()
            .find(|(key, _)| *key == SESSION_ENV)
            .and_then(|(_, value)| value);
        assert_eq!(session, Some(OsStr::new("session-key")));
    }

    #[test]
    fn test_debug_hides_session() {
        let cli = cli(Path::new("bw"));
        assert!(!format!("{cli:?}").contains("session-key"));
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(&dir.path().join("no-such-bw"));
        assert_matches!(cli.list_folders(), Err(SourceError::CliNotFound { .. }));
    }

    #[test]
    fn test_resolve_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("bw");
        assert_matches!(
            resolve_bw_path(&missing.to_string_lossy()),
            Err(SourceError::CliNotFound { .. })
        );
    }

    #[cfg(unix)]
    mod fake_cli {
        use super::*;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for `bw`
        fn fake_bw(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("bw");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh\n{body}").unwrap();
            drop(file);
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_list_folders_parses_output() {
            let dir = tempfile::tempdir().unwrap();
            let bw = fake_bw(
                dir.path(),
                r#"echo '[{"object":"folder","id":null,"name":"No Folder"},{"object":"folder","id":"f1","name":"Work"}]'"#,
            );

            let folders = cli(&bw).list_folders().unwrap();
            assert_eq!(folders.len(), 2);
            assert_eq!(folders[1], SourceFolder::new("f1", "Work"));
        }

        #[test]
        fn test_session_reaches_child_process() {
            let dir = tempfile::tempdir().unwrap();
            let bw = fake_bw(dir.path(), r#"printf '%s' "$BW_SESSION""#);

            let bytes = cli(&bw).attachment_bytes("a1", "i1").unwrap();
            assert_eq!(bytes, b"session-key");
        }

        #[test]
        fn test_non_zero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let bw = fake_bw(dir.path(), "echo 'You are not logged in.' >&2\nexit 1");

            assert_matches!(
                cli(&bw).list_items(),
                Err(SourceError::CommandFailed { command, stderr, .. })
                    if command == "bw list items" && stderr == "You are not logged in."
            );
        }

        #[test]
        fn test_invalid_json() {
            let dir = tempfile::tempdir().unwrap();
            let bw = fake_bw(dir.path(), "echo 'not json'");

            assert_matches!(cli(&bw).list_items(), Err(SourceError::Parse { .. }));
        }

        #[test]
        fn test_resolve_executable_path() {
            let dir = tempfile::tempdir().unwrap();
            let bw = fake_bw(dir.path(), "exit 0");

            let resolved = resolve_bw_path(&bw.to_string_lossy()).unwrap();
            assert!(resolved.ends_with("bw"));
        }
    }
}
