use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::domain::LaunchError;

/// Starts the downloaded artifact.
pub trait ArtifactLauncher: Send + Sync {
    fn launch(&self, path: &Path) -> Result<(), LaunchError>;
}

impl<L: ArtifactLauncher + ?Sized> ArtifactLauncher for &L {
    fn launch(&self, path: &Path) -> Result<(), LaunchError> {
        (**self).launch(path)
    }
}

/// Hands the artifact to the platform: the shell's default handler on
/// Windows and macOS, direct execution elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ArtifactLauncher for SystemLauncher {
    fn launch(&self, path: &Path) -> Result<(), LaunchError> {
        let to_error = |source| LaunchError {
            path: path.to_path_buf(),
            source,
        };

        let mut command = platform_command(path).map_err(to_error)?;
        let child = command.spawn().map_err(to_error)?;
        info!(path = %path.display(), pid = ?child.id(), "Artifact launched");
        Ok(())
    }
}

#[cfg(windows)]
fn platform_command(path: &Path) -> std::io::Result<Command> {
    let mut command = Command::new("cmd");
    command.arg("/C").arg("start").arg("").arg(path);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn platform_command(path: &Path) -> std::io::Result<Command> {
    let mut command = Command::new("open");
    command.arg(path);
    Ok(command)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_command(path: &Path) -> std::io::Result<Command> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)?;
    Ok(Command::new(path))
}

#[cfg(test)]
pub mod testing {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    /// Records launch attempts; optionally fails every one.
    #[derive(Default)]
    pub struct FakeLauncher {
        pub fail: bool,
        launched: Mutex<Vec<PathBuf>>,
    }

    impl FakeLauncher {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn launched(&self) -> Vec<PathBuf> {
            self.launched.lock().unwrap().clone()
        }
    }

    impl ArtifactLauncher for FakeLauncher {
        fn launch(&self, path: &Path) -> Result<(), LaunchError> {
            self.launched.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(LaunchError {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(())
        }
    }
}
