//! Resolved configuration for one apx invocation.
//!
//! All paths and engine-affecting settings are resolved once in `main` and
//! passed by reference to every component; nothing reads ambient global
//! state after startup.
//!
//! Definition files live in a two-tier search path: the user override
//! directory shadows the system directory. The tiers can be redirected with
//! `APX_USER_DIR` / `APX_SYSTEM_DIR` for testing.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{Error, Result};
use crate::pkgmanager::PkgManager;
use crate::registry::Registry;
use crate::stack::Stack;

const SYSTEM_SHARE_DIR: &str = "/usr/share/apx";
const PKG_MANAGERS_SUBDIR: &str = "package-managers";
const STACKS_SUBDIR: &str = "stacks";

/// Resolved filesystem layout and engine settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// User override root (normally `~/.config/apx`).
    pub user_dir: PathBuf,
    /// Built-in definition root (normally `/usr/share/apx`).
    pub system_dir: PathBuf,
    /// Storage driver forced onto every engine invocation, if set.
    pub storage_driver: Option<String>,
}

impl Config {
    /// Resolve the configuration from the environment.
    pub fn load() -> Result<Self> {
        let user_dir = match std::env::var_os("APX_USER_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let dirs = ProjectDirs::from("", "", "apx").ok_or_else(|| Error::NotFound {
                    kind: "home directory",
                    name: "$HOME".to_string(),
                })?;
                dirs.config_dir().to_path_buf()
            }
        };

        let system_dir = std::env::var_os("APX_SYSTEM_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SYSTEM_SHARE_DIR));

        let storage_driver = std::env::var("APX_STORAGE_DRIVER").ok().filter(|v| {
            !v.trim().is_empty()
        });

        Ok(Self {
            user_dir,
            system_dir,
            storage_driver,
        })
    }

    /// A configuration rooted at explicit directories (tests).
    pub fn rooted(user_dir: impl Into<PathBuf>, system_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            system_dir: system_dir.into(),
            storage_driver: None,
        }
    }

    /// The package manager definition registry.
    pub fn pkg_managers(&self) -> Registry<PkgManager> {
        Registry::new(
            self.user_dir.join(PKG_MANAGERS_SUBDIR),
            self.system_dir.join(PKG_MANAGERS_SUBDIR),
        )
    }

    /// The stack definition registry.
    pub fn stacks(&self) -> Registry<Stack> {
        Registry::new(
            self.user_dir.join(STACKS_SUBDIR),
            self.system_dir.join(STACKS_SUBDIR),
        )
    }
}

/// Reject hosts whose root filesystem is an overlay.
///
/// Container storage cannot reliably snapshot on top of an overlay root
/// (live ISO sessions are the common case), so engine operations refuse to
/// start there.
pub fn ensure_supported_root() -> Result<()> {
    let mounts = fs::read_to_string("/proc/mounts").unwrap_or_default();
    if root_is_overlay(&mounts) {
        return Err(Error::FilesystemIncompatibility);
    }
    Ok(())
}

fn root_is_overlay(mounts: &str) -> bool {
    for line in mounts.lines() {
        let mut fields = line.split_whitespace();
        let _device = fields.next();
        let mount_point = fields.next();
        let fs_type = fields.next();
        if mount_point == Some("/") {
            return fs_type == Some("overlay");
        }
    }
    false
}
