//! Definition resolution over a two-tier directory search path.
//!
//! Definitions are stored one per file, keyed by name, in a user override
//! directory and a system (built-in) directory. The user tier always wins:
//! resolution stops at the first match and no merging of partial
//! definitions happens across tiers. Saving always writes to the user
//! tier, so editing a built-in creates a shadowing override instead of
//! mutating the shipped file.

use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Error, Result};
use crate::pkgmanager::PkgManager;
use crate::stack::Stack;

/// A named definition that can live in the registry.
pub trait Definition: Clone + Serialize + DeserializeOwned {
    /// Human-readable kind, used in error messages.
    const KIND: &'static str;

    fn name(&self) -> &str;
    fn built_in(&self) -> bool;
    fn set_built_in(&mut self, built_in: bool);
    fn validate(&self) -> Result<()>;
}

/// Two-tier registry for one definition kind.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    user_dir: PathBuf,
    system_dir: PathBuf,
    _kind: PhantomData<T>,
}

impl<T: Definition> Registry<T> {
    pub fn new(user_dir: impl Into<PathBuf>, system_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            system_dir: system_dir.into(),
            _kind: PhantomData,
        }
    }

    fn file_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.yaml"))
    }

    /// Resolve `name`, searching the user tier first. The tier a definition
    /// is loaded from decides its `built_in` flag.
    pub fn resolve(&self, name: &str) -> Result<T> {
        for (dir, built_in) in [(&self.user_dir, false), (&self.system_dir, true)] {
            let path = Self::file_path(dir, name);
            if path.exists() {
                let mut def = Self::load_file(&path)?;
                def.set_built_in(built_in);
                return Ok(def);
            }
        }
        Err(Error::NotFound {
            kind: T::KIND,
            name: name.to_string(),
        })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// All definitions, user tier first, deduplicated by name with the
    /// user tier taking precedence. Sorted by name.
    pub fn list(&self) -> Result<Vec<T>> {
        let mut seen: BTreeMap<String, T> = BTreeMap::new();
        for (dir, built_in) in [(&self.user_dir, false), (&self.system_dir, true)] {
            for path in Self::definition_files(dir)? {
                let mut def = match Self::load_file(&path) {
                    Ok(def) => def,
                    Err(err) => {
                        warn!("skipping unreadable {} file {}: {err}", T::KIND, path.display());
                        continue;
                    }
                };
                def.set_built_in(built_in);
                seen.entry(def.name().to_string()).or_insert(def);
            }
        }
        Ok(seen.into_values().collect())
    }

    /// Persist `def` to the user tier. The written override is never
    /// marked built-in, whatever the input says.
    pub fn save(&self, def: &T) -> Result<()> {
        def.validate()?;
        let mut def = def.clone();
        def.set_built_in(false);

        fs::create_dir_all(&self.user_dir)?;
        let path = Self::file_path(&self.user_dir, def.name());
        let body = serde_yaml::to_string(&def)?;
        fs::write(&path, body)?;
        Ok(())
    }

    /// Remove `def` from the user tier. Built-ins are immutable.
    pub fn remove(&self, def: &T) -> Result<()> {
        if def.built_in() {
            return Err(Error::ImmutableDefinition {
                kind: T::KIND,
                name: def.name().to_string(),
            });
        }
        let path = Self::file_path(&self.user_dir, def.name());
        if !path.exists() {
            return Err(Error::NotFound {
                kind: T::KIND,
                name: def.name().to_string(),
            });
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn load_file(path: &Path) -> Result<T> {
        let body = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&body)?)
    }

    fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(files),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if path.is_file() && is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Names of stacks whose package manager is `pkg_manager`.
pub fn stacks_referencing(stacks: &Registry<Stack>, pkg_manager: &str) -> Result<Vec<String>> {
    Ok(stacks
        .list()?
        .into_iter()
        .filter(|stack| stack.pkg_manager == pkg_manager)
        .map(|stack| stack.name)
        .collect())
}

/// Remove a package manager definition, refusing while any stack still
/// references it. The caller must reassign or remove referencing stacks
/// first.
pub fn remove_pkg_manager(
    pkg_managers: &Registry<PkgManager>,
    stacks: &Registry<Stack>,
    name: &str,
) -> Result<()> {
    let def = pkg_managers.resolve(name)?;
    let referents = stacks_referencing(stacks, name)?;
    if !referents.is_empty() {
        return Err(Error::ReferentialIntegrity {
            name: name.to_string(),
            referents,
        });
    }
    pkg_managers.remove(&def)
}
