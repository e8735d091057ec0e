//! Stack definitions.
//!
//! A stack names a container base image, the package manager used inside
//! containers built from it, and a default package set installed at
//! container creation. The package manager is held as a name and resolved
//! lazily through the registry, never embedded.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::Definition;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: String,

    /// Base image reference, opaque until the engine validates it at
    /// container creation.
    pub base: String,

    /// Packages pre-installed when a container is created from this stack.
    #[serde(default)]
    pub packages: Vec<String>,

    /// Name of the package manager definition used inside the container.
    pub pkg_manager: String,

    #[serde(default)]
    pub built_in: bool,
}

impl Definition for Stack {
    const KIND: &'static str = "stack";

    fn name(&self) -> &str {
        &self.name
    }

    fn built_in(&self) -> bool {
        self.built_in
    }

    fn set_built_in(&mut self, built_in: bool) {
        self.built_in = built_in;
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("base", &self.base),
            ("pkgManager", &self.pkg_manager),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidDefinition {
                    kind: Self::KIND,
                    name: self.name.clone(),
                    reason: format!("field '{field}' must not be empty"),
                });
            }
        }
        Ok(())
    }
}
