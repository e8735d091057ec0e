//! Package manager definitions and command synthesis.
//!
//! A [`PkgManager`] maps the ten generic verbs onto the command-line syntax
//! of one concrete package manager (apt, dnf, pacman, apk, ...). Synthesis
//! is a pure function over the definition: the same `(definition, verb,
//! args)` always yields the same argument vector, which is what makes
//! commands previewable before they are executed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::registry::Definition;

/// Privilege escalation binary prepended when a definition needs it.
const SUDO: &str = "sudo";

/// How a verb template is turned into an argument vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CmdModel {
    /// The definition's name is the binary and the whole verb template is
    /// passed as a single argument. Kept for definitions written against
    /// older releases; new definitions should use `Templated`.
    Legacy,
    /// The verb template is tokenized on whitespace, permitting multi-word
    /// commands such as `nix profile install`.
    #[default]
    Templated,
}

/// The ten generic package management verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    AutoRemove,
    Clean,
    Install,
    List,
    Purge,
    Remove,
    Search,
    Show,
    Update,
    Upgrade,
}

impl Verb {
    pub const ALL: [Verb; 10] = [
        Verb::AutoRemove,
        Verb::Clean,
        Verb::Install,
        Verb::List,
        Verb::Purge,
        Verb::Remove,
        Verb::Search,
        Verb::Show,
        Verb::Update,
        Verb::Upgrade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::AutoRemove => "autoremove",
            Verb::Clean => "clean",
            Verb::Install => "install",
            Verb::List => "list",
            Verb::Purge => "purge",
            Verb::Remove => "remove",
            Verb::Search => "search",
            Verb::Show => "show",
            Verb::Update => "update",
            Verb::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "autoremove" => Ok(Verb::AutoRemove),
            "clean" => Ok(Verb::Clean),
            "install" => Ok(Verb::Install),
            "list" => Ok(Verb::List),
            "purge" => Ok(Verb::Purge),
            "remove" => Ok(Verb::Remove),
            "search" => Ok(Verb::Search),
            "show" => Ok(Verb::Show),
            "update" => Ok(Verb::Update),
            "upgrade" => Ok(Verb::Upgrade),
            other => Err(Error::UnknownVerb(other.to_string())),
        }
    }
}

/// One package manager definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PkgManager {
    pub name: String,

    /// Prefix synthesized commands with a privilege escalation invocation.
    /// Applied unconditionally of the caller's own privilege, so the
    /// resulting argv is always explicit about escalation.
    #[serde(default)]
    pub need_sudo: bool,

    pub cmd_auto_remove: String,
    pub cmd_clean: String,
    pub cmd_install: String,
    pub cmd_list: String,
    pub cmd_purge: String,
    pub cmd_remove: String,
    pub cmd_search: String,
    pub cmd_show: String,
    pub cmd_update: String,
    pub cmd_upgrade: String,

    #[serde(default)]
    pub model: CmdModel,

    #[serde(default)]
    pub built_in: bool,
}

impl PkgManager {
    /// The verb template configured for `verb`.
    pub fn command_for(&self, verb: Verb) -> &str {
        match verb {
            Verb::AutoRemove => &self.cmd_auto_remove,
            Verb::Clean => &self.cmd_clean,
            Verb::Install => &self.cmd_install,
            Verb::List => &self.cmd_list,
            Verb::Purge => &self.cmd_purge,
            Verb::Remove => &self.cmd_remove,
            Verb::Search => &self.cmd_search,
            Verb::Show => &self.cmd_show,
            Verb::Update => &self.cmd_update,
            Verb::Upgrade => &self.cmd_upgrade,
        }
    }

    /// Build the argument vector for `verb` with trailing `args`.
    ///
    /// Pure: no I/O, no state. An unrecognized verb name is an error
    /// naming the verb.
    pub fn synthesize(&self, verb: &str, args: &[String]) -> Result<Vec<String>> {
        let verb: Verb = verb.parse()?;
        let template = self.command_for(verb);

        let mut argv = Vec::new();
        if self.need_sudo {
            argv.push(SUDO.to_string());
        }

        match self.model {
            CmdModel::Legacy => {
                // Historic behavior: the definition name is the binary and
                // the template rides along as one argument, whitespace and
                // all. Stable for pre-existing user definitions.
                warn!(
                    "package manager '{}' uses the legacy command model; \
                     consider rewriting it with the templated model",
                    self.name
                );
                argv.push(self.name.clone());
                argv.push(template.to_string());
            }
            CmdModel::Templated => {
                argv.extend(template.split_whitespace().map(str::to_string));
            }
        }

        argv.extend(args.iter().cloned());
        Ok(argv)
    }
}

impl Definition for PkgManager {
    const KIND: &'static str = "package manager";

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
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDefinition {
                kind: Self::KIND,
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        for verb in Verb::ALL {
            if self.command_for(verb).trim().is_empty() {
                return Err(Error::InvalidDefinition {
                    kind: Self::KIND,
                    name: self.name.clone(),
                    reason: format!("missing command for verb '{verb}'"),
                });
            }
        }
        Ok(())
    }
}
