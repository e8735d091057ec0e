//! Custom error types for apx.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' is built-in and cannot be removed")]
    ImmutableDefinition { kind: &'static str, name: String },

    #[error("package manager '{name}' is still referenced by stacks: {referents:?}")]
    ReferentialIntegrity { name: String, referents: Vec<String> },

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    #[error("exactly one of an application or a binary must be given for export")]
    AmbiguousExportTarget,

    #[error("{kind} '{name}' is invalid: {reason}")]
    InvalidDefinition {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("failed to create container '{name}': {detail}")]
    Creation { name: String, detail: String },

    #[error("command failed in container '{name}': {detail}")]
    Exec { name: String, detail: String },

    #[error("no container engine found (tried podman, then docker)")]
    EngineNotFound,

    #[error("the root filesystem is an overlay; container storage cannot operate here")]
    FilesystemIncompatibility,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
