use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors the core surfaces outward. Every other failure mode (unknown id, wrong type,
/// already deleted) is a silent no-op by design — see the crate-level docs.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed id {input:?}: {reason}")]
    MalformedId { input: String, reason: String },

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Detected while merging a node whose remote counterpart disagrees on identity or
    /// type. Never propagated to callers; `Document::merge` logs it and skips the node.
    #[error("type mismatch merging node {node}: local type {local:?}, remote type {remote:?}")]
    TypeMismatch {
        node: String,
        local: String,
        remote: String,
    },
}
