// SPDX-License-Identifier: MPL-2.0
//! Error kinds surfaced by the decomposition pipeline and their mapping to
//! process exit codes at the host boundary.

use crate::types::VtxId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between graph ingestion and variant
/// emission.
///
/// Only [`Error::EnumerationBound`] is recovered from locally (the affected
/// region is marked unresolved and skipped); every other kind propagates to
/// the caller and aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ingested graph or reference data is not well formed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An operation referenced a vertex id that is not in the graph.
    #[error("unknown vertex {0}")]
    UnknownVertex(VtxId),

    /// `add_vertex` was called twice with the same id.
    #[error("duplicate vertex {0}")]
    DuplicateVertex(VtxId),

    /// An internal structural invariant failed; this is a bug, not bad
    /// input.
    #[error("invariant violation at node {node}: {trace}")]
    InvariantViolation {
        /// Offending node (spanning-tree or PVST index, per `trace`).
        node: usize,
        /// Short description of the broken invariant.
        trace: String,
    },

    /// The walk enumerator exhausted its step bound without finding a walk.
    #[error("no walk found within {max_steps} steps")]
    EnumerationBound {
        /// The bound that was in force.
        max_steps: usize,
    },

    /// A reference required for calling is absent from the graph.
    #[error("missing reference: {0}")]
    ReferenceMissing(String),
}

impl Error {
    /// The process exit code a host should use when aborting on this error:
    /// `1` for malformed input, `2` for a missing reference, `3` for an
    /// internal invariant violation.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MalformedInput(_)
            | Error::UnknownVertex(_)
            | Error::DuplicateVertex(_)
            | Error::EnumerationBound { .. } => 1,
            Error::ReferenceMissing(_) => 2,
            Error::InvariantViolation { .. } => 3,
        }
    }
}
