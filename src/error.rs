//! Fatal errors.
//!
//! A translation that merely cannot be mapped is not an error; it is reported
//! as a [`TranslationResult`](crate::translation::TranslationResult) failure
//! variant and the run goes on. Everything in [`VmError`] stops the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("no free frames left to service a {kind} fault (segment {segment})")]
    OutOfFrames { kind: FaultKind, segment: u32 },

    #[error("disk block {block} does not exist (disk holds {blocks} blocks)")]
    BlockOutOfRange { block: usize, blocks: usize },

    #[error("{value} does not fit in a memory word")]
    EntryOverflow { value: usize },

    #[error("{what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VmError {
    pub(crate) fn parse(what: &'static str, reason: impl Into<String>) -> Self {
        VmError::Parse { what, reason: reason.into() }
    }
}

/// Which structure a fault brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    PageTable,
    Page,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::PageTable => write!(f, "page table"),
            FaultKind::Page => write!(f, "page"),
        }
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
