//! Error kinds reported by every container operation.

/// Failure reported by a container operation.
///
/// Every fallible operation returns `Result<T, ErrorKind>`; there is no
/// shared last-error slot. A failed call leaves the container exactly as
/// it was before the call.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum ErrorKind {
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("value already exists")]
    ValueAlreadyExists,
    #[error("key not found")]
    KeyNotFound,
    #[error("value not found")]
    ValueNotFound,
    /// The item handle was removed, or belongs to another container.
    #[error("item not found")]
    ItemNotFound,
    /// The entry handle was removed, or belongs to another container.
    #[error("entry not found")]
    EntryNotFound,
    #[error("map is empty")]
    MapIsEmpty,
    #[error("set is empty")]
    SetIsEmpty,
    /// Navigation walked past the first or last element.
    #[error("end of sequence")]
    EndOfSequence,
    /// The referent behind a weak key no longer exists.
    #[error("key is invalid")]
    KeyIsInvalid,
    /// The referent behind a weak value no longer exists.
    #[error("value is invalid")]
    ValueIsInvalid,
    /// The referent behind a weak set item no longer exists.
    #[error("item is invalid")]
    ItemIsInvalid,
}

pub type Result<T, E = ErrorKind> = core::result::Result<T, E>;

/// Abort on a broken contract between layers.
///
/// Reached only when the engine hands back state a wrapper cannot
/// explain, e.g. a handle that vanished between two calls inside one
/// operation. That is a bug, not a runtime condition, so it is never
/// surfaced as an `ErrorKind`.
#[cold]
#[inline(never)]
pub(crate) fn fatal(what: &str) -> ! {
    log::error!("rc-treemap internal invariant violated: {what}");
    std::process::abort()
}
