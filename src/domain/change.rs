//! Change descriptions returned by entry mutations
//!
//! An [`Entry`](super::Entry) never performs I/O. Every mutating call returns
//! a [`Change`] saying which half of the entry moved, and whoever owns the
//! entry (normally the database catalog) applies the matching persistence
//! step before handing control back to its caller.

/// What part of an entry a mutation touched
#[must_use = "a change has to be applied for the entry to reach disk"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// The ordered data lines changed; the full snapshot must be rewritten.
    Data,
    /// The local or remote file lists changed; attachments must be reconciled.
    Files,
}

/// Something that reacts to entry changes.
///
/// The catalog is the only production implementation; tests use recorders.
pub trait ChangeSink<E: ?Sized> {
    type Output;

    fn apply(&self, entry: &mut E, change: Change) -> Self::Output;
}
