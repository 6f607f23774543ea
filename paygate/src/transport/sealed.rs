//! Sealed trait marker for Transport implementations.
//!
//! Prevents external implementations of the `Transport` trait so that every
//! transport applies the same URL, path and header validation.

pub(crate) mod private {
    /// Sealed trait marker.
    pub trait Sealed {}
}
