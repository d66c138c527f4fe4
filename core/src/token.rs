//! Read-only view over one node of a parsed document.
//!
//! JSON and XML disagree on what a missing field, a list, and an attribute
//! are. Each format implements [`DocumentToken`] once and the mapper works
//! only against this trait.

use crate::error::TokenError;

/// A node of a parsed JSON or XML tree.
///
/// Fetching a child that does not exist yields an absent token rather than
/// an error, so lookups chain without checks.
pub trait DocumentToken: Sized {
    /// Missing, null, or explicitly nil.
    fn is_absent(&self) -> bool;

    /// A leaf that renders to text with [`as_text`](Self::as_text).
    fn is_primitive(&self) -> bool;

    fn is_object(&self) -> bool;

    /// Whether this node holds a list under `name`.
    ///
    /// JSON answers from the child's token type. XML has no list literal: a
    /// list is zero or more same-named child elements, so any element that
    /// is not a text leaf is list-like.
    fn is_array_like(&self, name: &str) -> bool;

    /// The child named `name`, or an absent token.
    fn child(&self, name: &str) -> Self;

    /// Every item of the list under `name`, in document order.
    fn children(&self, name: &str) -> Vec<Self>;

    /// The attribute named `name`, or an absent token.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnsupportedOperation`] for formats without attributes.
    fn attribute(&self, name: &str) -> Result<Self, TokenError>;

    /// Culture-invariant text of a primitive node: numbers keep their
    /// source digits with `.` as the decimal mark and no grouping.
    fn as_text(&self) -> Option<String>;
}
