#![forbid(unsafe_code)]
//! Replicated document core for a collaborative vector-graphics editor: a
//! state-based tree CRDT (snapshot-merge, not op-log) with LWW properties and
//! a tombstoned child list, plus a typed projection layer over the untyped
//! node map. Independent of any host binding, so it can be embedded behind a
//! C ABI, a native UI, or anything else that can hold a [`Manager`].

pub mod document;
pub mod error;
pub mod id;
pub mod manager;
pub mod node;
#[cfg(feature = "serde")]
pub mod persistence;
pub mod projection;

pub use document::{Document, TYPE_ROOT};
pub use error::{Error, Result};
pub use id::Id;
pub use manager::Manager;
pub use node::{ChildRef, Node, Prop};
pub use projection::{
    FrameView, PathView, RectangleView, TextBoxView, TYPE_FRAME, TYPE_RECTANGLE, TYPE_SHAPE,
    TYPE_TEXT,
};
