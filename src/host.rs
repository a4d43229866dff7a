//! The interface to the tree that is actually displayed.

use crate::node::{Listener, PropValue};
use core::fmt::Debug;

/// A mutable host tree, like the DOM.
///
/// Handles are cheap references to host nodes. [`Runtime`](`crate::Runtime`) keeps clones of them in its fibers.
///
/// Nodes are created and given their initial properties while rendering, before they are connected.
/// Everything that affects connected nodes happens between [`begin_commit`](`Host::begin_commit`)
/// and [`end_commit`](`Host::end_commit`).
pub trait Host {
	type Handle: Clone + Debug;
	type Error: std::error::Error + 'static;

	fn create_element(&mut self, name: &str) -> Result<Self::Handle, Self::Error>;
	/// Creates an empty text node. Its content is set as `nodeValue` property.
	fn create_text(&mut self) -> Result<Self::Handle, Self::Error>;

	fn set_property(&mut self, node: &Self::Handle, name: &str, value: &PropValue) -> Result<(), Self::Error>;
	/// Sets the property to its empty value.
	fn clear_property(&mut self, node: &Self::Handle, name: &str) -> Result<(), Self::Error>;

	fn add_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error>;
	fn remove_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error>;

	/// Appends `child` as last child of `parent`.
	fn insert_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error>;
	fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error>;

	/// Called before the first mutation of a commit.
	fn begin_commit(&mut self) {}
	/// Called after the last mutation of a commit, also if it failed.
	fn end_commit(&mut self) {}
}
