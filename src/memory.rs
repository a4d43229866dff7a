//! An inspectable in-memory [`Host`], mainly for tests and for embedders without a DOM.

use crate::{
	diff::EVENT_PREFIX,
	host::Host,
	node::{Listener, PropValue, NODE_VALUE},
};
use core::{any::Any, fmt::Write as _};
use hashbrown::HashSet;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNodeKind {
	Container,
	Element(String),
	Text,
}

#[derive(Debug)]
struct HostNode {
	kind: HostNodeKind,
	properties: Vec<(String, PropValue)>,
	listeners: Vec<(String, Listener)>,
	parent: Option<HostNodeId>,
	children: Vec<HostNodeId>,
}

/// One journal entry per host call, plus the commit fences.
///
/// `connected` is whether the target could be reached from a container at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	BeginCommit,
	EndCommit,
	Create { node: HostNodeId, kind: HostNodeKind },
	SetProperty { node: HostNodeId, name: String, connected: bool },
	ClearProperty { node: HostNodeId, name: String, connected: bool },
	AddListener { node: HostNodeId, event: String, connected: bool },
	RemoveListener { node: HostNodeId, event: String, connected: bool },
	Insert { parent: HostNodeId, child: HostNodeId },
	Remove { parent: HostNodeId, child: HostNodeId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryHostError {
	#[error("unknown host node {0:?}")]
	UnknownNode(HostNodeId),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: HostNodeId, child: HostNodeId },
	#[error("text node {0:?} can't have children")]
	TextParent(HostNodeId),
	#[error("injected failure on {0:?}")]
	Injected(HostNodeId),
}

#[derive(Debug, Default)]
pub struct MemoryHost {
	nodes: Vec<HostNode>,
	journal: Vec<Mutation>,
	failing: HashSet<HostNodeId>,
	in_commit: bool,
}
impl MemoryHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a root node to render into.
	pub fn create_container(&mut self) -> HostNodeId {
		self.allocate(HostNodeKind::Container)
	}

	fn allocate(&mut self, kind: HostNodeKind) -> HostNodeId {
		let id = HostNodeId(self.nodes.len());
		self.nodes.push(HostNode {
			kind,
			properties: Vec::new(),
			listeners: Vec::new(),
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn node(&self, id: HostNodeId) -> Result<&HostNode, MemoryHostError> {
		self.nodes.get(id.0).ok_or(MemoryHostError::UnknownNode(id))
	}

	/// Looks up `id` for mutation, honouring [`fail_on`](`MemoryHost::fail_on`).
	fn node_mut(&mut self, id: HostNodeId) -> Result<&mut HostNode, MemoryHostError> {
		if self.failing.contains(&id) {
			return Err(MemoryHostError::Injected(id));
		}
		self.nodes.get_mut(id.0).ok_or(MemoryHostError::UnknownNode(id))
	}

	/// Makes every later mutation involving `node` fail.
	pub fn fail_on(&mut self, node: HostNodeId) {
		self.failing.insert(node);
	}

	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.journal
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.journal)
	}

	/// Whether we're between [`Host::begin_commit`] and [`Host::end_commit`].
	#[must_use]
	pub fn in_commit(&self) -> bool {
		self.in_commit
	}

	/// Total number of host nodes ever created, containers included.
	#[must_use]
	pub fn created_count(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn kind(&self, node: HostNodeId) -> Option<&HostNodeKind> {
		self.node(node).ok().map(|node| &node.kind)
	}

	/// The element name, if `node` is an element.
	#[must_use]
	pub fn tag(&self, node: HostNodeId) -> Option<&str> {
		match self.kind(node)? {
			HostNodeKind::Element(name) => Some(name),
			_ => None,
		}
	}

	#[must_use]
	pub fn parent(&self, node: HostNodeId) -> Option<HostNodeId> {
		self.node(node).ok()?.parent
	}

	#[must_use]
	pub fn children(&self, node: HostNodeId) -> &[HostNodeId] {
		self.node(node).map_or(&[][..], |node| node.children.as_slice())
	}

	#[must_use]
	pub fn property(&self, node: HostNodeId, name: &str) -> Option<&PropValue> {
		self.node(node).ok()?.properties.iter().find(|(existing, _)| existing == name).map(|(_, value)| value)
	}

	#[must_use]
	pub fn listener_count(&self, node: HostNodeId, event: &str) -> usize {
		self.node(node).map_or(0, |node| node.listeners.iter().filter(|(existing, _)| existing == event).count())
	}

	/// Whether `node` is a container or has one as ancestor.
	#[must_use]
	pub fn is_connected(&self, node: HostNodeId) -> bool {
		let mut current = Some(node);
		while let Some(id) = current {
			match self.node(id) {
				Ok(HostNode { kind: HostNodeKind::Container, .. }) => return true,
				Ok(node) => current = node.parent,
				Err(_) => return false,
			}
		}
		false
	}

	/// Concatenated `nodeValue`s of all text nodes below (and including) `node`.
	#[must_use]
	pub fn text_content(&self, node: HostNodeId) -> String {
		let mut text = String::new();
		self.collect_text(node, &mut text);
		text
	}

	fn collect_text(&self, node: HostNodeId, text: &mut String) {
		if let Ok(host_node) = self.node(node) {
			if host_node.kind == HostNodeKind::Text {
				if let Some(value) = self.property(node, NODE_VALUE) {
					write!(text, "{}", value).expect("Writing to a `String` can't fail.");
				}
			}
			for &child in &host_node.children {
				self.collect_text(child, text)
			}
		}
	}

	/// Finds the first element named `tag` below `root`, in preorder.
	#[must_use]
	pub fn find(&self, root: HostNodeId, tag: &str) -> Option<HostNodeId> {
		self.find_all(root, tag).into_iter().next()
	}

	#[must_use]
	pub fn find_all(&self, root: HostNodeId, tag: &str) -> Vec<HostNodeId> {
		let mut found = Vec::new();
		let mut stack = vec![root];
		while let Some(node) = stack.pop() {
			if node != root && self.tag(node) == Some(tag) {
				found.push(node);
			}
			stack.extend(self.children(node).iter().rev());
		}
		found
	}

	/// Calls every `event` listener on `node`, returning how many there were.
	///
	/// There is no bubbling.
	pub fn dispatch(&self, node: HostNodeId, event: &str, payload: &dyn Any) -> usize {
		let listeners: Vec<Listener> = self
			.node(node)
			.map(|node| node.listeners.iter().filter(|(existing, _)| existing == event).map(|(_, listener)| listener.clone()).collect())
			.unwrap_or_default();
		trace!(?node, event, count = listeners.len(), "Dispatching event");
		for listener in &listeners {
			listener.call(payload)
		}
		listeners.len()
	}

	/// Markup-like rendering of the subtree below `node`, for assertions.
	///
	/// Listeners are shown as `on<event>` attributes without value.
	#[must_use]
	pub fn serialize(&self, node: HostNodeId) -> String {
		let mut markup = String::new();
		for &child in self.children(node) {
			self.serialize_into(child, &mut markup);
		}
		markup
	}

	fn serialize_into(&self, node: HostNodeId, markup: &mut String) {
		let host_node = match self.node(node) {
			Ok(host_node) => host_node,
			Err(_) => return,
		};
		match &host_node.kind {
			HostNodeKind::Text => {
				if let Some(value) = self.property(node, NODE_VALUE) {
					write!(markup, "{}", value).expect("Writing to a `String` can't fail.");
				}
			}
			HostNodeKind::Container | HostNodeKind::Element(_) => {
				let name = self.tag(node).unwrap_or("#container");
				write!(markup, "<{}", name).expect("Writing to a `String` can't fail.");
				for (property, value) in &host_node.properties {
					write!(markup, " {}={:?}", property, value.to_string()).expect("Writing to a `String` can't fail.");
				}
				for (event, _) in &host_node.listeners {
					write!(markup, " {}{}", EVENT_PREFIX, event).expect("Writing to a `String` can't fail.");
				}
				markup.push('>');
				for &child in &host_node.children {
					self.serialize_into(child, markup);
				}
				write!(markup, "</{}>", name).expect("Writing to a `String` can't fail.");
			}
		}
	}

	fn record(&mut self, mutation: Mutation) {
		trace!(?mutation, "Host mutation");
		self.journal.push(mutation)
	}
}

impl Host for MemoryHost {
	type Handle = HostNodeId;
	type Error = MemoryHostError;

	fn create_element(&mut self, name: &str) -> Result<Self::Handle, Self::Error> {
		let kind = HostNodeKind::Element(name.to_owned());
		let node = self.allocate(kind.clone());
		self.record(Mutation::Create { node, kind });
		Ok(node)
	}

	fn create_text(&mut self) -> Result<Self::Handle, Self::Error> {
		let node = self.allocate(HostNodeKind::Text);
		self.record(Mutation::Create { node, kind: HostNodeKind::Text });
		Ok(node)
	}

	fn set_property(&mut self, node: &Self::Handle, name: &str, value: &PropValue) -> Result<(), Self::Error> {
		let host_node = self.node_mut(*node)?;
		match host_node.properties.iter_mut().find(|(existing, _)| existing == name) {
			Some((_, slot)) => *slot = value.clone(),
			None => host_node.properties.push((name.to_owned(), value.clone())),
		}
		let connected = self.is_connected(*node);
		self.record(Mutation::SetProperty { node: *node, name: name.to_owned(), connected });
		Ok(())
	}

	fn clear_property(&mut self, node: &Self::Handle, name: &str) -> Result<(), Self::Error> {
		let host_node = self.node_mut(*node)?;
		let empty = PropValue::from("");
		match host_node.properties.iter_mut().find(|(existing, _)| existing == name) {
			Some((_, slot)) => *slot = empty,
			None => host_node.properties.push((name.to_owned(), empty)),
		}
		let connected = self.is_connected(*node);
		self.record(Mutation::ClearProperty { node: *node, name: name.to_owned(), connected });
		Ok(())
	}

	fn add_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error> {
		let host_node = self.node_mut(*node)?;
		// Like `addEventListener`, identical registrations are not duplicated.
		if !host_node.listeners.iter().any(|(existing, l)| existing == event && l == listener) {
			host_node.listeners.push((event.to_owned(), listener.clone()));
		}
		let connected = self.is_connected(*node);
		self.record(Mutation::AddListener { node: *node, event: event.to_owned(), connected });
		Ok(())
	}

	fn remove_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error> {
		let host_node = self.node_mut(*node)?;
		host_node.listeners.retain(|(existing, l)| !(existing == event && l == listener));
		let connected = self.is_connected(*node);
		self.record(Mutation::RemoveListener { node: *node, event: event.to_owned(), connected });
		Ok(())
	}

	fn insert_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error> {
		if self.node_mut(*parent)?.kind == HostNodeKind::Text {
			return Err(MemoryHostError::TextParent(*parent));
		}
		// Moves like `appendChild` if already attached elsewhere.
		if let Some(previous) = self.node_mut(*child)?.parent.take() {
			self.node_mut(previous)?.children.retain(|existing| existing != child);
		}
		self.node_mut(*parent)?.children.push(*child);
		self.node_mut(*child)?.parent = Some(*parent);
		self.record(Mutation::Insert { parent: *parent, child: *child });
		Ok(())
	}

	fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error> {
		if self.node_mut(*child)?.parent != Some(*parent) {
			return Err(MemoryHostError::NotAChild { parent: *parent, child: *child });
		}
		self.node_mut(*parent)?.children.retain(|existing| existing != child);
		self.node_mut(*child)?.parent = None;
		self.record(Mutation::Remove { parent: *parent, child: *child });
		Ok(())
	}

	fn begin_commit(&mut self) {
		debug_assert!(!self.in_commit, "Nested commit");
		self.in_commit = true;
		self.record(Mutation::BeginCommit)
	}

	fn end_commit(&mut self) {
		self.in_commit = false;
		self.record(Mutation::EndCommit)
	}
}
