//! Fibers are the mutable work units mirroring [`Node`]s.
//!
//! Each generation (current or work-in-progress) owns one [`FiberTree`] arena.
//! Structural links (`parent`, `child`, `sibling`) point into the same arena,
//! `alternate` points into the *other* generation's arena.

use crate::{
	hooks::HookCell,
	node::{ComponentType, Node, NodeType, Props},
};
use core::ops::{Index, IndexMut};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(usize);
impl FiberId {
	/// The synthetic root of every generation.
	pub const ROOT: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
	Placement,
	Update,
	Deletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberType {
	/// Holds the host container and the top-level [`Node`] as only child.
	Root,
	Element(std::borrow::Cow<'static, str>),
	Text,
	Component(ComponentType),
}
impl From<&NodeType> for FiberType {
	fn from(ty: &NodeType) -> Self {
		match ty {
			NodeType::Element(name) => Self::Element(name.clone()),
			NodeType::Text => Self::Text,
			NodeType::Component(component) => Self::Component(*component),
		}
	}
}
impl FiberType {
	#[must_use]
	pub fn is_component(&self) -> bool {
		matches!(self, Self::Component(_))
	}
}

#[derive(Debug)]
pub struct Fiber<H> {
	pub ty: FiberType,
	pub props: Rc<Props>,
	pub children: Rc<[Node]>,
	/// Absent for components, and for host fibers that weren't processed yet.
	pub host: Option<H>,
	pub parent: Option<FiberId>,
	pub child: Option<FiberId>,
	pub sibling: Option<FiberId>,
	pub alternate: Option<FiberId>,
	pub effect: Option<EffectTag>,
	pub hooks: Vec<HookCell>,
}
impl<H> Fiber<H> {
	fn new(ty: FiberType, props: Rc<Props>, children: Rc<[Node]>) -> Self {
		Self {
			ty,
			props,
			children,
			host: None,
			parent: None,
			child: None,
			sibling: None,
			alternate: None,
			effect: None,
			hooks: Vec::new(),
		}
	}

	pub(crate) fn for_node(node: &Node, parent: FiberId) -> Self {
		let mut fiber = Self::new(node.ty().into(), node.shared_props(), node.shared_children());
		fiber.parent = Some(parent);
		fiber
	}
}

/// One generation of fibers.
#[derive(Debug)]
pub struct FiberTree<H> {
	fibers: Vec<Fiber<H>>,
}
impl<H> FiberTree<H> {
	/// Creates a generation whose root binds `container` and has `children` (usually exactly one top-level [`Node`]).
	pub(crate) fn with_root(container: H, children: Rc<[Node]>, alternate: Option<FiberId>) -> Self {
		let mut root = Fiber::new(FiberType::Root, Rc::default(), children);
		root.host = Some(container);
		root.alternate = alternate;
		Self { fibers: vec![root] }
	}

	pub(crate) fn push(&mut self, fiber: Fiber<H>) -> FiberId {
		self.fibers.push(fiber);
		FiberId(self.fibers.len() - 1)
	}

	#[must_use]
	pub fn root(&self) -> &Fiber<H> {
		&self[FiberId::ROOT]
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.fibers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fibers.is_empty()
	}

	/// Depth-first, child-first, sibling-next, with upward backtracking.
	///
	/// This is the resumable traversal order: [`None`] once the walk would leave `boundary`'s subtree.
	#[must_use]
	pub fn next(&self, id: FiberId, boundary: FiberId) -> Option<FiberId> {
		if let Some(child) = self[id].child {
			return Some(child);
		}
		let mut fiber = id;
		while fiber != boundary {
			if let Some(sibling) = self[fiber].sibling {
				return Some(sibling);
			}
			fiber = self[fiber].parent?;
		}
		None
	}

	/// Preorder over `start`'s subtree, `start` included.
	pub fn subtree(&self, start: FiberId) -> impl Iterator<Item = FiberId> + '_ {
		core::iter::successors(Some(start), move |&id| self.next(id, start))
	}

	/// Preorder over every fiber below the synthetic root.
	pub fn descendants(&self) -> impl Iterator<Item = FiberId> + '_ {
		self.subtree(FiberId::ROOT).skip(1)
	}

	/// The host binding of the nearest proper ancestor that has one.
	#[must_use]
	pub fn host_parent(&self, id: FiberId) -> Option<&H> {
		let mut ancestor = self[id].parent;
		while let Some(fiber) = ancestor {
			if let Some(host) = &self[fiber].host {
				return Some(host);
			}
			ancestor = self[fiber].parent;
		}
		None
	}

	/// Iterates over `id`'s direct children in order.
	pub fn children_of(&self, id: FiberId) -> impl Iterator<Item = FiberId> + '_ {
		core::iter::successors(self[id].child, move |&child| self[child].sibling)
	}

	/// Turns a finished work-in-progress tree into a current one.
	///
	/// Effect tags and cross-generation links are cleared, since the other generation is about to be dropped.
	pub(crate) fn promote(&mut self) {
		for fiber in &mut self.fibers {
			fiber.alternate = None;
			fiber.effect = None;
		}
	}
}
impl<H> Index<FiberId> for FiberTree<H> {
	type Output = Fiber<H>;

	fn index(&self, index: FiberId) -> &Self::Output {
		&self.fibers[index.0]
	}
}
impl<H> IndexMut<FiberId> for FiberTree<H> {
	fn index_mut(&mut self, index: FiberId) -> &mut Self::Output {
		&mut self.fibers[index.0]
	}
}
