//! The immutable node model: what *should* exist at each position of the host tree.

use crate::hooks::Hooks;
use core::{
	any::{type_name, Any, TypeId},
	fmt::{self, Debug, Display, Formatter},
};
use std::{borrow::Cow, rc::Rc};

/// Property name under which [`Node::text`] stores its content.
pub const NODE_VALUE: &str = "nodeValue";

/// A stateless-looking function component.
///
/// State is kept through [`Hooks`], which are recovered by call order across renders
/// of the same tree position.
pub trait Component: 'static {
	fn render(props: &Props, children: &[Node], hooks: &mut Hooks<'_>) -> Node;
}

/// Type-erased reference to a [`Component`] implementation.
///
/// Two instances are the same type iff they were created from the same implementing type.
#[derive(Clone, Copy)]
pub struct ComponentType {
	id: TypeId,
	name: &'static str,
	render: fn(&Props, &[Node], &mut Hooks<'_>) -> Node,
}
impl ComponentType {
	#[must_use]
	pub fn of<C: Component>() -> Self {
		Self {
			id: TypeId::of::<C>(),
			name: type_name::<C>(),
			render: C::render,
		}
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn render(&self, props: &Props, children: &[Node], hooks: &mut Hooks<'_>) -> Node {
		(self.render)(props, children, hooks)
	}
}
impl PartialEq for ComponentType {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}
impl Eq for ComponentType {}
impl Debug for ComponentType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentType").field(&self.name).finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
	/// A host element, like `div`.
	Element(Cow<'static, str>),
	/// A host text node. Its content is the [`NODE_VALUE`] property.
	Text,
	Component(ComponentType),
}
impl From<&'static str> for NodeType {
	fn from(name: &'static str) -> Self {
		Self::Element(name.into())
	}
}
impl From<String> for NodeType {
	fn from(name: String) -> Self {
		Self::Element(name.into())
	}
}
impl From<ComponentType> for NodeType {
	fn from(component: ComponentType) -> Self {
		Self::Component(component)
	}
}

/// An event handler stored as property value.
///
/// Equality is identity: Two [`Listener`]s are equal only if they are clones of each other.
/// The argument is whatever the host adapter dispatches, for example a [`web_sys::Event`].
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&dyn Any)>);
impl Listener {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	/// Stable for as long as any clone of this [`Listener`] is alive.
	#[must_use]
	pub fn key(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl PartialEq for Listener {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}
impl Debug for Listener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Listener({:#x})", self.key())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
	Str(Cow<'static, str>),
	Int(i64),
	Float(f64),
	Bool(bool),
	Listener(Listener),
}
impl PropValue {
	#[must_use]
	pub fn as_listener(&self) -> Option<&Listener> {
		match self {
			Self::Listener(listener) => Some(listener),
			_ => None,
		}
	}
}
impl Display for PropValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Str(str) => f.write_str(str),
			Self::Int(int) => Display::fmt(int, f),
			Self::Float(float) => Display::fmt(float, f),
			Self::Bool(bool) => Display::fmt(bool, f),
			Self::Listener(listener) => Debug::fmt(listener, f),
		}
	}
}
impl From<&'static str> for PropValue {
	fn from(str: &'static str) -> Self {
		Self::Str(str.into())
	}
}
impl From<String> for PropValue {
	fn from(string: String) -> Self {
		Self::Str(string.into())
	}
}
impl From<i64> for PropValue {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}
impl From<i32> for PropValue {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}
impl From<f64> for PropValue {
	fn from(float: f64) -> Self {
		Self::Float(float)
	}
}
impl From<bool> for PropValue {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}
impl From<Listener> for PropValue {
	fn from(listener: Listener) -> Self {
		Self::Listener(listener)
	}
}

/// Insertion-ordered property list. Names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(Vec<(Cow<'static, str>, PropValue)>);
impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Returns the replaced value, if any.
	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Option<PropValue> {
		let name = name.into();
		let value = value.into();
		match self.0.iter_mut().find(|(existing, _)| *existing == name) {
			Some((_, slot)) => Some(core::mem::replace(slot, value)),
			None => {
				self.0.push((name, value));
				None
			}
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.0.iter().find(|(existing, _)| existing == name).map(|(_, value)| value)
	}

	pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &PropValue)> {
		self.0.iter().map(|(name, value)| (name.as_ref(), value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Cheap to clone; all parts are shared.
#[derive(Debug, Clone)]
pub struct Node {
	ty: NodeType,
	props: Rc<Props>,
	children: Rc<[Node]>,
}
impl Node {
	#[must_use]
	pub fn new(ty: NodeType, props: Props, children: Vec<Node>) -> Self {
		Self {
			ty,
			props: Rc::new(props),
			children: children.into(),
		}
	}

	pub fn element<C: Into<Node>>(name: impl Into<Cow<'static, str>>, props: Props, children: impl IntoIterator<Item = C>) -> Self {
		create_element(NodeType::Element(name.into()), props, children)
	}

	/// An element without children.
	pub fn leaf(name: impl Into<Cow<'static, str>>, props: Props) -> Self {
		Self::new(NodeType::Element(name.into()), props, Vec::new())
	}

	pub fn text(value: impl Into<PropValue>) -> Self {
		Self::new(NodeType::Text, Props::new().with(NODE_VALUE, value), Vec::new())
	}

	pub fn component<C: Component>(props: Props) -> Self {
		Self::new(NodeType::Component(ComponentType::of::<C>()), props, Vec::new())
	}

	pub fn component_with_children<C: Component, N: Into<Node>>(props: Props, children: impl IntoIterator<Item = N>) -> Self {
		create_element(ComponentType::of::<C>(), props, children)
	}

	#[must_use]
	pub fn ty(&self) -> &NodeType {
		&self.ty
	}

	#[must_use]
	pub fn props(&self) -> &Props {
		&self.props
	}

	#[must_use]
	pub fn children(&self) -> &[Node] {
		&self.children
	}

	pub(crate) fn shared_props(&self) -> Rc<Props> {
		Rc::clone(&self.props)
	}

	pub(crate) fn shared_children(&self) -> Rc<[Node]> {
		Rc::clone(&self.children)
	}
}

macro_rules! text_from {
	($($ty:ty),*$(,)?) => {$(
		impl From<$ty> for Node {
			fn from(value: $ty) -> Self {
				Self::text(value)
			}
		}
	)*};
}
text_from!(&'static str, String, i64, i32, f64, bool);

/// Builds a [`Node`], normalizing every child that isn't a [`Node`] yet into a text node.
pub fn create_element<C: Into<Node>>(ty: impl Into<NodeType>, props: Props, children: impl IntoIterator<Item = C>) -> Node {
	Node::new(ty.into(), props, children.into_iter().map(Into::into).collect())
}
