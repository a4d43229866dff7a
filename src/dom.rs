//! The browser host: [`web_sys::Node`]s and [`requestIdleCallback`](https://developer.mozilla.org/en-US/docs/Web/API/Window/requestIdleCallback).
//!
//! Everything here needs a browser environment at runtime.

use crate::{
	deadline::Deadline,
	host::Host,
	node::{Listener, PropValue},
	rc_hash_map::{CountSaturatedError, RcHashMap},
	runtime::Runtime,
};
use core::{cell::RefCell, fmt, time::Duration};
use js_sys::{Function, Reflect};
use std::rc::Rc;
use thiserror::Error;
use tracing::{error, info, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// A [***JavaScript***](https://developer.mozilla.org/en-US/docs/Web/JavaScript) exception or missing browser API.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DomError {
	message: String,
}
impl From<JsValue> for DomError {
	fn from(value: JsValue) -> Self {
		Self {
			message: value.as_string().unwrap_or_else(|| format!("{:?}", value)),
		}
	}
}
impl From<CountSaturatedError> for DomError {
	fn from(error: CountSaturatedError) -> Self {
		Self {
			message: format!("Too many (more than 65k) active references to the same `Listener`: {}", error),
		}
	}
}
impl DomError {
	fn missing(what: &str) -> Self {
		Self { message: format!("No {} found.", what) }
	}
}

impl Deadline for web_sys::IdleDeadline {
	fn time_remaining(&self) -> Duration {
		Duration::from_secs_f64(web_sys::IdleDeadline::time_remaining(self).max(0.0) / 1000.0)
	}
}

/// Creates and mutates nodes of one [`web_sys::Document`].
///
/// Properties are assigned like `node[name] = value`, so `nodeValue` sets a text node's content.
///
/// Each distinct [`Listener`] is wrapped in a single [`Closure`], reference-counted across all nodes it's attached to.
/// Closures that are no longer attached anywhere are freed at the end of each commit.
pub struct DomHost {
	document: web_sys::Document,
	closures: RcHashMap<usize, u16, Closure<dyn Fn(web_sys::Event)>>,
}
impl fmt::Debug for DomHost {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DomHost").field("document", &self.document).field("closures", &self.closures).finish()
	}
}
impl DomHost {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			closures: RcHashMap::new(),
		}
	}

	/// Uses the current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window or document.
	pub fn for_window() -> Result<Self, DomError> {
		let document = web_sys::window()
			.ok_or_else(|| DomError::missing("window"))?
			.document()
			.ok_or_else(|| DomError::missing("document"))?;
		Ok(Self::new(document))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Number of distinct [`Listener`]s currently wrapped.
	#[must_use]
	pub fn closure_count(&self) -> usize {
		self.closures.len()
	}

	fn closure(&mut self, listener: &Listener) -> Result<&Function, DomError> {
		let listener = listener.clone();
		let closure: &Closure<dyn Fn(web_sys::Event)> = self.closures.increment_or_insert_with(listener.key(), move || {
			trace!(key = listener.key(), "Wrapping listener");
			Closure::wrap(Box::new(move |event: web_sys::Event| {
				let span = trace_span!("Listener", event = ?event.type_());
				let _enter = span.enter();
				listener.call(&event)
			}) as Box<dyn Fn(web_sys::Event)>)
		})?;
		Ok(closure.as_ref().unchecked_ref())
	}
}

fn to_js(value: &PropValue) -> Option<JsValue> {
	Some(match value {
		PropValue::Str(str) => JsValue::from_str(str),
		#[allow(clippy::cast_precision_loss)]
		PropValue::Int(int) => JsValue::from_f64(*int as f64),
		PropValue::Float(float) => JsValue::from_f64(*float),
		PropValue::Bool(bool) => JsValue::from_bool(*bool),
		PropValue::Listener(_) => return None,
	})
}

impl Host for DomHost {
	type Handle = web_sys::Node;
	type Error = DomError;

	fn create_element(&mut self, name: &str) -> Result<Self::Handle, Self::Error> {
		Ok(self.document.create_element(name)?.into())
	}

	fn create_text(&mut self) -> Result<Self::Handle, Self::Error> {
		Ok(self.document.create_text_node("").into())
	}

	fn set_property(&mut self, node: &Self::Handle, name: &str, value: &PropValue) -> Result<(), Self::Error> {
		match to_js(value) {
			Some(value) => {
				Reflect::set(node, &JsValue::from_str(name), &value)?;
			}
			None => warn!(name, "`Listener` as plain property value. Use an event property (`on…`) instead. Ignoring it."),
		}
		Ok(())
	}

	fn clear_property(&mut self, node: &Self::Handle, name: &str) -> Result<(), Self::Error> {
		Reflect::set(node, &JsValue::from_str(name), &JsValue::from_str(""))?;
		Ok(())
	}

	fn add_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error> {
		let function = self.closure(listener)?.clone();
		node.add_event_listener_with_callback(event, &function)?;
		Ok(())
	}

	fn remove_listener(&mut self, node: &Self::Handle, event: &str, listener: &Listener) -> Result<(), Self::Error> {
		match self.closures.weak_decrement(&listener.key())? {
			Some(closure) => node.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?,
			None => warn!(event, key = listener.key(), "Tried to remove a listener that was never added. Ignoring it."),
		}
		Ok(())
	}

	fn insert_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error> {
		parent.append_child(child)?;
		Ok(())
	}

	fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error> {
		parent.remove_child(child)?;
		Ok(())
	}

	fn end_commit(&mut self) {
		{
			let drain = self.closures.drain_weak();
			trace!("Freed {} listener closure(s).", drain.count());
		}
		info!("Listener closure count/cached capacity: {}/{}", self.closures.len(), self.closures.capacity());
	}
}

type IdleCallback = Closure<dyn FnMut(web_sys::IdleDeadline)>;

/// Drives a [`Runtime`] from `window.requestIdleCallback`, re-arming after every slice.
///
/// Errors are logged and the loop continues with the next slice.
/// Dropping this stops the loop (the pending callback then throws once); use [`forget`](`IdleLoop::forget`)
/// to keep it running for the rest of the page's lifetime.
pub struct IdleLoop {
	callback: Rc<RefCell<Option<IdleCallback>>>,
}
impl IdleLoop {
	/// # Errors
	///
	/// Iff there is no window or the first registration fails.
	pub fn start<H: Host + 'static>(runtime: Rc<RefCell<Runtime<H>>>) -> Result<Self, DomError> {
		let window = web_sys::window().ok_or_else(|| DomError::missing("window"))?;
		let callback: Rc<RefCell<Option<IdleCallback>>> = Rc::default();

		let rearm = Rc::downgrade(&callback);
		let rearm_window = window.clone();
		*callback.borrow_mut() = Some(Closure::wrap(Box::new(move |deadline: web_sys::IdleDeadline| {
			match runtime.try_borrow_mut() {
				Ok(mut runtime) => {
					if let Err(error) = runtime.work_loop(&deadline) {
						error!(%error, "Idle slice failed.");
					}
				}
				Err(_) => error!("`Runtime` is borrowed elsewhere. Skipping this idle slice."),
			}

			if let Some(callback) = rearm.upgrade() {
				if let Some(callback) = callback.borrow().as_ref() {
					if let Err(error) = rearm_window.request_idle_callback(callback.as_ref().unchecked_ref()) {
						error!(error = ?error, "Could not re-arm the idle loop.");
					}
				}
			}
		}) as Box<dyn FnMut(web_sys::IdleDeadline)>));

		if let Some(first) = callback.borrow().as_ref() {
			window.request_idle_callback(first.as_ref().unchecked_ref())?;
		}
		Ok(Self { callback })
	}

	/// Keeps the loop alive indefinitely.
	pub fn forget(self) {
		core::mem::forget(self.callback)
	}
}
impl fmt::Debug for IdleLoop {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IdleLoop").finish_non_exhaustive()
	}
}
