//! Property diffing between two generations of the same host node.

use crate::{
	error::{self, Error},
	host::Host,
	node::{Listener, PropValue, Props},
};
use hashbrown::HashMap;
use tracing::{trace, trace_span, warn};

/// Properties whose name starts with this are event listeners.
pub const EVENT_PREFIX: &str = "on";

/// `"onClick"` → `Some("click")`.
#[must_use]
pub fn event_kind(name: &str) -> Option<String> {
	name.strip_prefix(EVENT_PREFIX).map(str::to_lowercase)
}

fn listener<'a>(name: &str, value: &'a PropValue) -> Option<&'a Listener> {
	let listener = value.as_listener();
	if listener.is_none() {
		warn!(name, "Event property without `Listener` value. Ignoring it.");
	}
	listener
}

macro_rules! trace_value {
	($message:literal, $name:expr, $value:expr) => {
		#[cfg(feature = "dangerous-logging")]
		trace!(name = $name, value = %$value, $message);
		#[cfg(not(feature = "dangerous-logging"))]
		{
			let _ = &$value;
			trace!(name = $name, $message);
		}
	};
}

/// Applies the difference between `prev` and `next` to `node`.
///
/// Returns the number of host calls made, so `0` means the diff was empty.
pub(crate) fn update_props<H: Host>(host: &mut H, node: &H::Handle, prev: &Props, next: &Props) -> Result<usize, Error<H::Error>> {
	let span = trace_span!("Updating properties", prev = prev.len(), next = next.len());
	let _enter = span.enter();

	let prev_map: HashMap<&str, &PropValue> = prev.iter().collect();
	let next_map: HashMap<&str, &PropValue> = next.iter().collect();
	let mut calls = 0;

	// Stale listeners first, so a replaced handler is never attached twice.
	for (name, value) in prev.iter() {
		let event = match event_kind(name) {
			Some(event) => event,
			None => continue,
		};
		if next_map.get(name) == Some(&value) {
			continue;
		}
		if let Some(listener) = listener(name, value) {
			trace!(name, event = event.as_str(), "Removing listener");
			host.remove_listener(node, &event, listener).map_err(error::host("remove a listener"))?;
			calls += 1;
		}
	}

	for (name, _) in prev.iter() {
		if event_kind(name).is_none() && !next_map.contains_key(name) {
			trace!(name, "Clearing property");
			host.clear_property(node, name).map_err(error::host("clear a property"))?;
			calls += 1;
		}
	}

	for (name, value) in next.iter() {
		if event_kind(name).is_some() || prev_map.get(name) == Some(&value) {
			continue;
		}
		trace_value!("Setting property", name, value);
		host.set_property(node, name, value).map_err(error::host("set a property"))?;
		calls += 1;
	}

	for (name, value) in next.iter() {
		let event = match event_kind(name) {
			Some(event) => event,
			None => continue,
		};
		if prev_map.get(name) == Some(&value) {
			continue;
		}
		if let Some(listener) = listener(name, value) {
			trace!(name, event = event.as_str(), "Adding listener");
			host.add_listener(node, &event, listener).map_err(error::host("add a listener"))?;
			calls += 1;
		}
	}

	Ok(calls)
}

/// Detaches every listener in `props` from `node`, leaving other properties alone.
pub(crate) fn remove_listeners<H: Host>(host: &mut H, node: &H::Handle, props: &Props) -> Result<(), Error<H::Error>> {
	for (name, value) in props.iter() {
		if let Some(event) = event_kind(name) {
			if let Some(listener) = listener(name, value) {
				host.remove_listener(node, &event, listener).map_err(error::host("remove a listener"))?;
			}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::{MemoryHost, Mutation};

	fn calls(host: &mut MemoryHost) -> Vec<String> {
		host.take_mutations()
			.into_iter()
			.filter_map(|mutation| match mutation {
				Mutation::SetProperty { name, .. } => Some(format!("set {}", name)),
				Mutation::ClearProperty { name, .. } => Some(format!("clear {}", name)),
				Mutation::AddListener { event, .. } => Some(format!("add {}", event)),
				Mutation::RemoveListener { event, .. } => Some(format!("remove {}", event)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn event_names_are_lowercased_without_prefix() {
		assert_eq!(event_kind("onClick").as_deref(), Some("click"));
		assert_eq!(event_kind("onDblClick").as_deref(), Some("dblclick"));
		assert_eq!(event_kind("title"), None);
	}

	#[test]
	fn initial_application_sets_everything() {
		let mut host = MemoryHost::new();
		let node = host.create_element("button").unwrap();
		host.take_mutations();

		let next = Props::new().with("id", "b").with("onClick", Listener::new(|_| ())).with("disabled", false);
		let count = update_props(&mut host, &node, &Props::new(), &next).unwrap();

		assert_eq!(count, 3);
		assert_eq!(calls(&mut host), ["set id", "set disabled", "add click"]);
		assert_eq!(host.property(node, "id"), Some(&PropValue::from("b")));
	}

	#[test]
	fn identical_props_make_no_calls() {
		let mut host = MemoryHost::new();
		let node = host.create_element("div").unwrap();
		let props = Props::new().with("title", "t").with("onInput", Listener::new(|_| ()));
		update_props(&mut host, &node, &Props::new(), &props).unwrap();
		host.take_mutations();

		assert_eq!(update_props(&mut host, &node, &props, &props.clone()).unwrap(), 0);
		assert!(calls(&mut host).is_empty());
	}

	#[test]
	fn changed_listener_is_swapped() {
		let mut host = MemoryHost::new();
		let node = host.create_element("div").unwrap();
		let prev = Props::new().with("onClick", Listener::new(|_| ()));
		let next = Props::new().with("onClick", Listener::new(|_| ()));
		update_props(&mut host, &node, &Props::new(), &prev).unwrap();
		host.take_mutations();

		update_props(&mut host, &node, &prev, &next).unwrap();
		assert_eq!(calls(&mut host), ["remove click", "add click"]);
		assert_eq!(host.listener_count(node, "click"), 1);
	}

	#[test]
	fn gone_properties_are_cleared_and_changed_ones_set() {
		let mut host = MemoryHost::new();
		let node = host.create_element("input").unwrap();
		let prev = Props::new().with("value", "a").with("placeholder", "p").with("onInput", Listener::new(|_| ()));
		let next = Props::new().with("value", "b");
		update_props(&mut host, &node, &Props::new(), &prev).unwrap();
		host.take_mutations();

		update_props(&mut host, &node, &prev, &next).unwrap();
		assert_eq!(calls(&mut host), ["remove input", "clear placeholder", "set value"]);
		assert_eq!(host.property(node, "placeholder"), Some(&PropValue::from("")));
		assert_eq!(host.property(node, "value"), Some(&PropValue::from("b")));
	}

	#[test]
	fn event_property_without_listener_is_ignored() {
		let mut host = MemoryHost::new();
		let node = host.create_element("a").unwrap();
		host.take_mutations();

		let count = update_props(&mut host, &node, &Props::new(), &Props::new().with("onClick", "alert()")).unwrap();
		assert_eq!(count, 0);
		assert!(calls(&mut host).is_empty());
	}

	#[test]
	fn remove_listeners_leaves_properties() {
		let mut host = MemoryHost::new();
		let node = host.create_element("a").unwrap();
		let props = Props::new().with("href", "#").with("onClick", Listener::new(|_| ()));
		update_props(&mut host, &node, &Props::new(), &props).unwrap();
		host.take_mutations();

		remove_listeners(&mut host, &node, &props).unwrap();
		assert_eq!(calls(&mut host), ["remove click"]);
		assert_eq!(host.property(node, "href"), Some(&PropValue::from("#")));
	}
}
