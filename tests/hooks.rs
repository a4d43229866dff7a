mod common;

use common::{host_with_container, init_tracing, Counter, Units};
use std::cell::{Cell, RefCell};
use xylem::{create_element, Component, Hooks, Listener, Node, Props, Runtime, Setter, WorkStatus};

struct Pair;
impl Component for Pair {
	fn render(_: &Props, _: &[Node], hooks: &mut Hooks<'_>) -> Node {
		let (left, set_left) = hooks.use_state(String::from("L"));
		let (right, set_right) = hooks.use_state(0_i64);
		create_element(
			"div",
			Props::new(),
			[
				create_element("em", Props::new().with("onClick", Listener::new(move |_| set_left.update(|left| format!("{}!", left)))), [left]),
				create_element("b", Props::new().with("onClick", Listener::new(move |_| set_right.update(|right| right + 10))), [right]),
			],
		)
	}
}

#[test]
fn hooks_keep_their_position() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Pair>(Props::new()), container);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().serialize(container), "<div><em onclick>L</em><b onclick>0</b></div>");

	let b = runtime.host().find(container, "b").unwrap();
	assert_eq!(runtime.host().dispatch(b, "click", &()), 1);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().serialize(container), "<div><em onclick>L</em><b onclick>10</b></div>");

	let em = runtime.host().find(container, "em").unwrap();
	runtime.host().dispatch(em, "click", &());
	runtime.host().dispatch(em, "click", &());
	runtime.flush().unwrap();
	assert_eq!(runtime.host().serialize(container), "<div><em onclick>L!!</em><b onclick>10</b></div>");
}

struct Batched;
impl Component for Batched {
	fn render(_: &Props, _: &[Node], hooks: &mut Hooks<'_>) -> Node {
		let (value, set_value) = hooks.use_state(1_i64);
		let listener = Listener::new(move |_| {
			set_value.update(|value| value + 1);
			set_value.update(|value| value + 2);
		});
		create_element("button", Props::new().with("onClick", listener), [value])
	}
}

#[test]
fn batched_updates_apply_in_order() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Batched>(Props::new()), container);
	runtime.flush().unwrap();

	let button = runtime.host().find(container, "button").unwrap();
	runtime.host().dispatch(button, "click", &());
	assert!(!runtime.is_idle());
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "4");
	assert!(runtime.is_idle());
}

thread_local! {
	static SETTER: RefCell<Option<Setter<i64>>> = RefCell::new(None);
	static RENDERS: Cell<usize> = Cell::new(0);
}

struct Exposed;
impl Component for Exposed {
	fn render(_: &Props, _: &[Node], hooks: &mut Hooks<'_>) -> Node {
		RENDERS.with(|renders| renders.set(renders.get() + 1));
		let (value, set_value) = hooks.use_state(0_i64);
		SETTER.with(|setter| *setter.borrow_mut() = Some(set_value));
		create_element("output", Props::new(), [value])
	}
}

fn setter() -> Setter<i64> {
	SETTER.with(|setter| setter.borrow().clone()).unwrap()
}

#[test]
fn replacement_then_function_update() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Exposed>(Props::new()), container);
	runtime.flush().unwrap();

	let set = setter();
	set.set(5);
	set.update(|value| value * 3);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "15");

	setter().set(-1);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "-1");
}

#[test]
fn abandoned_work_replays_queued_updates() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Counter>(Props::new()), container);
	runtime.flush().unwrap();
	let h1 = runtime.host().find(container, "h1").unwrap();
	let button = runtime.host().find(container, "button").unwrap();

	runtime.host().dispatch(button, "click", &());
	let units = Units::new(1);
	assert_eq!(runtime.work_loop(&units).unwrap(), WorkStatus::Yielded);
	assert_eq!(runtime.work_loop(&units).unwrap(), WorkStatus::Yielded);
	// Nothing is visible before the commit.
	assert_eq!(runtime.host().text_content(h1), "Count: 1");

	// The listener still belongs to the committed render, so this queues onto the same cell.
	runtime.host().dispatch(button, "click", &());
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(h1), "Count: 3");
	assert_eq!(runtime.host().find(container, "h1"), Some(h1));
}

#[test]
fn update_before_first_commit_is_not_scheduled() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Exposed>(Props::new()), container);

	// Root, then the component.
	let units = Units::new(1);
	assert_eq!(runtime.work_loop(&units).unwrap(), WorkStatus::Yielded);
	assert_eq!(runtime.work_loop(&units).unwrap(), WorkStatus::Yielded);

	setter().set(7);
	let summary = runtime.flush().unwrap().unwrap();
	assert_eq!(summary.placements, 2);
	assert_eq!(runtime.host().text_content(container), "0");
	assert!(runtime.is_idle());

	// The action stays queued on the committed cell and shows up with the next render.
	runtime.render(Node::component::<Exposed>(Props::new()), container);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "7");
}

thread_local! {
	static AS_TEXT: Cell<bool> = Cell::new(false);
}

struct Shifty;
impl Component for Shifty {
	fn render(_: &Props, _: &[Node], hooks: &mut Hooks<'_>) -> Node {
		let shown = if AS_TEXT.with(Cell::get) {
			hooks.use_state(String::from("initial")).0
		} else {
			hooks.use_state(1_i64).0.to_string()
		};
		create_element("span", Props::new(), [shown])
	}
}

#[test]
fn mismatched_hook_type_falls_back_to_initial() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	runtime.render(Node::component::<Shifty>(Props::new()), container);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "1");

	AS_TEXT.with(|as_text| as_text.set(true));
	runtime.render(Node::component::<Shifty>(Props::new()), container);
	runtime.flush().unwrap();
	assert_eq!(runtime.host().text_content(container), "initial");
}

#[test]
fn each_render_pass_calls_the_component_once() {
	init_tracing();
	let (host, container) = host_with_container();
	let mut runtime = Runtime::new(host);
	RENDERS.with(|renders| renders.set(0));

	runtime.render(Node::component::<Exposed>(Props::new()), container);
	runtime.flush().unwrap();
	assert_eq!(RENDERS.with(Cell::get), 1);

	setter().update(|value| value + 1);
	setter().update(|value| value + 1);
	runtime.flush().unwrap();
	assert_eq!(RENDERS.with(Cell::get), 2);
	assert_eq!(runtime.host().text_content(container), "2");
}
