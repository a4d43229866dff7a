#![allow(dead_code)]

use std::{cell::Cell, time::Duration};
use xylem::{
	create_element,
	memory::{MemoryHost, Mutation},
	Component, Deadline, Hooks, Listener, Node, Props,
};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

/// Runs out after `n` units of work.
pub struct Units(Cell<usize>);
impl Units {
	pub fn new(n: usize) -> Self {
		Self(Cell::new(n))
	}
}
impl Deadline for Units {
	fn time_remaining(&self) -> Duration {
		let left = self.0.get().saturating_sub(1);
		self.0.set(left);
		if left == 0 {
			Duration::ZERO
		} else {
			Duration::from_secs(1)
		}
	}
}

/// Always out of time.
pub struct Exhausted;
impl Deadline for Exhausted {
	fn time_remaining(&self) -> Duration {
		Duration::ZERO
	}
}

pub struct Counter;
impl Component for Counter {
	fn render(_: &Props, _: &[Node], hooks: &mut Hooks<'_>) -> Node {
		let (count, set_count) = hooks.use_state(1_i64);
		create_element(
			"div",
			Props::new(),
			[
				create_element("h1", Props::new(), [Node::from("Count: "), Node::from(count)]),
				create_element(
					"button",
					Props::new().with("onClick", Listener::new(move |_| set_count.update(|count| count + 1))),
					["+1"],
				),
			],
		)
	}
}

pub fn inserts(mutations: &[Mutation]) -> usize {
	mutations.iter().filter(|mutation| matches!(mutation, Mutation::Insert { .. })).count()
}

pub fn removes(mutations: &[Mutation]) -> usize {
	mutations.iter().filter(|mutation| matches!(mutation, Mutation::Remove { .. })).count()
}

pub fn creates(mutations: &[Mutation]) -> usize {
	mutations.iter().filter(|mutation| matches!(mutation, Mutation::Create { .. })).count()
}

/// Panics if any connected node is touched outside a commit, or if commits nest.
pub fn assert_commits_atomic(mutations: &[Mutation]) {
	let mut in_commit = false;
	for (i, mutation) in mutations.iter().enumerate() {
		match mutation {
			Mutation::BeginCommit => {
				assert!(!in_commit, "Nested commit at {}", i);
				in_commit = true;
			}
			Mutation::EndCommit => {
				assert!(in_commit, "Unmatched commit end at {}", i);
				in_commit = false;
			}
			Mutation::Insert { .. } | Mutation::Remove { .. } => assert!(in_commit, "Structural change outside commit at {}: {:?}", i, mutation),
			Mutation::SetProperty { connected, .. }
			| Mutation::ClearProperty { connected, .. }
			| Mutation::AddListener { connected, .. }
			| Mutation::RemoveListener { connected, .. } => assert!(in_commit || !connected, "Connected node touched outside commit at {}: {:?}", i, mutation),
			Mutation::Create { .. } => (),
		}
	}
	assert!(!in_commit, "Unfinished commit");
}

pub fn host_with_container() -> (MemoryHost, xylem::memory::HostNodeId) {
	let mut host = MemoryHost::new();
	let container = host.create_container();
	(host, container)
}
