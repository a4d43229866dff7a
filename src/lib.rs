#![doc(html_root_url = "https://docs.rs/xylem/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! An incremental fiber reconciler.
//!
//! [`Node`] trees are turned into a work-in-progress [`FiberTree`] one fiber per unit of work,
//! diffed positionally against the last committed tree, and then applied to a [`Host`] tree in a single commit.
//!
//! ```
//! use xylem::{create_element, memory::MemoryHost, Node, Props, Runtime};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let mut runtime = Runtime::new(host);
//!
//! runtime.render(create_element("h1", Props::new().with("title", "foo"), ["Hello"]), container);
//! runtime.flush().unwrap();
//!
//! assert_eq!(runtime.host().serialize(container), r#"<h1 title="foo">Hello</h1>"#);
//! ```

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod commit;
pub mod deadline;
pub mod diff;
pub mod dom;
mod error;
pub mod fiber;
mod hooks;
pub mod host;
pub mod memory;
mod node;
mod rc_hash_map;
mod reconcile;
mod runtime;

pub use commit::CommitSummary;
pub use deadline::Deadline;
pub use error::Error;
pub use fiber::FiberTree;
pub use hooks::{Action, Hooks, Setter, UpdateSignal};
pub use host::Host;
pub use node::{create_element, Component, ComponentType, Listener, Node, NodeType, PropValue, Props, NODE_VALUE};
pub use runtime::{Options, Runtime, WorkStatus};
