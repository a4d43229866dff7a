//! The cooperative scheduler and the unit-of-work processor.

use crate::{
	commit::CommitSummary,
	deadline::{Deadline, Unbounded},
	diff::{remove_listeners, update_props},
	error::{self, Error},
	fiber::{EffectTag, FiberId, FiberTree, FiberType},
	hooks::{Hooks, UpdateSignal},
	host::Host,
	node::{Node, Props},
	reconcile::reconcile_children,
};
use core::time::Duration;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace, trace_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// [`Runtime::work_loop`] yields once its [`Deadline`] reports less than this.
	///
	/// Checked after each unit of work, so at least one unit runs per slice.
	pub yield_threshold: Duration,
}
impl Default for Options {
	fn default() -> Self {
		Self {
			yield_threshold: Duration::from_millis(1),
		}
	}
}

/// Outcome of one [`Runtime::work_loop`] slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WorkStatus {
	/// There was nothing to do.
	Idle,
	/// The deadline ran out with work left.
	Yielded,
	/// The work-in-progress tree was finished and applied to the host.
	Committed(CommitSummary),
}

/// Owns both fiber generations and the host adapter.
///
/// # Correct Use
///
/// Call [`work_loop`](`Runtime::work_loop`) whenever the embedding environment has idle time,
/// for example from [`IdleLoop`](`crate::dom::IdleLoop`).
/// [`Setter`](`crate::Setter`)s may be called at any time, they only raise a signal that is consumed here.
#[derive(Debug)]
pub struct Runtime<H: Host> {
	pub(crate) host: H,
	pub(crate) options: Options,
	/// Last committed generation.
	pub(crate) current: Option<FiberTree<H::Handle>>,
	/// Generation under construction.
	pub(crate) wip: Option<FiberTree<H::Handle>>,
	pub(crate) next_unit_of_work: Option<FiberId>,
	/// Fibers of `current` whose host nodes are removed at the next commit.
	pub(crate) deletions: Vec<FiberId>,
	pub(crate) updates: Rc<UpdateSignal>,
}
impl<H: Host> Runtime<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self::with_options(host, Options::default())
	}

	#[must_use]
	pub fn with_options(host: H, options: Options) -> Self {
		Self {
			host,
			options,
			current: None,
			wip: None,
			next_unit_of_work: None,
			deletions: Vec::new(),
			updates: Rc::default(),
		}
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	/// Direct host access. Mutating nodes the runtime manages leads to surprising diffs.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	#[must_use]
	pub fn options(&self) -> &Options {
		&self.options
	}

	/// Whether neither work nor a state update is pending.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.wip.is_none() && !self.updates.is_requested()
	}

	/// The last committed generation, if any.
	#[must_use]
	pub fn current(&self) -> Option<&FiberTree<H::Handle>> {
		self.current.as_ref()
	}

	/// Schedules rendering `node` into `container`.
	///
	/// Any unfinished work-in-progress tree is abandoned, and so is a pending state update request:
	/// The new pass reads queued actions from the current hook cells anyway.
	/// Nothing happens until [`work_loop`](`Runtime::work_loop`) runs.
	#[instrument(skip(self, node, container))]
	pub fn render(&mut self, node: Node, container: H::Handle) {
		if self.updates.take() {
			debug!("Superseding pending state update request.");
		}
		let alternate = self.current.as_ref().map(|_| FiberId::ROOT);
		self.start(FiberTree::with_root(container, vec![node].into(), alternate));
	}

	fn start(&mut self, wip: FiberTree<H::Handle>) {
		if let Some(abandoned) = self.wip.replace(wip) {
			debug!("Abandoning unfinished work-in-progress tree.");
			release_listeners(&mut self.host, &abandoned);
		}
		self.deletions.clear();
		self.next_unit_of_work = Some(FiberId::ROOT);
	}

	/// Seeds a new root render from `current` after a state change.
	fn restart_from_root(&mut self) {
		let current = match &self.current {
			Some(current) => current,
			// Nothing to restart from. The action stays queued on its cell.
			None => return warn!("State update requested before the first commit. Dropping it."),
		};
		let root = current.root();
		let container = match &root.host {
			Some(container) => container.clone(),
			None => return error!("Current root has no container. Ignoring state update."),
		};
		let children = Rc::clone(&root.children);
		self.start(FiberTree::with_root(container, children, Some(FiberId::ROOT)));
	}

	/// Runs one idle slice: Processes units of work until `deadline` runs out or the tree is finished,
	/// then commits a finished tree.
	///
	/// # Errors
	///
	/// Host adapter failures abort and abandon the work-in-progress tree.
	pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, Error<H::Error>> {
		let span = trace_span!("work_loop");
		let _enter = span.enter();

		let mut should_yield = false;
		let mut units = 0_usize;
		loop {
			if self.updates.take() {
				self.restart_from_root();
			}
			let unit = match self.next_unit_of_work {
				Some(unit) => unit,
				None => break,
			};
			if should_yield {
				trace!(units, "Yielding with work left");
				return Ok(WorkStatus::Yielded);
			}
			self.next_unit_of_work = match self.perform_unit_of_work(unit) {
				Ok(next) => next,
				Err(error) => {
					error!(%error, "Unit of work failed. Abandoning the work-in-progress tree.");
					self.abandon();
					return Err(error);
				}
			};
			units += 1;
			should_yield = deadline.time_remaining() < self.options.yield_threshold;
		}

		if self.wip.is_some() {
			trace!(units, "Work-in-progress tree finished");
			return self.commit_root().map(WorkStatus::Committed);
		}
		Ok(WorkStatus::Idle)
	}

	/// Works without deadline until nothing is pending, returning the last commit's summary.
	///
	/// # Errors
	///
	/// See [`work_loop`](`Runtime::work_loop`).
	pub fn flush(&mut self) -> Result<Option<CommitSummary>, Error<H::Error>> {
		let mut last = None;
		while !self.is_idle() {
			if let WorkStatus::Committed(summary) = self.work_loop(&Unbounded)? {
				last = Some(summary)
			}
		}
		Ok(last)
	}

	pub(crate) fn abandon(&mut self) {
		if let Some(abandoned) = self.wip.take() {
			release_listeners(&mut self.host, &abandoned);
		}
		self.next_unit_of_work = None;
		self.deletions.clear();
	}

	/// Processes one fiber and returns the next one to visit.
	fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, Error<H::Error>> {
		let Self {
			host,
			current,
			wip,
			deletions,
			updates,
			..
		} = self;
		let wip = match wip {
			Some(wip) => wip,
			None => return Ok(None),
		};

		let ty = wip[id].ty.clone();
		let span = trace_span!("Unit of work", ?id, ?ty);
		let _enter = span.enter();

		match &ty {
			FiberType::Component(component) => {
				let props = Rc::clone(&wip[id].props);
				let children = Rc::clone(&wip[id].children);
				let previous = match (current.as_ref(), wip[id].alternate) {
					(Some(current), Some(alternate)) => current[alternate].hooks.as_slice(),
					_ => &[],
				};
				let mut hooks = Hooks::new(previous, updates);
				let rendered = component.render(&props, &children, &mut hooks);
				wip[id].hooks = hooks.into_cells();
				reconcile_children(wip, current.as_mut(), deletions, id, &[rendered]);
			}
			FiberType::Root => {
				let children = Rc::clone(&wip[id].children);
				reconcile_children(wip, current.as_mut(), deletions, id, &children);
			}
			FiberType::Element(_) | FiberType::Text => {
				if wip[id].host.is_none() {
					let node = match &ty {
						FiberType::Element(name) => host.create_element(name).map_err(error::host("create an element"))?,
						_ => host.create_text().map_err(error::host("create a text node"))?,
					};
					trace!(?node, "Created host node");
					update_props(host, &node, &Props::default(), &wip[id].props)?;
					wip[id].host = Some(node);
				}
				let children = Rc::clone(&wip[id].children);
				reconcile_children(wip, current.as_mut(), deletions, id, &children);
			}
		}

		Ok(wip.next(id, FiberId::ROOT))
	}
}

/// Detaches the listeners of host nodes that were created for `wip` and never reached a commit.
///
/// Nodes shared with the current tree are left alone, since their listeners only change while committing.
/// Failures are logged and skipped, as the nodes are dropped either way.
pub(crate) fn release_listeners<H: Host>(host: &mut H, wip: &FiberTree<H::Handle>) {
	for id in wip.descendants() {
		let fiber = &wip[id];
		if fiber.effect != Some(EffectTag::Placement) {
			continue;
		}
		if let Some(node) = &fiber.host {
			if let Err(error) = remove_listeners(host, node, &fiber.props) {
				error!(%error, ?id, "Could not detach listeners of an abandoned host node.");
			}
		}
	}
}
