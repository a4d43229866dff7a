//! Per-component state cells, recovered by call order from the previous generation.

use core::{any::Any, cell::Cell, cell::RefCell, fmt};
use std::rc::Rc;
use tracing::{error, trace};

/// Raised by [`Setter`]s, consumed by the [`Runtime`](`crate::Runtime`) scheduler.
///
/// Setters never touch the fiber trees. They only leave a note here, so they can be called from
/// anywhere, including from event listeners that run while the host tree is being mutated.
#[derive(Debug, Default)]
pub struct UpdateSignal(Cell<bool>);
impl UpdateSignal {
	pub fn request(&self) {
		trace!("Root render requested.");
		self.0.set(true)
	}

	/// Resets the signal, returning whether it was raised.
	pub fn take(&self) -> bool {
		self.0.replace(false)
	}

	#[must_use]
	pub fn is_requested(&self) -> bool {
		self.0.get()
	}
}

/// A queued state change.
pub enum Action<T> {
	Replace(T),
	Update(Rc<dyn Fn(&T) -> T>),
}
impl<T: Clone> Action<T> {
	fn apply(&self, state: T) -> T {
		match self {
			Self::Replace(value) => value.clone(),
			Self::Update(update) => update(&state),
		}
	}
}
impl<T> Clone for Action<T>
where
	T: Clone,
{
	fn clone(&self) -> Self {
		match self {
			Self::Replace(value) => Self::Replace(value.clone()),
			Self::Update(update) => Self::Update(Rc::clone(update)),
		}
	}
}
impl<T: fmt::Debug> fmt::Debug for Action<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
			Self::Update(_) => f.write_str("Update(..)"),
		}
	}
}

/// One `use_state` slot of one render.
///
/// Its queue is read (but never drained) by the following render of the same tree position.
/// An abandoned work-in-progress pass therefore loses no actions: they are replayed on the next attempt.
struct StateCell<T> {
	state: T,
	queue: RefCell<Vec<Action<T>>>,
}
impl<T: Clone> StateCell<T> {
	fn resolve(&self) -> T {
		self.queue.borrow().iter().fold(self.state.clone(), |state, action| action.apply(state))
	}
}

/// Type-erased hook cell as stored on a component fiber.
pub(crate) type HookCell = Rc<dyn Any>;

/// Handed to [`Component::render`](`crate::Component::render`).
///
/// Calls must happen in the same order during every render of a component instance.
pub struct Hooks<'a> {
	previous: &'a [HookCell],
	cells: Vec<HookCell>,
	updates: &'a Rc<UpdateSignal>,
}
impl<'a> Hooks<'a> {
	pub(crate) fn new(previous: &'a [HookCell], updates: &'a Rc<UpdateSignal>) -> Self {
		Self {
			previous,
			cells: Vec::new(),
			updates,
		}
	}

	pub(crate) fn into_cells(self) -> Vec<HookCell> {
		self.cells
	}

	/// Returns the current state and a [`Setter`] that schedules changes to it for the next render.
	pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
		let index = self.cells.len();
		let previous = self.previous.get(index).cloned().and_then(|cell| match cell.downcast::<StateCell<T>>() {
			Ok(cell) => Some(cell),
			Err(_) => {
				error!(index, "Hook at this position had a different type during the previous render. Calls were likely reordered; Resetting the state.");
				None
			}
		});

		let state = match previous {
			Some(previous) => previous.resolve(),
			None => initial,
		};

		let cell = Rc::new(StateCell {
			state: state.clone(),
			queue: RefCell::new(Vec::new()),
		});
		self.cells.push(Rc::clone(&cell) as HookCell);
		(
			state,
			Setter {
				cell,
				updates: Rc::clone(self.updates),
			},
		)
	}
}

/// Enqueues actions on one hook cell and requests a root render.
pub struct Setter<T> {
	cell: Rc<StateCell<T>>,
	updates: Rc<UpdateSignal>,
}
impl<T> Clone for Setter<T> {
	fn clone(&self) -> Self {
		Self {
			cell: Rc::clone(&self.cell),
			updates: Rc::clone(&self.updates),
		}
	}
}
impl<T: Clone + 'static> Setter<T> {
	pub fn dispatch(&self, action: Action<T>) {
		self.cell.queue.borrow_mut().push(action);
		self.updates.request()
	}

	pub fn set(&self, value: T) {
		self.dispatch(Action::Replace(value))
	}

	pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
		self.dispatch(Action::Update(Rc::new(update)))
	}
}
impl<T> fmt::Debug for Setter<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Setter").field("queued", &self.cell.queue.borrow().len()).finish()
	}
}
