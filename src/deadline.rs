//! Time budgets handed to [`Runtime::work_loop`](`crate::Runtime::work_loop`) by whatever drives it.

use std::time::{Duration, Instant};

pub trait Deadline {
	/// Estimated time left in the current slice.
	fn time_remaining(&self) -> Duration;
}

/// Never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;
impl Deadline for Unbounded {
	fn time_remaining(&self) -> Duration {
		Duration::MAX
	}
}

/// A fixed slice of wall-clock time.
///
/// Not available on `wasm32-unknown-unknown`, where [`Instant::now`] panics. Use [`web_sys::IdleDeadline`] there.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
	end: Instant,
}
impl Budget {
	#[must_use]
	pub fn new(slice: Duration) -> Self {
		Self { end: Instant::now() + slice }
	}
}
impl Deadline for Budget {
	fn time_remaining(&self) -> Duration {
		self.end.saturating_duration_since(Instant::now())
	}
}

impl<D: Deadline + ?Sized> Deadline for &D {
	fn time_remaining(&self) -> Duration {
		(**self).time_remaining()
	}
}
