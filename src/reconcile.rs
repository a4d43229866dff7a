//! Positional (unkeyed) child reconciliation.
//!
//! Old and new children are matched index by index. Reordered children of the same type are *updated in place*
//! rather than moved, which keeps each step O(1) at the cost of identity.

use crate::{
	fiber::{EffectTag, Fiber, FiberId, FiberTree, FiberType},
	node::Node,
};
use tracing::{instrument, trace};

/// Gives `parent` (in `wip`) a fresh child chain for `elements`, diffed against the children of its alternate in `current`.
///
/// Old fibers that don't survive are tagged [`EffectTag::Deletion`] in `current` and appended to `deletions`.
#[instrument(skip(wip, current, deletions, elements), fields(elements = elements.len()))]
pub(crate) fn reconcile_children<H: Clone>(
	wip: &mut FiberTree<H>,
	mut current: Option<&mut FiberTree<H>>,
	deletions: &mut Vec<FiberId>,
	parent: FiberId,
	elements: &[Node],
) {
	let mut old_fiber = match (&current, wip[parent].alternate) {
		(Some(current), Some(alternate)) => current[alternate].child,
		_ => None,
	};
	wip[parent].child = None;

	let mut previous_sibling: Option<FiberId> = None;
	let mut index = 0;
	while index < elements.len() || old_fiber.is_some() {
		let element = elements.get(index);
		let old = match (old_fiber, current.as_deref()) {
			(Some(id), Some(current)) => Some((id, &current[id])),
			_ => None,
		};
		let same_type = match (old, element) {
			(Some((_, old)), Some(element)) => old.ty == FiberType::from(element.ty()),
			_ => false,
		};

		let new_fiber = match (old, element) {
			(Some((old_id, old)), Some(element)) if same_type => {
				let mut fiber = Fiber::for_node(element, parent);
				fiber.host = old.host.clone();
				fiber.alternate = Some(old_id);
				fiber.effect = Some(EffectTag::Update);
				Some(fiber)
			}
			(_, Some(element)) => {
				let mut fiber = Fiber::for_node(element, parent);
				fiber.effect = Some(EffectTag::Placement);
				Some(fiber)
			}
			(_, None) => None,
		};
		let next_old_fiber = old.and_then(|(_, old)| old.sibling);

		if let (Some(old_id), false) = (old_fiber, same_type) {
			if let Some(current) = current.as_deref_mut() {
				trace!(?old_id, ty = ?current[old_id].ty, "Scheduling deletion");
				current[old_id].effect = Some(EffectTag::Deletion);
				deletions.push(old_id);
			}
		}
		old_fiber = next_old_fiber;

		if let Some(new_fiber) = new_fiber {
			trace!(index, ty = ?new_fiber.ty, effect = ?new_fiber.effect, "Reconciled child");
			let new_id = wip.push(new_fiber);
			match previous_sibling {
				None => wip[parent].child = Some(new_id),
				Some(previous) => wip[previous].sibling = Some(new_id),
			}
			previous_sibling = Some(new_id);
		}
		index += 1;
	}
}
