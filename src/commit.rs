//! Applies a finished work-in-progress tree to the host in one uninterrupted pass.

use crate::{
	diff::{remove_listeners, update_props},
	error::{self, Error},
	fiber::{EffectTag, FiberId, FiberTree},
	host::Host,
	runtime::{release_listeners, Runtime},
};
use tracing::{error, info, instrument, trace, trace_span};

/// Effect counts of one commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
	/// Host nodes inserted. Component fibers don't count.
	pub placements: usize,
	/// Host nodes whose properties were diffed.
	pub updates: usize,
	/// Of `updates`, those whose diff turned out empty.
	pub unchanged: usize,
	/// Old-generation fibers (of any kind) whose subtree was removed from its host parent.
	pub deletions: usize,
}

impl<H: Host> Runtime<H> {
	/// Removes deleted subtrees, then walks the work-in-progress tree in preorder to insert and update host nodes,
	/// and finally promotes it to current.
	///
	/// Never yields. Host adapters see all of it between [`Host::begin_commit`] and [`Host::end_commit`].
	#[instrument(skip(self))]
	pub(crate) fn commit_root(&mut self) -> Result<CommitSummary, Error<H::Error>> {
		let mut wip = match self.wip.take() {
			Some(wip) => wip,
			None => return Ok(CommitSummary::default()),
		};
		self.next_unit_of_work = None;
		let deletions = core::mem::take(&mut self.deletions);

		self.host.begin_commit();
		let result = commit_deletions(&mut self.host, self.current.as_ref(), &deletions).and_then(|deleted| {
			let mut summary = commit_work(&mut self.host, &wip, self.current.as_ref())?;
			summary.deletions = deleted;
			Ok(summary)
		});
		self.host.end_commit();

		match result {
			Ok(summary) => {
				wip.promote();
				self.current = Some(wip);
				info!(
					placements = summary.placements,
					updates = summary.updates,
					unchanged = summary.unchanged,
					deletions = summary.deletions,
					"Committed"
				);
				Ok(summary)
			}
			Err(error) => {
				error!(%error, "Commit failed. The host tree may be left partially updated.");
				release_listeners(&mut self.host, &wip);
				Err(error)
			}
		}
	}
}

fn commit_deletions<H: Host>(host: &mut H, current: Option<&FiberTree<H::Handle>>, deletions: &[FiberId]) -> Result<usize, Error<H::Error>> {
	let current = match current {
		Some(current) => current,
		None if deletions.is_empty() => return Ok(0),
		None => {
			error!(count = deletions.len(), "Deletions recorded without a current tree. Skipping them.");
			return Ok(0);
		}
	};

	let mut removed = 0;
	for &deleted in deletions {
		let span = trace_span!("Removing", ?deleted, ty = ?current[deleted].ty);
		let _enter = span.enter();
		debug_assert_eq!(current[deleted].effect, Some(EffectTag::Deletion));

		for id in current.subtree(deleted) {
			if let Some(node) = &current[id].host {
				remove_listeners(host, node, &current[id].props)?;
			}
		}

		let parent = match current.host_parent(deleted) {
			Some(parent) => parent,
			None => {
				error!("Deleted fiber has no host parent. Skipping it.");
				continue;
			}
		};
		commit_deletion(host, current, deleted, parent)?;
		removed += 1;
	}
	Ok(removed)
}

/// Removes the nearest host nodes at or below `id` from `parent`.
fn commit_deletion<H: Host>(host: &mut H, current: &FiberTree<H::Handle>, id: FiberId, parent: &H::Handle) -> Result<(), Error<H::Error>> {
	match &current[id].host {
		Some(node) => {
			trace!(?node, "Removing host node");
			host.remove_child(parent, node).map_err(error::host("remove a child"))
		}
		None => {
			for child in current.children_of(id) {
				commit_deletion(host, current, child, parent)?;
			}
			Ok(())
		}
	}
}

fn commit_work<H: Host>(host: &mut H, wip: &FiberTree<H::Handle>, current: Option<&FiberTree<H::Handle>>) -> Result<CommitSummary, Error<H::Error>> {
	let mut summary = CommitSummary::default();
	for id in wip.descendants() {
		let fiber = &wip[id];
		let node = match &fiber.host {
			Some(node) => node,
			// Components only pass through.
			None => continue,
		};

		match fiber.effect {
			Some(EffectTag::Placement) => {
				let parent = match wip.host_parent(id) {
					Some(parent) => parent,
					None => {
						error!(?id, "Placed fiber has no host parent. Skipping it.");
						continue;
					}
				};
				trace!(?node, ?parent, "Inserting host node");
				host.insert_child(parent, node).map_err(error::host("insert a child"))?;
				summary.placements += 1;
			}
			Some(EffectTag::Update) => {
				let previous = match (current, fiber.alternate) {
					(Some(current), Some(alternate)) => &current[alternate].props,
					_ => {
						error!(?id, "Updated fiber has no alternate. Skipping it.");
						continue;
					}
				};
				if update_props(host, node, previous, &fiber.props)? == 0 {
					summary.unchanged += 1;
				}
				summary.updates += 1;
			}
			// Only old-generation fibers are ever tagged for deletion, and those were handled first.
			Some(EffectTag::Deletion) => error!(?id, "Deletion tag in the work-in-progress tree. Ignoring it."),
			None => (),
		}
	}
	Ok(summary)
}
