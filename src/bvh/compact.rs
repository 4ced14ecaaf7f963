//! Shrinking the conservatively allocated build arena.

use crate::bvh::{BvhNode, NodeKind};

/// Removes the unused slots from `arena`, keeping the order of the used nodes, and
/// rewrites the right child index of every inner node to its new position.
///
/// The arena is walked backwards. For every used slot `j`, `skipped_below[j]` records
/// how many unused slots lie behind it. An inner node at old index `j` and new index `i`
/// with right child `r` then has `skipped_below[j] - skipped_below[r]` unused slots
/// between itself and its child, so the child moves to `i + (r - j)` minus that.
pub(crate) fn compact(arena: &[Option<BvhNode>]) -> Vec<BvhNode> {
    let used = arena.iter().filter(|slot| slot.is_some()).count();

    let mut compacted = Vec::with_capacity(used);
    let mut skipped_below = vec![0u32; arena.len()];
    let mut skipped = 0u32;
    let mut new_index = used;

    for (old_index, slot) in arena.iter().enumerate().rev() {
        let mut node = match slot {
            Some(node) => *node,
            None => {
                skipped += 1;
                continue;
            }
        };

        new_index -= 1;
        skipped_below[old_index] = skipped;

        if let NodeKind::Inner { right_child, .. } = node.kind() {
            let right_child = right_child as usize;
            debug_assert!(right_child > old_index && arena[right_child].is_some());
            let skipped_between = skipped - skipped_below[right_child];
            node.set_right_child((new_index + right_child - old_index) as u32 - skipped_between);
        }
        compacted.push(node);
    }

    compacted.reverse();
    compacted
}
