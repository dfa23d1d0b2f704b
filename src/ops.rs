//! Atomic mutation primitives: remove, insert, move.
//!
//! The only sanctioned way to change a tree's structure after construction.
//! All three validate before touching the tree, so a failing call never
//! leaves a half-applied state, and all membership checks key on arena
//! indices, never on names. Indices are never clamped or wrapped.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::arena::BehaviorTree;
use crate::errors::{MutationError, MutationResult};

/// Address of a child slot or insertion gap: a composite with `n` children
/// has `n + 1` valid gaps, `0..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub parent: Index,
    pub index: usize,
}

impl Slot {
    pub fn new(parent: Index, index: usize) -> Self {
        Self { parent, index }
    }
}

fn name_or_stale(tree: &BehaviorTree, idx: Index) -> String {
    tree.name_of(idx).unwrap_or("<stale>").to_string()
}

/// Detaches `node` from `parent`'s children and returns it, now ownerless.
///
/// The node survives in the arena and may be re-inserted elsewhere.
#[instrument(level = "debug", skip(tree))]
pub fn remove(tree: &mut BehaviorTree, node: Index, parent: Index) -> MutationResult<Index> {
    if !tree.contains(node) || !tree.contains(parent) {
        return Err(MutationError::StaleIndex);
    }
    let position = tree
        .child_position(parent, node)
        .ok_or_else(|| MutationError::NodeNotFound {
            node: name_or_stale(tree, node),
            parent: name_or_stale(tree, parent),
        })?;

    if let Some(p) = tree.get_mut(parent) {
        p.children.remove(position);
    }
    if let Some(n) = tree.get_mut(node) {
        n.parent = None;
    }
    debug!(position, "detached node");
    Ok(node)
}

/// Inserts the ownerless `node` into the gap addressed by `slot`.
#[instrument(level = "debug", skip(tree))]
pub fn insert(tree: &mut BehaviorTree, node: Index, slot: Slot) -> MutationResult<()> {
    if !tree.contains(node) || !tree.contains(slot.parent) {
        return Err(MutationError::StaleIndex);
    }
    let parent_node = tree.get(slot.parent).ok_or(MutationError::StaleIndex)?;
    if !parent_node.data.kind.is_composite() {
        return Err(MutationError::NotComposite {
            parent: parent_node.data.name.clone(),
        });
    }
    let len = parent_node.children.len();
    if slot.index > len {
        return Err(MutationError::SlotOutOfRange {
            parent: parent_node.data.name.clone(),
            index: slot.index,
            gaps: len + 1,
        });
    }
    // A node in two places at once would break every traversal; insertion is
    // only legal for detached nodes.
    if tree.get(node).and_then(|n| n.parent).is_some() {
        return Err(MutationError::AlreadyAttached {
            node: name_or_stale(tree, node),
        });
    }
    // A parentless node can still be reachable (the root is), so the parent
    // check alone does not rule out attaching a node beneath itself.
    if tree.is_ancestor(node, slot.parent) {
        return Err(MutationError::WouldCreateCycle {
            node: name_or_stale(tree, node),
        });
    }

    if let Some(p) = tree.get_mut(slot.parent) {
        p.children.insert(slot.index, node);
    }
    if let Some(n) = tree.get_mut(node) {
        n.parent = Some(slot.parent);
    }
    debug!(index = slot.index, "inserted node");
    Ok(())
}

/// Moves `node` to the gap addressed by `slot`: remove from its current
/// parent, then insert.
///
/// `slot.index` is interpreted against the post-removal child list of the
/// destination, which matters when source and destination are the same
/// composite. Both legs are validated up front; a bad slot degrades the whole
/// operation to "no structural change" instead of dropping the node.
#[instrument(level = "debug", skip(tree))]
pub fn move_to(tree: &mut BehaviorTree, node: Index, slot: Slot) -> MutationResult<()> {
    if !tree.contains(node) || !tree.contains(slot.parent) {
        return Err(MutationError::StaleIndex);
    }
    let source = tree
        .get(node)
        .and_then(|n| n.parent)
        .ok_or(MutationError::NodeNotFound {
            node: name_or_stale(tree, node),
            parent: "<detached>".to_string(),
        })?;

    let dest = tree.get(slot.parent).ok_or(MutationError::StaleIndex)?;
    if !dest.data.kind.is_composite() {
        return Err(MutationError::NotComposite {
            parent: dest.data.name.clone(),
        });
    }
    // Re-parenting a node underneath itself would orphan the whole subtree.
    if tree.is_ancestor(node, slot.parent) {
        return Err(MutationError::WouldCreateCycle {
            node: name_or_stale(tree, node),
        });
    }

    // Gap count after the removal leg has run
    let len_after_removal = if source == slot.parent {
        dest.children.len() - 1
    } else {
        dest.children.len()
    };
    if slot.index > len_after_removal {
        return Err(MutationError::SlotOutOfRange {
            parent: dest.data.name.clone(),
            index: slot.index,
            gaps: len_after_removal + 1,
        });
    }

    let detached = remove(tree, node, source)?;
    insert(tree, detached, slot)
}
