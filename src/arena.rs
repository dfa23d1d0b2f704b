//! Arena-based behavior tree: node model and traversal.
//!
//! Every node lives in a generational arena; the arena `Index` is the node's
//! unique identity. All membership and removal operations key on that index,
//! never on display names, so two leaves named "Success" stay distinguishable.
//! A detached node survives in the arena and can be re-inserted later, which
//! is what a move is.

use generational_arena::{Arena, Index};
use std::fmt;
use termtree::Tree;
use tracing::instrument;

/// Composite tag. Sequence and Selector differ only for the (out-of-scope)
/// execution engine; structurally both are ordered containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Sequence,
    Selector,
}

impl NodeKind {
    pub fn is_composite(self) -> bool {
        !matches!(self, NodeKind::Leaf)
    }
}

/// Data payload of a behavior node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Human-readable display name
    pub name: String,
    /// Stable identifier assigned by the resource file, if any
    pub id: Option<String>,
    /// Leaf or composite tag
    pub kind: NodeKind,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Node in the arena-backed behavior tree.
#[derive(Debug)]
pub struct BehaviorNode {
    pub data: NodeData,
    /// Index of the parent node, None while detached or root
    pub parent: Option<Index>,
    /// Ordered child indices; order is execution order
    pub children: Vec<Index>,
}

/// Arena-backed behavior tree.
///
/// Holds both the attached tree (reachable from `root`) and any detached
/// nodes, e.g. the candidate bank or a node between remove and re-insert.
#[derive(Debug, Default)]
pub struct BehaviorTree {
    arena: Arena<BehaviorNode>,
    root: Option<Index>,
}

impl BehaviorTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Creates a detached leaf and returns its index.
    pub fn add_leaf(&mut self, name: impl Into<String>, id: Option<String>) -> Index {
        self.arena.insert(BehaviorNode {
            data: NodeData {
                name: name.into(),
                id,
                kind: NodeKind::Leaf,
            },
            parent: None,
            children: Vec::new(),
        })
    }

    /// Creates a composite with the given initial children, attaching each of
    /// them. The first composite created becomes the root.
    pub fn add_composite(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        children: Vec<Index>,
    ) -> Index {
        debug_assert!(kind.is_composite());
        let idx = self.arena.insert(BehaviorNode {
            data: NodeData {
                name: name.into(),
                id: None,
                kind,
            },
            parent: None,
            children: children.clone(),
        });
        for child in children {
            if let Some(node) = self.arena.get_mut(child) {
                node.parent = Some(idx);
            }
        }
        if self.root.is_none() {
            self.root = Some(idx);
        }
        idx
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Marks `idx` as the tree root. Builders call this once the outermost
    /// composite exists; nested composites created earlier do not qualify.
    pub fn set_root(&mut self, idx: Index) {
        self.root = Some(idx);
    }

    pub fn get(&self, idx: Index) -> Option<&BehaviorNode> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut BehaviorNode> {
        self.arena.get_mut(idx)
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.arena.contains(idx)
    }

    pub fn name_of(&self, idx: Index) -> Option<&str> {
        self.get(idx).map(|n| n.data.name.as_str())
    }

    /// Position of `child` within `parent`'s child list, keyed on identity.
    pub fn child_position(&self, parent: Index, child: Index) -> Option<usize> {
        self.get(parent)
            .and_then(|p| p.children.iter().position(|&c| c == child))
    }

    /// Pre-order traversal of the whole tree from the root.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    pub fn iter_from(&self, start: Index) -> PreOrderIterator<'_> {
        PreOrderIterator::new(self, Some(start))
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Whether `ancestor` lies on the parent chain above (or at) `node`.
    pub fn is_ancestor(&self, ancestor: Index, node: Index) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.get(idx).and_then(|n| n.parent);
        }
        false
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get(idx) {
                for &child in &node.children {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Display names of all leaves reachable from the root, pre-order.
    pub fn leaf_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.name.clone())
            .collect()
    }

    /// Renders the subtree at `start` for terminal display.
    pub fn to_display_tree(&self, start: Index) -> Tree<String> {
        let label = self.name_of(start).unwrap_or("?").to_string();
        let leaves: Vec<_> = self
            .get(start)
            .map(|node| {
                node.children
                    .iter()
                    .map(|&c| self.to_display_tree(c))
                    .collect()
            })
            .unwrap_or_default();
        Tree::new(label).with_leaves(leaves)
    }
}

/// Lazy pre-order iterator with an explicit stack.
///
/// Restartable (each call to `iter` begins fresh) and bounded only by heap,
/// not call-stack depth. Holds a shared borrow of the tree, so structural
/// mutation during consumption is ruled out by the borrow checker.
pub struct PreOrderIterator<'a> {
    tree: &'a BehaviorTree,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(tree: &'a BehaviorTree, start: Option<Index>) -> Self {
        let mut stack = Vec::new();
        if let Some(idx) = start {
            if tree.contains(idx) {
                stack.push(idx);
            }
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (Index, &'a BehaviorNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
