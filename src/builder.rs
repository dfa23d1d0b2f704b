//! Resource loading: robot resource files into behavior trees.
//!
//! A resource file maps subgoal names to a context paragraph, a behavior
//! library, and the ordered child ids of the subgoal tree. Each subgoal
//! becomes one arena: a root Sequence named after the subgoal, the resolved
//! leaf children attached in order, and the bank candidates kept as detached
//! leaves in the same arena so they can be inserted later without copying.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use generational_arena::Index;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::arena::{BehaviorTree, NodeKind};
use crate::errors::{BuildError, BuildResult};

/// One behavior in a subgoal's library.
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorSpec {
    pub id: String,
    pub name: String,
    /// Whether this behavior is offered as an insertable candidate
    #[serde(default)]
    pub in_behavior_bank: bool,
}

/// One subgoal section of a resource file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubgoalSpec {
    /// Narrative shown before the milestone starts
    #[serde(default)]
    pub context: String,
    /// Ordered child ids of the subgoal tree
    pub children: Vec<String>,
    pub behavior_library: Vec<BehaviorSpec>,
}

/// A built subgoal: its tree plus the insertable candidate bank.
#[derive(Debug)]
pub struct Subgoal {
    pub title: String,
    pub context: String,
    pub tree: BehaviorTree,
    pub root: Index,
    /// Detached leaves flagged `in_behavior_bank`, in library order
    pub bank: Vec<Index>,
}

impl Subgoal {
    /// Top-level child ids, the shape recorded in experiment results.
    pub fn child_ids(&self) -> Vec<String> {
        self.tree
            .get(self.root)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.tree.get(c))
                    .filter_map(|n| n.data.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct TreeBuilder;

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Loads and builds every subgoal from `path`, preserving file order.
    #[instrument(level = "debug", skip(self))]
    pub fn build_from_file(&self, path: &Path) -> BuildResult<Vec<Subgoal>> {
        if !path.exists() {
            return Err(BuildError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        // Keyed map, but insertion order matters for milestone sequence
        let spec: Vec<(String, SubgoalSpec)> =
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content)
                .map_err(|e| BuildError::InvalidFormat {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .into_iter()
                .map(|(title, value)| {
                    serde_json::from_value::<SubgoalSpec>(value)
                        .map(|s| (title.clone(), s))
                        .map_err(|e| BuildError::InvalidFormat {
                            path: path.to_path_buf(),
                            reason: format!("subgoal '{title}': {e}"),
                        })
                })
                .collect::<BuildResult<_>>()?;

        spec.into_iter()
            .map(|(title, subgoal)| self.build_subgoal(title, subgoal))
            .collect()
    }

    /// Builds one subgoal tree and its candidate bank.
    #[instrument(level = "debug", skip(self, spec), fields(subgoal = %title))]
    pub fn build_subgoal(&self, title: String, spec: SubgoalSpec) -> BuildResult<Subgoal> {
        let mut tree = BehaviorTree::new();

        let mut by_id: HashMap<String, Index> = HashMap::new();
        for behavior in &spec.behavior_library {
            let leaf = tree.add_leaf(behavior.name.clone(), Some(behavior.id.clone()));
            if by_id.insert(behavior.id.clone(), leaf).is_some() {
                return Err(BuildError::DuplicateBehavior {
                    subgoal: title,
                    id: behavior.id.clone(),
                });
            }
        }

        let mut children = Vec::with_capacity(spec.children.len());
        for id in &spec.children {
            let leaf = by_id.get(id).copied().ok_or_else(|| BuildError::UnknownBehavior {
                subgoal: title.clone(),
                id: id.clone(),
            })?;
            children.push(leaf);
        }

        let root = tree.add_composite(NodeKind::Sequence, title.clone(), children);
        tree.set_root(root);

        let bank = spec
            .behavior_library
            .iter()
            .filter(|b| b.in_behavior_bank)
            .filter_map(|b| by_id.get(&b.id).copied())
            .collect::<Vec<_>>();

        debug!(
            nodes = tree.node_count(),
            bank = bank.len(),
            "built subgoal tree"
        );

        Ok(Subgoal {
            title,
            context: spec.context,
            tree,
            root,
            bank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(children: &[&str], library: &[(&str, &str, bool)]) -> SubgoalSpec {
        SubgoalSpec {
            context: String::new(),
            children: children.iter().map(|s| s.to_string()).collect(),
            behavior_library: library
                .iter()
                .map(|(id, name, bank)| BehaviorSpec {
                    id: id.to_string(),
                    name: name.to_string(),
                    in_behavior_bank: *bank,
                })
                .collect(),
        }
    }

    #[test]
    fn test_bank_candidates_stay_detached() {
        let subgoal = TreeBuilder::new()
            .build_subgoal(
                "greet".into(),
                spec(
                    &["b1"],
                    &[("b1", "Wave", false), ("b2", "Bow", true)],
                ),
            )
            .unwrap();

        assert_eq!(subgoal.bank.len(), 1);
        let candidate = subgoal.bank[0];
        assert_eq!(subgoal.tree.get(candidate).unwrap().parent, None);
        assert_eq!(subgoal.tree.node_count(), 2); // root + Wave
    }

    #[test]
    fn test_unknown_child_id_is_an_error() {
        let err = TreeBuilder::new()
            .build_subgoal("greet".into(), spec(&["nope"], &[("b1", "Wave", false)]))
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownBehavior { .. }));
    }
}
