pub mod aggregate;
pub mod arena;

use std::collections::HashMap;

use self::arena::{NodeId, WeightNode, WeightTree};

/// One weighted leaf, addressed by a `/`-separated path below the root.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEntry {
    pub path: String,
    pub weight: f64,
}

impl WeightedEntry {
    pub fn new(path: impl Into<String>, weight: f64) -> Self {
        Self {
            path: path.into(),
            weight,
        }
    }
}

/// Build a WeightTree from a flat list of weighted paths.
///
/// Missing ancestors are created on the way; inner node values are then
/// replaced by the sum of their leaves. Children keep the order in which
/// their paths first appear.
pub fn build_tree(root_name: &str, entries: &[WeightedEntry]) -> WeightTree {
    let mut tree = WeightTree::new(root_name, 0.0);
    let mut path_map: HashMap<String, NodeId> = HashMap::new();

    for entry in entries {
        let id = ensure_node(&mut tree, &mut path_map, &entry.path);
        if id != tree.root {
            tree.get_mut(id).value = entry.weight;
        }
    }

    aggregate::aggregate_values(&mut tree);

    tracing::debug!(
        "Tree built: {} total nodes, {} direct children of root",
        tree.len(),
        tree.children(tree.root).count()
    );
    tree
}

/// Ensure a node exists at the given path, creating intermediate nodes as needed.
fn ensure_node(tree: &mut WeightTree, path_map: &mut HashMap<String, NodeId>, path: &str) -> NodeId {
    let mut current = tree.root;
    let mut prefix = String::with_capacity(path.len());

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        current = match path_map.get(&prefix) {
            Some(&id) => id,
            None => {
                let id = tree.add_child(current, WeightNode::new(segment, 0.0));
                path_map.insert(prefix.clone(), id);
                id
            }
        };
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_create_missing_ancestors() {
        let tree = build_tree(
            "flare",
            &[
                WeightedEntry::new("analytics/cluster/Agglomerative", 3.0),
                WeightedEntry::new("analytics/cluster/Community", 4.0),
                WeightedEntry::new("analytics/graph/Betweenness", 2.0),
                WeightedEntry::new("data/Converter", 1.0),
            ],
        );
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.get(tree.root).value, 10.0);

        let top: Vec<&str> = tree
            .children(tree.root)
            .map(|id| tree.get(id).name.as_str())
            .collect();
        assert_eq!(top, vec!["analytics", "data"]);

        let analytics = tree.children(tree.root).next().unwrap();
        assert_eq!(tree.get(analytics).value, 9.0);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let tree = build_tree("root", &[WeightedEntry::new("/a//b/", 5.0)]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(tree.root).value, 5.0);
    }
}
