use super::arena::{NodeId, WeightTree};

/// Compute aggregated values for all inner nodes (bottom-up).
/// After this, each inner node's `value` equals the sum of its leaves' values.
pub fn aggregate_values(tree: &mut WeightTree) {
    // Children always have higher indices than their parents in the arena,
    // so a reverse sweep sees every child before its parent.
    let len = tree.nodes.len();
    for i in (0..len).rev() {
        let Some(first) = tree.nodes[i].first_child else {
            continue;
        };

        let mut total = 0.0;
        let mut child = Some(first);
        while let Some(child_id) = child {
            total += tree.nodes[child_id.index()].value;
            child = tree.nodes[child_id.index()].next_sibling;
        }
        tree.nodes[i].value = total;
    }
}

/// Sort children of each inner node by value (descending).
/// This re-links the sibling list without moving nodes in the arena.
pub fn sort_children_by_value(tree: &mut WeightTree) {
    let len = tree.nodes.len();
    for i in 0..len {
        let parent = NodeId(i as u32);
        if !tree.has_children(parent) {
            continue;
        }

        let mut children: Vec<NodeId> = tree.children(parent).collect();
        children.sort_by(|a, b| {
            tree.nodes[b.index()]
                .value
                .total_cmp(&tree.nodes[a.index()].value)
        });
        tree.relink_children(parent, &children);
    }
}
