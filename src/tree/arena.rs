use compact_str::CompactString;

use crate::geometry::Polygon;

/// Index into the arena `Vec<WeightNode>`. Uses u32 to save memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single node of the hierarchy, stored in a flat arena.
/// Uses sibling-list representation: each node has `first_child` and `next_sibling`.
#[derive(Debug, Clone)]
pub struct WeightNode {
    pub name: CompactString,
    /// Leaf weight. For inner nodes either caller-provided or aggregated
    /// from the children.
    pub value: f64,
    /// Cell assigned by the treemap layout (None until laid out)
    pub polygon: Option<Polygon>,
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    /// Next sibling node index (None if last child)
    pub next_sibling: Option<NodeId>,
    /// Depth in the tree (root = 0)
    pub depth: u16,
}

impl WeightNode {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: CompactString::new(name),
            value,
            polygon: None,
            parent: None,
            first_child: None,
            next_sibling: None,
            depth: 0,
        }
    }
}

/// The hierarchy stored as a flat arena of nodes.
#[derive(Debug, Clone)]
pub struct WeightTree {
    pub nodes: Vec<WeightNode>,
    pub root: NodeId,
    /// Last child of each node, for O(1) appends.
    last_child: Vec<Option<NodeId>>,
}

impl WeightTree {
    /// Create a tree holding only a root node.
    pub fn new(root_name: &str, root_value: f64) -> Self {
        WeightTree {
            nodes: vec![WeightNode::new(root_name, root_value)],
            root: NodeId(0),
            last_child: vec![None],
        }
    }

    /// Append a child under the given parent, after its existing children.
    pub fn add_child(&mut self, parent: NodeId, mut node: WeightNode) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.depth = self.nodes[parent.index()].depth + 1;
        node.first_child = None;
        node.next_sibling = None;

        match self.last_child[parent.index()] {
            Some(last) => self.nodes[last.index()].next_sibling = Some(new_id),
            None => self.nodes[parent.index()].first_child = Some(new_id),
        }
        self.last_child[parent.index()] = Some(new_id);

        self.nodes.push(node);
        self.last_child.push(None);
        new_id
    }

    pub fn get(&self, id: NodeId) -> &WeightNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut WeightNode {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (only root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.nodes[id.index()].first_child.is_some()
    }

    /// Iterate over children of a node, in insertion order.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            current: self.nodes[parent.index()].first_child,
        }
    }

    /// Iterate over all node ids in arena order (parents before children).
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn clear_polygons(&mut self) {
        for node in &mut self.nodes {
            node.polygon = None;
        }
    }

    /// Replace a node's child list. `children` must be a permutation of the
    /// node's current children.
    pub(crate) fn relink_children(&mut self, parent: NodeId, children: &[NodeId]) {
        let Some((&first, rest)) = children.split_first() else {
            return;
        };
        self.nodes[parent.index()].first_child = Some(first);
        let mut prev = first;
        for &id in rest {
            self.nodes[prev.index()].next_sibling = Some(id);
            prev = id;
        }
        self.nodes[prev.index()].next_sibling = None;
        self.last_child[parent.index()] = Some(prev);
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    tree: &'a WeightTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id.index()].next_sibling;
        Some(id)
    }
}
