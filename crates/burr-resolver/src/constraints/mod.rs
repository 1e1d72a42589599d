//! Session-wide record of every range declared against each package.

use burr_core::Range;
use indexmap::IndexMap;

/// Index of a `PackageNode` in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Every range required of one package, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    pub name: String,
    required_ranges: Vec<Range>,
}

impl PackageNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required_ranges: Vec::new(),
        }
    }

    pub fn ranges(&self) -> &[Range] {
        &self.required_ranges
    }

    /// Add `range` unless it is already required; returns whether it was new
    fn require(&mut self, range: &Range) -> bool {
        if self.required_ranges.contains(range) {
            return false;
        }
        self.required_ranges.push(range.clone());
        true
    }
}

/// Arena of package nodes, one per name
///
/// Ranges only accumulate, except through `narrow`.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    nodes: IndexMap<String, PackageNode>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `name`, created on first reference, with `range` appended if novel
    pub fn get_or_create(&mut self, name: &str, range: &Range) -> NodeId {
        let entry = self.nodes.entry(name.to_string());
        let index = entry.index();
        entry
            .or_insert_with(|| PackageNode::new(name))
            .require(range);
        NodeId(index)
    }

    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.nodes.get_index_of(name).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Option<&PackageNode> {
        self.nodes.get_index(id.0).map(|(_, node)| node)
    }

    /// Ranges currently required of `name`; empty for unknown names
    pub fn ranges_for(&self, name: &str) -> &[Range] {
        self.nodes.get(name).map(PackageNode::ranges).unwrap_or(&[])
    }

    /// Keep only those of `name`'s ranges that appear in `kept`
    ///
    /// Never introduces a range. Returns whether the node changed.
    pub fn narrow(&mut self, name: &str, kept: &[Range]) -> bool {
        let Some(node) = self.nodes.get_mut(name) else {
            return false;
        };
        let before = node.required_ranges.len();
        node.required_ranges.retain(|range| kept.contains(range));
        node.required_ranges.len() != before
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PackageNode)> {
        self.nodes
            .values()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(expr: &str) -> Range {
        Range::parse(expr).unwrap()
    }

    #[test]
    fn test_get_or_create_accumulates_ranges() {
        let mut registry = ConstraintRegistry::new();
        let first = registry.get_or_create("shared", &range("^1.0.0"));
        let again = registry.get_or_create("shared", &range("^2.0.0"));
        let duplicate = registry.get_or_create("shared", &range("^1.0.0"));

        assert_eq!(first, again);
        assert_eq!(first, duplicate);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.ranges_for("shared"),
            &[range("^1.0.0"), range("^2.0.0")]
        );
    }

    #[test]
    fn test_ids_follow_first_reference() {
        let mut registry = ConstraintRegistry::new();
        let app = registry.get_or_create("app", &Range::any());
        let left = registry.get_or_create("left", &range("^1.0.0"));

        assert_eq!(app.index(), 0);
        assert_eq!(left.index(), 1);
        assert_eq!(registry.id_of("left"), Some(left));
        assert_eq!(registry.node(left).unwrap().name, "left");

        let names: Vec<&str> = registry.iter().map(|(_, node)| node.name.as_str()).collect();
        assert_eq!(names, vec!["app", "left"]);
    }

    #[test]
    fn test_narrow_only_removes() {
        let mut registry = ConstraintRegistry::new();
        registry.get_or_create("shared", &range("^1.0.0"));
        registry.get_or_create("shared", &range("^2.0.0"));

        assert!(registry.narrow("shared", &[range("^2.0.0"), range("^3.0.0")]));
        assert_eq!(registry.ranges_for("shared"), &[range("^2.0.0")]);

        assert!(!registry.narrow("shared", &[range("^2.0.0")]));
        assert!(!registry.narrow("unknown", &[range("^2.0.0")]));
        assert!(registry.ranges_for("unknown").is_empty());
    }
}
