//! Frontier scan — finds the branches no call has resolved yet.

use std::fmt;

use super::model::{DecisionTree, Node};

/// Ordered labels from the root down to a frontier node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierPath(pub Vec<String>);

impl fmt::Display for FrontierPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Depth-first list of every path ending in an unresolved node.
pub fn find_frontier_paths(tree: &DecisionTree) -> Vec<FrontierPath> {
    let mut paths = Vec::new();
    let mut prefix = Vec::new();
    walk(tree, &mut prefix, &mut paths);
    paths
}

fn walk(tree: &DecisionTree, prefix: &mut Vec<String>, out: &mut Vec<FrontierPath>) {
    for (key, node) in tree.iter() {
        prefix.push(key.to_string());
        match node {
            Node::Unresolved => out.push(FrontierPath(prefix.clone())),
            Node::Branch(child) => walk(child, prefix, out),
            Node::Resolved(_) => {}
        }
        prefix.pop();
    }
}

impl DecisionTree {
    /// True if at least one branch is still unresolved.
    pub fn has_frontier(&self) -> bool {
        self.iter().any(|(_, node)| match node {
            Node::Unresolved => true,
            Node::Branch(child) => child.has_frontier(),
            Node::Resolved(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(tree: &str) -> Vec<Vec<String>> {
        let tree = DecisionTree::parse(tree).unwrap();
        find_frontier_paths(&tree).into_iter().map(|p| p.0).collect()
    }

    #[test]
    fn billing_scenario_reports_single_path() {
        let found = paths(r#"{"Asked about billing": {"Yes": "Unresolved", "No": "Transferred"}}"#);
        assert_eq!(found, vec![vec!["Asked about billing".to_string(), "Yes".to_string()]]);
    }

    #[test]
    fn fully_resolved_tree_has_no_frontier() {
        let tree = DecisionTree::parse(
            r#"{"Greeting": {"Yes": {"Confirm": "Booked"}, "No": "Goodbye"}, "Notes": [1, 2]}"#,
        )
        .unwrap();
        assert!(find_frontier_paths(&tree).is_empty());
        assert!(!tree.has_frontier());
    }

    #[test]
    fn empty_tree_has_no_frontier() {
        assert!(find_frontier_paths(&DecisionTree::new()).is_empty());
        assert!(!DecisionTree::new().has_frontier());
    }

    #[test]
    fn paths_follow_depth_first_insertion_order() {
        let found = paths(
            r#"{
                "A": {"A1": "Unknown", "A2": {"A2a": "Unknown"}},
                "B": "Unknown",
                "C": {"C1": "done"}
            }"#,
        );
        assert_eq!(
            found,
            vec![
                vec!["A".to_string(), "A1".to_string()],
                vec!["A".to_string(), "A2".to_string(), "A2a".to_string()],
                vec!["B".to_string()],
            ]
        );
    }

    #[test]
    fn has_frontier_agrees_with_scan() {
        for raw in [
            r#"{}"#,
            r#"{"a": "Unknown"}"#,
            r#"{"a": {"b": {"c": "Unknown"}}}"#,
            r#"{"a": {"b": {"c": "x"}}}"#,
            r#"{"a": ["Unknown"]}"#,
        ] {
            let tree = DecisionTree::parse(raw).unwrap();
            assert_eq!(
                tree.has_frontier(),
                !find_frontier_paths(&tree).is_empty(),
                "mismatch for {raw}"
            );
        }
    }

    #[test]
    fn unresolved_inside_opaque_leaf_is_not_frontier() {
        // Arrays are opaque outcomes, not decisions.
        assert!(paths(r#"{"a": ["Unknown"]}"#).is_empty());
    }

    #[test]
    fn display_joins_labels() {
        let path = FrontierPath(vec!["Q1".into(), "Yes".into()]);
        assert_eq!(path.to_string(), "Q1 -> Yes");
    }
}
