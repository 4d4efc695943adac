// Tagging structure validation over the document's structure tree
use std::collections::HashSet;

use shared_pdf::{NodeId, StructureNode, StructureTree};
use tracing::debug;

pub const MISSING_STRUCT_TREE: &str = "Missing /StructTreeRoot: PDF is not tagged.";
pub const EMPTY_STRUCT_TREE: &str = "StructTreeRoot exists but contains no child elements.";

/// An element whose children are still being walked
struct Frame<'a> {
    path: String,
    children: &'a [NodeId],
    next: usize,
    has_mcid: bool,
}

/// Validates the tagging structure. The findings apply to the whole
/// document, so callers record them against every page.
///
/// Findings come out in depth-first order, with an element's "no MCID"
/// finding after everything reported for its descendants. An element
/// reachable twice (shared or cyclic) is only walked the first time.
pub fn check_structure_tree(tree: Option<&StructureTree>) -> Vec<String> {
    let Some(tree) = tree else {
        return vec![MISSING_STRUCT_TREE.to_string()];
    };
    if tree.is_empty() {
        return vec![EMPTY_STRUCT_TREE.to_string()];
    }

    let mut issues = Vec::new();
    let mut visited = HashSet::new();

    for (index, &root) in tree.roots().iter().enumerate() {
        let Some(StructureNode::Element { tag, children }) = tree.node(root) else {
            continue;
        };
        if !visited.insert(root) {
            continue;
        }
        let path = format!("Tag[{}]({})", index, tag);
        if children.is_empty() {
            issues.push(no_children(&path));
            continue;
        }

        let mut stack = vec![Frame {
            path,
            children,
            next: 0,
            has_mcid: false,
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let Some(&child) = frame.children.get(frame.next) else {
                if let Some(done) = stack.pop() {
                    if !done.has_mcid {
                        issues.push(format!("{}: contains no MCID references.", done.path));
                    }
                }
                continue;
            };
            frame.next += 1;

            let descend = match tree.node(child) {
                Some(StructureNode::ContentReference { mcid, .. }) => {
                    frame.has_mcid = true;
                    if mcid.is_none() {
                        issues.push(format!("{}: contains invalid MCID.", frame.path));
                    }
                    None
                }
                Some(StructureNode::Element { tag, children }) => {
                    let path = format!("{}.{}", frame.path, tag);
                    if !visited.insert(child) {
                        debug!("Skipping already visited structure element {}", path);
                        None
                    } else if children.is_empty() {
                        issues.push(no_children(&path));
                        None
                    } else {
                        Some(Frame {
                            path,
                            children,
                            next: 0,
                            has_mcid: false,
                        })
                    }
                }
                None => None,
            };

            if let Some(frame) = descend {
                stack.push(frame);
            }
        }
    }

    issues
}

fn no_children(path: &str) -> String {
    format!("{}: has no children (possibly untagged content).", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_tree() {
        assert_eq!(check_structure_tree(None), vec![MISSING_STRUCT_TREE.to_string()]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = StructureTree::new();
        assert_eq!(
            check_structure_tree(Some(&tree)),
            vec![EMPTY_STRUCT_TREE.to_string()]
        );
    }

    #[test]
    fn test_well_formed_tree_is_clean() {
        let mut tree = StructureTree::new();
        let doc = tree.add_element("Document");
        let p = tree.add_element("P");
        let mcr = tree.add_content(Some(0), Some(1));
        tree.attach(p, mcr);
        let h = tree.add_element("H1");
        let mcr2 = tree.add_content(Some(1), Some(1));
        tree.attach(h, mcr2);
        tree.attach(doc, h);
        tree.attach(doc, p);
        let own = tree.add_content(Some(2), Some(1));
        tree.attach(doc, own);
        tree.add_root(doc);

        assert!(check_structure_tree(Some(&tree)).is_empty());
    }

    #[test]
    fn test_findings_in_depth_first_order() {
        let mut tree = StructureTree::new();
        let doc = tree.add_element("Document");
        let sect = tree.add_element("Sect");
        let empty = tree.add_element("Figure");
        let bad = tree.add_content(None, Some(1));
        tree.attach(sect, empty);
        tree.attach(sect, bad);
        tree.attach(doc, sect);
        tree.add_root(doc);

        assert_eq!(
            check_structure_tree(Some(&tree)),
            vec![
                "Tag[0](Document).Sect.Figure: has no children (possibly untagged content)."
                    .to_string(),
                "Tag[0](Document).Sect: contains invalid MCID.".to_string(),
                "Tag[0](Document): contains no MCID references.".to_string(),
            ]
        );
    }

    #[test]
    fn test_childless_root() {
        let mut tree = StructureTree::new();
        let first = tree.add_element("Document");
        let mcr = tree.add_content(Some(0), Some(1));
        tree.attach(first, mcr);
        let second = tree.add_element("Art");
        tree.add_root(first);
        tree.add_root(second);

        assert_eq!(
            check_structure_tree(Some(&tree)),
            vec!["Tag[1](Art): has no children (possibly untagged content).".to_string()]
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let mut tree = StructureTree::new();
        let a = tree.add_element("Div");
        let b = tree.add_element("Span");
        tree.attach(a, b);
        tree.attach(b, a);
        let mcr = tree.add_content(Some(3), Some(1));
        tree.attach(b, mcr);
        tree.add_root(a);

        assert_eq!(
            check_structure_tree(Some(&tree)),
            vec!["Tag[0](Div): contains no MCID references.".to_string()]
        );
    }
}
