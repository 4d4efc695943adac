//! Logical structure tree
//!
//! The tree is stored as an arena. Children are [`NodeId`] indices, so an
//! indirect structure element referenced from two places (or from one of
//! its own descendants) resolves to a single node. Malformed documents can
//! therefore produce a cyclic arena; consumers must track visited nodes.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

use crate::content::mcid_of;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureNode {
    Element {
        /// Structure type, e.g. `Document`, `P`, `Figure`
        tag: String,
        children: Vec<NodeId>,
    },
    /// A marked-content reference. `mcid` is `None` when the reference is
    /// missing or not a valid non-negative integer.
    ContentReference { mcid: Option<u32>, page: Option<u32> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureTree {
    roots: Vec<NodeId>,
    nodes: Vec<StructureNode>,
}

impl StructureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level children of the structure tree root
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&StructureNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn add_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.nodes.push(StructureNode::Element {
            tag: tag.into(),
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn add_content(&mut self, mcid: Option<u32>, page: Option<u32>) -> NodeId {
        self.nodes
            .push(StructureNode::ContentReference { mcid, page });
        self.nodes.len() - 1
    }

    /// Append `child` to an element's children. Ignored when `parent` is
    /// not an element.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(StructureNode::Element { children, .. }) = self.nodes.get_mut(parent) {
            children.push(child);
        }
    }

    pub fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }
}

/// Build the arena from a `/StructTreeRoot` dictionary.
///
/// `page_numbers` maps page object ids to 1-based page numbers so `/Pg`
/// entries can be resolved.
pub(crate) fn parse_structure_tree(
    doc: &Document,
    root: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> StructureTree {
    let mut tree = StructureTree::new();
    let mut seen: HashMap<ObjectId, NodeId> = HashMap::new();

    let Ok(kids) = root.get(b"K") else {
        return tree;
    };

    // (parent, object, inherited page); parent None means a root entry
    let mut work: Vec<(Option<NodeId>, &Object, Option<u32>)> = Vec::new();
    push_kids(&mut work, None, kids, None);

    while let Some((parent, object, inherited_page)) = work.pop() {
        let (id, object) = match object {
            Object::Reference(id) => {
                if let Some(&existing) = seen.get(id) {
                    link(&mut tree, parent, existing);
                    continue;
                }
                match doc.get_object(*id) {
                    Ok(resolved) => (Some(*id), resolved),
                    Err(e) => {
                        tracing::debug!("Dangling structure reference {:?}: {}", id, e);
                        continue;
                    }
                }
            }
            other => (None, other),
        };

        match object {
            Object::Integer(_) => {
                let node = tree.add_content(mcid_of(object), inherited_page);
                link(&mut tree, parent, node);
            }
            Object::Array(items) => {
                // Nested arrays carry no structure of their own
                for item in items.iter().rev() {
                    work.push((parent, item, inherited_page));
                }
            }
            Object::Dictionary(dict) => {
                let page = page_of(dict, page_numbers).or(inherited_page);
                match dict.get(b"Type") {
                    Ok(Object::Name(t)) if t.as_slice() == b"MCR" => {
                        let mcid = dict.get(b"MCID").ok().and_then(mcid_of);
                        let node = tree.add_content(mcid, page);
                        link(&mut tree, parent, node);
                    }
                    Ok(Object::Name(t)) if t.as_slice() == b"OBJR" => {}
                    _ => {
                        let tag = match dict.get(b"S") {
                            Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
                            _ => "Unknown".to_string(),
                        };
                        let node = tree.add_element(tag);
                        if let Some(id) = id {
                            seen.insert(id, node);
                        }
                        link(&mut tree, parent, node);
                        if let Ok(kids) = dict.get(b"K") {
                            push_kids(&mut work, Some(node), kids, page);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    tree
}

fn push_kids<'a>(
    work: &mut Vec<(Option<NodeId>, &'a Object, Option<u32>)>,
    parent: Option<NodeId>,
    kids: &'a Object,
    page: Option<u32>,
) {
    match kids {
        Object::Array(items) => {
            for item in items.iter().rev() {
                work.push((parent, item, page));
            }
        }
        single => work.push((parent, single, page)),
    }
}

fn link(tree: &mut StructureTree, parent: Option<NodeId>, child: NodeId) {
    match parent {
        Some(parent) => tree.attach(parent, child),
        None => tree.add_root(child),
    }
}

fn page_of(dict: &Dictionary, page_numbers: &HashMap<ObjectId, u32>) -> Option<u32> {
    match dict.get(b"Pg") {
        Ok(Object::Reference(id)) => page_numbers.get(id).copied(),
        _ => None,
    }
}
