//! Debug export of the trie as a Graphviz graph.

use std::fmt::Write as _;
use std::path::Path;

use ethereum_verkle_storage::storage_trait::Storage;

use crate::crypto::committer::VectorCommitter;
use crate::verkle_tree::errors::{VerkleTrieError, VerkleTrieResult};
use crate::verkle_tree::node::VerkleNode;
use crate::verkle_tree::trie::VerkleTrie;
use crate::verkle_tree::types::NodeLocation;
use crate::verkle_tree::visitor::NodeVisitor;

#[cfg(test)]
#[path = "dot_test.rs"]
mod dot_test;

fn node_id(location: &NodeLocation) -> String {
    if location.is_empty() { "root".to_string() } else { hex::encode(location.as_slice()) }
}

fn node_label(node: &VerkleNode) -> String {
    match node.hash() {
        Some(hash) => format!("{}\\n{}", node.kind(), &hex::encode(hash.0)[..8]),
        None => node.kind().to_string(),
    }
}

#[derive(Debug, Default)]
struct DotVisitor {
    out: String,
}

impl NodeVisitor for DotVisitor {
    fn visit(&mut self, node: &VerkleNode, location: &NodeLocation) {
        let id = node_id(location);
        let _ = writeln!(self.out, "  \"{id}\" [label=\"{}\"];", node_label(node));
        match node {
            VerkleNode::Root(internal) | VerkleNode::Internal(internal) => {
                for (slot, child) in (0..=u8::MAX).zip(internal.children().iter()) {
                    if !child.is_null() {
                        let child_id = node_id(&location.child(slot));
                        let _ = writeln!(self.out, "  \"{id}\" -> \"{child_id}\";");
                    }
                }
            }
            VerkleNode::Stem(stem_node) => {
                for leaf in stem_node.children().iter() {
                    if let VerkleNode::Leaf(data) = leaf {
                        let child_id = hex::encode(data.key.0);
                        let _ = writeln!(self.out, "  \"{id}\" -> \"{child_id}\";");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Renders the whole trie, forcing stored placeholders along the way.
pub fn to_dot<S: Storage, C: VectorCommitter>(
    trie: &mut VerkleTrie<S, C>,
) -> VerkleTrieResult<String> {
    let mut visitor =
        DotVisitor { out: String::from("digraph verkle_trie {\n  node [shape=box];\n") };
    trie.visit(&mut visitor)?;
    visitor.out.push_str("}\n");
    Ok(visitor.out)
}

/// Writes the rendered graph to `path`, which must end in `.dot` or `.gv`.
pub fn export_dot<S: Storage, C: VectorCommitter>(
    trie: &mut VerkleTrie<S, C>,
    path: &Path,
) -> VerkleTrieResult<()> {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("dot" | "gv") => {}
        _ => return Err(VerkleTrieError::InvalidDotPath(path.to_path_buf())),
    }
    let rendered = to_dot(trie)?;
    std::fs::write(path, rendered)?;
    Ok(())
}
