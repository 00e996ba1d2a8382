//! Stored-node payloads: length-prefixed RLP lists.
//!
//! - Root: `[hash, commitment, stem_extensions, child_scalars]`.
//! - Internal: `[commitment, stem_extensions, child_scalars]`.
//! - Stem: `[depth, commitment, left_commitment, right_commitment,
//!   left_scalar, right_scalar, values]`; the full 31-byte stem is the
//!   storage key, so only the depth needs to be stored.
//!
//! `child_scalars` carries one entry per slot, the committed child scalar or
//! an empty string for a null slot. `stem_extensions` lists, for each slot
//! occupied by a stem subtree, the stem bytes past that child's location, so
//! decoding can tell stored stems from stored internals (and rebuild the
//! full stem) without a second read.

use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use bytes::Bytes;
use tracing::error;

use crate::crypto::types::{Commitment, Scalar, COMMITMENT_BYTES, SCALAR_BYTES, VERKLE_NODE_WIDTH};
use crate::verkle_tree::errors::{VerkleTrieError, VerkleTrieResult};
use crate::verkle_tree::node::{
    InternalNode, LeafNode, StemNode, StoredInternalNode, StoredStemNode, VerkleNode,
};
use crate::verkle_tree::types::{
    NodeLocation, Stem, TrieKey, TrieValue, STEM_BYTES, VALUE_BYTES,
};

#[cfg(test)]
#[path = "node_serde_test.rs"]
mod node_serde_test;

/// Deepest location an internal node can occupy.
pub const MAX_INTERNAL_LOCATION: usize = 30;

#[derive(Clone, Debug, Eq, PartialEq, RlpEncodable, RlpDecodable)]
struct StemExtension {
    slot: u8,
    tail: Bytes,
}

#[derive(Clone, Debug, RlpEncodable, RlpDecodable)]
struct RootPayload {
    hash: Bytes,
    commitment: Bytes,
    stem_extensions: Vec<StemExtension>,
    child_scalars: Vec<Bytes>,
}

#[derive(Clone, Debug, RlpEncodable, RlpDecodable)]
struct InternalPayload {
    commitment: Bytes,
    stem_extensions: Vec<StemExtension>,
    child_scalars: Vec<Bytes>,
}

#[derive(Clone, Debug, RlpEncodable, RlpDecodable)]
struct StemPayload {
    depth: u8,
    commitment: Bytes,
    left_commitment: Bytes,
    right_commitment: Bytes,
    left_scalar: Bytes,
    right_scalar: Bytes,
    values: Vec<Bytes>,
}

fn malformed(location: &NodeLocation, reason: impl Into<String>) -> VerkleTrieError {
    let reason = reason.into();
    error!(location = %location, reason = %reason, "malformed stored node");
    VerkleTrieError::MalformedNode { location: location.clone(), reason }
}

fn scalar_from(bytes: &[u8], location: &NodeLocation) -> VerkleTrieResult<Scalar> {
    let bytes: [u8; SCALAR_BYTES] = bytes.try_into().map_err(|_| {
        malformed(location, format!("expected a {SCALAR_BYTES}-byte scalar, got {}", bytes.len()))
    })?;
    Ok(Scalar(bytes))
}

fn commitment_from(bytes: &[u8], location: &NodeLocation) -> VerkleTrieResult<Commitment> {
    Commitment::from_slice(bytes).map_err(|_| {
        malformed(
            location,
            format!("expected a {COMMITMENT_BYTES}-byte commitment, got {}", bytes.len()),
        )
    })
}

/// The full stem of a child slot, when the slot holds a stem subtree.
fn child_stem(child: &VerkleNode) -> Option<&Stem> {
    match child {
        VerkleNode::Stem(node) => Some(node.stem()),
        VerkleNode::StoredStem(stored) => Some(stored.stem()),
        _ => None,
    }
}

pub(crate) fn encode_internal(node: &InternalNode, is_root: bool) -> VerkleTrieResult<Vec<u8>> {
    let child_depth = node.location().len() + 1;
    let mut stem_extensions = Vec::new();
    let mut child_scalars = Vec::with_capacity(VERKLE_NODE_WIDTH);
    for (slot, child) in (0..=u8::MAX).zip(node.children().iter()) {
        if child.is_null() {
            child_scalars.push(Bytes::new());
            continue;
        }
        let hash = child.hash().ok_or_else(|| {
            malformed(node.location(), format!("child {slot} has no committed scalar"))
        })?;
        child_scalars.push(Bytes::copy_from_slice(&hash.0));
        if let Some(stem) = child_stem(child) {
            stem_extensions.push(StemExtension {
                slot,
                tail: Bytes::copy_from_slice(&stem.0[child_depth..]),
            });
        }
    }
    let commitment = Bytes::copy_from_slice(&node.commitment().0);
    let encoded = if is_root {
        alloy_rlp::encode(RootPayload {
            hash: Bytes::copy_from_slice(&node.hash().0),
            commitment,
            stem_extensions,
            child_scalars,
        })
    } else {
        alloy_rlp::encode(InternalPayload { commitment, stem_extensions, child_scalars })
    };
    Ok(encoded)
}

pub(crate) fn encode_stem(node: &StemNode) -> VerkleTrieResult<Vec<u8>> {
    let depth = u8::try_from(node.location().len()).map_err(|_| {
        malformed(node.location(), format!("stem depth {} does not fit", node.location().len()))
    })?;
    let mut values = Vec::with_capacity(VERKLE_NODE_WIDTH);
    for child in node.children().iter() {
        match child {
            VerkleNode::Leaf(leaf) => values.push(Bytes::copy_from_slice(&leaf.value.0)),
            _ => values.push(Bytes::new()),
        }
    }
    Ok(alloy_rlp::encode(StemPayload {
        depth,
        commitment: Bytes::copy_from_slice(&node.commitment().0),
        left_commitment: Bytes::copy_from_slice(&node.left_commitment().0),
        right_commitment: Bytes::copy_from_slice(&node.right_commitment().0),
        left_scalar: Bytes::copy_from_slice(&node.left_scalar().0),
        right_scalar: Bytes::copy_from_slice(&node.right_scalar().0),
        values,
    }))
}

pub(crate) fn decode_root(location: &NodeLocation, bytes: &[u8]) -> VerkleTrieResult<InternalNode> {
    let payload = RootPayload::decode(&mut &bytes[..])
        .map_err(|err| malformed(location, err.to_string()))?;
    let hash = scalar_from(&payload.hash, location)?;
    build_internal(
        location,
        hash,
        &payload.commitment,
        &payload.stem_extensions,
        &payload.child_scalars,
    )
}

pub(crate) fn decode_internal(
    location: &NodeLocation,
    hash: Scalar,
    bytes: &[u8],
) -> VerkleTrieResult<InternalNode> {
    let payload = InternalPayload::decode(&mut &bytes[..])
        .map_err(|err| malformed(location, err.to_string()))?;
    build_internal(location, hash, &payload.commitment, &payload.stem_extensions, &payload.child_scalars)
}

fn build_internal(
    location: &NodeLocation,
    hash: Scalar,
    commitment: &[u8],
    stem_extensions: &[StemExtension],
    child_scalars: &[Bytes],
) -> VerkleTrieResult<InternalNode> {
    let commitment = commitment_from(commitment, location)?;
    if child_scalars.len() != VERKLE_NODE_WIDTH {
        return Err(malformed(
            location,
            format!("expected {VERKLE_NODE_WIDTH} child scalars, got {}", child_scalars.len()),
        ));
    }
    let mut tails: Vec<Option<&Bytes>> = vec![None; VERKLE_NODE_WIDTH];
    for extension in stem_extensions {
        tails[usize::from(extension.slot)] = Some(&extension.tail);
    }

    let mut children = Vec::with_capacity(VERKLE_NODE_WIDTH);
    for (slot, scalar_bytes) in (0..=u8::MAX).zip(child_scalars.iter()) {
        if scalar_bytes.is_empty() {
            if tails[usize::from(slot)].is_some() {
                return Err(malformed(location, format!("stem extension for null slot {slot}")));
            }
            children.push(VerkleNode::Null);
            continue;
        }
        let child_hash = scalar_from(scalar_bytes, location)?;
        let child_location = location.child(slot);
        match tails[usize::from(slot)] {
            Some(tail) => {
                let mut stem_bytes = Vec::with_capacity(STEM_BYTES);
                stem_bytes.extend_from_slice(child_location.as_slice());
                stem_bytes.extend_from_slice(tail);
                let stem = Stem::from_slice(&stem_bytes).ok_or_else(|| {
                    malformed(
                        location,
                        format!("stem extension at slot {slot} yields {} bytes", stem_bytes.len()),
                    )
                })?;
                children.push(VerkleNode::StoredStem(StoredStemNode::new(
                    child_location,
                    stem,
                    Some(child_hash),
                )));
            }
            None => {
                if child_location.len() > MAX_INTERNAL_LOCATION {
                    return Err(malformed(
                        location,
                        format!("slot {slot} holds an internal node below the maximum depth"),
                    ));
                }
                children.push(VerkleNode::StoredInternal(StoredInternalNode::new(
                    child_location,
                    Some(child_hash),
                )));
            }
        }
    }
    let children: Box<[VerkleNode; VERKLE_NODE_WIDTH]> = children
        .into_boxed_slice()
        .try_into()
        .map_err(|_| malformed(location, "child slot count"))?;
    Ok(InternalNode::new(location.clone(), commitment, hash, children, false))
}

pub(crate) fn decode_stem(stem: &Stem, hash: Scalar, bytes: &[u8]) -> VerkleTrieResult<StemNode> {
    let stem_location = NodeLocation::from(stem.0.as_slice());
    let payload = StemPayload::decode(&mut &bytes[..])
        .map_err(|err| malformed(&stem_location, err.to_string()))?;
    let depth = usize::from(payload.depth);
    if depth == 0 || depth > STEM_BYTES {
        return Err(malformed(&stem_location, format!("stem depth {depth} out of range")));
    }
    if payload.values.len() != VERKLE_NODE_WIDTH {
        return Err(malformed(
            &stem_location,
            format!("expected {VERKLE_NODE_WIDTH} values, got {}", payload.values.len()),
        ));
    }
    let location = stem.prefix(depth);

    let mut children = Vec::with_capacity(VERKLE_NODE_WIDTH);
    for (suffix, value) in (0..=u8::MAX).zip(payload.values.iter()) {
        if value.is_empty() {
            children.push(VerkleNode::NullLeaf);
        } else if value.len() == VALUE_BYTES {
            let mut value_bytes = [0; VALUE_BYTES];
            value_bytes.copy_from_slice(value);
            children.push(VerkleNode::Leaf(LeafNode::new(
                TrieKey::from_stem_and_suffix(stem, suffix),
                TrieValue(value_bytes),
            )));
        } else {
            return Err(malformed(
                &stem_location,
                format!("value at suffix {suffix} has {} bytes", value.len()),
            ));
        }
    }
    let children: Box<[VerkleNode; VERKLE_NODE_WIDTH]> = children
        .into_boxed_slice()
        .try_into()
        .map_err(|_| malformed(&stem_location, "leaf slot count"))?;

    Ok(StemNode::new(
        location,
        *stem,
        commitment_from(&payload.commitment, &stem_location)?,
        commitment_from(&payload.left_commitment, &stem_location)?,
        commitment_from(&payload.right_commitment, &stem_location)?,
        scalar_from(&payload.left_scalar, &stem_location)?,
        scalar_from(&payload.right_scalar, &stem_location)?,
        hash,
        children,
        false,
    ))
}

/// Leaves are stored embedded in their stem's payload; a direct leaf read
/// decodes the raw 32-byte value.
pub(crate) fn decode_leaf(location: &NodeLocation, bytes: &[u8]) -> VerkleTrieResult<LeafNode> {
    if bytes.len() != VALUE_BYTES {
        return Err(malformed(location, format!("leaf value has {} bytes", bytes.len())));
    }
    let key = TrieKey::from_slice(location.as_slice())
        .map_err(|_| malformed(location, "leaf location is not a 32-byte key"))?;
    let mut value = [0; VALUE_BYTES];
    value.copy_from_slice(bytes);
    Ok(LeafNode::new(key, TrieValue(value)))
}
