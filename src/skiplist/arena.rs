use std::fmt;

use bytes::Bytes;

use crate::{
    error::{Error, Result},
    options::MAX_BUCKET_CAPACITY,
};

/// Handle of a node inside an [`Arena`]. Ids are 1-based; `NodeId::NULL`
/// marks the end of a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const NULL: NodeId = NodeId(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Node {
    value: Bytes,
    forward: Vec<NodeId>,
}

impl Node {
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Highest level this node is linked on.
    pub fn height(&self) -> usize {
        self.forward.len() - 1
    }

    pub fn next(&self, level: usize) -> NodeId {
        self.forward[level]
    }
}

/// Append-only node pool split in fixed-capacity buckets.
///
/// A bucket never grows past the capacity reserved for it, so slots never
/// move and every issued id resolves to the same node for the arena lifetime.
pub struct Arena {
    buckets: Vec<Vec<Node>>,
    bucket_capacity: usize,
    len: usize,
}

impl Arena {
    /// `bucket_capacity` is clamped to `1..=MAX_BUCKET_CAPACITY`.
    pub fn with_bucket_capacity(bucket_capacity: usize) -> Self {
        let bucket_capacity = bucket_capacity.clamp(1, MAX_BUCKET_CAPACITY);
        Arena {
            buckets: vec![Vec::with_capacity(bucket_capacity)],
            bucket_capacity,
            len: 0,
        }
    }

    /// Number of ids issued so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Stores `value` in a fresh slot with `height + 1` null forward links.
    pub fn allocate(&mut self, value: Bytes, height: usize) -> NodeId {
        if self.buckets.last().map_or(true, |b| b.len() == self.bucket_capacity) {
            self.buckets.push(Vec::with_capacity(self.bucket_capacity));
        }
        let bucket = self.buckets.len() - 1;
        self.buckets[bucket].push(Node {
            value,
            forward: vec![NodeId::NULL; height + 1],
        });
        self.len += 1;
        NodeId(self.len)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        let (bucket, index) = self.locate(id)?;
        Ok(&self.buckets[bucket][index])
    }

    pub fn forward(&self, id: NodeId, level: usize) -> Result<NodeId> {
        let node = self.get(id)?;
        node.forward
            .get(level)
            .copied()
            .ok_or_else(|| level_error(id, level))
    }

    pub fn set_forward(&mut self, id: NodeId, level: usize, target: NodeId) -> Result<()> {
        let (bucket, index) = self.locate(id)?;
        let slot = self.buckets[bucket][index]
            .forward
            .get_mut(level)
            .ok_or_else(|| level_error(id, level))?;
        *slot = target;
        Ok(())
    }

    // Unchecked access for the skip list, which only follows ids it was issued.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        debug_assert!(!id.is_null() && id.0 <= self.len);
        let n = id.0 - 1;
        &self.buckets[n / self.bucket_capacity][n % self.bucket_capacity]
    }

    pub(crate) fn link(&mut self, id: NodeId, level: usize, target: NodeId) {
        debug_assert!(!id.is_null() && id.0 <= self.len);
        let n = id.0 - 1;
        self.buckets[n / self.bucket_capacity][n % self.bucket_capacity].forward[level] = target;
    }

    fn locate(&self, id: NodeId) -> Result<(usize, usize)> {
        if id.is_null() || id.0 > self.len {
            return Err(Error::InvalidHandle(id));
        }
        let n = id.0 - 1;
        Ok((n / self.bucket_capacity, n % self.bucket_capacity))
    }
}

fn level_error(id: NodeId, level: usize) -> Error {
    Error::InvalidArgument(format!("node {} has no level {}", id, level))
}
