mod arena;

use std::{cmp::Ordering, sync::Arc};

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{cmp::Comparator, error::Result, options::Options};

pub use arena::{Arena, Node, NodeId};

/// Ordered set of byte strings.
///
/// Nodes live in an [`Arena`] and link to each other through [`NodeId`]s.
/// Level 0 holds every entry; a node linked on level `L` is linked on all
/// levels below it. Removed nodes are unlinked but their slots are kept.
///
/// Not synchronized: callers serialize mutations themselves.
pub struct SkipList {
    arena: Arena,
    head: NodeId,
    // highest level with at least one entry, 0 when empty
    level: usize,
    len: usize,

    max_height: usize,
    probability: f64,
    comparator: Arc<dyn Comparator>,
    rand: StdRng,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    pub fn new() -> Self {
        Self::build(Options::default())
    }

    pub fn with_options(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: Options) -> Self {
        let mut arena = Arena::with_bucket_capacity(options.bucket_capacity);
        let head = arena.allocate(Bytes::new(), options.max_height - 1);
        SkipList {
            arena,
            head,
            level: 0,
            len: 0,
            max_height: options.max_height,
            probability: options.probability,
            comparator: options.comparator,
            rand: StdRng::seed_from_u64(options.seed),
        }
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest level currently in use.
    pub fn height(&self) -> usize {
        self.level
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Counts successful coin flips before the first failure, capped at
    /// `max_height - 1`.
    pub fn pick_height(&mut self) -> usize {
        let mut height = 0;
        while height < self.max_height - 1 && self.rand.gen_bool(self.probability) {
            height += 1;
        }
        height
    }

    /// Inserts `key`; returns `false` without touching the list when the key
    /// is already present.
    pub fn insert(&mut self, key: impl Into<Bytes>) -> bool {
        let key = key.into();
        let mut update = vec![self.head; self.max_height];
        let next = self.find_predecessors(&key, &mut update);
        if self.is_equal(next, &key) {
            return false;
        }

        let height = self.pick_height();
        if height > self.level {
            debug!(from = self.level, to = height, "raising skip list level");
            self.level = height;
        }

        let id = self.arena.allocate(key, height);
        for (level, &prev) in update.iter().enumerate().take(height + 1) {
            let succ = self.arena.node(prev).next(level);
            self.arena.link(id, level, succ);
            self.arena.link(prev, level, id);
        }
        self.len += 1;
        true
    }

    pub fn find(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        let next = self.find_greater_or_equal(key);
        self.is_equal(next, key)
    }

    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        let mut update = vec![self.head; self.max_height];
        let target = self.find_predecessors(key, &mut update);
        if !self.is_equal(target, key) {
            return false;
        }

        let height = self.arena.node(target).height();
        for (level, &prev) in update.iter().enumerate().take(height + 1) {
            let succ = self.arena.node(target).next(level);
            self.arena.link(prev, level, succ);
        }

        while self.level > 0 && self.arena.node(self.head).next(self.level).is_null() {
            self.level -= 1;
        }
        self.len -= 1;
        true
    }

    /// Collects every key in `[lo, hi]` in ascending order.
    pub fn range_find(&self, lo: impl AsRef<[u8]>, hi: impl AsRef<[u8]>) -> (bool, Vec<Bytes>) {
        let (lo, hi) = (lo.as_ref(), hi.as_ref());
        let mut found = Vec::new();
        if self.comparator.compare(lo, hi) == Ordering::Greater {
            return (false, found);
        }

        let mut iter = self.iter();
        iter.seek(lo);
        while iter.valid() && self.comparator.compare(iter.key(), hi) != Ordering::Greater {
            found.push(iter.key().clone());
            iter.next();
        }
        (!found.is_empty(), found)
    }

    pub fn iter(&self) -> SkipListIter<'_> {
        SkipListIter {
            list: self,
            current: NodeId::NULL,
        }
    }

    // Walks down from the active level, leaving in `update[L]` the last node
    // on level `L` whose key is below `key`. Returns the level-0 successor.
    fn find_predecessors(&self, key: &[u8], update: &mut [NodeId]) -> NodeId {
        let mut current = self.head;
        for level in (0..=self.level).rev() {
            loop {
                let next = self.arena.node(current).next(level);
                if !next.is_null() && self.compare(next, key) == Ordering::Less {
                    current = next;
                } else {
                    break;
                }
            }
            update[level] = current;
        }
        self.arena.node(current).next(0)
    }

    fn find_greater_or_equal(&self, key: &[u8]) -> NodeId {
        let mut current = self.head;
        let mut level = self.level;
        loop {
            let next = self.arena.node(current).next(level);
            if !next.is_null() && self.compare(next, key) == Ordering::Less {
                current = next;
                continue;
            }
            if level == 0 {
                return next;
            }
            level -= 1;
        }
    }

    fn compare(&self, id: NodeId, key: &[u8]) -> Ordering {
        self.comparator.compare(self.arena.node(id).value(), key)
    }

    fn is_equal(&self, id: NodeId, key: &[u8]) -> bool {
        !id.is_null() && self.compare(id, key) == Ordering::Equal
    }
}

pub struct SkipListIter<'a> {
    list: &'a SkipList,
    current: NodeId,
}

impl<'a> SkipListIter<'a> {
    pub fn valid(&self) -> bool {
        !self.current.is_null()
    }

    pub fn seek_to_first(&mut self) {
        self.current = self.list.arena.node(self.list.head).next(0);
    }

    /// Positions at the first key not less than `target`.
    pub fn seek(&mut self, target: &[u8]) {
        self.current = self.list.find_greater_or_equal(target);
    }

    pub fn next(&mut self) {
        assert!(self.valid());
        self.current = self.list.arena.node(self.current).next(0);
    }

    pub fn key(&self) -> &'a Bytes {
        assert!(self.valid());
        self.list.arena.node(self.current).value()
    }
}
