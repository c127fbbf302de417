//! Deduplicating priority worklist.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

/// Pending evidence ids ordered by rank (lower first), ties in insertion
/// order. An id already pending is not added twice.
#[derive(Debug, Clone, Default)]
pub struct Worklist {
    heap: BinaryHeap<Reverse<(i64, u64, String)>>,
    pending: HashSet<String>,
    next_seq: u64,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` at `rank`. Returns false if it was already pending.
    pub fn push(&mut self, id: &str, rank: i64) -> bool {
        if !self.pending.insert(id.to_string()) {
            return false;
        }
        self.heap.push(Reverse((rank, self.next_seq, id.to_string())));
        self.next_seq += 1;
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        let Reverse((_, _, id)) = self.heap.pop()?;
        self.pending.remove(&id);
        Some(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains(id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending ids in pop order.
    pub fn pending(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.heap.iter().map(|Reverse(e)| e).collect();
        entries.sort();
        entries.into_iter().map(|(_, _, id)| id.as_str()).collect()
    }
}

impl fmt::Display for Worklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.pending().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_lowest_rank_first() {
        let mut w = Worklist::new();
        w.push("rule", 500_000_000);
        w.push("action", 500_000);
        w.push("fact", 500);
        assert_eq!(w.pop().as_deref(), Some("fact"));
        assert_eq!(w.pop().as_deref(), Some("action"));
        assert_eq!(w.pop().as_deref(), Some("rule"));
        assert_eq!(w.pop(), None);
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut w = Worklist::new();
        w.push("b", 1);
        w.push("a", 1);
        w.push("c", 1);
        assert_eq!(w.pending(), vec!["b", "a", "c"]);
        assert_eq!(w.pop().as_deref(), Some("b"));
    }

    #[test]
    fn deduplicates_pending_ids() {
        let mut w = Worklist::new();
        assert!(w.push("f1", 1));
        assert!(!w.push("f1", 2));
        assert_eq!(w.len(), 1);
        assert!(w.contains("f1"));
        w.pop();
        assert!(!w.contains("f1"));
        assert!(w.push("f1", 1));
    }

    #[test]
    fn renders_in_pop_order() {
        let mut w = Worklist::new();
        w.push("r1", 9);
        w.push("f1", 1);
        assert_eq!(w.to_string(), "[f1, r1]");
        assert_eq!(Worklist::new().to_string(), "[]");
    }
}
