//! Singly-linked list traversal
//!
//! The list may be cyclic, dangling, or corrupt. Traversal is bounded by a node
//! cap and a visited set, and stops at the first address the validator
//! rejects, so it always terminates.

use std::collections::HashSet;

use tracing::debug;

use crate::memory::{AddressValidator, ReadMemory};

/// One visited node with a non-zero identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryNode {
    pub address: u64,
    pub id: u64,
}

/// Why a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StopReason {
    /// The current address failed validation (includes the null terminator)
    #[strum(serialize = "invalid address")]
    InvalidAddress,
    /// The current address was already visited in this pass
    #[strum(serialize = "cycle")]
    Cycle,
    /// The node cap was reached
    #[strum(serialize = "node cap")]
    NodeCap,
    /// The next pointer could not be read
    #[strum(serialize = "read fault")]
    ReadFault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    /// Nodes with a non-zero id, in list order
    pub nodes: Vec<MemoryNode>,
    /// Distinct addresses visited, including nodes with a zero id
    pub visited: usize,
    pub stop: StopReason,
}

pub struct LinkedStructureWalker<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
}

impl<'a, R: ReadMemory + ?Sized> LinkedStructureWalker<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Walk from `head`, collecting nodes whose id field is non-zero.
    pub fn walk(
        &self,
        head: u64,
        next_offset: u64,
        id_offset: u64,
        max_nodes: usize,
        validator: &AddressValidator,
    ) -> Vec<MemoryNode> {
        self.walk_with_stats(head, next_offset, id_offset, max_nodes, validator)
            .nodes
    }

    /// Same traversal as [`Self::walk`], also reporting how it ended.
    pub fn walk_with_stats(
        &self,
        head: u64,
        next_offset: u64,
        id_offset: u64,
        max_nodes: usize,
        validator: &AddressValidator,
    ) -> Walk {
        let mut visited: HashSet<u64> = HashSet::new();
        let mut nodes = Vec::new();
        let mut current = head;

        let stop = loop {
            if !validator.is_valid(current) {
                break StopReason::InvalidAddress;
            }
            if visited.contains(&current) {
                break StopReason::Cycle;
            }
            if visited.len() >= max_nodes {
                break StopReason::NodeCap;
            }
            visited.insert(current);

            // An unreadable id only skips this node
            let id = self
                .reader
                .read_u64(current.wrapping_add(id_offset))
                .unwrap_or(0);
            if id != 0 {
                nodes.push(MemoryNode {
                    address: current,
                    id,
                });
            }

            current = match self.reader.read_u64(current.wrapping_add(next_offset)) {
                Ok(next) => next,
                Err(e) => {
                    debug!("Next pointer unreadable at {:#x}: {}", current, e);
                    break StopReason::ReadFault;
                }
            };
        };

        debug!(
            "Walk from {:#x}: {} visited, {} nodes, stopped on {}",
            head,
            visited.len(),
            nodes.len(),
            stop
        );

        Walk {
            nodes,
            visited: visited.len(),
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};

    const NEXT: u64 = 0x0;
    const ID: u64 = 0x8;
    const NODE_BASE: u64 = 0x1E8_0000_0000;
    const STRIDE: u64 = 0x100;

    fn node_addr(index: u64) -> u64 {
        NODE_BASE + index * STRIDE
    }

    /// Build nodes 0..count; node i links to `links[i]` and has id `ids[i]`.
    fn list(links: &[u64], ids: &[u64]) -> MockMemoryReader {
        let mut builder = MockMemoryBuilder::new();
        for (i, (next, id)) in links.iter().zip(ids).enumerate() {
            let addr = node_addr(i as u64);
            builder = builder.with_u64(addr + NEXT, *next).with_u64(addr + ID, *id);
        }
        builder.build()
    }

    #[test]
    fn test_walks_in_list_order() {
        // 0 -> 2 -> 1 -> null
        let reader = list(&[node_addr(2), 0, node_addr(1)], &[10, 30, 20]);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 100, &AddressValidator::default());
        let ids: Vec<u64> = walk.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(walk.nodes[1].address, node_addr(2));
        assert_eq!(walk.stop, StopReason::InvalidAddress);
    }

    #[test]
    fn test_cycle_terminates_after_distinct_nodes() {
        // 0 -> 1 -> 2 -> 0, cap well above the cycle length
        let reader = list(&[node_addr(1), node_addr(2), node_addr(0)], &[1, 2, 3]);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 50, &AddressValidator::default());
        assert_eq!(walk.visited, 3);
        assert_eq!(walk.nodes.len(), 3);
        assert_eq!(walk.stop, StopReason::Cycle);
    }

    #[test]
    fn test_self_loop() {
        let reader = list(&[node_addr(0)], &[7]);
        let walker = LinkedStructureWalker::new(&reader);

        let nodes = walker.walk(node_addr(0), NEXT, ID, 10, &AddressValidator::default());
        assert_eq!(nodes, vec![MemoryNode { address: node_addr(0), id: 7 }]);
    }

    #[test]
    fn test_node_cap() {
        let links: Vec<u64> = (1..=10).map(node_addr).collect();
        let ids: Vec<u64> = (1..=10).collect();
        let reader = list(&links, &ids);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 4, &AddressValidator::default());
        assert_eq!(walk.visited, 4);
        assert_eq!(walk.nodes.len(), 4);
        assert_eq!(walk.stop, StopReason::NodeCap);
    }

    #[test]
    fn test_stops_at_out_of_range_pointer() {
        // Node 1 points outside the validator's high-bits window
        let reader = list(&[node_addr(1), 0x7FF6_0000_1000, node_addr(0)], &[1, 2, 3]);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 100, &AddressValidator::default());
        assert_eq!(walk.visited, 2);
        assert_eq!(walk.stop, StopReason::InvalidAddress);
    }

    #[test]
    fn test_zero_id_nodes_are_visited_not_emitted() {
        let reader = list(&[node_addr(1), node_addr(2), 0], &[5, 0, 6]);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 100, &AddressValidator::default());
        assert_eq!(walk.visited, 3);
        let ids: Vec<u64> = walk.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_dangling_next_pointer() {
        // Node 0 points at a valid-looking address that is not mapped
        let reader = list(&[node_addr(9)], &[1]);
        let walker = LinkedStructureWalker::new(&reader);

        let walk = walker.walk_with_stats(node_addr(0), NEXT, ID, 100, &AddressValidator::default());
        assert_eq!(walk.nodes.len(), 1);
        assert_eq!(walk.visited, 2);
        assert_eq!(walk.stop, StopReason::ReadFault);
    }

    #[test]
    fn test_invalid_head() {
        let reader = MockMemoryBuilder::new().build();
        let walker = LinkedStructureWalker::new(&reader);

        assert!(walker.walk(0, NEXT, ID, 100, &AddressValidator::default()).is_empty());
        assert!(walker.walk(0x1234, NEXT, ID, 100, &AddressValidator::default()).is_empty());
    }
}
