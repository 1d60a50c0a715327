//! Deterministic free-port selection.
//!
//! Allocation scans adapter-major, port-minor over a bounded search
//! space and picks the first address that is neither occupied on the
//! controller nor excluded by an earlier failed attempt. The scan is a
//! pure function of its inputs, so identical snapshots always yield
//! identical picks and repair runs stay reproducible.

use std::collections::BTreeSet;

use crate::model::PortAddress;

/// Bounded port region to scan before falling back to extension.
///
/// The defaults cover the common emulator shapes: multi-adapter routers
/// and single-adapter switches both fit inside four adapters of eight
/// ports. Nodes with bigger real estate are handled by the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSpace {
    pub adapters: u32,
    pub ports_per_adapter: u32,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            adapters: 4,
            ports_per_adapter: 8,
        }
    }
}

/// A selected port, tagged with how it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Found inside the bounded search space.
    InRange(PortAddress),
    /// Search space exhausted; extended past the highest used port.
    /// Callers log this as a degraded allocation.
    Extended(PortAddress),
}

impl Allocation {
    pub fn addr(&self) -> PortAddress {
        match self {
            Self::InRange(addr) | Self::Extended(addr) => *addr,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Extended(_))
    }
}

/// Free-port scanner for one node within one repair action.
///
/// Exclusions accumulate across retry attempts: when the controller
/// rejects a candidate port, the caller excludes it and the next scan
/// moves past it even if the re-fetched occupancy still shows it free.
#[derive(Debug, Clone)]
pub struct PortAllocator {
    space: SearchSpace,
    excluded: BTreeSet<PortAddress>,
}

impl PortAllocator {
    pub fn new(space: SearchSpace) -> Self {
        Self {
            space,
            excluded: BTreeSet::new(),
        }
    }

    /// Mark an address as unusable for the rest of this action.
    pub fn exclude(&mut self, addr: PortAddress) {
        self.excluded.insert(addr);
    }

    /// Pick the first usable address given current occupancy.
    ///
    /// Returns `None` only when even the extension fallback cannot
    /// produce a fresh address (port index saturation).
    pub fn next_free(&self, occupied: &BTreeSet<PortAddress>) -> Option<Allocation> {
        for adapter in 0..self.space.adapters {
            for port in 0..self.space.ports_per_adapter {
                let candidate = PortAddress::new(adapter, port);
                if !occupied.contains(&candidate) && !self.excluded.contains(&candidate) {
                    return Some(Allocation::InRange(candidate));
                }
            }
        }

        // Bounded region exhausted: extend on adapter 0 just past the
        // highest port index seen anywhere on the node. The extension
        // can never collide, because a colliding address would itself
        // have raised the maximum.
        let max_used = occupied
            .iter()
            .chain(self.excluded.iter())
            .map(|addr| addr.port)
            .max();
        let port = match max_used {
            Some(max) => max.checked_add(1)?,
            None => 0,
        };
        Some(Allocation::Extended(PortAddress::new(0, port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(addrs: &[(u32, u32)]) -> BTreeSet<PortAddress> {
        addrs.iter().map(|&(a, p)| PortAddress::new(a, p)).collect()
    }

    #[test]
    fn picks_lowest_gap_row_major() {
        let alloc = PortAllocator::new(SearchSpace::default());
        let got = alloc.next_free(&occ(&[(0, 0), (0, 2)])).expect("free port");
        assert_eq!(got, Allocation::InRange(PortAddress::new(0, 1)));
    }

    #[test]
    fn moves_to_next_adapter_when_first_is_full() {
        let space = SearchSpace {
            adapters: 2,
            ports_per_adapter: 2,
        };
        let alloc = PortAllocator::new(space);
        let got = alloc.next_free(&occ(&[(0, 0), (0, 1)])).expect("free port");
        assert_eq!(got, Allocation::InRange(PortAddress::new(1, 0)));
    }

    #[test]
    fn exhaustion_extends_past_highest_used_port() {
        let space = SearchSpace {
            adapters: 1,
            ports_per_adapter: 4,
        };
        let alloc = PortAllocator::new(space);
        let got = alloc
            .next_free(&occ(&[(0, 0), (0, 1), (0, 2), (0, 3)]))
            .expect("fallback");
        assert_eq!(got, Allocation::Extended(PortAddress::new(0, 4)));
        assert!(got.is_degraded());
    }

    #[test]
    fn exclusions_advance_the_scan() {
        let mut alloc = PortAllocator::new(SearchSpace::default());
        let occupied = occ(&[(0, 0)]);

        let first = alloc.next_free(&occupied).expect("free port");
        assert_eq!(first.addr(), PortAddress::new(0, 1));

        // Controller rejected 0/1; the rescan must not re-offer it.
        alloc.exclude(first.addr());
        let second = alloc.next_free(&occupied).expect("free port");
        assert_eq!(second.addr(), PortAddress::new(0, 2));
    }

    #[test]
    fn exclusions_count_toward_the_extension_base() {
        let space = SearchSpace {
            adapters: 1,
            ports_per_adapter: 1,
        };
        let mut alloc = PortAllocator::new(space);
        alloc.exclude(PortAddress::new(0, 0));
        // Extension must clear both occupied and excluded indices.
        alloc.exclude(PortAddress::new(0, 5));
        let got = alloc.next_free(&occ(&[(0, 1)])).expect("fallback");
        assert_eq!(got, Allocation::Extended(PortAddress::new(0, 6)));
    }

    #[test]
    fn empty_node_in_zero_space_extends_to_port_zero() {
        let space = SearchSpace {
            adapters: 0,
            ports_per_adapter: 0,
        };
        let alloc = PortAllocator::new(space);
        let got = alloc.next_free(&BTreeSet::new()).expect("fallback");
        assert_eq!(got, Allocation::Extended(PortAddress::new(0, 0)));
    }

    #[test]
    fn same_inputs_same_answer() {
        let alloc = PortAllocator::new(SearchSpace::default());
        let occupied = occ(&[(0, 0), (1, 3), (0, 2)]);
        let first = alloc.next_free(&occupied);
        let second = alloc.next_free(&occupied);
        assert_eq!(first, second);
    }
}
