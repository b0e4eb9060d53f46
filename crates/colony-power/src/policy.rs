//! Admission policies: which grid a device may join.
//!
//! Grids impose no limits of their own. Whether a device belongs to a grid
//! (wire adjacency, proximity, faction...) is world knowledge, so it is
//! supplied by the caller as an [`AdmissionPolicy`] and evaluated fresh on
//! every query.

use std::collections::{BTreeMap, BTreeSet};

use colony_core::id::DeviceId;

use crate::grid::UtilityGrid;

/// Decides whether `grid` will accept `device`.
pub trait AdmissionPolicy {
    fn admits(&self, grid: &UtilityGrid, device: DeviceId) -> bool;
}

/// Every grid accepts every device. With this policy all devices end up on
/// the first registered grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl AdmissionPolicy for AcceptAll {
    fn admits(&self, _grid: &UtilityGrid, _device: DeviceId) -> bool {
        true
    }
}

impl<F> AdmissionPolicy for F
where
    F: Fn(&UtilityGrid, DeviceId) -> bool,
{
    fn admits(&self, grid: &UtilityGrid, device: DeviceId) -> bool {
        self(grid, device)
    }
}

// ---------------------------------------------------------------------------
// Wire adjacency
// ---------------------------------------------------------------------------

/// Undirected wire links between devices.
///
/// A device is admitted into an empty grid, or into a grid holding at least
/// one device it is directly wired to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringAdjacency {
    links: BTreeMap<DeviceId, BTreeSet<DeviceId>>,
}

impl WiringAdjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire `a` and `b` together. Self-links are ignored.
    pub fn link(&mut self, a: DeviceId, b: DeviceId) {
        if a == b {
            return;
        }
        self.links.entry(a).or_default().insert(b);
        self.links.entry(b).or_default().insert(a);
    }

    /// Cut the wire between `a` and `b`, if any.
    pub fn unlink(&mut self, a: DeviceId, b: DeviceId) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(set) = self.links.get_mut(&from) {
                set.remove(&to);
                if set.is_empty() {
                    self.links.remove(&from);
                }
            }
        }
    }

    /// Remove every wire touching `device`.
    pub fn unlink_all(&mut self, device: DeviceId) {
        let Some(neighbours) = self.links.remove(&device) else {
            return;
        };
        for other in neighbours {
            self.unlink(other, device);
        }
    }

    pub fn is_linked(&self, a: DeviceId, b: DeviceId) -> bool {
        self.links.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Devices directly wired to `device`.
    pub fn neighbours(&self, device: DeviceId) -> impl Iterator<Item = DeviceId> + '_ {
        self.links.get(&device).into_iter().flatten().copied()
    }

    /// Number of wires.
    pub fn link_count(&self) -> usize {
        self.links.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

impl AdmissionPolicy for WiringAdjacency {
    fn admits(&self, grid: &UtilityGrid, device: DeviceId) -> bool {
        grid.is_empty() || grid.members().iter().any(|&m| self.is_linked(device, m))
    }
}
