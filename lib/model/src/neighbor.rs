use std::collections::HashMap;

use marshal::NodeRef;
use wire::time::timestamp_secs;

use crate::port::Port;

/// A remote port attached to a local `Hardware`, keyed by the remote
/// chassis identifier. Invariant: at most one neighbor per (hardware,
/// chassis-id) pair; entries past their TTL are pruned by `sweep_expired`.
pub struct NeighborPort {
    pub chassis: NodeRef,
    pub port: Port,
    pub last_seen: u64,
    pub ttl_secs: u64,
}

impl NeighborPort {
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.last_seen) > self.ttl_secs
    }
}

/// Per-Hardware neighbor table, keyed by the raw chassis identifier bytes of
/// the announcing station so a refresh replaces rather than duplicates an
/// existing entry.
#[derive(Default)]
pub struct NeighborTable {
    by_chassis_id: HashMap<Vec<u8>, NeighborPort>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a neighbor. Returns the replaced entry, if any.
    pub fn upsert(&mut self, chassis_id: Vec<u8>, neighbor: NeighborPort) -> Option<NeighborPort> {
        self.by_chassis_id.insert(chassis_id, neighbor)
    }

    pub fn touch(&mut self, chassis_id: &[u8]) {
        if let Some(entry) = self.by_chassis_id.get_mut(chassis_id) {
            entry.last_seen = timestamp_secs();
        }
    }

    pub fn sweep_expired(&mut self) {
        let now = timestamp_secs();
        self.by_chassis_id.retain(|_, neighbor| !neighbor.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.by_chassis_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chassis_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &NeighborPort)> {
        self.by_chassis_id.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chassis::Chassis;
    use crate::port::PortIdSubtype;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn neighbor(last_seen: u64, ttl_secs: u64) -> NeighborPort {
        NeighborPort {
            chassis: Rc::new(RefCell::new(Chassis::new_local("remote", ""))),
            port: Port::new(PortIdSubtype::MacAddress, vec![1, 2, 3], "remote-port"),
            last_seen,
            ttl_secs,
        }
    }

    #[test]
    fn upsert_replaces_existing_entry_for_same_chassis_id() {
        let mut table = NeighborTable::new();
        let id = vec![0xaa, 0xbb];
        assert!(table.upsert(id.clone(), neighbor(0, 120)).is_none());
        let replaced = table.upsert(id, neighbor(10, 120));
        assert!(replaced.is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn sweep_expired_removes_only_stale_entries() {
        let mut table = NeighborTable::new();
        table.upsert(vec![1], neighbor(0, 0));
        table.upsert(vec![2], neighbor(timestamp_secs(), 3600));
        table.sweep_expired();
        assert_eq!(table.len(), 1);
        assert!(table.iter().next().unwrap().0 == &vec![2]);
    }
}
