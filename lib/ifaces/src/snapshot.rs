use nix::ifaddrs::getifaddrs;
use nix::sys::socket::SockaddrLike;

/// One OS interface as reported by the enumeration pass, before
/// classification. Mirrors the subset of `struct ifaddrs` the classifier
/// reads (section 4.3): name, index, Ethernet address, flags.
///
/// `flags` is mutated in place during a scan pass, per section 5's "shared
/// resource policy": each classification predicate that has fully handled
/// an interface clears its bits so later passes skip it. The clearing is
/// intra-pass only -- a fresh snapshot is taken (and so fully-flagged) on
/// the next scan.
#[derive(Debug, Clone)]
pub struct IfaceSnapshot {
    pub name: String,
    pub index: u32,
    pub hatype: u16,
    pub lladdr: Vec<u8>,
    pub flags: u32,
}

/// Enumerates OS interfaces the way `getifaddrs(3)` does, keeping only the
/// `AF_PACKET` entries (the ones carrying a link-layer address) since those
/// are the only ones the classifier inspects.
pub fn enumerate_interfaces() -> nix::Result<Vec<IfaceSnapshot>> {
    let addrs = getifaddrs()?;
    let mut seen = std::collections::HashSet::new();
    let mut snapshots = Vec::new();

    for addr in addrs {
        let Some(link) = addr.address.as_ref().and_then(|a| a.as_link_addr()) else {
            continue;
        };
        if !seen.insert(addr.interface_name.clone()) {
            continue;
        }
        let index = nix::net::if_::if_nametoindex(addr.interface_name.as_str()).unwrap_or(0);
        snapshots.push(IfaceSnapshot {
            name: addr.interface_name,
            index,
            hatype: 1, // ARPHRD_ETHER; nix's LinkAddr does not expose sll_hatype directly.
            lladdr: link.addr().map(|mac| mac.to_vec()).unwrap_or_default(),
            flags: addr.flags.bits() as u32,
        });
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_carries_the_fields_the_classifier_needs() {
        let snap = IfaceSnapshot {
            name: "eth0".into(),
            index: 2,
            hatype: 1,
            lladdr: vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            flags: 0x1002,
        };
        assert_eq!(snap.lladdr.len(), 6);
        assert_eq!(snap.name, "eth0");
    }
}
