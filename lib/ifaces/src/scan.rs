use std::collections::HashMap;

use model::{AutonegCaps, Hardware, HardwareKind, Port, PortIdSubtype, Vlan};

use crate::bonding;
use crate::classify::{self, Classification};
use crate::error::ClassifyResult;
use crate::mau;
use crate::mtu;
use crate::snapshot::IfaceSnapshot;

/// Per-interface facts the classifier and its helpers contribute, gathered
/// in [`scan`] and fed to the pure [`build_hardware`] below. Kept as a
/// struct (rather than threading five maps around) once assembled.
pub struct ScanInputs {
    pub classifications: HashMap<String, Classification>,
    pub permanent_macs: HashMap<String, [u8; 6]>,
    pub mau_info: HashMap<String, (AutonegCaps, AutonegCaps, bool)>,
    pub mtus: HashMap<String, u32>,
}

/// Runs one full discovery scan (section 4.3): classifies every snapshot,
/// resolves bond slaves' permanent MACs and MAU info, then builds the
/// `Hardware` set. Fully wired to the monitor and the kernel; see
/// [`build_hardware`] for the pure, independently-testable composition step.
pub fn scan(
    priv_client: &mut privsep::PrivClient,
    snapshots: &[IfaceSnapshot],
) -> ClassifyResult<Vec<Hardware>> {
    let mut classifications = HashMap::new();
    let mut bond_masters = Vec::new();

    for snap in snapshots {
        let classification = classify::classify(priv_client, &snap.name, &bond_masters)?;
        if classification == Classification::BondMaster {
            bond_masters.push(snap.name.clone());
        }
        classifications.insert(snap.name.clone(), classification);
    }
    // A second pass is needed because a slave interface enumerated before
    // its master won't see the master in `bond_masters` on the first pass.
    for snap in snapshots {
        if !matches!(classifications.get(&snap.name), Some(Classification::Physical)) {
            continue;
        }
        let reclassified = classify::classify(priv_client, &snap.name, &bond_masters)?;
        classifications.insert(snap.name.clone(), reclassified);
    }

    let mut permanent_macs = HashMap::new();
    let mut mau_info = HashMap::new();
    let mut mtus = HashMap::new();

    for snap in snapshots {
        if let Some(Classification::BondSlave { master, .. }) = classifications.get(&snap.name) {
            if let Some(mac) = bonding::resolve_permanent_mac(priv_client, master, &snap.name)? {
                permanent_macs.insert(snap.name.clone(), mac);
            }
        }
        if matches!(
            classifications.get(&snap.name),
            Some(Classification::Physical) | Some(Classification::BondSlave { .. })
        ) {
            if let Ok(cmd) = priv_client.ethtool(&snap.name) {
                mau_info.insert(snap.name.clone(), mau::from_ethtool(&cmd));
            }
            mtus.insert(snap.name.clone(), mtu::query_mtu(&snap.name));
        }
    }

    let inputs = ScanInputs { classifications, permanent_macs, mau_info, mtus };
    Ok(build_hardware(snapshots, &inputs))
}

/// Pure composition step: turns classified snapshots into the `Hardware`
/// set to announce on. Kept free of syscalls so the end-to-end scenarios in
/// section 8 can be exercised with literal inputs.
pub fn build_hardware(snapshots: &[IfaceSnapshot], inputs: &ScanInputs) -> Vec<Hardware> {
    let index_by_name: HashMap<&str, u32> =
        snapshots.iter().map(|s| (s.name.as_str(), s.index)).collect();

    let mut hardware = Vec::new();

    for snap in snapshots {
        let classification = match inputs.classifications.get(&snap.name) {
            Some(c) => c,
            None => continue,
        };
        if !classify::passes_minimal_checks(snap.hatype, snap.lladdr.len(), snap.flags, classification)
        {
            continue;
        }

        let (kind, lladdr, aggregation_id) = match classification {
            Classification::Physical => {
                (HardwareKind::Ethernet, lladdr_array(&snap.lladdr), 0)
            }
            Classification::BondSlave { master, active } => {
                let permanent = inputs.permanent_macs.get(&snap.name).copied();
                let lladdr = permanent.unwrap_or_else(|| lladdr_array(&snap.lladdr));
                let master_ifindex = index_by_name.get(master.as_str()).copied().unwrap_or(0);
                (
                    HardwareKind::BondSlave {
                        master_name: master.clone(),
                        master_ifindex,
                        active: *active,
                    },
                    lladdr,
                    master_ifindex,
                )
            }
            _ => continue,
        };

        let (mau_supported, mau_advertised, autoneg_enabled) = inputs
            .mau_info
            .get(&snap.name)
            .copied()
            .unwrap_or((AutonegCaps::empty(), AutonegCaps::empty(), false));
        let mtu = inputs.mtus.get(&snap.name).copied().unwrap_or(1500);

        let mut port = Port::new(PortIdSubtype::MacAddress, lladdr.to_vec(), snap.name.clone());
        port.aggregation_id = aggregation_id;
        port.mau_supported = mau_supported;
        port.mau_advertised = mau_advertised;
        port.autoneg_enabled = autoneg_enabled;
        port.autoneg_supported = !mau_supported.is_empty();
        port.max_frame_size = mtu;

        hardware.push(Hardware {
            ifname: snap.name.clone(),
            ifindex: snap.index,
            lladdr,
            kind,
            send_fd: -1,
            recv_fds: Vec::new(),
            flags: snap.flags,
            mtu,
            counters: model::Counters::default(),
            port,
        });
    }

    attach_vlans(&mut hardware, inputs);
    hardware
}

/// Appends a VLAN descriptor to the port of every `Hardware` whose
/// interface is the VLAN's real device, traversing through bond masters so
/// a VLAN riding on a bond reaches every one of its slaves (Scenario C).
fn attach_vlans(hardware: &mut [Hardware], inputs: &ScanInputs) {
    for (name, classification) in &inputs.classifications {
        let Classification::Vlan { real_device } = classification else { continue };
        let Some(vid) = vlan_id_from_name(name) else { continue };
        let vlan = Vlan { vid, name: name.clone() };

        for hw in hardware.iter_mut() {
            let targets_this_hardware = hw.ifname == *real_device
                || matches!(&hw.kind, HardwareKind::BondSlave { master_name, .. } if master_name == real_device);
            if targets_this_hardware {
                hw.port.vlans.push(vlan.clone());
            }
        }
    }
}

/// Extracts a VLAN id from a conventional `<dev>.<vid>` or `vlan<vid>` name.
/// The kernel's own VLAN ioctl returns the real device, not the vid, so
/// callers that need the vid parse it from the VLAN's own interface name,
/// same as upstream lldpd's `iface_get_vlan_id` helper.
fn vlan_id_from_name(name: &str) -> Option<u16> {
    if let Some(suffix) = name.strip_prefix("vlan") {
        return suffix.parse().ok();
    }
    name.rsplit('.').next().and_then(|s| s.parse().ok())
}

fn lladdr_array(bytes: &[u8]) -> [u8; 6] {
    let mut out = [0u8; 6];
    let len = bytes.len().min(6);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str, index: u32, lladdr: [u8; 6], flags: u32) -> IfaceSnapshot {
        IfaceSnapshot { name: name.to_string(), index, hatype: 1, lladdr: lladdr.to_vec(), flags }
    }

    const MULTICAST_UP: u32 = 0x1002;

    #[test]
    fn scenario_a_plain_interface_discovery() {
        let snapshots = vec![snap("eth0", 2, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55], MULTICAST_UP)];
        let mut classifications = HashMap::new();
        classifications.insert("eth0".to_string(), Classification::Physical);
        let inputs = ScanInputs {
            classifications,
            permanent_macs: HashMap::new(),
            mau_info: HashMap::new(),
            mtus: HashMap::from([("eth0".to_string(), 1500)]),
        };

        let hardware = build_hardware(&snapshots, &inputs);
        assert_eq!(hardware.len(), 1);
        let hw = &hardware[0];
        assert_eq!(hw.ifname, "eth0");
        assert_eq!(hw.lladdr, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(hw.port.id, vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(hw.port.description, "eth0");
        assert_eq!(hw.mtu, 1500);
    }

    #[test]
    fn scenario_b_bond_slaves_report_their_permanent_mac() {
        let snapshots = vec![
            snap("eth0", 2, [0xbb; 6], MULTICAST_UP),
            snap("eth1", 3, [0xbb; 6], MULTICAST_UP),
            snap("bond0", 9, [0xbb; 6], MULTICAST_UP),
        ];
        let mut classifications = HashMap::new();
        classifications.insert(
            "eth0".to_string(),
            Classification::BondSlave { master: "bond0".into(), active: true },
        );
        classifications.insert(
            "eth1".to_string(),
            Classification::BondSlave { master: "bond0".into(), active: false },
        );
        classifications.insert("bond0".to_string(), Classification::BondMaster);

        let permanent_macs = HashMap::from([
            ("eth0".to_string(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01]),
            ("eth1".to_string(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x02]),
        ]);
        let inputs =
            ScanInputs { classifications, permanent_macs, mau_info: HashMap::new(), mtus: HashMap::new() };

        let hardware = build_hardware(&snapshots, &inputs);
        assert_eq!(hardware.len(), 2);
        for hw in &hardware {
            assert_ne!(hw.lladdr, [0xbb; 6], "must use the permanent MAC, not the bond's shared MAC");
            assert_eq!(hw.port.aggregation_id, 9);
        }
        let eth0 = hardware.iter().find(|hw| hw.ifname == "eth0").unwrap();
        let eth1 = hardware.iter().find(|hw| hw.ifname == "eth1").unwrap();
        assert!(eth0.should_zero_source_mac(), "active slave must zero its source MAC on send");
        assert!(!eth1.should_zero_source_mac(), "inactive slave must not zero its source MAC");
    }

    #[test]
    fn scenario_c_vlan_on_a_bond_reaches_both_slaves() {
        let snapshots = vec![
            snap("eth0", 2, [0xaa; 6], MULTICAST_UP),
            snap("eth1", 3, [0xaa; 6], MULTICAST_UP),
            snap("vlan10", 10, [0xaa; 6], MULTICAST_UP),
        ];
        let mut classifications = HashMap::new();
        classifications.insert(
            "eth0".to_string(),
            Classification::BondSlave { master: "bond0".into(), active: true },
        );
        classifications.insert(
            "eth1".to_string(),
            Classification::BondSlave { master: "bond0".into(), active: false },
        );
        classifications
            .insert("vlan10".to_string(), Classification::Vlan { real_device: "bond0".into() });

        let inputs = ScanInputs {
            classifications,
            permanent_macs: HashMap::new(),
            mau_info: HashMap::new(),
            mtus: HashMap::new(),
        };

        let hardware = build_hardware(&snapshots, &inputs);
        assert_eq!(hardware.len(), 2);
        for hw in &hardware {
            assert_eq!(hw.port.vlans, vec![Vlan { vid: 10, name: "vlan10".into() }]);
        }
    }
}
