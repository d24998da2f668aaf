use std::os::fd::{IntoRawFd, RawFd};

use model::{Hardware, HardwareKind};
use privsep::{filter, PrivClient};

use crate::error::RawIoResult;

/// Opens the descriptor(s) for `hardware` and installs them on it (section
/// 4.4). A plain interface gets one descriptor used for both send and
/// receive; a bond slave gets a second, secondary descriptor on the bond
/// master so frames delivered only there aren't missed.
pub fn open_for_hardware(priv_client: &mut PrivClient, hardware: &mut Hardware) -> RawIoResult<()> {
    let primary = priv_client.iface_init(&hardware.ifname)?.into_raw_fd();
    hardware.send_fd = primary;
    hardware.recv_fds = vec![primary];

    if let HardwareKind::BondSlave { master_name, .. } = &hardware.kind {
        let secondary = priv_client.iface_init(master_name)?.into_raw_fd();
        hardware.recv_fds.push(secondary);
    }

    Ok(())
}

/// Joins the discovery protocols' multicast groups on `ifname` (section
/// 4.4: the descriptor only receives frames addressed to those groups once
/// membership is registered).
pub fn join_discovery_multicast(priv_client: &mut PrivClient, ifname: &str) -> RawIoResult<()> {
    for dst in filter::discovery_destinations() {
        priv_client.iface_multicast(ifname, dst, true)?;
    }
    Ok(())
}

/// Tears down `hardware`: removes multicast memberships on both the slave
/// and, for bonds, the master, then closes every descriptor it holds.
pub fn cleanup(priv_client: &mut PrivClient, hardware: &mut Hardware) -> RawIoResult<()> {
    for dst in filter::discovery_destinations() {
        let _ = priv_client.iface_multicast(&hardware.ifname, dst, false);
    }
    if let HardwareKind::BondSlave { master_name, .. } = &hardware.kind {
        for dst in filter::discovery_destinations() {
            let _ = priv_client.iface_multicast(master_name, dst, false);
        }
    }

    let mut fds: Vec<RawFd> = hardware.recv_fds.drain(..).collect();
    if !fds.contains(&hardware.send_fd) {
        fds.push(hardware.send_fd);
    }
    for fd in fds {
        let _ = nix::unistd::close(fd);
    }
    hardware.send_fd = -1;

    Ok(())
}
