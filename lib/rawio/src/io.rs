use std::os::fd::RawFd;

use nix::sys::socket::{recvfrom, send, LinkAddr, MsgFlags};

use model::Hardware;

use crate::error::RawIoResult;
use crate::frame::{accept_bond_frame, prepare_for_send};

/// Writes `frame` to `hardware`'s send descriptor, applying the bond
/// active-slave source-MAC zeroing first (section 4.4).
pub fn send_frame(hardware: &Hardware, frame: &[u8]) -> RawIoResult<()> {
    let mut buf = frame.to_vec();
    prepare_for_send(hardware, &mut buf);
    send(hardware.send_fd, &buf, MsgFlags::empty())?;
    Ok(())
}

/// One frame read off a `Hardware`'s receive descriptor(s), with the
/// descriptor it arrived on so the caller can run the bond dedup decision.
pub struct Received {
    pub frame: Vec<u8>,
    pub arrived_on_fd: RawFd,
}

/// Reads one frame from `fd` and decides whether to keep it, applying the
/// bond dual-descriptor dedup rule from [`accept_bond_frame`] when
/// `hardware` is a bond slave and `fd` isn't its primary descriptor.
/// Returns `Ok(None)` for a frame that was read but should be dropped.
pub fn recv_frame(hardware: &Hardware, fd: RawFd) -> RawIoResult<Option<Received>> {
    let mut buf = vec![0u8; 65536];
    let (len, addr) = recvfrom::<LinkAddr>(fd, &mut buf)?;
    buf.truncate(len);

    let Some(link) = addr else {
        return Ok(Some(Received { frame: buf, arrived_on_fd: fd }));
    };

    let arrived_on_master = hardware.is_bond_slave() && fd != hardware.send_fd;
    if hardware.is_bond_slave() {
        let master_ifindex = match &hardware.kind {
            model::HardwareKind::BondSlave { master_ifindex, .. } => *master_ifindex as i32,
            model::HardwareKind::Ethernet => 0,
        };
        let accepted = accept_bond_frame(
            link.pkttype() as i32,
            arrived_on_master,
            link.ifindex() as i32,
            hardware.ifindex as i32,
            master_ifindex,
        );
        if !accepted {
            return Ok(None);
        }
    } else if link.pkttype() as i32 == crate::frame::PACKET_OUTGOING {
        return Ok(None);
    }

    Ok(Some(Received { frame: buf, arrived_on_fd: fd }))
}
