/// `sll_pkttype` value the kernel tags loopback-of-our-own-send frames with;
/// these never represent a peer announcement and are discarded on every
/// receive path (section 4.4).
pub const PACKET_OUTGOING: i32 = 4;

/// Zeroes the source MAC (octets 6..12 of an Ethernet frame) in place when
/// `hardware` is the active slave of a bond, so switch-side MAC learning
/// doesn't bind the slave's permanent MAC to a port the bond isn't using
/// (section 4.4, testable property 5). A no-op for plain interfaces and
/// inactive slaves.
pub fn prepare_for_send(hardware: &model::Hardware, frame: &mut [u8]) {
    if hardware.should_zero_source_mac() && frame.len() >= 12 {
        frame[6..12].fill(0);
    }
}

/// Decides whether a frame arriving on a bond's dual receive descriptors
/// should be accepted (section 4.4's bond receive path):
///
/// - a frame arriving on the slave descriptor is always accepted (subject
///   to the outbound-packet-type filter below);
/// - a frame arriving on the master descriptor is accepted only if the
///   kernel tagged it with an `sll_ifindex` matching the slave; on kernels
///   too old to set that field reliably, frames are accepted when the
///   ifindex equals either the slave or the master (best effort);
/// - frames whose `sll_pkttype` indicates outbound are always discarded.
pub fn accept_bond_frame(
    pkttype: i32,
    arrived_on_master: bool,
    frame_ifindex: i32,
    slave_ifindex: i32,
    master_ifindex: i32,
) -> bool {
    if pkttype == PACKET_OUTGOING {
        return false;
    }
    if !arrived_on_master {
        return true;
    }
    frame_ifindex == slave_ifindex || frame_ifindex == master_ifindex
}
