/// The discovery protocols' multicast destinations (section 4.4). Matching
/// any one of these passes the filter; everything else is dropped by the
/// kernel before it reaches the worker.
const LLDP_ETHERTYPE: u16 = 0x88cc;
const LLDP_DST: [u8; 6] = [0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e];
const EDP_DST: [u8; 6] = [0x01, 0xe0, 0x2b, 0x00, 0x00, 0x00];
const CDP_DST: [u8; 6] = [0x01, 0x00, 0x0c, 0xcc, 0xcc, 0xcc];
const SONMP_DST: [u8; 6] = [0x01, 0x00, 0x81, 0x00, 0x01, 0x00];
const FDP_DST: [u8; 6] = [0x01, 0xe0, 0x52, 0xcc, 0xcc, 0xcc];

/// The discovery protocols' multicast destination MACs, for callers (the
/// worker's multicast-membership setup/teardown) that need the plain list
/// rather than the frame predicate below.
pub fn discovery_destinations() -> [[u8; 6]; 5] {
    [LLDP_DST, EDP_DST, CDP_DST, SONMP_DST, FDP_DST]
}

/// Pure-Rust restatement of the filter's accept predicate, used by the
/// kernel-independent unit tests in this module (Scenario F) and as the
/// specification the BPF program in [`bpf_program`] must implement.
pub fn matches_discovery(frame: &[u8]) -> bool {
    if frame.len() < 14 {
        return false;
    }
    let dst: [u8; 6] = frame[0..6].try_into().unwrap();
    let ethertype = u16::from_be_bytes([frame[12], frame[13]]);

    (ethertype == LLDP_ETHERTYPE && dst == LLDP_DST)
        || dst == EDP_DST
        || dst == CDP_DST
        || dst == SONMP_DST
        || dst == FDP_DST
}

/// Classic BPF program mirroring [`matches_discovery`], installed via
/// `SO_ATTACH_FILTER` by the monitor's `iface_init` handler. Hard-coded and
/// never derived from worker input, per section 4.2's "authorized filter
/// program is hard-coded and not accepted from the worker".
///
/// Layout: load the 6-byte destination MAC and 2-byte EtherType, then OR
/// together one comparison per protocol; a plain `libc::sock_filter` array
/// is the representation `SO_ATTACH_FILTER` expects (`struct sock_fprog`).
pub fn bpf_program() -> Vec<libc::sock_filter> {
    use libc::sock_filter;

    const BPF_LD: u16 = 0x00;
    const BPF_W: u16 = 0x00;
    const BPF_H: u16 = 0x08;
    const BPF_ABS: u16 = 0x20;
    const BPF_JMP: u16 = 0x05;
    const BPF_JEQ: u16 = 0x10;
    const BPF_K: u16 = 0x00;
    const BPF_RET: u16 = 0x06;

    fn stmt(code: u16, k: u32) -> sock_filter {
        sock_filter { code, jt: 0, jf: 0, k }
    }
    fn jump(code: u16, k: u32, jt: u8, jf: u8) -> sock_filter {
        sock_filter { code, jt, jf, k }
    }

    let dsts = [LLDP_DST, EDP_DST, CDP_DST, SONMP_DST, FDP_DST];
    let mut program = Vec::new();

    // Load the first 4 bytes of the destination MAC into the accumulator
    // and compare against each candidate's first 4 bytes; a match falls
    // through to the second half-comparison, otherwise skip ahead. LLDP
    // additionally requires EtherType 0x88cc at offset 12 (section 4.4,
    // Scenario F: an ARP frame to the LLDP multicast address must not
    // pass), so its block carries two extra instructions the other
    // candidates don't need.
    for dst in dsts.iter() {
        let first4 = u32::from_be_bytes([dst[0], dst[1], dst[2], dst[3]]);
        let last2 = u16::from_be_bytes([dst[4], dst[5]]) as u32;
        let is_lldp = *dst == LLDP_DST;
        let tail_len: u8 = if is_lldp { 3 } else { 1 };

        program.push(stmt(BPF_LD | BPF_W | BPF_ABS, 0));
        program.push(jump(BPF_JMP | BPF_JEQ | BPF_K, first4, 0, 2 + tail_len));
        program.push(stmt(BPF_LD | BPF_H | BPF_ABS, 4));
        program.push(jump(BPF_JMP | BPF_JEQ | BPF_K, last2, 0, tail_len));
        if is_lldp {
            program.push(stmt(BPF_LD | BPF_H | BPF_ABS, 12));
            program.push(jump(BPF_JMP | BPF_JEQ | BPF_K, LLDP_ETHERTYPE as u32, 0, 1));
        }
        // Destination (and, for LLDP, EtherType) matched: accept.
        program.push(stmt(BPF_RET, u32::MAX));
    }

    program.push(stmt(BPF_RET, 0));
    program
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(dst: [u8; 6], ethertype: u16) -> Vec<u8> {
        let mut frame = vec![0u8; 60];
        frame[0..6].copy_from_slice(&dst);
        frame[6..12].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        frame[12..14].copy_from_slice(&ethertype.to_be_bytes());
        frame
    }

    #[test]
    fn lldp_frame_passes() {
        assert!(matches_discovery(&frame_with(LLDP_DST, LLDP_ETHERTYPE)));
    }

    #[test]
    fn arp_to_lldp_destination_does_not_pass() {
        assert!(!matches_discovery(&frame_with(LLDP_DST, 0x0806)));
    }

    #[test]
    fn cdp_frame_passes_regardless_of_ethertype() {
        assert!(matches_discovery(&frame_with(CDP_DST, 0x0800)));
    }

    #[test]
    fn unrelated_destination_does_not_pass() {
        assert!(!matches_discovery(&frame_with([0xff; 6], LLDP_ETHERTYPE)));
    }
}
