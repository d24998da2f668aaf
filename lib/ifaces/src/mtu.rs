use std::ffi::CString;

const DEFAULT_MTU: u32 = 1500;
const SIOCGIFMTU: u64 = 0x8921;

/// Unprivileged MTU read, falling back to 1500 on any failure (section 4.3).
pub fn query_mtu(ifname: &str) -> u32 {
    let Ok(sock) = nix::sys::socket::socket(
        nix::sys::socket::AddressFamily::Inet,
        nix::sys::socket::SockType::Datagram,
        nix::sys::socket::SockFlag::empty(),
        None,
    ) else {
        return DEFAULT_MTU;
    };

    let mut ifreq: libc::ifreq = unsafe { std::mem::zeroed() };
    let Ok(name) = CString::new(ifname) else {
        let _ = nix::unistd::close(sock);
        return DEFAULT_MTU;
    };
    let bytes = name.as_bytes_with_nul();
    let len = bytes.len().min(ifreq.ifr_name.len());
    for (slot, byte) in ifreq.ifr_name.iter_mut().zip(bytes[..len].iter()) {
        *slot = *byte as libc::c_char;
    }

    let rc = unsafe { libc::ioctl(sock, SIOCGIFMTU as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    if rc != 0 {
        return DEFAULT_MTU;
    }
    let mtu = unsafe { ifreq.ifr_ifru.ifru_mtu };
    if mtu <= 0 {
        DEFAULT_MTU
    } else {
        mtu as u32
    }
}
