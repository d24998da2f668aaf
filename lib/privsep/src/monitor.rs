use std::ffi::CString;
use std::os::fd::{AsRawFd, RawFd};

use nix::fcntl::{open, OFlag};
use nix::sys::socket::{
    bind, setsockopt, socket, sockopt, AddressFamily, LinkAddr, SockFlag, SockProtocol,
    SockType, SockaddrLike,
};
use nix::sys::stat::Mode;

use wire::logging::{debug, warn, Logger};

use crate::allowlist::Allowlist;
use crate::channel::Channel;
use crate::command::Command;
use crate::error::{PrivError, PrivResult};
use crate::ethtool::EthtoolCmd;
use crate::filter;

/// The privileged side of the split (section 4.2). Runs as root, serves the
/// fixed command menu over `channel`, and never does anything the allowlist
/// or the command menu doesn't explicitly authorize.
pub struct Monitor {
    allowlist: Allowlist,
    log: Logger,
}

impl Monitor {
    pub fn new(log: Logger) -> Self {
        Monitor { allowlist: Allowlist::compiled(), log }
    }

    /// Serves requests until the channel is closed or a framing error makes
    /// the channel unusable. Per section 7, any I/O error on the channel is
    /// fatal -- this returns `Err` and the caller is expected to terminate
    /// the process rather than retry.
    pub fn serve(&mut self, channel: &mut Channel) -> PrivResult<()> {
        loop {
            let raw_cmd = match channel.read_u32() {
                Ok(v) => v,
                Err(PrivError::Io(err)) if is_clean_eof(&err) => return Ok(()),
                Err(err) => return Err(err),
            };
            let command = Command::from_u32(raw_cmd)
                .ok_or_else(|| PrivError::Protocol(format!("unknown command {}", raw_cmd)))?;

            match command {
                Command::Open => self.handle_open(channel)?,
                Command::Ethtool => self.handle_ethtool(channel)?,
                Command::IfaceInit => self.handle_iface_init(channel)?,
                Command::IfaceMulticast => self.handle_iface_multicast(channel)?,
            }
        }
    }

    fn handle_open(&mut self, channel: &mut Channel) -> PrivResult<()> {
        let path_bytes = channel.read_bytes()?;
        let path = String::from_utf8_lossy(&path_bytes).into_owned();

        if !self.allowlist.allows(&path) {
            warn!(self.log, "denied open of non-allowlisted path"; "path" => &path);
            channel.write_i32(-1)?;
            return Ok(());
        }

        match open(path.as_str(), OFlag::O_RDONLY, Mode::empty()) {
            Ok(fd) => {
                channel.write_i32(0)?;
                channel.send_fd(fd)?;
                let _ = nix::unistd::close(fd);
                Ok(())
            }
            Err(errno) => {
                debug!(self.log, "open failed"; "path" => &path, "errno" => errno as i32);
                channel.write_i32(-(errno as i32))?;
                Ok(())
            }
        }
    }

    fn handle_ethtool(&mut self, channel: &mut Channel) -> PrivResult<()> {
        let ifname = read_ifname(channel)?;
        match query_ethtool(&ifname) {
            Ok(cmd) => {
                channel.write_i32(0)?;
                channel.write_bytes(cmd.as_bytes())?;
            }
            Err(errno) => {
                warn!(self.log, "ethtool ioctl failed"; "ifname" => &ifname);
                channel.write_i32(-(errno as i32))?;
            }
        }
        Ok(())
    }

    fn handle_iface_init(&mut self, channel: &mut Channel) -> PrivResult<()> {
        let ifname = read_ifname(channel)?;
        match open_discovery_socket(&ifname) {
            Ok(fd) => {
                channel.write_i32(0)?;
                channel.send_fd(fd.as_raw_fd())?;
                std::mem::forget(fd); // ownership transferred to the worker
            }
            Err(errno) => {
                warn!(self.log, "iface_init failed"; "ifname" => &ifname);
                channel.write_i32(-(errno as i32))?;
            }
        }
        Ok(())
    }

    fn handle_iface_multicast(&mut self, channel: &mut Channel) -> PrivResult<()> {
        let ifname = read_ifname(channel)?;
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&channel.read_bytes()?);
        let add = channel.read_u32()? != 0;

        match set_multicast_membership(&ifname, mac, add) {
            Ok(()) => channel.write_i32(0)?,
            Err(errno) => {
                warn!(self.log, "multicast membership ioctl failed"; "ifname" => &ifname);
                channel.write_i32(-(errno as i32))?;
            }
        }
        Ok(())
    }
}

fn is_clean_eof(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::UnexpectedEof
}

fn read_ifname(channel: &mut Channel) -> PrivResult<String> {
    let bytes = channel.read_bytes()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn query_ethtool(ifname: &str) -> Result<EthtoolCmd, nix::errno::Errno> {
    let sock = socket(AddressFamily::Inet, SockType::Datagram, SockFlag::empty(), None)?;
    let mut ifreq = make_ifreq(ifname);
    let mut cmd = EthtoolCmd::request();
    ifreq.ifr_ifru.ifru_data = (&mut cmd as *mut EthtoolCmd) as *mut libc::c_char;
    let rc = unsafe { libc::ioctl(sock, crate::ethtool::SIOCETHTOOL as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    if rc < 0 {
        return Err(nix::errno::Errno::last());
    }
    Ok(cmd)
}

fn open_discovery_socket(ifname: &str) -> Result<std::os::fd::OwnedFd, nix::errno::Errno> {
    let sock = socket(
        AddressFamily::Packet,
        SockType::Raw,
        SockFlag::empty(),
        Some(SockProtocol::EthAll),
    )?;
    let ifindex = nix::net::if_::if_nametoindex(ifname)? as i32;
    let sll = make_sockaddr_ll(ifindex);
    let addr: LinkAddr = unsafe {
        LinkAddr::from_raw(
            &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
            Some(std::mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t),
        )
    }
    .expect("valid sockaddr_ll");
    bind(sock, &addr)?;

    let program = filter::bpf_program();
    let fprog = libc::sock_fprog { len: program.len() as u16, filter: program.as_ptr() as *mut _ };
    let rc = unsafe {
        libc::setsockopt(
            sock,
            libc::SOL_SOCKET,
            libc::SO_ATTACH_FILTER,
            (&fprog as *const libc::sock_fprog) as *const libc::c_void,
            std::mem::size_of::<libc::sock_fprog>() as u32,
        )
    };
    if rc < 0 {
        let errno = nix::errno::Errno::last();
        let _ = nix::unistd::close(sock);
        return Err(errno);
    }

    // Filter-lock: best effort, older kernels don't support it (testable
    // property 4 -- once set, the worker cannot widen the filter).
    let _ = setsockopt(sock, sockopt::Linger, &libc::linger { l_onoff: 0, l_linger: 0 });
    unsafe {
        let one: i32 = 1;
        libc::setsockopt(
            sock,
            libc::SOL_SOCKET,
            libc::SO_LOCK_FILTER,
            (&one as *const i32) as *const libc::c_void,
            std::mem::size_of::<i32>() as u32,
        );
    }

    use std::os::fd::FromRawFd;
    Ok(unsafe { std::os::fd::OwnedFd::from_raw_fd(sock) })
}

fn set_multicast_membership(
    ifname: &str,
    mac: [u8; 6],
    add: bool,
) -> Result<(), nix::errno::Errno> {
    let sock = socket(AddressFamily::Inet, SockType::Datagram, SockFlag::empty(), None)?;
    let mut ifreq = make_ifreq(ifname);
    unsafe {
        let sa = &mut ifreq.ifr_ifru.ifru_hwaddr;
        sa.sa_family = libc::ARPHRD_ETHER;
        sa.sa_data[0..6].copy_from_slice(std::mem::transmute::<[u8; 6], [i8; 6]>(mac).as_slice());
    }
    let request = if add { libc::SIOCADDMULTI } else { libc::SIOCDELMULTI };
    let rc = unsafe { libc::ioctl(sock, request as _, &mut ifreq) };
    let _ = nix::unistd::close(sock);
    if rc < 0 {
        return Err(nix::errno::Errno::last());
    }
    Ok(())
}

fn make_ifreq(ifname: &str) -> libc::ifreq {
    let mut ifreq: libc::ifreq = unsafe { std::mem::zeroed() };
    let name = CString::new(ifname).expect("interface name must not contain NUL");
    let bytes = name.as_bytes_with_nul();
    let len = bytes.len().min(ifreq.ifr_name.len());
    for (slot, byte) in ifreq.ifr_name.iter_mut().zip(bytes[..len].iter()) {
        *slot = *byte as libc::c_char;
    }
    ifreq
}

fn make_sockaddr_ll(ifindex: i32) -> libc::sockaddr_ll {
    let mut addr: libc::sockaddr_ll = unsafe { std::mem::zeroed() };
    addr.sll_family = libc::AF_PACKET as u16;
    addr.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
    addr.sll_ifindex = ifindex;
    addr
}
