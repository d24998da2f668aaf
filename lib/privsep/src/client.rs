use std::os::fd::OwnedFd;

use crate::channel::Channel;
use crate::command::Command;
use crate::error::{PrivError, PrivResult};
use crate::ethtool::EthtoolCmd;

/// The worker's handle onto the monitor (section 4.2). Every method here is
/// a synchronous request/response round trip; the worker must not issue a
/// second request before the previous reply is fully consumed (section 5's
/// ordering guarantee), which falls out naturally from `&mut self`.
pub struct PrivClient {
    channel: Channel,
}

impl PrivClient {
    pub fn new(channel: Channel) -> Self {
        PrivClient { channel }
    }

    pub fn open(&mut self, path: &str) -> PrivResult<OwnedFd> {
        self.channel.write_u32(Command::Open.as_u32())?;
        self.channel.write_bytes(path.as_bytes())?;
        let status = self.channel.read_i32()?;
        if status != 0 {
            return Err(PrivError::Denied(format!("open({}) denied or failed: {}", path, status)));
        }
        self.channel.recv_fd()
    }

    pub fn ethtool(&mut self, ifname: &str) -> PrivResult<EthtoolCmd> {
        self.channel.write_u32(Command::Ethtool.as_u32())?;
        self.channel.write_bytes(ifname.as_bytes())?;
        let status = self.channel.read_i32()?;
        if status != 0 {
            return Err(PrivError::Denied(format!("ethtool({}) failed: {}", ifname, status)));
        }
        let bytes = self.channel.read_bytes()?;
        Ok(EthtoolCmd::from_bytes(&bytes))
    }

    pub fn iface_init(&mut self, ifname: &str) -> PrivResult<OwnedFd> {
        self.channel.write_u32(Command::IfaceInit.as_u32())?;
        self.channel.write_bytes(ifname.as_bytes())?;
        let status = self.channel.read_i32()?;
        if status != 0 {
            return Err(PrivError::Denied(format!("iface_init({}) failed: {}", ifname, status)));
        }
        self.channel.recv_fd()
    }

    pub fn iface_multicast(&mut self, ifname: &str, mac: [u8; 6], add: bool) -> PrivResult<()> {
        self.channel.write_u32(Command::IfaceMulticast.as_u32())?;
        self.channel.write_bytes(ifname.as_bytes())?;
        self.channel.write_bytes(&mac)?;
        self.channel.write_u32(add as u32)?;
        let status = self.channel.read_i32()?;
        if status != 0 {
            return Err(PrivError::Denied(format!(
                "iface_multicast({}, add={}) failed: {}",
                ifname, add, status
            )));
        }
        Ok(())
    }
}
