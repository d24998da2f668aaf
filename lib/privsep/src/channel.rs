use std::io::{IoSlice, IoSliceMut, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;

use nix::sys::socket::{self, ControlMessage, ControlMessageOwned, MsgFlags};

use crate::error::{PrivError, PrivResult};

/// Thin framing layer over the pre-forked `socketpair` shared by monitor and
/// worker (section 4.2/6). Plain integers and length-prefixed byte strings
/// go over ordinary `read`/`write`; file descriptors travel as `SCM_RIGHTS`
/// ancillary data via `sendmsg`/`recvmsg`.
pub struct Channel {
    stream: UnixStream,
}

impl Channel {
    pub fn new(stream: UnixStream) -> Self {
        Channel { stream }
    }

    /// Creates the pre-forked socket pair itself. Called once before
    /// `fork()`; each side keeps one end and closes the other.
    pub fn pair() -> PrivResult<(Channel, Channel)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Channel::new(a), Channel::new(b)))
    }

    pub fn write_u32(&mut self, value: u32) -> PrivResult<()> {
        self.stream.write_all(&value.to_ne_bytes())?;
        Ok(())
    }

    pub fn read_u32(&mut self) -> PrivResult<u32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf)?;
        Ok(u32::from_ne_bytes(buf))
    }

    pub fn write_i32(&mut self, value: i32) -> PrivResult<()> {
        self.write_u32(value as u32)
    }

    pub fn read_i32(&mut self) -> PrivResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Writes a length prefix followed by `bytes`, matching `must_write`'s
    /// "lengths are always transmitted explicitly before variable-length
    /// payloads" convention.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> PrivResult<()> {
        self.write_u32(bytes.len() as u32)?;
        self.stream.write_all(bytes)?;
        Ok(())
    }

    pub fn read_bytes(&mut self) -> PrivResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Sends `fd` as `SCM_RIGHTS` ancillary data along with a one-byte
    /// placeholder payload (some payload is required for `sendmsg` to carry
    /// ancillary data on a stream socket).
    pub fn send_fd(&mut self, fd: RawFd) -> PrivResult<()> {
        let iov = [IoSlice::new(&[0u8])];
        let fds = [fd];
        let cmsg = [ControlMessage::ScmRights(&fds)];
        socket::sendmsg::<()>(self.stream.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
            .map_err(PrivError::from)?;
        Ok(())
    }

    /// Receives one file descriptor sent via [`Channel::send_fd`].
    pub fn recv_fd(&mut self) -> PrivResult<OwnedFd> {
        let mut buf = [0u8; 1];
        let mut iov = [IoSliceMut::new(&mut buf)];
        let mut cmsg_buf = nix::cmsg_space!([RawFd; 1]);
        let msg = socket::recvmsg::<()>(
            self.stream.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_buf),
            MsgFlags::empty(),
        )
        .map_err(PrivError::from)?;

        for cmsg in msg.cmsgs() {
            if let ControlMessageOwned::ScmRights(fds) = cmsg {
                if let Some(&fd) = fds.first() {
                    return Ok(unsafe { OwnedFd::from_raw_fd(fd) });
                }
            }
        }
        Err(PrivError::Protocol("expected a file descriptor, none received".into()))
    }
}
