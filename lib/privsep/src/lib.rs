//! Privilege-separation IPC (section 4.2): the monitor/worker split, the
//! path allowlist, the fixed command menu, and descriptor passing over a
//! pre-forked `socketpair`.

pub mod allowlist;
pub mod channel;
pub mod client;
pub mod command;
pub mod error;
pub mod ethtool;
pub mod filter;
pub mod monitor;

pub use allowlist::Allowlist;
pub use channel::Channel;
pub use client::PrivClient;
pub use command::Command;
pub use error::{PrivError, PrivResult};
pub use ethtool::EthtoolCmd;
pub use monitor::Monitor;
