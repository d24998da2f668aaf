//! Raw L2 socket I/O (section 4.4): opening and multicast setup for a
//! `Hardware`'s descriptor(s), send with the bond active-slave source-MAC
//! policy, receive with the bond dual-descriptor dedup rule, and cleanup.

pub mod error;
pub mod frame;
pub mod io;
pub mod lifecycle;

pub use error::{RawIoError, RawIoResult};
pub use frame::{accept_bond_frame, prepare_for_send, PACKET_OUTGOING};
pub use io::{recv_frame, send_frame, Received};
pub use lifecycle::{cleanup, join_discovery_multicast, open_for_hardware};
