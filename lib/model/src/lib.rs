//! The data model shared by the daemon and client (section 3): chassis and
//! port identity, the local transmit/receive `Hardware` table, and the
//! per-hardware neighbor table. `Chassis` and `Port` are the two types that
//! cross the control socket and so implement `marshal::GraphNode`; `Vlan`,
//! `Hardware` and `NeighborTable` stay process-local.

pub mod chassis;
pub mod hardware;
pub mod neighbor;
pub mod port;

pub use chassis::{Capabilities, Chassis, ChassisIdSubtype};
pub use hardware::{Counters, Hardware, HardwareKind};
pub use neighbor::{NeighborPort, NeighborTable};
pub use port::{AutonegCaps, Port, PortIdSubtype, Vlan};
