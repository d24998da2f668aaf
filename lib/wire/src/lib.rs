#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_without_default)]

//! Shared primitives used by every other crate in the workspace: structured
//! logging, error plumbing, time helpers and small macros. Nothing in here
//! knows about chassis, ports or sockets -- it is the ambient layer every
//! other crate builds on, the same role `flux` played for the networking
//! stack this workspace grew out of.

pub mod logging;
pub mod shared;
pub mod time;
pub mod util;

pub use shared::{ErrorUtils, SizedRead, SizedWrite};
