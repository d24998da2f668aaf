//! Control-socket wire protocol (section 4.5/6): the `{type, length}` frame
//! header, the request/response envelope, and the message-type menu shared
//! by the daemon and the client.

pub mod error;
pub mod framing;
pub mod message;
pub mod protocol;

pub use error::{CtlError, CtlResult};
pub use framing::{read_frame, write_frame, MAX_PAYLOAD_LEN};
pub use message::MessageType;
pub use protocol::{registry, Request, Response};
