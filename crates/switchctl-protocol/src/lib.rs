//! Wire types shared by the switch control client and server.
//!
//! Every connection carries exactly one [`Request`] followed by exactly one
//! [`Response`]. Both are plain JSON objects with no length prefix and no
//! trailing newline; the reader stops as soon as the object closes.
//!
//! ```json
//! {"ctype":"control","itype":"serial","cmd":"switch","port":"COM7","stat":"1"}
//! {"data":"success"}
//! ```

mod codec;
mod request;
mod response;

pub use codec::{CodecError, MAX_MESSAGE_BYTES, encode, read_message, write_message};
pub use request::{Category, CommandToken, ControlCommand, DeviceCommand, InterfaceType, Request};
pub use response::{ErrorKind, ErrorPayload, Response};

/// Payload returned for operations that completed.
pub const SUCCESS: &str = "success";

/// Payload returned for device open/close failures.
pub const FAIL: &str = "fail";

/// Payload returned for structurally invalid or unknown requests.
pub const INVALID_COMMAND: &str = "Invalid command";
