//! Wire layer of an RFC 3489 STUN client: the 20 byte message header,
//! its encoding in network byte order and transaction id generation.

pub mod constants;
pub mod error;
pub mod header;
pub mod util;

pub use error::DecodeError;
pub use header::{MessageType, StunHeader, TransId};
