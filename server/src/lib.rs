//! A binding responder: answers bare RFC 3489 Binding Requests with a
//! Binding Response header echoing the transaction id.

pub mod server;
pub mod signal;
pub mod stun;
