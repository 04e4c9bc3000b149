use crate::constants::HEADER_LEN;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    // buf不够 20 字节, 携带实际长度
    Truncated(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated(len) => {
                write!(f, "header buf len:{} < {}", len, HEADER_LEN)
            }
        }
    }
}

impl std::error::Error for DecodeError {}
