#![allow(clippy::len_without_is_empty)]

use crate::constants::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::debug;
use std::fmt;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    BindingRequest,
    BindingResponse,
    BindingErrorResponse,
    SharedSecretRequest,
    SharedSecretResponse,
    SharedSecretErrorResponse,
    Unknown(u16),
}

impl MessageType {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            MessageType::BindingRequest => Some("Binding Request"),
            MessageType::BindingResponse => Some("Binding Response"),
            MessageType::BindingErrorResponse => Some("Binding Error Response"),
            MessageType::SharedSecretRequest => Some("Shared Secret Request"),
            MessageType::SharedSecretResponse => Some("Shared Secret Response"),
            MessageType::SharedSecretErrorResponse => Some("Shared Secret Error Response"),
            MessageType::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MessageType::Unknown(_))
    }
}

impl From<u16> for MessageType {
    fn from(v: u16) -> Self {
        match v {
            MESSAGE_TYPE_BIND_REQ => MessageType::BindingRequest,
            MESSAGE_TYPE_BIND_RES => MessageType::BindingResponse,
            MESSAGE_TYPE_BIND_ERR_RES => MessageType::BindingErrorResponse,
            MESSAGE_TYPE_SHARED_SECRET_REQ => MessageType::SharedSecretRequest,
            MESSAGE_TYPE_SHARED_SECRET_RES => MessageType::SharedSecretResponse,
            MESSAGE_TYPE_SHARED_SECRET_ERR_RES => MessageType::SharedSecretErrorResponse,
            other => MessageType::Unknown(other),
        }
    }
}

impl From<MessageType> for u16 {
    fn from(v: MessageType) -> Self {
        match v {
            MessageType::BindingRequest => MESSAGE_TYPE_BIND_REQ,
            MessageType::BindingResponse => MESSAGE_TYPE_BIND_RES,
            MessageType::BindingErrorResponse => MESSAGE_TYPE_BIND_ERR_RES,
            MessageType::SharedSecretRequest => MESSAGE_TYPE_SHARED_SECRET_REQ,
            MessageType::SharedSecretResponse => MESSAGE_TYPE_SHARED_SECRET_RES,
            MessageType::SharedSecretErrorResponse => MESSAGE_TYPE_SHARED_SECRET_ERR_RES,
            MessageType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown (0x{:04x})", u16::from(*self)),
        }
    }
}

// 每个 word 是 wire 上 4 字节按大端读出的值, 只比较和打印
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransId(pub [u32; TRANS_ID_WORDS]);

impl TransId {
    pub fn new(words: [u32; TRANS_ID_WORDS]) -> Self {
        Self(words)
    }

    pub fn words(&self) -> [u32; TRANS_ID_WORDS] {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; TRANS_ID_LEN] {
        let mut buf = [0_u8; TRANS_ID_LEN];
        for (chunk, word) in buf.chunks_exact_mut(4).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        buf
    }

    pub fn from_bytes(buf: &[u8; TRANS_ID_LEN]) -> Self {
        let mut words = [0_u32; TRANS_ID_WORDS];
        for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }
}

impl fmt::Display for TransId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.0.iter() {
            write!(f, "{:08x}", word)?;
        }
        Ok(())
    }
}

// rfc 3489, 11.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StunHeader {
    pub msg_type: MessageType,

    // 不包括header的20字节
    pub msg_len: u16,

    pub trans_id: TransId,
}

impl StunHeader {
    pub fn new(msg_type: MessageType, msg_len: u16, trans_id: TransId) -> Self {
        Self {
            msg_type,
            msg_len,
            trans_id,
        }
    }

    /// A Binding Request without attributes.
    pub fn binding_request(trans_id: TransId) -> Self {
        Self::new(MessageType::BindingRequest, 0, trans_id)
    }

    pub fn len(&self) -> usize {
        HEADER_LEN
    }

    pub fn is_response_to(&self, request: &StunHeader) -> bool {
        self.trans_id == request.trans_id
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        buf.put_u16(self.msg_type.into());
        buf.put_u16(self.msg_len);
        for word in self.trans_id.words() {
            buf.put_u32(word);
        }
        buf.freeze()
    }

    // 只读前 20 字节, 后面的 body 忽略
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        // 只检查长度，不检查有效性
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::Truncated(buf.len()));
        }

        let mut buf = &buf[..HEADER_LEN];
        let msg_type = MessageType::from(buf.get_u16());
        let msg_len = buf.get_u16();
        if !msg_type.is_known() {
            debug!("decode, {}", msg_type);
        }

        let mut trans_id = [0_u8; TRANS_ID_LEN];
        buf.copy_to_slice(&mut trans_id);

        Ok(Self {
            msg_type,
            msg_len,
            trans_id: TransId::from_bytes(&trans_id),
        })
    }

    pub fn describe(&self) -> String {
        let type_text = match self.msg_type {
            MessageType::Unknown(_) => self.msg_type.to_string(),
            v => format!("{} (0x{:04x})", v, u16::from(v)),
        };

        format!(
            "type: {}, length: {}, transaction id: {}",
            type_text, self.msg_len, self.trans_id
        )
    }
}
