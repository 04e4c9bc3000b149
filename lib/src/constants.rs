pub const TRANS_ID_WORDS: usize = 4;
pub const TRANS_ID_LEN: usize = 16;
pub const HEADER_LEN: usize = 20;

// rfc 3489, 11.1
pub const MESSAGE_TYPE_BIND_REQ: u16 = 0x0001;
pub const MESSAGE_TYPE_BIND_RES: u16 = 0x0101;
pub const MESSAGE_TYPE_BIND_ERR_RES: u16 = 0x0111;
pub const MESSAGE_TYPE_SHARED_SECRET_REQ: u16 = 0x0002;
pub const MESSAGE_TYPE_SHARED_SECRET_RES: u16 = 0x0102;
pub const MESSAGE_TYPE_SHARED_SECRET_ERR_RES: u16 = 0x0112;

pub const DEFAULT_SERVER_ADDRESS: &str = "74.125.22.127";
pub const DEFAULT_SERVER_PORT: u16 = 19302;
