use log::{debug, error};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

use stun_rfc3489::header::{MessageType, StunHeader};
use stun_rfc3489::util::print_bytes;

pub fn parse_request(buf: &[u8]) -> Result<StunHeader, String> {
    StunHeader::decode(buf).map_err(|x| format!("{}", x))
}

pub fn validate_req(req: &StunHeader) -> Option<String> {
    if req.msg_type != MessageType::BindingRequest {
        return Some(format!("bad request msg_type: {}", req.msg_type));
    }

    None
}

// 响应只有header, 原样带回 transaction id
pub fn get_response(req: &StunHeader) -> StunHeader {
    StunHeader::new(MessageType::BindingResponse, 0, req.trans_id)
}

pub async fn send_response(
    res: &StunHeader,
    socket: &UdpSocket,
    src_addr: SocketAddr,
    dst_addr: SocketAddr,
) {
    let data = res.encode();
    match socket.send_to(&data, dst_addr).await {
        Ok(v) => {
            debug!(
                "{} ---> {}\n{}",
                src_addr,
                dst_addr,
                print_bytes(&data, " ", 8)
            );
            debug!("sent: {}, {}", v, res.describe());
        }
        Err(e) => {
            error!("error, {} ---> {}, {:?}", src_addr, dst_addr, e);
        }
    };
}
