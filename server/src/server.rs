use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::watch::Receiver as WatchReceiver;

use bytes::Bytes;
use log::{debug, error};
use stun_rfc3489::util::print_bytes;

use crate::stun::{get_response, parse_request, send_response, validate_req};

pub struct Server {
    local_addr: SocketAddr,
    signal_rx: WatchReceiver<u8>,
    socket: UdpSocket,
}

impl Server {
    pub async fn new(addr: SocketAddr, signal_rx: WatchReceiver<u8>) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        debug!("listening: {}", local_addr);

        Ok(Self {
            local_addr,
            signal_rx,
            socket,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn run(mut self) {
        let mut buf = vec![0u8; 32 * 1024];

        loop {
            tokio::select! {
                res = self.socket.recv_from(&mut buf) => {
                    match res {
                        Ok((len, remote_addr)) => {
                            let data = Bytes::copy_from_slice(&buf[..len]);

                            debug!("recv len: {}", data.len());
                            debug!("{} <--- {}\n{}", self.local_addr, remote_addr, print_bytes(&data, " ", 8));

                            self.process_one(data, remote_addr).await;
                        }
                        Err(e) => {
                            error!("error, recv_udp, {}, {:?}", self.local_addr, e);
                        }
                    }
                },
                _ = self.signal_rx.changed() => {
                    debug!("recv signal, {} will exit.", self.local_addr);
                    break;
                }
            }
        }
    }

    async fn process_one(&self, buf: Bytes, remote_addr: SocketAddr) {
        let request = match parse_request(&buf) {
            Ok(v) => v,
            Err(e) => {
                error!(
                    "parse error, from remote:{}, local:{}, {}",
                    remote_addr, self.local_addr, e
                );
                return;
            }
        };
        debug!("request: {}", request.describe());

        if let Some(e) = validate_req(&request) {
            error!(
                "validate error, from remote:{}, local:{}, {}",
                remote_addr, self.local_addr, e
            );
            return;
        }

        let response = get_response(&request);
        send_response(&response, &self.socket, self.local_addr, remote_addr).await;
    }
}
