use log::{debug, error, warn};
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use stun_rfc3489::constants::{DEFAULT_SERVER_ADDRESS, DEFAULT_SERVER_PORT};
use stun_rfc3489::error::DecodeError;
use stun_rfc3489::header::{StunHeader, TransId};
use stun_rfc3489::util::{generate_transaction_id, print_bytes};

pub const DEFAULT_RECV_BUF_SIZE: usize = 512;

#[derive(Debug)]
pub enum ExchangeError {
    SocketCreation(String),
    AddressParse(String),
    SendFailed(String),
    ReceiveFailed(String),
    MalformedResponse(String),
    Timeout(Duration),
    MismatchedTransaction { sent: TransId, received: TransId },
}

impl ExchangeError {
    pub fn stage(&self) -> &'static str {
        match self {
            ExchangeError::SocketCreation(_) => "socket creation",
            ExchangeError::AddressParse(_) => "address parsing",
            ExchangeError::SendFailed(_) => "send",
            ExchangeError::ReceiveFailed(_) | ExchangeError::Timeout(_) => "receive",
            ExchangeError::MalformedResponse(_) | ExchangeError::MismatchedTransaction { .. } => {
                "decode"
            }
        }
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::SocketCreation(e) => write!(f, "socket creation failed: {}", e),
            ExchangeError::AddressParse(e) => write!(f, "address parse failed: {}", e),
            ExchangeError::SendFailed(e) => write!(f, "send failed: {}", e),
            ExchangeError::ReceiveFailed(e) => write!(f, "receive failed: {}", e),
            ExchangeError::MalformedResponse(e) => write!(f, "malformed response: {}", e),
            ExchangeError::Timeout(d) => write!(f, "receive timed out after {:?}", d),
            ExchangeError::MismatchedTransaction { sent, received } => write!(
                f,
                "mismatched transaction id: sent {}, received {}",
                sent, received
            ),
        }
    }
}

impl std::error::Error for ExchangeError {}

impl From<DecodeError> for ExchangeError {
    fn from(e: DecodeError) -> Self {
        ExchangeError::MalformedResponse(format!("{}", e))
    }
}

//--------------------------------------
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub local_addr: SocketAddr,
    pub target_address: String,
    pub target_port: u16,

    // None: 一直阻塞
    pub timeout: Option<Duration>,

    pub recv_buf_size: usize,

    // 默认不校验响应的 transaction id, 只打印 warn
    pub check_trans_id: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            local_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            target_address: DEFAULT_SERVER_ADDRESS.to_string(),
            target_port: DEFAULT_SERVER_PORT,
            timeout: None,
            recv_buf_size: DEFAULT_RECV_BUF_SIZE,
            check_trans_id: false,
        }
    }
}

impl ExchangeConfig {
    pub fn new(target_address: &str, target_port: u16) -> Self {
        Self {
            target_address: target_address.to_string(),
            target_port,
            ..Default::default()
        }
    }

    pub fn local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = addr;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn recv_buf_size(mut self, size: usize) -> Self {
        self.recv_buf_size = size;
        self
    }

    pub fn check_trans_id(mut self, check: bool) -> Self {
        self.check_trans_id = check;
        self
    }
}

//--------------------------------------
// cancel 之后一直有效
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        // send_replace never fails, even with no receiver alive
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

//--------------------------------------
pub async fn open_socket(local_addr: SocketAddr) -> Result<UdpSocket, ExchangeError> {
    let sock = UdpSocket::bind(local_addr)
        .await
        .map_err(|e| ExchangeError::SocketCreation(format!("{}", e)))?;
    debug!("local addr: {:?}", sock.local_addr());
    Ok(sock)
}

/// Accepts a literal dotted-quad only, no name resolution.
pub fn resolve_target(address: &str, port: u16) -> Result<SocketAddr, ExchangeError> {
    let ip = address
        .parse::<Ipv4Addr>()
        .map_err(|e| ExchangeError::AddressParse(format!("{:?}: {}", address, e)))?;
    Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

pub async fn send_request(sock: &UdpSocket, target: SocketAddr) -> Result<StunHeader, ExchangeError> {
    let request = StunHeader::binding_request(generate_transaction_id());
    let buf = request.encode();

    debug!("request: {}", request.describe());
    debug!(
        "{:?} --> {}\n{}",
        sock.local_addr(),
        target,
        print_bytes(&buf, " ", 8)
    );

    let sent = sock
        .send_to(&buf, target)
        .await
        .map_err(|e| ExchangeError::SendFailed(format!("{}", e)))?;
    debug!("sent: {}", sent);

    if sent != buf.len() {
        return Err(ExchangeError::SendFailed(format!(
            "partial datagram, sent:{} of {}",
            sent,
            buf.len()
        )));
    }

    Ok(request)
}

//--------------------------------------
pub struct Exchanger {
    config: ExchangeConfig,
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl Exchanger {
    pub fn new(config: ExchangeConfig) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            config,
            cancel_tx: Arc::new(cancel_tx),
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            tx: self.cancel_tx.clone(),
        }
    }

    // 没有 timeout 时一直等, 直到收到数据, socket 出错或被 cancel
    pub async fn receive_response(
        &self,
        sock: &UdpSocket,
        target: SocketAddr,
    ) -> Result<StunHeader, ExchangeError> {
        let mut recv_buf = vec![0u8; self.config.recv_buf_size];
        let mut cancel_rx = self.cancel_tx.subscribe();
        if *cancel_rx.borrow() {
            return Err(ExchangeError::ReceiveFailed("cancelled".to_string()));
        }

        let recv = async {
            tokio::select! {
                res = sock.recv_from(&mut recv_buf) => {
                    res.map_err(|e| ExchangeError::ReceiveFailed(format!("{}", e)))
                },
                _ = cancel_rx.changed() => {
                    debug!("recv cancel, {:?} will stop receiving.", sock.local_addr());
                    Err(ExchangeError::ReceiveFailed("cancelled".to_string()))
                }
            }
        };

        let (len, remote_addr) = match self.config.timeout {
            None => recv.await?,
            Some(d) => match tokio::time::timeout(d, recv).await {
                Ok(v) => v?,
                Err(_) => return Err(ExchangeError::Timeout(d)),
            },
        };

        let buf = &recv_buf[..len];
        debug!("recv len: {}", buf.len());
        debug!(
            "{:?} <-- {}\n{}",
            sock.local_addr(),
            remote_addr,
            print_bytes(buf, " ", 8)
        );

        if remote_addr != target {
            warn!("response from {}, expected {}", remote_addr, target);
        }

        let response = StunHeader::decode(buf)?;
        debug!("response: {}", response.describe());
        Ok(response)
    }

    // open -> resolve -> send -> receive -> decode, 不重试
    pub async fn run(&self) -> Result<StunHeader, ExchangeError> {
        let sock = open_socket(self.config.local_addr).await?;
        let target = resolve_target(&self.config.target_address, self.config.target_port)?;

        let request = send_request(&sock, target).await?;
        let response = self.receive_response(&sock, target).await?;

        if !response.is_response_to(&request) {
            warn!(
                "transaction id mismatch, sent {}, received {}",
                request.trans_id, response.trans_id
            );
            if self.config.check_trans_id {
                return Err(ExchangeError::MismatchedTransaction {
                    sent: request.trans_id,
                    received: response.trans_id,
                });
            }
        }

        Ok(response)
    }
}

//--------------------------------------
pub async fn run_exchange(
    target_address: &str,
    target_port: u16,
) -> Result<StunHeader, ExchangeError> {
    Exchanger::new(ExchangeConfig::new(target_address, target_port))
        .run()
        .await
}

pub fn run_exchange_blocking(config: ExchangeConfig) -> Result<StunHeader, ExchangeError> {
    // 已在 tokio runtime 内, 不能再 block_on, 换一个线程跑
    if tokio::runtime::Handle::try_current().is_ok() {
        let handle = std::thread::spawn(move || block_on_exchange(config));
        return match handle.join() {
            Ok(v) => v,
            Err(_) => Err(ExchangeError::SocketCreation(
                "exchange thread panicked".to_string(),
            )),
        };
    }

    block_on_exchange(config)
}

fn block_on_exchange(config: ExchangeConfig) -> Result<StunHeader, ExchangeError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e: io::Error| ExchangeError::SocketCreation(format!("runtime, {}", e)))?;

    rt.block_on(Exchanger::new(config).run())
}

//--------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success(v) | Outcome::Failure(v) => v,
        }
    }
}

impl From<Result<StunHeader, ExchangeError>> for Outcome {
    fn from(res: Result<StunHeader, ExchangeError>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v.describe()),
            Err(e) => {
                error!("error, {} stage, {}", e.stage(), e);
                Outcome::Failure(format!("{}", e))
            }
        }
    }
}

/// Blocking binding check against `address:port`, for embedding callers.
pub fn binding_check(address: &str, port: u16) -> Outcome {
    run_exchange_blocking(ExchangeConfig::new(address, port)).into()
}
