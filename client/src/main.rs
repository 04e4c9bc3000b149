use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::builder::ValueParser;
use clap::{Arg, ArgAction, Command};
use client::exchange::{ExchangeConfig, Exchanger, Outcome, DEFAULT_RECV_BUF_SIZE};
use log::debug;
use stun_rfc3489::constants::{DEFAULT_SERVER_ADDRESS, DEFAULT_SERVER_PORT, HEADER_LEN};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    let ip = s.parse::<Ipv4Addr>().map_err(|e| format!("{}", e))?;
    Ok(IpAddr::V4(ip))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let default_port = DEFAULT_SERVER_PORT.to_string();
    let default_buf_size = DEFAULT_RECV_BUF_SIZE.to_string();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a stun client sending one rfc 3489 binding request")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .default_value(DEFAULT_SERVER_ADDRESS)
                .help("server ipv4 address")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .default_value(&default_port)
                .help("server port")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("local_ip")
                .long("local_ip")
                .takes_value(true)
                .default_value("0.0.0.0")
                .help("local ip")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .arg(
            Arg::new("timeout_ms")
                .long("timeout_ms")
                .takes_value(true)
                .help("receive timeout in milliseconds, wait forever if absent")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("buf_size")
                .long("buf_size")
                .takes_value(true)
                .default_value(&default_buf_size)
                .help("receive buffer size")
                .value_parser(clap::value_parser!(u64).range(HEADER_LEN as u64..)),
        )
        .arg(
            Arg::new("check_trans_id")
                .long("check_trans_id")
                .action(ArgAction::SetTrue)
                .help("fail when the response transaction id differs from the request"),
        )
        .get_matches();

    let server: &String = app.get_one("server").expect("wrong server address");
    let port: u16 = *app.get_one("port").expect("wrong port");
    let local_ip: IpAddr = *app.get_one("local_ip").expect("wrong local ip");
    let timeout = app
        .get_one::<u64>("timeout_ms")
        .map(|v| Duration::from_millis(*v));
    let buf_size: u64 = *app.get_one("buf_size").expect("wrong buf size");
    let check_trans_id: bool = *app.get_one("check_trans_id").expect("wrong flag");

    let config = ExchangeConfig::new(server, port)
        .local_addr(SocketAddr::new(local_ip, 0))
        .timeout(timeout)
        .recv_buf_size(buf_size as usize)
        .check_trans_id(check_trans_id);
    let exchanger = Exchanger::new(config);
    debug!("config: {:?}", exchanger.config());

    let outcome: Outcome = exchanger.run().await.into();
    match outcome {
        Outcome::Success(v) => println!("success, {}", v),
        Outcome::Failure(v) => {
            eprintln!("{}", v);
            std::process::exit(1);
        }
    }
}
