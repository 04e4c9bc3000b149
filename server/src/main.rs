// ./server --ip 127.0.0.1 --port 3478

use log::{debug, info};
use std::net::{IpAddr, SocketAddr};

use clap::builder::ValueParser;
use clap::{Arg, Command};

use server::server::Server;
use server::signal::shutdown_channel;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    let ip = s.parse::<IpAddr>().map_err(|e| format!("{}", e))?;
    // 不能是 0.0.0.0
    match ip {
        IpAddr::V4(ip) => {
            if ip.is_unspecified() {
                return Err("0.0.0.0 not allow".to_string());
            }
        }
        IpAddr::V6(_) => {
            return Err("ipv6 not support".to_string());
        }
    }

    Ok(ip)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a binding responder for testing rfc 3489 clients")
        .arg(
            Arg::new("ip")
                .long("ip")
                .takes_value(true)
                .required(true)
                .help("listen ip")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .default_value("3478")
                .help("listen port")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .get_matches();

    let ip: IpAddr = *app.get_one("ip").expect("wrong ip");
    let port: u16 = *app.get_one("port").expect("wrong port");
    debug!("ip:{}  port:{}", ip, port);

    let signal_rx = shutdown_channel();

    let server = match Server::new(SocketAddr::new(ip, port), signal_rx).await {
        Ok(v) => v,
        Err(e) => {
            panic!("error, {:?}", e);
        }
    };

    info!("start server on {} ...", server.local_addr());
    server.run().await;

    println!("end.");
}
