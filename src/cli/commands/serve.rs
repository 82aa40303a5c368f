//! Web server command.

use std::net::SocketAddr;

use console::style;

use crate::config::{Config, ConfigHandle};

const DEFAULT_HOST: &str = "0.0.0.0";

/// Start the web server.
pub async fn cmd_serve(config: Config, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind, config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    println!(
        "{} Starting Web2Video server at http://{}",
        style("→").cyan(),
        addr
    );
    println!("  Flaresolverr: {}", enabled_label(config.flaresolverr.enabled));
    println!("  Proxy: {}", enabled_label(config.proxy.enabled));
    println!("  Bypass methods: {}", enabled_label(config.bypass.enabled));
    println!("  Press Ctrl+C to stop");

    crate::server::serve(ConfigHandle::new(config), addr).await
}

fn enabled_label(enabled: bool) -> console::StyledObject<&'static str> {
    if enabled {
        style("Enabled").green()
    } else {
        style("Disabled").dim()
    }
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 0.0.0.0:3030
/// - Just a host: "127.0.0.1" -> 127.0.0.1:<configured port>
/// - Host and port: "127.0.0.1:3030"
fn parse_bind_address(bind: Option<&str>, default_port: u16) -> (String, u16) {
    let Some(bind) = bind else {
        return (DEFAULT_HOST.to_string(), default_port);
    };

    if let Ok(port) = bind.parse::<u16>() {
        return (DEFAULT_HOST.to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), default_port)
}
