use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "K8S_INVENTORY_BIND", default_value = "0.0.0.0:8080")]
    pub(crate) bind: SocketAddr,

    /// Time between two collection passes, e.g. `10s` or `1m30s`
    #[arg(long, env = "K8S_INVENTORY_INTERVAL", default_value = "10s", value_parser = parse_interval)]
    pub(crate) interval: Duration,

    /// Only collect nodes matching this label selector
    #[arg(long, env = "K8S_INVENTORY_LABEL_SELECTOR")]
    pub(crate) label_selector: Option<String>,
}

fn parse_interval(text: &str) -> Result<Duration, String> {
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|err| format!("invalid duration {text:?}: {err:?}"))?;
    match u64::try_from(nanos) {
        Ok(nanos) if nanos > 0 => Ok(Duration::from_nanos(nanos)),
        _ => Err(format!("interval must be positive, got {text:?}")),
    }
}
