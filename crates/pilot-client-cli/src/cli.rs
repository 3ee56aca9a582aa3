use std::str::FromStr;

use clap::Parser;
use pilot_client::BridgeEndpoints;

/// Terminal front end for the pilot client core: connects to an FSD
/// server and exercises the library's `connect()`/`disconnect()` surface.
#[derive(Debug, Parser)]
#[command(name = "pilot-client", version, about)]
pub struct Options {
    /// Own callsign, e.g. UAL123
    #[arg(long)]
    pub callsign: String,

    /// Aircraft ICAO type code, e.g. B738
    #[arg(long)]
    pub type_code: String,

    /// FSD server host or IP (host:port is not accepted, the FSD port is
    /// always 6809)
    #[arg(long)]
    pub server: String,

    /// VATSIM CID
    #[arg(long, env = "XPILOT_RS_CID")]
    pub cid: String,

    /// VATSIM password
    #[arg(long, env = "XPILOT_RS_PASSWORD")]
    pub password: String,

    /// Connect as an ATC observer/towerview instead of a pilot
    #[arg(long)]
    pub observer: bool,

    /// 4-letter SELCAL code, e.g. AB-CD
    #[arg(long)]
    pub selcal: Option<String>,

    /// Simulator plugin host:port, e.g. 127.0.0.1:45810
    #[arg(long, env = "XPILOT_RS_PLUGIN_ADDR")]
    pub plugin_addr: Option<PluginAddr>,
}

impl Options {
    pub fn bridge_endpoints(&self) -> BridgeEndpoints {
        let mut endpoints = BridgeEndpoints::default();
        if let Some(addr) = &self.plugin_addr {
            endpoints.plugin_host = addr.host.clone();
            endpoints.plugin_port = addr.port;
        }
        endpoints
    }
}

/// A small `FromStr` wrapper around `host:port`, kept separate from the
/// `clap::Parser` struct so the plugin-address parsing is independently
/// testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginAddr {
    pub host: String,
    pub port: u16,
}

impl FromStr for PluginAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| "expected host:port".to_string())?;
        let port: u16 = port.parse().map_err(|_| format!("{port} is not a valid port"))?;
        Ok(PluginAddr { host: host.to_string(), port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_addr_parses_host_and_port() {
        let addr: PluginAddr = "127.0.0.1:45810".parse().unwrap();
        assert_eq!(addr.host, "127.0.0.1");
        assert_eq!(addr.port, 45810);
    }

    #[test]
    fn plugin_addr_rejects_missing_port() {
        assert!("127.0.0.1".parse::<PluginAddr>().is_err());
    }
}
