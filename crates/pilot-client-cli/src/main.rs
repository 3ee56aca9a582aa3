mod cli;

use std::time::{Duration, Instant};

use clap::Parser;
use pilot_client::{ClientProperties, ConnectOptions, ManagerOutput, NetworkCredentials, NetworkManager};
use tokio::net::UdpSocket;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = cli::Options::parse();
    let bridge_endpoints = options.bridge_endpoints();

    let connect_options = ConnectOptions {
        server_address: options.server.clone(),
        credentials: NetworkCredentials { cid: options.cid.clone(), password: options.password.clone() },
        properties: ClientProperties {
            callsign: options.callsign.clone(),
            type_code: options.type_code.clone(),
            real_name: options.cid.clone(),
            selcal_code: options.selcal.clone(),
        },
        observer: options.observer,
    };

    let mut manager = NetworkManager::new(&options.callsign);

    info!(callsign = %options.callsign, server = %options.server, "connecting");
    if let Err(e) = manager.connect(&connect_options).await {
        error!(error = %e, "connect failed");
        std::process::exit(1);
    }

    let plugin_socket = bind_plugin_socket(&bridge_endpoints).await;
    let mut staleness_ticker = interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            poll_result = manager.poll(Instant::now()) => {
                match poll_result {
                    Ok(outputs) => log_outputs(outputs),
                    Err(e) => {
                        let fatal = e.is_fatal();
                        error!(error = %e, "network manager error");
                        if fatal {
                            break;
                        }
                    }
                }
            }
            _ = staleness_ticker.tick() => {
                let now = Instant::now();
                log_outputs(manager.staleness_tick(now));

                match manager.sim_bridge_tick(now) {
                    Ok(datagrams) => send_bridge_datagrams(plugin_socket.as_ref(), datagrams).await,
                    Err(e) => {
                        let fatal = e.is_fatal();
                        error!(error = %e, "simulator bridge error");
                        if fatal {
                            break;
                        }
                    }
                }
            }
        }
    }

    info!("disconnecting");
    manager.disconnect().await;
}

/// Bind an ephemeral UDP socket and connect it to the simulator plugin's
/// dataref channel. Returns `None` (rather than failing startup) if the
/// plugin address can't be bound or connected; bridge datagrams are then
/// silently dropped, matching a sim that hasn't launched yet.
async fn bind_plugin_socket(endpoints: &pilot_client::BridgeEndpoints) -> Option<UdpSocket> {
    let socket = match UdpSocket::bind(("0.0.0.0", 0)).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(error = %e, "could not bind simulator plugin UDP socket");
            return None;
        }
    };
    let plugin_addr = (endpoints.plugin_host.as_str(), endpoints.plugin_port);
    if let Err(e) = socket.connect(plugin_addr).await {
        warn!(error = %e, host = %endpoints.plugin_host, port = endpoints.plugin_port, "could not connect to simulator plugin");
        return None;
    }
    Some(socket)
}

async fn send_bridge_datagrams(socket: Option<&UdpSocket>, datagrams: Vec<Vec<u8>>) {
    let Some(socket) = socket else { return };
    for datagram in datagrams {
        if let Err(e) = socket.send(&datagram).await {
            warn!(error = %e, "failed to send simulator bridge datagram");
        }
    }
}

fn log_outputs(outputs: Vec<ManagerOutput>) {
    for output in outputs {
        match output {
            ManagerOutput::Network(event) => info!(?event, "network event"),
            ManagerOutput::RemoteAircraft(event) => info!(?event, "remote aircraft event"),
            ManagerOutput::Controller(event) => info!(?event, "controller event"),
            ManagerOutput::SimCommand(command) => info!(?command, "sim command"),
        }
    }
}
