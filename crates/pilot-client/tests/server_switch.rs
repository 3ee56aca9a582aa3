use pilot_client::events::FsdEvent;
use pilot_client::fsd_client::{ConnectionState, FsdClient};
use tokio::net::TcpListener;

/// Scenario 6: an active session switches servers mid-flight. On successful
/// reconnect the socket is replaced and the client lands back in `Active`
/// without ever reporting `Disconnected`.
#[tokio::test]
async fn server_switch_replaces_socket_without_disconnect_event() {
    let original_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let original_addr = original_listener.local_addr().unwrap();
    let _original_accept = tokio::spawn(async move {
        let _ = original_listener.accept().await;
    });

    let new_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let new_addr = new_listener.local_addr().unwrap();
    let new_accept = tokio::spawn(async move {
        let _ = new_listener.accept().await;
    });

    let mut client = FsdClient::new("FLC1");
    client.connect(&original_addr.ip().to_string()).await.unwrap();

    let event = client.switch_server(&new_addr.ip().to_string()).await.unwrap();
    assert!(event.is_none(), "a successful switch must not emit Disconnected");
    assert_eq!(client.state(), ConnectionState::Active);

    new_accept.await.unwrap();
}

/// When the new host is unreachable and the prior socket is already gone,
/// the switch reports `NetworkDisconnected` instead of propagating a
/// transport error.
#[tokio::test]
async fn unreachable_new_host_with_no_prior_socket_emits_disconnected() {
    // Bind then immediately drop the listener, so the port refuses the
    // connection fast instead of timing out.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let refused_addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = FsdClient::new("FLC1");
    let event = client.switch_server(&refused_addr.ip().to_string()).await.unwrap();
    assert!(matches!(event, Some(FsdEvent::NetworkDisconnected)));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
