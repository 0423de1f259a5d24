use amp_protocol::{DeviceSettings, Effect, EffectFlags, Param, ParameterSet, FETCH_REQUEST};
use amp_remote::actor::{self, UiCommand, COMMAND_CAP, EVENT_CAP};
use amp_remote::{
    AlwaysAvailable, AmpConfig, ConnectionState, MockDevice, Session, SessionEvent, SettingsState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

fn config_for(addr: SocketAddr) -> AmpConfig {
    AmpConfig {
        connect_timeout: Duration::from_secs(1),
        idle_timeout: Duration::from_millis(100),
        response_timeout: Duration::from_secs(5),
        ..AmpConfig::default()
    }
    .with_endpoint(addr.ip().to_string(), addr.port())
}

async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("timeout waiting for session event")
        .expect("event channel closed")
}

#[tokio::test]
async fn actor_fetches_on_start_then_applies_edits() {
    let initial = DeviceSettings {
        flags: EffectFlags::new(false, true, false),
        params: ParameterSet::default(),
    };
    let device = MockDevice::spawn_with_addr("127.0.0.1:0", initial).expect("spawn device");
    let session = Session::with_network(config_for(device.listen_addr()), AlwaysAvailable);

    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAP);
    let task = tokio::spawn(actor::run(session, cmd_rx, event_tx));

    match next_event(&mut event_rx).await {
        SessionEvent::ExchangeSucceeded { settings, notice } => {
            assert_eq!(settings, initial);
            assert_eq!(notice, "Status OK");
        }
        other => panic!("expected start-up fetch, got {other:?}"),
    }

    cmd_tx
        .send(UiCommand::SetParameter(Param::Rate, 9.0))
        .await
        .expect("send");
    match next_event(&mut event_rx).await {
        SessionEvent::Settings { settings, dirty, labels, .. } => {
            assert_eq!(settings.params.rate, 9.0);
            assert!(dirty);
            assert_eq!(labels[0], "Rate: 9 cps");
        }
        other => panic!("expected settings, got {other:?}"),
    }

    cmd_tx
        .send(UiCommand::ToggleEffect(Effect::Tremolo))
        .await
        .expect("send");
    let _ = next_event(&mut event_rx).await;

    cmd_tx.send(UiCommand::SendPressed).await.expect("send");
    match next_event(&mut event_rx).await {
        SessionEvent::ExchangeSucceeded { settings, .. } => {
            assert_eq!(settings.flags, EffectFlags::new(true, true, false));
            assert_eq!(settings.params.rate, 9.0);
        }
        other => panic!("expected exchange, got {other:?}"),
    }

    let requests: Vec<String> = device.requests().try_iter().collect();
    assert_eq!(
        requests,
        vec![
            FETCH_REQUEST.to_string(),
            "GET /getsets/ 4 9 0.5 24000 0.5 6.5 0.1 HTTP/1.1\r\n".to_string(),
        ]
    );

    cmd_tx.send(UiCommand::Shutdown).await.expect("send");
    let session = task.await.expect("actor task");
    assert!(!session.settings().is_dirty());
    assert!(!session.settings().is_first_exchange());
}

#[tokio::test]
async fn second_press_mid_exchange_disconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        // Accept and read, but never answer.
        let Ok((mut socket, _)) = listener.accept().await else { return };
        let mut buf = [0u8; 256];
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let session = Session::with_network(config_for(addr), AlwaysAvailable);
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAP);
    let task = tokio::spawn(actor::run(session, cmd_rx, event_tx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    cmd_tx
        .send(UiCommand::SetParameter(Param::Gain, 2.0))
        .await
        .expect("send");
    cmd_tx.send(UiCommand::SendPressed).await.expect("send");

    assert!(matches!(
        next_event(&mut event_rx).await,
        SessionEvent::Disconnected
    ));
    // The edit queued during the exchange is applied afterwards.
    match next_event(&mut event_rx).await {
        SessionEvent::Settings { settings, .. } => assert_eq!(settings.params.gain, 2.0),
        other => panic!("expected settings, got {other:?}"),
    }

    drop(cmd_tx);
    let session = task.await.expect("actor task");
    assert!(session.settings().is_first_exchange());
}

#[tokio::test]
async fn press_queued_before_the_start_up_fetch_always_disconnects() {
    let device =
        MockDevice::spawn_with_addr("127.0.0.1:0", DeviceSettings::default()).expect("spawn device");

    for _ in 0..10 {
        let session = Session::with_network(config_for(device.listen_addr()), AlwaysAvailable);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
        let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAP);
        cmd_tx.send(UiCommand::SendPressed).await.expect("send");
        let task = tokio::spawn(actor::run(session, cmd_rx, event_tx));

        assert!(matches!(
            next_event(&mut event_rx).await,
            SessionEvent::Disconnected
        ));

        cmd_tx.send(UiCommand::SendPressed).await.expect("send");
        assert!(matches!(
            next_event(&mut event_rx).await,
            SessionEvent::ExchangeSucceeded { .. }
        ));

        drop(cmd_tx);
        let session = task.await.expect("actor task");
        assert!(!session.settings().is_first_exchange());
    }
}

#[tokio::test]
async fn no_network_is_reported_as_its_own_event() {
    let session = Session::with_network(
        config_for("127.0.0.1:9".parse().expect("addr")),
        || false,
    );
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAP);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAP);
    let task = tokio::spawn(actor::run(session, cmd_rx, event_tx));

    match next_event(&mut event_rx).await {
        SessionEvent::NetworkUnavailable { notice } => assert_eq!(notice, "Please Enable Wi-Fi!"),
        other => panic!("expected network unavailable, got {other:?}"),
    }

    cmd_tx.send(UiCommand::Shutdown).await.expect("send");
    task.await.expect("actor task");
}

#[test]
fn events_serialize_with_a_type_tag() {
    let json = serde_json::to_value(SessionEvent::Disconnected).expect("json");
    assert_eq!(json, serde_json::json!({ "type": "disconnected" }));

    let json = serde_json::to_value(SessionEvent::ExchangeFailed {
        reason: "no response within 10s".to_string(),
        notice: "ERROR reading from amp".to_string(),
    })
    .expect("json");
    assert_eq!(json["type"], "exchange_failed");
    assert_eq!(json["notice"], "ERROR reading from amp");

    let event = SessionEvent::settings(&SettingsState::new(), ConnectionState::Disconnected);
    let json = serde_json::to_value(event).expect("json");
    assert_eq!(json["type"], "settings");
    assert_eq!(json["connection"], "disconnected");
    assert_eq!(json["dirty"], false);
    assert_eq!(json["labels"][2], "Delay: 500 ms");
}
