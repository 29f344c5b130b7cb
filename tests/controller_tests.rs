mod common;

use common::*;
use spacebuild_client::adapters::inbound::{channel_transport, ChannelTransport};
use spacebuild_client::adapters::outbound::init_noop_logger;
use spacebuild_client::application::ConnectionController;
use spacebuild_client::domains::world_sync::{
    ConnectionState, EntityKind, EntityPayload, Position, TilePayload,
};
use spacebuild_client::{ClientError, ConnectionError, TransportError};
use std::sync::Arc;
use std::time::Duration;

use ConnectionState::*;

fn controller(transport: ChannelTransport, recorder: &Arc<Recorder>) -> ConnectionController<ChannelTransport> {
    ConnectionController::new(
        "ws://localhost:2567",
        transport,
        recorder.clone(),
        init_noop_logger(),
    )
}

#[tokio::test]
async fn test_tile_message_reaches_consumer_once() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.deliver_text(TILE_MESSAGE);
    peer.close();

    controller.start().await.unwrap();
    controller.run().await.unwrap();

    assert_eq!(
        recorder.updates(),
        vec![(
            EntityKind::Tile,
            EntityPayload::Tile(TilePayload { color: 3 }),
            Position::new(1.0, 0.0, 2.0)
        )]
    );
    assert!(recorder.errors().is_empty());
    assert_eq!(peer.connected_address().as_deref(), Some("ws://localhost:2567"));
}

#[tokio::test]
async fn test_server_close_goes_straight_to_closed() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.close();

    controller.start().await.unwrap();
    controller.run().await.unwrap();

    assert_eq!(controller.state(), Closed);
    assert_eq!(
        recorder.transitions(),
        vec![(Disconnected, Connecting), (Connecting, Open), (Open, Closed)]
    );
    assert!(!recorder.visited(Closing));
}

#[tokio::test]
async fn test_unknown_kind_is_skipped_silently() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.deliver_text(UNKNOWN_MESSAGE);
    peer.close();

    controller.start().await.unwrap();
    controller.run().await.unwrap();

    assert!(recorder.updates().is_empty());
    assert!(recorder.errors().is_empty());
}

#[tokio::test]
async fn test_decode_error_keeps_connection_open() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    controller.start().await.unwrap();

    peer.deliver_text(MISSING_COORDS_MESSAGE);
    assert_eq!(controller.tick().await.unwrap(), 1);

    assert_eq!(controller.state(), Open);
    assert!(recorder.updates().is_empty());
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, MISSING_COORDS_MESSAGE.as_bytes());

    // Later messages are still processed.
    peer.deliver_text(TILE_MESSAGE);
    controller.tick().await.unwrap();
    assert_eq!(recorder.updates().len(), 1);
    assert_eq!(recorder.errors().len(), 1);
}

#[tokio::test]
async fn test_bad_payload_dispatches_nothing_from_that_message() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    let raw = envelope(&[
        tile_block(1, 0.0, 0.0, 0.0),
        r#"{"block_type":"tile","block_json":"{\"colour\":1}","block_coords":[1,0,0]}"#.to_string(),
    ]);

    peer.open();
    peer.deliver_text(&raw);
    peer.close();

    controller.start().await.unwrap();
    controller.run().await.unwrap();

    assert!(recorder.updates().is_empty());
    assert_eq!(recorder.errors().len(), 1);
}

#[tokio::test]
async fn test_transport_error_while_open_is_absorbing() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.fail(TransportError::Io("connection reset".to_string()));
    peer.deliver_text(TILE_MESSAGE);

    controller.start().await.unwrap();
    let err = controller.run().await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(TransportError::Io(_))));
    assert_eq!(controller.state(), Errored);
    assert!(controller.connection().last_error.is_some());
    assert_eq!(
        recorder
            .transitions()
            .iter()
            .filter(|t| **t == (Open, Errored))
            .count(),
        1
    );
    assert!(recorder.updates().is_empty());

    // Errored absorbs: shutdown and further runs change nothing.
    controller.shutdown().await.unwrap();
    controller.run().await.unwrap();
    assert_eq!(controller.state(), Errored);
    assert_eq!(recorder.transitions().len(), 3);
}

#[tokio::test]
async fn test_connect_failure_surfaces_connection_error() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.fail(TransportError::Io("refused".to_string()));

    let err = controller.start().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Connection(ConnectionError::Handshake(_))
    ));
    assert_eq!(controller.state(), Errored);
    assert_eq!(
        recorder.transitions(),
        vec![(Disconnected, Connecting), (Connecting, Errored)]
    );
}

#[tokio::test]
async fn test_shutdown_while_connecting_reaches_closed() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    let handle = controller.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.shutdown();
    });

    // The peer never opens; only the shutdown can end the connect.
    controller.start().await.unwrap();

    assert_eq!(controller.state(), Closed);
    assert!(!recorder.visited(Open));
    assert_eq!(
        recorder.transitions(),
        vec![
            (Disconnected, Connecting),
            (Connecting, Closing),
            (Closing, Closed)
        ]
    );
    assert!(peer.close_requested());

    // A late open signal is never acted on.
    peer.open();
    controller.run().await.unwrap();
    assert_eq!(controller.state(), Closed);
}

#[tokio::test]
async fn test_shutdown_requested_before_start() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    controller.shutdown_handle().shutdown();
    controller.start().await.unwrap();

    assert_eq!(controller.state(), Closed);
    assert!(!recorder.visited(Open));
}

#[tokio::test]
async fn test_explicit_shutdown_from_open() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    controller.start().await.unwrap();
    controller.shutdown().await.unwrap();

    assert_eq!(controller.state(), Closed);
    assert!(peer.close_requested());
    assert_eq!(
        recorder.transitions()[2..],
        [(Open, Closing), (Closing, Closed)]
    );

    // No new messages once closing has begun.
    peer.deliver_text(TILE_MESSAGE);
    controller.run().await.unwrap();
    assert_eq!(controller.tick().await.unwrap(), 0);
    assert!(recorder.updates().is_empty());
}

#[tokio::test]
async fn test_shutdown_handle_stops_running_loop() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.deliver_text(TILE_MESSAGE);
    controller.start().await.unwrap();

    let handle = controller.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.shutdown();
    });

    controller.run().await.unwrap();
    assert_eq!(controller.state(), Closed);
    assert_eq!(recorder.updates().len(), 1);
    assert!(recorder.visited(Closing));
}

#[tokio::test]
async fn test_shutdown_before_start_closes_directly() {
    let (transport, _peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    controller.shutdown().await.unwrap();
    assert_eq!(controller.state(), Closed);
    assert_eq!(recorder.transitions(), vec![(Disconnected, Closed)]);

    let err = controller.start().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::InvalidTransition {
            from: Closed,
            to: Connecting
        }
    ));
}

#[tokio::test]
async fn test_updates_keep_arrival_order_across_messages() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    peer.deliver_text(&envelope(&[
        tile_block(1, 0.0, 0.0, 0.0),
        r#"{"block_type":"lamp","block_json":"{}","block_coords":[5,5,5]}"#.to_string(),
        tile_block(2, 1.0, 0.0, 0.0),
    ]));
    peer.deliver_text(&envelope(&[tile_block(3, 2.0, 0.0, 0.0)]));
    peer.close();

    controller.start().await.unwrap();
    controller.run().await.unwrap();

    let colors: Vec<i64> = recorder
        .updates()
        .into_iter()
        .map(|(_, payload, _)| match payload {
            EntityPayload::Tile(tile) => tile.color,
            other => panic!("unexpected payload {:?}", other),
        })
        .collect();
    assert_eq!(colors, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_frames_before_open_are_replayed() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.deliver_text(TILE_MESSAGE);
    peer.open();

    controller.start().await.unwrap();
    assert_eq!(controller.tick().await.unwrap(), 1);
    assert_eq!(recorder.updates().len(), 1);
}

#[tokio::test]
async fn test_tick_stops_after_close_event() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    peer.open();
    controller.start().await.unwrap();

    peer.deliver_text(TILE_MESSAGE);
    peer.close();
    peer.deliver_text(TILE_MESSAGE);

    assert_eq!(controller.tick().await.unwrap(), 2);
    assert_eq!(controller.state(), Closed);
    assert_eq!(recorder.updates().len(), 1);
}

#[tokio::test]
async fn test_run_ticking_drains_until_closed() {
    let (transport, peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller =
        controller(transport, &recorder).with_tick_interval(Duration::from_millis(5));

    peer.open();
    peer.deliver_text(TILE_MESSAGE);
    peer.deliver_text(UNKNOWN_MESSAGE);
    peer.close();

    controller.start().await.unwrap();
    controller.run_ticking().await.unwrap();

    assert_eq!(controller.state(), Closed);
    assert_eq!(recorder.updates().len(), 1);
}

#[tokio::test]
async fn test_login_is_sent_after_open() {
    let (transport, mut peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder).with_nickname("killer");

    peer.open();
    controller.start().await.unwrap();

    assert_eq!(
        peer.sent_frames(),
        vec![br#"{"Login":{"nickname":"killer"}}"#.to_vec()]
    );
}

#[tokio::test]
async fn test_send_requires_open_connection() {
    let (transport, mut peer) = channel_transport();
    let recorder = Arc::new(Recorder::default());
    let mut controller = controller(transport, &recorder);

    let err = controller.send(b"hello").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::NotConnected)
    ));
    assert_eq!(controller.state(), Disconnected);

    peer.open();
    controller.start().await.unwrap();
    controller.send(b"hello").await.unwrap();
    assert_eq!(peer.sent_frames(), vec![b"hello".to_vec()]);
}
