use assert_matches::assert_matches;
use bytes::Bytes;

use super::*;

use util::*;

fn options() -> ConnectionOptions {
    ConnectionOptions::new("unit.example.net")
}

fn accepted(tag: &'static [u8]) -> Delivery {
    Delivery {
        tag: Bytes::from_static(tag),
        remote_state: Some(DeliveryState::Accepted),
    }
}

#[test]
fn reactor_configures_the_poll_timeout() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.reactor_event(ReactorEvent::Init);
    assert_eq!(pair.engine.io_poll_timeout, Some(IO_POLL_TIMEOUT));

    pair.reactor_event(ReactorEvent::Final);
    assert_eq!(pair.engine.io_poll_timeout, Some(IO_POLL_TIMEOUT));
    assert_eq!(pair.engine.notices, vec![]);
}

#[test]
fn bring_up_stamps_identity_and_reports_open() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.bring_up();

    let open = pair.engine.connection.open.as_ref().expect("open issued");
    assert_eq!(open.hostname, "unit.example.net:5671");
    assert!(open.container_id.starts_with("alc-"));
    assert_eq!(open.properties, ConnectionProperties::default());

    assert_eq!(pair.engine.connection.local, EndpointState::Active);
    assert_eq!(
        pair.engine.transport.steps,
        vec![
            TransportStep::Tls(TlsDomain::client_anonymous()),
            TransportStep::Sasl(SaslMechanism::Anonymous),
        ]
    );
    assert_eq!(pair.engine.notices, vec![Notice::OpenComplete]);
}

#[test]
fn web_socket_proxy_transport_layering() {
    let _guard = subscribe();
    let mut transport = TransportOptions::default();
    transport.web_socket(true).proxy(ProxyOptions {
        address: "proxy.example.net:3128".into(),
        username: Some("user".into()),
        password: Some("pass".into()),
    });
    let mut options = options();
    options.transport(transport);
    assert_eq!(options.port(), HTTPS_PORT);
    assert_eq!(options.max_frame_size(), WEB_SOCKET_MAX_FRAME_SIZE);

    let mut pair = Harness::new(options);
    pair.bring_up();

    assert_matches!(
        pair.engine.transport.steps.as_slice(),
        [
            TransportStep::Layer(TransportLayer::Proxy(_)),
            TransportStep::Layer(TransportLayer::WebSocket(_)),
            TransportStep::Tls(_),
            TransportStep::Sasl(SaslMechanism::Anonymous),
        ]
    );
    match &pair.engine.transport.steps[0] {
        TransportStep::Layer(TransportLayer::Proxy(proxy)) => {
            assert_eq!(proxy.target, "unit.example.net:443");
            assert_eq!(proxy.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
        }
        other => panic!("expected proxy outermost, got {other:?}"),
    }
    match &pair.engine.transport.steps[1] {
        TransportStep::Layer(TransportLayer::WebSocket(ws)) => {
            assert_eq!(ws.host, "unit.example.net");
            assert_eq!(ws.path, WEB_SOCKET_PATH);
            assert_eq!(ws.protocol, WEB_SOCKET_PROTOCOL);
            assert_eq!(ws.max_frame_size, WEB_SOCKET_MAX_FRAME_SIZE);
        }
        other => panic!("expected WebSocket under the proxy, got {other:?}"),
    }
}

#[test]
fn remote_close_frees_exactly_once() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.bring_up();
    pair.engine.notices.clear();

    let condition = ErrorCondition::new(Condition::CONNECTION_FORCED, "maintenance");
    let close = pair.engine.remote_close_event(Some(condition.clone()));
    pair.connection_event(close);

    assert_eq!(pair.engine.connection.local, EndpointState::Closed);
    assert_eq!(pair.engine.connection.free_calls, 1);
    assert_eq!(
        pair.engine.notices,
        vec![Notice::ConnectionClosed(Some(condition))]
    );
}

#[test]
fn local_close_waits_for_the_peer() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.bring_up();
    pair.engine.notices.clear();

    pair.local_close();
    assert_eq!(pair.engine.connection.free_calls, 0);

    let close = pair.engine.remote_close_event(None);
    pair.connection_event(close);
    assert_eq!(pair.engine.connection.free_calls, 1);
    assert_eq!(pair.engine.notices, vec![Notice::ConnectionClosed(None)]);

    // closing again changes nothing
    pair.local_close();
    assert_eq!(pair.engine.connection.free_calls, 1);
}

#[test]
fn transport_error_is_terminal() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.bring_up();
    pair.engine.notices.clear();

    let condition = ErrorCondition::new(Condition::CONNECTION_FRAMING_ERROR, "bad header");
    pair.connection_event(ConnectionEvent::TransportError {
        error: Some(condition.clone()),
        connection_present: true,
    });
    assert_eq!(
        pair.engine.notices,
        vec![Notice::TransportError(Some(condition))]
    );
    assert_eq!(pair.engine.connection.free_calls, 1);

    pair.connection_event(ConnectionEvent::Final);
    assert!(!pair.engine.transport.bound);
    assert!(pair.engine.transport.freed);
}

#[test]
fn sender_open_then_credit() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.link_event(LinkEvent::LocalOpen);
    pair.link_event(LinkEvent::RemoteOpen {
        target: Some(Target {
            address: Some("queue-0".into()),
        }),
    });
    assert_eq!(pair.engine.notices, vec![Notice::OpenComplete]);

    pair.link_event(LinkEvent::Flow { credit: 100 });
    assert_eq!(
        pair.engine.notices,
        vec![Notice::OpenComplete, Notice::Flow(100)]
    );
}

#[test]
fn sender_credit_before_open_completes_it() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.link_event(LinkEvent::RemoteOpen { target: None });
    assert_eq!(pair.engine.notices, vec![]);

    pair.link_event(LinkEvent::Flow { credit: 50 });
    assert_eq!(
        pair.engine.notices,
        vec![Notice::OpenComplete, Notice::Flow(50)]
    );
}

#[test]
fn sender_settles_batches_in_order() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.link_event(LinkEvent::Delivery {
        deliveries: vec![
            accepted(b"d-1"),
            Delivery {
                tag: Bytes::from_static(b"d-2"),
                remote_state: Some(DeliveryState::Released),
            },
        ],
    });
    assert_eq!(
        pair.engine.link.settled,
        vec![Bytes::from_static(b"d-1"), Bytes::from_static(b"d-2")]
    );
    assert_eq!(
        pair.engine.notices,
        vec![
            Notice::SendComplete(Some(DeliveryState::Accepted)),
            Notice::SendComplete(Some(DeliveryState::Released)),
        ]
    );
}

#[test]
fn link_remote_close_cleans_up_the_session() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    let condition = ErrorCondition::new(Condition::NOT_FOUND, "no such queue");
    let close = pair.engine.link_remote_close_event(Some(condition.clone()));
    pair.link_event(close);

    assert_eq!(pair.engine.link.close_calls, 1);
    assert_eq!(pair.engine.session.close_calls, 1);
    assert!(pair.engine.session.local.is_closed());
    assert_eq!(
        pair.engine.notices,
        vec![Notice::LinkClosed(Some(LinkFailure::Remote(condition)))]
    );
}

#[test]
fn link_detach_mirrors_close() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    let detach = pair.engine.link_remote_detach_event(None);
    pair.link_event(detach);

    assert_eq!(pair.engine.link.close_calls, 1);
    assert_eq!(pair.engine.session.close_calls, 1);
    assert_eq!(pair.engine.notices, vec![Notice::LinkClosed(None)]);
}

#[test]
fn full_lifecycle() {
    let _guard = subscribe();
    let mut pair = Harness::new(options());
    pair.bring_up();

    pair.link_event(LinkEvent::LocalOpen);
    pair.link_event(LinkEvent::RemoteOpen {
        target: Some(Target {
            address: Some("queue-0".into()),
        }),
    });
    pair.link_event(LinkEvent::Flow { credit: 2 });
    pair.link_event(LinkEvent::Delivery {
        deliveries: vec![accepted(b"d-1")],
    });

    let close = pair.engine.link_remote_close_event(None);
    pair.link_event(close);
    let close = pair.engine.remote_close_event(None);
    pair.connection_event(close);
    pair.connection_event(ConnectionEvent::Final);

    assert_eq!(
        pair.engine.notices,
        vec![
            Notice::OpenComplete,
            Notice::OpenComplete,
            Notice::Flow(2),
            Notice::SendComplete(Some(DeliveryState::Accepted)),
            Notice::LinkClosed(None),
            Notice::ConnectionClosed(None),
        ]
    );
    assert_eq!(pair.engine.link.settled, vec![Bytes::from_static(b"d-1")]);
    assert!(pair.engine.link.local.is_closed());
    assert!(pair.engine.session.local.is_closed());
    assert_eq!(pair.engine.connection.free_calls, 1);
    assert!(!pair.engine.transport.bound);
    assert!(pair.engine.transport.freed);
}
