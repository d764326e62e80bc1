//! Only the pure decode path is exercised here; `handle_start` forks a
//! real Daemonise chain and isn't suitable for an automated test run.

use daemond_protocol::{Request, RequestError};

#[test]
fn start_request_round_trips_through_the_wire_format() {
    let encoded = daemond_protocol::encode_argv(&["start", "mydaemon", "--flag"]);
    let req = Request::decode(&encoded).unwrap();
    assert_eq!(
        req,
        Request::Start {
            name: "mydaemon".into(),
            args: vec!["--flag".into()],
        }
    );
}

#[test]
fn malformed_message_is_reported_as_a_wire_error() {
    let err = Request::decode(b"no-terminator").unwrap_err();
    assert!(matches!(err, RequestError::Wire(_)));
}
