mod common;

use bytes::Bytes;
use common::{status, MockServer};
use redis_handle_rs::prelude::*;

fn connect(server: &MockServer) -> RedisHandle {
    RedisHandle::connect("127.0.0.1", server.port).expect("connect")
}

fn bulk(data: &'static [u8]) -> ReplyValue {
    ReplyValue::BulkString(Bytes::from_static(data))
}

#[test]
fn set_get_del_scenario() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    assert_eq!(
        handle.command(["SET", "k", "v"]).unwrap(),
        ReplyValue::Status(Bytes::from_static(b"OK"))
    );
    assert_eq!(handle.command(["GET", "k"]).unwrap(), bulk(b"v"));
    assert_eq!(handle.command(["DEL", "k"]).unwrap(), ReplyValue::Integer(1));
    assert_eq!(handle.command(["GET", "k"]).unwrap(), ReplyValue::Nil);
}

#[test]
fn reply_shapes_follow_tag_table() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    assert_eq!(
        handle.command(["PING"]).unwrap(),
        ReplyValue::Status(Bytes::from_static(b"PONG"))
    );
    assert_eq!(handle.command(["INCR", "n"]).unwrap(), ReplyValue::Integer(1));
    assert_eq!(handle.command(["GET", "missing"]).unwrap(), ReplyValue::Nil);
    assert_eq!(handle.command(["ECHO", "hello"]).unwrap(), bulk(b"hello"));
    assert_eq!(
        handle.command(["LRANGE", "missing", "0", "-1"]).unwrap(),
        ReplyValue::Array(vec![])
    );
    assert_eq!(
        handle.command(["NESTED"]).unwrap(),
        ReplyValue::Array(vec![
            ReplyValue::Integer(1),
            ReplyValue::Array(vec![bulk(b"a"), ReplyValue::Nil]),
            ReplyValue::Array(vec![]),
        ])
    );
    assert_eq!(handle.command(["DOUBLE"]).unwrap(), ReplyValue::Nil);
}

#[test]
fn server_error_carries_literal_text() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    let err = handle.command(["GET"]).unwrap_err();
    match &err {
        RedisHandleError::Server(payload) => assert_eq!(
            &payload[..],
            b"ERR wrong number of arguments for 'get' command"
        ),
        other => panic!("expected a server error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "ERR wrong number of arguments for 'get' command");

    // A refused command leaves the connection usable.
    assert_eq!(handle.state(), HandleState::Open);
    assert_eq!(handle.error_message().unwrap(), None);
    assert_eq!(handle.command(["PING"]).unwrap().type_name(), "status");
}

#[test]
fn pipelined_replies_come_back_in_append_order() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    for k in [1usize, 2, 10] {
        for i in 0..k {
            handle.append(["ECHO".to_string(), format!("reply-{}-{}", k, i)]).unwrap();
        }
        assert_eq!(handle.pending_replies(), k);

        for i in 0..k {
            let expected = format!("reply-{}-{}", k, i);
            assert_eq!(
                handle.get_reply().unwrap(),
                ReplyValue::BulkString(Bytes::from(expected))
            );
        }
        assert_eq!(handle.pending_replies(), 0);
    }
}

#[test]
fn pipelined_error_reply_is_promoted_in_place() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    handle.append(["SET", "a", "1"]).unwrap();
    handle.append(["GET"]).unwrap();
    handle.append(["INCR", "a"]).unwrap();

    assert!(handle.get_reply().unwrap().as_bytes().is_some());
    assert!(handle.get_reply().unwrap_err().is_server_error());
    assert_eq!(handle.get_reply().unwrap(), ReplyValue::Integer(2));
}

#[test]
fn fast_and_heap_argument_paths_match() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    let short: Vec<String> = std::iter::once("ARGS".to_string())
        .chain((1..3).map(|i| format!("a{}", i)))
        .collect();
    let long: Vec<String> = std::iter::once("ARGS".to_string())
        .chain((1..20).map(|i| format!("a{}", i)))
        .collect();

    let short_reply = handle.command(short.clone()).unwrap();
    let long_reply = handle.command(long.clone()).unwrap();

    let expect = |args: &[String]| {
        ReplyValue::Array(
            args.iter()
                .map(|a| ReplyValue::BulkString(Bytes::from(a.clone())))
                .collect(),
        )
    };
    assert_eq!(short_reply, expect(&short));
    assert_eq!(long_reply, expect(&long));
    assert_eq!(long_reply.as_array().unwrap().len(), 20);

    let received = server.received();
    assert_eq!(received[0].len(), 3);
    assert_eq!(received[1].len(), 20);
}

#[test]
fn embedded_zero_byte_is_not_truncated() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    let value: &[u8] = b"before\0after";
    handle
        .command(CommandArgs::command("SET").arg("bin").arg(value))
        .unwrap();
    assert_eq!(
        handle.command(["GET", "bin"]).unwrap(),
        ReplyValue::BulkString(Bytes::from_static(b"before\0after"))
    );

    let received = server.received();
    assert_eq!(received[0][2], b"before\0after".to_vec());
}

#[test]
fn closed_handle_never_touches_the_transport() {
    let server = MockServer::kv();
    let mut handle = connect(&server);
    handle.close();
    handle.close();

    assert!(matches!(
        handle.command(["PING"]),
        Err(RedisHandleError::InvalidState(_))
    ));
    assert!(matches!(
        handle.append(["PING"]),
        Err(RedisHandleError::InvalidState(_))
    ));
    assert!(matches!(handle.get_reply(), Err(RedisHandleError::InvalidState(_))));
    assert!(server.received().is_empty());
}

#[test]
fn dropped_connection_records_eof_and_blocks_dispatch() {
    let server = MockServer::start(|args| {
        if args[0] == b"QUIT" {
            None
        } else {
            Some(status("OK"))
        }
    });
    let mut handle = connect(&server);

    let err = handle.command(["QUIT"]).unwrap_err();
    assert!(matches!(
        err,
        RedisHandleError::Transport { code: ErrorCode::Eof, .. }
    ));
    assert_eq!(handle.state(), HandleState::Errored);
    assert_eq!(handle.error_code().unwrap(), Some(ErrorCode::Eof));
    assert_eq!(
        handle.error_message().unwrap().as_deref(),
        Some("Server closed the connection")
    );

    // Errored handles refuse further commands until reconnected.
    assert!(matches!(
        handle.command(["PING"]),
        Err(RedisHandleError::Protocol(_))
    ));

    handle.reconnect().unwrap();
    assert_eq!(handle.state(), HandleState::Open);
    assert_eq!(handle.error_code().unwrap(), None);
    assert_eq!(
        handle.command(["PING"]).unwrap(),
        ReplyValue::Status(Bytes::from_static(b"OK"))
    );
}

#[test]
fn reconnect_to_vanished_server_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let mut handle = RedisHandle::connect("127.0.0.1", port).unwrap();
    drop(listener);

    let err = handle.reconnect().unwrap_err();
    assert!(matches!(
        err,
        RedisHandleError::Connection(ref m) if m.starts_with("error reconnecting to redis server")
    ));
    assert_eq!(handle.state(), HandleState::Errored);
    assert_eq!(handle.error_code().unwrap(), Some(ErrorCode::Io));
    assert!(matches!(
        handle.command(["PING"]),
        Err(RedisHandleError::Protocol(_))
    ));
}

#[test]
fn read_timeout_surfaces_as_io_transport_error() {
    let server = MockServer::kv();
    let mut handle = connect(&server);
    handle.set_timeout(0, 200_000).unwrap();
    assert_eq!(handle.get_timeout().unwrap(), (0, 200_000));

    let err = handle.command(["SLEEP", "1000"]).unwrap_err();
    assert!(matches!(
        err,
        RedisHandleError::Transport { code: ErrorCode::Io, .. }
    ));
    assert_eq!(handle.error_code().unwrap(), Some(ErrorCode::Io));
    assert!(matches!(handle.get_timeout(), Err(RedisHandleError::Protocol(_))));

    // The timeout survives a reconnect.
    handle.reconnect().unwrap();
    assert_eq!(handle.get_timeout().unwrap(), (0, 200_000));
    assert_eq!(handle.command(["ECHO", "back"]).unwrap(), bulk(b"back"));
}

#[test]
fn set_timeout_chains() {
    let server = MockServer::kv();
    let mut handle = connect(&server);

    let reply = handle.set_timeout(1, 0).unwrap().command(["PING"]).unwrap();
    assert_eq!(reply, ReplyValue::Status(Bytes::from_static(b"PONG")));
}

#[test]
fn handle_config_applies_on_connect() {
    let server = MockServer::kv();
    let config = HandleConfig::from_json_str(
        r#"{"timeout": {"secs": 1, "nanos": 500000000}, "connect_timeout": {"secs": 2, "nanos": 0}}"#,
    )
    .unwrap();
    let mut handle =
        RedisHandle::connect_with_config(ConnectTarget::tcp("127.0.0.1", server.port), config)
            .unwrap();
    assert_eq!(handle.get_timeout().unwrap(), (1, 500_000));
    assert_eq!(
        handle.target(),
        Some(&ConnectTarget::tcp("127.0.0.1", server.port))
    );
    assert_eq!(handle.command(["PING"]).unwrap().type_name(), "status");
}

#[test]
fn output_buffer_limit_fails_append() {
    let server = MockServer::kv();
    let config = HandleConfig {
        max_output_buffer: 64,
        ..HandleConfig::default()
    };
    let mut handle =
        RedisHandle::connect_with_config(ConnectTarget::tcp("127.0.0.1", server.port), config)
            .unwrap();

    handle.append(["PING"]).unwrap();
    let err = handle.append(["SET", "k", "x".repeat(100).as_str()]).unwrap_err();
    assert!(matches!(
        err,
        RedisHandleError::Transport { code: ErrorCode::Other, .. }
    ));
    assert_eq!(handle.state(), HandleState::Errored);
}

#[cfg(unix)]
#[test]
fn unix_socket_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("redis.sock");
    common::start_unix(&path, |args| Some(common::bulk(&args[args.len() - 1])));

    let mut handle = RedisHandle::connect_unix(&path).unwrap();
    assert_eq!(handle.command(["ECHO", "over-unix"]).unwrap(), bulk(b"over-unix"));

    handle.set_timeout(3, 0).unwrap();
    assert_eq!(handle.get_timeout().unwrap(), (3, 0));

    handle.close();
    assert_eq!(handle.state(), HandleState::Closed);
}

#[cfg(unix)]
#[test]
fn unix_socket_missing_path_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let err = RedisHandle::connect_unix(dir.path().join("absent.sock")).unwrap_err();
    assert!(matches!(err, RedisHandleError::Protocol(_)));
}
