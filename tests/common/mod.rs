//! In-process mock Redis server for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Maps one received command to raw RESP bytes; `None` closes the connection.
pub type Handler = Arc<dyn Fn(&[Vec<u8>]) -> Option<Vec<u8>> + Send + Sync>;

pub struct MockServer {
    pub port: u16,
    received: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
}

impl MockServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&[Vec<u8>]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let log = received.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let reader = stream.try_clone().expect("clone");
                let handler = handler.clone();
                let log = log.clone();
                thread::spawn(move || serve(reader, stream, handler, log));
            }
        });

        MockServer { port, received }
    }

    /// Server with a tiny in-memory keyspace
    pub fn kv() -> Self {
        let store: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>> = Arc::new(Mutex::new(HashMap::new()));
        Self::start(move |args| Some(kv_reply(&store, args)))
    }

    /// Commands received so far, across all connections
    pub fn received(&self) -> Vec<Vec<Vec<u8>>> {
        self.received.lock().unwrap().clone()
    }
}

#[cfg(unix)]
pub fn start_unix<F>(path: &std::path::Path, handler: F)
where
    F: Fn(&[Vec<u8>]) -> Option<Vec<u8>> + Send + Sync + 'static,
{
    let listener = std::os::unix::net::UnixListener::bind(path).expect("bind unix");
    let handler: Handler = Arc::new(handler);
    let log = Arc::new(Mutex::new(Vec::new()));
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let reader = stream.try_clone().expect("clone");
            let handler = handler.clone();
            let log = log.clone();
            thread::spawn(move || serve(reader, stream, handler, log));
        }
    });
}

fn serve<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    handler: Handler,
    log: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
) {
    let mut reader = BufReader::new(reader);
    let mut parser = redis::Parser::new();
    while let Some(args) = read_command(&mut parser, &mut reader) {
        log.lock().unwrap().push(args.clone());
        match handler(&args) {
            Some(reply) => {
                if writer.write_all(&reply).is_err() {
                    return;
                }
                let _ = writer.flush();
            }
            None => return,
        }
    }
}

// Commands arrive as arrays of bulk strings.
fn read_command<R: Read>(parser: &mut redis::Parser, reader: &mut R) -> Option<Vec<Vec<u8>>> {
    match parser.parse_value(reader).ok()? {
        redis::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                redis::Value::BulkString(data) => Some(data),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

pub fn status(msg: &str) -> Vec<u8> {
    format!("+{}\r\n", msg).into_bytes()
}

pub fn error(msg: &str) -> Vec<u8> {
    format!("-{}\r\n", msg).into_bytes()
}

pub fn integer(value: i64) -> Vec<u8> {
    format!(":{}\r\n", value).into_bytes()
}

pub fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

pub fn nil() -> Vec<u8> {
    b"$-1\r\n".to_vec()
}

fn wrong_arity(name: &[u8]) -> Vec<u8> {
    error(&format!(
        "ERR wrong number of arguments for '{}' command",
        String::from_utf8_lossy(name).to_lowercase()
    ))
}

fn kv_reply(store: &Mutex<HashMap<Vec<u8>, Vec<u8>>>, args: &[Vec<u8>]) -> Vec<u8> {
    let name = args[0].to_ascii_uppercase();
    if name == b"SLEEP" && args.len() == 2 {
        let millis = std::str::from_utf8(&args[1]).unwrap().parse().unwrap();
        thread::sleep(Duration::from_millis(millis));
        return status("OK");
    }

    let mut store = store.lock().unwrap();
    match (name.as_slice(), args.len()) {
        (b"PING", 1) => status("PONG"),
        (b"ECHO", 2) => bulk(&args[1]),
        (b"SET", 3) => {
            store.insert(args[1].clone(), args[2].clone());
            status("OK")
        }
        (b"GET", 2) => match store.get(&args[1]) {
            Some(value) => bulk(value),
            None => nil(),
        },
        (b"DEL", n) if n >= 2 => {
            let removed = args[1..].iter().filter(|k| store.remove(*k).is_some()).count();
            integer(removed as i64)
        }
        (b"INCR", 2) => {
            let current = store
                .get(&args[1])
                .and_then(|v| std::str::from_utf8(v).ok()?.parse::<i64>().ok())
                .unwrap_or(0);
            store.insert(args[1].clone(), (current + 1).to_string().into_bytes());
            integer(current + 1)
        }
        (b"LRANGE", 4) => b"*0\r\n".to_vec(),
        (b"NESTED", 1) => b"*3\r\n:1\r\n*2\r\n$1\r\na\r\n$-1\r\n*0\r\n".to_vec(),
        (b"DOUBLE", 1) => b",3.14\r\n".to_vec(),
        (b"ARGS", _) => {
            let mut out = format!("*{}\r\n", args.len()).into_bytes();
            for arg in args {
                out.extend_from_slice(&bulk(arg));
            }
            out
        }
        (b"PING" | b"ECHO" | b"SET" | b"GET" | b"DEL" | b"INCR" | b"LRANGE", _) => {
            wrong_arity(&args[0])
        }
        _ => error(&format!(
            "ERR unknown command '{}'",
            String::from_utf8_lossy(&args[0])
        )),
    }
}
