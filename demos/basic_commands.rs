//! Example: basic commands against a live Redis server
//!
//! Usage: cargo run --example basic_commands [host] [port]

use redis_handle_rs::prelude::*;
use std::env;

fn main() -> Result<()> {
    redis_handle_rs::init();

    let host = env::args().nth(1).unwrap_or_else(|| "127.0.0.1".to_string());
    let port = env::args()
        .nth(2)
        .map(|p| {
            p.parse::<u16>()
                .map_err(|e| RedisHandleError::config_error(format!("bad port {}: {}", p, e)))
        })
        .transpose()?
        .unwrap_or(redis_handle_rs::config::DEFAULT_PORT);

    let mut handle = RedisHandle::connect(&host, port)?;
    handle.set_timeout(5, 0)?;
    println!("Connected to {}:{} (timeout {:?})", host, port, handle.get_timeout()?);

    println!("SET demo:key -> {}", handle.command(["SET", "demo:key", "value"])?);
    println!("GET demo:key -> {}", handle.command(["GET", "demo:key"])?);

    let binary = CommandArgs::command("SET").arg("demo:bin").arg(&b"zero\0byte"[..]);
    println!("SET demo:bin -> {}", handle.command(binary)?);
    println!("GET demo:bin -> {}", handle.command(["GET", "demo:bin"])?);

    for i in 0..5 {
        handle.append(CommandArgs::command("INCRBY").arg("demo:counter").arg(i))?;
    }
    println!("Pipelined {} commands", handle.pending_replies());
    while handle.pending_replies() > 0 {
        println!("  reply -> {}", handle.get_reply()?);
    }

    match handle.command(["GET"]) {
        Err(RedisHandleError::Server(msg)) => {
            println!("Server refused GET: {}", String::from_utf8_lossy(&msg))
        }
        other => println!("Unexpected: {:?}", other),
    }

    println!(
        "DEL -> {}",
        handle.command(["DEL", "demo:key", "demo:bin", "demo:counter"])?
    );

    handle.close();
    println!("State after close: {}", handle.state());
    Ok(())
}
