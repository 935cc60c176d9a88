use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::info;

mod config;

use config::ClientConfig;
use paircall_audio::device::{self, Direction};
use paircall_audio::{capture, frame, playback};
use paircall_crypto::Identity;
use paircall_session::CallEngine;

/// Depth of the frame channels between the audio bridges and the engine.
const FRAME_QUEUE: usize = 32;

#[derive(Parser)]
#[command(name = "paircall", about = "Direct encrypted peer-to-peer voice calls")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address (IP), overrides config
    #[arg(long)]
    host: Option<String>,

    /// UDP port, overrides config (0 = ephemeral)
    #[arg(short, long)]
    port: Option<u16>,

    /// Call this peer (host:port) immediately on startup
    #[arg(short, long)]
    dial: Option<String>,

    /// Capture device name, overrides config
    #[arg(long)]
    input_device: Option<String>,

    /// Playback device name, overrides config
    #[arg(long)]
    output_device: Option<String>,

    /// Give up on an unanswered dial after this many seconds
    #[arg(long)]
    dial_timeout: Option<u64>,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paircall=info".into()),
        )
        .init();

    let args = Args::parse();

    if args.list_devices {
        return print_devices();
    }

    let mut config = if let Some(config_path) = &args.config {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path))?;
        toml::from_str(&content)?
    } else {
        ClientConfig::default()
    };

    // CLI overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(device) = args.input_device {
        config.input_device = Some(device);
    }
    if let Some(device) = args.output_device {
        config.output_device = Some(device);
    }
    if let Some(secs) = args.dial_timeout {
        config.dial_timeout_secs = Some(secs);
    }

    // Keys are ephemeral: a restart is a new identity.
    let identity = Arc::new(Identity::generate());

    let socket = bind_udp(&config.host, config.port)?;
    let local_addr = socket.local_addr()?;
    info!(addr = %local_addr, "listening");
    println!("your address: {}", local_addr);

    // Audio must come up before any call can be placed or taken.
    let (_capture_stream, pcm_in) = capture::start_capture(config.input_device.as_deref())
        .context("failed to open capture device")?;
    let (_playback_stream, pcm_out) = playback::start_playback(config.output_device.as_deref())
        .context("failed to open playback device")?;

    let (capture_tx, capture_rx) = mpsc::channel(FRAME_QUEUE);
    let (playback_tx, playback_rx) = mpsc::channel(FRAME_QUEUE);
    frame::spawn_capture_framer(pcm_in, capture_tx);
    frame::spawn_playback_writer(playback_rx, pcm_out);

    let engine = CallEngine::new(
        socket,
        identity,
        playback_tx,
        config.dial_timeout_secs.map(Duration::from_secs),
    );
    engine.start(capture_rx);

    if let Some(target) = &args.dial {
        dial(&engine, target).await;
    }

    run_repl(engine).await;

    Ok(())
}

/// Bind the shared UDP socket with enlarged buffers to absorb audio bursts.
fn bind_udp(host: &str, port: u16) -> Result<Arc<UdpSocket>> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", host, port))?;

    let sock = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )
    .context("failed to create UDP socket")?;
    let _ = sock.set_recv_buffer_size(512 * 1024);
    let _ = sock.set_send_buffer_size(512 * 1024);
    sock.bind(&addr.into())
        .with_context(|| format!("failed to bind UDP on {}", addr))?;
    sock.set_nonblocking(true)
        .context("failed to set non-blocking")?;

    let std_sock: std::net::UdpSocket = sock.into();
    Ok(Arc::new(
        UdpSocket::from_std(std_sock).context("failed to wrap UDP socket in tokio")?,
    ))
}

fn print_devices() -> Result<()> {
    println!("capture devices:");
    for dev in device::list_devices(Direction::Input)? {
        let marker = if dev.is_default { " (default)" } else { "" };
        println!("  {}{}", dev.name, marker);
    }
    println!("playback devices:");
    for dev in device::list_devices(Direction::Output)? {
        let marker = if dev.is_default { " (default)" } else { "" };
        println!("  {}{}", dev.name, marker);
    }
    Ok(())
}

async fn dial(engine: &CallEngine, target: &str) {
    let addr = match tokio::net::lookup_host(target).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                println!("no address found for {}", target);
                return;
            }
        },
        Err(e) => {
            println!("cannot resolve {}: {}", target, e);
            return;
        }
    };

    if let Err(e) = engine.dial(addr).await {
        println!("dial failed: {}", e);
    }
}

async fn run_repl(engine: CallEngine) {
    println!("commands: dial <host:port> | hangup | mute | status | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("dial") => match parts.next() {
                Some(target) => dial(&engine, target).await,
                None => println!("usage: dial <host:port>"),
            },
            Some("hangup") => {
                if let Err(e) = engine.hangup().await {
                    println!("{}", e);
                }
            }
            Some("mute") => match engine.toggle_mute().await {
                Ok(true) => println!("muted"),
                Ok(false) => println!("unmuted"),
                Err(e) => println!("{}", e),
            },
            Some("status") => {
                let (state, peer, muted) = engine.status().await;
                match peer {
                    Some(peer) => println!("{:?}, peer {}, muted: {}", state, peer, muted),
                    None => println!("{:?}", state),
                }
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {}", other),
            None => {}
        }
    }
}
