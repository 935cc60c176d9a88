//! The two audio pump loops.
//!
//! Both take a fresh session snapshot every iteration, so a hangup or
//! transport error is observed within one frame. The loops themselves are
//! persistent: while no call is connected they simply discard everything,
//! which also keeps the capture device running across calls.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use paircall_protocol::Datagram;

use crate::engine::CallEngine;

/// Capture → seal → send. Muting withholds frames from the wire while the
/// capture side keeps producing them.
pub(crate) async fn run_send_loop(engine: CallEngine, mut capture: mpsc::Receiver<Bytes>) {
    while let Some(frame) = capture.recv().await {
        let Some(link) = engine.snapshot().await else {
            continue;
        };
        if link.muted {
            continue;
        }

        let sealed = match link.channel.seal(&frame) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!("failed to seal audio frame: {}", e);
                continue;
            }
        };

        let datagram = Datagram::audio(sealed).to_bytes();
        if let Err(e) = engine.socket.send_to(&datagram, link.peer).await {
            error!(peer = %link.peer, "audio send failed: {}", e);
            engine.fail_transport().await;
        }
    }
}

/// Open → playback for sealed frames the listener dispatched. Frames from
/// anyone but the current peer and frames that fail authentication are
/// dropped; neither ever tears the loop down.
pub(crate) async fn run_receive_loop(
    engine: CallEngine,
    mut inbound: mpsc::Receiver<(Bytes, SocketAddr)>,
) {
    while let Some((sealed, src)) = inbound.recv().await {
        let Some(link) = engine.snapshot().await else {
            trace!(src = %src, "audio datagram outside a call, dropping");
            continue;
        };
        if src != link.peer {
            trace!(src = %src, "ignoring audio datagram from non-peer address");
            continue;
        }

        match link.channel.open(&sealed) {
            Ok(frame) => {
                // Mute also silences local playback; decryption still ran
                // so the frame is consumed either way.
                if !link.muted {
                    let _ = engine.playback.send(Bytes::from(frame)).await;
                }
            }
            Err(_) => {
                debug!(peer = %src, "dropping audio frame that failed authentication");
            }
        }
    }
}
