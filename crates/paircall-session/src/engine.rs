//! The engine owning the shared UDP socket and the listener task.
//!
//! All socket reads happen on the listener, which drives the session state
//! machine for key-exchange datagrams and hands sealed audio off to the
//! receive pump. Writes come from `dial`/answer here and from the send
//! pump; tokio's `UdpSocket` supports that concurrent send/recv sharing.
//!
//! `CallEngine` is a cheap handle: clones share the socket and session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use paircall_crypto::{Identity, PublicKey};
use paircall_protocol::{Datagram, MAX_DATAGRAM_LEN};

use crate::error::SessionError;
use crate::pump;
use crate::state::{CallSession, CallState, KeyExchange, LinkSnapshot};

/// Capacity of the sealed-audio queue between listener and receive pump.
/// When the pump falls behind, frames are dropped rather than queued up.
const INBOUND_QUEUE: usize = 32;

#[derive(Clone)]
pub struct CallEngine {
    pub(crate) socket: Arc<UdpSocket>,
    identity: Arc<Identity>,
    pub(crate) session: Arc<Mutex<CallSession>>,
    pub(crate) playback: mpsc::Sender<Bytes>,
    dial_timeout: Option<Duration>,
}

impl CallEngine {
    /// Decrypted inbound frames are delivered to `playback`; `dial_timeout`
    /// bounds the otherwise unbounded wait in `Dialing` when set.
    pub fn new(
        socket: Arc<UdpSocket>,
        identity: Arc<Identity>,
        playback: mpsc::Sender<Bytes>,
        dial_timeout: Option<Duration>,
    ) -> Self {
        let session = Arc::new(Mutex::new(CallSession::new(identity.clone())));
        Self {
            socket,
            identity,
            session,
            playback,
            dial_timeout,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawn the listener and both audio pump loops. `capture` supplies
    /// plaintext frames from the local capture device.
    pub fn start(&self, capture: mpsc::Receiver<Bytes>) -> Vec<JoinHandle<()>> {
        let (audio_tx, audio_rx) = mpsc::channel(INBOUND_QUEUE);

        let listener = {
            let engine = self.clone();
            tokio::spawn(async move { engine.run_listener(audio_tx).await })
        };
        let send = {
            let engine = self.clone();
            tokio::spawn(async move { pump::run_send_loop(engine, capture).await })
        };
        let receive = {
            let engine = self.clone();
            tokio::spawn(async move { pump::run_receive_loop(engine, audio_rx).await })
        };

        vec![listener, send, receive]
    }

    /// Start a call: record the peer and send them our public key.
    pub async fn dial(&self, endpoint: SocketAddr) -> Result<(), SessionError> {
        let generation = self.session.lock().await.dial(endpoint)?;

        let key = Datagram::key(self.identity.public_key_bytes()).to_bytes();
        if let Err(e) = self.socket.send_to(&key, endpoint).await {
            self.fail_transport().await;
            return Err(e.into());
        }
        info!(peer = %endpoint, "dialing");

        if let Some(timeout) = self.dial_timeout {
            let engine = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                let mut session = engine.session.lock().await;
                // the generation check keeps this timer from touching any
                // later dial, including a redial of the same endpoint
                if session.abort_dial(endpoint, generation) {
                    session.finish();
                    warn!(peer = %endpoint, "dial timed out");
                }
            });
        }

        Ok(())
    }

    /// End the active call locally.
    pub async fn hangup(&self) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        session.hangup()?;
        session.finish();
        info!("call ended");
        Ok(())
    }

    /// Toggle mute; returns the new mute state.
    pub async fn toggle_mute(&self) -> Result<bool, SessionError> {
        let muted = self.session.lock().await.toggle_mute()?;
        info!(muted, "mute toggled");
        Ok(muted)
    }

    /// Current lifecycle state, peer, and mute flag.
    pub async fn status(&self) -> (CallState, Option<SocketAddr>, bool) {
        let session = self.session.lock().await;
        (session.state(), session.peer(), session.muted())
    }

    pub(crate) async fn snapshot(&self) -> Option<LinkSnapshot> {
        self.session.lock().await.snapshot()
    }

    /// Terminate the active call after a socket error.
    pub(crate) async fn fail_transport(&self) {
        let mut session = self.session.lock().await;
        session.on_transport_error();
        session.finish();
    }

    async fn run_listener(self, audio: mpsc::Sender<(Bytes, SocketAddr)>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            let (len, src) = match self.socket.recv_from(&mut buf).await {
                Ok(result) => result,
                Err(e) => {
                    error!("UDP recv error: {}", e);
                    self.fail_transport().await;
                    continue;
                }
            };

            match Datagram::from_bytes(&buf[..len]) {
                Ok(Datagram::Key { public_key }) => {
                    self.handle_key(PublicKey::from(public_key), src).await;
                }
                Ok(Datagram::Audio { sealed }) => {
                    // Never block the listener on a slow receive pump.
                    if audio.try_send((Bytes::from(sealed), src)).is_err() {
                        trace!(src = %src, "inbound audio queue full, dropping frame");
                    }
                }
                Err(e) => {
                    debug!(src = %src, "dropping malformed datagram: {}", e);
                }
            }
        }
    }

    async fn handle_key(&self, key: PublicKey, src: SocketAddr) {
        let action = self.session.lock().await.on_peer_key(src, key);
        match action {
            Ok(KeyExchange::Reply { to }) => {
                let reply = Datagram::key(self.identity.public_key_bytes()).to_bytes();
                match self.socket.send_to(&reply, to).await {
                    Ok(_) => {
                        self.session.lock().await.reply_sent();
                        info!(peer = %to, "answered incoming call");
                    }
                    Err(e) => {
                        warn!(peer = %to, "key reply failed: {}", e);
                        self.fail_transport().await;
                    }
                }
            }
            Ok(KeyExchange::Completed) => {
                info!(peer = %src, "call connected");
            }
            Ok(KeyExchange::Ignored) => {
                debug!(src = %src, "ignoring key datagram from non-peer address");
            }
            Err(e) => {
                warn!(src = %src, "failed to establish secure channel: {}", e);
            }
        }
    }
}
