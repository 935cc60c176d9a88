//! The call state machine.
//!
//! `CallSession` is the single owner of everything the listener and the
//! audio pump loops share: lifecycle state, the active peer, the derived
//! secure channel, and the mute flag. The engine keeps it behind a mutex;
//! the pump loops only ever read a [`LinkSnapshot`] taken per iteration.

use std::net::SocketAddr;
use std::sync::Arc;

use paircall_crypto::{Identity, PublicKey, SecureChannel};

use crate::error::SessionError;

/// Lifecycle of the (at most one) active call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call. The only state in which a dial or an incoming key is accepted.
    Idle,
    /// Our key has been sent; waiting for the peer's key. Unbounded unless
    /// a dial timeout is configured.
    Dialing,
    /// Incoming key accepted; our reply is on its way out.
    Answering,
    /// Both keys known, audio may flow.
    Connected,
    /// Call torn down; `finish` returns the machine to `Idle`.
    Ended,
}

/// What the listener must do after feeding in a key-exchange datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchange {
    /// Incoming call accepted: send our own key back to `to`.
    Reply { to: SocketAddr },
    /// The key completed our pending dial.
    Completed,
    /// Key from a non-peer address, or received mid-call: dropped.
    Ignored,
}

/// A consistent view of the active link for one pump iteration.
#[derive(Clone)]
pub struct LinkSnapshot {
    pub peer: SocketAddr,
    pub channel: Arc<SecureChannel>,
    pub muted: bool,
}

pub struct CallSession {
    identity: Arc<Identity>,
    state: CallState,
    peer: Option<SocketAddr>,
    channel: Option<Arc<SecureChannel>>,
    muted: bool,
    dial_seq: u64,
}

impl CallSession {
    pub fn new(identity: Arc<Identity>) -> Self {
        Self {
            identity,
            state: CallState::Idle,
            peer: None,
            channel: None,
            muted: false,
            dial_seq: 0,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Start an outbound call. The caller is responsible for sending the
    /// key-exchange datagram to `endpoint` afterwards.
    ///
    /// Returns a generation number identifying this particular dial; a
    /// deadline task must pass it back to [`abort_dial`](Self::abort_dial)
    /// so it can only cancel the dial it was armed for.
    pub fn dial(&mut self, endpoint: SocketAddr) -> Result<u64, SessionError> {
        if self.state != CallState::Idle || self.peer.is_some() {
            return Err(SessionError::CallInProgress);
        }
        self.peer = Some(endpoint);
        self.state = CallState::Dialing;
        self.dial_seq += 1;
        Ok(self.dial_seq)
    }

    /// Feed in a key-exchange datagram received from `from`.
    ///
    /// While idle this answers the call; while dialing a key from the
    /// dialed address completes the handshake. Anything else is ignored:
    /// one peer at a time, no mid-call renegotiation.
    pub fn on_peer_key(
        &mut self,
        from: SocketAddr,
        key: PublicKey,
    ) -> Result<KeyExchange, SessionError> {
        match self.state {
            CallState::Idle => {
                let channel = self.identity.channel_with(&key)?;
                self.peer = Some(from);
                self.channel = Some(Arc::new(channel));
                self.state = CallState::Answering;
                Ok(KeyExchange::Reply { to: from })
            }
            CallState::Dialing if self.peer == Some(from) => {
                let channel = self.identity.channel_with(&key)?;
                self.channel = Some(Arc::new(channel));
                self.state = CallState::Connected;
                Ok(KeyExchange::Completed)
            }
            _ => Ok(KeyExchange::Ignored),
        }
    }

    /// The answering reply went out; the handshake is complete on our side.
    pub fn reply_sent(&mut self) {
        if self.state == CallState::Answering {
            self.state = CallState::Connected;
        }
    }

    /// Locally end the active call. Teardown is unilateral: there is no
    /// notification datagram, the peer learns nothing until it hangs up too.
    pub fn hangup(&mut self) -> Result<(), SessionError> {
        match self.state {
            CallState::Dialing | CallState::Answering | CallState::Connected => {
                self.end();
                Ok(())
            }
            CallState::Idle | CallState::Ended => Err(SessionError::NotInCall),
        }
    }

    /// A socket error during an active call ends it locally.
    pub fn on_transport_error(&mut self) {
        if matches!(
            self.state,
            CallState::Dialing | CallState::Answering | CallState::Connected
        ) {
            self.end();
        }
    }

    /// Give up on the pending dial identified by `generation`. Returns
    /// false if that dial already completed, was hung up, or was replaced
    /// by a newer dial, even one to the same endpoint.
    pub fn abort_dial(&mut self, endpoint: SocketAddr, generation: u64) -> bool {
        if self.state == CallState::Dialing
            && self.peer == Some(endpoint)
            && self.dial_seq == generation
        {
            self.end();
            true
        } else {
            false
        }
    }

    /// Return from `Ended` to `Idle`, ready for the next call.
    pub fn finish(&mut self) {
        if self.state == CallState::Ended {
            self.state = CallState::Idle;
        }
    }

    /// Flip the mute flag. Only meaningful while connected.
    pub fn toggle_mute(&mut self) -> Result<bool, SessionError> {
        if self.state != CallState::Connected {
            return Err(SessionError::NotConnected);
        }
        self.muted = !self.muted;
        Ok(self.muted)
    }

    /// A consistent `{peer, channel, muted}` view, or None unless connected.
    pub fn snapshot(&self) -> Option<LinkSnapshot> {
        if self.state != CallState::Connected {
            return None;
        }
        Some(LinkSnapshot {
            peer: self.peer?,
            channel: self.channel.clone()?,
            muted: self.muted,
        })
    }

    fn end(&mut self) {
        self.state = CallState::Ended;
        self.peer = None;
        self.channel = None;
        self.muted = false;
    }
}
