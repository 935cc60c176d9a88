//! Microphone capture and speaker playback for paircall.
//!
//! cpal streams run on their own audio threads and exchange PCM samples
//! with the async world through lock-free ring buffers. The `frame` module
//! cuts the sample stream into the fixed-size frames the wire protocol
//! carries.

pub mod capture;
pub mod device;
pub mod frame;
pub mod playback;
