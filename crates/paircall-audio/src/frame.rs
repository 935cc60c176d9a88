//! Bridges between ring-buffered PCM samples and fixed-size wire frames.

use bytes::Bytes;
use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::{HeapCons, HeapProd};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::trace;

use paircall_protocol::{FRAME_BYTES, FRAME_SAMPLES, PCM_SAMPLE_RATE};

/// One wire frame of audio, ~23ms at 44.1kHz.
const FRAME_DURATION: Duration =
    Duration::from_micros(FRAME_SAMPLES as u64 * 1_000_000 / PCM_SAMPLE_RATE as u64);

/// Pack PCM samples into little-endian frame bytes.
pub fn samples_to_bytes(samples: &[i16]) -> Bytes {
    let mut buf = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(buf)
}

/// Unpack little-endian frame bytes into PCM samples.
/// A trailing odd byte, which a well-formed frame never has, is dropped.
pub fn bytes_to_samples(frame: &[u8]) -> Vec<i16> {
    frame
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Spawn the task that cuts captured samples into wire frames.
///
/// Polls the capture ring buffer at twice the frame rate and sends each
/// complete frame into `frames`. Frames are dropped rather than queued
/// when the channel is full; the task exits when the receiver is gone.
pub fn spawn_capture_framer(
    mut pcm: HeapCons<i16>,
    frames: mpsc::Sender<Bytes>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(FRAME_DURATION / 2);
        let mut buf = [0i16; FRAME_SAMPLES];
        loop {
            tick.tick().await;
            if frames.is_closed() {
                return;
            }
            while pcm.occupied_len() >= FRAME_SAMPLES {
                pcm.pop_slice(&mut buf);
                if frames.try_send(samples_to_bytes(&buf)).is_err() {
                    trace!("capture frame queue full, dropping frame");
                }
            }
        }
    })
}

/// Spawn the task that feeds received frames into the playback ring buffer.
///
/// Samples that do not fit (playback running behind) are dropped. The task
/// exits when the frame channel closes.
pub fn spawn_playback_writer(
    mut frames: mpsc::Receiver<Bytes>,
    mut pcm: HeapProd<i16>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if frame.len() != FRAME_BYTES {
                trace!(len = frame.len(), "ignoring frame of unexpected size");
                continue;
            }
            let samples = bytes_to_samples(&frame);
            let written = pcm.push_slice(&samples);
            if written < samples.len() {
                trace!(
                    dropped = samples.len() - written,
                    "playback buffer full, dropping samples"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_byte_roundtrip() {
        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 12345, -12345];
        let bytes = samples_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * 2);
        assert_eq!(bytes_to_samples(&bytes), samples);
    }

    #[test]
    fn full_frame_is_frame_bytes_long() {
        let samples = vec![7i16; FRAME_SAMPLES];
        assert_eq!(samples_to_bytes(&samples).len(), FRAME_BYTES);
    }

    #[test]
    fn odd_trailing_byte_dropped() {
        let samples = bytes_to_samples(&[0x34, 0x12, 0xFF]);
        assert_eq!(samples, vec![0x1234]);
    }

    #[test]
    fn frame_duration_close_to_23ms() {
        assert!(FRAME_DURATION > Duration::from_millis(22));
        assert!(FRAME_DURATION < Duration::from_millis(24));
    }
}
