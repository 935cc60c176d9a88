use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapProd, HeapRb};
use tracing::{error, info};

use paircall_protocol::{FRAME_SAMPLES, PCM_SAMPLE_RATE};

use crate::device::{self, Direction};

/// Size of the playback ring buffer in samples (8 wire frames, ~190ms).
const PLAYBACK_BUFFER_SIZE: usize = FRAME_SAMPLES * 8;

/// Handle to an active playback stream; playback stops when this is dropped.
pub struct PlaybackStream {
    #[allow(dead_code)] // held to keep the stream alive
    stream: cpal::Stream,
}

/// Start playing mono 16-bit PCM at the wire sample rate.
///
/// Returns the stream handle and a ring buffer producer that decrypted
/// frames are written into. Underruns are filled with silence; mono input
/// is duplicated to every output channel.
pub fn start_playback(device_name: Option<&str>) -> Result<(PlaybackStream, HeapProd<i16>)> {
    let device = device::get_device(Direction::Output, device_name)?;
    let supported = device.default_output_config()?;
    let channels = supported.channels() as usize;

    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(PCM_SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<i16>::new(PLAYBACK_BUFFER_SIZE);
    let (producer, mut consumer) = rb.split();

    info!(
        device = device.name().unwrap_or_default(),
        sample_rate = PCM_SAMPLE_RATE,
        channels,
        "starting audio playback"
    );

    let stream = match supported.sample_format() {
        SampleFormat::I16 => device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let sample = consumer.try_pop().unwrap_or(0);
                        for ch in frame.iter_mut() {
                            *ch = sample;
                        }
                    }
                },
                move |err| {
                    error!("audio playback error: {}", err);
                },
                None,
            )
            .context("speaker does not support 16-bit 44.1kHz playback")?,
        SampleFormat::F32 => device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let sample =
                            consumer.try_pop().unwrap_or(0) as f32 / i16::MAX as f32;
                        for ch in frame.iter_mut() {
                            *ch = sample;
                        }
                    }
                },
                move |err| {
                    error!("audio playback error: {}", err);
                },
                None,
            )
            .context("speaker does not support 44.1kHz playback")?,
        format => anyhow::bail!("unsupported playback sample format: {:?}", format),
    };

    stream.play()?;

    Ok((PlaybackStream { stream }, producer))
}
