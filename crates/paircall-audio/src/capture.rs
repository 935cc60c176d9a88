use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{error, info};

use paircall_protocol::{FRAME_SAMPLES, PCM_SAMPLE_RATE};

use crate::device::{self, Direction};

/// Size of the capture ring buffer in samples (8 wire frames, ~190ms).
const CAPTURE_BUFFER_SIZE: usize = FRAME_SAMPLES * 8;

/// Handle to an active capture stream; capture stops when this is dropped.
pub struct CaptureStream {
    #[allow(dead_code)] // held to keep the stream alive
    stream: cpal::Stream,
}

/// Start capturing mono 16-bit PCM at the wire sample rate.
///
/// Returns the stream handle and a ring buffer consumer yielding the raw
/// samples. Multi-channel devices are downmixed by taking the first
/// channel.
pub fn start_capture(device_name: Option<&str>) -> Result<(CaptureStream, HeapCons<i16>)> {
    let device = device::get_device(Direction::Input, device_name)?;
    let supported = device.default_input_config()?;
    let channels = supported.channels() as usize;

    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(PCM_SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let rb = HeapRb::<i16>::new(CAPTURE_BUFFER_SIZE);
    let (mut producer, consumer) = rb.split();

    info!(
        device = device.name().unwrap_or_default(),
        sample_rate = PCM_SAMPLE_RATE,
        channels,
        "starting audio capture"
    );

    let stream = match supported.sample_format() {
        SampleFormat::I16 => device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if channels == 1 {
                        let _ = producer.push_slice(data);
                    } else {
                        for chunk in data.chunks(channels) {
                            let _ = producer.try_push(chunk[0]);
                        }
                    }
                },
                move |err| {
                    error!("audio capture error: {}", err);
                },
                None,
            )
            .context("microphone does not support 16-bit 44.1kHz capture")?,
        SampleFormat::F32 => device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for chunk in data.chunks(channels) {
                        let sample = (chunk[0].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        let _ = producer.try_push(sample);
                    }
                },
                move |err| {
                    error!("audio capture error: {}", err);
                },
                None,
            )
            .context("microphone does not support 44.1kHz capture")?,
        format => anyhow::bail!("unsupported capture sample format: {:?}", format),
    };

    stream.play()?;

    Ok((CaptureStream { stream }, consumer))
}
