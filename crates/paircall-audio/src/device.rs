use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};

/// Which way audio flows through a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Information about an audio device.
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// List available devices for one direction.
pub fn list_devices(direction: Direction) -> Result<Vec<AudioDeviceInfo>> {
    let host = cpal::default_host();

    let default_name = match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    }
    .and_then(|d| d.name().ok())
    .unwrap_or_default();

    let iter = match direction {
        Direction::Input => host.input_devices()?,
        Direction::Output => host.output_devices()?,
    };

    let mut devices = Vec::new();
    for device in iter {
        if let Ok(name) = device.name() {
            devices.push(AudioDeviceInfo {
                is_default: name == default_name,
                name,
            });
        }
    }
    Ok(devices)
}

/// Find a device by name, falling back to the host default.
pub fn get_device(direction: Direction, name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    if let Some(name) = name {
        let mut iter = match direction {
            Direction::Input => host.input_devices()?,
            Direction::Output => host.output_devices()?,
        };
        if let Some(device) = iter.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(device);
        }
        anyhow::bail!("audio device not found: {}", name);
    }

    match direction {
        Direction::Input => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("no input device available")),
        Direction::Output => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no output device available")),
    }
}
