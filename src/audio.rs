//! ALSA device discovery from `aplay -l` / `arecord -l`.

use crate::process::{Cmd, Runner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub card: u32,
    pub device: u32,
    pub name: String,
    /// e.g. `plughw:1,0`
    pub alsa_name: String,
    pub is_usb: bool,
}

/// Playback and capture devices, de-duplicated by ALSA name.
///
/// Missing or failing tools just contribute nothing.
pub fn detect_audio_devices(runner: &dyn Runner) -> Vec<AudioDevice> {
    let mut devices: Vec<AudioDevice> = Vec::new();

    for tool in ["aplay", "arecord"] {
        let Ok(result) = runner.capture(Cmd::new(tool).arg("-l").allow_fail()) else {
            continue;
        };
        if !result.success() {
            continue;
        }
        for dev in parse_device_list(&result.stdout) {
            if !devices.iter().any(|d| d.alsa_name == dev.alsa_name) {
                devices.push(dev);
            }
        }
    }

    devices
}

/// Parse lines like
/// `card 1: Device [USB Audio CODEC], device 0: USB Audio [USB Audio]`.
pub fn parse_device_list(output: &str) -> Vec<AudioDevice> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<AudioDevice> {
    let rest = line.strip_prefix("card ")?;
    let (card, rest) = rest.split_once(':')?;
    let card: u32 = card.trim().parse().ok()?;

    let (_, rest) = rest.split_once('[')?;
    let (name, rest) = rest.split_once(']')?;

    let rest = rest.trim_start().strip_prefix(',')?.trim_start();
    let rest = rest.strip_prefix("device ")?;
    let (device, _) = rest.split_once(':')?;
    let device: u32 = device.trim().parse().ok()?;

    Some(AudioDevice {
        card,
        device,
        name: name.to_string(),
        alsa_name: format!("plughw:{},{}", card, device),
        is_usb: line.to_lowercase().contains("usb"),
    })
}
