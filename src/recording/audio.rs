//! Microphone access, device enumeration and PCM capture.
//!
//! Audio is captured from a selectable input device at its native configuration,
//! mixed down to mono i16 chunks as it arrives, and finalized into a [`Clip`]
//! when capture stops.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

use super::clip::Clip;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Descriptor for an audio input device: a selectable id and a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    /// Device id usable with [`AudioRecorder`]: the cpal device name.
    pub id: String,
    /// Human-readable label shown in the device list.
    pub label: String,
}

/// Opens and immediately releases a capture stream on the default input device.
///
/// This is the access probe run once at session start: it surfaces missing
/// hardware or denied device access before enumeration, the same way a browser
/// recorder triggers the permission prompt with a throwaway stream.
///
/// # Errors
/// - If no input device is available
/// - If the device cannot be opened for capture
pub fn probe_microphone() -> Result<()> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No audio input device available"))?;
        let config = device.default_input_config()?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                |_: &[i16], _: &cpal::InputCallbackInfo| {},
                |err| tracing::debug!("Probe stream error: {}", err),
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                |_: &[f32], _: &cpal::InputCallbackInfo| {},
                |err| tracing::debug!("Probe stream error: {}", err),
                None,
            )?,
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        // Opening the stream is the probe; release it right away.
        drop(stream);
        tracing::debug!("Microphone probe succeeded");
        Ok(())
    })
}

/// Enumerates audio input devices, skipping any whose name cannot be queried.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn list_input_devices() -> Result<Vec<InputDevice>> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?;

        let mut result = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                result.push(InputDevice {
                    id: name.clone(),
                    label: name,
                });
            }
        }

        tracing::debug!("Enumerated {} input devices", result.len());
        Ok(result)
    })
}

/// Records mono audio chunks from a selected input device.
///
/// Multi-channel input is mixed down to mono by averaging channels. Chunks
/// accumulate in memory while the stream is open and are finalized into a
/// single [`Clip`] by [`AudioRecorder::finish`]. At most one capture stream is
/// open per recorder instance.
pub struct AudioRecorder {
    /// Device id: "default", a device name, or a numeric index
    device_id: String,
    /// Actual capture sample rate, known after the stream opens
    sample_rate: u32,
    /// Mono chunks in arrival order
    chunks: Arc<Mutex<Vec<Vec<i16>>>>,
    /// RMS of the most recent chunk, normalized to 0.0..1.0
    level: Arc<Mutex<f32>>,
    /// Active capture stream, held only while recording
    stream: Option<cpal::Stream>,
    /// Invoked with the finalized clip when capture stops
    completion_hook: Option<Box<dyn FnMut(&Clip)>>,
}

impl AudioRecorder {
    /// Creates a recorder bound to the given device id.
    pub fn new(device_id: String) -> Self {
        Self {
            device_id,
            sample_rate: 0,
            chunks: Arc::new(Mutex::new(Vec::new())),
            level: Arc::new(Mutex::new(0.0)),
            stream: None,
            completion_hook: None,
        }
    }

    /// Sets a hook invoked with each finalized clip.
    pub fn set_completion_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Clip) + 'static,
    {
        self.completion_hook = Some(Box::new(hook));
    }

    /// Starts capturing from the configured device.
    ///
    /// Resets the chunk buffer, opens a capture stream at the device's native
    /// configuration and begins appending mono chunks as data arrives. On any
    /// failure no stream is left open and the recorder stays idle.
    ///
    /// # Errors
    /// - If the device id is empty
    /// - If the device is not found or cannot be queried
    /// - If stream creation or startup fails
    pub fn start_capture(&mut self) -> Result<()> {
        if self.device_id.is_empty() {
            return Err(anyhow!("No microphone selected"));
        }
        if self.stream.is_some() {
            return Err(anyhow!("Recording already in progress"));
        }

        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_id == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_id(&host, &self.device_id)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;

        tracing::info!(
            "Capture device: {} ({}Hz, {} channels)",
            device_name,
            sample_rate,
            channels
        );

        self.sample_rate = sample_rate;
        self.chunks.lock().unwrap().clear();
        *self.level.lock().unwrap() = 0.0;

        let chunks = Arc::clone(&self.chunks);
        let level = Arc::clone(&self.level);
        let err_fn = |err| tracing::error!("Audio stream error: {}", err);

        let stream = match device_config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_chunk(&chunks, &level, mix_to_mono(data, channels));
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &device_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_chunk(&chunks, &level, mix_f32_to_mono(data, channels));
                },
                err_fn,
                None,
            )?,
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Capture stream started");
        Ok(())
    }

    /// Stops capture and finalizes the chunks into a clip.
    ///
    /// Dropping the stream releases the microphone. The chunks collected since
    /// the last start become exactly one clip, which is passed to the completion
    /// hook and returned. Returns `None` when no samples were captured.
    pub fn finish(&mut self) -> Option<Clip> {
        self.stream = None;
        *self.level.lock().unwrap() = 0.0;

        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        let clip = Clip::from_chunks(&chunks, self.sample_rate);

        match &clip {
            Some(clip) => {
                tracing::info!(
                    "Recording stopped: {:.2}s ({} samples at {}Hz)",
                    clip.duration().as_secs_f64(),
                    clip.sample_count(),
                    clip.sample_rate()
                );
                if let Some(hook) = self.completion_hook.as_mut() {
                    hook(clip);
                }
            }
            None => tracing::warn!("Recording stopped with no samples captured"),
        }

        clip
    }

    /// Returns whether a capture stream is currently open.
    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the RMS level of the most recent chunk, in 0.0..1.0.
    pub fn input_level(&self) -> f32 {
        *self.level.lock().unwrap()
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        // Releases the microphone if a stream is still open on teardown.
        self.stream = None;
    }
}

/// Appends a non-empty mono chunk and updates the level meter.
fn push_chunk(chunks: &Arc<Mutex<Vec<Vec<i16>>>>, level: &Arc<Mutex<f32>>, mono: Vec<i16>) {
    if mono.is_empty() {
        return;
    }
    *level.lock().unwrap() = chunk_rms(&mono);
    chunks.lock().unwrap().push(mono);
}

/// Mixes interleaved i16 frames down to mono by averaging channels.
pub fn mix_to_mono(data: &[i16], num_channels: usize) -> Vec<i16> {
    match num_channels {
        0 => Vec::new(),
        1 => data.to_vec(),
        2 => data
            .chunks_exact(2)
            .map(|frame| {
                let left = frame[0] as i32;
                let right = frame[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect(),
        n => data
            .chunks_exact(n)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / n as i32) as i16
            })
            .collect(),
    }
}

/// Mixes interleaved f32 frames down to mono i16 by averaging channels.
pub fn mix_f32_to_mono(data: &[f32], num_channels: usize) -> Vec<i16> {
    if num_channels == 0 {
        return Vec::new();
    }
    data.chunks_exact(num_channels)
        .map(|frame| {
            let avg = frame.iter().sum::<f32>() / num_channels as f32;
            (avg.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        })
        .collect()
}

/// RMS of a mono chunk, normalized to 0.0..1.0.
fn chunk_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_of_squares: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    let mean_square = sum_of_squares as f64 / samples.len() as f64;
    (mean_square.sqrt() / i16::MAX as f64) as f32
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_id(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return devices
                .into_iter()
                .nth(index)
                .ok_or_else(|| anyhow!("Device index {index} unavailable"));
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        ));
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'earwitness list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_mono_passthrough() {
        assert_eq!(mix_to_mono(&[1, 2, 3], 1), vec![1, 2, 3]);
    }

    #[test]
    fn test_mix_stereo_averages_pairs() {
        assert_eq!(mix_to_mono(&[100, 200, -50, 50], 2), vec![150, 0]);
    }

    #[test]
    fn test_mix_multichannel_averages_frames() {
        assert_eq!(mix_to_mono(&[30, 60, 90, 3, 6, 9], 3), vec![60, 6]);
    }

    #[test]
    fn test_mix_f32_full_scale() {
        let mono = mix_f32_to_mono(&[1.0, 1.0, -1.0, -1.0], 2);
        assert_eq!(mono, vec![i16::MAX, -i16::MAX]);
    }

    #[test]
    fn test_chunk_rms_silence_and_full_scale() {
        assert_eq!(chunk_rms(&[]), 0.0);
        assert_eq!(chunk_rms(&[0, 0, 0]), 0.0);

        let full = chunk_rms(&[i16::MAX, i16::MAX]);
        assert!((full - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_device_id_rejected() {
        let mut recorder = AudioRecorder::new(String::new());
        let err = recorder.start_capture().unwrap_err();
        assert!(err.to_string().contains("No microphone selected"));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_finish_without_capture_yields_no_clip() {
        let mut recorder = AudioRecorder::new("default".to_string());
        assert!(recorder.finish().is_none());
    }
}
