//! The interactive recording practice session.
//!
//! Runs the main event loop: shows a quote to read aloud, records from the
//! selected microphone, and plays the resulting clip back with seek and volume
//! control. The footer counts completed recordings.

use crate::config::EarwitnessConfig;
use crate::playback::ClipPlayer;
use crate::quote::QuoteDeck;
use crate::recording::ui::{default_device_selection, level_percent, PlaybackView};
use crate::recording::{
    list_input_devices, probe_microphone, AudioRecorder, Clip, InputDevice, SessionCommand,
    SessionTui, SessionView,
};
use crate::ui::ErrorScreen;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Seek step for one arrow key press, in percent of the clip duration.
const SEEK_STEP_PERCENT: f64 = 5.0;
/// Volume step for one key press.
const VOLUME_STEP: f32 = 0.1;

/// Runs the interactive recording session.
///
/// # Errors
/// - If configuration is malformed
/// - If the terminal UI cannot be initialized
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== earwitness session started ===");

    let config = match EarwitnessConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/earwitness/earwitness.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    // Access probe first, then enumeration. On failure the session still opens,
    // with an empty device list and recording disabled.
    let mut error: Option<String> = None;
    let devices = match probe_microphone().and_then(|()| list_input_devices()) {
        Ok(devices) => devices,
        Err(e) => {
            tracing::error!("Microphone access failed: {e}");
            error = Some(format!(
                "Unable to access microphone: {e}. Check that one is connected and not in use."
            ));
            Vec::new()
        }
    };
    tracing::info!("Found {} input devices", devices.len());

    let mut selected = initial_selection(&devices, &config.audio.device);
    let mut deck = QuoteDeck::new();
    let mut recorder: Option<AudioRecorder> = None;
    let mut player: Option<ClipPlayer> = None;
    let mut last_clip: Option<Clip> = None;
    let mut recording_started: Option<Instant> = None;
    let mut progress: f64 = 0.0;
    let mut volume = config.playback.volume.clamp(0.0, 1.0);
    let mut notice: Option<String> = None;
    let recordings = Rc::new(Cell::new(0u32));

    let mut tui = SessionTui::new()?;

    loop {
        match tui.handle_input()? {
            SessionCommand::Continue => {}
            SessionCommand::Quit => break,
            SessionCommand::ToggleRecord => {
                notice = None;
                if let Some(mut active) = recorder.take() {
                    recording_started = None;
                    match active.finish() {
                        Some(clip) => {
                            if player.is_none() {
                                match ClipPlayer::new() {
                                    Ok(p) => player = Some(p),
                                    Err(e) => {
                                        tracing::error!("Audio output unavailable: {e}");
                                        error = Some(format!("Playback unavailable: {e}"));
                                    }
                                }
                            }
                            if let Some(p) = player.as_mut() {
                                p.set_volume(volume);
                                match p.load(clip.clone()) {
                                    Ok(()) => progress = 0.0,
                                    Err(e) => error = Some(format!("Playback failed: {e}")),
                                }
                            }
                            last_clip = Some(clip);
                        }
                        None => notice = Some("No audio captured".to_string()),
                    }
                } else {
                    match selected.and_then(|index| devices.get(index)) {
                        None => {
                            error = Some(
                                "No microphone selected. Connect a microphone and restart."
                                    .to_string(),
                            );
                        }
                        Some(device) => {
                            error = None;
                            let mut new_recorder = AudioRecorder::new(device.id.clone());
                            let counter = Rc::clone(&recordings);
                            new_recorder.set_completion_hook(move |clip| {
                                counter.set(counter.get() + 1);
                                tracing::debug!(
                                    "Recording #{} completed ({:.2}s)",
                                    counter.get(),
                                    clip.duration().as_secs_f64()
                                );
                            });
                            match new_recorder.start_capture() {
                                Ok(()) => {
                                    recording_started = Some(Instant::now());
                                    recorder = Some(new_recorder);
                                }
                                Err(e) => {
                                    tracing::error!("Failed to start recording: {e}");
                                    error = Some(format!("Failed to start recording: {e}"));
                                }
                            }
                        }
                    }
                }
            }
            SessionCommand::TogglePlayback => {
                // Transport is inert while recording.
                if recorder.is_none() {
                    if let Some(p) = player.as_mut() {
                        if p.is_paused() {
                            if let Err(e) = p.play() {
                                error = Some(format!("Playback failed: {e}"));
                            }
                        } else {
                            p.pause();
                        }
                    }
                }
            }
            SessionCommand::SeekBack => {
                if recorder.is_none() {
                    if let Some(p) = player.as_mut() {
                        let target = (progress - SEEK_STEP_PERCENT).clamp(0.0, 100.0);
                        match p.seek_to_percent(target) {
                            Ok(()) => progress = target,
                            Err(e) => error = Some(format!("Seek failed: {e}")),
                        }
                    }
                }
            }
            SessionCommand::SeekForward => {
                if recorder.is_none() {
                    if let Some(p) = player.as_mut() {
                        let target = (progress + SEEK_STEP_PERCENT).clamp(0.0, 100.0);
                        match p.seek_to_percent(target) {
                            Ok(()) => progress = target,
                            Err(e) => error = Some(format!("Seek failed: {e}")),
                        }
                    }
                }
            }
            SessionCommand::VolumeDown => {
                volume = (volume - VOLUME_STEP).clamp(0.0, 1.0);
                if let Some(p) = player.as_mut() {
                    p.set_volume(volume);
                }
            }
            SessionCommand::VolumeUp => {
                volume = (volume + VOLUME_STEP).clamp(0.0, 1.0);
                if let Some(p) = player.as_mut() {
                    p.set_volume(volume);
                }
            }
            SessionCommand::DevicePrev => {
                if recorder.is_none() && !devices.is_empty() {
                    selected = Some(match selected {
                        Some(0) | None => devices.len() - 1,
                        Some(index) => index - 1,
                    });
                }
            }
            SessionCommand::DeviceNext => {
                if recorder.is_none() && !devices.is_empty() {
                    selected = Some(match selected {
                        None => 0,
                        Some(index) => (index + 1) % devices.len(),
                    });
                }
            }
            SessionCommand::NewQuote => {
                deck.draw_new();
            }
            SessionCommand::SaveClip => match &last_clip {
                Some(clip) => match save_clip(clip) {
                    Ok(path) => notice = Some(format!("Saved to {path}")),
                    Err(e) => error = Some(format!("Save failed: {e}")),
                },
                None => notice = Some("Nothing to save yet".to_string()),
            },
        }

        // Progress sampler: runs only while playback is unpaused, so pausing
        // freezes the bar at its last sampled value.
        if let Some(p) = &player {
            if !p.is_paused() {
                progress = p.progress_percent();
            }
        }

        let elapsed_secs = recording_started
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0);
        let level = recorder
            .as_ref()
            .map(|r| level_percent(r.input_level(), config.audio.reference_level_db))
            .unwrap_or(0);

        let playback = match (&last_clip, &player) {
            (Some(clip), Some(p)) => Some(PlaybackView {
                paused: p.is_paused(),
                progress,
                volume,
                position: p.position(),
                duration: clip.duration(),
            }),
            _ => None,
        };

        let view = SessionView {
            quote: deck.current(),
            devices: &devices,
            selected_device: selected,
            recording: recorder.as_ref().is_some_and(AudioRecorder::is_recording),
            elapsed_secs,
            level_percent: level,
            playback,
            error: error.as_deref(),
            notice: notice.as_deref(),
            recordings: recordings.get(),
        };
        tui.render(&view)?;
    }

    // Teardown: stop any open capture stream and release the clip reference.
    drop(recorder);
    drop(player);

    tui.cleanup()?;
    tracing::info!(
        "=== earwitness session ended ({} recordings) ===",
        recordings.get()
    );
    Ok(())
}

/// Writes a clip to the user's data directory as a timestamped WAV file.
///
/// # Errors
/// - If the data directory cannot be created
/// - If writing fails
fn save_clip(clip: &Clip) -> Result<String, anyhow::Error> {
    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("earwitness");
    std::fs::create_dir_all(&data_dir)?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = data_dir.join(format!("earwitness-{stamp}.wav"));
    clip.save_wav(&path)?;

    Ok(path.display().to_string())
}

/// Resolves the initial device selection.
///
/// A configured device id (name or numeric index) wins when it matches an
/// enumerated device; otherwise the first device is selected, or none when the
/// list is empty.
fn initial_selection(devices: &[InputDevice], configured: &str) -> Option<usize> {
    if configured != "default" {
        if let Some(index) = devices.iter().position(|d| d.id == configured) {
            return Some(index);
        }
        if let Ok(index) = configured.parse::<usize>() {
            if index < devices.len() {
                return Some(index);
            }
        }
        tracing::warn!("Configured device '{configured}' not found, using default");
    }
    default_device_selection(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<InputDevice> {
        vec![
            InputDevice {
                id: "Built-in Microphone".to_string(),
                label: "Built-in Microphone".to_string(),
            },
            InputDevice {
                id: "USB Microphone".to_string(),
                label: "USB Microphone".to_string(),
            },
        ]
    }

    #[test]
    fn test_initial_selection_default_picks_first() {
        assert_eq!(initial_selection(&devices(), "default"), Some(0));
        assert_eq!(initial_selection(&[], "default"), None);
    }

    #[test]
    fn test_initial_selection_by_name() {
        assert_eq!(initial_selection(&devices(), "USB Microphone"), Some(1));
    }

    #[test]
    fn test_initial_selection_by_index() {
        assert_eq!(initial_selection(&devices(), "1"), Some(1));
        assert_eq!(initial_selection(&devices(), "7"), Some(0));
    }

    #[test]
    fn test_initial_selection_unknown_falls_back() {
        assert_eq!(initial_selection(&devices(), "Ghost Mic"), Some(0));
        assert_eq!(initial_selection(&[], "Ghost Mic"), None);
    }
}
