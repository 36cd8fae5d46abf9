//! Clip playback with transport controls.
//!
//! Plays a finalized [`Clip`] through the default output device via rodio, with
//! play/pause, percentage-based seeking and volume control. The player holds at
//! most one live clip; loading a new clip stops and replaces the previous one.

use anyhow::{anyhow, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;

use crate::recording::Clip;

/// Plays one clip at a time through the default audio output.
///
/// Seeking rebuilds the sink from the requested offset, so position is always
/// the seek offset plus what the sink has played since. Dropping the player
/// stops playback and closes the output stream.
pub struct ClipPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    clip: Option<Clip>,
    /// Offset of the currently queued source within the clip
    base_offset: Duration,
    volume: f32,
}

impl ClipPlayer {
    /// Opens the default audio output device.
    ///
    /// # Errors
    /// - If no output device is available
    /// - If the playback sink cannot be created
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow!("Failed to open audio output: {e}"))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| anyhow!("Failed to create playback sink: {e}"))?;

        Ok(Self {
            _stream: stream,
            handle,
            sink,
            clip: None,
            base_offset: Duration::ZERO,
            volume: 1.0,
        })
    }

    /// Loads a clip, releasing any previously loaded one.
    ///
    /// The previous sink is stopped before the new clip is queued, so at most
    /// one live clip exists at any time. The new clip starts paused at position
    /// zero with the player's current volume.
    ///
    /// # Errors
    /// - If the replacement sink cannot be created
    pub fn load(&mut self, clip: Clip) -> Result<()> {
        self.sink.stop();
        self.rebuild_sink(&clip, Duration::ZERO, true)?;
        tracing::debug!(
            "Clip loaded for playback: {:.2}s at {}Hz",
            clip.duration().as_secs_f64(),
            clip.sample_rate()
        );
        self.clip = Some(clip);
        Ok(())
    }

    /// Starts or resumes playback.
    ///
    /// If playback previously ran to the end, restarts from the beginning.
    ///
    /// # Errors
    /// - If the sink needs rebuilding and that fails
    pub fn play(&mut self) -> Result<()> {
        let Some(clip) = self.clip.clone() else {
            return Ok(());
        };

        if self.sink.empty() {
            // Ran to the end: restart from position zero.
            self.rebuild_sink(&clip, Duration::ZERO, true)?;
        }
        self.sink.play();
        Ok(())
    }

    /// Pauses playback.
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Returns whether playback is paused (or has run to the end).
    pub fn is_paused(&self) -> bool {
        self.sink.is_paused() || self.sink.empty()
    }

    /// Seeks to a percentage of the clip's duration.
    ///
    /// The percentage is clamped to 0-100. The paused state is preserved across
    /// the seek.
    ///
    /// # Errors
    /// - If the sink cannot be rebuilt at the new offset
    pub fn seek_to_percent(&mut self, percent: f64) -> Result<()> {
        let Some(clip) = self.clip.clone() else {
            return Ok(());
        };

        let paused = self.is_paused();
        let target = seek_target(percent, clip.duration());
        self.rebuild_sink(&clip, target, paused)?;
        Ok(())
    }

    /// Sets playback volume, clamped to 0.0-1.0.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    /// Returns the current playback position within the clip.
    pub fn position(&self) -> Duration {
        let Some(clip) = &self.clip else {
            return Duration::ZERO;
        };
        let pos = self.base_offset + self.sink.get_pos();
        pos.min(clip.duration())
    }

    /// Returns playback progress as a percentage of the clip's duration.
    pub fn progress_percent(&self) -> f64 {
        let Some(clip) = &self.clip else {
            return 0.0;
        };
        if self.sink.empty() && self.base_offset + self.sink.get_pos() >= clip.duration() {
            return 100.0;
        }
        progress_of(self.position(), clip.duration())
    }

    /// Replaces the sink with one queued from `offset` into the clip.
    fn rebuild_sink(&mut self, clip: &Clip, offset: Duration, paused: bool) -> Result<()> {
        self.sink.stop();
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| anyhow!("Failed to create playback sink: {e}"))?;

        let start = (offset.as_secs_f64() * clip.sample_rate() as f64) as usize;
        let start = start.min(clip.sample_count());
        let tail: Vec<i16> = clip.samples()[start..].to_vec();

        sink.set_volume(self.volume);
        sink.pause();
        if !tail.is_empty() {
            sink.append(SamplesBuffer::new(1, clip.sample_rate(), tail));
        }
        if !paused {
            sink.play();
        }

        self.sink = sink;
        self.base_offset = offset;
        Ok(())
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

/// Maps a 0-100 percentage to a position within `duration`.
///
/// Values outside 0-100 are clamped.
pub fn seek_target(percent: f64, duration: Duration) -> Duration {
    let fraction = (percent.clamp(0.0, 100.0)) / 100.0;
    Duration::from_secs_f64(duration.as_secs_f64() * fraction)
}

/// Returns `position` as a percentage of `duration`, in 0.0-100.0.
pub fn progress_of(position: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    (position.as_secs_f64() / duration.as_secs_f64() * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_target_maps_percentage() {
        let duration = Duration::from_secs(10);
        assert_eq!(seek_target(0.0, duration), Duration::ZERO);
        assert_eq!(seek_target(50.0, duration), Duration::from_secs(5));
        assert_eq!(seek_target(100.0, duration), duration);
    }

    #[test]
    fn test_seek_target_clamps_out_of_range() {
        let duration = Duration::from_secs(10);
        assert_eq!(seek_target(-20.0, duration), Duration::ZERO);
        assert_eq!(seek_target(150.0, duration), duration);
    }

    #[test]
    fn test_progress_of() {
        let duration = Duration::from_secs(8);
        assert_eq!(progress_of(Duration::ZERO, duration), 0.0);
        assert_eq!(progress_of(Duration::from_secs(2), duration), 25.0);
        assert_eq!(progress_of(duration, duration), 100.0);
    }

    #[test]
    fn test_progress_of_zero_duration() {
        assert_eq!(progress_of(Duration::from_secs(1), Duration::ZERO), 0.0);
    }

    #[test]
    fn test_progress_of_clamps_past_end() {
        let duration = Duration::from_secs(4);
        assert_eq!(progress_of(Duration::from_secs(5), duration), 100.0);
    }
}
