//! The finalized result of one recording session.
//!
//! A clip is an immutable mono PCM buffer plus its sample rate. It is produced
//! once when a capture stream is stopped and released when replaced by the next
//! recording.

use anyhow::Result;
use hound::WavWriter;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// Immutable mono i16 PCM audio from a single recording session.
#[derive(Debug, Clone)]
pub struct Clip {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Clip {
    /// Assembles a clip from the chunks collected during one capture session.
    ///
    /// Chunks are concatenated in arrival order. Returns `None` when no samples
    /// were captured (all chunks empty or none arrived).
    pub fn from_chunks(chunks: &[Vec<i16>], sample_rate: u32) -> Option<Self> {
        let total: usize = chunks.iter().map(Vec::len).sum();
        if total == 0 {
            return None;
        }

        let mut samples = Vec::with_capacity(total);
        for chunk in chunks {
            samples.extend_from_slice(chunk);
        }

        Some(Self {
            samples,
            sample_rate,
        })
    }

    /// Returns the clip's samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the number of samples in the clip.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the clip's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the clip's playback duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Encodes the clip as a 16-bit PCM WAV file in memory.
    ///
    /// # Errors
    /// - If WAV encoding fails
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        Ok(cursor.into_inner())
    }

    /// Writes the clip to disk as a 16-bit PCM WAV file.
    ///
    /// # Errors
    /// - If the file cannot be created or written
    pub fn save_wav(&self, path: &Path) -> Result<()> {
        let bytes = self.to_wav_bytes()?;
        std::fs::write(path, &bytes)?;
        tracing::info!(
            "Clip saved: {} ({:.2}s, {} bytes)",
            path.display(),
            self.duration().as_secs_f64(),
            bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chunks_concatenates_in_order() {
        let chunks = vec![vec![1, 2, 3], vec![], vec![4, 5]];
        let clip = Clip::from_chunks(&chunks, 16000).unwrap();
        assert_eq!(clip.samples(), &[1, 2, 3, 4, 5]);
        assert_eq!(clip.sample_count(), 5);
    }

    #[test]
    fn test_from_chunks_empty_yields_none() {
        assert!(Clip::from_chunks(&[], 16000).is_none());
        assert!(Clip::from_chunks(&[Vec::new(), Vec::new()], 16000).is_none());
    }

    #[test]
    fn test_duration() {
        let chunks = vec![vec![0i16; 16000]];
        let clip = Clip::from_chunks(&chunks, 16000).unwrap();
        assert_eq!(clip.duration(), Duration::from_secs(1));

        let chunks = vec![vec![0i16; 8000]];
        let clip = Clip::from_chunks(&chunks, 16000).unwrap();
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_wav_bytes_header() {
        let clip = Clip::from_chunks(&[vec![0i16; 100]], 16000).unwrap();
        let bytes = clip.to_wav_bytes().unwrap();

        // RIFF/WAVE header plus 200 bytes of sample data
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert!(bytes.len() > 200);
    }
}
