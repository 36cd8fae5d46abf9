//! Audio recording feature for earwitness.
//!
//! Provides microphone enumeration, PCM capture into in-memory clips, and the
//! session terminal UI.

pub mod audio;
pub mod clip;
pub mod ui;

pub use audio::{list_input_devices, probe_microphone, AudioRecorder, InputDevice};
pub use clip::Clip;
pub use ui::{SessionCommand, SessionTui, SessionView};
