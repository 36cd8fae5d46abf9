//! Terminal user interface for the recording practice session.
//!
//! Renders the quote panel, microphone selection, recording state with a live
//! input meter, and the playback transport. Input handling maps key presses to
//! session commands consumed by the record command loop.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use super::audio::InputDevice;

/// User input command during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// No actionable key pressed
    Continue,
    /// Start or stop recording ('r')
    ToggleRecord,
    /// Play or pause the clip (Space)
    TogglePlayback,
    /// Seek backward 5% (Left)
    SeekBack,
    /// Seek forward 5% (Right)
    SeekForward,
    /// Volume down 0.1 ('-')
    VolumeDown,
    /// Volume up 0.1 ('+' or '=')
    VolumeUp,
    /// Select previous microphone (Up)
    DevicePrev,
    /// Select next microphone (Down)
    DeviceNext,
    /// Draw a new quote ('n')
    NewQuote,
    /// Save the clip to a WAV file ('s')
    SaveClip,
    /// Exit the session (Escape, 'q' or Ctrl+C)
    Quit,
}

/// Playback state as shown in the transport row.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackView {
    pub paused: bool,
    /// Progress percentage, 0.0-100.0
    pub progress: f64,
    /// Volume, 0.0-1.0
    pub volume: f32,
    pub position: Duration,
    pub duration: Duration,
}

/// Everything the session screen needs for one frame.
pub struct SessionView<'a> {
    pub quote: &'a str,
    pub devices: &'a [InputDevice],
    pub selected_device: Option<usize>,
    pub recording: bool,
    /// Elapsed recording time in whole seconds
    pub elapsed_secs: u64,
    /// Input level percentage while recording, 0-100
    pub level_percent: u8,
    /// Present only when a clip exists
    pub playback: Option<PlaybackView>,
    pub error: Option<&'a str>,
    pub notice: Option<&'a str>,
    /// Completed recordings this session
    pub recordings: u32,
}

/// Terminal UI for the practice session.
pub struct SessionTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl SessionTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(SessionTui { terminal })
    }

    /// Renders one frame of the session screen.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, view: &SessionView) -> anyhow::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();

            let device_rows = (view.devices.len().max(1) as u16).min(6) + 2;
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(6),               // quote
                    Constraint::Length(device_rows),  // microphone list
                    Constraint::Length(3),            // recording row
                    Constraint::Length(3),            // playback row
                    Constraint::Length(1),            // error / notice line
                    Constraint::Length(1),            // footer
                ])
                .split(area);

            render_quote(frame, layout[0], view);
            render_devices(frame, layout[1], view);
            render_recording(frame, layout[2], view);
            render_playback(frame, layout[3], view);
            render_message_line(frame, layout[4], view);
            render_footer(frame, layout[5], view);
        })?;

        Ok(())
    }

    /// Processes user input and returns the appropriate session command.
    ///
    /// Polls for up to 50ms, which also paces the render loop.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<SessionCommand> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(SessionCommand::Continue);
                }
                return Ok(match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        SessionCommand::Quit
                    }
                    KeyCode::Char('q') | KeyCode::Esc => SessionCommand::Quit,
                    KeyCode::Char('r') => SessionCommand::ToggleRecord,
                    KeyCode::Char(' ') => SessionCommand::TogglePlayback,
                    KeyCode::Left => SessionCommand::SeekBack,
                    KeyCode::Right => SessionCommand::SeekForward,
                    KeyCode::Char('-') => SessionCommand::VolumeDown,
                    KeyCode::Char('+') | KeyCode::Char('=') => SessionCommand::VolumeUp,
                    KeyCode::Up => SessionCommand::DevicePrev,
                    KeyCode::Down => SessionCommand::DeviceNext,
                    KeyCode::Char('n') => SessionCommand::NewQuote,
                    KeyCode::Char('s') => SessionCommand::SaveClip,
                    _ => SessionCommand::Continue,
                });
            }
        }
        Ok(SessionCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn render_quote(frame: &mut Frame, area: Rect, view: &SessionView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Read this aloud (n for a new one) ");
    let quote = Paragraph::new(format!("\u{201c}{}\u{201d}", view.quote))
        .block(block)
        .style(Style::default().fg(Color::Rgb(206, 224, 220)))
        .wrap(Wrap { trim: true });
    frame.render_widget(quote, area);
}

fn render_devices(frame: &mut Frame, area: Rect, view: &SessionView) {
    let block = Block::default().borders(Borders::ALL).title(" Microphone ");

    let lines: Vec<Line> = if view.devices.is_empty() {
        vec![Line::from(Span::styled(
            "No microphones found",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        view.devices
            .iter()
            .enumerate()
            .map(|(index, device)| {
                let selected = view.selected_device == Some(index);
                let marker = if selected { "> " } else { "  " };
                let style = if selected && view.recording {
                    Style::default().fg(Color::Red)
                } else if selected {
                    Style::default().fg(Color::Rgb(185, 207, 212))
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(Span::styled(format!("{marker}{}", device.label), style))
            })
            .collect()
    };

    let list = Paragraph::new(lines).block(block);
    frame.render_widget(list, area);
}

fn render_recording(frame: &mut Frame, area: Rect, view: &SessionView) {
    let block = Block::default().borders(Borders::ALL).title(" Recording ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.recording {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(12), Constraint::Min(10)])
            .split(inner);

        let status = Paragraph::new(Line::from(vec![
            Span::styled("\u{25cf} ", Style::default().fg(Color::Red)),
            Span::raw(format_time(view.elapsed_secs)),
        ]));
        frame.render_widget(status, columns[0]);

        let meter = Gauge::default()
            .gauge_style(Style::default().fg(Color::Rgb(206, 224, 220)))
            .ratio(f64::from(view.level_percent) / 100.0)
            .label(format!("{}%", view.level_percent));
        frame.render_widget(meter, columns[1]);
    } else {
        let hint = if view.devices.is_empty() {
            "Recording disabled: no microphone available"
        } else {
            "Press r to start recording"
        };
        let status = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(status, inner);
    }
}

fn render_playback(frame: &mut Frame, area: Rect, view: &SessionView) {
    let block = Block::default().borders(Borders::ALL).title(" Playback ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(playback) = &view.playback else {
        let hint = Paragraph::new("No clip yet. Record one to play it back.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, inner);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Min(10),
            Constraint::Length(10),
        ])
        .split(inner);

    let symbol = if playback.paused { "\u{25b6}" } else { "\u{23f8}" };
    let times = Paragraph::new(format!(
        "{symbol} {} / {}",
        format_time(playback.position.as_secs()),
        format_time(playback.duration.as_secs())
    ));
    frame.render_widget(times, columns[0]);

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Rgb(185, 207, 212)))
        .ratio((playback.progress / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", playback.progress));
    frame.render_widget(progress, columns[1]);

    let volume = Paragraph::new(format!("Vol {:3.0}%", playback.volume * 100.0))
        .alignment(Alignment::Right);
    frame.render_widget(volume, columns[2]);
}

fn render_message_line(frame: &mut Frame, area: Rect, view: &SessionView) {
    if let Some(error) = view.error {
        let line = Paragraph::new(error).style(Style::default().fg(Color::Red));
        frame.render_widget(line, area);
    } else if let Some(notice) = view.notice {
        let line = Paragraph::new(notice).style(Style::default().fg(Color::Green));
        frame.render_widget(line, area);
    }
}

fn render_footer(frame: &mut Frame, area: Rect, view: &SessionView) {
    let footer = Paragraph::new(format!(
        "Recordings: {} | r record \u{b7} space play/pause \u{b7} \u{2190}\u{2192} seek \u{b7} -/+ volume \u{b7} \u{2191}\u{2193} mic \u{b7} n quote \u{b7} s save \u{b7} q quit",
        view.recordings
    ))
    .style(
        Style::default()
            .fg(Color::Rgb(185, 207, 212))
            .bg(Color::Rgb(0, 0, 0)),
    );
    frame.render_widget(footer, area);
}

/// Formats whole seconds as MM:SS.
pub fn format_time(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{minutes:02}:{secs:02}")
}

/// Converts a normalized RMS level (0.0-1.0) to a meter percentage.
///
/// The RMS value is mapped to dBFS and normalized so that `reference_level_db`
/// reads 100% and 40dB below it reads 0%.
pub fn level_percent(rms: f32, reference_level_db: i8) -> u8 {
    let db_fs = if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        -160.0
    };

    let min_db = f32::from(reference_level_db) - 40.0;
    ((db_fs - min_db) / 40.0 * 100.0).clamp(0.0, 100.0) as u8
}

/// Returns the default device selection: the first device when any exist.
pub fn default_device_selection(devices: &[InputDevice]) -> Option<usize> {
    if devices.is_empty() {
        None
    } else {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(7), "00:07");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn test_default_device_selection() {
        assert_eq!(default_device_selection(&[]), None);

        let devices = vec![
            InputDevice {
                id: "a".to_string(),
                label: "Mic A".to_string(),
            },
            InputDevice {
                id: "b".to_string(),
                label: "Mic B".to_string(),
            },
        ];
        assert_eq!(default_device_selection(&devices), Some(0));
    }

    #[test]
    fn test_level_percent_bounds() {
        // Silence pegs the meter at zero.
        assert_eq!(level_percent(0.0, -20), 0);
        // Full scale is above any sensible reference level.
        assert_eq!(level_percent(1.0, -20), 100);
    }

    #[test]
    fn test_level_percent_reference_reads_full() {
        // -20dBFS RMS with a -20dBFS reference reads 100%.
        let rms = 10f32.powf(-20.0 / 20.0);
        assert_eq!(level_percent(rms, -20), 100);
        // 40dB below the reference reads 0%.
        let rms = 10f32.powf(-60.0 / 20.0);
        assert_eq!(level_percent(rms, -20), 0);
    }
}
