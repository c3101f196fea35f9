// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based frame renderer
//!
//! Renders RGBA frames to the terminal using Unicode half-block characters
//! for improved vertical resolution.

use crate::constants::refresh_interval;
use crate::errors::RenderError;
use crate::media::frame::RgbaFrame;
use crate::render::{FrameRenderer, LoopAction};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, Stdout, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::EitherWriter;

/// Set while a [`TerminalRenderer`] owns the alternate screen
static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Log writer for stderr that drops output while the alternate screen is up
///
/// Records from the capture thread would otherwise be drawn over the
/// preview. Failures that matter are reported again after the terminal is
/// restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalAwareStderr;

impl<'a> MakeWriter<'a> for TerminalAwareStderr {
    type Writer = EitherWriter<io::Stderr, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        if SCREEN_ACTIVE.load(Ordering::Acquire) {
            EitherWriter::B(io::sink())
        } else {
            EitherWriter::A(io::stderr())
        }
    }
}

/// Full-screen terminal renderer
///
/// Switches the terminal to raw mode and the alternate screen on creation
/// and restores it on [`restore`](Self::restore) or drop, whichever comes first.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    widget: FrameWidget,
    refresh: Duration,
    source_label: String,
    fps: FpsCounter,
    restored: bool,
}

impl TerminalRenderer {
    /// `source_label` is shown in the status bar (e.g., the negotiated format)
    pub fn new(refresh_hz: u32, source_label: impl Into<String>) -> Result<Self, RenderError> {
        enable_raw_mode()?;
        let mut out = stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                return Err(e.into());
            }
        };

        SCREEN_ACTIVE.store(true, Ordering::Release);
        debug!(refresh_hz, "Terminal renderer started");

        Ok(Self {
            terminal,
            widget: FrameWidget::new(),
            refresh: refresh_interval(refresh_hz),
            source_label: source_label.into(),
            fps: FpsCounter::new(),
            restored: false,
        })
    }

    /// Leave the alternate screen and raw mode
    pub fn restore(&mut self) -> Result<(), RenderError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        SCREEN_ACTIVE.store(false, Ordering::Release);
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn status_message(&self) -> String {
        match &self.widget.frame {
            Some(frame) => format!(
                "{} | {} | #{} | {:.1} fps | 'q' quit",
                self.source_label,
                frame.geometry(),
                frame.sequence(),
                self.fps.fps()
            ),
            None => format!("{} | waiting | 'q' quit", self.source_label),
        }
    }
}

impl FrameRenderer for TerminalRenderer {
    fn upload(&mut self, frame: RgbaFrame) {
        self.fps.tick();
        self.widget.update_frame(frame);
    }

    fn draw(&mut self) -> Result<LoopAction, RenderError> {
        let status_message = self.status_message();
        let widget = &self.widget;

        self.terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let frame_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            f.render_widget(widget, frame_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Presentation wait doubles as input handling
        if event::poll(self.refresh)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && is_quit_key(key.code, key.modifiers)
        {
            return Ok(LoopAction::Stop);
        }

        Ok(LoopAction::Continue)
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "Failed to restore terminal");
        }
    }
}

/// q, Esc or Ctrl+C
fn is_quit_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// New frames per second over a one-second window
struct FpsCounter {
    window_start: Instant,
    count: u32,
    fps: f64,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.count += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.count as f64 / elapsed.as_secs_f64();
            self.count = 0;
            self.window_start = Instant::now();
        }
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}

/// Widget that renders a frame using half-block characters
struct FrameWidget {
    frame: Option<RgbaFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: RgbaFrame) {
        self.frame = Some(frame);
    }
}

/// Largest cell area with the frame's aspect ratio that fits `area`
///
/// Each cell shows two vertical pixels, so the returned height is in cells.
fn fit_to_area(frame_width: u32, frame_height: u32, area: Rect) -> (u16, u16) {
    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    if term_height <= 0.0 || term_width <= 0.0 {
        return (0, 0);
    }

    if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        // Terminal is taller - fit to width
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let (display_width, display_height) = fit_to_area(frame.width(), frame.height(), area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &RgbaFrame, x: u32, y: u32) -> Color {
    let [r, g, b, _] = frame.pixel(x, y);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
