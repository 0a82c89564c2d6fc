//! Raw-mode terminal with line-level redraws.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event as CrosstermEvent},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

/// How a line is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStyle {
    pub bold: bool,
    pub dim: bool,
    pub reverse: bool,
}

/// One screen row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

pub struct Terminal {
    stdout: io::Stdout,
    previous: Vec<Line>,
    width: u16,
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        let mut stdout = io::stdout();

        terminal::enable_raw_mode()?;
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        let (width, _) = terminal::size()?;
        Ok(Self {
            stdout,
            previous: Vec::new(),
            width,
        })
    }

    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll(&self, timeout: Option<Duration>) -> io::Result<Vec<CrosstermEvent>> {
        let mut events = Vec::new();

        let has_event = match timeout {
            Some(dur) => event::poll(dur)?,
            None => {
                events.push(event::read()?);
                return Ok(events);
            }
        };

        if has_event {
            events.push(event::read()?);
            // Drain any additional pending events
            while event::poll(Duration::ZERO)? {
                events.push(event::read()?);
            }
        }

        Ok(events)
    }

    /// Draw `lines` from the top of the screen, rewriting only rows that
    /// changed since the last call.
    pub fn draw(&mut self, lines: &[Line]) -> io::Result<()> {
        let (width, _) = terminal::size()?;
        if width != self.width {
            self.width = width;
            self.previous.clear();
            queue!(self.stdout, Clear(ClearType::All))?;
        }

        for (y, line) in lines.iter().enumerate() {
            if self.previous.get(y) == Some(line) {
                continue;
            }
            let y = u16::try_from(y).unwrap_or(u16::MAX);
            queue!(
                self.stdout,
                cursor::MoveTo(0, y),
                SetAttribute(Attribute::Reset)
            )?;
            if line.style.bold {
                queue!(self.stdout, SetAttribute(Attribute::Bold))?;
            }
            if line.style.dim {
                queue!(self.stdout, SetAttribute(Attribute::Dim))?;
            }
            if line.style.reverse {
                queue!(self.stdout, SetAttribute(Attribute::Reverse))?;
            }
            queue!(self.stdout, Print(fit(&line.text, width)))?;
        }

        for y in lines.len()..self.previous.len() {
            let y = u16::try_from(y).unwrap_or(u16::MAX);
            queue!(
                self.stdout,
                cursor::MoveTo(0, y),
                SetAttribute(Attribute::Reset),
                Clear(ClearType::CurrentLine)
            )?;
        }

        queue!(self.stdout, SetAttribute(Attribute::Reset))?;
        self.stdout.flush()?;
        self.previous = lines.to_vec();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Truncate or pad `text` to exactly `width` display columns.
pub fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_pads_short_text() {
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn test_fit_truncates_by_display_width() {
        // Each CJK character is two columns wide.
        assert_eq!(fit("東京都", 5), "東京 ");
        assert_eq!(fit("Zürich", 3), "Zür");
    }
}
