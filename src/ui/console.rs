// RptWatch - ui/console.rs
//
// Terminal sink: prints entries as they arrive, coloured by severity.
//
// Colour state is never left behind: every coloured write is followed by a
// reset in the same queued batch, so an entry that ends mid-line, a Ctrl+C
// between writes, or a following uncoloured entry all see the default
// colour.

use crate::core::model::Severity;
use crate::core::sink::EntrySink;
use crate::ui::theme;
use crate::util::error::SinkError;
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use std::io::Write;

pub struct ConsoleSink<W: Write> {
    out: W,
    colour: bool,
    /// Whether the last thing printed ended with a newline.
    at_line_start: bool,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(colour: bool) -> Self {
        Self::new(std::io::stdout(), colour)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, colour: bool) -> Self {
        Self {
            out,
            colour,
            at_line_start: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EntrySink for ConsoleSink<W> {
    fn on_file_switched(&mut self, display_name: &str) -> Result<(), SinkError> {
        if !self.at_line_start {
            queue!(self.out, Print("\n"))?;
        }
        let banner = format!("==> {display_name} <==\n");
        if self.colour {
            queue!(
                self.out,
                SetForegroundColor(theme::SWITCH_BANNER),
                Print(banner),
                ResetColor
            )?;
        } else {
            queue!(self.out, Print(banner))?;
        }
        self.at_line_start = true;
        self.out.flush()?;
        Ok(())
    }

    fn on_entry(&mut self, text: &str, severity: Severity) -> Result<(), SinkError> {
        if text.is_empty() {
            return Ok(());
        }
        match theme::severity_colour(severity).filter(|_| self.colour) {
            Some(colour) => queue!(self.out, SetForegroundColor(colour), Print(text), ResetColor)?,
            None => queue!(self.out, Print(text))?,
        }
        self.at_line_start = text.ends_with('\n');
        self.out.flush()?;
        Ok(())
    }
}
