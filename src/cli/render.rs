use std::io::Write;

use ansi_term::{Colour, Style};
use tracing::warn;

use crate::{
    config::Departments,
    tracker::{event::Presenter, state::TrackerState},
    utils::time::{date_key, format_seconds},
};

/// How much brighter a running department is drawn.
const ACTIVE_LUMINOSITY: u8 = 60;

/// Draws the current day as a list of departments with their timers.
pub struct TerminalBoard<W> {
    output: W,
    colored: bool,
}

impl<W: Write> TerminalBoard<W> {
    pub fn new(output: W, colored: bool) -> Self {
        Self { output, colored }
    }

    fn draw(&mut self, state: &TrackerState, departments: &Departments) -> std::io::Result<()> {
        let day = state.current_day();
        writeln!(
            self.output,
            "\n{} {}",
            date_key(state.current_date),
            state.current_date.format("%A")
        )?;

        let mut total = 0;
        for (index, entry) in departments.entries().iter().enumerate() {
            let record = day
                .and_then(|v| v.get(&entry.name))
                .copied()
                .unwrap_or_default();
            total += record.time;

            let marker = if record.is_active { "●" } else { " " };
            let line = format!(
                "{marker} F{:<3}{:<16}{}",
                index + 1,
                entry.name.name(),
                format_seconds(record.time)
            );
            let style = self.style(entry.color.as_deref(), record.is_active);
            writeln!(self.output, "{}", style.paint(line))?;
        }
        writeln!(self.output, "  {:<20}{}", "Total", format_seconds(total))?;
        self.output.flush()
    }

    fn style(&self, color: Option<&str>, active: bool) -> Style {
        if !self.colored {
            return Style::new();
        }
        let Some((r, g, b)) = color.and_then(parse_hex_color) else {
            return if active { Style::new().bold() } else { Style::new() };
        };
        if active {
            let (r, g, b) = increase_luminosity((r, g, b), ACTIVE_LUMINOSITY);
            Colour::White.on(Colour::RGB(r, g, b)).bold()
        } else {
            // The configured colors are dark backgrounds, text needs a lighter shade.
            let (r, g, b) = increase_luminosity((r, g, b), ACTIVE_LUMINOSITY / 2);
            Colour::RGB(r, g, b).normal()
        }
    }
}

impl<W: Write> Presenter for TerminalBoard<W> {
    fn present(&mut self, state: &TrackerState, departments: &Departments) {
        if let Err(e) = self.draw(state, departments) {
            warn!("Failed to draw the board {e}");
        }
    }
}

/// Parses `#RRGGBB`.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn increase_luminosity((r, g, b): (u8, u8, u8), amount: u8) -> (u8, u8, u8) {
    (
        r.saturating_add(amount),
        g.saturating_add(amount),
        b.saturating_add(amount),
    )
}
