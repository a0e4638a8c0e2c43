use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// snapshot of the pacing state, refreshed once per executing tick
#[derive(Debug, Clone, Default)]
pub struct PacingStatus {
    pub cumulative_cycles: u64,
    pub emulated_ms: u64,
    pub bursts_last_tick: u32,
    pub cycles_last_tick: u64,
    pub full_speed: bool,
    pub audio_occupancy_ms: u64,
}

/// The presentation collaborator. The pacing loop asks for a refresh after
/// every executing tick; what gets painted (and how) is not its concern.
pub trait StatusDisplay {
    fn refresh(&mut self, status: &PacingStatus) -> Result<(), io::Error>;
}

/// status panel in a terminal, rendered using TUI over crossterm
pub struct TermStatusDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TermStatusDisplay {
    pub fn new() -> Result<TermStatusDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(TermStatusDisplay { terminal })
    }
}

impl StatusDisplay for TermStatusDisplay {
    fn refresh(&mut self, status: &PacingStatus) -> Result<(), io::Error> {
        let lines = vec![
            Spans::from(format!("cycles     {:>16}", status.cumulative_cycles)),
            Spans::from(format!("emulated   {:>13} ms", status.emulated_ms)),
            Spans::from(format!(
                "last tick  {:>6} bursts {:>9} cycles",
                status.bursts_last_tick, status.cycles_last_tick
            )),
            Spans::from(format!("audio      {:>13} ms", status.audio_occupancy_ms)),
            Spans::from(if status.full_speed {
                Span::styled(
                    "FULL SPEED",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw("")
            }),
        ];

        self.terminal.draw(|f| {
            let size = f.size();
            let area = Rect::new(0, 0, size.width.min(46), size.height.min(7));
            let panel = Paragraph::new(lines).block(
                Block::default()
                    .title("a2pace")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            );
            f.render_widget(panel, area);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay;

impl DummyDisplay {
    pub fn new() -> Result<DummyDisplay, io::Error> {
        Ok(DummyDisplay {})
    }
}

impl StatusDisplay for DummyDisplay {
    fn refresh(&mut self, _status: &PacingStatus) -> Result<(), io::Error> {
        Ok(())
    }
}
