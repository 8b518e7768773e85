use crate::frame::{FrameSnapshot, SCREEN_HEIGHT, SCREEN_WIDTH};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Consumes framebuffer snapshots. Abstracts the screen away so the
/// core and the tests never have to touch a real terminal.
pub trait Display {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), io::Error>;
}

/// collect the coordinates of every pixel matching `lit`, in the float
/// space the canvas expects (y axis pointing down becomes negative)
fn points(frame: &FrameSnapshot, lit: bool) -> Vec<(f64, f64)> {
    let mut coords = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT);
    for (y, row) in frame.pixels.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell == lit {
                coords.push((x as f64, -1.0 * y as f64));
            }
        }
    }
    coords
}

/// Monochrome display in a terminal, rendered using TUI over crossterm.
/// The frame border doubles as the sound indicator: it lights up while
/// the sound timer is running.
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl MonoTermDisplay {
    /// NB. the terminal stays in cooked mode; key input is read a whole
    /// line at a time
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay { terminal })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), io::Error> {
        let border = if frame.sound_active {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };
        let off = points(frame, false);
        let on = points(frame, true);
        self.terminal.draw(|f| {
            // 1:1 between chip pixels and canvas cells, plus the border
            let size = Rect::new(0, 0, 2 + SCREEN_WIDTH as u16, 2 + SCREEN_HEIGHT as u16);
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("ocho")
                        .borders(Borders::ALL)
                        .border_style(border)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (SCREEN_WIDTH - 1) as f64])
                .y_bounds([-1.0 * (SCREEN_HEIGHT - 1) as f64, 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for exercising everything except the rendering itself
pub struct DummyDisplay {
    pub frames: usize,
    pub last_sound: bool,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last_sound: false,
        }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), io::Error> {
        self.frames += 1;
        self.last_sound = frame.sound_active;
        Ok(())
    }
}
