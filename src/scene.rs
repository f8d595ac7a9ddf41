//! Frame description: screen geometry, buttons, and the draw commands for one frame.
//!
//! Everything here is in screen pixels with y growing downwards. The terminal front-end
//! decides how pixels map onto cells.

use crate::game::{Cell, GameState, Phase, PieceKind};
use crate::raster::{block_outline, midpoint_line};
use crate::theme::Theme;
use ratatui::style::Color;

/// Width of the strip right of the playfield (score, level).
pub const SIDEBAR_WIDTH: i32 = 200;
const BUTTON_WIDTH: i32 = 120;
const BUTTON_HEIGHT: i32 = 30;

/// Screen geometry derived from the grid size and cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub cell_size: u16,
    pub columns: usize,
    pub rows: usize,
}

impl Viewport {
    pub fn field_width(&self) -> i32 {
        self.columns as i32 * i32::from(self.cell_size)
    }

    pub fn field_height(&self) -> i32 {
        self.rows as i32 * i32::from(self.cell_size)
    }

    pub fn width(&self) -> i32 {
        self.field_width() + SIDEBAR_WIDTH
    }

    pub fn height(&self) -> i32 {
        self.field_height()
    }

    pub fn start_button(&self) -> Button {
        Button {
            x: self.width() / 2 - BUTTON_WIDTH / 2,
            y: self.height() / 2 + 80,
            w: BUTTON_WIDTH,
            h: BUTTON_HEIGHT,
            label: "Start",
        }
    }

    pub fn quit_button(&self) -> Button {
        Button {
            x: self.width() / 2 - BUTTON_WIDTH / 2,
            y: self.height() / 2 + 40,
            w: BUTTON_WIDTH,
            h: BUTTON_HEIGHT,
            label: "Quit",
        }
    }
}

/// Rectangular hit region with a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub label: &'static str,
}

impl Button {
    /// Edges count as inside.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        (x..=x + f64::from(self.w)).contains(&px) && (y..=y + f64::from(self.h)).contains(&py)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Points { points: Vec<(f64, f64)>, color: Color },
    /// Filled rectangle, top-left corner at (x, y).
    Quad {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        color: Color,
    },
    /// Text whose baseline starts at (x, y).
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Color,
    },
}

/// One frame: clear colour, then commands in painting order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: i32,
    pub height: i32,
    pub background: Color,
    pub commands: Vec<DrawCommand>,
}

fn to_points(points: impl Iterator<Item = (i32, i32)>) -> Vec<(f64, f64)> {
    points.map(|(x, y)| (f64::from(x), f64::from(y))).collect()
}

impl GameState {
    /// Build the draw commands for the current state.
    pub fn on_draw(&self, theme: &Theme) -> Scene {
        let vp = self.viewport();
        let mut commands = Vec::new();
        if self.phase() == Phase::GameOver {
            game_over_menu(&vp, theme, &mut commands);
        } else {
            self.field(&vp, theme, &mut commands);
            self.sidebar(&vp, theme, &mut commands);
        }
        Scene {
            width: vp.width(),
            height: vp.height(),
            background: theme.background_for(self.intensity()),
            commands,
        }
    }

    fn field(&self, vp: &Viewport, theme: &Theme, out: &mut Vec<DrawCommand>) {
        let (w, h) = (vp.field_width(), vp.field_height());
        let border = midpoint_line(0, 0, w, 0)
            .chain(midpoint_line(w, 0, w, h))
            .chain(midpoint_line(w, h, 0, h))
            .chain(midpoint_line(0, h, 0, 0));
        out.push(DrawCommand::Points {
            points: to_points(border),
            color: theme.border,
        });

        let cell = i32::from(vp.cell_size);
        let blocks = self.playfield.rows().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| **c == Cell::Block)
                .flat_map(move |(x, _)| block_outline(x as i32 * cell, y as i32 * cell, cell))
        });
        out.push(DrawCommand::Points {
            points: to_points(blocks),
            color: theme.block,
        });

        if let Some(piece) = &self.piece {
            let color = if piece.kind == PieceKind::Bomb {
                theme.bomb
            } else {
                theme.block
            };
            let outline = piece
                .cells()
                .filter(|&(_, gy)| gy >= 0)
                .flat_map(|(gx, gy)| block_outline(gx * cell, gy * cell, cell));
            out.push(DrawCommand::Points {
                points: to_points(outline),
                color,
            });
        }

        if !self.particles.is_empty() {
            out.push(DrawCommand::Points {
                points: self
                    .particles
                    .iter()
                    .map(|p| (f64::from(p.x), f64::from(p.y)))
                    .collect(),
                color: theme.particle,
            });
        }
    }

    fn sidebar(&self, vp: &Viewport, theme: &Theme, out: &mut Vec<DrawCommand>) {
        let x = vp.field_width() + 20;
        let mut lines = vec![
            format!("Score: {}", self.score),
            format!("Level: {}", self.intensity()),
        ];
        if self.phase() == Phase::Paused {
            lines.push("PAUSED".to_string());
        }
        for (i, text) in lines.into_iter().enumerate() {
            out.push(DrawCommand::Text {
                x,
                y: 40 + 30 * i as i32,
                text,
                color: theme.text,
            });
        }
    }
}

fn game_over_menu(vp: &Viewport, theme: &Theme, out: &mut Vec<DrawCommand>) {
    out.push(DrawCommand::Text {
        x: vp.width() / 2 - 50,
        y: vp.height() / 3,
        text: "Game Over!".to_string(),
        color: theme.text,
    });
    for button in [vp.start_button(), vp.quit_button()] {
        out.push(DrawCommand::Quad {
            x: button.x,
            y: button.y,
            w: button.w,
            h: button.h,
            color: theme.button,
        });
        out.push(DrawCommand::Text {
            x: button.x + button.w / 4,
            y: button.y + button.h / 2,
            text: button.label.to_string(),
            color: theme.text,
        });
    }
}
