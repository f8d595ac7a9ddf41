//! Render: paint a [`Scene`] onto a Braille canvas, map clicks back to scene pixels,
//! and run the game-over fade (TachyonFX).

use crate::scene::{DrawCommand, Scene};
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Points};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal cells are about twice as tall as wide.
const CELL_ASPECT: f64 = 2.0;
const GAME_OVER_FADE_MS: u32 = 600;

/// Largest rect inside `area` that keeps the scene's aspect ratio, centred.
pub fn canvas_rect(area: Rect, scene_width: i32, scene_height: i32) -> Rect {
    if scene_width <= 0 || scene_height <= 0 {
        return Rect::default();
    }
    let cols_per_row = CELL_ASPECT * f64::from(scene_width) / f64::from(scene_height);
    let rows = f64::from(area.height).min(f64::from(area.width) / cols_per_row);
    let height = rows.floor() as u16;
    let width = ((rows * cols_per_row).round() as u16).min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Scene pixel under the centre of terminal cell (`column`, `row`), or None outside `rect`.
pub fn cell_to_pixel(
    rect: Rect,
    scene_width: i32,
    scene_height: i32,
    column: u16,
    row: u16,
) -> Option<(f64, f64)> {
    if !rect.contains(Position { x: column, y: row }) {
        return None;
    }
    let u = (f64::from(column - rect.x) + 0.5) / f64::from(rect.width);
    let v = (f64::from(row - rect.y) + 0.5) / f64::from(rect.height);
    Some((u * f64::from(scene_width), v * f64::from(scene_height)))
}

/// Fade the whole canvas in from the background colour.
pub fn game_over_fade(bg: Color) -> Effect {
    fx::fade_from(bg, bg, (GAME_OVER_FADE_MS, Interpolation::QuadOut))
}

/// Draw one frame and return the canvas rect (needed to map mouse clicks).
/// A running `fade` is advanced by the time since `fade_time`; finished fades are dropped.
pub fn draw(
    frame: &mut Frame,
    scene: &Scene,
    fade: &mut Option<Effect>,
    fade_time: &mut Option<Instant>,
    now: Instant,
) -> Rect {
    let area = frame.area();
    let rect = canvas_rect(area, scene.width, scene.height);
    if rect.width < 2 || rect.height < 2 {
        let msg = Paragraph::new("Terminal too small")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red));
        frame.render_widget(msg, area);
        return Rect::default();
    }
    draw_scene(frame, scene, rect);

    if let Some(effect) = fade {
        let delta = fade_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        *fade_time = Some(now);
        frame.render_effect(effect, rect, TfxDuration::from_millis(delta_ms));
        if effect.done() {
            *fade = None;
            *fade_time = None;
        }
    }
    rect
}

fn draw_scene(frame: &mut Frame, scene: &Scene, rect: Rect) {
    let height = f64::from(scene.height);
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(scene.background)
        .x_bounds([0.0, f64::from(scene.width)])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for command in &scene.commands {
                paint(ctx, command, height);
            }
        });
    frame.render_widget(canvas, rect);
}

/// Canvas y grows upwards; scene y grows downwards.
fn paint(ctx: &mut Context, command: &DrawCommand, height: f64) {
    match command {
        DrawCommand::Points { points, color } => {
            let coords: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x, height - y)).collect();
            ctx.draw(&Points {
                coords: &coords,
                color: *color,
            });
        }
        DrawCommand::Quad { x, y, w, h, color } => {
            let (x1, x2) = (f64::from(*x), f64::from(x + w));
            for dy in 0..=*h {
                let row = height - f64::from(y + dy);
                ctx.draw(&CanvasLine {
                    x1,
                    y1: row,
                    x2,
                    y2: row,
                    color: *color,
                });
            }
        }
        DrawCommand::Text { x, y, text, color } => {
            ctx.print(
                f64::from(*x),
                height - f64::from(*y),
                Line::styled(text.clone(), Style::default().fg(*color)),
            );
        }
    }
}
