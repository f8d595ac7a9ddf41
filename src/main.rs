//! Bombtris: falling-block puzzle with bomb blocks, drawn point by point in the terminal.

mod app;
mod game;
mod input;
mod particles;
mod raster;
mod scene;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Options derived from CLI that affect game behaviour (field size, timing, particles).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    /// Pixels per grid cell.
    pub cell_size: u16,
    pub fall_interval: Duration,
    pub particles_per_cell: usize,
    pub particle_lifetime: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            cell_size: 30,
            fall_interval: Duration::from_secs(1),
            particles_per_cell: 5,
            particle_lifetime: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("playfield must be at least {min} columns wide, got {got}")]
    TooNarrow { min: u16, got: u16 },
    #[error("playfield must be at most {max} columns wide, got {got}")]
    TooWide { max: u16, got: u16 },
    #[error("playfield must be at least {min} rows tall, got {got}")]
    TooShort { min: u16, got: u16 },
    #[error("playfield must be at most {max} rows tall, got {got}")]
    TooTall { max: u16, got: u16 },
    #[error("cell size must be at least {min} pixels, got {got}")]
    CellTooSmall { min: u16, got: u16 },
    #[error("cell size must be at most {max} pixels, got {got}")]
    CellTooLarge { max: u16, got: u16 },
    #[error("fall interval must be positive")]
    ZeroFallInterval,
    #[error("frame rate must give a positive frame interval, got {0}")]
    BadFrameRate(String),
}

/// Narrowest field that fits every catalog shape at the spawn column.
const MIN_WIDTH: u16 = 4;
const MIN_HEIGHT: u16 = 4;
const MIN_CELL_SIZE: u16 = 4;
/// Upper bounds keep screen geometry well inside `i32`.
const MAX_WIDTH: u16 = 200;
const MAX_HEIGHT: u16 = 200;
const MAX_CELL_SIZE: u16 = 200;

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_WIDTH {
            return Err(ConfigError::TooNarrow {
                min: MIN_WIDTH,
                got: self.width,
            });
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::TooWide {
                max: MAX_WIDTH,
                got: self.width,
            });
        }
        if self.height < MIN_HEIGHT {
            return Err(ConfigError::TooShort {
                min: MIN_HEIGHT,
                got: self.height,
            });
        }
        if self.height > MAX_HEIGHT {
            return Err(ConfigError::TooTall {
                max: MAX_HEIGHT,
                got: self.height,
            });
        }
        if self.cell_size < MIN_CELL_SIZE {
            return Err(ConfigError::CellTooSmall {
                min: MIN_CELL_SIZE,
                got: self.cell_size,
            });
        }
        if self.cell_size > MAX_CELL_SIZE {
            return Err(ConfigError::CellTooLarge {
                max: MAX_CELL_SIZE,
                got: self.cell_size,
            });
        }
        if self.fall_interval.is_zero() {
            return Err(ConfigError::ZeroFallInterval);
        }
        Ok(())
    }
}

/// Time between updates for `frame_rate` updates per second.
pub fn tick_interval(frame_rate: f64) -> Result<Duration, ConfigError> {
    let bad = || ConfigError::BadFrameRate(frame_rate.to_string());
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(bad());
    }
    match Duration::try_from_secs_f64(1.0 / frame_rate) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(bad()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let interval = tick_interval(args.frame_rate)?;
    let config = GameConfig {
        width: args.width,
        height: args.height,
        cell_size: args.cell_size,
        fall_interval: Duration::from_millis(args.fall_interval_ms),
        particles_per_cell: args.particles_per_cell,
        particle_lifetime: Duration::from_millis(args.particle_lifetime_ms),
    };
    config.validate()?;
    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("theme not loaded, using classic colours: {e}");
            theme::Theme::default()
        }
    };
    let mut app = App::new(&args, config, theme, interval);
    app.run()?;
    Ok(())
}

/// Route `log` records to a file; the terminal itself belongs to the game.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

/// Falling-block puzzle with bomb blocks in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "bombtris",
    version,
    about = "Falling-block puzzle with bomb blocks. Clear full rows to score; bombs blow a 3x3 hole.",
    long_about = "Bombtris is a falling-block puzzle drawn point by point in the terminal.\n\n\
        Seven letter pieces and a single-cell bomb fall one at a time. Full rows are cleared \
        for 100 points each and burst into particles; a bomb empties the 3x3 area around \
        where it lands. The background darkens every 1000 points.\n\n\
        CONTROLS:\n  A/D or Left/Right  Move    W or Up     Rotate    S or Down  Soft drop\n  \
        Space              Hard drop   P       Pause     Q / Esc    Quit\n  \
        After game over: R or click Start to play again, Q or click Quit to leave."
)]
pub struct Args {
    /// Playfield width in columns.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Playfield height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Size of one grid cell in screen pixels.
    #[arg(long, default_value = "30", value_name = "PX")]
    pub cell_size: u16,

    /// Time between automatic falls in milliseconds.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub fall_interval_ms: u64,

    /// Updates (and frames) per second. Particles move once per update.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Particles spawned per column of a cleared row.
    #[arg(long, default_value = "5", value_name = "N")]
    pub particles_per_cell: usize,

    /// Particle lifetime in milliseconds.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub particle_lifetime_ms: u64,

    /// Seed for piece and particle randomness (random if not set).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"#RRGGBB\"). Uses the classic colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable the game-over fade-in.
    #[arg(long)]
    pub no_animation: bool,
}
