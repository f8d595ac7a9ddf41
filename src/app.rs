//! App: terminal init, main loop, tick, key and mouse handling.

use crate::game::{Flow, GameState};
use crate::input::{self, KeyInput};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseEvent};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tachyonfx::Effect;

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    /// Seeds each new game so a `--seed` run replays the same sequence of games.
    rng: StdRng,
    tick_interval: Duration,
    last_tick: Instant,
    no_animation: bool,
    /// Where the last frame put the canvas; mouse clicks are mapped through it.
    canvas: Rect,
    game_over_fade: Option<Effect>,
    game_over_fade_time: Option<Instant>,
    was_game_over: bool,
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme, tick_interval: Duration) -> Self {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let now = Instant::now();
        let state = GameState::new(&config, StdRng::seed_from_u64(rng.random()), now);
        log::info!(
            "new game: {}x{} cells, {} px per cell, fall every {:?}",
            config.width,
            config.height,
            config.cell_size,
            config.fall_interval
        );
        Self {
            config,
            theme,
            state,
            rng,
            tick_interval,
            last_tick: now,
            no_animation: args.no_animation,
            canvas: Rect::default(),
            game_over_fade: None,
            game_over_fade_time: None,
            was_game_over: false,
        }
    }

    fn restart(&mut self, now: Instant) {
        let final_score = self.state.score;
        self.state = GameState::new(&self.config, StdRng::seed_from_u64(self.rng.random()), now);
        self.game_over_fade = None;
        self.game_over_fade_time = None;
        self.was_game_over = false;
        log::info!("restart (previous score {final_score})");
    }

    /// Apply a handler's verdict. Returns true when the app should exit.
    fn apply_flow(&mut self, flow: Flow, now: Instant) -> bool {
        match flow {
            Flow::Continue => false,
            Flow::Restart => {
                self.restart(now);
                false
            }
            Flow::Quit => {
                log::info!("quit with score {}", self.state.score);
                true
            }
        }
    }

    fn on_mouse(&self, mouse: MouseEvent) -> Flow {
        let Some(click) = input::mouse_to_click(mouse) else {
            return Flow::Continue;
        };
        let vp = self.state.viewport();
        match crate::ui::cell_to_pixel(self.canvas, vp.width(), vp.height(), click.column, click.row) {
            Some((x, y)) => self.state.on_mouse_click(click.button, click.pressed, x, y),
            None => Flow::Continue,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore; a failure here must not hide the loop's own error.
        if let Err(e) = terminal.show_cursor() {
            log::warn!("failed to show cursor: {e}");
        }
        if let Err(e) = execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen) {
            log::warn!("failed to leave alternate screen: {e}");
        }
        if let Err(e) = disable_raw_mode() {
            log::warn!("failed to disable raw mode: {e}");
        }

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let scene = self.state.on_draw(&self.theme);
            terminal.draw(|f| {
                self.canvas = crate::ui::draw(
                    f,
                    &scene,
                    &mut self.game_over_fade,
                    &mut self.game_over_fade_time,
                    now,
                );
            })?;

            let timeout = self.tick_interval.saturating_sub(self.last_tick.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let now = Instant::now();
                    let flow = match event::read()? {
                        // Only the first press; repeats and releases are ignored.
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            match input::key_to_input(key) {
                                KeyInput::Char(action) => self.state.on_key(action, now),
                                KeyInput::Special(action) => self.state.on_special_key(action),
                            }
                        }
                        Event::Mouse(mouse) => self.on_mouse(mouse),
                        _ => Flow::Continue,
                    };
                    if self.apply_flow(flow, now) {
                        return Ok(());
                    }
                }
            }

            if self.last_tick.elapsed() >= self.tick_interval {
                self.last_tick = Instant::now();
                self.state.on_tick(self.last_tick);
            }

            let game_over = self.state.is_game_over();
            if game_over && !self.was_game_over && !self.no_animation {
                let bg = self.theme.background_for(self.state.intensity());
                self.game_over_fade = Some(crate::ui::game_over_fade(bg));
                self.game_over_fade_time = None;
            }
            self.was_game_over = game_over;
        }
    }
}
