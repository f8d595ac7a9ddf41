//! Game state: playfield, piece catalog, active piece, line clear, bombs, fall timing.

use crate::GameConfig;
use crate::input::{Action, PointerButton};
use crate::particles::ParticleField;
use crate::scene::Viewport;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Points awarded per cleared row.
pub const ROW_CLEAR_SCORE: u32 = 100;

/// Score per background intensity tier.
const INTENSITY_STEP: u32 = 1000;
pub const MAX_INTENSITY: u8 = 2;

/// Tried in order when a rotation collides in place: right, left, up.
const WALL_KICKS: [(i32, i32); 3] = [(1, 0), (-1, 0), (0, -1)];

/// Catalog entries: seven letter shapes and the single-cell bomb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
    Bomb,
}

impl PieceKind {
    pub const ALL: [Self; 8] = [
        Self::I,
        Self::O,
        Self::T,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::Bomb,
    ];

    /// Cells relative to the anchor; each (dx, dy), y grows downwards.
    pub fn cells(&self) -> &'static [(i32, i32)] {
        match self {
            Self::I => &[(0, 0), (0, 1), (0, 2), (0, 3)],
            Self::O => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => &[(0, 0), (1, 0), (2, 0), (1, 1)],
            Self::S => &[(1, 0), (2, 0), (0, 1), (1, 1)],
            Self::Z => &[(0, 0), (1, 0), (1, 1), (2, 1)],
            Self::J => &[(0, 0), (0, 1), (1, 1), (2, 1)],
            Self::L => &[(2, 0), (0, 1), (1, 1), (2, 1)],
            Self::Bomb => &[(0, 0)],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::S => "S",
            Self::Z => "Z",
            Self::J => "J",
            Self::L => "L",
            Self::Bomb => "BOMB",
        }
    }

    /// Uniform over all catalog entries, bomb included.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Offsets of a piece relative to its anchor.
pub type Shape = Vec<(i32, i32)>;

fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

fn min_corner(shape: &[(i32, i32)]) -> (i32, i32) {
    shape
        .iter()
        .fold((i32::MAX, i32::MAX), |(mx, my), &(x, y)| (mx.min(x), my.min(y)))
}

/// Quarter turn about the shape's centroid, rounding each coordinate half-up, then shifted
/// so the bounding box keeps its top-left corner. Four turns give back the exact offsets.
pub fn rotated(shape: &[(i32, i32)]) -> Shape {
    if shape.is_empty() {
        return Vec::new();
    }
    let n = shape.len() as f64;
    let cx = shape.iter().map(|&(x, _)| f64::from(x)).sum::<f64>() / n;
    let cy = shape.iter().map(|&(_, y)| f64::from(y)).sum::<f64>() / n;
    let turned: Shape = shape
        .iter()
        .map(|&(x, y)| {
            let (rx, ry) = (f64::from(x) - cx, f64::from(y) - cy);
            (round_half_up(-ry + cx), round_half_up(rx + cy))
        })
        .collect();
    let (sx, sy) = min_corner(shape);
    let (tx, ty) = min_corner(&turned);
    turned
        .into_iter()
        .map(|(x, y)| (x + sx - tx, y + sy - ty))
        .collect()
}

/// Active falling piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// New piece of `kind` at the spawn anchor: horizontal centre, top row.
    pub fn spawn(kind: PieceKind, field_width: usize) -> Self {
        Self {
            kind,
            shape: kind.cells().to_vec(),
            x: field_width as i32 / 2 - 1,
            y: 0,
        }
    }

    /// Absolute grid coordinates of every cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().map(|&(dx, dy)| (self.x + dx, self.y + dy))
    }
}

/// Single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Block,
}

/// Occupancy grid. y=0 is the top row; dimensions never change.
#[derive(Debug, Clone)]
pub struct Playfield {
    pub width: usize,
    pub height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Playfield {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![Cell::Empty; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    #[inline]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(Cell::Block)
    }

    /// True if every cell of `shape` anchored at (x, y) is inside the side walls, above the
    /// floor and not on a block. Cells above the top edge are allowed and never collide.
    pub fn is_valid_placement(&self, x: i32, y: i32, shape: &[(i32, i32)]) -> bool {
        shape.iter().all(|&(dx, dy)| {
            let (gx, gy) = (x + dx, y + dy);
            if gx < 0 || gx >= self.width as i32 || gy >= self.height as i32 {
                log::debug!("cell ({gx}, {gy}) is out of bounds");
                return false;
            }
            if gy >= 0 && self.is_occupied(gx as usize, gy as usize) {
                log::debug!("cell ({gx}, {gy}) collides with a block");
                return false;
            }
            true
        })
    }

    /// Write the piece's cells into the grid. Returns false, leaving the grid untouched,
    /// if any cell is still above the top edge.
    pub fn commit(&mut self, piece: &Piece) -> bool {
        if piece.cells().any(|(_, gy)| gy < 0) {
            return false;
        }
        for (gx, gy) in piece.cells() {
            if gx >= 0 {
                self.set(gx as usize, gy as usize, Cell::Block);
            }
        }
        true
    }

    /// Empty the 3x3 neighbourhood centred on (x, y), clipped to the grid.
    pub fn detonate(&mut self, x: i32, y: i32) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if (0..self.width as i32).contains(&nx) && (0..self.height as i32).contains(&ny) {
                    self.set(nx as usize, ny as usize, Cell::Empty);
                }
            }
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|c| *c == Cell::Block))
    }

    /// Remove full rows bottom-up, shifting everything above down by one and inserting an
    /// empty top row. The same index is re-tested after a clear. `on_clear` receives the
    /// index of each cleared row. Returns the number of rows cleared.
    pub fn clear_full_rows(&mut self, mut on_clear: impl FnMut(usize)) -> u32 {
        let mut cleared = 0;
        let mut y = self.height;
        while y > 0 {
            if self.is_row_full(y - 1) {
                on_clear(y - 1);
                cleared += 1;
                self.rows.remove(y - 1);
                self.rows.push_front(vec![Cell::Empty; self.width]);
            } else {
                y -= 1;
            }
        }
        cleared
    }

    pub fn top_row_occupied(&self) -> bool {
        self.rows
            .front()
            .is_some_and(|row| row.iter().any(|c| *c == Cell::Block))
    }

    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| **c == Cell::Block).count())
            .sum()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Game phase. Starts in `Playing`; `GameOver` is left only by building a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Paused,
    GameOver,
}

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Replace the state with a freshly built one.
    Restart,
    Quit,
}

/// Game state: playfield, active piece, particles, score and fall timing.
#[derive(Debug)]
pub struct GameState {
    pub playfield: Playfield,
    pub piece: Option<Piece>,
    pub particles: ParticleField,
    pub score: u32,
    phase: Phase,
    /// Last gravity step (or resume from pause).
    last_fall: Instant,
    fall_interval: Duration,
    cell_size: u16,
    rng: StdRng,
}

impl GameState {
    pub fn new(config: &GameConfig, mut rng: StdRng, now: Instant) -> Self {
        let width = usize::from(config.width);
        let piece = Piece::spawn(PieceKind::random(&mut rng), width);
        Self {
            playfield: Playfield::new(width, usize::from(config.height)),
            piece: Some(piece),
            particles: ParticleField::new(config.particles_per_cell, config.particle_lifetime),
            score: 0,
            phase: Phase::Playing,
            last_fall: now,
            fall_interval: config.fall_interval,
            cell_size: config.cell_size,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Background tier derived from the score: 0, 1 or 2.
    pub fn intensity(&self) -> u8 {
        (self.score / INTENSITY_STEP).min(u32::from(MAX_INTENSITY)) as u8
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            cell_size: self.cell_size,
            columns: self.playfield.width,
            rows: self.playfield.height,
        }
    }

    /// Random catalog piece at the spawn anchor.
    pub fn spawn_piece(&mut self) -> Piece {
        Piece::spawn(PieceKind::random(&mut self.rng), self.playfield.width)
    }

    fn end_game(&mut self) {
        self.phase = Phase::GameOver;
        self.piece = None;
        log::info!("game over, score {}", self.score);
    }

    /// Translate the active piece. False (and no change) if there is no piece, the game is
    /// not being played, or the target is blocked.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        let Some(piece) = self.piece.as_mut() else {
            return false;
        };
        let (nx, ny) = (piece.x + dx, piece.y + dy);
        if self.playfield.is_valid_placement(nx, ny, &piece.shape) {
            piece.x = nx;
            piece.y = ny;
            true
        } else {
            log::debug!("move to ({nx}, {ny}) rejected");
            false
        }
    }

    /// Rotate in place, falling back to the wall kicks. Bombs never rotate.
    pub fn rotate(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(piece) = self.piece.as_mut() else {
            return;
        };
        if piece.kind == PieceKind::Bomb {
            return;
        }
        let shape = rotated(&piece.shape);
        let fits = std::iter::once((0, 0))
            .chain(WALL_KICKS)
            .find(|&(dx, dy)| {
                self.playfield
                    .is_valid_placement(piece.x + dx, piece.y + dy, &shape)
            });
        match fits {
            Some((dx, dy)) => {
                piece.x += dx;
                piece.y += dy;
                piece.shape = shape;
            }
            None => log::debug!("rotation of {} rejected", piece.kind.name()),
        }
    }

    /// Drop the piece as far as it goes and lock it.
    pub fn hard_drop(&mut self, now: Instant) {
        if self.phase != Phase::Playing || self.piece.is_none() {
            return;
        }
        while self.move_piece(0, 1) {}
        self.lock_piece(now);
    }

    /// Commit the active piece, run bomb and row clears, score, and spawn the next piece.
    fn lock_piece(&mut self, now: Instant) {
        let Some(piece) = self.piece.take() else {
            return;
        };
        if !self.playfield.commit(&piece) {
            log::info!("{} piece locked above the field", piece.kind.name());
            self.end_game();
            return;
        }

        let columns = self.playfield.width;
        if piece.kind == PieceKind::Bomb {
            self.playfield.detonate(piece.x, piece.y);
            self.particles.spawn_batch(
                &mut self.rng,
                piece.y as usize,
                columns,
                self.cell_size,
                now,
            );
        }

        let intensity_before = self.intensity();
        let cleared = self.playfield.clear_full_rows(|row| {
            self.particles
                .spawn_batch(&mut self.rng, row, columns, self.cell_size, now);
        });
        self.score += cleared * ROW_CLEAR_SCORE;
        if cleared > 0 {
            log::debug!(
                "cleared {cleared} rows, score {}, {} blocks left, {} particles",
                self.score,
                self.playfield.occupied_count(),
                self.particles.len()
            );
        }
        if self.intensity() != intensity_before {
            log::info!("intensity level {}", self.intensity());
        }

        let next = self.spawn_piece();
        if self.playfield.is_valid_placement(next.x, next.y, &next.shape) {
            self.piece = Some(next);
        } else {
            log::info!("no room to spawn {}", next.kind.name());
            self.end_game();
        }
    }

    /// Pause or resume. Resuming restarts the fall timer.
    pub fn toggle_pause(&mut self, now: Instant) {
        self.phase = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused => {
                self.last_fall = now;
                Phase::Playing
            }
            Phase::GameOver => Phase::GameOver,
        };
    }

    /// One fixed-cadence update: gravity step when the fall interval has elapsed, particle
    /// motion, and the top-row check. Nothing happens while paused or after game over.
    pub fn on_tick(&mut self, now: Instant) {
        if self.phase != Phase::Playing {
            return;
        }
        if now.saturating_duration_since(self.last_fall) >= self.fall_interval {
            if !self.move_piece(0, 1) {
                self.lock_piece(now);
            }
            self.last_fall = now;
        }
        self.particles.tick(now);
        if self.phase == Phase::Playing && self.playfield.top_row_occupied() {
            log::info!("stack reached the top row");
            self.end_game();
        }
    }

    /// Character keys. After game over only restart and quit are honoured.
    pub fn on_key(&mut self, action: Action, now: Instant) -> Flow {
        if self.phase == Phase::GameOver {
            return match action {
                Action::Restart => Flow::Restart,
                Action::Quit => Flow::Quit,
                _ => Flow::Continue,
            };
        }
        match action {
            Action::MoveLeft => {
                self.move_piece(-1, 0);
            }
            Action::MoveRight => {
                self.move_piece(1, 0);
            }
            Action::SoftDrop => {
                self.move_piece(0, 1);
            }
            Action::Rotate => self.rotate(),
            Action::HardDrop => self.hard_drop(now),
            Action::Pause => self.toggle_pause(now),
            Action::Quit => return Flow::Quit,
            Action::Restart | Action::None => {}
        }
        Flow::Continue
    }

    /// Arrow keys: movement and rotation only, ignored unless playing.
    pub fn on_special_key(&mut self, action: Action) -> Flow {
        if self.phase != Phase::Playing {
            return Flow::Continue;
        }
        match action {
            Action::MoveLeft => {
                self.move_piece(-1, 0);
            }
            Action::MoveRight => {
                self.move_piece(1, 0);
            }
            Action::SoftDrop => {
                self.move_piece(0, 1);
            }
            Action::Rotate => self.rotate(),
            _ => {}
        }
        Flow::Continue
    }

    /// Left press on the game-over buttons. `x`, `y` are screen pixels.
    pub fn on_mouse_click(&self, button: PointerButton, pressed: bool, x: f64, y: f64) -> Flow {
        if self.phase != Phase::GameOver || button != PointerButton::Left || !pressed {
            return Flow::Continue;
        }
        let viewport = self.viewport();
        if viewport.start_button().contains(x, y) {
            Flow::Restart
        } else if viewport.quit_button().contains(x, y) {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn state() -> GameState {
        GameState::new(
            &GameConfig::default(),
            StdRng::seed_from_u64(42),
            Instant::now(),
        )
    }

    fn fill_row(field: &mut Playfield, y: usize) {
        for x in 0..field.width {
            field.set(x, y, Cell::Block);
        }
    }

    fn piece(kind: PieceKind, x: i32, y: i32) -> Piece {
        Piece {
            kind,
            shape: kind.cells().to_vec(),
            x,
            y,
        }
    }

    fn normalized(shape: &[(i32, i32)]) -> Vec<(i32, i32)> {
        let mx = shape.iter().map(|c| c.0).min().unwrap_or(0);
        let my = shape.iter().map(|c| c.1).min().unwrap_or(0);
        let mut out: Vec<_> = shape.iter().map(|&(x, y)| (x - mx, y - my)).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_catalog_shapes() {
        for kind in PieceKind::ALL {
            let n = if kind == PieceKind::Bomb { 1 } else { 4 };
            assert_eq!(kind.cells().len(), n, "{}", kind.name());
        }
    }

    #[test]
    fn test_random_kind_covers_catalog() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(PieceKind::random(&mut rng));
        }
        assert_eq!(seen.len(), PieceKind::ALL.len());
    }

    #[test]
    fn test_spawn_anchor() {
        let p = Piece::spawn(PieceKind::T, 10);
        assert_eq!((p.x, p.y), (4, 0));
    }

    #[test]
    fn test_placement_rejects_out_of_bounds() {
        let f = Playfield::new(10, 20);
        let shape = PieceKind::I.cells();
        assert!(!f.is_valid_placement(-1, 0, shape));
        assert!(!f.is_valid_placement(10, 0, shape));
        assert!(!f.is_valid_placement(0, 17, shape));
        assert!(f.is_valid_placement(0, 16, shape));
        assert!(f.is_valid_placement(9, 16, shape));
    }

    #[test]
    fn test_placement_above_top_is_allowed() {
        let mut f = Playfield::new(10, 20);
        fill_row(&mut f, 0);
        // Cells with y < 0 skip the occupancy check.
        assert!(f.is_valid_placement(3, -4, PieceKind::I.cells()));
        assert!(!f.is_valid_placement(3, -3, PieceKind::I.cells()));
        assert!(!f.is_valid_placement(-1, -4, PieceKind::I.cells()));
    }

    #[test]
    fn test_placement_rejects_collision() {
        let mut f = Playfield::new(10, 20);
        f.set(5, 10, Cell::Block);
        assert!(!f.is_valid_placement(4, 10, PieceKind::O.cells()));
        assert!(f.is_valid_placement(6, 10, PieceKind::O.cells()));
    }

    #[test]
    fn test_commit_overflow_leaves_grid_untouched() {
        let mut f = Playfield::new(10, 20);
        let p = piece(PieceKind::I, 2, -1);
        assert!(!f.commit(&p));
        assert_eq!(f.occupied_count(), 0);
        assert!(f.commit(&piece(PieceKind::I, 2, 0)));
        assert_eq!(f.occupied_count(), 4);
        assert!(f.is_occupied(2, 3));
    }

    #[test]
    fn test_clear_single_row_shifts_down() {
        let mut f = Playfield::new(10, 20);
        fill_row(&mut f, 19);
        f.set(3, 18, Cell::Block);
        f.set(7, 0, Cell::Block);
        let before = f.occupied_count();
        let mut rows = Vec::new();
        assert_eq!(f.clear_full_rows(|r| rows.push(r)), 1);
        assert_eq!(rows, vec![19]);
        assert_eq!(f.occupied_count(), before - 10);
        assert!(f.is_occupied(3, 19));
        assert!(f.is_occupied(7, 1));
        assert!(!f.top_row_occupied());
    }

    #[test]
    fn test_clear_adjacent_rows_rescans_same_index() {
        let mut f = Playfield::new(10, 20);
        fill_row(&mut f, 19);
        fill_row(&mut f, 18);
        fill_row(&mut f, 16);
        f.set(0, 17, Cell::Block);
        let mut rows = Vec::new();
        assert_eq!(f.clear_full_rows(|r| rows.push(r)), 3);
        assert_eq!(rows, vec![19, 19, 18]);
        assert_eq!(f.occupied_count(), 1);
        assert!(f.is_occupied(0, 19));
    }

    #[test]
    fn test_detonate_clears_neighbourhood_only() {
        let mut f = Playfield::new(10, 20);
        for y in 0..20 {
            fill_row(&mut f, y);
        }
        f.set(5, 10, Cell::Empty);
        assert!(f.commit(&piece(PieceKind::Bomb, 5, 10)));
        f.detonate(5, 10);
        for y in 0..20 {
            for x in 0..10 {
                let inside = (4..=6).contains(&x) && (9..=11).contains(&y);
                assert_eq!(f.is_occupied(x, y), !inside, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_detonate_clips_at_corner() {
        let mut f = Playfield::new(10, 20);
        for y in 0..20 {
            fill_row(&mut f, y);
        }
        f.detonate(0, 19);
        assert_eq!(f.occupied_count(), 200 - 4);
    }

    #[test]
    fn test_four_rotations_restore_shape() {
        for kind in PieceKind::ALL {
            let start = kind.cells().to_vec();
            let mut shape = start.clone();
            for _ in 0..4 {
                shape = rotated(&shape);
                let mut distinct = shape.clone();
                distinct.sort_unstable();
                distinct.dedup();
                assert_eq!(distinct.len(), start.len(), "{}", kind.name());
            }
            assert_eq!(shape, start, "{}", kind.name());
        }
    }

    #[test]
    fn test_rotation_is_a_quarter_turn() {
        for kind in PieceKind::ALL {
            let turned: Vec<_> = kind.cells().iter().map(|&(x, y)| (-y, x)).collect();
            assert_eq!(
                normalized(&rotated(kind.cells())),
                normalized(&turned),
                "{}",
                kind.name()
            );
        }
    }

    #[test]
    fn test_rotation_keeps_top_left_corner() {
        assert_eq!(
            rotated(PieceKind::I.cells()),
            vec![(3, 0), (2, 0), (1, 0), (0, 0)]
        );
        assert_eq!(
            rotated(PieceKind::T.cells()),
            vec![(1, 0), (1, 1), (1, 2), (0, 1)]
        );
    }

    #[test]
    fn test_eight_rotations_in_open_field_stay_put() {
        for kind in PieceKind::ALL {
            let mut s = state();
            let p = piece(kind, 4, 8);
            s.piece = Some(p.clone());
            for _ in 0..8 {
                s.rotate();
            }
            let after = s.piece.clone().unwrap();
            assert_eq!(after.cells().collect::<Vec<_>>(), p.cells().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_rotate_kicks_right_first() {
        let mut s = state();
        // Horizontal I turning vertical hits (3, 7) in place; both side kicks fit.
        s.piece = Some(Piece {
            kind: PieceKind::I,
            shape: vec![(3, 0), (2, 0), (1, 0), (0, 0)],
            x: 3,
            y: 5,
        });
        s.playfield.set(3, 7, Cell::Block);
        s.rotate();
        let p = s.piece.clone().unwrap();
        assert_eq!((p.x, p.y), (4, 5));
        assert_eq!(p.shape, vec![(0, 3), (0, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn test_rotate_kicks_left_at_right_wall() {
        let mut s = state();
        // Vertical I at x = 7 turning horizontal reaches x = 10; the right kick is worse.
        s.piece = Some(piece(PieceKind::I, 7, 5));
        s.rotate();
        let p = s.piece.clone().unwrap();
        assert_eq!((p.x, p.y), (6, 5));
        assert_eq!(p.shape, vec![(3, 0), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn test_rotate_kicks_up_when_sides_blocked() {
        let mut s = state();
        s.piece = Some(Piece {
            kind: PieceKind::I,
            shape: vec![(3, 0), (2, 0), (1, 0), (0, 0)],
            x: 3,
            y: 5,
        });
        for x in 2..=4 {
            s.playfield.set(x, 8, Cell::Block);
        }
        s.rotate();
        let p = s.piece.clone().unwrap();
        assert_eq!((p.x, p.y), (3, 4));
        assert_eq!(p.cells().collect::<Vec<_>>(), vec![(3, 7), (3, 6), (3, 5), (3, 4)]);
    }

    #[test]
    fn test_rotate_blocked_is_noop() {
        let mut s = state();
        for y in 0..20 {
            for x in 0..10 {
                if x != 4 {
                    s.playfield.set(x, y, Cell::Block);
                }
            }
        }
        let p = piece(PieceKind::I, 4, 10);
        s.piece = Some(p.clone());
        s.rotate();
        assert_eq!(s.piece, Some(p));
    }

    #[test]
    fn test_bomb_never_rotates() {
        let mut s = state();
        let p = piece(PieceKind::Bomb, 4, 4);
        s.piece = Some(p.clone());
        s.rotate();
        assert_eq!(s.piece, Some(p));
    }

    #[test]
    fn test_move_rejected_keeps_position() {
        let mut s = state();
        s.piece = Some(piece(PieceKind::O, 0, 0));
        assert!(!s.move_piece(-1, 0));
        assert!(s.move_piece(1, 0));
        assert_eq!(s.piece.as_ref().map(|p| p.x), Some(1));
    }

    #[test]
    fn test_paused_blocks_input() {
        let mut s = state();
        let now = Instant::now();
        s.piece = Some(piece(PieceKind::O, 3, 3));
        assert_eq!(s.on_key(Action::Pause, now), Flow::Continue);
        assert_eq!(s.phase(), Phase::Paused);
        assert!(!s.move_piece(1, 0));
        s.on_key(Action::HardDrop, now);
        s.on_special_key(Action::MoveLeft);
        assert_eq!(s.piece.as_ref().map(|p| (p.x, p.y)), Some((3, 3)));
        assert_eq!(s.playfield.occupied_count(), 0);
        s.on_key(Action::Pause, now);
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn test_hard_drop_clears_row_and_scores() {
        let mut s = state();
        for x in 0..10 {
            if x != 4 {
                s.playfield.set(x, 19, Cell::Block);
            }
        }
        s.piece = Some(piece(PieceKind::I, 4, 0));
        s.hard_drop(Instant::now());
        assert_eq!(s.score, 100);
        assert_eq!(s.playfield.occupied_count(), 3);
        assert!((0..10).all(|x| !s.playfield.is_occupied(x, 16)));
        assert!(s.playfield.is_occupied(4, 19));
        assert_eq!(s.particles.len(), 50);
        assert!(s.piece.is_some());
    }

    #[test]
    fn test_horizontal_i_completes_row() {
        let mut s = state();
        // Horizontal I fills columns 0..4 of row 19; an O fills 8..10 of rows 18..20.
        for x in 4..8 {
            s.playfield.set(x, 19, Cell::Block);
        }
        s.piece = Some(Piece {
            kind: PieceKind::I,
            shape: vec![(0, 0), (1, 0), (2, 0), (3, 0)],
            x: 0,
            y: 0,
        });
        s.hard_drop(Instant::now());
        assert_eq!(s.score, 0);
        s.piece = Some(piece(PieceKind::O, 8, 0));
        s.hard_drop(Instant::now());
        assert_eq!(s.score, 100);
        assert!(s.playfield.is_occupied(8, 19));
        assert!(s.playfield.is_occupied(9, 19));
        assert_eq!(s.playfield.occupied_count(), 2);
    }

    #[test]
    fn test_multi_row_clear_scores_per_row() {
        let mut s = state();
        for y in 16..20 {
            for x in 1..10 {
                s.playfield.set(x, y, Cell::Block);
            }
        }
        s.piece = Some(piece(PieceKind::I, 0, 0));
        s.hard_drop(Instant::now());
        assert_eq!(s.score, 400);
        assert_eq!(s.playfield.occupied_count(), 0);
    }

    #[test]
    fn test_intensity_tiers() {
        let mut s = state();
        assert_eq!(s.intensity(), 0);
        s.score = 1000;
        assert_eq!(s.intensity(), 1);
        s.score = 2999;
        assert_eq!(s.intensity(), 2);
        s.score = 50_000;
        assert_eq!(s.intensity(), 2);
    }

    #[test]
    fn test_bomb_lock_detonates() {
        let mut s = state();
        for y in 18..20 {
            for x in 0..9 {
                s.playfield.set(x, y, Cell::Block);
            }
        }
        s.piece = Some(piece(PieceKind::Bomb, 9, 0));
        s.hard_drop(Instant::now());
        // Lands at (9, 19); the blast removes (8..=9, 18..=19).
        assert_eq!(s.playfield.occupied_count(), 16);
        assert!(!s.playfield.is_occupied(8, 18));
        assert!(!s.playfield.is_occupied(9, 19));
        assert_eq!(s.particles.len(), 50);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_blocked_spawn_ends_game() {
        let mut s = state();
        for x in 4..=6 {
            s.playfield.set(x, 0, Cell::Block);
        }
        s.piece = Some(piece(PieceKind::O, 0, 18));
        s.hard_drop(Instant::now());
        assert_eq!(s.phase(), Phase::GameOver);
        assert!(s.piece.is_none());
    }

    #[test]
    fn test_lock_above_top_ends_game() {
        let mut s = state();
        let t0 = Instant::now();
        for y in 0..20 {
            s.playfield.set(0, y, Cell::Block);
        }
        s.piece = Some(piece(PieceKind::I, 0, -4));
        s.on_tick(t0 + Duration::from_secs(1));
        assert_eq!(s.phase(), Phase::GameOver);
        assert_eq!(s.playfield.occupied_count(), 20);
    }

    #[test]
    fn test_tick_respects_fall_interval() {
        let t0 = Instant::now();
        let mut s = GameState::new(&GameConfig::default(), StdRng::seed_from_u64(5), t0);
        s.piece = Some(piece(PieceKind::O, 4, 0));
        s.on_tick(t0 + Duration::from_millis(500));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(0));
        s.on_tick(t0 + Duration::from_millis(1000));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(1));
        s.on_tick(t0 + Duration::from_millis(1500));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(1));
    }

    #[test]
    fn test_tick_locks_grounded_piece() {
        let t0 = Instant::now();
        let mut s = GameState::new(&GameConfig::default(), StdRng::seed_from_u64(5), t0);
        s.piece = Some(piece(PieceKind::O, 4, 18));
        s.on_tick(t0 + Duration::from_secs(1));
        assert_eq!(s.playfield.occupied_count(), 4);
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(0));
    }

    #[test]
    fn test_resume_restarts_fall_timer() {
        let t0 = Instant::now();
        let mut s = GameState::new(&GameConfig::default(), StdRng::seed_from_u64(5), t0);
        s.piece = Some(piece(PieceKind::O, 4, 0));
        s.toggle_pause(t0);
        s.on_tick(t0 + Duration::from_secs(5));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(0));
        s.toggle_pause(t0 + Duration::from_secs(5));
        s.on_tick(t0 + Duration::from_millis(5500));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(0));
        s.on_tick(t0 + Duration::from_secs(6));
        assert_eq!(s.piece.as_ref().map(|p| p.y), Some(1));
    }

    #[test]
    fn test_top_row_block_ends_game_on_tick() {
        let t0 = Instant::now();
        let mut s = GameState::new(&GameConfig::default(), StdRng::seed_from_u64(5), t0);
        s.playfield.set(0, 0, Cell::Block);
        s.piece = Some(piece(PieceKind::O, 6, 5));
        s.on_tick(t0);
        assert!(s.is_game_over());
    }

    #[test]
    fn test_game_over_keys() {
        let mut s = state();
        let now = Instant::now();
        s.end_game();
        assert_eq!(s.on_key(Action::MoveLeft, now), Flow::Continue);
        assert_eq!(s.on_key(Action::Pause, now), Flow::Continue);
        assert_eq!(s.phase(), Phase::GameOver);
        assert_eq!(s.on_key(Action::Restart, now), Flow::Restart);
        assert_eq!(s.on_key(Action::Quit, now), Flow::Quit);
    }

    #[test]
    fn test_restart_ignored_while_playing() {
        let mut s = state();
        assert_eq!(s.on_key(Action::Restart, Instant::now()), Flow::Continue);
        assert_eq!(s.on_key(Action::Quit, Instant::now()), Flow::Quit);
    }

    #[test]
    fn test_mouse_buttons_after_game_over() {
        let mut s = state();
        let vp = s.viewport();
        let start = vp.start_button();
        let quit = vp.quit_button();
        let (sx, sy) = (f64::from(start.x + 1), f64::from(start.y + 1));
        let (qx, qy) = (f64::from(quit.x + quit.w), f64::from(quit.y + quit.h));
        assert_eq!(
            s.on_mouse_click(PointerButton::Left, true, sx, sy),
            Flow::Continue
        );
        s.end_game();
        assert_eq!(
            s.on_mouse_click(PointerButton::Left, true, sx, sy),
            Flow::Restart
        );
        assert_eq!(s.on_mouse_click(PointerButton::Left, true, qx, qy), Flow::Quit);
        assert_eq!(
            s.on_mouse_click(PointerButton::Right, true, sx, sy),
            Flow::Continue
        );
        assert_eq!(
            s.on_mouse_click(PointerButton::Left, false, sx, sy),
            Flow::Continue
        );
        assert_eq!(s.on_mouse_click(PointerButton::Left, true, 0.0, 0.0), Flow::Continue);
    }
}
