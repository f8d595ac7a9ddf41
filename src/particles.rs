//! Row-clear and explosion particles.

use rand::Rng;
use std::time::{Duration, Instant};

/// Vertical velocity lost per tick.
pub const GRAVITY_PER_TICK: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    /// Positive values move towards larger screen rows (down).
    pub vy: f32,
    pub born: Instant,
    pub ttl: Duration,
}

impl Particle {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.born) >= self.ttl
    }
}

/// All live particles plus the parameters new batches are spawned with.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    per_cell: usize,
    ttl: Duration,
}

impl ParticleField {
    pub fn new(per_cell: usize, ttl: Duration) -> Self {
        Self {
            particles: Vec::new(),
            per_cell,
            ttl,
        }
    }

    /// Spawn `per_cell` particles for every column of a cleared (or exploded) row.
    /// Positions are in pixels: column `x` sits at `x * cell_size`, the row at `row * cell_size`.
    pub fn spawn_batch<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        row: usize,
        columns: usize,
        cell_size: u16,
        now: Instant,
    ) {
        let cell = f32::from(cell_size);
        let y = row as f32 * cell;
        self.particles.reserve(columns * self.per_cell);
        for col in 0..columns {
            let x = col as f32 * cell;
            for _ in 0..self.per_cell {
                self.particles.push(Particle {
                    x,
                    y,
                    vx: rng.random_range(-2.0..=2.0),
                    vy: rng.random_range(1.0..=4.0),
                    born: now,
                    ttl: self.ttl,
                });
            }
        }
    }

    /// Drop expired particles, then move the survivors one step and apply gravity.
    /// Motion is per call, not scaled by elapsed time.
    pub fn tick(&mut self, now: Instant) {
        self.particles.retain(|p| !p.is_expired(now));
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy -= GRAVITY_PER_TICK;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
