//! Falling snow.
//!
//! Each flake falls at its own speed, sways sideways on a slow sine, and
//! wraps around the edges of the field:
//!
//! ```text
//!   y = -20 ┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄  respawn band (fresh size, speed, opacity)
//!   y = 0   ┌────────────────┐
//!           │   *      .     │  y += drift + 0.3 r
//!           │      *     *   │  x += sin(phase) * sway
//!           │ .        *     │  phase += 0.01 drift
//!   y = h   └────────────────┘
//!   y = h+10 ┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄  past here: back to the top
//! ```
//!
//! Leaving more than 10 units past the left or right edge wraps to the
//! other side. The field holds one flake per 12 units of width.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Horizontal spacing that sets the flake count.
const WIDTH_PER_FLAKE: f32 = 12.0;
/// How far a flake may drift past an edge before wrapping.
const EDGE_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flake {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Fall speed per tick
    pub drift: f32,
    pub phase: f32,
    pub sway: f32,
    pub opacity: f32,
}

impl Flake {
    /// A flake anywhere across the width, somewhere in the band of height
    /// `h` above the top edge.
    fn scattered<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32) -> Self {
        Self {
            x: rng.random::<f32>() * width,
            y: -rng.random::<f32>() * height,
            radius: rng.random_range(1.0..4.0),
            drift: rng.random_range(0.5..1.5),
            phase: rng.random::<f32>() * TAU,
            sway: rng.random_range(0.5..1.5),
            opacity: rng.random_range(0.4..0.98),
        }
    }

    /// Put a flake that fell out the bottom back above the top edge. Phase
    /// and sway carry over.
    fn respawn<R: Rng + ?Sized>(&mut self, rng: &mut R, width: f32) {
        self.x = rng.random::<f32>() * width;
        self.y = rng.random_range(-20.0..-5.0);
        self.radius = rng.random_range(1.0..4.0);
        self.drift = rng.random_range(0.5..1.5);
        self.opacity = rng.random_range(0.4..0.98);
    }
}

pub struct Snowfield {
    width: f32,
    height: f32,
    flakes: Vec<Flake>,
    rng: Pcg64,
}

impl Snowfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_rng(width, height, Pcg64::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(width, height, Pcg64::seed_from_u64(seed))
    }

    fn with_rng(width: f32, height: f32, rng: Pcg64) -> Self {
        let mut field = Self {
            width,
            height,
            flakes: Vec::new(),
            rng,
        };
        field.resize(width, height);
        field
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn flakes(&self) -> &[Flake] {
        &self.flakes
    }

    pub fn flakes_mut(&mut self) -> &mut [Flake] {
        &mut self.flakes
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    /// Match a new viewport and scatter a fresh set of flakes over it.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;

        let count = (width / WIDTH_PER_FLAKE).round().max(0.0) as usize;
        let rng = &mut self.rng;
        self.flakes = (0..count)
            .map(|_| Flake::scattered(rng, width, height))
            .collect();
    }

    /// Advance every flake by one frame.
    pub fn tick(&mut self) {
        let (width, height) = (self.width, self.height);

        for flake in &mut self.flakes {
            flake.y += flake.drift + flake.radius * 0.3;
            flake.x += flake.phase.sin() * flake.sway;
            flake.phase += 0.01 * flake.drift;

            if flake.y > height + EDGE_MARGIN {
                flake.respawn(&mut self.rng, width);
            }
            if flake.x > width + EDGE_MARGIN {
                flake.x = -EDGE_MARGIN;
            }
            if flake.x < -EDGE_MARGIN {
                flake.x = width + EDGE_MARGIN;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_follows_width() {
        assert_eq!(Snowfield::with_seed(1200.0, 800.0, 1).len(), 100);
        assert_eq!(Snowfield::with_seed(30.0, 800.0, 1).len(), 3);
        assert!(Snowfield::with_seed(0.0, 800.0, 1).is_empty());
    }

    #[test]
    fn test_initial_flakes_start_above_view() {
        let field = Snowfield::with_seed(600.0, 400.0, 7);
        for flake in field.flakes() {
            assert!((-400.0..=0.0).contains(&flake.y));
            assert!((0.0..=600.0).contains(&flake.x));
            assert!((1.0..4.0).contains(&flake.radius));
            assert!((0.5..1.5).contains(&flake.drift));
            assert!((0.4..0.98).contains(&flake.opacity));
        }
    }

    #[test]
    fn test_tick_moves_flake_down() {
        let mut field = Snowfield::with_seed(120.0, 100.0, 3);
        let before = field.flakes()[0];
        field.tick();
        let after = field.flakes()[0];

        let expected = before.y + before.drift + 0.3 * before.radius;
        assert!((after.y - expected).abs() < 1e-4);
        assert!((after.phase - (before.phase + 0.01 * before.drift)).abs() < 1e-6);
    }

    #[test]
    fn test_flake_below_view_respawns_at_top() {
        let mut field = Snowfield::with_seed(120.0, 100.0, 5);
        {
            let flake = &mut field.flakes_mut()[0];
            flake.y = 109.9;
            flake.drift = 1.0;
            flake.radius = 10.0;
            flake.opacity = 0.0;
        }

        field.tick();
        let flake = field.flakes()[0];
        assert!((-20.0..-5.0).contains(&flake.y), "respawned at y = {}", flake.y);
        assert!((0.0..120.0).contains(&flake.x));
        assert!((1.0..4.0).contains(&flake.radius), "radius {} not redrawn", flake.radius);
        assert!((0.4..0.98).contains(&flake.opacity), "opacity {} not redrawn", flake.opacity);
        assert!((0.5..1.5).contains(&flake.drift));
    }

    #[test]
    fn test_respawn_redraws_drift() {
        let mut field = Snowfield::with_seed(120.0, 100.0, 6);
        {
            let flake = &mut field.flakes_mut()[0];
            flake.y = 200.0;
            flake.drift = 5.0;
        }

        field.tick();
        let drift = field.flakes()[0].drift;
        assert!((0.5..1.5).contains(&drift), "drift {drift} not redrawn");
    }

    #[test]
    fn test_horizontal_wraparound() {
        let mut field = Snowfield::with_seed(120.0, 100.0, 9);
        {
            let flake = &mut field.flakes_mut()[0];
            flake.x = 131.0;
            flake.y = 0.0;
            flake.phase = std::f32::consts::FRAC_PI_2;
            flake.sway = 1.0;
        }
        field.tick();
        assert_eq!(field.flakes()[0].x, -10.0);

        {
            let flake = &mut field.flakes_mut()[1];
            flake.x = -11.0;
            flake.y = 0.0;
            flake.phase = -std::f32::consts::FRAC_PI_2;
            flake.sway = 1.0;
        }
        field.tick();
        assert_eq!(field.flakes()[1].x, 130.0);
    }

    #[test]
    fn test_resize_reinitializes() {
        let mut field = Snowfield::with_seed(120.0, 100.0, 2);
        field.resize(240.0, 50.0);
        assert_eq!(field.len(), 20);
        assert_eq!(field.width(), 240.0);
        assert!(field.flakes().iter().all(|f| f.y <= 0.0 && f.y >= -50.0));
    }
}
