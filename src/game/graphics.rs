//! Presentation-tier boundary.
//!
//! Rendering lives outside the simulation; the scheduler only requires a sink
//! that accepts these three calls and returns promptly. Calls are best-effort
//! fire-and-forget and can be skipped with the `frame_skip` setting.

use crate::game::scenario::Scenario;
use crate::game::score::Score;
use crate::game::state::{Asteroid, Bullet, Mine, Ship};

/// Receiver for per-frame presentation updates
pub trait GraphicsSink {
    /// Called once before the first frame
    fn start(&mut self, scenario: &Scenario);

    /// Called once per rendered frame with the current world contents
    fn update(
        &mut self,
        score: &Score,
        ships: &[Ship],
        asteroids: &[Asteroid],
        bullets: &[Bullet],
        mines: &[Mine],
    );

    /// Called once after the run ends
    fn close(&mut self);
}

/// Sink that discards everything; the default for headless runs
#[derive(Debug, Default)]
pub struct NullGraphics;

impl GraphicsSink for NullGraphics {
    fn start(&mut self, _scenario: &Scenario) {}

    fn update(
        &mut self,
        _score: &Score,
        _ships: &[Ship],
        _asteroids: &[Asteroid],
        _bullets: &[Bullet],
        _mines: &[Mine],
    ) {
    }

    fn close(&mut self) {}
}
