//! Asterion — a deterministic, fixed-timestep 2D asteroids combat simulation
//! for evaluating autonomous ship controllers.
//!
//! The engine advances ships, asteroids, bullets, and mines through discrete
//! frames in a wrapping arena, detects collisions continuously (swept, so
//! nothing tunnels at any frame rate), resolves simultaneous collisions in
//! chronological order, and produces a reproducible scoring trace. Control
//! policies plug in through the [`game::controller::ShipController`] trait;
//! rendering, if any, attaches through [`game::graphics::GraphicsSink`].

pub mod config;
pub mod game;
pub mod util;

pub use config::GameSettings;
pub use game::controller::{ControlAction, ShipController};
pub use game::game_loop::{Game, GameError};
pub use game::graphics::{GraphicsSink, NullGraphics};
pub use game::match_result::StopReason;
pub use game::scenario::{AsteroidInit, Scenario, ShipInit};
pub use game::score::{Score, Team};
pub use game::snapshot::{GameSnapshot, OwnShipSnapshot};
