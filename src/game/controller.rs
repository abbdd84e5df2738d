//! The controller plugin boundary.
//!
//! A controller is the one required extension point: it receives its own
//! ship's extended state plus a read-only frame snapshot, and returns the
//! commands for the frame. Everything else (sprite path, etc.) is optional
//! metadata probed through default-implemented methods.

use crate::game::snapshot::{GameSnapshot, OwnShipSnapshot};
use crate::game::state::ShipId;

/// Commands a controller issues for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlAction {
    /// Forward acceleration command (u/s^2); clamped to the ship's range
    pub thrust: f64,
    /// Turn rate command (degrees/s); clamped to the ship's range
    pub turn_rate: f64,
    pub fire: bool,
    pub drop_mine: bool,
}

/// Contract violations by a controller. These are fatal: the simulation does
/// not continue past the offending frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerViolation {
    #[error("ship {ship_id} controller returned non-finite {field}: {value}")]
    NonFiniteCommand {
        ship_id: ShipId,
        field: &'static str,
        value: f64,
    },
    #[error("controller assigned to ship {expected} reports ship id {actual:?}")]
    ShipIdMismatch {
        expected: ShipId,
        actual: Option<ShipId>,
    },
}

/// A ship control policy evaluated once per frame per live ship.
///
/// Controllers are trusted to be fast and non-blocking; they are called
/// synchronously in roster order. The returned thrust/turn-rate must be
/// finite (violations abort the run); values outside the ship's physical
/// ranges are clamped with a warning.
pub trait ShipController {
    /// Human-readable controller name for score reports
    fn name(&self) -> &str;

    /// Called once before the first frame with the id of the controlled ship
    fn assign_ship_id(&mut self, ship_id: ShipId);

    /// The id assigned via `assign_ship_id`, echoed back for contract checks
    fn ship_id(&self) -> Option<ShipId>;

    /// Decide this frame's commands
    fn actions(&mut self, own_ship: &OwnShipSnapshot, game_state: &GameSnapshot) -> ControlAction;

    /// Optional sprite override for graphics sinks
    fn custom_sprite_path(&self) -> Option<&str> {
        None
    }
}

/// Validate the numeric parts of a controller's output. Booleans need no
/// check; the type system already guarantees them.
pub fn validate_action(ship_id: ShipId, action: &ControlAction) -> Result<(), ControllerViolation> {
    if !action.thrust.is_finite() {
        return Err(ControllerViolation::NonFiniteCommand {
            ship_id,
            field: "thrust",
            value: action.thrust,
        });
    }
    if !action.turn_rate.is_finite() {
        return Err(ControllerViolation::NonFiniteCommand {
            ship_id,
            field: "turn_rate",
            value: action.turn_rate,
        });
    }
    Ok(())
}
