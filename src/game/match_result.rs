//! Stop-condition evaluation.
//!
//! Checked once per frame after scoring; the first matching condition in
//! priority order ends the run.

use serde::Serialize;

use crate::game::state::World;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// No live ships remain and all in-flight ordnance has resolved
    NoShips,
    /// The asteroid field has been fully cleared
    NoAsteroids,
    /// The simulation clock passed the time limit
    TimeExpired,
    /// Ammo-limited scenario: every live ship is dry and nothing is in flight
    OutOfBullets,
}

/// Evaluate the stop conditions against the post-frame world.
///
/// The no-ships condition deliberately waits for in-flight bullets and mines
/// to resolve, so a ship that died early still collects credit from ordnance
/// it launched before dying — the same grace its longer-lived rivals get.
pub fn check_stop(
    world: &World,
    stop_if_no_ammo: bool,
    sim_time: f64,
    time_limit: f64,
) -> Option<StopReason> {
    if world.asteroids.is_empty() {
        return Some(StopReason::NoAsteroids);
    }

    let ordnance_in_flight = !world.bullets.is_empty() || !world.mines.is_empty();

    if world.live.is_empty() && !ordnance_in_flight {
        return Some(StopReason::NoShips);
    }

    if stop_if_no_ammo && !ordnance_in_flight {
        let any_ammo_left = world.live.iter().any(|&idx| {
            let ship = &world.ships[idx];
            ship.bullets_remaining != 0 || ship.mines_remaining != 0
        });
        if !any_ammo_left {
            return Some(StopReason::OutOfBullets);
        }
    }

    if sim_time > time_limit {
        return Some(StopReason::TimeExpired);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Asteroid, Bullet, Mine, Ship};
    use crate::util::vec2::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_asteroid() -> Asteroid {
        let mut rng = StdRng::seed_from_u64(1);
        Asteroid::new(Vec2::new(10.0, 10.0), Some(0.0), Some(0.0), 1, &mut rng)
    }

    fn make_ship(lives: u32, bullets: i32) -> Ship {
        Ship::new(1, Vec2::new(500.0, 400.0), 90.0, lives, 1, None, bullets, 0)
    }

    #[test]
    fn test_running_game_does_not_stop() {
        let world = World::new(vec![make_ship(3, -1)], vec![make_asteroid()]);
        assert_eq!(check_stop(&world, false, 1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_no_asteroids_wins_priority() {
        // Both "no asteroids" and "no ships" hold; asteroid clearance reports
        let mut world = World::new(Vec::new(), Vec::new());
        world.cull_dead_ships();
        assert_eq!(
            check_stop(&world, false, 100.0, 10.0),
            Some(StopReason::NoAsteroids)
        );
    }

    #[test]
    fn test_no_ships_waits_for_ordnance() {
        let mut ship = make_ship(1, -1);
        ship.destruct();
        let mut world = World::new(vec![ship], vec![make_asteroid()]);
        world.cull_dead_ships();
        world.bullets.push(Bullet::new(Vec2::new(5.0, 5.0), 0.0, 1));
        // A bullet is still in flight: keep running
        assert_eq!(check_stop(&world, false, 1.0, f64::INFINITY), None);
        world.bullets.clear();
        world.mines.push(Mine::new(Vec2::new(5.0, 5.0), 1));
        assert_eq!(check_stop(&world, false, 1.0, f64::INFINITY), None);
        world.mines.clear();
        assert_eq!(
            check_stop(&world, false, 1.0, f64::INFINITY),
            Some(StopReason::NoShips)
        );
    }

    #[test]
    fn test_out_of_bullets() {
        let mut ship = make_ship(3, 0);
        ship.mines_remaining = 0;
        let world = World::new(vec![ship], vec![make_asteroid()]);
        assert_eq!(
            check_stop(&world, true, 1.0, f64::INFINITY),
            Some(StopReason::OutOfBullets)
        );
        // Without the scenario flag the game keeps going
        assert_eq!(check_stop(&world, false, 1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_out_of_bullets_ignores_unlimited_ammo() {
        let world = World::new(vec![make_ship(3, -1)], vec![make_asteroid()]);
        assert_eq!(check_stop(&world, true, 1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_out_of_bullets_waits_for_flight() {
        let mut ship = make_ship(3, 0);
        ship.mines_remaining = 0;
        let mut world = World::new(vec![ship], vec![make_asteroid()]);
        world.bullets.push(Bullet::new(Vec2::new(5.0, 5.0), 0.0, 1));
        assert_eq!(check_stop(&world, true, 1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_time_expired() {
        let world = World::new(vec![make_ship(3, -1)], vec![make_asteroid()]);
        assert_eq!(
            check_stop(&world, false, 10.5, 10.0),
            Some(StopReason::TimeExpired)
        );
        assert_eq!(check_stop(&world, false, 10.0, 10.0), None);
    }
}
