//! Bullet firing and mine deployment.
//!
//! Both are gated by a per-weapon cooldown and the ammo counter (-1 means
//! unlimited). Using either weapon forfeits any remaining respawn
//! invulnerability.

use crate::game::state::{Bullet, Mine, Ship};
use crate::util::vec2::Vec2;

/// Fire a bullet from the ship's nose if the cooldown and ammo allow
pub fn fire_bullet(ship: &mut Ship) -> Option<Bullet> {
    if !ship.can_fire() {
        return None;
    }

    ship.respawn_time_left = 0.0;
    ship.fire_cooldown = ship.fire_time;

    if ship.bullets_remaining != -1 {
        ship.bullets_remaining -= 1;
    }
    ship.bullets_shot += 1;

    let direction = Vec2::from_angle(ship.heading.to_radians());
    let muzzle = ship.position + direction * ship.radius;
    Some(Bullet::new(muzzle, ship.heading, ship.id))
}

/// Drop a mine at the ship's position if the cooldown and ammo allow
pub fn deploy_mine(ship: &mut Ship) -> Option<Mine> {
    if !ship.can_deploy_mine() {
        return None;
    }

    ship.respawn_time_left = 0.0;
    ship.mine_cooldown = ship.mine_deploy_time;

    if ship.mines_remaining != -1 {
        ship.mines_remaining -= 1;
    }
    ship.mines_dropped += 1;

    Some(Mine::new(ship.position, ship.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ship(bullets: i32, mines: i32) -> Ship {
        let mut ship = Ship::new(1, Vec2::new(100.0, 100.0), 90.0, 3, 1, None, bullets, mines);
        ship.heading = 0.0;
        ship
    }

    #[test]
    fn test_fire_spawns_at_nose() {
        let mut ship = test_ship(-1, 0);
        let bullet = fire_bullet(&mut ship).unwrap();
        assert!((bullet.position.x - 120.0).abs() < 1e-9);
        assert!((bullet.position.y - 100.0).abs() < 1e-9);
        assert_eq!(bullet.owner, 1);
        assert_eq!(ship.bullets_shot, 1);
        assert_eq!(ship.bullets_remaining, -1);
    }

    #[test]
    fn test_fire_decrements_limited_ammo() {
        let mut ship = test_ship(2, 0);
        assert!(fire_bullet(&mut ship).is_some());
        assert_eq!(ship.bullets_remaining, 1);
        ship.fire_cooldown = 0.0;
        assert!(fire_bullet(&mut ship).is_some());
        ship.fire_cooldown = 0.0;
        assert!(fire_bullet(&mut ship).is_none());
        assert_eq!(ship.bullets_shot, 2);
    }

    #[test]
    fn test_fire_blocked_by_cooldown() {
        let mut ship = test_ship(-1, 0);
        assert!(fire_bullet(&mut ship).is_some());
        assert!(fire_bullet(&mut ship).is_none());
        assert_eq!(ship.fire_cooldown, ship.fire_time);
    }

    #[test]
    fn test_fire_cancels_invulnerability() {
        let mut ship = test_ship(-1, 0);
        ship.respawn_time_left = 2.5;
        assert!(fire_bullet(&mut ship).is_some());
        assert_eq!(ship.respawn_time_left, 0.0);
    }

    #[test]
    fn test_mine_drops_at_ship_position() {
        let mut ship = test_ship(-1, 1);
        let mine = deploy_mine(&mut ship).unwrap();
        assert_eq!(mine.position, ship.position);
        assert_eq!(mine.owner, 1);
        assert_eq!(ship.mines_remaining, 0);
        assert_eq!(ship.mines_dropped, 1);
        // Out of mines now
        ship.mine_cooldown = 0.0;
        assert!(deploy_mine(&mut ship).is_none());
    }

    #[test]
    fn test_mine_cancels_invulnerability() {
        let mut ship = test_ship(-1, -1);
        ship.respawn_time_left = 1.0;
        assert!(deploy_mine(&mut ship).is_some());
        assert_eq!(ship.respawn_time_left, 0.0);
    }
}
