//! Immutable views of the world handed to controllers.
//!
//! Controllers never touch the canonical entity lists; every invocation
//! receives plain-data copies of the public entity fields plus the arena and
//! clock metadata. All types serialize, so snapshots double as the telemetry
//! payload for external sinks and for agent training pipelines.

use serde::{Deserialize, Serialize};

use crate::game::state::{Asteroid, Bullet, Mine, Ship, ShipId, World};
use crate::util::vec2::Vec2;

/// Public state of any ship, visible to every controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f64,
    pub heading: f64,
    pub mass: f64,
    pub radius: f64,
    pub id: ShipId,
    pub team: u32,
    pub is_respawning: bool,
    pub lives_remaining: u32,
    pub deaths: u32,
}

impl ShipSnapshot {
    pub fn of(ship: &Ship) -> Self {
        Self {
            position: ship.position,
            velocity: ship.velocity,
            speed: ship.speed,
            heading: ship.heading,
            mass: ship.mass,
            radius: ship.radius,
            id: ship.id,
            team: ship.team,
            is_respawning: ship.is_respawning(),
            lives_remaining: ship.lives,
            deaths: ship.deaths,
        }
    }
}

/// Extended state a controller sees for its own ship: ammo, cooldowns, and
/// the physical command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnShipSnapshot {
    pub public: ShipSnapshot,
    pub bullets_remaining: i32,
    pub mines_remaining: i32,
    pub can_fire: bool,
    pub fire_cooldown: f64,
    pub fire_rate: f64,
    pub can_deploy_mine: bool,
    pub mine_cooldown: f64,
    pub mine_deploy_rate: f64,
    pub respawn_time_left: f64,
    pub respawn_time: f64,
    pub thrust_range: (f64, f64),
    pub turn_rate_range: (f64, f64),
    pub max_speed: f64,
    pub drag: f64,
}

impl OwnShipSnapshot {
    pub fn of(ship: &Ship) -> Self {
        Self {
            public: ShipSnapshot::of(ship),
            bullets_remaining: ship.bullets_remaining,
            mines_remaining: ship.mines_remaining,
            can_fire: ship.can_fire(),
            fire_cooldown: ship.fire_cooldown,
            fire_rate: ship.fire_rate(),
            can_deploy_mine: ship.can_deploy_mine(),
            mine_cooldown: ship.mine_cooldown,
            mine_deploy_rate: ship.mine_deploy_rate(),
            respawn_time_left: ship.respawn_time_left,
            respawn_time: ship.respawn_time,
            thrust_range: ship.thrust_range,
            turn_rate_range: ship.turn_rate_range,
            max_speed: ship.max_speed,
            drag: ship.drag,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsteroidSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: u8,
    pub mass: f64,
    pub radius: f64,
}

impl AsteroidSnapshot {
    pub fn of(asteroid: &Asteroid) -> Self {
        Self {
            position: asteroid.position,
            velocity: asteroid.velocity,
            size: asteroid.size,
            mass: asteroid.mass,
            radius: asteroid.radius,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub tail_delta: Vec2,
    pub heading: f64,
    pub mass: f64,
    pub length: f64,
}

impl BulletSnapshot {
    pub fn of(bullet: &Bullet) -> Self {
        Self {
            position: bullet.position,
            velocity: bullet.velocity,
            tail_delta: bullet.tail_delta,
            heading: bullet.heading,
            mass: bullet.mass,
            length: bullet.length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineSnapshot {
    pub position: Vec2,
    pub mass: f64,
    pub fuse_time: f64,
    pub remaining_time: f64,
}

impl MineSnapshot {
    pub fn of(mine: &Mine) -> Self {
        Self {
            position: mine.position,
            mass: mine.mass,
            fuse_time: mine.fuse_time,
            remaining_time: mine.countdown,
        }
    }
}

/// Frame metadata shared by every snapshot of a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameInfo {
    pub map_size: (f64, f64),
    pub time_limit: f64,
    pub time: f64,
    pub frame: u64,
    pub delta_time: f64,
    pub frame_rate: f64,
    pub random_asteroid_splits: bool,
    pub competition_safe_mode: bool,
}

/// Complete read-only view of one frame: all live entities' public fields
/// plus arena metadata and the simulation clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub ships: Vec<ShipSnapshot>,
    pub asteroids: Vec<AsteroidSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub mines: Vec<MineSnapshot>,
    pub map_size: (f64, f64),
    pub time_limit: f64,
    pub time: f64,
    pub frame: u64,
    pub delta_time: f64,
    pub frame_rate: f64,
    pub random_asteroid_splits: bool,
    pub competition_safe_mode: bool,
}

impl GameSnapshot {
    /// Capture the live entities of `world` under the given frame metadata
    pub fn capture(world: &World, info: &FrameInfo) -> Self {
        Self {
            ships: world
                .live
                .iter()
                .map(|&idx| ShipSnapshot::of(&world.ships[idx]))
                .collect(),
            asteroids: world.asteroids.iter().map(AsteroidSnapshot::of).collect(),
            bullets: world.bullets.iter().map(BulletSnapshot::of).collect(),
            mines: world.mines.iter().map(MineSnapshot::of).collect(),
            map_size: info.map_size,
            time_limit: info.time_limit,
            time: info.time,
            frame: info.frame,
            delta_time: info.delta_time,
            frame_rate: info.frame_rate,
            random_asteroid_splits: info.random_asteroid_splits,
            competition_safe_mode: info.competition_safe_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_world() -> World {
        let mut rng = StdRng::seed_from_u64(3);
        let ships = vec![
            Ship::new(1, Vec2::new(100.0, 100.0), 90.0, 3, 1, None, 10, 2),
            Ship::new(2, Vec2::new(200.0, 200.0), 0.0, 1, 2, None, -1, 0),
        ];
        let asteroids = vec![Asteroid::new(
            Vec2::new(50.0, 60.0),
            Some(40.0),
            Some(180.0),
            4,
            &mut rng,
        )];
        let mut world = World::new(ships, asteroids);
        world.bullets.push(Bullet::new(Vec2::new(5.0, 5.0), 45.0, 1));
        world.mines.push(Mine::new(Vec2::new(9.0, 9.0), 2));
        world
    }

    fn sample_info() -> FrameInfo {
        FrameInfo {
            map_size: (1000.0, 800.0),
            time_limit: 120.0,
            time: 1.5,
            frame: 45,
            delta_time: 1.0 / 30.0,
            frame_rate: 30.0,
            random_asteroid_splits: false,
            competition_safe_mode: true,
        }
    }

    #[test]
    fn test_capture_includes_all_live_entities() {
        let world = sample_world();
        let snap = GameSnapshot::capture(&world, &sample_info());
        assert_eq!(snap.ships.len(), 2);
        assert_eq!(snap.asteroids.len(), 1);
        assert_eq!(snap.bullets.len(), 1);
        assert_eq!(snap.mines.len(), 1);
        assert_eq!(snap.frame, 45);
    }

    #[test]
    fn test_capture_skips_dead_ships() {
        let mut world = sample_world();
        world.ships[1].destruct();
        world.cull_dead_ships();
        let snap = GameSnapshot::capture(&world, &sample_info());
        assert_eq!(snap.ships.len(), 1);
        assert_eq!(snap.ships[0].id, 1);
    }

    #[test]
    fn test_own_snapshot_extends_public_fields() {
        let world = sample_world();
        let own = OwnShipSnapshot::of(&world.ships[0]);
        assert_eq!(own.public.id, 1);
        assert_eq!(own.bullets_remaining, 10);
        assert_eq!(own.mines_remaining, 2);
        assert!(own.can_fire);
        assert_eq!(own.thrust_range, (-480.0, 480.0));
        assert_eq!(own.max_speed, 240.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let world = sample_world();
        let snap = GameSnapshot::capture(&world, &sample_info());
        let json = serde_json::to_string(&snap).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ships.len(), snap.ships.len());
        assert_eq!(back.map_size, snap.map_size);
    }
}
