//! Entity definitions and canonical world state.
//!
//! The scheduler owns one `World`; controllers only ever see the snapshot
//! types built from it (see `snapshot`).

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::{
    asteroid, asteroid_mass, asteroid_max_speed, asteroid_radius, bullet, mine, ship,
    sim::TIMER_EPSILON,
};
use crate::util::vec2::Vec2;

/// Ship identifier, assigned sequentially from scenario order
pub type ShipId = u32;

/// One recorded integration phase of a ship's frame update, parameterized so
/// the collision detector can re-integrate the path backward in time.
///
/// Times are relative to "now" (the end of the frame): `start_t` is the later
/// endpoint, `end_t` the earlier one, so `end_t <= start_t <= 0`. `v0` and
/// `theta0` are the speed and heading (radians) at `start_t`; `dx`/`dy` hold
/// the full backward displacement over `[start_t, end_t]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationPhase {
    pub start_t: f64,
    pub end_t: f64,
    pub v0: f64,
    pub accel: f64,
    pub theta0: f64,
    pub omega: f64,
    pub dx: f64,
    pub dy: f64,
}

/// Per-frame integration history, newest phase first. At most two phases occur
/// per frame (speed-zero crossing or speed-cap split), so the records live
/// inline.
pub type IntegrationPhases = SmallVec<[IntegrationPhase; 2]>;

/// What hit an asteroid. Carries exactly the fields each destruct branch
/// needs, so the momentum-vs-blast dispatch is exhaustive at compile time.
#[derive(Debug, Clone, Copy)]
pub enum Impact {
    Bullet { mass: f64, velocity: Vec2 },
    Ship { mass: f64, velocity: Vec2 },
    Mine { position: Vec2, blast_radius: f64, blast_pressure: f64 },
}

/// Blast force on a target at `dist` from the detonation point: decreases
/// linearly out to the edge of effect and scales with the target's diameter.
pub fn blast_force(blast_radius: f64, blast_pressure: f64, dist: f64, target_radius: f64) -> f64 {
    (1.0 - dist / (blast_radius + target_radius)) * blast_pressure * 2.0 * target_radius
}

/// A drifting rock. Splits into three children when destroyed, unless it is
/// already the smallest size class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Size class, 1..=4; only ever decreases through splits
    pub size: u8,
    pub radius: f64,
    pub mass: f64,
    /// Cached |velocity|, used by collision early rejection
    pub speed: f64,
    /// Cosmetic rotation state for the graphics sink
    pub angle: f64,
    pub spin: f64,
}

impl Asteroid {
    /// Create an asteroid. Unspecified speed/heading are drawn from `rng`
    /// (heading uniform, speed up to the size-scaled maximum); cosmetic
    /// rotation is always randomized. `size` must already be validated.
    pub fn new<R: Rng>(
        position: Vec2,
        speed: Option<f64>,
        angle: Option<f64>,
        size: u8,
        rng: &mut R,
    ) -> Self {
        debug_assert!((asteroid::MIN_SIZE..=asteroid::MAX_SIZE).contains(&size));

        let starting_angle_rad = match angle {
            Some(degrees) => degrees.to_radians(),
            None => rng.gen::<f64>() * std::f64::consts::TAU,
        };
        let starting_speed = match speed {
            Some(speed) => speed,
            None => asteroid_max_speed(size) * rng.gen::<f64>(),
        };

        Self {
            position,
            velocity: Vec2::from_angle(starting_angle_rad) * starting_speed,
            size,
            radius: asteroid_radius(size),
            mass: asteroid_mass(size),
            speed: starting_speed.abs(),
            angle: rng.gen_range(0.0..360.0),
            spin: rng.gen_range(asteroid::SPIN_RANGE.0..asteroid::SPIN_RANGE.1),
        }
    }

    /// Constant-velocity drift with toroidal wrap
    pub fn update(&mut self, delta_time: f64, map_size: (f64, f64)) {
        self.position = (self.position + self.velocity * delta_time).rem_euclid(map_size);
        self.angle += self.spin * delta_time;
    }

    /// Split into three children fanned around the post-impact velocity.
    /// Terminal (size 1) asteroids return no children.
    ///
    /// Bullet/ship impacts transfer momentum perfectly inelastically; mine
    /// impacts add a radial blast impulse. A detonation at exactly zero
    /// distance keeps the zero-distance speed limit and widens the fan to
    /// represent an omnidirectional blast.
    pub fn destruct<R: Rng>(&self, impact: &Impact, random_split: bool, rng: &mut R) -> Vec<Asteroid> {
        if self.size == asteroid::MIN_SIZE {
            return Vec::new();
        }

        let mut split_angle_bound = asteroid::SPLIT_ANGLE_BOUND;
        let (vf, v) = match *impact {
            Impact::Mine {
                position,
                blast_radius,
                blast_pressure,
            } => {
                let delta = self.position - position;
                let dist = delta.length();
                let force = blast_force(blast_radius, blast_pressure, dist, self.radius);
                let accel = force / self.mass;
                if dist != 0.0 {
                    let vf = self.velocity + delta * (accel / dist);
                    let v = vf.length();
                    (vf, v)
                } else {
                    // Zero-distance limit of the directional case
                    let vf = self.velocity;
                    let v = (vf.length_sq() + accel * accel).sqrt();
                    split_angle_bound *= 8.0;
                    (vf, v)
                }
            }
            Impact::Bullet { mass, velocity } | Impact::Ship { mass, velocity } => {
                // Perfectly inelastic: impactor momentum is absorbed
                let vf = (velocity * mass + self.velocity * self.mass) * (1.0 / (mass + self.mass));
                let v = vf.length();
                (vf, v)
            }
        };

        let theta = vf.y.atan2(vf.x).to_degrees();
        let angles = if random_split {
            let offset_1 = split_angle_bound * rng.gen::<f64>();
            let offset_2 = split_angle_bound * rng.gen::<f64>();
            [theta + offset_1, theta, theta - offset_2]
        } else {
            let offset = split_angle_bound / 2.0;
            [theta + offset, theta, theta - offset]
        };

        angles
            .iter()
            .map(|&angle| Asteroid::new(self.position, Some(v), Some(angle), self.size - 1, rng))
            .collect()
    }
}

/// A bullet in flight: a fixed-speed ray with a finite trailing segment used
/// by the swept collision test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Offset from the head to the tail of the trailing segment (constant)
    pub tail_delta: Vec2,
    /// Firing heading in degrees
    pub heading: f64,
    pub mass: f64,
    pub length: f64,
    /// Ship credited when this bullet lands
    pub owner: ShipId,
}

impl Bullet {
    pub fn new(position: Vec2, heading: f64, owner: ShipId) -> Self {
        let direction = Vec2::from_angle(heading.to_radians());
        Self {
            position,
            velocity: direction * bullet::SPEED,
            tail_delta: direction * -bullet::LENGTH,
            heading,
            mass: bullet::MASS,
            length: bullet::LENGTH,
            owner,
        }
    }

    /// Straight-line motion; bullets do not wrap and are culled off-map
    pub fn update(&mut self, delta_time: f64) {
        self.position += self.velocity * delta_time;
    }

    pub fn tail(&self) -> Vec2 {
        self.position + self.tail_delta
    }
}

/// A stationary proximity charge on a countdown fuse.
/// Armed (countdown > 0) -> Detonating (flagged for one frame) -> removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mine {
    pub position: Vec2,
    pub mass: f64,
    pub radius: f64,
    pub blast_radius: f64,
    pub blast_pressure: f64,
    pub fuse_time: f64,
    pub detonation_time: f64,
    pub countdown: f64,
    pub detonating: bool,
    pub owner: ShipId,
}

impl Mine {
    pub fn new(position: Vec2, owner: ShipId) -> Self {
        Self {
            position,
            mass: mine::MASS,
            radius: mine::RADIUS,
            blast_radius: mine::BLAST_RADIUS,
            blast_pressure: mine::BLAST_PRESSURE,
            fuse_time: mine::FUSE_TIME,
            detonation_time: mine::DETONATION_TIME,
            countdown: mine::FUSE_TIME,
            detonating: false,
            owner,
        }
    }

    pub fn update(&mut self, delta_time: f64) {
        self.countdown -= delta_time;
        if self.countdown <= TIMER_EPSILON {
            self.detonating = true;
        }
    }

    /// Blast force applied to a target of the given radius at `dist`
    pub fn calculate_blast_force(&self, dist: f64, target_radius: f64) -> f64 {
        blast_force(self.blast_radius, self.blast_pressure, dist, target_radius)
    }
}

/// A controllable ship. Never removed from the full roster; running out of
/// lives only drops it from the live set.
#[derive(Debug, Clone)]
pub struct Ship {
    pub id: ShipId,
    pub team: u32,
    pub team_name: String,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Signed scalar speed along the heading; |speed| <= max_speed always
    pub speed: f64,
    /// Heading in degrees, wrapped to [0, 360)
    pub heading: f64,
    pub lives: u32,
    pub deaths: u32,

    // Controller commands for the current frame
    pub thrust: f64,
    pub turn_rate: f64,
    pub fire: bool,
    pub drop_mine: bool,

    // Physical model parameters
    pub thrust_range: (f64, f64),
    pub turn_rate_range: (f64, f64),
    pub max_speed: f64,
    pub drag: f64,
    pub radius: f64,
    pub mass: f64,

    // Respawn / weapon timers
    pub respawn_time_left: f64,
    pub respawn_time: f64,
    pub fire_cooldown: f64,
    pub fire_time: f64,
    pub mine_cooldown: f64,
    pub mine_deploy_time: f64,
    /// True only on the frame where the invulnerability window ran out; that
    /// frame uses an instantaneous collision check instead of the swept one
    pub was_respawning_until_this_frame: bool,

    // Ammo and per-ship tallies
    pub bullets_remaining: i32,
    pub mines_remaining: i32,
    pub bullets_shot: u32,
    pub mines_dropped: u32,
    pub bullets_hit: u32,
    pub mines_hit: u32,
    pub asteroids_hit: u32,

    /// Integration history of the last frame, newest phase first
    pub integration_phases: IntegrationPhases,

    /// Optional sprite override probed from the controller
    pub custom_sprite_path: Option<String>,
}

impl Ship {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ShipId,
        position: Vec2,
        heading: f64,
        lives: u32,
        team: u32,
        team_name: Option<String>,
        bullets_remaining: i32,
        mines_remaining: i32,
    ) -> Self {
        Self {
            id,
            team,
            team_name: team_name.unwrap_or_else(|| format!("Team {team}")),
            position,
            velocity: Vec2::ZERO,
            speed: 0.0,
            heading,
            lives,
            deaths: 0,
            thrust: 0.0,
            turn_rate: 0.0,
            fire: false,
            drop_mine: false,
            thrust_range: ship::THRUST_RANGE,
            turn_rate_range: ship::TURN_RATE_RANGE,
            max_speed: ship::MAX_SPEED,
            drag: ship::DRAG,
            radius: ship::RADIUS,
            mass: ship::MASS,
            respawn_time_left: 0.0,
            respawn_time: ship::RESPAWN_TIME,
            fire_cooldown: 0.0,
            fire_time: ship::FIRE_TIME,
            mine_cooldown: 0.0,
            mine_deploy_time: ship::MINE_DEPLOY_TIME,
            was_respawning_until_this_frame: false,
            bullets_remaining,
            mines_remaining,
            bullets_shot: 0,
            mines_dropped: 0,
            bullets_hit: 0,
            mines_hit: 0,
            asteroids_hit: 0,
            integration_phases: IntegrationPhases::new(),
            custom_sprite_path: None,
        }
    }

    pub fn alive(&self) -> bool {
        self.lives > 0
    }

    pub fn is_respawning(&self) -> bool {
        self.respawn_time_left > 0.0
    }

    pub fn can_fire(&self) -> bool {
        self.fire_cooldown == 0.0 && self.bullets_remaining != 0
    }

    pub fn can_deploy_mine(&self) -> bool {
        self.mine_cooldown == 0.0 && self.mines_remaining != 0
    }

    pub fn fire_rate(&self) -> f64 {
        1.0 / self.fire_time
    }

    pub fn mine_deploy_rate(&self) -> f64 {
        1.0 / self.mine_deploy_time
    }

    /// Called when the ship collides with something and dies. Decrements a
    /// life and respawns in place; the scheduler drops the ship from the live
    /// roster only once `lives` reaches zero.
    pub fn destruct(&mut self) {
        self.lives -= 1;
        self.deaths += 1;
        let spawn_position = self.position;
        let spawn_heading = self.heading;
        self.respawn(spawn_position, spawn_heading);
    }

    /// Reset motion state and start a fresh invulnerability window
    pub fn respawn(&mut self, position: Vec2, heading: f64) {
        self.respawn_time_left = self.respawn_time;
        self.position = position;
        self.speed = 0.0;
        self.velocity = Vec2::ZERO;
        self.heading = heading;
    }
}

/// Canonical mutable simulation state: the full ship roster, the live-ship
/// index list (stable insertion order), and the free-flying entity lists.
#[derive(Debug)]
pub struct World {
    pub ships: Vec<Ship>,
    /// Indices into `ships` of roster entries still holding lives
    pub live: Vec<usize>,
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    pub mines: Vec<Mine>,
}

impl World {
    pub fn new(ships: Vec<Ship>, asteroids: Vec<Asteroid>) -> Self {
        let live = (0..ships.len()).collect();
        Self {
            ships,
            live,
            asteroids,
            bullets: Vec::new(),
            mines: Vec::new(),
        }
    }

    /// Remove asteroid at `index` with swap-and-pop. Indices past `index` are
    /// invalidated, so batched removals must run in descending index order.
    pub fn remove_asteroid(&mut self, index: usize) {
        self.asteroids.swap_remove(index);
    }

    /// Remove bullet at `index` with swap-and-pop (descending order applies)
    pub fn remove_bullet(&mut self, index: usize) {
        self.bullets.swap_remove(index);
    }

    /// Remove mine at `index` with swap-and-pop (descending order applies)
    pub fn remove_mine(&mut self, index: usize) {
        self.mines.swap_remove(index);
    }

    /// Drop out-of-lives ships from the live roster (the full roster keeps
    /// them for scoring)
    pub fn cull_dead_ships(&mut self) {
        let ships = &self.ships;
        self.live.retain(|&idx| ships[idx].alive());
    }

    pub fn ship_by_id_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|ship| ship.id == id)
    }
}
