//! Scenario definition: the starting state of a run.
//!
//! A scenario fixes the arena size, the ship and asteroid initial states, the
//! random seed, and the stop-condition knobs (time limit, ammo limit). All
//! configuration invariants are checked up front so a bad scenario fails
//! before the frame loop starts.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::constants::asteroid;
use crate::game::state::{Asteroid, Ship, ShipId};

/// Invalid scenario configurations, raised at construction/spawn time
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScenarioError {
    #[error("asteroid size {0} outside valid range 1..=4")]
    InvalidAsteroidSize(u8),
    #[error("ammo limit multiplier must be >= 0, got {0}")]
    NegativeAmmoMultiplier(f64),
    #[error("stop_if_no_ammo requires an ammo limit multiplier; ammo is unlimited")]
    StopWithoutAmmoLimit,
    #[error("scenario defines no asteroids")]
    NoAsteroids,
}

/// Initial state of one ship. Unset fields fall back to the standard loadout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipInit {
    pub position: (f64, f64),
    pub angle: f64,
    pub lives: u32,
    pub team: u32,
    pub team_name: Option<String>,
    pub mines_remaining: i32,
}

impl ShipInit {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: (x, y),
            angle: 90.0,
            lives: 3,
            team: 1,
            team_name: None,
            mines_remaining: 0,
        }
    }
}

/// Initial state of one asteroid. `None` fields are randomized at spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsteroidInit {
    pub position: Option<(f64, f64)>,
    pub speed: Option<f64>,
    pub angle: Option<f64>,
    pub size: Option<u8>,
}

/// Starting state of the environment plus stop-condition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub map_size: (f64, f64),
    pub ship_states: Vec<ShipInit>,
    pub asteroid_states: Vec<AsteroidInit>,
    /// Seed for asteroid placement and split randomization; `None` draws from
    /// entropy (non-reproducible)
    pub seed: Option<u64>,
    /// Simulation-time limit in seconds; infinity disables it
    pub time_limit: f64,
    /// Bullet budget per ship as a multiple of the scenario's total asteroid
    /// count; 0 means unlimited ammo
    pub ammo_limit_multiplier: f64,
    pub stop_if_no_ammo: bool,
}

impl Scenario {
    /// A scenario with `num_asteroids` fully random asteroids and one ship at
    /// the map center.
    pub fn new(name: impl Into<String>, num_asteroids: usize) -> Self {
        let map_size = (1000.0, 800.0);
        Self {
            name: name.into(),
            map_size,
            ship_states: vec![ShipInit::at(map_size.0 / 2.0, map_size.1 / 2.0)],
            asteroid_states: vec![AsteroidInit::default(); num_asteroids],
            seed: None,
            time_limit: f64::INFINITY,
            ammo_limit_multiplier: 0.0,
            stop_if_no_ammo: false,
        }
    }

    /// Check every configuration invariant that must hold before a run starts
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.asteroid_states.is_empty() {
            return Err(ScenarioError::NoAsteroids);
        }
        for init in &self.asteroid_states {
            if let Some(size) = init.size {
                if !(asteroid::MIN_SIZE..=asteroid::MAX_SIZE).contains(&size) {
                    return Err(ScenarioError::InvalidAsteroidSize(size));
                }
            }
        }
        if self.ammo_limit_multiplier < 0.0 {
            return Err(ScenarioError::NegativeAmmoMultiplier(
                self.ammo_limit_multiplier,
            ));
        }
        if self.stop_if_no_ammo && self.ammo_limit_multiplier == 0.0 {
            return Err(ScenarioError::StopWithoutAmmoLimit);
        }
        Ok(())
    }

    /// Total number of asteroids this scenario can ever produce, counting the
    /// full 3-way split cascade of each starting rock.
    pub fn max_asteroids(&self) -> u32 {
        self.asteroid_states
            .iter()
            .map(|init| Self::count_asteroids(init.size.unwrap_or(asteroid::MAX_SIZE)))
            .sum()
    }

    /// Number of asteroids a single rock of `size` produces over its full
    /// split cascade (itself included): sum of 3^(s-1) for s = 1..=size.
    pub fn count_asteroids(size: u8) -> u32 {
        (1..=size as u32).map(|s| 3_u32.pow(s - 1)).sum()
    }

    /// Per-ship bullet budget: -1 for unlimited, otherwise the asteroid count
    /// scaled by the multiplier (at least 1).
    pub fn bullet_limit(&self) -> i32 {
        if self.ammo_limit_multiplier != 0.0 {
            let limit = (self.max_asteroids() as f64 * self.ammo_limit_multiplier).round() as i32;
            limit.max(1)
        } else {
            -1
        }
    }

    /// Effective time limit: a zero or negative configured limit means none
    pub fn effective_time_limit(&self) -> f64 {
        if self.time_limit > 0.0 {
            self.time_limit
        } else {
            f64::INFINITY
        }
    }

    /// Instantiate the starting asteroid field. Unspecified positions are
    /// drawn uniformly from the map; positions landing exactly on a wrap
    /// boundary are nudged inward (an on-boundary spawn can oscillate between
    /// the two identified edges instead of passing through).
    pub fn spawn_asteroids<R: Rng>(&self, rng: &mut R) -> Result<Vec<Asteroid>, ScenarioError> {
        let mut asteroids = Vec::with_capacity(self.asteroid_states.len());
        for init in &self.asteroid_states {
            if let Some(size) = init.size {
                if !(asteroid::MIN_SIZE..=asteroid::MAX_SIZE).contains(&size) {
                    return Err(ScenarioError::InvalidAsteroidSize(size));
                }
            }
            let position = match init.position {
                Some(position) => nudge_away_from_border(position, self.map_size),
                None => (
                    rng.gen_range(0.0..self.map_size.0),
                    rng.gen_range(0.0..self.map_size.1),
                ),
            };
            asteroids.push(Asteroid::new(
                position.into(),
                init.speed,
                init.angle,
                init.size.unwrap_or(asteroid::MAX_SIZE),
                rng,
            ));
        }
        Ok(asteroids)
    }

    /// Instantiate the ship roster with sequential ids and the scenario's
    /// bullet budget.
    pub fn spawn_ships(&self) -> Vec<Ship> {
        let bullet_limit = self.bullet_limit();
        self.ship_states
            .iter()
            .enumerate()
            .map(|(idx, init)| {
                Ship::new(
                    idx as ShipId + 1,
                    init.position.into(),
                    init.angle,
                    init.lives,
                    init.team,
                    init.team_name.clone(),
                    bullet_limit,
                    init.mines_remaining,
                )
            })
            .collect()
    }
}

/// Move a spawn position off an exact wrap boundary by a hair. Rare, but an
/// asteroid born exactly on the seam can cycle between 0 and map_size instead
/// of drifting through.
fn nudge_away_from_border(position: (f64, f64), map_size: (f64, f64)) -> (f64, f64) {
    const EPS: f64 = 1e-10;
    const ON_EDGE: f64 = 1e-14;
    let (mut x, mut y) = position;
    if x.abs() <= ON_EDGE {
        x += EPS;
    } else if (x - map_size.0).abs() <= ON_EDGE {
        x -= EPS;
    }
    if y.abs() <= ON_EDGE {
        y += EPS;
    } else if (y - map_size.1).abs() <= ON_EDGE {
        y -= EPS;
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_count_asteroids_cascade() {
        assert_eq!(Scenario::count_asteroids(1), 1);
        assert_eq!(Scenario::count_asteroids(2), 4);
        assert_eq!(Scenario::count_asteroids(3), 13);
        assert_eq!(Scenario::count_asteroids(4), 40);
    }

    #[test]
    fn test_max_asteroids_defaults_to_largest_size() {
        let scenario = Scenario::new("test", 2);
        assert_eq!(scenario.max_asteroids(), 80);
    }

    #[test]
    fn test_bullet_limit_unlimited_by_default() {
        let scenario = Scenario::new("test", 3);
        assert_eq!(scenario.bullet_limit(), -1);
    }

    #[test]
    fn test_bullet_limit_scales_and_floors_at_one() {
        let mut scenario = Scenario::new("test", 1);
        scenario.ammo_limit_multiplier = 0.5;
        assert_eq!(scenario.bullet_limit(), 20);
        scenario.ammo_limit_multiplier = 0.001;
        assert_eq!(scenario.bullet_limit(), 1);
    }

    #[test]
    fn test_validate_rejects_empty_field() {
        let scenario = Scenario::new("test", 0);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::NoAsteroids)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_size() {
        let mut scenario = Scenario::new("test", 1);
        scenario.asteroid_states[0].size = Some(5);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::InvalidAsteroidSize(5))
        ));
    }

    #[test]
    fn test_validate_rejects_stop_flag_without_limit() {
        let mut scenario = Scenario::new("test", 1);
        scenario.stop_if_no_ammo = true;
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::StopWithoutAmmoLimit)
        ));
        scenario.ammo_limit_multiplier = 1.0;
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_multiplier() {
        let mut scenario = Scenario::new("test", 1);
        scenario.ammo_limit_multiplier = -1.0;
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::NegativeAmmoMultiplier(_))
        ));
    }

    #[test]
    fn test_seeded_spawn_is_reproducible() {
        let scenario = Scenario::new("test", 5);
        let a = scenario.spawn_asteroids(&mut StdRng::seed_from_u64(42)).unwrap();
        let b = scenario.spawn_asteroids(&mut StdRng::seed_from_u64(42)).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.velocity, y.velocity);
            assert_eq!(x.spin, y.spin);
        }
    }

    #[test]
    fn test_spawned_ships_get_sequential_ids_and_budget() {
        let mut scenario = Scenario::new("test", 1);
        scenario.ship_states = vec![ShipInit::at(100.0, 100.0), ShipInit::at(200.0, 200.0)];
        scenario.ammo_limit_multiplier = 1.0;
        let ships = scenario.spawn_ships();
        assert_eq!(ships.len(), 2);
        assert_eq!(ships[0].id, 1);
        assert_eq!(ships[1].id, 2);
        assert_eq!(ships[0].bullets_remaining, 40);
    }

    #[test]
    fn test_border_nudge() {
        let map = (1000.0, 800.0);
        let (x, y) = nudge_away_from_border((0.0, 800.0), map);
        assert!(x > 0.0);
        assert!(y < 800.0);
        let (x, y) = nudge_away_from_border((500.0, 400.0), map);
        assert_eq!((x, y), (500.0, 400.0));
    }

    #[test]
    fn test_effective_time_limit() {
        let mut scenario = Scenario::new("test", 1);
        assert!(scenario.effective_time_limit().is_infinite());
        scenario.time_limit = 60.0;
        assert_eq!(scenario.effective_time_limit(), 60.0);
    }
}
