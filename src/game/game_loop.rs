//! The fixed-timestep scheduler.
//!
//! One authoritative loop owns all entity lists and advances them frame by
//! frame: controller invocation, physics integration, four collision
//! categories resolved in chronological order, culling/spawning, scoring,
//! presentation, stop-condition evaluation, and optional realtime pacing.
//!
//! Within each collision category, simultaneous collisions resolve by
//! ascending collision time with list order breaking exact ties; across
//! categories the fixed order bullet -> mine -> ship-asteroid -> ship-ship
//! is load-bearing, since later categories observe the post-removal entity
//! lists of earlier ones.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::GameSettings;
use crate::game::controller::{validate_action, ControllerViolation, ShipController};
use crate::game::graphics::{GraphicsSink, NullGraphics};
use crate::game::match_result::{check_stop, StopReason};
use crate::game::performance::{FrameProfiler, PerfReport};
use crate::game::scenario::{Scenario, ScenarioError};
use crate::game::score::Score;
use crate::game::snapshot::{FrameInfo, GameSnapshot, OwnShipSnapshot};
use crate::game::state::{Impact, World};
use crate::game::systems::collision::{
    circle_line_collision_continuous, circles_overlap, collision_time_interval,
    ship_asteroid_continuous_collision_time, ship_ship_continuous_collision_time,
};
use crate::game::systems::physics;

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Controller(#[from] ControllerViolation),
    #[error("scenario defines {ships} ships but {controllers} controllers were supplied")]
    ControllerCountMismatch { ships: usize, controllers: usize },
}

/// The simulation engine. Construct once with settings, then run scenarios.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pub settings: GameSettings,
}

impl Game {
    pub fn new(settings: GameSettings) -> Self {
        Self { settings }
    }

    /// Run a scenario headless (no presentation sink)
    pub fn run(
        &self,
        scenario: &Scenario,
        controllers: &mut [Box<dyn ShipController>],
    ) -> Result<(Score, PerfReport), GameError> {
        self.run_with_graphics(scenario, controllers, &mut NullGraphics)
    }

    /// Run a scenario from start to finish, forwarding render snapshots to
    /// `graphics`, and return the final score and performance report.
    pub fn run_with_graphics(
        &self,
        scenario: &Scenario,
        controllers: &mut [Box<dyn ShipController>],
        graphics: &mut dyn GraphicsSink,
    ) -> Result<(Score, PerfReport), GameError> {
        scenario.validate()?;
        if controllers.len() != scenario.ship_states.len() {
            return Err(GameError::ControllerCountMismatch {
                ships: scenario.ship_states.len(),
                controllers: controllers.len(),
            });
        }

        let mut rng = match scenario.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let asteroids = scenario.spawn_asteroids(&mut rng)?;
        let ships = scenario.spawn_ships();
        let mut world = World::new(ships, asteroids);
        let mut score = Score::new(scenario);

        let delta_time = 1.0 / self.settings.frequency;
        let map_size = scenario.map_size;
        let time_limit = if scenario.effective_time_limit().is_finite() {
            scenario.effective_time_limit()
        } else {
            self.settings.time_limit
        };
        let mut sim_time: f64 = 0.0;
        let mut sim_frame: u64 = 0;

        // Hand each controller its ship id and probe optional metadata
        for (controller, ship) in controllers.iter_mut().zip(world.ships.iter_mut()) {
            controller.assign_ship_id(ship.id);
            if let Some(path) = controller.custom_sprite_path() {
                ship.custom_sprite_path = Some(path.to_string());
            }
        }

        graphics.start(scenario);
        let mut profiler = FrameProfiler::new(self.settings.perf_tracker, world.ships.len());
        info!(
            scenario = %scenario.name,
            ships = world.ships.len(),
            asteroids = world.asteroids.len(),
            "starting run"
        );

        let stop_reason: StopReason = loop {
            let frame_wall_start = Instant::now();
            profiler.frame_start();

            // --- Controller phase -------------------------------------------------
            let frame_info = FrameInfo {
                map_size,
                time_limit,
                time: sim_time,
                frame: sim_frame,
                delta_time,
                frame_rate: self.settings.frequency,
                random_asteroid_splits: self.settings.random_ast_splits,
                competition_safe_mode: self.settings.competition_safe_mode,
            };
            // Safe mode rebuilds the snapshot per controller; otherwise one
            // shared capture serves the whole frame
            let shared_snapshot = if self.settings.competition_safe_mode {
                None
            } else {
                Some(GameSnapshot::capture(&world, &frame_info))
            };

            for live_pos in 0..world.live.len() {
                let roster_idx = world.live[live_pos];
                let fresh_snapshot;
                let snapshot = match shared_snapshot.as_ref() {
                    Some(shared) => shared,
                    None => {
                        fresh_snapshot = GameSnapshot::capture(&world, &frame_info);
                        &fresh_snapshot
                    }
                };

                let ship = &world.ships[roster_idx];
                let controller = &mut controllers[roster_idx];
                if controller.ship_id() != Some(ship.id) {
                    return Err(ControllerViolation::ShipIdMismatch {
                        expected: ship.id,
                        actual: controller.ship_id(),
                    }
                    .into());
                }

                let own_state = OwnShipSnapshot::of(ship);
                let action = controller.actions(&own_state, snapshot);
                validate_action(ship.id, &action)?;

                let ship = &mut world.ships[roster_idx];
                ship.thrust = action.thrust;
                ship.turn_rate = action.turn_rate;
                ship.fire = action.fire;
                ship.drop_mine = action.drop_mine;
                profiler.record_controller(roster_idx);
            }

            // --- Physics phase ----------------------------------------------------
            physics::update(&mut world, delta_time, map_size);
            profiler.record_physics();

            // --- Collision phase, fixed category order ----------------------------
            resolve_bullet_asteroid(
                &mut world,
                delta_time,
                map_size,
                self.settings.random_ast_splits,
                &mut rng,
            );
            resolve_mine_blasts(&mut world, self.settings.random_ast_splits, &mut rng);
            let mut ships_hit = resolve_ship_asteroid(
                &mut world,
                delta_time,
                self.settings.random_ast_splits,
                &mut rng,
            );
            resolve_ship_ship(&mut world, delta_time, &mut ships_hit);
            world.cull_dead_ships();
            profiler.record_collisions();

            // --- Score update over the full roster --------------------------------
            if profiler.enabled() {
                let times = profiler.frame_controller_times().to_vec();
                score.update(&world.ships, sim_time, Some(&times));
            } else {
                score.update(&world.ships, sim_time, None);
            }
            profiler.record_score();

            // --- Presentation (best effort, gated by the frame-skip divisor) ------
            if sim_frame % self.settings.frame_skip == 0 {
                graphics.update(
                    &score,
                    &world.ships,
                    &world.asteroids,
                    &world.bullets,
                    &world.mines,
                );
            }
            profiler.record_graphics();

            // --- Advance the clock and evaluate stop conditions -------------------
            sim_time += delta_time;
            sim_frame += 1;
            let stop = check_stop(&world, scenario.stop_if_no_ammo, sim_time, time_limit);
            profiler.frame_end();
            if let Some(reason) = stop {
                break reason;
            }

            // --- Realtime pacing (presentation tier, not simulation logic) --------
            if self.settings.realtime_multiplier != 0.0 {
                let frame_budget = delta_time / self.settings.realtime_multiplier;
                while frame_wall_start.elapsed().as_secs_f64() < frame_budget {
                    std::hint::spin_loop();
                }
            }
        };

        graphics.close();
        score.finalize(sim_time, stop_reason);
        info!(?stop_reason, sim_time, frames = sim_frame, "run finished");

        Ok((score, profiler.into_report()))
    }
}

/// Insert `(time, a, b)` keeping the list sorted by ascending time; equal
/// times keep enumeration order (stable tie-break).
fn insert_chronological(collisions: &mut Vec<(f64, usize, usize)>, entry: (f64, usize, usize)) {
    let pos = collisions.partition_point(|&(t, _, _)| t <= entry.0);
    collisions.insert(pos, entry);
}

/// Bullet-asteroid collisions, resolved earliest-first. Also culls surviving
/// bullets that left the arena.
fn resolve_bullet_asteroid(
    world: &mut World,
    delta_time: f64,
    map_size: (f64, f64),
    random_splits: bool,
    rng: &mut StdRng,
) {
    let mut collisions: Vec<(f64, usize, usize)> = Vec::new();
    for (bul_idx, bullet) in world.bullets.iter().enumerate() {
        let tail = bullet.tail();
        for (ast_idx, asteroid) in world.asteroids.iter().enumerate() {
            if circle_line_collision_continuous(
                bullet.position.x,
                bullet.position.y,
                tail.x,
                tail.y,
                bullet.velocity.x,
                bullet.velocity.y,
                asteroid.position.x,
                asteroid.position.y,
                asteroid.velocity.x,
                asteroid.velocity.y,
                asteroid.radius,
                delta_time,
            ) {
                let (interval_start, _) = collision_time_interval(
                    bullet.position.x,
                    bullet.position.y,
                    tail.x,
                    tail.y,
                    bullet.velocity.x,
                    bullet.velocity.y,
                    asteroid.position.x,
                    asteroid.position.y,
                    asteroid.velocity.x,
                    asteroid.velocity.y,
                    asteroid.radius,
                );
                // A NaN interval (pure broadside window) clamps to the frame
                // start: contact covered the whole window
                let collision_time = interval_start.max(-delta_time).min(0.0);
                insert_chronological(&mut collisions, (collision_time, bul_idx, ast_idx));
            }
        }
    }

    let mut bullets_to_cull: Vec<usize> = Vec::new();
    let mut asteroids_to_cull: Vec<usize> = Vec::new();
    let mut new_asteroids = Vec::new();

    for &(_, bul_idx, ast_idx) in &collisions {
        if bullets_to_cull.contains(&bul_idx) || asteroids_to_cull.contains(&ast_idx) {
            // An earlier collision already consumed one of the pair
            continue;
        }
        let bullet = &world.bullets[bul_idx];
        let asteroid = &world.asteroids[ast_idx];
        if let Some(owner) = world.ships.iter_mut().find(|s| s.id == bullet.owner) {
            owner.asteroids_hit += 1;
            owner.bullets_hit += 1;
        }
        let impact = Impact::Bullet {
            mass: bullet.mass,
            velocity: bullet.velocity,
        };
        new_asteroids.extend(asteroid.destruct(&impact, random_splits, rng));
        bullets_to_cull.push(bul_idx);
        asteroids_to_cull.push(ast_idx);
    }

    // Cull surviving bullets once both head and tail are off the map
    for (bul_idx, bullet) in world.bullets.iter().enumerate() {
        if bullets_to_cull.contains(&bul_idx) {
            continue;
        }
        let head = bullet.position;
        let tail = bullet.tail();
        let head_in = (0.0..=map_size.0).contains(&head.x) && (0.0..=map_size.1).contains(&head.y);
        let tail_in = (0.0..=map_size.0).contains(&tail.x) && (0.0..=map_size.1).contains(&tail.y);
        if !(head_in || tail_in) {
            bullets_to_cull.push(bul_idx);
        }
    }

    // Swap-and-pop invalidates trailing indices: remove in descending order
    bullets_to_cull.sort_unstable_by(|a, b| b.cmp(a));
    for bul_idx in bullets_to_cull {
        world.remove_bullet(bul_idx);
    }
    asteroids_to_cull.sort_unstable_by(|a, b| b.cmp(a));
    for ast_idx in asteroids_to_cull {
        world.remove_asteroid(ast_idx);
    }
    world.asteroids.append(&mut new_asteroids);
}

/// Apply detonating mines: each asteroid or ship in range takes damage from
/// its nearest detonating mine only (strict `<`, so exactly-equal distances
/// keep the earlier-listed mine). All detonated mines are removed.
fn resolve_mine_blasts(world: &mut World, random_splits: bool, rng: &mut StdRng) {
    if !world.mines.iter().any(|mine| mine.detonating) {
        return;
    }
    let detonating: Vec<_> = world
        .mines
        .iter()
        .filter(|mine| mine.detonating)
        .cloned()
        .collect();

    let mut asteroids_to_cull: Vec<usize> = Vec::new();
    let mut new_asteroids = Vec::new();

    for (ast_idx, asteroid) in world.asteroids.iter().enumerate() {
        let mut closest = None;
        let mut closest_sq_dist = f64::INFINITY;
        for mine in &detonating {
            let sq_dist = mine.position.distance_sq_to(asteroid.position);
            let radius_sum = mine.blast_radius + asteroid.radius;
            if sq_dist <= radius_sum * radius_sum && sq_dist < closest_sq_dist {
                closest_sq_dist = sq_dist;
                closest = Some(mine);
            }
        }
        if let Some(mine) = closest {
            if let Some(owner) = world.ships.iter_mut().find(|s| s.id == mine.owner) {
                owner.asteroids_hit += 1;
                owner.mines_hit += 1;
            }
            let impact = Impact::Mine {
                position: mine.position,
                blast_radius: mine.blast_radius,
                blast_pressure: mine.blast_pressure,
            };
            new_asteroids.extend(asteroid.destruct(&impact, random_splits, rng));
            asteroids_to_cull.push(ast_idx);
        }
    }

    // Damage live, non-respawning ships from their nearest detonating mine
    for live_pos in 0..world.live.len() {
        let roster_idx = world.live[live_pos];
        let ship = &world.ships[roster_idx];
        if ship.is_respawning() {
            continue;
        }
        let mut hit = false;
        let mut closest_sq_dist = f64::INFINITY;
        for mine in &detonating {
            let sq_dist = mine.position.distance_sq_to(ship.position);
            let radius_sum = mine.blast_radius + ship.radius;
            if sq_dist <= radius_sum * radius_sum && sq_dist < closest_sq_dist {
                closest_sq_dist = sq_dist;
                hit = true;
            }
        }
        if hit {
            world.ships[roster_idx].destruct();
        }
    }

    for ast_idx in asteroids_to_cull.into_iter().rev() {
        world.remove_asteroid(ast_idx);
    }
    let detonated: Vec<usize> = world
        .mines
        .iter()
        .enumerate()
        .filter(|(_, mine)| mine.detonating)
        .map(|(idx, _)| idx)
        .collect();
    for mine_idx in detonated.into_iter().rev() {
        world.remove_mine(mine_idx);
    }
    world.asteroids.append(&mut new_asteroids);
}

/// Ship-asteroid collisions, earliest-first. Returns the roster indices of
/// ships destructed here; they are exempt from further damage this frame.
fn resolve_ship_asteroid(
    world: &mut World,
    delta_time: f64,
    random_splits: bool,
    rng: &mut StdRng,
) -> Vec<usize> {
    let mut collisions: Vec<(f64, usize, usize)> = Vec::new();
    for &roster_idx in &world.live {
        let ship = &world.ships[roster_idx];
        if !ship.alive() || ship.is_respawning() {
            continue;
        }
        for (ast_idx, asteroid) in world.asteroids.iter().enumerate() {
            let collision_time = if ship.was_respawning_until_this_frame {
                // Invulnerability ran out this frame: only a present-time
                // overlap counts, not the swept window
                if circles_overlap(
                    ship.position,
                    ship.radius,
                    asteroid.position,
                    asteroid.radius,
                ) {
                    0.0
                } else {
                    f64::NAN
                }
            } else {
                ship_asteroid_continuous_collision_time(ship, asteroid, delta_time)
            };
            if !collision_time.is_nan() {
                debug_assert!(-delta_time <= collision_time && collision_time <= 0.0);
                insert_chronological(&mut collisions, (collision_time, roster_idx, ast_idx));
            }
        }
    }

    let mut ships_hit: Vec<usize> = Vec::new();
    let mut asteroids_to_cull: Vec<usize> = Vec::new();
    let mut new_asteroids = Vec::new();

    for &(_, roster_idx, ast_idx) in &collisions {
        if ships_hit.contains(&roster_idx) || asteroids_to_cull.contains(&ast_idx) {
            continue;
        }
        let ship = &world.ships[roster_idx];
        let impact = Impact::Ship {
            mass: ship.mass,
            velocity: ship.velocity,
        };
        new_asteroids.extend(world.asteroids[ast_idx].destruct(&impact, random_splits, rng));
        let ship = &mut world.ships[roster_idx];
        ship.asteroids_hit += 1;
        ship.destruct();
        debug!(ship_id = ship.id, "ship destroyed by asteroid");
        ships_hit.push(roster_idx);
        asteroids_to_cull.push(ast_idx);
    }

    for ast_idx in asteroids_to_cull.into_iter().rev() {
        world.remove_asteroid(ast_idx);
    }
    world.asteroids.append(&mut new_asteroids);
    ships_hit
}

/// Symmetric ship-ship collisions among live, non-respawning ships; any
/// confirmed contact destroys both parties.
fn resolve_ship_ship(world: &mut World, delta_time: f64, ships_hit: &mut Vec<usize>) {
    let mut collisions: Vec<(f64, usize, usize)> = Vec::new();
    let num_live = world.live.len();
    for i in 0..num_live {
        let idx1 = world.live[i];
        let ship1 = &world.ships[idx1];
        if !ship1.alive() || ship1.is_respawning() {
            continue;
        }
        for j in (i + 1)..num_live {
            let idx2 = world.live[j];
            let ship2 = &world.ships[idx2];
            if !ship2.alive() || ship2.is_respawning() {
                continue;
            }
            let collision_time = if ship1.was_respawning_until_this_frame
                || ship2.was_respawning_until_this_frame
            {
                if circles_overlap(ship1.position, ship1.radius, ship2.position, ship2.radius) {
                    0.0
                } else {
                    f64::NAN
                }
            } else {
                ship_ship_continuous_collision_time(ship1, ship2, delta_time)
            };
            if !collision_time.is_nan() {
                debug_assert!(-delta_time <= collision_time && collision_time <= 0.0);
                insert_chronological(&mut collisions, (collision_time, idx1, idx2));
            }
        }
    }

    for &(_, idx1, idx2) in &collisions {
        if ships_hit.contains(&idx1) || ships_hit.contains(&idx2) {
            continue;
        }
        world.ships[idx1].destruct();
        world.ships[idx2].destruct();
        debug!(
            ship1 = world.ships[idx1].id,
            ship2 = world.ships[idx2].id,
            "ship-ship collision"
        );
        ships_hit.push(idx1);
        ships_hit.push(idx2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::controller::ControlAction;
    use crate::game::scenario::{AsteroidInit, ShipInit};
    use crate::game::state::ShipId;

    /// Fixed-command test controller; optionally drops mines for the first
    /// `mine_frames` invocations.
    struct Scripted {
        id: Option<ShipId>,
        thrust: f64,
        turn_rate: f64,
        fire: bool,
        mine_frames: u32,
        calls: u32,
    }

    impl Scripted {
        fn boxed(thrust: f64, turn_rate: f64, fire: bool) -> Box<dyn ShipController> {
            Box::new(Self {
                id: None,
                thrust,
                turn_rate,
                fire,
                mine_frames: 0,
                calls: 0,
            })
        }

        fn miner() -> Box<dyn ShipController> {
            Box::new(Self {
                id: None,
                thrust: 0.0,
                turn_rate: 0.0,
                fire: false,
                mine_frames: 1,
                calls: 0,
            })
        }
    }

    impl ShipController for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn assign_ship_id(&mut self, ship_id: ShipId) {
            self.id = Some(ship_id);
        }

        fn ship_id(&self) -> Option<ShipId> {
            self.id
        }

        fn actions(&mut self, _own: &OwnShipSnapshot, _game: &GameSnapshot) -> ControlAction {
            self.calls += 1;
            ControlAction {
                thrust: self.thrust,
                turn_rate: self.turn_rate,
                fire: self.fire,
                drop_mine: self.calls <= self.mine_frames,
            }
        }
    }

    fn fixed_asteroid(x: f64, y: f64, size: u8) -> AsteroidInit {
        AsteroidInit {
            position: Some((x, y)),
            speed: Some(0.0),
            angle: Some(0.0),
            size: Some(size),
        }
    }

    #[test]
    fn test_clearout_credits_every_asteroid() {
        // One ship parked at (400, 400) firing straight up into a column of
        // stationary rocks; runs until the field (including all split
        // children) is gone.
        let mut scenario = Scenario::new("clearout", 1);
        scenario.seed = Some(5);
        scenario.ship_states = vec![ShipInit::at(400.0, 400.0)];
        scenario.asteroid_states = vec![
            fixed_asteroid(400.0, 500.0, 2),
            fixed_asteroid(400.0, 560.0, 1),
            fixed_asteroid(400.0, 620.0, 2),
        ];
        scenario.time_limit = 120.0;
        assert_eq!(scenario.max_asteroids(), 9);

        let mut controllers = vec![Scripted::boxed(0.0, 0.0, true)];
        let game = Game::new(GameSettings::default());
        let (score, _) = game.run(&scenario, &mut controllers).unwrap();

        assert_eq!(score.stop_reason, Some(StopReason::NoAsteroids));
        let team = &score.teams[0];
        assert_eq!(team.asteroids_hit, 9);
        assert_eq!(team.bullets_hit, 9);
        assert!(team.shots_fired >= 9);
        assert_eq!(team.deaths, 0);
        assert_eq!(team.lives_remaining, 3);
    }

    #[test]
    fn test_single_life_ram_ends_in_no_ships() {
        // A one-life ship thrusts straight into a size-4 rock. The rock
        // splits, the ship dies, and with nothing in flight the run ends as
        // NoShips with exactly one death.
        let mut scenario = Scenario::new("ram", 1);
        scenario.seed = Some(6);
        let mut pilot = ShipInit::at(400.0, 400.0);
        pilot.lives = 1;
        scenario.ship_states = vec![pilot];
        scenario.asteroid_states = vec![fixed_asteroid(400.0, 550.0, 4)];
        scenario.time_limit = 30.0;

        let mut controllers = vec![Scripted::boxed(480.0, 0.0, false)];
        let game = Game::new(GameSettings::default());
        let (score, _) = game.run(&scenario, &mut controllers).unwrap();

        assert_eq!(score.stop_reason, Some(StopReason::NoShips));
        let team = &score.teams[0];
        assert_eq!(team.deaths, 1);
        assert_eq!(team.asteroids_hit, 1);
        assert_eq!(team.lives_remaining, 0);
    }

    #[test]
    fn test_simultaneous_mines_credit_first_by_iteration_order() {
        // Two ships drop mines the same frame, equidistant from the same
        // rock. Both mines detonate together; the earlier-listed mine (the
        // first ship's) gets sole credit via the strict-less tie-break.
        let mut scenario = Scenario::new("mine-tie", 1);
        scenario.seed = Some(7);
        let mut left = ShipInit::at(100.0, 400.0);
        left.team = 1;
        left.mines_remaining = 1;
        let mut right = ShipInit::at(300.0, 400.0);
        right.team = 2;
        right.mines_remaining = 1;
        scenario.ship_states = vec![left, right];
        // Size 2 so the blast leaves children and the run ends on the clock
        scenario.asteroid_states = vec![fixed_asteroid(200.0, 400.0, 2)];
        scenario.time_limit = 4.0;

        let mut controllers = vec![Scripted::miner(), Scripted::miner()];
        let game = Game::new(GameSettings::default());
        let (score, _) = game.run(&scenario, &mut controllers).unwrap();

        assert_eq!(score.stop_reason, Some(StopReason::TimeExpired));
        let team1 = &score.teams[0];
        let team2 = &score.teams[1];
        assert_eq!(team1.asteroids_hit, 1);
        assert_eq!(team2.asteroids_hit, 0);
        // Both ships sat inside their own mine's blast
        assert_eq!(team1.deaths, 1);
        assert_eq!(team2.deaths, 1);
        assert_eq!(team1.mines_remaining, 0);
        assert_eq!(team2.mines_remaining, 0);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let mut scenario = Scenario::new("determinism", 5);
        scenario.seed = Some(99);
        scenario.time_limit = 2.0;

        let game = Game::new(GameSettings::default());
        let mut first_controllers = vec![Scripted::boxed(200.0, 90.0, true)];
        let (first, _) = game.run(&scenario, &mut first_controllers).unwrap();
        let mut second_controllers = vec![Scripted::boxed(200.0, 90.0, true)];
        let (second, _) = game.run(&scenario, &mut second_controllers).unwrap();

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn test_out_of_bullets_stop() {
        // Ammo-limited scenario where the lone ship fires its budget without
        // clearing the field
        let mut scenario = Scenario::new("dry", 1);
        scenario.seed = Some(8);
        scenario.ship_states = vec![ShipInit::at(100.0, 100.0)];
        // Single terminal rock far from the firing line
        scenario.asteroid_states = vec![fixed_asteroid(900.0, 700.0, 1)];
        scenario.ammo_limit_multiplier = 2.0;
        scenario.stop_if_no_ammo = true;
        scenario.time_limit = 60.0;
        assert_eq!(scenario.bullet_limit(), 2);

        let mut controllers = vec![Scripted::boxed(0.0, 0.0, true)];
        let game = Game::new(GameSettings::default());
        let (score, _) = game.run(&scenario, &mut controllers).unwrap();

        assert_eq!(score.stop_reason, Some(StopReason::OutOfBullets));
        assert_eq!(score.teams[0].shots_fired, 2);
        assert_eq!(score.teams[0].bullets_remaining, 0);
    }

    #[test]
    fn test_controller_count_mismatch_is_fatal() {
        let scenario = Scenario::new("mismatch", 1);
        let mut controllers: Vec<Box<dyn ShipController>> = Vec::new();
        let game = Game::new(GameSettings::default());
        let err = game.run(&scenario, &mut controllers).unwrap_err();
        assert!(matches!(
            err,
            GameError::ControllerCountMismatch {
                ships: 1,
                controllers: 0
            }
        ));
    }

    #[test]
    fn test_non_finite_command_is_fatal() {
        struct BrokenController {
            id: Option<ShipId>,
        }
        impl ShipController for BrokenController {
            fn name(&self) -> &str {
                "broken"
            }
            fn assign_ship_id(&mut self, ship_id: ShipId) {
                self.id = Some(ship_id);
            }
            fn ship_id(&self) -> Option<ShipId> {
                self.id
            }
            fn actions(&mut self, _own: &OwnShipSnapshot, _game: &GameSnapshot) -> ControlAction {
                ControlAction {
                    thrust: f64::NAN,
                    ..Default::default()
                }
            }
        }

        let mut scenario = Scenario::new("broken", 1);
        scenario.seed = Some(9);
        let mut controllers: Vec<Box<dyn ShipController>> =
            vec![Box::new(BrokenController { id: None })];
        let game = Game::new(GameSettings::default());
        let err = game.run(&scenario, &mut controllers).unwrap_err();
        assert!(matches!(err, GameError::Controller(_)));
    }

    #[test]
    fn test_invalid_scenario_is_fatal_before_the_loop() {
        let mut scenario = Scenario::new("invalid", 1);
        scenario.stop_if_no_ammo = true; // no ammo limit set
        let mut controllers = vec![Scripted::boxed(0.0, 0.0, false)];
        let game = Game::new(GameSettings::default());
        let err = game.run(&scenario, &mut controllers).unwrap_err();
        assert!(matches!(err, GameError::Scenario(_)));
    }

    #[test]
    fn test_perf_tracker_produces_report() {
        let mut scenario = Scenario::new("perf", 1);
        scenario.seed = Some(10);
        scenario.ship_states = vec![ShipInit::at(100.0, 100.0)];
        scenario.asteroid_states = vec![fixed_asteroid(900.0, 700.0, 1)];
        scenario.time_limit = 0.5;

        let mut settings = GameSettings::default();
        settings.perf_tracker = true;
        let game = Game::new(settings);
        let mut controllers = vec![Scripted::boxed(100.0, 45.0, false)];
        let (score, report) = game.run(&scenario, &mut controllers).unwrap();

        assert_eq!(score.stop_reason, Some(StopReason::TimeExpired));
        assert_eq!(report.controller_times.len(), 1);
        assert!(report.total_frame_time > 0.0);
        assert!(report.physics_update > 0.0);
    }

    #[test]
    fn test_graphics_sink_receives_lifecycle_calls() {
        #[derive(Default)]
        struct CountingSink {
            starts: u32,
            updates: u32,
            closes: u32,
        }
        impl GraphicsSink for CountingSink {
            fn start(&mut self, _scenario: &Scenario) {
                self.starts += 1;
            }
            fn update(
                &mut self,
                _score: &Score,
                _ships: &[crate::game::state::Ship],
                _asteroids: &[crate::game::state::Asteroid],
                _bullets: &[crate::game::state::Bullet],
                _mines: &[crate::game::state::Mine],
            ) {
                self.updates += 1;
            }
            fn close(&mut self) {
                self.closes += 1;
            }
        }

        let mut scenario = Scenario::new("sink", 1);
        scenario.seed = Some(11);
        scenario.ship_states = vec![ShipInit::at(100.0, 100.0)];
        scenario.asteroid_states = vec![fixed_asteroid(900.0, 700.0, 1)];
        scenario.time_limit = 0.95;

        // Render every 10th frame: 29 frames run -> updates at 0, 10, 20
        let mut settings = GameSettings::default();
        settings.frame_skip = 10;
        let game = Game::new(settings);
        let mut controllers = vec![Scripted::boxed(0.0, 0.0, false)];
        let mut sink = CountingSink::default();
        game.run_with_graphics(&scenario, &mut controllers, &mut sink)
            .unwrap();

        assert_eq!(sink.starts, 1);
        assert_eq!(sink.closes, 1);
        assert_eq!(sink.updates, 3);
    }
}
