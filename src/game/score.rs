//! Team scoring and run results.
//!
//! Per-ship tallies live on the ships themselves; this module aggregates them
//! into per-team totals by read-only traversal of the full roster each frame,
//! and packages the final result for external reporting.

use serde::Serialize;

use crate::game::match_result::StopReason;
use crate::game::scenario::Scenario;
use crate::game::state::Ship;

/// Accumulated results for one team
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub team_id: u32,
    pub team_name: String,

    /// Bullet budget available to the team over the whole run (-1 unlimited)
    pub total_bullets: i32,
    /// Asteroid count the scenario can produce in total
    pub total_asteroids: u32,

    pub asteroids_hit: u32,
    pub bullets_hit: u32,
    pub shots_fired: u32,
    pub bullets_remaining: i32,
    pub mines_remaining: i32,
    pub deaths: u32,
    pub lives_remaining: u32,
    /// Wall-clock controller evaluation times, when tracking is enabled
    pub eval_times: Vec<f64>,
}

impl Team {
    pub fn new(team_id: u32, team_name: String) -> Self {
        Self {
            team_id,
            team_name,
            total_bullets: 0,
            total_asteroids: 0,
            asteroids_hit: 0,
            bullets_hit: 0,
            shots_fired: 0,
            bullets_remaining: 0,
            mines_remaining: 0,
            deaths: 0,
            lives_remaining: 0,
            eval_times: Vec::new(),
        }
    }

    /// Fraction of fired bullets that hit
    pub fn accuracy(&self) -> f64 {
        if self.shots_fired > 0 {
            self.bullets_hit as f64 / self.shots_fired as f64
        } else {
            0.0
        }
    }

    pub fn fraction_total_asteroids_hit(&self) -> f64 {
        self.asteroids_hit as f64 / self.total_asteroids as f64
    }

    pub fn mean_eval_time(&self) -> f64 {
        if self.eval_times.is_empty() {
            return 0.0;
        }
        self.eval_times.iter().sum::<f64>() / self.eval_times.len() as f64
    }

    pub fn median_eval_time(&self) -> f64 {
        if self.eval_times.is_empty() {
            return 0.0;
        }
        let mut sorted = self.eval_times.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    pub fn min_eval_time(&self) -> f64 {
        self.eval_times.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_eval_time(&self) -> f64 {
        self.eval_times.iter().copied().fold(0.0, f64::max)
    }
}

/// Scoring trace of a run: per-team aggregates, the simulation clock, and the
/// terminal stop reason once the run ends.
#[derive(Debug, Clone, Serialize)]
pub struct Score {
    pub sim_time: f64,
    pub stop_reason: Option<StopReason>,
    pub teams: Vec<Team>,
}

impl Score {
    /// Set up one team per distinct team id in the scenario's roster, seeded
    /// with the scenario-wide totals.
    pub fn new(scenario: &Scenario) -> Self {
        let ships = scenario.spawn_ships();
        let mut teams: Vec<Team> = Vec::new();
        for ship in &ships {
            if !teams.iter().any(|team| team.team_id == ship.team) {
                teams.push(Team::new(ship.team, ship.team_name.clone()));
            }
        }
        for team in &mut teams {
            team.total_asteroids = scenario.max_asteroids();
            for ship in &ships {
                if team.team_id == ship.team {
                    team.total_bullets += scenario.bullet_limit();
                }
            }
        }
        Self {
            sim_time: 0.0,
            stop_reason: None,
            teams,
        }
    }

    /// Re-tally every team from the full roster (dead ships still count)
    pub fn update(&mut self, ships: &[Ship], sim_time: f64, controller_times: Option<&[f64]>) {
        self.sim_time = sim_time;
        for team in &mut self.teams {
            let mut asteroids_hit = 0;
            let mut bullets_hit = 0;
            let mut shots_fired = 0;
            let mut bullets_remaining = 0;
            let mut mines_remaining = 0;
            let mut deaths = 0;
            let mut lives_remaining = 0;
            for (idx, ship) in ships.iter().enumerate() {
                if team.team_id == ship.team {
                    asteroids_hit += ship.asteroids_hit;
                    bullets_hit += ship.bullets_hit;
                    shots_fired += ship.bullets_shot;
                    bullets_remaining += ship.bullets_remaining;
                    mines_remaining += ship.mines_remaining;
                    deaths += ship.deaths;
                    lives_remaining += ship.lives;
                    if let Some(times) = controller_times {
                        if times[idx] > 0.0 {
                            team.eval_times.push(times[idx]);
                        }
                    }
                }
            }
            team.asteroids_hit = asteroids_hit;
            team.bullets_hit = bullets_hit;
            team.shots_fired = shots_fired;
            team.bullets_remaining = bullets_remaining;
            team.mines_remaining = mines_remaining;
            team.deaths = deaths;
            team.lives_remaining = lives_remaining;
        }
    }

    /// Record the terminal state once a stop condition has been reached
    pub fn finalize(&mut self, sim_time: f64, stop_reason: StopReason) {
        self.sim_time = sim_time;
        self.stop_reason = Some(stop_reason);
    }
}
