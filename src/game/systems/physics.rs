//! Per-frame kinematics.
//!
//! Bullets, mines, and asteroids move trivially. Ships follow spiral paths
//! (constant thrust + constant turn rate) integrated analytically so the
//! trajectory is frame-rate independent, with the frame split into phases
//! wherever the constant-acceleration assumption breaks: at a speed-zero
//! crossing and at the speed cap. Each phase is recorded in reverse
//! chronological order so the collision detector can reconstruct the exact
//! sub-frame path afterward.

use smallvec::SmallVec;
use tracing::warn;

use crate::game::state::{Bullet, IntegrationPhase, Mine, Ship, World};
use crate::game::systems::weapons;
use crate::game::constants::sim::TIMER_EPSILON;
use crate::util::math::spiral_integration;
use crate::util::vec2::Vec2;

/// Advance every entity by one frame. Ship updates may emit new ordnance,
/// which is appended to the live lists.
pub fn update(world: &mut World, delta_time: f64, map_size: (f64, f64)) {
    for bullet in &mut world.bullets {
        bullet.update(delta_time);
    }
    for mine in &mut world.mines {
        mine.update(delta_time);
    }
    for asteroid in &mut world.asteroids {
        asteroid.update(delta_time, map_size);
    }
    for live_pos in 0..world.live.len() {
        let ship_idx = world.live[live_pos];
        let (new_bullet, new_mine) = update_ship(&mut world.ships[ship_idx], delta_time, map_size);
        if let Some(bullet) = new_bullet {
            world.bullets.push(bullet);
        }
        if let Some(mine) = new_mine {
            world.mines.push(mine);
        }
    }
}

/// One constant-acceleration stretch of the frame, in forward time
#[derive(Debug, Clone, Copy)]
struct Segment {
    duration: f64,
    v_start: f64,
    accel: f64,
}

fn sign_or_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Split the frame into constant-acceleration segments.
///
/// Drag opposes the current motion (or the intended motion when stationary).
/// Two events force a phase boundary:
/// - the speed crossing zero under net deceleration: if drag dominates thrust
///   the ship holds at rest for the remainder (otherwise it would jitter
///   around zero), else motion reverses and drag flips sign;
/// - the speed reaching the cap: the ship finishes the frame coasting at the
///   cap.
fn motion_segments(ship: &Ship, delta_time: f64) -> SmallVec<[Segment; 2]> {
    let mut segments: SmallVec<[Segment; 2]> = SmallVec::new();
    let v0 = ship.speed;
    let thrust = ship.thrust;
    let drag = ship.drag;

    if v0 == 0.0 && thrust.abs() <= drag {
        // Drag wins outright: the ship stays parked
        segments.push(Segment {
            duration: delta_time,
            v_start: 0.0,
            accel: 0.0,
        });
        return segments;
    }

    let motion_sign = if v0 != 0.0 {
        sign_or_zero(v0)
    } else {
        sign_or_zero(thrust)
    };
    let accel_1 = thrust - drag * motion_sign;

    let t_zero = if v0 != 0.0 && accel_1 != 0.0 {
        -v0 / accel_1
    } else {
        f64::INFINITY
    };
    if t_zero > 0.0 && t_zero < delta_time {
        // Speed hits zero mid-frame
        segments.push(Segment {
            duration: t_zero,
            v_start: v0,
            accel: accel_1,
        });
        let remaining = delta_time - t_zero;
        if thrust.abs() <= drag {
            segments.push(Segment {
                duration: remaining,
                v_start: 0.0,
                accel: 0.0,
            });
        } else {
            // Motion reverses; drag now opposes the thrust direction
            let accel_2 = thrust - drag * sign_or_zero(thrust);
            segments.push(Segment {
                duration: remaining,
                v_start: 0.0,
                accel: accel_2,
            });
        }
        return segments;
    }

    let unclamped_final = v0 + accel_1 * delta_time;
    if unclamped_final.abs() > ship.max_speed {
        // accel_1 != 0 here: a zero acceleration cannot push |v| past the cap
        let cap = ship.max_speed.copysign(unclamped_final);
        let t_cap = (cap - v0) / accel_1;
        if t_cap <= 0.0 {
            // Already sitting at the cap
            segments.push(Segment {
                duration: delta_time,
                v_start: cap,
                accel: 0.0,
            });
        } else {
            segments.push(Segment {
                duration: t_cap,
                v_start: v0,
                accel: accel_1,
            });
            segments.push(Segment {
                duration: delta_time - t_cap,
                v_start: cap,
                accel: 0.0,
            });
        }
        return segments;
    }

    segments.push(Segment {
        duration: delta_time,
        v_start: v0,
        accel: accel_1,
    });
    segments
}

fn decay_timer(timer: &mut f64, delta_time: f64) {
    if *timer != 0.0 {
        *timer -= delta_time;
        if *timer <= TIMER_EPSILON {
            *timer = 0.0;
        }
    }
}

/// Advance one ship by one frame: clamp commands, integrate the spiral path,
/// record the integration phases, process weapon requests at the new
/// position, and run down the timers.
pub fn update_ship(
    ship: &mut Ship,
    delta_time: f64,
    map_size: (f64, f64),
) -> (Option<Bullet>, Option<Mine>) {
    let was_respawning = ship.is_respawning();

    // Out-of-range commands are clamped, never fatal
    if ship.thrust < ship.thrust_range.0 || ship.thrust > ship.thrust_range.1 {
        warn!(
            ship_id = ship.id,
            thrust = ship.thrust,
            "thrust command outside allowable range, clamping"
        );
        ship.thrust = ship.thrust.clamp(ship.thrust_range.0, ship.thrust_range.1);
    }
    if ship.turn_rate < ship.turn_rate_range.0 || ship.turn_rate > ship.turn_rate_range.1 {
        warn!(
            ship_id = ship.id,
            turn_rate = ship.turn_rate,
            "turn rate command outside allowable range, clamping"
        );
        ship.turn_rate = ship
            .turn_rate
            .clamp(ship.turn_rate_range.0, ship.turn_rate_range.1);
    }

    let theta0 = ship.heading.to_radians();
    let omega = ship.turn_rate.to_radians();
    let segments = motion_segments(ship, delta_time);

    // Forward integration, chaining phase boundaries
    let mut delta = Vec2::ZERO;
    let mut theta = theta0;
    let mut v_end = ship.speed;
    for segment in &segments {
        let (dx, dy) = spiral_integration(
            segment.v_start,
            segment.accel,
            theta,
            omega,
            segment.duration,
        );
        delta += Vec2::new(dx, dy);
        theta += omega * segment.duration;
        v_end = segment.v_start + segment.accel * segment.duration;
    }
    ship.position = (ship.position + delta).rem_euclid(map_size);
    ship.speed = v_end.clamp(-ship.max_speed, ship.max_speed);

    // Record phases newest-first with backward-integrated deltas, for the
    // reverse-time path reconstruction in the collision detector
    ship.integration_phases.clear();
    let mut t_end = delta_time;
    let mut theta_end = theta0 + omega * delta_time;
    for segment in segments.iter().rev() {
        let v_at_end = segment.v_start + segment.accel * segment.duration;
        let start_t = t_end - delta_time;
        let end_t = start_t - segment.duration;
        let (dx, dy) =
            spiral_integration(v_at_end, segment.accel, theta_end, omega, -segment.duration);
        ship.integration_phases.push(IntegrationPhase {
            start_t,
            end_t,
            v0: v_at_end,
            accel: segment.accel,
            theta0: theta_end,
            omega,
            dx,
            dy,
        });
        t_end -= segment.duration;
        theta_end -= omega * segment.duration;
    }

    // Heading advances with the commanded turn rate, wrapped to [0, 360)
    ship.heading = (ship.heading + ship.turn_rate * delta_time).rem_euclid(360.0);
    ship.velocity = Vec2::from_angle(ship.heading.to_radians()) * ship.speed;

    // Weapon requests fire from the post-movement position
    let new_bullet = if ship.fire {
        weapons::fire_bullet(ship)
    } else {
        None
    };
    let new_mine = if ship.drop_mine {
        weapons::deploy_mine(ship)
    } else {
        None
    };

    decay_timer(&mut ship.respawn_time_left, delta_time);
    decay_timer(&mut ship.fire_cooldown, delta_time);
    decay_timer(&mut ship.mine_cooldown, delta_time);
    ship.was_respawning_until_this_frame = was_respawning && !ship.is_respawning();

    (new_bullet, new_mine)
}
