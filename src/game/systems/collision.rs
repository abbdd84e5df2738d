//! Continuous (swept) collision detection.
//!
//! All checks answer the same question: did these two objects touch at any
//! instant during the last frame, i.e. for some `t` in `[-delta_time, 0]`?
//! Working backward from the post-update state avoids tunneling at any frame
//! rate. Wrapping is not considered: that would only add false negatives in
//! the rare frame where a pair straddles the seam, never false positives.
//!
//! Bullets sweep a parallelogram (head and tail translated by one frame of
//! relative velocity); ships reconstruct their exact spiral sub-frame path
//! from the integration phases recorded during the update.

use crate::game::state::{Asteroid, IntegrationPhase, Ship};
use crate::util::math::{
    find_first_leq_zero, project_point_onto_segment_t, solve_quadratic, spiral_integration,
};
use crate::util::vec2::Vec2;

/// Squared distance from the origin to the closest point of segment
/// (x1,y1)-(x2,y2), clamping the projection onto the segment. A degenerate
/// segment collapses to a point distance.
fn project_origin_onto_segment_dist_sq(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-12 {
        return x1 * x1 + y1 * y1;
    }

    let mut t = -(x1 * dx + y1 * dy) / len_sq;
    if t > 1.0 {
        t = 1.0;
    } else if t < 0.0 {
        t = 0.0;
    }

    let px = x1 + t * dx;
    let py = y1 + t * dy;
    px * px + py * py
}

/// Whether a moving segment (a bullet's head-to-tail) and a moving circle
/// collided within the past `delta_time` seconds.
///
/// In the circle's rest frame the segment sweeps a parallelogram, so this
/// reduces to a stationary circle-vs-parallelogram test: a fast AABB
/// rejection, then clamped projections of the circle center onto the four
/// edges. Full containment of the circle inside the parallelogram is
/// impossible here because the segment is shorter than any circle diameter
/// in play.
#[allow(clippy::too_many_arguments)]
pub fn circle_line_collision_continuous(
    ax0: f64,
    ay0: f64,
    bx0: f64,
    by0: f64,
    line_vel_x: f64,
    line_vel_y: f64,
    circle_x: f64,
    circle_y: f64,
    circle_vel_x: f64,
    circle_vel_y: f64,
    circle_radius: f64,
    delta_time: f64,
) -> bool {
    // Bounding box of everywhere the segment has been over the frame,
    // expanded by the circle radius. Unrolled: this is the hottest check in
    // the whole simulation.
    let rel_frame_vel_x = (line_vel_x - circle_vel_x) * delta_time;
    let rel_frame_vel_y = (line_vel_y - circle_vel_y) * delta_time;

    let (min_x, max_x) = if ax0 < bx0 {
        if rel_frame_vel_x >= 0.0 {
            (ax0 - rel_frame_vel_x, bx0)
        } else {
            (ax0, bx0 - rel_frame_vel_x)
        }
    } else if rel_frame_vel_x >= 0.0 {
        (bx0 - rel_frame_vel_x, ax0)
    } else {
        (bx0, ax0 - rel_frame_vel_x)
    };

    let (min_y, max_y) = if ay0 < by0 {
        if rel_frame_vel_y >= 0.0 {
            (ay0 - rel_frame_vel_y, by0)
        } else {
            (ay0, by0 - rel_frame_vel_y)
        }
    } else if rel_frame_vel_y >= 0.0 {
        (by0 - rel_frame_vel_y, ay0)
    } else {
        (by0, ay0 - rel_frame_vel_y)
    };

    if circle_x + circle_radius < min_x
        || circle_x - circle_radius > max_x
        || circle_y + circle_radius < min_y
        || circle_y - circle_radius > max_y
    {
        return false;
    }

    // Circle rest frame, circle at the origin. a/b are the segment now,
    // c/d are the segment one frame ago.
    let ax = ax0 - circle_x;
    let ay = ay0 - circle_y;
    let bx = bx0 - circle_x;
    let by = by0 - circle_y;
    let vx = rel_frame_vel_x;
    let vy = rel_frame_vel_y;
    let cx = ax - vx;
    let cy = ay - vy;
    let dx = bx - vx;
    let dy = by - vy;

    let rad_sq = circle_radius * circle_radius;

    project_origin_onto_segment_dist_sq(ax, ay, bx, by) <= rad_sq
        || project_origin_onto_segment_dist_sq(cx, cy, dx, dy) <= rad_sq
        || project_origin_onto_segment_dist_sq(ax, ay, cx, cy) <= rad_sq
        || project_origin_onto_segment_dist_sq(bx, by, dx, dy) <= rad_sq
}

/// The time interval `[t0, t1]` over which a moving segment (A, B) and a
/// moving circle intersect, or `(NaN, NaN)` if they never do.
///
/// Solved in the circle's rest frame: two quadratics give the windows where
/// each endpoint individually lies on the circle boundary, and a separate
/// tangency solve along the sweep normal catches broadside contact by the
/// segment interior, accepted only when the contact footprint projects into
/// [0, 1] along the segment.
#[allow(clippy::too_many_arguments)]
pub fn collision_time_interval(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    vx: f64,
    vy: f64,
    cx: f64,
    cy: f64,
    cvx: f64,
    cvy: f64,
    r: f64,
) -> (f64, f64) {
    let r_sq = r * r;

    // Relative velocity: circle treated as stationary at the origin
    let rvx = vx - cvx;
    let rvy = vy - cvy;

    let a0x = ax - cx;
    let a0y = ay - cy;
    let b0x = bx - cx;
    let b0y = by - cy;

    let mut seg_dx = b0x - a0x;
    let mut seg_dy = b0y - a0y;
    let seg_len = (seg_dx * seg_dx + seg_dy * seg_dy).sqrt();
    if seg_len == 0.0 {
        // Degenerate segment, reduce to point vs circle
        seg_dx = 0.0;
        seg_dy = 0.0;
    }

    // Endpoint (corner) contact windows
    let k0 = a0x * a0x + a0y * a0y - r_sq;
    let k1 = 2.0 * (rvx * a0x + rvy * a0y);
    let k2 = rvx * rvx + rvy * rvy;
    let (t0_a, t1_a) = solve_quadratic(k2, k1, k0);

    let q0 = b0x * b0x + b0y * b0y - r_sq;
    let q1 = 2.0 * (rvx * b0x + rvy * b0y);
    let (t0_b, t1_b) = solve_quadratic(k2, q1, q0);

    if t0_a.is_nan() && t0_b.is_nan() {
        return (f64::NAN, f64::NAN);
    }

    let mut t0 = f64::INFINITY;
    if !t0_a.is_nan() {
        t0 = t0_a;
    }
    if !t0_b.is_nan() && t0_b < t0 {
        t0 = t0_b;
    }

    let mut t1 = f64::NEG_INFINITY;
    if !t1_a.is_nan() {
        t1 = t1_a;
    }
    if !t1_b.is_nan() && t1_b > t1 {
        t1 = t1_b;
    }

    // Broadside contact: project onto the unit normal of the segment
    let (mut nx, mut ny) = if seg_len > 0.0 {
        (seg_dy / seg_len, -seg_dx / seg_len)
    } else {
        (0.0, 0.0)
    };

    let mut v_proj_n = nx * rvx + ny * rvy;
    if v_proj_n < 0.0 {
        nx = -nx;
        ny = -ny;
        v_proj_n = -v_proj_n;
    }

    // Distance from A to the circle center along the normal axis
    let ast_proj_n = -a0x * nx - a0y * ny;

    let t_center = if v_proj_n != 0.0 {
        ast_proj_n / v_proj_n
    } else {
        f64::INFINITY
    };
    let t_radius = if v_proj_n != 0.0 {
        r / v_proj_n
    } else {
        f64::INFINITY
    };

    let t0_mid = t_center - t_radius;
    let t1_mid = t_center + t_radius;

    // Accept a broadside window edge only if the contact lands on the
    // segment interior at that instant
    let a0x_t0 = a0x + rvx * t0_mid;
    let a0y_t0 = a0y + rvy * t0_mid;
    let b0x_t0 = b0x + rvx * t0_mid;
    let b0y_t0 = b0y + rvy * t0_mid;
    let t_proj_0 = project_point_onto_segment_t(a0x_t0, a0y_t0, b0x_t0, b0y_t0, 0.0, 0.0);

    let a0x_t1 = a0x + rvx * t1_mid;
    let a0y_t1 = a0y + rvy * t1_mid;
    let b0x_t1 = b0x + rvx * t1_mid;
    let b0y_t1 = b0y + rvy * t1_mid;
    let t_proj_1 = project_point_onto_segment_t(a0x_t1, a0y_t1, b0x_t1, b0y_t1, 0.0, 0.0);

    if (0.0..=1.0).contains(&t_proj_0) {
        // Interior contact necessarily starts before either endpoint's
        t0 = t0_mid;
    }
    if (0.0..=1.0).contains(&t_proj_1) {
        t1 = t1_mid;
    }

    if !(t0.is_finite() && t1.is_finite()) {
        return (f64::NAN, f64::NAN);
    }

    (t0, t1)
}

/// Reconstruct a ship's position, velocity, and acceleration at time `t`
/// (`t <= 0`, relative to now) by walking the recorded integration phases
/// backward from the current position.
pub fn ship_state_at(
    position: Vec2,
    phases: &[IntegrationPhase],
    t: f64,
) -> (Vec2, Vec2, Vec2) {
    let mut delta = Vec2::ZERO;
    let mut velocity = Vec2::ZERO;
    let mut accel = Vec2::ZERO;

    for phase in phases {
        debug_assert!(phase.end_t - phase.start_t <= 0.0);
        if phase.end_t - 1e-7 <= t && t <= phase.start_t + 1e-7 {
            // t falls inside this phase: integrate the partial interval
            let tau = t - phase.start_t;
            let (dx, dy) =
                spiral_integration(phase.v0, phase.accel, phase.theta0, phase.omega, tau);
            delta += Vec2::new(dx, dy);

            let speed = phase.v0 + phase.accel * tau;
            let theta = phase.theta0 + phase.omega * tau;
            let heading = Vec2::from_angle(theta);
            let normal = Vec2::new(-heading.y, heading.x);
            velocity = heading * speed;
            accel = heading * phase.accel + normal * (speed * phase.omega);
            break;
        }
        // The whole phase lies between now and t: take the stored integral
        debug_assert!(t <= phase.end_t);
        delta += Vec2::new(phase.dx, phase.dy);
    }

    (position + delta, velocity, accel)
}

/// Oracle for the squared separation (minus the contact distance squared)
/// between a phase-reconstructed ship and a constant-velocity body, with
/// analytic first and second time derivatives for the Newton root-finder.
fn separation_oracle<'a>(
    ship_position: Vec2,
    phases: &'a [IntegrationPhase],
    other_position: Vec2,
    other_velocity: Vec2,
    rad_sum: f64,
) -> impl Fn(f64) -> (f64, f64, f64) + 'a {
    move |t: f64| {
        let other_at = other_position + other_velocity * t;
        let (ship_at, ship_vel, ship_acc) = ship_state_at(ship_position, phases, t);
        let d = other_at - ship_at;
        let dv = other_velocity - ship_vel;
        let value = d.length_sq() - rad_sum * rad_sum;
        let d1 = 2.0 * d.dot(dv);
        let d2 = 2.0 * (dv.length_sq() - d.dot(ship_acc));
        (value, d1, d2)
    }
}

/// Earliest time in `[-delta_time, 0]` at which a ship and an asteroid were
/// in contact, or NaN if they never were.
pub fn ship_asteroid_continuous_collision_time(
    ship: &Ship,
    asteroid: &Asteroid,
    delta_time: f64,
) -> f64 {
    // Early rejection: even flat-out toward each other they couldn't have
    // closed the gap within the window
    let combined_vel = ship.speed.abs() + asteroid.speed.abs();
    let rad_sum = ship.radius + asteroid.radius;
    let separation = ship.position.distance_to(asteroid.position) - rad_sum;
    if separation > delta_time * combined_vel {
        return f64::NAN;
    }

    let oracle = separation_oracle(
        ship.position,
        &ship.integration_phases,
        asteroid.position,
        asteroid.velocity,
        rad_sum,
    );
    find_first_leq_zero(oracle, -delta_time, 0.0)
}

/// Earliest time in `[-delta_time, 0]` at which two ships were in contact,
/// or NaN if they never were. Symmetric in its arguments.
pub fn ship_ship_continuous_collision_time(
    ship1: &Ship,
    ship2: &Ship,
    delta_time: f64,
) -> f64 {
    let combined_vel = ship1.speed.abs() + ship2.speed.abs();
    let rad_sum = ship1.radius + ship2.radius;
    let separation = ship1.position.distance_to(ship2.position) - rad_sum;
    if separation > delta_time * combined_vel {
        return f64::NAN;
    }

    let f = |t: f64| {
        let (p1, v1, a1) = ship_state_at(ship1.position, &ship1.integration_phases, t);
        let (p2, v2, a2) = ship_state_at(ship2.position, &ship2.integration_phases, t);
        let d = p2 - p1;
        let dv = v2 - v1;
        let da = a2 - a1;
        let value = d.length_sq() - rad_sum * rad_sum;
        let d1 = 2.0 * d.dot(dv);
        let d2 = 2.0 * (dv.length_sq() + d.dot(da));
        (value, d1, d2)
    };
    find_first_leq_zero(f, -delta_time, 0.0)
}

/// Point-in-time overlap test, used instead of the sweep on the frame where
/// a ship's invulnerability just ran out (a sweep could retroactively kill it
/// with something that overlapped while it was still immune).
pub fn circles_overlap(p1: Vec2, r1: f64, p2: Vec2, r2: f64) -> bool {
    let rad_sum = r1 + r2;
    p1.distance_sq_to(p2) <= rad_sum * rad_sum
}
