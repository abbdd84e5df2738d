/// Simulation timing constants
pub mod sim {
    /// Default fixed update rate in Hz
    pub const DEFAULT_FREQUENCY: f64 = 30.0;
    /// Countdown timers are clamped to exactly zero below this threshold to
    /// avoid float drift accumulating across frames
    pub const TIMER_EPSILON: f64 = 1e-12;
}

/// Ship physical model constants
pub mod ship {
    /// Thrust command range (u/s^2)
    pub const THRUST_RANGE: (f64, f64) = (-480.0, 480.0);
    /// Turn rate command range (degrees per second)
    pub const TURN_RATE_RANGE: (f64, f64) = (-180.0, 180.0);
    /// Speed cap, applies in both directions (u/s)
    pub const MAX_SPEED: f64 = 240.0;
    /// Drag deceleration opposing motion (u/s^2)
    pub const DRAG: f64 = 80.0;
    /// Collision radius (u)
    pub const RADIUS: f64 = 20.0;
    /// Ship mass (kg); the largest asteroid is roughly 800 kg
    pub const MASS: f64 = 300.0;
    /// Invulnerability window granted on spawn/respawn (seconds)
    pub const RESPAWN_TIME: f64 = 3.0;
    /// Minimum time between bullets (seconds)
    pub const FIRE_TIME: f64 = 1.0 / 10.0;
    /// Minimum time between mine deployments (seconds)
    pub const MINE_DEPLOY_TIME: f64 = 1.0;
}

/// Bullet constants
pub mod bullet {
    /// Muzzle speed along the firing heading (u/s)
    pub const SPEED: f64 = 800.0;
    /// Length of the trailing segment used for swept collision tests (u)
    pub const LENGTH: f64 = 12.0;
    /// Bullet mass (kg)
    pub const MASS: f64 = 1.0;
}

/// Mine constants
pub mod mine {
    /// Countdown from deployment to detonation (seconds)
    pub const FUSE_TIME: f64 = 3.0;
    /// Duration of the visible detonation effect (seconds)
    pub const DETONATION_TIME: f64 = 0.25;
    /// Mine mass (kg)
    pub const MASS: f64 = 25.0;
    /// Body radius (u)
    pub const RADIUS: f64 = 12.0;
    /// Radius of effect of the blast (u)
    pub const BLAST_RADIUS: f64 = 150.0;
    /// Peak blast pressure at the mine position
    pub const BLAST_PRESSURE: f64 = 2000.0;
}

/// Asteroid constants
pub mod asteroid {
    /// Valid size classes (inclusive)
    pub const MIN_SIZE: u8 = 1;
    pub const MAX_SIZE: u8 = 4;
    /// Collision radius per size class unit (u)
    pub const RADIUS_PER_SIZE: f64 = 8.0;
    /// Children spawned when a non-terminal asteroid is destroyed
    pub const NUM_CHILDREN: usize = 3;
    /// Half-spread of the split fan around the post-impact velocity (degrees)
    pub const SPLIT_ANGLE_BOUND: f64 = 30.0;
    /// Base speed used to scale random spawn speeds (u/s)
    pub const BASE_SPEED: f64 = 60.0;
    /// Cosmetic spin rate range for display (degrees per second)
    pub const SPIN_RANGE: (f64, f64) = (-100.0, 100.0);
}

/// Maximum random spawn speed for an asteroid of the given size class.
/// Smaller rocks drift faster: 2x base for size 4 up to 2.75x for size 1.
pub fn asteroid_max_speed(size: u8) -> f64 {
    let speed_scaler = 2.0 + (4.0 - size as f64) / 4.0;
    asteroid::BASE_SPEED * speed_scaler
}

/// Collision radius for an asteroid of the given size class
pub fn asteroid_radius(size: u8) -> f64 {
    size as f64 * asteroid::RADIUS_PER_SIZE
}

/// Mass for an asteroid of the given size class (quarter-disc density model)
pub fn asteroid_mass(size: u8) -> f64 {
    let radius = asteroid_radius(size);
    0.25 * std::f64::consts::PI * radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asteroid_radius_scales_with_size() {
        assert_eq!(asteroid_radius(1), 8.0);
        assert_eq!(asteroid_radius(4), 32.0);
    }

    #[test]
    fn test_asteroid_mass_follows_radius() {
        let expected = 0.25 * std::f64::consts::PI * 32.0 * 32.0;
        assert!((asteroid_mass(4) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_asteroid_max_speed_scaling() {
        assert!((asteroid_max_speed(4) - 120.0).abs() < 1e-12);
        assert!((asteroid_max_speed(1) - 165.0).abs() < 1e-12);
    }
}
