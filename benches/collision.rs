use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use asterion::game::state::{Asteroid, Ship};
use asterion::game::systems::collision::{
    circle_line_collision_continuous, collision_time_interval,
    ship_asteroid_continuous_collision_time,
};
use asterion::game::systems::physics::update_ship;
use asterion::util::vec2::Vec2;

const DT: f64 = 1.0 / 30.0;

fn bench_bullet_sweep(c: &mut Criterion) {
    // The most called check in the simulation: one bullet against one rock
    c.bench_function("circle_line_collision_continuous", |b| {
        b.iter(|| {
            circle_line_collision_continuous(
                black_box(540.0),
                black_box(400.0),
                black_box(528.0),
                black_box(400.0),
                black_box(800.0),
                black_box(0.0),
                black_box(500.0),
                black_box(405.0),
                black_box(-60.0),
                black_box(30.0),
                black_box(16.0),
                black_box(DT),
            )
        })
    });

    c.bench_function("collision_time_interval", |b| {
        b.iter(|| {
            collision_time_interval(
                black_box(540.0),
                black_box(400.0),
                black_box(528.0),
                black_box(400.0),
                black_box(800.0),
                black_box(0.0),
                black_box(520.0),
                black_box(402.0),
                black_box(-60.0),
                black_box(30.0),
                black_box(16.0),
            )
        })
    });
}

fn bench_ship_sweep(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let mut ship = Ship::new(1, Vec2::new(500.0, 400.0), 30.0, 3, 1, None, -1, 0);
    ship.speed = 180.0;
    ship.thrust = 300.0;
    ship.turn_rate = 90.0;
    update_ship(&mut ship, DT, (1000.0, 800.0));
    let asteroid = Asteroid::new(Vec2::new(520.0, 410.0), Some(80.0), Some(210.0), 3, &mut rng);

    c.bench_function("ship_asteroid_continuous_collision_time", |b| {
        b.iter(|| {
            ship_asteroid_continuous_collision_time(
                black_box(&ship),
                black_box(&asteroid),
                black_box(DT),
            )
        })
    });
}

criterion_group!(benches, bench_bullet_sweep, bench_ship_sweep);
criterion_main!(benches);
