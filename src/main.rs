use tracing::{info, Level};

use asterion::game::snapshot::{GameSnapshot, OwnShipSnapshot};
use asterion::game::state::ShipId;
use asterion::{ControlAction, Game, GameSettings, Scenario, ShipController};

/// Demo policy: spin slowly and keep the trigger held
struct TurretController {
    ship_id: Option<ShipId>,
}

impl ShipController for TurretController {
    fn name(&self) -> &str {
        "turret"
    }

    fn assign_ship_id(&mut self, ship_id: ShipId) {
        self.ship_id = Some(ship_id);
    }

    fn ship_id(&self) -> Option<ShipId> {
        self.ship_id
    }

    fn actions(&mut self, _own_ship: &OwnShipSnapshot, _game_state: &GameSnapshot) -> ControlAction {
        ControlAction {
            thrust: 0.0,
            turn_rate: 24.0,
            fire: true,
            drop_mine: false,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Asterion v{}", env!("CARGO_PKG_VERSION"));

    let settings = GameSettings::load_or_default();
    settings.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: {} Hz, realtime_multiplier={}, frame_skip={}",
        settings.frequency, settings.realtime_multiplier, settings.frame_skip
    );

    let mut scenario = Scenario::new("demo", 5);
    scenario.seed = Some(2024);
    scenario.time_limit = 60.0;

    let mut controllers: Vec<Box<dyn ShipController>> =
        vec![Box::new(TurretController { ship_id: None })];

    let game = Game::new(settings);
    let (score, perf) = game.run(&scenario, &mut controllers)?;

    info!(
        "Run finished: {:?} after {:.2} s simulated",
        score.stop_reason, score.sim_time
    );
    for team in &score.teams {
        info!(
            "{}: asteroids_hit={} accuracy={:.1}% deaths={} lives_remaining={}",
            team.team_name,
            team.asteroids_hit,
            team.accuracy() * 100.0,
            team.deaths,
            team.lives_remaining
        );
    }

    println!("{}", serde_json::to_string_pretty(&score)?);
    if perf.total_frame_time > 0.0 {
        println!("{}", serde_json::to_string_pretty(&perf)?);
    }

    Ok(())
}
