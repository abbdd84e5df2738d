pub mod constants;
pub mod controller;
pub mod game_loop;
pub mod graphics;
pub mod match_result;
pub mod performance;
pub mod scenario;
pub mod score;
pub mod snapshot;
pub mod state;
pub mod systems;
