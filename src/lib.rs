pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use config::Params;
pub use constants::*;
pub use control::environment::{Atmosphere, Earth, Environment, Planet, StandardAtmosphere, Vacuum};
pub use control::flight::{FlightPhase, Simulation, SimulationOutcome};
pub use control::guidance::{PitchoverOptimizer, PitchoverReport};
pub use control::launch_stages::Stage;
pub use control::mass_budget::{Convergence, MassBudget, MassBudgetSolver};
pub use control::payload::{size_payload, PayloadReport};
pub use control::vehicle::Vehicle;

// Re-export commonly used items from trajectory_system
pub use trajectory_system::orbit::Orbit;

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::{FlightRecorder, Telemetry};

// Re-export commonly used utilities
pub use utils::vector3d::Vector3D;
