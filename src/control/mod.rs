pub mod environment;
pub mod flight;
pub mod guidance;
pub mod launch_stages;
pub mod mass_budget;
pub mod payload;
pub mod propulsion;
pub mod tanks;
pub mod vehicle;
