use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Negative {commodity} mass in stage {stage}: {mass:.3} kg")]
    NegativePropellant {
        stage: usize,
        commodity: &'static str,
        mass: f64,
    },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
