//! Run configuration for the ascent simulation.
//!
//! A [`Params`] value is an immutable snapshot: a run borrows it, and
//! optimizer trials clone it. Every section falls back to the reference
//! two-stage kerosene/LOx vehicle launched from Kodiak when a field is
//! missing from the TOML source.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{lbf, lbm, psi, G0, LITER_TO_M3, NYLON_DENSITY};
use crate::control::environment::{Atmosphere, StandardAtmosphere};
use crate::errors::SimulationError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub simulation: SimulationParams,
    pub launch_site: LaunchSite,
    pub target: TargetParams,
    pub trajectory: TrajectoryParams,
    pub vehicle: VehicleParams,
    pub engine: EngineParams,
    pub tank: TankParams,
    pub nitrogen: NitrogenParams,
    pub optimizer: OptimizerParams,
    pub payload_sizing: PayloadSizingParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Fixed integration step [s].
    pub timestep: f64,
    /// Hard cap on elapsed flight time for any run [s].
    pub max_duration: f64,
    /// Time on the pad before the first integration step [s].
    pub launch_hold: f64,
    pub recover: bool,
    pub circularize: bool,
    /// Cap on the circularization burn once ignited [s].
    pub max_burn_duration: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            timestep: 0.1,
            max_duration: 7200.0,
            launch_hold: 1.0,
            recover: false,
            circularize: false,
            max_burn_duration: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSite {
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Metres above the reference sphere.
    pub altitude: f64,
    /// Degrees clockwise from north.
    pub azimuth: f64,
}

impl Default for LaunchSite {
    fn default() -> Self {
        LaunchSite {
            latitude: 57.43498194,
            longitude: -152.34169916,
            altitude: 30.0,
            azimuth: 190.0,
        }
    }
}

/// Target altitudes in metres.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    pub injection: f64,
    pub perigee: f64,
    pub apogee: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        TargetParams {
            injection: 130_000.0,
            perigee: 500_000.0,
            apogee: 500_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryParams {
    pub pitchover_start: f64,
    pub pitchover_end: f64,
    /// Total attitude rotation over the pitchover window [deg].
    pub pitchover_angle: f64,
    /// Unpowered coast after each stage separation [s].
    pub coast_time: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        TrajectoryParams {
            pitchover_start: 15.0,
            pitchover_end: 20.0,
            pitchover_angle: 1.0,
            coast_time: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    pub diameter: f64,
    pub payload: f64,
    pub drag_coefficient: f64,
    pub booster_drag_coefficient: f64,
    pub interstage_mass: f64,
    /// Ballute, parachute and drogues carried by a recoverable first stage.
    pub recovery_mass: f64,
    pub fairing: FairingParams,
    pub stages: Vec<StageParams>,
}

impl Default for VehicleParams {
    fn default() -> Self {
        VehicleParams {
            diameter: 1.05,
            payload: 124.504,
            drag_coefficient: 0.26,
            booster_drag_coefficient: 0.5,
            interstage_mass: 5.0,
            recovery_mass: 5.0 + parachute_mass() + 2.0,
            fairing: FairingParams::default(),
            stages: vec![
                StageParams {
                    mass_ratio: 16.485540238212664,
                    engines: 4,
                    throttle: 1.0,
                    cores: 1,
                    helium: HeliumParams {
                        tanks: 2,
                        pressure: psi(4000.0),
                        volume: 33.8 * LITER_TO_M3,
                        tank_mass: lbm(29.5),
                    },
                },
                StageParams {
                    mass_ratio: 6.494060087323651,
                    engines: 1,
                    throttle: 0.7,
                    cores: 1,
                    helium: HeliumParams::default(),
                },
            ],
        }
    }
}

// nylon canopy sized to land 333 kg at 8 m/s through sea-level air
pub fn parachute_mass() -> f64 {
    let weight = 333.0 * G0;
    let drag_coefficient = 1.75;
    let descent_speed: f64 = 8.0;
    let area = 2.0 * weight
        / (StandardAtmosphere.density(0.0) * drag_coefficient * descent_speed.powi(2));
    area * 7.62e-5 * NYLON_DENSITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FairingParams {
    pub mass: f64,
    pub diameter: f64,
    pub length: f64,
    pub jettison_altitude: f64,
    pub drag_coefficient: f64,
}

impl Default for FairingParams {
    fn default() -> Self {
        FairingParams {
            mass: 30.0,
            diameter: 1.05,
            length: 1.7,
            jettison_altitude: 100_000.0,
            drag_coefficient: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageParams {
    pub mass_ratio: f64,
    /// Engines per core.
    pub engines: usize,
    pub throttle: f64,
    pub cores: usize,
    #[serde(default)]
    pub helium: HeliumParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeliumParams {
    pub tanks: usize,
    /// Pa.
    pub pressure: f64,
    /// m³.
    pub volume: f64,
    /// kg, per bottle.
    pub tank_mass: f64,
}

impl Default for HeliumParams {
    fn default() -> Self {
        HeliumParams {
            tanks: 1,
            pressure: psi(5000.0),
            volume: 10.0 * LITER_TO_M3,
            tank_mass: lbm(12.0),
        }
    }
}

/// Propellant and nitrogen quantities for one engine event, kg per engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consumables {
    pub fuel: f64,
    pub oxidizer: f64,
    pub nitrogen: f64,
}

impl Consumables {
    pub fn new(fuel: f64, oxidizer: f64, nitrogen: f64) -> Self {
        Consumables {
            fuel,
            oxidizer,
            nitrogen,
        }
    }

    pub fn propellant(&self) -> f64 {
        self.fuel + self.oxidizer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub mass: f64,
    pub height: f64,
    /// N.
    pub thrust_sl: f64,
    /// N.
    pub thrust_vac: f64,
    pub isp_sl: f64,
    pub isp_vac: f64,
    /// Total propellant flow per engine [kg/s].
    pub mass_flow: f64,
    pub of_ratio: f64,
    /// Nitrogen purge per engine while firing [kg/s].
    pub purge_rate: f64,
    /// Tank pressure at engine start [Pa].
    pub start_pressure: f64,
    pub chill: Consumables,
    pub start: Consumables,
    pub shutdown: Consumables,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            mass: lbm(60.9),
            height: 27.5 * crate::constants::INCH_TO_M,
            thrust_sl: lbf(5000.0),
            thrust_vac: lbf(5890.0),
            isp_sl: 270.0,
            isp_vac: 318.0,
            mass_flow: lbm(18.522),
            of_ratio: 2.17,
            purge_rate: lbm(38.0) / 3600.0,
            start_pressure: psi(70.0),
            chill: Consumables::new(lbm(0.0), lbm(7.0), lbm(0.55)),
            start: Consumables::new(lbm(6.0), lbm(13.0), lbm(0.22)),
            shutdown: Consumables::new(lbm(6.0), lbm(20.0), lbm(1.65)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TankParams {
    /// Height of each ellipsoidal end cap [m].
    pub caps_height: f64,
    /// Wall material density [kg/m³].
    pub material_density: f64,
    /// Wall material allowable stress [Pa].
    pub material_strength: f64,
    pub weld_efficiency: f64,
    pub fuel_density: f64,
    pub oxidizer_density: f64,
    pub fuel_fill: f64,
    pub oxidizer_fill: f64,
    pub piping_factor: f64,
    pub expulsion_efficiency: f64,
}

impl Default for TankParams {
    fn default() -> Self {
        TankParams {
            caps_height: 0.32,
            material_density: 2650.0,
            material_strength: 125e6,
            weld_efficiency: 0.9,
            fuel_density: 810.0,
            oxidizer_density: 1141.0,
            fuel_fill: 0.95,
            oxidizer_fill: 0.99,
            piping_factor: 1.05,
            expulsion_efficiency: 0.991,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bottle {
    /// m³.
    pub volume: f64,
    /// kg.
    pub mass: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NitrogenParams {
    /// Pa.
    pub storage_pressure: f64,
    pub usable_fraction: f64,
    /// Purge time the tank is sized for [s].
    pub purge_duration: f64,
    pub multi_engine_bottle: Bottle,
    pub single_engine_bottle: Bottle,
}

impl Default for NitrogenParams {
    fn default() -> Self {
        NitrogenParams {
            storage_pressure: psi(5000.0),
            usable_fraction: 0.5,
            purge_duration: 180.0,
            multi_engine_bottle: Bottle {
                volume: 19.0 * LITER_TO_M3,
                mass: lbm(26.0),
            },
            single_engine_bottle: Bottle {
                volume: 10.0 * LITER_TO_M3,
                mass: lbm(12.0),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    pub gain: f64,
    pub integral_gain: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Pitchover angle bounds [deg].
    pub min_angle: f64,
    pub max_angle: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        OptimizerParams {
            gain: 0.1,
            integral_gain: 0.01,
            max_iterations: 50,
            tolerance: std::f64::consts::FRAC_PI_2 * 0.001,
            min_angle: 0.0,
            max_angle: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSizingParams {
    pub gain: f64,
    pub integral_gain: f64,
    pub initial_payload: f64,
    pub max_iterations: usize,
}

impl Default for PayloadSizingParams {
    fn default() -> Self {
        PayloadSizingParams {
            gain: 0.2,
            integral_gain: 0.001,
            initial_payload: 100.0,
            max_iterations: 40,
        }
    }
}

fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfiguration(message.into())
}

fn check_fraction(name: &str, value: f64) -> Result<(), SimulationError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be in (0, 1], got {value}")))
    }
}

impl Params {
    pub fn from_toml_str(source: &str) -> Result<Self, SimulationError> {
        let params: Params = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn stage_count(&self) -> usize {
        self.vehicle.stages.len()
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.vehicle.stages.is_empty() {
            return Err(invalid("vehicle needs at least one stage"));
        }
        let simulation = &self.simulation;
        for (name, value) in [
            ("timestep", simulation.timestep),
            ("max_duration", simulation.max_duration),
            ("max_burn_duration", simulation.max_burn_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive and finite, got {value}")));
            }
        }
        if !simulation.launch_hold.is_finite() || simulation.launch_hold < 0.0 {
            return Err(invalid(format!(
                "launch_hold must be non-negative and finite, got {}",
                simulation.launch_hold
            )));
        }
        if self.trajectory.pitchover_end <= self.trajectory.pitchover_start {
            return Err(invalid("pitchover window must end after it starts"));
        }
        if self.vehicle.diameter <= 0.0 || self.vehicle.fairing.diameter <= 0.0 {
            return Err(invalid("diameters must be positive"));
        }
        if self.vehicle.payload < 0.0 {
            return Err(invalid("payload cannot be negative"));
        }
        if self.engine.mass_flow <= 0.0 || self.engine.of_ratio <= 0.0 {
            return Err(invalid("engine flow and O/F ratio must be positive"));
        }

        for (i, stage) in self.vehicle.stages.iter().enumerate() {
            if stage.mass_ratio <= 1.0 {
                return Err(invalid(format!(
                    "stage {i} mass ratio must exceed 1, got {}",
                    stage.mass_ratio
                )));
            }
            if stage.engines == 0 || stage.cores == 0 {
                return Err(invalid(format!("stage {i} needs engines and cores")));
            }
            check_fraction(&format!("stage {i} throttle"), stage.throttle)?;
        }

        check_fraction("tank.fuel_fill", self.tank.fuel_fill)?;
        check_fraction("tank.oxidizer_fill", self.tank.oxidizer_fill)?;
        check_fraction("tank.expulsion_efficiency", self.tank.expulsion_efficiency)?;
        check_fraction("tank.weld_efficiency", self.tank.weld_efficiency)?;
        check_fraction("nitrogen.usable_fraction", self.nitrogen.usable_fraction)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_params_are_valid() {
        let params = Params::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.stage_count(), 2);
        assert_eq!(params.vehicle.stages[0].engines, 4);
    }

    #[test]
    fn test_parachute_mass_from_canopy_area() {
        assert_relative_eq!(parachute_mass(), 4.14, epsilon = 0.05);
        let vehicle = VehicleParams::default();
        assert_relative_eq!(vehicle.recovery_mass, 7.0 + parachute_mass());
        assert_eq!(vehicle.interstage_mass, 5.0);
    }

    #[test]
    fn test_non_finite_durations_are_rejected() {
        let mut params = Params::default();
        params.simulation.max_duration = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.simulation.launch_hold = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.simulation.timestep = f64::INFINITY;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.simulation.launch_hold = 0.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let params = Params::from_toml_str(
            r#"
            [simulation]
            timestep = 0.5

            [target]
            apogee = 400000.0
            "#,
        )
        .unwrap();

        assert_relative_eq!(params.simulation.timestep, 0.5);
        assert_relative_eq!(params.target.apogee, 400_000.0);
        assert_relative_eq!(params.target.injection, 130_000.0);
        assert_eq!(params.stage_count(), 2);
    }

    #[test]
    fn test_stage_list_from_toml() {
        let params = Params::from_toml_str(
            r#"
            [[vehicle.stages]]
            mass_ratio = 8.0
            engines = 2
            throttle = 0.9
            cores = 3
            "#,
        )
        .unwrap();

        assert_eq!(params.stage_count(), 1);
        assert_eq!(params.vehicle.stages[0].cores, 3);
        assert_eq!(params.vehicle.stages[0].helium.tanks, 1);
    }

    #[test]
    fn test_rejects_mass_ratio_at_unity() {
        let mut params = Params::default();
        params.vehicle.stages[1].mass_ratio = 1.0;
        assert!(matches!(
            params.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_bad_window_and_throttle() {
        let mut params = Params::default();
        params.trajectory.pitchover_end = params.trajectory.pitchover_start;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.vehicle.stages[0].throttle = 1.2;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.simulation.timestep = 0.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let result = Params::from_toml_str("[simulation\ntimestep = ");
        assert!(matches!(result, Err(SimulationError::Toml(_))));
    }
}
