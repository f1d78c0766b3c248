use std::f64::consts::PI;

use tracing::info;

use crate::config::{FairingParams, Params};
use crate::constants::G0;
use crate::control::environment::{Environment, Planet};
use crate::control::launch_stages::Stage;
use crate::control::propulsion::{delta_v, Engine};
use crate::errors::SimulationError;
use crate::trajectory_system::aerodynamics::Aerodynamics;
use crate::trajectory_system::kinematics::Kinematics;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    Attached,
    Descending,
    Landed,
}

pub trait SimulatedBody {
    fn position(&self) -> Vector3D;
    fn velocity(&self) -> Vector3D;
    fn velocity_relative(&self) -> Vector3D;
    fn drag_area(&self) -> f64;
    fn drag_coefficient(&self) -> f64;
    fn mass(&self) -> f64;

    fn altitude(&self, planet: &dyn Planet) -> f64 {
        planet.altitude(&self.position())
    }
}

#[derive(Debug, Clone)]
pub struct Fairing {
    pub mass: f64,
    pub residual_mass: f64, // one recovered half
    pub diameter: f64,
    pub length: f64,
    pub jettison_altitude: f64,
    pub jettisoned: bool,
    pub kinematics: Kinematics,
    pub recovery: RecoveryStatus,
    pub aerodynamics: Aerodynamics,
}

impl Fairing {
    pub fn new(params: &FairingParams, kinematics: Kinematics) -> Self {
        Fairing {
            mass: params.mass,
            residual_mass: params.mass * 0.5,
            diameter: params.diameter,
            length: params.length,
            jettison_altitude: params.jettison_altitude,
            jettisoned: false,
            kinematics,
            recovery: RecoveryStatus::Attached,
            aerodynamics: Aerodynamics::new(
                params.drag_coefficient,
                0.5 * PI * (params.diameter * 0.5).powi(2),
            ),
        }
    }

    pub fn jettison(&mut self, kinematics: Kinematics) {
        self.jettisoned = true;
        self.kinematics = kinematics;
        self.recovery = RecoveryStatus::Descending;
    }
}

impl SimulatedBody for Fairing {
    fn position(&self) -> Vector3D {
        self.kinematics.position()
    }

    fn velocity(&self) -> Vector3D {
        self.kinematics.velocity()
    }

    fn velocity_relative(&self) -> Vector3D {
        self.kinematics.velocity_relative()
    }

    fn drag_area(&self) -> f64 {
        self.aerodynamics.surface_area
    }

    fn drag_coefficient(&self) -> f64 {
        self.aerodynamics.drag_coefficient
    }

    fn mass(&self) -> f64 {
        self.residual_mass
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub stages: Vec<Stage>,
    pub fairing: Fairing,
    pub payload: f64,
    pub kinematics: Kinematics,
    pub initial_position: Vector3D,
    pub orientation: Vector3D,
    pub orbit: bool,
    pub active_stage: usize,
    pub mass: f64,
    pub aerodynamics: Aerodynamics,
}

impl Vehicle {
    pub fn new(params: &Params, environment: &Environment) -> Result<Self, SimulationError> {
        params.validate()?;

        let planet = environment.planet.as_ref();
        let site = &params.launch_site;
        let position = planet.cartesian_position(site.latitude, site.longitude, site.altitude);
        let velocity = planet.surface_velocity(&position);
        let kinematics = Kinematics::new(position, velocity);

        let engine = Engine::new(&params.engine);
        let stages: Vec<Stage> = (0..params.stage_count())
            .map(|i| Stage::new(i, params, &engine, kinematics))
            .collect();
        let fairing = Fairing::new(&params.vehicle.fairing, kinematics);

        let mut vehicle = Vehicle {
            stages,
            fairing,
            payload: params.vehicle.payload,
            kinematics,
            initial_position: position,
            orientation: position.unit(),
            orbit: false,
            active_stage: 0,
            mass: 0.0,
            aerodynamics: Aerodynamics::new(
                params.vehicle.drag_coefficient,
                PI * (0.5 * params.vehicle.fairing.diameter).powi(2),
            ),
        };
        vehicle.refresh_mass();

        info!(
            stages = vehicle.stages.len(),
            gross_mass = vehicle.mass,
            delta_v = vehicle.total_delta_v(),
            "vehicle assembled"
        );
        Ok(vehicle)
    }

    pub fn refresh_mass(&mut self) {
        self.mass = self.stages.iter().map(|s| s.mass).sum();
    }

    pub fn position(&self) -> Vector3D {
        self.kinematics.position()
    }

    pub fn velocity(&self) -> Vector3D {
        self.kinematics.velocity()
    }

    pub fn velocity_relative(&self) -> Vector3D {
        self.kinematics.velocity_relative()
    }

    pub fn altitude(&self, planet: &dyn Planet) -> f64 {
        planet.altitude(&self.position())
    }

    pub fn downrange(&self, radius: f64) -> f64 {
        self.kinematics.downrange(&self.initial_position, radius)
    }

    pub fn active_stage(&self) -> &Stage {
        &self.stages[self.active_stage]
    }

    pub fn active_stage_mut(&mut self) -> &mut Stage {
        &mut self.stages[self.active_stage]
    }

    pub fn last_stage(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn is_final_stage(&self) -> bool {
        self.active_stage + 1 == self.stages.len()
    }

    pub fn propellant_remaining(&self) -> f64 {
        self.stages.iter().map(|s| s.prop_mass).sum()
    }

    pub fn total_delta_v(&self) -> f64 {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let above: f64 = self.stages[i + 1..].iter().map(|s| s.mass).sum();
                let final_mass = above + stage.dry_mass;
                delta_v(stage.isp, final_mass + stage.prop_mass, final_mass)
            })
            .sum()
    }

    pub fn thrust_to_weight(&self) -> f64 {
        let first = &self.stages[0];
        let thrust = first.engine.params().thrust_sl * first.engines_firing() as f64;
        thrust / (self.mass * G0)
    }

    pub fn modify_payload(&mut self, payload: f64) {
        self.payload = payload;
        if let Some(last) = self.stages.last_mut() {
            last.payload_mass = payload;
            last.update_mass();
        }
        self.refresh_mass();
    }
}

impl SimulatedBody for Vehicle {
    fn position(&self) -> Vector3D {
        self.kinematics.position()
    }

    fn velocity(&self) -> Vector3D {
        self.kinematics.velocity()
    }

    fn velocity_relative(&self) -> Vector3D {
        self.kinematics.velocity_relative()
    }

    fn drag_area(&self) -> f64 {
        self.aerodynamics.surface_area
    }

    fn drag_coefficient(&self) -> f64 {
        self.aerodynamics.drag_coefficient
    }

    fn mass(&self) -> f64 {
        self.mass
    }
}
