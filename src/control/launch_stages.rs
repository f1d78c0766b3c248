use std::f64::consts::PI;

use tracing::debug;

use crate::config::{Consumables, Params};
use crate::control::mass_budget::{Convergence, MassBudgetSolver};
use crate::control::propulsion::Engine;
use crate::control::tanks::{HeliumTank, NitrogenTank, PropellantTank};
use crate::control::vehicle::{RecoveryStatus, SimulatedBody};
use crate::errors::SimulationError;
use crate::trajectory_system::aerodynamics::Aerodynamics;
use crate::trajectory_system::kinematics::Kinematics;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, PartialEq)]
pub struct Core {
    pub propellant: PropellantTank,
    pub nitrogen: NitrogenTank,
    pub helium: Vec<HeliumTank>,
}

impl Core {
    fn pressurant_mass(&self) -> f64 {
        self.nitrogen.mass() + self.helium.iter().map(HeliumTank::mass).sum::<f64>()
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub index: usize,
    pub engine: Engine,
    pub engines: usize,
    pub throttle: f64,
    pub cores: Vec<Core>,
    pub recovery_mass: f64,
    pub interstage_mass: f64,
    pub fairing_mass: f64,
    pub payload_mass: f64,
    pub core_mass: f64,
    pub dry_mass: f64,
    pub prop_mass: f64,
    pub mass: f64,
    pub fuel_residual: f64,
    pub oxidizer_residual: f64,
    pub fuel_shutdown: f64,
    pub oxidizer_shutdown: f64,
    pub isp: f64,
    pub burn_duration: f64,
    pub height: f64,
    pub convergence: Convergence,
    pub separated: bool,
    pub residual_mass: f64,
    pub kinematics: Kinematics,
    pub recovery: RecoveryStatus,
    pub aerodynamics: Aerodynamics,
}

impl Stage {
    /// Assembles stage `index` and solves its propellant load for the configured mass ratio.
    pub fn new(index: usize, params: &Params, engine: &Engine, kinematics: Kinematics) -> Self {
        let stage_params = &params.vehicle.stages[index];
        let vehicle = &params.vehicle;
        let count = params.stage_count();
        let is_final = index + 1 == count;

        let interstage_mass = if is_final { 0.0 } else { vehicle.interstage_mass };
        let fairing_mass = if index == 0 { vehicle.fairing.mass } else { 0.0 };
        let recovery_mass = if index == 0 && count > 1 {
            vehicle.recovery_mass
        } else {
            0.0
        };
        let payload_mass = if is_final { vehicle.payload } else { 0.0 };

        let engines = stage_params.engines;
        let nitrogen = NitrogenTank::size(engines, engine, &params.nitrogen);
        let helium = vec![HeliumTank::new(&stage_params.helium); stage_params.helium.tanks];
        let hardware = engines as f64 * engine.mass()
            + nitrogen.mass()
            + helium.iter().map(HeliumTank::mass).sum::<f64>()
            + recovery_mass;

        let budget = MassBudgetSolver::new(
            stage_params.mass_ratio,
            hardware + interstage_mass + fairing_mass + payload_mass,
            vehicle.diameter,
            &params.tank,
            engine,
        )
        .solve();

        let core = Core {
            propellant: budget.tank.clone(),
            nitrogen,
            helium,
        };
        let cores = vec![core; stage_params.cores];

        let fuel_residual = cores.iter().map(|c| c.propellant.fuel_residual).sum();
        let oxidizer_residual = cores.iter().map(|c| c.propellant.oxidizer_residual).sum();
        let shutdown = engine.shutdown();
        let firing = (engines * stage_params.cores) as f64;

        let mut stage = Stage {
            index,
            engine: engine.clone(),
            engines,
            throttle: stage_params.throttle,
            cores,
            recovery_mass,
            interstage_mass,
            fairing_mass,
            payload_mass,
            core_mass: 0.0,
            dry_mass: 0.0,
            prop_mass: 0.0,
            mass: 0.0,
            fuel_residual,
            oxidizer_residual,
            fuel_shutdown: shutdown.fuel * firing,
            oxidizer_shutdown: shutdown.oxidizer * firing,
            isp: engine.isp(index > 0),
            burn_duration: 0.0,
            height: budget.tank.height
                + engine.params().height
                + if index == 0 { vehicle.fairing.length } else { 0.0 },
            convergence: budget.convergence,
            separated: false,
            residual_mass: 0.0,
            kinematics,
            recovery: RecoveryStatus::Attached,
            aerodynamics: Aerodynamics::new(
                vehicle.booster_drag_coefficient,
                PI * (0.5 * vehicle.diameter).powi(2),
            ),
        };
        stage.update_mass();
        stage.burn_duration =
            engine.burn_duration(stage.prop_mass, stage.engines_firing(), stage.throttle);

        debug!(
            stage = index,
            dry_mass = stage.dry_mass,
            prop_mass = stage.prop_mass,
            iterations = stage.convergence.iterations(),
            "stage assembled"
        );
        stage
    }

    pub fn engines_firing(&self) -> usize {
        self.engines * self.cores.len()
    }

    pub fn update_mass(&mut self) {
        if self.separated {
            self.core_mass = 0.0;
            self.dry_mass = 0.0;
            self.prop_mass = 0.0;
            self.mass = 0.0;
            return;
        }
        let engines = self.engines as f64 * self.engine.mass();
        let cores: f64 = self
            .cores
            .iter()
            .map(|c| engines + c.pressurant_mass() + c.propellant.dry_mass + self.recovery_mass)
            .sum();
        self.core_mass = cores / self.cores.len().max(1) as f64;
        self.dry_mass = cores + self.interstage_mass + self.fairing_mass + self.payload_mass;
        self.prop_mass = self.cores.iter().map(|c| c.propellant.propellant()).sum();
        self.mass = self.dry_mass + self.prop_mass;
    }

    pub fn fuel_mass(&self) -> f64 {
        self.cores.iter().map(|c| c.propellant.fuel_mass).sum()
    }

    pub fn oxidizer_mass(&self) -> f64 {
        self.cores.iter().map(|c| c.propellant.oxidizer_mass).sum()
    }

    pub fn nitrogen_mass(&self) -> f64 {
        self.cores.iter().map(|c| c.nitrogen.commodity_mass).sum()
    }

    pub fn is_firing(&self) -> bool {
        !self.separated && self.throttle > 0.0
    }

    pub fn thrust(&self, ambient_pressure: f64, sea_level_pressure: f64) -> f64 {
        if !self.is_firing() {
            return 0.0;
        }
        self.engine.thrust(ambient_pressure, sea_level_pressure)
            * self.engines_firing() as f64
            * self.throttle
    }

    pub fn consume(&mut self, event: Consumables) -> Result<(), SimulationError> {
        let engines = self.engines as f64;
        for core in &mut self.cores {
            core.nitrogen.consume(event.nitrogen * engines);
            core.propellant
                .drain(event.fuel * engines, event.oxidizer * engines);
        }
        self.check_propellant()?;
        self.update_mass();
        Ok(())
    }

    pub fn startup(&mut self) -> Result<(), SimulationError> {
        let (chill, start) = (self.engine.chill(), self.engine.start());
        self.consume(Consumables::new(
            chill.fuel + start.fuel,
            chill.oxidizer + start.oxidizer,
            chill.nitrogen + start.nitrogen,
        ))
    }

    /// Restart for a burn whose start propellant was already reserved.
    pub fn restart(&mut self, throttle: f64) -> Result<(), SimulationError> {
        self.consume(self.engine.start())?;
        self.throttle = throttle;
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), SimulationError> {
        self.consume(self.engine.shutdown())?;
        self.throttle = 0.0;
        Ok(())
    }

    pub fn burn(&mut self, dt: f64, separation: f64) -> Result<(), SimulationError> {
        let firing = self.is_firing() && separation > 0.0;
        let scale = self.engines as f64 * self.throttle * dt * separation;
        let fuel = self.engine.fuel_flow() * scale;
        let oxidizer = self.engine.oxidizer_flow() * scale;
        let purge = self.engine.purge_rate() * self.engines as f64 * dt;

        for core in &mut self.cores {
            core.propellant.drain(fuel, oxidizer);
            if firing {
                core.nitrogen.consume(purge);
            }
        }
        self.check_propellant()?;
        self.update_mass();
        Ok(())
    }

    fn check_propellant(&self) -> Result<(), SimulationError> {
        for core in &self.cores {
            for (commodity, mass) in [
                ("fuel", core.propellant.fuel_mass),
                ("oxidizer", core.propellant.oxidizer_mass),
            ] {
                if mass < 0.0 {
                    return Err(SimulationError::NegativePropellant {
                        stage: self.index,
                        commodity,
                        mass,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn separate(&mut self, kinematics: Kinematics) {
        self.residual_mass = self.dry_mass + self.prop_mass;
        for core in &mut self.cores {
            core.propellant.empty();
        }
        self.separated = true;
        self.throttle = 0.0;
        self.kinematics = kinematics;
        self.recovery = RecoveryStatus::Descending;
        self.update_mass();
    }
}

impl SimulatedBody for Stage {
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
        if self.separated {
            self.residual_mass
        } else {
            self.mass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use approx::assert_relative_eq;

    fn stage(index: usize, params: &Params) -> Stage {
        let engine = Engine::new(&params.engine);
        let kinematics = Kinematics::new(Vector3D::new(6_378_167.0, 0.0, 0.0), Vector3D::zeros());
        Stage::new(index, params, &engine, kinematics)
    }

    #[test]
    fn test_stage_hits_mass_ratio() {
        let params = Params::default();
        for index in 0..2 {
            let stage = stage(index, &params);
            let ratio = stage.mass / stage.dry_mass;
            let target = params.vehicle.stages[index].mass_ratio;
            assert!(stage.convergence.is_converged());
            assert_relative_eq!(ratio, target, max_relative = 2e-3);
            assert_relative_eq!(stage.mass, stage.dry_mass + stage.prop_mass);
        }
    }

    #[test]
    fn test_multi_core_stage_scales_propellant() {
        let mut params = Params::default();
        let single = stage(1, &params);
        params.vehicle.stages[1].cores = 3;
        let triple = stage(1, &params);

        assert_relative_eq!(triple.prop_mass, 3.0 * single.prop_mass, max_relative = 1e-9);
        assert_eq!(triple.engines_firing(), 3);
        // payload is carried once
        let hardware = single.dry_mass - single.payload_mass;
        assert_relative_eq!(
            triple.dry_mass,
            3.0 * hardware + single.payload_mass,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_burn_depletes_by_mixture_ratio() {
        let params = Params::default();
        let mut stage = stage(1, &params);
        let (fuel, ox, n2) = (stage.fuel_mass(), stage.oxidizer_mass(), stage.nitrogen_mass());

        stage.burn(1.0, 1.0).unwrap();

        let flow = stage.engine.mass_flow() * 0.7;
        assert_relative_eq!(fuel - stage.fuel_mass(), flow / 3.17, epsilon = 1e-9);
        assert_relative_eq!(ox - stage.oxidizer_mass(), flow * 2.17 / 3.17, epsilon = 1e-9);
        assert!(stage.nitrogen_mass() < n2);
        assert_relative_eq!(stage.mass, stage.dry_mass + stage.prop_mass);
    }

    #[test]
    fn test_coasting_does_not_burn_or_purge() {
        let params = Params::default();
        let mut stage = stage(1, &params);
        let before = (stage.prop_mass, stage.nitrogen_mass());
        stage.burn(1.0, 0.0).unwrap();
        assert_eq!((stage.prop_mass, stage.nitrogen_mass()), before);
    }

    #[test]
    fn test_negative_propellant_is_reported() {
        let params = Params::default();
        let mut stage = stage(1, &params);
        let result = stage.burn(stage.burn_duration * 2.0, 1.0);
        assert!(matches!(
            result,
            Err(SimulationError::NegativePropellant { stage: 1, .. })
        ));
    }

    #[test]
    fn test_separated_stage_reports_zero_mass() {
        let params = Params::default();
        let mut stage = stage(0, &params);
        let before = stage.mass;
        stage.separate(stage.kinematics);

        assert_eq!(stage.mass, 0.0);
        assert_eq!(stage.dry_mass, 0.0);
        assert_eq!(stage.prop_mass, 0.0);
        assert_relative_eq!(stage.residual_mass, before);
        assert_eq!(stage.recovery, RecoveryStatus::Descending);
        assert_eq!(SimulatedBody::mass(&stage), before);
    }

    #[test]
    fn test_startup_deducts_chill_and_start() {
        let params = Params::default();
        let mut stage = stage(0, &params);
        let before = stage.oxidizer_mass();
        stage.startup().unwrap();
        let engine = &params.engine;
        let expected = (engine.chill.oxidizer + engine.start.oxidizer) * 4.0;
        assert_relative_eq!(before - stage.oxidizer_mass(), expected, epsilon = 1e-9);
    }
}
