use std::f64::consts::FRAC_PI_2;

use tracing::{debug, info, warn};

use crate::config::Params;
use crate::control::environment::Environment;
use crate::control::flight::{Simulation, SimulationOutcome};
use crate::control::vehicle::Vehicle;
use crate::errors::SimulationError;
use crate::trajectory_system::orbit::keplerian;
use crate::utils::math::{constrain, normalize};

#[derive(Debug, Clone, PartialEq)]
pub struct PIController {
    kp: f64,
    ki: f64,
    integral: f64,
    output: f64,
}

impl PIController {
    pub fn new(kp: f64, ki: f64) -> Self {
        PIController {
            kp,
            ki,
            integral: 0.0,
            output: 0.0,
        }
    }

    pub fn update(&mut self, error: f64) -> f64 {
        self.integral += error;
        self.output = self.kp * error + self.ki * self.integral;
        self.output
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.output = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchoverReport {
    pub angle: f64,
    pub error: f64,
    pub iterations: usize,
    pub converged: bool,
    pub outcome: Option<SimulationOutcome>,
}

pub struct PitchoverOptimizer<'a> {
    params: &'a Params,
    environment: &'a Environment,
    controller: PIController,
}

impl<'a> PitchoverOptimizer<'a> {
    pub fn new(params: &'a Params, environment: &'a Environment) -> Self {
        let optimizer = &params.optimizer;
        PitchoverOptimizer {
            params,
            environment,
            controller: PIController::new(optimizer.gain, optimizer.integral_gain),
        }
    }

    pub fn trial(
        &self,
        vehicle: &Vehicle,
        angle: f64,
    ) -> Result<(SimulationOutcome, Vehicle), SimulationError> {
        let mut params = self.params.clone();
        params.trajectory.pitchover_angle = angle;
        params.simulation.recover = false;
        params.simulation.circularize = false;

        let mut flown = vehicle.clone();
        let outcome = Simulation::new(&mut flown, &params, self.environment)?.run()?;
        Ok((outcome, flown))
    }

    // positive error grows the pitchover angle
    pub fn injection_error(&self, vehicle: &Vehicle) -> f64 {
        let planet = self.environment.planet.as_ref();
        let radius = planet.radius();
        let injection = radius + self.params.target.injection;
        let target_apogee = radius + self.params.target.apogee;

        let position = vehicle.position();
        let velocity = vehicle.velocity();
        let (perigee, apogee) = if planet.mu() > 0.0 {
            keplerian(&position, &velocity, planet.mu())
        } else {
            (0.0, 0.0)
        };

        let peri_norm = normalize(perigee, 0.0, injection);
        let apo_norm = constrain(normalize(apogee, 0.0, target_apogee), 0.0, 1.0);
        let alt_norm = normalize(position.magnitude(), 0.0, injection);

        // flight path angle from horizontal, negative once descending
        let diff = FRAC_PI_2 - position.angle(&velocity);
        let diff_norm = normalize(diff, 0.0, FRAC_PI_2);

        if alt_norm >= 1.0 {
            if apo_norm < 1.0 {
                -diff_norm
            } else {
                diff_norm
            }
        } else if apo_norm < 1.0 || peri_norm > diff_norm {
            -diff_norm
        } else {
            diff_norm
        }
    }

    pub fn optimize(&mut self, vehicle: &Vehicle) -> Result<PitchoverReport, SimulationError> {
        let settings = &self.params.optimizer;
        let (min_angle, max_angle) = (settings.min_angle, settings.max_angle);
        let mut angle = constrain(self.params.trajectory.pitchover_angle, min_angle, max_angle);
        self.controller.reset();

        let mut best: Option<PitchoverReport> = None;
        for iteration in 1..=settings.max_iterations {
            let (outcome, flown) = self.trial(vehicle, angle)?;
            let error = self.injection_error(&flown);
            debug!(
                iteration,
                angle,
                error,
                apogee = outcome.apogee_altitude,
                perigee = outcome.perigee_altitude,
                "pitchover trial"
            );

            let report = PitchoverReport {
                angle,
                error,
                iterations: iteration,
                converged: error.abs() < settings.tolerance,
                outcome: Some(outcome),
            };
            if report.converged {
                info!(iteration, angle, error, "pitchover converged");
                return Ok(report);
            }
            if best.as_ref().map_or(true, |b| error.abs() < b.error.abs()) {
                best = Some(report);
            }

            angle = constrain(angle + self.controller.update(error), min_angle, max_angle);
        }

        let mut report = best.unwrap_or(PitchoverReport {
            angle,
            error: f64::INFINITY,
            iterations: 0,
            converged: false,
            outcome: None,
        });
        report.iterations = settings.max_iterations;
        warn!(
            iterations = report.iterations,
            angle = report.angle,
            error = report.error,
            "pitchover optimizer did not converge"
        );
        Ok(report)
    }
}
