use tracing::{debug, info, warn};

use crate::config::Params;
use crate::control::environment::Environment;
use crate::control::guidance::{PIController, PitchoverOptimizer};
use crate::control::vehicle::Vehicle;
use crate::errors::SimulationError;

#[derive(Debug, Clone, PartialEq)]
pub struct PayloadReport {
    pub payload: f64,
    pub feasible: bool,
    pub margin: f64,
    pub pitchover_angle: f64,
    pub iterations: usize,
    pub converged: bool,
}

pub fn evaluate_payload(
    params: &Params,
    environment: &Environment,
    payload: f64,
) -> Result<Option<(f64, f64)>, SimulationError> {
    let mut candidate = params.clone();
    candidate.vehicle.payload = payload;
    let vehicle = Vehicle::new(&candidate, environment)?;

    let report = PitchoverOptimizer::new(&candidate, environment).optimize(&vehicle)?;
    Ok(report
        .outcome
        .filter(|outcome| outcome.orbit_achieved)
        .map(|outcome| (outcome.final_stage_margin, report.angle)))
}

pub fn size_payload(
    params: &Params,
    environment: &Environment,
) -> Result<PayloadReport, SimulationError> {
    let sizing = &params.payload_sizing;
    let mut controller = PIController::new(sizing.gain, sizing.integral_gain);
    let mut report = PayloadReport {
        payload: sizing.initial_payload,
        feasible: false,
        margin: 0.0,
        pitchover_angle: params.trajectory.pitchover_angle,
        iterations: 0,
        converged: false,
    };

    let mut payload = sizing.initial_payload;
    let mut error = 0.0;
    for iteration in 1..=sizing.max_iterations {
        let candidate = (payload + controller.update(error)).max(0.0);
        report.iterations = iteration;

        match evaluate_payload(params, environment, candidate)? {
            Some((margin, angle)) if margin >= 0.0 => {
                debug!(iteration, payload = candidate, margin, angle, "payload feasible");
                report.payload = candidate;
                report.feasible = true;
                report.margin = margin;
                report.pitchover_angle = angle;
                payload = candidate;
                error = margin;
            }
            other => {
                debug!(iteration, payload = candidate, margin = ?other.map(|m| m.0), "payload infeasible");
                report.converged = true;
                info!(payload = report.payload, feasible = report.feasible, "payload sized");
                return Ok(report);
            }
        }
    }

    warn!(
        iterations = report.iterations,
        payload = report.payload,
        "payload sizing hit its iteration cap"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_params() -> Params {
        let mut params = Params::default();
        params.simulation.timestep = 0.5;
        params.optimizer.max_iterations = 1;
        params.payload_sizing.max_iterations = 2;
        params
    }

    #[test]
    fn test_sizing_is_bounded() {
        let params = quick_params();
        let report = size_payload(&params, &Environment::default()).unwrap();
        assert!(report.iterations >= 1 && report.iterations <= 2);
        assert!(report.payload >= 0.0);
        if report.feasible {
            assert!(report.margin >= 0.0);
        }
        assert!(report.converged || report.iterations == 2);
    }

    #[test]
    fn test_no_sizing_iterations_reports_initial_payload() {
        let mut params = quick_params();
        params.payload_sizing.max_iterations = 0;
        let report = size_payload(&params, &Environment::default()).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.payload, params.payload_sizing.initial_payload);
        assert!(!report.feasible);
        assert!(!report.converged);
    }

    #[test]
    fn test_unreachable_target_is_infeasible() {
        let mut params = quick_params();
        params.target.apogee = 50_000e3;
        let result = evaluate_payload(&params, &Environment::default(), 100.0).unwrap();
        assert!(result.is_none());
    }
}
