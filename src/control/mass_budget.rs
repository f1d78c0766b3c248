use tracing::{debug, warn};

use crate::config::TankParams;
use crate::control::propulsion::Engine;
use crate::control::tanks::PropellantTank;

pub const MAX_ITERATIONS: usize = 100;
pub const TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    Converged { iterations: usize },
    Unconverged { iterations: usize, ratio_error: f64 },
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match *self {
            Convergence::Converged { iterations } => iterations,
            Convergence::Unconverged { iterations, .. } => iterations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MassBudget {
    pub dry_mass: f64,
    pub prop_mass: f64,
    pub tank: PropellantTank,
    pub convergence: Convergence,
}

impl MassBudget {
    pub fn mass_ratio(&self) -> f64 {
        (self.prop_mass + self.dry_mass) / self.dry_mass
    }
}

/// Sizes the propellant load and tank of a core so that
/// `(prop + dry) / dry` matches `mass_ratio`, where `dry` is the fixed
/// `core_mass` plus the tank structure.
#[derive(Debug, Clone)]
pub struct MassBudgetSolver<'a> {
    pub mass_ratio: f64,
    pub core_mass: f64,
    pub diameter: f64,
    pub tank: &'a TankParams,
    pub engine: &'a Engine,
    pub max_iterations: usize,
}

impl<'a> MassBudgetSolver<'a> {
    pub fn new(
        mass_ratio: f64,
        core_mass: f64,
        diameter: f64,
        tank: &'a TankParams,
        engine: &'a Engine,
    ) -> Self {
        MassBudgetSolver {
            mass_ratio,
            core_mass,
            diameter,
            tank,
            engine,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn solve(&self) -> MassBudget {
        self.solve_from(self.core_mass)
    }

    pub fn solve_from(&self, initial_dry_mass: f64) -> MassBudget {
        let target = self.mass_ratio;
        let mut dry_mass = initial_dry_mass;
        let mut best: Option<(f64, MassBudget)> = None;

        for iteration in 1..=self.max_iterations {
            let prop_mass = target * dry_mass - dry_mass;
            let tank = PropellantTank::size(prop_mass, self.diameter, self.tank, self.engine);
            let next_dry = self.core_mass + tank.dry_mass;
            let ratio = (prop_mass + next_dry) / next_dry;
            let error = (ratio - target).abs();

            if error < TOLERANCE * target {
                debug!(iterations = iteration, dry_mass = next_dry, prop_mass, "mass budget converged");
                return MassBudget {
                    dry_mass: next_dry,
                    prop_mass,
                    tank,
                    convergence: Convergence::Converged {
                        iterations: iteration,
                    },
                };
            }

            if best.as_ref().map_or(true, |(e, _)| error < *e) {
                best = Some((
                    error,
                    MassBudget {
                        dry_mass: next_dry,
                        prop_mass,
                        tank,
                        convergence: Convergence::Unconverged {
                            iterations: iteration,
                            ratio_error: error,
                        },
                    },
                ));
            }
            dry_mass = next_dry;
        }

        let iterations = self.max_iterations;
        match best {
            Some((error, mut budget)) => {
                warn!(iterations, ratio_error = error, "mass budget did not converge");
                budget.convergence = Convergence::Unconverged {
                    iterations,
                    ratio_error: error,
                };
                budget
            }
            None => {
                let prop_mass = target * dry_mass - dry_mass;
                let tank = PropellantTank::size(prop_mass, self.diameter, self.tank, self.engine);
                MassBudget {
                    dry_mass: self.core_mass + tank.dry_mass,
                    prop_mass,
                    tank,
                    convergence: Convergence::Unconverged {
                        iterations: 0,
                        ratio_error: f64::INFINITY,
                    },
                }
            }
        }
    }
}
