use std::f64::consts::PI;

use tracing::warn;

use crate::config::{HeliumParams, NitrogenParams, TankParams};
use crate::constants::{MOLAR_MASS_HELIUM, MOLAR_MASS_NITROGEN, R_UNIVERSAL, T_STP};
use crate::control::propulsion::Engine;

const THOMSEN_EXPONENT: f64 = 1.6075;

pub fn spheroid_area(r: f64, h: f64) -> f64 {
    let p = THOMSEN_EXPONENT;
    let sum = r.powf(p) * r.powf(p) + 2.0 * r.powf(p) * h.powf(p);
    4.0 * PI * (sum / 3.0).powf(1.0 / p)
}

pub fn ellipsoid_volume(h: f64, r: f64) -> f64 {
    4.0 / 3.0 * PI * h * r.powi(2)
}

pub fn cylinder_height(volume: f64, r: f64) -> f64 {
    volume / (PI * r.powi(2))
}

pub fn cylinder_shell_mass(h: f64, r: f64, thickness: f64, density: f64) -> f64 {
    2.0 * PI * h * r * thickness * density
}

/// Thin-wall cylinder under internal pressure (ASME VIII).
pub fn cylinder_thickness(pressure: f64, r: f64, stress: f64, weld_efficiency: f64) -> f64 {
    pressure * r / (stress * weld_efficiency - 0.6 * pressure)
}

/// Ellipsoidal head of diameter `d` and depth `h`.
pub fn crown_thickness(pressure: f64, d: f64, h: f64, stress: f64, weld_efficiency: f64) -> f64 {
    let k = (2.0 + (d / (2.0 * h)).powi(2)) / 6.0;
    pressure * d * k / (2.0 * stress * weld_efficiency - 0.2 * pressure)
}

pub fn ideal_gas_moles(pressure: f64, volume: f64) -> f64 {
    pressure * volume / (R_UNIVERSAL * T_STP)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropellantTank {
    pub fuel_mass: f64,
    pub oxidizer_mass: f64,
    pub fuel_residual: f64,
    pub oxidizer_residual: f64,
    pub fuel_volume: f64,
    pub oxidizer_volume: f64,
    pub fuel_height: f64,
    pub oxidizer_height: f64,
    pub wall_thickness: f64,
    pub crown_thickness: f64,
    pub dry_mass: f64,
    pub height: f64,
}

impl PropellantTank {
    pub fn size(prop_mass: f64, diameter: f64, params: &TankParams, engine: &Engine) -> Self {
        let radius = diameter / 2.0;

        // Engine event quantities are carried on top of the O/F split.
        let events = engine.non_propulsive();
        let (fuel, oxidizer) = engine.split(prop_mass - events.fuel - events.oxidizer);
        let fuel_mass = fuel + events.fuel;
        let oxidizer_mass = oxidizer + events.oxidizer;

        let eta = params.expulsion_efficiency;
        let fuel_residual = fuel_mass / eta - fuel_mass;
        let oxidizer_residual = oxidizer_mass / eta - oxidizer_mass;

        let fuel_volume = fuel_mass / params.fuel_density / params.fuel_fill;
        let oxidizer_volume = oxidizer_mass / params.oxidizer_density / params.oxidizer_fill;

        let caps_volume = ellipsoid_volume(params.caps_height, radius);
        let oxidizer_height = cylinder_height(oxidizer_volume - caps_volume, radius).max(0.0);
        let fuel_height = cylinder_height(fuel_volume, radius).max(0.0);

        let pressure = engine.params().start_pressure;
        let stress = params.material_strength;
        let weld = params.weld_efficiency;
        let rho = params.material_density;
        let wall_thickness = cylinder_thickness(pressure, radius, stress, weld);
        let crown = crown_thickness(pressure, diameter, params.caps_height, stress, weld);

        let oxidizer_caps = spheroid_area(radius, params.caps_height) * crown * rho;
        let fuel_caps = 0.5 * oxidizer_caps;
        let shells = cylinder_shell_mass(oxidizer_height, radius, wall_thickness, rho)
            + cylinder_shell_mass(fuel_height, radius, wall_thickness, rho);

        PropellantTank {
            fuel_mass,
            oxidizer_mass,
            fuel_residual,
            oxidizer_residual,
            fuel_volume,
            oxidizer_volume,
            fuel_height,
            oxidizer_height,
            wall_thickness,
            crown_thickness: crown,
            dry_mass: (shells + oxidizer_caps + fuel_caps) * params.piping_factor,
            height: oxidizer_height + fuel_height + 2.0 * params.caps_height,
        }
    }

    pub fn propellant(&self) -> f64 {
        self.fuel_mass + self.oxidizer_mass
    }

    pub fn drain(&mut self, fuel: f64, oxidizer: f64) {
        self.fuel_mass -= fuel;
        self.oxidizer_mass -= oxidizer;
    }

    pub fn empty(&mut self) {
        self.fuel_mass = 0.0;
        self.oxidizer_mass = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NitrogenTank {
    pub commodity_mass: f64,
    pub volume: f64,
    pub bottles: usize,
    pub dry_mass: f64,
}

impl NitrogenTank {
    pub fn size(engines: usize, engine: &Engine, params: &NitrogenParams) -> Self {
        let events = engine.non_propulsive().nitrogen;
        let purge = engine.purge_rate() * params.purge_duration;
        let commodity_mass = (events + purge) * engines as f64 / params.usable_fraction;

        let moles = commodity_mass * 1000.0 / MOLAR_MASS_NITROGEN;
        let volume = R_UNIVERSAL * T_STP * moles / params.storage_pressure;

        let bottle = if engines == 1 {
            params.single_engine_bottle
        } else {
            params.multi_engine_bottle
        };
        let bottles = (volume / bottle.volume).floor() as usize + 1;

        NitrogenTank {
            commodity_mass,
            volume,
            bottles,
            dry_mass: bottles as f64 * bottle.mass,
        }
    }

    pub fn mass(&self) -> f64 {
        self.dry_mass + self.commodity_mass
    }

    pub fn consume(&mut self, amount: f64) {
        if amount > self.commodity_mass {
            warn!(
                requested = amount,
                available = self.commodity_mass,
                "nitrogen supply exhausted"
            );
            self.commodity_mass = 0.0;
        } else {
            self.commodity_mass -= amount;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeliumTank {
    pub commodity_mass: f64,
    pub dry_mass: f64,
}

impl HeliumTank {
    pub fn new(params: &HeliumParams) -> Self {
        let moles = ideal_gas_moles(params.pressure, params.volume);
        HeliumTank {
            commodity_mass: moles * MOLAR_MASS_HELIUM * 1e-3,
            dry_mass: params.tank_mass,
        }
    }

    pub fn mass(&self) -> f64 {
        self.dry_mass + self.commodity_mass
    }
}
