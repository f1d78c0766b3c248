// Physical Constants
pub const G0: f64 = 9.80665; // m/s²
pub const MU_EARTH: f64 = 3.986_004_4e14; // m³/s²
pub const EARTH_RADIUS_EQUATOR: f64 = 6_378_137.0; // meters
pub const EARTH_RADIUS_POLES: f64 = 6_356_752.3; // meters
pub const SIDEREAL_DAY: f64 = 86_164.0905; // s
pub const R_UNIVERSAL: f64 = 8.314; // J/(K⋅mol)
pub const T_STP: f64 = 273.15; // K

// Environmental Constants
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const R_AIR: f64 = 287.5; // J/(kg⋅K), dry air
pub const ATMOSPHERE_CEILING_KM: f64 = 84.85; // geopotential km
pub const DRAG_CUTOFF_ALTITUDE: f64 = 85_000.0; // m

// Commodity molar masses
pub const MOLAR_MASS_NITROGEN: f64 = 28.0134; // g/mol
pub const MOLAR_MASS_HELIUM: f64 = 4.0026; // g/mol

// Materials
pub const NYLON_DENSITY: f64 = 1_140.0; // kg/m³

// Unit conversions
pub const LBM_TO_KG: f64 = 0.453_592_37;
pub const LBF_TO_N: f64 = 4.448_221_615_260_5;
pub const PSI_TO_PA: f64 = 6_894.757_293_168;
pub const INCH_TO_M: f64 = 0.0254;
pub const LITER_TO_M3: f64 = 0.001;

pub fn lbm(value: f64) -> f64 {
    value * LBM_TO_KG
}

pub fn lbf(value: f64) -> f64 {
    value * LBF_TO_N
}

pub fn psi(value: f64) -> f64 {
    value * PSI_TO_PA
}
