use crate::constants::{
    ATMOSPHERE_CEILING_KM, EARTH_RADIUS_EQUATOR, EARTH_RADIUS_POLES, MU_EARTH, R_AIR,
    SEA_LEVEL_PRESSURE, SIDEREAL_DAY, T_STP,
};
use crate::utils::vector3d::Vector3D;

pub trait Atmosphere {
    fn density(&self, altitude: f64) -> f64;
    fn ambient_pressure(&self, altitude: f64) -> f64;
    fn speed_of_sound(&self, altitude: f64) -> f64;
}

/// Layered standard atmosphere up to 84.85 km geopotential, empty above.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAtmosphere;

impl StandardAtmosphere {
    pub fn geopotential(altitude_km: f64) -> f64 {
        let radius = EARTH_RADIUS_POLES / 1000.0;
        radius * altitude_km / (radius + altitude_km)
    }

    pub fn temperature(geopotential_km: f64) -> f64 {
        let g = geopotential_km;
        if g <= 11.0 {
            288.15 - 6.5 * g
        } else if g <= 20.0 {
            216.65
        } else if g <= 32.0 {
            196.65 + g
        } else if g <= 47.0 {
            228.65 + 2.8 * (g - 32.0)
        } else if g <= 51.0 {
            270.65
        } else if g <= 71.0 {
            270.65 - 2.8 * (g - 51.0)
        } else if g <= ATMOSPHERE_CEILING_KM {
            214.65 - 2.0 * (g - 71.0)
        } else {
            0.0
        }
    }

    pub fn pressure(geopotential_km: f64, temperature: f64) -> f64 {
        let g = geopotential_km;
        if g <= 11.0 {
            SEA_LEVEL_PRESSURE * (288.15 / temperature).powf(-5.255877)
        } else if g <= 20.0 {
            22632.06 * (-0.1577 * (g - 11.0)).exp()
        } else if g <= 32.0 {
            5474.889 * (216.65 / temperature).powf(34.16319)
        } else if g <= 47.0 {
            868.0187 * (228.65 / temperature).powf(12.2011)
        } else if g <= 51.0 {
            110.9063 * (-0.1262 * (g - 47.0)).exp()
        } else if g <= 71.0 {
            66.93887 * (270.65 / temperature).powf(-12.2011)
        } else if g <= ATMOSPHERE_CEILING_KM {
            3.956420 * (214.65 / temperature).powf(-17.0816)
        } else {
            0.0
        }
    }

    fn layer(altitude: f64) -> (f64, f64) {
        let geopotential = Self::geopotential(altitude / 1000.0);
        let temperature = Self::temperature(geopotential);
        if temperature <= 0.0 {
            return (0.0, 0.0);
        }
        (temperature, Self::pressure(geopotential, temperature))
    }
}

impl Atmosphere for StandardAtmosphere {
    fn density(&self, altitude: f64) -> f64 {
        let (temperature, pressure) = Self::layer(altitude);
        if pressure > 0.0 {
            pressure / (R_AIR * temperature)
        } else {
            0.0
        }
    }

    fn ambient_pressure(&self, altitude: f64) -> f64 {
        Self::layer(altitude).1.max(0.0)
    }

    fn speed_of_sound(&self, altitude: f64) -> f64 {
        let (temperature, _) = Self::layer(altitude);
        if temperature <= 0.0 {
            return 0.0;
        }
        331.5 + 0.6 * (temperature - T_STP)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Vacuum;

impl Atmosphere for Vacuum {
    fn density(&self, _altitude: f64) -> f64 {
        0.0
    }

    fn ambient_pressure(&self, _altitude: f64) -> f64 {
        0.0
    }

    fn speed_of_sound(&self, _altitude: f64) -> f64 {
        0.0
    }
}

pub trait Planet {
    fn radius(&self) -> f64;
    fn mu(&self) -> f64;
    fn rotation_period(&self) -> f64;

    fn gravity(&self, radius: f64) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        self.mu() / radius.powi(2)
    }

    /// Inertial position of a surface point; angles in degrees.
    fn cartesian_position(&self, latitude: f64, longitude: f64, altitude: f64) -> Vector3D {
        let r = self.radius() + altitude;
        let (lat, lon) = (latitude.to_radians(), longitude.to_radians());
        Vector3D::new(
            r * lat.cos() * lon.cos(),
            r * lat.cos() * lon.sin(),
            r * lat.sin(),
        )
    }

    /// `(latitude, longitude, altitude)` with angles in degrees.
    fn geodetic(&self, position: &Vector3D) -> (f64, f64, f64) {
        let r = position.magnitude();
        if r == 0.0 {
            return (0.0, 0.0, -self.radius());
        }
        let latitude = (position.z / r).clamp(-1.0, 1.0).asin().to_degrees();
        let longitude = position.y.atan2(position.x).to_degrees();
        (latitude, longitude, r - self.radius())
    }

    fn altitude(&self, position: &Vector3D) -> f64 {
        position.magnitude() - self.radius()
    }

    fn angular_velocity(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.rotation_period()
    }

    fn surface_speed(&self, position: &Vector3D) -> f64 {
        self.angular_velocity() * position.x.hypot(position.y)
    }

    fn surface_velocity(&self, position: &Vector3D) -> Vector3D {
        Vector3D::new(-position.y, position.x, 0.0).unit() * self.surface_speed(position)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Earth {
    pub radius: f64,
    pub mu: f64,
    pub rotation_period: f64,
}

impl Default for Earth {
    fn default() -> Self {
        Earth {
            radius: EARTH_RADIUS_EQUATOR,
            mu: MU_EARTH,
            rotation_period: SIDEREAL_DAY,
        }
    }
}

impl Planet for Earth {
    fn radius(&self) -> f64 {
        self.radius
    }

    fn mu(&self) -> f64 {
        self.mu
    }

    fn rotation_period(&self) -> f64 {
        self.rotation_period
    }
}

pub struct Environment {
    pub atmosphere: Box<dyn Atmosphere>,
    pub planet: Box<dyn Planet>,
}

impl Environment {
    pub fn new(atmosphere: impl Atmosphere + 'static, planet: impl Planet + 'static) -> Self {
        Environment {
            atmosphere: Box::new(atmosphere),
            planet: Box::new(planet),
        }
    }

    pub fn sea_level_pressure(&self) -> f64 {
        self.atmosphere.ambient_pressure(0.0)
    }

    pub fn altitude(&self, position: &Vector3D) -> f64 {
        self.planet.altitude(position)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new(StandardAtmosphere, Earth::default())
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("radius", &self.planet.radius())
            .field("mu", &self.planet.mu())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_sea_level_conditions() {
        let atmosphere = StandardAtmosphere;
        assert_abs_diff_eq!(atmosphere.ambient_pressure(0.0), 101_325.0, epsilon = 1.0);
        assert_abs_diff_eq!(atmosphere.density(0.0), 1.2235, epsilon = 0.01);
        assert_abs_diff_eq!(atmosphere.speed_of_sound(0.0), 340.5, epsilon = 0.1);
    }

    #[test]
    fn test_tropopause_conditions() {
        let atmosphere = StandardAtmosphere;
        let altitude = 11_019.0; // ~11 km geopotential
        assert_abs_diff_eq!(atmosphere.ambient_pressure(altitude), 22_632.0, epsilon = 20.0);
        assert!(atmosphere.density(altitude) < 0.4);
    }

    #[test]
    fn test_pressure_decreases_with_altitude() {
        let atmosphere = StandardAtmosphere;
        let mut last = atmosphere.ambient_pressure(0.0);
        for km in 1..85 {
            let p = atmosphere.ambient_pressure(km as f64 * 1000.0);
            assert!(p < last, "pressure at {km} km should fall");
            last = p;
        }
    }

    #[test]
    fn test_space_conditions() {
        let atmosphere = StandardAtmosphere;
        assert_eq!(atmosphere.density(500_000.0), 0.0);
        assert_eq!(atmosphere.ambient_pressure(500_000.0), 0.0);
        assert_eq!(atmosphere.speed_of_sound(500_000.0), 0.0);
    }

    #[test]
    fn test_gravity_inverse_square() {
        let earth = Earth::default();
        let g0 = earth.gravity(earth.radius);
        let g100 = earth.gravity(earth.radius + 100_000.0);
        assert_abs_diff_eq!(g0, 9.798, epsilon = 0.01);
        let expected_ratio = (earth.radius / (earth.radius + 100_000.0)).powi(2);
        assert_relative_eq!(g100 / g0, expected_ratio, epsilon = 1e-12);
    }

    #[test]
    fn test_cartesian_geodetic_round_trip() {
        let earth = Earth::default();
        let position = earth.cartesian_position(57.43498194, -152.34169916, 30.0);
        let (lat, lon, alt) = earth.geodetic(&position);
        assert_abs_diff_eq!(lat, 57.43498194, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, -152.34169916, epsilon = 1e-9);
        assert_abs_diff_eq!(alt, 30.0, epsilon = 1e-6);
    }

    #[test]
    fn test_equatorial_surface_speed() {
        let earth = Earth::default();
        let position = earth.cartesian_position(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(earth.surface_speed(&position), 465.1, epsilon = 0.1);

        let velocity = earth.surface_velocity(&position);
        assert_abs_diff_eq!(velocity.x, 0.0, epsilon = 1e-9);
        assert!(velocity.y > 0.0, "surface moves east");
    }

    #[test]
    fn test_vacuum_is_empty() {
        let environment = Environment::new(Vacuum, Earth::default());
        assert_eq!(environment.sea_level_pressure(), 0.0);
        assert_eq!(environment.atmosphere.density(0.0), 0.0);
    }
}
