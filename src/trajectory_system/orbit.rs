use crate::constants::{EARTH_RADIUS_EQUATOR, MU_EARTH};
use crate::control::environment::Planet;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub perigee: f64,
    pub apogee: f64,
    pub semi_major_axis: f64,
    pub velocity_perigee: f64,
    pub velocity_apogee: f64,
    radius: f64,
    mu: f64,
}

impl Orbit {
    pub fn new(perigee: f64, apogee: f64) -> Self {
        Self::with_body(perigee, apogee, EARTH_RADIUS_EQUATOR, MU_EARTH)
    }

    pub fn around(planet: &dyn Planet, perigee: f64, apogee: f64) -> Self {
        Self::with_body(perigee, apogee, planet.radius(), planet.mu())
    }

    pub fn with_body(perigee: f64, apogee: f64, radius: f64, mu: f64) -> Self {
        let semi_major_axis = 0.5 * (2.0 * radius + perigee + apogee);
        let mut orbit = Orbit {
            perigee,
            apogee,
            semi_major_axis,
            velocity_perigee: 0.0,
            velocity_apogee: 0.0,
            radius,
            mu,
        };
        if apogee > perigee {
            orbit.velocity_perigee = orbit.calc_velocity_elliptical(semi_major_axis, perigee);
            orbit.velocity_apogee = orbit.calc_velocity_elliptical(semi_major_axis, apogee);
        } else {
            orbit.velocity_perigee = orbit.calc_velocity_circular(perigee);
            orbit.velocity_apogee = orbit.calc_velocity_circular(apogee);
        }
        orbit
    }

    pub fn calc_velocity_elliptical(&self, semi_major_axis: f64, altitude: f64) -> f64 {
        (self.mu * (2.0 / (self.radius + altitude) - 1.0 / semi_major_axis))
            .max(0.0)
            .sqrt()
    }

    pub fn calc_velocity_circular(&self, altitude: f64) -> f64 {
        (self.mu / (self.radius + altitude)).sqrt()
    }

    pub fn is_circular(&self) -> bool {
        self.apogee <= self.perigee
    }
}

pub fn keplerian(position: &Vector3D, velocity: &Vector3D, mu: f64) -> (f64, f64) {
    let h_vec = position.cross(velocity);
    let h = h_vec.magnitude();
    let e_vec = velocity.cross(&h_vec) / mu - position.unit();
    let mut e = e_vec.magnitude();
    if e == 1.0 {
        e = 1.0 - 1e-16;
    }
    let p = h.powi(2) / mu;
    (p / (1.0 + e), p / (1.0 - e))
}

pub fn hohmann_delta_v(from_altitude: f64, to_altitude: f64) -> (f64, f64, f64) {
    let initial = Orbit::new(from_altitude, from_altitude);
    let target = Orbit::new(to_altitude, to_altitude);
    let transfer = Orbit::new(
        from_altitude.min(to_altitude),
        from_altitude.max(to_altitude),
    );

    let (burn_1, burn_2) = if to_altitude > from_altitude {
        (
            transfer.velocity_perigee - initial.velocity_perigee,
            target.velocity_apogee - transfer.velocity_apogee,
        )
    } else {
        (
            transfer.velocity_apogee - initial.velocity_apogee,
            target.velocity_perigee - transfer.velocity_perigee,
        )
    };
    ((burn_1 + burn_2).abs(), burn_1, burn_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_circular_orbit_speeds_match() {
        let orbit = Orbit::new(500_000.0, 500_000.0);
        assert_eq!(orbit.velocity_perigee, orbit.velocity_apogee);
        assert_abs_diff_eq!(orbit.velocity_apogee, 7612.6, epsilon = 1.0);
    }

    #[test]
    fn test_elliptical_perigee_faster_than_circular() {
        let orbit = Orbit::new(130_000.0, 500_000.0);
        let circular = orbit.calc_velocity_circular(130_000.0);
        assert!(orbit.velocity_perigee > circular);
        assert!(orbit.velocity_apogee < orbit.calc_velocity_circular(500_000.0));
    }

    #[test]
    fn test_keplerian_circular_state() {
        let r = EARTH_RADIUS_EQUATOR + 200_000.0;
        let v = (MU_EARTH / r).sqrt();
        let (perigee, apogee) = keplerian(
            &Vector3D::new(r, 0.0, 0.0),
            &Vector3D::new(0.0, v, 0.0),
            MU_EARTH,
        );
        assert_relative_eq!(perigee, r, max_relative = 1e-9);
        assert_relative_eq!(apogee, r, max_relative = 1e-9);
    }

    #[test]
    fn test_keplerian_matches_orbit_speeds() {
        let orbit = Orbit::new(200_000.0, 800_000.0);
        let r = EARTH_RADIUS_EQUATOR + 200_000.0;
        let (perigee, apogee) = keplerian(
            &Vector3D::new(0.0, 0.0, r),
            &Vector3D::new(orbit.velocity_perigee, 0.0, 0.0),
            MU_EARTH,
        );
        assert_relative_eq!(perigee, r, max_relative = 1e-9);
        assert_relative_eq!(apogee, EARTH_RADIUS_EQUATOR + 800_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_hohmann_symmetry() {
        let (up, _, _) = hohmann_delta_v(200_000.0, 35_786_000.0);
        let (down, _, _) = hohmann_delta_v(35_786_000.0, 200_000.0);
        assert_abs_diff_eq!(up, 3_935.0, epsilon = 20.0);
        assert_relative_eq!(up, down, max_relative = 1e-9);
    }
}
