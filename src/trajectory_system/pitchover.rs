use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, PartialEq)]
pub struct PitchoverProfile {
    pub angle: f64,
    pub start: f64,
    pub end: f64,
    pub axis: Vector3D,
    maneuver: Vec<Vector3D>,
    timestep: f64,
}

pub fn rotation_axis(position: &Vector3D, azimuth: f64) -> Vector3D {
    let up = position.unit();
    let mut east = Vector3D::new(0.0, 0.0, 1.0).cross(&up);
    if east.magnitude() == 0.0 {
        east = Vector3D::new(0.0, 1.0, 0.0);
    }
    east.unit().rotate_about(&up, -azimuth.to_radians())
}

impl PitchoverProfile {
    pub fn new(
        angle: f64,
        initial_orientation: Vector3D,
        axis: Vector3D,
        window: (f64, f64),
        timestep: f64,
    ) -> Self {
        let (start, end) = window;
        let intermediates = ((end - start) / timestep).round().max(0.0) as usize;
        let segments = (intermediates + 1) as f64;

        let maneuver = (0..=intermediates + 1)
            .map(|j| {
                let theta = -(angle * j as f64 / segments).to_radians();
                initial_orientation.rotate_about(&axis, theta)
            })
            .collect();

        PitchoverProfile {
            angle,
            start,
            end,
            axis,
            maneuver,
            timestep,
        }
    }

    pub fn contains(&self, elapsed: f64) -> bool {
        elapsed >= self.start && elapsed < self.end
    }

    pub fn orientation_at(&self, elapsed: f64) -> Vector3D {
        let index = ((elapsed - self.start) / self.timestep).round().max(0.0) as usize;
        let last = self.maneuver.len().saturating_sub(1);
        self.maneuver[index.min(last)]
    }

    pub fn final_orientation(&self) -> Vector3D {
        self.maneuver.last().copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn equator() -> Vector3D {
        Vector3D::new(6_378_137.0, 0.0, 0.0)
    }

    #[test]
    fn test_profile_spans_window() {
        let position = equator();
        let axis = rotation_axis(&position, 90.0);
        let profile = PitchoverProfile::new(4.0, position.unit(), axis, (15.0, 20.0), 0.1);

        assert_eq!(profile.maneuver.len(), 52);
        assert_relative_eq!(
            profile.orientation_at(15.0).angle(&position),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            profile.final_orientation().angle(&position).to_degrees(),
            4.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_east_azimuth_tilts_east() {
        let position = equator();
        let axis = rotation_axis(&position, 90.0);
        let profile = PitchoverProfile::new(5.0, position.unit(), axis, (0.0, 1.0), 0.1);
        // east at (r, 0, 0) is +y
        assert!(profile.final_orientation().y > 0.0);
        assert_relative_eq!(profile.final_orientation().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_north_azimuth_tilts_north() {
        let position = equator();
        let axis = rotation_axis(&position, 0.0);
        let profile = PitchoverProfile::new(5.0, position.unit(), axis, (0.0, 1.0), 0.1);
        assert!(profile.final_orientation().z > 0.0);
        assert_relative_eq!(profile.final_orientation().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_increase_uniformly() {
        let position = equator();
        let axis = rotation_axis(&position, 45.0);
        let profile = PitchoverProfile::new(3.0, position.unit(), axis, (10.0, 11.0), 0.1);
        let step = 3.0 / 11.0;
        for j in 0..profile.maneuver.len() {
            let t = 10.0 + j as f64 * 0.1;
            let angle = profile.orientation_at(t).angle(&position).to_degrees();
            assert_relative_eq!(angle, (j as f64 * step).min(3.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_step_boundaries_pick_nearest_entry() {
        let position = equator();
        let axis = rotation_axis(&position, 90.0);
        let profile = PitchoverProfile::new(2.0, position.unit(), axis, (15.0, 20.0), 0.1);
        let step = 2.0 / 51.0;

        // elapsed is step_count * dt, which lands just below or above the grid
        for count in [151_u32, 163, 177, 199] {
            let elapsed = count as f64 * 0.1;
            let expected = (count - 150) as f64 * step;
            for t in [elapsed - 1e-9, elapsed, elapsed + 1e-9] {
                let angle = profile.orientation_at(t).angle(&position).to_degrees();
                assert_relative_eq!(angle, expected, epsilon = 1e-9);
            }
        }
    }
}
