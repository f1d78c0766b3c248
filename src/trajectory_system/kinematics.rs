use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisState {
    pub p: f64,
    pub v: f64,
}

impl AxisState {
    pub fn new(p: f64, v: f64) -> Self {
        AxisState { p, v }
    }

    pub fn step(&mut self, a: f64, dt: f64) {
        let k1_p = self.v;
        let k1_v = a;
        let k2_p = self.v + k1_v * dt / 2.0;
        let k2_v = a;
        let k3_p = self.v + k2_v * dt / 2.0;
        let k3_v = a;
        let k4_p = self.v + k3_v * dt;
        let k4_v = a;

        self.p += dt / 6.0 * (k1_p + 2.0 * k2_p + 2.0 * k3_p + k4_p);
        self.v += dt / 6.0 * (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateVector {
    pub axes: [AxisState; 3],
}

impl StateVector {
    pub fn new(position: Vector3D, velocity: Vector3D) -> Self {
        StateVector {
            axes: [
                AxisState::new(position.x, velocity.x),
                AxisState::new(position.y, velocity.y),
                AxisState::new(position.z, velocity.z),
            ],
        }
    }

    pub fn step(&mut self, acceleration: Vector3D, dt: f64) {
        for (axis, a) in self.axes.iter_mut().zip(acceleration.as_array()) {
            axis.step(a, dt);
        }
    }

    pub fn position(&self) -> Vector3D {
        Vector3D::from_array(self.axes.map(|s| s.p))
    }

    pub fn velocity(&self) -> Vector3D {
        Vector3D::from_array(self.axes.map(|s| s.v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub absolute: StateVector,
    pub relative: StateVector,
}

impl Kinematics {
    pub fn new(position: Vector3D, velocity: Vector3D) -> Self {
        Kinematics {
            absolute: StateVector::new(position, velocity),
            relative: StateVector::new(position, Vector3D::zeros()),
        }
    }

    pub fn update(&mut self, acceleration: Vector3D, dt: f64) {
        self.absolute.step(acceleration, dt);
        self.relative.step(acceleration, dt);
    }

    pub fn position(&self) -> Vector3D {
        self.absolute.position()
    }

    pub fn velocity(&self) -> Vector3D {
        self.absolute.velocity()
    }

    pub fn position_relative(&self) -> Vector3D {
        self.relative.position()
    }

    pub fn velocity_relative(&self) -> Vector3D {
        self.relative.velocity()
    }

    pub fn downrange(&self, origin: &Vector3D, radius: f64) -> f64 {
        origin.angle(&self.position_relative()) * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_acceleration_is_linear() {
        for &dt in &[0.1, 0.25, 0.5, 1.0] {
            let mut state = AxisState::new(3.0, 7.5);
            let steps = (10.0 / dt) as usize;
            for _ in 0..steps {
                state.step(0.0, dt);
            }
            assert_relative_eq!(state.p, 3.0 + 7.5 * 10.0, epsilon = 1e-9);
            assert_eq!(state.v, 7.5);
        }
    }

    #[test]
    fn test_constant_acceleration_is_exact() {
        let mut state = AxisState::new(0.0, 2.0);
        for _ in 0..100 {
            state.step(-9.8, 0.1);
        }
        let t = 10.0;
        assert_relative_eq!(state.p, 2.0 * t - 0.5 * 9.8 * t * t, epsilon = 1e-8);
        assert_relative_eq!(state.v, 2.0 - 9.8 * t, epsilon = 1e-10);
    }

    #[test]
    fn test_step_is_deterministic() {
        let mut a = AxisState::new(1.0, 2.0);
        let mut b = a;
        a.step(3.3, 0.1);
        b.step(3.3, 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_relative_frame_starts_at_rest() {
        let position = Vector3D::new(6_378_137.0, 0.0, 0.0);
        let mut kinematics = Kinematics::new(position, Vector3D::new(0.0, 465.0, 0.0));
        assert_eq!(kinematics.velocity_relative(), Vector3D::zeros());

        kinematics.update(Vector3D::new(10.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(kinematics.velocity().x, 10.0);
        assert_relative_eq!(kinematics.velocity_relative().x, 10.0);
        assert_relative_eq!(kinematics.velocity().y, 465.0);
        assert_relative_eq!(kinematics.position().y, 465.0);
        assert_relative_eq!(kinematics.position_relative().y, 0.0);
    }
}
