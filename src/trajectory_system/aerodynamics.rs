use crate::constants::DRAG_CUTOFF_ALTITUDE;
use crate::control::environment::Environment;
use crate::control::vehicle::{RecoveryStatus, SimulatedBody, Vehicle};
use crate::utils::vector3d::Vector3D;

/// Drag coefficient scaled through the transonic rise and supersonic relaxation.
pub fn drag_coefficient(cd: f64, mach: f64) -> f64 {
    if (0.8..1.0).contains(&mach) {
        cd * (1.0 + (mach - 0.8) / 0.2)
    } else if (1.0..3.0).contains(&mach) {
        cd * (1.0 + (3.0 - mach) / 2.0)
    } else {
        cd
    }
}

pub fn mach_number(speed: f64, speed_of_sound: f64) -> f64 {
    if speed_of_sound <= 0.0 {
        0.0
    } else {
        speed / speed_of_sound
    }
}

pub fn dynamic_pressure(density: f64, speed: f64) -> f64 {
    0.5 * density * speed.powi(2)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aerodynamics {
    pub drag_coefficient: f64,
    pub surface_area: f64,
}

impl Aerodynamics {
    pub fn new(drag_coefficient: f64, surface_area: f64) -> Self {
        Aerodynamics {
            drag_coefficient,
            surface_area,
        }
    }

    pub fn drag(&self, environment: &Environment, altitude: f64, speed: f64) -> f64 {
        if altitude >= DRAG_CUTOFF_ALTITUDE {
            return 0.0;
        }
        let atmosphere = &environment.atmosphere;
        let mach = mach_number(speed, atmosphere.speed_of_sound(altitude));
        let cd = drag_coefficient(self.drag_coefficient, mach);
        cd * dynamic_pressure(atmosphere.density(altitude), speed) * self.surface_area
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccelerationModel<'a> {
    environment: &'a Environment,
}

impl<'a> AccelerationModel<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        AccelerationModel { environment }
    }

    pub fn gravity(&self, position: &Vector3D) -> Vector3D {
        let g = self.environment.planet.gravity(position.magnitude());
        -position.unit() * g
    }

    pub fn drag_force(&self, body: &dyn SimulatedBody, air_velocity: &Vector3D) -> f64 {
        let altitude = body.altitude(self.environment.planet.as_ref());
        let aero = Aerodynamics::new(body.drag_coefficient(), body.drag_area());
        aero.drag(self.environment, altitude, air_velocity.magnitude())
    }

    pub fn drag(&self, body: &dyn SimulatedBody, air_velocity: Vector3D) -> Vector3D {
        let mass = body.mass();
        if mass <= 0.0 {
            return Vector3D::zeros();
        }
        -air_velocity.unit() * (self.drag_force(body, &air_velocity) / mass)
    }

    // velocity against the atmosphere turning under the body's current position
    pub fn air_velocity(&self, body: &dyn SimulatedBody) -> Vector3D {
        let position = body.position();
        body.velocity() - self.environment.planet.surface_velocity(&position)
    }

    pub fn thrust(&self, vehicle: &Vehicle, separation: f64) -> f64 {
        let altitude = vehicle.altitude(self.environment.planet.as_ref());
        let ambient = self.environment.atmosphere.ambient_pressure(altitude);
        vehicle.active_stage().thrust(ambient, self.environment.sea_level_pressure()) * separation
    }

    pub fn stack(&self, vehicle: &Vehicle, separation: f64) -> Vector3D {
        let mass = vehicle.mass();
        let thrust = if mass > 0.0 {
            vehicle.orientation.unit() * (self.thrust(vehicle, separation) / mass)
        } else {
            Vector3D::zeros()
        };
        thrust + self.drag(vehicle, vehicle.velocity_relative()) + self.gravity(&vehicle.position())
    }

    pub fn body(
        &self,
        body: &dyn SimulatedBody,
        status: RecoveryStatus,
        stack: Vector3D,
    ) -> Vector3D {
        match status {
            RecoveryStatus::Attached => stack,
            RecoveryStatus::Descending => {
                self.drag(body, self.air_velocity(body)) + self.gravity(&body.position())
            }
            RecoveryStatus::Landed => Vector3D::zeros(),
        }
    }
}
