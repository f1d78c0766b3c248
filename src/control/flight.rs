//! Flight sequencer: drives one ascent from the pad through staging, cutoff
//! and the optional circularization burn.
//!
//! A [`Simulation`] borrows the vehicle mutably for exactly one run. Every
//! event (staging, SECO, jettison, landing) is evaluated once per step on
//! the post-integration state.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, info, trace, warn};

use crate::config::Params;
use crate::control::environment::Environment;
use crate::control::launch_stages::Stage;
use crate::control::propulsion::delta_v;
use crate::control::vehicle::{RecoveryStatus, Vehicle};
use crate::errors::SimulationError;
use crate::telemetry_system::telemetry::{FlightRecorder, TankReading, TelemetrySample};
use crate::trajectory_system::aerodynamics::{dynamic_pressure, AccelerationModel};
use crate::trajectory_system::orbit::{keplerian, Orbit};
use crate::trajectory_system::pitchover::{rotation_axis, PitchoverProfile};
use crate::utils::vector3d::Vector3D;

pub const SEARCH_STEP: f64 = 0.1;
pub const MAX_SEARCH_STEPS: usize = 10_000_000;
const SEARCH_PASSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    AwaitingLaunch,
    PoweredAscent { stage: usize },
    StageSeparationCoast { stage: usize },
    EngineCutoff,
    CircularizationCoast,
    CircularizationBurn,
    CircularizationComplete,
    Terminal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub elapsed: f64,
    pub step_count: u64,
    pub hold_steps: u64,
    pub separation_coast: Option<f64>,
    pub ascent_complete: bool,
    pub seco: bool,
    pub exhausted: bool,
    pub last_altitude: f64,
    pub burn_started_at: Option<f64>,
    pub circularized: bool,
    pub impacted: bool,
}

/// Final-stage propellant held back for the circularization burn,
/// engine start quantities included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularizationReserve {
    pub fuel: f64,
    pub oxidizer: f64,
    pub converged: bool,
}

impl CircularizationReserve {
    pub fn propellant(&self) -> f64 {
        self.fuel + self.oxidizer
    }
}

/// Propellant that yields `required` delta-v from `initial_mass`, found by
/// stepping the final mass down in [`SEARCH_STEP`] decrements.
///
/// Returns `(propellant, converged)`; the search gives up when the final
/// mass would reach zero or after [`MAX_SEARCH_STEPS`].
pub fn circularization_propellant(initial_mass: f64, isp: f64, required: f64) -> (f64, bool) {
    let mut final_mass = initial_mass;
    let mut dv = 0.0;
    let mut steps = 0;
    while dv < required {
        if steps >= MAX_SEARCH_STEPS || final_mass - SEARCH_STEP <= 0.0 {
            return (initial_mass - final_mass, false);
        }
        final_mass -= SEARCH_STEP;
        dv = delta_v(isp, initial_mass, final_mass);
        steps += 1;
    }
    (initial_mass - final_mass, true)
}

pub fn circularization_reserve(
    stage: &Stage,
    target: &Orbit,
    injection: &Orbit,
) -> CircularizationReserve {
    let required = target.velocity_apogee - injection.velocity_apogee;
    let isp = stage.engine.isp(true);
    let base = stage.dry_mass + stage.fuel_residual + stage.oxidizer_residual;

    let mut propellant = 0.0;
    let mut converged = true;
    for _ in 0..SEARCH_PASSES {
        let (estimate, ok) = circularization_propellant(base + propellant, isp, required);
        propellant = estimate;
        converged = ok;
    }
    if !converged {
        warn!(required, propellant, "circularization propellant search hit its bound");
    }

    let (fuel, oxidizer) = stage.engine.split(propellant);
    let start = stage.engine.start();
    let engines = stage.engines_firing() as f64;
    CircularizationReserve {
        fuel: fuel + start.fuel * engines,
        oxidizer: oxidizer + start.oxidizer * engines,
        converged,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub orbit_achieved: bool,
    pub elapsed: f64,
    pub perigee_altitude: f64,
    pub apogee_altitude: f64,
    pub propellant_remaining: f64,
    /// Final-stage propellant beyond the circularization reserve and residuals.
    pub final_stage_margin: f64,
    pub circularized: bool,
    pub booster_downrange: Option<f64>,
    /// Payload-adjusted propellant margin on success, velocity deficit on failure.
    pub fitness: f64,
    pub final_phase: FlightPhase,
}

pub struct Simulation<'a> {
    vehicle: &'a mut Vehicle,
    params: &'a Params,
    environment: &'a Environment,
    profile: PitchoverProfile,
    injection: Orbit,
    target: Orbit,
    reserve: CircularizationReserve,
    phase: FlightPhase,
    control: ControlState,
    recorder: Option<&'a mut dyn FlightRecorder>,
}

impl<'a> Simulation<'a> {
    pub fn new(
        vehicle: &'a mut Vehicle,
        params: &'a Params,
        environment: &'a Environment,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        let planet = environment.planet.as_ref();
        let target = Orbit::around(planet, params.target.perigee, params.target.apogee);
        let injection = Orbit::around(planet, params.target.injection, params.target.apogee);

        let trajectory = &params.trajectory;
        let profile = PitchoverProfile::new(
            trajectory.pitchover_angle,
            vehicle.orientation,
            rotation_axis(&vehicle.position(), params.launch_site.azimuth),
            (trajectory.pitchover_start, trajectory.pitchover_end),
            params.simulation.timestep,
        );
        let reserve = circularization_reserve(vehicle.last_stage(), &target, &injection);

        Ok(Simulation {
            vehicle,
            params,
            environment,
            profile,
            injection,
            target,
            reserve,
            phase: FlightPhase::AwaitingLaunch,
            control: ControlState::default(),
            recorder: None,
        })
    }

    pub fn with_recorder(mut self, recorder: &'a mut dyn FlightRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    pub fn vehicle(&self) -> &Vehicle {
        &*self.vehicle
    }

    pub fn injection(&self) -> &Orbit {
        &self.injection
    }

    pub fn reserve(&self) -> &CircularizationReserve {
        &self.reserve
    }

    pub fn profile(&self) -> &PitchoverProfile {
        &self.profile
    }

    pub fn run(&mut self) -> Result<SimulationOutcome, SimulationError> {
        self.vehicle.orbit = false;
        self.start()?;

        while self.check_launch_phase()? {
            self.step()?;
        }

        self.vehicle.orbit = self.check_orbit_status();
        info!(
            elapsed = self.control.elapsed,
            orbit = self.vehicle.orbit,
            altitude = self.altitude(),
            "ascent finished"
        );

        if self.vehicle.orbit && self.params.simulation.circularize {
            self.control.last_altitude = self.altitude();
            while self.check_circularization_status()? {
                self.step()?;
            }
        }

        Ok(self.outcome())
    }

    pub fn start(&mut self) -> Result<(), SimulationError> {
        self.vehicle.active_stage_mut().startup()?;
        self.vehicle.refresh_mass();
        debug!(mass = self.vehicle.mass, "engine startup complete");
        Ok(())
    }

    pub fn step(&mut self) -> Result<(), SimulationError> {
        let dt = self.params.simulation.timestep;
        if self.control.hold_steps < self.hold_target() {
            self.control.hold_steps += 1;
            return Ok(());
        }

        self.control.step_count += 1;
        self.control.elapsed = self.control.step_count as f64 * dt;
        self.update_orientation();

        let separation = self.separation();
        let model = AccelerationModel::new(self.environment);
        let stack = model.stack(&*self.vehicle, separation);
        if self.params.simulation.recover {
            self.integrate_separated_bodies(&model, stack, dt);
        }
        self.vehicle.kinematics.update(stack, dt);

        if let Some(coast) = self.control.separation_coast.as_mut() {
            *coast += dt;
            if *coast >= self.params.trajectory.coast_time {
                self.control.separation_coast = None;
            }
        }

        self.vehicle.active_stage_mut().burn(dt, separation)?;
        self.check_fairing_jettison();
        self.vehicle.refresh_mass();

        if !self.control.ascent_complete {
            let stage = self.vehicle.active_stage;
            let phase = if self.control.separation_coast.is_some() {
                FlightPhase::StageSeparationCoast { stage }
            } else {
                FlightPhase::PoweredAscent { stage }
            };
            self.set_phase(phase);
        }

        self.record(&model, stack);
        Ok(())
    }

    /// Evaluates the ascent events; `false` ends the ascent loop.
    pub fn check_launch_phase(&mut self) -> Result<bool, SimulationError> {
        if self.control.elapsed >= self.params.simulation.max_duration {
            warn!(elapsed = self.control.elapsed, "flight duration cap reached");
            self.control.ascent_complete = true;
            self.set_phase(FlightPhase::Terminal);
            return Ok(false);
        }

        if self.control.step_count > 0 && self.altitude() < 0.0 {
            warn!(
                elapsed = self.control.elapsed,
                downrange = self.vehicle.downrange(self.environment.planet.radius()),
                "vehicle impacted the ground"
            );
            self.control.impacted = true;
            self.control.ascent_complete = true;
            self.vehicle.active_stage_mut().throttle = 0.0;
            self.set_phase(FlightPhase::Terminal);
            return Ok(false);
        }

        if !self.control.ascent_complete {
            if self.apogee_reached() {
                self.seco()?;
            } else if !self.check_stage_status()? {
                self.control.exhausted = true;
                self.control.ascent_complete = true;
                self.vehicle.active_stage_mut().throttle = 0.0;
                self.set_phase(FlightPhase::EngineCutoff);
                info!(
                    elapsed = self.control.elapsed,
                    stage = self.vehicle.active_stage,
                    "final stage exhausted short of target apogee"
                );
            }
        }

        if !self.params.simulation.recover {
            return Ok(!self.control.ascent_complete);
        }
        if !self.control.ascent_complete {
            return Ok(true);
        }
        self.check_landings();
        Ok(self.recovery_in_progress())
    }

    /// Separates the active stage once fuel or oxidizer falls to its
    /// threshold. Returns `false` when the final stage is exhausted.
    pub fn check_stage_status(&mut self) -> Result<bool, SimulationError> {
        let last = self.vehicle.is_final_stage();
        let stage = self.vehicle.active_stage();
        let (fuel_limit, oxidizer_limit) = if last {
            (
                self.reserve.fuel + stage.fuel_residual,
                self.reserve.oxidizer + stage.oxidizer_residual,
            )
        } else {
            (
                stage.fuel_residual + stage.fuel_shutdown,
                stage.oxidizer_residual + stage.oxidizer_shutdown,
            )
        };

        if stage.fuel_mass() > fuel_limit && stage.oxidizer_mass() > oxidizer_limit {
            return Ok(true);
        }
        if last {
            return Ok(false);
        }
        self.separate_stage()?;
        Ok(true)
    }

    /// Drops the spent stage, starts the next one and enters the staging coast.
    pub fn separate_stage(&mut self) -> Result<(), SimulationError> {
        let spent = self.vehicle.active_stage;
        let next = spent + 1;
        let kinematics = self.vehicle.kinematics;

        if !self.vehicle.fairing.jettisoned {
            let fairing = self.vehicle.fairing.mass;
            self.vehicle.stages[spent].fairing_mass = 0.0;
            self.vehicle.stages[next].fairing_mass += fairing;
            self.vehicle.stages[next].update_mass();
        }
        self.vehicle.stages[spent].separate(kinematics);

        self.vehicle.active_stage = next;
        self.control.separation_coast = Some(0.0);
        self.vehicle.active_stage_mut().startup()?;
        self.vehicle.refresh_mass();

        let radius = self.environment.planet.radius();
        info!(
            elapsed = self.control.elapsed,
            stage = next,
            altitude = self.altitude(),
            downrange = kinematics.downrange(&self.vehicle.initial_position, radius),
            "stage separation"
        );
        self.set_phase(FlightPhase::StageSeparationCoast { stage: next });
        Ok(())
    }

    pub fn seco(&mut self) -> Result<(), SimulationError> {
        self.vehicle.active_stage_mut().shutdown()?;
        self.vehicle.refresh_mass();
        self.control.seco = true;
        self.control.ascent_complete = true;
        info!(
            elapsed = self.control.elapsed,
            altitude = self.altitude(),
            speed = self.vehicle.velocity().magnitude(),
            "SECO"
        );
        self.set_phase(FlightPhase::EngineCutoff);
        Ok(())
    }

    /// True when the target apogee is reached and the active stage still
    /// holds its circularization reserve plus residuals.
    pub fn check_orbit_status(&mut self) -> bool {
        if !self.apogee_reached() {
            return false;
        }
        let planet = self.environment.planet.as_ref();
        let radius = planet.radius();
        let (perigee, apogee) = self.osculating();
        self.injection = Orbit::around(planet, perigee - radius, apogee - radius);
        self.reserve =
            circularization_reserve(self.vehicle.last_stage(), &self.target, &self.injection);

        let stage = self.vehicle.active_stage();
        stage.fuel_mass() > self.reserve.fuel + stage.fuel_residual
            && stage.oxidizer_mass() > self.reserve.oxidizer + stage.oxidizer_residual
    }

    /// Coast to apogee, then burn at full throttle to circular speed.
    /// Returns `false` when the sequence is over.
    pub fn check_circularization_status(&mut self) -> Result<bool, SimulationError> {
        if self.control.elapsed >= self.params.simulation.max_duration {
            warn!(elapsed = self.control.elapsed, "flight duration cap reached");
            self.set_phase(FlightPhase::Terminal);
            return Ok(false);
        }

        let altitude = self.altitude();
        match self.phase {
            FlightPhase::EngineCutoff | FlightPhase::CircularizationCoast => {
                self.set_phase(FlightPhase::CircularizationCoast);
                if altitude < self.control.last_altitude {
                    let planet = self.environment.planet.as_ref();
                    self.target = Orbit::around(planet, altitude, altitude);
                    self.vehicle.active_stage_mut().restart(1.0)?;
                    self.vehicle.refresh_mass();
                    self.control.burn_started_at = Some(self.control.elapsed);
                    info!(elapsed = self.control.elapsed, altitude, "circularization burn");
                    self.set_phase(FlightPhase::CircularizationBurn);
                }
            }
            FlightPhase::CircularizationBurn => {
                if self.vehicle.velocity().magnitude() >= self.target.velocity_apogee {
                    self.vehicle.active_stage_mut().throttle = 0.0;
                    self.control.circularized = true;
                    info!(elapsed = self.control.elapsed, altitude, "orbit circularized");
                    self.set_phase(FlightPhase::CircularizationComplete);
                    return Ok(false);
                }
                let stage = self.vehicle.active_stage();
                if stage.fuel_mass() <= stage.fuel_residual
                    || stage.oxidizer_mass() <= stage.oxidizer_residual
                {
                    warn!(elapsed = self.control.elapsed, "propellant exhausted during circularization");
                    return Ok(self.abort_burn());
                }
                let started = self.control.burn_started_at.unwrap_or(self.control.elapsed);
                if self.control.elapsed - started >= self.params.simulation.max_burn_duration {
                    warn!(elapsed = self.control.elapsed, "circularization burn timed out");
                    return Ok(self.abort_burn());
                }
            }
            _ => return Ok(false),
        }

        self.control.last_altitude = altitude;
        Ok(true)
    }

    fn abort_burn(&mut self) -> bool {
        self.vehicle.active_stage_mut().throttle = 0.0;
        self.set_phase(FlightPhase::Terminal);
        false
    }

    pub fn outcome(&self) -> SimulationOutcome {
        let planet = self.environment.planet.as_ref();
        let radius = planet.radius();
        let (perigee_altitude, apogee_altitude) = if planet.mu() > 0.0 {
            let (perigee, apogee) = self.osculating();
            (perigee - radius, apogee - radius)
        } else {
            (0.0, 0.0)
        };

        let last = self.vehicle.last_stage();
        let final_stage_margin = last.prop_mass
            - (self.reserve.propellant() + last.fuel_residual + last.oxidizer_residual);
        let propellant_remaining = self.vehicle.propellant_remaining();
        let payload = self.vehicle.payload;
        let fitness = if self.vehicle.orbit {
            propellant_remaining - payload
        } else {
            payload + self.injection.velocity_perigee - self.vehicle.velocity().magnitude()
        };

        let booster = &self.vehicle.stages[0];
        let booster_downrange = (self.vehicle.stages.len() > 1 && booster.separated)
            .then(|| booster.kinematics.downrange(&self.vehicle.initial_position, radius));

        SimulationOutcome {
            orbit_achieved: self.vehicle.orbit,
            elapsed: self.control.elapsed,
            perigee_altitude,
            apogee_altitude,
            propellant_remaining,
            final_stage_margin,
            circularized: self.control.circularized,
            booster_downrange,
            fitness,
            final_phase: self.phase,
        }
    }

    fn hold_target(&self) -> u64 {
        (self.params.simulation.launch_hold / self.params.simulation.timestep).round() as u64
    }

    fn separation(&self) -> f64 {
        if self.control.separation_coast.is_some() {
            0.0
        } else {
            1.0
        }
    }

    fn altitude(&self) -> f64 {
        self.vehicle.altitude(self.environment.planet.as_ref())
    }

    fn osculating(&self) -> (f64, f64) {
        keplerian(
            &self.vehicle.position(),
            &self.vehicle.velocity(),
            self.environment.planet.mu(),
        )
    }

    fn apogee_reached(&self) -> bool {
        let planet = self.environment.planet.as_ref();
        if planet.mu() <= 0.0 {
            return false;
        }
        let (_, apogee) = self.osculating();
        // negative apogee radius: hyperbolic
        apogee < 0.0 || apogee >= planet.radius() + self.params.target.apogee
    }

    fn set_phase(&mut self, phase: FlightPhase) {
        if self.phase != phase {
            debug!(elapsed = self.control.elapsed, from = ?self.phase, to = ?phase, "phase change");
            self.phase = phase;
        }
    }

    /// Vertical before the pitchover window, scheduled inside it, then
    /// following the air-relative velocity.
    fn update_orientation(&mut self) {
        let elapsed = self.control.elapsed;
        let vehicle = &mut *self.vehicle;

        if elapsed < self.profile.start {
            vehicle.orientation = vehicle.position().unit();
        } else if self.profile.contains(elapsed) {
            vehicle.orientation = self.profile.orientation_at(elapsed);
        } else if vehicle.orbit {
            vehicle.orientation = vehicle.velocity().unit();
        } else {
            let position = vehicle.position();
            let velocity_relative = vehicle.velocity_relative();
            let v_angle = position.angle(&velocity_relative);
            let o_angle = position.angle(&vehicle.orientation);

            if o_angle < v_angle {
                if v_angle > FRAC_PI_2 {
                    let rotation = (v_angle - FRAC_PI_2).min(v_angle - o_angle);
                    vehicle.orientation = vehicle
                        .orientation
                        .rotate_about(&self.profile.axis, rotation);
                } else {
                    vehicle.orientation = velocity_relative.unit();
                }
            }
        }
    }

    fn integrate_separated_bodies(&mut self, model: &AccelerationModel, stack: Vector3D, dt: f64) {
        for stage in self.vehicle.stages.iter_mut() {
            if stage.recovery == RecoveryStatus::Descending {
                let acceleration = model.body(&*stage, stage.recovery, stack);
                stage.kinematics.update(acceleration, dt);
            }
        }
        let fairing = &mut self.vehicle.fairing;
        if fairing.recovery == RecoveryStatus::Descending {
            let acceleration = model.body(&*fairing, fairing.recovery, stack);
            fairing.kinematics.update(acceleration, dt);
        }
    }

    fn check_fairing_jettison(&mut self) {
        if self.vehicle.fairing.jettisoned
            || self.altitude() < self.vehicle.fairing.jettison_altitude
        {
            return;
        }
        let kinematics = self.vehicle.kinematics;
        let stage = self.vehicle.active_stage_mut();
        stage.fairing_mass = 0.0;
        stage.update_mass();
        self.vehicle.fairing.jettison(kinematics);
        info!(elapsed = self.control.elapsed, altitude = self.altitude(), "fairing jettison");
    }

    fn check_landings(&mut self) {
        let planet = self.environment.planet.as_ref();
        for stage in self.vehicle.stages.iter_mut() {
            if stage.recovery == RecoveryStatus::Descending
                && planet.altitude(&stage.kinematics.position()).round() <= 0.0
            {
                stage.recovery = RecoveryStatus::Landed;
                info!(elapsed = self.control.elapsed, stage = stage.index, "stage landed");
            }
        }
        let fairing = &mut self.vehicle.fairing;
        if fairing.recovery == RecoveryStatus::Descending
            && planet.altitude(&fairing.kinematics.position()).round() <= 0.0
        {
            fairing.recovery = RecoveryStatus::Landed;
            info!(elapsed = self.control.elapsed, "fairing landed");
        }
    }

    fn recovery_in_progress(&self) -> bool {
        self.vehicle
            .stages
            .iter()
            .any(|s| s.recovery == RecoveryStatus::Descending)
            || self.vehicle.fairing.recovery == RecoveryStatus::Descending
    }

    fn record(&mut self, model: &AccelerationModel, stack: Vector3D) {
        if self.recorder.is_none() {
            return;
        }
        let planet = self.environment.planet.as_ref();
        let vehicle = &*self.vehicle;
        let position = vehicle.position();
        let velocity_relative = vehicle.velocity_relative();
        let altitude = vehicle.altitude(planet);

        let sample = TelemetrySample {
            time: self.control.elapsed,
            phase: self.phase,
            acceleration: stack - model.gravity(&position),
            position,
            velocity: vehicle.velocity(),
            position_relative: vehicle.kinematics.position_relative(),
            velocity_relative,
            tanks: vehicle
                .stages
                .iter()
                .map(|s| TankReading {
                    fuel: s.fuel_mass(),
                    oxidizer: s.oxidizer_mass(),
                })
                .collect(),
            mass: vehicle.mass,
            altitude,
            dynamic_pressure: dynamic_pressure(
                self.environment.atmosphere.density(altitude),
                velocity_relative.magnitude(),
            ),
            speed: vehicle.velocity().magnitude(),
            downrange: vehicle.downrange(planet.radius()),
        };
        trace!(time = sample.time, altitude, mass = sample.mass, "step");

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(sample);
        }
    }
}
