use std::fmt;

use crate::control::flight::FlightPhase;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankReading {
    pub fuel: f64,
    pub oxidizer: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub time: f64,
    pub phase: FlightPhase,
    pub acceleration: Vector3D,
    pub position: Vector3D,
    pub velocity: Vector3D,
    pub position_relative: Vector3D,
    pub velocity_relative: Vector3D,
    pub tanks: Vec<TankReading>,
    pub mass: f64,
    pub altitude: f64,
    pub dynamic_pressure: f64,
    pub speed: f64,
    pub downrange: f64,
}

pub trait FlightRecorder {
    fn record(&mut self, sample: TelemetrySample);
}

#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub samples: Vec<TelemetrySample>,
    max_altitude: f64,
    max_speed: f64,
    max_dynamic_pressure: f64,
    max_acceleration: f64,
    phase_times: Vec<(FlightPhase, f64)>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase_times(&self) -> &[(FlightPhase, f64)] {
        &self.phase_times
    }

    pub fn summary(&self) -> FlightSummary {
        let last = self.samples.last();
        FlightSummary {
            duration: last.map_or(0.0, |s| s.time),
            samples: self.samples.len(),
            max_altitude: self.max_altitude,
            max_speed: self.max_speed,
            max_dynamic_pressure: self.max_dynamic_pressure,
            max_acceleration: self.max_acceleration,
            final_mass: last.map_or(0.0, |s| s.mass),
            downrange: last.map_or(0.0, |s| s.downrange),
            phases: self.phase_times.clone(),
        }
    }

    pub fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 3600.0 {
            let hours = (elapsed_time / 3600.0).floor();
            let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
        } else if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    pub fn format_altitude(altitude: f64) -> String {
        if altitude >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }
}

impl FlightRecorder for Telemetry {
    fn record(&mut self, sample: TelemetrySample) {
        self.max_altitude = self.max_altitude.max(sample.altitude);
        self.max_speed = self.max_speed.max(sample.speed);
        self.max_dynamic_pressure = self.max_dynamic_pressure.max(sample.dynamic_pressure);
        self.max_acceleration = self.max_acceleration.max(sample.acceleration.magnitude());

        match self.phase_times.last() {
            Some((phase, _)) if *phase == sample.phase => {}
            _ => self.phase_times.push((sample.phase, sample.time)),
        }
        self.samples.push(sample);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightSummary {
    pub duration: f64,
    pub samples: usize,
    pub max_altitude: f64,
    pub max_speed: f64,
    pub max_dynamic_pressure: f64,
    pub max_acceleration: f64,
    pub final_mass: f64,
    pub downrange: f64,
    pub phases: Vec<(FlightPhase, f64)>,
}

impl fmt::Display for FlightSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Flight Summary ---")?;
        writeln!(f, "Duration: {}", Telemetry::format_time(self.duration))?;
        writeln!(f, "Max Altitude: {}", Telemetry::format_altitude(self.max_altitude))?;
        writeln!(f, "Max Speed: {:.2} m/s", self.max_speed)?;
        writeln!(f, "Max Dynamic Pressure: {:.2} Pa", self.max_dynamic_pressure)?;
        writeln!(f, "Max Acceleration: {:.2} m/s²", self.max_acceleration)?;
        writeln!(f, "Final Mass: {:.2} kg", self.final_mass)?;
        writeln!(f, "Downrange: {}", Telemetry::format_altitude(self.downrange))?;
        writeln!(f, "--- Phases ---")?;
        for (phase, time) in &self.phases {
            writeln!(f, "{:?} at {}", phase, Telemetry::format_time(*time))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, phase: FlightPhase, altitude: f64, speed: f64) -> TelemetrySample {
        TelemetrySample {
            time,
            phase,
            acceleration: Vector3D::new(0.0, 0.0, 12.0),
            position: Vector3D::zeros(),
            velocity: Vector3D::zeros(),
            position_relative: Vector3D::zeros(),
            velocity_relative: Vector3D::zeros(),
            tanks: vec![TankReading {
                fuel: 10.0,
                oxidizer: 21.7,
            }],
            mass: 100.0 - time,
            altitude,
            dynamic_pressure: speed,
            speed,
            downrange: 0.0,
        }
    }

    #[test]
    fn test_tracks_maxima() {
        let mut telemetry = Telemetry::new();
        telemetry.record(sample(0.1, FlightPhase::PoweredAscent { stage: 0 }, 10.0, 5.0));
        telemetry.record(sample(0.2, FlightPhase::PoweredAscent { stage: 0 }, 30.0, 9.0));
        telemetry.record(sample(0.3, FlightPhase::PoweredAscent { stage: 0 }, 20.0, 7.0));

        let summary = telemetry.summary();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.max_altitude, 30.0);
        assert_eq!(summary.max_speed, 9.0);
        assert_eq!(summary.max_acceleration, 12.0);
        assert_eq!(summary.duration, 0.3);
    }

    #[test]
    fn test_records_phase_transitions_once() {
        let mut telemetry = Telemetry::new();
        telemetry.record(sample(0.1, FlightPhase::AwaitingLaunch, 0.0, 0.0));
        telemetry.record(sample(0.2, FlightPhase::PoweredAscent { stage: 0 }, 1.0, 1.0));
        telemetry.record(sample(0.3, FlightPhase::PoweredAscent { stage: 0 }, 2.0, 2.0));
        telemetry.record(sample(0.4, FlightPhase::EngineCutoff, 3.0, 3.0));

        let phases: Vec<FlightPhase> = telemetry.phase_times().iter().map(|(p, _)| *p).collect();
        assert_eq!(
            phases,
            vec![
                FlightPhase::AwaitingLaunch,
                FlightPhase::PoweredAscent { stage: 0 },
                FlightPhase::EngineCutoff,
            ]
        );
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(Telemetry::format_time(5.0), "5.00s");
        assert_eq!(Telemetry::format_time(125.5), "2m 5.50s");
        assert_eq!(Telemetry::format_altitude(1500.0), "1.50 km");
    }

    #[test]
    fn test_summary_display() {
        let mut telemetry = Telemetry::new();
        telemetry.record(sample(1.0, FlightPhase::EngineCutoff, 2000.0, 3.0));
        let text = telemetry.summary().to_string();
        assert!(text.contains("Max Altitude: 2.00 km"));
        assert!(text.contains("EngineCutoff"));
    }
}
