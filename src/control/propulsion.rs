use crate::config::{Consumables, EngineParams};
use crate::constants::G0;
use crate::utils::math::constrain_normalized;

pub fn delta_v(isp: f64, initial_mass: f64, final_mass: f64) -> f64 {
    if final_mass <= 0.0 || initial_mass <= 0.0 {
        return 0.0;
    }
    isp * G0 * (initial_mass / final_mass).ln()
}

#[derive(Debug, Clone)]
pub struct Engine {
    params: EngineParams,
}

impl Engine {
    pub fn new(params: &EngineParams) -> Self {
        Engine {
            params: params.clone(),
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn mass(&self) -> f64 {
        self.params.mass
    }

    pub fn thrust(&self, ambient_pressure: f64, sea_level_pressure: f64) -> f64 {
        let p = constrain_normalized(ambient_pressure, 0.0, sea_level_pressure);
        self.params.thrust_vac - p * (self.params.thrust_vac - self.params.thrust_sl)
    }

    pub fn isp(&self, vacuum: bool) -> f64 {
        if vacuum {
            self.params.isp_vac
        } else {
            self.params.isp_sl
        }
    }

    pub fn mass_flow(&self) -> f64 {
        self.params.mass_flow
    }

    pub fn fuel_flow(&self) -> f64 {
        self.params.mass_flow / (1.0 + self.params.of_ratio)
    }

    pub fn oxidizer_flow(&self) -> f64 {
        self.params.mass_flow * self.params.of_ratio / (1.0 + self.params.of_ratio)
    }

    pub fn split(&self, propellant: f64) -> (f64, f64) {
        let fuel = propellant / (1.0 + self.params.of_ratio);
        (fuel, propellant - fuel)
    }

    pub fn purge_rate(&self) -> f64 {
        self.params.purge_rate
    }

    pub fn chill(&self) -> Consumables {
        self.params.chill
    }

    pub fn start(&self) -> Consumables {
        self.params.start
    }

    pub fn shutdown(&self) -> Consumables {
        self.params.shutdown
    }

    pub fn non_propulsive(&self) -> Consumables {
        let (c, s, d) = (self.params.chill, self.params.start, self.params.shutdown);
        Consumables::new(
            c.fuel + s.fuel + d.fuel,
            c.oxidizer + s.oxidizer + d.oxidizer,
            c.nitrogen + s.nitrogen + d.nitrogen,
        )
    }

    pub fn burn_duration(&self, propellant: f64, engines: usize, throttle: f64) -> f64 {
        let flow = self.params.mass_flow * engines as f64 * throttle;
        if flow <= 0.0 {
            return f64::INFINITY;
        }
        propellant / flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engine() -> Engine {
        Engine::new(&EngineParams::default())
    }

    #[test]
    fn test_thrust_interpolation() {
        let engine = engine();
        let p_sl = 101_325.0;
        assert_relative_eq!(engine.thrust(p_sl, p_sl), engine.params().thrust_sl);
        assert_relative_eq!(engine.thrust(0.0, p_sl), engine.params().thrust_vac);

        let half = engine.thrust(p_sl / 2.0, p_sl);
        let mid = 0.5 * (engine.params().thrust_sl + engine.params().thrust_vac);
        assert_relative_eq!(half, mid, epsilon = 1e-9);
    }

    #[test]
    fn test_thrust_clamps_above_sea_level_pressure() {
        let engine = engine();
        assert_relative_eq!(
            engine.thrust(120_000.0, 101_325.0),
            engine.params().thrust_sl
        );
    }

    #[test]
    fn test_flow_split_by_mixture_ratio() {
        let engine = engine();
        assert_relative_eq!(
            engine.fuel_flow() + engine.oxidizer_flow(),
            engine.mass_flow(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            engine.oxidizer_flow() / engine.fuel_flow(),
            2.17,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_vacuum_isp_matches_thrust_over_flow() {
        let engine = engine();
        let isp = engine.params().thrust_vac / (engine.mass_flow() * G0);
        assert_relative_eq!(isp, engine.isp(true), max_relative = 0.01);
    }

    #[test]
    fn test_delta_v() {
        assert_relative_eq!(
            delta_v(300.0, 10_000.0, 1_000.0),
            300.0 * G0 * 10.0_f64.ln(),
            epsilon = 1e-9
        );
        assert_eq!(delta_v(300.0, 10.0, 0.0), 0.0);
    }

    #[test]
    fn test_burn_duration() {
        let engine = engine();
        let duration = engine.burn_duration(engine.mass_flow() * 100.0, 2, 0.5);
        assert_relative_eq!(duration, 100.0, epsilon = 1e-9);
        assert!(engine.burn_duration(10.0, 1, 0.0).is_infinite());
    }
}
