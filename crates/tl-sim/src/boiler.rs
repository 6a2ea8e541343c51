//! Water boiler plant: delayed heating and proportional heat loss.
//!
//! Each `advance` call:
//! 1. queues `heating_gain * power * dt` (zero when `power <= 0`: the boiler
//!    cannot cool)
//! 2. applies the increment queued `delay_steps` calls ago
//! 3. clamps to `max_temperature` (boiling point)
//! 4. loses `temperature * loss_coefficient * dt` to the surroundings
//! 5. reports the temperature rounded to `display_decimals`

use serde::{Deserialize, Serialize};
use tl_core::{round_to_decimals, sanitize_dt};

use crate::delay::DelayLine;
use crate::error::{SimError, SimResult};
use crate::model::Plant;

/// Boiler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerParams {
    /// Water temperature at creation.
    pub initial_temperature: f64,
    /// Number of `advance` calls between heating and its effect.
    pub delay_steps: usize,
    /// Temperature rise per unit power per second.
    pub heating_gain: f64,
    /// Fraction of the temperature lost per second.
    pub loss_coefficient: f64,
    /// Upper physical bound (boiling point).
    pub max_temperature: f64,
    /// Decimal places of the reported temperature.
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,
}

fn default_display_decimals() -> u32 {
    1
}

impl Default for BoilerParams {
    fn default() -> Self {
        Self {
            initial_temperature: 45.0,
            delay_steps: 30,
            heating_gain: 10.0,
            loss_coefficient: 0.05,
            max_temperature: 100.0,
            display_decimals: default_display_decimals(),
        }
    }
}

impl BoilerParams {
    pub fn validate(&self) -> SimResult<()> {
        if !self.initial_temperature.is_finite() {
            return Err(SimError::InvalidConfiguration {
                what: "initial_temperature must be finite",
            });
        }
        if !(self.heating_gain.is_finite() && self.heating_gain >= 0.0) {
            return Err(SimError::InvalidConfiguration {
                what: "heating_gain must be finite and non-negative",
            });
        }
        if !(self.loss_coefficient.is_finite() && self.loss_coefficient >= 0.0) {
            return Err(SimError::InvalidConfiguration {
                what: "loss_coefficient must be finite and non-negative",
            });
        }
        if self.max_temperature.is_nan() {
            return Err(SimError::InvalidConfiguration {
                what: "max_temperature must not be NaN",
            });
        }
        if self.initial_temperature > self.max_temperature {
            return Err(SimError::InvalidConfiguration {
                what: "initial_temperature exceeds max_temperature",
            });
        }
        if self.display_decimals > 12 {
            return Err(SimError::InvalidConfiguration {
                what: "display_decimals must be at most 12",
            });
        }
        Ok(())
    }
}

/// Simulated water boiler.
#[derive(Debug, Clone)]
pub struct Boiler {
    params: BoilerParams,
    temperature: f64,
    delay: DelayLine,
}

impl Boiler {
    pub fn new(params: BoilerParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            temperature: params.initial_temperature,
            delay: DelayLine::new(params.delay_steps),
            params,
        })
    }

    pub fn params(&self) -> &BoilerParams {
        &self.params
    }

    /// Full-precision water temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Heating increments still in transit.
    pub fn delay_line(&self) -> &DelayLine {
        &self.delay
    }

    /// Heating increment queued for `power` over `dt`. Non-finite power heats
    /// nothing.
    fn heating_increment(&self, power: f64, dt: f64) -> f64 {
        if power.is_finite() && power > 0.0 {
            self.params.heating_gain * power * dt
        } else {
            0.0
        }
    }
}

impl Plant for Boiler {
    fn measurement(&self) -> f64 {
        self.temperature
    }

    fn reported(&self) -> f64 {
        round_to_decimals(self.temperature, self.params.display_decimals)
    }

    fn advance(&mut self, power: f64, dt: f64) -> f64 {
        // Degenerate steps still shift the delay line, but add and lose nothing.
        let dt = sanitize_dt(dt).unwrap_or(0.0);

        let increment = self.heating_increment(power, dt);
        self.temperature += self.delay.push_pop(increment);
        if self.temperature > self.params.max_temperature {
            self.temperature = self.params.max_temperature;
        }

        self.temperature -= self.temperature * self.params.loss_coefficient * dt;
        self.reported()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn queue_length_constant(
            depth in 0_usize..50,
            steps in prop::collection::vec((-300.0_f64..300.0_f64, -0.1_f64..0.1_f64), 0..200),
        ) {
            let mut boiler = Boiler::new(BoilerParams { delay_steps: depth, ..BoilerParams::default() }).unwrap();
            for (power, dt) in steps {
                boiler.advance(power, dt);
                prop_assert_eq!(boiler.delay_line().len(), depth);
            }
        }

        #[test]
        fn never_exceeds_boiling_point(
            depth in 0_usize..40,
            steps in prop::collection::vec((0.0_f64..1.0e4_f64, 0.0_f64..0.5_f64), 1..300),
        ) {
            let mut boiler = Boiler::new(BoilerParams { delay_steps: depth, ..BoilerParams::default() }).unwrap();
            for (power, dt) in steps {
                let reported = boiler.advance(power, dt);
                prop_assert!(boiler.temperature() <= 100.0);
                prop_assert!(reported <= 100.0);
            }
        }

        #[test]
        fn no_spontaneous_heating(
            temperature in 0.0_f64..100.0_f64,
            loss in 0.0_f64..1.0_f64,
            power in -1.0e3_f64..=0.0_f64,
            dt in 1.0e-4_f64..1.0_f64,
        ) {
            let mut boiler = Boiler::new(BoilerParams {
                initial_temperature: temperature,
                loss_coefficient: loss,
                ..BoilerParams::default()
            }).unwrap();
            let before = boiler.temperature();
            boiler.advance(power, dt);
            prop_assert!(boiler.temperature() <= before);
            if loss > 0.0 && before > 0.0 {
                prop_assert!(boiler.temperature() < before);
            }
        }
    }
}
