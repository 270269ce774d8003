use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ui::ConcentrationGauge;

pub const DEFAULT_MAX_CONCENTRATION: f32 = 100.0;
pub const DEFAULT_DECREASE_PER_SECOND: f32 = 0.5;
pub const DEFAULT_DECREASE_PER_INTERACTION: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentrationConfig {
    pub max: f32,
    pub decrease_per_second: f32,
    pub decrease_per_interaction: f32,
}

impl Default for ConcentrationConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_CONCENTRATION,
            decrease_per_second: DEFAULT_DECREASE_PER_SECOND,
            decrease_per_interaction: DEFAULT_DECREASE_PER_INTERACTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcentrationState {
    Active,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcentrationEvent {
    GameOver,
}

/// Decaying resource. `GameOver` is terminal and reported exactly once.
#[derive(Debug, Clone)]
pub struct ConcentrationMeter {
    config: ConcentrationConfig,
    value: f32,
    state: ConcentrationState,
}

impl ConcentrationMeter {
    pub fn new(config: ConcentrationConfig) -> Self {
        let max = if config.max.is_finite() {
            config.max.max(0.0)
        } else {
            warn!(max = config.max, "concentration_max_invalid");
            0.0
        };
        Self {
            config: ConcentrationConfig { max, ..config },
            value: max,
            state: ConcentrationState::Active,
        }
    }

    pub fn config(&self) -> ConcentrationConfig {
        self.config
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.config.max
    }

    pub fn fraction(&self) -> f32 {
        if self.config.max <= 0.0 {
            0.0
        } else {
            self.value / self.config.max
        }
    }

    pub fn state(&self) -> ConcentrationState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == ConcentrationState::GameOver
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32) -> Option<ConcentrationEvent> {
        if !fixed_dt_seconds.is_finite() || fixed_dt_seconds <= 0.0 {
            return None;
        }
        self.decrease(self.config.decrease_per_second * fixed_dt_seconds)
    }

    pub fn decrease_on_interact(&mut self) -> Option<ConcentrationEvent> {
        let event = self.decrease(self.config.decrease_per_interaction);
        debug!(value = self.value, "concentration_interaction_charged");
        event
    }

    pub fn configure_gauge(&self, gauge: &mut dyn ConcentrationGauge) {
        gauge.configure(self.config.max, self.value);
    }

    pub fn sync_gauge(&self, gauge: &mut dyn ConcentrationGauge) {
        gauge.set_value(self.value);
    }

    fn decrease(&mut self, amount: f32) -> Option<ConcentrationEvent> {
        if self.is_game_over() {
            return None;
        }
        if amount.is_finite() && amount > 0.0 {
            self.value = (self.value - amount).max(0.0);
        }
        if self.value > 0.0 {
            return None;
        }
        self.state = ConcentrationState::GameOver;
        info!(max = self.config.max, "concentration_depleted");
        Some(ConcentrationEvent::GameOver)
    }
}

impl Default for ConcentrationMeter {
    fn default() -> Self {
        Self::new(ConcentrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::ui::GaugeState;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn ten_seconds_then_one_interaction() {
        let mut meter = ConcentrationMeter::default();
        assert_eq!(meter.value(), 100.0);

        for _ in 0..600 {
            assert_eq!(meter.tick(DT), None);
        }
        assert!((meter.value() - 95.0).abs() < 0.01, "{}", meter.value());

        assert_eq!(meter.decrease_on_interact(), None);
        assert!((meter.value() - 90.0).abs() < 0.01, "{}", meter.value());
    }

    #[test]
    fn game_over_fires_once_and_freezes_value() {
        let mut meter = ConcentrationMeter::new(ConcentrationConfig {
            max: 12.0,
            decrease_per_second: 1.0,
            decrease_per_interaction: 5.0,
        });

        assert_eq!(meter.decrease_on_interact(), None);
        assert_eq!(meter.decrease_on_interact(), None);
        assert_eq!(
            meter.decrease_on_interact(),
            Some(ConcentrationEvent::GameOver)
        );
        assert_eq!(meter.value(), 0.0);
        assert!(meter.is_game_over());

        for _ in 0..120 {
            assert_eq!(meter.tick(DT), None);
            assert_eq!(meter.decrease_on_interact(), None);
        }
        assert_eq!(meter.value(), 0.0);
        assert_eq!(meter.state(), ConcentrationState::GameOver);
    }

    #[test]
    fn value_never_goes_negative() {
        let mut meter = ConcentrationMeter::new(ConcentrationConfig {
            max: 3.0,
            decrease_per_second: 50.0,
            decrease_per_interaction: 7.0,
        });
        let mut game_over_events = 0;
        for step in 0..200 {
            let event = if step % 3 == 0 {
                meter.decrease_on_interact()
            } else {
                meter.tick(0.25)
            };
            game_over_events += usize::from(event.is_some());
            assert!(meter.value() >= 0.0);
        }
        assert_eq!(game_over_events, 1);
    }

    #[test]
    fn tick_depletion_transitions_immediately() {
        let mut meter = ConcentrationMeter::new(ConcentrationConfig {
            max: 1.0,
            decrease_per_second: 2.0,
            decrease_per_interaction: 0.0,
        });
        assert_eq!(meter.tick(0.25), None);
        assert_eq!(meter.tick(0.25), Some(ConcentrationEvent::GameOver));
    }

    #[test]
    fn invalid_dt_is_ignored() {
        let mut meter = ConcentrationMeter::default();
        meter.tick(f32::NAN);
        meter.tick(-1.0);
        meter.tick(0.0);
        assert_eq!(meter.value(), 100.0);
    }

    #[test]
    fn gauge_follows_meter() {
        let mut meter = ConcentrationMeter::default();
        let mut gauge = GaugeState::default();
        meter.configure_gauge(&mut gauge);
        assert_eq!((gauge.max, gauge.value), (100.0, 100.0));

        meter.decrease_on_interact();
        meter.sync_gauge(&mut gauge);
        assert_eq!(gauge.value, 95.0);
        assert!((gauge.fraction() - meter.fraction()).abs() < f32::EPSILON);
    }
}
