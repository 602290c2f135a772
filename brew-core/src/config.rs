use serde::{Deserialize, Serialize};

use crate::units::{BURNER_ENERGY, MASH_HEAT_LOSS, ROOM_TEMP};

/// Physical constants of the brewing setup used by the timeline simulation.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BrewhouseConfig {
    /// Ambient temperature in °C; also the temperature of tap water.
    pub room_temp: f64,
    /// Burner output in kJ per hour.
    pub burner_energy: f64,
    /// Mash temperature loss in °C per hour.
    pub mash_heat_loss: f64,
}

impl Default for BrewhouseConfig {
    fn default() -> Self {
        Self {
            room_temp: ROOM_TEMP,
            burner_energy: BURNER_ENERGY,
            mash_heat_loss: MASH_HEAT_LOSS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_profile() {
        let c: BrewhouseConfig = serde_json::from_str(r#"{"burnerEnergy": 12000}"#).unwrap();
        assert_relative_eq!(c.burner_energy, 12000.0);
        assert_relative_eq!(c.room_temp, 23.0);
        assert_relative_eq!(c.mash_heat_loss, 5.0);
    }
}
