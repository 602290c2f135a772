//! Mash profiles: an ordered list of temperature holds.

use serde::{Deserialize, Serialize};

use crate::units::{self, UnitSystem, fmt_num};

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MashStepKind {
    #[default]
    #[serde(alias = "infusion")]
    Infusion,
    #[serde(alias = "temperature")]
    Temperature,
    #[serde(alias = "decoction")]
    Decoction,
}

/// One step of the mash, e.g. a saccharification rest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MashStep {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MashStepKind,
    /// Liters of water per kg of grain.
    pub water_ratio: f64,
    /// Target temperature in °C.
    pub temp: f64,
    /// Temperature at the end of the step, if known.
    pub end_temp: Option<f64>,
    /// Hold time in minutes.
    pub time: f64,
    /// Minutes to reach `temp`, if known.
    pub ramp_time: Option<f64>,
}

impl Default for MashStep {
    fn default() -> Self {
        Self {
            name: "Saccharification".to_string(),
            kind: MashStepKind::Infusion,
            water_ratio: 3.0,
            temp: 68.0,
            end_temp: None,
            time: 60.0,
            ramp_time: None,
        }
    }
}

impl MashStep {
    pub fn water_ratio_qt_per_lb(&self) -> f64 {
        units::liters_per_kg_to_quarts_per_lb(self.water_ratio)
    }

    pub fn temp_f(&self) -> f64 {
        units::c_to_f(self.temp)
    }

    pub fn end_temp_f(&self) -> Option<f64> {
        self.end_temp.map(units::c_to_f)
    }

    /// Describe the step. With a grain weight (kg) the absolute amount of
    /// water is given, otherwise the ratio.
    pub fn description(&self, system: UnitSystem, grain_weight: Option<f64>) -> String {
        let (absolute, relative, temp, ratio) = match system {
            UnitSystem::Metric => ("l", "l per kg", format!("{}C", fmt_num(self.temp)), self.water_ratio),
            UnitSystem::Imperial => (
                "qt",
                "qt per lb",
                format!("{}F", fmt_num(self.temp_f())),
                self.water_ratio_qt_per_lb(),
            ),
        };

        let water = match grain_weight {
            Some(kg) => {
                let grain = match system {
                    UnitSystem::Metric => kg,
                    UnitSystem::Imperial => units::kg_to_lb(kg),
                };
                format!("{:.1}{absolute}", ratio * grain)
            }
            None => format!("{ratio:.1} {relative} of grain"),
        };

        let time = fmt_num(self.time);
        match self.kind {
            MashStepKind::Infusion => format!("Infuse {water} for {time} minutes at {temp}"),
            MashStepKind::Temperature => {
                format!("Stop heating and hold for {time} minutes at {temp}")
            }
            MashStepKind::Decoction => {
                format!("Add {water} boiled water to reach {temp} and hold for {time} minutes")
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Mash {
    pub name: String,
    /// Grain temperature in °C; room temperature when unset.
    pub grain_temp: Option<f64>,
    /// Sparge water temperature in °C.
    pub sparge_temp: f64,
    pub ph: Option<f64>,
    pub notes: String,
    pub steps: Vec<MashStep>,
}

impl Default for Mash {
    fn default() -> Self {
        Self {
            name: String::new(),
            grain_temp: None,
            sparge_temp: 76.0,
            ph: None,
            notes: String::new(),
            steps: Vec::new(),
        }
    }
}

impl Mash {
    pub fn add_step(&mut self, step: MashStep) {
        self.steps.push(step);
    }

    pub fn grain_temp_f(&self) -> Option<f64> {
        self.grain_temp.map(units::c_to_f)
    }

    pub fn sparge_temp_f(&self) -> f64 {
        units::c_to_f(self.sparge_temp)
    }
}
