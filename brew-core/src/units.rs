//! Scalar conversions used by the recipe engine: mass, volume, temperature,
//! extract yield and colour scales. All functions are pure.

use serde::{Deserialize, Serialize};

/// Unit system used when phrasing weights, volumes and temperatures.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Room temperature in °C.
pub const ROOM_TEMP: f64 = 23.0;
/// Burner output in kJ per hour.
pub const BURNER_ENERGY: f64 = 9000.0;
/// Mash temperature loss in °C per hour.
pub const MASH_HEAT_LOSS: f64 = 5.0;

/// SRM thresholds and their colour names, ascending.
const COLOR_NAMES: [(f64, &str); 12] = [
    (2.0, "pale straw"),
    (3.0, "straw"),
    (4.0, "yellow"),
    (6.0, "gold"),
    (9.0, "amber"),
    (14.0, "deep amber"),
    (17.0, "copper"),
    (18.0, "deep copper"),
    (22.0, "brown"),
    (30.0, "dark brown"),
    (35.0, "very dark brown"),
    (40.0, "black"),
];

/// Imperial weight split into whole pounds and remaining ounces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LbOz {
    pub lb: f64,
    pub oz: f64,
}

pub fn kg_to_lb(kg: f64) -> f64 {
    kg * 2.20462
}

pub fn lb_to_kg(lb: f64) -> f64 {
    lb / 2.20462
}

pub fn kg_to_lb_oz(kg: f64) -> LbOz {
    let lb = kg_to_lb(kg);
    LbOz {
        lb: lb.floor(),
        oz: (lb - lb.floor()) * 16.0,
    }
}

pub fn lb_oz_to_kg(lb: f64, oz: f64) -> f64 {
    lb_to_kg(lb + oz / 16.0)
}

pub fn liters_to_gallons(liters: f64) -> f64 {
    liters * 0.264172
}

pub fn gallons_to_liters(gallons: f64) -> f64 {
    gallons / 0.264172
}

pub fn liters_per_kg_to_quarts_per_lb(l_per_kg: f64) -> f64 {
    l_per_kg * 0.479305709
}

pub fn c_to_f(c: f64) -> f64 {
    c * 1.8 + 32.0
}

pub fn f_to_c(f: f64) -> f64 {
    (f - 32.0) / 1.8
}

/// Extract yield (%) to points per pound per gallon.
pub fn yield_to_ppg(yield_pct: f64) -> f64 {
    yield_pct * 0.46214
}

pub fn ppg_to_yield(ppg: f64) -> f64 {
    ppg * 2.16385
}

pub fn srm_to_ebc(srm: f64) -> f64 {
    srm * 1.97
}

pub fn ebc_to_srm(ebc: f64) -> f64 {
    ebc * 0.508
}

pub fn srm_to_lovibond(srm: f64) -> f64 {
    (srm + 0.76) / 1.3546
}

pub fn lovibond_to_srm(lovibond: f64) -> f64 {
    1.3546 * lovibond - 0.76
}

/// Approximate RGB triplet for a colour in degrees SRM.
pub fn srm_to_rgb(srm: f64) -> [u8; 3] {
    let channel = |base: f64, factor: f64| (base * factor.powf(srm)).clamp(0.0, 255.0).round() as u8;
    [channel(255.0, 0.975), channel(245.0, 0.88), channel(220.0, 0.7)]
}

pub fn srm_to_css(srm: f64) -> String {
    let [r, g, b] = srm_to_rgb(srm);
    format!("rgb({r}, {g}, {b})")
}

/// Name of the darkest colour band whose threshold is at or below `srm`.
pub fn srm_to_name(srm: f64) -> &'static str {
    COLOR_NAMES
        .iter()
        .take_while(|(threshold, _)| *threshold <= srm)
        .last()
        .map_or(COLOR_NAMES[0].1, |(_, name)| name)
}

/// Minutes needed to raise `liters` of water by `degrees` °C with a burner
/// of `burner_energy` kJ/h (specific heat 4.19 kJ/kg·K).
pub fn time_to_heat(liters: f64, degrees: f64, burner_energy: f64) -> f64 {
    let kj = 4.19 * liters * degrees;
    kj / burner_energy * 60.0
}

/// Format a number with at most one decimal, dropping a trailing `.0`.
pub fn fmt_num(x: f64) -> String {
    let v = (x * 10.0).round() / 10.0;
    if (v - v.round()).abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_round_trip() {
        assert_relative_eq!(c_to_f(100.0), 212.0, epsilon = 1e-9);
        assert_relative_eq!(f_to_c(c_to_f(68.0)), 68.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lb_oz_split() {
        let w = kg_to_lb_oz(1.0); // 2.20462 lb
        assert_relative_eq!(w.lb, 2.0);
        assert_relative_eq!(w.oz, 0.20462 * 16.0, epsilon = 1e-6);
        assert_relative_eq!(lb_oz_to_kg(w.lb, w.oz), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_color_names() {
        assert_eq!(srm_to_name(0.5), "pale straw");
        assert_eq!(srm_to_name(3.5), "straw");
        assert_eq!(srm_to_name(17.0), "copper");
        assert_eq!(srm_to_name(80.0), "black");
    }

    #[test]
    fn test_srm_to_css_pale() {
        assert_eq!(srm_to_css(0.0), "rgb(255, 245, 220)");
        let [r, g, b] = srm_to_rgb(40.0);
        assert!(r < 100 && g < 10 && b == 0);
    }

    #[test]
    fn test_time_to_heat() {
        // 10 l by 50 °C = 2095 kJ, at 9000 kJ/h ~ 13.97 min
        assert_relative_eq!(time_to_heat(10.0, 50.0, BURNER_ENERGY), 13.966_666, epsilon = 1e-5);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(68.0), "68");
        assert_eq!(fmt_num(154.400_000_000_001), "154.4");
        assert_eq!(fmt_num(2.25), "2.3");
    }
}
