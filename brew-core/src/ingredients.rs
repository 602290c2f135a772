//! Recipe ingredients: fermentables, spices (hops and adjuncts) and yeast.
//!
//! Derived values are computed from the current fields on every call, so a
//! rescaled weight is reflected immediately.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::BrewError;
use crate::units::{self, LbOz};

/// Names that suggest an extract or sugar added to the boil.
const BOIL_PATTERN: &str = "candi|candy|dme|dry|extract|honey|lme|liquid|sugar|syrup|turbinado";
/// Names of specialty grains that only need steeping.
const STEEP_PATTERN: &str =
    "biscuit|black|cara|chocolate|crystal|munich|roast|special ?b|toast|victory|vienna";

pub const DEFAULT_FERMENTABLE_NAME: &str = "New Fermentable";
pub const DEFAULT_SPICE_NAME: &str = "New Spice";
pub const DEFAULT_YEAST_NAME: &str = "New Yeast";

/// Stage at which a fermentable enters the wort.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Addition {
    Mash,
    Steep,
    Boil,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FermentableKind {
    Grain,
    Extract,
}

static FERMENTABLE_KIND: LazyLock<Option<Classifier<FermentableKind>>> = LazyLock::new(|| {
    Classifier::new([(BOIL_PATTERN, FermentableKind::Extract)], FermentableKind::Grain).ok()
});

static FERMENTABLE_ADDITION: LazyLock<Option<Classifier<Addition>>> = LazyLock::new(|| {
    Classifier::new(
        [
            ("mash", Addition::Mash),
            ("steep", Addition::Steep),
            ("boil", Addition::Boil),
            (BOIL_PATTERN, Addition::Boil),
            (STEEP_PATTERN, Addition::Steep),
        ],
        Addition::Mash,
    )
    .ok()
});

/// Price per kg.
static FERMENTABLE_PRICE: LazyLock<Option<Classifier<f64>>> = LazyLock::new(|| {
    Classifier::new([("dry|dme", 8.80), ("liquid|lme", 6.60)], 4.40).ok()
});

static DRY_SPICE: LazyLock<Option<Classifier<bool>>> =
    LazyLock::new(|| Classifier::new([("primary|secondary|dry", true)], false).ok());

static YEAST_PRICE: LazyLock<Option<Classifier<f64>>> =
    LazyLock::new(|| Classifier::new([("wyeast|white labs|wlp", 7.00)], 3.50).ok());

const SPICE_PRICE_PER_KG: f64 = 17.64;

fn classify<T: Clone>(classifier: &Option<Classifier<T>>, name: &str, fallback: T) -> T {
    classifier.as_ref().map_or(fallback, |c| c.classify(name))
}

/// A fermentable, e.g. pale malt or liquid malt extract.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Fermentable {
    pub name: String,
    /// Weight in kg.
    pub weight: f64,
    /// Extract yield in percent.
    #[serde(rename = "yield")]
    pub yield_pct: f64,
    /// Colour in degrees SRM.
    pub color: f64,
    /// Added at the end of the boil.
    pub late: bool,
    /// Explicit addition stage; guessed from the name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addition: Option<Addition>,
    /// Explicit category; guessed from the name when absent.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FermentableKind>,
}

impl Default for Fermentable {
    fn default() -> Self {
        Self {
            name: DEFAULT_FERMENTABLE_NAME.to_string(),
            weight: 1.0,
            yield_pct: 75.0,
            color: 2.0,
            late: false,
            addition: None,
            kind: None,
        }
    }
}

impl Fermentable {
    pub fn kind(&self) -> FermentableKind {
        self.kind
            .unwrap_or_else(|| classify(&FERMENTABLE_KIND, &self.name, FermentableKind::Grain))
    }

    pub fn addition(&self) -> Addition {
        self.addition
            .unwrap_or_else(|| classify(&FERMENTABLE_ADDITION, &self.name, Addition::Mash))
    }

    pub fn weight_lb(&self) -> f64 {
        units::kg_to_lb(self.weight)
    }

    pub fn weight_lb_oz(&self) -> LbOz {
        units::kg_to_lb_oz(self.weight)
    }

    /// Points per pound per gallon.
    pub fn ppg(&self) -> f64 {
        units::yield_to_ppg(self.yield_pct)
    }

    /// Gravity units contributed when dissolved in `liters` of liquid.
    pub fn gu(&self, liters: f64) -> f64 {
        self.ppg() * self.weight_lb() / units::liters_to_gallons(liters)
    }

    /// Degrees Plato contributed when dissolved in `liters` of liquid.
    pub fn plato(&self, liters: f64) -> f64 {
        259.0 - (259.0 / (1.0 + self.gu(liters) / 1000.0))
    }

    pub fn color_rgb(&self) -> [u8; 3] {
        units::srm_to_rgb(self.color)
    }

    pub fn color_css(&self) -> String {
        units::srm_to_css(self.color)
    }

    pub fn color_name(&self) -> &'static str {
        units::srm_to_name(self.color)
    }

    pub fn price(&self) -> f64 {
        self.weight * classify(&FERMENTABLE_PRICE, &self.name, 4.40)
    }
}

/// Bitterness model used to estimate IBU.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum IbuMethod {
    #[default]
    Tinseth,
    Rager,
}

impl fmt::Display for IbuMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tinseth => f.write_str("tinseth"),
            Self::Rager => f.write_str("rager"),
        }
    }
}

impl FromStr for IbuMethod {
    type Err = BrewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tinseth" => Ok(Self::Tinseth),
            "rager" => Ok(Self::Rager),
            _ => Err(BrewError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for IbuMethod {
    type Error = BrewError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IbuMethod> for String {
    fn from(m: IbuMethod) -> Self {
        m.to_string()
    }
}

/// A spice, e.g. cascade hops or crushed coriander.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Spice {
    pub name: String,
    /// Weight in kg.
    pub weight: f64,
    /// Alpha acid percentage.
    pub aa: f64,
    /// Stage label: boil, steep, primary, secondary, dry...
    #[serde(rename = "use")]
    pub usage: String,
    /// Minutes of boil remaining, or days for dry additions.
    pub time: f64,
    /// Physical form: pellet, whole, leaf, ground...
    pub form: String,
}

impl Default for Spice {
    fn default() -> Self {
        Self {
            name: DEFAULT_SPICE_NAME.to_string(),
            weight: 0.025,
            aa: 0.0,
            usage: "boil".to_string(),
            time: 60.0,
            form: "pellet".to_string(),
        }
    }
}

impl Spice {
    /// Added to the fermenter rather than the kettle.
    pub fn is_dry(&self) -> bool {
        classify(&DRY_SPICE, &self.usage, false)
    }

    /// Pellets isomerize better than whole cones.
    pub fn utilization_factor(&self) -> f64 {
        if self.form == "pellet" { 1.15 } else { 1.0 }
    }

    /// IBU per kg of this spice for a wort of `gravity` in `batch_size` liters.
    fn bitterness_per_kg(&self, method: IbuMethod, gravity: f64, batch_size: f64) -> f64 {
        match method {
            IbuMethod::Tinseth => {
                1.65 * 0.000125_f64.powf(gravity - 1.0)
                    * ((1.0 - (-0.04 * self.time).exp()) / 4.15)
                    * (self.aa / 100.0 * 1_000_000.0 / batch_size)
                    * self.utilization_factor()
            }
            IbuMethod::Rager => {
                let utilization = 18.11 + 13.86 * ((self.time - 31.32) / 18.27).tanh();
                let adjustment = ((gravity - 1.050) / 0.2).max(0.0);
                100.0 * utilization * self.utilization_factor() * self.aa
                    / (batch_size * (1.0 + adjustment))
            }
        }
    }

    /// Bitterness in IBU, given the boil gravity and batch size in liters.
    pub fn bitterness(&self, method: IbuMethod, early_og: f64, batch_size: f64) -> f64 {
        self.weight * self.bitterness_per_kg(method, early_og, batch_size)
    }

    /// Weight in kg that yields `ibu` under the same conditions; the exact
    /// inverse of [`Spice::bitterness`].
    pub fn weight_for_bitterness(
        &self,
        method: IbuMethod,
        ibu: f64,
        early_og: f64,
        batch_size: f64,
    ) -> f64 {
        let per_kg = self.bitterness_per_kg(method, early_og, batch_size);
        if per_kg > 0.0 { ibu / per_kg } else { 0.0 }
    }

    pub fn weight_lb(&self) -> f64 {
        units::kg_to_lb(self.weight)
    }

    pub fn weight_lb_oz(&self) -> LbOz {
        units::kg_to_lb_oz(self.weight)
    }

    pub fn price(&self) -> f64 {
        self.weight * SPICE_PRICE_PER_KG
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Yeast {
    pub name: String,
    /// ale, lager, other
    #[serde(rename = "type")]
    pub kind: String,
    /// liquid, dry
    pub form: String,
    /// Apparent attenuation in percent.
    pub attenuation: f64,
}

impl Default for Yeast {
    fn default() -> Self {
        Self {
            name: DEFAULT_YEAST_NAME.to_string(),
            kind: "ale".to_string(),
            form: "liquid".to_string(),
            attenuation: 75.0,
        }
    }
}

impl Yeast {
    /// Price per package.
    pub fn price(&self) -> f64 {
        classify(&YEAST_PRICE, &self.name, 3.50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fermentable(name: &str) -> Fermentable {
        Fermentable {
            name: name.to_string(),
            ..Fermentable::default()
        }
    }

    fn hop(aa: f64, time: f64) -> Spice {
        Spice {
            name: "Cascade".to_string(),
            weight: 0.028,
            aa,
            time,
            ..Spice::default()
        }
    }

    #[test]
    fn test_fermentable_classification() {
        assert_eq!(fermentable("Pale Malt").addition(), Addition::Mash);
        assert_eq!(fermentable("Pale Malt").kind(), FermentableKind::Grain);
        assert_eq!(fermentable("Crystal 60").addition(), Addition::Steep);
        assert_eq!(fermentable("Light DME").addition(), Addition::Boil);
        assert_eq!(fermentable("Light DME").kind(), FermentableKind::Extract);
        // explicit stage keywords come before ingredient heuristics
        assert_eq!(fermentable("Munich (mash)").addition(), Addition::Mash);
        assert_eq!(fermentable("Honey (steep)").addition(), Addition::Steep);
    }

    #[test]
    fn test_explicit_addition_overrides_name() {
        let f = Fermentable {
            addition: Some(Addition::Mash),
            ..fermentable("Crystal 40")
        };
        assert_eq!(f.addition(), Addition::Mash);
    }

    #[test]
    fn test_fermentable_gu_and_price() {
        let f = Fermentable {
            name: "Pale Malt".to_string(),
            weight: 5.0,
            yield_pct: 80.0,
            color: 3.0,
            ..Fermentable::default()
        };
        let expected = 80.0 * 0.46214 * 5.0 * 2.20462 / (20.0 * 0.264172);
        assert_relative_eq!(f.gu(20.0), expected, epsilon = 1e-9);
        assert!(f.plato(20.0) > 0.0);
        assert_relative_eq!(f.price(), 22.0, epsilon = 1e-9);
        assert_relative_eq!(fermentable("Extra Light DME").price(), 8.80, epsilon = 1e-9);
        assert_relative_eq!(fermentable("Amber LME").price(), 6.60, epsilon = 1e-9);
        assert_eq!(f.color_name(), "straw");
    }

    #[test]
    fn test_tinseth_bitterness() {
        let h = hop(5.0, 60.0);
        let expected = 1.65
            * 0.000125_f64.powf(0.05)
            * ((1.0 - (-2.4_f64).exp()) / 4.15)
            * (0.05 * 0.028 * 1_000_000.0 / 20.0)
            * 1.15;
        assert_relative_eq!(h.bitterness(IbuMethod::Tinseth, 1.050, 20.0), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_rager_gravity_adjustment() {
        let h = hop(5.0, 60.0);
        let low = h.bitterness(IbuMethod::Rager, 1.040, 20.0);
        let high = h.bitterness(IbuMethod::Rager, 1.090, 20.0);
        assert!(low > high);
        // below 1.050 no adjustment applies
        assert_relative_eq!(low, h.bitterness(IbuMethod::Rager, 1.050, 20.0), epsilon = 1e-12);
    }

    #[test]
    fn test_bitterness_inverse_is_exact() {
        for method in [IbuMethod::Tinseth, IbuMethod::Rager] {
            for gravity in [1.030, 1.065, 1.110] {
                let h = hop(7.5, 45.0);
                let ibu = h.bitterness(method, gravity, 23.0);
                let weight = h.weight_for_bitterness(method, ibu, gravity, 23.0);
                assert_relative_eq!(weight, h.weight, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_pellet_utilization() {
        let pellet = hop(5.0, 60.0);
        let whole = Spice {
            form: "whole".to_string(),
            ..pellet.clone()
        };
        let ratio = pellet.bitterness(IbuMethod::Tinseth, 1.05, 20.0)
            / whole.bitterness(IbuMethod::Tinseth, 1.05, 20.0);
        assert_relative_eq!(ratio, 1.15, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_ibu_method() {
        let err = "garetz".parse::<IbuMethod>().unwrap_err();
        assert!(matches!(err, BrewError::UnsupportedMethod(ref m) if m == "garetz"));
        assert_eq!("Rager".parse::<IbuMethod>().unwrap(), IbuMethod::Rager);
    }

    #[test]
    fn test_dry_spice_and_yeast_price() {
        let dry = Spice {
            usage: "Secondary".to_string(),
            ..Spice::default()
        };
        assert!(dry.is_dry());
        assert!(!Spice::default().is_dry());

        let wyeast = Yeast {
            name: "Wyeast 1056".to_string(),
            ..Yeast::default()
        };
        assert_relative_eq!(wyeast.price(), 7.00);
        assert_relative_eq!(Yeast::default().price(), 3.50);
    }

    #[test]
    fn test_record_defaults() {
        let f: Fermentable = serde_json::from_str(r#"{"name": "Pilsner", "yield": 81}"#).unwrap();
        assert_relative_eq!(f.weight, 1.0);
        assert_relative_eq!(f.yield_pct, 81.0);
        let s: Spice = serde_json::from_str(r#"{"use": "dry hop", "time": 3}"#).unwrap();
        assert_eq!(s.name, DEFAULT_SPICE_NAME);
        assert!(s.is_dry());
    }
}
