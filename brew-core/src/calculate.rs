//! Recipe-level metrics: gravity, colour, bitterness, alcohol, cost.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::ingredients::{Addition, Fermentable, Spice, Yeast};
use crate::recipe::{BitternessStage, Recipe};
use crate::units;

/// Attenuation assumed when the recipe lists no yeast.
const DEFAULT_ATTENUATION: f64 = 75.0;
/// Carbonation target when the recipe does not set one.
const DEFAULT_CO2_VOLUMES: f64 = 2.5;

/// Values derived from a recipe by [`Recipe::calculate`].
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Original gravity.
    pub og: f64,
    /// Final gravity.
    pub fg: f64,
    /// Degrees SRM (Morey).
    pub color: f64,
    pub ibu: f64,
    /// Alcohol by volume, percent.
    pub abv: f64,
    pub price: f64,
    pub og_plato: f64,
    pub fg_plato: f64,
    /// Alcohol by weight, percent.
    pub abw: f64,
    pub real_extract: f64,
    /// Per serving.
    pub calories: f64,
    /// Priming sugar weights in kg.
    pub priming_corn_sugar: f64,
    pub priming_sugar: f64,
    pub priming_honey: f64,
    pub priming_dme: f64,
    pub bu_to_gu: f64,
    /// Balance value.
    pub bv: f64,
}

impl Metrics {
    pub fn color_name(&self) -> &'static str {
        units::srm_to_name(self.color)
    }
}

/// Ingredients grouped by when they enter the brew, each with the gravity
/// units or IBU it contributes.
#[derive(Clone, Debug, Default)]
pub struct TimelineMap<'a> {
    pub mash: Vec<(&'a Fermentable, f64)>,
    pub steep: Vec<(&'a Fermentable, f64)>,
    pub boil: Vec<(&'a Fermentable, f64)>,
    /// Late boil fermentables.
    pub boil_end: Vec<(&'a Fermentable, f64)>,
    /// Kettle spices keyed by whole minutes of boil remaining.
    pub times: BTreeMap<i64, Vec<(&'a Spice, f64)>>,
    /// Fermenter spices keyed by day.
    pub dry: BTreeMap<i64, Vec<(&'a Spice, f64)>>,
    pub yeast: Vec<&'a Yeast>,
}

/// A snapshot of a recipe and everything derived from it.
///
/// The snapshot borrows the recipe, so the recipe cannot change while the
/// derived values are in use.
#[derive(Clone, Debug)]
pub struct CalculatedRecipe<'a> {
    recipe: &'a Recipe,
    metrics: Metrics,
    map: TimelineMap<'a>,
}

impl<'a> CalculatedRecipe<'a> {
    pub fn recipe(&self) -> &'a Recipe {
        self.recipe
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn timeline_map(&self) -> &TimelineMap<'a> {
        &self.map
    }
}

/// Gravity in degrees Plato.
fn plato(gravity: f64) -> f64 {
    -463.37 + 668.72 * gravity - 205.35 * gravity * gravity
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

impl Recipe {
    /// Compute all derived metrics and bucket the ingredients for the
    /// brew-day timeline.
    pub fn calculate(&self) -> Result<CalculatedRecipe<'_>> {
        self.validate()?;

        let mut m = Metrics {
            og: 1.0,
            ..Metrics::default()
        };
        let mut map = TimelineMap::default();
        let early_og = self.early_og(self.boil_size);
        let mut mcu = 0.0;

        for f in &self.fermentables {
            let gu = f.gu(self.batch_size) * self.efficiency(f);
            m.og += gu / 1000.0;
            mcu += f.color * f.weight_lb() / self.batch_size_gallons();
            m.price += f.price();

            let bucket = match (f.addition(), f.late) {
                (Addition::Mash, _) => &mut map.mash,
                (Addition::Steep, _) => &mut map.steep,
                (Addition::Boil, false) => &mut map.boil,
                (Addition::Boil, true) => &mut map.boil_end,
            };
            bucket.push((f, gu));
        }
        m.color = 1.4922 * mcu.powf(0.6859);

        let mut attenuation: f64 = 0.0;
        for y in &self.yeast {
            attenuation = attenuation.max(y.attenuation);
            m.price += y.price();
            map.yeast.push(y);
        }
        if attenuation == 0.0 {
            attenuation = DEFAULT_ATTENUATION;
        }

        m.fg = m.og - (m.og - 1.0) * attenuation / 100.0;
        m.abv = (1.05 * (m.og - m.fg)) / m.fg / 0.79 * 100.0;
        m.og_plato = plato(m.og);
        m.fg_plato = plato(m.fg);
        m.real_extract = 0.1808 * m.og_plato + 0.8192 * m.fg_plato;
        m.abw = 0.79 * m.abv / m.fg;
        m.calories = ((6.9 * m.abw + 4.0 * (m.real_extract - 0.10)) * m.fg * self.serving_size * 10.0)
            .max(0.0);

        let volumes = if self.bottling_pressure != 0.0 {
            self.bottling_pressure
        } else {
            DEFAULT_CO2_VOLUMES
        };
        let temp_f = units::c_to_f(if self.bottling_temp != 0.0 {
            self.bottling_temp
        } else {
            units::ROOM_TEMP
        });
        m.priming_corn_sugar =
            0.015195 * 5.0 * (volumes - 3.0378 + 0.050062 * temp_f - 0.00026555 * temp_f * temp_f);
        m.priming_sugar = m.priming_corn_sugar * 0.90995;
        m.priming_honey = m.priming_corn_sugar * 1.22496;
        m.priming_dme = m.priming_corn_sugar * 1.33249;

        for s in &self.spices {
            let bitterness = match BitternessStage::of(s) {
                Some(BitternessStage::Boil) => s.bitterness(self.ibu_method, early_og, self.batch_size),
                Some(BitternessStage::Steep) => s.bitterness(self.ibu_method, m.og, self.batch_size),
                None => 0.0,
            };
            m.ibu += bitterness;
            m.price += s.price();

            let buckets = if s.is_dry() { &mut map.dry } else { &mut map.times };
            buckets.entry(s.time.round() as i64).or_default().push((s, bitterness));
        }

        m.bu_to_gu = ratio_or_zero(m.ibu, m.og - 1.0) / 1000.0;
        let rte = (0.82 * (m.fg - 1.0) + 0.18 * (m.og - 1.0)) * 1000.0;
        m.bv = ratio_or_zero(0.8 * m.ibu, rte);

        debug!(
            og = m.og,
            fg = m.fg,
            ibu = m.ibu,
            abv = m.abv,
            color = m.color,
            method = %self.ibu_method,
            "calculated recipe"
        );

        Ok(CalculatedRecipe {
            recipe: self,
            metrics: m,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrewError;
    use crate::ingredients::IbuMethod;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn single_malt() -> Recipe {
        Recipe::from_value(json!({
            "batchSize": 20,
            "boilSize": 23,
            "mashEfficiency": 75,
            "primaryDays": 0,
            "fermentables": [{"name": "Pale Malt", "weight": 5, "yield": 80, "color": 3}]
        }))
        .unwrap()
    }

    #[test]
    fn test_single_malt_metrics() {
        let r = single_malt();
        let calc = r.calculate().unwrap();
        let m = calc.metrics();

        let gu = 80.0 * 0.46214 * 5.0 * 2.20462 / (20.0 * 0.264172) * 0.75;
        assert_relative_eq!(m.og, 1.0 + gu / 1000.0, epsilon = 1e-12);
        assert!(m.og > 1.0);
        // no yeast: 75% default attenuation
        assert_relative_eq!(m.fg, m.og - (m.og - 1.0) * 0.75, epsilon = 1e-12);
        assert_relative_eq!(m.ibu, 0.0);
        assert_relative_eq!(m.price, 22.0, epsilon = 1e-9);
        assert_relative_eq!(m.bu_to_gu, 0.0);
        assert!(m.abv > 0.0 && m.calories > 0.0);
        assert!(m.og_plato > m.fg_plato);
    }

    #[test]
    fn test_default_attenuation() {
        // Gravity 1.050 with no yeast finishes at 1.0125
        let gu_needed = 50.0;
        let ppg = 80.0 * 0.46214;
        let weight_lb = gu_needed * units::liters_to_gallons(20.0) / ppg;
        let r = Recipe {
            fermentables: vec![Fermentable {
                name: "Extract".to_string(),
                weight: units::lb_to_kg(weight_lb),
                yield_pct: 80.0,
                ..Fermentable::default()
            }],
            ..Recipe::default()
        };
        let calc = r.calculate().unwrap();
        assert_relative_eq!(calc.metrics().og, 1.050, epsilon = 1e-9);
        assert_relative_eq!(calc.metrics().fg, 1.0125, epsilon = 1e-9);
    }

    #[test]
    fn test_highest_attenuation_wins() {
        let mut r = single_malt();
        r.add(Yeast {
            attenuation: 70.0,
            ..Yeast::default()
        });
        r.add(Yeast {
            attenuation: 82.0,
            ..Yeast::default()
        });
        let calc = r.calculate().unwrap();
        let m = calc.metrics();
        assert_relative_eq!(m.fg, m.og - (m.og - 1.0) * 0.82, epsilon = 1e-12);
        assert_eq!(calc.timeline_map().yeast.len(), 2);
    }

    #[test]
    fn test_morey_color() {
        let r = single_malt();
        let mcu = 3.0 * 5.0 * 2.20462 / (20.0 * 0.264172);
        let calc = r.calculate().unwrap();
        assert_relative_eq!(calc.metrics().color, 1.4922 * f64::powf(mcu, 0.6859), epsilon = 1e-9);
        assert_eq!(calc.metrics().color_name(), "yellow");
    }

    #[test]
    fn test_boil_hops_use_early_gravity() {
        let mut r = single_malt();
        r.add(Spice {
            name: "Magnum".to_string(),
            aa: 12.0,
            weight: 0.02,
            ..Spice::default()
        });
        let early = r.early_og(r.boil_size);
        let calc = r.calculate().unwrap();
        let expected = r.spices[0].bitterness(IbuMethod::Tinseth, early, 20.0);
        assert_relative_eq!(calc.metrics().ibu, expected, epsilon = 1e-9);
        // boil volume is larger than batch, so early gravity is lower than OG
        assert!(early < calc.metrics().og);

        let (_, stored) = calc.timeline_map().times[&60][0];
        assert_relative_eq!(stored, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_steep_hops_use_og_and_dry_hops_add_nothing() {
        let mut r = single_malt();
        r.add(Spice {
            aa: 5.0,
            usage: "Steep".to_string(),
            time: 30.0,
            ..Spice::default()
        });
        r.add(Spice {
            aa: 5.0,
            usage: "dry hop".to_string(),
            time: 4.0,
            ..Spice::default()
        });
        let calc = r.calculate().unwrap();
        let og = calc.metrics().og;
        let expected = r.spices[0].bitterness(IbuMethod::Tinseth, og, 20.0);
        assert_relative_eq!(calc.metrics().ibu, expected, epsilon = 1e-9);
        assert!(calc.timeline_map().dry.contains_key(&4));
        assert!(calc.timeline_map().times.contains_key(&30));
        // dry additions are still paid for
        assert_relative_eq!(calc.metrics().price, 22.0 + 2.0 * 0.025 * 17.64, epsilon = 1e-9);
    }

    #[test]
    fn test_fermentable_buckets() {
        let r = Recipe::from_value(json!({
            "fermentables": [
                {"name": "Maris Otter"},
                {"name": "Crystal 60"},
                {"name": "Light DME"},
                {"name": "Candi Sugar", "late": true}
            ]
        }))
        .unwrap();
        let calc = r.calculate().unwrap();
        let map = calc.timeline_map();
        assert_eq!(map.mash.len(), 1);
        assert_eq!(map.steep.len(), 1);
        assert_eq!(map.boil.len(), 1);
        assert_eq!(map.boil_end.len(), 1);
        assert_eq!(map.boil_end[0].0.name, "Candi Sugar");
    }

    #[test]
    fn test_priming_sugar_ratios() {
        let calc_recipe = single_malt();
        let calc = calc_recipe.calculate().unwrap();
        let m = calc.metrics();
        let t = units::c_to_f(23.0);
        let corn = 0.015195 * 5.0 * (2.5 - 3.0378 + 0.050062 * t - 0.00026555 * t * t);
        assert_relative_eq!(m.priming_corn_sugar, corn, epsilon = 1e-12);
        assert_relative_eq!(m.priming_sugar / m.priming_corn_sugar, 0.90995, epsilon = 1e-12);
        assert_relative_eq!(m.priming_honey / m.priming_corn_sugar, 1.22496, epsilon = 1e-12);
        assert_relative_eq!(m.priming_dme / m.priming_corn_sugar, 1.33249, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_recipe_has_finite_ratios() {
        let r = Recipe::default();
        let calc = r.calculate().unwrap();
        let m = calc.metrics();
        assert_relative_eq!(m.og, 1.0);
        assert_relative_eq!(m.bu_to_gu, 0.0);
        assert_relative_eq!(m.bv, 0.0);
        assert_relative_eq!(m.color, 0.0);
    }

    #[test]
    fn test_rejects_non_positive_batch() {
        let r = Recipe {
            batch_size: 0.0,
            ..Recipe::default()
        };
        assert!(matches!(
            r.calculate(),
            Err(BrewError::InvalidRecipeParameter { ref field, .. }) if field == "batchSize"
        ));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut r = single_malt();
        r.fermentables[0].weight = -1.0;
        assert!(r.calculate().is_err());
    }
}
