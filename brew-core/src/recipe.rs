//! The recipe aggregate: ingredients plus process parameters.
//!
//! A [`Recipe`] only holds persisted input. Derived values come from
//! [`Recipe::calculate`], which returns an immutable snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BrewError, Result};
use crate::ingredients::{
    Addition, DEFAULT_FERMENTABLE_NAME, DEFAULT_SPICE_NAME, DEFAULT_YEAST_NAME, Fermentable,
    FermentableKind, IbuMethod, Spice, Yeast,
};
use crate::mash::Mash;
use crate::units;

pub const DEFAULT_RECIPE_NAME: &str = "New Recipe";
pub const DEFAULT_DESCRIPTION: &str = "Recipe description";
pub const DEFAULT_AUTHOR: &str = "Anonymous Brewer";

/// Any ingredient that can be added to a recipe.
#[derive(Clone, Debug, PartialEq)]
pub enum Ingredient {
    Fermentable(Fermentable),
    Spice(Spice),
    Yeast(Yeast),
}

impl From<Fermentable> for Ingredient {
    fn from(f: Fermentable) -> Self {
        Self::Fermentable(f)
    }
}

impl From<Spice> for Ingredient {
    fn from(s: Spice) -> Self {
        Self::Spice(s)
    }
}

impl From<Yeast> for Ingredient {
    fn from(y: Yeast) -> Self {
        Self::Yeast(y)
    }
}

/// Which gravity a spice's bitterness is computed against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BitternessStage {
    /// Boil additions see the concentrated pre-dilution wort.
    Boil,
    /// Steeped additions see the final original gravity.
    Steep,
}

impl BitternessStage {
    /// `None` when the spice contributes no bitterness.
    pub(crate) fn of(spice: &Spice) -> Option<Self> {
        if spice.aa == 0.0 {
            return None;
        }
        if spice.usage.eq_ignore_ascii_case("boil") {
            Some(Self::Boil)
        } else if spice.usage.eq_ignore_ascii_case("steep") {
            Some(Self::Steep)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub author: String,
    /// Liters in the kettle at the start of the boil.
    pub boil_size: f64,
    /// Liters in the fermenter.
    pub batch_size: f64,
    /// Liters per serving (bottle).
    pub serving_size: f64,
    /// Percent.
    pub steep_efficiency: f64,
    /// Minutes.
    pub steep_time: f64,
    /// Percent.
    pub mash_efficiency: f64,
    pub style: Option<String>,
    pub ibu_method: IbuMethod,
    pub fermentables: Vec<Fermentable>,
    pub spices: Vec<Spice>,
    pub yeast: Vec<Yeast>,
    pub mash: Option<Mash>,
    /// °C, zero means room temperature.
    pub bottling_temp: f64,
    /// Target CO2 volumes, zero means 2.5.
    pub bottling_pressure: f64,
    pub primary_days: f64,
    pub primary_temp: f64,
    pub secondary_days: f64,
    pub secondary_temp: f64,
    pub tertiary_days: f64,
    pub tertiary_temp: f64,
    pub aging_days: f64,
    pub aging_temp: f64,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: DEFAULT_RECIPE_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            boil_size: 10.0,
            batch_size: 20.0,
            serving_size: 0.355,
            steep_efficiency: 50.0,
            steep_time: 20.0,
            mash_efficiency: 75.0,
            style: None,
            ibu_method: IbuMethod::Tinseth,
            fermentables: Vec::new(),
            spices: Vec::new(),
            yeast: Vec::new(),
            mash: None,
            bottling_temp: 0.0,
            bottling_pressure: 0.0,
            primary_days: 14.0,
            primary_temp: 20.0,
            secondary_days: 0.0,
            secondary_temp: 0.0,
            tertiary_days: 0.0,
            tertiary_temp: 0.0,
            aging_days: 14.0,
            aging_temp: 20.0,
        }
    }
}

impl Recipe {
    /// Build a recipe from a JSON record; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Plain-data export of the persisted fields.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add(&mut self, ingredient: impl Into<Ingredient>) {
        match ingredient.into() {
            Ingredient::Fermentable(f) => self.fermentables.push(f),
            Ingredient::Spice(s) => self.spices.push(s),
            Ingredient::Yeast(y) => self.yeast.push(y),
        }
    }

    /// Add an ingredient from a plain-data record. `kind` is one of
    /// `fermentable`, `spice`, `hop` or `yeast`.
    pub fn add_record(&mut self, kind: &str, values: serde_json::Value) -> Result<()> {
        let ingredient = match kind.to_ascii_lowercase().as_str() {
            "fermentable" => Ingredient::Fermentable(serde_json::from_value(values)?),
            "spice" | "hop" => Ingredient::Spice(serde_json::from_value(values)?),
            "yeast" => Ingredient::Yeast(serde_json::from_value(values)?),
            _ => return Err(BrewError::UnknownIngredientKind(kind.to_string())),
        };
        self.add(ingredient);
        Ok(())
    }

    pub fn batch_size_gallons(&self) -> f64 {
        units::liters_to_gallons(self.batch_size)
    }

    pub fn boil_size_gallons(&self) -> f64 {
        units::liters_to_gallons(self.boil_size)
    }

    /// Total weight of grain (not extract) in kg.
    pub fn grain_weight(&self) -> f64 {
        self.fermentables
            .iter()
            .filter(|f| f.kind() == FermentableKind::Grain)
            .map(|f| f.weight)
            .sum()
    }

    pub fn bottle_count(&self) -> u32 {
        (self.batch_size / self.serving_size).floor() as u32
    }

    /// Extraction efficiency (fraction) for a fermentable's addition stage.
    pub(crate) fn efficiency(&self, fermentable: &Fermentable) -> f64 {
        match fermentable.addition() {
            Addition::Steep => self.steep_efficiency / 100.0,
            Addition::Mash => self.mash_efficiency / 100.0,
            Addition::Boil => 1.0,
        }
    }

    /// Gravity of the wort in the kettle before late additions, at `boil_size` liters.
    pub(crate) fn early_og(&self, boil_size: f64) -> f64 {
        1.0 + self
            .fermentables
            .iter()
            .filter(|f| !f.late)
            .map(|f| f.gu(boil_size) * self.efficiency(f) / 1000.0)
            .sum::<f64>()
    }

    fn original_gravity(&self) -> f64 {
        1.0 + self
            .fermentables
            .iter()
            .map(|f| f.gu(self.batch_size) * self.efficiency(f) / 1000.0)
            .sum::<f64>()
    }

    /// Reject sizes and weights the formulas cannot handle.
    pub fn validate(&self) -> Result<()> {
        positive("batchSize", self.batch_size)?;
        positive("boilSize", self.boil_size)?;
        positive("servingSize", self.serving_size)?;
        for f in &self.fermentables {
            non_negative("fermentable weight", f.weight)?;
        }
        for s in &self.spices {
            non_negative("spice weight", s.weight)?;
        }
        Ok(())
    }

    /// Resize the recipe to new batch and boil volumes (liters).
    ///
    /// Fermentables scale linearly. Bittering spices are re-weighed so that
    /// their IBU contribution stays the same at the new gravity and volume;
    /// other spices scale linearly, including dry additions that carry `aa`
    /// and `time`, since they add no IBU. Call [`Recipe::calculate`]
    /// afterwards for fresh metrics.
    pub fn scale(&mut self, batch_size: f64, boil_size: f64) -> Result<()> {
        self.validate()?;
        positive("batchSize", batch_size)?;
        positive("boilSize", boil_size)?;

        let ratio = batch_size / self.batch_size;
        let early_og = self.early_og(self.boil_size);
        let og = self.original_gravity();
        let targets: Vec<Option<(BitternessStage, f64)>> = self
            .spices
            .iter()
            .map(|s| {
                let stage = BitternessStage::of(s).filter(|_| s.time != 0.0)?;
                let gravity = match stage {
                    BitternessStage::Boil => early_og,
                    BitternessStage::Steep => og,
                };
                Some((stage, s.bitterness(self.ibu_method, gravity, self.batch_size)))
            })
            .collect();

        for f in &mut self.fermentables {
            f.weight *= ratio;
        }
        self.batch_size = batch_size;
        let new_early_og = self.early_og(boil_size);
        let new_og = self.original_gravity();

        let method = self.ibu_method;
        for (spice, target) in self.spices.iter_mut().zip(targets) {
            match target {
                Some((stage, ibu)) => {
                    let gravity = match stage {
                        BitternessStage::Boil => new_early_og,
                        BitternessStage::Steep => new_og,
                    };
                    spice.weight = spice.weight_for_bitterness(method, ibu, gravity, batch_size);
                }
                None => spice.weight *= ratio,
            }
        }
        self.boil_size = boil_size;

        debug!(
            batch_size,
            boil_size,
            early_og,
            new_early_og,
            "scaled recipe"
        );
        Ok(())
    }

    /// Completeness score from 0.0 to 8.0: one point each for a real name,
    /// description and author, half a point for a style, and per ingredient
    /// category one point for presence plus half a point when none of its
    /// members still carries the placeholder name.
    pub fn grade(&self) -> f64 {
        let mut grade = 0.0;

        let named = |value: &str, placeholders: &[&str]| {
            let value = value.to_lowercase();
            !value.is_empty() && !placeholders.iter().any(|p| p.eq_ignore_ascii_case(&value))
        };
        if named(&self.name, &[DEFAULT_RECIPE_NAME, "untitled"]) {
            grade += 1.0;
        }
        if named(&self.description, &[DEFAULT_DESCRIPTION]) {
            grade += 1.0;
        }
        if named(&self.author, &[DEFAULT_AUTHOR]) {
            grade += 1.0;
        }
        if self.style.as_deref().is_some_and(|s| !s.is_empty()) {
            grade += 0.5;
        }

        let categories: [(Vec<&str>, &str); 3] = [
            (self.fermentables.iter().map(|f| f.name.as_str()).collect(), DEFAULT_FERMENTABLE_NAME),
            (self.spices.iter().map(|s| s.name.as_str()).collect(), DEFAULT_SPICE_NAME),
            (self.yeast.iter().map(|y| y.name.as_str()).collect(), DEFAULT_YEAST_NAME),
        ];
        for (names, placeholder) in categories {
            if names.is_empty() {
                continue;
            }
            grade += 1.0;
            if names.iter().all(|n| named(n, &[placeholder])) {
                grade += 0.5;
            }
        }

        grade
    }
}

fn positive(field: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(BrewError::InvalidRecipeParameter {
            field: field.to_string(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(BrewError::InvalidRecipeParameter {
            field: field.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mash::MashStepKind;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn pale_ale() -> Recipe {
        Recipe::from_value(json!({
            "name": "Pale Ale",
            "batchSize": 20.0,
            "boilSize": 23.0,
            "fermentables": [
                {"name": "Pale Malt", "weight": 4.5, "yield": 78, "color": 3},
                {"name": "Crystal 40", "weight": 0.4, "yield": 74, "color": 40},
                {"name": "Light DME", "weight": 0.5, "yield": 95, "color": 4, "late": true}
            ],
            "spices": [
                {"name": "Magnum", "weight": 0.02, "aa": 12.0, "use": "boil", "time": 60},
                {"name": "Cascade", "weight": 0.03, "aa": 6.0, "use": "boil", "time": 10},
                {"name": "Cascade", "weight": 0.03, "aa": 6.0, "use": "dry", "time": 3}
            ],
            "yeast": [{"name": "Wyeast 1056", "attenuation": 77}]
        }))
        .unwrap()
    }

    #[test]
    fn test_record_defaults() {
        let r = Recipe::from_json("{}").unwrap();
        assert_eq!(r, Recipe::default());
        assert_eq!(r.ibu_method, IbuMethod::Tinseth);
    }

    #[test]
    fn test_mash_record_with_step_types() {
        let r = Recipe::from_json(
            r#"{"mash": {"name": "Step", "steps": [{"type": "Infusion", "temp": 52}, {"type": "Temperature"}]}}"#,
        )
        .unwrap();
        let mash = r.mash.as_ref().unwrap();
        assert_eq!(mash.steps[0].kind, MashStepKind::Infusion);
        assert_eq!(mash.steps[1].kind, MashStepKind::Temperature);
        assert_eq!(mash.grain_temp, None);
        assert!(r.to_json_pretty().unwrap().contains(r#""type": "Temperature""#));
    }

    #[test]
    fn test_unknown_ibu_method_in_record() {
        let err = Recipe::from_json(r#"{"ibuMethod": "garetz"}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported IBU method 'garetz'"));
    }

    #[test]
    fn test_export_round_trip() {
        let r = pale_ale();
        let back = Recipe::from_json(&r.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_add_record() {
        let mut r = Recipe::default();
        r.add_record("hop", json!({"name": "Saaz", "aa": 3.5})).unwrap();
        r.add_record("fermentable", json!({"name": "Pilsner"})).unwrap();
        r.add(Yeast::default());
        assert_eq!(r.spices.len(), 1);
        assert_eq!(r.fermentables.len(), 1);
        assert_eq!(r.yeast.len(), 1);
        assert!(matches!(
            r.add_record("water", json!({})),
            Err(BrewError::UnknownIngredientKind(_))
        ));
    }

    #[test]
    fn test_grain_weight_skips_extract() {
        let r = pale_ale();
        assert_relative_eq!(r.grain_weight(), 4.9, epsilon = 1e-9);
        assert_eq!(r.bottle_count(), 56);
    }

    #[test]
    fn test_scale_round_trip_restores_weights() {
        let mut r = pale_ale();
        let original = r.clone();
        r.scale(40.0, 45.0).unwrap();
        assert_relative_eq!(r.fermentables[0].weight, 9.0, epsilon = 1e-9);
        r.scale(20.0, 23.0).unwrap();
        for (a, b) in r.fermentables.iter().zip(&original.fermentables) {
            assert_relative_eq!(a.weight, b.weight, epsilon = 1e-9);
        }
        for (a, b) in r.spices.iter().zip(&original.spices) {
            assert_relative_eq!(a.weight, b.weight, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_scale_preserves_ibu() {
        for method in [IbuMethod::Tinseth, IbuMethod::Rager] {
            let mut r = pale_ale();
            r.ibu_method = method;
            let before = r.calculate().unwrap().metrics().ibu;
            r.scale(60.0, 50.0).unwrap();
            let after = r.calculate().unwrap().metrics().ibu;
            assert_relative_eq!(before, after, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_scale_dry_spice_is_linear() {
        let mut r = pale_ale();
        r.scale(10.0, 12.0).unwrap();
        assert_relative_eq!(r.spices[2].weight, 0.015, epsilon = 1e-12);
        assert_relative_eq!(r.batch_size, 10.0);
        assert_relative_eq!(r.boil_size, 12.0);
    }

    #[test]
    fn test_scale_rejects_zero_volume() {
        let mut r = pale_ale();
        let err = r.scale(0.0, 10.0).unwrap_err();
        assert!(matches!(err, BrewError::InvalidRecipeParameter { ref field, .. } if field == "batchSize"));
        // untouched on failure
        assert_relative_eq!(r.batch_size, 20.0);
    }

    #[test]
    fn test_grade() {
        let mut r = Recipe::default();
        assert_relative_eq!(r.grade(), 0.0);

        r.add(Fermentable::default());
        assert_relative_eq!(r.grade(), 1.0);

        r.add(Spice {
            name: "Hallertau".to_string(),
            ..Spice::default()
        });
        assert_relative_eq!(r.grade(), 2.5);

        r.name = "Helles".to_string();
        r.description = "Crisp lager".to_string();
        r.author = "Someone".to_string();
        r.style = Some("German Helles".to_string());
        r.fermentables[0].name = "Pilsner".to_string();
        r.add(Yeast {
            name: "WLP830".to_string(),
            ..Yeast::default()
        });
        assert_relative_eq!(r.grade(), 8.0);
    }

    #[test]
    fn test_grade_ignores_untitled() {
        let r = Recipe {
            name: "Untitled".to_string(),
            ..Recipe::default()
        };
        assert_relative_eq!(r.grade(), 0.0);
    }
}
