//! Brew-day timeline: a forward simulation of heating, mashing, boiling and
//! fermenting that yields time-stamped instructions.

use serde::Serialize;
use tracing::trace;

use crate::calculate::{CalculatedRecipe, TimelineMap};
use crate::config::BrewhouseConfig;
use crate::duration::display_duration;
use crate::ingredients::{Fermentable, Spice};
use crate::mash::{Mash, MashStep};
use crate::recipe::Recipe;
use crate::units::{self, UnitSystem, fmt_num};

const MINUTES_PER_DAY: f64 = 1440.0;
/// Heat capacity of grain relative to water, per kg.
const GRAIN_HEAT_CAPACITY: f64 = 0.4184;
const STEEP_TEMP: f64 = 68.0;
/// Liters of water per kg of steeped grain.
const STEEP_WATER_RATIO: f64 = 2.75;
/// Liters of water per kg of grain when the recipe has no mash steps.
const DEFAULT_MASH_WATER_RATIO: f64 = 2.75;
const BOIL_TEMP: f64 = 100.0;
const LAUTER_MINUTES: f64 = 5.0;
const CHILL_MINUTES: f64 = 20.0;
/// Minutes before the end of the boil that late fermentables go in.
const LATE_ADDITION_TIME: i64 = 5;

/// One instruction, `minutes` after the start of the brew day.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TimelineEvent {
    pub minutes: f64,
    pub instruction: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewTimeline {
    /// Chronologically ordered.
    pub events: Vec<TimelineEvent>,
    /// Minutes from start until the yeast is pitched.
    pub brew_day_duration: f64,
    pub boil_start_time: f64,
    pub boil_end_time: f64,
}

impl BrewTimeline {
    /// Minutes until the last event.
    pub fn total_duration(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.minutes)
    }
}

impl CalculatedRecipe<'_> {
    /// Brew-day instructions for the default brewhouse.
    pub fn timeline(&self, units: UnitSystem) -> BrewTimeline {
        self.timeline_with(units, &BrewhouseConfig::default())
    }

    pub fn timeline_with(&self, units: UnitSystem, config: &BrewhouseConfig) -> BrewTimeline {
        let mut sim = Simulation {
            recipe: self.recipe(),
            map: self.timeline_map(),
            units,
            config,
            current_temp: config.room_temp,
            liquid_volume: 0.0,
            total_time: 0.0,
            boil_name: "water",
            out: BrewTimeline::default(),
        };
        sim.mash();
        sim.steep();
        sim.bring_to_boil();
        sim.boil();
        sim.flame_out();
        sim.ferment_and_package();
        sim.out
    }
}

/// State threaded through the brew day.
struct Simulation<'s, 'a> {
    recipe: &'a Recipe,
    map: &'s TimelineMap<'a>,
    units: UnitSystem,
    config: &'s BrewhouseConfig,
    /// °C of whatever is in the kettle.
    current_temp: f64,
    /// Liters in the kettle.
    liquid_volume: f64,
    /// Elapsed minutes.
    total_time: f64,
    boil_name: &'static str,
    out: BrewTimeline,
}

impl Simulation<'_, '_> {
    fn push(&mut self, instruction: String) {
        self.out.events.push(TimelineEvent {
            minutes: self.total_time,
            instruction,
        });
    }

    fn time_to_heat(&self, liters: f64, degrees: f64) -> f64 {
        units::time_to_heat(liters, degrees, self.config.burner_energy).max(0.0)
    }

    fn metric(&self) -> bool {
        self.units == UnitSystem::Metric
    }

    /// Whole-degree temperature.
    fn temp_whole(&self, c: f64) -> String {
        if self.metric() {
            format!("{:.0}°C", c)
        } else {
            format!("{:.0}°F", units::c_to_f(c))
        }
    }

    fn temp(&self, c: f64) -> String {
        if self.metric() {
            format!("{}°C", fmt_num(c))
        } else {
            format!("{}°F", fmt_num(units::c_to_f(c)))
        }
    }

    fn fermentable_list(&self, items: &[(&Fermentable, f64)]) -> Vec<String> {
        items
            .iter()
            .map(|(f, gu)| {
                let weight = if self.metric() {
                    format!("{:.1}kg", f.weight)
                } else {
                    let w = f.weight_lb_oz();
                    format!("{:.0}lb {:.0}oz", w.lb, w.oz.trunc())
                };
                format!("{weight} of {} ({gu:.1} GU)", f.name)
            })
            .collect()
    }

    fn spice_list(&self, items: &[(&Spice, f64)]) -> Vec<String> {
        items
            .iter()
            .map(|(s, ibu)| {
                let weight = if self.metric() {
                    format!("{:.0}g", (s.weight * 1000.0).trunc())
                } else {
                    format!("{:.2}oz", s.weight_lb() * 16.0)
                };
                let extra = if *ibu > 0.0 {
                    format!(" ({ibu:.1} IBU)")
                } else {
                    String::new()
                };
                format!("{weight} of {}{extra}", s.name)
            })
            .collect()
    }

    fn mash(&mut self) {
        if self.map.mash.is_empty() {
            return;
        }
        trace!(total_time = self.total_time, "mash");
        self.boil_name = "wort";

        let recipe = self.recipe;
        let default_mash = Mash::default();
        let mash = recipe.mash.as_ref().unwrap_or(&default_mash);
        let default_steps = [MashStep {
            water_ratio: DEFAULT_MASH_WATER_RATIO,
            ..MashStep::default()
        }];
        let steps: &[MashStep] = if mash.steps.is_empty() {
            &default_steps
        } else {
            &mash.steps
        };
        let grain = recipe.grain_weight();
        let ingredients = self.fermentable_list(&self.map.mash).join(", ");

        let title = if mash.name.is_empty() {
            "Begin mash.".to_string()
        } else {
            format!("Begin {} mash.", mash.name)
        };
        self.push(format!("{title} Add {ingredients}."));
        self.current_temp = mash.grain_temp.unwrap_or(self.config.room_temp);

        for step in steps {
            let strike_volume = step.water_ratio * grain - self.liquid_volume;
            if step.temp != self.current_temp && strike_volume > 0.0 {
                let strike_temp = (step.temp - self.current_temp) * (GRAIN_HEAT_CAPACITY * grain)
                    / strike_volume
                    + step.temp;
                let heat = self.time_to_heat(strike_volume, strike_temp - self.current_temp);
                let volume = if self.metric() {
                    format!("{strike_volume:.1}l")
                } else {
                    format!("{:.1}qts", units::liters_to_gallons(strike_volume) * 4.0)
                };
                self.push(format!(
                    "Heat {volume} to {} (about {:.0} minutes)",
                    self.temp_whole(strike_temp),
                    heat
                ));
                self.liquid_volume += strike_volume;
                self.total_time += heat;
            } else if step.temp != self.current_temp {
                let heat = step
                    .ramp_time
                    .unwrap_or_else(|| self.time_to_heat(self.liquid_volume, step.temp - self.current_temp));
                self.push(format!(
                    "Heat the mash to {} (about {:.0} minutes)",
                    self.temp_whole(step.temp),
                    heat
                ));
                self.total_time += heat;
            }

            self.push(format!("{}: {}.", step.name, step.description(self.units, Some(grain))));
            self.total_time += step.time;
            self.current_temp = step
                .end_temp
                .unwrap_or(step.temp - step.time * self.config.mash_heat_loss / 60.0);
        }

        self.push("Remove grains from mash. This is now your wort.".to_string());
        self.total_time += LAUTER_MINUTES;
    }

    fn steep(&mut self) {
        if self.map.steep.is_empty() {
            return;
        }
        trace!(total_time = self.total_time, "steep");
        self.boil_name = "wort";

        let weight: f64 = self.map.steep.iter().map(|(f, _)| f.weight).sum();
        let water = weight * STEEP_WATER_RATIO;
        let heat = self.time_to_heat(water, STEEP_TEMP - self.current_temp);
        self.current_temp = STEEP_TEMP;
        self.liquid_volume += water;

        let volume = if self.metric() {
            format!("{water:.1}l")
        } else {
            format!("{:.1}gal", units::liters_to_gallons(water))
        };
        self.push(format!(
            "Heat {volume} to {} (about {:.0} minutes)",
            self.temp(STEEP_TEMP),
            heat
        ));
        self.total_time += heat;

        let ingredients = self.fermentable_list(&self.map.steep).join(", ");
        self.push(format!(
            "Add {ingredients} and steep for {} minutes.",
            fmt_num(self.recipe.steep_time)
        ));
        self.total_time += self.recipe.steep_time;
    }

    fn bring_to_boil(&mut self) {
        let boil_size = self.recipe.boil_size;
        // cold top-up water pulls the kettle towards room temperature
        let ratio = (self.liquid_volume / boil_size).min(1.0);
        self.current_temp = self.current_temp * ratio + self.config.room_temp * (1.0 - ratio);

        let volume = if self.metric() {
            format!("{boil_size:.1}l")
        } else {
            format!("{:.1}gal", self.recipe.boil_size_gallons())
        };
        let action = if self.liquid_volume > 0.0 {
            format!("Top up the {} to {volume} and heat to a rolling boil", self.boil_name)
        } else {
            format!("Bring {volume} to a rolling boil")
        };
        let heat = self.time_to_heat(boil_size, BOIL_TEMP - self.current_temp).trunc();
        self.push(format!("{action} (about {heat:.0} minutes)."));
        self.total_time += heat;
        self.out.boil_start_time = self.total_time;
    }

    fn boil(&mut self) {
        trace!(total_time = self.total_time, "boil");
        let map = self.map;

        // minutes remaining, longest first
        let mut keys: Vec<i64> = map.times.keys().rev().copied().collect();
        if !map.boil_end.is_empty() && !keys.contains(&LATE_ADDITION_TIME) {
            keys.push(LATE_ADDITION_TIME);
            keys.sort_unstable_by(|a, b| b.cmp(a));
        }
        if keys.is_empty() && !map.boil.is_empty() {
            keys.push(0);
        }

        let mut previous = keys.first().copied().unwrap_or(0);
        for (i, &time) in keys.iter().enumerate() {
            let mut ingredients = Vec::new();
            if i == 0 {
                ingredients.extend(self.fermentable_list(&map.boil));
            }
            if time == LATE_ADDITION_TIME {
                ingredients.extend(self.fermentable_list(&map.boil_end));
            }
            if let Some(spices) = map.times.get(&time) {
                ingredients.extend(self.spice_list(spices));
            }

            self.total_time += (previous - time) as f64;
            previous = time;
            self.push(format!("Add {}.", ingredients.join(", ")));
        }

        self.total_time += previous as f64;
        self.out.boil_end_time = self.total_time;
    }

    fn flame_out(&mut self) {
        self.push(format!(
            "Flame out. Begin chilling to {} and aerate the cooled wort (about {} minutes).",
            self.temp(self.recipe.primary_temp),
            fmt_num(CHILL_MINUTES)
        ));
        self.total_time += CHILL_MINUTES;
    }

    fn ferment_and_package(&mut self) {
        let recipe = self.recipe;
        let map = self.map;
        trace!(total_time = self.total_time, "fermentation");

        let mut yeasts: Vec<&str> = map.yeast.iter().map(|y| y.name.as_str()).collect();
        if yeasts.is_empty() && recipe.primary_days != 0.0 {
            yeasts.push("yeast");
        }
        if !yeasts.is_empty() {
            self.push(format!(
                "Pitch {} and seal the fermenter. You should see bubbles in the airlock within 24 hours.",
                yeasts.join(", ")
            ));
        }
        self.out.brew_day_duration = self.total_time;

        if recipe.primary_days == 0.0 && recipe.secondary_days == 0.0 && recipe.tertiary_days == 0.0 {
            self.push(format!("Drink immediately (about {} bottles).", recipe.bottle_count()));
            return;
        }

        let pitched = self.total_time;
        let mut stage_events = Vec::new();

        self.total_time += recipe.primary_days * MINUTES_PER_DAY;
        let secondary_start = self.total_time;
        let transfer = if recipe.secondary_days != 0.0 {
            Some(("secondary", recipe.secondary_days))
        } else if recipe.tertiary_days != 0.0 {
            Some(("tertiary", recipe.tertiary_days))
        } else {
            None
        };
        if let Some((vessel, days)) = transfer {
            stage_events.push(TimelineEvent {
                minutes: self.total_time,
                instruction: format!(
                    "Move to {vessel} fermenter for {}.",
                    display_duration(days * MINUTES_PER_DAY, Some(2))
                ),
            });
            self.total_time += days * MINUTES_PER_DAY;
        }
        let bottling = self.total_time;

        // dry additions count days from pitching, or from the transfer for secondary ones
        let mut dry_events = Vec::new();
        for (&day, spices) in &map.dry {
            let (in_secondary, in_primary): (Vec<_>, Vec<_>) = spices.iter().copied().partition(|(s, _)| {
                recipe.secondary_days != 0.0 && s.usage.to_lowercase().contains("secondary")
            });
            for (start, group) in [(pitched, in_primary), (secondary_start, in_secondary)] {
                if group.is_empty() {
                    continue;
                }
                let minutes = (start + day as f64 * MINUTES_PER_DAY).min(bottling);
                dry_events.push(TimelineEvent {
                    minutes,
                    instruction: format!("Add {} to the fermenter.", self.spice_list(&group).join(", ")),
                });
            }
        }
        dry_events.append(&mut stage_events);
        dry_events.sort_by(|a, b| a.minutes.total_cmp(&b.minutes));
        self.out.events.extend(dry_events);

        let mut prime = format!("Prime and bottle about {} bottles.", recipe.bottle_count());
        if recipe.aging_days != 0.0 {
            prime.push_str(&format!(
                " Age at {} for {} days.",
                self.temp(recipe.aging_temp),
                fmt_num(recipe.aging_days)
            ));
        }
        self.push(prime);
        self.total_time += recipe.aging_days * MINUTES_PER_DAY;
        self.push("Relax, don't worry and have a homebrew!".to_string());
    }
}
