//! # brew-core
//!
//! Beer recipe calculations: gravity, bitterness, alcohol, colour and cost
//! from a declarative recipe, linear rescaling that keeps bitterness
//! constant, and a simulated brew-day timeline.
//!
//! ```
//! use brew_core::{Recipe, UnitSystem};
//!
//! let recipe = Recipe::from_json(r#"{
//!     "batchSize": 20, "boilSize": 23,
//!     "fermentables": [{"name": "Pale Malt", "weight": 5, "yield": 80, "color": 3}],
//!     "spices": [{"name": "Cascade", "weight": 0.028, "aa": 6.5, "time": 60}]
//! }"#).unwrap();
//!
//! let calc = recipe.calculate().unwrap();
//! assert!(calc.metrics().og > 1.05);
//! assert!(calc.metrics().ibu > 0.0);
//!
//! let timeline = calc.timeline(UnitSystem::Metric);
//! assert!(timeline.total_duration() > timeline.brew_day_duration);
//! ```

pub mod calculate;
pub mod classify;
pub mod config;
pub mod duration;
pub mod error;
pub mod ingredients;
pub mod mash;
pub mod recipe;
pub mod timeline;
pub mod units;

pub use calculate::{CalculatedRecipe, Metrics, TimelineMap};
pub use classify::Classifier;
pub use config::BrewhouseConfig;
pub use duration::{display_duration, parse_duration};
pub use error::{BrewError, Result};
pub use ingredients::{Addition, Fermentable, FermentableKind, IbuMethod, Spice, Yeast};
pub use mash::{Mash, MashStep, MashStepKind};
pub use recipe::{Ingredient, Recipe};
pub use timeline::{BrewTimeline, TimelineEvent};
pub use units::UnitSystem;
