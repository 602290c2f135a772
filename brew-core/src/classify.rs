//! Name-based classification of ingredients.
//!
//! A [`Classifier`] is an ordered list of `(pattern, result)` rules plus a
//! fallback; the first rule whose pattern matches the name wins.

use regex::{Regex, RegexBuilder};

use crate::error::{BrewError, Result};

#[derive(Clone, Debug)]
pub struct Classifier<T> {
    rules: Vec<(Regex, T)>,
    fallback: T,
}

impl<T: Clone> Classifier<T> {
    /// Build a classifier from case-insensitive patterns.
    pub fn new<'a, I>(rules: I, fallback: T) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, T)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, result)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, result))
                    .map_err(|source| BrewError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, fallback })
    }

    pub fn classify(&self, name: &str) -> T {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map_or_else(|| self.fallback.clone(), |(_, result)| result.clone())
    }
}
