//! Error types for recipe calculations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrewError {
    #[error("unsupported IBU method '{0}'")]
    UnsupportedMethod(String),

    #[error("invalid classification pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown ingredient kind '{0}'")]
    UnknownIngredientKind(String),

    #[error("invalid recipe parameter {field} = {value}")]
    InvalidRecipeParameter { field: String, value: f64 },

    #[error("malformed recipe record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BrewError>;
