//! SQL fragment generation for spatial calculations.

pub mod alias;
pub mod builder;
pub mod operation;
pub mod parameter;
pub mod value;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::connection::quote_identifier;

pub use alias::AliasGenerator;
pub use builder::{Calculation, SqlBuilder};
pub use operation::{BboxOperator, Operation, SpatialFunction};
pub use parameter::{Parameter, Spheroid};
pub use value::{SpatialQuoting, SqlValue};

static SIMPLE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

static LOWERCASE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Returns `true` for identifiers made only of ASCII letters, digits and
/// underscores, not starting with a digit.
pub fn is_simple_identifier(name: &str) -> bool {
    SIMPLE_IDENTIFIER.is_match(name)
}

/// Renders an identifier for SQL text. Lower-case simple names are emitted
/// bare; anything else is double-quoted so it can neither fold case nor
/// escape its position.
pub fn identifier(name: &str) -> String {
    if LOWERCASE_IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}
