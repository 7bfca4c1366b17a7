//! Constant-value checks applied to every argument before dispatch.

use log::{debug, warn};

use crate::literal::{parse_literal, Literal, LiteralError};
use crate::parser::{split_param, ParseError};

/// A checked argument: optional keyword plus its constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Literal,
}

/// True when `raw` is blank or parses as a constant literal.
pub fn is_safe_value(raw: &str) -> bool {
    if raw.trim().is_empty() {
        return true;
    }
    match parse_literal(raw) {
        Ok(_) => true,
        Err(err) => {
            report(&err);
            false
        }
    }
}

/// Check and parse raw call arguments into constant [`Argument`]s.
///
/// Keyword prefixes are split off before the value is checked, so
/// `skiplog=True` is judged on `True` alone. A blank value is refused here
/// even though [`is_safe_value`] accepts it, since it cannot be bound.
pub fn constant_arguments(raw_args: &[String]) -> Result<Vec<Argument>, ParseError> {
    raw_args
        .iter()
        .map(|raw| {
            let (name, value) = split_param(raw);
            let value = parse_literal(value).map_err(|source| {
                report(&source);
                ParseError::UnsafeArgument {
                    argument: raw.clone(),
                    source,
                }
            })?;
            Ok(Argument {
                name: name.map(str::to_string),
                value,
            })
        })
        .collect()
}

fn report(err: &LiteralError) {
    if err.is_syntax() {
        warn!("{err}");
    } else {
        debug!("{err}");
    }
}
