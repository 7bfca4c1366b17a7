use std::collections::BTreeMap;

use gems_expr::{ApiInfo, Argument, Literal, ParamDefault, ParamKind, ParamSpec};
use serde_json::Value as JsonValue;

use super::error::HandlerError;

/// Arguments of one call, matched to the handler's signature with defaults
/// filled in and every value coerced to its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
    info: &'static ApiInfo,
    values: Vec<Literal>,
}

impl BoundArgs {
    pub fn bind(info: &'static ApiInfo, arguments: &[Argument]) -> Result<Self, HandlerError> {
        let mut slots: Vec<Option<Literal>> = vec![None; info.params.len()];
        let mut positional = 0;

        for argument in arguments {
            let index = match argument.name.as_deref() {
                Some(name) => info.params.iter().position(|param| param.name == name).ok_or_else(|| {
                    HandlerError::BadArguments(format!("{} has no parameter named '{name}'", info.name))
                })?,
                None => {
                    let index = positional;
                    positional += 1;
                    index
                }
            };
            let Some(slot) = slots.get_mut(index) else {
                return Err(HandlerError::BadArguments(format!(
                    "{} takes at most {} argument(s)",
                    info.name,
                    info.params.len()
                )));
            };
            if slot.is_some() {
                return Err(HandlerError::BadArguments(format!(
                    "{} got more than one value for '{}'",
                    info.name, info.params[index].name
                )));
            }
            *slot = Some(argument.value.clone());
        }

        let values = info
            .params
            .iter()
            .zip(slots)
            .map(|(param, slot)| match slot {
                Some(value) => coerce(info, param, value),
                None => default_for(info, param),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { info, values })
    }

    pub fn info(&self) -> &'static ApiInfo {
        self.info
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        let index = self.info.params.iter().position(|param| param.name == name)?;
        self.values.get(index)
    }

    fn require(&self, name: &str) -> Result<&Literal, HandlerError> {
        self.get(name).ok_or_else(|| {
            HandlerError::BadArguments(format!("{} has no parameter named '{name}'", self.info.name))
        })
    }

    pub fn int(&self, name: &str) -> Result<i64, HandlerError> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| mismatch(self.info, name, "an integer", value))
    }

    pub fn float(&self, name: &str) -> Result<f64, HandlerError> {
        let value = self.require(name)?;
        value.as_float().ok_or_else(|| mismatch(self.info, name, "a number", value))
    }

    pub fn string(&self, name: &str) -> Result<String, HandlerError> {
        Ok(self.require(name)?.to_string())
    }

    pub fn boolean(&self, name: &str) -> Result<bool, HandlerError> {
        Ok(self.require(name)?.is_truthy())
    }

    pub fn list(&self, name: &str) -> Result<&[Literal], HandlerError> {
        let value = self.require(name)?;
        value.items().ok_or_else(|| mismatch(self.info, name, "a list", value))
    }

    /// `skiplog=True` on handlers that accept it.
    pub fn skiplog(&self) -> bool {
        self.get("skiplog").map_or(false, Literal::is_truthy)
    }

    /// Parameter values keyed by name, as they appear in data records.
    pub fn to_log_params(&self) -> BTreeMap<String, JsonValue> {
        self.info
            .params
            .iter()
            .zip(&self.values)
            .map(|(param, value)| (param.name.to_string(), literal_to_json(value)))
            .collect()
    }
}

pub(crate) fn literal_to_json(value: &Literal) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

fn coerce(info: &ApiInfo, param: &ParamSpec, value: Literal) -> Result<Literal, HandlerError> {
    let coerced = match param.kind {
        ParamKind::Any => Some(value.clone()),
        ParamKind::Str => Some(Literal::Str(value.to_string())),
        ParamKind::Bool => Some(Literal::Bool(value.is_truthy())),
        ParamKind::Int => value.as_int().map(Literal::Int),
        ParamKind::Float => value.as_float().map(Literal::Float),
        ParamKind::List => value.items().map(|items| Literal::List(items.to_vec())),
    };
    coerced.ok_or_else(|| {
        let expected = match param.kind {
            ParamKind::Int => "an integer",
            ParamKind::Float => "a number",
            _ => "a list",
        };
        mismatch(info, param.name, expected, &value)
    })
}

fn default_for(info: &ApiInfo, param: &ParamSpec) -> Result<Literal, HandlerError> {
    match param.default {
        ParamDefault::Required => Err(HandlerError::BadArguments(format!(
            "{} is missing required parameter '{}'",
            info.name, param.name
        ))),
        ParamDefault::Int(value) => Ok(Literal::Int(value)),
        ParamDefault::Float(value) => Ok(Literal::Float(value)),
        ParamDefault::Str(value) => Ok(Literal::Str(value.to_string())),
        ParamDefault::Bool(value) => Ok(Literal::Bool(value)),
    }
}

fn mismatch(info: &ApiInfo, name: &str, expected: &str, value: &Literal) -> HandlerError {
    HandlerError::BadArguments(format!(
        "{}: '{name}' must be {expected}, got {} {}",
        info.name,
        value.type_name(),
        value.repr()
    ))
}
