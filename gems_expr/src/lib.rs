//! Parsing and validation for GEMS rule expressions.
//!
//! Rule text stored in an environment is a single function call such as
//! `ShowObject(4, skiplog=True)`. This crate splits that text into a name and
//! raw arguments, checks the name against the closed GEMS vocabulary and makes
//! sure every argument is a constant literal before anything downstream gets
//! to see it. Nothing here evaluates code; arguments are parsed into a small
//! [`Literal`] tree instead.

pub mod api;
pub mod literal;
pub mod parser;
pub mod safety;

pub use api::{lookup, prepare_call, valid_api_call, ApiInfo, ApiKind, ParamDefault, ParamKind, ParamSpec, PreparedCall};
pub use literal::{parse_literal, Literal, LiteralError, NodeKind};
pub use parser::{parse, split_param, strip_param_name, CallParts, ParseError};
pub use safety::{constant_arguments, is_safe_value, Argument};
