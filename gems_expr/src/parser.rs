//! Splits `Name(arg, arg, ...)` expressions into their name and raw argument
//! text.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::literal::LiteralError;

static CALL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(\w+)\s*\((.*)\)$").expect("call pattern compiles"));

static PARAM_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*=").expect("keyword pattern compiles"));

/// Reasons an expression never reaches a handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("'{0}' is not a function call of the form Name(arguments)")]
    MalformedExpression(String),
    #[error("the GEMS API does not expose any method called '{0}'")]
    UnknownApiName(String),
    #[error("argument '{argument}' is not a constant value: {source}")]
    UnsafeArgument {
        argument: String,
        #[source]
        source: LiteralError,
    },
}

/// Name and raw argument strings of a parsed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParts {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse `expression` into its function name and trimmed raw arguments.
///
/// Commas inside quoted strings or inside `[...]`/`(...)` literals do not
/// split. Brackets inside quotes are plain text, so legacy `[Name]`
/// placeholders in messages survive untouched.
pub fn parse(expression: &str) -> Result<CallParts, ParseError> {
    let trimmed = expression.trim();
    let captures = CALL_PATTERN
        .captures(trimmed)
        .ok_or_else(|| ParseError::MalformedExpression(trimmed.to_string()))?;
    let name = captures[1].to_string();
    let args = split_arguments(&captures[2])
        .ok_or_else(|| ParseError::MalformedExpression(trimmed.to_string()))?;
    Ok(CallParts { name, args })
}

/// Split the text between the outer parentheses into arguments.
///
/// Returns `None` when quotes or brackets are unbalanced or an argument is
/// empty. A single trailing comma is tolerated.
pub fn split_arguments(params: &str) -> Option<Vec<String>> {
    if params.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for ch in params.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' | '}' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            ',' if depth == 0 => {
                let arg = current.trim();
                if arg.is_empty() {
                    return None;
                }
                args.push(arg.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if quote.is_some() || depth != 0 {
        return None;
    }

    let last = current.trim();
    if !last.is_empty() {
        args.push(last.to_string());
    } else if args.is_empty() {
        return None;
    }
    Some(args)
}

/// Drop a leading `name=` keyword prefix from a raw argument.
pub fn strip_param_name(raw: &str) -> &str {
    split_param(raw).1
}

/// Split a raw argument into its optional keyword and its value text.
///
/// `x == 1` is not a keyword argument, so a `=` directly following the
/// prefix leaves the argument alone.
pub fn split_param(raw: &str) -> (Option<&str>, &str) {
    if let Some(captures) = PARAM_NAME_PATTERN.captures(raw) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            return (None, raw.trim());
        };
        let rest = &raw[whole.end()..];
        if !rest.starts_with('=') {
            return (Some(name.as_str()), rest.trim());
        }
    }
    (None, raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_arguments() {
        let parts = parse("ShowObject(4, skiplog=True)").expect("parse");
        assert_eq!(parts.name, "ShowObject");
        assert_eq!(parts.args, vec!["4", "skiplog=True"]);
    }

    #[test]
    fn empty_parameter_list_yields_no_arguments() {
        let parts = parse("  StopAllSounds(  )  ").expect("parse");
        assert_eq!(parts.name, "StopAllSounds");
        assert!(parts.args.is_empty());
    }

    #[test]
    fn commas_inside_quotes_and_lists_do_not_split() {
        let parts = parse(
            r#"TextBox("Hello, [Name]!", -1, -1, 3, ['red', 255, 0, 0, 255], (0, 0), 12)"#,
        )
        .expect("parse");
        assert_eq!(
            parts.args,
            vec![
                r#""Hello, [Name]!""#,
                "-1",
                "-1",
                "3",
                "['red', 255, 0, 0, 255]",
                "(0, 0)",
                "12",
            ]
        );
    }

    #[test]
    fn brackets_inside_quotes_are_plain_text() {
        let parts = parse(r#"TextDialog('a ] b, c [', "d")"#).expect("parse");
        assert_eq!(parts.args, vec!["'a ] b, c ['", r#""d""#]);
    }

    #[test]
    fn escaped_quotes_stay_inside_the_string() {
        let parts = parse(r#"SayText('it\'s, fine', 1)"#).expect("parse");
        assert_eq!(parts.args, vec![r#"'it\'s, fine'"#, "1"]);
    }

    #[test]
    fn nested_lists_keep_their_commas() {
        let parts = parse("SetVariable('grid', [[1, 2], [3, [4, 5]]])").expect("parse");
        assert_eq!(parts.args, vec!["'grid'", "[[1, 2], [3, [4, 5]]]"]);
    }

    #[test]
    fn split_then_rejoin_is_stable() {
        let inputs = [
            "1, 'a,b', [1, 2]",
            "'x [y] z' , (1,) , None",
            "[[1, 'a, b'], (2, 3)], value=\"q\"",
        ];
        for input in inputs {
            let first = split_arguments(input).expect("split");
            let rejoined = first.join(", ");
            let second = split_arguments(&rejoined).expect("resplit");
            assert_eq!(first, second, "input: {input}");
        }
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for input in [
            "",
            "ShowObject",
            "ShowObject(4",
            "ShowObject(4))",
            "ShowObject([4)",
            "ShowObject('4)",
            "Show Object(4)",
            "ShowObject(1,,2)",
            "ShowObject(4) + Quit()",
        ] {
            assert!(
                matches!(parse(input), Err(ParseError::MalformedExpression(_))),
                "expected failure for {input:?}"
            );
        }
    }

    #[test]
    fn trailing_comma_is_tolerated() {
        let parts = parse("PortalTo(2,)").expect("parse");
        assert_eq!(parts.args, vec!["2"]);
    }

    #[test]
    fn keyword_prefix_is_stripped() {
        assert_eq!(strip_param_name("skiplog = True"), "True");
        assert_eq!(strip_param_name("  4 "), "4");
        assert_eq!(split_param("volume=0.5"), (Some("volume"), "0.5"));
        assert_eq!(split_param("'a=b'"), (None, "'a=b'"));
        assert_eq!(split_param("x == 1"), (None, "x == 1"));
    }
}
