use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A loosely typed value crossing the scripting boundary.
///
/// `Undefined` is the "no value" result: an absent node, an absent child or
/// a field the current profiler revision no longer provides. It is a normal
/// return value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value<'a> {
    Undefined,
    Str(&'a str),
    Int(i64),
    Number(f64),
}

impl Value<'_> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Str(_) => "string",
            Value::Int(_) | Value::Number(_) => "number",
        }
    }

    /// The value as an `i32`, accepting any integral number in range.
    pub fn as_int32(&self) -> Option<i32> {
        match *self {
            Value::Int(i) => i32::try_from(i).ok(),
            Value::Number(n)
                if n.is_finite()
                    && n.fract() == 0.0
                    && n >= f64::from(i32::MIN)
                    && n <= f64::from(i32::MAX) =>
            {
                Some(n as i32)
            }
            _ => None,
        }
    }

    /// Parse a command-line token the way a script literal would read:
    /// integers, then numbers, otherwise a string.
    pub fn parse(token: &str) -> Value<'_> {
        if let Ok(i) = token.parse::<i64>() {
            Value::Int(i)
        } else if let Ok(n) = token.parse::<f64>() {
            Value::Number(n)
        } else {
            Value::Str(token)
        }
    }
}

impl From<Option<f64>> for Value<'_> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Undefined, Value::Number)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Validate the single index argument of `getChild`.
pub(crate) fn index_argument(args: &[Value<'_>]) -> Result<i32> {
    let arg = args.first().ok_or(Error::MissingArgument("index"))?;
    arg.as_int32().ok_or(Error::InvalidArgumentType {
        expected: "integer",
        found: arg.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_int32() {
        assert_eq!(Value::Int(3).as_int32(), Some(3));
        assert_eq!(Value::Number(2.0).as_int32(), Some(2));
        assert_eq!(Value::Number(2.5).as_int32(), None);
        assert_eq!(Value::Number(f64::NAN).as_int32(), None);
        assert_eq!(Value::Int(i64::from(i32::MAX) + 1).as_int32(), None);
        assert_eq!(Value::Str("1").as_int32(), None);
        assert_eq!(Value::Undefined.as_int32(), None);
    }

    #[test]
    fn test_index_argument_errors() {
        assert!(matches!(
            index_argument(&[]),
            Err(Error::MissingArgument("index"))
        ));
        assert!(matches!(
            index_argument(&[Value::Str("x")]),
            Err(Error::InvalidArgumentType {
                found: "string",
                ..
            })
        ));
        assert_eq!(index_argument(&[Value::Int(4), Value::Str("x")]).unwrap(), 4);
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(Value::parse("7"), Value::Int(7));
        assert_eq!(Value::parse("-1"), Value::Int(-1));
        assert_eq!(Value::parse("1.5"), Value::Number(1.5));
        assert_eq!(Value::parse("x"), Value::Str("x"));
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Value::Undefined).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::Str("main")).unwrap(), "\"main\"");
        assert_eq!(serde_json::to_string(&Value::Int(3)).unwrap(), "3");
    }
}
