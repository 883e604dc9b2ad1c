use std::fmt::Display;

use crate::{
    ast::{Literal, Status},
    number,
};

/// A runtime value. Equality is strict: values of different kinds are never equal
/// and `NaN` is not equal to itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

impl Value {
    /// Whole-value numeric conversion used by arithmetic and loop counts.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::String(s) => number::to_number(s),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Null => 0.0,
            Value::Undefined => f64::NAN,
        }
    }

    /// Only `yup` itself (or its text) opens an `if` body.
    pub fn is_yup(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::String(s) => s == "yup",
            _ => false,
        }
    }

    pub fn cast(self, status: &Status) -> Value {
        match status {
            Status::Num => match self {
                Value::Number(n) => Value::Number(n),
                other => Value::Number(number::parse_float(&other.to_string())),
            },
            Status::Str => Value::String(self.to_string()),
            Status::Bool => Value::Boolean(match &self {
                Value::Boolean(b) => *b,
                Value::Number(n) => *n == 1.0,
                Value::String(s) => s == "true" || s == "yup",
                _ => false,
            }),
            Status::Null => Value::Null,
            Status::Undefined => Value::Undefined,
            Status::Var | Status::Other(_) => self,
        }
    }

    /// Text contributed to a smart phrase; null and undefined contribute nothing.
    pub fn phrase_text(&self) -> String {
        match self {
            Value::Null | Value::Undefined => String::new(),
            other => other.to_string(),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
            Literal::Undefined => Value::Undefined,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", number::format(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cast_num() {
        assert_eq!(
            Value::String("12px".to_string()).cast(&Status::Num),
            Value::Number(12.0)
        );
        let Value::Number(n) = Value::Boolean(true).cast(&Status::Num) else {
            panic!("num cast should produce a number");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn test_cast_bool() {
        let yes = [
            Value::Boolean(true),
            Value::String("true".to_string()),
            Value::String("yup".to_string()),
            Value::Number(1.0),
        ];
        for value in yes {
            assert_eq!(value.cast(&Status::Bool), Value::Boolean(true));
        }

        let no = [
            Value::Boolean(false),
            Value::String("1".to_string()),
            Value::Number(2.0),
            Value::Null,
        ];
        for value in no {
            assert_eq!(value.cast(&Status::Bool), Value::Boolean(false));
        }
    }

    #[test]
    fn test_cast_str_and_constants() {
        assert_eq!(
            Value::Number(3.5).cast(&Status::Str),
            Value::String("3.5".to_string())
        );
        assert_eq!(Value::Number(1.0).cast(&Status::Null), Value::Null);
        assert_eq!(
            Value::Number(1.0).cast(&Status::Other("wat".to_string())),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_strict_equality() {
        assert_ne!(Value::Number(1.0), Value::String("1".to_string()));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::Undefined, Value::Undefined);
    }

    #[test]
    fn test_is_yup() {
        assert!(Value::Boolean(true).is_yup());
        assert!(Value::String("yup".to_string()).is_yup());
        assert!(!Value::Number(1.0).is_yup());
        assert!(!Value::String("true".to_string()).is_yup());
    }
}
