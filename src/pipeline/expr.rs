//! Key expressions
//!
//! Group keys and accumulator inputs are expressions over one document.
//! Evaluation never fails: an operand of the wrong type yields null.
//!
//! JSON form follows the `$`-prefixed convention: `"$published_year"` is
//! a field reference, `{"$subtract": [a, b]}` an operator.

use crate::document::{Document, Value};

/// Expression evaluated against a single document
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Field reference; a missing field evaluates to null
    Field(String),
    /// Constant
    Literal(Value),
    /// Numeric difference
    Subtract(Box<Expr>, Box<Expr>),
    /// Numeric remainder; null when dividing by zero
    Mod(Box<Expr>, Box<Expr>),
    /// String concatenation; null if any part is not a string
    Concat(Vec<Expr>),
    /// String conversion of a scalar
    ToString(Box<Expr>),
    /// Substring by character offset and length
    Substr(Box<Expr>, usize, usize),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn subtract(a: Expr, b: Expr) -> Self {
        Expr::Subtract(Box::new(a), Box::new(b))
    }

    pub fn modulo(a: Expr, b: Expr) -> Self {
        Expr::Mod(Box::new(a), Box::new(b))
    }

    pub fn concat(parts: Vec<Expr>) -> Self {
        Expr::Concat(parts)
    }

    pub fn to_string_expr(inner: Expr) -> Self {
        Expr::ToString(Box::new(inner))
    }

    pub fn substr(inner: Expr, start: usize, len: usize) -> Self {
        Expr::Substr(Box::new(inner), start, len)
    }

    /// `field - field mod 10`, e.g. 1965 -> 1960
    pub fn decade(field: &str) -> Self {
        Expr::subtract(
            Expr::field(field),
            Expr::modulo(Expr::field(field), Expr::literal(10)),
        )
    }

    /// Decade label, e.g. 1965 -> "1960s"
    pub fn decade_label(field: &str) -> Self {
        Expr::concat(vec![
            Expr::to_string_expr(Expr::decade(field)),
            Expr::literal("s"),
        ])
    }

    /// Evaluates the expression against a document
    pub fn eval(&self, doc: &Document) -> Value {
        match self {
            Expr::Field(name) => doc.get(name).cloned().unwrap_or(Value::Null),
            Expr::Literal(value) => value.clone(),
            Expr::Subtract(a, b) => match (a.eval(doc), b.eval(doc)) {
                (Value::Int(x), Value::Int(y)) => x
                    .checked_sub(y)
                    .map(Value::Int)
                    .unwrap_or(Value::Float(x as f64 - y as f64)),
                (x, y) => match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => Value::Float(x - y),
                    _ => Value::Null,
                },
            },
            Expr::Mod(a, b) => match (a.eval(doc), b.eval(doc)) {
                (Value::Int(x), Value::Int(y)) => {
                    x.checked_rem(y).map(Value::Int).unwrap_or(Value::Null)
                }
                (x, y) => match (x.as_f64(), y.as_f64()) {
                    (Some(_), Some(y)) if y == 0.0 => Value::Null,
                    (Some(x), Some(y)) => Value::Float(x % y),
                    _ => Value::Null,
                },
            },
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part.eval(doc) {
                        Value::String(s) => out.push_str(&s),
                        _ => return Value::Null,
                    }
                }
                Value::String(out)
            }
            Expr::ToString(inner) => match inner.eval(doc) {
                Value::Null => Value::Null,
                other => Value::String(other.to_string()),
            },
            Expr::Substr(inner, start, len) => match inner.eval(doc) {
                Value::Null => Value::String(String::new()),
                Value::String(s) => Value::String(s.chars().skip(*start).take(*len).collect()),
                other => Value::String(other.to_string().chars().skip(*start).take(*len).collect()),
            },
        }
    }

    /// Parses the JSON form of an expression
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, String> {
        match raw {
            serde_json::Value::String(s) => match s.strip_prefix('$') {
                Some("") => Err("empty field reference '$'".to_string()),
                Some(field) => Ok(Expr::field(field)),
                None => Ok(Expr::literal(s.as_str())),
            },
            serde_json::Value::Object(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "expression object must have exactly one operator, got {}",
                        map.len()
                    ));
                }
                let Some((op, args)) = map.iter().next() else {
                    return Err("empty expression object".to_string());
                };
                Self::from_operator(op, args)
            }
            serde_json::Value::Array(_) => Err("arrays are not expressions".to_string()),
            scalar => Value::from_json(scalar)
                .map(Expr::Literal)
                .ok_or_else(|| format!("unsupported literal {}", scalar)),
        }
    }

    fn from_operator(op: &str, args: &serde_json::Value) -> Result<Self, String> {
        match op {
            "$subtract" => {
                let [a, b] = Self::fixed_args::<2>(op, args)?;
                Ok(Expr::subtract(a, b))
            }
            "$mod" => {
                let [a, b] = Self::fixed_args::<2>(op, args)?;
                Ok(Expr::modulo(a, b))
            }
            "$concat" => {
                let serde_json::Value::Array(items) = args else {
                    return Err("$concat requires an array".to_string());
                };
                let parts = items.iter().map(Self::from_json).collect::<Result<_, _>>()?;
                Ok(Expr::concat(parts))
            }
            "$toString" => Ok(Expr::to_string_expr(Self::from_json(args)?)),
            "$substr" => {
                let serde_json::Value::Array(items) = args else {
                    return Err("$substr requires [expr, start, length]".to_string());
                };
                let [inner, start, len] = items.as_slice() else {
                    return Err("$substr requires [expr, start, length]".to_string());
                };
                let start = start
                    .as_u64()
                    .ok_or("$substr start must be a non-negative integer")?;
                let len = len
                    .as_u64()
                    .ok_or("$substr length must be a non-negative integer")?;
                Ok(Expr::substr(
                    Self::from_json(inner)?,
                    start as usize,
                    len as usize,
                ))
            }
            other => Err(format!("unknown expression operator '{}'", other)),
        }
    }

    fn fixed_args<const N: usize>(
        op: &str,
        args: &serde_json::Value,
    ) -> Result<[Expr; N], String> {
        let serde_json::Value::Array(items) = args else {
            return Err(format!("{} requires an array of {} arguments", op, N));
        };
        let parsed = items.iter().map(Self::from_json).collect::<Result<Vec<_>, _>>()?;
        parsed
            .try_into()
            .map_err(|_| format!("{} requires exactly {} arguments", op, N))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book(year: i64) -> Document {
        Document::new().with("published_year", year).with("genre", "Fiction")
    }

    #[test]
    fn test_decade() {
        assert_eq!(Expr::decade("published_year").eval(&book(1965)), Value::Int(1960));
        assert_eq!(Expr::decade("published_year").eval(&book(1960)), Value::Int(1960));
        assert_eq!(
            Expr::decade_label("published_year").eval(&book(2003)),
            Value::from("2000s")
        );
    }

    #[test]
    fn test_missing_field_is_null() {
        let doc = Document::new();
        assert_eq!(Expr::field("published_year").eval(&doc), Value::Null);
        assert_eq!(Expr::decade("published_year").eval(&doc), Value::Null);
        assert_eq!(Expr::decade_label("published_year").eval(&doc), Value::Null);
    }

    #[test]
    fn test_type_mismatch_is_null() {
        let doc = book(1965);
        let expr = Expr::subtract(Expr::field("genre"), Expr::literal(1));
        assert_eq!(expr.eval(&doc), Value::Null);
        let expr = Expr::modulo(Expr::field("published_year"), Expr::literal(0));
        assert_eq!(expr.eval(&doc), Value::Null);
    }

    #[test]
    fn test_substr_of_number() {
        let expr = Expr::substr(Expr::decade("published_year"), 0, 4);
        assert_eq!(expr.eval(&book(1851)), Value::from("1850"));
    }

    #[test]
    fn test_from_json_decade_label() {
        let raw = json!({
            "$concat": [
                { "$substr": [{ "$subtract": ["$published_year", { "$mod": ["$published_year", 10] }] }, 0, 4] },
                "s"
            ]
        });
        let expr = Expr::from_json(&raw).unwrap();
        assert_eq!(expr.eval(&book(1937)), Value::from("1930s"));
    }

    #[test]
    fn test_from_json_references_and_literals() {
        assert_eq!(Expr::from_json(&json!("$genre")).unwrap(), Expr::field("genre"));
        assert_eq!(Expr::from_json(&json!("genre")).unwrap(), Expr::literal("genre"));
        assert_eq!(Expr::from_json(&json!(null)).unwrap(), Expr::Literal(Value::Null));
        assert_eq!(Expr::from_json(&json!(1)).unwrap(), Expr::literal(1));
    }

    #[test]
    fn test_from_json_errors() {
        assert!(Expr::from_json(&json!("$")).is_err());
        assert!(Expr::from_json(&json!({"$subtract": [1]})).is_err());
        assert!(Expr::from_json(&json!({"$pow": [1, 2]})).is_err());
        assert!(Expr::from_json(&json!({"$a": 1, "$b": 2})).is_err());
        assert!(Expr::from_json(&json!([1, 2])).is_err());
    }
}
