//! Field-level document mutations
//!
//! A mutation is an ordered list of operations: `$set`, `$unset` and
//! `$inc`. Mutations never touch `_id`.

use crate::document::{Document, Value, ID_FIELD};

use super::errors::{StorageError, StorageResult};

/// A single field operation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Assign a value, creating the field if absent
    Set(String, Value),
    /// Remove the field if present
    Unset(String),
    /// Add a number; an absent field starts from zero
    Inc(String, Value),
}

impl FieldOp {
    pub fn field(&self) -> &str {
        match self {
            FieldOp::Set(f, _) | FieldOp::Unset(f) | FieldOp::Inc(f, _) => f,
        }
    }
}

/// Ordered set of field operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    ops: Vec<FieldOp>,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(FieldOp::Set(field.into(), value.into()));
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.ops.push(FieldOp::Unset(field.into()));
        self
    }

    pub fn inc(mut self, field: impl Into<String>, amount: impl Into<Value>) -> Self {
        self.ops.push(FieldOp::Inc(field.into(), amount.into()));
        self
    }

    /// Parses `{"$set": {...}, "$unset": {...}, "$inc": {...}}`.
    pub fn from_json(raw: &serde_json::Value) -> StorageResult<Self> {
        let serde_json::Value::Object(operators) = raw else {
            return Err(StorageError::invalid_mutation(format!(
                "mutation must be an object, got {}",
                raw
            )));
        };

        let mut mutation = Mutation::new();
        for (op, body) in operators {
            let serde_json::Value::Object(fields) = body else {
                return Err(StorageError::invalid_mutation(format!(
                    "{} requires an object of fields",
                    op
                )));
            };
            for (field, raw_value) in fields {
                let value = Value::from_json(raw_value).ok_or_else(|| {
                    StorageError::invalid_mutation(format!(
                        "value for '{}' must be a scalar",
                        field
                    ))
                })?;
                let op = match op.as_str() {
                    "$set" => FieldOp::Set(field.clone(), value),
                    "$unset" => FieldOp::Unset(field.clone()),
                    "$inc" => FieldOp::Inc(field.clone(), value),
                    other => {
                        return Err(StorageError::invalid_mutation(format!(
                            "unknown update operator '{}'",
                            other
                        )))
                    }
                };
                mutation.ops.push(op);
            }
        }

        mutation.validate()?;
        Ok(mutation)
    }

    pub fn ops(&self) -> &[FieldOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Validates the mutation without a document
    pub fn validate(&self) -> StorageResult<()> {
        if self.ops.is_empty() {
            return Err(StorageError::invalid_mutation("mutation has no operations"));
        }
        for op in &self.ops {
            let field = op.field();
            if field == ID_FIELD {
                return Err(StorageError::immutable_field(ID_FIELD));
            }
            if field.is_empty() {
                return Err(StorageError::invalid_mutation("field name must not be empty"));
            }
            if let FieldOp::Inc(_, amount) = op {
                if !amount.is_number() {
                    return Err(StorageError::invalid_mutation(format!(
                        "$inc amount for '{}' must be a number, got {}",
                        field,
                        amount.type_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Applies the mutation to a copy of `doc`.
    ///
    /// The input is never modified, so a failure leaves nothing half-applied.
    pub fn apply(&self, doc: &Document) -> StorageResult<Document> {
        self.validate()?;

        let mut updated = doc.clone();
        for op in &self.ops {
            match op {
                FieldOp::Set(field, value) => {
                    updated.set(field.clone(), value.clone());
                }
                FieldOp::Unset(field) => {
                    updated.remove(field);
                }
                FieldOp::Inc(field, amount) => {
                    let current = updated.get(field).cloned().unwrap_or(Value::Int(0));
                    let sum = add_numbers(&current, amount).ok_or_else(|| {
                        StorageError::invalid_mutation(format!(
                            "cannot apply $inc to '{}' holding {}",
                            field,
                            current.type_name()
                        ))
                    })?;
                    updated.set(field.clone(), sum);
                }
            }
        }
        Ok(updated)
    }
}

/// Integer addition when both sides are integers and it does not
/// overflow; float addition otherwise.
fn add_numbers(a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(
            x.checked_add(*y)
                .map(Value::Int)
                .unwrap_or(Value::Float(*x as f64 + *y as f64)),
        ),
        _ => Some(Value::Float(a.as_f64()? + b.as_f64()?)),
    }
}
