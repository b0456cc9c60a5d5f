use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text parsed as a float when the payload is built.
    Decimal,
    /// Free text truncated to an integer when the payload is built.
    Integer,
    /// Only ASCII digits survive an edit.
    Digits,
    /// One of a fixed set of labels, or empty until chosen.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown field `{field}`")]
    UnknownField { field: String },
    #[error("`{value}` is not a valid choice for {field}")]
    InvalidChoice { field: &'static str, value: String },
}

/// Drops every character that is not an ASCII digit.
pub fn keep_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Raw text of one form, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    schema: &'static [FieldSpec],
    values: BTreeMap<&'static str, String>,
}

impl FormState {
    pub fn new(schema: &'static [FieldSpec]) -> Self {
        let values = schema.iter().map(|spec| (spec.name, String::new())).collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &'static [FieldSpec] {
        self.schema
    }

    pub fn spec(&self, field: &str) -> Option<&'static FieldSpec> {
        let schema = self.schema;
        schema.iter().find(|spec| spec.name == field)
    }

    /// Applies one edit and returns the value actually stored.
    pub fn set(&mut self, field: &str, raw: &str) -> Result<&str, FormError> {
        let spec = self.spec(field).ok_or_else(|| FormError::UnknownField {
            field: field.to_string(),
        })?;

        let value = match spec.kind {
            FieldKind::Digits => keep_digits(raw),
            FieldKind::Choice(options) => {
                let trimmed = raw.trim();
                if !trimmed.is_empty() && !options.contains(&trimmed) {
                    return Err(FormError::InvalidChoice {
                        field: spec.name,
                        value: raw.to_string(),
                    });
                }
                trimmed.to_string()
            }
            FieldKind::Decimal | FieldKind::Integer => raw.to_string(),
        };

        let slot = self.values.entry(spec.name).or_default();
        *slot = value;
        Ok(slot.as_str())
    }

    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.values.values_mut().for_each(String::clear);
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    /// Field values in schema order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.schema.iter().map(|spec| (spec, self.get(spec.name)))
    }
}
