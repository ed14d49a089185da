use std::collections::HashMap;

/// A single survey response: field name -> text value, in insertion order.
///
/// Blank answers are stored as empty strings. Re-inserting an existing field
/// replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if let Some(existing) = self.values.get_mut(&field) {
            *existing = value;
        } else {
            self.order.push(field.clone());
            self.values.insert(field, value);
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        let removed = self.values.remove(field)?;
        self.order.retain(|f| f != field);
        Some(removed)
    }

    /// Field names in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(move |f| (f.as_str(), self.values[f].as_str()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Rows loaded from one input file plus the header as it appeared there.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record a field name on the dataset header if it is not already there.
    pub fn add_field(&mut self, field: &str) {
        if !self.fields.iter().any(|f| f == field) {
            self.fields.push(field.to_string());
        }
    }
}

/// Whitespace-only and empty values both count as "no answer".
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
