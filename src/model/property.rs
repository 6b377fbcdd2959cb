use super::filter::MatchOptions;
use crate::parser::StepValue;
use std::collections::BTreeMap;
use std::fmt;

/// Label used for properties without a value.
pub const NO_VALUE_LABEL: &str = "Ingen verdi";

/// Scalar value of an `IfcPropertySingleValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// IfcLogical `.U.`
    Unknown,
    Null,
}

impl PropertyValue {
    #[must_use]
    pub fn from_step(value: &StepValue) -> Self {
        match value {
            StepValue::Typed(_, inner) => Self::from_step(inner),
            StepValue::String(s) | StepValue::Binary(s) => Self::Text(s.clone()),
            StepValue::Integer(i) => Self::Integer(*i),
            StepValue::Real(f) => Self::Real(*f),
            StepValue::Boolean(b) => Self::Boolean(*b),
            StepValue::Enum(e) if e == "U" || e == "UNKNOWN" => Self::Unknown,
            StepValue::Enum(e) => Self::Text(e.clone()),
            StepValue::Reference(id) => Self::Text(format!("#{id}")),
            StepValue::List(items) => Self::Text(
                items
                    .iter()
                    .map(|item| Self::from_step(item).label())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            StepValue::Null | StepValue::Derived => Self::Null,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Text shown in selection lists and written into filter expressions.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            _ if self.is_empty() => NO_VALUE_LABEL.to_string(),
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Real(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Unknown => "unknown".to_string(),
            Self::Null => NO_VALUE_LABEL.to_string(),
        }
    }

    /// Compares against a filter value. Numbers compare numerically when the
    /// target parses as a number, booleans as booleans, everything else as
    /// text under `options`.
    #[must_use]
    pub fn matches(&self, target: &str, options: &MatchOptions) -> bool {
        let target = options.normalize(target);

        if self.is_empty() {
            return target.is_empty() || options.text_equals(NO_VALUE_LABEL, target);
        }

        match self {
            Self::Integer(_) | Self::Real(_) => match (self.as_f64(), target.parse::<f64>()) {
                (Some(actual), Ok(wanted)) => numbers_equal(actual, wanted),
                _ => options.text_equals(&self.label(), target),
            },
            Self::Boolean(actual) => match parse_bool(target) {
                Some(wanted) => *actual == wanted,
                None => options.text_equals(&self.label(), target),
            },
            _ => options.text_equals(&self.label(), target),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | ".t." | "yes" => Some(true),
        "false" | "f" | ".f." | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet {
    pub id: u64,
    pub name: String,
    pub properties: Vec<Property>,
}

impl PropertySet {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Property sets → properties → values (with element counts) seen on elements.
#[derive(Debug, Clone, Default)]
pub struct PsetIndex {
    psets: BTreeMap<String, BTreeMap<String, BTreeMap<String, usize>>>,
}

impl PsetIndex {
    pub fn add_property_set(&mut self, pset: &str) {
        self.psets.entry(pset.to_string()).or_default();
    }

    pub fn insert(&mut self, pset: &str, property: &str, value: String, count: usize) {
        *self
            .psets
            .entry(pset.to_string())
            .or_default()
            .entry(property.to_string())
            .or_default()
            .entry(value)
            .or_insert(0) += count;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.psets.is_empty()
    }

    #[must_use]
    pub fn pset_names(&self) -> Vec<&str> {
        self.psets.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn property_names(&self, pset: &str) -> Vec<&str> {
        self.psets
            .get(pset)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Values sorted by count (most common first), then by label.
    #[must_use]
    pub fn values(&self, pset: &str, property: &str) -> Vec<ValueCount> {
        let mut values: Vec<ValueCount> = self
            .psets
            .get(pset)
            .and_then(|props| props.get(property))
            .map(|values| {
                values
                    .iter()
                    .map(|(value, count)| ValueCount {
                        value: value.clone(),
                        count: *count,
                    })
                    .collect()
            })
            .unwrap_or_default();

        values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        values
    }
}
