use serde::{Deserialize, Serialize};
use std::fmt;

/// How text values are compared against a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
    /// Ignore leading and trailing whitespace on both sides.
    pub trim: bool,
    pub case_sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            trim: true,
            case_sensitive: true,
        }
    }
}

impl MatchOptions {
    #[must_use]
    pub fn normalize<'a>(&self, text: &'a str) -> &'a str {
        if self.trim {
            text.trim()
        } else {
            text
        }
    }

    #[must_use]
    pub fn text_equals(&self, a: &str, b: &str) -> bool {
        let (a, b) = (self.normalize(a), self.normalize(b));
        if self.case_sensitive {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }
}

/// How property names are matched in the MMI scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatch {
    /// `Prosjekt_MMI` and `MMI` both match `MMI`.
    #[default]
    Contains,
    Exact,
}

/// The implicit "MMI equals 700" predicate, checked across every property set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MmiPredicate {
    pub property_name: String,
    pub name_match: NameMatch,
    pub value: String,
}

impl Default for MmiPredicate {
    fn default() -> Self {
        Self {
            property_name: "MMI".to_string(),
            name_match: NameMatch::Contains,
            value: "700".to_string(),
        }
    }
}

impl MmiPredicate {
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match self.name_match {
            NameMatch::Contains => name.contains(&self.property_name),
            NameMatch::Exact => name == self.property_name,
        }
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}={}", self.property_name, self.value)
    }
}

/// Selects the elements to mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `pset.property == value` within that single property set.
    Property {
        pset: String,
        property: String,
        value: String,
    },
    /// Any property set, any property whose name matches the predicate.
    Mmi(MmiPredicate),
}

impl Filter {
    #[must_use]
    pub fn property(
        pset: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Property {
            pset: pset.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// Value of the `Filter` field in the marking: `Pset.Property=Value`,
    /// blank for the MMI scan.
    #[must_use]
    pub fn expression(&self) -> String {
        match self {
            Self::Property {
                pset,
                property,
                value,
            } => format!("{pset}.{property}={value}"),
            Self::Mmi(_) => String::new(),
        }
    }

    /// Human readable form used in messages and the `Info` text.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Property { .. } => self.expression(),
            Self::Mmi(predicate) => predicate.summary(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
