//! Per-attribute detector filters.
//!
//! A [`Criterion`] is what a caller asks for: either an explicit list of values or a pattern.
//! [`DetectorFilter::compile`] turns a set of criteria into [`Predicate`]s, one per attribute.
//! Patterns always match the entire attribute value, so `02.` accepts `025` but not `0251`.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{HwConfigError, Result};
use crate::model::Detector;

/// Attribute name whose filter is merged with the telescope/tube selection
pub const WAFER_ATTRIBUTE: &str = "wafer";

/// A requested match on one detector attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Accept any of these exact values
    Values(Vec<String>),
    /// Accept values fully matched by this regular expression
    Pattern(String),
}

impl Criterion {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criterion::Values(values.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Criterion::Pattern(pattern.into())
    }
}

/// A compiled test on one attribute value.
#[derive(Debug, Clone)]
pub enum Predicate {
    LiteralSet(HashSet<String>),
    Pattern(Regex),
}

impl Predicate {
    fn compile(field: &str, criterion: &Criterion) -> Result<Self> {
        match criterion {
            Criterion::Values(values) => {
                Ok(Predicate::LiteralSet(values.iter().cloned().collect()))
            }
            Criterion::Pattern(pattern) => anchored(field, &[pattern.as_str()]),
        }
    }

    /// Build the wafer predicate accepting either the derived wafer ids or the explicit
    /// criterion.
    fn merged(field: &str, allowed: &[String], criterion: Option<&Criterion>) -> Result<Self> {
        match criterion {
            None => Ok(Predicate::LiteralSet(allowed.iter().cloned().collect())),
            Some(Criterion::Values(values)) => Ok(Predicate::LiteralSet(
                allowed.iter().chain(values).cloned().collect(),
            )),
            Some(Criterion::Pattern(pattern)) => {
                let mut alternatives: Vec<String> =
                    allowed.iter().map(|id| regex::escape(id)).collect();
                alternatives.push(pattern.clone());
                let borrowed: Vec<&str> = alternatives.iter().map(String::as_str).collect();
                anchored(field, &borrowed)
            }
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Predicate::LiteralSet(values) => values.contains(value),
            Predicate::Pattern(re) => re.is_match(value),
        }
    }
}

/// Compile alternatives into one regex that must match the whole value.
fn anchored(field: &str, alternatives: &[&str]) -> Result<Predicate> {
    let body = alternatives
        .iter()
        .map(|alt| format!("(?:{})", alt))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^(?:{})$", body))
        .map(Predicate::Pattern)
        .map_err(|source| HwConfigError::MalformedCriterion {
            field: field.to_string(),
            source,
        })
}

/// Conjunction of attribute predicates applied to detectors.
#[derive(Debug, Clone, Default)]
pub struct DetectorFilter {
    predicates: Vec<(String, Predicate)>,
}

impl DetectorFilter {
    /// Compile criteria into a filter.
    ///
    /// When `wafer_allow` is given (from a telescope or tube selection), it is unioned with any
    /// explicit `wafer` criterion; without an explicit criterion it becomes the wafer predicate
    /// on its own.
    pub fn compile(
        criteria: &IndexMap<String, Criterion>,
        wafer_allow: Option<&[String]>,
    ) -> Result<Self> {
        let mut predicates = Vec::with_capacity(criteria.len() + 1);

        if let Some(allowed) = wafer_allow {
            let explicit = criteria.get(WAFER_ATTRIBUTE);
            predicates.push((
                WAFER_ATTRIBUTE.to_string(),
                Predicate::merged(WAFER_ATTRIBUTE, allowed, explicit)?,
            ));
        }

        for (field, criterion) in criteria {
            if wafer_allow.is_some() && field == WAFER_ATTRIBUTE {
                continue;
            }
            predicates.push((field.clone(), Predicate::compile(field, criterion)?));
        }

        Ok(Self { predicates })
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Attribute names this filter tests, in evaluation order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|(field, _)| field.as_str())
    }

    /// Test a detector.
    ///
    /// Attributes the detector does not carry are not tested, so a filter on `handed` passes
    /// every detector without a handedness.
    pub fn accepts(&self, detector: &Detector) -> bool {
        self.predicates.iter().all(|(field, predicate)| {
            detector
                .attribute(field)
                .map_or(true, |value| predicate.matches(&value))
        })
    }
}
