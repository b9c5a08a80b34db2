//! Data types used by the weighting pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RaterError, Result};
use crate::table::Cell;

/// Names of the non-course columns in a score sheet.
///
/// `identity` columns are copied into the result, in this order, when the
/// sheet has them. `identity` and `metadata` columns are never offered as
/// courses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub identity: Vec<String>,
    pub metadata: Vec<String>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            identity: ["学号", "姓名", "student_id", "id", "name"]
                .into_iter()
                .map(String::from)
                .collect(),
            metadata: ["专业", "major"].into_iter().map(String::from).collect(),
        }
    }
}

impl ColumnRoles {
    pub fn is_course(&self, column: &str) -> bool {
        !self.identity.iter().any(|c| c == column) && !self.metadata.iter().any(|c| c == column)
    }
}

/// A credit as sent by a client: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credit {
    Number(f64),
    Text(String),
}

impl Credit {
    pub fn value(&self) -> Option<f64> {
        match self {
            Credit::Number(v) => Some(*v),
            Credit::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for Credit {
    fn from(v: f64) -> Self {
        Credit::Number(v)
    }
}

/// One `{course, credit}` pair from a calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub course: String,
    pub credit: Credit,
}

impl RuleEntry {
    pub fn new(course: impl Into<String>, credit: impl Into<Credit>) -> Self {
        Self {
            course: course.into(),
            credit: credit.into(),
        }
    }
}

/// Course-to-credit mapping for one calculation, in the order it was given.
///
/// Inserting a course twice keeps its first position and the last weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightRule {
    entries: Vec<(String, f64)>,
}

impl WeightRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, course: impl Into<String>, weight: f64) {
        let course = course.into();
        match self.entries.iter_mut().find(|(c, _)| *c == course) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((course, weight)),
        }
    }

    pub fn with(mut self, course: impl Into<String>, weight: f64) -> Self {
        self.insert(course, weight);
        self
    }

    /// Builds a rule from request entries.
    ///
    /// # Errors
    ///
    /// Returns [`RaterError::InvalidCredit`] for the first credit that is
    /// not a number.
    pub fn from_entries(entries: &[RuleEntry]) -> Result<Self> {
        let mut rule = Self::new();
        for entry in entries {
            let weight = entry
                .credit
                .value()
                .ok_or_else(|| RaterError::InvalidCredit {
                    course: entry.course.clone(),
                    value: match &entry.credit {
                        Credit::Number(v) => v.to_string(),
                        Credit::Text(s) => s.clone(),
                    },
                })?;
            rule.insert(entry.course.clone(), weight);
        }
        Ok(rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(c, w)| (c.as_str(), *w))
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WeightRule {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut rule = Self::new();
        for (course, weight) in iter {
            rule.insert(course, weight);
        }
        rule
    }
}

/// One student's output: identity cells, weighted average, selected courses.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub identity: Vec<Cell>,
    pub average: f64,
    pub courses: Vec<Cell>,
}

impl ResultRow {
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.identity.len() + 1 + self.courses.len());
        cells.extend(self.identity.iter().cloned());
        cells.push(Cell::number(self.average));
        cells.extend(self.courses.iter().cloned());
        cells
    }
}

/// Output table of a calculation. Column order is identity, average, courses.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub identity_columns: Vec<String>,
    pub average_column: String,
    pub course_columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.identity_columns.clone();
        columns.push(self.average_column.clone());
        columns.extend(self.course_columns.iter().cloned());
        columns
    }

    pub fn records(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(ResultRow::cells).collect()
    }

    pub fn averages(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.average).collect()
    }
}

/// Descriptive statistics over the weighted averages of one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub students: usize,
    pub mean: f64,
    pub stddev: f64,
    /// Students with no numeric score in any weighted course.
    pub without_courses: usize,
}
