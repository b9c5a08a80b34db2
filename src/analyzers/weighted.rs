use crate::analyzers::types::{CalculationSummary, ColumnRoles, ResultRow, ResultTable, WeightRule};
use crate::analyzers::utility::{mean, round_half_even, stddev};
use crate::table::{Row, Table};

/// Column name given to the derived score when none is configured.
pub const DEFAULT_AVERAGE_COLUMN: &str = "weighted_average";

/// Weighted average of one row, rounded half-to-even at two decimals.
///
/// Only courses whose cell is numeric contribute, to both the weighted sum
/// and the weight total. A zero weight total yields 0.0.
pub fn weighted_average(row: &Row, rule: &WeightRule) -> f64 {
    let (weighted_sum, total_weight) = applicable_totals(row, rule);

    if total_weight == 0.0 {
        0.0
    } else {
        round_half_even(weighted_sum / total_weight, 2)
    }
}

fn applicable_totals(row: &Row, rule: &WeightRule) -> (f64, f64) {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (course, weight) in rule.iter() {
        if let Some(score) = row.get(course).as_number() {
            weighted_sum += score * weight;
            total_weight += weight;
        }
    }

    (weighted_sum, total_weight)
}

/// Applies `rule` to every row of `table`.
///
/// The result keeps the identity columns of `roles` that the table has, then
/// the derived score under `average_column`, then each rule course present in
/// the table header, in rule order.
pub fn compute(
    table: &Table,
    rule: &WeightRule,
    roles: &ColumnRoles,
    average_column: &str,
) -> ResultTable {
    let identity_columns: Vec<String> = roles
        .identity
        .iter()
        .filter(|c| table.has_column(c))
        .cloned()
        .collect();

    let course_columns: Vec<String> = rule
        .courses()
        .filter(|c| table.has_column(c))
        .map(String::from)
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| ResultRow {
            identity: identity_columns.iter().map(|c| row.get(c).clone()).collect(),
            average: weighted_average(row, rule),
            courses: course_columns.iter().map(|c| row.get(c).clone()).collect(),
        })
        .collect();

    ResultTable {
        identity_columns,
        average_column: average_column.to_string(),
        course_columns,
        rows,
    }
}

/// Summarizes the derived scores of a computed table.
///
/// `without_courses` counts rows whose applicable weight total is zero, which
/// is distinct from a genuine average of 0.
pub fn summarize(table: &Table, rule: &WeightRule, result: &ResultTable) -> CalculationSummary {
    let averages = result.averages();
    let avg = mean(&averages);

    let without_courses = table
        .rows
        .iter()
        .filter(|row| applicable_totals(row, rule).1 == 0.0)
        .count();

    CalculationSummary {
        students: averages.len(),
        mean: round_half_even(avg, 2),
        stddev: round_half_even(stddev(&averages, avg), 2),
        without_courses,
    }
}
