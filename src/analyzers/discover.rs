use crate::analyzers::types::ColumnRoles;

/// Lists the header columns that can carry a credit weight, in header order.
///
/// Identity and metadata columns named by `roles` are left out.
pub fn discover_courses(header: &[String], roles: &ColumnRoles) -> Vec<String> {
    header
        .iter()
        .filter(|column| roles.is_course(column))
        .cloned()
        .collect()
}
