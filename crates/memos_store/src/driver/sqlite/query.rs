//! Conjunctive WHERE-clause and sparse SET-clause builders.
//!
//! Clauses are static SQL fragments chosen by the caller; values are always
//! bound as parameters. Only fields that are present add a clause.

use rusqlite::types::Value;

#[derive(Debug, Default)]
pub(super) struct Filter {
    clauses: Vec<String>,
    args: Vec<Value>,
}

impl Filter {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Adds a clause with exactly one `?` placeholder.
    pub(super) fn eq(&mut self, clause: &'static str, value: impl Into<Value>) {
        self.clauses.push(clause.to_string());
        self.args.push(value.into());
    }

    /// Adds a clause with `?` bound when `value` is present.
    pub(super) fn eq_opt<T: Into<Value>>(&mut self, clause: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.eq(clause, value);
        }
    }

    /// Adds a parameterless clause.
    pub(super) fn raw(&mut self, clause: &'static str) {
        self.clauses.push(clause.to_string());
    }

    /// Adds `column IN (?, ?, ...)`; an empty list matches nothing.
    pub(super) fn any_of(&mut self, column: &'static str, values: Vec<Value>) {
        if values.is_empty() {
            self.clauses.push("1 = 0".to_string());
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} IN ({placeholders})"));
        self.args.extend(values);
    }

    /// Renders ` WHERE a AND b`, or nothing when no clause was added.
    pub(super) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Appends LIMIT/OFFSET to `sql`, binding both values.
    pub(super) fn limit_offset(&mut self, sql: &mut String, limit: Option<u32>, offset: u32) {
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            self.args.push(Value::Integer(i64::from(limit)));
            if offset > 0 {
                sql.push_str(" OFFSET ?");
                self.args.push(Value::Integer(i64::from(offset)));
            }
        } else if offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            self.args.push(Value::Integer(i64::from(offset)));
        }
    }

    pub(super) fn into_args(self) -> Vec<Value> {
        self.args
    }
}

/// Sparse `SET` list for update statements.
#[derive(Debug, Default)]
pub(super) struct Patch {
    assignments: Vec<&'static str>,
    args: Vec<Value>,
}

impl Patch {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment with exactly one `?` placeholder.
    pub(super) fn set<T: Into<Value>>(&mut self, assignment: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.assignments.push(assignment);
            self.args.push(value.into());
        }
    }

    /// Adds a parameterless assignment, e.g. a timestamp refresh.
    pub(super) fn raw(&mut self, assignment: &'static str) {
        self.assignments.push(assignment);
    }

    /// Renders ` SET a = ?, b = ?`.
    pub(super) fn set_sql(&self) -> String {
        format!(" SET {}", self.assignments.join(", "))
    }

    /// Returns bound values followed by `trailing` (the row key).
    pub(super) fn into_args(mut self, trailing: impl Into<Value>) -> Vec<Value> {
        self.args.push(trailing.into());
        self.args
    }
}

#[cfg(test)]
mod tests {
    use super::{Filter, Patch};
    use rusqlite::types::Value;

    #[test]
    fn empty_filter_renders_no_where_clause() {
        let filter = Filter::new();
        assert_eq!(filter.where_sql(), "");
    }

    #[test]
    fn present_fields_are_joined_with_and() {
        let mut filter = Filter::new();
        filter.eq_opt("id = ?", Some(3_i32));
        filter.eq_opt::<i32>("creator_id = ?", None);
        filter.eq("username = ?", "alice".to_string());
        assert_eq!(filter.where_sql(), " WHERE id = ? AND username = ?");
        assert_eq!(filter.into_args().len(), 2);
    }

    #[test]
    fn any_of_expands_placeholders_and_empty_matches_nothing() {
        let mut filter = Filter::new();
        filter.any_of("id", vec![Value::Integer(1), Value::Integer(2)]);
        filter.any_of("visibility", Vec::new());
        assert_eq!(filter.where_sql(), " WHERE id IN (?, ?) AND 1 = 0");
    }

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let mut filter = Filter::new();
        let mut sql = String::from("SELECT 1");
        filter.limit_offset(&mut sql, None, 5);
        assert_eq!(sql, "SELECT 1 LIMIT -1 OFFSET ?");
    }

    #[test]
    fn patch_renders_only_present_assignments() {
        let mut patch = Patch::new();
        patch.set("nickname = ?", Some("Al".to_string()));
        patch.set::<String>("email = ?", None);
        patch.raw("updated_ts = CAST(strftime('%s', 'now') AS INTEGER)");
        assert_eq!(
            patch.set_sql(),
            " SET nickname = ?, updated_ts = CAST(strftime('%s', 'now') AS INTEGER)"
        );
        assert_eq!(patch.into_args(7_i32).len(), 2);
    }
}
