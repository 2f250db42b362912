//! Builder for Targetprocess `where` filter expressions.
//!
//! A [`Filter`] is an ordered list of clauses joined with `and`. Each clause
//! renders inside its own parentheses:
//!
//! ```text
//! (Project.Id eq 123) and (EntityState.Name eq 'Open') and ((Name contains 'x') or (Description contains 'x'))
//! ```
//!
//! Numbers and booleans are rendered bare; strings and dates are wrapped in
//! single quotes with embedded quotes doubled. Building never fails: a bad
//! raw clause is passed through and rejected by the server instead.

use std::fmt;

use chrono::NaiveDate;

/// Comparison operator of a single constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `eq`
    Eq,
    /// `ne`
    Ne,
    /// `gt`
    Gt,
    /// `lt`
    Lt,
    /// `gte`
    Gte,
    /// `lte`
    Lte,
    /// `contains`
    Contains,
    /// `in`, with a list value
    In,
    /// `is null`, no value
    IsNull,
    /// `is not null`, no value
    IsNotNull,
}

impl Operator {
    /// The operator token as written in the filter grammar.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
            Operator::In => "in",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed constraint value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Integer, rendered bare.
    Int(i64),
    /// Floating point number, rendered bare.
    Float(f64),
    /// Boolean, rendered as `true` / `false`.
    Bool(bool),
    /// String, rendered quoted.
    Str(String),
    /// Calendar date, rendered quoted as `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Value list for `in`, rendered as `(a,b,c)`.
    List(Vec<FilterValue>),
}

impl FilterValue {
    fn render(&self, out: &mut String) {
        match self {
            FilterValue::Int(n) => out.push_str(&n.to_string()),
            FilterValue::Float(n) => out.push_str(&n.to_string()),
            FilterValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            FilterValue::Str(s) => out.push_str(&quote(s)),
            FilterValue::Date(d) => out.push_str(&quote(&d.format("%Y-%m-%d").to_string())),
            FilterValue::List(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.render(out);
                }
                out.push(')');
            }
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Str(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Str(s)
    }
}

impl From<&String> for FilterValue {
    fn from(s: &String) -> Self {
        FilterValue::Str(s.clone())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(d: NaiveDate) -> Self {
        FilterValue::Date(d)
    }
}

/// Wraps a string in single quotes, doubling embedded quotes.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn render_field(field: &str, out: &mut String) {
    if field.chars().any(char::is_whitespace) {
        out.push_str(&quote(field));
    } else {
        out.push_str(field);
    }
}

/// One `Field operator Value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    field: String,
    op: Operator,
    value: Option<FilterValue>,
}

impl Constraint {
    /// Creates a constraint. The value is ignored for `is null` / `is not null`.
    pub fn new(field: impl Into<String>, op: Operator, value: Option<FilterValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: if op.takes_value() { value } else { None },
        }
    }

    /// `field eq value`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Eq, Some(value.into()))
    }

    /// `field ne value`
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Ne, Some(value.into()))
    }

    /// `field gt value`
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Gt, Some(value.into()))
    }

    /// `field lt value`
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Lt, Some(value.into()))
    }

    /// `field gte value`
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Gte, Some(value.into()))
    }

    /// `field lte value`
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Lte, Some(value.into()))
    }

    /// `field contains value`
    pub fn contains(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, Operator::Contains, Some(value.into()))
    }

    /// `field in (v1,v2,...)`
    pub fn in_list<V: Into<FilterValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::new(field, Operator::In, Some(FilterValue::List(values)))
    }

    /// `field is null`
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNull, None)
    }

    /// `field is not null`
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, Operator::IsNotNull, None)
    }

    /// The field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.op
    }

    fn render(&self, out: &mut String) {
        render_field(&self.field, out);
        out.push(' ');
        out.push_str(self.op.as_str());
        if let Some(value) = &self.value {
            out.push(' ');
            value.render(out);
        }
    }
}

/// One parenthesized element of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A single comparison.
    Constraint(Constraint),
    /// Comparisons joined with `or`.
    AnyOf(Vec<Constraint>),
    /// A caller-supplied expression, inserted verbatim.
    Raw(String),
}

impl Clause {
    fn render(&self, out: &mut String) {
        out.push('(');
        match self {
            Clause::Constraint(c) => c.render(out),
            Clause::AnyOf(constraints) if constraints.len() == 1 => constraints[0].render(out),
            Clause::AnyOf(constraints) => {
                for (i, c) in constraints.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" or ");
                    }
                    out.push('(');
                    c.render(out);
                    out.push(')');
                }
            }
            Clause::Raw(raw) => out.push_str(raw),
        }
        out.push(')');
    }
}

/// An ordered conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a constraint.
    #[must_use]
    pub fn and(mut self, constraint: Constraint) -> Self {
        self.clauses.push(Clause::Constraint(constraint));
        self
    }

    /// Appends a constraint if present.
    #[must_use]
    pub fn and_opt(self, constraint: Option<Constraint>) -> Self {
        match constraint {
            Some(c) => self.and(c),
            None => self,
        }
    }

    /// Appends an `or` group. An empty group is skipped.
    #[must_use]
    pub fn and_any(mut self, constraints: Vec<Constraint>) -> Self {
        if !constraints.is_empty() {
            self.clauses.push(Clause::AnyOf(constraints));
        }
        self
    }

    /// Appends a raw clause. Blank input is skipped.
    #[must_use]
    pub fn and_raw(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) {
            self.clauses.push(Clause::Raw(raw.to_string()));
        }
        self
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns true when no clause has been added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the expression, or `None` when the filter is empty.
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                out.push_str(" and ");
            }
            clause.render(&mut out);
        }
        f.write_str(&out)
    }
}

impl FromIterator<Constraint> for Filter {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().map(Clause::Constraint).collect(),
        }
    }
}

/// Renders a list of constraints joined with `and`.
///
/// Returns `None` for an empty list, meaning the `where` parameter is omitted.
pub fn build_filter(constraints: impl IntoIterator<Item = Constraint>) -> Option<String> {
    constraints.into_iter().collect::<Filter>().render()
}
