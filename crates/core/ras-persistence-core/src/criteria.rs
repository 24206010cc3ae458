use crate::entity::{ColumnValue, Entity};
use std::cmp::Ordering;

/// A predicate on one column. Comparisons against `NULL` never match, the
/// same as in SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IsNull,
    IsNotNull,
    EqualTo(ColumnValue),
    NotEqualTo(ColumnValue),
    GreaterThan(ColumnValue),
    GreaterThanOrEqualTo(ColumnValue),
    LessThan(ColumnValue),
    LessThanOrEqualTo(ColumnValue),
    /// SQL `LIKE` with `%` and `_` wildcards.
    Like(String),
    NotLike(String),
    In(Vec<ColumnValue>),
    NotIn(Vec<ColumnValue>),
    Between(ColumnValue, ColumnValue),
}

impl Condition {
    pub fn matches(&self, value: &ColumnValue) -> bool {
        if value.is_null() {
            return matches!(self, Condition::IsNull);
        }

        let cmp = |other: &ColumnValue| value.partial_cmp(other);
        match self {
            Condition::IsNull => false,
            Condition::IsNotNull => true,
            Condition::EqualTo(other) => value == other,
            Condition::NotEqualTo(other) => !other.is_null() && value != other,
            Condition::GreaterThan(other) => cmp(other) == Some(Ordering::Greater),
            Condition::GreaterThanOrEqualTo(other) => {
                matches!(cmp(other), Some(Ordering::Greater | Ordering::Equal))
            }
            Condition::LessThan(other) => cmp(other) == Some(Ordering::Less),
            Condition::LessThanOrEqualTo(other) => {
                matches!(cmp(other), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::Like(pattern) => like(value, pattern),
            Condition::NotLike(pattern) => {
                matches!(value, ColumnValue::Text(_)) && !like(value, pattern)
            }
            Condition::In(values) => values.contains(value),
            // `x NOT IN (.., NULL)` is never true
            Condition::NotIn(values) => {
                !values.iter().any(ColumnValue::is_null) && !values.contains(value)
            }
            Condition::Between(low, high) => {
                matches!(cmp(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cmp(high), Some(Ordering::Less | Ordering::Equal))
            }
        }
    }
}

fn like(value: &ColumnValue, pattern: &str) -> bool {
    match value {
        ColumnValue::Text(text) => {
            let text: Vec<char> = text.chars().collect();
            let pattern: Vec<char> = pattern.chars().collect();
            like_match(&text, &pattern)
        }
        _ => false,
    }
}

/// Greedy wildcard match. Only the most recent `%` is ever retried, which
/// keeps matching linear in practice and quadratic at worst.
fn like_match(text: &[char], pattern: &[char]) -> bool {
    let (mut t, mut p) = (0, 0);
    // Pattern index after the last `%`, and the text index it was tried at
    let mut retry: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                retry = Some((p + 1, t));
                p += 1;
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some(c) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match retry {
                Some((after_wildcard, tried_at)) => {
                    retry = Some((after_wildcard, tried_at + 1));
                    p = after_wildcard;
                    t = tried_at + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A conjunction of column conditions with an optional ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria<C> {
    conditions: Vec<(C, Condition)>,
    order_by: Vec<(C, SortOrder)>,
}

impl<C> Default for Criteria<C> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }
}

impl<C: Copy + Eq> Criteria<C> {
    /// Matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, column: C, condition: Condition) -> Self {
        self.conditions.push((column, condition));
        self
    }

    pub fn and_equal_to(self, column: C, value: impl Into<ColumnValue>) -> Self {
        self.and(column, Condition::EqualTo(value.into()))
    }

    pub fn and_like(self, column: C, pattern: impl Into<String>) -> Self {
        self.and(column, Condition::Like(pattern.into()))
    }

    pub fn and_is_null(self, column: C) -> Self {
        self.and(column, Condition::IsNull)
    }

    pub fn order_by(mut self, column: C, order: SortOrder) -> Self {
        self.order_by.push((column, order));
        self
    }

    pub fn matches<E: Entity<Column = C>>(&self, entity: &E) -> bool {
        self.conditions
            .iter()
            .all(|(column, condition)| condition.matches(&entity.value(*column)))
    }

    /// Sorts by the ordering clauses; rows that compare equal keep their order.
    pub fn sort<E: Entity<Column = C>>(&self, rows: &mut [E]) {
        if self.order_by.is_empty() {
            return;
        }

        rows.sort_by(|a, b| {
            for (column, order) in &self.order_by {
                let ordering = compare(&a.value(*column), &b.value(*column));
                let ordering = match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// NULL sorts first, matching ascending order in most databases.
fn compare(a: &ColumnValue, b: &ColumnValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_wildcards() {
        let value = ColumnValue::from("Acme Shoes");

        assert!(Condition::Like("Acme%".to_string()).matches(&value));
        assert!(Condition::Like("%Shoes".to_string()).matches(&value));
        assert!(Condition::Like("Acm_ Shoes".to_string()).matches(&value));
        assert!(!Condition::Like("Shoes%".to_string()).matches(&value));
        assert!(Condition::NotLike("Shoes%".to_string()).matches(&value));
    }

    #[test]
    fn test_null_semantics() {
        let null = ColumnValue::Null;

        assert!(Condition::IsNull.matches(&null));
        assert!(!Condition::EqualTo(ColumnValue::Null).matches(&null));
        assert!(!Condition::NotEqualTo(ColumnValue::from(1)).matches(&null));
        assert!(!Condition::NotIn(vec![ColumnValue::from(1)]).matches(&null));

        let two = ColumnValue::from(2);
        assert!(Condition::NotIn(vec![ColumnValue::from(1)]).matches(&two));
        assert!(!Condition::NotIn(vec![ColumnValue::from(1), ColumnValue::Null]).matches(&two));
    }

    #[test]
    fn test_like_edge_cases() {
        let empty = ColumnValue::from("");
        assert!(Condition::Like("%".to_string()).matches(&empty));
        assert!(Condition::Like("%%".to_string()).matches(&empty));
        assert!(!Condition::Like("_".to_string()).matches(&empty));

        let value = ColumnValue::from("abcabd");
        assert!(Condition::Like("%ab_".to_string()).matches(&value));
        assert!(Condition::Like("a%b%d".to_string()).matches(&value));
        assert!(!Condition::Like("a%b%e".to_string()).matches(&value));
        assert!(!Condition::Like("abc".to_string()).matches(&value));
    }

    #[test]
    fn test_like_many_wildcards_stays_fast() {
        let value = ColumnValue::from("a".repeat(200));
        let pattern = format!("{}b", "%a".repeat(30));

        assert!(!Condition::Like(pattern).matches(&value));
        assert!(Condition::Like("%a".repeat(30)).matches(&value));
    }

    #[test]
    fn test_comparisons() {
        let five = ColumnValue::from(5);

        assert!(Condition::GreaterThan(ColumnValue::from(4)).matches(&five));
        assert!(Condition::LessThanOrEqualTo(ColumnValue::from(5)).matches(&five));
        assert!(Condition::Between(ColumnValue::from(1), ColumnValue::from(5)).matches(&five));
        assert!(Condition::In(vec![ColumnValue::from(3), ColumnValue::from(5)]).matches(&five));
        assert!(!Condition::NotEqualTo(ColumnValue::from(5)).matches(&five));
    }
}
