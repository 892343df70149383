//! Generated `where*` method families
//!
//! Every predicate kind comes in And/Or/Not/OrNot flavours plus the `and_*`
//! aliases. The families are spelled out once here and expanded onto each
//! builder against that builder's own dispatch method, which decides how the
//! column is qualified before the condition is stored.

/// Expand a list of `name => Chain (args) predicate;` entries into builder
/// methods calling `self.$dispatch(chain, column, predicate)`.
macro_rules! chained_predicates {
    ($dispatch:ident; $( $(#[$doc:meta])* $name:ident => $chain:ident ( $($arg:ident : $ty:ty),* ) $pred:expr; )*) => {
        $(
            $(#[$doc])*
            pub fn $name(self, column: &str, $($arg: $ty),*) -> Self {
                self.$dispatch($crate::query::types::WhereChain::$chain, column, $pred)
            }
        )*
    };
}

/// Predicates addressed at the builder's own columns
macro_rules! standard_predicates {
    ($dispatch:ident) => {
        $crate::query::predicates::chained_predicates! { $dispatch;
            /// `column = value`
            where_eq => And (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            or_where_eq => Or (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            and_where_eq => And (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            where_not_eq => Not (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            or_where_not_eq => OrNot (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            and_where_not_eq => Not (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);

            /// `column <operator> value`
            where_op => And (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            or_where_op => Or (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            and_where_op => And (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            where_not_op => Not (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            or_where_not_op => OrNot (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            and_where_not_op => Not (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);

            /// `column IN (values)`
            where_in => And (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            or_where_in => Or (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            and_where_in => And (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            where_not_in => Not (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            or_where_not_in => OrNot (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            and_where_not_in => Not (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);

            /// `column IN (sub-query)`
            where_in_subquery => And (query: $crate::query::QueryBuilder<()>)
                $crate::query::types::Predicate::InSubquery(Box::new(query));
            or_where_in_subquery => Or (query: $crate::query::QueryBuilder<()>)
                $crate::query::types::Predicate::InSubquery(Box::new(query));
            where_not_in_subquery => Not (query: $crate::query::QueryBuilder<()>)
                $crate::query::types::Predicate::InSubquery(Box::new(query));
            or_where_not_in_subquery => OrNot (query: $crate::query::QueryBuilder<()>)
                $crate::query::types::Predicate::InSubquery(Box::new(query));

            /// `column IS NULL`
            where_null => And () $crate::query::types::Predicate::Null;
            or_where_null => Or () $crate::query::types::Predicate::Null;
            and_where_null => And () $crate::query::types::Predicate::Null;
            where_not_null => Not () $crate::query::types::Predicate::Null;
            or_where_not_null => OrNot () $crate::query::types::Predicate::Null;
            and_where_not_null => Not () $crate::query::types::Predicate::Null;

            /// `column BETWEEN start AND end`
            where_between => And (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            or_where_between => Or (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            and_where_between => And (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            where_not_between => Not (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            or_where_not_between => OrNot (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            and_where_not_between => Not (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());

            /// `column LIKE pattern`
            where_like => And (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            or_where_like => Or (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            and_where_like => And (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            where_not_like => Not (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            or_where_not_like => OrNot (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());

            /// `column ILIKE pattern`
            where_ilike => And (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());
            or_where_ilike => Or (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());
            and_where_ilike => And (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());
            where_not_ilike => Not (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());
            or_where_not_ilike => OrNot (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());

            /// JSON column equal to `value`
            where_json => And (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            or_where_json => Or (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            and_where_json => And (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            where_not_json => Not (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            or_where_not_json => OrNot (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            and_where_not_json => Not (value: serde_json::Value) $crate::query::types::Predicate::Json(value);

            /// JSON column containing `value` (`@>`)
            where_json_superset => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            or_where_json_superset => Or (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            and_where_json_superset => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            where_not_json_superset => Not (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            or_where_not_json_superset => OrNot (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            and_where_not_json_superset => Not (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);

            /// JSON column contained in `value` (`<@`)
            where_json_subset => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            or_where_json_subset => Or (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            and_where_json_subset => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            where_not_json_subset => Not (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            or_where_not_json_subset => OrNot (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            and_where_not_json_subset => Not (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
        }
    };
}

/// Predicates addressed at pivot-table columns
macro_rules! pivot_predicates {
    ($dispatch:ident) => {
        $crate::query::predicates::chained_predicates! { $dispatch;
            /// `pivot.column = value`
            where_pivot => And (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            or_where_pivot => Or (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            and_where_pivot => And (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            where_not_pivot => Not (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            or_where_not_pivot => OrNot (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);
            and_where_not_pivot => Not (value: impl Into<serde_json::Value>) $crate::query::types::Predicate::eq(value);

            /// `pivot.column <operator> value`
            where_pivot_op => And (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            or_where_pivot_op => Or (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            where_not_pivot_op => Not (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);
            or_where_not_pivot_op => OrNot (operator: $crate::query::types::QueryOperator, value: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::compare(operator, value);

            /// `pivot.column IN (values)`
            where_in_pivot => And (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            or_where_in_pivot => Or (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            and_where_in_pivot => And (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            where_not_in_pivot => Not (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            or_where_not_in_pivot => OrNot (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);
            and_where_not_in_pivot => Not (values: Vec<impl Into<serde_json::Value>>) $crate::query::types::Predicate::in_list(values);

            /// `pivot.column IS NULL`
            where_null_pivot => And () $crate::query::types::Predicate::Null;
            or_where_null_pivot => Or () $crate::query::types::Predicate::Null;
            and_where_null_pivot => And () $crate::query::types::Predicate::Null;
            where_not_null_pivot => Not () $crate::query::types::Predicate::Null;
            or_where_not_null_pivot => OrNot () $crate::query::types::Predicate::Null;
            and_where_not_null_pivot => Not () $crate::query::types::Predicate::Null;

            /// `pivot.column BETWEEN start AND end`
            where_between_pivot => And (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            or_where_between_pivot => Or (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            where_not_between_pivot => Not (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());
            or_where_not_between_pivot => OrNot (start: impl Into<serde_json::Value>, end: impl Into<serde_json::Value>)
                $crate::query::types::Predicate::Between(start.into(), end.into());

            /// `pivot.column LIKE pattern`
            where_like_pivot => And (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            or_where_like_pivot => Or (pattern: &str) $crate::query::types::Predicate::Like(pattern.into());
            where_ilike_pivot => And (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());
            or_where_ilike_pivot => Or (pattern: &str) $crate::query::types::Predicate::ILike(pattern.into());

            /// JSON pivot column comparisons
            where_json_pivot => And (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            or_where_json_pivot => Or (value: serde_json::Value) $crate::query::types::Predicate::Json(value);
            where_json_superset_pivot => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            or_where_json_superset_pivot => Or (value: serde_json::Value) $crate::query::types::Predicate::JsonSuperset(value);
            where_json_subset_pivot => And (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
            or_where_json_subset_pivot => Or (value: serde_json::Value) $crate::query::types::Predicate::JsonSubset(value);
        }
    };
}

pub(crate) use chained_predicates;
pub(crate) use pivot_predicates;
pub(crate) use standard_predicates;
