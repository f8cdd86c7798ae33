//! # `SeaORM` Adapter
//!
//! Maps a [`Predicate`] to a [`sea_orm::Condition`] and [`SortKey`]s to order
//! expressions, ready for `Select::filter` / `QueryOrder::order_by`.
//!
//! A dotted field path `author.name` becomes the table-qualified column
//! `"author"."name"`, so related tables must be joined under the relation's
//! name. Json and array operators use `PostgreSQL` syntax.
//!
//! ```rust,ignore
//! let outcome = filter.apply();
//! let mut select = book::Entity::find();
//! if let Some(predicate) = &outcome.predicate {
//!     select = select.filter(dynfilter::sea::to_condition(predicate));
//! }
//! for (expr, order) in dynfilter::sea::to_order(&outcome.sort_keys) {
//!     select = select.order_by(expr, order);
//! }
//! ```

use sea_orm::sea_query::{Alias, ArrayType, Expr, Func, Keyword, LikeExpr, Order, SimpleExpr};
use sea_orm::{Condition, Value};

use crate::fields::{Operator, PATH_SEPARATOR};
use crate::filtering::{Combinator, Predicate, SortKey};
use crate::value::FilterValue;

/// Escape LIKE wildcards so caller input matches literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Column reference for a field path
fn column(field_path: &str) -> Expr {
    match field_path.split_once(PATH_SEPARATOR) {
        Some((table, name)) => Expr::col((Alias::new(table), Alias::new(name))),
        None => Expr::col(Alias::new(field_path)),
    }
}

fn column_expr(field_path: &str) -> SimpleExpr {
    column(field_path).into()
}

/// Bound value for an operand; a list binds as one array
fn value_expr(value: &FilterValue) -> SimpleExpr {
    match value {
        FilterValue::Null => SimpleExpr::Keyword(Keyword::Null),
        FilterValue::List(items) => array_value(items).into(),
        scalar => scalar_value(scalar).into(),
    }
}

fn scalar_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Null => Value::String(None),
        FilterValue::Bool(b) => Value::from(*b),
        FilterValue::Int(i) => Value::from(*i),
        FilterValue::Float(x) => Value::from(*x),
        FilterValue::Text(s) => Value::from(s.as_str()),
        FilterValue::Date(d) => Value::from(*d),
        FilterValue::DateTime(dt) => Value::from(*dt),
        FilterValue::Uuid(id) => Value::from(*id),
        FilterValue::Json(v) => Value::from(v.clone()),
        FilterValue::List(items) => array_value(items),
    }
}

fn array_element_type(value: &FilterValue) -> Option<ArrayType> {
    Some(match value {
        FilterValue::Bool(_) => ArrayType::Bool,
        FilterValue::Int(_) => ArrayType::BigInt,
        FilterValue::Float(_) => ArrayType::Double,
        FilterValue::Text(_) => ArrayType::String,
        FilterValue::Date(_) => ArrayType::ChronoDate,
        FilterValue::DateTime(_) => ArrayType::ChronoDateTime,
        FilterValue::Uuid(_) => ArrayType::Uuid,
        FilterValue::Null | FilterValue::Json(_) | FilterValue::List(_) => return None,
    })
}

/// One array parameter for a list operand.
///
/// Mixed element types fall back to a text array.
fn array_value(items: &[FilterValue]) -> Value {
    let element = items.first().and_then(array_element_type);
    let uniform = items
        .windows(2)
        .all(|pair| std::mem::discriminant(&pair[0]) == std::mem::discriminant(&pair[1]));
    match element {
        Some(element) if uniform => {
            let values = items.iter().map(scalar_value).collect();
            Value::Array(element, Some(Box::new(values)))
        }
        _ => {
            let values = items.iter().map(|item| Value::from(item.to_string())).collect();
            Value::Array(ArrayType::String, Some(Box::new(values)))
        }
    }
}

fn list_items(value: &FilterValue) -> Vec<&FilterValue> {
    match value {
        FilterValue::List(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// `LIKE` pattern text for a value
fn like_pattern(value: &FilterValue, prefix: &str, lowercase: bool) -> LikeExpr {
    let text = value.to_string();
    let text = if lowercase { text.to_lowercase() } else { text };
    LikeExpr::new(format!("{prefix}{}%", escape_like_wildcards(&text))).escape('\\')
}

fn lower(field_path: &str) -> Expr {
    Expr::expr(Func::lower(column_expr(field_path)))
}

/// `<column> <op> <operand>` for json and array comparisons.
///
/// A list operand binds as a single array parameter.
fn collection_op(field_path: &str, op: &str, value: &FilterValue) -> SimpleExpr {
    Expr::cust_with_exprs(
        format!("$1 {op} $2"),
        [column_expr(field_path), value_expr(value)],
    )
}

/// Expression for one leaf; `None` when the value cannot serve the operator
fn leaf_expr(field_path: &str, operator: Operator, value: &FilterValue) -> Option<SimpleExpr> {
    let expr = match operator {
        Operator::Exact => match value {
            FilterValue::List(items) => {
                let values = items.iter().map(value_expr);
                column(field_path).is_in(values)
            }
            scalar => column(field_path).eq(value_expr(scalar)),
        },
        Operator::IExact => lower(field_path).eq(value.to_string().to_lowercase()),
        Operator::Contains => match value {
            FilterValue::List(_) | FilterValue::Json(_) => {
                collection_op(field_path, "@>", value)
            }
            text => column(field_path).like(like_pattern(text, "%", false)),
        },
        Operator::IContains => lower(field_path).like(like_pattern(value, "%", true)),
        Operator::StartsWith => column(field_path).like(like_pattern(value, "", false)),
        Operator::IStartsWith => lower(field_path).like(like_pattern(value, "", true)),
        Operator::Gt => column(field_path).gt(value_expr(value)),
        Operator::Gte => column(field_path).gte(value_expr(value)),
        Operator::Lt => column(field_path).lt(value_expr(value)),
        Operator::Lte => column(field_path).lte(value_expr(value)),
        Operator::In => {
            let values = list_items(value).into_iter().map(value_expr);
            column(field_path).is_in(values)
        }
        Operator::Range => match value {
            FilterValue::List(bounds) if bounds.len() == 2 => {
                column(field_path).between(value_expr(&bounds[0]), value_expr(&bounds[1]))
            }
            _ => return None,
        },
        Operator::Date => {
            let date = Func::cust(Alias::new("DATE")).arg(column_expr(field_path));
            Expr::expr(date).eq(value_expr(value))
        }
        Operator::HasKey => Expr::cust_with_exprs(
            "jsonb_exists($1, $2)",
            [column_expr(field_path), value_expr(value)],
        ),
        Operator::ContainedBy => collection_op(field_path, "<@", value),
        Operator::Overlap => collection_op(field_path, "&&", value),
        Operator::Len => Expr::cust_with_exprs(
            "cardinality($1) = $2",
            [column_expr(field_path), value_expr(value)],
        ),
        Operator::IsNull => match value {
            FilterValue::Bool(false) => column(field_path).is_not_null(),
            _ => column(field_path).is_null(),
        },
    };
    Some(expr)
}

/// Translate a predicate tree into a `SeaORM` condition.
///
/// Groups map to `Condition::all` / `Condition::any`. A leaf whose value cannot
/// serve its operator is logged and left out.
#[must_use]
pub fn to_condition(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::Leaf {
            field_path,
            operator,
            value,
        } => {
            let condition = Condition::all();
            match leaf_expr(field_path, *operator, value) {
                Some(expr) => condition.add(expr),
                None => {
                    tracing::warn!(
                        field = %field_path,
                        operator = %operator,
                        "Skipping leaf with unusable value"
                    );
                    condition
                }
            }
        }
        Predicate::Group {
            combinator,
            children,
        } => {
            let group = match combinator {
                Combinator::And => Condition::all(),
                Combinator::Or => Condition::any(),
            };
            children
                .iter()
                .fold(group, |group, child| group.add(to_condition(child)))
        }
    }
}

/// Order expressions for sort keys, in order
#[must_use]
pub fn to_order(sort_keys: &[SortKey]) -> Vec<(SimpleExpr, Order)> {
    sort_keys
        .iter()
        .map(|key| {
            let order = if key.descending { Order::Desc } else { Order::Asc };
            (column_expr(&key.field_path), order)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{
        Asterisk, PostgresQueryBuilder, Query, QueryStatementWriter, SelectStatement,
        SqliteQueryBuilder, Values,
    };

    fn select(predicate: &Predicate) -> SelectStatement {
        Query::select()
            .column(Asterisk)
            .from(Alias::new("book"))
            .cond_where(to_condition(predicate))
            .to_owned()
    }

    fn sqlite(predicate: &Predicate) -> String {
        select(predicate).to_string(SqliteQueryBuilder)
    }

    fn postgres(predicate: &Predicate) -> String {
        select(predicate).to_string(PostgresQueryBuilder)
    }

    /// Statement and bound values as sent to the database
    fn postgres_built(predicate: &Predicate) -> (String, Values) {
        select(predicate).build(PostgresQueryBuilder)
    }

    #[test]
    fn test_exact_and_comparison() {
        let sql = sqlite(&Predicate::leaf("pages", Operator::Gte, 100_i64));
        assert!(sql.contains(r#""pages" >= 100"#), "{sql}");

        let sql = sqlite(&Predicate::leaf("title", Operator::Exact, "Dune"));
        assert!(sql.contains(r#""title" = 'Dune'"#), "{sql}");

        let (sql, values) = postgres_built(&Predicate::leaf("pages", Operator::Gte, 100_i64));
        assert!(sql.contains(r#""pages" >= $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(100_i64)]);
    }

    /// Column names are quoted identifiers, never interpolated text
    #[test]
    fn test_dotted_path_is_table_qualified() {
        let sql = sqlite(&Predicate::leaf("author.name", Operator::Exact, "Herbert"));
        assert!(sql.contains(r#""author"."name" = 'Herbert'"#), "{sql}");
    }

    #[test]
    fn test_icontains_lowercases_and_escapes() {
        let predicate = Predicate::leaf("title", Operator::IContains, "100%_Done");
        let sql = sqlite(&predicate);
        assert!(sql.contains(r#"LOWER("title") LIKE"#), "{sql}");
        assert!(sql.contains("done%"), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");

        let (sql, values) = postgres_built(&predicate);
        assert!(sql.contains(r#"LOWER("title") LIKE $1 ESCAPE"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(r"%100\%\_done%")]);
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like_wildcards("100%_done"), r"100\%\_done");
        assert_eq!(escape_like_wildcards(r"a\b"), r"a\\b");
        assert_eq!(escape_like_wildcards("plain"), "plain");
    }

    #[test]
    fn test_in_and_between() {
        let in_pages = Predicate::leaf("pages", Operator::In, FilterValue::from(vec![1_i64, 2]));
        let sql = sqlite(&in_pages);
        assert!(sql.contains(r#""pages" IN (1, 2)"#), "{sql}");

        let (sql, values) = postgres_built(&in_pages);
        assert!(sql.contains(r#""pages" IN ($1, $2)"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(1_i64), Value::from(2_i64)]);

        let range = Predicate::leaf("pages", Operator::Range, FilterValue::from(vec![10_i64, 20]));
        let sql = sqlite(&range);
        assert!(sql.contains(r#""pages" BETWEEN 10 AND 20"#), "{sql}");

        let (sql, values) = postgres_built(&range);
        assert!(sql.contains(r#""pages" BETWEEN $1 AND $2"#), "{sql}");
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn test_is_null() {
        let sql = sqlite(&Predicate::is_null("published_on"));
        assert!(sql.contains(r#""published_on" IS NULL"#), "{sql}");

        let (sql, values) = postgres_built(&Predicate::is_null("published_on"));
        assert!(sql.contains(r#""published_on" IS NULL"#), "{sql}");
        assert!(values.0.is_empty());
    }

    #[test]
    fn test_groups() {
        let either = Predicate::leaf("pages", Operator::Lt, 50_i64)
            .or(Predicate::leaf("pages", Operator::Gt, 500_i64));
        let predicate = Predicate::leaf("in_print", Operator::Exact, true).and(either);
        let sql = sqlite(&predicate);
        assert!(sql.contains(" AND "), "{sql}");
        assert!(sql.contains(r#""pages" < 50"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");

        let (_, values) = postgres_built(&predicate);
        assert_eq!(values.0.len(), 3);
    }

    /// Only converted uuids bind as uuids; uuid-shaped text stays text
    #[test]
    fn test_uuid_binding_follows_value_type() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id = uuid::Uuid::parse_str(raw).unwrap();

        let (sql, values) = postgres_built(&Predicate::leaf("ref", Operator::Exact, id));
        assert!(sql.contains(r#""ref" = $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(id)]);

        let (_, values) = postgres_built(&Predicate::leaf("code", Operator::Exact, raw));
        assert_eq!(values.0, vec![Value::from(raw)]);
    }

    #[test]
    fn test_date_lookup() {
        let date = chrono::NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let predicate = Predicate::leaf("last_modified_date", Operator::Date, date);
        let sql = sqlite(&predicate);
        assert!(sql.contains(r#"DATE("last_modified_date") = '2023-05-01'"#), "{sql}");

        let (sql, values) = postgres_built(&predicate);
        assert!(sql.contains(r#"DATE("last_modified_date") = $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(date)]);
    }

    /// A list operand is one array parameter, for every array operator
    #[test]
    fn test_postgres_array_operators() {
        let tags = FilterValue::from(vec!["scifi", "classic"]);
        for (operator, op) in [
            (Operator::Overlap, "&&"),
            (Operator::Contains, "@>"),
            (Operator::ContainedBy, "<@"),
        ] {
            let predicate = Predicate::leaf("tags", operator, tags.clone());
            let (sql, values) = postgres_built(&predicate);
            assert!(sql.contains(&format!(r#""tags" {op} $1"#)), "{sql}");
            assert!(!sql.contains("$2"), "{sql}");
            assert_eq!(
                values.0,
                vec![Value::Array(
                    ArrayType::String,
                    Some(Box::new(vec![Value::from("scifi"), Value::from("classic")]))
                )]
            );
        }

        let sql = postgres(&Predicate::leaf("tags", Operator::Overlap, tags));
        assert!(sql.contains(r#""tags" && ARRAY ['scifi','classic']"#), "{sql}");
    }

    #[test]
    fn test_array_value_element_types() {
        let numbers = array_value(&[FilterValue::Int(1), FilterValue::Int(2)]);
        assert!(matches!(numbers, Value::Array(ArrayType::BigInt, Some(_))));

        let mixed = array_value(&[FilterValue::Int(1), FilterValue::from("two")]);
        assert_eq!(
            mixed,
            Value::Array(
                ArrayType::String,
                Some(Box::new(vec![Value::from("1"), Value::from("two")]))
            )
        );
    }

    #[test]
    fn test_postgres_json_operators() {
        let (sql, values) = postgres_built(&Predicate::leaf("metadata", Operator::HasKey, "lang"));
        assert!(sql.contains(r#"jsonb_exists("metadata", $1)"#), "{sql}");
        assert_eq!(values.0, vec![Value::from("lang")]);

        let document = serde_json::json!({"lang": "en"});
        let predicate =
            Predicate::leaf("metadata", Operator::Contains, FilterValue::Json(document.clone()));
        let (sql, values) = postgres_built(&predicate);
        assert!(sql.contains(r#""metadata" @> $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(document)]);

        let (sql, values) = postgres_built(&Predicate::leaf("tags", Operator::Len, 3_i64));
        assert!(sql.contains(r#"cardinality("tags") = $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(3_i64)]);
    }

    #[test]
    fn test_unusable_range_is_skipped() {
        let predicate = Predicate::leaf("pages", Operator::Range, FilterValue::from(vec![1_i64]));
        let sql = sqlite(&predicate);
        assert!(!sql.contains("BETWEEN"), "{sql}");
    }

    #[test]
    fn test_to_order() {
        let order = to_order(&[SortKey::desc("published_on"), SortKey::asc("author.name")]);
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].1, Order::Desc);
        assert_eq!(order[1].1, Order::Asc);

        let sql = Query::select()
            .column(Asterisk)
            .from(Alias::new("book"))
            .order_by_expr(order[1].0.clone(), order[1].1.clone())
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#"ORDER BY "author"."name" ASC"#), "{sql}");
    }
}
