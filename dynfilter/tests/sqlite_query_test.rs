//! Runs filter outcomes against an in-memory SQLite database.
#![cfg(feature = "sea-orm")]

mod common;

use dynfilter::config::ORDERING_PARAM;
use dynfilter::{ModelFilter, QueryParams, sea};
use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};

async fn setup_database() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared(
        "CREATE TABLE author (id INTEGER PRIMARY KEY, name TEXT NOT NULL, born TEXT, created_at TEXT);
         CREATE TABLE publisher (id INTEGER PRIMARY KEY, name TEXT NOT NULL, country TEXT);
         CREATE TABLE book (
             id INTEGER PRIMARY KEY,
             title TEXT NOT NULL,
             pages INTEGER,
             price REAL,
             in_print BOOLEAN NOT NULL,
             status INTEGER NOT NULL,
             published_on TEXT,
             created_at TEXT,
             author INTEGER REFERENCES author(id),
             publisher INTEGER REFERENCES publisher(id)
         );
         INSERT INTO author VALUES (1, 'Frank Herbert', '1920-10-08', '2024-01-01 00:00:00');
         INSERT INTO author VALUES (2, 'Ursula K. Le Guin', '1929-10-21', '2024-01-02 00:00:00');
         INSERT INTO publisher VALUES (1, 'Chilton', 'US');
         INSERT INTO publisher VALUES (2, 'Ace', 'US');
         INSERT INTO book VALUES (1, 'Dune', 412, 9.99, 1, 2, '1965-08-01', '2024-02-01 00:00:00', 1, 1);
         INSERT INTO book VALUES (2, 'Dune Messiah', 256, 8.99, 1, 2, '1969-10-15', '2024-02-02 00:00:00', 1, 2);
         INSERT INTO book VALUES (3, 'The Left Hand of Darkness', 304, 10.5, 0, 3, '1969-03-01', '2024-02-03 00:00:00', 2, 2);
         INSERT INTO book VALUES (4, 'Untitled draft', NULL, NULL, 0, 1, NULL, '2024-02-04 00:00:00', 2, NULL);",
    )
    .await?;
    Ok(db)
}

/// Titles of the books matching `query`, in the filter's order
async fn titles(db: &DatabaseConnection, query: &str) -> Vec<String> {
    let registry = common::registry("book");
    let params = QueryParams::parse(query);
    let filter = ModelFilter::new(&registry, &params);
    let outcome = filter.apply();

    let mut select = Query::select();
    select
        .column((Alias::new("book"), Alias::new("title")))
        .from(Alias::new("book"))
        .left_join(
            Alias::new("author"),
            Expr::col((Alias::new("author"), Alias::new("id")))
                .equals((Alias::new("book"), Alias::new("author"))),
        )
        .left_join(
            Alias::new("publisher"),
            Expr::col((Alias::new("publisher"), Alias::new("id")))
                .equals((Alias::new("book"), Alias::new("publisher"))),
        );
    if let Some(predicate) = &outcome.predicate {
        select.cond_where(sea::to_condition(predicate));
    }
    for (expr, order) in sea::to_order(&outcome.sort_keys) {
        select.order_by_expr(expr, order);
    }

    let statement = db.get_database_backend().build(&select);
    let rows = db.query_all(statement).await.unwrap();
    rows.iter()
        .map(|row| row.try_get::<String>("", "title").unwrap())
        .collect()
}

#[tokio::test]
async fn test_field_lookups() {
    let db = setup_database().await.unwrap();

    let found = titles(&db, "title=dune&ordering=title").await;
    assert_eq!(found, ["Dune", "Dune Messiah"]);

    let found = titles(&db, "pages__gte=300&ordering=-pages").await;
    assert_eq!(found, ["Dune", "The Left Hand of Darkness"]);

    let found = titles(&db, "status__in=1,3&ordering=title").await;
    assert_eq!(found, ["The Left Hand of Darkness", "Untitled draft"]);

    let found = titles(&db, "in_print=false&ordering=title").await;
    assert_eq!(found, ["The Left Hand of Darkness", "Untitled draft"]);
}

#[tokio::test]
async fn test_null_and_range() {
    let db = setup_database().await.unwrap();

    let found = titles(&db, "pages=null").await;
    assert_eq!(found, ["Untitled draft"]);

    let query = "published_on_min=1969-01-01&published_on_max=1969-12-31&ordering=published_on";
    let found = titles(&db, query).await;
    assert_eq!(found, ["The Left Hand of Darkness", "Dune Messiah"]);
}

/// Related fields filter and sort through the joined table
#[tokio::test]
async fn test_related_fields() {
    let db = setup_database().await.unwrap();

    let found = titles(&db, "name=le+guin&ordering=title").await;
    assert_eq!(found, ["The Left Hand of Darkness", "Untitled draft"]);

    let found = titles(&db, &format!("publisher_name=ace&{ORDERING_PARAM}=-pages")).await;
    assert_eq!(found, ["The Left Hand of Darkness", "Dune Messiah"]);
}

#[tokio::test]
async fn test_search_and_advanced_filter() {
    let db = setup_database().await.unwrap();

    let found = titles(&db, "search=darkness").await;
    assert_eq!(found, ["The Left Hand of Darkness"]);

    let document = serde_json::json!({
        "operator": "OR",
        "conditions": [
            {"field": "pages", "value": 400, "lookup": "gt"},
            {"field": "status", "value": 1}
        ]
    });
    let query = format!(
        "filter={}&ordering=title",
        url_escape::encode_component(&document.to_string())
    );
    let found = titles(&db, &query).await;
    assert_eq!(found, ["Dune", "Untitled draft"]);
}
