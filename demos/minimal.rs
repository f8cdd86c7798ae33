// Minimal example: filter a query string against an in-memory bookstore schema
//
// Run with: cargo run --example minimal -- 'title=dune&pages__gte=300&ordering=-published_on'
use dynfilter::{
    Choice, FieldDescriptor, FilterConfig, ModelFilter, QueryParams, SchemaCatalog, StorageKind,
};
use tracing_subscriber::EnvFilter;

fn bookstore() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_model(
            "book",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("title", StorageKind::Char).searchable(),
                FieldDescriptor::new("pages", StorageKind::Integer),
                FieldDescriptor::new("status", StorageKind::SmallInteger).with_choices(vec![
                    Choice::new("1", "Draft"),
                    Choice::new("2", "Published"),
                ]),
                FieldDescriptor::new("published_on", StorageKind::Date),
                FieldDescriptor::foreign_key("author", "author"),
            ],
        )
        .with_model(
            "author",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("name", StorageKind::Char).searchable(),
            ],
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dynfilter=debug")),
        )
        .init();

    let query = std::env::args().nth(1).unwrap_or_else(|| {
        "title=dune&pages__gte=300&status__in=1,2&ordering=-published_on,name".to_string()
    });
    let params = QueryParams::parse(&query);

    let catalog = bookstore();
    let config = FilterConfig::default().with_default_ordering("title");
    let filter = ModelFilter::for_model(&catalog, "book", &[], config, &params)?;
    let outcome = filter.apply();

    match &outcome.predicate {
        Some(predicate) => println!("predicate: {predicate}"),
        None => println!("predicate: none"),
    }
    let ordering: Vec<String> = outcome.sort_keys.iter().map(ToString::to_string).collect();
    println!("ordering:  {}", ordering.join(", "));
    for diagnostic in &outcome.diagnostics {
        println!("dropped:   {:?} {}", diagnostic.kind, diagnostic.message);
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&filter.get_filterable_fields())?);

    #[cfg(feature = "sea-orm")]
    if let Some(predicate) = &outcome.predicate {
        use sea_orm::sea_query::{Alias, Asterisk, Query, QueryStatementWriter, SqliteQueryBuilder};
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(Alias::new("book"))
            .cond_where(dynfilter::sea::to_condition(predicate));
        for (expr, order) in dynfilter::sea::to_order(&outcome.sort_keys) {
            select.order_by_expr(expr, order);
        }
        println!();
        println!("{}", select.to_string(SqliteQueryBuilder));
    }

    Ok(())
}
