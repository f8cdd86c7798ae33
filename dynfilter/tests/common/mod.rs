//! Bookstore schema shared by the integration tests.
#![allow(dead_code)]

use dynfilter::{
    Choice, FieldDescriptor, FieldRegistry, FilterConfig, SchemaCatalog, StorageKind,
};

/// `book`, `author` and `publisher`, with a self-relation on `author` and
/// field names that collide across relations.
pub fn bookstore() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_model(
            "book",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("title", StorageKind::Char).searchable(),
                FieldDescriptor::new("pages", StorageKind::Integer),
                FieldDescriptor::new("price", StorageKind::Decimal),
                FieldDescriptor::new("in_print", StorageKind::Boolean),
                FieldDescriptor::new("status", StorageKind::SmallInteger).with_choices(vec![
                    Choice::new("1", "Draft"),
                    Choice::new("2", "Published"),
                    Choice::new("3", "Out of print"),
                ]),
                FieldDescriptor::new("published_on", StorageKind::Date),
                FieldDescriptor::new("created_at", StorageKind::DateTime),
                FieldDescriptor::foreign_key("author", "author"),
                FieldDescriptor::foreign_key("publisher", "publisher"),
            ],
        )
        .with_model(
            "author",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("name", StorageKind::Char).searchable(),
                FieldDescriptor::new("born", StorageKind::Date),
                FieldDescriptor::new("created_at", StorageKind::DateTime),
                FieldDescriptor::foreign_key("mentor", "author"),
                FieldDescriptor::reverse_relation("book_set", "book"),
            ],
        )
        .with_model(
            "publisher",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("name", StorageKind::Char),
                FieldDescriptor::new("country", StorageKind::Char),
            ],
        )
}

pub fn registry(model: &str) -> FieldRegistry {
    registry_with(model, FilterConfig::default())
}

pub fn registry_with(model: &str, config: FilterConfig) -> FieldRegistry {
    FieldRegistry::build(&bookstore(), model, &[], config)
        .unwrap_or_else(|e| panic!("bookstore fixture failed for '{model}': {e}"))
}

/// Route library logs to the test writer; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dynfilter=debug")),
        )
        .with_test_writer()
        .try_init();
}
