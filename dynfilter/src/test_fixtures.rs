//! Bookstore schema shared by unit tests.

use crate::config::FilterConfig;
use crate::fields::{
    Choice, FieldDescriptor, FieldMetadata, FieldRegistry, SchemaCatalog, StorageKind,
};

pub fn book_catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_model(
            "book",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("title", StorageKind::Char).searchable(),
                FieldDescriptor::new("summary", StorageKind::Text).searchable(),
                FieldDescriptor::new("pages", StorageKind::Integer),
                FieldDescriptor::new("price", StorageKind::Decimal),
                FieldDescriptor::new("in_print", StorageKind::Boolean),
                FieldDescriptor::new("status", StorageKind::SmallInteger).with_choices(vec![
                    Choice::new("1", "Draft"),
                    Choice::new("2", "Published"),
                    Choice::new("3", "Out of print"),
                ]),
                FieldDescriptor::new("format", StorageKind::Char)
                    .with_choices(vec![
                        Choice::new("hc", "Hardcover"),
                        Choice::new("pb", "Paperback"),
                        Choice::new("eb", "E-book"),
                    ])
                    .searchable(),
                FieldDescriptor::new("published_on", StorageKind::Date),
                FieldDescriptor::new("last_modified_date", StorageKind::DateTime),
                FieldDescriptor::new("tags", StorageKind::Array),
                FieldDescriptor::new("metadata", StorageKind::Json),
                FieldDescriptor::foreign_key("author", "author"),
                FieldDescriptor::foreign_key("publisher", "publisher"),
                FieldDescriptor::reverse_relation("reviews", "review"),
            ],
        )
        .with_model(
            "author",
            vec![
                FieldDescriptor::new("id", StorageKind::BigAuto),
                FieldDescriptor::new("name", StorageKind::Char).searchable(),
                FieldDescriptor::new("email", StorageKind::Email),
                FieldDescriptor::new("born", StorageKind::Date),
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

pub fn book_registry() -> FieldRegistry {
    match FieldRegistry::build(&book_catalog(), "book", &[], FilterConfig::default()) {
        Ok(registry) => registry,
        Err(e) => panic!("book fixture failed to build: {e}"),
    }
}

pub fn metadata<'a>(registry: &'a FieldRegistry, name: &str) -> &'a FieldMetadata {
    registry
        .get(name)
        .unwrap_or_else(|| panic!("fixture has no field '{name}'"))
}
