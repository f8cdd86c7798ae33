//! # Filter Strategies
//!
//! Each strategy turns part of a request into a [`Predicate`] fragment, or
//! nothing. The set is closed and known up front:
//!
//! - **[`BasicFieldFilter`]**: one field, one operator, one value
//! - **[`SearchFilter`]**: the `search` token across searchable fields, OR-ed
//! - **[`RangeFilter`]**: `<field>_min` / `<field>_max` bounds
//! - **[`AdvancedFilter`]**: a URL-encoded JSON boolean expression in `filter`
//!
//! [`OrderingBuilder`] turns the `ordering` parameter into [`SortKey`]s.
//!
//! ## Query Parameter Examples
//!
//! ```rust,ignore
//! // Field with its default operator (icontains for text)
//! GET /books?title=dune
//!
//! // Explicit operator
//! GET /books?pages__gte=300
//! GET /books?status__in=1,2
//!
//! // Null check, whatever the operator
//! GET /books?published_on=null
//!
//! // Range bounds
//! GET /books?published_on_min=2020-01-01&published_on_max=2020-12-31
//!
//! // Free-text search over searchable fields
//! GET /books?search=herbert
//!
//! // Advanced expression (takes precedence over everything above)
//! GET /books?filter=%7B%22operator%22%3A%22OR%22%2C%22conditions%22%3A%5B...%5D%7D
//!
//! // Ordering, descending with a leading '-'
//! GET /books?ordering=-published_on,title
//! ```

pub mod advanced;
pub mod conditions;
pub mod predicate;
pub mod range;
pub mod search;
pub mod sort;

pub use advanced::{AdvancedFilter, decode_document};
pub use conditions::BasicFieldFilter;
pub use predicate::{Combinator, Predicate};
pub use range::RangeFilter;
pub use search::SearchFilter;
pub use sort::{OrderingBuilder, SortKey};
