//! entityspider - declarative crawl entities compiled into validated storage schemas
//!
//! Entity types declare their fields, selectors and table metadata. During
//! spider setup each declaration is compiled once into a frozen
//! `EntityDefine` and registered with every storage pipeline.

pub mod config;
pub mod observability;
pub mod pipeline;
pub mod schema;
pub mod spider;
