//! # srcmap
//!
//! This crate reads, queries and writes [source maps](https://tc39.es/source-map/) (revision 3).
//!
//! ## Getting Started
//!
//! ```
//! use srcmap::{Bias, SourceMapConsumer};
//!
//! let json = br#"{
//!     "version": 3,
//!     "file": "min.js",
//!     "sources": ["one.js"],
//!     "names": ["bar"],
//!     "mappings": "CAAC,IAAI,IAAM,SAAUA"
//! }"#;
//! let consumer = SourceMapConsumer::from_vec(json.to_vec()).unwrap();
//!
//! // lines are 1-based, columns are 0-based
//! let pos = consumer.original_position_for(1, 18, Bias::default()).unwrap();
//! assert_eq!(pos.source.as_deref(), Some("one.js"));
//! assert_eq!((pos.line, pos.column), (Some(1), Some(21)));
//! assert_eq!(pos.name.as_deref(), Some("bar"));
//! ```
//!
//! ## Overview
//!
//! ### `SourceMapConsumer`
//!
//! [SourceMapConsumer] answers queries in both directions: from a generated position to
//! an original one, and from an original position to the generated ones. Mappings are
//! decoded lazily, on the first query that needs them.
//!
//! ### `SourceMapGenerator`
//!
//! [SourceMapGenerator] builds a source map incrementally. It can also be created from a
//! consumer, and rewritten through another source map with
//! [SourceMapGenerator::apply_source_map], which is how the maps of two compilation
//! steps are chained.
//!
//! ### `Mapping`
//!
//! [Mapping] is a single mapping with its source and name spelled out, the unit accepted
//! by the generator and produced by [SourceMapConsumer::each_mapping].
//!
//! ## Features
//!
//! - `generator` (default): Enables [SourceMapGenerator] and [SourceMapConsumer::from_generator].
//! - `index-map` (default): Enables support for index maps, as described in the
//!   [format](https://tc39.es/source-map/#index-map).
//!

mod array_set;
mod binary_search;
mod consumer;
mod error;
#[cfg(feature = "generator")]
mod generator;
mod mapping;
mod mappings;
mod raw;
mod splitter;
pub mod url;
pub mod vlq;

pub use array_set::ArraySet;
pub use binary_search::{search_by_key, Bias};
pub use consumer::*;
pub use error::*;
#[cfg(feature = "generator")]
pub use generator::SourceMapGenerator;
pub use mapping::*;
pub use mappings::UNBOUNDED_COLUMN;
pub use raw::{RawOffset, RawSection, RawSourceMap};
