mod basic;
#[cfg(feature = "index-map")]
mod indexed;

pub use basic::BasicSourceMapConsumer;
#[cfg(feature = "index-map")]
pub use indexed::{IndexedSourceMapConsumer, Section};

use crate::array_set::ArraySet;
use crate::binary_search::Bias;
use crate::mapping::{Mapping, Position};
use crate::mappings::{ParsedMapping, ParsedMappings};
use crate::raw::RawSourceMap;
use crate::{url, Error, Result};

/// Iteration order for [`SourceMapConsumer::each_mapping`].
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Order {
    /// Every mapping, by generated line and column.
    #[default]
    Generated,
    /// Mappings with a source, by source, original line and original column.
    Original,
}

/// The result of [`SourceMapConsumer::original_position_for`].
///
/// Every field is `None` when no mapping was found.
#[derive(
    Debug, Default, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct OriginalPosition {
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub name: Option<String>,
}

impl OriginalPosition {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }
}

/// A position in the generated file.
///
/// `last_column` is only known after
/// [`compute_column_spans`](SourceMapConsumer::compute_column_spans), and is
/// [`UNBOUNDED_COLUMN`](crate::UNBOUNDED_COLUMN) for the last mapping of a line.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct GeneratedPosition {
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub last_column: Option<u32>,
}

impl GeneratedPosition {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line.is_none()
    }
}

impl From<&ParsedMapping> for GeneratedPosition {
    fn from(mapping: &ParsedMapping) -> Self {
        let generated = mapping.generated();
        Self {
            line: Some(generated.line),
            column: Some(generated.column),
            last_column: mapping.last_generated_column(),
        }
    }
}

/// Reads source maps and answers position queries.
///
/// A regular map becomes a [`BasicSourceMapConsumer`]; an index map, made of
/// sections that each embed a map, becomes an [`IndexedSourceMapConsumer`].
///
/// Mappings are decoded on the first query that needs them, so queries return
/// [`Result`]. A position that has no mapping is not an error: it is reported
/// as an empty record.
///
/// A consumer must not be shared between threads before its first query
/// completes.
#[derive(Debug)]
pub enum SourceMapConsumer {
    Basic(BasicSourceMapConsumer),
    #[cfg(feature = "index-map")]
    Indexed(IndexedSourceMapConsumer),
}

macro_rules! dispatch {
    ($self:expr, $consumer:ident => $body:expr) => {
        match $self {
            SourceMapConsumer::Basic($consumer) => $body,
            #[cfg(feature = "index-map")]
            SourceMapConsumer::Indexed($consumer) => $body,
        }
    };
}

impl SourceMapConsumer {
    pub fn from_raw(raw: RawSourceMap) -> Result<Self> {
        if raw.version != Some(3) {
            return Err(Error::UnsupportedVersion(raw.version));
        }
        if raw.is_index_map() {
            #[cfg(feature = "index-map")]
            return IndexedSourceMapConsumer::from_raw(raw).map(Self::Indexed);
            #[cfg(not(feature = "index-map"))]
            return Err(Error::IndexMapUnsupported);
        }
        BasicSourceMapConsumer::from_raw(raw).map(Self::Basic)
    }

    /// Parses a JSON source map. The buffer is modified in place.
    #[inline]
    pub fn from_slice(json: &mut [u8]) -> Result<Self> {
        Self::from_raw(RawSourceMap::parse(json)?)
    }

    #[inline]
    pub fn from_vec(mut json: Vec<u8>) -> Result<Self> {
        Self::from_slice(&mut json)
    }

    /// Builds a consumer from the current state of a generator, without
    /// serializing it first.
    #[cfg(feature = "generator")]
    pub fn from_generator(generator: &crate::SourceMapGenerator) -> Self {
        Self::Basic(BasicSourceMapConsumer::from_generator(generator))
    }

    pub fn file(&self) -> Option<&str> {
        dispatch!(self, c => c.file())
    }

    /// The source root. Index maps have none; their sources are resolved
    /// against each section's own root.
    pub fn source_root(&self) -> Option<&str> {
        dispatch!(self, c => c.source_root())
    }

    /// Every source, resolved against the source root.
    pub fn sources(&self) -> Vec<String> {
        dispatch!(self, c => c.sources())
    }

    #[cfg(feature = "index-map")]
    pub(crate) fn has_source(&self, source: &str) -> bool {
        dispatch!(self, c => c.has_source(source))
    }

    /// Finds the original position for a generated position (1-based line,
    /// 0-based column).
    ///
    /// Without an exact match, `bias` picks the closest mapping before or
    /// after the position on the same line.
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<OriginalPosition> {
        dispatch!(self, c => c.original_position_for(line, column, bias))
    }

    /// Finds the generated position for an original position in `source`.
    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<GeneratedPosition> {
        dispatch!(self, c => c.generated_position_for(source, line, column, bias))
    }

    /// Finds every generated position for an original line, or for a line
    /// and column.
    ///
    /// Without a column, the mappings of `line` are returned, or those of the
    /// next original line that has any. With a column, the mappings of
    /// `line` at that column are returned, or those at the next column that
    /// has any.
    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> Result<Vec<GeneratedPosition>> {
        dispatch!(self, c => c.all_generated_positions_for(source, line, column))
    }

    /// Returns the embedded content of `source`.
    ///
    /// A source that is not in the map is an [`Error::SourceNotFound`] unless
    /// `null_on_missing` is set.
    pub fn source_content_for(&self, source: &str, null_on_missing: bool) -> Result<Option<&str>> {
        dispatch!(self, c => c.source_content_for(source, null_on_missing))
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        dispatch!(self, c => c.has_contents_of_all_sources())
    }

    pub fn each_mapping(&self, order: Order) -> Result<MappingIter<'_>> {
        dispatch!(self, c => c.each_mapping(order))
    }

    /// Fills in the last generated column of every mapping, as reported by
    /// [`GeneratedPosition::last_column`].
    pub fn compute_column_spans(&mut self) -> Result<()> {
        dispatch!(self, c => c.compute_column_spans())
    }
}

/// Decoded mappings together with the tables their indices point into.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MappingsView<'a> {
    pub mappings: &'a ParsedMappings,
    pub sources: &'a ArraySet,
    pub names: &'a ArraySet,
    pub source_root: Option<&'a str>,
}

impl<'a> MappingsView<'a> {
    fn source_at(&self, id: u32) -> String {
        let source = self.sources.at(id).unwrap_or_default();
        match self.source_root {
            Some(root) => url::join(root, source),
            None => source.to_owned(),
        }
    }

    fn name_at(&self, id: u32) -> Option<String> {
        self.names.at(id).map(str::to_owned)
    }

    /// Resolves a source given by a caller to its index in the table.
    pub fn source_id(&self, source: &str) -> Option<u32> {
        match self.source_root {
            Some(root) => self.sources.index_of(&url::relative(root, source)),
            None => self.sources.index_of(source),
        }
    }

    pub fn to_mapping(&self, mapping: &ParsedMapping) -> Mapping {
        let generated = mapping.generated();
        let mut result = Mapping::new(generated.line, generated.column);
        if let Some(info) = mapping.source_info() {
            result = result.with_source(
                self.source_at(info.id),
                info.position.line,
                info.position.column,
            );
            if let Some(name) = mapping.name_info().and_then(|id| self.name_at(id)) {
                result = result.with_name(name);
            }
        }
        result
    }

    pub fn original_position_for(&self, pos: Position, bias: Bias) -> OriginalPosition {
        let Some(mapping) = self
            .mappings
            .find_by_generated(pos, bias)
            .filter(|mapping| mapping.generated().line == pos.line)
        else {
            return OriginalPosition::default();
        };
        let Some(info) = mapping.source_info() else {
            return OriginalPosition::default();
        };

        OriginalPosition {
            source: Some(self.source_at(info.id)),
            line: Some(info.position.line),
            column: Some(info.position.column),
            name: mapping.name_info().and_then(|id| self.name_at(id)),
        }
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        pos: Position,
        bias: Bias,
    ) -> GeneratedPosition {
        let Some(source_id) = self.source_id(source) else {
            return GeneratedPosition::default();
        };
        self.mappings
            .find_by_original(source_id, pos, bias)
            .and_then(|idx| self.mappings.original_at(idx))
            .filter(|mapping| mapping.source_info().is_some_and(|info| info.id == source_id))
            .map(GeneratedPosition::from)
            .unwrap_or_default()
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> Vec<GeneratedPosition> {
        let Some(source_id) = self.source_id(source) else {
            return Vec::new();
        };
        // a missing column searches from the start of the line
        let needle = Position::new(line, column.unwrap_or(0));
        let Some(start) = self
            .mappings
            .find_by_original(source_id, needle, Bias::LeastUpperBound)
        else {
            return Vec::new();
        };
        let Some(found) = self
            .mappings
            .original_at(start)
            .and_then(ParsedMapping::source_info)
            .filter(|info| info.id == source_id)
        else {
            return Vec::new();
        };

        // without a column, take the whole line that was found; with one,
        // take the found column on the requested line
        let target = match column {
            None => (found.position.line, None),
            Some(_) => (line, Some(found.position.column)),
        };
        (start..)
            .map_while(|idx| self.mappings.original_at(idx))
            .take_while(|mapping| {
                mapping.source_info().is_some_and(|info| {
                    info.id == source_id
                        && info.position.line == target.0
                        && target.1.map_or(true, |column| info.position.column == column)
                })
            })
            .map(GeneratedPosition::from)
            .collect()
    }
}

/// Iterator over the mappings of a consumer, see [`SourceMapConsumer::each_mapping`].
#[derive(Debug, Clone)]
pub struct MappingIter<'a> {
    view: MappingsView<'a>,
    order: Order,
    idx: usize,
}

impl<'a> MappingIter<'a> {
    pub(crate) fn new(view: MappingsView<'a>, order: Order) -> Self {
        Self { view, order, idx: 0 }
    }
}

impl Iterator for MappingIter<'_> {
    type Item = Mapping;

    fn next(&mut self) -> Option<Self::Item> {
        let mapping = match self.order {
            Order::Generated => self.view.mappings.generated().get(self.idx)?,
            Order::Original => self.view.mappings.original_at(self.idx)?,
        };
        self.idx += 1;
        Some(self.view.to_mapping(mapping))
    }
}
