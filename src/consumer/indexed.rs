use super::{GeneratedPosition, MappingIter, MappingsView, Order, OriginalPosition, SourceMapConsumer};
use crate::array_set::ArraySet;
use crate::binary_search::{search_by_key, Bias};
use crate::mapping::Position;
use crate::mappings::{ParsedMapping, ParsedMappings, UNBOUNDED_COLUMN};
use crate::raw::{RawOffset, RawSourceMap};
use crate::{Error, Result};
use std::cell::OnceCell;

/// A region of an index map's generated file, covered by its own map.
#[derive(Debug)]
pub struct Section {
    // 1-based line, 0-based column
    offset: Position,
    consumer: SourceMapConsumer,
}

impl Section {
    /// Where the section starts in the generated file.
    #[inline]
    pub fn offset(&self) -> Position {
        self.offset
    }

    #[inline]
    pub fn consumer(&self) -> &SourceMapConsumer {
        &self.consumer
    }

    /// Converts a generated position into the section's coordinates. Columns
    /// only shift on the section's first line.
    fn to_local(&self, pos: Position) -> Position {
        let line = pos.line - self.offset.line + 1;
        let column = if pos.line == self.offset.line {
            pos.column.saturating_sub(self.offset.column)
        } else {
            pos.column
        };
        Position::new(line, column)
    }

    /// The reverse of [`Section::to_local`], or `None` when the result does
    /// not fit in a `u32`.
    fn to_global(&self, pos: Position) -> Option<Position> {
        let line = (self.offset.line - 1).checked_add(pos.line)?;
        Some(Position::new(line, self.shift_column(pos.line, pos.column)?))
    }

    fn shift_column(&self, local_line: u32, column: u32) -> Option<u32> {
        if local_line == 1 {
            column.checked_add(self.offset.column)
        } else {
            Some(column)
        }
    }
}

#[derive(Debug)]
struct Flattened {
    mappings: ParsedMappings,
    sources: ArraySet,
    names: ArraySet,
}

/// A consumer for an index map.
///
/// Position lookups are delegated to the section that covers the position.
/// Queries over every mapping use a flattened copy of all sections, built on
/// first use.
#[derive(Debug)]
pub struct IndexedSourceMapConsumer {
    file: Option<String>,
    sections: Vec<Section>,
    flattened: OnceCell<Flattened>,
}

impl IndexedSourceMapConsumer {
    pub(crate) fn from_raw(raw: RawSourceMap) -> Result<Self> {
        let raw_sections = raw.sections.unwrap_or_default();
        let mut sections = Vec::with_capacity(raw_sections.len());
        let mut last_offset = RawOffset::default();

        for (idx, section) in raw_sections.into_iter().enumerate() {
            let idx = idx as u32;
            if section.url.is_some() {
                return Err(Error::SectionUrlUnsupported(idx));
            }

            let offset = section.offset;
            if (offset.line, offset.column) < (last_offset.line, last_offset.column) {
                return Err(Error::UnorderedSections);
            }
            last_offset = offset;

            let map = section.map.ok_or(Error::SectionMapMissing(idx))?;
            let consumer =
                SourceMapConsumer::from_raw(map).map_err(|e| Error::section_error(idx, e))?;
            let line = offset
                .line
                .checked_add(1)
                .ok_or(Error::SectionOffsetOutOfRange(idx))?;
            sections.push(Section {
                offset: Position::new(line, offset.column),
                consumer,
            });
        }

        Ok(Self {
            file: raw.file,
            sections,
            flattened: OnceCell::new(),
        })
    }

    fn ensure_flattened(&self) -> Result<&Flattened> {
        if let Some(flattened) = self.flattened.get() {
            return Ok(flattened);
        }

        let mut sources = ArraySet::new();
        let mut names = ArraySet::new();
        let mut mappings = Vec::new();
        for (idx, section) in self.sections.iter().enumerate() {
            let section_mappings = section
                .consumer
                .each_mapping(Order::Generated)
                .map_err(|e| Error::section_error(idx as u32, e))?;

            for mapping in section_mappings {
                let generated = section.to_global(mapping.generated).ok_or_else(|| {
                    Error::section_error(idx as u32, Error::MappingOutOfRange(mapping.to_string()))
                })?;
                let mut parsed = ParsedMapping::new(generated.line, generated.column);
                if let Some(original) = &mapping.original {
                    let source_id = sources.add(&original.source, false);
                    parsed = parsed.with_source(
                        source_id,
                        original.position.line,
                        original.position.column,
                    );
                    if let Some(name) = mapping.name.as_deref() {
                        parsed = parsed.with_name(names.add(name, false));
                    }
                }
                mappings.push(parsed);
            }
        }

        let mappings = ParsedMappings::new(mappings);
        tracing::debug!(
            sections = self.sections.len(),
            mappings = mappings.len(),
            "flattened index map"
        );
        Ok(self.flattened.get_or_init(|| Flattened {
            mappings,
            sources,
            names,
        }))
    }

    fn view(&self) -> Result<MappingsView<'_>> {
        let flattened = self.ensure_flattened()?;
        Ok(MappingsView {
            mappings: &flattened.mappings,
            sources: &flattened.sources,
            names: &flattened.names,
            source_root: None,
        })
    }

    fn find_section(&self, pos: Position) -> Option<(u32, &Section)> {
        search_by_key(&pos, &self.sections, Bias::GreatestLowerBound, Section::offset)
            .map(|idx| (idx as u32, &self.sections[idx]))
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn source_root(&self) -> Option<&str> {
        None
    }

    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sources(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|section| section.consumer.sources())
            .collect()
    }

    pub(crate) fn has_source(&self, source: &str) -> bool {
        self.sections
            .iter()
            .any(|section| section.consumer.has_source(source))
    }

    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<OriginalPosition> {
        let pos = Position::new(line, column);
        let Some((idx, section)) = self.find_section(pos) else {
            return Ok(OriginalPosition::default());
        };

        let local = section.to_local(pos);
        tracing::trace!(section = idx, line = local.line, column = local.column, "delegating to section");
        section
            .consumer
            .original_position_for(local.line, local.column, bias)
            .map_err(|e| Error::section_error(idx, e))
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<GeneratedPosition> {
        for (idx, section) in self.sections.iter().enumerate() {
            if !section.consumer.has_source(source) {
                continue;
            }

            let found = section
                .consumer
                .generated_position_for(source, line, column, bias)
                .map_err(|e| Error::section_error(idx as u32, e))?;
            let (Some(local_line), Some(local_column)) = (found.line, found.column) else {
                continue;
            };

            tracing::trace!(section = idx, "found generated position in section");
            let global = section
                .to_global(Position::new(local_line, local_column))
                .ok_or_else(|| {
                    Error::section_error(
                        idx as u32,
                        Error::MappingOutOfRange(format!("{local_line}:{local_column}")),
                    )
                })?;
            return Ok(GeneratedPosition {
                line: Some(global.line),
                column: Some(global.column),
                // a span past the last representable column runs to the end of the line
                last_column: found.last_column.map(|last| match last {
                    UNBOUNDED_COLUMN => last,
                    _ => section
                        .shift_column(local_line, last)
                        .unwrap_or(UNBOUNDED_COLUMN),
                }),
            });
        }

        Ok(GeneratedPosition::default())
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> Result<Vec<GeneratedPosition>> {
        Ok(self.view()?.all_generated_positions_for(source, line, column))
    }

    /// Returns the content of `source` from the first section that has it.
    pub fn source_content_for(&self, source: &str, null_on_missing: bool) -> Result<Option<&str>> {
        for section in &self.sections {
            if let Some(content) = section.consumer.source_content_for(source, true)? {
                return Ok(Some(content));
            }
        }

        if null_on_missing {
            Ok(None)
        } else {
            Err(Error::SourceNotFound(source.to_owned()))
        }
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        self.sections
            .iter()
            .all(|section| section.consumer.has_contents_of_all_sources())
    }

    pub fn each_mapping(&self, order: Order) -> Result<MappingIter<'_>> {
        Ok(MappingIter::new(self.view()?, order))
    }

    pub fn compute_column_spans(&mut self) -> Result<()> {
        for (idx, section) in self.sections.iter_mut().enumerate() {
            section
                .consumer
                .compute_column_spans()
                .map_err(|e| Error::section_error(idx as u32, e))?;
        }

        self.ensure_flattened()?;
        if let Some(flattened) = self.flattened.get_mut() {
            flattened.mappings.compute_column_spans();
        }
        Ok(())
    }
}
