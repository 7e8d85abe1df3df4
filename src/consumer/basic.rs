use super::{GeneratedPosition, MappingIter, MappingsView, Order, OriginalPosition};
use crate::array_set::ArraySet;
use crate::binary_search::Bias;
use crate::mapping::Position;
use crate::mappings::{ItemsCount, ParsedMappings};
use crate::raw::RawSourceMap;
use crate::url::{self, Url};
use crate::{Error, Result};
use std::cell::OnceCell;

/// A consumer for a regular source map, with a single `mappings` string.
#[derive(Debug)]
pub struct BasicSourceMapConsumer {
    file: Option<String>,
    source_root: Option<String>,
    // duplicates are kept so that indices in `mappings` stay valid
    sources: ArraySet,
    names: ArraySet,
    sources_content: Option<Vec<Option<String>>>,
    raw_mappings: String,
    parsed: OnceCell<ParsedMappings>,
}

impl BasicSourceMapConsumer {
    pub(crate) fn from_raw(raw: RawSourceMap) -> Result<Self> {
        let source_root = raw.source_root.filter(|root| !root.is_empty());
        let absolute_root = source_root.as_deref().filter(|root| url::is_absolute(root));

        let raw_sources = raw.sources.unwrap_or_default();
        if let Some(sources_content) = &raw.sources_content {
            if sources_content.len() != raw_sources.len() {
                return Err(Error::invalid_sources_content(
                    raw_sources.len(),
                    sources_content.len(),
                ));
            }
        }

        let sources = raw_sources.iter().map(|source| {
            let Some(source) = source.as_deref() else {
                return String::new();
            };
            let source = url::normalize(source);
            match absolute_root {
                Some(root) if url::is_absolute(&source) => url::relative(root, &source),
                _ => source,
            }
        });

        Ok(Self {
            file: raw.file,
            sources: ArraySet::from_array(sources, true),
            names: ArraySet::from_array(raw.names.unwrap_or_default(), true),
            source_root,
            sources_content: raw.sources_content,
            raw_mappings: raw.mappings.unwrap_or_default(),
            parsed: OnceCell::new(),
        })
    }

    #[cfg(feature = "generator")]
    pub(crate) fn from_generator(generator: &crate::SourceMapGenerator) -> Self {
        use crate::mappings::ParsedMapping;

        let sources = ArraySet::from_array(generator.sources().iter(), true);
        let names = ArraySet::from_array(generator.names().iter(), true);
        let sources_content = generator.generate_sources_content(sources.iter());

        let mappings = generator
            .mappings()
            .map(|mapping| {
                let mut parsed = ParsedMapping::new(mapping.generated.line, mapping.generated.column);
                let source_id = mapping
                    .original
                    .as_ref()
                    .and_then(|original| Some((original, sources.index_of(&original.source)?)));
                if let Some((original, source_id)) = source_id {
                    parsed = parsed.with_source(
                        source_id,
                        original.position.line,
                        original.position.column,
                    );
                    if let Some(name_id) = mapping.name.as_deref().and_then(|name| names.index_of(name)) {
                        parsed = parsed.with_name(name_id);
                    }
                }
                parsed
            })
            .collect();

        Self {
            file: generator.file().map(str::to_owned),
            source_root: generator.source_root().map(str::to_owned),
            sources,
            names,
            sources_content: Some(sources_content),
            raw_mappings: String::new(),
            parsed: OnceCell::from(ParsedMappings::new(mappings)),
        }
    }

    fn ensure_parsed(&self) -> Result<&ParsedMappings> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = ParsedMappings::decode(
            &self.raw_mappings,
            ItemsCount::new(self.sources.len(), self.names.len()),
        )?;
        Ok(self.parsed.get_or_init(|| parsed))
    }

    fn view(&self) -> Result<MappingsView<'_>> {
        Ok(MappingsView {
            mappings: self.ensure_parsed()?,
            sources: &self.sources,
            names: &self.names,
            source_root: self.source_root.as_deref(),
        })
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| match self.source_root.as_deref() {
                Some(root) => url::join(root, source),
                None => source.to_owned(),
            })
            .collect()
    }

    /// Whether `source` resolves to one of the sources, without building the
    /// list of resolved names.
    #[cfg(feature = "index-map")]
    pub(crate) fn has_source(&self, source: &str) -> bool {
        match self.source_root.as_deref() {
            Some(root) => self.sources.index_of(&url::relative(root, source)),
            None => self.sources.index_of(source),
        }
        .is_some()
    }

    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<OriginalPosition> {
        Ok(self
            .view()?
            .original_position_for(Position::new(line, column), bias))
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Result<GeneratedPosition> {
        Ok(self
            .view()?
            .generated_position_for(source, Position::new(line, column), bias))
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> Result<Vec<GeneratedPosition>> {
        Ok(self.view()?.all_generated_positions_for(source, line, column))
    }

    pub fn source_content_for(&self, source: &str, null_on_missing: bool) -> Result<Option<&str>> {
        let Some(sources_content) = &self.sources_content else {
            return Ok(None);
        };
        let content_of = |source: &str| {
            self.sources
                .index_of(source)
                .map(|idx| sources_content.get(idx as usize).and_then(|c| c.as_deref()))
        };

        let source = match self.source_root.as_deref() {
            Some(root) => url::relative(root, source),
            None => source.to_owned(),
        };
        if let Some(content) = content_of(&source) {
            return Ok(content);
        }

        if let Some(root_url) = self.source_root.as_deref().and_then(Url::parse) {
            // sources stored as absolute paths under a `file://` root
            let file_path = source.strip_prefix("file://").unwrap_or(&source);
            if root_url.scheme.as_deref() == Some("file") {
                if let Some(content) = content_of(file_path) {
                    return Ok(content);
                }
            }
            if root_url.path.as_deref().map_or(true, |path| path == "/") {
                if let Some(content) = content_of(&format!("/{source}")) {
                    return Ok(content);
                }
            }
        }

        if null_on_missing {
            Ok(None)
        } else {
            Err(Error::SourceNotFound(source))
        }
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        self.sources_content.as_ref().is_some_and(|contents| {
            contents.len() >= self.sources.len() && contents.iter().all(Option::is_some)
        })
    }

    pub fn each_mapping(&self, order: Order) -> Result<MappingIter<'_>> {
        Ok(MappingIter::new(self.view()?, order))
    }

    pub fn compute_column_spans(&mut self) -> Result<()> {
        self.ensure_parsed()?;
        if let Some(parsed) = self.parsed.get_mut() {
            parsed.compute_column_spans();
        }
        Ok(())
    }
}
