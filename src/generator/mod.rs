mod mapping_list;

use crate::array_set::ArraySet;
use crate::binary_search::Bias;
use crate::consumer::{Order, SourceMapConsumer};
use crate::mapping::{Mapping, Position};
use crate::raw::RawSourceMap;
use crate::{url, vlq, Error, Result};
use mapping_list::MappingList;
use std::collections::HashMap;
use std::io;

/// Builds a source map one mapping at a time.
///
/// ```
/// use srcmap::{Mapping, SourceMapGenerator};
///
/// let mut generator = SourceMapGenerator::new(Some("min.js".to_owned()), None);
/// generator
///     .add_mapping(Mapping::new(1, 0).with_source("f.js", 1, 0).with_name("x"))
///     .unwrap();
/// generator.add_mapping(Mapping::new(1, 5).with_source("f.js", 1, 5)).unwrap();
/// assert_eq!(generator.serialize_mappings(), "AAAAA,KAAK");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceMapGenerator {
    file: Option<String>,
    source_root: Option<String>,
    sources: ArraySet,
    names: ArraySet,
    mappings: MappingList,
    // keyed by source, relative to the source root
    sources_contents: Option<HashMap<String, String>>,
}

impl SourceMapGenerator {
    pub fn new(file: Option<String>, source_root: Option<String>) -> Self {
        Self {
            file,
            source_root,
            ..Default::default()
        }
    }

    /// Creates a generator that reproduces the mappings and source contents
    /// of `consumer`.
    pub fn from_source_map(consumer: &SourceMapConsumer) -> Result<Self> {
        let source_root = consumer.source_root().map(str::to_owned);
        let mut generator = Self::new(consumer.file().map(str::to_owned), source_root.clone());

        for mut mapping in consumer.each_mapping(Order::Generated)? {
            if let (Some(root), Some(original)) = (source_root.as_deref(), mapping.original.as_mut()) {
                original.source = url::relative(root, &original.source);
            }
            generator.add_mapping(mapping)?;
        }

        for source in consumer.sources() {
            if let Some(content) = consumer.source_content_for(&source, true)? {
                generator.set_source_content(&source, Some(content.to_owned()));
            }
        }

        tracing::debug!(
            mappings = generator.mappings.len(),
            sources = generator.sources.len(),
            "created generator from source map"
        );
        Ok(generator)
    }

    #[inline]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[inline]
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    #[inline]
    pub(crate) fn sources(&self) -> &ArraySet {
        &self.sources
    }

    #[inline]
    pub(crate) fn names(&self) -> &ArraySet {
        &self.names
    }

    /// Mappings in the order they were added.
    #[inline]
    pub fn mappings(&self) -> impl ExactSizeIterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Adds a mapping, registering its source and name.
    ///
    /// Lines are 1-based. A mapping needs a source to carry a name.
    pub fn add_mapping(&mut self, mapping: Mapping) -> Result<()> {
        validate_mapping(&mapping)?;

        if let Some(source) = mapping.source() {
            self.sources.add(source, false);
        }
        if let Some(name) = mapping.name.as_deref() {
            self.names.add(name, false);
        }
        self.mappings.add(mapping);
        Ok(())
    }

    /// Sets the content of a source, or forgets it when `content` is `None`.
    pub fn set_source_content(&mut self, source: &str, content: Option<String>) {
        let source = match self.source_root.as_deref() {
            Some(root) => url::relative(root, source),
            None => source.to_owned(),
        };

        match content {
            Some(content) => {
                self.sources_contents
                    .get_or_insert_with(HashMap::new)
                    .insert(source, content);
            }
            None => {
                if let Some(contents) = self.sources_contents.as_mut() {
                    contents.remove(&source);
                    if contents.is_empty() {
                        self.sources_contents = None;
                    }
                }
            }
        }
    }

    /// Rewrites the mappings that point into `source_file` so that they point
    /// to where `consumer` maps them instead.
    ///
    /// `source_file` defaults to the file of `consumer`. Sources found in
    /// `consumer` are joined onto `source_map_path` when it is given.
    /// Mappings that `consumer` cannot resolve are kept as they are.
    pub fn apply_source_map(
        &mut self,
        consumer: &SourceMapConsumer,
        source_file: Option<&str>,
        source_map_path: Option<&str>,
    ) -> Result<()> {
        let source_file = source_file
            .or(consumer.file())
            .ok_or(Error::MissingSourceFile)?;
        let source_file = match self.source_root.as_deref() {
            Some(root) => url::relative(root, source_file),
            None => source_file.to_owned(),
        };

        // lookups can fail, nothing is rewritten until all of them succeed
        let mut resolved = Vec::new();
        for (idx, mapping) in self.mappings.iter().enumerate() {
            let Some(original) = mapping
                .original
                .as_ref()
                .filter(|original| original.source == source_file)
            else {
                continue;
            };
            let position = consumer.original_position_for(
                original.position.line,
                original.position.column,
                Bias::GreatestLowerBound,
            )?;
            if !position.is_empty() {
                resolved.push((idx, position));
            }
        }
        let rewritten = resolved.len();
        let mut resolved = resolved.into_iter().peekable();

        let mut sources = ArraySet::new();
        let mut names = ArraySet::new();
        for (idx, mapping) in self.mappings.iter_mut().enumerate() {
            if let Some((_, position)) = resolved.next_if(|(next, _)| *next == idx) {
                if let (Some(original), Some(source), Some(line), Some(column)) = (
                    mapping.original.as_mut(),
                    position.source,
                    position.line,
                    position.column,
                ) {
                    let source = match source_map_path {
                        Some(path) => url::join(path, &source),
                        None => source,
                    };
                    original.source = match self.source_root.as_deref() {
                        Some(root) => url::relative(root, &source),
                        None => source,
                    };
                    original.position = Position::new(line, column);
                }
                if position.name.is_some() {
                    mapping.name = position.name;
                }
            }

            if let Some(source) = mapping.source() {
                sources.add(source, false);
            }
            if let Some(name) = mapping.name.as_deref() {
                names.add(name, false);
            }
        }

        self.sources = sources;
        self.names = names;

        for source in consumer.sources() {
            if let Some(content) = consumer.source_content_for(&source, true)? {
                let source = match source_map_path {
                    Some(path) => url::join(path, &source),
                    None => source,
                };
                self.set_source_content(&source, Some(content.to_owned()));
            }
        }

        tracing::debug!(
            source_file = %source_file,
            rewritten,
            "applied source map"
        );
        Ok(())
    }

    /// Encodes the mappings into the `mappings` field of a source map.
    pub fn serialize_mappings(&self) -> String {
        let mappings = self.mappings.sorted();
        let mut out = String::with_capacity(mappings.len() * 6);

        let mut prev_generated_line = 1;
        let mut prev_generated_column = 0i64;
        let mut prev_source = 0i64;
        let mut prev_original_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut prev_name = 0i64;

        for (idx, mapping) in mappings.iter().enumerate() {
            if mapping.generated.line != prev_generated_line {
                prev_generated_column = 0;
                for _ in prev_generated_line..mapping.generated.line {
                    out.push(';');
                }
                prev_generated_line = mapping.generated.line;
            } else if idx > 0 {
                if mappings[idx - 1] == *mapping {
                    continue;
                }
                out.push(',');
            }

            let column = i64::from(mapping.generated.column);
            vlq::encode_to(column - prev_generated_column, &mut out);
            prev_generated_column = column;

            let Some(original) = &mapping.original else {
                continue;
            };
            // every source and name was registered when its mapping was added
            let source = self.sources.index_of(&original.source).map_or(0, i64::from);
            vlq::encode_to(source - prev_source, &mut out);
            prev_source = source;

            // lines are 0-based in the encoded form
            let line = i64::from(original.position.line) - 1;
            vlq::encode_to(line - prev_original_line, &mut out);
            prev_original_line = line;

            let column = i64::from(original.position.column);
            vlq::encode_to(column - prev_original_column, &mut out);
            prev_original_column = column;

            if let Some(name) = mapping.name.as_deref() {
                let name = self.names.index_of(name).map_or(0, i64::from);
                vlq::encode_to(name - prev_name, &mut out);
                prev_name = name;
            }
        }

        out
    }

    /// Source contents aligned with `sources`, `None` for a source without
    /// content.
    pub(crate) fn generate_sources_content<I, S>(&self, sources: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sources
            .into_iter()
            .map(|source| {
                let contents = self.sources_contents.as_ref()?;
                let content = match self.source_root.as_deref() {
                    Some(root) => contents.get(&url::relative(root, source.as_ref())),
                    None => contents.get(source.as_ref()),
                };
                content.cloned()
            })
            .collect()
    }

    /// Builds the source map record.
    pub fn to_json(&self) -> RawSourceMap {
        let sources = self.sources.to_vec();
        let sources_content = self
            .sources_contents
            .as_ref()
            .map(|_| self.generate_sources_content(&sources));

        RawSourceMap {
            version: Some(3),
            file: self.file.clone(),
            source_root: self.source_root.clone(),
            sources: Some(sources.into_iter().map(Some).collect()),
            sources_content,
            names: Some(self.names.to_vec()),
            mappings: Some(self.serialize_mappings()),
            sections: None,
        }
    }

    #[inline]
    pub fn to_vec(&self) -> io::Result<Vec<u8>> {
        self.to_json().to_vec()
    }

    #[inline]
    pub fn to_string(&self) -> io::Result<String> {
        self.to_json().to_string()
    }
}

fn validate_mapping(mapping: &Mapping) -> Result<()> {
    if mapping.generated.line == 0 {
        return Err(Error::InvalidMapping(format!(
            "generated line must be at least 1: {mapping}"
        )));
    }
    match &mapping.original {
        Some(original) if original.position.line == 0 => Err(Error::InvalidMapping(format!(
            "original line must be at least 1: {mapping}"
        ))),
        None if mapping.name.is_some() => Err(Error::InvalidMapping(format!(
            "a name requires a source: {mapping}"
        ))),
        _ => Ok(()),
    }
}
