pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("source map syntax error: {0}")]
    SyntaxError(#[from] simd_json::Error),
    #[error("unsupported source map version: {0:?}")]
    UnsupportedVersion(Option<u32>),
    #[error("invalid base64 character {0:?} in VLQ")]
    InvalidBase64(char),
    #[error("VLQ ends with a continuation digit")]
    UnterminatedVlq,
    #[error("VLQ value overflows 64 bits")]
    VlqOverflow,
    #[error("a mapping is malformed: \"{0}\"")]
    MappingMalformed(String),
    #[error("a mapping has a value out of range: \"{0}\"")]
    MappingOutOfRange(String),
    #[error("a mapping references unknown source #{0}")]
    UnknownSourceReference(u32),
    #[error("a mapping references unknown name #{0}")]
    UnknownNameReference(u32),
    #[error(
        "source map has {} sources but {} sourcesContent entries",
        sources_len,
        sources_content_len
    )]
    InvalidSourcesContent {
        sources_len: u32,
        sources_content_len: u32,
    },
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
    #[error("section offsets must be ordered and non-overlapping")]
    UnorderedSections,
    #[error("section #{0} references a map by url, which is not supported")]
    SectionUrlUnsupported(u32),
    #[error("section #{0} has no map")]
    SectionMapMissing(u32),
    #[error("section #{0} has an offset out of range")]
    SectionOffsetOutOfRange(u32),
    #[error("section #{index} is invalid: {source}")]
    SectionError { index: u32, source: Box<Error> },
    #[error("index maps require the `index-map` feature")]
    IndexMapUnsupported,
    #[error("\"{0}\" is not in the source map")]
    SourceNotFound(String),
    #[error(
        "applying a source map requires either an explicit source file, \
         or the source map's \"file\" property"
    )]
    MissingSourceFile,
}

impl Error {
    #[cold]
    pub(crate) fn invalid_sources_content(sources_len: usize, sources_content_len: usize) -> Self {
        Self::InvalidSourcesContent {
            sources_len: sources_len as u32,
            sources_content_len: sources_content_len as u32,
        }
    }

    #[cold]
    #[cfg(feature = "index-map")]
    pub(crate) fn section_error(index: u32, err: Error) -> Self {
        Self::SectionError {
            index,
            source: Box::new(err),
        }
    }
}
