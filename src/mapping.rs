use std::fmt::{Display, Formatter};

/// `Position` represents a line and column in a file.
///
/// # Note
///
/// Lines are 1-based and columns are 0-based, the convention used by most
/// JavaScript tooling (`acorn`, `babel`, the `source-map` npm package).
/// The encoded `mappings` field stores 0-based lines; the conversion happens
/// when mappings are decoded and serialized.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl From<(u32, u32)> for Position {
    fn from((line, column): (u32, u32)) -> Self {
        Self::new(line, column)
    }
}

/// A position in a specific original source file.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct OriginalLocation {
    pub source: String,
    pub position: Position,
}

/// A single mapping from a generated position to an original location.
///
/// This is the record accepted by
/// [`SourceMapGenerator::add_mapping`](crate::SourceMapGenerator::add_mapping)
/// and produced by [`SourceMapConsumer::each_mapping`](crate::SourceMapConsumer::each_mapping).
///
/// The derived ordering compares the generated position, then the source,
/// the original position and the name.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Mapping {
    pub generated: Position,
    pub original: Option<OriginalLocation>,
    pub name: Option<String>,
}

impl Mapping {
    #[inline]
    pub const fn new(generated_line: u32, generated_column: u32) -> Self {
        Self {
            generated: Position::new(generated_line, generated_column),
            original: None,
            name: None,
        }
    }

    #[inline]
    pub fn with_source<S>(self, source: S, original_line: u32, original_column: u32) -> Self
    where
        S: Into<String>,
    {
        Self {
            original: Some(OriginalLocation {
                source: source.into(),
                position: Position::new(original_line, original_column),
            }),
            ..self
        }
    }

    /// Attaches a name. Names are only kept for mappings with a source.
    #[inline]
    pub fn with_name<S>(self, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.original.as_ref().map(|o| o.source.as_str())
    }
}

impl Display for Mapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.generated.line, self.generated.column)?;
        if let Some(original) = &self.original {
            write!(
                f,
                " -> {}:{}:{}",
                original.source, original.position.line, original.position.column
            )?;
            if let Some(name) = &self.name {
                write!(f, " ({name})")?;
            }
        }
        Ok(())
    }
}
