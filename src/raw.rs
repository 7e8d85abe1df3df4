use simd_json_derive::Serialize;
use std::io::{self, Write};

/// A source map record as found in JSON, before any validation.
///
/// Regular maps carry `sources`, `names` and `mappings`; index maps carry
/// `sections` instead. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, simd_json_derive::Deserialize)]
#[simd_json(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: Option<u32>,
    pub file: Option<String>,
    pub source_root: Option<String>,
    // `null` entries are kept as `None`
    pub sources: Option<Vec<Option<String>>>,
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Option<Vec<String>>,
    pub mappings: Option<String>,
    pub sections: Option<Vec<RawSection>>,
}

#[derive(Debug, Clone, Default, PartialEq, simd_json_derive::Deserialize)]
pub struct RawSection {
    pub offset: RawOffset,
    pub map: Option<RawSourceMap>,
    pub url: Option<String>,
}

/// Section offset, with a 0-based line and column.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, simd_json_derive::Deserialize)]
pub struct RawOffset {
    pub line: u32,
    pub column: u32,
}

const XSSI_PREFIX: &[u8] = b")]}'";

impl RawSourceMap {
    /// Parses a JSON buffer, which is modified in place while unescaping strings.
    ///
    /// A leading `)]}'` line, used to guard against XSSI, is skipped.
    pub fn parse(json: &mut [u8]) -> crate::Result<Self> {
        let skip = match json.strip_prefix(XSSI_PREFIX) {
            Some(rest) => match memchr::memchr(b'\n', rest) {
                Some(idx) => XSSI_PREFIX.len() + idx + 1,
                None => XSSI_PREFIX.len(),
            },
            None => 0,
        };
        let json = &mut json[skip..];
        Ok(<Self as simd_json_derive::Deserialize>::from_slice(json)?)
    }

    pub fn is_index_map(&self) -> bool {
        self.sections.is_some()
    }

    pub fn write<W>(&self, w: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        w.write_all(b"{")?;
        let mut fields = FieldWriter {
            w: &mut *w,
            first: true,
        };

        if let Some(version) = self.version {
            fields.key("version")?;
            version.json_write(fields.w)?;
        }
        if let Some(file) = &self.file {
            fields.key("file")?;
            file.json_write(fields.w)?;
        }
        if let Some(source_root) = &self.source_root {
            fields.key("sourceRoot")?;
            source_root.json_write(fields.w)?;
        }
        if let Some(sources) = &self.sources {
            fields.key("sources")?;
            sources.json_write(fields.w)?;
        }
        if let Some(sources_content) = &self.sources_content {
            fields.key("sourcesContent")?;
            sources_content.json_write(fields.w)?;
        }
        if let Some(names) = &self.names {
            fields.key("names")?;
            names.json_write(fields.w)?;
        }
        if let Some(mappings) = &self.mappings {
            fields.key("mappings")?;
            mappings.json_write(fields.w)?;
        }
        if let Some(sections) = &self.sections {
            fields.key("sections")?;
            fields.w.write_all(b"[")?;
            for (idx, section) in sections.iter().enumerate() {
                if idx > 0 {
                    fields.w.write_all(b",")?;
                }
                section.write(fields.w)?;
            }
            fields.w.write_all(b"]")?;
        }

        w.write_all(b"}")
    }

    #[inline]
    pub fn to_vec(&self) -> io::Result<Vec<u8>> {
        let mut v = Vec::with_capacity(1024);
        self.write(&mut v)?;
        Ok(v)
    }

    #[inline]
    pub fn to_string(&self) -> io::Result<String> {
        String::from_utf8(self.to_vec()?).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl RawSection {
    fn write<W>(&self, w: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        write!(
            w,
            r#"{{"offset":{{"line":{},"column":{}}}"#,
            self.offset.line, self.offset.column
        )?;
        if let Some(map) = &self.map {
            w.write_all(br#","map":"#)?;
            map.write(w)?;
        }
        if let Some(url) = &self.url {
            w.write_all(br#","url":"#)?;
            url.json_write(w)?;
        }
        w.write_all(b"}")
    }
}

struct FieldWriter<'w, W> {
    w: &'w mut W,
    first: bool,
}

impl<W: Write> FieldWriter<'_, W> {
    fn key(&mut self, key: &str) -> io::Result<()> {
        if !self.first {
            self.w.write_all(b",")?;
        }
        self.first = false;
        write!(self.w, r#""{key}":"#)
    }
}
