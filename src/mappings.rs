use crate::binary_search::{search_by_key, Bias};
use crate::mapping::Position;
use crate::splitter::SegmentSplitter;
use crate::vlq::Segment;
use crate::{Error, Result};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// Marks a mapping as reaching the end of its generated line.
pub const UNBOUNDED_COLUMN: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OptionNum<const N: usize>([u32; N]);

impl<const N: usize> OptionNum<N> {
    const MISSING: u32 = 0xFFFFFFFF;

    #[inline]
    const fn missing() -> Self {
        Self([Self::MISSING; N])
    }

    #[inline]
    const fn new(v: [u32; N]) -> Self {
        Self(v)
    }

    #[inline]
    const fn get(&self) -> Option<&[u32; N]> {
        if self.is_missing() {
            None
        } else {
            Some(&self.0)
        }
    }

    #[inline]
    const fn is_missing(&self) -> bool {
        self.0[0] == Self::MISSING
    }
}

/// Index of a source in a table, with a 1-based line and 0-based column.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct SourceInfo {
    pub id: u32,
    pub position: Position,
}

/// A decoded mapping whose source and name are indices into string tables.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct ParsedMapping {
    generated: Position,

    // [source_id, original_line, original_column]
    source: OptionNum<3>,

    // [name_id]
    name: OptionNum<1>,

    last_generated_column: Option<u32>,
}

impl Debug for ParsedMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.generated.line, self.generated.column)?;
        if let Some(info) = self.source_info() {
            write!(
                f,
                " -> #{}:{}:{}",
                info.id, info.position.line, info.position.column,
            )?;
            if let Some(name_id) = self.name_info() {
                write!(f, " (#{})", name_id)?;
            }
        }
        Ok(())
    }
}

impl ParsedMapping {
    #[inline(always)]
    pub const fn new(generated_line: u32, generated_column: u32) -> Self {
        Self {
            generated: Position::new(generated_line, generated_column),
            source: OptionNum::missing(),
            name: OptionNum::missing(),
            last_generated_column: None,
        }
    }

    #[inline(always)]
    pub const fn with_source(self, source_id: u32, original_line: u32, original_column: u32) -> Self {
        Self {
            source: OptionNum::new([source_id, original_line, original_column]),
            ..self
        }
    }

    #[inline(always)]
    pub const fn with_name(self, name_id: u32) -> Self {
        Self {
            name: OptionNum::new([name_id]),
            ..self
        }
    }

    #[inline]
    pub fn generated(&self) -> Position {
        self.generated
    }

    #[inline]
    pub fn source_info(&self) -> Option<SourceInfo> {
        self.source
            .get()
            .map(|&[id, line, column]| SourceInfo {
                id,
                position: Position::new(line, column),
            })
    }

    #[inline]
    pub fn has_source(&self) -> bool {
        !self.source.is_missing()
    }

    /// Name index; only ever present together with a source.
    #[inline]
    pub fn name_info(&self) -> Option<u32> {
        self.name.get().map(|&[v]| v)
    }

    #[inline]
    pub fn last_generated_column(&self) -> Option<u32> {
        self.last_generated_column
    }

    #[inline]
    fn original_key(&self) -> Option<(u32, u32, u32)> {
        self.source.get().map(|&[id, line, column]| (id, line, column))
    }
}

fn compare_by_generated(a: &ParsedMapping, b: &ParsedMapping) -> Ordering {
    a.generated
        .cmp(&b.generated)
        .then_with(|| a.original_key().cmp(&b.original_key()))
        .then_with(|| a.name_info().cmp(&b.name_info()))
}

fn compare_by_original(a: &ParsedMapping, b: &ParsedMapping) -> Ordering {
    a.original_key()
        .cmp(&b.original_key())
        .then_with(|| a.generated.column.cmp(&b.generated.column))
        .then_with(|| a.generated.line.cmp(&b.generated.line))
        .then_with(|| a.name_info().cmp(&b.name_info()))
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct ItemsCount {
    pub(crate) sources: usize,
    pub(crate) names: usize,
}

impl ItemsCount {
    pub fn new(sources: usize, names: usize) -> Self {
        Self { sources, names }
    }
}

/// Decoded mappings with two sorted views: every mapping by generated
/// position, and the ones with a source by original position.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedMappings {
    generated: Vec<ParsedMapping>,
    // indices into `generated`
    original: Vec<u32>,
}

impl ParsedMappings {
    /// Sorts `mappings` into both views.
    pub fn new(mut mappings: Vec<ParsedMapping>) -> Self {
        mappings.sort_by(compare_by_generated);

        let mut original = mappings
            .iter()
            .enumerate()
            .filter(|(_, m)| m.has_source())
            .map(|(idx, _)| idx as u32)
            .collect::<Vec<_>>();
        original.sort_by(|&a, &b| compare_by_original(&mappings[a as usize], &mappings[b as usize]));

        Self {
            generated: mappings,
            original,
        }
    }

    pub fn decode(input: &str, items_count: ItemsCount) -> Result<Self> {
        let mut current_line = 0;
        let mut generated_column = 0;
        let mut source_id = 0;
        let mut original_line = 0;
        let mut original_column = 0;
        let mut name_id = 0;

        // identical segments are frequent, decode each distinct one once
        let mut cache: HashMap<&str, Segment> = HashMap::new();

        // the ratio of input.len to mappings.len is generally between 5 and 7
        let mut mappings = Vec::with_capacity(input.len() / 6);

        for (line, text) in SegmentSplitter::new(input) {
            if line != current_line {
                current_line = line;
                generated_column = 0;
            }

            let segment = match cache.entry(text) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => *e.insert(Segment::parse(text)?),
            };
            let fields = segment.fields();

            generated_column = apply_delta(generated_column, fields[0], text)?;
            let mut mapping = ParsedMapping::new(line, generated_column);

            if fields.len() > 1 {
                source_id = apply_delta(source_id, fields[1], text)?;
                if source_id as usize >= items_count.sources {
                    return Err(Error::UnknownSourceReference(source_id));
                }
                original_line = apply_delta(original_line, fields[2], text)?;
                original_column = apply_delta(original_column, fields[3], text)?;

                // lines are stored 0-based in the encoded form
                let line = original_line
                    .checked_add(1)
                    .ok_or_else(|| Error::MappingOutOfRange(text.to_owned()))?;
                mapping = mapping.with_source(source_id, line, original_column);

                if fields.len() > 4 {
                    name_id = apply_delta(name_id, fields[4], text)?;
                    if name_id as usize >= items_count.names {
                        return Err(Error::UnknownNameReference(name_id));
                    }
                    mapping = mapping.with_name(name_id);
                }
            }

            mappings.push(mapping);
        }

        let parsed = Self::new(mappings);
        tracing::debug!(mappings = parsed.len(), "decoded source map mappings");
        Ok(parsed)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.generated.len()
    }

    /// All mappings, ordered by generated position.
    #[inline]
    pub fn generated(&self) -> &[ParsedMapping] {
        &self.generated
    }

    /// Mapping at `idx` among the ones with a source, ordered by original position.
    #[inline]
    pub fn original_at(&self, idx: usize) -> Option<&ParsedMapping> {
        self.original
            .get(idx)
            .map(|&idx| &self.generated[idx as usize])
    }

    /// Finds the mapping for a generated position, ignoring which line the
    /// biased result is on.
    pub fn find_by_generated(&self, pos: Position, bias: Bias) -> Option<&ParsedMapping> {
        search_by_key(&pos, &self.generated, bias, ParsedMapping::generated)
            .map(|idx| &self.generated[idx])
    }

    /// Finds the index, in original order, of the mapping for an original
    /// position. The result may belong to another source.
    pub fn find_by_original(&self, source_id: u32, pos: Position, bias: Bias) -> Option<usize> {
        let needle = Some((source_id, pos.line, pos.column));
        search_by_key(&needle, &self.original, bias, |&idx| {
            self.generated[idx as usize].original_key()
        })
    }

    /// Infers the last generated column of every mapping, assuming a mapping
    /// spans up to the next one on the same line.
    pub fn compute_column_spans(&mut self) {
        let len = self.generated.len();
        for idx in 0..len {
            let next = self
                .generated
                .get(idx + 1)
                .filter(|next| next.generated.line == self.generated[idx].generated.line)
                .map(|next| next.generated.column);

            // the last mapping of a line spans the rest of it
            self.generated[idx].last_generated_column = Some(match next {
                Some(column) => column.saturating_sub(1),
                None => UNBOUNDED_COLUMN,
            });
        }
    }
}

#[inline]
fn apply_delta(prev: u32, delta: i64, segment: &str) -> Result<u32> {
    (prev as i64)
        .checked_add(delta)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| Error::MappingOutOfRange(segment.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{ItemsCount, ParsedMapping, ParsedMappings, UNBOUNDED_COLUMN};
    use crate::binary_search::Bias;
    use crate::mapping::Position;
    use crate::Error;

    fn decode(input: &str) -> crate::Result<ParsedMappings> {
        ParsedMappings::decode(input, ItemsCount::new(2, 3))
    }

    #[test]
    fn test_decode() {
        let parsed =
            decode("CAAC,IAAI,IAAM,SAAUA,GAClB,OAAOC,IAAID;CCDb,IAAI,IAAM,SAAUE,GAClB,OAAOA")
                .unwrap();
        assert_eq!(parsed.len(), 13);
        insta::assert_debug_snapshot!(parsed.generated(), @r###"
        [
            1:1 -> #0:1:1,
            1:5 -> #0:1:5,
            1:9 -> #0:1:11,
            1:18 -> #0:1:21 (#0),
            1:21 -> #0:2:3,
            1:28 -> #0:2:10 (#1),
            1:32 -> #0:2:14 (#0),
            2:1 -> #1:1:1,
            2:5 -> #1:1:5,
            2:9 -> #1:1:11,
            2:18 -> #1:1:21 (#2),
            2:21 -> #1:2:3,
            2:28 -> #1:2:10 (#2),
        ]
        "###);
    }

    #[test]
    fn test_decode_sorts_both_views() {
        // the second line lists its segments backwards
        let parsed = decode("AAAA;UAAU,VAAK,CAAC").unwrap();
        let generated = parsed
            .generated()
            .iter()
            .map(|m| (m.generated().line, m.generated().column))
            .collect::<Vec<_>>();
        assert_eq!(generated, [(1, 0), (2, 0), (2, 1), (2, 10)]);

        let original = (0..)
            .map_while(|idx| parsed.original_at(idx))
            .map(|m| m.source_info().unwrap().position)
            .collect::<Vec<_>>();
        assert_eq!(
            original,
            [
                Position::new(1, 0),
                Position::new(1, 10),
                Position::new(1, 15),
                Position::new(1, 16),
            ]
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("AA"), Err(Error::MappingMalformed(..))));
        assert!(matches!(decode("A;AAA"), Err(Error::MappingMalformed(..))));
        assert!(matches!(decode("A,&"), Err(Error::InvalidBase64('&'))));
        assert!(matches!(decode("D"), Err(Error::MappingOutOfRange(..))));
        assert!(matches!(decode("AEAA"), Err(Error::UnknownSourceReference(2))));
        assert!(matches!(decode("AAAAG"), Err(Error::UnknownNameReference(3))));
        assert!(matches!(decode("AAAAA,ADAA"), Err(Error::MappingOutOfRange(..))));
        // deltas at the edges of `i64` must not wrap
        assert!(matches!(decode("C,+///////////P"), Err(Error::MappingOutOfRange(..))));
        assert!(matches!(decode("C,hgggggggggggQ"), Err(Error::MappingOutOfRange(..))));
    }

    #[test]
    fn test_find_by_generated() {
        let parsed = decode("CAAC,IAAI;CAAC").unwrap();
        let find = |line, column, bias| {
            parsed
                .find_by_generated(Position::new(line, column), bias)
                .map(|m| (m.generated().line, m.generated().column))
        };
        assert_eq!(find(1, 0, Bias::GreatestLowerBound), None);
        assert_eq!(find(1, 0, Bias::LeastUpperBound), Some((1, 1)));
        assert_eq!(find(1, 4, Bias::GreatestLowerBound), Some((1, 1)));
        assert_eq!(find(1, 7, Bias::LeastUpperBound), Some((2, 1)));
        assert_eq!(find(9, 0, Bias::GreatestLowerBound), Some((2, 1)));
    }

    #[test]
    fn test_compute_column_spans() {
        let mut parsed = ParsedMappings::new(vec![
            ParsedMapping::new(1, 0),
            ParsedMapping::new(1, 5),
            ParsedMapping::new(2, 3),
        ]);
        parsed.compute_column_spans();
        let spans = parsed
            .generated()
            .iter()
            .map(ParsedMapping::last_generated_column)
            .collect::<Vec<_>>();
        assert_eq!(
            spans,
            [Some(4), Some(UNBOUNDED_COLUMN), Some(UNBOUNDED_COLUMN)]
        );
    }
}
