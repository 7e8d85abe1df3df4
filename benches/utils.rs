use srcmap::{Mapping, SourceMapGenerator};
use std::fs::File;
use std::io::Read;

#[allow(dead_code)]
pub fn read_file(path: &str) -> Vec<u8> {
    let mut file = File::open(path).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

/// A minified-looking map: `lines` generated lines of `segments` mappings
/// each, spread over a handful of sources.
pub fn synthetic_map(lines: u32, segments: u32) -> SourceMapGenerator {
    let mut generator = SourceMapGenerator::new(Some("bundle.min.js".to_owned()), None);
    for line in 1..=lines {
        for segment in 0..segments {
            let source = format!("src/module_{}.js", (line + segment) % 8);
            let mut mapping =
                Mapping::new(line, segment * 7).with_source(source, line * 3 + segment / 4, segment * 2);
            if segment % 3 == 0 {
                mapping = mapping.with_name(format!("name_{}", segment % 32));
            }
            generator.add_mapping(mapping).unwrap();
        }
    }
    generator
}
