use memchr::Memchr2;

/// Splits a `mappings` string into its non-empty segments, each tagged with
/// the 1-based generated line it belongs to.
#[derive(Debug)]
pub(crate) struct SegmentSplitter<'a> {
    input: &'a str,
    cur_start: usize,
    line: u32,
    memchr: Memchr2<'a>,
}

impl<'a> SegmentSplitter<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cur_start: 0,
            line: 1,
            memchr: memchr::memchr2_iter(b';', b',', input.as_bytes()),
        }
    }
}

impl<'a> Iterator for SegmentSplitter<'a> {
    // generated line, segment
    type Item = (u32, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cur_start > self.input.len() {
                return None;
            }
            let line = self.line;
            let cur_end = match self.memchr.next() {
                Some(end) => {
                    if self.input.as_bytes()[end] == b';' {
                        self.line += 1;
                    }
                    end
                }
                None => self.input.len(),
            };
            // separators are ASCII, so both ends sit on char boundaries
            let segment = &self.input[self.cur_start..cur_end];
            self.cur_start = cur_end + 1;
            if !segment.is_empty() {
                return Some((line, segment));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SegmentSplitter;

    #[test]
    fn test_splitter() {
        let text =
      ";;yZCTnK,IAAO5F,gBAAkB,YACzB,IAAOC,YAAcC,UACrB;IAAOC,oBAAsB,YAE7B,EAAQ,QAER,EAAQ;;cAAe";

        let result = SegmentSplitter::new(text)
            .map(|(line, s)| format!("[{line}:{s}]"))
            .collect::<String>();
        insta::assert_snapshot!(result, @"[3:yZCTnK][3:IAAO5F][3:gBAAkB][3:YACzB][3:IAAOC][3:YAAcC][3:UACrB][4:IAAOC][4:oBAAsB][4:YAE7B][4:EAAQ][4:QAER][4:EAAQ][6:cAAe]");
    }

    #[test]
    fn test_splitter_empty_segments() {
        assert_eq!(SegmentSplitter::new("").count(), 0);
        assert_eq!(SegmentSplitter::new(";;;").count(), 0);
        assert_eq!(
            SegmentSplitter::new("A,,C;").collect::<Vec<_>>(),
            [(1, "A"), (1, "C")]
        );
    }
}
