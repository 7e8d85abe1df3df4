#![cfg(feature = "index-map")]

use paste::paste;
use serde::Deserialize;
use srcmap::{Bias, GeneratedPosition, Order, Result, SourceMapConsumer};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static TEST_CASES: OnceLock<HashMap<String, TestCase>> = OnceLock::new();

// one named test per case in the description file
macro_rules! test {
    ($name:ident) => {
        paste! {
            fn $name(){
                get_test_case(stringify!($name)).test();
            }
            #[test]
            fn [<test_query_ $name>]() {
                match std::env::var("QUERY_TEST") {
                    Ok(t) => {
                        if t == stringify!($name) {
                            $name()
                        }
                    }
                    Err(..) => $name()
                }
            }
        }
    };
}

test!(basic_original_positions);
test!(basic_fuzzy_original_positions);
test!(basic_generated_positions);
test!(basic_all_generated_positions);
test!(indexed_original_positions);
test!(indexed_fuzzy_original_positions);
test!(indexed_generated_positions);
test!(indexed_all_generated_positions);
test!(version_too_high);
test!(segment_with_two_fields);
test!(segment_with_three_fields);
test!(source_index_out_of_bounds);
test!(name_index_out_of_bounds);
test!(negative_column);
test!(non_base64_character);
test!(unordered_sections);
test!(section_with_url);

fn get_test_case(name: &str) -> &'static TestCase {
    let tests = TEST_CASES.get_or_init(|| {
        let description = fs::read("tests/query-tests/query-tests.json").unwrap();
        let description = serde_json::from_slice::<TestDescription>(&description).unwrap();
        description
            .tests
            .into_iter()
            .map(|t| (camel_to_snake(&t.name), t))
            .collect::<HashMap<_, _>>()
    });
    tests.get(name).unwrap()
}

fn camel_to_snake(input: &str) -> String {
    let mut output = String::new();

    for (i, c) in input.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                output.push('_');
            }
            output.push(c.to_lowercase().next().unwrap());
        } else {
            output.push(c);
        }
    }

    output
}

#[derive(Deserialize)]
#[serde(tag = "actionType")]
#[serde(rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
enum TestAction {
    CheckOriginal {
        generated_line: u32,
        generated_column: u32,
        #[serde(default)]
        bias: Bias,
        original_source: Option<String>,
        original_line: Option<u32>,
        original_column: Option<u32>,
        mapped_name: Option<String>,
    },
    CheckGenerated {
        original_source: String,
        original_line: u32,
        original_column: u32,
        #[serde(default)]
        bias: Bias,
        generated_line: Option<u32>,
        generated_column: Option<u32>,
    },
    CheckAllGenerated {
        original_source: String,
        original_line: u32,
        original_column: Option<u32>,
        generated: Vec<ExpectedPosition>,
    },
}

#[derive(Deserialize, Debug, PartialEq)]
struct ExpectedPosition {
    line: u32,
    column: u32,
}

impl From<&GeneratedPosition> for ExpectedPosition {
    fn from(pos: &GeneratedPosition) -> Self {
        Self {
            line: pos.line.unwrap(),
            column: pos.column.unwrap(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestCase {
    name: String,
    description: String,
    source_map_file: String,
    source_map_is_valid: bool,
    test_actions: Option<Vec<TestAction>>,
}

impl TestCase {
    // mappings are decoded lazily, so a map is only known to be valid once
    // they have been read
    fn read_map(&self) -> Result<SourceMapConsumer> {
        let buf = fs::read(Path::new("data").join(&self.source_map_file)).unwrap();
        let consumer = SourceMapConsumer::from_vec(buf)?;
        consumer.each_mapping(Order::Generated)?;
        Ok(consumer)
    }

    fn test(&self) {
        let msg = format!("[{}] {}", self.name, self.description);

        let parse_result = self.read_map();

        if !self.source_map_is_valid {
            assert!(parse_result.is_err(), "{}", msg);
            return;
        }

        let map = parse_result.expect(&self.description);

        for action in self.test_actions.iter().flatten() {
            match action {
                TestAction::CheckOriginal {
                    generated_line,
                    generated_column,
                    bias,
                    original_source,
                    original_line,
                    original_column,
                    mapped_name,
                } => {
                    let pos = map
                        .original_position_for(*generated_line, *generated_column, *bias)
                        .expect(&msg);
                    let at = format!("{msg} at {generated_line}:{generated_column}");
                    assert_eq!(&pos.source, original_source, "{}", at);
                    assert_eq!(&pos.line, original_line, "{}", at);
                    assert_eq!(&pos.column, original_column, "{}", at);
                    assert_eq!(&pos.name, mapped_name, "{}", at);
                }
                TestAction::CheckGenerated {
                    original_source,
                    original_line,
                    original_column,
                    bias,
                    generated_line,
                    generated_column,
                } => {
                    let pos = map
                        .generated_position_for(
                            original_source,
                            *original_line,
                            *original_column,
                            *bias,
                        )
                        .expect(&msg);
                    let at = format!("{msg} at {original_source}:{original_line}:{original_column}");
                    assert_eq!(&pos.line, generated_line, "{}", at);
                    assert_eq!(&pos.column, generated_column, "{}", at);
                }
                TestAction::CheckAllGenerated {
                    original_source,
                    original_line,
                    original_column,
                    generated,
                } => {
                    let positions = map
                        .all_generated_positions_for(original_source, *original_line, *original_column)
                        .expect(&msg);
                    let actual = positions.iter().map(ExpectedPosition::from).collect::<Vec<_>>();
                    assert_eq!(&actual, generated, "{} at {}:{}", msg, original_source, original_line);
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct TestDescription {
    tests: Vec<TestCase>,
}
