//! Integration tests for byte sniffing and the structural scan.

use std::io::Write;
use tempfile::NamedTempFile;

use dataeater::config::SniffConfig;
use dataeater::sniff::{Delimiter, Encoding, Newline, Sniffer};

/// Helper to create a temporary file with given bytes.
fn create_test_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    file.write_all(content).expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn ten_row_csv(short_row: Option<usize>) -> String {
    let mut content = String::from("a,b,c\n");
    for i in 1..=10 {
        if Some(i) == short_row {
            content.push_str(&format!("{i},x\n"));
        } else {
            content.push_str(&format!("{i},x,y\n"));
        }
    }
    content
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_ascii_file_is_utf8() {
    let file = create_test_file(b"name,city\nAlice,Paris\n");
    let result = Sniffer::new().sniff_path(file.path()).unwrap();
    assert_eq!(result.encoding, Encoding::Utf8);
}

#[test]
fn test_latin1_bytes_fall_back_to_windows_1252() {
    // "Café" with a lone 0xE9
    let file = create_test_file(b"name,city\nCaf\xe9,Paris\n");
    let result = Sniffer::new().sniff_path(file.path()).unwrap();
    assert_eq!(result.encoding, Encoding::Windows1252);
}

#[test]
fn test_multibyte_sequence_cut_by_prefix_is_still_utf8() {
    let mut content = b"name\n".to_vec();
    content.extend(std::iter::repeat_n(b'a', 7));
    content.extend("é".as_bytes());
    // 5 + 7 bytes of ASCII, then the first byte of "é"
    let config = SniffConfig {
        encoding_prefix_bytes: 13,
        ..SniffConfig::default()
    };
    let file = create_test_file(&content);
    let result = Sniffer::with_config(config).sniff_path(file.path()).unwrap();
    assert_eq!(result.encoding, Encoding::Utf8);
}

// =============================================================================
// Delimiter and newline
// =============================================================================

#[test]
fn test_uniform_csv_detects_comma() {
    let file = create_test_file(ten_row_csv(None).as_bytes());
    let sniffer = Sniffer::new();
    let result = sniffer.sniff_path(file.path()).unwrap();

    assert_eq!(result.delimiter, Delimiter::Comma);
    assert_eq!(result.newline, Newline::Lf);
    assert!(result.has_header);

    let jagged = sniffer
        .find_jagged_rows(file.path(), None, result.encoding)
        .unwrap();
    assert!(jagged.is_empty());
}

#[test]
fn test_semicolon_with_decimal_commas() {
    let content = "nom;montant;ville\nA;1,5;Paris\nB;2,25;Lyon\nC;3,0;Nice\n";
    let file = create_test_file(content.as_bytes());
    let result = Sniffer::new().sniff_path(file.path()).unwrap();
    assert_eq!(result.delimiter, Delimiter::Semicolon);
}

#[test]
fn test_tab_and_crlf() {
    let content = "a\tb\tc\r\n1\t2\t3\r\n4\t5\t6\r\n";
    let file = create_test_file(content.as_bytes());
    let result = Sniffer::new().sniff_path(file.path()).unwrap();
    assert_eq!(result.delimiter, Delimiter::Tab);
    assert_eq!(result.newline, Newline::Crlf);
}

#[test]
fn test_single_column_defaults_to_comma() {
    let file = create_test_file(b"name\nAlice\nBob\n");
    let result = Sniffer::new().sniff_path(file.path()).unwrap();
    assert_eq!(result.delimiter, Delimiter::Comma);
}

#[test]
fn test_unreadable_path_uses_defaults() {
    let result = Sniffer::new().sniff_or_default("/nonexistent/path/data.csv");
    assert_eq!(result.encoding, Encoding::Utf8);
    assert_eq!(result.delimiter, Delimiter::Comma);
    assert!(result.has_header);
}

// =============================================================================
// Structural scan
// =============================================================================

#[test]
fn test_short_row_reported_with_one_based_line_number() {
    let file = create_test_file(ten_row_csv(Some(5)).as_bytes());
    let jagged = Sniffer::new()
        .find_jagged_rows(file.path(), Some(Delimiter::Comma), Encoding::Utf8)
        .unwrap();

    assert_eq!(jagged.len(), 1);
    assert_eq!(jagged[0].row, 6);
    assert_eq!(jagged[0].expected, 3);
    assert_eq!(jagged[0].actual, 2);
    assert_eq!(jagged[0].content, "5,x");
}

#[test]
fn test_quoted_delimiters_are_not_jagged() {
    let content = "name,address\n\"Doe, John\",\"1 Main St, Springfield\"\nJane,Elm St\n";
    let file = create_test_file(content.as_bytes());
    let jagged = Sniffer::new()
        .find_jagged_rows(file.path(), Some(Delimiter::Comma), Encoding::Utf8)
        .unwrap();
    assert!(jagged.is_empty());
}

#[test]
fn test_error_cap_is_respected() {
    let mut content = String::from("a,b,c\n");
    for i in 0..50 {
        content.push_str(&format!("{i}\n"));
    }
    let config = SniffConfig {
        max_jagged_rows: 3,
        ..SniffConfig::default()
    };
    let file = create_test_file(content.as_bytes());
    let jagged = Sniffer::with_config(config)
        .find_jagged_rows(file.path(), None, Encoding::Utf8)
        .unwrap();
    assert_eq!(jagged.len(), 3);
    assert_eq!(jagged[0].row, 2);
}

#[test]
fn test_long_row_content_is_truncated() {
    let long_field = "x".repeat(300);
    let content = format!("a,b\n{long_field}\n");
    let file = create_test_file(content.as_bytes());
    let jagged = Sniffer::new()
        .find_jagged_rows(file.path(), Some(Delimiter::Comma), Encoding::Utf8)
        .unwrap();
    assert_eq!(jagged.len(), 1);
    assert_eq!(jagged[0].content.chars().count(), 103);
    assert!(jagged[0].content.ends_with("..."));
}
