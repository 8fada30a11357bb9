//! Sequence-number recovery from the tail of an existing log file.
//!
//! Every line written by this crate starts with `<seq>`. After a restart the
//! next number to hand out is the last parseable token in the file plus one.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

/// Returns the next sequence number to assign for `path`.
///
/// Yields 1 when the file is missing, empty, unreadable, or contains no
/// parseable `<n>` token. Lines whose first `<...>` token is not an integer
/// (including truncated trailing lines) are skipped.
#[must_use]
pub fn next_sequence(path: &Path) -> u64 {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 1,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open log file for sequence recovery");
            return 1;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut last = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(seq) = parse_sequence(&String::from_utf8_lossy(&buf)) {
                    last = seq;
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "sequence recovery stopped early");
                break;
            }
        }
    }

    last.saturating_add(1)
}

/// Extracts the integer inside the first `<...>` token of `line`.
#[must_use]
pub fn parse_sequence(line: &str) -> Option<u64> {
    let start = line.find('<')?;
    let end = line.find('>')?;
    if end <= start + 1 {
        return None;
    }
    line[start + 1..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use test_case::test_case;

    fn write_file(dir: &TempDir, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("log_20240101_1.txt");
        let mut file = File::create(&path).expect("create file");
        file.write_all(contents).expect("write file");
        path
    }

    #[test_case("<12> [1] [MAIN] [I] x", Some(12) ; "leading token")]
    #[test_case("  <3> message", Some(3) ; "indented token")]
    #[test_case("<> empty", None ; "empty token")]
    #[test_case("<abc> text", None ; "non numeric")]
    #[test_case("no token here", None ; "no token")]
    #[test_case("> backwards <5", None ; "close before open")]
    #[test_case("<7", None ; "truncated token")]
    #[test_case("<  5> padded", None ; "padded token")]
    #[test_case("<+5> signed", Some(5) ; "explicit plus sign")]
    fn parse_sequence_cases(line: &str, expected: Option<u64>) {
        assert_eq!(parse_sequence(line), expected);
    }

    #[test]
    fn missing_file_starts_at_one() {
        let dir = TempDir::new().expect("temp dir");
        assert_eq!(next_sequence(&dir.path().join("absent.txt")), 1);
    }

    #[test]
    fn empty_file_starts_at_one() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"");
        assert_eq!(next_sequence(&path), 1);
    }

    #[test]
    fn file_without_tokens_starts_at_one() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"hello\nworld\n");
        assert_eq!(next_sequence(&path), 1);
    }

    #[test]
    fn resumes_after_last_token() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"<1> a\n<2> b\n<3> c\n");
        assert_eq!(next_sequence(&path), 4);
    }

    #[test]
    fn ignores_corrupt_trailing_line() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"<41> a\n<42> b\n<4");
        assert_eq!(next_sequence(&path), 43);
    }

    #[test]
    fn tolerates_invalid_utf8() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"<9> ok\n\xff\xfe<10> bytes\n\xc3\n");
        assert_eq!(next_sequence(&path), 11);
    }

    #[test]
    fn last_parsed_value_wins_even_if_smaller() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, b"<100> a\n<5> b\nplain\n");
        assert_eq!(next_sequence(&path), 6);
    }

    #[test]
    fn directory_path_starts_at_one() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        assert_eq!(next_sequence(&dir.path().join("sub")), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn recovers_last_of_any_written_run(seqs in prop::collection::vec(1u64..1_000_000, 1..40)) {
                let dir = TempDir::new().expect("temp dir");
                let body: String = seqs.iter().map(|s| format!("<{s}> [1] line\n")).collect();
                let path = write_file(&dir, body.as_bytes());
                let last = seqs.last().copied().unwrap_or(0);
                prop_assert_eq!(next_sequence(&path), last + 1);
            }
        }
    }
}
