use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use super::LogsError;

/// Result of a one-shot filter pass over a file.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Matching lines, in file order.
    pub matches: Vec<String>,
    /// Total number of lines scanned, matching or not.
    pub total: usize,
}

enum Matcher {
    Regex(Regex),
    Substring(String),
    SubstringIgnoreCase(String),
}

impl Matcher {
    fn compile(keyword: &str, ignore_case: bool, use_regex: bool) -> Result<Self, LogsError> {
        if use_regex {
            let pattern = if ignore_case {
                format!("(?i){keyword}")
            } else {
                keyword.to_string()
            };
            Ok(Matcher::Regex(Regex::new(&pattern)?))
        } else if ignore_case {
            Ok(Matcher::SubstringIgnoreCase(keyword.to_lowercase()))
        } else {
            Ok(Matcher::Substring(keyword.to_string()))
        }
    }

    fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(line),
            Matcher::Substring(kw) => line.contains(kw.as_str()),
            Matcher::SubstringIgnoreCase(kw) => line.to_lowercase().contains(kw.as_str()),
        }
    }
}

/// Scan a file top to bottom and keep the lines matching `keyword`.
///
/// Each line is classified independently. The pattern is compiled before
/// any I/O, so a bad regex never touches the file, and a mid-scan read
/// error discards all partial results.
pub fn filter_lines(
    path: &Path,
    keyword: &str,
    ignore_case: bool,
    use_regex: bool,
) -> Result<FilterOutcome, LogsError> {
    let matcher = Matcher::compile(keyword, ignore_case, use_regex)?;

    let file = File::open(path).map_err(|e| LogsError::from_io(e, path))?;
    let mut reader = BufReader::new(file);

    let mut matches = Vec::new();
    let mut total = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        let end = if buf.last() == Some(&b'\n') {
            read - 1
        } else {
            read
        };
        let bytes = buf[..end].strip_suffix(b"\r").unwrap_or(&buf[..end]);
        let line = String::from_utf8_lossy(bytes);
        total += 1;

        if matcher.matches(&line) {
            matches.push(line.into_owned());
        }
    }

    Ok(FilterOutcome { matches, total })
}

/// Render the "N of M lines" report shown after a filter pass.
pub fn format_summary(outcome: &FilterOutcome, keyword: &str, path: &Path) -> String {
    format!(
        "\nMatched {} of {} lines (keyword: '{}')\nFile: {}\n",
        outcome.matches.len(),
        outcome.total,
        keyword,
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const FIXTURE: &str = "\
2023-10-12 10:00:00 INFO: system started
2023-10-12 10:01:00 WARN: memory usage above 80%
2023-10-12 10:02:00 ERROR: cannot connect to database
2023-10-12 10:03:00 INFO: user login (ID: 12345)
2023-10-12 10:04:00 INFO: API request: GET /users
2023-10-12 10:05:00 DEBUG: query took 213ms";

    fn fixture_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("app.log");
        std::fs::write(&path, FIXTURE).unwrap();
        path
    }

    #[test]
    fn test_substring_filter() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let outcome = filter_lines(&path, "INFO", false, false).unwrap();
        assert_eq!(outcome.total, 6);
        assert_eq!(outcome.matches.len(), 3);
        // File order is preserved.
        assert!(outcome.matches[0].contains("system started"));
        assert!(outcome.matches[2].contains("API request"));
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let outcome = filter_lines(&path, "info", false, false).unwrap();
        assert_eq!(outcome.matches.len(), 0);
        assert_eq!(outcome.total, 6);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let outcome = filter_lines(&path, "info", true, false).unwrap();
        assert_eq!(outcome.matches.len(), 3);
    }

    #[test]
    fn test_regex_filter() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let outcome = filter_lines(&path, r"\d{5}", false, true).unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.matches[0].contains("12345"));
    }

    #[test]
    fn test_regex_ignore_case() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let outcome = filter_lines(&path, "^.*error", true, true).unwrap();
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn test_invalid_regex_aborts_before_scan() {
        let dir = TempDir::new().unwrap();
        let path = fixture_file(&dir);

        let err = filter_lines(&path, "[unclosed", false, true).unwrap_err();
        assert!(matches!(err, LogsError::InvalidPattern(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.log");

        let err = filter_lines(&path, "x", false, false).unwrap_err();
        assert!(matches!(err, LogsError::FileNotFound { .. }));
    }

    #[test]
    fn test_summary_format() {
        let outcome = FilterOutcome {
            matches: vec!["a".into()],
            total: 5,
        };
        let summary = format_summary(&outcome, "A", Path::new("/tmp/app.log"));
        assert!(summary.contains("Matched 1 of 5 lines"));
        assert!(summary.contains("/tmp/app.log"));
    }
}
