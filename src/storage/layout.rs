//! File names and line formats inside a session directory

use crate::state::VisitMark;

pub const CONFIG_FILE: &str = "config.json";
pub const VISITED_FILE: &str = "visited.txt";
pub const UNVISITED_FILE: &str = "unvisited.txt";
pub const BUFFER_FILE: &str = "session_buffer.ndjson";
pub const RESULTS_FILE: &str = "session.json";
pub const LOG_FILE: &str = "session.log";

/// Separates the mark from the URL in `visited.txt`
pub const VISITED_SEPARATOR: &str = "<:>";

/// Crawl-state files; `--clear` removes these and keeps downloads and the log
pub const STATE_FILES: [&str; 5] = [
    CONFIG_FILE,
    VISITED_FILE,
    UNVISITED_FILE,
    BUFFER_FILE,
    RESULTS_FILE,
];

/// Formats one `visited.txt` line (without the newline)
pub fn format_visited_line(url: &str, mark: &VisitMark) -> String {
    format!("{}{}{}", mark, VISITED_SEPARATOR, url)
}

/// Parses one `visited.txt` line
pub fn parse_visited_line(line: &str) -> Option<(String, VisitMark)> {
    let (mark, url) = line.split_once(VISITED_SEPARATOR)?;

    if mark.is_empty() || url.is_empty() {
        return None;
    }

    Some((url.to_string(), VisitMark::parse(mark)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContentFingerprint;

    #[test]
    fn test_visited_line_round_trip() {
        let fp = ContentFingerprint::of_text("text");
        let line = format_visited_line("http://x.test/a?q=<:>", &fp.into());

        assert!(line.starts_with(&fp.to_hex()));
        let (url, mark) = parse_visited_line(&line).unwrap();
        assert_eq!(url, "http://x.test/a?q=<:>");
        assert_eq!(mark, VisitMark::Fingerprint(fp));
    }

    #[test]
    fn test_parse_marker_line() {
        let (url, mark) =
            parse_visited_line("0f0e0d0c0b0a09080706050403020100<:>http://x.test/dead").unwrap();
        assert_eq!(url, "http://x.test/dead");
        assert!(mark.is_marker());
    }

    #[test]
    fn test_parse_invalid_lines() {
        assert_eq!(parse_visited_line("http://x.test/a"), None);
        assert_eq!(parse_visited_line("<:>http://x.test/a"), None);
        assert_eq!(parse_visited_line("abc<:>"), None);
    }
}
