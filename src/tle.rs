//! Two-Line Element (TLE) parsing.
//!
//! Scans raw element text from CelesTrak into per-satellite records.
//! Accepts both 3-line blocks (name line first) and bare 2-line blocks,
//! tolerates blank lines and CRLF, and silently skips malformed entries.

pub const SECONDS_PER_DAY: f64 = 86400.0;

/// One raw element set as it appeared in the input text.
#[derive(Clone, Debug, PartialEq)]
pub struct TleRecord {
    pub name: String,
    /// NORAD catalog number, columns 3-7 of line 1. Stable unique id.
    pub catalog_number: String,
    pub line1: String,
    pub line2: String,
}

// TLE lines are fixed-column ASCII; anything else is malformed and the
// catalog columns could not be sliced out of it anyway
fn is_line1(line: &str) -> bool {
    line.starts_with("1 ") && line.len() >= 7 && line.is_ascii()
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ") && line.len() >= 7 && line.is_ascii()
}

/// Parses multi-line TLE text into records, preserving input order.
///
/// A record missing its second line is dropped without aborting the
/// rest of the batch. Duplicate catalog numbers pass through unchanged;
/// downstream code must tolerate them.
pub fn parse_tle_text(text: &str) -> Vec<TleRecord> {
    let mut records = Vec::new();
    let mut pending_name: Option<&str> = None;
    let mut pending_line1: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_line1(line) {
            // a dangling previous line 1 is discarded here
            pending_line1 = Some(line);
        } else if is_line2(line) {
            if let Some(line1) = pending_line1.take() {
                let catalog_number = line1[2..7].trim().to_string();
                let name = match pending_name.take() {
                    Some(n) => n.to_string(),
                    None => format!("SAT {}", catalog_number),
                };
                records.push(TleRecord {
                    name,
                    catalog_number,
                    line1: line1.to_string(),
                    line2: line.to_string(),
                });
            }
            pending_name = None;
        } else {
            pending_name = Some(line);
            pending_line1 = None;
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)\n\
        1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9000\n\
        2 25544  51.6400 208.9163 0006317  69.9862 290.2553 15.49560532    02";

    #[test]
    fn parses_three_line_block() {
        let records = parse_tle_text(ISS);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ISS (ZARYA)");
        assert_eq!(records[0].catalog_number, "25544");
    }

    #[test]
    fn synthesizes_name_for_two_line_block() {
        let text = ISS.lines().skip(1).collect::<Vec<_>>().join("\n");
        let records = parse_tle_text(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "SAT 25544");
    }

    #[test]
    fn skips_truncated_record() {
        // well-formed record followed by one missing its line 2
        let text = format!(
            "{}\nBROKEN SAT\n1 99999U 24001A   24001.50000000  .00000000  00000-0  00000-0 0  9991\n",
            ISS
        );
        let records = parse_tle_text(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].catalog_number, "25544");
    }

    #[test]
    fn tolerates_blank_lines_and_crlf() {
        let text = ISS.replace('\n', "\r\n\r\n");
        let records = parse_tle_text(&text);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let text = format!("{}\n{}", ISS, ISS);
        let records = parse_tle_text(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].catalog_number, records[1].catalog_number);
    }

    #[test]
    fn non_ascii_element_lines_are_skipped() {
        // a feed glitch can put multi-byte bytes in the catalog columns;
        // the line must be treated as malformed, not sliced
        let text = "1 ééé garbage line\n\
            2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";
        assert!(parse_tle_text(text).is_empty());

        // and a well-formed neighbor still parses
        let text = format!("1 ééé garbage line\n{}", ISS);
        let records = parse_tle_text(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].catalog_number, "25544");
    }

    #[test]
    fn empty_input_yields_empty_batch() {
        assert!(parse_tle_text("").is_empty());
        assert!(parse_tle_text("\n  \r\n").is_empty());
    }
}
