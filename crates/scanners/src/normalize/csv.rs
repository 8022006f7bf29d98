//! Manual quote-aware CSV field scanner.
//!
//! A full CSV reader is overkill for line-at-a-time normalization; this
//! scanner only needs to toggle in-quote state, un-escape doubled quotes,
//! and split on unquoted commas. It never fails; worst case a malformed
//! line yields one big field.

/// Split one CSV data row into its fields.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes {
                    if chars.peek() == Some(&'"') {
                        field.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parse a header row into trimmed column names.
pub fn parse_headers(line: &str) -> Vec<String> {
    split_fields(line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(split_fields("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn respects_quoted_commas() {
        assert_eq!(
            split_fields(r#"2024-01-01,"GET /x, HTTP/1.1",200"#),
            vec!["2024-01-01", "GET /x, HTTP/1.1", "200"]
        );
    }

    #[test]
    fn unescapes_doubled_quotes() {
        assert_eq!(
            split_fields(r#""say ""hi""",ok"#),
            vec![r#"say "hi""#, "ok"]
        );
    }

    #[test]
    fn empty_fields_survive() {
        assert_eq!(split_fields("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn unterminated_quote_degrades_to_one_field() {
        assert_eq!(split_fields(r#""a,b"#), vec!["a,b"]);
    }

    #[test]
    fn headers_are_trimmed() {
        assert_eq!(
            parse_headers("timestamp, src_ip ,status"),
            vec!["timestamp", "src_ip", "status"]
        );
    }
}
