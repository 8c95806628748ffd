use alloc::string::String;

use crate::{is_line_end, QUOTE, SEPARATOR, TERMINATOR};

/// Returns true if `field` must be quoted to survive a round trip.
///
/// A field must be quoted when it contains a quote, a separator or a line
/// end character.
pub fn needs_quotes(field: &str) -> bool {
    field.chars().any(|ch| ch == QUOTE || ch == SEPARATOR || is_line_end(ch))
}

/// Append `field` to `out` wrapped in quotes.
///
/// Every quote in `field` is doubled. Every `\r\n` pair is written as a
/// single `\r`, since readers turn a `\r` inside quotes back into `\r\n`.
/// Everything else is copied verbatim.
pub fn quote_field(field: &str, out: &mut String) {
    out.reserve(field.len() + 2);
    out.push(QUOTE);
    let mut chars = field.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            QUOTE => {
                out.push(QUOTE);
                out.push(QUOTE);
            }
            '\r' => {
                out.push('\r');
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            _ => out.push(ch),
        }
    }
    out.push(QUOTE);
}

/// A writer for CSV rows.
///
/// The only state this keeps is whether the next field is the first one of
/// its row. It never holds on to field data: everything is appended to the
/// caller's output buffer as soon as it is given.
#[derive(Clone, Debug)]
pub struct Writer {
    first_field_in_row: bool,
    fields_in_row: u64,
    last_field_empty: bool,
}

impl Default for Writer {
    fn default() -> Writer {
        Writer {
            first_field_in_row: true,
            fields_in_row: 0,
            last_field_empty: false,
        }
    }
}

impl Writer {
    /// Creates a new CSV writer.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// Append a single field to `out`, preceded by a separator if it isn't
    /// the first field of the row.
    pub fn write_field(&mut self, field: &str, out: &mut String) {
        if !self.first_field_in_row {
            out.push(SEPARATOR);
        }
        self.first_field_in_row = false;
        self.fields_in_row += 1;
        self.last_field_empty = field.is_empty();
        if needs_quotes(field) {
            quote_field(field, out);
        } else {
            out.push_str(field);
        }
    }

    /// Append the row terminator to `out` and start a new row.
    ///
    /// A row made of exactly one empty field is written as `""`. Otherwise
    /// it would be indistinguishable from a blank line.
    pub fn write_term(&mut self, out: &mut String) {
        if self.fields_in_row == 1 && self.last_field_empty {
            out.push(QUOTE);
            out.push(QUOTE);
        }
        out.push(TERMINATOR);
        self.first_field_in_row = true;
        self.fields_in_row = 0;
        self.last_field_empty = false;
    }

    /// Returns true if no field has been written since the last terminator.
    pub fn is_row_start(&self) -> bool {
        self.first_field_in_row
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{needs_quotes, quote_field, Writer};

    fn row(fields: &[&str]) -> String {
        let mut wtr = Writer::new();
        let mut out = String::new();
        for field in fields {
            wtr.write_field(field, &mut out);
        }
        wtr.write_term(&mut out);
        out
    }

    fn quoted(field: &str) -> String {
        let mut out = String::new();
        quote_field(field, &mut out);
        out
    }

    #[test]
    fn needs_quotes_chars() {
        assert!(!needs_quotes(""));
        assert!(!needs_quotes("abc 123 $$"));
        assert!(needs_quotes("a,b"));
        assert!(needs_quotes("a\"b"));
        assert!(needs_quotes("a\rb"));
        assert!(needs_quotes("a\nb"));
    }

    #[test]
    fn quote_doubles_quotes() {
        assert_eq!(quoted("two of \"these\""), "\"two of \"\"these\"\"\"");
        assert_eq!(quoted("\""), "\"\"\"\"");
    }

    #[test]
    fn quote_collapses_crlf() {
        assert_eq!(quoted("-=--=,,**\r\n77$$"), "\"-=--=,,**\r77$$\"");
        assert_eq!(quoted("a\rb"), "\"a\rb\"");
        assert_eq!(quoted("a\nb"), "\"a\nb\"");
        assert_eq!(quoted("a\n\rb"), "\"a\n\rb\"");
    }

    #[test]
    fn write_plain_row() {
        assert_eq!(row(&["11", "12"]), "11,12\r");
    }

    #[test]
    fn write_escaped_row() {
        assert_eq!(row(&["1", "two of \"these\""]), "1,\"two of \"\"these\"\"\"\r");
        assert_eq!(row(&["1", "-=--=,,**\r\n77$$"]), "1,\"-=--=,,**\r77$$\"\r");
    }

    #[test]
    fn write_empty_fields() {
        assert_eq!(row(&["", ""]), ",\r");
        assert_eq!(row(&["a", ""]), "a,\r");
        assert_eq!(row(&[""]), "\"\"\r");
        assert_eq!(row(&[]), "\r");
    }

    #[test]
    fn writer_resets_between_rows() {
        let mut wtr = Writer::new();
        let mut out = String::new();
        wtr.write_field("a", &mut out);
        assert!(!wtr.is_row_start());
        wtr.write_term(&mut out);
        assert!(wtr.is_row_start());
        wtr.write_field("b", &mut out);
        wtr.write_term(&mut out);
        assert_eq!(out, "a\rb\r");
    }
}
