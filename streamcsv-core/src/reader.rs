use alloc::string::String;
use core::fmt;

use crate::{ends_field, is_line_end, QUOTE, SEPARATOR};

/// A source of characters with one character of lookahead.
///
/// This is the only thing the field decoder needs from its input. An
/// implementation is free to buffer however it likes, but it must uphold one
/// rule: the lookahead character returned by `next_pair` is the character
/// that the following call to `next_pair` returns as its current character
/// (unless `skip_next` is called in between).
pub trait CharCursor {
    /// The error that may occur while pulling more characters, e.g., an I/O
    /// error while refilling a buffer.
    type Error;

    /// Consume one character and return it along with the character after
    /// it.
    ///
    /// The lookahead is `None` when the consumed character is the last one.
    /// When there are no characters left at all, this returns `Ok(None)`.
    fn next_pair(&mut self) -> Result<Option<(char, Option<char>)>, Self::Error>;

    /// Consume the lookahead character returned by the most recent call to
    /// `next_pair` without looking at it again.
    ///
    /// This is only ever called when that lookahead was `Some`.
    fn skip_next(&mut self);
}

/// The outcome of decoding a single field.
///
/// The row driver uses this to decide whether to keep adding fields to the
/// current row, to end it, or to stop reading altogether.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueState {
    /// No field was found. The input ended, or only a trailing line break
    /// remained, before the first character of a field.
    None,
    /// A field was found and the current row has at least one more field.
    HasMore,
    /// A field was found, it ends the current row and more input follows.
    EndOfLine,
    /// A field was found, it ends the current row and the input is
    /// exhausted.
    EndOfFile,
}

impl ValueState {
    /// Returns true when the decoded field was the last one in its row.
    pub fn is_row_end(&self) -> bool {
        match *self {
            ValueState::HasMore => false,
            _ => true,
        }
    }
}

/// An error that occurred while decoding a field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError<E> {
    /// The cursor failed to produce more characters.
    Source(E),
    /// A quote closing a quoted field was followed by the given character,
    /// which is neither a separator, a line end nor another quote.
    ///
    /// When this is returned, the offending character has not been consumed
    /// from the cursor. It is the cursor's next character.
    UnexpectedChar(char),
}

impl<E: fmt::Display> fmt::Display for DecodeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::Source(ref err) => err.fmt(f),
            DecodeError::UnexpectedChar(ch) => write!(
                f,
                "unexpected character {:?} after closing quote",
                ch
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    End,
}

/// Decode a single field from `cur`, appending its contents to `field`.
///
/// `field` is never cleared by this function, so callers may decode many
/// fields into one growing buffer and remember where each one ends.
///
/// The returned state says how the field ended. A `ValueState::None` result
/// leaves `field` untouched.
pub fn decode_field<C: CharCursor>(
    cur: &mut C,
    field: &mut String,
) -> Result<ValueState, DecodeError<C::Error>> {
    use self::FieldState::*;

    let mut state = Start;
    while let Some((ch, next)) = cur.next_pair().map_err(DecodeError::Source)? {
        match state {
            Start => {
                if ch == QUOTE {
                    state = Quoted;
                } else if is_line_end(ch) {
                    return match skip_line_ends(cur, next)? {
                        None => Ok(ValueState::None),
                        Some(_) => Ok(ValueState::EndOfLine),
                    };
                } else if ch == SEPARATOR {
                    return Ok(ValueState::HasMore);
                } else {
                    field.push(ch);
                    state = if ends_field(next) { End } else { Unquoted };
                }
            }
            Unquoted => {
                field.push(ch);
                if ends_field(next) {
                    state = End;
                }
            }
            Quoted => {
                if ch == QUOTE {
                    match next {
                        Some(QUOTE) => {
                            field.push(QUOTE);
                            cur.skip_next();
                        }
                        Some(n) if n == SEPARATOR || is_line_end(n) => {
                            state = End;
                        }
                        None => state = End,
                        Some(n) => return Err(DecodeError::UnexpectedChar(n)),
                    }
                } else if ch == '\r' {
                    field.push_str("\r\n");
                    if next == Some('\n') {
                        cur.skip_next();
                    }
                } else {
                    field.push(ch);
                }
            }
            End => {
                if ch == SEPARATOR {
                    return Ok(ValueState::HasMore);
                }
                return match skip_line_ends(cur, next)? {
                    None => Ok(ValueState::EndOfFile),
                    Some(_) => Ok(ValueState::EndOfLine),
                };
            }
        }
    }
    if state == Start {
        Ok(ValueState::None)
    } else {
        Ok(ValueState::EndOfFile)
    }
}

/// Consume every line end character starting at `next` and return the first
/// character that isn't one, without consuming it.
fn skip_line_ends<C: CharCursor>(
    cur: &mut C,
    mut next: Option<char>,
) -> Result<Option<char>, DecodeError<C::Error>> {
    while next.map_or(false, is_line_end) {
        next = match cur.next_pair().map_err(DecodeError::Source)? {
            Some((_, n)) => n,
            None => None,
        };
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use super::{decode_field, CharCursor, DecodeError, ValueState};

    type Csv = Vec<Row>;
    type Row = Vec<String>;

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            fn x() -> Csv {
                let mut csv = Csv::new();
                $(
                    let mut row = Row::new();
                    $(
                        row.push($field.to_string());
                    )*
                    csv.push(row);
                )*
                csv
            }
            x()
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let got = parse(&mut Chars::new($data)).unwrap();
                assert_eq!($expected, got, "block size 1024");

                let got = parse(&mut Chars::new($data).block(1)).unwrap();
                assert_eq!($expected, got, "block size 1");
            }
        };
    }

    /// A cursor that hands characters to the decoder through a window of at
    /// most `block` characters, refilled only once it is used up.
    struct Chars {
        chars: Vec<char>,
        taken: usize,
        window: Vec<char>,
        at: usize,
        block: usize,
        pos: usize,
        pulls: usize,
    }

    impl Chars {
        fn new(data: &str) -> Chars {
            Chars {
                chars: data.chars().collect(),
                taken: 0,
                window: Vec::new(),
                at: 0,
                block: 1024,
                pos: 0,
                pulls: 0,
            }
        }

        fn block(mut self, size: usize) -> Chars {
            self.block = size;
            self
        }

        fn refill(&mut self) {
            let end = (self.taken + self.block).min(self.chars.len());
            self.window = self.chars[self.taken..end].to_vec();
            self.taken = end;
            self.at = 0;
            self.pulls += 1;
        }
    }

    impl CharCursor for Chars {
        type Error = ();

        fn next_pair(&mut self) -> Result<Option<(char, Option<char>)>, ()> {
            if self.at == self.window.len() {
                self.refill();
            }
            let ch = match self.window.get(self.at) {
                None => return Ok(None),
                Some(&ch) => ch,
            };
            self.at += 1;
            self.pos += 1;
            if self.at == self.window.len() {
                self.refill();
            }
            Ok(Some((ch, self.window.get(self.at).cloned())))
        }

        fn skip_next(&mut self) {
            assert!(self.at < self.window.len(), "skipped past the end");
            self.at += 1;
            self.pos += 1;
        }
    }

    /// Decode every row, with the same row assembly rules the buffered
    /// reader uses.
    fn parse(cur: &mut Chars) -> Result<Csv, DecodeError<()>> {
        let mut csv = Csv::new();
        loop {
            let mut row = Row::new();
            let last = loop {
                let mut field = String::new();
                let state = decode_field(cur, &mut field)?;
                if state == ValueState::None && row.is_empty() {
                    return Ok(csv);
                }
                row.push(field);
                if state.is_row_end() {
                    break state;
                }
            };
            csv.push(row);
            if last != ValueState::EndOfLine {
                return Ok(csv);
            }
        }
    }

    parses_to!(empty, "", csv![]);
    parses_to!(only_line_break, "\r\n", csv![]);
    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_two_trailing_commas, "a,,", csv![["a", "", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    parses_to!(one_row_many_fields_lf, "a,b,c\n", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_lf, "a,b,\n", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_crlf, "a\r\n", csv![["a"]]);
    parses_to!(one_row_many_fields_crlf, "a,b,c\r\n", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_crlf, "a,b,\r\n", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_cr, "a\r", csv![["a"]]);
    parses_to!(one_row_many_fields_cr, "a,b,c\r", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_cr, "a,b,\r", csv![["a", "b", ""]]);

    parses_to!(many_rows_one_field, "a\nb", csv![["a"], ["b"]]);
    parses_to!(many_rows_one_char_fields, "1,2\r3,4\r", csv![["1", "2"], ["3", "4"]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma,
        "a,b,\nx,y,",
        csv![["a", "b", ""], ["x", "y", ""]]
    );
    parses_to!(many_rows_one_field_crlf, "a\r\nb\r\n", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_different_lengths,
        "11,12\r21,22,23\r",
        csv![["11", "12"], ["21", "22", "23"]]
    );
    parses_to!(many_line_breaks_collapse, "a\r\n\r\n\nb", csv![["a"], ["b"]]);
    parses_to!(leading_blank_line, "\nab", csv![[""], ["ab"]]);
    parses_to!(empty_middle_field, "a,,b", csv![["a", "", "b"]]);
    parses_to!(empty_first_field, ",a", csv![["", "a"]]);
    parses_to!(only_comma, ",", csv![["", ""]]);
    parses_to!(unquoted_quote_is_data, "a\"b,c", csv![["a\"b", "c"]]);

    parses_to!(quoted_simple, "\"a\"", csv![["a"]]);
    parses_to!(quoted_empty, "\"\",b", csv![["", "b"]]);
    parses_to!(quoted_separator, "\"a,b\",c", csv![["a,b", "c"]]);
    parses_to!(quoted_doubled_quote, "\"a\"\"b\"", csv![["a\"b"]]);
    parses_to!(quoted_only_quote, "\"\"\"\"", csv![["\""]]);
    parses_to!(
        quoted_escaping_literal,
        "1,\"two of \"\"these\"\"\"\r",
        csv![["1", "two of \"these\""]]
    );
    parses_to!(quoted_lf, "\"mu\nlt\",nm\r1,2\r", csv![["mu\nlt", "nm"], ["1", "2"]]);
    parses_to!(quoted_bare_cr_normalized, "\"a\rb\"", csv![["a\r\nb"]]);
    parses_to!(quoted_crlf_kept, "\"a\r\nb\"", csv![["a\r\nb"]]);
    parses_to!(
        quoted_legacy_writer_output,
        "1,\"-=--=,,**\r77$$\"\r",
        csv![["1", "-=--=,,**\r\n77$$"]]
    );
    parses_to!(quoted_then_line_break, "\"a\"\r\n\"b\"", csv![["a"], ["b"]]);
    parses_to!(quoted_unterminated, "\"abc", csv![["abc"]]);

    #[test]
    fn quote_followed_by_garbage() {
        let mut cur = Chars::new("\"ab\"x,c");
        let mut field = String::new();
        let err = decode_field(&mut cur, &mut field).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedChar('x'));
        // The offending character is still the next one to be read.
        assert_eq!(cur.pos, 4);
    }

    #[test]
    fn source_errors_propagate() {
        struct Broken;

        impl CharCursor for Broken {
            type Error = &'static str;

            fn next_pair(
                &mut self,
            ) -> Result<Option<(char, Option<char>)>, &'static str> {
                Err("boom")
            }

            fn skip_next(&mut self) {}
        }

        let mut field = String::new();
        let err = decode_field(&mut Broken, &mut field).unwrap_err();
        assert_eq!(err, DecodeError::Source("boom"));
    }

    #[test]
    fn field_buffer_is_appended_to() {
        let mut cur = Chars::new("a,b");
        let mut field = String::from("x");
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::HasMore));
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::EndOfFile));
        assert_eq!(field, "xab");
    }

    #[test]
    fn end_of_line_versus_end_of_file() {
        let mut cur = Chars::new("a\rb");
        let mut field = String::new();
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::EndOfLine));
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::EndOfFile));
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::None));
        assert!(cur.pulls > 0);
    }

    #[test]
    fn lookahead_crosses_window_boundaries() {
        let mut cur = Chars::new("\"a\"\"b\"\r\nc").block(1);
        let mut field = String::new();
        assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::EndOfLine));
        assert_eq!(field, "a\"b");
        // Every character came through its own window.
        assert!(cur.pulls >= 7);
        assert!(cur.window.len() <= 1);
    }
}
