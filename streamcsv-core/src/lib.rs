/*!
`streamcsv-core` provides the I/O free half of a streaming CSV codec: a
character level field decoder and a field encoder.

The format is fixed. Fields are separated by `,`, quoted with `"` and rows
written by the encoder end with a single `\r`. The decoder accepts `\r`, `\n`
and `\r\n` (and any run of them) as a row boundary.

Neither half does any I/O. The decoder pulls characters through the
[`CharCursor`](trait.CharCursor.html) trait, which lets a caller put any kind
of buffering behind it, and the encoder appends to a caller provided
`String`. The `streamcsv` crate builds buffered readers and writers on top of
these.

# Example: decoding

```
use streamcsv_core::{decode_field, CharCursor, ValueState};

/// A cursor over an in memory slice of characters.
struct Slice<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> CharCursor for Slice<'a> {
    type Error = ();

    fn next_pair(&mut self) -> Result<Option<(char, Option<char>)>, ()> {
        match self.chars.get(self.pos) {
            None => Ok(None),
            Some(&cur) => {
                self.pos += 1;
                Ok(Some((cur, self.chars.get(self.pos).cloned())))
            }
        }
    }

    fn skip_next(&mut self) {
        self.pos += 1;
    }
}

let chars: Vec<char> = "a,\"b,c\"\r\n".chars().collect();
let mut cur = Slice { chars: &chars, pos: 0 };
let mut field = String::new();

assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::HasMore));
assert_eq!(field, "a");

field.clear();
assert_eq!(decode_field(&mut cur, &mut field), Ok(ValueState::EndOfFile));
assert_eq!(field, "b,c");
```

# Example: encoding

```
use streamcsv_core::Writer;

let mut wtr = Writer::new();
let mut out = String::new();
wtr.write_field("1", &mut out);
wtr.write_field("two of \"these\"", &mut out);
wtr.write_term(&mut out);
assert_eq!(out, "1,\"two of \"\"these\"\"\"\r");
```
*/

#![deny(missing_docs)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub use crate::reader::{decode_field, CharCursor, DecodeError, ValueState};
pub use crate::writer::{needs_quotes, quote_field, Writer};

mod reader;
mod writer;

/// The character that separates fields.
pub const SEPARATOR: char = ',';

/// The character used to quote fields.
pub const QUOTE: char = '"';

/// The character written after every row.
///
/// Note that this is a bare carriage return and not `\r\n`. Readers accept
/// either, but writers only ever emit `\r`.
pub const TERMINATOR: char = '\r';

/// Returns true if and only if `ch` ends a line.
#[inline]
pub fn is_line_end(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

/// Returns true if and only if `ch` ends an unquoted field.
#[inline]
fn ends_field(ch: Option<char>) -> bool {
    match ch {
        Some(ch) => ch == SEPARATOR || is_line_end(ch),
        None => false,
    }
}
