use std::fmt;

use encoding_rs::CoderResult;

/// The text encoding of CSV bytes.
///
/// Readers decode bytes with it before any CSV parsing happens and writers
/// encode each finished row with it. The CSV format itself only ever deals
/// in characters.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// UTF-8. This is the default.
    Utf8,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// ISO-8859-1, where every byte is the code point of the same value.
    ///
    /// This is true ISO-8859-1, not the windows-1252 superset that web
    /// browsers decode under this label.
    Latin1,
}

impl Default for Encoding {
    fn default() -> Encoding {
        Encoding::Utf8
    }
}

impl Encoding {
    /// The byte order mark of this encoding, if it has one.
    pub fn bom(&self) -> &'static [u8] {
        match *self {
            Encoding::Utf8 => b"\xEF\xBB\xBF",
            Encoding::Utf16Le => b"\xFF\xFE",
            Encoding::Utf16Be => b"\xFE\xFF",
            Encoding::Latin1 => b"",
        }
    }

    /// Append the encoded form of `text` to `out`.
    ///
    /// Characters that can't be represented in Latin-1 are written as `?`.
    /// No byte order mark is ever written.
    pub fn encode(&self, text: &str, out: &mut Vec<u8>) {
        match *self {
            Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            Encoding::Utf16Le => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Encoding::Utf16Be => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
            Encoding::Latin1 => {
                out.extend(text.chars().map(|ch| {
                    if (ch as u32) <= 0xFF {
                        ch as u8
                    } else {
                        b'?'
                    }
                }));
            }
        }
    }

    /// Create an incremental decoder for this encoding.
    pub fn decoder(&self) -> Decoder {
        Decoder::new(*self)
    }

    fn codec(&self) -> Option<&'static encoding_rs::Encoding> {
        match *self {
            Encoding::Utf8 => Some(encoding_rs::UTF_8),
            Encoding::Utf16Le => Some(encoding_rs::UTF_16LE),
            Encoding::Utf16Be => Some(encoding_rs::UTF_16BE),
            Encoding::Latin1 => None,
        }
    }
}

/// An incremental decoder from bytes to text.
///
/// Callers feed it the bytes of a stream in pieces of any size. Sequences
/// split across two pieces are held back until the rest of their bytes
/// arrive, or until the last piece is seen, at which point they decode as
/// U+FFFD.
///
/// A byte order mark at the very start of the input is skipped if it matches
/// the decoder's encoding. Invalid sequences decode as U+FFFD.
pub struct Decoder {
    encoding: Encoding,
    inner: Option<encoding_rs::Decoder>,
    finished: bool,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("encoding", &self.encoding)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Decoder {
    /// Create a new decoder for the given encoding.
    pub fn new(encoding: Encoding) -> Decoder {
        Decoder {
            encoding,
            inner: encoding.codec().map(|c| c.new_decoder_with_bom_removal()),
            finished: false,
        }
    }

    /// The encoding used by this decoder.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode all of `input`, appending the text to `output`.
    ///
    /// `last` must be set when `input` holds the last bytes of the stream.
    /// Once it has been set, further calls do nothing.
    pub fn decode(&mut self, input: &[u8], output: &mut String, last: bool) {
        if self.finished {
            return;
        }
        self.finished = last;
        let dec = match self.inner {
            None => {
                output.push_str(&encoding_rs::mem::decode_latin1(input));
                return;
            }
            Some(ref mut dec) => dec,
        };
        let mut input = input;
        loop {
            let room = dec
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 4);
            output.reserve(room);
            let (res, nin, _) = dec.decode_to_string(input, output, last);
            input = &input[nin..];
            match res {
                CoderResult::InputEmpty => return,
                CoderResult::OutputFull => {}
            }
        }
    }
}
