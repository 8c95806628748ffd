use std::io;
use std::str;

use tracing::trace;

use crate::encoding::{Decoder, Encoding};

const BYTE_BUF_SIZE: usize = 8 * (1 << 10);

/// A source of decoded characters.
///
/// A CSV reader pulls characters from a source one block at a time. The
/// source decides how characters come to be: decoded from bytes, taken from
/// a string in memory, or anything else.
pub trait CharSource {
    /// Fill `buf` with the next characters of the stream and return how many
    /// were written.
    ///
    /// Implementations should fill the whole buffer unless the stream ends
    /// first. Returning `0` for a non-empty `buf` signals the end of the
    /// stream.
    fn read_block(&mut self, buf: &mut [char]) -> io::Result<usize>;
}

impl<'a, S: CharSource + ?Sized> CharSource for &'a mut S {
    fn read_block(&mut self, buf: &mut [char]) -> io::Result<usize> {
        (**self).read_block(buf)
    }
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn read_block(&mut self, buf: &mut [char]) -> io::Result<usize> {
        (**self).read_block(buf)
    }
}

impl<'a> CharSource for str::Chars<'a> {
    fn read_block(&mut self, buf: &mut [char]) -> io::Result<usize> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.next() {
                None => break,
                Some(ch) => *slot = ch,
            }
            n += 1;
        }
        Ok(n)
    }
}

/// A character source that decodes bytes from an `io::Read`.
///
/// Bytes are read into an internal buffer and decoded with the encoding
/// chosen at construction. Decoded text waits in a second buffer until the
/// reader asks for it.
#[derive(Debug)]
pub struct Decoded<R> {
    rdr: R,
    decoder: Decoder,
    buf: Box<[u8]>,
    text: String,
    pos: usize,
    eof: bool,
}

impl<R: io::Read> Decoded<R> {
    /// Decode UTF-8 text read from `rdr`.
    pub fn new(rdr: R) -> Decoded<R> {
        Decoded::with_encoding(rdr, Encoding::Utf8)
    }

    /// Decode text read from `rdr` with the given encoding.
    pub fn with_encoding(rdr: R, encoding: Encoding) -> Decoded<R> {
        Decoded {
            rdr,
            decoder: encoding.decoder(),
            buf: vec![0; BYTE_BUF_SIZE].into_boxed_slice(),
            text: String::new(),
            pos: 0,
            eof: false,
        }
    }
}

impl<R> Decoded<R> {
    /// The encoding used to decode bytes.
    pub fn encoding(&self) -> Encoding {
        self.decoder.encoding()
    }

    /// Return a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Return a mutable reference to the underlying reader.
    ///
    /// Reading from it directly will desynchronize this source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwrap this source, returning the underlying reader.
    ///
    /// Bytes that were read but not yet handed out are lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

impl<R: io::Read> Decoded<R> {
    /// Replace the decoded text with whatever the next read yields.
    fn fill(&mut self) -> io::Result<()> {
        self.text.clear();
        self.pos = 0;
        loop {
            match self.rdr.read(&mut self.buf) {
                Ok(n) => {
                    self.eof = n == 0;
                    trace!(bytes = n, "read bytes");
                    self.decoder.decode(&self.buf[..n], &mut self.text, self.eof);
                    return Ok(());
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: io::Read> CharSource for Decoded<R> {
    fn read_block(&mut self, out: &mut [char]) -> io::Result<usize> {
        let mut nout = 0;
        while nout < out.len() {
            if self.pos == self.text.len() {
                if self.eof {
                    break;
                }
                self.fill()?;
                continue;
            }
            for ch in self.text[self.pos..].chars() {
                if nout == out.len() {
                    break;
                }
                out[nout] = ch;
                nout += 1;
                self.pos += ch.len_utf8();
            }
        }
        Ok(nout)
    }
}
