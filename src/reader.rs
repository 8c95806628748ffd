use std::cmp;
use std::io;
#[cfg(feature = "serde")]
use std::marker::PhantomData;
use std::str;

#[cfg(feature = "serde")]
use serde::de::DeserializeOwned;
use streamcsv_core::{decode_field, CharCursor, DecodeError, ValueState};
use tracing::{debug, trace};

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::row::{end_field, field_buf, set_position, Row};
use crate::source::{CharSource, Decoded};

/// The default number of characters held by a reader's block buffer.
pub const BLOCK_SIZE: usize = 10 * (1 << 10);

/// Builds a CSV reader with various configuration knobs.
///
/// The format itself (separator, quote, line endings) is fixed. What can be
/// configured is how characters get to the parser.
#[derive(Debug)]
pub struct ReaderBuilder {
    capacity: usize,
    encoding: Encoding,
    has_headers: bool,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            capacity: BLOCK_SIZE,
            encoding: Encoding::default(),
            has_headers: true,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser that decodes bytes from the given reader with the
    /// configured encoding.
    ///
    /// The reader is buffered for you automatically.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<Decoded<R>> {
        self.from_source(Decoded::with_encoding(rdr, self.encoding))
    }

    /// Build a CSV parser that reads characters from the given source.
    ///
    /// The configured encoding is not used.
    pub fn from_source<S: CharSource>(&self, src: S) -> Reader<S> {
        Reader::new(self, src)
    }

    /// Build a CSV parser over text that is already in memory.
    pub fn from_text<'a>(&self, text: &'a str) -> Reader<str::Chars<'a>> {
        self.from_source(text.chars())
    }

    /// The number of characters to decode at a time.
    ///
    /// This is the capacity of the reader's block buffer. It has no effect
    /// on what is parsed. The default is `10240`. A capacity of zero is
    /// treated as `1`.
    pub fn capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = cmp::max(1, capacity);
        self
    }

    /// The text encoding used by `from_reader`.
    ///
    /// The default is UTF-8.
    pub fn encoding(&mut self, encoding: Encoding) -> &mut ReaderBuilder {
        self.encoding = encoding;
        self
    }

    /// Whether the first row is a header row when deserializing.
    ///
    /// This only affects `Reader::deserialize`. Reading plain rows always
    /// returns every row, including the first. The default is `true`.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }
}

/// A position in CSV data.
///
/// The character offset counts decoded characters, not bytes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Position {
    char: u64,
    line: u64,
    row: u64,
}

impl Position {
    /// Create a new position.
    pub fn new(char: u64, line: u64, row: u64) -> Position {
        Position { char, line, row }
    }

    /// The number of characters before this position, starting at `0`.
    pub fn char(&self) -> u64 {
        self.char
    }

    /// The line number of this position, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The row index of this position, starting at `0`.
    pub fn row(&self) -> u64 {
        self.row
    }
}

/// A CSV reader.
///
/// A reader pulls characters from a [`CharSource`](trait.CharSource.html)
/// into a fixed size block buffer and decodes one row at a time. It never
/// holds more than one block of input in memory.
///
/// Fields are separated by `,` and may be quoted with `"`. A quoted field may
/// contain separators, doubled quotes and line breaks. Any run of `\r` and
/// `\n` characters outside of quotes ends a row. A `\r` inside quotes is
/// always read as `\r\n`.
///
/// # Example
///
/// ```
/// use streamcsv::Reader;
///
/// let mut rdr = Reader::from_text("city,pop\r\"Boston, MA\",4628910\r");
/// let headers = rdr.read_row().unwrap().unwrap();
/// assert_eq!(headers, vec!["city", "pop"]);
///
/// let row = rdr.read_row().unwrap().unwrap();
/// assert_eq!(&row[0], "Boston, MA");
///
/// assert!(rdr.read_row().unwrap().is_none());
/// assert!(rdr.read_row().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct Reader<S> {
    block: Block<S>,
    /// How the last decoded row ended. Once this is `EndOfFile`, it stays.
    state: ValueState,
    has_headers: bool,
    /// The number of rows read so far.
    row: u64,
    /// Buffer sizes of the last row, used as a hint for the next one.
    last_capacity: (usize, usize),
}

impl<R: io::Read> Reader<Decoded<R>> {
    /// Create a new CSV parser with a default configuration for the given
    /// reader of UTF-8 bytes.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<Decoded<R>> {
        ReaderBuilder::new().from_reader(rdr)
    }
}

impl<'a> Reader<str::Chars<'a>> {
    /// Create a new CSV parser with a default configuration over text in
    /// memory.
    pub fn from_text(text: &'a str) -> Reader<str::Chars<'a>> {
        ReaderBuilder::new().from_text(text)
    }
}

impl<S: CharSource> Reader<S> {
    fn new(builder: &ReaderBuilder, src: S) -> Reader<S> {
        Reader {
            block: Block::new(src, builder.capacity),
            state: ValueState::None,
            has_headers: builder.has_headers,
            row: 0,
            last_capacity: (0, 0),
        }
    }

    /// Create a new CSV parser with a default configuration for the given
    /// character source.
    pub fn from_source(src: S) -> Reader<S> {
        ReaderBuilder::new().from_source(src)
    }

    /// Read the next row.
    ///
    /// This returns `None` once all of the input has been read, and keeps
    /// returning `None` on every call after that.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        let (buffer, fields) = self.last_capacity;
        let mut row = Row::with_capacity(buffer, fields);
        if self.read_row_into(&mut row)? {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }

    /// Read the next row into the given `Row`, reusing its storage.
    ///
    /// This returns `true` if a row was read and `false` once all of the
    /// input has been read. `row` is always cleared first.
    ///
    /// If a malformed quoted field is found, an error is returned and the
    /// reader stays positioned at the offending character. It does not try
    /// to find the start of the next row.
    ///
    /// # Example
    ///
    /// ```
    /// use streamcsv::{Reader, Row};
    ///
    /// let mut rdr = Reader::from_text("a,b\r\nc,d");
    /// let mut row = Row::new();
    /// let mut count = 0;
    /// while rdr.read_row_into(&mut row).unwrap() {
    ///     count += row.len();
    /// }
    /// assert_eq!(count, 4);
    /// ```
    pub fn read_row_into(&mut self, row: &mut Row) -> Result<bool> {
        row.clear();
        if self.state == ValueState::EndOfFile {
            return Ok(false);
        }
        let start = self.position();
        loop {
            let state = match decode_field(&mut self.block, field_buf(row)) {
                Ok(state) => state,
                Err(DecodeError::Source(err)) => {
                    row.clear();
                    return Err(Error::Io(err));
                }
                Err(DecodeError::UnexpectedChar(found)) => {
                    row.clear();
                    let pos = self.position();
                    debug!(
                        char = pos.char(),
                        line = pos.line(),
                        "malformed quoted field"
                    );
                    return Err(Error::Format { pos, found });
                }
            };
            if state == ValueState::None && row.is_empty() {
                debug!(rows = self.row, "end of CSV data");
                self.state = ValueState::EndOfFile;
                return Ok(false);
            }
            end_field(row);
            if state.is_row_end() {
                self.state = match state {
                    ValueState::EndOfLine => ValueState::EndOfLine,
                    _ => ValueState::EndOfFile,
                };
                break;
            }
        }
        set_position(row, Some(start));
        self.last_capacity = (row.iter().map(str::len).sum(), row.len());
        self.row += 1;
        Ok(true)
    }

    /// Returns a borrowed iterator over all rows.
    ///
    /// The iterator stops after yielding the first error.
    pub fn rows(&mut self) -> RowsIter<S> {
        RowsIter { rdr: self, done: false }
    }

    /// Returns an owned iterator over all rows.
    pub fn into_rows(self) -> RowsIntoIter<S> {
        RowsIntoIter { rdr: self, done: false }
    }

    /// Returns a borrowed iterator over deserialized rows.
    ///
    /// If the reader was built with `has_headers(true)` (the default), the
    /// first row is read as a header row and used to match struct fields by
    /// name. It is not yielded.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Deserialize;
    /// use streamcsv::Reader;
    ///
    /// #[derive(Debug, Deserialize, PartialEq)]
    /// struct Point {
    ///     x: i32,
    ///     y: i32,
    /// }
    ///
    /// let mut rdr = Reader::from_text("y,x\r2,1\r4,3\r");
    /// let points = rdr
    ///     .deserialize()
    ///     .collect::<streamcsv::Result<Vec<Point>>>()
    ///     .unwrap();
    /// assert_eq!(points, vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]);
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<D: DeserializeOwned>(
        &mut self,
    ) -> DeserializeRowsIter<S, D> {
        DeserializeRowsIter::new(self)
    }

    /// Returns an owned iterator over deserialized rows.
    #[cfg(feature = "serde")]
    pub fn into_deserialize<D: DeserializeOwned>(
        self,
    ) -> DeserializeRowsIntoIter<S, D> {
        DeserializeRowsIntoIter::new(self)
    }
}

impl<S> Reader<S> {
    /// The position of the next character to be read.
    pub fn position(&self) -> Position {
        Position::new(self.block.char, self.block.line, self.row)
    }

    /// Returns true once all of the input has been read.
    pub fn is_done(&self) -> bool {
        self.state == ValueState::EndOfFile
    }

    /// Whether the first row is treated as a header row when deserializing.
    pub fn has_headers(&self) -> bool {
        self.has_headers
    }

    /// Return a reference to the underlying character source.
    pub fn get_ref(&self) -> &S {
        &self.block.src
    }

    /// Return a mutable reference to the underlying character source.
    ///
    /// Reading from it directly desynchronizes this reader.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.block.src
    }

    /// Unwrap this reader, returning the underlying character source.
    ///
    /// Characters already pulled into the block buffer are lost.
    pub fn into_inner(self) -> S {
        self.block.src
    }
}

/// The block buffer between a character source and the field decoder.
///
/// `pos` is the index of the next unread character and `len` the number of
/// valid characters in `buf`. When `pos == len` the block is refilled before
/// anything else is read from it.
#[derive(Debug)]
struct Block<S> {
    src: S,
    buf: Box<[char]>,
    pos: usize,
    len: usize,
    /// Set once the source returns no characters. Never unset.
    ended: bool,
    /// The number of characters consumed so far.
    char: u64,
    line: u64,
}

impl<S> Block<S> {
    fn new(src: S, capacity: usize) -> Block<S> {
        Block {
            src,
            buf: vec!['\0'; capacity].into_boxed_slice(),
            pos: 0,
            len: 0,
            ended: false,
            char: 0,
            line: 1,
        }
    }

    fn consume(&mut self, ch: char, next: Option<char>) {
        self.char += 1;
        if ch == '\n' || (ch == '\r' && next != Some('\n')) {
            self.line += 1;
        }
    }
}

impl<S: CharSource> Block<S> {
    /// Make sure there is at least one unread character in the block.
    ///
    /// Returns `false` at the end of the stream.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.len {
            return Ok(true);
        }
        if self.ended {
            return Ok(false);
        }
        let n = self.src.read_block(&mut self.buf)?;
        self.pos = 0;
        self.len = n;
        if n == 0 {
            trace!(chars = self.char, "character stream exhausted");
            self.ended = true;
            return Ok(false);
        }
        trace!(chars = n, "refilled block buffer");
        Ok(true)
    }
}

impl<S: CharSource> CharCursor for Block<S> {
    type Error = io::Error;

    fn next_pair(&mut self) -> io::Result<Option<(char, Option<char>)>> {
        if !self.fill()? {
            return Ok(None);
        }
        let ch = self.buf[self.pos];
        self.pos += 1;
        let next = if self.fill()? { Some(self.buf[self.pos]) } else { None };
        self.consume(ch, next);
        Ok(Some((ch, next)))
    }

    fn skip_next(&mut self) {
        debug_assert!(self.pos < self.len);
        let ch = self.buf[self.pos];
        self.pos += 1;
        // Only quotes and the `\n` of a `\r\n` pair are ever skipped.
        self.consume(ch, None);
    }
}

/// An owned iterator over rows.
pub struct RowsIntoIter<S> {
    rdr: Reader<S>,
    done: bool,
}

impl<S: CharSource> RowsIntoIter<S> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<S> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<S> {
        self.rdr
    }
}

impl<S: CharSource> Iterator for RowsIntoIter<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        next_row(&mut self.rdr, &mut self.done)
    }
}

/// A borrowed iterator over rows.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`.
pub struct RowsIter<'r, S: 'r> {
    rdr: &'r mut Reader<S>,
    done: bool,
}

impl<'r, S: CharSource> RowsIter<'r, S> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<S> {
        &self.rdr
    }
}

impl<'r, S: CharSource> Iterator for RowsIter<'r, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        next_row(self.rdr, &mut self.done)
    }
}

fn next_row<S: CharSource>(
    rdr: &mut Reader<S>,
    done: &mut bool,
) -> Option<Result<Row>> {
    if *done {
        return None;
    }
    match rdr.read_row() {
        Ok(Some(row)) => Some(Ok(row)),
        Ok(None) => {
            *done = true;
            None
        }
        Err(err) => {
            *done = true;
            Some(Err(err))
        }
    }
}

/// State shared by the deserializing iterators.
#[cfg(feature = "serde")]
struct DeserializeState<D> {
    headers: Option<Row>,
    started: bool,
    row: Row,
    done: bool,
    _priv: PhantomData<D>,
}

#[cfg(feature = "serde")]
impl<D: DeserializeOwned> DeserializeState<D> {
    fn new() -> DeserializeState<D> {
        DeserializeState {
            headers: None,
            started: false,
            row: Row::new(),
            done: false,
            _priv: PhantomData,
        }
    }

    fn next<S: CharSource>(&mut self, rdr: &mut Reader<S>) -> Option<Result<D>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if rdr.has_headers() {
                match rdr.read_row() {
                    Ok(Some(headers)) => self.headers = Some(headers),
                    Ok(None) => {
                        self.done = true;
                        return None;
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
            }
        }
        match rdr.read_row_into(&mut self.row) {
            Ok(true) => Some(self.row.deserialize(self.headers.as_ref())),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// A borrowed iterator over deserialized rows.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`. The type parameter `D` is the type each row is deserialized
/// into.
#[cfg(feature = "serde")]
pub struct DeserializeRowsIter<'r, S: 'r, D> {
    rdr: &'r mut Reader<S>,
    state: DeserializeState<D>,
}

#[cfg(feature = "serde")]
impl<'r, S: CharSource, D: DeserializeOwned> DeserializeRowsIter<'r, S, D> {
    fn new(rdr: &'r mut Reader<S>) -> DeserializeRowsIter<'r, S, D> {
        DeserializeRowsIter { rdr, state: DeserializeState::new() }
    }

    /// The header row, once the first row has been requested.
    pub fn headers(&self) -> Option<&Row> {
        self.state.headers.as_ref()
    }
}

#[cfg(feature = "serde")]
impl<'r, S: CharSource, D: DeserializeOwned> Iterator
    for DeserializeRowsIter<'r, S, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        self.state.next(self.rdr)
    }
}

/// An owned iterator over deserialized rows.
#[cfg(feature = "serde")]
pub struct DeserializeRowsIntoIter<S, D> {
    rdr: Reader<S>,
    state: DeserializeState<D>,
}

#[cfg(feature = "serde")]
impl<S: CharSource, D: DeserializeOwned> DeserializeRowsIntoIter<S, D> {
    fn new(rdr: Reader<S>) -> DeserializeRowsIntoIter<S, D> {
        DeserializeRowsIntoIter { rdr, state: DeserializeState::new() }
    }

    /// The header row, once the first row has been requested.
    pub fn headers(&self) -> Option<&Row> {
        self.state.headers.as_ref()
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<S> {
        self.rdr
    }
}

#[cfg(feature = "serde")]
impl<S: CharSource, D: DeserializeOwned> Iterator
    for DeserializeRowsIntoIter<S, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        self.state.next(&mut self.rdr)
    }
}
