use std::io;

#[cfg(feature = "serde")]
use serde::Serialize;
use streamcsv_core::Writer as CoreWriter;
use tracing::trace;

use crate::encoding::Encoding;
use crate::error::Result;
#[cfg(feature = "serde")]
use crate::serializer::{serialize, serialize_header};

/// Builds a CSV writer with various configuration knobs.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    encoding: Encoding,
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer::new(self, wtr)
    }

    /// The text encoding rows are written in.
    ///
    /// No byte order mark is ever written. The default is UTF-8.
    pub fn encoding(&mut self, encoding: Encoding) -> &mut WriterBuilder {
        self.encoding = encoding;
        self
    }
}

/// A CSV writer.
///
/// Each call to `write_row` (or `serialize`) formats one row, encodes it and
/// hands it to the underlying `io::Write` right away. The writer doesn't
/// buffer across rows and never flushes on its own. Wrap the sink in an
/// `io::BufWriter` if many small writes are a concern, and call `flush` when
/// done.
///
/// Every row ends with a single `\r`.
///
/// # Example
///
/// ```
/// use streamcsv::Writer;
///
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_row(&["1", "two of \"these\""]).unwrap();
/// wtr.write_row(&["city", "Boston, MA"]).unwrap();
///
/// let data = String::from_utf8(wtr.into_inner()).unwrap();
/// assert_eq!(data, "1,\"two of \"\"these\"\"\"\rcity,\"Boston, MA\"\r");
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: W,
    encoding: Encoding,
    core: CoreWriter,
    /// The row being formatted. Cleared after every row.
    line: String,
    /// The encoded form of `line`.
    bytes: Vec<u8>,
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Writer<W> {
        Writer {
            wtr,
            encoding: builder.encoding,
            core: CoreWriter::new(),
            line: String::new(),
            bytes: vec![],
        }
    }

    /// Build a CSV writer with a default configuration that writes UTF-8
    /// data to `wtr`.
    ///
    /// To customize CSV writing, use a `WriterBuilder`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single row.
    ///
    /// Fields that contain a quote, a separator or a line break are quoted.
    /// Writing an empty iterator writes an empty line.
    ///
    /// # Example
    ///
    /// ```
    /// use streamcsv::Writer;
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// wtr.write_row(vec!["a", ""]).unwrap();
    /// wtr.write_row(vec![""]).unwrap();
    /// wtr.write_row(vec![String::from("x\r\ny")]).unwrap();
    ///
    /// let data = String::from_utf8(wtr.into_inner()).unwrap();
    /// assert_eq!(data, "a,\r\"\"\r\"x\ry\"\r");
    /// ```
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for field in row {
            self.write_field(field.as_ref());
        }
        self.write_term()
    }

    /// Serialize a single record using Serde.
    ///
    /// Primitives and strings become one field each. Structs, tuples and
    /// sequences become one field per member, in order. Containers nested
    /// inside a record, maps and enum variants with data other than a
    /// single value can't be written and return an error. Nothing is
    /// written when that happens.
    ///
    /// Headers are never written automatically. Use `serialize_header`.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Serialize;
    /// use streamcsv::Writer;
    ///
    /// #[derive(Serialize)]
    /// struct Row<'a> {
    ///     city: &'a str,
    ///     population: Option<u64>,
    /// }
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// let row = Row { city: "Boston", population: Some(4628910) };
    /// wtr.serialize_header(&row).unwrap();
    /// wtr.serialize(&row).unwrap();
    /// wtr.serialize(Row { city: "Concord", population: None }).unwrap();
    ///
    /// let data = String::from_utf8(wtr.into_inner()).unwrap();
    /// assert_eq!(data, "city,population\rBoston,4628910\rConcord,\r");
    /// ```
    #[cfg(feature = "serde")]
    pub fn serialize<S: Serialize>(&mut self, record: S) -> Result<()> {
        if let Err(err) = serialize(self, &record) {
            self.reset_row();
            return Err(err);
        }
        self.write_term()
    }

    /// Write the field names of a struct as one row.
    ///
    /// Only structs have field names, so any other value returns an error.
    #[cfg(feature = "serde")]
    pub fn serialize_header<S: Serialize>(&mut self, record: S) -> Result<()> {
        if let Err(err) = serialize_header(self, &record) {
            self.reset_row();
            return Err(err);
        }
        self.write_term()
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.wtr.flush()
    }

    /// The encoding rows are written in.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Return a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.wtr
    }

    /// Return a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.wtr
    }

    /// Unwrap this writer, returning the underlying writer.
    ///
    /// The underlying writer is not flushed.
    pub fn into_inner(self) -> W {
        self.wtr
    }

    /// Append one field to the current row.
    pub(crate) fn write_field(&mut self, field: &str) {
        self.core.write_field(field, &mut self.line);
    }

    /// End the current row and send it to the underlying writer.
    fn write_term(&mut self) -> Result<()> {
        self.core.write_term(&mut self.line);
        self.encoding.encode(&self.line, &mut self.bytes);
        let res = self.wtr.write_all(&self.bytes);
        trace!(bytes = self.bytes.len(), "wrote row");
        self.line.clear();
        self.bytes.clear();
        res.map_err(From::from)
    }

    /// Throw away a partially formatted row.
    #[cfg(feature = "serde")]
    fn reset_row(&mut self) {
        self.core = CoreWriter::new();
        self.line.clear();
    }
}
