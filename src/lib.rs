/*!
The `streamcsv` crate provides a streaming CSV reader and writer for a fixed,
legacy flavor of CSV.

The format has no knobs. Fields are separated by `,` and quoted with `"`. A
quote inside a quoted field is written twice. Rows written by this crate end
with a single `\r`, while the reader treats any run of `\r` and `\n` as one
row boundary.

Input is decoded into characters before it is parsed, and the reader only
ever holds one fixed size block of characters in memory. Text can come from
any `io::Read` (in one of the supported [`Encoding`](enum.Encoding.html)s),
from a `&str`, or from anything implementing
[`CharSource`](trait.CharSource.html).

# Brief overview

The primary types in this crate are [`Reader`](struct.Reader.html) and
[`Writer`](struct.Writer.html), for reading and writing CSV data
respectively. Both produce and consume [`Row`](struct.Row.html)s, or any
iterator of strings. [`Table`](struct.Table.html) reads a whole document
into columns keyed by header name.

With the default `serde` feature, rows can be deserialized into and
serialized from your own types.

# Example

```
use streamcsv::{Reader, Writer};

# fn main() { example().unwrap(); }
fn example() -> streamcsv::Result<()> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_row(&["city", "note"])?;
    wtr.write_row(&["Boston", "a \"big\" one,\r\nreally"])?;
    let data = wtr.into_inner();

    let mut rdr = Reader::from_reader(&data[..]);
    let mut rows = vec![];
    for result in rdr.rows() {
        rows.push(result?.to_vec());
    }
    assert_eq!(rows, vec![
        vec!["city", "note"],
        vec!["Boston", "a \"big\" one,\r\nreally"],
    ]);
    Ok(())
}
```

# Example with Serde

```
use serde::{Deserialize, Serialize};
use streamcsv::{Reader, Writer};

#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct Record {
    city: String,
    population: Option<u64>,
}

# fn main() { example().unwrap(); }
fn example() -> streamcsv::Result<()> {
    let records = vec![
        Record { city: "Boston".to_string(), population: Some(4628910) },
        Record { city: "Concord".to_string(), population: None },
    ];

    let mut wtr = Writer::from_writer(vec![]);
    wtr.serialize_header(&records[0])?;
    for record in &records {
        wtr.serialize(record)?;
    }
    let data = String::from_utf8(wtr.into_inner()).unwrap();
    assert_eq!(data, "city,population\rBoston,4628910\rConcord,\r");

    let mut rdr = Reader::from_text(&data);
    let got = rdr.deserialize().collect::<streamcsv::Result<Vec<Record>>>()?;
    assert_eq!(got, records);
    Ok(())
}
```
*/

#![deny(missing_docs)]

pub use streamcsv_core::{QUOTE, SEPARATOR, TERMINATOR};

#[cfg(feature = "serde")]
pub use crate::deserializer::{DeserializeError, DeserializeErrorKind};
pub use crate::encoding::{Decoder, Encoding};
pub use crate::error::{Error, Result};
#[cfg(feature = "serde")]
pub use crate::reader::{DeserializeRowsIntoIter, DeserializeRowsIter};
pub use crate::reader::{
    Position, Reader, ReaderBuilder, RowsIntoIter, RowsIter, BLOCK_SIZE,
};
pub use crate::row::{Row, RowIter};
pub use crate::source::{CharSource, Decoded};
pub use crate::table::Table;
pub use crate::writer::{Writer, WriterBuilder};

#[cfg(feature = "serde")]
mod deserializer;
mod encoding;
mod error;
mod reader;
mod row;
#[cfg(feature = "serde")]
mod serializer;
mod source;
mod table;
mod writer;
