use std::error;
use std::fmt;
use std::io;
use std::result;

#[cfg(feature = "serde")]
use crate::deserializer::DeserializeError;
use crate::reader::Position;

/// A type alias for `Result<T, streamcsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing CSV data.
///
/// This error can happen when writing or reading CSV data.
///
/// Reaching the end of the input is never an error. Readers report it by
/// returning `None` (or `false`) instead.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// A quote closing a quoted field was followed by a character other than
    /// a separator, a line end or another quote.
    Format {
        /// The position of the offending character.
        pos: Position,
        /// The offending character.
        found: char,
    },
    /// This error occurs when a row has more fields than there are column
    /// names to file them under.
    UnequalLengths {
        /// The position of the row that is too long, if available.
        pos: Option<Position>,
        /// The number of column names.
        expected_len: u64,
        /// The number of fields in the bad row.
        len: u64,
    },
    /// An error of this kind occurs only when using the Serde serializer.
    Serialize(String),
    /// An error of this kind occurs only when performing automatic
    /// deserialization with serde.
    #[cfg(feature = "serde")]
    Deserialize {
        /// The position of the row in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The deserialization error.
        err: DeserializeError,
    },
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Return the position of the data that caused this error, if known.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Format { ref pos, .. } => Some(pos),
            Error::UnequalLengths { ref pos, .. } => pos.as_ref(),
            #[cfg(feature = "serde")]
            Error::Deserialize { ref pos, .. } => pos.as_ref(),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            #[cfg(feature = "serde")]
            Error::Deserialize { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Format { ref pos, found } => write!(
                f,
                "CSV parse error: row {} (char {}, line {}): \
                 unexpected character {:?} after closing quote",
                pos.row(),
                pos.char(),
                pos.line(),
                found
            ),
            Error::UnequalLengths { pos: None, expected_len, len } => write!(
                f,
                "CSV error: found row with {} fields, but there are \
                 only {} columns",
                len, expected_len
            ),
            Error::UnequalLengths { pos: Some(ref pos), expected_len, len } => {
                write!(
                    f,
                    "CSV error: row {} (line {}): found row with {} \
                     fields, but there are only {} columns",
                    pos.row(),
                    pos.line(),
                    len,
                    expected_len
                )
            }
            Error::Serialize(ref err) => {
                write!(f, "CSV write error: {}", err)
            }
            #[cfg(feature = "serde")]
            Error::Deserialize { pos: None, ref err } => {
                write!(f, "CSV deserialize error: {}", err)
            }
            #[cfg(feature = "serde")]
            Error::Deserialize { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV deserialize error: row {} (line {}): {}",
                pos.row(),
                pos.line(),
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;
    use crate::reader::Position;

    #[test]
    fn format_error_message() {
        let err = Error::Format { pos: Position::new(12, 2, 1), found: 'x' };
        assert_eq!(
            err.to_string(),
            "CSV parse error: row 1 (char 12, line 2): \
             unexpected character 'x' after closing quote"
        );
        assert_eq!(err.position().map(|p| p.char()), Some(12));
        assert!(!err.is_io_error());
    }

    #[test]
    fn io_error_round_trip() {
        let err = Error::from(io::Error::new(io::ErrorKind::Other, "nope"));
        assert!(err.is_io_error());
        let ioerr: io::Error = err.into();
        assert_eq!(ioerr.kind(), io::ErrorKind::Other);

        let err = Error::Serialize("bad".to_string());
        let ioerr: io::Error = err.into();
        assert_eq!(ioerr.kind(), io::ErrorKind::InvalidData);
    }
}
