use std::fmt;
use std::iter::FromIterator;
use std::ops::{self, Range};

#[cfg(feature = "serde")]
use serde::de::Deserialize;

#[cfg(feature = "serde")]
use crate::deserializer::deserialize_row;
#[cfg(feature = "serde")]
use crate::error::{Error, Result};
use crate::reader::Position;

/// Retrieve the buffer that the next field of `row` should be decoded into.
pub(crate) fn field_buf(row: &mut Row) -> &mut String {
    &mut row.fields
}

/// Mark everything decoded into the field buffer since the previous field as
/// one new field.
pub(crate) fn end_field(row: &mut Row) {
    row.ends.push(row.fields.len());
}

/// Set the position at which `row` started.
pub(crate) fn set_position(row: &mut Row, pos: Option<Position>) {
    row.pos = pos;
}

/// A single CSV row.
///
/// All fields are stored contiguously in one string, alongside the offset at
/// which each field ends. Clearing a row keeps both allocations around, so a
/// row that is reused for reading stops allocating once it has grown to fit
/// the largest row seen.
///
/// A row produced by a reader knows the position it was read from.
#[derive(Clone, Default, Eq)]
pub struct Row {
    fields: String,
    ends: Vec<usize>,
    pos: Option<Position>,
}

impl Row {
    /// Create a new empty `Row`.
    pub fn new() -> Row {
        Row::default()
    }

    /// Create a new empty `Row` with room for `buffer` bytes of field data
    /// and `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> Row {
        Row {
            fields: String::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
            pos: None,
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.range(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Remove every field from this row.
    ///
    /// It is not necessary to clear a row before handing it to a reader.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
        self.pos = None;
    }

    /// Add a new field to the end of this row.
    pub fn push_field(&mut self, field: &str) {
        self.fields.push_str(field);
        self.ends.push(self.fields.len());
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter {
        RowIter { row: self, i: 0, j: self.len() }
    }

    /// Return the fields of this row as owned strings.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(|f| f.to_string()).collect()
    }

    /// The position at which this row was read, if it came from a reader.
    pub fn position(&self) -> Option<&Position> {
        self.pos.as_ref()
    }

    /// Deserialize this row into a Rust value.
    ///
    /// When `headers` is given, structs and maps are filled in by matching
    /// their field names against the header row. Otherwise fields are
    /// consumed in order.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Deserialize;
    /// use streamcsv::Row;
    ///
    /// #[derive(Deserialize)]
    /// struct City {
    ///     name: String,
    ///     population: Option<u64>,
    /// }
    ///
    /// let headers = Row::from(vec!["population", "name"]);
    /// let row = Row::from(vec!["", "Boston"]);
    /// let city: City = row.deserialize(Some(&headers)).unwrap();
    /// assert_eq!(city.name, "Boston");
    /// assert_eq!(city.population, None);
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<'de, D: Deserialize<'de>>(
        &'de self,
        headers: Option<&'de Row>,
    ) -> Result<D> {
        deserialize_row(self, headers).map_err(|err| Error::Deserialize {
            pos: self.pos.clone(),
            err,
        })
    }

    fn range(&self, i: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(start..end)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Row) -> bool {
        self.fields == other.fields && self.ends == other.ends
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for Row {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<'a, T: AsRef<str>> PartialEq<&'a [T]> for Row {
    fn eq(&self, other: &&'a [T]) -> bool {
        *self == **other
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for Row {
    fn eq(&self, other: &Vec<T>) -> bool {
        *self == **other
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Row(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl ops::Index<usize> for Row {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "index out of bounds: row has {} fields but the index is {}",
                self.len(),
                i
            ),
        }
    }
}

impl<T: AsRef<str>> From<Vec<T>> for Row {
    fn from(fields: Vec<T>) -> Row {
        Row::from_iter(fields)
    }
}

impl<'a, T: AsRef<str>> From<&'a [T]> for Row {
    fn from(fields: &'a [T]) -> Row {
        Row::from_iter(fields)
    }
}

impl<T: AsRef<str>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Row {
        let mut row = Row::new();
        row.extend(iter);
        row
    }
}

impl<T: AsRef<str>> Extend<T> for Row {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for field in iter {
            self.push_field(field.as_ref());
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a row.
#[derive(Clone, Debug)]
pub struct RowIter<'r> {
    row: &'r Row,
    i: usize,
    j: usize,
}

impl<'r> Iterator for RowIter<'r> {
    type Item = &'r str;

    fn next(&mut self) -> Option<&'r str> {
        if self.i == self.j {
            return None;
        }
        let field = self.row.get(self.i);
        self.i += 1;
        field
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.j - self.i;
        (n, Some(n))
    }
}

impl<'r> DoubleEndedIterator for RowIter<'r> {
    fn next_back(&mut self) -> Option<&'r str> {
        if self.i == self.j {
            return None;
        }
        self.j -= 1;
        self.row.get(self.j)
    }
}

impl<'r> ExactSizeIterator for RowIter<'r> {}

#[cfg(feature = "serde")]
impl serde::Serialize for Row {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for field in self {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}
