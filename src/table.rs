use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::row::Row;
use crate::source::CharSource;

/// All values of a CSV document, grouped by column.
///
/// A table is built by reading every row of a document. Each data row
/// contributes its `i`th field to the column named by the `i`th header.
/// Short rows are not padded, so columns may end up with different lengths.
/// Header names that appear more than once share a single column, which
/// receives the values of every position carrying that name.
///
/// A column only exists once it has received a value.
///
/// # Example
///
/// ```
/// use streamcsv::Table;
///
/// let table = Table::from_text("a,b\r1,2\r3\r", true).unwrap();
/// assert_eq!(table.get("a").unwrap(), &["1", "3"]);
/// assert_eq!(table.get("b").unwrap(), &["2"]);
/// assert_eq!(table.columns().collect::<Vec<_>>(), vec!["a", "b"]);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    /// Column index for each header position.
    slots: Vec<usize>,
    /// Distinct column names in header order, with their values.
    columns: Vec<(String, Vec<String>)>,
    rows: u64,
}

impl Table {
    /// Read a whole document from text in memory.
    ///
    /// When `has_headers` is false, columns are named `"1"`, `"2"` and so on,
    /// as many as the first row has fields.
    pub fn from_text(text: &str, has_headers: bool) -> Result<Table> {
        Table::from_reader(&mut Reader::from_text(text), has_headers)
    }

    /// Read every remaining row of `rdr`.
    ///
    /// A data row with more fields than there are column names fails with
    /// `Error::UnequalLengths`.
    pub fn from_reader<S: CharSource>(
        rdr: &mut Reader<S>,
        has_headers: bool,
    ) -> Result<Table> {
        let mut row = Row::new();
        if !rdr.read_row_into(&mut row)? {
            return Ok(Table::default());
        }
        let mut table = if has_headers {
            Table::with_names(row.iter())
        } else {
            let mut buf = itoa::Buffer::new();
            let names = (1..=row.len()).map(|i| buf.format(i).to_string());
            let mut table = Table::with_names(names);
            table.push_row(&row)?;
            table
        };
        while rdr.read_row_into(&mut row)? {
            table.push_row(&row)?;
        }
        debug!(columns = table.len(), rows = table.rows, "loaded table");
        Ok(table)
    }

    fn with_names<I, T>(names: I) -> Table
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut table = Table::default();
        for name in names {
            let name = name.as_ref();
            let slot = match table.columns.iter().position(|(n, _)| n == name) {
                Some(slot) => slot,
                None => {
                    table.columns.push((name.to_string(), vec![]));
                    table.columns.len() - 1
                }
            };
            table.slots.push(slot);
        }
        table
    }

    fn push_row(&mut self, row: &Row) -> Result<()> {
        if row.len() > self.slots.len() {
            return Err(Error::UnequalLengths {
                pos: row.position().cloned(),
                expected_len: self.slots.len() as u64,
                len: row.len() as u64,
            });
        }
        for (&slot, field) in self.slots.iter().zip(row) {
            self.columns[slot].1.push(field.to_string());
        }
        self.rows += 1;
        Ok(())
    }

    /// Return every value of the named column, in row order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.iter().find(|&(n, _)| n == name).map(|(_, values)| values)
    }

    /// Returns an iterator over the names of all columns, in header order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(name, _)| name)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if and only if this table has no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over every column name with its values, in header
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.columns
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Convert this table into a map from column name to values.
    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.columns
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::error::Error;
    use crate::reader::{Position, ReaderBuilder};

    #[test]
    fn with_headers() {
        let table = Table::from_text("a,b\r1,2\r3,4", true).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap(), &["1", "3"]);
        assert_eq!(table.get("b").unwrap(), &["2", "4"]);
        assert_eq!(table.get("c"), None);
    }

    #[test]
    fn without_headers() {
        let table = Table::from_text("x,y,z\r1,2\r", false).unwrap();
        let columns: Vec<&str> = table.columns().collect();
        assert_eq!(columns, vec!["1", "2", "3"]);
        assert_eq!(table.get("1").unwrap(), &["x", "1"]);
        assert_eq!(table.get("3").unwrap(), &["z"]);
    }

    #[test]
    fn short_rows_do_not_pad() {
        let table = Table::from_text("a,b,c\r1\r2,3\r", true).unwrap();
        assert_eq!(table.get("a").unwrap(), &["1", "2"]);
        assert_eq!(table.get("b").unwrap(), &["3"]);
        assert_eq!(table.get("c"), None);
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_headers_share_a_column() {
        let table = Table::from_text("k,v,k\r1,2,3\r4,5,6\r", true).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("k").unwrap(), &["1", "3", "4", "6"]);
        assert_eq!(table.get("v").unwrap(), &["2", "5"]);
    }

    #[test]
    fn empty_values_are_values() {
        let table = Table::from_text("a,b\r,\r", true).unwrap();
        assert_eq!(table.get("a").unwrap(), &[""]);
        assert_eq!(table.get("b").unwrap(), &[""]);
    }

    #[test]
    fn headers_only_and_empty() {
        let table = Table::from_text("a,b\r", true).unwrap();
        assert!(table.is_empty());
        assert!(Table::from_text("", true).unwrap().is_empty());
        assert!(Table::from_text("", false).unwrap().is_empty());
    }

    #[test]
    fn long_row_fails() {
        let err = Table::from_text("a,b\r1,2\r1,2,3\r", true).unwrap_err();
        match err {
            Error::UnequalLengths { pos, expected_len, len } => {
                assert_eq!(expected_len, 2);
                assert_eq!(len, 3);
                assert_eq!(pos, Some(Position::new(8, 3, 2)));
            }
            err => panic!("expected UnequalLengths, got {:?}", err),
        }
    }

    #[test]
    fn quoted_values() {
        let text = "name,notes\r\"Smith, J\",\"said \"\"hi\"\"\r\nthen left\"\r";
        let table = Table::from_text(text, true).unwrap();
        assert_eq!(table.get("name").unwrap(), &["Smith, J"]);
        assert_eq!(table.get("notes").unwrap(), &["said \"hi\"\r\nthen left"]);
    }

    #[test]
    fn from_reader_with_small_blocks() {
        let mut rdr = ReaderBuilder::new()
            .capacity(1)
            .from_reader(&b"a,b\r\n1,2\r\n3,4\r\n"[..]);
        let map = Table::from_reader(&mut rdr, true).unwrap().into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], vec!["1", "3"]);
        assert_eq!(map["b"], vec!["2", "4"]);
        assert!(rdr.is_done());
    }
}
