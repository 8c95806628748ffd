use std::io;

use serde::{Deserialize, Serialize};
use streamcsv::{
    Encoding, Error, Position, Reader, ReaderBuilder, Row, Table, Writer,
    WriterBuilder,
};

fn write_rows(rows: &[&[&str]]) -> Vec<u8> {
    let mut wtr = Writer::from_writer(vec![]);
    for row in rows {
        wtr.write_row(row.iter()).unwrap();
    }
    wtr.into_inner()
}

fn read_rows(data: &[u8]) -> Vec<Vec<String>> {
    let mut rdr = Reader::from_reader(data);
    rdr.rows().map(|r| r.unwrap().to_vec()).collect()
}

#[test]
fn rows_of_different_sizes() {
    let data = write_rows(&[&["11", "12"], &["21", "22", "23"]]);
    assert_eq!(data, b"11,12\r21,22,23\r");

    let rows = read_rows(&data);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["11", "12"]);
    assert_eq!(rows[1], vec!["21", "22", "23"]);
}

#[test]
fn escaping_is_byte_exact() {
    let data = write_rows(&[&["1", "two of \"these\""]]);
    assert_eq!(data, b"1,\"two of \"\"these\"\"\"\r");
    assert_eq!(read_rows(&data), vec![vec!["1", "two of \"these\""]]);
}

#[test]
fn multiline_field() {
    let data = write_rows(&[&["1", "-=--=,,**\r\n77$$"], &["2", "a\nb"]]);
    assert_eq!(data, &b"1,\"-=--=,,**\r77$$\"\r2,\"a\nb\"\r"[..]);
    assert_eq!(
        read_rows(&data),
        vec![vec!["1", "-=--=,,**\r\n77$$"], vec!["2", "a\nb"]]
    );
}

#[test]
fn empty_values_keep_their_place() {
    let rows = read_rows(b"a,,c\r,b,\r");
    assert_eq!(rows, vec![vec!["a", "", "c"], vec!["", "b", ""]]);

    let data = write_rows(&[&["", "b", ""], &[""]]);
    assert_eq!(data, b",b,\r\"\"\r");
    assert_eq!(read_rows(&data), vec![vec!["", "b", ""], vec![""]]);
}

#[test]
fn end_of_stream_is_idempotent() {
    let mut rdr = Reader::from_text("a\r\nb\r\n");
    assert_eq!(rdr.read_row().unwrap().unwrap(), vec!["a"]);
    assert_eq!(rdr.read_row().unwrap().unwrap(), vec!["b"]);
    for _ in 0..5 {
        assert!(rdr.read_row().unwrap().is_none());
    }
    assert!(rdr.is_done());
}

#[test]
fn mixed_line_endings() {
    let rows = read_rows(b"a,b\r\nc,d\ne,f\rg,h");
    assert_eq!(
        rows,
        vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "f"], vec!["g", "h"]]
    );
}

#[test]
fn format_error_position() {
    let mut rdr = Reader::from_text("x\r\"a\"b,c\r");
    assert_eq!(rdr.read_row().unwrap().unwrap(), vec!["x"]);
    let err = rdr.read_row().unwrap_err();
    match err {
        Error::Format { pos, found } => {
            assert_eq!(found, 'b');
            assert_eq!(pos, Position::new(5, 2, 1));
        }
        ref err => panic!("expected format error, got {:?}", err),
    }
    let ioerr: io::Error = err.into();
    assert_eq!(ioerr.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn table_with_header_mapping() {
    let data = write_rows(&[&["id", "name"], &["1", "Ann"], &["2", "Bo, Jr"]]);
    let mut rdr = Reader::from_reader(&data[..]);
    let table = Table::from_reader(&mut rdr, true).unwrap();
    assert_eq!(table.get("id").unwrap(), &["1", "2"]);
    assert_eq!(table.get("name").unwrap(), &["Ann", "Bo, Jr"]);

    let table = Table::from_text("1,2\r3,4\r", false).unwrap();
    assert_eq!(table.get("1").unwrap(), &["1", "3"]);
    assert_eq!(table.get("2").unwrap(), &["2", "4"]);
}

#[test]
fn utf16_round_trip() {
    let mut wtr =
        WriterBuilder::new().encoding(Encoding::Utf16Be).from_writer(vec![]);
    wtr.write_row(&["\u{1F600}", "caf\u{e9}, ok"]).unwrap();
    let data = wtr.into_inner();

    let mut rdr = ReaderBuilder::new()
        .encoding(Encoding::Utf16Be)
        .from_reader(&data[..]);
    let row = rdr.read_row().unwrap().unwrap();
    assert_eq!(row, vec!["\u{1F600}", "caf\u{e9}, ok"]);
    assert!(rdr.read_row().unwrap().is_none());
}

#[test]
fn utf8_bom_is_skipped() {
    let rows = read_rows(b"\xEF\xBB\xBFa,b\r");
    assert_eq!(rows, vec![vec!["a", "b"]]);
}

#[test]
fn reuse_row_storage() {
    let mut rdr = Reader::from_text("a,b\rc\r");
    let mut row = Row::new();
    let mut all = vec![];
    while rdr.read_row_into(&mut row).unwrap() {
        all.push(row.to_vec());
    }
    assert_eq!(all, vec![vec!["a", "b"], vec!["c"]]);
}

#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct City {
    name: String,
    population: Option<u64>,
    lat: f64,
}

#[test]
fn serde_round_trip() {
    let cities = vec![
        City { name: "Boston, MA".into(), population: Some(4628910), lat: 42.36 },
        City { name: "Nowhere".into(), population: None, lat: -1.5 },
    ];
    let mut wtr = Writer::from_writer(vec![]);
    wtr.serialize_header(&cities[0]).unwrap();
    for city in &cities {
        wtr.serialize(city).unwrap();
    }
    let data = wtr.into_inner();
    assert_eq!(
        String::from_utf8(data.clone()).unwrap(),
        "name,population,lat\r\"Boston, MA\",4628910,42.36\rNowhere,,-1.5\r"
    );

    let mut rdr = Reader::from_reader(&data[..]);
    let got: Vec<City> = rdr.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(got, cities);
}

#[test]
fn serde_without_headers() {
    let mut rdr =
        ReaderBuilder::new().has_headers(false).from_text("x,1\ry,2\r");
    let got: Vec<(String, i32)> =
        rdr.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(got, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
}

#[test]
fn serde_error_has_row_position() {
    let mut rdr = Reader::from_text("n\r1\rx\r");
    let results: Vec<streamcsv::Result<(i32,)>> = rdr.deserialize().collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &(1,));
    match results[1] {
        Err(Error::Deserialize { ref pos, ref err }) => {
            assert_eq!(pos.map(|p| p.row()), Some(2));
            assert_eq!(err.field(), Some(0));
        }
        ref res => panic!("expected deserialize error, got {:?}", res),
    }
}
