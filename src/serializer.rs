use std::fmt;
use std::io;

use serde::ser::{
    Error as SerdeError, Serialize, SerializeMap, SerializeSeq,
    SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

use crate::error::{Error, Result};
use crate::writer::Writer;

/// Serialize the given value as the fields of one row.
///
/// The row terminator is not written.
pub(crate) fn serialize<S: ?Sized + Serialize, W: io::Write>(
    wtr: &mut Writer<W>,
    value: &S,
) -> Result<()> {
    value.serialize(&mut SeRow { wtr, header: false, depth: 0 })
}

/// Serialize the field names of the given struct as the fields of one row.
pub(crate) fn serialize_header<S: ?Sized + Serialize, W: io::Write>(
    wtr: &mut Writer<W>,
    value: &S,
) -> Result<()> {
    value.serialize(&mut SeRow { wtr, header: true, depth: 0 })
}

/// A serializer for a single row.
///
/// At most one level of container is allowed: the row itself. In header
/// mode, only a struct is allowed, and its field names are written instead of
/// its values.
struct SeRow<'w, W: 'w + io::Write> {
    wtr: &'w mut Writer<W>,
    header: bool,
    depth: usize,
}

impl<'w, W: io::Write> SeRow<'w, W> {
    fn field(&mut self, field: &str) -> Result<()> {
        if self.header {
            return Err(Error::custom(
                "cannot write a header row for a value that is not a struct",
            ));
        }
        self.wtr.write_field(field);
        Ok(())
    }

    fn enter(&mut self, is_struct: bool) -> Result<()> {
        if self.depth > 0 {
            return Err(Error::custom(
                "cannot serialize a container nested inside a row",
            ));
        }
        if self.header && !is_struct {
            return Err(Error::custom(
                "cannot write a header row for a value that is not a struct",
            ));
        }
        self.depth += 1;
        Ok(())
    }
}

impl<'a, 'w, W: io::Write> Serializer for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.field(if v { "true" } else { "false" })
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.field(itoa::Buffer::new().format(v))
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.field(ryu::Buffer::new().format(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.field(ryu::Buffer::new().format(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.field(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, value: &str) -> Result<()> {
        self.field(value)
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<()> {
        self.field(&String::from_utf8_lossy(value))
    }

    fn serialize_none(self) -> Result<()> {
        self.field("")
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.field("")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<()> {
        self.field(name)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.field(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self> {
        self.enter(false)?;
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self> {
        self.enter(false)?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self> {
        self.enter(false)?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Err(Error::custom("serializing enum tuple variants is not supported"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self> {
        Err(Error::custom("serializing maps is not supported"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self> {
        self.enter(true)?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self> {
        Err(Error::custom("serializing enum struct variants is not supported"))
    }
}

impl<'a, 'w, W: io::Write> SerializeSeq for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'w, W: io::Write> SerializeTuple for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'w, W: io::Write> SerializeTupleStruct for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'w, W: io::Write> SerializeTupleVariant for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _value: &T,
    ) -> Result<()> {
        unreachable!()
    }

    fn end(self) -> Result<()> {
        unreachable!()
    }
}

impl<'a, 'w, W: io::Write> SerializeMap for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _key: &T) -> Result<()> {
        unreachable!()
    }

    fn serialize_value<T: ?Sized + Serialize>(
        &mut self,
        _value: &T,
    ) -> Result<()> {
        unreachable!()
    }

    fn end(self) -> Result<()> {
        unreachable!()
    }
}

impl<'a, 'w, W: io::Write> SerializeStruct for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        if self.header {
            self.wtr.write_field(key);
            Ok(())
        } else {
            value.serialize(&mut **self)
        }
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'w, W: io::Write> SerializeStructVariant for &'a mut SeRow<'w, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<()> {
        unreachable!()
    }

    fn end(self) -> Result<()> {
        unreachable!()
    }
}

impl SerdeError for Error {
    fn custom<T: fmt::Display>(msg: T) -> Error {
        Error::Serialize(msg.to_string())
    }
}
