//! Flat record to URL query string encoding
//!
//! Records are read through serde's data model: any `Serialize` type whose
//! shape is a struct with named fields can be encoded. Field keys are the
//! serialized field names, so `#[serde(rename = "...")]` selects an explicit
//! key. Values are written in their natural textual form and must be scalar.
//!
//! ```
//! use courier_core::query::to_query_string;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Search {
//!     name: String,
//!     age: u32,
//! }
//!
//! let query = to_query_string(&Search { name: "john".into(), age: 25 }).unwrap();
//! assert_eq!(query, "age=25&name=john");
//! ```

use serde::ser::{Impossible, Serialize, SerializeStruct, Serializer};
use url::form_urlencoded;

use crate::error::{Error, Result};

type Pairs = Vec<(String, String)>;

/// Encode a record as `key1=value1&key2=value2`
///
/// Pairs are ordered by key (fields sharing a key keep their declaration
/// order) and form-urlencoded. There is no leading `?`.
///
/// Fails with [`Error::InvalidInputKind`] when `data` is not a record and
/// with [`Error::UnsupportedValue`] when a field holds a nested value.
pub fn to_query_string<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let mut pairs = data.serialize(RecordSerializer)?;
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish())
}

/// Accepts only struct-shaped values and collects their fields
struct RecordSerializer;

macro_rules! reject_input {
    ($($method:ident($($arg:ty),*) => $kind:expr;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Pairs> {
                Err(Error::InvalidInputKind($kind))
            }
        )*
    };
}

impl Serializer for RecordSerializer {
    type Ok = Pairs;
    type Error = Error;

    type SerializeSeq = Impossible<Pairs, Error>;
    type SerializeTuple = Impossible<Pairs, Error>;
    type SerializeTupleStruct = Impossible<Pairs, Error>;
    type SerializeTupleVariant = Impossible<Pairs, Error>;
    type SerializeMap = Impossible<Pairs, Error>;
    type SerializeStruct = RecordFields;
    type SerializeStructVariant = Impossible<Pairs, Error>;

    reject_input! {
        serialize_bool(bool) => "bool";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_i128(i128) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_u128(u128) => "integer";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_char(char) => "char";
        serialize_str(&str) => "string";
        serialize_bytes(&[u8]) => "bytes";
        serialize_none() => "none";
        serialize_unit() => "unit";
        serialize_unit_variant(&'static str, u32, &'static str) => "enum";
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Pairs> {
        value.serialize(self)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Pairs> {
        Ok(Vec::new())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Pairs> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Pairs> {
        Err(Error::InvalidInputKind("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::InvalidInputKind("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::InvalidInputKind("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::InvalidInputKind("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::InvalidInputKind("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::InvalidInputKind("map"))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(RecordFields {
            pairs: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::InvalidInputKind("enum"))
    }
}

struct RecordFields {
    pairs: Pairs,
}

impl SerializeStruct for RecordFields {
    type Ok = Pairs;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let value = value.serialize(FieldSerializer { field: key })?;
        self.pairs.push((key.to_string(), value));
        Ok(())
    }

    fn end(self) -> Result<Pairs> {
        Ok(self.pairs)
    }
}

/// Renders a single scalar field value as text
struct FieldSerializer {
    field: &'static str,
}

impl FieldSerializer {
    fn unsupported(&self, kind: &'static str) -> Error {
        Error::UnsupportedValue {
            field: self.field.to_string(),
            kind,
        }
    }
}

macro_rules! display_value {
    ($($method:ident($ty:ty);)*) => {
        $(
            fn $method(self, value: $ty) -> Result<String> {
                Ok(value.to_string())
            }
        )*
    };
}

impl Serializer for FieldSerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    display_value! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_i128(i128);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_u128(u128);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
    }

    fn serialize_bytes(self, _value: &[u8]) -> Result<String> {
        Err(self.unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<String> {
        Ok(String::new())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Ok(String::new())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Ok(String::new())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(self.unsupported("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.unsupported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.unsupported("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.unsupported("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.unsupported("enum"))
    }
}
