//! Runtime descriptions of fixed-size lump records.
//!
//! A [`RecordSchema`] is an ordered list of scalar slots. A slot repeated more than once forms a
//! composite field (a vector, a min/max pair, a flag set), optionally with named parts so that
//! `"origin.z"` can be addressed directly. Schemas are `static` and compared by address.

use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl Scalar {
    pub const fn width(self) -> usize {
        match self {
            Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
        }
    }

    fn decode(self, b: &[u8]) -> Value {
        match self {
            Scalar::I8 => Value::Int(b[0] as i8 as i64),
            Scalar::U8 => Value::Int(b[0] as i64),
            Scalar::I16 => Value::Int(i16::from_le_bytes([b[0], b[1]]) as i64),
            Scalar::U16 => Value::Int(u16::from_le_bytes([b[0], b[1]]) as i64),
            Scalar::I32 => Value::Int(i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64),
            Scalar::U32 => Value::Int(u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64),
            Scalar::F32 => Value::Float(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Field {
    pub name: &'static str,
    pub scalar: Scalar,
    pub count: usize,
    /// Names for each repeated slot, empty for plain arrays
    pub parts: &'static [&'static str],
}

impl Field {
    pub const fn scalar(name: &'static str, scalar: Scalar) -> Self {
        Self {
            name,
            scalar,
            count: 1,
            parts: &[],
        }
    }

    pub const fn array(name: &'static str, scalar: Scalar, count: usize) -> Self {
        Self {
            name,
            scalar,
            count,
            parts: &[],
        }
    }

    pub const fn group(name: &'static str, scalar: Scalar, parts: &'static [&'static str]) -> Self {
        Self {
            name,
            scalar,
            count: parts.len(),
            parts,
        }
    }

    pub const fn size(&self) -> usize {
        self.scalar.width() * self.count
    }
}

pub const XYZ: &[&str] = &["x", "y", "z"];
pub const MIN_MAX: &[&str] = &["min", "max"];
pub const RGBA: &[&str] = &["r", "g", "b", "a"];

#[derive(Debug)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl RecordSchema {
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, fields }
    }

    pub const fn size(&self) -> usize {
        let mut size = 0;
        let mut i = 0;
        while i < self.fields.len() {
            size += self.fields[i].size();
            i += 1;
        }
        size
    }

    /// Position of the field's first value in a decoded [`Record`].
    fn locate(&self, name: &str) -> Option<(usize, &Field)> {
        let mut first = 0;
        for field in self.fields {
            if field.name == name {
                return Some((first, field));
            }
            first += field.count;
        }
        None
    }

    /// `bytes` must hold at least [`RecordSchema::size`] bytes.
    pub fn decode(&'static self, bytes: &[u8]) -> Record {
        let mut values = Vec::with_capacity(self.fields.iter().map(|f| f.count).sum());
        let mut offset = 0;
        for field in self.fields {
            let width = field.scalar.width();
            for _ in 0..field.count {
                values.push(field.scalar.decode(&bytes[offset..offset + width]));
                offset += width;
            }
        }
        Record {
            schema: self,
            values,
        }
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
}

impl Value {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i),
            Value::Float(_) => None,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Value::Int(i) => i as f32,
            Value::Float(f) => f,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v.into())
            }
        })*
    };
}
value_from!(Int: i8, u8, i16, u16, i32, u32, i64);
value_from!(Float: f32);

/// One decoded record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    schema: &'static RecordSchema,
    values: Vec<Value>,
}

impl Record {
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Every slot, in layout order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// All slots of a field, e.g. the three floats of `"normal"`.
    pub fn field(&self, name: &str) -> Option<&[Value]> {
        let (first, field) = self.schema.locate(name)?;
        Some(&self.values[first..first + field.count])
    }

    /// A single slot, either `"dist"`, `"normal.z"` or `"allowed_verts.3"`.
    pub fn get(&self, path: &str) -> Option<Value> {
        let (name, part) = match path.split_once('.') {
            Some((name, part)) => (name, Some(part)),
            None => (path, None),
        };
        let (first, field) = self.schema.locate(name)?;
        let index = match part {
            None if field.count == 1 => 0,
            None => return None,
            Some(part) => match field.parts.iter().position(|p| *p == part) {
                Some(i) => i,
                None => part.parse::<usize>().ok().filter(|&i| i < field.count)?,
            },
        };
        Some(self.values[first + index])
    }

    pub fn matches(&self, predicates: &[(&str, Value)]) -> bool {
        predicates
            .iter()
            .all(|(path, value)| self.get(path) == Some(*value))
    }
}
