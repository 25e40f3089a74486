use crate::model::vector3::Vector3;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io;

/// Bytes taken by the x, y, z doubles that open every record.
pub const POSITION_SIZE: usize = 24;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
	U8,
	I8,
	U16,
	I16,
	U32,
	I32,
	U64,
	I64,
	F32,
	F64,
}

impl ValueKind {
	pub fn size(self) -> usize {
		match self {
			ValueKind::U8 | ValueKind::I8 => 1,
			ValueKind::U16 | ValueKind::I16 => 2,
			ValueKind::U32 | ValueKind::I32 | ValueKind::F32 => 4,
			ValueKind::U64 | ValueKind::I64 | ValueKind::F64 => 8,
		}
	}

	pub fn read_f64(self, buf: &[u8]) -> f64 {
		match self {
			ValueKind::U8 => f64::from(buf[0]),
			ValueKind::I8 => f64::from(buf[0] as i8),
			ValueKind::U16 => f64::from(LittleEndian::read_u16(buf)),
			ValueKind::I16 => f64::from(LittleEndian::read_i16(buf)),
			ValueKind::U32 => f64::from(LittleEndian::read_u32(buf)),
			ValueKind::I32 => f64::from(LittleEndian::read_i32(buf)),
			ValueKind::U64 => LittleEndian::read_u64(buf) as f64,
			ValueKind::I64 => LittleEndian::read_i64(buf) as f64,
			ValueKind::F32 => f64::from(LittleEndian::read_f32(buf)),
			ValueKind::F64 => LittleEndian::read_f64(buf),
		}
	}

	/// Appends `value` in this kind's encoding. Integer kinds saturate.
	pub fn write_f64(self, out: &mut Vec<u8>, value: f64) -> io::Result<()> {
		match self {
			ValueKind::U8 => out.write_u8(value as u8),
			ValueKind::I8 => out.write_i8(value as i8),
			ValueKind::U16 => out.write_u16::<LittleEndian>(value as u16),
			ValueKind::I16 => out.write_i16::<LittleEndian>(value as i16),
			ValueKind::U32 => out.write_u32::<LittleEndian>(value as u32),
			ValueKind::I32 => out.write_i32::<LittleEndian>(value as i32),
			ValueKind::U64 => out.write_u64::<LittleEndian>(value as u64),
			ValueKind::I64 => out.write_i64::<LittleEndian>(value as i64),
			ValueKind::F32 => out.write_f32::<LittleEndian>(value as f32),
			ValueKind::F64 => out.write_f64::<LittleEndian>(value),
		}
	}
}

/// A named per-point attribute stored after the position.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldDef {
	pub name: String,
	pub kind: ValueKind,
}

impl FieldDef {
	pub fn new(name: impl Into<String>, kind: ValueKind) -> FieldDef {
		FieldDef {
			name: name.into(),
			kind,
		}
	}
}

/// Byte layout of one record: position followed by the attributes in
/// schema order.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLayout {
	fields: Vec<FieldDef>,
	offsets: Vec<usize>,
	record_len: usize,
}

impl PointLayout {
	pub fn new(fields: Vec<FieldDef>) -> PointLayout {
		let mut offsets = Vec::with_capacity(fields.len());
		let mut offset = POSITION_SIZE;
		for field in &fields {
			offsets.push(offset);
			offset += field.kind.size();
		}

		PointLayout {
			fields,
			offsets,
			record_len: offset,
		}
	}

	pub fn record_len(&self) -> usize {
		self.record_len
	}

	pub fn fields(&self) -> &[FieldDef] {
		&self.fields
	}

	/// Kind and byte offset of the attribute called `name`.
	pub fn get(&self, name: &str) -> Option<(ValueKind, usize)> {
		self.fields
			.iter()
			.position(|field| field.name == name)
			.map(|index| (self.fields[index].kind, self.offsets[index]))
	}

	pub fn has(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Appends one record. `values` follow the schema order and are
	/// converted to each attribute's kind.
	pub fn encode(&self, out: &mut Vec<u8>, position: &Vector3, values: &[f64]) -> io::Result<()> {
		if values.len() != self.fields.len() {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!(
					"expected {} attribute values, got {}",
					self.fields.len(),
					values.len()
				),
			));
		}
		out.write_f64::<LittleEndian>(position.x)?;
		out.write_f64::<LittleEndian>(position.y)?;
		out.write_f64::<LittleEndian>(position.z)?;
		for (field, value) in self.fields.iter().zip(values) {
			field.kind.write_f64(out, *value)?;
		}
		Ok(())
	}
}
