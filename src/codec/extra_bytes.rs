//! Named per-point attributes stored in the ExtraBytes of LAS records.
//!
//! The layout is described by `LASF_Spec` VLR 4: one 192-byte descriptor
//! per attribute, attributes packed in descriptor order.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::model::attributes::ValueKind;

pub const USER_ID: &str = "LASF_Spec";
pub const RECORD_ID: u16 = 4;
pub const DESCRIPTOR_LEN: usize = 192;

const NAME: std::ops::Range<usize> = 4..36;
const SCALE_OFFSET: usize = 112;
const OFFSET_OFFSET: usize = 136;
const SCALE_BIT: u8 = 1 << 3;
const OFFSET_BIT: u8 = 1 << 4;

#[derive(Clone, Debug, PartialEq)]
pub struct ExtraField {
	pub name: String,
	pub kind: ValueKind,
	/// Byte offset inside a point's extra bytes.
	pub offset: usize,
	pub scale: f64,
	pub add: f64,
}

impl ExtraField {
	/// Decoded value for one point, NaN when the bytes are short.
	pub fn value(&self, extra_bytes: &[u8]) -> f64 {
		match extra_bytes.get(self.offset..self.offset + self.kind.size()) {
			Some(bytes) => self.kind.read_f64(bytes) * self.scale + self.add,
			None => f64::NAN,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtraBytes {
	fields: Vec<ExtraField>,
}

impl ExtraBytes {
	/// Reads every ExtraBytes descriptor found in `vlrs`.
	pub fn from_vlrs<'a, I>(vlrs: I) -> ExtraBytes
	where
		I: IntoIterator<Item = &'a las::Vlr>,
	{
		let mut fields = Vec::new();
		let mut offset = 0;
		for vlr in vlrs {
			if vlr.user_id.trim_end_matches('\0') != USER_ID || vlr.record_id != RECORD_ID {
				continue;
			}
			for descriptor in vlr.data.chunks_exact(DESCRIPTOR_LEN) {
				let name = field_name(&descriptor[NAME]);
				let data_type = descriptor[2];
				let options = descriptor[3];
				let Some(kind) = value_kind(data_type) else {
					let size = opaque_size(data_type, options);
					warn!("skipping extra bytes field '{}' of type {}", name, data_type);
					offset += size;
					continue;
				};
				let scale = if options & SCALE_BIT != 0 {
					LittleEndian::read_f64(&descriptor[SCALE_OFFSET..SCALE_OFFSET + 8])
				} else {
					1.0
				};
				let add = if options & OFFSET_BIT != 0 {
					LittleEndian::read_f64(&descriptor[OFFSET_OFFSET..OFFSET_OFFSET + 8])
				} else {
					0.0
				};
				fields.push(ExtraField {
					name,
					kind,
					offset,
					scale,
					add,
				});
				offset += kind.size();
			}
		}
		ExtraBytes { fields }
	}

	pub fn get(&self, name: &str) -> Option<&ExtraField> {
		self.fields.iter().find(|field| field.name == name)
	}

	pub fn fields(&self) -> &[ExtraField] {
		&self.fields
	}
}

fn field_name(bytes: &[u8]) -> String {
	let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
	String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn value_kind(data_type: u8) -> Option<ValueKind> {
	Some(match data_type {
		1 => ValueKind::U8,
		2 => ValueKind::I8,
		3 => ValueKind::U16,
		4 => ValueKind::I16,
		5 => ValueKind::U32,
		6 => ValueKind::I32,
		7 => ValueKind::U64,
		8 => ValueKind::I64,
		9 => ValueKind::F32,
		10 => ValueKind::F64,
		_ => return None,
	})
}

/// Width of a field that is not exposed: undocumented bytes (type 0 keeps
/// its width in `options`) and the deprecated 2- and 3-element arrays.
fn opaque_size(data_type: u8, options: u8) -> usize {
	match data_type {
		0 => usize::from(options),
		11..=30 => {
			let base = (data_type - 11) % 10 + 1;
			let count = if data_type <= 20 { 2 } else { 3 };
			value_kind(base).map_or(0, |kind| kind.size() * count)
		}
		_ => 0,
	}
}

/// Descriptor VLR for `fields`, unscaled.
#[cfg(test)]
pub(crate) fn vlr(fields: &[(&str, ValueKind)]) -> las::Vlr {
	let mut data = Vec::with_capacity(fields.len() * DESCRIPTOR_LEN);
	for (name, kind) in fields {
		let mut descriptor = [0u8; DESCRIPTOR_LEN];
		descriptor[2] = data_type(*kind);
		let name = name.as_bytes();
		let len = name.len().min(NAME.len());
		descriptor[NAME.start..NAME.start + len].copy_from_slice(&name[..len]);
		data.extend_from_slice(&descriptor);
	}
	las::Vlr {
		user_id: USER_ID.to_string(),
		record_id: RECORD_ID,
		description: "extra bytes".to_string(),
		data,
	}
}

#[cfg(test)]
fn data_type(kind: ValueKind) -> u8 {
	match kind {
		ValueKind::U8 => 1,
		ValueKind::I8 => 2,
		ValueKind::U16 => 3,
		ValueKind::I16 => 4,
		ValueKind::U32 => 5,
		ValueKind::I32 => 6,
		ValueKind::U64 => 7,
		ValueKind::I64 => 8,
		ValueKind::F32 => 9,
		ValueKind::F64 => 10,
	}
}
