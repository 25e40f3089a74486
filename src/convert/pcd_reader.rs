use std::path::Path;

use pcd_rs::{DynReader, DynRecord, Field, ValueKind as PcdKind};
use tracing::{info, warn};

use crate::convert::{ChunkedWriter, ConvertOptions};
use crate::error::{Error, Result};
use crate::model::attributes::{FieldDef, ValueKind};
use crate::model::header::CloudHeader;
use crate::model::vector3::Vector3;

fn pcd_error(err: pcd_rs::anyhow::Error) -> Error {
	Error::invalid_data(format!("{:#}", err))
}

fn kind(kind: &PcdKind) -> ValueKind {
	match kind {
		PcdKind::U8 => ValueKind::U8,
		PcdKind::U16 => ValueKind::U16,
		PcdKind::U32 => ValueKind::U32,
		PcdKind::I8 => ValueKind::I8,
		PcdKind::I16 => ValueKind::I16,
		PcdKind::I32 => ValueKind::I32,
		PcdKind::F32 => ValueKind::F32,
		PcdKind::F64 => ValueKind::F64,
	}
}

fn first_value(field: &Field) -> Option<f64> {
	match field {
		Field::I8(v) => v.first().map(|x| f64::from(*x)),
		Field::I16(v) => v.first().map(|x| f64::from(*x)),
		Field::I32(v) => v.first().map(|x| f64::from(*x)),
		Field::U8(v) => v.first().map(|x| f64::from(*x)),
		Field::U16(v) => v.first().map(|x| f64::from(*x)),
		Field::U32(v) => v.first().map(|x| f64::from(*x)),
		Field::F32(v) => v.first().map(|x| f64::from(*x)),
		Field::F64(v) => v.first().copied(),
	}
}

/// Converts a PCD file into an SPC tile and returns the number of points.
///
/// `x`, `y`, `z` become the position; every other single-valued field is
/// kept as an attribute of the same type.
pub fn from_pcd(source: &Path, destination: &Path, options: &ConvertOptions) -> Result<u64> {
	if !source.is_file() {
		return Err(Error::NotFound(source.to_path_buf()));
	}
	let reader = DynReader::open(source).map_err(pcd_error)?;

	let mut position = [None; 3];
	let mut attributes: Vec<(usize, FieldDef)> = Vec::new();
	for (index, def) in reader.meta().field_defs.iter().enumerate() {
		match def.name.as_str() {
			"x" => position[0] = Some(index),
			"y" => position[1] = Some(index),
			"z" => position[2] = Some(index),
			name if def.count == 1 => {
				attributes.push((index, FieldDef::new(name, kind(&def.kind))))
			}
			name => warn!("skipping PCD field '{}' with {} elements", name, def.count),
		}
	}
	let [Some(xi), Some(yi), Some(zi)] = position else {
		return Err(Error::configuration(format!(
			"{} has no x, y, z fields",
			source.display()
		)));
	};

	let header = CloudHeader::new(attributes.iter().map(|(_, def)| def.clone()).collect())
		.with_epsg(options.epsg);
	let mut writer = ChunkedWriter::create(destination, &header, options.chunk_size)?;

	let mut values = vec![0.0; attributes.len()];
	for record in reader {
		let DynRecord(fields) = record.map_err(pcd_error)?;
		let value = |index: usize| -> Result<f64> {
			fields
				.get(index)
				.and_then(first_value)
				.ok_or_else(|| {
					Error::invalid_data(format!("PCD record is missing field {}", index))
				})
		};
		let point = Vector3::new(value(xi)?, value(yi)?, value(zi)?);
		for (slot, (index, _)) in values.iter_mut().zip(&attributes) {
			*slot = value(*index)?;
		}
		writer.push(&point, &values)?;
	}

	let written = writer.finish()?;
	info!(
		"converted {} points from {} to {}",
		written,
		source.display(),
		destination.display()
	);
	Ok(written)
}
