use csv::{ReaderBuilder, Trim};
use std::path::Path;
use tracing::info;

use crate::convert::{ChunkedWriter, ConvertOptions};
use crate::error::{Error, Result};
use crate::model::attributes::{FieldDef, ValueKind};
use crate::model::header::CloudHeader;
use crate::model::vector3::Vector3;

struct Column {
	index: usize,
	name: String,
	integer: bool,
}

/// Converts a headed CSV file with `x`, `y`, `z` columns into an SPC tile and
/// returns the number of points.
pub fn from_csv(source: &Path, destination: &Path, options: &ConvertOptions) -> Result<u64> {
	if !source.is_file() {
		return Err(Error::NotFound(source.to_path_buf()));
	}
	let mut rdr = ReaderBuilder::new().trim(Trim::All).from_path(source)?;
	let headers = rdr.headers()?.clone();

	let find = |name: &str| {
		headers
			.iter()
			.position(|h| h == name)
			.ok_or_else(|| {
				Error::configuration(format!("{} has no '{}' column", source.display(), name))
			})
	};
	let (xi, yi, zi) = (find("x")?, find("y")?, find("z")?);

	let columns: Vec<Column> = headers
		.iter()
		.enumerate()
		.filter(|(_, name)| !matches!(*name, "x" | "y" | "z"))
		.map(|(index, name)| Column {
			index,
			name: name.to_string(),
			integer: options.integer_columns.iter().any(|c| c == name),
		})
		.collect();
	let schema = columns
		.iter()
		.map(|c| {
			let kind = if c.integer { ValueKind::I32 } else { ValueKind::F64 };
			FieldDef::new(c.name.as_str(), kind)
		})
		.collect();
	let header = CloudHeader::new(schema).with_epsg(options.epsg);
	let mut writer = ChunkedWriter::create(destination, &header, options.chunk_size)?;

	let mut values = vec![0.0; columns.len()];
	for (line, result) in rdr.records().enumerate() {
		let record = result?;
		// header is line 1
		let line = line + 2;
		let number = |index: usize| -> Result<f64> {
			let cell = record.get(index).unwrap_or("");
			cell.parse::<f64>().map_err(|_| {
				Error::configuration(format!(
					"line {}: '{}' in column '{}' is not a number",
					line, cell, &headers[index]
				))
			})
		};
		let point = Vector3::new(number(xi)?, number(yi)?, number(zi)?);
		for (slot, column) in values.iter_mut().zip(&columns) {
			let cell = record.get(column.index).unwrap_or("");
			*slot = if column.integer {
				cell.parse::<i32>().map(f64::from).map_err(|_| {
					Error::configuration(format!(
						"line {}: '{}' in column '{}' is not an integer",
						line, cell, column.name
					))
				})?
			} else if cell.is_empty() {
				f64::NAN
			} else {
				number(column.index)?
			};
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
