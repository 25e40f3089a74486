//! LAS and LAZ tiles through the `las` crate.
//!
//! Points are forwarded as decoded `las::Point`s, which carry every standard
//! field plus their raw extra bytes, so the writer reproduces each record.
//! Attributes are looked up by ExtraBytes name first, then among the
//! standard LAS dimensions.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use las::{Read as LasRead, Write as LasWrite};

use crate::codec::extra_bytes::ExtraBytes;
use crate::codec::{ChunkRead, ChunkWrite, PointBatch, PointCodec};
use crate::error::{Error, Result};
use crate::model::bounds::BoundingBox;
use crate::model::options::Format;
use crate::model::vector3::Vector3;

const PROJECTION_USER_ID: &str = "LASF_Projection";
const GEO_KEY_DIRECTORY: u16 = 34735;
const PROJECTED_CS_KEY: u16 = 3072;
const GEOGRAPHIC_KEY: u16 = 2048;
const USER_DEFINED: u16 = 32767;

const LASZIP_USER_ID: &str = "laszip encoded";
const LASZIP_RECORD_ID: u16 = 22204;

const STANDARD_DIMENSIONS: [&str; 7] = [
	"classification",
	"intensity",
	"return_number",
	"number_of_returns",
	"user_data",
	"point_source_id",
	"gps_time",
];

fn standard_value(point: &las::Point, name: &str) -> Option<f64> {
	Some(match name {
		"classification" => f64::from(u8::from(point.classification)),
		"intensity" => f64::from(point.intensity),
		"return_number" => f64::from(point.return_number),
		"number_of_returns" => f64::from(point.number_of_returns),
		"user_data" => f64::from(point.user_data),
		"point_source_id" => f64::from(point.point_source_id),
		"gps_time" => point.gps_time.unwrap_or(f64::NAN),
		_ => return None,
	})
}

/// EPSG code from the GeoTIFF key directory, projected CRS first.
pub fn epsg_from_vlrs<'a, I>(vlrs: I) -> Option<u32>
where
	I: IntoIterator<Item = &'a las::Vlr>,
{
	let directory = vlrs.into_iter().find(|vlr| {
		vlr.user_id.trim_end_matches('\0') == PROJECTION_USER_ID
			&& vlr.record_id == GEO_KEY_DIRECTORY
	})?;
	let words: Vec<u16> = directory
		.data
		.chunks_exact(2)
		.map(LittleEndian::read_u16)
		.collect();
	let key_count = usize::from(*words.get(3)?);
	let keys: Vec<&[u16]> = words.get(4..)?.chunks_exact(4).take(key_count).collect();

	let lookup = |id: u16| {
		keys.iter()
			.find(|key| key[0] == id && key[1] == 0)
			.map(|key| key[3])
			.filter(|code| *code != 0 && *code != USER_DEFINED)
	};
	lookup(PROJECTED_CS_KEY)
		.or_else(|| lookup(GEOGRAPHIC_KEY))
		.map(u32::from)
}

#[derive(Clone, Debug)]
pub struct LasChunk {
	points: Vec<las::Point>,
	extra: Arc<ExtraBytes>,
}

impl LasChunk {
	pub fn points(&self) -> &[las::Point] {
		&self.points
	}

	pub fn positions(&self) -> Vec<Vector3> {
		self.points
			.iter()
			.map(|p| Vector3::new(p.x, p.y, p.z))
			.collect()
	}
}

impl PointBatch for LasChunk {
	fn len(&self) -> usize {
		self.points.len()
	}

	fn bounds(&self) -> Option<BoundingBox> {
		BoundingBox::from_points(&self.positions())
	}

	fn select(&self, mask: &[bool]) -> LasChunk {
		debug_assert_eq!(mask.len(), self.points.len());
		let points = self
			.points
			.iter()
			.zip(mask)
			.filter(|(_, keep)| **keep)
			.map(|(point, _)| point.clone())
			.collect();
		LasChunk {
			points,
			extra: Arc::clone(&self.extra),
		}
	}

	fn attribute_values(&self, name: &str) -> Option<Vec<f64>> {
		if let Some(field) = self.extra.get(name) {
			return Some(self.points.iter().map(|p| field.value(&p.extra_bytes)).collect());
		}
		if !STANDARD_DIMENSIONS.contains(&name) {
			return None;
		}
		self.points
			.iter()
			.map(|p| standard_value(p, name))
			.collect()
	}
}

pub struct LasReader {
	inner: las::Reader<'static>,
	extra: Arc<ExtraBytes>,
	epsg: Option<u32>,
}

impl LasReader {
	pub fn open(path: &Path) -> Result<LasReader> {
		if !path.is_file() {
			return Err(Error::NotFound(path.to_path_buf()));
		}
		let inner = las::Reader::from_path(path)?;
		let header = LasRead::header(&inner);
		let extra = ExtraBytes::from_vlrs(header.vlrs().iter().chain(header.evlrs()));
		let epsg = epsg_from_vlrs(header.vlrs().iter().chain(header.evlrs()));

		Ok(LasReader {
			inner,
			extra: Arc::new(extra),
			epsg,
		})
	}
}

impl ChunkRead for LasReader {
	type Header = las::Header;
	type Chunk = LasChunk;

	fn header(&self) -> &las::Header {
		LasRead::header(&self.inner)
	}

	fn has_attribute(&self, name: &str) -> bool {
		self.extra.get(name).is_some() || STANDARD_DIMENSIONS.contains(&name)
	}

	fn crs_epsg(&self) -> Option<u32> {
		self.epsg
	}

	fn point_count(&self) -> u64 {
		self.header().number_of_points()
	}

	fn read_chunk(&mut self, max_points: usize) -> Result<Option<LasChunk>> {
		let mut points = Vec::new();
		while points.len() < max_points {
			match LasRead::read(&mut self.inner) {
				Some(point) => points.push(point?),
				None => break,
			}
		}
		if points.is_empty() {
			return Ok(None);
		}

		Ok(Some(LasChunk {
			points,
			extra: Arc::clone(&self.extra),
		}))
	}
}

pub struct LasWriter {
	inner: las::Writer<BufWriter<File>>,
	path: PathBuf,
}

impl ChunkWrite for LasWriter {
	type Chunk = LasChunk;

	fn write_chunk(&mut self, chunk: &LasChunk) -> Result<()> {
		for point in &chunk.points {
			LasWrite::write(&mut self.inner, point.clone())?;
		}
		Ok(())
	}

	fn finish(mut self) -> Result<u64> {
		self.inner.close()?;
		Ok(fs::metadata(&self.path)?.len())
	}
}

/// LAS (`compressed == false`) or LAZ output. Either kind of input is read.
#[derive(Clone, Copy, Debug)]
pub struct LasCodec {
	compressed: bool,
}

impl LasCodec {
	pub fn las() -> LasCodec {
		LasCodec { compressed: false }
	}

	pub fn laz() -> LasCodec {
		LasCodec { compressed: true }
	}

	/// The donor header, switched to this codec's compression when needed.
	fn output_header(&self, donor: &las::Header) -> Result<las::Header> {
		if donor.point_format().is_compressed == self.compressed {
			return Ok(donor.clone());
		}
		let mut builder = las::Builder::new(donor.clone().into_raw()?)?;
		builder.vlrs = donor
			.vlrs()
			.iter()
			.filter(|vlr| {
				!(vlr.user_id.trim_end_matches('\0') == LASZIP_USER_ID
					&& vlr.record_id == LASZIP_RECORD_ID)
			})
			.cloned()
			.collect();
		builder.evlrs = donor.evlrs().clone();
		builder.point_format.is_compressed = self.compressed;
		Ok(builder.into_header()?)
	}
}

impl PointCodec for LasCodec {
	type Header = las::Header;
	type Chunk = LasChunk;
	type Reader = LasReader;
	type Writer = LasWriter;

	fn format(&self) -> Format {
		if self.compressed {
			Format::Laz
		} else {
			Format::Las
		}
	}

	fn open_read(&self, path: &Path) -> Result<LasReader> {
		LasReader::open(path)
	}

	fn open_write(&self, path: &Path, donor: &las::Header) -> Result<LasWriter> {
		let header = self.output_header(donor)?;
		Ok(LasWriter {
			inner: las::Writer::from_path(path, header)?,
			path: path.to_path_buf(),
		})
	}
}

/// Builders for labelled LAS/LAZ tiles used across the test modules.
#[cfg(test)]
pub(crate) mod testing {
	use super::*;
	use crate::codec::extra_bytes;
	use crate::model::attributes::ValueKind;

	/// (x, y, z, semantic, instance)
	pub type Row = (f64, f64, f64, f64, f64);

	pub fn geo_keys(epsg: u16) -> las::Vlr {
		let words = [1u16, 1, 0, 1, PROJECTED_CS_KEY, 0, 1, epsg];
		let mut data = vec![0u8; words.len() * 2];
		LittleEndian::write_u16_into(&words, &mut data);
		las::Vlr {
			user_id: PROJECTION_USER_ID.to_string(),
			record_id: GEO_KEY_DIRECTORY,
			description: "GeoKeyDirectoryTag".to_string(),
			data,
		}
	}

	/// Header with `semantic_pred` (u8), optional `instance_pred` (i32) and
	/// `score` (f32) extra bytes.
	pub fn header(with_instance: bool, compressed: bool) -> las::Header {
		let mut fields = vec![("semantic_pred", ValueKind::U8)];
		if with_instance {
			fields.push(("instance_pred", ValueKind::I32));
		}
		fields.push(("score", ValueKind::F32));

		let mut builder = las::Builder::from((1, 2));
		builder.point_format.extra_bytes = fields.iter().map(|(_, k)| k.size() as u16).sum();
		builder.point_format.is_compressed = compressed;
		builder.vlrs.push(extra_bytes::vlr(&fields));
		builder.vlrs.push(geo_keys(3067));
		builder.into_header().unwrap()
	}

	pub fn point(row: &Row, with_instance: bool) -> las::Point {
		let (x, y, z, semantic, instance) = *row;
		let mut extra_bytes = vec![semantic as u8];
		if with_instance {
			extra_bytes.extend_from_slice(&(instance as i32).to_le_bytes());
		}
		extra_bytes.extend_from_slice(&0.9f32.to_le_bytes());
		las::Point {
			x,
			y,
			z,
			intensity: 100,
			extra_bytes,
			..Default::default()
		}
	}

	pub fn write_tile(path: &Path, rows: &[Row], with_instance: bool, compressed: bool) {
		let header = header(with_instance, compressed);
		let mut writer = las::Writer::from_path(path, header).unwrap();
		for row in rows {
			LasWrite::write(&mut writer, point(row, with_instance)).unwrap();
		}
		writer.close().unwrap();
	}

	pub fn read_points(path: &Path) -> Vec<las::Point> {
		let mut reader = LasReader::open(path).unwrap();
		let mut points = Vec::new();
		while let Some(chunk) = reader.read_chunk(3).unwrap() {
			points.extend_from_slice(chunk.points());
		}
		points
	}
}
