//! Streaming point-cloud codecs.
//!
//! Classification and merging only need three capabilities from a file
//! format: open a file for chunked reading, open a file for chunked writing
//! with a header taken from another file, and move chunks through them.
//! `LasCodec` handles LAS/LAZ tiles; `SpcCodec` is the native format that
//! PCD and CSV deliveries are converted into.

pub mod extra_bytes;
pub mod lidar;
pub mod reader;
pub mod writer;

use crate::error::Result;
use crate::model::bounds::BoundingBox;
use crate::model::header::SpcHeader;
use crate::model::options::Format;
use std::path::Path;

pub use lidar::{LasChunk, LasCodec, LasReader, LasWriter};
pub use reader::SpcReader;
pub use writer::SpcWriter;

pub const MAGIC: &[u8; 4] = b"SPC1";

/// A batch of consecutive points read from one file.
pub trait PointBatch: Sized {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn bounds(&self) -> Option<BoundingBox>;

	/// Points whose mask entry is set, in their original order and encoding.
	fn select(&self, mask: &[bool]) -> Self;

	/// Per-point values of the attribute called `name`, or `None` when the
	/// batch has no such attribute.
	fn attribute_values(&self, name: &str) -> Option<Vec<f64>>;
}

pub trait ChunkRead {
	type Header: Clone;
	type Chunk: PointBatch;

	fn header(&self) -> &Self::Header;

	fn has_attribute(&self, name: &str) -> bool;

	fn crs_epsg(&self) -> Option<u32>;

	/// Total number of points announced by the file.
	fn point_count(&self) -> u64;

	/// Next batch of at most `max_points` points, or `None` at end of file.
	fn read_chunk(&mut self, max_points: usize) -> Result<Option<Self::Chunk>>;
}

pub trait ChunkWrite {
	type Chunk: PointBatch;

	fn write_chunk(&mut self, chunk: &Self::Chunk) -> Result<()>;

	/// Flushes and closes the destination, returning its size in bytes.
	fn finish(self) -> Result<u64>
	where
		Self: Sized;
}

pub trait PointCodec {
	type Header: Clone;
	type Chunk: PointBatch;
	type Reader: ChunkRead<Header = Self::Header, Chunk = Self::Chunk>;
	type Writer: ChunkWrite<Chunk = Self::Chunk>;

	fn format(&self) -> Format;

	fn open_read(&self, path: &Path) -> Result<Self::Reader>;

	/// Creates (or truncates) `path` with a copy of `donor` as its header.
	fn open_write(&self, path: &Path, donor: &Self::Header) -> Result<Self::Writer>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SpcCodec;

impl PointCodec for SpcCodec {
	type Header = SpcHeader;
	type Chunk = crate::model::chunk::PointChunk;
	type Reader = SpcReader;
	type Writer = SpcWriter;

	fn format(&self) -> Format {
		Format::Spc
	}

	fn open_read(&self, path: &Path) -> Result<SpcReader> {
		SpcReader::open(path)
	}

	fn open_write(&self, path: &Path, donor: &SpcHeader) -> Result<SpcWriter> {
		SpcWriter::create(path, donor)
	}
}

/// Integer code of an attribute value. Only finite integral values qualify.
pub fn as_code(value: f64) -> Option<i64> {
	if value.is_finite() && value.fract() == 0.0 {
		Some(value as i64)
	} else {
		None
	}
}
