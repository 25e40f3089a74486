//! Conversion of labelled point clouds delivered as PCD or CSV into the
//! streaming format consumed by the classifier.

pub mod csv_reader;
pub mod pcd_reader;

use std::path::Path;
use std::sync::Arc;

use crate::codec::{ChunkWrite, SpcWriter};
use crate::error::Result;
use crate::model::attributes::PointLayout;
use crate::model::chunk::PointChunk;
use crate::model::header::{CloudHeader, SpcHeader};
use crate::model::options::DEFAULT_CHUNK_SIZE;
use crate::model::vector3::Vector3;

pub use csv_reader::from_csv;
pub use pcd_reader::from_pcd;

#[derive(Clone, Debug)]
pub struct ConvertOptions {
	pub epsg: Option<u32>,
	pub chunk_size: usize,
	/// CSV columns stored as `i32` instead of `f64`.
	pub integer_columns: Vec<String>,
}

impl Default for ConvertOptions {
	fn default() -> ConvertOptions {
		ConvertOptions {
			epsg: None,
			chunk_size: DEFAULT_CHUNK_SIZE,
			integer_columns: vec!["semantic_pred".to_string(), "instance_pred".to_string()],
		}
	}
}

/// Encodes points one at a time and hands them to the writer in chunks of
/// at most `chunk_size`.
struct ChunkedWriter {
	writer: SpcWriter,
	layout: Arc<PointLayout>,
	buffer: Vec<u8>,
	buffered: usize,
	chunk_size: usize,
	written: u64,
}

impl ChunkedWriter {
	fn create(path: &Path, header: &CloudHeader, chunk_size: usize) -> Result<ChunkedWriter> {
		Ok(ChunkedWriter {
			writer: SpcWriter::create(path, &SpcHeader::new(header.clone())?)?,
			layout: Arc::new(header.layout()),
			buffer: Vec::new(),
			buffered: 0,
			chunk_size: chunk_size.max(1),
			written: 0,
		})
	}

	fn push(&mut self, position: &Vector3, values: &[f64]) -> Result<()> {
		self.layout.encode(&mut self.buffer, position, values)?;
		self.buffered += 1;
		if self.buffered >= self.chunk_size {
			self.flush()?;
		}
		Ok(())
	}

	fn flush(&mut self) -> Result<()> {
		if self.buffered == 0 {
			return Ok(());
		}
		let data = std::mem::take(&mut self.buffer);
		self.writer
			.write_chunk(&PointChunk::new(Arc::clone(&self.layout), data))?;
		self.written += self.buffered as u64;
		self.buffered = 0;
		Ok(())
	}

	/// Returns the number of points written.
	fn finish(mut self) -> Result<u64> {
		self.flush()?;
		self.writer.finish()?;
		Ok(self.written)
	}
}
