use std::path::{Path, PathBuf};

use crate::codec::{ChunkWrite, PointBatch, PointCodec};
use crate::error::Result;
use crate::model::bounds::{self, BoundingBox};

/// Destination for the points of one role.
///
/// A role the caller did not ask for gets a `Discarding` sink, so the
/// classification and merge loops append to every role unconditionally.
pub enum RoleSink<W: ChunkWrite> {
	Active {
		writer: W,
		path: PathBuf,
		count: u64,
		bbox: Option<BoundingBox>,
	},
	Discarding,
}

/// What a sink produced once closed.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkSummary {
	pub count: u64,
	pub bbox: Option<BoundingBox>,
	pub byte_size: u64,
	/// `None` for a discarding sink.
	pub path: Option<PathBuf>,
}

impl<W: ChunkWrite> RoleSink<W> {
	pub fn open<C>(codec: &C, path: &Path, donor: &C::Header) -> Result<RoleSink<W>>
	where
		C: PointCodec<Writer = W>,
	{
		Ok(RoleSink::Active {
			writer: codec.open_write(path, donor)?,
			path: path.to_path_buf(),
			count: 0,
			bbox: None,
		})
	}

	/// Opens `path` when `enabled`, otherwise returns a discarding sink
	/// without touching the filesystem.
	pub fn open_if<C>(
		enabled: bool,
		codec: &C,
		path: &Path,
		donor: &C::Header,
	) -> Result<RoleSink<W>>
	where
		C: PointCodec<Writer = W>,
	{
		if enabled {
			RoleSink::open(codec, path, donor)
		} else {
			Ok(RoleSink::Discarding)
		}
	}

	pub fn is_active(&self) -> bool {
		matches!(self, RoleSink::Active { .. })
	}

	pub fn append(&mut self, chunk: &W::Chunk) -> Result<()> {
		match self {
			RoleSink::Active {
				writer,
				count,
				bbox,
				..
			} => {
				if chunk.is_empty() {
					return Ok(());
				}
				writer.write_chunk(chunk)?;
				*count += chunk.len() as u64;
				*bbox = bounds::reduce(*bbox, chunk.bounds());
				Ok(())
			}
			RoleSink::Discarding => Ok(()),
		}
	}

	pub fn finalize(self) -> Result<SinkSummary> {
		match self {
			RoleSink::Active {
				writer,
				path,
				count,
				bbox,
			} => Ok(SinkSummary {
				count,
				bbox,
				byte_size: writer.finish()?,
				path: Some(path),
			}),
			RoleSink::Discarding => Ok(SinkSummary {
				count: 0,
				bbox: None,
				byte_size: 0,
				path: None,
			}),
		}
	}
}
