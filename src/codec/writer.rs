use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::codec::{ChunkWrite, MAGIC};
use crate::error::Result;
use crate::model::chunk::PointChunk;
use crate::model::header::{SpcHeader, MAX_HEADER_LEN};

/// Streams records into an SPC file.
///
/// The point count is written as a placeholder and patched on `finish`.
/// Dropping an unfinished writer still patches the count and flushes, so a
/// file abandoned after an error is readable up to its last full chunk.
pub struct SpcWriter {
	output: Option<BufWriter<File>>,
	path: PathBuf,
	count_offset: u64,
	record_len: usize,
	count: u64,
}

impl SpcWriter {
	/// Starts `path` with the donor's header bytes, unchanged.
	pub fn create(path: &Path, donor: &SpcHeader) -> Result<SpcWriter> {
		let header_bytes = donor.raw();
		let header_len = u32::try_from(header_bytes.len())
			.ok()
			.filter(|_| header_bytes.len() <= MAX_HEADER_LEN)
			.ok_or_else(|| {
				io::Error::new(
					io::ErrorKind::InvalidInput,
					format!(
						"header of {} bytes exceeds limit of {} bytes",
						header_bytes.len(),
						MAX_HEADER_LEN
					),
				)
			})?;
		let mut output = BufWriter::new(File::create(path)?);

		output.write_all(MAGIC)?;
		output.write_u32::<LittleEndian>(header_len)?;
		output.write_all(header_bytes)?;
		let count_offset = (MAGIC.len() + 4 + header_bytes.len()) as u64;
		output.write_u64::<LittleEndian>(0)?;

		Ok(SpcWriter {
			output: Some(output),
			path: path.to_path_buf(),
			count_offset,
			record_len: donor.cloud().layout().record_len(),
			count: 0,
		})
	}

	fn patch_count(output: &mut BufWriter<File>, offset: u64, count: u64) -> io::Result<()> {
		output.seek(SeekFrom::Start(offset))?;
		output.write_u64::<LittleEndian>(count)?;
		output.seek(SeekFrom::End(0))?;
		output.flush()
	}

	fn output(&mut self) -> io::Result<&mut BufWriter<File>> {
		self.output
			.as_mut()
			.ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already closed"))
	}
}

impl ChunkWrite for SpcWriter {
	type Chunk = PointChunk;

	fn write_chunk(&mut self, chunk: &PointChunk) -> Result<()> {
		if chunk.layout().record_len() != self.record_len {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!(
					"record length {} does not match destination record length {} in {}",
					chunk.layout().record_len(),
					self.record_len,
					self.path.display()
				),
			)
			.into());
		}
		self.output()?.write_all(chunk.data())?;
		self.count += chunk.len() as u64;
		Ok(())
	}

	fn finish(mut self) -> Result<u64> {
		let (offset, count) = (self.count_offset, self.count);
		let output = self.output()?;
		SpcWriter::patch_count(output, offset, count)?;
		let bytes = output.get_ref().metadata()?.len();
		self.output = None;
		Ok(bytes)
	}
}

impl Drop for SpcWriter {
	fn drop(&mut self) {
		if let Some(mut output) = self.output.take() {
			if let Err(err) = SpcWriter::patch_count(&mut output, self.count_offset, self.count) {
				warn!("Failed to close {}: {}", self.path.display(), err);
			}
		}
	}
}
