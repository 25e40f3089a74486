use byteorder::LittleEndian;
use byteorder::ReadBytesExt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::codec::{ChunkRead, MAGIC};
use crate::error::{Error, Result};
use crate::model::attributes::PointLayout;
use crate::model::chunk::PointChunk;
use crate::model::header::{SpcHeader, MAX_HEADER_LEN};

pub struct SpcReader {
	input: BufReader<File>,
	header: SpcHeader,
	layout: Arc<PointLayout>,
	point_count: u64,
	remaining: u64,
}

impl SpcReader {
	pub fn open(path: &Path) -> Result<SpcReader> {
		let file = File::open(path).map_err(|err| match err.kind() {
			io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
			_ => Error::Io(err),
		})?;
		SpcReader::from_reader(BufReader::new(file))
	}

	fn from_reader(mut input: BufReader<File>) -> Result<SpcReader> {
		let mut magic = [0u8; 4];
		input.read_exact(&mut magic)?;
		if &magic != MAGIC {
			return Err(Error::invalid_data("not an SPC point cloud"));
		}

		// checked before allocating so a corrupt length fails cleanly
		let header_len = input.read_u32::<LittleEndian>()? as usize;
		if header_len > MAX_HEADER_LEN {
			return Err(Error::invalid_data(format!(
				"header length {} exceeds limit",
				header_len
			)));
		}
		let mut header_bytes = vec![0u8; header_len];
		input.read_exact(&mut header_bytes)?;
		let header = SpcHeader::from_raw(header_bytes)?;

		let point_count = input.read_u64::<LittleEndian>()?;
		let layout = Arc::new(header.cloud().layout());

		Ok(SpcReader {
			input,
			header,
			layout,
			point_count,
			remaining: point_count,
		})
	}

	pub fn layout(&self) -> Arc<PointLayout> {
		Arc::clone(&self.layout)
	}
}

impl ChunkRead for SpcReader {
	type Header = SpcHeader;
	type Chunk = PointChunk;

	fn header(&self) -> &SpcHeader {
		&self.header
	}

	fn has_attribute(&self, name: &str) -> bool {
		self.layout.has(name)
	}

	fn crs_epsg(&self) -> Option<u32> {
		self.header.cloud().epsg
	}

	fn point_count(&self) -> u64 {
		self.point_count
	}

	fn read_chunk(&mut self, max_points: usize) -> Result<Option<PointChunk>> {
		let n = self.remaining.min(max_points as u64) as usize;
		if n == 0 {
			return Ok(None);
		}

		let mut data = vec![0u8; n * self.layout.record_len()];
		self.input.read_exact(&mut data)?;
		self.remaining -= n as u64;

		Ok(Some(PointChunk::new(Arc::clone(&self.layout), data)))
	}
}
