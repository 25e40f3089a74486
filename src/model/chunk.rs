use crate::codec::PointBatch;
use crate::model::attributes::{PointLayout, ValueKind};
use crate::model::bounds::BoundingBox;
use crate::model::vector3::Vector3;
use byteorder::{ByteOrder, LittleEndian};
use std::sync::Arc;

/// A batch of consecutive records read from one file.
///
/// Records are kept in their encoded form so that forwarding a point to
/// an output copies its bytes without decoding and re-encoding them.
#[derive(Clone, Debug)]
pub struct PointChunk {
	layout: Arc<PointLayout>,
	data: Vec<u8>,
}

impl PointChunk {
	/// `data` must hold a whole number of records.
	pub fn new(layout: Arc<PointLayout>, data: Vec<u8>) -> PointChunk {
		debug_assert_eq!(data.len() % layout.record_len(), 0);
		PointChunk { layout, data }
	}

	pub fn len(&self) -> usize {
		self.data.len() / self.layout.record_len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn layout(&self) -> &PointLayout {
		&self.layout
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn record(&self, index: usize) -> &[u8] {
		let len = self.layout.record_len();
		&self.data[index * len..(index + 1) * len]
	}

	pub fn position(&self, index: usize) -> Vector3 {
		let record = self.record(index);
		Vector3 {
			x: LittleEndian::read_f64(&record[0..8]),
			y: LittleEndian::read_f64(&record[8..16]),
			z: LittleEndian::read_f64(&record[16..24]),
		}
	}

	pub fn positions(&self) -> Vec<Vector3> {
		(0..self.len()).map(|i| self.position(i)).collect()
	}

	pub fn attribute(&self, name: &str) -> Option<AttributeView<'_>> {
		let (kind, offset) = self.layout.get(name)?;
		Some(AttributeView {
			chunk: self,
			kind,
			offset,
		})
	}

	/// Records whose mask entry is set, in their original order.
	pub fn select(&self, mask: &[bool]) -> PointChunk {
		debug_assert_eq!(mask.len(), self.len());
		let selected = mask.iter().filter(|keep| **keep).count();
		let mut data = Vec::with_capacity(selected * self.layout.record_len());
		for (index, keep) in mask.iter().enumerate() {
			if *keep {
				data.extend_from_slice(self.record(index));
			}
		}

		PointChunk {
			layout: Arc::clone(&self.layout),
			data,
		}
	}

	pub fn bounds(&self) -> Option<BoundingBox> {
		BoundingBox::from_points(&self.positions())
	}
}

impl PointBatch for PointChunk {
	fn len(&self) -> usize {
		PointChunk::len(self)
	}

	fn bounds(&self) -> Option<BoundingBox> {
		PointChunk::bounds(self)
	}

	fn select(&self, mask: &[bool]) -> PointChunk {
		PointChunk::select(self, mask)
	}

	fn attribute_values(&self, name: &str) -> Option<Vec<f64>> {
		let view = self.attribute(name)?;
		Some((0..self.len()).map(|i| view.value(i)).collect())
	}
}

/// Typed read access to one attribute across a chunk.
pub struct AttributeView<'a> {
	chunk: &'a PointChunk,
	kind: ValueKind,
	offset: usize,
}

impl AttributeView<'_> {
	fn bytes(&self, index: usize) -> &[u8] {
		&self.chunk.record(index)[self.offset..self.offset + self.kind.size()]
	}

	pub fn value(&self, index: usize) -> f64 {
		self.kind.read_f64(self.bytes(index))
	}
}
