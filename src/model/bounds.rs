use crate::model::vector3::Vector3;
use ord_subset::OrdSubsetIterExt;
use serde::{Deserialize, Serialize};

/// Axis-aligned extent of a set of points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
	pub min: Vector3,
	pub max: Vector3,
}

impl BoundingBox {
	pub fn new(min: Vector3, max: Vector3) -> BoundingBox {
		BoundingBox { min, max }
	}

	/// Extent of `points`, or `None` when no point has a comparable coordinate
	/// on every axis. NaN coordinates are ignored.
	pub fn from_points<'a, I>(points: I) -> Option<BoundingBox>
	where
		I: IntoIterator<Item = &'a Vector3>,
	{
		let mut xs: Vec<f64> = Vec::new();
		let mut ys: Vec<f64> = Vec::new();
		let mut zs: Vec<f64> = Vec::new();
		for p in points {
			xs.push(p.x);
			ys.push(p.y);
			zs.push(p.z);
		}

		Some(BoundingBox {
			min: Vector3 {
				x: *xs.iter().ord_subset_min()?,
				y: *ys.iter().ord_subset_min()?,
				z: *zs.iter().ord_subset_min()?,
			},
			max: Vector3 {
				x: *xs.iter().ord_subset_max()?,
				y: *ys.iter().ord_subset_max()?,
				z: *zs.iter().ord_subset_max()?,
			},
		})
	}

	/// Smallest box covering both `self` and `other`.
	pub fn union(&self, other: &BoundingBox) -> BoundingBox {
		BoundingBox {
			min: self.min.min(&other.min),
			max: self.max.max(&other.max),
		}
	}
}

/// Folds one chunk extent into a running extent.
///
/// The first extent is adopted as is; later ones widen it. The operation is
/// associative and commutative, so the result does not depend on the order
/// in which chunks arrive.
pub fn reduce(current: Option<BoundingBox>, next: Option<BoundingBox>) -> Option<BoundingBox> {
	match (current, next) {
		(Some(a), Some(b)) => Some(a.union(&b)),
		(a, None) => a,
		(None, b) => b,
	}
}
