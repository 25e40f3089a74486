use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vector3 {
	pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
		Vector3 { x, y, z }
	}

	/// Elementwise minimum.
	pub fn min(&self, other: &Vector3) -> Vector3 {
		Vector3 {
			x: self.x.min(other.x),
			y: self.y.min(other.y),
			z: self.z.min(other.z),
		}
	}

	/// Elementwise maximum.
	pub fn max(&self, other: &Vector3) -> Vector3 {
		Vector3 {
			x: self.x.max(other.x),
			y: self.y.max(other.y),
			z: self.z.max(other.z),
		}
	}
}

impl From<[f64; 3]> for Vector3 {
	fn from([x, y, z]: [f64; 3]) -> Vector3 {
		Vector3 { x, y, z }
	}
}
