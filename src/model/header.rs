use crate::error::{Error, Result};
use crate::model::attributes::{FieldDef, PointLayout};
use serde::{Deserialize, Serialize};

pub const GENERATOR: &str = concat!("rusty-treepack ", env!("CARGO_PKG_VERSION"));

/// Upper bound on an encoded header. Readers and writers share it so a file
/// that could be written can always be opened again.
pub const MAX_HEADER_LEN: usize = 64 * 1024 * 1024;

/// Opaque variable-length record carried along with the header.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vlr {
	pub user_id: String,
	pub record_id: u16,
	#[serde(default)]
	pub description: String,
	#[serde(default, with = "vlr_data")]
	pub data: Vec<u8>,
}

/// VLR payloads are stored as base64 text.
mod vlr_data {
	use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&BASE64.encode(data))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let text = String::deserialize(deserializer)?;
		BASE64.decode(text.as_bytes()).map_err(serde::de::Error::custom)
	}
}

/// File-level metadata: schema, CRS and VLRs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudHeader {
	pub generator: String,
	pub epsg: Option<u32>,
	pub schema: Vec<FieldDef>,
	#[serde(default)]
	pub vlrs: Vec<Vlr>,
}

impl CloudHeader {
	pub fn new(schema: Vec<FieldDef>) -> CloudHeader {
		CloudHeader {
			generator: GENERATOR.to_string(),
			epsg: None,
			schema,
			vlrs: Vec::new(),
		}
	}

	pub fn with_epsg(mut self, epsg: Option<u32>) -> CloudHeader {
		self.epsg = epsg;
		self
	}

	pub fn layout(&self) -> PointLayout {
		PointLayout::new(self.schema.clone())
	}
}

/// An SPC header as it appears on disk, next to its parsed form.
///
/// Outputs derived from a file are written with the donor's `raw` bytes, so
/// keys this crate does not model survive unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct SpcHeader {
	cloud: CloudHeader,
	raw: Vec<u8>,
}

impl SpcHeader {
	/// Encodes a freshly built header.
	pub fn new(cloud: CloudHeader) -> Result<SpcHeader> {
		let raw = serde_json::to_vec(&cloud)?;
		check_len(raw.len())?;
		Ok(SpcHeader { cloud, raw })
	}

	pub fn from_raw(raw: Vec<u8>) -> Result<SpcHeader> {
		check_len(raw.len())?;
		let cloud = serde_json::from_slice(&raw)?;
		Ok(SpcHeader { cloud, raw })
	}

	pub fn cloud(&self) -> &CloudHeader {
		&self.cloud
	}

	pub fn raw(&self) -> &[u8] {
		&self.raw
	}
}

fn check_len(len: usize) -> Result<()> {
	if len > MAX_HEADER_LEN {
		return Err(Error::invalid_data(format!(
			"header length {} exceeds limit of {} bytes",
			len, MAX_HEADER_LEN
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::attributes::ValueKind;

	#[test]
	fn it_serializes() -> Result<()> {
		let mut header = CloudHeader::new(vec![
			FieldDef::new("semantic_pred", ValueKind::U8),
			FieldDef::new("instance_pred", ValueKind::F32),
		])
		.with_epsg(Some(3067));
		header.vlrs.push(Vlr {
			user_id: "LASF_Projection".to_string(),
			record_id: 2112,
			description: "OGC WKT".to_string(),
			data: b"PROJCS[...]".to_vec(),
		});

		let json = serde_json::to_string(&header)?;
		assert!(json.contains("\"epsg\":3067"));
		assert!(json.contains("\"kind\":\"f32\""));
		assert!(json.contains("\"data\":\"UFJPSkNTWy4uLl0=\""));

		let parsed: CloudHeader = serde_json::from_str(&json)?;
		assert_eq!(parsed, header);
		assert_eq!(serde_json::to_string(&parsed)?, json);

		Ok(())
	}

	#[test]
	fn vlrs_are_optional() -> Result<()> {
		let json = r#"{"generator":"x","epsg":null,"schema":[{"name":"c","kind":"u8"}]}"#;
		let header: CloudHeader = serde_json::from_str(json)?;
		assert!(header.vlrs.is_empty());
		assert_eq!(header.layout().record_len(), 25);
		Ok(())
	}

	#[test]
	fn raw_header_keeps_unknown_keys() -> Result<()> {
		let raw = br#"{ "generator": "other-tool 2.0", "epsg": 3067,
			"schema": [{"name": "semantic_pred", "kind": "u8"}],
			"vlrs": [], "acquisition": "MLS-2025" }"#
			.to_vec();
		let header = SpcHeader::from_raw(raw.clone())?;
		assert_eq!(header.cloud().epsg, Some(3067));
		assert_eq!(header.raw(), raw.as_slice());
		Ok(())
	}

	#[test]
	fn large_vlr_payload_stays_compact() -> Result<()> {
		let mut cloud = CloudHeader::new(Vec::new());
		cloud.vlrs.push(Vlr {
			user_id: "blob".to_string(),
			record_id: 1,
			description: String::new(),
			data: vec![0xAB; 20 * 1024 * 1024],
		});
		let header = SpcHeader::new(cloud)?;
		assert!(header.raw().len() < 28 * 1024 * 1024);

		let mut cloud = header.cloud().clone();
		cloud.vlrs[0].data = vec![0; MAX_HEADER_LEN];
		assert!(matches!(SpcHeader::new(cloud), Err(Error::Io(_))));
		Ok(())
	}
}
