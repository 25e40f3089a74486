use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;
pub const DEFAULT_ROOT: &str = "pointclouds/campaigns";

/// Point-cloud encodings the crate can stream.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
	Las,
	Laz,
	Spc,
}

impl Format {
	/// Resolves a configured format tag. Runs before any file is touched so
	/// an unsupported format fails up front.
	pub fn from_tag(tag: &str) -> Result<Format> {
		match tag.to_ascii_lowercase().as_str() {
			"las" => Ok(Format::Las),
			"laz" => Ok(Format::Laz),
			"spc" => Ok(Format::Spc),
			other => Err(Error::configuration(format!(
				"unsupported point cloud format '{}'",
				other
			))),
		}
	}

	pub fn tag(self) -> &'static str {
		match self {
			Format::Las => "LAS",
			Format::Laz => "LAZ",
			Format::Spc => "SPC",
		}
	}

	pub fn extension(self) -> &'static str {
		match self {
			Format::Las => "las",
			Format::Laz => "laz",
			Format::Spc => "spc",
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ImportOptions {
	pub instance_dim: String,
	pub semantic_dim: String,
	pub score_dim: Option<String>,
	pub ground_classes: Vec<i64>,
	pub tree_classes: Vec<i64>,
	pub include_ground: bool,
	pub include_residual: bool,
	pub output_root: PathBuf,
	pub chunk_size: usize,
	pub format: String,
}

impl Default for ImportOptions {
	fn default() -> ImportOptions {
		ImportOptions {
			instance_dim: "instance_pred".to_string(),
			semantic_dim: "semantic_pred".to_string(),
			score_dim: Some("score".to_string()),
			ground_classes: vec![1],
			tree_classes: vec![2, 3],
			include_ground: true,
			include_residual: true,
			output_root: PathBuf::from(DEFAULT_ROOT),
			chunk_size: DEFAULT_CHUNK_SIZE,
			format: "laz".to_string(),
		}
	}
}

impl ImportOptions {
	pub fn from_json_file(path: &Path) -> Result<ImportOptions> {
		read_json(path)
	}

	/// Checks the options and resolves the output format.
	pub fn validate(&self) -> Result<Format> {
		let format = Format::from_tag(&self.format)?;
		if self.chunk_size == 0 {
			return Err(Error::configuration("chunk_size must be at least 1"));
		}
		if self.semantic_dim.is_empty() {
			return Err(Error::configuration("semantic_dim must not be empty"));
		}
		if self.tree_classes.is_empty() {
			return Err(Error::configuration("tree_classes must not be empty"));
		}
		let ground: BTreeSet<i64> = self.ground_classes.iter().copied().collect();
		let overlap: Vec<i64> = self
			.tree_classes
			.iter()
			.copied()
			.filter(|code| ground.contains(code))
			.collect();
		if !overlap.is_empty() {
			return Err(Error::configuration(format!(
				"semantic codes {:?} are listed as both ground and tree",
				overlap
			)));
		}
		Ok(format)
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MergeOptions {
	pub input_root: PathBuf,
	/// Defaults to `input_root`.
	pub output_root: Option<PathBuf>,
	pub include_ground: bool,
	pub include_residual: bool,
	pub out_filename: Option<String>,
	pub chunk_size: usize,
	pub format: String,
}

impl Default for MergeOptions {
	fn default() -> MergeOptions {
		MergeOptions {
			input_root: PathBuf::from(DEFAULT_ROOT),
			output_root: None,
			include_ground: false,
			include_residual: false,
			out_filename: None,
			chunk_size: DEFAULT_CHUNK_SIZE,
			format: "laz".to_string(),
		}
	}
}

impl MergeOptions {
	pub fn from_json_file(path: &Path) -> Result<MergeOptions> {
		read_json(path)
	}

	pub fn output_root(&self) -> &Path {
		self.output_root.as_deref().unwrap_or(self.input_root.as_path())
	}

	pub fn validate(&self) -> Result<Format> {
		let format = Format::from_tag(&self.format)?;
		if self.chunk_size == 0 {
			return Err(Error::configuration("chunk_size must be at least 1"));
		}
		if let Some(name) = &self.out_filename {
			if name.is_empty() || name.contains('/') || name.contains('\\') {
				return Err(Error::configuration(format!(
					"out_filename '{}' must be a plain file name",
					name
				)));
			}
		}
		Ok(format)
	}
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
	if !path.is_file() {
		return Err(Error::NotFound(path.to_path_buf()));
	}
	let reader = BufReader::new(File::open(path)?);
	Ok(serde_json::from_reader(reader)?)
}
