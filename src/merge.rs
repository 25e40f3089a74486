//! Merging a campaign's tile packs into one point cloud.
//!
//! Inputs are appended tree packs first, then ground, then residual files,
//! each group in lexicographic file-name order. The merged file copies the
//! header of the first tree pack; later inputs are expected to share its
//! point layout.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::asset::{self, AssetKind, AssetRecord, Role};
use crate::classify::tiles_dir;
use crate::codec::{ChunkRead, LasCodec, PointCodec, SpcCodec};
use crate::error::{Error, Result};
use crate::model::options::{Format, MergeOptions};
use crate::sink::RoleSink;

/// Role-labelled files found in a campaign's tile directory, each bucket in
/// merge order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CampaignTileIndex {
	pub tree: Vec<PathBuf>,
	pub ground: Vec<PathBuf>,
	pub residual: Vec<PathBuf>,
}

impl CampaignTileIndex {
	/// Lists `dir` and buckets its files by role suffix. Ground and residual
	/// buckets stay empty unless requested.
	pub fn discover(
		dir: &Path,
		extension: &str,
		include_ground: bool,
		include_residual: bool,
	) -> Result<CampaignTileIndex> {
		if !dir.is_dir() {
			return Err(Error::NotFound(dir.to_path_buf()));
		}

		let mut names: Vec<String> = Vec::new();
		for entry in fs::read_dir(dir)? {
			let entry = entry?;
			if !entry.file_type()?.is_file() {
				continue;
			}
			if let Some(name) = entry.file_name().to_str() {
				names.push(name.to_string());
			}
		}
		names.sort();

		let suffix = |role: Role| format!("_{}.{}", role.token(), extension);
		let (tree_suffix, ground_suffix, residual_suffix) = (
			suffix(Role::TreePack),
			suffix(Role::GroundOnly),
			suffix(Role::Residual),
		);

		let mut index = CampaignTileIndex::default();
		for name in names {
			if name.ends_with(&tree_suffix) {
				index.tree.push(dir.join(name));
			} else if include_ground && name.ends_with(&ground_suffix) {
				index.ground.push(dir.join(name));
			} else if include_residual && name.ends_with(&residual_suffix) {
				index.residual.push(dir.join(name));
			}
		}

		Ok(index)
	}

	/// Every input in the order its points are appended.
	pub fn merge_order(&self) -> impl Iterator<Item = &PathBuf> {
		self.tree.iter().chain(&self.ground).chain(&self.residual)
	}

	pub fn len(&self) -> usize {
		self.tree.len() + self.ground.len() + self.residual.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// `{campaign}_trees[_ground][_residual].{extension}`
pub fn merged_filename(
	campaign_uid: &str,
	include_ground: bool,
	include_residual: bool,
	extension: &str,
) -> String {
	let mut suffix = String::from("trees");
	if include_ground {
		suffix.push_str("_ground");
	}
	if include_residual {
		suffix.push_str("_residual");
	}
	format!("{}_{}.{}", campaign_uid, suffix, extension)
}

pub fn merged_dir(root: &Path, campaign_uid: &str) -> PathBuf {
	root.join(campaign_uid).join("merged")
}

pub struct CampaignMerger<C: PointCodec> {
	codec: C,
	options: MergeOptions,
}

impl<C: PointCodec> CampaignMerger<C> {
	pub fn new(codec: C, options: &MergeOptions) -> Result<CampaignMerger<C>> {
		let format = options.validate()?;
		if format != codec.format() {
			return Err(Error::configuration(format!(
				"configured format {} does not match codec {}",
				format.tag(),
				codec.format().tag()
			)));
		}
		Ok(CampaignMerger {
			codec,
			options: options.clone(),
		})
	}

	pub fn discover(&self, campaign_uid: &str) -> Result<CampaignTileIndex> {
		CampaignTileIndex::discover(
			&tiles_dir(&self.options.input_root, campaign_uid),
			self.codec.format().extension(),
			self.options.include_ground,
			self.options.include_residual,
		)
	}

	/// Writes the merged file and describes it. The record is not persisted.
	pub fn merge(&self, campaign_uid: &str) -> Result<AssetRecord> {
		let index = self.discover(campaign_uid)?;
		let Some(first) = index.tree.first() else {
			return Err(Error::configuration(format!(
				"no tree pack files found in {}",
				tiles_dir(&self.options.input_root, campaign_uid).display()
			)));
		};

		let format = self.codec.format();
		let output_root = self.options.output_root();
		let out_dir = merged_dir(output_root, campaign_uid);
		let filename = match &self.options.out_filename {
			Some(name) => name.clone(),
			None => merged_filename(
				campaign_uid,
				self.options.include_ground,
				self.options.include_residual,
				format.extension(),
			),
		};
		let merged_path = out_dir.join(filename);

		let donor = self.codec.open_read(first)?;
		let header = donor.header().clone();
		let crs_epsg = donor.crs_epsg();
		drop(donor);
		fs::create_dir_all(&out_dir)?;
		let mut sink = RoleSink::open(&self.codec, &merged_path, &header)?;

		info!(
			"merging {} files ({} tree, {} ground, {} residual) into {}",
			index.len(),
			index.tree.len(),
			index.ground.len(),
			index.residual.len(),
			merged_path.display()
		);
		for input in index.merge_order() {
			let mut reader = self.codec.open_read(input)?;
			debug!("appending {} ({} points)", input.display(), reader.point_count());
			while let Some(chunk) = reader.read_chunk(self.options.chunk_size)? {
				sink.append(&chunk)?;
			}
		}
		let summary = sink.finalize()?;

		let record = asset::describe(
			AssetKind::Merged {
				include_ground: self.options.include_ground,
				include_residual: self.options.include_residual,
			},
			campaign_uid,
			asset::relative_uri(&merged_path, output_root),
			format.tag(),
			crs_epsg,
			&summary,
		);
		info!("wrote {} ({} points)", record.uri, record.point_count);
		Ok(record)
	}
}

/// Merges the tile packs of `campaign_uid` with the codec named in `options`.
pub fn merge_campaign_tiles(campaign_uid: &str, options: &MergeOptions) -> Result<AssetRecord> {
	match options.validate()? {
		Format::Las => CampaignMerger::new(LasCodec::las(), options)?.merge(campaign_uid),
		Format::Laz => CampaignMerger::new(LasCodec::laz(), options)?.merge(campaign_uid),
		Format::Spc => CampaignMerger::new(SpcCodec, options)?.merge(campaign_uid),
	}
}
