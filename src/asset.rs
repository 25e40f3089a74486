//! Descriptors for produced point-cloud files.
//!
//! Records are returned to the caller, which owns persisting them. Content
//! hash and creation time are left empty here.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

use crate::model::bounds::BoundingBox;
use crate::sink::SinkSummary;

pub const ASSET_TYPE: &str = "pointcloud";

/// Which partition of a tile a file holds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	TreePack,
	GroundOnly,
	Residual,
	Merged,
}

impl Role {
	/// Token used in tile file names and tile asset identities.
	pub fn token(self) -> &'static str {
		match self {
			Role::TreePack => "tree_pack",
			Role::GroundOnly => "ground_only",
			Role::Residual => "residual",
			Role::Merged => "merged",
		}
	}

	/// Value of the record's `pc_role` column.
	pub fn asset_role(self) -> &'static str {
		match self {
			Role::TreePack => "tree_pack",
			Role::GroundOnly => "ground_only",
			Role::Residual => "background_residual",
			Role::Merged => "merged",
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
	Tile,
	Campaign,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssetRecord {
	pub asset_uid: String,
	pub campaign_uid: String,
	pub tree_uid: Option<String>,
	pub scope: Scope,
	pub pc_role: String,
	pub asset_type: String,
	pub format: String,
	pub uri: String,
	pub crs_epsg: Option<u32>,
	pub point_count: u64,
	pub bytes: u64,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub bbox: Option<BoundingBox>,
	pub hash: Option<String>,
	pub created_at: Option<String>,
	pub notes: Option<String>,
}

/// How a record's identity is derived.
#[derive(Clone, Copy, Debug)]
pub enum AssetKind<'a> {
	Tile { tile_id: &'a str, role: Role },
	Merged { include_ground: bool, include_residual: bool },
}

impl AssetKind<'_> {
	pub fn asset_uid(&self, campaign_uid: &str) -> String {
		match self {
			AssetKind::Tile { tile_id, role } => {
				format!("pc_{}_{}_{}", campaign_uid, tile_id, role.token())
			}
			AssetKind::Merged {
				include_ground,
				include_residual,
			} => {
				let mut uid = format!("pc_{}_merged", campaign_uid);
				if *include_ground {
					uid.push_str("_ground");
				}
				if *include_residual {
					uid.push_str("_residual");
				}
				uid
			}
		}
	}

	fn scope(&self) -> Scope {
		match self {
			AssetKind::Tile { .. } => Scope::Tile,
			AssetKind::Merged { .. } => Scope::Campaign,
		}
	}

	fn role(&self) -> Role {
		match self {
			AssetKind::Tile { role, .. } => *role,
			AssetKind::Merged { .. } => Role::Merged,
		}
	}
}

/// Builds the record for one finalized output file.
pub fn describe(
	kind: AssetKind<'_>,
	campaign_uid: &str,
	uri: String,
	format: &str,
	crs_epsg: Option<u32>,
	summary: &SinkSummary,
) -> AssetRecord {
	AssetRecord {
		asset_uid: kind.asset_uid(campaign_uid),
		campaign_uid: campaign_uid.to_string(),
		tree_uid: None,
		scope: kind.scope(),
		pc_role: kind.role().asset_role().to_string(),
		asset_type: ASSET_TYPE.to_string(),
		format: format.to_string(),
		uri,
		crs_epsg,
		point_count: summary.count,
		bytes: summary.byte_size,
		bbox: summary.bbox,
		hash: None,
		created_at: None,
		notes: None,
	}
}

/// `path` relative to `root`, `/`-separated. Paths outside `root` are
/// returned unchanged, so an absolute path stays absolute.
pub fn relative_uri(path: &Path, root: &Path) -> String {
	let Ok(relative) = path.strip_prefix(root) else {
		return path.to_string_lossy().into_owned();
	};
	relative
		.components()
		.filter_map(|component| match component {
			Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
			Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
			Component::ParentDir => Some("..".to_string()),
		})
		.collect::<Vec<_>>()
		.join("/")
}
