//! Splitting labelled tiles into tree, ground and residual packs.
//!
//! Each chunk of a tile gets three pairwise disjoint masks. Points matched
//! by none of them are dropped on purpose: their semantic class is outside
//! both configured sets.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::asset::{self, AssetKind, AssetRecord, Role};
use crate::codec::{self, ChunkRead, ChunkWrite, LasCodec, PointBatch, PointCodec, SpcCodec};
use crate::error::{Error, Result};
use crate::model::options::{Format, ImportOptions};
use crate::sink::{RoleSink, SinkSummary};

/// Which semantic codes go where, and how the instance attribute is read.
#[derive(Clone, Debug)]
pub struct ClassRules {
	pub semantic_dim: String,
	pub instance_dim: String,
	pub ground_codes: HashSet<i64>,
	pub tree_codes: HashSet<i64>,
	pub residual: bool,
}

impl ClassRules {
	pub fn from_options(options: &ImportOptions) -> ClassRules {
		ClassRules {
			semantic_dim: options.semantic_dim.clone(),
			instance_dim: options.instance_dim.clone(),
			ground_codes: options.ground_classes.iter().copied().collect(),
			tree_codes: options.tree_classes.iter().copied().collect(),
			residual: options.include_residual,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Masks {
	pub tree: Vec<bool>,
	pub ground: Vec<bool>,
	pub residual: Vec<bool>,
}

impl Masks {
	pub fn count(mask: &[bool]) -> u64 {
		mask.iter().filter(|m| **m).count() as u64
	}

	pub fn is_disjoint(&self) -> bool {
		self.tree
			.iter()
			.zip(&self.ground)
			.zip(&self.residual)
			.all(|((t, g), r)| (*t as u8 + *g as u8 + *r as u8) <= 1)
	}
}

/// Classifies one chunk.
///
/// The semantic attribute must be present in the chunk. An absent instance
/// attribute makes every tree-class point residual when residual extraction
/// is on.
pub fn compute_masks<B: PointBatch>(chunk: &B, rules: &ClassRules) -> Result<Masks> {
	let semantic = chunk.attribute_values(&rules.semantic_dim).ok_or_else(|| {
		Error::configuration(format!(
			"semantic attribute '{}' is not part of the point schema",
			rules.semantic_dim
		))
	})?;
	let instance = chunk.attribute_values(&rules.instance_dim);

	let n = semantic.len();
	let mut masks = Masks {
		tree: vec![false; n],
		ground: vec![false; n],
		residual: vec![false; n],
	};
	for (i, value) in semantic.iter().enumerate() {
		let Some(code) = codec::as_code(*value) else {
			continue;
		};
		if rules.ground_codes.contains(&code) {
			masks.ground[i] = true;
		} else if rules.tree_codes.contains(&code) {
			let invalid_instance = match &instance {
				None => true,
				Some(ids) => {
					let id = ids[i];
					id.is_nan() || id <= 0.0
				}
			};
			if rules.residual && invalid_instance {
				masks.residual[i] = true;
			} else {
				masks.tree[i] = true;
			}
		}
	}

	Ok(masks)
}

/// Point counts of one classified tile. `dropped` holds points whose class is
/// in neither set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileSummary {
	pub total: u64,
	pub tree: u64,
	pub ground: u64,
	pub residual: u64,
	pub dropped: u64,
}

impl TileSummary {
	fn add(&mut self, masks: &Masks) {
		let n = masks.tree.len() as u64;
		let tree = Masks::count(&masks.tree);
		let ground = Masks::count(&masks.ground);
		let residual = Masks::count(&masks.residual);
		self.total += n;
		self.tree += tree;
		self.ground += ground;
		self.residual += residual;
		self.dropped += n - tree - ground - residual;
	}
}

/// Destination paths for the three tile roles.
#[derive(Clone, Debug)]
pub struct TileOutputs {
	pub tree: PathBuf,
	pub ground: PathBuf,
	pub residual: PathBuf,
}

impl TileOutputs {
	pub fn in_dir(dir: &Path, tile_id: &str, extension: &str) -> TileOutputs {
		let path = |role: Role| dir.join(format!("{}_{}.{}", tile_id, role.token(), extension));
		TileOutputs {
			tree: path(Role::TreePack),
			ground: path(Role::GroundOnly),
			residual: path(Role::Residual),
		}
	}
}

#[derive(Clone, Debug)]
pub struct ClassifiedTile {
	pub summary: TileSummary,
	pub crs_epsg: Option<u32>,
	pub tree: SinkSummary,
	pub ground: SinkSummary,
	pub residual: SinkSummary,
}

impl ClassifiedTile {
	/// Finalized sinks of the roles that were written, in role order.
	pub fn outputs(&self) -> Vec<(Role, &SinkSummary)> {
		[
			(Role::TreePack, &self.tree),
			(Role::GroundOnly, &self.ground),
			(Role::Residual, &self.residual),
		]
		.into_iter()
		.filter(|(_, sink)| sink.path.is_some())
		.collect()
	}
}

pub struct TileClassifier<C: PointCodec> {
	codec: C,
	rules: ClassRules,
	score_dim: Option<String>,
	include_ground: bool,
	chunk_size: usize,
}

impl<C: PointCodec> TileClassifier<C> {
	/// Validates `options` before any file is opened.
	pub fn new(codec: C, options: &ImportOptions) -> Result<TileClassifier<C>> {
		let format = options.validate()?;
		if format != codec.format() {
			return Err(Error::configuration(format!(
				"configured format {} does not match codec {}",
				format.tag(),
				codec.format().tag()
			)));
		}

		Ok(TileClassifier {
			codec,
			rules: ClassRules::from_options(options),
			score_dim: options.score_dim.clone(),
			include_ground: options.include_ground,
			chunk_size: options.chunk_size,
		})
	}

	/// Streams `source` into the enabled role files of `outputs`.
	///
	/// Destination files are created only after the source schema has been
	/// checked. Once they exist, a failure leaves them truncated.
	pub fn classify_tile(&self, source: &Path, outputs: &TileOutputs) -> Result<ClassifiedTile> {
		if !source.is_file() {
			return Err(Error::NotFound(source.to_path_buf()));
		}
		let mut reader = self.codec.open_read(source)?;
		let header = reader.header().clone();
		let crs_epsg = reader.crs_epsg();

		if !reader.has_attribute(&self.rules.semantic_dim) {
			return Err(Error::configuration(format!(
				"semantic attribute '{}' is missing from {}",
				self.rules.semantic_dim,
				source.display()
			)));
		}
		if !reader.has_attribute(&self.rules.instance_dim) {
			debug!(
				"{} has no '{}' attribute",
				source.display(),
				self.rules.instance_dim
			);
		}
		if let Some(score) = &self.score_dim {
			if !reader.has_attribute(score) {
				warn!("{} has no score attribute '{}'", source.display(), score);
			}
		}

		let mut tree = RoleSink::open(&self.codec, &outputs.tree, &header)?;
		let mut ground =
			RoleSink::open_if(self.include_ground, &self.codec, &outputs.ground, &header)?;
		let mut residual =
			RoleSink::open_if(self.rules.residual, &self.codec, &outputs.residual, &header)?;

		let mut summary = TileSummary::default();
		while let Some(chunk) = reader.read_chunk(self.chunk_size)? {
			let masks = compute_masks(&chunk, &self.rules)?;
			debug_assert!(masks.is_disjoint());
			summary.add(&masks);
			debug!(
				"chunk of {} points from {}: tree {}, ground {}, residual {}",
				chunk.len(),
				source.display(),
				Masks::count(&masks.tree),
				Masks::count(&masks.ground),
				Masks::count(&masks.residual)
			);

			forward(&chunk, &masks.tree, &mut tree)?;
			forward(&chunk, &masks.ground, &mut ground)?;
			forward(&chunk, &masks.residual, &mut residual)?;
		}

		Ok(ClassifiedTile {
			summary,
			crs_epsg,
			tree: tree.finalize()?,
			ground: ground.finalize()?,
			residual: residual.finalize()?,
		})
	}
}

fn forward<W: ChunkWrite>(
	chunk: &W::Chunk,
	mask: &[bool],
	sink: &mut RoleSink<W>,
) -> Result<()> {
	if !sink.is_active() || !mask.iter().any(|m| *m) {
		return Ok(());
	}
	sink.append(&chunk.select(mask))
}

/// Tile identifier for the `index`-th input.
///
/// A stem containing a `_`-separated part that starts with `tile` is used
/// as is; anything else is numbered `tile_0000`, `tile_0001`, ...
pub fn derive_tile_id(path: &Path, index: usize) -> String {
	let stem = path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_default();
	let is_tile = stem
		.to_lowercase()
		.split('_')
		.any(|part| part.starts_with("tile"));
	if is_tile {
		stem
	} else {
		format!("tile_{:04}", index)
	}
}

pub fn tiles_dir(root: &Path, campaign_uid: &str) -> PathBuf {
	root.join(campaign_uid).join("tiles")
}

/// Classifies every input tile of a campaign, in input order, and returns
/// one record per written file.
pub fn import_campaign_tiles<P: AsRef<Path>>(
	campaign_uid: &str,
	inputs: &[P],
	options: &ImportOptions,
) -> Result<Vec<AssetRecord>> {
	match options.validate()? {
		Format::Las => import_tiles(LasCodec::las(), campaign_uid, inputs, options),
		Format::Laz => import_tiles(LasCodec::laz(), campaign_uid, inputs, options),
		Format::Spc => import_tiles(SpcCodec, campaign_uid, inputs, options),
	}
}

fn import_tiles<C: PointCodec, P: AsRef<Path>>(
	codec: C,
	campaign_uid: &str,
	inputs: &[P],
	options: &ImportOptions,
) -> Result<Vec<AssetRecord>> {
	let format = codec.format();
	let classifier = TileClassifier::new(codec, options)?;

	let output_dir = tiles_dir(&options.output_root, campaign_uid);
	fs::create_dir_all(&output_dir)?;

	let mut records = Vec::new();
	for (index, input) in inputs.iter().enumerate() {
		let input = input.as_ref();
		let tile_id = derive_tile_id(input, index);
		let outputs = TileOutputs::in_dir(&output_dir, &tile_id, format.extension());

		let tile = classifier.classify_tile(input, &outputs)?;
		let s = tile.summary;
		info!(
			"{}: {} points, tree {}, ground {}, residual {}, dropped {}",
			tile_id, s.total, s.tree, s.ground, s.residual, s.dropped
		);

		for (role, sink) in tile.outputs() {
			let Some(path) = sink.path.as_deref() else {
				continue;
			};
			let record = asset::describe(
				AssetKind::Tile {
					tile_id: &tile_id,
					role,
				},
				campaign_uid,
				asset::relative_uri(path, &options.output_root),
				format.tag(),
				tile.crs_epsg,
				sink,
			);
			info!("wrote {} ({} points)", record.uri, record.point_count);
			records.push(record);
		}
	}

	Ok(records)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::lidar::testing as las_tiles;
	use crate::codec::{SpcReader, SpcWriter};
	use crate::model::attributes::{FieldDef, ValueKind};
	use crate::model::bounds::BoundingBox;
	use crate::model::chunk::PointChunk;
	use crate::model::header::{CloudHeader, SpcHeader};
	use crate::model::vector3::Vector3;
	use proptest::prelude::*;
	use std::sync::Arc;
	use tempfile::TempDir;

	/// (x, y, z, semantic, instance)
	type Row = (f64, f64, f64, f64, f64);

	fn header(with_instance: bool) -> CloudHeader {
		let mut schema = vec![FieldDef::new("semantic_pred", ValueKind::U8)];
		if with_instance {
			schema.push(FieldDef::new("instance_pred", ValueKind::F32));
		}
		schema.push(FieldDef::new("score", ValueKind::F32));
		CloudHeader::new(schema).with_epsg(Some(3067))
	}

	fn write_tile(path: &Path, header: &CloudHeader, rows: &[Row]) {
		write_tile_with(path, &SpcHeader::new(header.clone()).unwrap(), rows);
	}

	fn write_tile_with(path: &Path, header: &SpcHeader, rows: &[Row]) {
		let layout = Arc::new(header.cloud().layout());
		let has_instance = layout.has("instance_pred");
		let mut data = Vec::new();
		for (x, y, z, semantic, instance) in rows {
			let values = if has_instance {
				vec![*semantic, *instance, 0.9]
			} else {
				vec![*semantic, 0.9]
			};
			layout
				.encode(&mut data, &Vector3::new(*x, *y, *z), &values)
				.unwrap();
		}
		let mut writer = SpcWriter::create(path, header).unwrap();
		writer.write_chunk(&PointChunk::new(layout, data)).unwrap();
		writer.finish().unwrap();
	}

	fn read_all(path: &Path) -> PointChunk {
		let mut reader = SpcReader::open(path).unwrap();
		let mut data = Vec::new();
		while let Some(chunk) = reader.read_chunk(4).unwrap() {
			data.extend_from_slice(chunk.data());
		}
		PointChunk::new(reader.layout(), data)
	}

	/// Ten points: four ground (class 1), six tree (classes 2 and 3) of
	/// which one has instance 0.
	fn scenario_rows() -> Vec<Row> {
		vec![
			(0.0, 0.0, 0.1, 1.0, 0.0),
			(1.0, 0.0, 0.2, 1.0, 0.0),
			(2.0, 0.0, 0.0, 1.0, 0.0),
			(3.0, 0.0, 0.3, 1.0, 0.0),
			(0.0, 1.0, 5.0, 2.0, 7.0),
			(1.0, 1.0, 6.0, 2.0, 7.0),
			(2.0, 1.0, 7.0, 3.0, 8.0),
			(3.0, 1.0, 8.0, 3.0, 8.0),
			(4.0, 1.0, 9.0, 2.0, 9.0),
			(5.0, 2.0, 4.0, 2.0, 0.0),
		]
	}

	fn options(root: &Path) -> ImportOptions {
		ImportOptions {
			output_root: root.to_path_buf(),
			format: "spc".to_string(),
			chunk_size: 3,
			..ImportOptions::default()
		}
	}

	#[test]
	fn scenario_a_splits_tree_ground_and_residual() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &scenario_rows());

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_a", "spc");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();

		assert_eq!(
			tile.summary,
			TileSummary {
				total: 10,
				tree: 5,
				ground: 4,
				residual: 1,
				dropped: 0,
			}
		);
		assert_eq!(tile.tree.count, 5);
		assert_eq!(tile.ground.count, 4);
		assert_eq!(tile.residual.count, 1);
		assert_eq!(tile.crs_epsg, Some(3067));

		let residual = read_all(&outputs.residual);
		assert_eq!(residual.position(0), Vector3::new(5.0, 2.0, 4.0));
	}

	#[test]
	fn scenario_d_residual_disabled_keeps_invalid_instances_as_tree() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &scenario_rows());

		let options = ImportOptions {
			include_residual: false,
			..options(dir.path())
		};
		let classifier = TileClassifier::new(SpcCodec, &options).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_d", "spc");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();

		assert_eq!(tile.summary.tree, 6);
		assert_eq!(tile.summary.residual, 0);
		assert_eq!(tile.residual.path, None);
		assert!(!outputs.residual.exists());
		assert_eq!(tile.outputs().len(), 2);
	}

	#[test]
	fn missing_instance_attribute_makes_tree_points_residual() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(false), &scenario_rows());

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_n", "spc");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();

		assert_eq!(tile.summary.tree, 0);
		assert_eq!(tile.summary.residual, 6);
		assert_eq!(tile.summary.ground, 4);
	}

	#[test]
	fn nan_and_negative_instances_are_residual() {
		let rows = vec![
			(0.0, 0.0, 0.0, 2.0, f64::NAN),
			(0.0, 0.0, 0.0, 2.0, -1.0),
			(0.0, 0.0, 0.0, 2.0, 0.5),
			(0.0, 0.0, 0.0, 9.0, 3.0),
		];
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &rows);

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_x", "spc");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();
		assert_eq!(
			tile.summary,
			TileSummary {
				total: 4,
				tree: 1,
				ground: 0,
				residual: 2,
				dropped: 1,
			}
		);
	}

	#[test]
	fn outputs_keep_header_and_bytes() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		let header = header(true);
		write_tile(&source, &header, &scenario_rows());
		let input = read_all(&source);

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_h", "spc");
		classifier.classify_tile(&source, &outputs).unwrap();

		let reader = SpcReader::open(&outputs.ground).unwrap();
		assert_eq!(reader.header().cloud(), &header);
		let ground = read_all(&outputs.ground);
		for i in 0..4 {
			assert_eq!(ground.record(i), input.record(i));
		}
		let tree = read_all(&outputs.tree);
		let expected: Vec<&[u8]> = (4..9).map(|i| input.record(i)).collect();
		let actual: Vec<&[u8]> = (0..tree.len()).map(|i| tree.record(i)).collect();
		assert_eq!(actual, expected);
	}

	#[test]
	fn donor_header_keys_reach_every_output() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		let mut json = serde_json::to_value(header(true)).unwrap();
		json["acquisition"] = serde_json::json!("MLS-2025");
		let donor = SpcHeader::from_raw(serde_json::to_vec_pretty(&json).unwrap()).unwrap();
		write_tile_with(&source, &donor, &scenario_rows());

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_k", "spc");
		classifier.classify_tile(&source, &outputs).unwrap();

		for path in [&outputs.tree, &outputs.ground, &outputs.residual] {
			let reader = SpcReader::open(path).unwrap();
			assert_eq!(reader.header().raw(), donor.raw());
			assert!(String::from_utf8_lossy(reader.header().raw()).contains("MLS-2025"));
		}
	}

	#[test]
	fn bounding_boxes_match_written_points() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &scenario_rows());

		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_b", "spc");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();

		for (role, sink) in tile.outputs() {
			let written = read_all(sink.path.as_deref().unwrap());
			assert_eq!(sink.bbox, BoundingBox::from_points(&written.positions()), "{:?}", role);
		}
	}

	#[test]
	fn rerun_is_byte_identical() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &scenario_rows());
		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();

		let first = TileOutputs::in_dir(dir.path(), "run1", "spc");
		let second = TileOutputs::in_dir(dir.path(), "run2", "spc");
		let a = classifier.classify_tile(&source, &first).unwrap();
		let b = classifier.classify_tile(&source, &second).unwrap();

		assert_eq!(a.summary, b.summary);
		for (x, y) in [
			(&first.tree, &second.tree),
			(&first.ground, &second.ground),
			(&first.residual, &second.residual),
		] {
			assert_eq!(fs::read(x).unwrap(), fs::read(y).unwrap());
		}
	}

	#[test]
	fn missing_source_is_not_found_and_writes_nothing() {
		let dir = TempDir::new().unwrap();
		let classifier = TileClassifier::new(SpcCodec, &options(dir.path())).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_m", "spc");
		let err = classifier
			.classify_tile(&dir.path().join("absent.spc"), &outputs)
			.unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
		assert!(!outputs.tree.exists());
	}

	#[test]
	fn missing_semantic_attribute_is_configuration_error() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw.spc");
		write_tile(&source, &header(true), &scenario_rows());

		let options = ImportOptions {
			semantic_dim: "classification".to_string(),
			..options(dir.path())
		};
		let classifier = TileClassifier::new(SpcCodec, &options).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_c", "spc");
		let err = classifier.classify_tile(&source, &outputs).unwrap_err();
		assert!(matches!(err, Error::Configuration(_)));
		assert!(!outputs.tree.exists());
	}

	#[test]
	fn tile_ids_follow_file_names() {
		assert_eq!(derive_tile_id(Path::new("/raw/MLS_Tile_07.spc"), 3), "MLS_Tile_07");
		assert_eq!(derive_tile_id(Path::new("/raw/tile12.spc"), 0), "tile12");
		assert_eq!(derive_tile_id(Path::new("/raw/stand123.spc"), 4), "tile_0004");
	}

	#[test]
	fn import_writes_records_for_enabled_roles() {
		let dir = TempDir::new().unwrap();
		let raw = dir.path().join("raw");
		fs::create_dir_all(&raw).unwrap();
		let first = raw.join("plot_tile_01.spc");
		let second = raw.join("north.spc");
		write_tile(&first, &header(true), &scenario_rows());
		write_tile(&second, &header(true), &scenario_rows()[..4]);

		let root = dir.path().join("campaigns");
		let options = ImportOptions {
			include_ground: false,
			..options(&root)
		};
		let records = import_campaign_tiles("C1", &[&first, &second], &options).unwrap();

		let uids: Vec<&str> = records.iter().map(|r| r.asset_uid.as_str()).collect();
		assert_eq!(
			uids,
			vec![
				"pc_C1_plot_tile_01_tree_pack",
				"pc_C1_plot_tile_01_residual",
				"pc_C1_tile_0001_tree_pack",
				"pc_C1_tile_0001_residual",
			]
		);
		assert_eq!(records[0].uri, "C1/tiles/plot_tile_01_tree_pack.spc");
		assert_eq!(records[0].point_count, 5);
		assert_eq!(records[1].pc_role, "background_residual");
		assert_eq!(records[2].point_count, 0);
		assert_eq!(records[2].bbox, None);
		assert!(root.join("C1/tiles/tile_0001_tree_pack.spc").exists());
		assert!(!root.join("C1/tiles/plot_tile_01_ground_only.spc").exists());
		for record in &records {
			assert_eq!(record.format, "SPC");
			assert_eq!(record.crs_epsg, Some(3067));
			assert_eq!(record.bytes, fs::metadata(root.join(&record.uri)).unwrap().len());
		}
	}

	#[test]
	fn laz_tiles_split_into_laz_packs() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("raw").join("MLS_Tile_07.las");
		fs::create_dir_all(source.parent().unwrap()).unwrap();
		las_tiles::write_tile(&source, &scenario_rows(), true, false);

		let root = dir.path().join("campaigns");
		let options = ImportOptions {
			output_root: root.clone(),
			chunk_size: 3,
			..ImportOptions::default()
		};
		let records = import_campaign_tiles("C2", &[&source], &options).unwrap();

		let counts: Vec<(&str, u64)> = records
			.iter()
			.map(|r| (r.pc_role.as_str(), r.point_count))
			.collect();
		assert_eq!(
			counts,
			vec![("tree_pack", 5), ("ground_only", 4), ("background_residual", 1)]
		);
		assert_eq!(records[0].uri, "C2/tiles/MLS_Tile_07_tree_pack.laz");
		for record in &records {
			assert_eq!(record.format, "LAZ");
			assert_eq!(record.crs_epsg, Some(3067));
		}

		let input = las_tiles::read_points(&source);
		let tree = las_tiles::read_points(&root.join(&records[0].uri));
		assert_eq!(tree, input[4..9].to_vec());
		let residual = las_tiles::read_points(&root.join(&records[2].uri));
		assert_eq!(residual, vec![input[9].clone()]);
	}

	#[test]
	fn standard_las_dimensions_can_drive_classification() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("tile_s.las");
		las_tiles::write_tile(&source, &scenario_rows(), true, false);

		let options = ImportOptions {
			semantic_dim: "classification".to_string(),
			format: "las".to_string(),
			..options(dir.path())
		};
		let classifier = TileClassifier::new(LasCodec::las(), &options).unwrap();
		let outputs = TileOutputs::in_dir(dir.path(), "tile_s", "las");
		let tile = classifier.classify_tile(&source, &outputs).unwrap();
		// every point carries the default class 0, which neither set names
		assert_eq!(tile.summary.total, 10);
		assert_eq!(tile.summary.dropped, 10);
		assert_eq!(tile.tree.count, 0);
		assert!(outputs.tree.exists());
	}

	#[test]
	fn configured_format_must_match_codec() {
		let dir = TempDir::new().unwrap();
		let err = TileClassifier::new(LasCodec::laz(), &options(dir.path())).err().unwrap();
		assert!(matches!(err, Error::Configuration(_)));
	}

	fn row_strategy() -> impl Strategy<Value = Row> {
		(
			-100.0..100.0f64,
			-100.0..100.0f64,
			0.0..50.0f64,
			0u8..6,
			prop_oneof![Just(f64::NAN), -3.0..3.0f64, 1.0..50.0f64],
		)
			.prop_map(|(x, y, z, c, i)| (x, y, z, f64::from(c), i))
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(64))]

		#[test]
		fn masks_are_disjoint_and_conserve_points(
			rows in prop::collection::vec(row_strategy(), 0..200),
			residual in any::<bool>(),
			chunk_size in 1usize..50,
		) {
			let dir = TempDir::new().unwrap();
			let source = dir.path().join("raw.spc");
			write_tile(&source, &header(true), &rows);

			let options = ImportOptions {
				include_residual: residual,
				chunk_size,
				..options(dir.path())
			};
			let rules = ClassRules::from_options(&options);
			let mut reader = SpcReader::open(&source).unwrap();
			while let Some(chunk) = reader.read_chunk(chunk_size).unwrap() {
				let masks = compute_masks(&chunk, &rules).unwrap();
				prop_assert!(masks.is_disjoint());
				if !residual {
					prop_assert_eq!(Masks::count(&masks.residual), 0);
				}
			}

			let classifier = TileClassifier::new(SpcCodec, &options).unwrap();
			let outputs = TileOutputs::in_dir(dir.path(), "tile_p", "spc");
			let tile = classifier.classify_tile(&source, &outputs).unwrap();
			let s = tile.summary;
			prop_assert_eq!(s.total, rows.len() as u64);
			prop_assert_eq!(s.tree + s.ground + s.residual + s.dropped, s.total);
			prop_assert_eq!(tile.tree.count, s.tree);
			prop_assert_eq!(tile.ground.count, s.ground);
			prop_assert_eq!(tile.residual.count, s.residual);
		}
	}
}
