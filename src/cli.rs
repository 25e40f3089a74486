//! Command-line definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use rusty_treepack::convert::ConvertOptions;
use rusty_treepack::{ImportOptions, MergeOptions, Result};

#[derive(Parser, Debug)]
#[command(
	name = "rusty-treepack",
	version,
	about = "Split labelled point-cloud tiles into tree packs and merge them per campaign"
)]
pub struct Cli {
	/// Log at debug level (RUST_LOG takes precedence)
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Split raw tiles into tree, ground and residual packs
	Import(ImportArgs),

	/// Merge the tree packs of a campaign into one file
	Merge(MergeArgs),

	/// Convert a labelled PCD file into an SPC tile
	ConvertPcd(ConvertArgs),

	/// Convert a labelled CSV file into an SPC tile
	ConvertCsv(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
	/// Campaign identifier
	#[arg(long)]
	pub campaign: String,

	/// Input tiles, processed in the given order
	#[arg(required = true)]
	pub inputs: Vec<PathBuf>,

	/// JSON file with import options; flags below override it
	#[arg(long)]
	pub config: Option<PathBuf>,

	#[arg(long)]
	pub output_root: Option<PathBuf>,

	/// Tile format: las, laz or spc
	#[arg(long)]
	pub format: Option<String>,

	#[arg(long)]
	pub semantic_dim: Option<String>,

	#[arg(long)]
	pub instance_dim: Option<String>,

	#[arg(long)]
	pub score_dim: Option<String>,

	/// Do not look for a score attribute
	#[arg(long, conflicts_with = "score_dim")]
	pub no_score_dim: bool,

	/// Semantic code meaning ground (repeatable)
	#[arg(long = "ground-class")]
	pub ground_classes: Vec<i64>,

	/// Semantic code meaning tree (repeatable)
	#[arg(long = "tree-class")]
	pub tree_classes: Vec<i64>,

	/// Write ground-only packs (`--include-ground=false` to skip them)
	#[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
	pub include_ground: Option<bool>,

	/// Separate residual points (`--include-residual=false` to keep them as tree)
	#[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
	pub include_residual: Option<bool>,

	/// Same as `--include-ground=false`
	#[arg(long, conflicts_with = "include_ground")]
	pub no_ground: bool,

	/// Same as `--include-residual=false`
	#[arg(long, conflicts_with = "include_residual")]
	pub no_residual: bool,

	#[arg(long)]
	pub chunk_size: Option<usize>,
}

impl ImportArgs {
	pub fn options(&self) -> Result<ImportOptions> {
		let mut options = match &self.config {
			Some(path) => ImportOptions::from_json_file(path)?,
			None => ImportOptions::default(),
		};
		if let Some(root) = &self.output_root {
			options.output_root = root.clone();
		}
		if let Some(format) = &self.format {
			options.format = format.clone();
		}
		if let Some(dim) = &self.semantic_dim {
			options.semantic_dim = dim.clone();
		}
		if let Some(dim) = &self.instance_dim {
			options.instance_dim = dim.clone();
		}
		if let Some(dim) = &self.score_dim {
			options.score_dim = Some(dim.clone());
		}
		if self.no_score_dim {
			options.score_dim = None;
		}
		if !self.ground_classes.is_empty() {
			options.ground_classes = self.ground_classes.clone();
		}
		if !self.tree_classes.is_empty() {
			options.tree_classes = self.tree_classes.clone();
		}
		if let Some(include) = self.include_ground {
			options.include_ground = include;
		}
		if let Some(include) = self.include_residual {
			options.include_residual = include;
		}
		if self.no_ground {
			options.include_ground = false;
		}
		if self.no_residual {
			options.include_residual = false;
		}
		if let Some(size) = self.chunk_size {
			options.chunk_size = size;
		}
		Ok(options)
	}
}

#[derive(Args, Debug)]
pub struct MergeArgs {
	/// Campaign identifier
	#[arg(long)]
	pub campaign: String,

	/// JSON file with merge options; flags below override it
	#[arg(long)]
	pub config: Option<PathBuf>,

	#[arg(long)]
	pub input_root: Option<PathBuf>,

	#[arg(long)]
	pub output_root: Option<PathBuf>,

	/// Pack format: las, laz or spc
	#[arg(long)]
	pub format: Option<String>,

	/// Append ground-only packs after the tree packs
	#[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
	pub include_ground: Option<bool>,

	/// Append residual packs last
	#[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
	pub include_residual: Option<bool>,

	/// File name of the merged output
	#[arg(long)]
	pub out_filename: Option<String>,

	#[arg(long)]
	pub chunk_size: Option<usize>,
}

impl MergeArgs {
	pub fn options(&self) -> Result<MergeOptions> {
		let mut options = match &self.config {
			Some(path) => MergeOptions::from_json_file(path)?,
			None => MergeOptions::default(),
		};
		if let Some(root) = &self.input_root {
			options.input_root = root.clone();
		}
		if let Some(root) = &self.output_root {
			options.output_root = Some(root.clone());
		}
		if let Some(format) = &self.format {
			options.format = format.clone();
		}
		if let Some(include) = self.include_ground {
			options.include_ground = include;
		}
		if let Some(include) = self.include_residual {
			options.include_residual = include;
		}
		if let Some(name) = &self.out_filename {
			options.out_filename = Some(name.clone());
		}
		if let Some(size) = self.chunk_size {
			options.chunk_size = size;
		}
		Ok(options)
	}
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
	pub source: PathBuf,

	pub destination: PathBuf,

	/// EPSG code written into the header
	#[arg(long)]
	pub epsg: Option<u32>,

	/// CSV column stored as integer (repeatable)
	#[arg(long = "integer-column")]
	pub integer_columns: Vec<String>,

	#[arg(long)]
	pub chunk_size: Option<usize>,
}

impl ConvertArgs {
	pub fn options(&self) -> ConvertOptions {
		let mut options = ConvertOptions {
			epsg: self.epsg,
			..ConvertOptions::default()
		};
		if !self.integer_columns.is_empty() {
			options.integer_columns = self.integer_columns.clone();
		}
		if let Some(size) = self.chunk_size {
			options.chunk_size = size;
		}
		options
	}
}
