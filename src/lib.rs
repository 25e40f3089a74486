//! Splits labelled point-cloud tiles into tree, ground and residual packs,
//! and merges the packs of a campaign into single files.
//!
//! Every produced file is described by an [`asset::AssetRecord`] that the
//! caller persists.

pub mod asset;
pub mod classify;
pub mod codec;
pub mod convert;
pub mod error;
pub mod merge;
pub mod model;
pub mod sink;

pub use asset::{AssetRecord, Role, Scope};
pub use classify::{import_campaign_tiles, TileClassifier};
pub use error::{Error, Result};
pub use merge::{merge_campaign_tiles, CampaignMerger};
pub use model::options::{ImportOptions, MergeOptions};
