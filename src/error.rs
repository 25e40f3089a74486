use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by tile import, merge and conversion.
///
/// Every variant is fatal to the operation that raised it. Files written
/// before the failure are left as they are and must be treated as invalid.
#[derive(Debug, Error)]
pub enum Error {
	/// An input file or directory does not exist.
	#[error("Path does not exist: {0}")]
	NotFound(PathBuf),

	/// Missing attribute, no qualifying inputs, or inconsistent options.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Read, write or codec failure.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	pub fn configuration(msg: impl Into<String>) -> Error {
		Error::Configuration(msg.into())
	}

	pub(crate) fn invalid_data(msg: impl Into<String>) -> Error {
		Error::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Error {
		Error::Io(io::Error::new(io::ErrorKind::InvalidData, err))
	}
}

impl From<las::Error> for Error {
	fn from(err: las::Error) -> Error {
		Error::Io(io::Error::new(io::ErrorKind::InvalidData, err))
	}
}

impl From<csv::Error> for Error {
	fn from(err: csv::Error) -> Error {
		Error::Io(io::Error::new(io::ErrorKind::InvalidData, err))
	}
}
