//! File-backed persistence for the single credential record.
//!
//! The store owns the durable copy of the credential at a fixed local path. Absence is a normal
//! state: a missing, empty, or schema-invalid file reads as "no credentials" rather than an
//! error, so corrupt or foreign contents never block re-authorization. Writes are best-effort
//! whole-file overwrites; see DESIGN.md for the crash-atomicity decision.

// std
use std::{
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};
// self
use crate::{_prelude::*, auth::Credential, error::ConfigError};

/// Credential file name under the user's home directory.
pub const STORE_FILE_NAME: &str = ".bitbucket-oauth.json";

/// Error type produced by [`FileStore`] operations.
///
/// Missing or corrupt files are *not* errors; they surface as absence from
/// [`FileStore::load`].
#[derive(Debug, ThisError)]
pub enum StoreError {
	/// Filesystem failure other than "file not found" (permissions, disk full).
	#[error("Credential store I/O failure at {path}: {source}")]
	Io {
		/// Path of the credential file involved.
		path: PathBuf,
		/// Underlying filesystem failure.
		#[source]
		source: std::io::Error,
	},
	/// The record could not be serialized for writing.
	#[error("Failed to serialize the credential record.")]
	Serialize {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Reads and writes the single credential record at a fixed local path.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}
impl FileStore {
	/// Opens the store at the default location, `$HOME/.bitbucket-oauth.json`.
	pub fn from_home() -> Result<Self, ConfigError> {
		let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;

		Ok(Self::at(home.join(STORE_FILE_NAME)))
	}

	/// Opens the store at an explicit path.
	pub fn at(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Returns the path backing this store.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the stored record, or `None` when the file is missing, empty, or fails schema
	/// validation.
	pub fn load(&self) -> Result<Option<Credential>, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(self.io_error(e)),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		Ok(serde_json::from_slice(&bytes).ok())
	}

	/// Persists the record as the file's entire content, creating parent directories as needed.
	pub fn save(&self, record: &Credential) -> Result<(), StoreError> {
		self.ensure_parent_exists()?;

		let serialized =
			serde_json::to_vec_pretty(record).map_err(|e| StoreError::Serialize { source: e })?;

		fs::write(&self.path, serialized).map_err(|e| self.io_error(e))
	}

	/// Truncates the file to empty if present; a no-op when absent.
	pub fn clear(&self) -> Result<(), StoreError> {
		if !self.path.exists() {
			return Ok(());
		}

		fs::write(&self.path, []).map_err(|e| self.io_error(e))
	}

	fn ensure_parent_exists(&self) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Io {
				path: parent.to_path_buf(),
				source: e,
			})?;
		}

		Ok(())
	}

	fn io_error(&self, source: std::io::Error) -> StoreError {
		StoreError::Io { path: self.path.clone(), source }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::temp_store_path;

	#[test]
	fn empty_file_reads_as_absent() {
		let path = temp_store_path("empty");
		let store = FileStore::at(&path);

		fs::write(&path, []).expect("Writing the empty fixture file should succeed.");

		let loaded = store.load().expect("Loading an empty file should not fail.");

		assert!(loaded.is_none());

		fs::remove_file(&path).expect("Removing the fixture file should succeed.");
	}

	#[test]
	fn clear_on_a_missing_file_is_a_no_op() {
		let path = temp_store_path("clear_missing");
		let store = FileStore::at(&path);

		store.clear().expect("Clearing an absent store should succeed.");

		assert!(!path.exists(), "Clear must not create the file.");
	}
}
