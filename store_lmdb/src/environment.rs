//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbError, LmdbVerificationStore};

/// Default map size: 1 GiB is far beyond what attempt logs grow to.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;
/// Named databases opened by [`LmdbEnvironment::open`].
pub const DATABASE_COUNT: u32 = 3;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    attempts_db: Database<Bytes, Bytes>,
    tokens_db: Database<Bytes, Bytes>,
    registry_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: each environment directory is opened once per process; the
        // engine never opens the same path twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let attempts_db = env.create_database(&mut wtxn, Some("attempts"))?;
        let tokens_db = env.create_database(&mut wtxn, Some("company_tokens"))?;
        let registry_db = env.create_database(&mut wtxn, Some("registry_results"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            attempts_db,
            tokens_db,
            registry_db,
        })
    }

    /// Open with the default map size.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, DATABASE_COUNT, DEFAULT_MAP_SIZE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A verification store backed by this environment.
    pub fn verification_store(&self) -> LmdbVerificationStore {
        LmdbVerificationStore {
            env: Arc::clone(&self.env),
            attempts_db: self.attempts_db,
            tokens_db: self.tokens_db,
            registry_db: self.registry_db,
        }
    }
}
