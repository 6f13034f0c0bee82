//! Block-file storage for stratadb
//!
//! This module handles direct file I/O: each heap file is backed by
//! one on-disk file holding a sequence of fixed-size blocks keyed by
//! 1-based block id.

use crate::error::{Error, Result};
use crate::storage::page::BLOCK_SZ;
use crate::storage::value::BlockId;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The storage environment: the directory all backing files live in.
///
/// One environment handle is acquired at process start-up and threaded
/// through the catalog and the executor.
#[derive(Debug, Clone)]
pub struct DbEnv {
    root: PathBuf,
}

impl DbEnv {
    /// Open an environment rooted at the given directory, creating the
    /// directory if it does not exist yet
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The environment directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the backing file for the named heap file
    pub fn db_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.db", name))
    }
}

/// A persistent array of `BLOCK_SZ`-byte blocks keyed by 1-based id.
///
/// Appends are driven by the heap file's own block counter; the store
/// just reads and writes at `(id - 1) * BLOCK_SZ`.
#[derive(Debug)]
pub struct BlockFile {
    path: PathBuf,
    file: File,
}

impl BlockFile {
    /// Create the backing file. Fails with `Conflict` if it already
    /// exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::Conflict(format!("file '{}' already exists", path.display()))
                } else {
                    Error::Io(e)
                }
            })?;
        Ok(Self { path, file })
    }

    /// Open an existing backing file. Fails with `NotFound` if it is
    /// absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(format!("file '{}' does not exist", path.display()))
                } else {
                    Error::Io(e)
                }
            })?;
        Ok(Self { path, file })
    }

    /// Read the block with the given id
    pub fn get(&mut self, block_id: BlockId) -> Result<Vec<u8>> {
        let mut data = vec![0u8; BLOCK_SZ];
        self.file.seek(SeekFrom::Start(Self::offset(block_id)))?;
        self.file.read_exact(&mut data).map_err(|e| {
            Error::Storage(format!(
                "short read of block {} in '{}': {}",
                block_id,
                self.path.display(),
                e
            ))
        })?;
        Ok(data)
    }

    /// Write the block with the given id
    pub fn put(&mut self, block_id: BlockId, data: &[u8]) -> Result<()> {
        debug_assert_eq!(data.len(), BLOCK_SZ);
        self.file.seek(SeekFrom::Start(Self::offset(block_id)))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    /// Number of blocks currently stored
    pub fn stat(&self) -> Result<u32> {
        let len = self.file.metadata()?.len();
        Ok((len / BLOCK_SZ as u64) as u32)
    }

    /// Remove the backing file at the given path
    pub fn remove_file(path: impl AsRef<Path>) -> Result<()> {
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn offset(block_id: BlockId) -> u64 {
        (block_id as u64 - 1) * BLOCK_SZ as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_put_get() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.db");

        let mut file = BlockFile::create(&path).unwrap();
        let block = vec![7u8; BLOCK_SZ];
        file.put(1, &block).unwrap();
        assert_eq!(file.get(1).unwrap(), block);
        assert_eq!(file.stat().unwrap(), 1);
    }

    #[test]
    fn test_create_twice_conflicts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.db");

        BlockFile::create(&path).unwrap();
        assert!(matches!(
            BlockFile::create(&path),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_open_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(matches!(BlockFile::open(&path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reopen_sees_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.db");

        {
            let mut file = BlockFile::create(&path).unwrap();
            file.put(1, &vec![1u8; BLOCK_SZ]).unwrap();
            file.put(2, &vec![2u8; BLOCK_SZ]).unwrap();
        }

        let mut file = BlockFile::open(&path).unwrap();
        assert_eq!(file.stat().unwrap(), 2);
        assert_eq!(file.get(2).unwrap(), vec![2u8; BLOCK_SZ]);
    }

    #[test]
    fn test_env_paths() {
        let dir = tempdir().unwrap();
        let env = DbEnv::open(dir.path().join("data")).unwrap();
        assert!(env.root().is_dir());
        assert_eq!(
            env.db_path("foo"),
            dir.path().join("data").join("foo.db")
        );
    }
}
