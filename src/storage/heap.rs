//! Heap file storage for stratadb
//!
//! A heap file manages an ordered sequence of slotted-page blocks,
//! numbered 1..=last, stored in a block file named `<name>.db` inside
//! the environment directory. The first block exists from the moment
//! the file is created.

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::disk::{BlockFile, DbEnv};
use crate::storage::page::SlottedPage;
use crate::storage::value::{BlockId, Identifier};
use std::path::PathBuf;

/// A multi-block container over one block file
#[derive(Debug)]
pub struct HeapFile {
    name: Identifier,
    path: PathBuf,
    last: BlockId,
    closed: bool,
    file: Option<BlockFile>,
}

impl HeapFile {
    /// Bind a heap file to its backing path. No I/O happens until
    /// `create` or `open`.
    pub fn new(env: &DbEnv, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: env.db_path(name),
            last: 0,
            closed: true,
            file: None,
        }
    }

    /// The heap file's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the backing file (failing if it exists) and allocate the
    /// first block so `block_ids` is never empty
    pub fn create(&mut self) -> Result<()> {
        let file = BlockFile::create(&self.path)?;
        self.file = Some(file);
        self.closed = false;
        self.last = 0;
        self.get_new()?;
        debug!(name = %self.name, "created heap file");
        Ok(())
    }

    /// Open the existing backing file and learn the block count from
    /// it. Idempotent when already open.
    pub fn open(&mut self) -> Result<()> {
        if !self.closed {
            return Ok(());
        }
        let file = BlockFile::open(&self.path)?;
        self.last = file.stat()?;
        self.file = Some(file);
        self.closed = false;
        Ok(())
    }

    /// Close the backing file. Idempotent.
    pub fn close(&mut self) {
        self.file = None;
        self.closed = true;
    }

    /// Close and remove the backing file
    pub fn destroy(&mut self) -> Result<()> {
        self.close();
        BlockFile::remove_file(&self.path)?;
        debug!(name = %self.name, "dropped heap file");
        Ok(())
    }

    /// Allocate a fresh, empty block at the end of the file and return
    /// an initialized slotted-page view over it
    pub fn get_new(&mut self) -> Result<SlottedPage> {
        self.open()?;
        self.last += 1;
        let page = SlottedPage::new(self.last);
        self.block_file()?.put(page.block_id(), page.bytes())?;
        debug!(name = %self.name, block_id = self.last, "allocated block");
        Ok(page)
    }

    /// Load the block with the given id
    pub fn get(&mut self, block_id: BlockId) -> Result<SlottedPage> {
        self.open()?;
        let data = self.block_file()?.get(block_id)?;
        SlottedPage::from_bytes(block_id, data)
    }

    /// Persist the given block under its id.
    ///
    /// Every block mutated by a caller must come back through here;
    /// a dirty page dropped without a put is lost.
    pub fn put(&mut self, page: &SlottedPage) -> Result<()> {
        self.open()?;
        self.block_file()?.put(page.block_id(), page.bytes())
    }

    /// Ascending ids of all blocks in the file
    pub fn block_ids(&self) -> Vec<BlockId> {
        (1..=self.last).collect()
    }

    /// The highest allocated block id (0 when the file is empty)
    pub fn last_block_id(&self) -> BlockId {
        self.last
    }

    fn block_file(&mut self) -> Result<&mut BlockFile> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::Storage(format!("heap file '{}' is not open", self.name)))
    }
}
