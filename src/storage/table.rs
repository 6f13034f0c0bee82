//! Heap table storage for stratadb
//!
//! A heap table is a relation, an ordered list of named and typed
//! columns, backed by one heap file of the same name. Rows are
//! marshalled to a byte stream in declared column order:
//!
//! - `INT`: 4 bytes, little-endian i32
//! - `TEXT`: 2-byte little-endian length prefix, then the raw bytes
//! - `BOOLEAN`: 1 byte (catalog tables only)

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::disk::DbEnv;
use crate::storage::heap::HeapFile;
use crate::storage::page::MAX_RECORD_SZ;
use crate::storage::value::{DataType, Handle, Identifier, Row, Value};

/// A row-oriented relation over a heap file
#[derive(Debug)]
pub struct HeapTable {
    name: Identifier,
    column_names: Vec<Identifier>,
    column_attributes: Vec<DataType>,
    file: HeapFile,
}

impl HeapTable {
    /// Bind a relation to its backing heap file.
    ///
    /// `column_names` and `column_attributes` run in parallel and
    /// define the marshalling order.
    pub fn new(
        env: &DbEnv,
        name: &str,
        column_names: Vec<Identifier>,
        column_attributes: Vec<DataType>,
    ) -> Self {
        debug_assert_eq!(column_names.len(), column_attributes.len());
        Self {
            name: name.to_string(),
            column_names,
            column_attributes,
            file: HeapFile::new(env, name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_names(&self) -> &[Identifier] {
        &self.column_names
    }

    pub fn column_attributes(&self) -> &[DataType] {
        &self.column_attributes
    }

    /// Attributes for a projected subset of columns, in the requested
    /// order
    pub fn attributes_for(&self, columns: &[Identifier]) -> Result<Vec<DataType>> {
        columns
            .iter()
            .map(|c| {
                self.column_names
                    .iter()
                    .position(|n| n == c)
                    .map(|i| self.column_attributes[i])
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "column '{}' does not exist in '{}'",
                            c, self.name
                        ))
                    })
            })
            .collect()
    }

    /// Create the backing heap file
    pub fn create(&mut self) -> Result<()> {
        self.file.create()
    }

    /// Create the backing heap file, tolerating one that already
    /// exists
    pub fn create_if_not_exists(&mut self) -> Result<()> {
        match self.file.create() {
            Ok(()) => Ok(()),
            Err(Error::Conflict(_)) => self.file.open(),
            Err(e) => Err(e),
        }
    }

    /// Drop the backing heap file. The table is unusable afterwards.
    pub fn destroy(&mut self) -> Result<()> {
        self.file.destroy()
    }

    pub fn open(&mut self) -> Result<()> {
        self.file.open()
    }

    pub fn close(&mut self) {
        self.file.close()
    }

    /// Insert a row, spilling into a fresh block when the current tail
    /// block has no room. Returns the new row's handle.
    pub fn insert(&mut self, row: &Row) -> Result<Handle> {
        self.open()?;
        let row = self.validate(row)?;
        let record = self.marshal(&row)?;
        if record.len() > MAX_RECORD_SZ {
            return Err(Error::RowTooLarge(record.len()));
        }

        let block_id = self.file.last_block_id();
        let mut page = self.file.get(block_id)?;
        let handle = match page.add(&record) {
            Ok(record_id) => {
                self.file.put(&page)?;
                Handle::new(block_id, record_id)
            }
            Err(Error::NoRoom(_)) => {
                let mut page = self.file.get_new()?;
                let record_id = page.add(&record)?;
                self.file.put(&page)?;
                Handle::new(page.block_id(), record_id)
            }
            Err(e) => return Err(e),
        };
        debug!(table = %self.name, handle = %handle, "inserted row");
        Ok(handle)
    }

    /// Update the row at the given handle. Not implemented.
    pub fn update(&mut self, _handle: Handle, _values: &Row) -> Result<()> {
        Err(Error::Unsupported("UPDATE is not implemented".to_string()))
    }

    /// Delete the row at the given handle
    pub fn delete(&mut self, handle: Handle) -> Result<()> {
        self.open()?;
        let mut page = self.file.get(handle.block_id)?;
        page.delete(handle.record_id)?;
        self.file.put(&page)?;
        debug!(table = %self.name, handle = %handle, "deleted row");
        Ok(())
    }

    /// Every live handle in the file, in block order then record
    /// order. Predicate filtering is the evaluation plan's job.
    pub fn select(&mut self) -> Result<Vec<Handle>> {
        self.open()?;
        let mut handles = Vec::new();
        for block_id in self.file.block_ids() {
            let page = self.file.get(block_id)?;
            for record_id in page.ids() {
                handles.push(Handle::new(block_id, record_id));
            }
        }
        Ok(handles)
    }

    /// Read the full row at the given handle
    pub fn project(&mut self, handle: Handle) -> Result<Row> {
        self.open()?;
        let page = self.file.get(handle.block_id)?;
        let record = page.get(handle.record_id).ok_or_else(|| {
            Error::Storage(format!(
                "no record at handle {} in '{}'",
                handle, self.name
            ))
        })?;
        self.unmarshal(record)
    }

    /// Read the row at the given handle, keeping only the requested
    /// columns. Unknown column names are silently omitted.
    pub fn project_columns(&mut self, handle: Handle, columns: &[Identifier]) -> Result<Row> {
        let mut row = self.project(handle)?;
        row.retain(|name, _| columns.contains(name));
        Ok(row)
    }

    /// Check a candidate row against the schema, producing a row that
    /// holds exactly the declared columns
    pub fn validate(&self, row: &Row) -> Result<Row> {
        let mut full = Row::new();
        for name in &self.column_names {
            let value = row
                .get(name)
                .ok_or_else(|| Error::MissingColumn(name.clone()))?;
            full.insert(name.clone(), value.clone());
        }
        Ok(full)
    }

    /// Serialize a validated row in declared column order
    pub fn marshal(&self, row: &Row) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for (name, attr) in self.column_names.iter().zip(&self.column_attributes) {
            let value = row
                .get(name)
                .ok_or_else(|| Error::MissingColumn(name.clone()))?;
            match (attr, value) {
                (DataType::Int, Value::Int(n)) => bytes.extend_from_slice(&n.to_le_bytes()),
                (DataType::Text, Value::Text(s)) => {
                    if s.len() > u16::MAX as usize {
                        return Err(Error::Unsupported(format!(
                            "text value for column '{}' exceeds {} bytes",
                            name,
                            u16::MAX
                        )));
                    }
                    bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
                    bytes.extend_from_slice(s.as_bytes());
                }
                (DataType::Boolean, Value::Bool(b)) => bytes.push(*b as u8),
                (attr, value) => {
                    return Err(Error::Unsupported(format!(
                        "cannot marshal {} value into {} column '{}'",
                        value.data_type(),
                        attr,
                        name
                    )))
                }
            }
        }
        Ok(bytes)
    }

    /// Inverse of `marshal`
    pub fn unmarshal(&self, record: &[u8]) -> Result<Row> {
        let mut row = Row::new();
        let mut offset = 0usize;
        let corrupt = || Error::Storage(format!("truncated record in '{}'", self.name));

        for (name, attr) in self.column_names.iter().zip(&self.column_attributes) {
            let value = match attr {
                DataType::Int => {
                    let raw: [u8; 4] = record
                        .get(offset..offset + 4)
                        .ok_or_else(corrupt)?
                        .try_into()
                        .unwrap();
                    offset += 4;
                    Value::Int(i32::from_le_bytes(raw))
                }
                DataType::Text => {
                    let raw: [u8; 2] = record
                        .get(offset..offset + 2)
                        .ok_or_else(corrupt)?
                        .try_into()
                        .unwrap();
                    offset += 2;
                    let len = u16::from_le_bytes(raw) as usize;
                    let text = record.get(offset..offset + len).ok_or_else(corrupt)?;
                    offset += len;
                    Value::Text(String::from_utf8_lossy(text).into_owned())
                }
                DataType::Boolean => {
                    let byte = *record.get(offset).ok_or_else(corrupt)?;
                    offset += 1;
                    Value::Bool(byte != 0)
                }
            };
            row.insert(name.clone(), value);
        }
        Ok(row)
    }
}
