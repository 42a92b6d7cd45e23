//! Fixed-size non-volatile byte regions.
//!
//! [`Nvm`] models the microcontroller's `nvm` array: a byte region whose size
//! never changes, addressed by offset. [`MemoryNvm`] keeps it in RAM and
//! [`FileNvm`] backs it with a file so a host build keeps tokens across runs.
use crate::error::NvmError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait Nvm {
    /// Size of the region in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` with the bytes starting at `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError>;

    /// Write `data` starting at `offset` in a single call.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError>;

    fn read_vec(&self, offset: usize, len: usize) -> Result<Vec<u8>, NvmError> {
        let mut buf = vec![0u8; len];
        self.read(offset, &mut buf)?;
        Ok(buf)
    }
}

fn check_bounds(offset: usize, len: usize, size: usize) -> Result<(), NvmError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(NvmError::OutOfBounds { offset, len, size }),
    }
}

/// In-memory region, zero-filled on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNvm {
    bytes: Vec<u8>,
}

impl MemoryNvm {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Nvm for MemoryNvm {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
        check_bounds(offset, buf.len(), self.bytes.len())?;
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
        check_bounds(offset, data.len(), self.bytes.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// File-backed region. The file is created (or grown) zero-filled to `size`
/// bytes on open; every write is synced before returning.
#[derive(Debug)]
pub struct FileNvm {
    path: PathBuf,
    file: File,
    size: usize,
}

impl FileNvm {
    pub fn open(path: &Path, size: usize) -> Result<Self, NvmError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let current = file.metadata()?.len();
        if current < size as u64 {
            debug!("growing nvm file {} from {} to {} bytes", path.display(), current, size);
            file.set_len(size as u64)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Nvm for FileNvm {
    fn len(&self) -> usize {
        self.size
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
        check_bounds(offset, buf.len(), self.size)?;
        let mut f = &self.file;
        f.seek(SeekFrom::Start(offset as u64))?;
        f.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
        check_bounds(offset, data.len(), self.size)?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_nvm_rejects_out_of_bounds() {
        let mut nvm = MemoryNvm::new(4);
        assert!(nvm.write(2, b"abc").is_err());
        assert!(nvm.read_vec(0, 5).is_err());
        assert!(nvm.read_vec(usize::MAX, 1).is_err());
        nvm.write(1, b"abc").unwrap();
        assert_eq!(nvm.as_bytes(), b"\0abc");
    }
}
