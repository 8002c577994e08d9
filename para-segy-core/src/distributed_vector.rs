//! A byte vector addressable by every rank of a communicator.
//!
//! Implementations may partition the ownership of the storage between ranks,
//! but must present one logical array: `get_n`/`set_n` accept any offset in
//! `[0, size())` regardless of which rank owns the bytes. Writes become
//! visible to the other ranks only after [`DistributedVector::sync`].
use crate::errors::PsgError;

/// The distributed byte vector contract.
pub trait DistributedVector {
    /// The current size in bytes.
    fn size(&self) -> u64;

    /// Truncate or extend to `new_size` bytes; new bytes are zeroed.
    fn resize(&mut self, new_size: u64) -> Result<(), PsgError>;

    /// Copy `buffer.len()` bytes starting at `offset` out of the vector.
    fn get_n(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError>;

    /// Copy `buffer.len()` bytes starting at `offset` into the vector.
    fn set_n(&mut self, offset: u64, buffer: &[u8]) -> Result<(), PsgError>;

    /// Make all writes visible to all ranks and to subsequent reads.
    fn sync(&mut self) -> Result<(), PsgError>;
}

fn check_bounds(offset: u64, len: usize, size: u64) -> Result<(), PsgError> {
    if offset + len as u64 > size {
        return Err(PsgError::OutOfRange {
            msg: format!(
                "byte range {}..{} is outside of the {}-byte vector",
                offset,
                offset + len as u64,
                size
            ),
        });
    }
    Ok(())
}

/// The single-process distributed vector: plain heap storage.
pub struct InMemoryVector {
    data: Vec<u8>,
}

impl InMemoryVector {
    pub fn new(size: u64) -> Result<Self, PsgError> {
        Ok(InMemoryVector {
            data: vec![0; size as usize],
        })
    }
}

impl DistributedVector for InMemoryVector {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn resize(&mut self, new_size: u64) -> Result<(), PsgError> {
        self.data.resize(new_size as usize, 0);
        Ok(())
    }

    fn get_n(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError> {
        check_bounds(offset, buffer.len(), self.size())?;
        let start = offset as usize;
        buffer.copy_from_slice(&self.data[start..start + buffer.len()]);
        Ok(())
    }

    fn set_n(&mut self, offset: u64, buffer: &[u8]) -> Result<(), PsgError> {
        check_bounds(offset, buffer.len(), self.size())?;
        let start = offset as usize;
        self.data[start..start + buffer.len()].copy_from_slice(buffer);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), PsgError> {
        Ok(())
    }
}
