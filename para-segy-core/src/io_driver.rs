// Copyright (C) 2023 by GiGa infosystems
//! The parallel IO drivers.
//!
//! An IO driver is the sole mutator of one open backing object (a shared
//! file on disk, or an in-memory distributed vector) and exposes the three
//! access shapes the file layers need: contiguous, strided and
//! list-of-offsets. All operations are collective over the communicator the
//! driver was built with: every rank must call, ranks with nothing to
//! transfer included (a zero-length transfer is legal and participates).
//!
//! The underlying transport limits a single call to a signed 32-bit byte
//! count. Each rank therefore fragments its transfer into rounds of at most
//! [`IoDriverOpt::max_io_chunk_size`] bytes, the ranks agree on the largest
//! round count, and every rank performs exactly that many rounds so the
//! collective completes without deadlock.
use crate::communicator::Communicator;
use crate::distributed_vector::DistributedVector;
use crate::errors::PsgError;

use log::{debug, warn};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::sync::Arc;

/// The file modes possible for files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Read-only mode.
    Read,
    /// Write-only mode, creating the file if needed.
    Write,
    /// Read or write, creating the file if needed.
    ReadWrite,
}

/// The IO driver options.
#[derive(Debug, Clone)]
pub struct IoDriverOpt {
    /// Whether transfers are issued as collective operations (ranks agree on
    /// a common round count) or independently.
    pub use_collective_operations: bool,
    /// The maximum number of bytes a single transport call may move. The
    /// default is the transport's signed 32-bit count limit.
    pub max_io_chunk_size: usize,
}

impl Default for IoDriverOpt {
    fn default() -> Self {
        IoDriverOpt {
            use_collective_operations: true,
            max_io_chunk_size: i32::MAX as usize,
        }
    }
}

/// Read/write access to one open backing object.
///
/// Every byte range passed to a transfer must lie within `[0, file_size())`;
/// violations fail with [`PsgError::OutOfRange`] before any data moves.
/// Transport errors are fail-stop for the session: the first failure is
/// recorded and every later call returns [`PsgError::SessionFailed`].
pub trait IoDriver {
    /// Whether the backing object is open for transfers.
    fn is_open(&self) -> bool;

    /// A human readable name of the backing object, for diagnostics.
    fn file_name(&self) -> &str;

    /// The size of the backing object in bytes. Collective.
    fn file_size(&self) -> Result<u64, PsgError>;

    /// Truncate or extend the backing object. Collective.
    fn set_file_size(&mut self, size: u64) -> Result<(), PsgError>;

    /// Read `buffer.len()` contiguous bytes starting at `offset`. Collective;
    /// each rank may pass a distinct range, and an empty buffer is a legal
    /// way to participate.
    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError>;

    /// Write `buffer.len()` contiguous bytes starting at `offset`. Collective.
    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<(), PsgError>;

    /// Read `number_of_blocks` blocks of `block_size` bytes whose starts are
    /// `stride_size` bytes apart, the first at `offset`. Requires
    /// `stride_size >= block_size`. Collective.
    fn read_strided(
        &self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &mut [u8],
    ) -> Result<(), PsgError>;

    /// The write counterpart of [`IoDriver::read_strided`].
    fn write_strided(
        &mut self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &[u8],
    ) -> Result<(), PsgError>;

    /// Read one `block_size`d block at each of the given absolute offsets,
    /// which need not be monotonic. Collective.
    fn read_offsets(
        &self,
        block_size: usize,
        offsets: &[u64],
        buffer: &mut [u8],
    ) -> Result<(), PsgError>;

    /// The write counterpart of [`IoDriver::read_offsets`].
    fn write_offsets(
        &mut self,
        block_size: usize,
        offsets: &[u64],
        buffer: &[u8],
    ) -> Result<(), PsgError>;

    /// Make all writes visible to all ranks and to subsequent reads.
    /// Collective; establishes the happens-before boundary between writers
    /// and readers.
    fn sync(&mut self) -> Result<(), PsgError>;

    /// The communicator the driver performs its collectives over.
    fn communicator(&self) -> &Arc<dyn Communicator>;
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// The number of transfer rounds every rank will perform: the largest local
/// round count of the group in collective mode, the local count otherwise.
fn transfer_rounds(
    communicator: &dyn Communicator,
    collective: bool,
    local_calls: usize,
) -> Result<usize, PsgError> {
    if collective {
        Ok(communicator.max(local_calls as u64)? as usize)
    } else {
        Ok(local_calls)
    }
}

fn check_session(session_error: &RefCell<Option<String>>) -> Result<(), PsgError> {
    if let Some(msg) = session_error.borrow().as_ref() {
        return Err(PsgError::SessionFailed { msg: msg.clone() });
    }
    Ok(())
}

fn poison(
    session_error: &RefCell<Option<String>>,
    file_name: &str,
    error: PsgError,
) -> PsgError {
    warn!("IO driver '{}' entering failed state: {}", file_name, error);
    *session_error.borrow_mut() = Some(error.to_string());
    error
}

fn check_contiguous(offset: u64, len: usize, size: u64) -> Result<(), PsgError> {
    if offset + len as u64 > size {
        return Err(PsgError::OutOfRange {
            msg: format!(
                "byte range {}..{} is outside of the {}-byte backing object",
                offset,
                offset + len as u64,
                size
            ),
        });
    }
    Ok(())
}

fn check_strided(
    offset: u64,
    block_size: usize,
    stride_size: usize,
    number_of_blocks: usize,
    size: u64,
) -> Result<(), PsgError> {
    if number_of_blocks == 0 {
        return check_contiguous(offset, 0, size);
    }
    let last = offset + (number_of_blocks as u64 - 1) * stride_size as u64;
    check_contiguous(last, block_size, size)
}

/// A shared file on disk, accessed with positional reads and writes so that
/// all ranks can address the same handle without seeking.
pub struct IoDriverFile {
    file: std::fs::File,
    file_name: String,
    communicator: Arc<dyn Communicator>,
    opt: IoDriverOpt,
    session_error: RefCell<Option<String>>,
}

impl std::fmt::Debug for IoDriverFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoDriverFile")
            .field("file", &self.file)
            .field("file_name", &self.file_name)
            .field("opt", &self.opt)
            .field("session_error", &self.session_error)
            .finish()
    }
}

impl IoDriverFile {
    /// Open a file for collective access. Missing paths fail with
    /// [`PsgError::FileNotFound`] in [`FileMode::Read`].
    pub fn open(
        communicator: Arc<dyn Communicator>,
        file_name: &str,
        mode: FileMode,
        opt: IoDriverOpt,
    ) -> Result<Self, PsgError> {
        let mut options = OpenOptions::new();
        match mode {
            FileMode::Read => options.read(true),
            FileMode::Write => options.write(true).create(true),
            FileMode::ReadWrite => options.read(true).write(true).create(true),
        };
        let file = options.open(file_name).map_err(|e| PsgError::FileNotFound {
            path: file_name.to_string(),
            source: e,
        })?;
        debug!("opened '{}' ({:?})", file_name, mode);

        Ok(IoDriverFile {
            file,
            file_name: file_name.to_string(),
            communicator,
            opt,
            session_error: RefCell::new(None),
        })
    }

    fn poison(&self, error: PsgError) -> PsgError {
        poison(&self.session_error, &self.file_name, error)
    }

    fn read_block(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError> {
        self.file.read_exact_at(buffer, offset).map_err(|e| {
            self.poison(PsgError::IoError {
                msg: format!(
                    "read of {} bytes at {} in '{}' failed: {}",
                    buffer.len(),
                    offset,
                    self.file_name,
                    e
                ),
            })
        })
    }

    fn write_block(&self, offset: u64, buffer: &[u8]) -> Result<(), PsgError> {
        self.file.write_all_at(buffer, offset).map_err(|e| {
            self.poison(PsgError::IoError {
                msg: format!(
                    "write of {} bytes at {} in '{}' failed: {}",
                    buffer.len(),
                    offset,
                    self.file_name,
                    e
                ),
            })
        })
    }

    /// Loop over whole blocks in lock-step rounds of at most
    /// `max_io_chunk_size` bytes each. `io` gets the block index.
    fn blockwise<F>(
        &self,
        block_size: usize,
        number_of_blocks: usize,
        mut io: F,
    ) -> Result<(), PsgError>
    where
        F: FnMut(&Self, usize) -> Result<(), PsgError>,
    {
        let blocks_per_round =
            std::cmp::max(1, self.opt.max_io_chunk_size / std::cmp::max(1, block_size));
        let rounds = transfer_rounds(
            &*self.communicator,
            self.opt.use_collective_operations,
            div_ceil(number_of_blocks, blocks_per_round),
        )?;

        for round in 0..rounds {
            let first = round * blocks_per_round;
            // Ranks that have run out of data still enter the round, with
            // nothing to transfer.
            for block in first..std::cmp::min(first + blocks_per_round, number_of_blocks) {
                io(self, block)?;
            }
        }
        Ok(())
    }
}

impl IoDriver for IoDriverFile {
    fn is_open(&self) -> bool {
        self.session_error.borrow().is_none()
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn file_size(&self) -> Result<u64, PsgError> {
        check_session(&self.session_error)?;
        let metadata = self.file.metadata().map_err(|e| {
            self.poison(PsgError::IoError {
                msg: format!("stat of '{}' failed: {}", self.file_name, e),
            })
        })?;
        Ok(metadata.len())
    }

    fn set_file_size(&mut self, size: u64) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        debug!("resizing '{}' to {} bytes", self.file_name, size);
        self.file.set_len(size).map_err(|e| {
            self.poison(PsgError::IoError {
                msg: format!("resize of '{}' to {} failed: {}", self.file_name, size, e),
            })
        })?;
        self.communicator.barrier()
    }

    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_contiguous(offset, buffer.len(), self.file_size()?)?;

        let chunk = std::cmp::max(1, self.opt.max_io_chunk_size);
        let rounds = transfer_rounds(
            &*self.communicator,
            self.opt.use_collective_operations,
            div_ceil(buffer.len(), chunk),
        )?;

        for round in 0..rounds {
            let start = round * chunk;
            if start >= buffer.len() {
                // Zero-length participation round.
                continue;
            }
            let end = std::cmp::min(start + chunk, buffer.len());
            self.read_block(offset + start as u64, &mut buffer[start..end])?;
        }
        Ok(())
    }

    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_contiguous(offset, buffer.len(), self.file_size()?)?;

        let chunk = std::cmp::max(1, self.opt.max_io_chunk_size);
        let rounds = transfer_rounds(
            &*self.communicator,
            self.opt.use_collective_operations,
            div_ceil(buffer.len(), chunk),
        )?;

        for round in 0..rounds {
            let start = round * chunk;
            if start >= buffer.len() {
                continue;
            }
            let end = std::cmp::min(start + chunk, buffer.len());
            self.write_block(offset + start as u64, &buffer[start..end])?;
        }
        Ok(())
    }

    fn read_strided(
        &self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &mut [u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_strided(offset, block_size, stride_size, number_of_blocks, self.file_size()?)?;
        if block_size == 0 {
            return self.read(offset, &mut []);
        }

        self.blockwise(block_size, number_of_blocks, |driver, block| {
            let start = block * block_size;
            driver.read_block(
                offset + (block * stride_size) as u64,
                &mut buffer[start..start + block_size],
            )
        })
    }

    fn write_strided(
        &mut self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &[u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_strided(offset, block_size, stride_size, number_of_blocks, self.file_size()?)?;
        if block_size == 0 {
            return self.write(offset, &[]);
        }

        self.blockwise(block_size, number_of_blocks, |driver, block| {
            let start = block * block_size;
            driver.write_block(
                offset + (block * stride_size) as u64,
                &buffer[start..start + block_size],
            )
        })
    }

    fn read_offsets(
        &self,
        block_size: usize,
        offsets: &[u64],
        buffer: &mut [u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        let size = self.file_size()?;
        for &block_offset in offsets {
            check_contiguous(block_offset, block_size, size)?;
        }
        if block_size == 0 {
            return self.read(0, &mut []);
        }

        self.blockwise(block_size, offsets.len(), |driver, block| {
            let start = block * block_size;
            driver.read_block(offsets[block], &mut buffer[start..start + block_size])
        })
    }

    fn write_offsets(
        &mut self,
        block_size: usize,
        offsets: &[u64],
        buffer: &[u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        let size = self.file_size()?;
        for &block_offset in offsets {
            check_contiguous(block_offset, block_size, size)?;
        }
        if block_size == 0 {
            return self.write(0, &[]);
        }

        self.blockwise(block_size, offsets.len(), |driver, block| {
            let start = block * block_size;
            driver.write_block(offsets[block], &buffer[start..start + block_size])
        })
    }

    fn sync(&mut self) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        self.file.sync_all().map_err(|e| {
            self.poison(PsgError::IoError {
                msg: format!("sync of '{}' failed: {}", self.file_name, e),
            })
        })?;
        self.communicator.barrier()
    }

    fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }
}

/// An IO driver storing its bytes in a [`DistributedVector`] instead of a
/// file. Used for in-memory "files" and for exercising the collective file
/// layers without touching disk.
///
/// The distributed vector transport has no 32-bit count limit, so transfers
/// are not fragmented here; blocks are moved one `get_n`/`set_n` at a time.
pub struct IoDriverDistributedVector {
    vector: Box<dyn DistributedVector>,
    communicator: Arc<dyn Communicator>,
    session_error: RefCell<Option<String>>,
}

impl IoDriverDistributedVector {
    pub fn new(
        communicator: Arc<dyn Communicator>,
        vector: Box<dyn DistributedVector>,
    ) -> Self {
        IoDriverDistributedVector {
            vector,
            communicator,
            session_error: RefCell::new(None),
        }
    }

    /// Take the underlying vector destructively.
    pub fn into_vector(self) -> Box<dyn DistributedVector> {
        self.vector
    }

    fn poison(&self, error: PsgError) -> PsgError {
        poison(&self.session_error, "<distributed vector>", error)
    }
}

impl IoDriver for IoDriverDistributedVector {
    fn is_open(&self) -> bool {
        self.vector.size() != 0
    }

    fn file_name(&self) -> &str {
        "<distributed vector>"
    }

    fn file_size(&self) -> Result<u64, PsgError> {
        check_session(&self.session_error)?;
        Ok(self.vector.size())
    }

    fn set_file_size(&mut self, size: u64) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        self.vector.resize(size)
    }

    fn read(&self, offset: u64, buffer: &mut [u8]) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_contiguous(offset, buffer.len(), self.vector.size())?;
        self.vector
            .get_n(offset, buffer)
            .map_err(|e| self.poison(e))
    }

    fn write(&mut self, offset: u64, buffer: &[u8]) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_contiguous(offset, buffer.len(), self.vector.size())?;
        let result = self.vector.set_n(offset, buffer);
        result.map_err(|e| poison(&self.session_error, "<distributed vector>", e))
    }

    fn read_strided(
        &self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &mut [u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_strided(offset, block_size, stride_size, number_of_blocks, self.vector.size())?;

        for (block, chunk) in buffer
            .chunks_mut(std::cmp::max(1, block_size))
            .enumerate()
            .take(number_of_blocks)
        {
            self.vector
                .get_n(offset + (block * stride_size) as u64, chunk)
                .map_err(|e| self.poison(e))?;
        }
        Ok(())
    }

    fn write_strided(
        &mut self,
        offset: u64,
        block_size: usize,
        stride_size: usize,
        number_of_blocks: usize,
        buffer: &[u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        check_strided(offset, block_size, stride_size, number_of_blocks, self.vector.size())?;

        for block in 0..number_of_blocks {
            let start = block * block_size;
            let result = self.vector.set_n(
                offset + (block * stride_size) as u64,
                &buffer[start..start + block_size],
            );
            if let Err(e) = result {
                return Err(poison(&self.session_error, "<distributed vector>", e));
            }
        }
        Ok(())
    }

    fn read_offsets(
        &self,
        block_size: usize,
        offsets: &[u64],
        buffer: &mut [u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        let size = self.vector.size();
        for &block_offset in offsets {
            check_contiguous(block_offset, block_size, size)?;
        }

        for (block, chunk) in buffer
            .chunks_mut(std::cmp::max(1, block_size))
            .enumerate()
            .take(offsets.len())
        {
            self.vector
                .get_n(offsets[block], chunk)
                .map_err(|e| self.poison(e))?;
        }
        Ok(())
    }

    fn write_offsets(
        &mut self,
        block_size: usize,
        offsets: &[u64],
        buffer: &[u8],
    ) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        let size = self.vector.size();
        for &block_offset in offsets {
            check_contiguous(block_offset, block_size, size)?;
        }

        for block in 0..offsets.len() {
            let start = block * block_size;
            let result = self
                .vector
                .set_n(offsets[block], &buffer[start..start + block_size]);
            if let Err(e) = result {
                return Err(poison(&self.session_error, "<distributed vector>", e));
            }
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<(), PsgError> {
        check_session(&self.session_error)?;
        self.vector.sync()?;
        self.communicator.barrier()
    }

    fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }
}
