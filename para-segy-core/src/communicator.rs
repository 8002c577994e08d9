//! The abstract collective layer.
//!
//! The library is written against this trait rather than a concrete
//! message-passing library, so that the collective logic is localised here
//! and the transport can be swapped without touching the file layers. Every
//! rank of a process group holds a handle to the same logical communicator;
//! all collective operations must be entered by every rank or the group
//! deadlocks.
use crate::distributed_vector::{DistributedVector, InMemoryVector};
use crate::errors::PsgError;

/// Communication with the other ranks of a process group.
///
/// A communicator is constructed once per logical file and shared; it must
/// outlive every IO driver holding a handle to it. Collective operations are
/// fail-stop: an error on any rank aborts the operation for the group.
pub trait Communicator {
    /// The rank of the calling process, in `[0, num_ranks())`.
    fn rank(&self) -> usize;

    /// The number of processes executing together.
    fn num_ranks(&self) -> usize;

    /// Gather the local values of every rank; all ranks receive the
    /// concatenation in rank order.
    fn gather_u64(&self, local: &[u64]) -> Result<Vec<u64>, PsgError>;

    /// [`Communicator::gather_u64`] for floating point values.
    fn gather_f64(&self, local: &[f64]) -> Result<Vec<f64>, PsgError>;

    /// The sum of the value over all ranks (same result on all ranks).
    fn sum(&self, value: u64) -> Result<u64, PsgError>;

    /// The maximum of the value over all ranks (same result on all ranks).
    fn max(&self, value: u64) -> Result<u64, PsgError>;

    /// The minimum of the value over all ranks (same result on all ranks).
    fn min(&self, value: u64) -> Result<u64, PsgError>;

    /// The sum of the contributions of all lower ranks; rank 0 receives 0.
    fn exscan_offset(&self, value: u64) -> Result<u64, PsgError>;

    /// A collective wait until every rank has arrived.
    fn barrier(&self) -> Result<(), PsgError>;

    /// Create a distributed byte vector addressable by every rank of this
    /// communicator over the whole index space.
    fn make_distributed_vector(
        &self,
        size: u64,
    ) -> Result<Box<dyn DistributedVector>, PsgError>;
}

/// The single-process communicator: one rank, every collective is local.
///
/// Construction and teardown are explicit; there is no hidden process-wide
/// state to initialise.
/// ```
/// # use para_segy_core::communicator::{Communicator, LocalCommunicator};
/// let communicator = LocalCommunicator::new();
/// assert_eq!(communicator.rank(), 0);
/// assert_eq!(communicator.num_ranks(), 1);
/// assert_eq!(communicator.sum(42).unwrap(), 42);
/// assert_eq!(communicator.exscan_offset(42).unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct LocalCommunicator;

impl LocalCommunicator {
    pub fn new() -> Self {
        LocalCommunicator
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn gather_u64(&self, local: &[u64]) -> Result<Vec<u64>, PsgError> {
        Ok(local.to_vec())
    }

    fn gather_f64(&self, local: &[f64]) -> Result<Vec<f64>, PsgError> {
        Ok(local.to_vec())
    }

    fn sum(&self, value: u64) -> Result<u64, PsgError> {
        Ok(value)
    }

    fn max(&self, value: u64) -> Result<u64, PsgError> {
        Ok(value)
    }

    fn min(&self, value: u64) -> Result<u64, PsgError> {
        Ok(value)
    }

    fn exscan_offset(&self, _value: u64) -> Result<u64, PsgError> {
        Ok(0)
    }

    fn barrier(&self) -> Result<(), PsgError> {
        Ok(())
    }

    fn make_distributed_vector(
        &self,
        size: u64,
    ) -> Result<Box<dyn DistributedVector>, PsgError> {
        Ok(Box::new(InMemoryVector::new(size)?))
    }
}
