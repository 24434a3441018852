//! Scoped read leases on caller-managed matrices
//!
//! A [`MatrixHandle`] hands out read access to a block it owns and must be
//! told when that access ends. [`ReadLease`] pairs the two calls: it is
//! acquired by [`lease`] and releases the handle when dropped, on every exit
//! path including `?` returns and panics.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use dataconv_core::MatrixBlock;
use tracing::trace;

use crate::error::{ConvertError, Result};

/// A matrix whose buffer lifetime is tracked by its owner
pub trait MatrixHandle {
    /// Pin the block for reading
    fn acquire_read(&self) -> Result<&MatrixBlock>;

    /// Unpin a block previously returned by [`MatrixHandle::acquire_read`]
    fn release(&self);
}

/// Read access to a handle's block, released on drop
pub struct ReadLease<'a, H: MatrixHandle + ?Sized> {
    handle: &'a H,
    block: &'a MatrixBlock,
}

impl<H: MatrixHandle + ?Sized> Deref for ReadLease<'_, H> {
    type Target = MatrixBlock;

    fn deref(&self) -> &MatrixBlock {
        self.block
    }
}

impl<H: MatrixHandle + ?Sized> Drop for ReadLease<'_, H> {
    fn drop(&mut self) {
        trace!(rows = self.block.rows(), cols = self.block.cols(), "releasing read lease");
        self.handle.release();
    }
}

/// Acquire a read lease on `handle`
pub fn lease<H: MatrixHandle + ?Sized>(handle: &H) -> Result<ReadLease<'_, H>> {
    let block = handle.acquire_read()?;
    trace!(rows = block.rows(), cols = block.cols(), "acquired read lease");
    Ok(ReadLease { handle, block })
}

/// In-process handle that counts outstanding read pins
///
/// An evicted handle holds no data and refuses new leases.
#[derive(Debug, Default)]
pub struct CachedMatrix {
    block: Option<MatrixBlock>,
    pins: AtomicUsize,
}

impl CachedMatrix {
    pub fn new(block: MatrixBlock) -> Self {
        Self {
            block: Some(block),
            pins: AtomicUsize::new(0),
        }
    }

    /// A handle whose data is no longer resident
    pub fn evicted() -> Self {
        Self::default()
    }

    /// Number of leases currently held
    pub fn pin_count(&self) -> usize {
        self.pins.load(Ordering::Acquire)
    }

    /// Take the block back out, `None` if evicted
    pub fn into_inner(self) -> Option<MatrixBlock> {
        self.block
    }
}

impl MatrixHandle for CachedMatrix {
    fn acquire_read(&self) -> Result<&MatrixBlock> {
        let block = self
            .block
            .as_ref()
            .ok_or_else(|| ConvertError::LeaseUnavailable("matrix has been evicted".to_string()))?;
        self.pins.fetch_add(1, Ordering::AcqRel);
        Ok(block)
    }

    fn release(&self) {
        let _ = self
            .pins
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}
