//! Accounting of the tensors held by the detection pipeline.
//!
//! Each tensor the pipeline creates is wrapped in a [`Tracked`] handle. The handle owns the
//! tensor together with a ledger lease; the lease is returned when the handle is dropped or
//! consumed, on success and error paths alike.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use burn::tensor::{backend::Backend, Element, Tensor};

use crate::error::{InferenceError, Result};

#[derive(Debug, Default)]
pub struct BufferLedger {
    allocated: AtomicUsize,
    live: AtomicUsize,
}

impl BufferLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start tracking `tensor`.
    pub fn track<B: Backend, const D: usize>(
        self: &Arc<Self>,
        tensor: Tensor<B, D>,
    ) -> Tracked<B, D> {
        self.allocated.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_add(1, Ordering::AcqRel);
        Tracked {
            tensor,
            lease: Lease {
                ledger: Arc::clone(self),
            },
        }
    }

    /// Number of tensors tracked since creation.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Number of tracked tensors not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Lease {
    ledger: Arc<BufferLedger>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A tensor registered in a [`BufferLedger`].
#[derive(Debug)]
pub struct Tracked<B: Backend, const D: usize> {
    tensor: Tensor<B, D>,
    lease: Lease,
}

impl<B: Backend, const D: usize> Tracked<B, D> {
    pub fn dims(&self) -> [usize; D] {
        self.tensor.dims()
    }

    /// Transform the tensor; the input is released and the output tracked.
    pub fn map<const D2: usize, F>(self, f: F) -> Tracked<B, D2>
    where
        F: FnOnce(Tensor<B, D>) -> Tensor<B, D2>,
    {
        let Tracked { tensor, lease } = self;
        let ledger = Arc::clone(&lease.ledger);
        let output = f(tensor);
        drop(lease);
        ledger.track(output)
    }

    /// Fallible [`map`](Self::map). The input is released either way.
    pub fn try_map<const D2: usize, F>(self, f: F) -> Result<Tracked<B, D2>>
    where
        F: FnOnce(Tensor<B, D>) -> Result<Tensor<B, D2>>,
    {
        let Tracked { tensor, lease } = self;
        let ledger = Arc::clone(&lease.ledger);
        let output = f(tensor);
        drop(lease);
        Ok(ledger.track(output?))
    }

    /// Read the values back and release the tensor.
    pub fn into_vec<E: Element>(self) -> Result<Vec<E>> {
        let Tracked { tensor, lease: _lease } = self;
        tensor
            .into_data()
            .to_vec::<E>()
            .map_err(|err| InferenceError::TensorData(format!("{err:?}")))
    }
}
