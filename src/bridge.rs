// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocking adapter over asynchronous work.
//!
//! A [`Bridge`] hands an operation a [`Completion`] handle, lets it run on a
//! tokio worker, and parks the calling thread until the handle is settled.
//! The handle can be settled at most once; later attempts are dropped.
//! Dropping an unsettled handle (an aborted task, a panic) wakes the caller
//! with [`BridgeError::Abandoned`]. A bridge never starts work it cannot
//! wait for: a current-thread runtime on either side is refused up front.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::BridgeError;

/// One-shot completion handle passed to a suspended operation
///
/// Cloning yields another handle to the same slot, so whichever clone settles
/// first wins.
#[derive(Debug)]
pub struct Completion<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Completion<T> {
    fn new(sender: oneshot::Sender<T>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(sender))),
        }
    }

    /// Deliver the result to the waiting caller
    ///
    /// Returns `false` if the completion was already settled or the caller is
    /// gone; the value is dropped in that case.
    pub fn resume(&self, value: T) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => sender.send(value).is_ok(),
            None => {
                warn!("completion settled more than once; ignoring");
                false
            }
        }
    }

    /// Whether a result has already been delivered
    pub fn is_settled(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Runs asynchronous operations on a tokio runtime and blocks for their result
#[derive(Debug, Clone)]
pub struct Bridge {
    handle: Handle,
}

impl Bridge {
    /// Create a bridge that spawns onto the given runtime
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a bridge for the runtime the current thread belongs to
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Runtime handle used to spawn work
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Suspend the caller until `start` settles the completion it is given
    ///
    /// `start` runs on the calling thread and is expected to hand the
    /// completion to some concurrent context. There is no timeout.
    ///
    /// Nothing is started when the bridge cannot block: either its own runtime
    /// or the caller's is a current-thread runtime.
    pub fn suspend<T, F>(&self, start: F) -> Result<T, BridgeError>
    where
        F: FnOnce(Completion<T>),
    {
        let in_runtime = self.check_can_block()?;

        let (tx, rx) = oneshot::channel();
        start(Completion::new(tx));

        let result = if in_runtime {
            tokio::task::block_in_place(|| rx.blocking_recv())
        } else {
            rx.blocking_recv()
        };

        result.map_err(|_| BridgeError::Abandoned)
    }

    /// Spawn `future` on a worker and block until it yields
    ///
    /// An `Err` produced by the future is returned as-is; a task that panics
    /// or is aborted surfaces as [`BridgeError::Abandoned`] converted into `E`.
    pub fn run<F, T, E>(&self, future: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<BridgeError> + Send + 'static,
    {
        let handle = &self.handle;
        self.suspend(move |completion: Completion<Result<T, E>>| {
            handle.spawn(async move {
                completion.resume(future.await);
            });
        })?
    }

    /// Returns whether the caller is itself on a runtime worker
    fn check_can_block(&self) -> Result<bool, BridgeError> {
        // A current-thread scheduler only makes progress while its owner drives it
        if self.handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(BridgeError::CurrentThreadRuntime);
        }

        match Handle::try_current() {
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::CurrentThread => {
                Err(BridgeError::CurrentThreadRuntime)
            }
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}
