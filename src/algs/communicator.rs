//! Thin façade over intra-process (threaded) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices*, copied on send, so a send buffer is
//! free again as soon as `isend` returns. All handles are **waitable** but
//! non-blocking: halo and gather code calls `.wait()` before it trusts that a
//! receive has landed.

use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::algs::wire::expect_exact_len;
use crate::jacobi_error::JacobiError;

/// Typed message tag. Two transfers between the same pair of ranks only pair
/// up when their tags agree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(v: u16) -> Self {
        Self(v)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Tags for the two halo directions.
///
/// `up` carries a worker's first interior row to its previous neighbour,
/// `down` carries its last interior row to its next neighbour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HaloTags {
    pub up: CommTag,
    pub down: CommTag,
}

impl HaloTags {
    pub const fn new(up: CommTag, down: CommTag) -> Self {
        Self { up, down }
    }
}

impl Default for HaloTags {
    fn default() -> Self {
        Self::new(CommTag::new(100), CommTag::new(200))
    }
}

/// Tag used when workers ship their slabs to the coordinator.
pub const GATHER_TAG: CommTag = CommTag::new(300);

/// Non-blocking point-to-point interface between the workers of one run.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// Block until every rank has reached the barrier.
    fn barrier(&self) {}

    /// `true` only for the serial stand-in.
    fn is_no_comm(&self) -> bool {
        false
    }

    /// Blocking paired transfer: send `send` to `dest` and fill `recv` from
    /// `source` under the same tag, returning only once both halves are done.
    ///
    /// A `None` side is skipped and its buffer left untouched. Because every
    /// rank issues its receive before its send, mirrored calls on two
    /// neighbours cannot wait on each other.
    fn sendrecv(
        &self,
        dest: Option<usize>,
        send: &[u8],
        source: Option<usize>,
        recv: &mut [u8],
        tag: CommTag,
    ) -> Result<(), JacobiError> {
        let pending = match source {
            Some(src) => Some((src, self.irecv(src, tag.as_u16(), recv))),
            None => None,
        };
        let sent = dest.map(|dst| self.isend(dst, tag.as_u16(), send));

        let received = pending.map(|(src, h)| (src, h.wait()));
        if let Some(s) = sent {
            let _ = s.wait();
        }

        if let Some((src, data)) = received {
            let data =
                data.ok_or_else(|| JacobiError::comm(src, "receive completed without data"))?;
            expect_exact_len(data.len(), recv.len()).map_err(|e| JacobiError::comm(src, e))?;
            recv.copy_from_slice(&data);
        }
        Ok(())
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Compile-time no-op comm for single-worker runs and serial unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- ThreadComm: intra-process, one OS thread per worker ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Debug, Default)]
struct WorldState {
    slots: HashMap<Key, VecDeque<Bytes>>,
    at_barrier: usize,
    generation: u64,
    aborted_by: Option<usize>,
}

#[derive(Debug)]
struct Mailbox {
    size: usize,
    state: Mutex<WorldState>,
    changed: Condvar,
}

impl Mailbox {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(WorldState::default()),
            changed: Condvar::new(),
        }
    }

    fn post(&self, key: Key, payload: Bytes) {
        self.state.lock().slots.entry(key).or_default().push_back(payload);
        self.changed.notify_all();
    }

    /// Next payload for `key`; `None` once the world is aborted and nothing is queued.
    fn take(&self, key: &Key) -> Option<Bytes> {
        let mut state = self.state.lock();
        loop {
            if let Some(payload) = state.slots.get_mut(key).and_then(VecDeque::pop_front) {
                return Some(payload);
            }
            if state.aborted_by.is_some() {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    fn barrier(&self) {
        let mut state = self.state.lock();
        let generation = state.generation;
        state.at_barrier += 1;
        if state.at_barrier == self.size {
            state.at_barrier = 0;
            state.generation += 1;
            self.changed.notify_all();
            return;
        }
        while state.generation == generation && state.aborted_by.is_none() {
            self.changed.wait(&mut state);
        }
    }

    fn abort(&self, rank: usize) {
        self.state.lock().aborted_by.get_or_insert(rank);
        self.changed.notify_all();
    }
}

/// Receive handle of [`ThreadComm`]; the payload is claimed on `wait`.
#[derive(Debug)]
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let payload = self.mailbox.take(&self.key)?;
        let n = payload.len().min(self.len);
        Some(payload[..n].to_vec())
    }
}

/// Communicator for workers that live on threads of one process.
///
/// All ranks of a world share one mailbox; sends are buffered, so `isend`
/// never blocks and messages with equal `(src, dst, tag)` arrive in order.
/// Once any rank calls [`abort`](ThreadComm::abort), pending receives with no
/// queued payload complete empty and barriers release, so a failing worker
/// cannot strand its neighbours.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl ThreadComm {
    /// Build the communicators for ranks `0..size` of a fresh world.
    pub fn world(size: usize) -> Vec<Self> {
        let mailbox = Arc::new(Mailbox::new(size));
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }

    /// Mark the whole world as failed. The first caller is remembered.
    pub fn abort(&self) {
        log::debug!("[rank {}] aborting thread world", self.rank);
        self.mailbox.abort(self.rank);
    }

    /// Rank that aborted the world first, if any.
    pub fn aborted_by(&self) -> Option<usize> {
        self.mailbox.state.lock().aborted_by
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        log::trace!("[rank {}] isend -> {} tag {} ({} bytes)", self.rank, peer, tag, buf.len());
        self.mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        log::trace!("[rank {}] irecv <- {} tag {} ({} bytes)", self.rank, peer, tag, buf.len());
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }

    fn barrier(&self) {
        self.mailbox.barrier();
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, JacobiError, Wait};
    use mpi::environment::Universe;
    use mpi::request::StaticScope;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{
        Communicator as _, CommunicatorCollectives as _, Destination as _, Source as _,
    };

    /// One MPI process per worker.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // dropped last: finalizes MPI
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, JacobiError> {
            let universe = mpi::initialize().ok_or(JacobiError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// Pending MPI request together with the heap buffer it owns.
    pub struct MpiHandle {
        finish: Option<Box<dyn FnOnce() -> Option<Vec<u8>>>>,
    }

    impl Wait for MpiHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            self.finish.take().and_then(|f| f())
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiHandle;
        type RecvHandle = MpiHandle;

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiHandle {
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: `raw` is only reclaimed after the request has completed.
            let payload: &'static [u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, payload, tag as i32);
            MpiHandle {
                finish: Some(Box::new(move || {
                    req.wait();
                    // SAFETY: the request no longer references the buffer.
                    drop(unsafe { Box::from_raw(raw) });
                    None
                })),
            }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let raw: *mut [u8] = Box::into_raw(vec![0u8; buf.len()].into_boxed_slice());
            // SAFETY: `raw` is only reclaimed after the request has completed.
            let slot: &'static mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, slot, tag as i32);
            MpiHandle {
                finish: Some(Box::new(move || {
                    req.wait();
                    // SAFETY: the request no longer references the buffer.
                    let owned = unsafe { Box::from_raw(raw) };
                    Some(owned.into_vec())
                })),
            }
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
