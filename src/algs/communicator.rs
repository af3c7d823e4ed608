//! Process-group abstraction: non-blocking byte-message passing between a
//! fixed set of ranks.
//!
//! The mesh algorithms in this crate are SPMD: every rank executes the same
//! sequence of collectives, built here from pairwise `isend`/`irecv` pairs.
//! Three backends are provided:
//!
//! - [`NoComm`]: a single-rank no-op backend for serial runs and unit tests.
//! - [`ThreadComm`]: an intra-process backend where each rank is a thread
//!   and messages travel through a global FIFO mailbox keyed by
//!   `(source, destination, tag)`. Protocol tests run real multi-rank
//!   exchanges without an MPI launcher.
//! - `MpiComm` (behind the `mpi-support` feature): immediate sends and
//!   receives over an MPI communicator.
//!
//! Wire conventions: all multi-byte integers are little-endian; message
//! boundaries are preserved (one `isend` matches exactly one `irecv` on the
//! same channel); per-channel ordering is FIFO.

use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

/// Anything that can be waited on for completion.
pub trait Wait {
    /// Block until the operation completes; returns received bytes, if any.
    fn wait(self) -> Option<Vec<u8>>;
}

/// Non-blocking communication interface, minimal by design.
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Posts a send of `buf` to `peer` on channel `tag`.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Posts a receive of exactly `len` bytes from `peer` on channel `tag`.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;

    /// Rank of this process in `0..size`.
    fn rank(&self) -> usize;
    /// Total number of ranks.
    fn size(&self) -> usize;

    /// Synchronization barrier (no-op unless the backend needs one).
    fn barrier(&self) {}
}

/// Tag newtype for safer channel arithmetic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CommTag(u16);

impl CommTag {
    /// Creates a tag from a raw `u16`.
    #[inline]
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    /// The underlying `u16`.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Offsets the tag by `dx`, wrapping on overflow.
    #[inline]
    pub const fn offset(self, dx: u16) -> Self {
        Self(self.0.wrapping_add(dx))
    }
}

impl From<u16> for CommTag {
    #[inline]
    fn from(x: u16) -> Self {
        CommTag::new(x)
    }
}

/// Single-rank no-op backend.
///
/// With one rank every collective degenerates to local copies, so `isend`
/// and `irecv` are never reached; they exist only to satisfy the trait.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _len: usize) {}

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}

// --- ThreadComm: ranks as threads of one process ---

type ChannelKey = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Channel {
    queue: VecDeque<Vec<u8>>,
}

struct Mailbox {
    channels: Mutex<HashMap<ChannelKey, Arc<(Mutex<Channel>, Condvar)>>>,
}

static MAILBOX: Lazy<Mailbox> = Lazy::new(|| Mailbox {
    channels: Mutex::new(HashMap::new()),
});

fn channel(key: ChannelKey) -> Arc<(Mutex<Channel>, Condvar)> {
    let mut guard = MAILBOX.channels.lock().expect("mailbox poisoned");
    guard
        .entry(key)
        .or_insert_with(|| Arc::new((Mutex::new(Channel::default()), Condvar::new())))
        .clone()
}

/// Send handle of [`ThreadComm`]; the message is enqueued eagerly, so
/// waiting is a no-op.
pub struct ThreadSendHandle;

impl Wait for ThreadSendHandle {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Receive handle of [`ThreadComm`]; waiting blocks on the channel condvar
/// until a message arrives.
pub struct ThreadRecvHandle {
    cell: Arc<(Mutex<Channel>, Condvar)>,
    want_len: usize,
}

impl Wait for ThreadRecvHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let (lock, cv) = &*self.cell;
        let mut chan = lock.lock().expect("channel poisoned");
        while chan.queue.is_empty() {
            chan = cv.wait(chan).expect("channel poisoned");
        }
        let mut msg = chan.queue.pop_front().expect("queue non-empty");
        msg.truncate(self.want_len.min(msg.len()));
        Some(msg)
    }
}

/// Intra-process backend: one rank per thread, global FIFO mailbox.
///
/// Concurrent communicator users in the same process (e.g. parallel tests)
/// must use disjoint tag ranges, since the mailbox is shared.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
}

impl ThreadComm {
    pub fn new(rank: usize, size: usize) -> Self {
        assert!(rank < size, "rank {rank} out of range for size {size}");
        Self { rank, size }
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ThreadSendHandle;
    type RecvHandle = ThreadRecvHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let cell = channel((self.rank, peer, tag));
        let (lock, cv) = &*cell;
        {
            let mut chan = lock.lock().expect("channel poisoned");
            chan.queue.push_back(buf.to_vec());
        }
        cv.notify_all();
        ThreadSendHandle
    }

    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle {
        ThreadRecvHandle {
            cell: channel((peer, self.rank, tag)),
            want_len: len,
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use core::ptr::NonNull;
    use mpi::collective::CommunicatorCollectives;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::topology::{Communicator as _, SimpleCommunicator};

    /// MPI-backed process group over `MPI_COMM_WORLD`.
    pub struct MpiComm {
        _universe: Universe,
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    unsafe impl Send for MpiComm {}
    unsafe impl Sync for MpiComm {}

    impl Default for MpiComm {
        fn default() -> Self {
            let universe = mpi::initialize().expect("MPI initialization failed");
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self {
                _universe: universe,
                world,
                rank,
                size,
            }
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
            use mpi::request::StaticScope;
            // Move the bytes to the heap and leak until the request completes;
            // rsmpi's immediate ops require 'static buffers under StaticScope.
            let boxed = buf.to_vec().into_boxed_slice();
            let raw: *mut [u8] = Box::into_raw(boxed);
            let slice: &[u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, slice, tag as i32);
            MpiSendHandle {
                req: Some(req),
                buf: Some(unsafe { NonNull::new_unchecked(raw) }),
            }
        }

        fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle {
            use mpi::request::StaticScope;
            let boxed = vec![0u8; len].into_boxed_slice();
            let raw: *mut [u8] = Box::into_raw(boxed);
            let slice_mut: &mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, slice_mut, tag as i32);
            MpiRecvHandle {
                req: Some(req),
                buf: Some(unsafe { NonNull::new_unchecked(raw) }),
                len,
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }

    pub struct MpiSendHandle {
        req: Option<mpi::request::Request<'static, [u8], mpi::request::StaticScope>>,
        buf: Option<NonNull<[u8]>>,
    }

    impl Wait for MpiSendHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            if let Some(r) = self.req.take() {
                let _ = r.wait();
            }
            if let Some(ptr) = self.buf.take() {
                unsafe { drop(Box::from_raw(ptr.as_ptr())) };
            }
            None
        }
    }

    impl Drop for MpiSendHandle {
        fn drop(&mut self) {
            if let Some(r) = self.req.take() {
                let _ = r.wait();
            }
            if let Some(ptr) = self.buf.take() {
                unsafe { drop(Box::from_raw(ptr.as_ptr())) };
            }
        }
    }

    pub struct MpiRecvHandle {
        req: Option<mpi::request::Request<'static, [u8], mpi::request::StaticScope>>,
        buf: Option<NonNull<[u8]>>,
        len: usize,
    }

    impl Wait for MpiRecvHandle {
        fn wait(mut self) -> Option<Vec<u8>> {
            if let Some(r) = self.req.take() {
                let _ = r.wait();
            }
            let ptr = self.buf.take()?;
            let boxed: Box<[u8]> = unsafe { Box::from_raw(ptr.as_ptr()) };
            let mut v = Vec::from(boxed);
            v.truncate(self.len);
            Some(v)
        }
    }

    impl Drop for MpiRecvHandle {
        fn drop(&mut self) {
            if let Some(r) = self.req.take() {
                let _ = r.wait();
            }
            if let Some(ptr) = self.buf.take() {
                unsafe { drop(Box::from_raw(ptr.as_ptr())) };
            }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
