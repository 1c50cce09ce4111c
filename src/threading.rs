//! Thread-count resolution, lane-parallel execution and execution-lock release.
//!
//! A kernel call builds one [`Workers`] set and hands each axis pass's list of
//! independent 1-D lanes to [`Workers::run_lanes`], which bisects it with
//! `rayon::join`. Workloads below [`MIN_PARALLEL_ELEMENTS`] stay on the
//! calling thread, and a dedicated pool is only built when the requested
//! count differs from rayon's ambient pool.

use std::sync::OnceLock;

use crate::Result;

/// Environment variable consulted when a caller passes `nthreads == 0`.
pub const THREADS_ENV: &str = "STRIDED_FFT_NUM_THREADS";

/// Element count below which a transform or pass is not split across threads.
pub(crate) const MIN_PARALLEL_ELEMENTS: usize = 1 << 15;

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data outlives every parallel
/// task and that concurrent tasks touch disjoint lanes.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn as_ptr(self) -> *mut T {
        self.0
    }

    pub(crate) fn as_const(self) -> *const T {
        self.0 as *const T
    }
}

/// Thread count used when a transform is asked for `nthreads == 0`.
///
/// Reads [`THREADS_ENV`] once per process; an unset, unparsable or zero value
/// falls back to the size of rayon's global pool.
pub fn default_thread_count() -> usize {
    static DEFAULT: OnceLock<usize> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        let from_env = std::env::var(THREADS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0);
        let resolved = from_env.unwrap_or_else(hardware_threads);
        tracing::debug!(threads = resolved, "resolved default thread count");
        resolved
    })
}

#[cfg(feature = "parallel")]
fn hardware_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn hardware_threads() -> usize {
    1
}

/// Map the caller's thread request to a concrete count.
pub(crate) fn resolve_thread_count(nthreads: usize) -> usize {
    if nthreads == 0 {
        default_thread_count()
    } else {
        nthreads
    }
}

/// Worker budget of one kernel call, shared by all of its axis passes.
pub(crate) struct Workers {
    nthreads: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Workers {
    /// Workers for a transform over `elements` elements.
    pub(crate) fn new(nthreads: usize, elements: usize) -> Result<Self> {
        let nthreads = if cfg!(feature = "parallel") && elements >= MIN_PARALLEL_ELEMENTS {
            nthreads.max(1)
        } else {
            1
        };
        Ok(Self {
            nthreads,
            #[cfg(feature = "parallel")]
            pool: build_pool(nthreads)?,
        })
    }

    pub(crate) fn nthreads(&self) -> usize {
        self.nthreads
    }

    /// Run `f` over `items`, split into contiguous chunks across the workers.
    ///
    /// Each item stands for `work_per_item` elements. `f` is called once per
    /// chunk and must only touch memory owned by the items it receives.
    pub(crate) fn run_lanes<I, F>(&self, items: &[I], work_per_item: usize, f: F) -> Result<()>
    where
        I: Sync,
        F: Fn(&[I]) -> Result<()> + Sync,
    {
        let work = items.len().saturating_mul(work_per_item.max(1));
        let nthreads = if work < MIN_PARALLEL_ELEMENTS {
            1
        } else {
            self.nthreads.min(items.len())
        };
        if nthreads <= 1 {
            return f(items);
        }
        self.run_parallel(items, nthreads, &f)
    }

    #[cfg(feature = "parallel")]
    fn run_parallel<I, F>(&self, items: &[I], nthreads: usize, f: &F) -> Result<()>
    where
        I: Sync,
        F: Fn(&[I]) -> Result<()> + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| bisect(items, nthreads, f)),
            None => bisect(items, nthreads, f),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_parallel<I, F>(&self, items: &[I], _nthreads: usize, f: &F) -> Result<()>
    where
        I: Sync,
        F: Fn(&[I]) -> Result<()> + Sync,
    {
        f(items)
    }
}

/// A dedicated pool, unless rayon's ambient pool already has `nthreads`.
#[cfg(feature = "parallel")]
fn build_pool(nthreads: usize) -> Result<Option<rayon::ThreadPool>> {
    if nthreads <= 1 || nthreads == rayon::current_num_threads() {
        return Ok(None);
    }
    tracing::trace!(threads = nthreads, "building worker pool");
    rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()
        .map(Some)
        .map_err(|e| crate::FftError::ThreadPool(e.to_string()))
}

#[cfg(feature = "parallel")]
fn bisect<I, F>(items: &[I], nthreads: usize, f: &F) -> Result<()>
where
    I: Sync,
    F: Fn(&[I]) -> Result<()> + Sync,
{
    if nthreads <= 1 || items.len() < 2 {
        return f(items);
    }
    let nt_left = nthreads / 2;
    let split = items.len() * nt_left / nthreads;
    let (left, right) = items.split_at(split.max(1));
    let (r1, r2) = rayon::join(
        || bisect(left, nt_left, f),
        || bisect(right, nthreads - nt_left, f),
    );
    r1?;
    r2
}

/// A process-wide lock the caller holds while calling into a transform.
///
/// When a front end is configured with one, it is released for the duration
/// of each kernel pass and post-pass, and reacquired before returning.
pub trait ExecutionLock: Send + Sync {
    fn release(&self);
    fn acquire(&self);
}

/// Scope guard that releases an [`ExecutionLock`] and reacquires it on drop,
/// including on early error return and unwinding.
pub struct LockRelease<'a> {
    lock: Option<&'a dyn ExecutionLock>,
}

impl<'a> LockRelease<'a> {
    pub fn new(lock: Option<&'a dyn ExecutionLock>) -> Self {
        if let Some(lock) = lock {
            lock.release();
        }
        Self { lock }
    }
}

impl Drop for LockRelease<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock {
            lock.acquire();
        }
    }
}
