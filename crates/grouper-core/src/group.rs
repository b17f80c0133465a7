//! Multi-threaded two-pass group builder.
//!
//! Input: an unordered stream of `(key, value)` pairs. Output: a flat `data`
//! array and an offset array `ptr` such that `data[ptr[k]..ptr[k + 1]]` holds
//! every value pushed under key `k`. This is how CSR/CSC layouts are built
//! from unordered input.
//!
//! The protocol has four steps that must run in order:
//!
//! 1. [`init_budget`](ParallelGroupBuilder::init_budget): size one counting
//!    buffer per worker.
//! 2. [`add_budget`](ParallelGroupBuilder::add_budget): first pass, each worker
//!    counts values per key in its own buffer.
//! 3. [`init_storage`](ParallelGroupBuilder::init_storage): serial prefix sum
//!    over `(key, thread)`; every counter becomes a write cursor.
//! 4. [`push`](ParallelGroupBuilder::push): second pass, each worker writes at
//!    its cursor and advances it.
//!
//! Steps 2 and 4 run concurrently through [`ThreadBudget`] and [`ThreadPush`]
//! handles. Each handle owns its thread's buffer exclusively, and cursors of
//! different threads address disjoint ranges of `data`, so no locks or atomics
//! are involved.
//!
//! Row-major mode (`ROW_MAJOR = true`) statically partitions the key space
//! into contiguous blocks, one per thread (see [`row_major_partition`]); each
//! thread only stores counters for its own block.

use crate::index::GroupIndex;
use core::marker::PhantomData;
use core::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Budget,
    Storage,
}

/// Keys owned by `threadid` when `nkeys` keys are split across `nthread`
/// threads in row-major mode.
///
/// The first `nthread - 1` threads get `nkeys / nthread` keys each, the last
/// one absorbs the remainder. Ranges are relative to the builder's base row
/// offset.
#[must_use]
pub fn row_major_partition(nkeys: usize, nthread: usize, threadid: usize) -> Range<usize> {
    assert!(nthread > 0, "nthread must be at least 1");
    debug_assert!(threadid < nthread, "threadid {threadid} out of range for {nthread} threads");
    let displacement = nkeys / nthread;
    let start = threadid * displacement;
    let end = if threadid + 1 == nthread {
        nkeys
    } else {
        start + displacement
    };
    start..end
}

#[inline]
fn add_to_slot<S: GroupIndex>(trptr: &mut Vec<S>, key: usize, key_origin: usize, nelem: S) {
    debug_assert!(
        key >= key_origin,
        "key {key} lies before this thread's first key {key_origin}"
    );
    let offset_key = key - key_origin;
    if trptr.len() < offset_key + 1 {
        trptr.resize(offset_key + 1, S::ZERO);
    }
    trptr[offset_key] += nelem;
}

/// Parallel group builder writing into caller-owned `ptr` and `data` vectors.
///
/// `S` is the offset type shared by `ptr` and the per-thread buffers.
pub struct ParallelGroupBuilder<'a, V, S = usize, const ROW_MAJOR: bool = false> {
    rptr: &'a mut Vec<S>,
    data: &'a mut Vec<V>,
    /// per-thread budget counters, turned into write cursors by `init_storage`
    thread_rptr: Vec<Vec<S>>,
    /// end of the range reserved for each cursor
    #[cfg(debug_assertions)]
    thread_end: Vec<Vec<S>>,
    base_row_offset: usize,
    thread_displacement: usize,
    phase: Phase,
}

/// Builder where any thread may contribute to any key.
pub type GroupBuilder<'a, V, S = usize> = ParallelGroupBuilder<'a, V, S, false>;

/// Builder whose key space is statically split across threads.
pub type RowMajorGroupBuilder<'a, V, S = usize> = ParallelGroupBuilder<'a, V, S, true>;

impl<'a, V, S: GroupIndex, const ROW_MAJOR: bool> ParallelGroupBuilder<'a, V, S, ROW_MAJOR> {
    #[must_use]
    pub fn new(rptr: &'a mut Vec<S>, data: &'a mut Vec<V>) -> Self {
        Self::with_base_row_offset(rptr, data, 0)
    }

    /// Builder that continues an already populated `(rptr, data)` pair.
    ///
    /// Keys below `base_row_offset` are left untouched; new groups are
    /// appended after `rptr.last()`.
    #[must_use]
    pub fn with_base_row_offset(
        rptr: &'a mut Vec<S>,
        data: &'a mut Vec<V>,
        base_row_offset: usize,
    ) -> Self {
        Self {
            rptr,
            data,
            thread_rptr: Vec::new(),
            #[cfg(debug_assertions)]
            thread_end: Vec::new(),
            base_row_offset,
            thread_displacement: 0,
            phase: Phase::Created,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_row_major(&self) -> bool {
        ROW_MAJOR
    }

    #[inline]
    #[must_use]
    pub fn nthread(&self) -> usize {
        self.thread_rptr.len()
    }

    #[inline]
    #[must_use]
    pub const fn base_row_offset(&self) -> usize {
        self.base_row_offset
    }

    #[inline]
    #[must_use]
    pub const fn thread_displacement(&self) -> usize {
        self.thread_displacement
    }

    #[inline]
    const fn origin(base_row_offset: usize, thread_displacement: usize, threadid: usize) -> usize {
        if ROW_MAJOR {
            base_row_offset + threadid * thread_displacement
        } else {
            base_row_offset
        }
    }

    /// First key addressed by slot 0 of `threadid`'s buffer.
    #[inline]
    #[must_use]
    pub const fn key_origin(&self, threadid: usize) -> usize {
        Self::origin(self.base_row_offset, self.thread_displacement, threadid)
    }

    /// Raw buffer of `threadid`: budgets before `init_storage`, write cursors
    /// after it. Slot `i` belongs to key `key_origin(threadid) + i`.
    #[inline]
    #[must_use]
    pub fn thread_cursors(&self, threadid: usize) -> &[S] {
        &self.thread_rptr[threadid]
    }

    /// Step 1: allocate one zeroed counting buffer per thread.
    ///
    /// `max_key` may underestimate; buffers grow on demand in `add_budget`.
    /// In general mode it is an absolute key bound (keys below the base row
    /// offset are discounted), in row-major mode it is the number of keys in
    /// this batch.
    pub fn init_budget(&mut self, max_key: usize, nthread: usize) {
        assert!(nthread > 0, "nthread must be at least 1");
        let full_size = if ROW_MAJOR {
            max_key
        } else {
            max_key - self.base_row_offset.min(max_key)
        };
        self.thread_displacement = if ROW_MAJOR { full_size / nthread } else { 0 };
        self.thread_rptr.resize_with(nthread, Vec::new);
        for (tid, trptr) in self.thread_rptr.iter_mut().enumerate() {
            let thread_size = if ROW_MAJOR {
                row_major_partition(full_size, nthread, tid).len()
            } else {
                full_size
            };
            trptr.clear();
            trptr.resize(thread_size, S::ZERO);
        }
        self.phase = Phase::Budget;
    }

    /// Step 2: declare that `nelem` values will be pushed under `key` by
    /// `threadid`.
    #[inline]
    pub fn add_budget(&mut self, key: usize, threadid: usize, nelem: S) {
        debug_assert_eq!(self.phase, Phase::Budget, "add_budget outside the budget pass");
        let key_origin = self.key_origin(threadid);
        add_to_slot(&mut self.thread_rptr[threadid], key, key_origin, nelem);
    }

    #[inline]
    pub fn add_unit_budget(&mut self, key: usize, threadid: usize) {
        self.add_budget(key, threadid, S::ONE);
    }

    /// One handle per thread for running the budget pass concurrently.
    /// Handle `i` carries thread id `i`.
    ///
    /// # Panics
    ///
    /// Panics unless called between `init_budget` and `init_storage`.
    pub fn budget_handles(&mut self) -> Vec<ThreadBudget<'_, S>> {
        assert_eq!(self.phase, Phase::Budget, "budget handles outside the budget pass");
        let base_row_offset = self.base_row_offset;
        let thread_displacement = self.thread_displacement;
        self.thread_rptr
            .iter_mut()
            .enumerate()
            .map(|(threadid, counts)| ThreadBudget {
                counts,
                threadid,
                key_origin: Self::origin(base_row_offset, thread_displacement, threadid),
            })
            .collect()
    }

    /// Step 3: turn budgets into `rptr` offsets and per-thread write cursors,
    /// then size `data` to `rptr.last()`.
    ///
    /// Must run alone: no budget or push activity may overlap it.
    ///
    /// # Panics
    ///
    /// Panics unless called once after `init_budget`.
    pub fn init_storage(&mut self)
    where
        V: Default,
    {
        assert_eq!(self.phase, Phase::Budget, "init_storage outside the budget pass");
        #[cfg(debug_assertions)]
        let budgets = self.thread_rptr.clone();

        if ROW_MAJOR {
            self.init_row_major_storage();
        } else {
            self.init_general_storage();
        }
        let nvalues = self.rptr.last().map_or(0, |&back| back.to_usize());
        self.data.resize_with(nvalues, V::default);

        #[cfg(debug_assertions)]
        {
            self.thread_end = self
                .thread_rptr
                .iter()
                .zip(&budgets)
                .map(|(cursors, counts)| {
                    cursors
                        .iter()
                        .zip(counts)
                        .map(|(&c, &n)| S::from_usize(c.to_usize() + n.to_usize()))
                        .collect()
                })
                .collect();
        }
        self.phase = Phase::Storage;
        log::debug!(
            "group storage ready: {} keys from base {}, {} values, {} threads (row_major={})",
            self.rptr.len().saturating_sub(self.base_row_offset + 1),
            self.base_row_offset,
            nvalues,
            self.thread_rptr.len(),
            ROW_MAJOR
        );
    }

    fn init_row_major_storage(&mut self) {
        let expected_rows: usize = self.thread_rptr.iter().map(Vec::len).sum();
        let fill = self.rptr.last().copied().unwrap_or(S::ZERO);
        self.rptr
            .resize(self.base_row_offset + expected_rows + 1, fill);
        let fill = fill.to_usize();

        // thread buffers concatenated in thread order cover the rows in order
        let mut count = 0usize;
        let mut offset_idx = self.base_row_offset + 1;
        for trptr in &mut self.thread_rptr {
            for slot in trptr.iter_mut() {
                let thread_count = slot.to_usize();
                *slot = S::from_usize(count + fill);
                count += thread_count;
                if offset_idx < self.rptr.len() {
                    self.rptr[offset_idx] += S::from_usize(count);
                    offset_idx += 1;
                }
            }
        }
    }

    fn init_general_storage(&mut self) {
        let fill = self.rptr.last().copied().unwrap_or(S::ZERO);
        let longest = self.thread_rptr.iter().map(Vec::len).max().unwrap_or(0);
        if self.rptr.len() <= longest + self.base_row_offset {
            self.rptr.resize(longest + self.base_row_offset + 1, fill);
        }
        let back = self.rptr.last().copied().unwrap_or(S::ZERO).to_usize();

        // key-major, thread-minor prefix sum
        let mut count = 0usize;
        for i in self.base_row_offset..self.rptr.len() - 1 {
            let local = i - self.base_row_offset;
            for trptr in &mut self.thread_rptr {
                if let Some(slot) = trptr.get_mut(local) {
                    let thread_count = slot.to_usize();
                    *slot = S::from_usize(count + back);
                    count += thread_count;
                }
            }
            self.rptr[i + 1] += S::from_usize(count);
        }
    }

    /// Step 4: write `value` at `threadid`'s cursor for `key` and advance it.
    ///
    /// Every `(key, threadid)` must be pushed exactly as many times as it was
    /// budgeted. Extra pushes spill into a neighbouring range; debug builds
    /// assert instead.
    #[inline]
    pub fn push(&mut self, key: usize, value: V, threadid: usize) {
        debug_assert_eq!(self.phase, Phase::Storage, "push before init_storage");
        let offset_key = key - self.key_origin(threadid);
        let rp = &mut self.thread_rptr[threadid][offset_key];
        let dst = rp.to_usize();
        #[cfg(debug_assertions)]
        debug_assert!(
            dst < self.thread_end[threadid][offset_key].to_usize(),
            "push exceeds budget for key {key} on thread {threadid}"
        );
        self.data[dst] = value;
        *rp = S::from_usize(dst + 1);
    }

    /// One handle per thread for running the push pass concurrently.
    /// Handle `i` carries thread id `i`.
    ///
    /// # Panics
    ///
    /// Panics if `init_storage` has not run since the last `init_budget`.
    pub fn push_handles(&mut self) -> Vec<ThreadPush<'_, V, S>> {
        assert_eq!(self.phase, Phase::Storage, "push handles before init_storage");
        let data = SharedSlots::new(self.data.as_mut_slice());
        let base_row_offset = self.base_row_offset;
        let thread_displacement = self.thread_displacement;
        #[cfg(debug_assertions)]
        let thread_end = &self.thread_end;
        self.thread_rptr
            .iter_mut()
            .enumerate()
            .map(|(threadid, cursors)| ThreadPush {
                cursors: cursors.as_mut_slice(),
                #[cfg(debug_assertions)]
                ends: &thread_end[threadid],
                data,
                key_origin: Self::origin(base_row_offset, thread_displacement, threadid),
                threadid,
            })
            .collect()
    }

    /// Release the builder. Debug builds assert that every budgeted slot was
    /// filled by the push pass.
    pub fn finish(self) {
        #[cfg(debug_assertions)]
        if self.phase == Phase::Storage {
            for (tid, (cursors, ends)) in self.thread_rptr.iter().zip(&self.thread_end).enumerate() {
                for (slot, (cursor, end)) in cursors.iter().zip(ends).enumerate() {
                    debug_assert!(
                        cursor == end,
                        "thread {tid} under-pushed key {}: cursor {:?}, reserved end {:?}",
                        self.key_origin(tid) + slot,
                        cursor,
                        end
                    );
                }
            }
        }
    }
}

/// Budget-pass handle owning one thread's counting buffer.
#[derive(Debug)]
pub struct ThreadBudget<'b, S> {
    counts: &'b mut Vec<S>,
    threadid: usize,
    key_origin: usize,
}

impl<S: GroupIndex> ThreadBudget<'_, S> {
    #[inline]
    #[must_use]
    pub const fn threadid(&self) -> usize {
        self.threadid
    }

    #[inline]
    pub fn add_budget(&mut self, key: usize, nelem: S) {
        add_to_slot(self.counts, key, self.key_origin, nelem);
    }

    #[inline]
    pub fn add_unit_budget(&mut self, key: usize) {
        add_to_slot(self.counts, key, self.key_origin, S::ONE);
    }
}

/// Push-pass handle owning one thread's cursors, with a shared view of the
/// data array.
pub struct ThreadPush<'b, V, S> {
    cursors: &'b mut [S],
    #[cfg(debug_assertions)]
    ends: &'b [S],
    data: SharedSlots<'b, V>,
    key_origin: usize,
    threadid: usize,
}

impl<V, S: GroupIndex> ThreadPush<'_, V, S> {
    #[inline]
    #[must_use]
    pub const fn threadid(&self) -> usize {
        self.threadid
    }

    /// Write `value` at this thread's cursor for `key` and advance it.
    ///
    /// # Safety
    ///
    /// `init_storage` must have run, and no budget may have been added after
    /// it. Over the whole push pass, the number of pushes for each
    /// `(key, threadid)` must not exceed the budget declared for it, and `key`
    /// must lie in this thread's key range. Otherwise the write lands outside
    /// `data` or in a range reserved for another thread.
    #[inline]
    pub unsafe fn push(&mut self, key: usize, value: V) {
        let offset_key = key - self.key_origin;
        let rp = &mut self.cursors[offset_key];
        let dst = rp.to_usize();
        #[cfg(debug_assertions)]
        debug_assert!(
            dst < self.ends[offset_key].to_usize(),
            "push exceeds budget for key {key} on thread {}",
            self.threadid
        );
        // SAFETY: dst lies in the range reserved for (key, threadid), which no
        // other handle writes to.
        unsafe { self.data.write(dst, value) };
        *rp = S::from_usize(dst + 1);
    }
}

/// Mutable view of a slice shared by push handles that write disjoint slots.
struct SharedSlots<'b, V> {
    ptr: *mut V,
    len: usize,
    _marker: PhantomData<&'b mut [V]>,
}

impl<'b, V> SharedSlots<'b, V> {
    fn new(slots: &'b mut [V]) -> Self {
        Self {
            ptr: slots.as_mut_ptr(),
            len: slots.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// No other thread may access slot `index` concurrently.
    #[inline]
    unsafe fn write(&self, index: usize, value: V) {
        debug_assert!(index < self.len, "slot {index} out of bounds ({})", self.len);
        unsafe {
            *self.ptr.add(index) = value;
        }
    }
}

impl<V> Clone for SharedSlots<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for SharedSlots<'_, V> {}

// SAFETY: handles only write disjoint slots, and values move across threads.
unsafe impl<V: Send> Send for SharedSlots<'_, V> {}
unsafe impl<V: Send> Sync for SharedSlots<'_, V> {}
