//! Shape-keyed buffer pool.
//!
//! Caches fixed-shape buffer objects so the render path can reuse them
//! across frames instead of allocating per tick. Objects are keyed by
//! their exact [`BufferShape`]; each key holds a recency-ordered idle
//! list, so acquire hands back the most recently released object in O(1)
//! and eviction scans oldest-first.
//!
//! Checkout handles ([`Pooled`]) are reference-counted: when the last
//! clone drops, the object goes back on the idle list for its key with a
//! refreshed timestamp. [`BufferPool::cleanup`] is driven by an external
//! periodic caller; the pool owns no threads.

use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

/// Shape key of a pooled buffer: element capacity plus layer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferShape {
    /// Element capacity per layer.
    pub capacity: u32,
    /// Number of layers.
    pub layers: u8,
}

impl BufferShape {
    /// Creates a shape key.
    #[inline]
    pub const fn new(capacity: u32, layers: u8) -> Self {
        Self { capacity, layers }
    }

    /// Total element count across all layers.
    #[inline]
    pub const fn elements(&self) -> usize {
        self.capacity as usize * self.layers as usize
    }
}

/// Idle entry: the object plus the instant its last checkout handle dropped.
struct IdleEntry<T> {
    value: T,
    released_at: Instant,
}

struct PoolState<T> {
    idle: HashMap<BufferShape, VecDeque<IdleEntry<T>>>,
    hits: u64,
    misses: u64,
}

struct PoolInner<T> {
    state: Mutex<PoolState<T>>,
    factory: Box<dyn Fn(BufferShape) -> T + Send + Sync>,
}

/// Shape-keyed pool of reusable buffer objects.
///
/// Cloning the pool is cheap and yields another handle to the same
/// underlying storage; all operations are serialized by one mutex.
pub struct BufferPool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for BufferPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> BufferPool<T> {
    /// Creates a pool that constructs missing objects with `factory`.
    pub fn new(factory: impl Fn(BufferShape) -> T + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    idle: HashMap::new(),
                    hits: 0,
                    misses: 0,
                }),
                factory: Box::new(factory),
            }),
        }
    }

    /// Checks out a buffer of the exact shape `(capacity, layers)`.
    ///
    /// Reuses the most recently released idle object under that key if one
    /// exists, otherwise constructs a new one. The returned handle owns
    /// the object until its last clone drops.
    pub fn acquire(&self, capacity: u32, layers: u8) -> Pooled<T> {
        let shape = BufferShape::new(capacity, layers);

        let reused = {
            let mut state = self.inner.state.lock().unwrap();
            let entry = state.idle.get_mut(&shape).and_then(VecDeque::pop_back);
            match entry {
                Some(entry) => {
                    state.hits += 1;
                    Some(entry.value)
                }
                None => {
                    state.misses += 1;
                    None
                }
            }
        };

        let value = reused.unwrap_or_else(|| (self.inner.factory)(shape));
        Pooled {
            shared: Arc::new(PooledInner {
                value: Some(value),
                shape,
                pool: Arc::downgrade(&self.inner),
            }),
        }
    }

    /// Evicts idle entries that have been unused for at least `max_idle`.
    ///
    /// Scans each key's idle list oldest-first and destroys expired
    /// entries; checked-out objects are never touched. `Duration::ZERO`
    /// evicts everything idle, `Duration::MAX` evicts nothing.
    pub fn cleanup(&self, max_idle: Duration) {
        let now = Instant::now();
        let mut state = self.inner.state.lock().unwrap();
        for list in state.idle.values_mut() {
            while let Some(entry) = list.front() {
                if now.duration_since(entry.released_at) >= max_idle {
                    list.pop_front();
                } else {
                    break;
                }
            }
        }
        state.idle.retain(|_, list| !list.is_empty());
    }

    /// Number of idle objects across all keys.
    pub fn idle_count(&self) -> usize {
        let state = self.inner.state.lock().unwrap();
        state.idle.values().map(VecDeque::len).sum()
    }

    /// Times an acquire was served from the idle lists.
    pub fn hits(&self) -> u64 {
        self.inner.state.lock().unwrap().hits
    }

    /// Times an acquire had to construct a new object.
    pub fn misses(&self) -> u64 {
        self.inner.state.lock().unwrap().misses
    }
}

struct PooledInner<T> {
    // Present from construction until drop; taken exactly once below.
    value: Option<T>,
    shape: BufferShape,
    pool: Weak<PoolInner<T>>,
}

impl<T> Drop for PooledInner<T> {
    fn drop(&mut self) {
        // Reinsert into the idle list unless the pool itself is gone.
        if let (Some(value), Some(pool)) = (self.value.take(), self.pool.upgrade()) {
            let mut state = pool.state.lock().unwrap();
            state.idle.entry(self.shape).or_default().push_back(IdleEntry {
                value,
                released_at: Instant::now(),
            });
        }
    }
}

/// Reference-counted checkout handle for a pooled object.
///
/// Clones share the same object; the object returns to its pool's idle
/// list when the last clone drops. Exclusive mutation is available via
/// [`Pooled::get_mut`] while the handle is unshared.
pub struct Pooled<T> {
    shared: Arc<PooledInner<T>>,
}

impl<T> Clone for Pooled<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Pooled<T> {
    /// Shape key this object was acquired under.
    #[inline]
    pub fn shape(&self) -> BufferShape {
        self.shared.shape
    }

    /// Mutable access, available only while this handle is the sole owner.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.shared).and_then(|inner| inner.value.as_mut())
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.shared
            .value
            .as_ref()
            .expect("pooled value is present until the handle drops")
    }
}
