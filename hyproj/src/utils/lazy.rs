//! Publish-once lazy values.
//!
//! [`Lazy`] computes its value on first access and keeps the first successfully published result
//! for its whole lifetime. Concurrent first accesses may run the initializer more than once; only
//! one result is published and the others are dropped. Nothing blocks.
//!
//! A failed initialization publishes nothing: the error is returned to the caller and the next
//! access runs the initializer again.
use std::{fmt, sync::Arc};

use hyexpr::error::Result;
use once_cell::race::OnceBox;

type Init<T> = Arc<dyn Fn() -> Result<T> + Send + Sync>;

pub struct Lazy<T> {
    cell: OnceBox<T>,
    init: Init<T>,
}

impl<T> Lazy<T> {
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            cell: OnceBox::new(),
            init: Arc::new(init),
        }
    }

    /// Already published value.
    pub fn ready(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let lazy = Self::new({
            let value = value.clone();
            move || Ok(value.clone())
        });
        // A fresh cell cannot already be set.
        let _ = lazy.cell.set(Box::new(value));
        lazy
    }

    /// Value, computed on first access.
    pub fn force(&self) -> Result<&T> {
        self.cell.get_or_try_init(|| (self.init)().map(Box::new))
    }

    /// Value if it has already been published.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => write!(f, "Lazy(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hyexpr::error::Error;

    use super::*;

    #[test]
    fn initializer_runs_once_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = Lazy::new({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        });
        assert!(!lazy.is_ready());
        assert_eq!(*lazy.force().unwrap(), 42);
        assert_eq!(*lazy.force().unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_not_published() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy = Lazy::new({
            let calls = calls.clone();
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::DecompilerUnavailable)
                } else {
                    Ok("second")
                }
            }
        });
        assert!(lazy.force().unwrap_err().is_decompiler_unavailable());
        assert!(lazy.get().is_none());
        assert_eq!(*lazy.force().unwrap(), "second");
    }

    #[test]
    fn concurrent_readers_observe_one_value() {
        let lazy = Arc::new(Lazy::new(|| Ok(Box::new(7u32))));
        let seen: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let lazy = lazy.clone();
                    s.spawn(move || {
                        let value = lazy.force().unwrap();
                        &**value as *const u32 as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }
}
