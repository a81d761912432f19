// this_file: backends/glyphflow-core/src/engine.rs

//! The engine facade: one shaper, one optional layout cache, one lock.

use crate::cache::{LayoutCache, DEFAULT_CACHE_BYTES};
use crate::diagnostics::CacheStats;
use crate::error::LayoutError;
use crate::traits::LayoutShaper;
use crate::types::{BidiRequest, LayoutValue, Paint};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

struct EngineInner {
    shaper: Box<dyn LayoutShaper>,
    cache: Option<LayoutCache>,
}

/// Routes layout lookups through the cache and shaping driver.
///
/// A single lock guards both the cache and the shaper for the whole
/// duration of a lookup; the shaper reuses internal buffers across calls,
/// so requests are serialized. Returned values are immutable and shared,
/// and remain valid however long the caller holds them.
pub struct TextLayoutEngine {
    inner: Mutex<EngineInner>,
}

impl TextLayoutEngine {
    /// An engine with the default cache budget.
    pub fn new(shaper: Box<dyn LayoutShaper>) -> Self {
        Self::with_cache_bytes(shaper, DEFAULT_CACHE_BYTES)
    }

    /// An engine with an explicit cache budget in bytes.
    pub fn with_cache_bytes(shaper: Box<dyn LayoutShaper>, max_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                shaper,
                cache: Some(LayoutCache::new(max_bytes)),
            }),
        }
    }

    /// An engine that shapes every request, without memoization.
    pub fn uncached(shaper: Box<dyn LayoutShaper>) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                shaper,
                cache: None,
            }),
        }
    }

    /// Shape (or fetch) the layout of `[start, start + count)` within the
    /// full context `text`.
    pub fn get_value(
        &self,
        paint: &Paint,
        text: &[u16],
        start: usize,
        count: usize,
        dir: BidiRequest,
    ) -> Result<Arc<LayoutValue>> {
        if start.checked_add(count).map_or(true, |end| end > text.len()) {
            return Err(LayoutError::WindowOutOfBounds {
                start,
                count,
                context_count: text.len(),
            });
        }

        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let value = match inner.cache.as_mut() {
            Some(cache) => cache.get(inner.shaper.as_mut(), paint, text, start, count, dir),
            None => {
                let mut value = LayoutValue::new(text.len());
                inner
                    .shaper
                    .compute_values(&mut value, paint, text, start, count, dir);
                Arc::new(value)
            }
        };
        Ok(value)
    }

    /// Clear the layout cache and the shaper's per-typeface face cache.
    pub fn purge_caches(&self) {
        let mut inner = self.inner.lock();
        if let Some(cache) = inner.cache.as_mut() {
            cache.purge();
        }
        inner.shaper.purge();
    }

    /// Diagnostics snapshot, when a cache is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.inner.lock().cache.as_ref().map(|c| c.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingShaper {
        computations: usize,
    }

    impl LayoutShaper for CountingShaper {
        fn compute_values(
            &mut self,
            value: &mut LayoutValue,
            _paint: &Paint,
            _text: &[u16],
            start: usize,
            count: usize,
            _dir: BidiRequest,
        ) {
            self.computations += 1;
            for i in start..start + count {
                value.advances[i] = 7.0;
            }
            value.total_advance = 7.0 * count as f32;
        }

        fn purge(&mut self) {}
    }

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn cached_engine_shares_repeat_lookups() {
        let engine = TextLayoutEngine::new(Box::new(CountingShaper { computations: 0 }));
        let text = utf16("abc");
        let paint = Paint::default();

        let a = engine
            .get_value(&paint, &text, 0, 3, BidiRequest::DefaultLtr)
            .unwrap();
        let b = engine
            .get_value(&paint, &text, 0, 3, BidiRequest::DefaultLtr)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cache_stats().unwrap().hit_count, 1);
    }

    #[test]
    fn uncached_engine_computes_every_time() {
        let engine = TextLayoutEngine::uncached(Box::new(CountingShaper { computations: 0 }));
        let text = utf16("abc");
        let paint = Paint::default();

        let a = engine
            .get_value(&paint, &text, 0, 3, BidiRequest::DefaultLtr)
            .unwrap();
        let b = engine
            .get_value(&paint, &text, 0, 3, BidiRequest::DefaultLtr)
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(engine.cache_stats().is_none());
    }

    #[test]
    fn window_past_the_context_is_rejected() {
        let engine = TextLayoutEngine::new(Box::new(CountingShaper { computations: 0 }));
        let text = utf16("abc");
        let err = engine
            .get_value(&Paint::default(), &text, 2, 2, BidiRequest::Ltr)
            .unwrap_err();
        assert!(matches!(err, LayoutError::WindowOutOfBounds { .. }));
    }

    #[test]
    fn purge_empties_the_cache() {
        let engine = TextLayoutEngine::new(Box::new(CountingShaper { computations: 0 }));
        let text = utf16("abc");
        engine
            .get_value(&Paint::default(), &text, 0, 3, BidiRequest::Ltr)
            .unwrap();

        engine.purge_caches();
        let stats = engine.cache_stats().unwrap();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.current_bytes, 0);
    }
}
