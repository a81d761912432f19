// this_file: backends/glyphflow-core/src/cache.rs

//! The byte-budgeted layout cache and its fingerprint key.

use crate::diagnostics::CacheStats;
use crate::traits::LayoutShaper;
use crate::types::{BidiRequest, FontVariant, Hinting, LayoutValue, Paint, TypefaceId};
use log::{debug, warn};
use lru::LruCache;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

/// Default cache budget in bytes.
pub const DEFAULT_CACHE_BYTES: usize = 2 * 1024 * 1024;

/// Identity of a layout request.
///
/// The key owns a copy of the full context window, not just the measured
/// sub-window: surrounding text participates in shaping through bidi
/// resolution and combining-mark composition, so two requests are only
/// interchangeable when their whole contexts match.
#[derive(Debug, Clone)]
pub struct LayoutKey {
    text: Vec<u16>,
    start: usize,
    count: usize,
    dir: BidiRequest,
    typeface: Option<TypefaceId>,
    text_size: f32,
    text_skew_x: f32,
    text_scale_x: f32,
    flags: u32,
    hinting: Hinting,
    variant: FontVariant,
    language: String,
}

impl LayoutKey {
    pub fn new(
        paint: &Paint,
        text: &[u16],
        start: usize,
        count: usize,
        dir: BidiRequest,
    ) -> Self {
        Self {
            text: text.to_vec(),
            start,
            count,
            dir,
            typeface: paint.typeface,
            text_size: paint.text_size,
            text_skew_x: paint.text_skew_x,
            text_scale_x: paint.text_scale_x,
            flags: paint.flags,
            hinting: paint.hinting,
            variant: paint.variant,
            language: paint.language.clone(),
        }
    }

    /// The context code units the key owns.
    pub fn text(&self) -> &[u16] {
        &self.text
    }

    /// Bytes attributed to this key in the cache budget.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of::<u16>() * self.text.len()
    }
}

// Float style fields compare by bit pattern so the key can be hashed.
impl PartialEq for LayoutKey {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.count == other.count
            && self.dir == other.dir
            && self.typeface == other.typeface
            && self.text_size.to_bits() == other.text_size.to_bits()
            && self.text_skew_x.to_bits() == other.text_skew_x.to_bits()
            && self.text_scale_x.to_bits() == other.text_scale_x.to_bits()
            && self.flags == other.flags
            && self.hinting == other.hinting
            && self.variant == other.variant
            && self.language == other.language
            && self.text == other.text
    }
}

impl Eq for LayoutKey {}

impl Hash for LayoutKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.count.hash(state);
        self.dir.hash(state);
        self.typeface.hash(state);
        self.text_size.to_bits().hash(state);
        self.text_skew_x.to_bits().hash(state);
        self.text_scale_x.to_bits().hash(state);
        self.flags.hash(state);
        self.hinting.hash(state);
        self.variant.hash(state);
        self.language.hash(state);
        self.text.hash(state);
    }
}

/// Memoizes shaped layouts under a fixed byte budget.
///
/// Recency is refreshed on hit and eviction removes the oldest entry, so
/// the recency list is plain LRU. Entries larger than the whole budget
/// are computed and returned but never stored.
pub struct LayoutCache {
    entries: LruCache<LayoutKey, Arc<LayoutValue>>,
    current_bytes: usize,
    max_bytes: usize,
    hit_count: u64,
    nanos_saved: i64,
}

impl LayoutCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            current_bytes: 0,
            max_bytes,
            hit_count: 0,
            nanos_saved: 0,
        }
    }

    /// Look up a layout, computing and inserting it on a miss.
    ///
    /// The returned reference stays valid after the entry is evicted.
    pub fn get(
        &mut self,
        shaper: &mut dyn LayoutShaper,
        paint: &Paint,
        text: &[u16],
        start: usize,
        count: usize,
        dir: BidiRequest,
    ) -> Arc<LayoutValue> {
        let lookup_start = Instant::now();
        let key = LayoutKey::new(paint, text, start, count, dir);

        if let Some(value) = self.entries.get(&key) {
            let value = Arc::clone(value);
            let lookup_nanos = lookup_start.elapsed().as_nanos() as i64;
            self.hit_count += 1;
            self.nanos_saved += value.elapsed_nanos as i64 - lookup_nanos;
            debug!(
                target: "glyphflow::cache",
                "hit #{hits} start={start} count={count} context={context}",
                hits = self.hit_count,
                context = text.len(),
            );
            return value;
        }

        let compute_start = Instant::now();
        let mut value = LayoutValue::new(text.len());
        shaper.compute_values(&mut value, paint, text, start, count, dir);
        value.elapsed_nanos = compute_start.elapsed().as_nanos() as u64;
        let value = Arc::new(value);

        let size = key.byte_size() + value.byte_size();
        if size > self.max_bytes {
            warn!(
                target: "glyphflow::cache",
                "entry of {size} bytes exceeds the whole budget of {max} bytes, not caching",
                max = self.max_bytes,
            );
            return value;
        }

        while self.current_bytes + size > self.max_bytes {
            let Some((old_key, old_value)) = self.entries.pop_lru() else {
                // The budget is unsatisfiable with an empty cache only if
                // the byte accounting has drifted from the recency list.
                panic!(
                    "layout cache accounting corrupted: need {size} bytes, \
                     current_bytes={current} max_bytes={max} with no entries left",
                    current = self.current_bytes,
                    max = self.max_bytes,
                );
            };
            let evicted = old_key.byte_size() + old_value.byte_size();
            self.current_bytes -= evicted;
            debug!(
                target: "glyphflow::cache",
                "evicted {evicted} bytes, {current} in use",
                current = self.current_bytes,
            );
        }

        self.current_bytes += size;
        if self.entries.put(key, Arc::clone(&value)).is_some() {
            panic!("layout cache replaced an entry that a missed lookup said was absent");
        }
        debug!(
            target: "glyphflow::cache",
            "miss: added {size} bytes ({current}/{max} in use), computed in {nanos} ns",
            current = self.current_bytes,
            max = self.max_bytes,
            nanos = value.elapsed_nanos,
        );
        value
    }

    /// Drop every entry and reset the byte accounting.
    pub fn purge(&mut self) {
        self.entries.clear();
        self.current_bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            current_bytes: self.current_bytes,
            max_bytes: self.max_bytes,
            hit_count: self.hit_count,
            nanos_saved: self.nanos_saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes a fixed advance per in-window code unit and one glyph per
    /// code unit, enough to exercise the cache without real shaping.
    struct StubShaper {
        advance: f32,
        computations: usize,
    }

    impl StubShaper {
        fn new(advance: f32) -> Self {
            Self {
                advance,
                computations: 0,
            }
        }
    }

    impl LayoutShaper for StubShaper {
        fn compute_values(
            &mut self,
            value: &mut LayoutValue,
            _paint: &Paint,
            text: &[u16],
            start: usize,
            count: usize,
            _dir: BidiRequest,
        ) {
            self.computations += 1;
            let mut x = 0.0;
            for i in start..start + count {
                value.advances[i] = self.advance;
                value.glyphs.push(text[i] as u32);
                value.positions.push(x);
                value.positions.push(0.0);
                x += self.advance;
            }
            value.total_advance = x;
        }

        fn purge(&mut self) {}
    }

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    fn entry_size(text: &[u16]) -> usize {
        let paint = Paint::default();
        let key = LayoutKey::new(&paint, text, 0, text.len(), BidiRequest::Ltr);
        let mut value = LayoutValue::new(text.len());
        let mut shaper = StubShaper::new(10.0);
        shaper.compute_values(&mut value, &paint, text, 0, text.len(), BidiRequest::Ltr);
        key.byte_size() + value.byte_size()
    }

    #[test]
    fn hit_returns_the_shared_value() {
        let mut cache = LayoutCache::new(DEFAULT_CACHE_BYTES);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();
        let text = utf16("hello");

        let first = cache.get(&mut shaper, &paint, &text, 0, 5, BidiRequest::Ltr);
        let second = cache.get(&mut shaper, &paint, &text, 0, 5, BidiRequest::Ltr);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(shaper.computations, 1);
        assert_eq!(cache.stats().hit_count, 1);
        assert_eq!(first.total_advance, 50.0);
    }

    #[test]
    fn paint_fields_participate_in_identity() {
        let mut cache = LayoutCache::new(DEFAULT_CACHE_BYTES);
        let mut shaper = StubShaper::new(10.0);
        let text = utf16("hello");
        let paint = Paint::default();
        let mut bigger = Paint::default();
        bigger.text_size = 24.0;

        cache.get(&mut shaper, &paint, &text, 0, 5, BidiRequest::Ltr);
        cache.get(&mut shaper, &bigger, &text, 0, 5, BidiRequest::Ltr);
        cache.get(&mut shaper, &paint, &text, 0, 5, BidiRequest::Rtl);

        assert_eq!(shaper.computations, 3);
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn context_participates_in_identity() {
        let mut cache = LayoutCache::new(DEFAULT_CACHE_BYTES);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();

        // Same window, different surrounding context.
        cache.get(&mut shaper, &paint, &utf16("abcd"), 1, 2, BidiRequest::Ltr);
        cache.get(&mut shaper, &paint, &utf16("xbcd"), 1, 2, BidiRequest::Ltr);

        assert_eq!(shaper.computations, 2);
    }

    #[test]
    fn evicts_oldest_when_over_budget() {
        let text_a = utf16("aaaa");
        let text_b = utf16("bbbb");
        let text_c = utf16("cccc");
        let size = entry_size(&text_a);
        let mut cache = LayoutCache::new(2 * size);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();

        cache.get(&mut shaper, &paint, &text_a, 0, 4, BidiRequest::Ltr);
        cache.get(&mut shaper, &paint, &text_b, 0, 4, BidiRequest::Ltr);
        assert_eq!(cache.stats().current_bytes, 2 * size);

        // A is the oldest entry, so inserting C drops it.
        cache.get(&mut shaper, &paint, &text_c, 0, 4, BidiRequest::Ltr);
        assert_eq!(cache.stats().entries, 2);
        assert_eq!(cache.stats().current_bytes, 2 * size);

        let before = shaper.computations;
        cache.get(&mut shaper, &paint, &text_a, 0, 4, BidiRequest::Ltr);
        assert_eq!(shaper.computations, before + 1);
    }

    #[test]
    fn hit_refreshes_recency() {
        let text_a = utf16("aaaa");
        let text_b = utf16("bbbb");
        let text_c = utf16("cccc");
        let size = entry_size(&text_a);
        let mut cache = LayoutCache::new(2 * size);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();

        cache.get(&mut shaper, &paint, &text_a, 0, 4, BidiRequest::Ltr);
        cache.get(&mut shaper, &paint, &text_b, 0, 4, BidiRequest::Ltr);
        // Touch A so B becomes the eviction candidate.
        cache.get(&mut shaper, &paint, &text_a, 0, 4, BidiRequest::Ltr);
        cache.get(&mut shaper, &paint, &text_c, 0, 4, BidiRequest::Ltr);

        let before = shaper.computations;
        cache.get(&mut shaper, &paint, &text_a, 0, 4, BidiRequest::Ltr);
        assert_eq!(shaper.computations, before, "A should have survived");
    }

    #[test]
    fn oversize_entries_bypass_the_cache() {
        let text = utf16("oversized");
        let mut cache = LayoutCache::new(16);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();

        let value = cache.get(&mut shaper, &paint, &text, 0, 9, BidiRequest::Ltr);
        assert_eq!(value.glyphs.len(), 9);
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().current_bytes, 0);
    }

    #[test]
    fn budget_invariant_holds_across_inserts() {
        let size = entry_size(&utf16("0123"));
        let mut cache = LayoutCache::new(3 * size);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();

        for i in 0..32u16 {
            let text: Vec<u16> = utf16(&format!("{i:04}"));
            cache.get(&mut shaper, &paint, &text, 0, 4, BidiRequest::Ltr);
            assert!(cache.stats().current_bytes <= cache.stats().max_bytes);
        }
        assert_eq!(cache.stats().entries, 3);
    }

    #[test]
    fn purge_resets_accounting() {
        let mut cache = LayoutCache::new(DEFAULT_CACHE_BYTES);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();
        cache.get(&mut shaper, &paint, &utf16("hello"), 0, 5, BidiRequest::Ltr);

        cache.purge();
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().current_bytes, 0);
    }

    #[test]
    fn empty_window_yields_empty_layout() {
        let mut cache = LayoutCache::new(DEFAULT_CACHE_BYTES);
        let mut shaper = StubShaper::new(10.0);
        let paint = Paint::default();
        let text = utf16("hello");

        let value = cache.get(&mut shaper, &paint, &text, 2, 0, BidiRequest::Ltr);
        assert_eq!(value.total_advance, 0.0);
        assert!(value.glyphs.is_empty());
        assert!(value.positions.is_empty());
        assert_eq!(value.advances, vec![0.0; 5]);
    }
}
