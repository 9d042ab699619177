//! Sorted interval sets.
//!
//! An `IntervalSet` is an ordered list of disjoint, inclusive ranges over
//! `i32`. The same type covers token types (parser ATNs, where `-1` is EOF)
//! and Unicode code points (lexer ATNs).

use std::fmt;

/// Inclusive range `a..=b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub a: i32,
    pub b: i32,
}

impl Interval {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn contains(&self, v: i32) -> bool {
        self.a <= v && v <= self.b
    }

    /// Number of values covered.
    pub fn len(&self) -> u32 {
        if self.b < self.a {
            0
        } else {
            (self.b - self.a + 1) as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.b < self.a
    }

    fn overlaps(&self, other: &Interval) -> bool {
        self.a <= other.b && other.a <= self.b
    }

    /// True when the two ranges touch or overlap, so a union stays one range.
    fn adjacent_or_overlaps(&self, other: &Interval) -> bool {
        // Widen by one on each side; saturating keeps i32::MIN/MAX safe.
        self.a.saturating_sub(1) <= other.b && other.a <= self.b.saturating_add(1)
    }
}

/// Set of disjoint intervals kept sorted by lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing the single value `v`.
    pub fn of(v: i32) -> Self {
        let mut s = Self::new();
        s.add(v);
        s
    }

    /// Set containing the inclusive range `a..=b`.
    pub fn of_range(a: i32, b: i32) -> Self {
        let mut s = Self::new();
        s.add_range(a, b);
        s
    }

    pub fn add(&mut self, v: i32) {
        self.add_range(v, v);
    }

    /// Add `a..=b`, merging with touching or overlapping intervals.
    pub fn add_range(&mut self, a: i32, b: i32) {
        if b < a {
            return;
        }
        let mut merged = Interval::new(a, b);
        let mut out = Vec::with_capacity(self.intervals.len() + 1);
        let mut placed = false;

        for iv in &self.intervals {
            if placed || iv.a > merged.b.saturating_add(1) {
                // Entirely after the merged range (once placed, copy the rest).
                if !placed {
                    out.push(merged);
                    placed = true;
                }
                out.push(*iv);
            } else if iv.adjacent_or_overlaps(&merged) {
                merged = Interval::new(merged.a.min(iv.a), merged.b.max(iv.b));
            } else {
                // Entirely before.
                out.push(*iv);
            }
        }
        if !placed {
            out.push(merged);
        }
        self.intervals = out;
    }

    /// Union with another set.
    pub fn add_set(&mut self, other: &IntervalSet) {
        for iv in &other.intervals {
            self.add_range(iv.a, iv.b);
        }
    }

    /// First existing interval that overlaps `a..=b`, if any.
    ///
    /// Callers use this to report collisions before merging.
    pub fn overlap(&self, a: i32, b: i32) -> Option<Interval> {
        let probe = Interval::new(a, b);
        self.intervals.iter().copied().find(|iv| iv.overlaps(&probe))
    }

    pub fn contains(&self, v: i32) -> bool {
        // Intervals are sorted; partition_point finds the candidate.
        let idx = self.intervals.partition_point(|iv| iv.b < v);
        self.intervals.get(idx).is_some_and(|iv| iv.contains(v))
    }

    /// True when the two sets share at least one value.
    pub fn intersects(&self, other: &IntervalSet) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let x = self.intervals[i];
            let y = other.intervals[j];
            if x.overlaps(&y) {
                return true;
            }
            if x.b < y.b { i += 1 } else { j += 1 }
        }
        false
    }

    /// Values in `universe` that are not in `self`.
    pub fn complement(&self, universe_min: i32, universe_max: i32) -> IntervalSet {
        let mut out = IntervalSet::new();
        let mut next = universe_min;
        for iv in &self.intervals {
            if iv.b < universe_min {
                continue;
            }
            if iv.a > universe_max {
                break;
            }
            if iv.a > next {
                out.add_range(next, iv.a - 1);
            }
            next = next.max(iv.b.saturating_add(1));
        }
        if next <= universe_max {
            out.add_range(next, universe_max);
        }
        out
    }

    pub fn is_nil(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total number of values covered.
    pub fn size(&self) -> u32 {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// Lowest value, if the set is non-empty.
    pub fn min(&self) -> Option<i32> {
        self.intervals.first().map(|iv| iv.a)
    }

    /// Highest value, if the set is non-empty.
    pub fn max(&self) -> Option<i32> {
        self.intervals.last().map(|iv| iv.b)
    }

    /// The single value, when the set covers exactly one.
    pub fn single(&self) -> Option<i32> {
        match self.intervals.as_slice() {
            [iv] if iv.a == iv.b => Some(iv.a),
            _ => None,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter_values(&self) -> impl Iterator<Item = i32> + '_ {
        self.intervals.iter().flat_map(|iv| iv.a..=iv.b)
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.len() != 1 {
            f.write_str("{")?;
        }
        for (i, iv) in self.intervals.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if iv.a == iv.b {
                write!(f, "{}", iv.a)?;
            } else {
                write!(f, "{}..{}", iv.a, iv.b)?;
            }
        }
        if self.intervals.len() != 1 {
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl FromIterator<i32> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        let mut s = IntervalSet::new();
        for v in iter {
            s.add(v);
        }
        s
    }
}
