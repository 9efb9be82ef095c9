//! Tolerance matching over raw timing captures.
//!
//! [`RawReader`] walks a capture entry by entry.  Each `expect_*` call
//! consumes one entry on success and leaves the cursor untouched on
//! failure, so decoders can try alternatives.

use crate::error::DecodeFailure;

/// Default timing tolerance, percent.
pub const DEFAULT_TOLERANCE_PCT: u32 = 25;

/// `(lower, upper)` bounds around a nominal duration in µs.
#[inline]
pub const fn window(nominal_us: u32, tolerance_pct: u32) -> (u32, u32) {
    (
        nominal_us * (100 - tolerance_pct) / 100,
        nominal_us * (100 + tolerance_pct) / 100,
    )
}

#[inline]
pub fn within(actual_us: u32, nominal_us: u32, tolerance_pct: u32) -> bool {
    let (lo, hi) = window(nominal_us, tolerance_pct);
    actual_us >= lo && actual_us <= hi
}

pub struct RawReader<'a> {
    raw: &'a [i32],
    pos: usize,
    tolerance_pct: u32,
}

impl<'a> RawReader<'a> {
    pub fn new(raw: &'a [i32]) -> Self {
        Self::with_tolerance(raw, DEFAULT_TOLERANCE_PCT)
    }

    pub fn with_tolerance(raw: &'a [i32], tolerance_pct: u32) -> Self {
        Self {
            raw,
            pos: 0,
            tolerance_pct: tolerance_pct.min(99),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.raw.len() - self.pos
    }

    /// Peek the next entry.
    pub fn peek(&self) -> Option<i32> {
        self.raw.get(self.pos).copied()
    }

    /// Whether only an optional trailing idle space is left.
    pub fn at_end(&self) -> bool {
        match self.remaining() {
            0 => true,
            1 => self.raw[self.pos] < 0,
            _ => false,
        }
    }

    fn out_of_tolerance(&self) -> DecodeFailure {
        DecodeFailure::OutOfTolerance { index: self.pos }
    }

    pub fn peek_mark(&self, nominal_us: u32) -> bool {
        matches!(self.peek(), Some(v) if v > 0 && within(v as u32, nominal_us, self.tolerance_pct))
    }

    pub fn peek_space(&self, nominal_us: u32) -> bool {
        matches!(self.peek(), Some(v) if v < 0 && within(v.unsigned_abs(), nominal_us, self.tolerance_pct))
    }

    pub fn expect_mark(&mut self, nominal_us: u32) -> Result<(), DecodeFailure> {
        if self.peek_mark(nominal_us) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.out_of_tolerance())
        }
    }

    pub fn expect_space(&mut self, nominal_us: u32) -> Result<(), DecodeFailure> {
        if self.peek_space(nominal_us) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.out_of_tolerance())
        }
    }

    /// Mark followed by space.  Consumes both or neither.
    pub fn expect_item(&mut self, mark_us: u32, space_us: u32) -> Result<(), DecodeFailure> {
        let start = self.pos;
        self.expect_mark(mark_us)?;
        if let Err(e) = self.expect_space(space_us) {
            self.pos = start;
            return Err(e);
        }
        Ok(())
    }

    /// Consume a space of at least `min_us`.
    pub fn expect_space_at_least(&mut self, min_us: u32) -> Result<(), DecodeFailure> {
        match self.peek() {
            Some(v) if v < 0 && v.unsigned_abs() >= min_us => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.out_of_tolerance()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_symmetric_percentage() {
        assert_eq!(window(1000, 25), (750, 1250));
        assert!(within(842, 842, 25));
        assert!(!within(500, 842, 25));
    }

    #[test]
    fn item_consumes_both_or_neither() {
        let raw = [560, -1690, 560];
        let mut r = RawReader::new(&raw);
        assert!(r.expect_item(560, 560).is_err());
        assert_eq!(r.position(), 0);
        r.expect_item(560, 1690).unwrap();
        assert_eq!(r.position(), 2);
        r.expect_mark(560).unwrap();
        assert!(r.at_end());
    }

    #[test]
    fn trailing_space_counts_as_end() {
        let raw = [842, -20_000];
        let mut r = RawReader::new(&raw);
        r.expect_mark(842).unwrap();
        assert!(r.at_end());
    }

    #[test]
    fn sign_selects_mark_or_space() {
        let raw = [-560];
        let mut r = RawReader::new(&raw);
        assert_eq!(r.expect_mark(560), Err(DecodeFailure::OutOfTolerance { index: 0 }));
        r.expect_space(560).unwrap();
    }
}
