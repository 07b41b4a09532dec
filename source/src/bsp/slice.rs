use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{BspError, Result};

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(BspError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// A `start:stop:step` selection over a lump.
///
/// Bounds are clamped into `[0, len]` and negative bounds count from the end. The selected
/// window is always `[start, stop)`; a negative step walks that window backwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LumpRange {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl Default for LumpRange {
    fn default() -> Self {
        Self {
            start: None,
            stop: None,
            step: 1,
        }
    }
}

impl LumpRange {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    pub fn step_by(self, step: isize) -> Self {
        Self { step, ..self }
    }

    pub fn reversed() -> Self {
        Self::default().step_by(-1)
    }

    pub(crate) fn window(&self, len: usize) -> Result<Window> {
        if self.step == 0 {
            return Err(BspError::ZeroStep);
        }
        let clamp = |bound: isize| -> usize {
            if bound < 0 {
                (len as isize + bound).max(0) as usize
            } else {
                (bound as usize).min(len)
            }
        };
        let start = self.start.map_or(0, clamp);
        let stop = self.stop.map_or(len, clamp).max(start);
        Ok(Window {
            start,
            stop,
            step: self.step,
        })
    }
}

impl From<RangeFull> for LumpRange {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

impl From<Range<isize>> for LumpRange {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end), 1)
    }
}

impl From<RangeFrom<isize>> for LumpRange {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None, 1)
    }
}

impl From<RangeTo<isize>> for LumpRange {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end), 1)
    }
}

/// A normalised [`LumpRange`], `start <= stop <= len`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Window {
    pub start: usize,
    pub stop: usize,
    pub step: isize,
}

impl Window {
    pub fn is_contiguous(&self) -> bool {
        self.step == 1 || self.step == -1
    }

    pub fn indices(&self) -> Vec<usize> {
        let stride = self.step.unsigned_abs();
        if self.step > 0 {
            (self.start..self.stop).step_by(stride).collect()
        } else {
            (self.start..self.stop).rev().step_by(stride).collect()
        }
    }
}

#[cfg(test)]
mod slice_tests {
    use super::*;

    #[test]
    fn single_index() {
        assert_eq!(normalize_index(0, 3).unwrap(), 0);
        assert_eq!(normalize_index(-1, 3).unwrap(), 2);
        assert_eq!(normalize_index(-3, 3).unwrap(), 0);
        assert!(matches!(
            normalize_index(3, 3),
            Err(BspError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(normalize_index(-4, 3).is_err());
        assert!(normalize_index(0, 0).is_err());
    }

    #[test]
    fn full_and_empty() {
        let w = LumpRange::from(..).window(10).unwrap();
        assert_eq!(w.indices().len(), 10);
        for a in 0..10 {
            assert!(LumpRange::from(a..a).window(10).unwrap().indices().is_empty());
        }
    }

    #[test]
    fn clamping() {
        let w = LumpRange::from(-3..100).window(10).unwrap();
        assert_eq!((w.start, w.stop), (7, 10));
        let w = LumpRange::from(-100..).window(10).unwrap();
        assert_eq!((w.start, w.stop), (0, 10));
        let w = LumpRange::from(..-2).window(10).unwrap();
        assert_eq!((w.start, w.stop), (0, 8));
        let w = LumpRange::from(20..).window(10).unwrap();
        assert_eq!((w.start, w.stop), (10, 10));
        let w = LumpRange::from(6..2).window(10).unwrap();
        assert!(w.indices().is_empty());
    }

    #[test]
    fn steps() {
        assert!(matches!(
            LumpRange::default().step_by(0).window(4),
            Err(BspError::ZeroStep)
        ));
        assert_eq!(
            LumpRange::default().step_by(2).window(5).unwrap().indices(),
            vec![0, 2, 4]
        );
        assert_eq!(LumpRange::reversed().window(4).unwrap().indices(), vec![3, 2, 1, 0]);
        assert_eq!(
            LumpRange::new(Some(1), None, -2).window(6).unwrap().indices(),
            vec![5, 3, 1]
        );
    }
}
