//! Blank-free sorted views
//!
//! Nearly every order statistic needs its input without blanks and sorted.
//! [`no_blank_sorted`] produces that view with as little work as possible:
//!
//! - already clean and monotonic: the input is borrowed, nothing is copied
//! - a [`Buffer::Mutable`] input: blanks are compacted to the front of the
//!   caller's buffer and that prefix is sorted in place (the caller's
//!   original ordering is lost)
//! - a [`Buffer::Shared`] input: the non-blank values are copied and the
//!   copy is sorted
//!
//! Data that is already sorted in decreasing order is kept that way; the
//! consumers all honor [`SortedView::order`].

use crate::array::{ArrayMeta, Buffer, SortOrder};
use crate::element::Element;
use std::cmp::Ordering;

/// Storage behind a [`SortedView`]
#[derive(Debug, Clone)]
pub enum SortedData<'a, T> {
    /// Aliases the caller's buffer (possibly after in-place compaction)
    Borrowed(&'a [T]),
    /// A private copy
    Owned(Vec<T>),
}

/// A blank-free, monotonic view of a numeric buffer
#[derive(Debug, Clone)]
pub struct SortedView<'a, T> {
    data: SortedData<'a, T>,
    order: SortOrder,
}

impl<'a, T: Element> SortedView<'a, T> {
    /// Wrap an owned vector that is already blank-free and sorted.
    pub(crate) fn from_sorted_vec(values: Vec<T>, order: SortOrder) -> Self {
        debug_assert!(order.is_sorted());
        Self {
            data: SortedData::Owned(values),
            order,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match &self.data {
            SortedData::Borrowed(data) => data,
            SortedData::Owned(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Increasing or decreasing (never `Unsorted`)
    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn is_increasing(&self) -> bool {
        self.order == SortOrder::Increasing
    }

    /// Whether the view aliases the caller's buffer
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, SortedData::Borrowed(_))
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    pub fn first(&self) -> Option<T> {
        self.as_slice().first().copied()
    }

    pub fn last(&self) -> Option<T> {
        self.as_slice().last().copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Smallest value, whatever the direction of the view
    pub fn min_value(&self) -> Option<T> {
        match self.order {
            SortOrder::Decreasing => self.last(),
            _ => self.first(),
        }
    }

    /// Largest value, whatever the direction of the view
    pub fn max_value(&self) -> Option<T> {
        match self.order {
            SortOrder::Decreasing => self.first(),
            _ => self.last(),
        }
    }

    /// Values widened to `f64`, in view order
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.iter().map(|v| v.to_f64()).collect()
    }

    pub fn into_owned(self) -> SortedView<'static, T> {
        let values = match self.data {
            SortedData::Borrowed(data) => data.to_vec(),
            SortedData::Owned(data) => data,
        };
        SortedView {
            data: SortedData::Owned(values),
            order: self.order,
        }
    }
}

impl<'a, T> From<&'a SortedView<'_, T>> for Buffer<'a, T>
where
    T: Element,
{
    fn from(view: &'a SortedView<'_, T>) -> Self {
        Buffer::Shared(view.as_slice())
    }
}

/// Monotonicity of a sequence; 0 or 1 element counts as increasing.
///
/// The direction is set by the first pair; ties are allowed in both.
pub(crate) fn sort_order<T, I>(values: I) -> SortOrder
where
    T: PartialOrd + Copy,
    I: IntoIterator<Item = T>,
{
    let mut iter = values.into_iter();
    let (first, second) = match (iter.next(), iter.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return SortOrder::Increasing,
    };

    let increasing = second >= first;
    let mut prev = second;
    for value in iter {
        let broken = if increasing { value < prev } else { value > prev };
        if broken {
            return SortOrder::Unsorted;
        }
        prev = value;
    }

    if increasing {
        SortOrder::Increasing
    } else {
        SortOrder::Decreasing
    }
}

/// Check whether a buffer is sorted (blanks are not skipped)
pub fn is_sorted<T: Element>(data: &[T]) -> SortOrder {
    sort_order(data.iter().copied())
}

fn compare<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Sort in increasing order (blank values are not treated specially)
pub fn sort_increasing<T: Element>(data: &mut [T]) {
    data.sort_unstable_by(compare);
}

/// Sort in decreasing order (blank values are not treated specially)
pub fn sort_decreasing<T: Element>(data: &mut [T]) {
    data.sort_unstable_by(|a, b| compare(b, a));
}

/// Move all non-blank elements to the front, keeping their order.
/// Returns how many were kept.
fn compact_blanks<T: Element>(data: &mut [T]) -> usize {
    let mut kept = 0;
    for i in 0..data.len() {
        if !data[i].is_blank() {
            data[kept] = data[i];
            kept += 1;
        }
    }
    kept
}

/// Build a blank-free sorted view of the input.
///
/// A [`Buffer::Mutable`] input is modified: its first `view.len()`
/// elements become the sorted non-blank values and the remainder is left
/// unspecified.
pub fn no_blank_sorted<'a, T, B>(input: B) -> SortedView<'a, T>
where
    T: Element,
    B: Into<Buffer<'a, T>>,
{
    sorted_with_meta(input.into(), None)
}

/// [`no_blank_sorted`] with optionally precomputed metadata.
pub(crate) fn sorted_with_meta<'a, T: Element>(
    input: Buffer<'a, T>,
    meta: Option<ArrayMeta>,
) -> SortedView<'a, T> {
    let meta = meta.unwrap_or_else(|| ArrayMeta::inspect(input.as_slice()));

    match input {
        Buffer::Shared(data) => {
            if !meta.has_blank && meta.order.is_sorted() {
                return SortedView {
                    data: SortedData::Borrowed(data),
                    order: meta.order,
                };
            }

            let mut values: Vec<T> = if meta.has_blank {
                data.iter().copied().filter(|v| !v.is_blank()).collect()
            } else {
                data.to_vec()
            };
            let order = if meta.order.is_sorted() {
                meta.order
            } else {
                sort_increasing(&mut values);
                SortOrder::Increasing
            };
            let order = short_view_order(values.len(), order);
            SortedView::from_sorted_vec(values, order)
        }
        Buffer::Mutable(data) => {
            let kept = if meta.has_blank {
                compact_blanks(data)
            } else {
                data.len()
            };
            let data = &mut data[..kept];
            let order = if meta.order.is_sorted() {
                meta.order
            } else {
                sort_increasing(data);
                SortOrder::Increasing
            };
            let data: &'a [T] = data;
            SortedView {
                data: SortedData::Borrowed(data),
                order: short_view_order(data.len(), order),
            }
        }
    }
}

/// Views of fewer than two elements are always tagged increasing.
fn short_view_order(len: usize, order: SortOrder) -> SortOrder {
    if len < 2 {
        SortOrder::Increasing
    } else {
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NumericArray;

    #[test]
    fn test_sorted_input_is_borrowed() {
        let data = [1.0, 2.0, 2.0, 7.0];
        let view = no_blank_sorted(&data);
        assert!(view.is_borrowed());
        assert_eq!(view.order(), SortOrder::Increasing);
        assert_eq!(view.as_slice(), &data);
    }

    #[test]
    fn test_decreasing_input_is_kept() {
        let data = [9u8, 5, 1];
        let view = no_blank_sorted(&data);
        assert!(view.is_borrowed());
        assert_eq!(view.order(), SortOrder::Decreasing);
        assert_eq!(view.min_value(), Some(1));
        assert_eq!(view.max_value(), Some(9));
    }

    #[test]
    fn test_copy_removes_blanks_and_sorts() {
        let data = vec![3.0f32, f32::NAN, 1.0, 2.0];
        let view = no_blank_sorted(&data);
        assert!(!view.is_borrowed());
        assert_eq!(view.as_slice(), &[1.0, 2.0, 3.0]);
        // Input untouched
        assert_eq!(data[0], 3.0);
        assert!(data[1].is_nan());
    }

    #[test]
    fn test_in_place_compacts_and_sorts() {
        let mut data = vec![5i32, i32::MIN, -1, 3, i32::MIN];
        {
            let view = no_blank_sorted(&mut data);
            assert!(view.is_borrowed());
            assert_eq!(view.as_slice(), &[-1, 3, 5]);
        }
        assert_eq!(&data[..3], &[-1, 3, 5]);
    }

    #[test]
    fn test_empty_and_all_blank() {
        let empty: [f64; 0] = [];
        let view = no_blank_sorted(&empty);
        assert!(view.is_empty());
        assert_eq!(view.order(), SortOrder::Increasing);

        let blanks = [u16::MAX, u16::MAX];
        let view = no_blank_sorted(&blanks);
        assert!(view.is_empty());
        assert_eq!(view.order(), SortOrder::Increasing);
    }

    #[test]
    fn test_sorted_with_blanks_skips_sort() {
        let data = [f64::NAN, 4.0, 3.0, f64::NAN, 1.0];
        let view = no_blank_sorted(&data);
        assert_eq!(view.order(), SortOrder::Decreasing);
        assert_eq!(view.as_slice(), &[4.0, 3.0, 1.0]);
    }

    #[test]
    fn test_is_sorted_and_sorting() {
        assert_eq!(is_sorted::<u8>(&[]), SortOrder::Increasing);
        assert_eq!(is_sorted(&[4]), SortOrder::Increasing);
        assert_eq!(is_sorted(&[1, 1, 2]), SortOrder::Increasing);
        assert_eq!(is_sorted(&[3, 2, 2]), SortOrder::Decreasing);
        assert_eq!(is_sorted(&[1, 3, 2]), SortOrder::Unsorted);

        let mut data = vec![2.5, -1.0, 8.0];
        sort_decreasing(&mut data);
        assert_eq!(data, vec![8.0, 2.5, -1.0]);
        sort_increasing(&mut data);
        assert_eq!(data, vec![-1.0, 2.5, 8.0]);
    }

    #[test]
    fn test_into_owned_detaches() {
        let view = {
            let data = vec![1u32, 2, 3];
            no_blank_sorted(&data).into_owned()
        };
        assert!(!view.is_borrowed());
        assert_eq!(view.last(), Some(3));
    }

    #[test]
    fn test_numeric_array_view() {
        let array = NumericArray::from_options(vec![Some(4i64), None, Some(2)]);
        let view = array.sorted_view();
        assert_eq!(view.as_slice(), &[2, 4]);
        assert_eq!(array.values().len(), 3);
    }
}
