//! Input buffers and their metadata
//!
//! [`NumericArray`] is the boundary where data enters the core: missing
//! values are given explicitly as `None` and stored as the element type's
//! blank marker. [`Buffer`] is how every operation receives its input;
//! passing `&mut` data is what allows an operation to compact and sort the
//! caller's buffer in place instead of copying it.

use crate::element::Element;
use crate::view::{self, SortedView};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Monotonicity of a buffer's (non-blank) elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Increasing,
    Decreasing,
    Unsorted,
}

impl SortOrder {
    /// Whether the elements are monotonic in either direction
    pub fn is_sorted(&self) -> bool {
        !matches!(self, SortOrder::Unsorted)
    }
}

/// Facts about a buffer, computed fresh by [`ArrayMeta::inspect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMeta {
    /// At least one element is blank
    pub has_blank: bool,
    /// Order of the non-blank elements (blanks are skipped)
    pub order: SortOrder,
}

impl ArrayMeta {
    /// Scan a buffer once for blanks and monotonicity
    pub fn inspect<T: Element>(data: &[T]) -> Self {
        let has_blank = data.iter().any(|x| x.is_blank());
        let order = if has_blank {
            view::sort_order(data.iter().copied().filter(|x| !x.is_blank()))
        } else {
            view::sort_order(data.iter().copied())
        };
        Self { has_blank, order }
    }
}

/// An input buffer: read-only (copied when work is needed) or mutable
/// (compacted and sorted in place)
#[derive(Debug)]
pub enum Buffer<'a, T> {
    Shared(&'a [T]),
    Mutable(&'a mut [T]),
}

impl<'a, T> Buffer<'a, T> {
    /// View the current contents
    pub fn as_slice(&self) -> &[T] {
        match self {
            Buffer::Shared(data) => data,
            Buffer::Mutable(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Whether operations may reorder and compact this buffer
    pub fn is_in_place(&self) -> bool {
        matches!(self, Buffer::Mutable(_))
    }
}

impl<'a, T> From<&'a [T]> for Buffer<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Buffer::Shared(data)
    }
}

impl<'a, T> From<&'a mut [T]> for Buffer<'a, T> {
    fn from(data: &'a mut [T]) -> Self {
        Buffer::Mutable(data)
    }
}

impl<'a, T> From<&'a Vec<T>> for Buffer<'a, T> {
    fn from(data: &'a Vec<T>) -> Self {
        Buffer::Shared(data.as_slice())
    }
}

impl<'a, T> From<&'a mut Vec<T>> for Buffer<'a, T> {
    fn from(data: &'a mut Vec<T>) -> Self {
        Buffer::Mutable(data.as_mut_slice())
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Buffer<'a, T> {
    fn from(data: &'a [T; N]) -> Self {
        Buffer::Shared(data.as_slice())
    }
}

impl<'a, T, const N: usize> From<&'a mut [T; N]> for Buffer<'a, T> {
    fn from(data: &'a mut [T; N]) -> Self {
        Buffer::Mutable(data.as_mut_slice())
    }
}

impl<'a, T: Element> From<&'a NumericArray<T>> for Buffer<'a, T> {
    fn from(array: &'a NumericArray<T>) -> Self {
        Buffer::Shared(array.values())
    }
}

/// An owned column of numeric elements with explicit missing values
///
/// The metadata (blanks present, sort order) is memoized on first use and
/// dropped whenever mutable access is handed out.
#[derive(Debug, Clone)]
pub struct NumericArray<T: Element> {
    values: Vec<T>,
    meta: OnceCell<ArrayMeta>,
}

impl<T: Element> NumericArray<T> {
    /// Wrap raw values; any blank marker already present counts as missing
    pub fn from_raw(values: Vec<T>) -> Self {
        Self {
            values,
            meta: OnceCell::new(),
        }
    }

    /// Build from optional values, storing `None` as the blank marker
    pub fn from_options<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        Self::from_raw(
            values
                .into_iter()
                .map(|v| v.unwrap_or_else(T::blank))
                .collect(),
        )
    }

    /// Number of elements, blank or not
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element at `index`, `None` when blank or out of bounds
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied().filter(|v| !v.is_blank())
    }

    /// Number of blank elements
    pub fn blank_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_blank()).count()
    }

    /// Raw values, blanks included
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access; forgets the memoized metadata
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.meta.take();
        &mut self.values
    }

    /// Memoized blank/sort metadata
    pub fn meta(&self) -> ArrayMeta {
        *self.meta.get_or_init(|| ArrayMeta::inspect(&self.values))
    }

    /// Blank-free sorted view, reusing the memoized metadata
    pub fn sorted_view(&self) -> SortedView<'_, T> {
        view::sorted_with_meta(Buffer::Shared(&self.values), Some(self.meta()))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T: Element> FromIterator<Option<T>> for NumericArray<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self::from_options(iter)
    }
}
