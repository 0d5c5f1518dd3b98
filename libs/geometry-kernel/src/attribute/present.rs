//! # Attribute Store
//!
//! A typed value array with a parallel presence array. Absence is a state
//! of its own: an absent element's value is unspecified and never read.

use std::ops::Range;

use super::descriptor::AttributeDescriptor;
use super::value::AttributeValue;

/// Sparse per-element attribute storage.
///
/// A store must be bound to its element domain before use. Binding sizes
/// the store to the domain's element count; using an unbound store is a
/// contract violation and panics.
///
/// # Example
///
/// ```rust
/// use geometry_kernel::attribute::{AttributeDescriptors, AttributePresent};
/// use glam::Vec3;
///
/// let mut normals = AttributePresent::<Vec3>::new(AttributeDescriptors::NORMAL);
/// normals.bind(3);
/// normals.set(1, Vec3::Z);
///
/// assert!(normals.has(1));
/// assert!(!normals.has(0));
/// assert!(!normals.has(99));
/// assert_eq!(normals.try_get(1), Some(Vec3::Z));
/// assert_eq!(normals.try_get(2), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePresent<T: AttributeValue> {
    descriptor: AttributeDescriptor,
    values: Vec<T>,
    present: Vec<bool>,
    bound: bool,
}

impl<T: AttributeValue> AttributePresent<T> {
    /// Creates an unbound, empty store.
    pub fn new(descriptor: AttributeDescriptor) -> Self {
        Self {
            descriptor,
            values: Vec::new(),
            present: Vec::new(),
            bound: false,
        }
    }

    /// Descriptor of the stored attribute.
    pub fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    // =========================================================================
    // BINDING
    // =========================================================================

    /// Attaches the store to a domain of `element_count` elements.
    ///
    /// New elements start absent. Binding an already bound store is a no-op.
    pub fn bind(&mut self, element_count: usize) {
        if self.bound {
            return;
        }
        self.resize(element_count);
        self.bound = true;
    }

    /// Detaches the store from its domain. Unbinding an unbound store is a
    /// no-op.
    pub fn unbind(&mut self) {
        self.bound = false;
    }

    /// Returns true while the store is attached to its domain.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    #[track_caller]
    fn assert_bound(&self) {
        assert!(
            self.bound,
            "attribute `{}` (usage {}) used while unbound",
            self.descriptor.name, self.descriptor.usage_index
        );
    }

    // =========================================================================
    // ELEMENT ACCESS
    // =========================================================================

    /// Number of elements the store currently covers.
    pub fn len(&self) -> usize {
        self.present.len()
    }

    /// Returns true if the store covers no elements.
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Stores `value` and marks the element present. Grows the store when
    /// `key` is past its end.
    #[track_caller]
    pub fn set(&mut self, key: u32, value: T) {
        self.assert_bound();
        let key = key as usize;
        if key >= self.present.len() {
            self.resize(key + 1);
        }
        self.values[key] = value;
        self.present[key] = true;
    }

    /// Returns the value of a present element.
    ///
    /// # Panics
    ///
    /// Panics if the element is absent or out of range.
    #[track_caller]
    pub fn get(&self, key: u32) -> T {
        self.assert_bound();
        match self.try_get(key) {
            Some(value) => value,
            None => panic!(
                "attribute `{}` (usage {}) has no value for key {key}",
                self.descriptor.name, self.descriptor.usage_index
            ),
        }
    }

    /// Returns the value of an element, or `None` when it is absent or out
    /// of range.
    pub fn try_get(&self, key: u32) -> Option<T> {
        let key = key as usize;
        match self.present.get(key) {
            Some(true) => Some(self.values[key]),
            _ => None,
        }
    }

    /// Returns true if the element is in range and present.
    pub fn has(&self, key: u32) -> bool {
        self.present.get(key as usize).copied().unwrap_or(false)
    }

    /// Marks every element present with `value`.
    #[track_caller]
    pub fn fill(&mut self, value: T) {
        self.assert_bound();
        self.values.fill(value);
        self.present.fill(true);
    }

    /// Marks every element absent.
    #[track_caller]
    pub fn clear(&mut self) {
        self.assert_bound();
        self.present.fill(false);
    }

    /// Marks one element absent.
    #[track_caller]
    pub fn remove(&mut self, key: u32) {
        self.assert_bound();
        if let Some(present) = self.present.get_mut(key as usize) {
            *present = false;
        }
    }

    /// Number of present elements.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    /// Iterates `(key, value)` over present elements.
    pub fn iter_present(&self) -> impl Iterator<Item = (u32, T)> + '_ {
        self.present
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(_, (present, _))| **present)
            .map(|(key, (_, value))| (key as u32, *value))
    }

    // =========================================================================
    // BULK OPERATIONS
    // =========================================================================

    /// Resizes to `element_count` elements. New elements are absent.
    pub(crate) fn resize(&mut self, element_count: usize) {
        self.values.resize(element_count, T::default());
        self.present.resize(element_count, false);
    }

    /// Copies one element, value and presence, onto another key.
    #[track_caller]
    pub(crate) fn copy_element(&mut self, from: u32, to: u32) {
        match self.try_get(from) {
            Some(value) => self.set(to, value),
            None => self.remove(to),
        }
    }

    /// Replaces the contents with values produced per element.
    #[track_caller]
    pub(crate) fn assign_from<F>(&mut self, source: &Self, mut map: F)
    where
        F: FnMut(T) -> T,
    {
        self.assert_bound();
        self.values.clear();
        self.present.clear();
        self.present.extend_from_slice(&source.present);
        self.values.extend(
            source
                .values
                .iter()
                .zip(&source.present)
                .map(|(value, present)| if *present { map(*value) } else { *value }),
        );
    }

    /// Rewrites present values in place.
    #[track_caller]
    pub(crate) fn map_present<F>(&mut self, mut map: F)
    where
        F: FnMut(T) -> T,
    {
        self.assert_bound();
        for (value, present) in self.values.iter_mut().zip(&self.present) {
            if *present {
                *value = map(*value);
            }
        }
    }

    /// Appends `source` after padding this store to `offset` elements.
    #[track_caller]
    pub(crate) fn append(&mut self, source: &Self, offset: usize) {
        self.assert_bound();
        self.resize(offset);
        self.values.extend_from_slice(&source.values);
        self.present.extend_from_slice(&source.present);
    }

    /// Keeps only elements whose `keep` flag is set, compacting in order.
    /// Elements past the end of `keep` are dropped.
    #[track_caller]
    pub(crate) fn retain(&mut self, keep: &[bool]) {
        self.assert_bound();
        self.resize(keep.len());
        let mut write = 0;
        for (read, &kept) in keep.iter().enumerate() {
            if kept {
                self.values[write] = self.values[read];
                self.present[write] = self.present[read];
                write += 1;
            }
        }
        self.resize(write);
    }

    /// Reverses the order of the elements in `range`, growing the store to
    /// cover it.
    #[track_caller]
    pub(crate) fn reverse_range(&mut self, range: Range<usize>) {
        self.assert_bound();
        if range.end > self.len() {
            self.resize(range.end);
        }
        self.values[range.clone()].reverse();
        self.present[range].reverse();
    }
}
