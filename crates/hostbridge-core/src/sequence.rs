//! Bounds-checked homogeneous containers.
//!
//! A [`Sequence`] stands in for native slices on the host side. Every index
//! access is checked against `[0, size)`; a failed access returns
//! [`CoreError::IndexOutOfBounds`] and leaves the container untouched.
//!
//! Elements are copied in on [`Sequence::set`] and copied out on
//! [`Sequence::get`], so byte-slice elements never alias caller memory.

use std::borrow::Borrow;

use crate::bigint::BigInt;
use crate::enode::Enode;
use crate::error::{CoreError, Result};
use crate::identifiers::{Address, Hash};
use crate::records::{Header, Log, Transaction};
use crate::whisper::Message;

/// Element kinds whose sequences may grow with [`Sequence::append`].
pub trait Growable {}

impl Growable for Hash {}
impl Growable for Address {}
impl Growable for Enode {}

/// An ordered container with checked index access.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence<T> {
    items: Vec<T>,
}

pub type Hashes = Sequence<Hash>;
pub type Addresses = Sequence<Address>;
pub type Strings = Sequence<String>;
pub type Bools = Sequence<bool>;
pub type Binaries = Sequence<Vec<u8>>;
pub type BigInts = Sequence<BigInt>;
pub type Headers = Sequence<Header>;
pub type Transactions = Sequence<Transaction>;
pub type Logs = Sequence<Log>;
pub type Enodes = Sequence<Enode>;
pub type Messages = Sequence<Message>;

impl<T: Clone + Default> Sequence<T> {
    /// Allocate `size` zero-valued slots.
    pub fn new(size: usize) -> Self {
        Self {
            items: vec![T::default(); size],
        }
    }

    /// An empty sequence.
    pub fn new_empty() -> Self {
        Self::new(0)
    }
}

impl<T: Clone> Sequence<T> {
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: isize) -> Result<T> {
        let i = check_index(index, self.items.len())?;
        Ok(self.items[i].clone())
    }

    /// Overwrite the element at `index` with a copy of `value`.
    pub fn set<V>(&mut self, index: isize, value: &V) -> Result<()>
    where
        V: ToOwned<Owned = T> + ?Sized,
    {
        let i = check_index(index, self.items.len())?;
        self.items[i] = value.to_owned();
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any element equals `needle`.
    pub fn contains<Q>(&self, needle: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.items.iter().any(|item| item.borrow() == needle)
    }
}

impl<T: Growable + Clone> Sequence<T> {
    /// Append a copy of `value`, growing the size by one.
    pub fn append(&mut self, value: &T) {
        self.items.push(value.clone());
    }
}

impl<T> From<Vec<T>> for Sequence<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Map a host index onto `[0, size)`.
pub(crate) fn check_index(index: isize, size: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < size)
        .ok_or(CoreError::IndexOutOfBounds { index, size })
}
