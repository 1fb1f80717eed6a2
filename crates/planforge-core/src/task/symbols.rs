//! Interning of ground symbols to dense ids

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

/// A newtype id backed by a vector index.
pub trait DenseId: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Bidirectional map between values and dense ids, in insertion order.
#[derive(Debug, Clone)]
pub struct SymbolTable<K, I> {
    values: Vec<K>,
    index: HashMap<K, I>,
    _id: PhantomData<I>,
}

impl<K, I> Default for SymbolTable<K, I> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            index: HashMap::new(),
            _id: PhantomData,
        }
    }
}

impl<K: Clone + Eq + Hash, I: DenseId> SymbolTable<K, I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `value`, assigning the next id if it is new.
    pub fn intern(&mut self, value: K) -> I {
        if let Some(&id) = self.index.get(&value) {
            return id;
        }
        let id = I::from_index(self.values.len());
        self.index.insert(value.clone(), id);
        self.values.push(value);
        id
    }

    pub fn lookup(&self, value: &K) -> Option<I> {
        self.index.get(value).copied()
    }

    pub fn get(&self, id: I) -> &K {
        &self.values[id.index()]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &K)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (I::from_index(i), v))
    }
}
