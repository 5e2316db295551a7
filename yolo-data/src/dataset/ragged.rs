use crate::common::*;
use std::{iter::FromIterator, ops::Index};

/// A jagged array stored as a flat value buffer plus row offsets.
///
/// Row `i` spans `values[offsets[i]..offsets[i + 1]]`, so `offsets` always holds one more
/// element than the number of rows and starts with zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ragged<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> Ragged<T> {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            values: vec![],
        }
    }

    pub fn with_capacity(num_rows: usize, num_values: usize) -> Self {
        let mut offsets = Vec::with_capacity(num_rows + 1);
        offsets.push(0);
        Self {
            offsets,
            values: Vec::with_capacity(num_values),
        }
    }

    /// Append a row.
    pub fn push<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.values.extend(row);
        self.offsets.push(self.values.len());
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The total number of values over all rows.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&[T]> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(&self.values[start..end])
    }

    pub fn row_len(&self, index: usize) -> Option<usize> {
        self.get(index).map(<[T]>::len)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.offsets
            .windows(2)
            .map(move |range| &self.values[range[0]..range[1]])
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<T>) {
        (self.offsets, self.values)
    }

    /// Copy a contiguous range of rows into a new array.
    ///
    /// It returns `None` if the range exceeds the number of rows.
    pub fn slice(&self, range: Range<usize>) -> Option<Self>
    where
        T: Clone,
    {
        if range.start > range.end || range.end > self.len() {
            return None;
        }

        let base = self.offsets[range.start];
        let offsets = self.offsets[range.start..=range.end]
            .iter()
            .map(|offset| offset - base)
            .collect();
        let values = self.values[base..self.offsets[range.end]].to_vec();
        Some(Self { offsets, values })
    }

    /// Copy the listed rows, in order, into a new array.
    ///
    /// It returns `None` if any index is out of range.
    pub fn gather(&self, indexes: &[usize]) -> Option<Self>
    where
        T: Clone,
    {
        let mut output = Self::with_capacity(indexes.len(), 0);
        for &index in indexes {
            output.push(self.get(index)?.iter().cloned());
        }
        Some(output)
    }
}

impl<T> Default for Ragged<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Ragged<T> {
    type Output = [T];

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(row) => row,
            None => panic!(
                "row index {} is out of range for {} rows",
                index,
                self.len()
            ),
        }
    }
}

impl<T, R> FromIterator<R> for Ragged<T>
where
    R: IntoIterator<Item = T>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        let mut ragged = Self::new();
        iter.into_iter().for_each(|row| ragged.push(row));
        ragged
    }
}
