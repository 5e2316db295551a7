use crate::common::*;

/// A windowed shuffle over an iterator.
///
/// The buffer is refilled from the source in its original order, and each output is drawn
/// uniformly from the buffered items. An item can therefore only move ahead by less than
/// the buffer size.
#[derive(Debug, Clone)]
pub struct ShuffleBuffer<I, R>
where
    I: Iterator,
{
    source: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: R,
}

impl<I, R> ShuffleBuffer<I, R>
where
    I: Iterator,
    R: Rng,
{
    pub fn new<T>(source: T, capacity: NonZeroUsize, rng: R) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            source: source.into_iter(),
            buffer: Vec::with_capacity(capacity.get()),
            capacity: capacity.get(),
            rng,
        }
    }
}

impl<I, R> Iterator for ShuffleBuffer<I, R>
where
    I: Iterator,
    R: Rng,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.source.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }

        if self.buffer.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.buffer.len());
        Some(self.buffer.swap_remove(index))
    }
}
