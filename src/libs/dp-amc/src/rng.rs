//! Random index source for grant tie-breaking

/// Supplies the index used to pick among equally preferred grant candidates
pub trait RandomIndex {
    fn next_index(&mut self) -> usize;
}

/// Thread-local generator from the `rand` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomIndex for ThreadRandom {
    fn next_index(&mut self) -> usize {
        rand::random::<u32>() as usize
    }
}

/// Always returns the same index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedIndex(pub usize);

impl RandomIndex for FixedIndex {
    fn next_index(&mut self) -> usize {
        self.0
    }
}
