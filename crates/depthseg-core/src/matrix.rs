use serde::{Deserialize, Serialize};

/// Dense row-major `n x n` matrix indexed by cluster id (0-based).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareMatrix<T> {
    size: usize,
    data: Vec<T>,
}

/// Relation between clusters: adjacency, cut-free, combinable.
pub type BoolMatrix = SquareMatrix<bool>;

impl<T: Copy + Default> SquareMatrix<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![T::default(); size * size],
        }
    }

    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                data.push(f(row, col));
            }
        }
        Self { size, data }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.size + col] = value;
    }

    /// Set both `(a, b)` and `(b, a)`.
    #[inline]
    pub fn set_symmetric(&mut self, a: usize, b: usize, value: T) {
        self.set(a, b, value);
        self.set(b, a, value);
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.size..(row + 1) * self.size]
    }
}

impl<T: Copy + Default + PartialEq> SquareMatrix<T> {
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|a| (a + 1..self.size).all(|b| self.get(a, b) == self.get(b, a)))
    }
}

impl SquareMatrix<bool> {
    /// Number of `true` entries, diagonal included.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Number of `true` off-diagonal entries in `col`.
    pub fn column_degree(&self, col: usize) -> usize {
        (0..self.size)
            .filter(|&row| row != col && self.get(row, col))
            .count()
    }

    pub fn set_diagonal(&mut self, value: bool) {
        for i in 0..self.size {
            self.set(i, i, value);
        }
    }
}
