use crate::errors::ModelError;
use nalgebra::DMatrix;

/// An N×G matrix of expression levels: one row per individual, one column per
/// gene.
///
/// The backing `DMatrix` is column-major, but every iteration helper on this
/// type walks the cells in row-major order (individual-major, gene-minor).
/// That is the order in which random draws are consumed, so anything that
/// pairs cells with draws must go through these helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionMatrix {
    data: DMatrix<f64>,
}

impl ExpressionMatrix {
    /// Create an N×G matrix filled with zeros.
    pub fn zeros(n_individuals: usize, n_genes: usize) -> Self {
        Self {
            data: DMatrix::zeros(n_individuals, n_genes),
        }
    }

    /// Create an N×G matrix with every cell set to `value`.
    pub fn from_element(n_individuals: usize, n_genes: usize, value: f64) -> Self {
        Self {
            data: DMatrix::from_element(n_individuals, n_genes, value),
        }
    }

    /// Build a matrix from row-major data.
    ///
    /// # Errors
    /// Returns `ModelError::ShapeMismatch` if `values.len() != n_individuals * n_genes`.
    pub fn from_row_major(
        n_individuals: usize,
        n_genes: usize,
        values: &[f64],
    ) -> Result<Self, ModelError> {
        let expected = n_individuals * n_genes;
        if values.len() != expected {
            return Err(ModelError::shape("row-major expression data", expected, values.len()));
        }
        Ok(Self {
            data: DMatrix::from_row_slice(n_individuals, n_genes, values),
        })
    }

    /// Build a matrix from one vector per individual.
    ///
    /// All rows must have the same length. An empty slice gives a 0×0 matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let n_genes = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * n_genes);
        for row in rows {
            if row.len() != n_genes {
                return Err(ModelError::shape("expression row length", n_genes, row.len()));
            }
            values.extend_from_slice(row);
        }
        Self::from_row_major(rows.len(), n_genes, &values)
    }

    /// Number of individuals (rows).
    #[inline]
    pub fn n_individuals(&self) -> usize {
        self.data.nrows()
    }

    /// Number of genes (columns).
    #[inline]
    pub fn n_genes(&self) -> usize {
        self.data.ncols()
    }

    /// `(n_individuals, n_genes)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Expression of gene `gene` in individual `individual`, if in range.
    #[inline]
    pub fn get(&self, individual: usize, gene: usize) -> Option<f64> {
        self.data.get((individual, gene)).copied()
    }

    /// Set a single cell.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    #[inline]
    pub fn set(&mut self, individual: usize, gene: usize, value: f64) {
        self.data[(individual, gene)] = value;
    }

    /// Copy one individual's expression levels out as a contiguous vector.
    pub fn row(&self, individual: usize) -> Vec<f64> {
        self.data.row(individual).iter().copied().collect()
    }

    /// Iterate over every individual's row as an owned vector.
    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.n_individuals()).map(move |i| self.row(i))
    }

    /// Copy one gene's expression across all individuals.
    pub fn column(&self, gene: usize) -> Vec<f64> {
        self.data.column(gene).iter().copied().collect()
    }

    /// Flatten to a row-major vector.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        for i in 0..self.n_individuals() {
            out.extend(self.data.row(i).iter().copied());
        }
        out
    }

    /// Apply `f(individual, gene, value)` to every cell in row-major order.
    pub fn for_each_row_major_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut f64),
    {
        let (n, g) = self.shape();
        for i in 0..n {
            for j in 0..g {
                f(i, j, &mut self.data[(i, j)]);
            }
        }
    }

    /// Produce a new matrix of the same shape by mapping every cell with its
    /// gene index.
    pub fn map_with_gene<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, f64) -> f64,
    {
        let mut out = self.clone();
        out.for_each_row_major_mut(|_, j, v| *v = f(j, *v));
        out
    }

    /// Verify that this matrix has exactly `expected` gene columns.
    pub fn check_genes(&self, expected: usize, context: &'static str) -> Result<(), ModelError> {
        if self.n_genes() != expected {
            return Err(ModelError::shape(context, expected, self.n_genes()));
        }
        Ok(())
    }

    /// Verify that this matrix has the given `(n_individuals, n_genes)` shape.
    pub fn check_shape(
        &self,
        n_individuals: usize,
        n_genes: usize,
        context: &'static str,
    ) -> Result<(), ModelError> {
        if self.n_individuals() != n_individuals {
            return Err(ModelError::shape(context, n_individuals, self.n_individuals()));
        }
        self.check_genes(n_genes, context)
    }

    /// Smallest cell value, or `None` for an empty matrix.
    pub fn min_value(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    /// Contiguous slice over one gene's column (column-major storage).
    #[inline]
    pub(crate) fn column_slice(&self, gene: usize) -> &[f64] {
        let n = self.n_individuals();
        &self.data.as_slice()[gene * n..(gene + 1) * n]
    }

    /// Mutable contiguous slice over one gene's column.
    #[inline]
    pub(crate) fn column_slice_mut(&mut self, gene: usize) -> &mut [f64] {
        let n = self.n_individuals();
        &mut self.data.as_mut_slice()[gene * n..(gene + 1) * n]
    }

    /// Borrow the underlying `nalgebra` matrix.
    #[inline]
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Consume the wrapper, returning the underlying matrix.
    pub fn into_inner(self) -> DMatrix<f64> {
        self.data
    }
}

impl From<DMatrix<f64>> for ExpressionMatrix {
    fn from(data: DMatrix<f64>) -> Self {
        Self { data }
    }
}
