use crate::base::ExpressionMatrix;
use crate::errors::ModelError;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A weighted regulatory edge: `regulator` drives `target` with `weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryEdge {
    /// Index of the transcription-factor gene
    pub regulator: usize,
    /// Index of the regulated gene
    pub target: usize,
    /// Interaction strength (negative values repress)
    pub weight: f64,
}

impl RegulatoryEdge {
    pub fn new(regulator: usize, target: usize, weight: f64) -> Self {
        Self {
            regulator,
            target,
            weight,
        }
    }
}

/// Sparse, immutable transcription-factor network over `n_genes` genes.
///
/// Edges are stored as an arena of `(regulator, weight)` pairs grouped by
/// target gene, with an offset table marking where each target's incoming
/// edges start. Only present edges are stored.
///
/// # Example
/// For 3 genes with edges `0→2 (0.5)`, `1→2 (1.0)`, `2→0 (2.0)`:
/// - `regulators`  = `[2, 0, 1]`
/// - `weights`     = `[2.0, 0.5, 1.0]`
/// - `target_offsets` = `[0, 1, 1, 3]`
///
/// Gene 1 has the empty range `1..1`, so its TF input is always 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatoryNetwork {
    n_genes: usize,
    /// Regulator index of every stored edge, grouped by target and sorted by
    /// regulator within each group
    regulators: Vec<usize>,
    /// Weight of every stored edge, parallel to `regulators`
    weights: Vec<f64>,
    /// `target_offsets[j]..target_offsets[j + 1]` spans the incoming edges of
    /// gene `j`. Length is `n_genes + 1`.
    target_offsets: Vec<usize>,
}

impl RegulatoryNetwork {
    /// Build a network from a list of edges.
    ///
    /// Repeated `(regulator, target)` pairs are merged by summing their
    /// weights in input order.
    ///
    /// # Errors
    /// - `ModelError::Configuration` if an edge references a gene index
    ///   `>= n_genes` or carries a non-finite weight.
    pub fn new(n_genes: usize, edges: &[RegulatoryEdge]) -> Result<Self, ModelError> {
        for edge in edges {
            if edge.regulator >= n_genes || edge.target >= n_genes {
                return Err(ModelError::Configuration(format!(
                    "edge {}→{} references a gene outside 0..{n_genes}",
                    edge.regulator, edge.target
                )));
            }
            if !edge.weight.is_finite() {
                return Err(ModelError::Configuration(format!(
                    "edge {}→{} has non-finite weight {}",
                    edge.regulator, edge.target, edge.weight
                )));
            }
        }

        // Stable sort keeps input order among duplicates so merging is deterministic
        let mut sorted = edges.to_vec();
        sorted.sort_by_key(|e| (e.target, e.regulator));

        let mut regulators = Vec::with_capacity(sorted.len());
        let mut weights: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut targets = Vec::with_capacity(sorted.len());
        for edge in sorted {
            let duplicate = targets.last() == Some(&edge.target)
                && regulators.last() == Some(&edge.regulator);
            if duplicate {
                if let Some(w) = weights.last_mut() {
                    *w += edge.weight;
                }
            } else {
                regulators.push(edge.regulator);
                weights.push(edge.weight);
                targets.push(edge.target);
            }
        }

        let mut target_offsets = vec![0; n_genes + 1];
        for &t in &targets {
            target_offsets[t + 1] += 1;
        }
        for j in 0..n_genes {
            target_offsets[j + 1] += target_offsets[j];
        }

        Ok(Self {
            n_genes,
            regulators,
            weights,
            target_offsets,
        })
    }

    /// A network with no edges: every gene receives TF input 0.
    pub fn empty(n_genes: usize) -> Self {
        Self {
            n_genes,
            regulators: Vec::new(),
            weights: Vec::new(),
            target_offsets: vec![0; n_genes + 1],
        }
    }

    /// Number of genes the network spans.
    #[inline]
    pub fn n_genes(&self) -> usize {
        self.n_genes
    }

    /// Number of stored (non-zero) edges.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.regulators.len()
    }

    #[inline]
    fn incoming(&self, target: usize) -> Range<usize> {
        self.target_offsets[target]..self.target_offsets[target + 1]
    }

    /// Number of regulators acting on `target`.
    pub fn in_degree(&self, target: usize) -> usize {
        if target >= self.n_genes {
            return 0;
        }
        self.incoming(target).len()
    }

    /// True if at least one edge points at `target`.
    pub fn is_regulated(&self, target: usize) -> bool {
        self.in_degree(target) > 0
    }

    /// `(regulator, weight)` pairs acting on `target`, sorted by regulator.
    pub fn regulators_of(&self, target: usize) -> Vec<(usize, f64)> {
        if target >= self.n_genes {
            return Vec::new();
        }
        self.incoming(target)
            .map(|e| (self.regulators[e], self.weights[e]))
            .collect()
    }

    /// `(target, weight)` pairs regulated by `regulator`, sorted by target.
    pub fn targets_of(&self, regulator: usize) -> Vec<(usize, f64)> {
        let mut out = Vec::new();
        for target in 0..self.n_genes {
            for e in self.incoming(target) {
                if self.regulators[e] == regulator {
                    out.push((target, self.weights[e]));
                }
            }
        }
        out
    }

    /// All stored edges, ordered by target then regulator.
    pub fn edges(&self) -> Vec<RegulatoryEdge> {
        let mut out = Vec::with_capacity(self.nnz());
        for target in 0..self.n_genes {
            for e in self.incoming(target) {
                out.push(RegulatoryEdge::new(self.regulators[e], target, self.weights[e]));
            }
        }
        out
    }

    /// TF input of a single gene for one individual's expression row.
    ///
    /// This is the scalar form of [`compute_tf_input`](Self::compute_tf_input);
    /// both accumulate incoming edges in the same order.
    pub fn tf_input_for(&self, row: &[f64], target: usize) -> Result<f64, ModelError> {
        if row.len() != self.n_genes {
            return Err(ModelError::shape("regulatory network input row", self.n_genes, row.len()));
        }
        if target >= self.n_genes {
            return Err(ModelError::Configuration(format!(
                "target gene {target} outside 0..{}",
                self.n_genes
            )));
        }
        let mut acc = 0.0;
        for e in self.incoming(target) {
            acc += self.weights[e] * row[self.regulators[e]];
        }
        Ok(acc)
    }

    /// Compute TF input for the whole population.
    ///
    /// Returns an N×G matrix whose column `j` is the weighted sum of regulator
    /// expression for target `j`. Equivalent to `expression @ W` for the
    /// dense weight matrix `W`, computed in O(N·nnz) by walking each target's
    /// incoming edges over contiguous columns.
    ///
    /// # Errors
    /// `ModelError::ShapeMismatch` if `expression` does not have `n_genes`
    /// columns.
    pub fn compute_tf_input(
        &self,
        expression: &ExpressionMatrix,
    ) -> Result<ExpressionMatrix, ModelError> {
        expression.check_genes(self.n_genes, "regulatory network input")?;

        let mut out = ExpressionMatrix::zeros(expression.n_individuals(), self.n_genes);
        for target in 0..self.n_genes {
            let dest = out.column_slice_mut(target);
            for e in self.incoming(target) {
                let weight = self.weights[e];
                let source = expression.column_slice(self.regulators[e]);
                for (acc, &x) in dest.iter_mut().zip(source) {
                    *acc += weight * x;
                }
            }
        }
        Ok(out)
    }

    /// Materialise the dense G×G weight matrix (`W[regulator, target]`).
    ///
    /// Intended for inspection and tests on small networks.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n_genes, self.n_genes);
        for target in 0..self.n_genes {
            for e in self.incoming(target) {
                dense[(self.regulators[e], target)] += self.weights[e];
            }
        }
        dense
    }
}
