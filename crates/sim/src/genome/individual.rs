use serde::{Deserialize, Serialize};

/// A single gene, described by its current expression level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gene {
    /// Expression level. Non-negative after every mutation pass.
    pub expression_level: f64,
}

impl Gene {
    /// Create a gene with the given expression level.
    #[inline]
    pub fn new(expression_level: f64) -> Self {
        Self { expression_level }
    }
}

/// An individual carrying a fixed-length sequence of genes.
///
/// `Individual` is a row of the population's expression matrix materialised
/// as owned data, together with the fitness assigned during the most recent
/// selection phase. `fitness` is `None` until the first generation has been
/// scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Genes in gene-index order
    genes: Vec<Gene>,
    /// Fitness from the latest selection phase
    fitness: Option<f64>,
}

impl Individual {
    /// Create an individual from its genes. Fitness starts unset.
    pub fn new(genes: Vec<Gene>) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    /// Create an individual directly from expression levels.
    pub fn from_levels(levels: &[f64]) -> Self {
        Self::new(levels.iter().copied().map(Gene::new).collect())
    }

    /// Borrow the genes.
    #[inline]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True if this individual carries no genes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Expression levels in gene-index order.
    pub fn expression_levels(&self) -> Vec<f64> {
        self.genes.iter().map(|g| g.expression_level).collect()
    }

    /// Fitness from the latest selection phase, if any.
    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Attach a fitness value.
    #[inline]
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Mean expression across this individual's genes (0.0 with no genes).
    pub fn mean_expression(&self) -> f64 {
        if self.genes.is_empty() {
            return 0.0;
        }
        self.genes.iter().map(|g| g.expression_level).sum::<f64>() / self.genes.len() as f64
    }
}
