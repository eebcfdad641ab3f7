//! Minimum-cost alignment of unordered lists.
//!
//! Solves the rectangular assignment problem over a cost matrix with the
//! Kuhn-Munkres algorithm (potential-based O(n^3) variant), padding to a
//! square with unit dummy cost. A post-pass swaps equal-cost crossing pairs
//! back into index order, so the reported optimum is the order-preserving
//! one and false-positive/negative counts are reproducible across runs.

/// Cost of pairing a real row/column with a padding slot. Any constant works
/// (it shifts every complete matching by the same amount); 1.0 is the worst
/// real cost.
const DUMMY_COST: f64 = 1.0;

const COST_TIE_EPSILON: f64 = 1e-12;

/// Row-major rectangular cost matrix; rows are predicted items, columns are
/// expected items, cells hold 1 - similarity.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "cost matrix shape mismatch");
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Padded view used by the solver: out-of-range cells cost [`DUMMY_COST`].
    fn padded(&self, row: usize, col: usize) -> f64 {
        if row < self.rows && col < self.cols {
            self.get(row, col)
        } else {
            DUMMY_COST
        }
    }
}

/// A partial bijection between predicted and expected indices: injective in
/// both directions, cost-minimal for its size.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Matched (predicted, expected) index pairs, sorted by predicted index.
    pub pairs: Vec<(usize, usize)>,
    /// Predicted indices with no counterpart (false positives).
    pub unmatched_predicted: Vec<usize>,
    /// Expected indices with no counterpart (false negatives).
    pub unmatched_expected: Vec<usize>,
    /// Total cost over matched pairs.
    pub total_cost: f64,
}

/// Solve the assignment problem for the given matrix.
///
/// Degenerate matrices (no rows or no columns) skip the solver: everything
/// on the non-empty side is unmatched.
pub fn solve(matrix: &CostMatrix) -> Assignment {
    let rows = matrix.rows();
    let cols = matrix.cols();

    if rows == 0 || cols == 0 {
        return Assignment {
            pairs: Vec::new(),
            unmatched_predicted: (0..rows).collect(),
            unmatched_expected: (0..cols).collect(),
            total_cost: 0.0,
        };
    }

    let mut pairs = kuhn_munkres(matrix);
    reorder_equal_cost_pairs(matrix, &mut pairs);

    let total_cost = pairs
        .iter()
        .map(|&(row, col)| matrix.get(row, col))
        .sum::<f64>();

    let matched_rows: Vec<bool> = {
        let mut seen = vec![false; rows];
        for &(row, _) in &pairs {
            seen[row] = true;
        }
        seen
    };
    let matched_cols: Vec<bool> = {
        let mut seen = vec![false; cols];
        for &(_, col) in &pairs {
            seen[col] = true;
        }
        seen
    };

    Assignment {
        pairs,
        unmatched_predicted: (0..rows).filter(|&row| !matched_rows[row]).collect(),
        unmatched_expected: (0..cols).filter(|&col| !matched_cols[col]).collect(),
        total_cost,
    }
}

/// Classic potential-based Kuhn-Munkres over the square padding of the
/// matrix. Indices inside are 1-based, matching the standard formulation;
/// column 0 is the virtual start column.
fn kuhn_munkres(matrix: &CostMatrix) -> Vec<(usize, usize)> {
    let side = matrix.rows().max(matrix.cols());

    let mut row_potential = vec![0.0_f64; side + 1];
    let mut col_potential = vec![0.0_f64; side + 1];
    // match_of_col[j] = row currently assigned to column j (0 = none).
    let mut match_of_col = vec![0_usize; side + 1];
    let mut predecessor = vec![0_usize; side + 1];

    for row in 1..=side {
        match_of_col[0] = row;
        let mut current_col = 0_usize;
        let mut min_slack = vec![f64::INFINITY; side + 1];
        let mut visited = vec![false; side + 1];

        loop {
            visited[current_col] = true;
            let current_row = match_of_col[current_col];
            let mut delta = f64::INFINITY;
            let mut next_col = 0_usize;

            for col in 1..=side {
                if visited[col] {
                    continue;
                }
                let reduced = matrix.padded(current_row - 1, col - 1)
                    - row_potential[current_row]
                    - col_potential[col];
                if reduced < min_slack[col] {
                    min_slack[col] = reduced;
                    predecessor[col] = current_col;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    next_col = col;
                }
            }

            for col in 0..=side {
                if visited[col] {
                    row_potential[match_of_col[col]] += delta;
                    col_potential[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            current_col = next_col;
            if match_of_col[current_col] == 0 {
                break;
            }
        }

        // Augment along the found path.
        while current_col != 0 {
            let previous = predecessor[current_col];
            match_of_col[current_col] = match_of_col[previous];
            current_col = previous;
        }
    }

    let mut pairs = Vec::new();
    for col in 1..=side {
        let row = match_of_col[col];
        if row >= 1 && row <= matrix.rows() && col <= matrix.cols() {
            pairs.push((row - 1, col - 1));
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Deterministic tie-break: among equal-cost optima, prefer the assignment
/// that preserves original list order. Any crossing pair whose swap leaves
/// the total cost unchanged is swapped; strictly cheaper crossings cannot
/// exist in an optimal assignment.
fn reorder_equal_cost_pairs(matrix: &CostMatrix, pairs: &mut [(usize, usize)]) {
    loop {
        let mut swapped = false;
        for first in 0..pairs.len() {
            for second in (first + 1)..pairs.len() {
                let (row_a, col_a) = pairs[first];
                let (row_b, col_b) = pairs[second];
                if col_a <= col_b {
                    continue;
                }
                let current = matrix.get(row_a, col_a) + matrix.get(row_b, col_b);
                let crossed = matrix.get(row_a, col_b) + matrix.get(row_b, col_a);
                if (crossed - current).abs() <= COST_TIE_EPSILON {
                    pairs[first] = (row_a, col_b);
                    pairs[second] = (row_b, col_a);
                    swapped = true;
                }
            }
        }
        if !swapped {
            break;
        }
    }
}
