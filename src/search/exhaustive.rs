use crate::search::{Budget, Candidate, CoverMask, SearchError};

/// `O(2^n)` regardless of the answer, hence the supplier cap.
pub(crate) fn enumerate(
    masks: &[CoverMask],
    full: CoverMask,
    max_suppliers: usize,
    budget: &Budget,
) -> Result<Vec<Candidate>, SearchError> {
    let n = masks.len();
    if n > max_suppliers {
        return Err(SearchError::CatalogTooLarge {
            suppliers: n,
            limit: max_suppliers,
        });
    }

    let mut out = Vec::new();
    for size in 1..=n {
        let mut combination = Combinations::new(n, size);
        while let Some(members) = combination.next_members() {
            budget.check()?;
            let union = members
                .iter()
                .fold(CoverMask::default(), |acc, idx| acc | masks[*idx]);
            if union & full == full {
                budget.record()?;
                out.push(Candidate::new(members.to_vec()));
            }
        }
    }
    Ok(out)
}

struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
        }
    }

    fn next_members(&mut self) -> Option<&[usize]> {
        let k = self.indices.len();
        if k == 0 || k > self.n {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }
        // rightmost index that can still move right
        let pivot = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i)?;
        self.indices[pivot] += 1;
        for i in pivot + 1..k {
            self.indices[i] = self.indices[i - 1] + 1;
        }
        Some(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchBudget;

    fn all(n: usize, k: usize) -> Vec<Vec<usize>> {
        let mut combination = Combinations::new(n, k);
        let mut out = Vec::new();
        while let Some(members) = combination.next_members() {
            out.push(members.to_vec());
        }
        out
    }

    #[test]
    fn combinations_are_lexicographic() {
        assert_eq!(
            all(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(all(3, 3), vec![vec![0, 1, 2]]);
        assert!(all(2, 3).is_empty());
    }

    #[test]
    fn refuses_oversized_catalogs() {
        let budget = Budget::start(SearchBudget::default());
        let masks = vec![1; 5];
        let err = enumerate(&masks, 1, 4, &budget).expect_err("too large");
        assert_eq!(
            err,
            SearchError::CatalogTooLarge {
                suppliers: 5,
                limit: 4
            }
        );
    }

    #[test]
    fn empty_requirement_is_covered_by_every_subset() {
        let budget = Budget::start(SearchBudget::default());
        let found = enumerate(&[0b1, 0b0, 0b1], 0, 24, &budget).expect("search");
        assert_eq!(found.len(), 7);
    }
}
