use rayon::prelude::*;

use crate::search::{Budget, Candidate, CoverMask, SearchError};

const SPLIT_DEPTH: usize = 6;

const CLOCK_CHECK_INTERVAL: u32 = 64;

/// Include/exclude depth-first search over suppliers in index order. A
/// branch is dropped once the chosen members plus every supplier still
/// undecided cannot cover the requirement, so every branch that survives
/// ends in at least one covering combination.
pub(crate) fn enumerate(
    masks: &[CoverMask],
    full: CoverMask,
    parallel: bool,
    budget: &Budget,
) -> Result<Vec<Candidate>, SearchError> {
    budget.check()?;
    let reach = suffix_unions(masks);
    if reach.first().copied().unwrap_or(0) & full != full {
        return Ok(Vec::new());
    }

    let walker = Walker {
        masks,
        reach: &reach,
        full,
        budget,
    };

    if !parallel || masks.len() <= 1 {
        let mut state = WalkState::default();
        walker.walk(0, 0, &mut Vec::new(), &mut state)?;
        return Ok(state.found);
    }

    let depth = SPLIT_DEPTH.min(masks.len());
    let prefixes = walker.prefixes(depth);
    let batches = prefixes
        .into_par_iter()
        .map(|(mut members, covered)| {
            let mut state = WalkState::default();
            walker.walk(depth, covered, &mut members, &mut state)?;
            Ok(state.found)
        })
        .collect::<Result<Vec<_>, SearchError>>()?;
    Ok(batches.into_iter().flatten().collect())
}

fn suffix_unions(masks: &[CoverMask]) -> Vec<CoverMask> {
    let mut reach = vec![0; masks.len() + 1];
    for i in (0..masks.len()).rev() {
        reach[i] = reach[i + 1] | masks[i];
    }
    reach
}

#[derive(Default)]
struct WalkState {
    found: Vec<Candidate>,
    ticks: u32,
}

struct Walker<'a> {
    masks: &'a [CoverMask],
    reach: &'a [CoverMask],
    full: CoverMask,
    budget: &'a Budget,
}

impl Walker<'_> {
    fn walk(
        &self,
        depth: usize,
        covered: CoverMask,
        members: &mut Vec<usize>,
        state: &mut WalkState,
    ) -> Result<(), SearchError> {
        state.ticks = state.ticks.wrapping_add(1);
        if state.ticks % CLOCK_CHECK_INTERVAL == 0 {
            self.budget.check()?;
        } else {
            self.budget.stopped()?;
        }

        if (covered | self.reach[depth]) & self.full != self.full {
            return Ok(());
        }
        if depth == self.masks.len() {
            if !members.is_empty() {
                self.budget.record()?;
                state.found.push(Candidate::new(members.clone()));
            }
            return Ok(());
        }

        members.push(depth);
        let included = self.walk(depth + 1, covered | self.masks[depth], members, state);
        members.pop();
        included?;

        self.walk(depth + 1, covered, members, state)
    }

    fn prefixes(&self, depth: usize) -> Vec<(Vec<usize>, CoverMask)> {
        let mut out = vec![(Vec::new(), 0)];
        for idx in 0..depth {
            let mut next = Vec::with_capacity(out.len() * 2);
            for (members, covered) in out {
                let with = covered | self.masks[idx];
                if (with | self.reach[idx + 1]) & self.full == self.full {
                    let mut included = members.clone();
                    included.push(idx);
                    next.push((included, with));
                }
                if (covered | self.reach[idx + 1]) & self.full == self.full {
                    next.push((members, covered));
                }
            }
            out = next;
        }
        out
    }
}
