//! Greedy composition of clusters into blobs.
//!
//! Two clusters are combinable if each is cut-free towards the other. The
//! weight of the combinable pair `(x, y)` is `1 / deg(y)`, where `deg(y)` is
//! the number of clusters combinable with `y`. Candidate groups are cliques
//! of the combinable graph, scored by the summed weights from their anchor
//! (first member) to every other member. The best candidate becomes a blob,
//! every overlapping candidate is dropped, and the selection repeats.
//! Clusters left over become singleton blobs.

use depthseg_core::{BoolMatrix, SquareMatrix};
use log::{debug, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Blobs as lists of 0-based cluster indices, plus the relation matrices
/// they were derived from.
#[derive(Clone, Debug)]
pub(crate) struct Composition {
    pub blobs: Vec<Vec<usize>>,
    pub combinable: BoolMatrix,
    pub probabilities: SquareMatrix<f32>,
}

impl Composition {
    /// 1-based blob id per 0-based cluster.
    pub fn blob_ids(&self) -> Vec<u32> {
        let n = self.combinable.size();
        let mut ids = vec![0u32; n];
        for (b, members) in self.blobs.iter().enumerate() {
            for &c in members {
                ids[c] = b as u32 + 1;
            }
        }
        ids
    }
}

struct Candidate {
    members: Vec<usize>,
    score: f32,
}

pub(crate) fn combinable_matrix(cutfree: &BoolMatrix) -> BoolMatrix {
    BoolMatrix::from_fn(cutfree.size(), |a, b| {
        a != b && cutfree.get(a, b) && cutfree.get(b, a)
    })
}

/// `probabilities(b, a) = 1 / deg(a)` for every `b` combinable with `a`.
pub(crate) fn probability_matrix(combinable: &BoolMatrix) -> SquareMatrix<f32> {
    let n = combinable.size();
    let degree: Vec<usize> = (0..n).map(|a| combinable.column_degree(a)).collect();
    SquareMatrix::from_fn(n, |b, a| {
        if combinable.get(b, a) {
            1.0 / degree[a] as f32
        } else {
            0.0
        }
    })
}

/// Enumerate candidate groups breadth-first. Each group is an anchor followed
/// by strictly increasing members, so every `(anchor, member set)` appears
/// exactly once.
fn enumerate_candidates(
    combinable: &BoolMatrix,
    weights: &SquareMatrix<f32>,
    max_candidates: usize,
) -> Vec<Candidate> {
    let n = combinable.size();
    let mut candidates = Vec::new();
    for a in 0..n {
        for b in 0..n {
            let w = weights.get(a, b);
            if w > 0.0 {
                candidates.push(Candidate {
                    members: vec![a, b],
                    score: w,
                });
            }
        }
    }

    let mut next = 0;
    while next < candidates.len() {
        if candidates.len() >= max_candidates {
            warn!(
                "candidate enumeration stopped at {} groups; larger groups are not considered",
                candidates.len()
            );
            break;
        }
        let base = &candidates[next];
        let anchor = base.members[0];
        let last = base.members[base.members.len() - 1];
        let extensions: Vec<Candidate> = (last + 1..n)
            .filter(|&c| c != anchor && base.members.iter().all(|&m| combinable.get(m, c)))
            .map(|c| {
                let mut members = base.members.clone();
                members.push(c);
                Candidate {
                    score: base.score + weights.get(anchor, c),
                    members,
                }
            })
            .collect();
        candidates.extend(extensions);
        next += 1;
    }
    candidates
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(clusters = cutfree.size()))
)]
pub(crate) fn compose_blobs(cutfree: &BoolMatrix, max_candidates: usize) -> Composition {
    let n = cutfree.size();
    let combinable = combinable_matrix(cutfree);
    let probabilities = probability_matrix(&combinable);
    let candidates = enumerate_candidates(&combinable, &probabilities, max_candidates);

    let mut alive = vec![true; candidates.len()];
    let mut used = vec![false; n];
    let mut blobs = Vec::new();
    loop {
        let mut best: Option<usize> = None;
        for (i, c) in candidates.iter().enumerate() {
            if !alive[i] {
                continue;
            }
            let better = match best {
                None => true,
                Some(j) => {
                    let b = &candidates[j];
                    c.score > b.score || (c.score == b.score && c.members.len() > b.members.len())
                }
            };
            if better {
                best = Some(i);
            }
        }
        let Some(chosen) = best else { break };

        for &m in &candidates[chosen].members {
            used[m] = true;
        }
        blobs.push(candidates[chosen].members.clone());
        for (flag, c) in alive.iter_mut().zip(&candidates) {
            if *flag && c.members.iter().any(|&m| used[m]) {
                *flag = false;
            }
        }
    }

    let grouped = blobs.len();
    blobs.extend((0..n).filter(|&c| !used[c]).map(|c| vec![c]));
    debug!(
        "composed {} clusters into {} blobs ({} multi-cluster, {} candidates)",
        n,
        blobs.len(),
        grouped,
        candidates.len()
    );

    Composition {
        blobs,
        combinable,
        probabilities,
    }
}
