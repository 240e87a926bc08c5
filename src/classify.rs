//! Classifier (C4): groups an externally-sorted stream of super-k-mer
//! records by minimizer value and splits them into unique vs. colliding.

use crate::scanner::SuperKmerRecord;

/// A minimizer that occurred exactly once, with its super-k-mer shape.
/// `size == 0` is the sentinel used for a minimizer that turned out to be
/// colliding (see [`classify`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniqueMinimizerRecord {
    pub minimizer: u64,
    pub p1: u32,
    pub size: u32,
}

/// Single pass over `records` (which MUST already be sorted by `minimizer`
/// ascending). For every minimizer value seen exactly once, calls
/// `emit_unique` with its real `(p1, size)`; for every minimizer seen two or
/// more times, calls `emit_unique` once with the `size = 0` sentinel and
/// `emit_colliding_id` once per occurrence's `id`.
pub fn classify(
    mut records: impl Iterator<Item = SuperKmerRecord>,
    mut emit_unique: impl FnMut(UniqueMinimizerRecord),
    mut emit_colliding_id: impl FnMut(u64),
) {
    let span = tracing::debug_span!("classify");
    let _enter = span.enter();

    let mut prev: Option<SuperKmerRecord> = None;

    while let Some(start) = records.next() {
        match prev {
            Some(p) if p.size != 0 => {
                if p.minimizer == start.minimizer {
                    emit_unique(UniqueMinimizerRecord {
                        minimizer: p.minimizer,
                        p1: 0,
                        size: 0,
                    });
                    emit_colliding_id(p.id);
                    emit_colliding_id(start.id);
                    let colliding_minimizer = p.minimizer;
                    prev = None;
                    loop {
                        match records.next() {
                            Some(r) if r.minimizer == colliding_minimizer => {
                                emit_colliding_id(r.id);
                            }
                            Some(r) => {
                                prev = Some(r);
                                break;
                            }
                            None => break,
                        }
                    }
                } else {
                    emit_unique(UniqueMinimizerRecord {
                        minimizer: p.minimizer,
                        p1: p.p1,
                        size: p.size,
                    });
                    prev = Some(start);
                }
            }
            _ => prev = Some(start),
        }
    }

    if let Some(p) = prev {
        if p.size != 0 {
            emit_unique(UniqueMinimizerRecord {
                minimizer: p.minimizer,
                p1: p.p1,
                size: p.size,
            });
        }
    }

    tracing::info!("classify done");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(minimizer: u64, id: u64, p1: u32, size: u32) -> SuperKmerRecord {
        SuperKmerRecord {
            minimizer,
            id,
            p1,
            size,
        }
    }

    #[test]
    fn all_unique_minimizers_pass_through() {
        let records = vec![rec(1, 0, 0, 1), rec(2, 1, 1, 2), rec(3, 2, 0, 1)];
        let mut unique = Vec::new();
        let mut colliding = Vec::new();
        classify(
            records.into_iter(),
            |u| unique.push(u),
            |id| colliding.push(id),
        );
        assert_eq!(unique.len(), 3);
        assert!(colliding.is_empty());
        assert_eq!(unique[1], UniqueMinimizerRecord { minimizer: 2, p1: 1, size: 2 });
    }

    #[test]
    fn a_repeated_minimizer_becomes_a_collision() {
        let records = vec![
            rec(1, 0, 0, 1),
            rec(5, 1, 0, 1),
            rec(5, 2, 2, 3),
            rec(5, 3, 1, 1),
            rec(9, 4, 0, 1),
        ];
        let mut unique = Vec::new();
        let mut colliding = Vec::new();
        classify(
            records.into_iter(),
            |u| unique.push(u),
            |id| colliding.push(id),
        );
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[1], UniqueMinimizerRecord { minimizer: 5, p1: 0, size: 0 });
        assert_eq!(colliding, vec![1, 2, 3]);
    }

    #[test]
    fn collision_at_end_of_stream_is_still_reported() {
        let records = vec![rec(1, 0, 0, 1), rec(5, 1, 0, 1), rec(5, 2, 0, 1)];
        let mut unique = Vec::new();
        let mut colliding = Vec::new();
        classify(
            records.into_iter(),
            |u| unique.push(u),
            |id| colliding.push(id),
        );
        assert_eq!(unique.len(), 2);
        assert_eq!(colliding, vec![1, 2]);
    }

    #[test]
    fn empty_stream_emits_nothing() {
        let mut unique_count = 0;
        classify(std::iter::empty(), |_| unique_count += 1, |_| {});
        assert_eq!(unique_count, 0);
    }
}
