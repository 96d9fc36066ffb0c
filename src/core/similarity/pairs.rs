//! Candidate pair generation and parallel scoring.
//!
//! For an authoritative pool K and a disposable pool D the candidates are
//! every `(k, d)` cross pair plus every `(d[i], d[j])` with `i < j`.
//! K×K pairs are never produced: authoritative photos are never removed, so
//! comparing them against each other is wasted work.

use super::{ScoredPair, SimilarityThreshold};
use crate::core::features::FeatureRecord;
use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `|K|·|D| + |D|·(|D|-1)/2`
pub fn candidate_pair_count(authoritative: usize, disposable: usize) -> usize {
    authoritative * disposable + disposable * disposable.saturating_sub(1) / 2
}

/// Every candidate pair, exactly once, with no self-pairs.
///
/// Pairs are independent, so the iterator may be consumed in any order.
pub fn candidate_pairs<'a>(
    authoritative: &'a [FeatureRecord],
    disposable: &'a [FeatureRecord],
) -> impl ParallelIterator<Item = (&'a FeatureRecord, &'a FeatureRecord)> + 'a {
    let cross = authoritative
        .par_iter()
        .flat_map(move |keep| disposable.par_iter().map(move |candidate| (keep, candidate)));

    let within = (0..disposable.len()).into_par_iter().flat_map(move |i| {
        (i + 1..disposable.len())
            .into_par_iter()
            .map(move |j| (&disposable[i], &disposable[j]))
    });

    cross.chain(within)
}

/// Score every candidate pair in parallel and keep those at or above the
/// threshold.
///
/// Emits progress events every ~2% of comparisons.
pub fn score_pairs<'a>(
    authoritative: &'a [FeatureRecord],
    disposable: &'a [FeatureRecord],
    threshold: SimilarityThreshold,
    events: &EventSender,
) -> Vec<ScoredPair<'a>> {
    let total_comparisons = candidate_pair_count(authoritative.len(), disposable.len());
    events.send(Event::Compare(CompareEvent::Started { total_comparisons }));

    let update_interval = (total_comparisons / 50).clamp(1, 10_000);
    let completed = AtomicUsize::new(0);

    let matched: Vec<ScoredPair<'a>> = candidate_pairs(authoritative, disposable)
        .filter_map(|(first, second)| {
            let pair = ScoredPair::new(first, second);

            let comparisons_completed = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if comparisons_completed % update_interval == 0 {
                events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                    comparisons_completed,
                    total_comparisons,
                })));
            }

            threshold.is_match(pair.score()).then_some(pair)
        })
        .collect();

    events.send(Event::Compare(CompareEvent::Completed {
        total_comparisons,
        matched_pairs: matched.len(),
    }));

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::Pool;
    use crate::events::{null_sender, EventChannel};
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn records(prefix: &str, pool: Pool, count: usize) -> Vec<FeatureRecord> {
        (0..count)
            .map(|i| {
                let lumas: Vec<f32> = (0..64).map(|j| ((i * 31 + j * 7) % 255) as f32).collect();
                FeatureRecord::from_lumas(
                    format!("/{}/{}.jpg", prefix, i),
                    pool,
                    100,
                    &lumas,
                    [0.0; 3],
                )
            })
            .collect()
    }

    fn collect_paths(keep: &[FeatureRecord], delete: &[FeatureRecord]) -> Vec<(PathBuf, PathBuf)> {
        candidate_pairs(keep, delete)
            .map(|(a, b)| (a.path().to_path_buf(), b.path().to_path_buf()))
            .collect()
    }

    #[test]
    fn pair_count_formula() {
        assert_eq!(candidate_pair_count(0, 0), 0);
        assert_eq!(candidate_pair_count(5, 0), 0);
        assert_eq!(candidate_pair_count(0, 1), 0);
        assert_eq!(candidate_pair_count(0, 4), 6);
        assert_eq!(candidate_pair_count(3, 4), 18);
    }

    #[test]
    fn generates_every_pair_exactly_once() {
        let keep = records("keep", Pool::Authoritative, 3);
        let delete = records("delete", Pool::Disposable, 5);

        let pairs = collect_paths(&keep, &delete);
        assert_eq!(pairs.len(), candidate_pair_count(3, 5));

        let unordered: HashSet<_> = pairs
            .iter()
            .map(|(a, b)| if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) })
            .collect();
        assert_eq!(unordered.len(), pairs.len());
    }

    #[test]
    fn never_pairs_a_record_with_itself_or_two_authoritative_records() {
        let keep = records("keep", Pool::Authoritative, 4);
        let delete = records("delete", Pool::Disposable, 4);

        for (a, b) in candidate_pairs(&keep, &delete).collect::<Vec<_>>() {
            assert_ne!(a.path(), b.path());
            assert!(!(a.is_authoritative() && b.is_authoritative()));
            assert!(!b.is_authoritative());
        }
    }

    #[test]
    fn disposable_pairs_name_the_lower_index_first() {
        let delete = records("delete", Pool::Disposable, 3);
        let pairs = collect_paths(&[], &delete);

        assert_eq!(
            pairs,
            vec![
                (PathBuf::from("/delete/0.jpg"), PathBuf::from("/delete/1.jpg")),
                (PathBuf::from("/delete/0.jpg"), PathBuf::from("/delete/2.jpg")),
                (PathBuf::from("/delete/1.jpg"), PathBuf::from("/delete/2.jpg")),
            ]
        );
    }

    #[test]
    fn authoritative_only_produces_no_pairs() {
        let keep = records("keep", Pool::Authoritative, 6);
        assert!(collect_paths(&keep, &[]).is_empty());
    }

    #[test]
    fn score_pairs_applies_threshold() {
        let keep = records("keep", Pool::Authoritative, 1);
        let mut delete = records("delete", Pool::Disposable, 2);
        // An exact copy of the authoritative record
        let lumas: Vec<f32> = (0..64).map(|j| ((j * 7) % 255) as f32).collect();
        delete.push(FeatureRecord::from_lumas(
            "/delete/copy.jpg",
            Pool::Disposable,
            100,
            &lumas,
            [0.0; 3],
        ));

        let matched = score_pairs(&keep, &delete, SimilarityThreshold::exact(), &null_sender());

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].first().path(), keep[0].path());
        assert_eq!(matched[0].second().path(), PathBuf::from("/delete/copy.jpg"));
    }

    #[test]
    fn score_pairs_reports_start_and_completion() {
        let delete = records("delete", Pool::Disposable, 20);
        let (sender, receiver) = EventChannel::new();

        let threshold = SimilarityThreshold::new(0.0).unwrap();
        let _ = score_pairs(&[], &delete, threshold, &sender);
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        match &events[0] {
            Event::Compare(CompareEvent::Started { total_comparisons }) => {
                assert_eq!(*total_comparisons, 190);
            }
            _ => panic!("Expected Started event"),
        }
        match events.last().unwrap() {
            Event::Compare(CompareEvent::Completed {
                total_comparisons, ..
            }) => assert_eq!(*total_comparisons, 190),
            _ => panic!("Expected Completed event"),
        }
    }
}
