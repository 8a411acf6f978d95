//! Length-driven sentence boundary extension

use crate::error::{Error, Result};

/// Insert extra sentence boundaries until every segment fits the sequence
/// length limit.
///
/// `bounds` are cumulative word-index sentence ends for one document;
/// `token_counts` is the number of sub-tokens each word expands to. A
/// segment whose sub-token total plus the two sentinel slots exceeds
/// `max_seq_length` is split at the last word where the running total still
/// fits, and the scan restarts; each insertion strictly shrinks the largest
/// oversized segment, so the iteration reaches a fixed point. The result is
/// idempotent under re-application.
///
/// Splitting is agnostic to entity spans; a gold span may be bisected by an
/// inserted boundary, in which case each half is annotated independently in
/// its own segment.
pub fn extend_sentence_bounds(
    bounds: &[usize],
    token_counts: &[usize],
    max_seq_length: usize,
) -> Result<Vec<usize>> {
    let mut bounds = bounds.to_vec();
    'scan: loop {
        for i in 0..bounds.len() {
            let start = if i == 0 { 0 } else { bounds[i - 1] };
            let counts = &token_counts[start..bounds[i]];
            let total: usize = counts.iter().sum();
            if total + 2 <= max_seq_length {
                continue;
            }
            // Number of leading words whose running total stays strictly
            // under the limit; falls back to a single word that fits
            // exactly.
            let mut running = 0;
            let mut fit = 0;
            for &count in counts {
                running += count;
                if running + 2 >= max_seq_length {
                    break;
                }
                fit += 1;
            }
            if fit == 0 {
                if counts[0] + 2 > max_seq_length {
                    return Err(Error::SequenceLimit(format!(
                        "word {start} expands to {} sub-tokens and cannot fit \
                         max_seq_length {max_seq_length} even alone",
                        counts[0]
                    )));
                }
                fit = 1;
            }
            bounds.insert(i, start + fit);
            continue 'scan;
        }
        return Ok(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitting_sentences_unchanged() {
        let bounds = extend_sentence_bounds(&[3, 5], &[1, 1, 1, 2, 2], 8).unwrap();
        assert_eq!(bounds, vec![3, 5]);
    }

    #[test]
    fn test_greedy_split_point() {
        // 1+1 stays under the limit, adding the 5-sub-token word does not
        let bounds = extend_sentence_bounds(&[4], &[1, 1, 5, 1], 9).unwrap();
        assert_eq!(bounds, vec![2, 4]);
    }

    #[test]
    fn test_split_restarts_until_fixed_point() {
        let bounds = extend_sentence_bounds(&[6], &[2, 2, 2, 2, 2, 2], 6).unwrap();
        assert_eq!(bounds, vec![1, 2, 3, 4, 5, 6]);
        for (i, &end) in bounds.iter().enumerate() {
            let start = if i == 0 { 0 } else { bounds[i - 1] };
            assert!((end - start) * 2 + 2 <= 6);
        }
    }

    #[test]
    fn test_idempotent() {
        let once = extend_sentence_bounds(&[4], &[1, 1, 5, 1], 9).unwrap();
        let twice = extend_sentence_bounds(&once, &[1, 1, 5, 1], 9).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_word_exactly_filling_limit_splits_alone() {
        // 3 + 2 sentinels fills a limit of 5 exactly; the strict threshold
        // alone would find no split point
        let bounds = extend_sentence_bounds(&[2], &[3, 3], 5).unwrap();
        assert_eq!(bounds, vec![1, 2]);
    }

    #[test]
    fn test_unsplittable_word_fails() {
        let result = extend_sentence_bounds(&[4], &[1, 1, 5, 1], 5);
        assert!(matches!(result, Err(Error::SequenceLimit(_))));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extend_sentence_bounds(&[], &[], 8).unwrap(), Vec::<usize>::new());
    }
}
