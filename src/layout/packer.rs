/// Packs same-orientation items into rows of at most `max_per_row`.
///
/// # Algorithm
/// 1. Fewer than `min_images` items: one row holds all of them.
/// 2. Walk the list taking `max_per_row` items per row. When taking a full
///    row would leave a short final row and the remainder is at most
///    `max_per_row + min_images`, the remainder is split evenly over the last
///    two rows (`ceil(r / 2)` then `floor(r / 2)`).
/// 3. If the last row is still short of `min_images`, borrow the shortfall
///    from the end of the previous row when it has that much surplus,
///    otherwise fold the last row into the previous one.
///
/// Order is preserved: concatenating the rows yields `items`.
pub fn pack_rows<T>(items: Vec<T>, max_per_row: usize, min_images: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if items.len() < min_images {
        return vec![items];
    }

    let max = max_per_row.max(1);
    let mut rows: Vec<Vec<T>> = Vec::with_capacity(items.len().div_ceil(max));
    let mut iter = items.into_iter();
    let mut remaining = iter.len();

    while remaining > 0 {
        let leaves_orphan = remaining > max && remaining - max < max;
        let take = if leaves_orphan && remaining <= max + min_images {
            remaining.div_ceil(2)
        } else {
            remaining.min(max)
        };
        rows.push(iter.by_ref().take(take).collect());
        remaining -= take;
    }

    rebalance_tail(&mut rows, min_images);
    rows
}

/// Brings the trailing row up to `min_images`.
fn rebalance_tail<T>(rows: &mut Vec<Vec<T>>, min_images: usize) {
    if rows.len() < 2 {
        return;
    }

    let prev_idx = rows.len() - 2;
    let last_len = rows[prev_idx + 1].len();
    if last_len < min_images {
        let shortfall = min_images - last_len;
        let surplus = rows[prev_idx].len().saturating_sub(min_images);
        if surplus >= shortfall {
            let prev = &mut rows[prev_idx];
            let split_at = prev.len() - shortfall;
            let moved: Vec<T> = prev.drain(split_at..).collect();
            rows[prev_idx + 1].splice(0..0, moved);
        }
    }

    // Limits with max < min cannot be met by moving items alone.
    while rows.len() > 1 && rows.last().is_some_and(|row| row.len() < min_images) {
        if let Some(tail) = rows.pop() {
            if let Some(prev) = rows.last_mut() {
                prev.extend(tail);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(rows: &[Vec<usize>]) -> Vec<usize> {
        rows.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_empty_items() {
        assert!(pack_rows(Vec::<usize>::new(), 3, 2).is_empty());
    }

    #[test]
    fn test_fewer_than_min_is_single_row() {
        let rows = pack_rows(vec![1, 2], 1, 3);
        assert_eq!(rows, vec![vec![1, 2]]);
    }

    #[test]
    fn test_exact_fill() {
        let rows = pack_rows((0..6).collect(), 3, 2);
        assert_eq!(sizes(&rows), vec![3, 3]);
    }

    #[test]
    fn test_orphan_is_split_evenly() {
        // 5 items at max 4 would leave a single orphan; split 3 + 2 instead.
        let rows = pack_rows((0..5).collect(), 4, 2);
        assert_eq!(sizes(&rows), vec![3, 2]);

        let rows = pack_rows((0..9).collect(), 4, 2);
        assert_eq!(sizes(&rows), vec![4, 3, 2]);
    }

    #[test]
    fn test_large_remainder_is_not_split() {
        // Remainder 2 already meets min 1.
        let rows = pack_rows((0..6).collect(), 4, 1);
        assert_eq!(sizes(&rows), vec![4, 2]);
    }

    #[test]
    fn test_rebalance_moves_shortfall_from_previous_row() {
        let mut rows = vec![vec![0, 1, 2, 3, 4], vec![5]];
        rebalance_tail(&mut rows, 3);
        assert_eq!(rows, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_rebalance_merges_when_no_surplus() {
        let rows = pack_rows((0..3).collect(), 2, 2);
        assert_eq!(rows, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_trailing_row_invariant_holds_for_all_limits() {
        for n in 0..40usize {
            for max in 0..7usize {
                for min in 0..6usize {
                    let items: Vec<usize> = (0..n).collect();
                    let rows = pack_rows(items.clone(), max, min);

                    let flat: Vec<usize> = rows.iter().flatten().copied().collect();
                    assert_eq!(flat, items, "order lost for n={n} max={max} min={min}");

                    if n == 0 {
                        assert!(rows.is_empty());
                    } else if n < min {
                        assert_eq!(sizes(&rows), vec![n], "n={n} max={max} min={min}");
                    } else {
                        let last = rows.last().unwrap().len();
                        assert!(
                            last >= min,
                            "trailing row {last} < min {min} for n={n} max={max}"
                        );
                        assert!(rows.iter().all(|r| !r.is_empty()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_rows_respect_max_when_limits_are_sane() {
        for n in 1..40usize {
            for max in 2..7usize {
                for min in 1..=(max + 1) / 2 {
                    let rows = pack_rows((0..n).collect::<Vec<_>>(), max, min);
                    assert!(
                        rows.iter().all(|r| r.len() <= max),
                        "row over max for n={n} max={max} min={min}: {:?}",
                        sizes(&rows)
                    );
                }
            }
        }
    }
}
