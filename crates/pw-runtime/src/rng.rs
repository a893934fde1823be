pub(crate) const DEFAULT_SEED: u32 = 1;

pub(crate) fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

/// Uniform draw in `0..bound` by rejection sampling. `bound` must be non-zero.
pub(crate) fn next_random_bounded(state: &mut u32, bound: u32) -> u32 {
    next_random_bounded_with(state, bound, next_random_u32)
}

fn next_random_bounded_with<F>(state: &mut u32, bound: u32, mut next: F) -> u32
where
    F: FnMut(&mut u32) -> u32,
{
    let threshold = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    let mut candidate = next(state);
    while u64::from(candidate) >= threshold {
        candidate = next(state);
    }
    candidate % bound
}

/// Picks a position in a list of `len` entries, or `None` when it is empty.
pub(crate) fn pick_index(state: &mut u32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let bound = u32::try_from(len).unwrap_or(u32::MAX);
    Some(next_random_bounded(state, bound) as usize)
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn bounded_draw_retries_above_threshold() {
        let mut state = 0u32;
        let mut values = vec![u32::MAX, 42u32].into_iter();
        let result = next_random_bounded_with(&mut state, 10, |_s| {
            values.next().expect("test values should be available")
        });
        assert_eq!(result, 2);
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let mut left = 7u32;
        let mut right = 7u32;
        let a = (0..5).map(|_| next_random_u32(&mut left)).collect::<Vec<_>>();
        let b = (0..5).map(|_| next_random_u32(&mut right)).collect::<Vec<_>>();
        assert_eq!(a, b);
        assert_eq!(left, right);
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut state = DEFAULT_SEED;
        assert_eq!(pick_index(&mut state, 0), None);
        for _ in 0..50 {
            let index = pick_index(&mut state, 3).expect("non-empty");
            assert!(index < 3);
        }
    }
}
