//! Seeded option shuffling.

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle options while keeping the closing option in place.
///
/// With five or more options only the first four move; otherwise everything
/// but the last option moves.
pub fn shuffle_keep_last<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let len = items.len();
    if len < 2 {
        return;
    }
    let movable = if len >= 5 { 4 } else { len - 1 };
    items[..movable].shuffle(rng);
}

/// Shuffle every option.
pub fn shuffle_all<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn last_option_stays_put() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let mut items = vec![1, 2, 3, 4];
            shuffle_keep_last(&mut items, &mut rng);
            assert_eq!(items[3], 4);
            items.sort();
            assert_eq!(items, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn only_first_four_move_with_five_or_more() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut items = vec![1, 2, 3, 4, 5, 6];
            shuffle_keep_last(&mut items, &mut rng);
            assert_eq!(&items[4..], &[5, 6]);
        }
    }

    #[test]
    fn same_seed_same_order() {
        let mut a: Vec<u32> = (0..10).collect();
        let mut b = a.clone();
        shuffle_all(&mut a, &mut StdRng::seed_from_u64(3));
        shuffle_all(&mut b, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_lists_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut one = vec![9];
        shuffle_keep_last(&mut one, &mut rng);
        assert_eq!(one, vec![9]);
        let mut none: Vec<u8> = Vec::new();
        shuffle_all(&mut none, &mut rng);
        assert!(none.is_empty());
    }
}
