use std::cmp::Ordering;

pub trait Comparator: Send + Sync {
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering;

    fn name(&self) -> &'static str;
}

#[derive(Clone, Copy, Default)]
pub struct BitWiseComparator {}

impl Comparator for BitWiseComparator {
    fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        left.cmp(right)
    }

    fn name(&self) -> &'static str {
        "skipdb.BitwiseComparator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_wise_comparator_cmp() {
        let tests: Vec<(&[u8], &[u8], Ordering)> = vec![
            (&[1, 2, 3, 4, 5][..], &[1, 2, 3, 4, 6][..], Ordering::Less),
            (&[1, 2, 3, 4, 5][..], &[1, 2, 3, 4, 5, 1][..], Ordering::Less),
            (&[1, 2, 3, 4, 5][..], &[1, 2, 3, 4, 5][..], Ordering::Equal),
            (&[1, 2, 4, 4, 5][..], &[1, 2, 3, 4, 5][..], Ordering::Greater),
            (&[1, 1, 3, 4, 5, 6][..], &[1, 2, 3, 4, 5][..], Ordering::Less),
            (&b"carlo10"[..], &b"carlo2"[..], Ordering::Less),
            (&[0xff][..], &[0x7f, 0xff][..], Ordering::Greater),
            (&[][..], &[][..], Ordering::Equal),
            (&[0][..], &[][..], Ordering::Greater),
        ];

        let comparator = BitWiseComparator {};
        for (i, &(a, b, expect)) in tests.iter().enumerate() {
            assert_eq!(comparator.compare(a, b), expect, "{}", i);
        }
    }
}
