/// Index into a slice, treating it as circular. Negative indices count backwards from the end.
pub fn wraparound_get<T>(vec: &[T], idx: isize) -> &T {
    let len = vec.len() as isize;
    let idx = idx % len;
    let idx = if idx >= 0 { idx } else { idx + len };
    &vec[idx as usize]
}

pub fn contains_duplicates<T: Ord>(vec: &[T]) -> bool {
    let mut set = std::collections::BTreeSet::new();
    for item in vec {
        if !set.insert(item) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_both_ways() {
        let v = vec![1, 2, 3];
        assert_eq!(*wraparound_get(&v, 3), 1);
        assert_eq!(*wraparound_get(&v, -1), 3);
        assert_eq!(*wraparound_get(&v, 1), 2);
    }

    #[test]
    fn duplicates() {
        assert!(contains_duplicates(&[1, 2, 1]));
        assert!(!contains_duplicates(&[1, 2, 3]));
    }
}
