use std::cmp::Ordering;

/// Tie-break policy used when a search finds no exact match.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Bias {
    /// Take the closest element smaller than the needle.
    #[default]
    GreatestLowerBound,
    /// Take the closest element greater than the needle.
    LeastUpperBound,
}

/// Searches a haystack sorted by `key` for `needle`.
///
/// Returns the index of an element equal to the needle, or, when there is none,
/// the closest smaller or greater element depending on `bias`. When several
/// elements share the key of the result, the smallest index among them is
/// returned. An empty haystack, or one without any element on the biased side,
/// yields `None`.
///
/// ```
/// use srcmap::{search_by_key, Bias};
///
/// let haystack = [1, 3, 3, 5, 7];
/// assert_eq!(search_by_key(&4, &haystack, Bias::GreatestLowerBound, |&v| v), Some(1));
/// assert_eq!(search_by_key(&4, &haystack, Bias::LeastUpperBound, |&v| v), Some(3));
/// ```
pub fn search_by_key<T, K, F>(needle: &K, haystack: &[T], bias: Bias, mut key: F) -> Option<usize>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    if haystack.is_empty() {
        return None;
    }

    let mut index = recursive_search(-1, haystack.len() as isize, needle, haystack, &mut key, bias)?;

    // walk back over elements that compare equal to the one found
    while index > 0 && key(&haystack[index]) == key(&haystack[index - 1]) {
        index -= 1;
    }
    Some(index)
}

// `low` and `high` are exclusive bounds, so `low` starts at -1.
fn recursive_search<T, K, F>(
    low: isize,
    high: isize,
    needle: &K,
    haystack: &[T],
    key: &mut F,
    bias: Bias,
) -> Option<usize>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mid = (high - low) / 2 + low;
    match needle.cmp(&key(&haystack[mid as usize])) {
        Ordering::Equal => Some(mid as usize),
        Ordering::Greater => {
            if high - mid > 1 {
                return recursive_search(mid, high, needle, haystack, key, bias);
            }
            match bias {
                Bias::LeastUpperBound => {
                    ((high as usize) < haystack.len()).then_some(high as usize)
                }
                Bias::GreatestLowerBound => Some(mid as usize),
            }
        }
        Ordering::Less => {
            if mid - low > 1 {
                return recursive_search(low, mid, needle, haystack, key, bias);
            }
            match bias {
                Bias::LeastUpperBound => Some(mid as usize),
                Bias::GreatestLowerBound => (low >= 0).then_some(low as usize),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{search_by_key, Bias};

    fn search(needle: i32, haystack: &[i32], bias: Bias) -> Option<usize> {
        search_by_key(&needle, haystack, bias, |&v| v)
    }

    #[test]
    fn test_search_duplicates() {
        let haystack = [1, 3, 3, 5, 7];
        assert_eq!(search(3, &haystack, Bias::GreatestLowerBound), Some(1));
        assert_eq!(search(3, &haystack, Bias::LeastUpperBound), Some(1));
        assert_eq!(search(4, &haystack, Bias::GreatestLowerBound), Some(1));
        assert_eq!(search(4, &haystack, Bias::LeastUpperBound), Some(3));
        assert_eq!(search(8, &haystack, Bias::LeastUpperBound), None);
        assert_eq!(search(8, &haystack, Bias::GreatestLowerBound), Some(4));
        assert_eq!(search(0, &haystack, Bias::GreatestLowerBound), None);
        assert_eq!(search(0, &haystack, Bias::LeastUpperBound), Some(0));
    }

    #[test]
    fn test_search_runs() {
        let haystack = [2, 2, 2, 2, 2, 2, 9];
        assert_eq!(search(2, &haystack, Bias::GreatestLowerBound), Some(0));
        assert_eq!(search(5, &haystack, Bias::GreatestLowerBound), Some(0));
        assert_eq!(search(5, &haystack, Bias::LeastUpperBound), Some(6));
        assert_eq!(search(1, &haystack, Bias::LeastUpperBound), Some(0));
    }

    #[test]
    fn test_search_empty_and_single() {
        assert_eq!(search(1, &[], Bias::GreatestLowerBound), None);
        assert_eq!(search(1, &[], Bias::LeastUpperBound), None);
        assert_eq!(search(1, &[1], Bias::LeastUpperBound), Some(0));
        assert_eq!(search(2, &[1], Bias::GreatestLowerBound), Some(0));
        assert_eq!(search(2, &[1], Bias::LeastUpperBound), None);
    }

    #[test]
    fn test_search_exhaustive_against_linear_scan() {
        let haystack = [0, 1, 1, 4, 4, 4, 6, 10, 10, 13];
        for needle in -1..=14 {
            let glb = haystack.iter().rposition(|&v| v <= needle).map(|idx| {
                let value = haystack[idx];
                haystack.iter().position(|&v| v == value).unwrap()
            });
            let lub = haystack.iter().position(|&v| v >= needle);
            assert_eq!(search(needle, &haystack, Bias::GreatestLowerBound), glb, "{needle}");
            assert_eq!(search(needle, &haystack, Bias::LeastUpperBound), lub, "{needle}");
        }
    }
}
