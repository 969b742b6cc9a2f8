use std::collections::HashSet;
use std::hash::Hash;

/// Items of `wanted` that are not in `have`.
pub fn difference<T>(wanted: &HashSet<T>, have: &HashSet<T>) -> HashSet<T>
where
    T: Eq + Hash + Clone,
{
    wanted.difference(have).cloned().collect()
}
