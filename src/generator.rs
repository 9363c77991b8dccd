use crate::wordlist::WordSet;
use rand::{Rng, RngCore};

/// Draw `count` words uniformly at random, with replacement, from `set`.
///
/// Adjacent repeats are allowed. The caller supplies the random source, so a
/// seeded generator yields a reproducible passage.
pub fn generate(rng: &mut dyn RngCore, set: &WordSet, count: usize) -> Vec<String> {
    if set.words.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| set.words[rng.gen_range(0..set.words.len())].clone())
        .collect()
}
