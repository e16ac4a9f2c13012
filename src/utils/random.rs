use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Deterministic generator for `Some(seed)`, entropy-seeded otherwise
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Next child seed from a parent generator
pub fn derive_seed(rng: &mut StdRng) -> u64 {
    rng.next_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_children() {
        let mut a = seeded_rng(Some(17));
        let mut b = seeded_rng(Some(17));
        let xs: Vec<u64> = (0..4).map(|_| derive_seed(&mut a)).collect();
        let ys: Vec<u64> = (0..4).map(|_| derive_seed(&mut b)).collect();
        assert_eq!(xs, ys);
    }
}
