#[cfg(test)]
mod tests {
    use crate::error::NervError;
    use crate::nn::init::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_init_range_glorot() {
        let (lower, upper) = init_range(2, 4, false);
        assert_relative_eq!(upper, 1.0);
        assert_relative_eq!(lower, -1.0);
        let (_, sigmoid_upper) = init_range(2, 4, true);
        assert_relative_eq!(sigmoid_upper, 4.0);
    }

    #[test]
    fn test_init_layer_within_range() {
        let mut rng = StdRng::seed_from_u64(0x4711);
        let mut weights = vec![0.0; 64];
        init_layer(&mut weights, 8, 8, false, &mut rng);
        let (_, upper) = init_range(8, 8, false);
        assert!(weights.iter().all(|w| w.abs() <= upper));
        assert!(weights.iter().any(|&w| w != 0.0));
    }

    #[test]
    fn test_block_identity_diagonal() {
        let mut rng = StdRng::seed_from_u64(1);
        let dim = 3;
        let m = block_identity_matrix(dim, 2, &mut rng);
        assert_eq!(m.len(), dim * dim * 2);
        let cols = 2 * dim;
        for r in 0..dim {
            for c in 0..cols {
                let v = m[r * cols + c];
                if c % dim == r {
                    assert!((v - 0.5).abs() < 0.1, "diagonal ({}, {}) = {}", r, c, v);
                } else {
                    assert!(v.abs() < 0.1, "off-diagonal ({}, {}) = {}", r, c, v);
                }
            }
        }
    }

    #[test]
    fn test_gradual_diagonal_decays() {
        let mut rng = StdRng::seed_from_u64(2);
        let dim = 2;
        let m = gradual_matrix(dim, 4, &mut rng);
        let cols = 4 * dim;
        // Blocks 0 and 1 carry 1/2, blocks 2 and 3 carry 1/4.
        assert!((m[0] - 0.5).abs() < 0.1);
        assert!((m[2] - 0.5).abs() < 0.1);
        assert!((m[4] - 0.25).abs() < 0.1);
        assert!((m[cols + 7] - 0.25).abs() < 0.1);
    }

    #[test]
    fn test_composition_init_fill_is_seeded() {
        let mut a = vec![0.0; 8];
        let mut b = vec![0.0; 8];
        CompositionInit::BlockIdentity.fill(&mut a, 2, 2, &mut StdRng::seed_from_u64(9));
        CompositionInit::BlockIdentity.fill(&mut b, 2, 2, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_uniform_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let v = random_uniform(100, -0.5, 0.25, &mut rng).unwrap();
        assert!(v.iter().all(|&x| (-0.5..0.25).contains(&x)));
        assert!(random_uniform(2, 1.0, 0.0, &mut rng).is_err());
    }

    #[test]
    fn test_random_unitvec_norm() {
        let mut rng = StdRng::seed_from_u64(4);
        let v = random_unitvec(16, &mut rng);
        assert_relative_eq!(v.iter().map(|x| x * x).sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gaussian_repr_rejects_negative_sigma() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(gaussian_repr(4, 0.0, 0.1, &mut rng).unwrap().len(), 4);
        assert!(matches!(
            gaussian_repr(4, 0.0, -1.0, &mut rng),
            Err(NervError::InvalidHyperParameter(_))
        ));
        assert!(gaussian_repr(4, 0.0, f64::NAN, &mut rng).is_err());
        assert!(gaussian_repr(4, 0.0, f64::INFINITY, &mut rng).is_err());
    }

    #[test]
    fn test_onehot_reprs_exhaust() {
        let mut reprs = OneHotReprs::new(2);
        assert_eq!(reprs.next_repr().unwrap(), vec![1.0, 0.0]);
        assert_eq!(reprs.next_repr().unwrap(), vec![0.0, 1.0]);
        assert!(reprs.next_repr().is_err());
        assert_eq!(onehot(3, 1).unwrap(), vec![0.0, 1.0, 0.0]);
        assert!(onehot(3, 3).is_err());
    }
}
