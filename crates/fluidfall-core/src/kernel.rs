//! Separable blur kernel for the fluid compositor.

/// Largest kernel the compositor's uniform block can hold.
pub const MAX_KERNEL_SIZE: usize = 32;

/// Gaussian-like weights for a `k`-tap separable blur.
///
/// Tap positions are linearly spaced across `[-1, 1)`: `x_i = -1 + 2i/k`.
/// Raw weights `exp(-4 x_i^2)` are renormalized to sum to one, which makes the
/// blur energy-preserving: a constant field passes through unchanged away from
/// edges.
pub fn blur_weights(k: usize) -> Vec<f32> {
    assert!(k >= 1, "kernel size must be at least 1");

    let mut weights: Vec<f32> = (0..k)
        .map(|i| {
            let x = -1.0 + 2.0 * i as f32 / k as f32;
            (-4.0 * x * x).exp()
        })
        .collect();

    let total: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_for_every_size() {
        for k in 1..=MAX_KERNEL_SIZE {
            let w = blur_weights(k);
            assert_eq!(w.len(), k);
            let sum: f32 = w.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "k={k} sum={sum}");
            assert!(w.iter().all(|&x| x > 0.0));
        }
    }

    #[test]
    fn single_tap_kernel_is_identity() {
        assert_eq!(blur_weights(1), vec![1.0]);
    }

    #[test]
    fn center_taps_dominate() {
        let w = blur_weights(9);
        // Tap 4 sits closest to x = 0 for k = 9.
        let center = w[4];
        assert!(w.iter().all(|&x| x <= center + 1e-7));
    }

    #[test]
    fn constant_field_is_preserved_by_convolution() {
        // 1D convolution with clamp-to-edge addressing, the way the blur
        // shader samples. A constant field must come back unchanged, edges
        // included, because clamping only ever re-reads the same value.
        let field = vec![0.62_f32; 64];
        for k in [1, 4, 7, 16, 32] {
            let w = blur_weights(k);
            for (i, _) in field.iter().enumerate() {
                let mut acc = 0.0;
                for (tap, &weight) in w.iter().enumerate() {
                    let offset = tap as f32 - 0.5 * (k as f32 - 1.0);
                    let j = (i as f32 + offset).round() as i64;
                    let j = j.clamp(0, field.len() as i64 - 1) as usize;
                    acc += weight * field[j];
                }
                assert!((acc - 0.62).abs() < 1e-5, "k={k} i={i} acc={acc}");
            }
        }
    }
}
