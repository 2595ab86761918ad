//! Moving-average smoothing of raw spectra.

/// Smooth a spectrum with a windowed integer-truncated moving average.
///
/// For index `i` the window spans
/// `[max(0, i - window_size / 2), min(len, i + window_size / 2 + 1))`;
/// windows narrow at the boundaries rather than wrapping or padding. The
/// output has the same length as the input; an empty input yields an
/// empty output. `window_size` is clamped to a minimum of 1.
pub fn smooth(spectrum: &[u32], window_size: usize) -> Vec<u32> {
    let half = window_size.max(1) / 2;
    (0..spectrum.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(spectrum.len());
            let window = &spectrum[lo..hi];
            let sum: u64 = window.iter().map(|&v| u64::from(v)).sum();
            (sum / window.len() as u64) as u32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_preserved() {
        let spectrum: Vec<u32> = (0..4096).map(|i| (i % 97) as u32).collect();
        assert_eq!(smooth(&spectrum, 10).len(), spectrum.len());
        assert_eq!(smooth(&spectrum, 1).len(), spectrum.len());
        assert_eq!(smooth(&spectrum, 4096).len(), spectrum.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(smooth(&[], 10).is_empty());
    }

    #[test]
    fn test_window_clamped_to_one() {
        let spectrum = vec![5, 7, 9];
        // window_size 0 behaves as 1: every window is the element itself.
        assert_eq!(smooth(&spectrum, 0), spectrum);
        assert_eq!(smooth(&spectrum, 1), spectrum);
    }

    #[test]
    fn test_windows_narrow_at_boundaries() {
        let spectrum = vec![0, 10, 20, 30, 40];
        let smoothed = smooth(&spectrum, 4);
        // i=0: window [0, 3) -> mean(0, 10, 20) = 10
        assert_eq!(smoothed[0], 10);
        // i=2: window [0, 5) -> mean(0, 10, 20, 30, 40) = 20
        assert_eq!(smoothed[2], 20);
        // i=4: window [2, 5) -> mean(20, 30, 40) = 30
        assert_eq!(smoothed[4], 30);
    }

    #[test]
    fn test_truncated_mean() {
        // mean(1, 2) = 1.5 truncates to 1
        assert_eq!(smooth(&[1, 2], 2), vec![1, 1]);
    }

    #[test]
    fn test_output_within_window_bounds() {
        let spectrum: Vec<u32> = (0..1000).map(|i| ((i * 31) % 211) as u32).collect();
        let window_size = 8;
        let half = window_size / 2;
        let smoothed = smooth(&spectrum, window_size);
        for (i, &value) in smoothed.iter().enumerate() {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(spectrum.len());
            let window = &spectrum[lo..hi];
            let min = *window.iter().min().unwrap();
            let max = *window.iter().max().unwrap();
            assert!(value >= min && value <= max, "index {} out of bounds", i);
        }
    }

    #[test]
    fn test_no_overflow_at_large_counts() {
        let spectrum = vec![u32::MAX; 16];
        assert_eq!(smooth(&spectrum, 8), spectrum);
    }
}
