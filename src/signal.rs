//! 1D peak detection with height, prominence and width conditions.
//!
//! Semantics follow the usual definitions: a peak is a local maximum (flat
//! tops resolve to their middle sample), its prominence is the height above
//! the higher of the two lowest points reached before a higher sample on
//! either side, and its width is measured at half prominence with linear
//! interpolation.

#[derive(Clone, Copy, Debug, Default)]
pub struct PeakCriteria {
    pub min_height: Option<f64>,
    pub min_prominence: Option<f64>,
    pub min_width: Option<f64>,
}

/// Local maxima of `x` (plateaus resolve to their middle index).
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let mut i = 1usize;
    let last = x.len() - 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left_edge = i;
                let right_edge = ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence and the left/right base indices of one peak.
pub fn prominence(x: &[f64], peak: usize) -> (f64, usize, usize) {
    let h = x[peak];

    let mut left_base = peak;
    let mut left_min = h;
    let mut i = peak;
    while i > 0 {
        i -= 1;
        if x[i] > h {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = h;
    let mut j = peak + 1;
    while j < x.len() {
        if x[j] > h {
            break;
        }
        if x[j] < right_min {
            right_min = x[j];
            right_base = j;
        }
        j += 1;
    }

    (h - left_min.max(right_min), left_base, right_base)
}

/// Width of a peak at half its prominence.
pub fn width_at_half_prominence(
    x: &[f64],
    peak: usize,
    prom: f64,
    left_base: usize,
    right_base: usize,
) -> f64 {
    let level = x[peak] - 0.5 * prom;

    let mut i = peak;
    while i > left_base && x[i] > level {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < level {
        left_ip += (level - x[i]) / (x[i + 1] - x[i]);
    }

    let mut j = peak;
    while j < right_base && x[j] > level {
        j += 1;
    }
    let mut right_ip = j as f64;
    if x[j] < level {
        right_ip -= (level - x[j]) / (x[j - 1] - x[j]);
    }

    right_ip - left_ip
}

/// Indices of peaks satisfying every given criterion, ascending.
pub fn find_peaks(x: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    local_maxima(x)
        .into_iter()
        .filter(|&p| criteria.min_height.map_or(true, |h| x[p] >= h))
        .filter(|&p| {
            if criteria.min_prominence.is_none() && criteria.min_width.is_none() {
                return true;
            }
            let (prom, lb, rb) = prominence(x, p);
            if criteria.min_prominence.is_some_and(|m| prom < m) {
                return false;
            }
            match criteria.min_width {
                Some(w) => width_at_half_prominence(x, p, prom, lb, rb) >= w,
                None => true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_resolves_to_middle() {
        let x = [0.0, 1.0, 3.0, 3.0, 3.0, 1.0, 0.0];
        assert_eq!(local_maxima(&x), vec![3]);
        // edges never count
        assert!(local_maxima(&[5.0, 1.0, 5.0]).is_empty());
    }

    #[test]
    fn prominence_uses_higher_base() {
        let x = [0.0, 4.0, 1.0, 6.0, 2.0, 3.0, 0.0];
        let (p, lb, rb) = prominence(&x, 1);
        assert!((p - 3.0).abs() < 1e-12);
        assert_eq!((lb, rb), (0, 2));
        let (p, _, _) = prominence(&x, 3);
        assert!((p - 6.0).abs() < 1e-12);
    }

    #[test]
    fn width_and_height_filters() {
        // A broad bump and a one-sample spike of the same height.
        let mut x = vec![0.0; 40];
        for (i, v) in x.iter_mut().enumerate().take(20).skip(5) {
            let t = (i as f64 - 12.0) / 4.0;
            *v = 2.0 * (-t * t).exp();
        }
        x[30] = 2.0;
        let all = find_peaks(&x, &PeakCriteria::default());
        assert_eq!(all, vec![12, 30]);
        let wide = find_peaks(
            &x,
            &PeakCriteria {
                min_height: Some(0.6),
                min_prominence: Some(0.3),
                min_width: Some(5.0),
            },
        );
        assert_eq!(wide, vec![12]);
        let tall = find_peaks(
            &x,
            &PeakCriteria {
                min_height: Some(2.5),
                ..Default::default()
            },
        );
        assert!(tall.is_empty());
    }
}
