//! Geometry behind the distribution charts: histogram bins, box statistics
//! and Gaussian kernel density estimates.

use crate::processing::statistics::{quantile_sorted, Sample};

pub const DEFAULT_BINS: usize = 20;

/// Density curves extend this many bandwidths past the data.
pub const DENSITY_CUT: f64 = 3.0;
pub const DENSITY_POINTS: usize = 200;
pub const VIOLIN_CUT: f64 = 2.0;
pub const VIOLIN_POINTS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 1.0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(left, right, count)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}

/// Equal-width bins spanning the data; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return Some(Histogram {
            edges: vec![min - 0.5, min + 0.5],
            counts: vec![finite.len()],
        });
    }

    let bins = bins.max(1);
    let width = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram { edges, counts })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Tukey box: whiskers reach the furthest points within 1.5 IQR of the box.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sample = Sample::new(values);
    let sorted = sample.sorted();
    let q1 = quantile_sorted(sorted, 0.25)?;
    let median = quantile_sorted(sorted, 0.5)?;
    let q3 = quantile_sorted(sorted, 0.75)?;

    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let lower_whisker = sorted.iter().copied().find(|v| *v >= low_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|v| *v <= high_fence).unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// Gaussian kernel density estimate with Scott's bandwidth.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Needs two or more finite values with non-zero spread.
    pub fn new(values: &[f64]) -> Option<Self> {
        let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let sample = Sample::new(&data);
        let std = sample.std_dev()?;
        if std <= 0.0 {
            return None;
        }
        let bandwidth = std * (data.len() as f64).powf(-0.2);
        Some(Self { data, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * self.bandwidth * self.data.len() as f64);
        self.data
            .iter()
            .map(|v| {
                let z = (x - v) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    /// `[x, density]` pairs over the data range widened by `cut` bandwidths.
    pub fn curve(&self, cut: f64, points: usize) -> Vec<[f64; 2]> {
        let min = self.data.iter().copied().fold(f64::INFINITY, f64::min) - cut * self.bandwidth;
        let max = self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max) + cut * self.bandwidth;
        let points = points.max(2);
        let step = (max - min) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let x = min + step * i as f64;
                [x, self.evaluate(x)]
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Violin {
    /// `[value, half_width]` with the widest point at 1.0.
    pub outline: Vec<[f64; 2]>,
    pub inner: BoxStats,
}

pub fn violin(values: &[f64]) -> Option<Violin> {
    let kde = GaussianKde::new(values)?;
    let curve = kde.curve(VIOLIN_CUT, VIOLIN_POINTS);
    let peak = curve.iter().map(|p| p[1]).fold(0.0, f64::max);
    if peak <= 0.0 {
        return None;
    }
    Some(Violin {
        outline: curve.iter().map(|[x, d]| [*x, d / peak]).collect(),
        inner: box_stats(values)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_every_value_once() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let h = histogram(&values, 20).unwrap();
        assert_eq!(h.counts.len(), 20);
        assert_eq!(h.edges.len(), 21);
        assert_eq!(h.counts.iter().sum::<usize>(), 101);
        // the maximum lands in the last, right-closed bin
        assert_eq!(h.counts[19], 6);
        assert!((h.bin_width() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn constant_histogram_is_one_centered_bin() {
        let h = histogram(&[2.0, 2.0, 2.0], 20).unwrap();
        assert_eq!(h.edges, vec![1.5, 2.5]);
        assert_eq!(h.counts, vec![3]);
        assert!(histogram(&[], 20).is_none());
    }

    #[test]
    fn box_stats_flag_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let b = box_stats(&values).unwrap();
        assert_eq!(b.q1, 3.0);
        assert_eq!(b.median, 5.0);
        assert_eq!(b.q3, 7.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 8.0);
        assert_eq!(b.outliers, vec![100.0]);
    }

    #[test]
    fn kde_uses_scott_bandwidth_and_integrates_to_one() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let kde = GaussianKde::new(&values).unwrap();
        let expected_bw = 2.5_f64.sqrt() * 5.0_f64.powf(-0.2);
        assert!((kde.bandwidth() - expected_bw).abs() < 1e-12);

        let curve = kde.curve(DENSITY_CUT, 400);
        let step = curve[1][0] - curve[0][0];
        let area: f64 = curve.iter().map(|p| p[1] * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area {area}");
    }

    #[test]
    fn kde_needs_spread() {
        assert!(GaussianKde::new(&[1.0]).is_none());
        assert!(GaussianKde::new(&[3.0, 3.0]).is_none());
    }

    #[test]
    fn violin_outline_is_normalized() {
        let v = violin(&[1.0, 2.0, 2.5, 3.0, 7.0]).unwrap();
        let peak = v.outline.iter().map(|p| p[1]).fold(0.0, f64::max);
        assert!((peak - 1.0).abs() < 1e-12);
        assert_eq!(v.outline.len(), VIOLIN_POINTS);
        assert_eq!(v.inner.median, 2.5);
    }
}
