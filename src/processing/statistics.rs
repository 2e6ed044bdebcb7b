use serde::{Deserialize, Serialize};

/// A scalar statistic computed from one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    Count,
    Mean,
    Median,
    Mode,
    Range,
    Variance,
    StdDev,
    Skewness,
    Kurtosis,
    Max,
    Min,
    CoefficientOfVariation,
    Q1,
    Q2,
    Q3,
    Iqr,
    QuartileDeviation,
    MeanAbsoluteDeviation,
}

impl Measure {
    /// Display order.
    pub const ALL: [Measure; 18] = [
        Measure::Count,
        Measure::Mean,
        Measure::Median,
        Measure::Mode,
        Measure::Range,
        Measure::Variance,
        Measure::StdDev,
        Measure::Skewness,
        Measure::Kurtosis,
        Measure::Max,
        Measure::Min,
        Measure::CoefficientOfVariation,
        Measure::Q1,
        Measure::Q2,
        Measure::Q3,
        Measure::Iqr,
        Measure::QuartileDeviation,
        Measure::MeanAbsoluteDeviation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Measure::Count => "Count",
            Measure::Mean => "Mean",
            Measure::Median => "Median",
            Measure::Mode => "Mode",
            Measure::Range => "Range",
            Measure::Variance => "Variance",
            Measure::StdDev => "Standard Deviation",
            Measure::Skewness => "Skewness",
            Measure::Kurtosis => "Kurtosis",
            Measure::Max => "Max",
            Measure::Min => "Min",
            Measure::CoefficientOfVariation => "Coefficient of Variation",
            Measure::Q1 => "Q1",
            Measure::Q2 => "Q2",
            Measure::Q3 => "Q3",
            Measure::Iqr => "IQR",
            Measure::QuartileDeviation => "Quartile Deviation",
            Measure::MeanAbsoluteDeviation => "Mean Absolute Deviation",
        }
    }

    /// Header used in exported tables.
    pub fn column_name(&self) -> &'static str {
        match self {
            Measure::CoefficientOfVariation => "CV",
            Measure::QuartileDeviation => "QD",
            Measure::MeanAbsoluteDeviation => "MAD",
            other => other.label(),
        }
    }

    /// Evaluate on a prepared sample. `None` means undefined (shown as NA).
    pub fn compute(&self, sample: &Sample) -> Option<f64> {
        if sample.is_empty() {
            return match self {
                Measure::Count => Some(0.0),
                _ => None,
            };
        }

        match self {
            Measure::Count => Some(sample.len() as f64),
            Measure::Mean => Some(sample.mean),
            Measure::Median | Measure::Q2 => sample.quantile(0.5),
            Measure::Mode => sample.mode(),
            Measure::Range => Some(sample.max() - sample.min()),
            Measure::Variance => sample.variance(),
            Measure::StdDev => sample.std_dev(),
            Measure::Skewness => sample.skewness(),
            Measure::Kurtosis => sample.kurtosis(),
            Measure::Max => Some(sample.max()),
            Measure::Min => Some(sample.min()),
            Measure::CoefficientOfVariation => {
                let std = sample.std_dev()?;
                if sample.mean == 0.0 {
                    None
                } else {
                    Some(std / sample.mean)
                }
            }
            Measure::Q1 => sample.quantile(0.25),
            Measure::Q3 => sample.quantile(0.75),
            Measure::Iqr => Some(sample.quantile(0.75)? - sample.quantile(0.25)?),
            Measure::QuartileDeviation => {
                Some((sample.quantile(0.75)? - sample.quantile(0.25)?) / 2.0)
            }
            Measure::MeanAbsoluteDeviation => {
                let n = sample.len() as f64;
                Some(sample.sorted.iter().map(|v| (v - sample.mean).abs()).sum::<f64>() / n)
            }
        }
    }
}

/// Non-missing values of a column, sorted once for the order statistics.
#[derive(Debug, Clone)]
pub struct Sample {
    sorted: Vec<f64>,
    mean: f64,
}

impl Sample {
    /// Build from raw values, dropping NaN.
    pub fn new(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);
        let mean = if sorted.is_empty() {
            f64::NAN
        } else {
            sorted.iter().sum::<f64>() / sorted.len() as f64
        };
        Self { sorted, mean }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    pub fn min(&self) -> f64 {
        self.sorted.first().copied().unwrap_or(f64::NAN)
    }

    pub fn max(&self) -> f64 {
        self.sorted.last().copied().unwrap_or(f64::NAN)
    }

    pub fn quantile(&self, q: f64) -> Option<f64> {
        quantile_sorted(&self.sorted, q)
    }

    /// Sample variance (n - 1 denominator).
    pub fn variance(&self) -> Option<f64> {
        let n = self.sorted.len();
        if n < 2 {
            return None;
        }
        Some(self.central_moment_sum(2) / (n - 1) as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Biased Fisher-Pearson skewness.
    pub fn skewness(&self) -> Option<f64> {
        let n = self.sorted.len() as f64;
        let m2 = self.central_moment_sum(2) / n;
        if self.is_flat(m2) {
            return None;
        }
        let m3 = self.central_moment_sum(3) / n;
        Some(m3 / m2.powf(1.5))
    }

    /// Biased excess kurtosis (normal distribution = 0).
    pub fn kurtosis(&self) -> Option<f64> {
        let n = self.sorted.len() as f64;
        let m2 = self.central_moment_sum(2) / n;
        if self.is_flat(m2) {
            return None;
        }
        let m4 = self.central_moment_sum(4) / n;
        Some(m4 / (m2 * m2) - 3.0)
    }

    /// Most frequent value; ties go to the smallest.
    pub fn mode(&self) -> Option<f64> {
        let mut best: Option<(f64, usize)> = None;
        for run in self.sorted.chunk_by(|a, b| a == b) {
            if best.map_or(true, |(_, count)| run.len() > count) {
                best = Some((run[0], run.len()));
            }
        }
        best.map(|(value, _)| value)
    }

    /// Second moment indistinguishable from rounding noise relative to the mean.
    fn is_flat(&self, m2: f64) -> bool {
        m2 <= (1e-15 * self.mean).powi(2)
    }

    fn central_moment_sum(&self, power: i32) -> f64 {
        self.sorted.iter().map(|v| (v - self.mean).powi(power)).sum()
    }
}

/// Linear-interpolation quantile on sorted data.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Format a measure value for previews.
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        Some(v) => format!("{v}"),
        None => "NA".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn sample() -> Sample {
        Sample::new(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
    }

    #[test]
    fn location_measures() {
        let s = sample();
        assert!(close(Measure::Count.compute(&s), 8.0));
        assert!(close(Measure::Mean.compute(&s), 5.0));
        assert!(close(Measure::Median.compute(&s), 4.5));
        assert!(close(Measure::Mode.compute(&s), 4.0));
        assert!(close(Measure::Min.compute(&s), 2.0));
        assert!(close(Measure::Max.compute(&s), 9.0));
        assert!(close(Measure::Range.compute(&s), 7.0));
    }

    #[test]
    fn spread_measures_use_sample_variance() {
        let s = sample();
        // sum of squared deviations is 32
        assert!(close(Measure::Variance.compute(&s), 32.0 / 7.0));
        assert!(close(Measure::StdDev.compute(&s), (32.0_f64 / 7.0).sqrt()));
        assert!(close(
            Measure::CoefficientOfVariation.compute(&s),
            (32.0_f64 / 7.0).sqrt() / 5.0
        ));
        assert!(close(Measure::MeanAbsoluteDeviation.compute(&s), 1.5));
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let s = Sample::new(&[1.0, 2.0, 3.0, 4.0]);
        assert!(close(Measure::Q1.compute(&s), 1.75));
        assert!(close(Measure::Q2.compute(&s), 2.5));
        assert!(close(Measure::Q3.compute(&s), 3.25));
        assert!(close(Measure::Iqr.compute(&s), 1.5));
        assert!(close(Measure::QuartileDeviation.compute(&s), 0.75));
    }

    #[test]
    fn shape_measures_are_biased_estimators() {
        let s = Sample::new(&[1.0, 2.0, 3.0, 10.0]);
        // mean 4, m2 = 12.5, m3 = 45, m4 = 348.5
        let m2: f64 = 12.5;
        assert!(close(Measure::Skewness.compute(&s), 45.0 / m2.powf(1.5)));
        assert!(close(Measure::Kurtosis.compute(&s), 348.5 / (m2 * m2) - 3.0));

        let symmetric = Sample::new(&[1.0, 2.0, 3.0]);
        assert!(close(Measure::Skewness.compute(&symmetric), 0.0));
        assert!(close(Measure::Kurtosis.compute(&symmetric), -1.5));
    }

    #[test]
    fn constant_column_has_undefined_shape_and_zero_spread() {
        let s = Sample::new(&[3.0, 3.0, 3.0]);
        assert_eq!(Measure::Skewness.compute(&s), None);
        assert_eq!(Measure::Kurtosis.compute(&s), None);
        assert!(close(Measure::Variance.compute(&s), 0.0));
        assert!(close(Measure::Mode.compute(&s), 3.0));
    }

    #[test]
    fn shape_measures_do_not_depend_on_scale() {
        let tiny = Sample::new(&[1e-9, 2e-9, 4e-9]);
        let unit = Sample::new(&[1.0, 2.0, 4.0]);
        let skew = Measure::Skewness.compute(&unit).unwrap();
        let kurt = Measure::Kurtosis.compute(&unit).unwrap();
        assert!(Measure::Skewness.compute(&tiny).is_some_and(|v| (v - skew).abs() < 1e-6));
        assert!(Measure::Kurtosis.compute(&tiny).is_some_and(|v| (v - kurt).abs() < 1e-6));

        let flat = Sample::new(&[0.1, 0.1, 0.1]);
        assert_eq!(Measure::Skewness.compute(&flat), None);
    }

    #[test]
    fn degenerate_inputs_yield_na() {
        let empty = Sample::new(&[]);
        assert!(close(Measure::Count.compute(&empty), 0.0));
        for m in Measure::ALL.iter().filter(|m| **m != Measure::Count) {
            assert_eq!(m.compute(&empty), None, "{m:?}");
        }

        let single = Sample::new(&[4.0]);
        assert_eq!(Measure::Variance.compute(&single), None);
        assert_eq!(Measure::StdDev.compute(&single), None);
        assert!(close(Measure::Median.compute(&single), 4.0));

        let zero_mean = Sample::new(&[-1.0, 1.0]);
        assert_eq!(Measure::CoefficientOfVariation.compute(&zero_mean), None);
    }

    #[test]
    fn nan_values_are_dropped() {
        let s = Sample::new(&[1.0, f64::NAN, 3.0]);
        assert_eq!(s.len(), 2);
        assert!(close(Measure::Mean.compute(&s), 2.0));
    }

    #[test]
    fn mode_prefers_smallest_on_ties() {
        let s = Sample::new(&[5.0, 1.0, 5.0, 1.0, 3.0]);
        assert!(close(Measure::Mode.compute(&s), 1.0));
    }

    #[test]
    fn export_names_are_short() {
        assert_eq!(Measure::CoefficientOfVariation.column_name(), "CV");
        assert_eq!(Measure::QuartileDeviation.column_name(), "QD");
        assert_eq!(Measure::Mean.column_name(), "Mean");
    }

    #[test]
    fn values_format_with_requested_precision() {
        assert_eq!(format_value(Some(1.23456), 2), "1.23");
        assert_eq!(format_value(None, 4), "NA");
        assert_eq!(format_value(Some(f64::INFINITY), 4), "inf");
    }
}
