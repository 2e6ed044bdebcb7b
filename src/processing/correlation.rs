/// Pairwise Pearson correlations between the columns of one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()` squared entries.
    values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    /// Compute from row-aligned columns. Each pair uses only the rows where
    /// both values are present. Returns `None` for fewer than two columns.
    pub fn compute(columns: &[(String, Vec<Option<f64>>)]) -> Option<Self> {
        if columns.len() < 2 {
            return None;
        }

        let n = columns.len();
        let mut values = vec![None; n * n];
        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    pearson(&columns[i].1, &columns[i].1).map(|_| 1.0)
                } else {
                    pearson(&columns[i].1, &columns[j].1)
                };
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        Some(Self {
            labels: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        })
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row * self.size() + col).copied().flatten()
    }
}

/// Pearson r over pairwise-complete observations.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
