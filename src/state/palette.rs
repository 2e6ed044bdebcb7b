/// The seaborn "pastel" palette, cycled per selected column.
pub const PASTEL: [[u8; 3]; 10] = [
    [161, 201, 244], // blue
    [255, 180, 130], // orange
    [141, 229, 161], // green
    [255, 159, 155], // red
    [208, 187, 255], // purple
    [222, 187, 155], // brown
    [250, 176, 228], // pink
    [207, 207, 207], // grey
    [255, 254, 163], // yellow
    [185, 242, 240], // cyan
];

/// ColorBrewer RdYlGn, red (-1) through yellow (0) to green (+1).
const RD_YL_GN: [[u8; 3]; 11] = [
    [165, 0, 38],
    [215, 48, 39],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 139],
    [255, 255, 191],
    [217, 239, 139],
    [166, 217, 106],
    [102, 189, 99],
    [26, 152, 80],
    [0, 104, 55],
];

pub fn pastel(index: usize) -> [u8; 3] {
    PASTEL[index % PASTEL.len()]
}

/// A slightly darker shade for outlines drawn on top of a pastel fill.
pub fn darken(color: [u8; 3], factor: f32) -> [u8; 3] {
    color.map(|c| (c as f32 * factor).round().clamp(0.0, 255.0) as u8)
}

/// Heatmap colour for a correlation in [-1, 1].
pub fn correlation_color(r: f64) -> [u8; 3] {
    let t = ((r.clamp(-1.0, 1.0) + 1.0) / 2.0) * (RD_YL_GN.len() - 1) as f64;
    let lower = t.floor() as usize;
    let upper = (lower + 1).min(RD_YL_GN.len() - 1);
    let frac = t - lower as f64;
    let (a, b) = (RD_YL_GN[lower], RD_YL_GN[upper]);
    std::array::from_fn(|i| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8)
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_text(background: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = background.map(f64::from);
    let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
    if luminance > 140.0 {
        [0, 0, 0]
    } else {
        [255, 255, 255]
    }
}
