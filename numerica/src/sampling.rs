/// `points` evenly spaced values covering `[start, end]`, both ends included.
/// Fewer than two points collapse to `[start]`.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![start];
    }
    let step = (end - start) / (points - 1) as f64;
    (0..points)
        .map(|i| if i == points - 1 { end } else { start + step * i as f64 })
        .collect()
}
