//! # 一维线性插值
//!
//! 所有插值操作共用的底层原语。要求 `xs` 严格升序。
//!
//! ## 边界行为
//! - [`interp`]：定义域之外返回 `None`（显式"未定义"，不使用 NaN）
//! - [`interp_clamped`]：定义域之外取端点值（用于图像重采样）
//!
//! ## 依赖关系
//! - 被 `models/calibration.rs` 和 `spectro/resample.rs` 使用

/// 在升序 `xs` 上对 `ys` 做线性插值，`x` 超出 `[xs[0], xs[n-1]]` 时返回 `None`
pub fn interp(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let (first, last) = (*xs.first()?, *xs.last()?);
    if !x.is_finite() || x < first || x > last {
        return None;
    }
    Some(segment_value(xs, ys, x))
}

/// 在升序 `xs` 上对 `ys` 做线性插值，定义域之外取最近端点值
///
/// 空输入返回 `None`。
pub fn interp_clamped(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let (first, last) = (*xs.first()?, *xs.last()?);
    if x <= first {
        return ys.first().copied();
    }
    if x >= last {
        return ys.last().copied();
    }
    Some(segment_value(xs, ys, x))
}

/// 二分查找 `x` 所在区间并线性插值（调用方保证 `x` 在定义域内）
fn segment_value(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    // 第一个满足 xs[i] > x 的位置
    let upper = xs.partition_point(|&v| v <= x);
    if upper == 0 {
        return ys[0];
    }
    if upper >= xs.len() {
        return ys[xs.len() - 1];
    }

    let lower = upper - 1;
    let (x0, x1) = (xs[lower], xs[upper]);
    let (y0, y1) = (ys[lower], ys[upper]);
    let dx = x1 - x0;
    if dx == 0.0 {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / dx
}

/// 生成 `[start, end]` 上 `n` 个等间距点（包含两端点）
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            // 端点精确取值，避免累积误差
            values[n - 1] = end;
            values
        }
    }
}

/// 最近值索引：使 `|data[i] - value|` 最小的 `i`（相等时取较小索引）
pub fn nearest_index(data: &[f64], value: f64) -> Option<usize> {
    data.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| {
            let dist = (v - value).abs();
            match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((i, dist)),
            }
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp_inside_and_outside() {
        let xs = [0.0, 1.0, 3.0];
        let ys = [0.0, 10.0, 30.0];

        assert_eq!(interp(&xs, &ys, 0.5), Some(5.0));
        assert_eq!(interp(&xs, &ys, 2.0), Some(20.0));
        assert_eq!(interp(&xs, &ys, 3.0), Some(30.0));
        assert_eq!(interp(&xs, &ys, -0.1), None);
        assert_eq!(interp(&xs, &ys, 3.1), None);
        assert_eq!(interp(&xs, &ys, f64::NAN), None);
    }

    #[test]
    fn test_interp_clamped_edges() {
        let xs = [1.0, 2.0];
        let ys = [4.0, 8.0];

        assert_eq!(interp_clamped(&xs, &ys, 0.0), Some(4.0));
        assert_eq!(interp_clamped(&xs, &ys, 5.0), Some(8.0));
        assert_eq!(interp_clamped(&xs, &ys, 1.5), Some(6.0));
        assert_eq!(interp_clamped(&[], &[], 1.0), None);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(1.0, 20.0, 39);
        assert_eq!(v.len(), 39);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[38], 20.0);
        assert!((v[1] - 1.5).abs() < 1e-12);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_nearest_index() {
        let axis = [0.0, 5.0, 10.0, 15.0, 20.0];
        assert_eq!(nearest_index(&axis, 5.0), Some(1));
        assert_eq!(nearest_index(&axis, 14.0), Some(3));
        assert_eq!(nearest_index(&axis, 100.0), Some(4));
        // 等距时取较小索引
        assert_eq!(nearest_index(&axis, 7.5), Some(1));
        assert_eq!(nearest_index(&[], 1.0), None);
    }
}
