//! # 能谱图表生成
//!
//! 使用 `plotters` 库生成 dN/dE 能谱曲线和能量 - 角度二维图。
//!
//! ## 功能
//! - dN/dE 曲线，支持 PNG 和 SVG 输出，可标出特征窗口
//! - 标定图像热图（flame 色标），PNG 输出
//!
//! ## 依赖关系
//! - 被 `commands/deconvolve.rs` 调用
//! - 使用 `spectro/axis.rs`, `spectro/integrate.rs` 的结果
//! - 使用 `plotters` 渲染图表

use crate::error::{EspecError, Result};
use crate::models::FeatureRecord;
use crate::spectro::axis::AxisMapping;
use crate::spectro::features::EnergyBounds;
use crate::spectro::resample::CalibratedFrame;

use plotters::prelude::*;
use std::path::Path;

/// 热图每个方向最多绘制的格数
const MAX_CELLS: usize = 400;

/// 能谱图参数
pub struct SpectrumPlot<'a> {
    pub energy: &'a [f64],
    pub values: &'a [f64],
    pub features: Option<&'a FeatureRecord>,
    pub bounds: Option<EnergyBounds>,
    pub title: &'a str,
}

/// 生成 dN/dE 能谱图
pub fn generate_spectrum_plot(
    plot: &SpectrumPlot<'_>,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_spectrum_chart(&root, plot)?;
        root.present().map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_spectrum_chart(&root, plot)?;
        root.present().map_err(plot_error)?;
    }
    Ok(())
}

/// 绘制能谱曲线
fn draw_spectrum_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    plot: &SpectrumPlot<'_>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_error)?;

    let x_min = plot.energy.first().copied().unwrap_or(0.0);
    let x_max = plot.energy.last().copied().unwrap_or(1.0).max(x_min + 1e-6);
    let y_max = plot.values.iter().copied().fold(0.0_f64, f64::max);
    let y_min = plot.values.iter().copied().fold(0.0_f64, f64::min);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(plot.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_top)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Energy (MeV)")
        .y_desc("dN/dE (pC/MeV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .y_label_formatter(&|v| format!("{:.2e}", v))
        .draw()
        .map_err(plot_error)?;

    // 特征窗口
    if let Some((low, high)) = plot.bounds {
        let band = RGBColor(255, 153, 0).mix(0.12);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(low.max(x_min), y_min), (high.min(x_max), y_top)],
                band.filled(),
            )))
            .map_err(plot_error)?;
    }

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(AreaSeries::new(
            plot.energy.iter().zip(plot.values).map(|(x, y)| (*x, *y)),
            0.0,
            line_color.mix(0.2),
        ))
        .map_err(plot_error)?;
    chart
        .draw_series(LineSeries::new(
            plot.energy.iter().zip(plot.values).map(|(x, y)| (*x, *y)),
            line_color.stroke_width(2),
        ))
        .map_err(plot_error)?;

    if let Some(features) = plot.features {
        let mean = features.mean_energy;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(mean, y_min), (mean, y_top)],
                RED.stroke_width(1),
            )))
            .map_err(plot_error)?;

        let text = format!(
            "shot {}: <E> = {:.2} MeV, σ = {:.2} MeV",
            features.shot_number, features.mean_energy, features.std_energy
        );
        chart
            .draw_series(std::iter::once(Text::new(
                text,
                (x_min + 0.02 * (x_max - x_min), y_top * 0.95),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(plot_error)?;
    }

    Ok(())
}

/// 生成标定图像热图 (PNG)
pub fn generate_image_plot(
    mapping: &AxisMapping,
    image: &CalibratedFrame,
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let (rows, cols) = image.dim();
    let (e_min, e_max) = mapping.energy_range();
    let a_min = mapping.angle.first().copied().unwrap_or(-0.5);
    let a_max = mapping.angle.last().copied().unwrap_or(0.5).max(a_min + 1e-6);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(e_min..e_max, a_min..a_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Energy (MeV)")
        .y_desc("Angle (mrad)")
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_error)?;

    let lo = image.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = image.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let row_step = rows.div_ceil(MAX_CELLS).max(1);
    let col_step = cols.div_ceil(MAX_CELLS).max(1);
    let de = (e_max - e_min) / cols.max(1) as f64 * col_step as f64;
    let da = (a_max - a_min) / rows.max(1) as f64 * row_step as f64;

    let cells = (0..rows).step_by(row_step).flat_map(|r| {
        (0..cols).step_by(col_step).map(move |c| (r, c))
    });
    chart
        .draw_series(cells.map(|(r, c)| {
            let e = mapping.energy[c];
            let a = mapping.angle[r];
            let t = (image[[r, c]] - lo) / span;
            Rectangle::new(
                [(e - de / 2.0, a - da / 2.0), (e + de / 2.0, a + da / 2.0)],
                flame(t).filled(),
            )
        }))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// flame 色标：黑 → 红 → 黄 → 白
fn flame(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(channel(t * 3.0), channel(t * 3.0 - 1.0), channel(t * 3.0 - 2.0))
}

fn plot_error<E: std::fmt::Debug>(e: E) -> EspecError {
    EspecError::PlotError(format!("{:?}", e))
}
