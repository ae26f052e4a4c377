//! # 会话配置
//!
//! 将命令行参数组装成一个已校验的会话：标定曲线、参考模式、几何参数、
//! 分析窗口和帧方向。所有配置错误在处理第一帧之前报告。
//!
//! ## 依赖关系
//! - 被 `commands/deconvolve.rs`, `commands/calib.rs`, `commands/serve.rs` 使用
//! - 使用 `cli/session.rs` 的参数定义
//! - 使用 `parsers/` 和 `spectro/`

use crate::cli::session::{GeometryArgs, WindowArgs};
use crate::error::{EspecError, Result};
use crate::models::{CalibrationCurve, FrameGeometry, ReferencingMode, RowRange};
use crate::parsers::{self, FrameOrientation};
use crate::spectro::{process_frame, AnalysisWindow, AxisCache, EnergyBounds, ProcessedFrame};

use log::debug;
use std::path::Path;
use std::sync::Arc;

/// 已校验的处理会话
pub struct SessionConfig {
    pub cache: Arc<AxisCache>,
    pub window: AnalysisWindow,
    pub orientation: FrameOrientation,
}

impl SessionConfig {
    /// 读取标定表并校验全部参数
    pub fn build(calibration: &Path, geometry: &GeometryArgs, window: &WindowArgs) -> Result<Self> {
        let curve = Arc::new(parsers::parse_calibration_file(calibration)?);
        let (mode, frame_geometry) = parse_geometry(geometry)?;
        let cache = Arc::new(AxisCache::new(curve, mode, frame_geometry)?);
        let (window, orientation) = parse_window(window)?;
        debug!("session window: {:?}, orientation: {:?}", window, orientation);

        Ok(Self {
            cache,
            window,
            orientation,
        })
    }

    /// 加载并处理一帧；文件名无编号时以 `fallback_shot` 作为发次
    pub fn process_path(&self, path: &Path, fallback_shot: u64) -> Result<ProcessedFrame> {
        let frame = parsers::load_frame(path, self.orientation)?;
        let shot = parsers::shot_number_from_path(path).unwrap_or(fallback_shot);
        process_frame(&self.cache, frame.view(), &self.window, shot)
    }

    pub fn calibration(&self) -> &CalibrationCurve {
        self.cache.calibration()
    }
}

/// 解析参考模式与几何参数
pub fn parse_geometry(args: &GeometryArgs) -> Result<(ReferencingMode, FrameGeometry)> {
    let point = parse_pair(&args.ref_point)?;
    let mode = ReferencingMode::from_name(&args.ref_mode, point)?;
    let geometry = FrameGeometry {
        pixel_per_mm: args.pixel_per_mm,
        mrad_per_pix: args.mrad_per_pix,
        spacing: args.spacing,
        pc_per_count: args.pc_per_count,
    };
    geometry.validate()?;
    Ok((mode, geometry))
}

/// 解析分析窗口与帧方向
fn parse_window(args: &WindowArgs) -> Result<(AnalysisWindow, FrameOrientation)> {
    let data_rows = RowRange::parse(&args.data_rows)?;
    let background_rows = RowRange::parse(&args.background_rows)?;
    let energy_bounds = match (&args.energy_bounds, args.no_bounds) {
        (Some(text), false) => Some(parse_bounds(text)?),
        _ => None,
    };

    Ok((
        AnalysisWindow {
            data_rows,
            background_rows,
            energy_bounds,
        },
        FrameOrientation {
            flip: !args.no_flip,
            transpose: args.transpose,
        },
    ))
}

/// 解析 "a,b" 形式的参考点
fn parse_pair(text: &str) -> Result<(f64, f64)> {
    let invalid = || EspecError::InvalidConfig(format!("reference point must be 'a,b', got '{text}'"));
    let (a, b) = text.split_once(',').ok_or_else(invalid)?;
    let a = a.trim().parse().map_err(|_| invalid())?;
    let b = b.trim().parse().map_err(|_| invalid())?;
    Ok((a, b))
}

/// 解析 "15-100" 形式的能量窗口 (MeV)
///
/// 下限可为负数，如 "-5-10"；分隔符取首字符之后的第一个 '-'。
fn parse_bounds(text: &str) -> Result<EnergyBounds> {
    let invalid = || EspecError::InvalidRange(text.to_string());
    let trimmed = text.trim();
    let (split, _) = trimmed
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .ok_or_else(invalid)?;
    let (low, high) = (&trimmed[..split], &trimmed[split + 1..]);
    let low: f64 = low.trim().parse().map_err(|_| invalid())?;
    let high: f64 = high.trim().parse().map_err(|_| invalid())?;
    if !(low.is_finite() && high.is_finite()) {
        return Err(invalid());
    }
    Ok((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry_args(mode: &str, point: &str) -> GeometryArgs {
        GeometryArgs {
            spacing: 0.5,
            pixel_per_mm: 20.408,
            mrad_per_pix: 0.1,
            pc_per_count: 4.33e-6,
            ref_mode: mode.to_string(),
            ref_point: point.to_string(),
        }
    }

    fn window_args() -> WindowArgs {
        WindowArgs {
            data_rows: "600-670".to_string(),
            background_rows: "750-850".to_string(),
            energy_bounds: Some("15-100".to_string()),
            no_bounds: false,
            no_flip: false,
            transpose: false,
        }
    }

    #[test]
    fn test_parse_geometry_modes() {
        let (mode, geometry) = parse_geometry(&geometry_args("zero", "1953,635")).unwrap();
        assert_eq!(
            mode,
            ReferencingMode::Zero {
                pixel_x: 1953.0,
                pixel_y: 635.0
            }
        );
        assert_eq!(geometry.spacing, 0.5);

        let (mode, _) = parse_geometry(&geometry_args("RefPoint", "70, 45.5")).unwrap();
        assert_eq!(
            mode,
            ReferencingMode::RefPoint {
                position_mm: 70.0,
                energy_mev: 45.5
            }
        );
    }

    #[test]
    fn test_parse_geometry_errors() {
        assert!(matches!(
            parse_geometry(&geometry_args("auto", "1,2")),
            Err(EspecError::UnknownReferencingMode(_))
        ));
        assert!(matches!(
            parse_geometry(&geometry_args("zero", "1;2")),
            Err(EspecError::InvalidConfig(_))
        ));

        let mut args = geometry_args("zero", "1,2");
        args.spacing = 0.0;
        assert!(matches!(parse_geometry(&args), Err(EspecError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_window() {
        let (window, orientation) = parse_window(&window_args()).unwrap();
        assert_eq!(window.data_rows, RowRange::new(600, 670));
        assert_eq!(window.background_rows, RowRange::new(750, 850));
        assert_eq!(window.energy_bounds, Some((15.0, 100.0)));
        assert!(orientation.flip);
        assert!(!orientation.transpose);

        let mut args = window_args();
        args.no_bounds = true;
        assert_eq!(parse_window(&args).unwrap().0.energy_bounds, None);

        args.data_rows = "600".to_string();
        assert!(matches!(parse_window(&args), Err(EspecError::InvalidRange(_))));
    }

    #[test]
    fn test_no_flip_disables_mirroring() {
        let mut args = window_args();
        args.no_flip = true;
        let (_, orientation) = parse_window(&args).unwrap();
        assert!(!orientation.flip);
    }

    #[test]
    fn test_parse_bounds_negative_low() {
        assert_eq!(parse_bounds("15-100").unwrap(), (15.0, 100.0));
        assert_eq!(parse_bounds("-5-10").unwrap(), (-5.0, 10.0));
        assert_eq!(parse_bounds("-5--1").unwrap(), (-5.0, -1.0));
        assert_eq!(parse_bounds(" 2.5 - 7 ").unwrap(), (2.5, 7.0));
        for bad in ["abc", "-5", "15-", "-", "1e999-2"] {
            assert!(
                matches!(parse_bounds(bad), Err(EspecError::InvalidRange(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_build_reports_config_errors_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.txt");
        std::fs::write(&path, "1 0.1 10\n10 0.2 20\n20 0.4 30\n").unwrap();

        let session = SessionConfig::build(&path, &geometry_args("zero", "0,0"), &window_args()).unwrap();
        assert_eq!(session.calibration().len(), 3);

        assert!(matches!(
            SessionConfig::build(&path, &geometry_args("refpoint", "50,500"), &window_args()),
            Err(EspecError::ReferenceOutOfRange { .. })
        ));
        assert!(matches!(
            SessionConfig::build(&dir.path().join("missing.txt"), &geometry_args("zero", "0,0"), &window_args()),
            Err(EspecError::FileNotFound { .. })
        ));
    }
}
