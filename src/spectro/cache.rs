//! # 坐标映射缓存
//!
//! 持有会话的标定曲线、参考模式和几何参数，并缓存当前帧尺寸对应的
//! [`AxisMapping`]。帧尺寸变化时整体重建并替换 `Arc`，从不原地修改，
//! 并发读者看到的总是完整的旧映射或完整的新映射。
//!
//! ## 依赖关系
//! - 被 `spectro/pipeline.rs` 和 `commands/` 使用
//! - 使用 `spectro/axis.rs`

use crate::error::{EspecError, Result};
use crate::models::{CalibrationCurve, FrameGeometry, ReferencingMode};
use crate::spectro::axis::AxisMapping;

use log::{debug, info};
use std::sync::{Arc, RwLock};

/// 按帧尺寸缓存的坐标映射
#[derive(Debug)]
pub struct AxisCache {
    calibration: Arc<CalibrationCurve>,
    mode: ReferencingMode,
    geometry: FrameGeometry,
    current: RwLock<Option<Arc<AxisMapping>>>,
}

impl AxisCache {
    /// 创建缓存，立即检查几何参数
    pub fn new(
        calibration: Arc<CalibrationCurve>,
        mode: ReferencingMode,
        geometry: FrameGeometry,
    ) -> Result<Self> {
        geometry.validate()?;
        if let ReferencingMode::RefPoint { energy_mev, .. } = mode {
            if calibration.interpolate_position_at_energy(energy_mev).is_none() {
                return Err(EspecError::ReferenceOutOfRange { energy_mev });
            }
        }
        Ok(Self {
            calibration,
            mode,
            geometry,
            current: RwLock::new(None),
        })
    }

    /// 获取 `width` × `height` 帧的映射，尺寸变化时重建
    pub fn get_or_build(&self, width: usize, height: usize) -> Result<Arc<AxisMapping>> {
        if let Some(mapping) = self.cached(width, height)? {
            return Ok(mapping);
        }

        let mapping = Arc::new(AxisMapping::build(
            width,
            height,
            &self.calibration,
            &self.mode,
            &self.geometry,
        )?);

        let mut slot = self
            .current
            .write()
            .map_err(|_| EspecError::Other("axis cache lock poisoned".to_string()))?;
        // 其他线程可能已构建相同尺寸的映射
        if let Some(existing) = slot.as_ref() {
            if existing.width == width && existing.height == height {
                debug!("axis mapping for {height}x{width} already rebuilt by another worker");
                return Ok(Arc::clone(existing));
            }
        }
        info!(
            "rebuilt axis mapping for {}x{} frame ({} energy bins)",
            height,
            width,
            mapping.energy.len()
        );
        *slot = Some(Arc::clone(&mapping));
        Ok(mapping)
    }

    /// 当前缓存的映射（不论尺寸）
    pub fn current(&self) -> Option<Arc<AxisMapping>> {
        self.current.read().ok().and_then(|slot| slot.clone())
    }

    pub fn calibration(&self) -> &CalibrationCurve {
        &self.calibration
    }

    pub fn mode(&self) -> &ReferencingMode {
        &self.mode
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    fn cached(&self, width: usize, height: usize) -> Result<Option<Arc<AxisMapping>>> {
        let slot = self
            .current
            .read()
            .map_err(|_| EspecError::Other("axis cache lock poisoned".to_string()))?;
        Ok(slot
            .as_ref()
            .filter(|m| m.width == width && m.height == height)
            .cloned())
    }
}
