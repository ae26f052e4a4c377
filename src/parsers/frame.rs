//! # 探测器图像加载
//!
//! 读取灰度 PNG/TIFF 为 `[行, 列]` 的计数数组。
//!
//! ## 像素格式
//! - 8/16 位灰度：原样保留计数
//! - 其他格式：先转换为 16 位灰度
//!
//! ## 方向
//! 先转置（相机输出为 宽 × 高 时），再左右翻转（偏转方向为从右到左时）。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `image`, `ndarray`

use crate::error::{EspecError, Result};

use image::DynamicImage;
use ndarray::{s, Array2};
use std::path::Path;

/// 帧方向修正
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOrientation {
    /// 左右翻转（列反序）
    pub flip: bool,
    /// 转置（行列互换）
    pub transpose: bool,
}

/// 加载图像文件并修正方向
pub fn load_frame(path: &Path, orientation: FrameOrientation) -> Result<Array2<f64>> {
    if !path.is_file() {
        return Err(EspecError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let img = image::open(path)?;
    let frame = image_to_array(img)?;
    Ok(orient(frame, orientation))
}

/// 将解码后的图像转换为计数数组
pub fn image_to_array(img: DynamicImage) -> Result<Array2<f64>> {
    let (width, height, data): (u32, u32, Vec<f64>) = match img {
        DynamicImage::ImageLuma8(buf) => (
            buf.width(),
            buf.height(),
            buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        ),
        DynamicImage::ImageLuma16(buf) => (
            buf.width(),
            buf.height(),
            buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
        ),
        other => {
            let buf = other.into_luma16();
            (
                buf.width(),
                buf.height(),
                buf.as_raw().iter().map(|&v| f64::from(v)).collect(),
            )
        }
    };

    Array2::from_shape_vec((height as usize, width as usize), data)
        .map_err(|e| EspecError::Other(format!("image buffer shape: {e}")))
}

/// 按方向修正帧
pub fn orient(frame: Array2<f64>, orientation: FrameOrientation) -> Array2<f64> {
    let frame = if orientation.transpose {
        frame.reversed_axes().as_standard_layout().into_owned()
    } else {
        frame
    };
    if orientation.flip {
        frame.slice(s![.., ..;-1]).to_owned()
    } else {
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    #[test]
    fn test_orient_flip_and_transpose() {
        let frame = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let flipped = orient(
            frame.clone(),
            FrameOrientation {
                flip: true,
                transpose: false,
            },
        );
        assert_eq!(flipped.row(0).to_vec(), vec![3.0, 2.0, 1.0]);

        let both = orient(
            frame,
            FrameOrientation {
                flip: true,
                transpose: true,
            },
        );
        assert_eq!(both.dim(), (3, 2));
        assert_eq!(both.row(0).to_vec(), vec![4.0, 1.0]);
        assert_eq!(both.row(2).to_vec(), vec![6.0, 3.0]);
    }

    #[test]
    fn test_load_16bit_png_keeps_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot_0003.png");
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(4, 2, |x, y| Luma([(1000 * y + x) as u16]));
        img.save(&path).unwrap();

        let frame = load_frame(&path, FrameOrientation::default()).unwrap();
        assert_eq!(frame.dim(), (2, 4));
        assert_eq!(frame[[1, 3]], 1003.0);
        assert_eq!(frame[[0, 0]], 0.0);
    }

    #[test]
    fn test_load_8bit_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let img = image::GrayImage::from_fn(3, 3, |x, _| Luma([x as u8 * 10]));
        img.save(&path).unwrap();

        let frame = load_frame(
            &path,
            FrameOrientation {
                flip: true,
                transpose: false,
            },
        )
        .unwrap();
        assert_eq!(frame.row(0).to_vec(), vec![20.0, 10.0, 0.0]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_frame(Path::new("/nonexistent/frame.tiff"), FrameOrientation::default()),
            Err(EspecError::FileNotFound { .. })
        ));
    }
}
