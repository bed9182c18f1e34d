// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/preprocess.rs - 输入张量准备
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{Rgb, RgbImage, imageops};
use tracing::debug;

use crate::{letterbox::LetterboxPlan, tensor::ChwTensor};

/// 按缩放计划把图像准备成模型输入张量。
///
/// 图像先用三角过滤缩放到计划的缩放尺寸，再以 `pad_color` 补边到画布尺寸，
/// 像素值归一化到 `[0, 1]` 并重排为通道平面 (channel, row, column) 布局。
/// 张量的通道顺序与输入图像一致。
pub fn preprocess(image: &RgbImage, plan: &LetterboxPlan, pad_color: [u8; 3]) -> ChwTensor {
  let (resized_w, resized_h) = plan.resized;
  let resized = imageops::resize(image, resized_w, resized_h, imageops::FilterType::Triangle);

  let (target_w, target_h) = plan.target;
  let mut canvas = RgbImage::from_pixel(target_w, target_h, Rgb(pad_color));
  imageops::replace(
    &mut canvas,
    &resized,
    plan.pad_left as i64,
    plan.pad_top as i64,
  );

  debug!(
    "输入张量: {}x{} -> 3x{}x{}",
    image.width(),
    image.height(),
    target_h,
    target_w
  );

  // HWC -> CHW 重排, 布局错误会悄悄破坏所有下游几何
  let mut tensor = ChwTensor::with_shape(target_h as usize, target_w as usize);
  let width = target_w as usize;
  let plane = (target_h as usize) * width;
  let data = tensor.as_mut();
  for y in 0..target_h {
    for x in 0..target_w {
      let pixel = canvas.get_pixel(x, y);
      let index = (y as usize) * width + (x as usize);
      for c in 0..3 {
        data[c * plane + index] = pixel[c] as f32 / 255.0;
      }
    }
  }

  tensor
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn preprocess_produces_planar_normalized_tensor() {
    // 4x2 图像, 目标 4x4: 系数 1.0, 缩放尺寸不变, 上下各补 1 行
    let mut image = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
    image.put_pixel(1, 0, Rgb([255, 0, 0]));
    image.put_pixel(2, 1, Rgb([0, 255, 0]));

    let plan = LetterboxPlan::new((4, 2), (4, 4), 32, false, false).unwrap();
    assert_eq!(plan.resized, (4, 2));
    assert_eq!(plan.pad_top, 1);

    let tensor = preprocess(&image, &plan, [114, 114, 114]);
    assert_eq!(tensor.height(), 4);
    assert_eq!(tensor.width(), 4);
    assert_eq!(tensor.as_slice().len(), 3 * 4 * 4);

    let pad = 114.0 / 255.0;
    // 首行与末行是补边
    for c in 0..3 {
      for x in 0..4 {
        assert!((tensor.at(c, 0, x) - pad).abs() < 1e-6);
        assert!((tensor.at(c, 3, x) - pad).abs() < 1e-6);
      }
    }

    // 红色像素 (1, 0) 落到画布 (1, 1), 只出现在通道 0 的平面里
    assert!((tensor.at(0, 1, 1) - 1.0).abs() < 0.02);
    assert!(tensor.at(1, 1, 1) < 0.02);
    assert!(tensor.at(2, 1, 1) < 0.02);

    // 绿色像素 (2, 1) 落到画布 (2, 2)
    assert!(tensor.at(0, 2, 2) < 0.02);
    assert!((tensor.at(1, 2, 2) - 1.0).abs() < 0.02);
  }

  #[test]
  fn preprocess_downscales_to_plan_size() {
    let image = RgbImage::from_pixel(1280, 720, Rgb([255, 255, 255]));
    let plan = LetterboxPlan::new((1280, 720), (640, 640), 32, false, false).unwrap();
    let tensor = preprocess(&image, &plan, [114, 114, 114]);
    assert_eq!(tensor.height(), 640);
    assert_eq!(tensor.width(), 640);

    let pad = 114.0 / 255.0;
    // 顶部补边区 (前 140 行) 与图像区各取一点
    assert!((tensor.at(0, 0, 320) - pad).abs() < 1e-6);
    assert!((tensor.at(0, 320, 320) - 1.0).abs() < 0.02);
  }
}
