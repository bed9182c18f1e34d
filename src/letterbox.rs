// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/letterbox.rs - Letterbox 缩放计划与坐标逆映射
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

use thiserror::Error;
use tracing::debug;

use crate::model::Rect;

#[derive(Error, Debug)]
pub enum LetterboxError {
  #[error("图像尺寸无效: {0}")]
  InvalidInput(String),
}

/// 保持纵横比的缩放计划。
///
/// 记录把原始图像映射到固定目标尺寸所用的统一缩放系数与补边，
/// 之后 [`LetterboxPlan::map_back`] 用同一份数据把检测框映射回原图坐标。
/// 所有尺寸均为 (宽, 高)。
#[derive(Debug, Clone)]
pub struct LetterboxPlan {
  /// 两个轴共用的缩放系数
  pub gain: f32,
  /// 左侧补边像素数
  pub pad_left: i32,
  /// 顶部补边像素数
  pub pad_top: i32,
  /// 缩放后、补边前的尺寸
  pub resized: (u32, u32),
  /// 补边后的画布尺寸
  pub target: (u32, u32),
  /// 原始图像尺寸
  pub original: (u32, u32),
}

impl LetterboxPlan {
  /// 计算缩放计划。
  ///
  /// `pad_to_stride` 为 true 时补边量按 `stride` 取模缩减，
  /// 画布随之小于请求的目标尺寸；为 false 时补边到完整目标尺寸。
  /// `allow_upscale` 为 false 时缩放系数不超过 1.0，图像永不放大。
  pub fn new(
    original: (u32, u32),
    target: (u32, u32),
    stride: u32,
    allow_upscale: bool,
    pad_to_stride: bool,
  ) -> Result<Self, LetterboxError> {
    if original.0 == 0 || original.1 == 0 {
      return Err(LetterboxError::InvalidInput(format!(
        "原始图像尺寸为 {}x{}",
        original.0, original.1
      )));
    }
    if target.0 == 0 || target.1 == 0 {
      return Err(LetterboxError::InvalidInput(format!(
        "目标尺寸为 {}x{}",
        target.0, target.1
      )));
    }

    let mut gain = (target.1 as f32 / original.1 as f32).min(target.0 as f32 / original.0 as f32);
    if !allow_upscale {
      gain = gain.min(1.0);
    }

    let resized = (
      (original.0 as f32 * gain).round() as u32,
      (original.1 as f32 * gain).round() as u32,
    );

    let mut pad_w = target.0 - resized.0;
    let mut pad_h = target.1 - resized.1;
    if pad_to_stride && stride > 0 {
      pad_w %= stride;
      pad_h %= stride;
    }

    // 补边对半分到轴的两侧，左/上侧向下取整
    let pad_left = (pad_w / 2) as i32;
    let pad_top = (pad_h / 2) as i32;
    let target = (resized.0 + pad_w, resized.1 + pad_h);

    debug!(
      "缩放计划: {}x{} -> {}x{}, 系数 {:.4}, 补边 ({}, {})",
      original.0, original.1, target.0, target.1, gain, pad_left, pad_top
    );

    Ok(Self {
      gain,
      pad_left,
      pad_top,
      resized,
      target,
      original,
    })
  }

  /// 把 letterbox 坐标空间中的框映射回原图像素坐标。
  ///
  /// 坐标四舍五入到最近整数。x/y 与宽/高各自独立地裁剪到
  /// `[0, 原图尺寸]`: 宽高按整幅图像裁剪而不是按 `尺寸 - x` 裁剪，
  /// 因此裁剪后的框仍可能名义上越过图像边缘。
  pub fn map_back(&self, rect: Rect) -> Rect {
    let x = ((rect.x - self.pad_left) as f32 / self.gain).round() as i32;
    let y = ((rect.y - self.pad_top) as f32 / self.gain).round() as i32;
    let width = (rect.width as f32 / self.gain).round() as i32;
    let height = (rect.height as f32 / self.gain).round() as i32;

    let (orig_w, orig_h) = (self.original.0 as i32, self.original.1 as i32);
    Rect {
      x: x.clamp(0, orig_w),
      y: y.clamp(0, orig_h),
      width: width.clamp(0, orig_w),
      height: height.clamp(0, orig_h),
    }
  }
}
