// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/model.rs - 模型
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

use crate::tensor::{ChwTensor, OutputTensor};

/// 模型前向传播能力。
///
/// 实现方持有并校验自己的推理引擎，本库只消费其输出张量，
/// 形状校验在解码时完成。
pub trait Model {
  type Error: std::error::Error + 'static;

  fn forward(&self, input: &ChwTensor) -> Result<OutputTensor, Self::Error>;
}

/// 边界框，左上角坐标与宽高，单位为像素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl Rect {
  pub fn right(&self) -> i32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> i32 {
    self.y + self.height
  }
}

/// 检测结果，边界框为原图像素坐标
#[derive(Debug, Clone)]
pub struct Detection {
  pub rect: Rect,
  pub score: f32,
  pub class_id: usize,
}

#[derive(Debug, Clone)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

#[cfg(feature = "model_replay")]
mod replay;
#[cfg(feature = "model_replay")]
pub use self::replay::{ReplayModel, ReplayModelError};
