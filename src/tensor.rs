// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/tensor.rs - 张量定义
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

const RGB_CHANNELS: usize = 3;

/// 模型输出中每个候选的固定字段数: cx, cy, w, h, objectness
const FIXED_FIELDS: usize = 5;

#[derive(Error, Debug)]
pub enum TensorError {
  #[error("不支持的批大小: {0}, 仅支持单张图像推理")]
  UnsupportedBatch(usize),
  #[error("张量形状不匹配: {0}")]
  ShapeMismatch(String),
}

/// 通道平面布局 (channel, row, column) 的浮点输入张量
#[derive(Debug, Clone)]
pub struct ChwTensor {
  height: usize,
  width: usize,
  data: Box<[f32]>,
}

impl ChwTensor {
  pub fn with_shape(height: usize, width: usize) -> Self {
    let size = RGB_CHANNELS * height * width;
    let data = vec![0f32; size].into_boxed_slice();
    Self {
      height,
      width,
      data,
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 读取 (c, y, x) 处的值
  pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
    self.data[c * self.height * self.width + y * self.width + x]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

impl AsMut<[f32]> for ChwTensor {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

/// 模型前向传播的原始输出张量，逻辑形状为 (batch, num_candidates, 5 + num_classes)。
/// 形状在此只是记录，校验在 [`RawOutputView::new`] 中完成。
#[derive(Debug, Clone)]
pub struct OutputTensor {
  shape: Box<[usize]>,
  data: Box<[f32]>,
}

impl OutputTensor {
  pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
    Self {
      shape: shape.into_boxed_slice(),
      data: data.into_boxed_slice(),
    }
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }
}

/// 形状校验过的输出张量视图
pub struct RawOutputView<'a> {
  candidates: usize,
  fields: usize,
  data: &'a [f32],
}

impl<'a> RawOutputView<'a> {
  pub fn new(tensor: &'a OutputTensor) -> Result<Self, TensorError> {
    let shape = tensor.shape();
    if shape.len() != 3 {
      return Err(TensorError::ShapeMismatch(format!(
        "期望 3 维输出张量, 实际 {} 维",
        shape.len()
      )));
    }

    let batch = shape[0];
    if batch != 1 {
      return Err(TensorError::UnsupportedBatch(batch));
    }

    let candidates = shape[1];
    let fields = shape[2];
    if fields < FIXED_FIELDS + 1 {
      return Err(TensorError::ShapeMismatch(format!(
        "每个候选至少需要 {} 个字段, 实际 {} 个",
        FIXED_FIELDS + 1,
        fields
      )));
    }

    let expected = candidates * fields;
    if tensor.data().len() != expected {
      return Err(TensorError::ShapeMismatch(format!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        expected,
        tensor.data().len()
      )));
    }

    Ok(Self {
      candidates,
      fields,
      data: tensor.data(),
    })
  }

  pub fn num_candidates(&self) -> usize {
    self.candidates
  }

  pub fn num_classes(&self) -> usize {
    self.fields - FIXED_FIELDS
  }

  /// 读取第 i 个候选的第 j 个字段
  pub fn at(&self, i: usize, j: usize) -> f32 {
    self.data[i * self.fields + j]
  }
}
