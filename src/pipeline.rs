// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/pipeline.rs - 单图推理流水线
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

use image::RgbImage;
use thiserror::Error;
use tracing::debug;

use crate::{
  decode::decode,
  letterbox::{LetterboxError, LetterboxPlan},
  model::{DetectResult, Detection, Model},
  nms::suppress,
  preprocess::preprocess,
  tensor::TensorError,
};

/// 单次推理的全部参数，逐次调用显式传入，流水线自身不保存配置
#[derive(Debug, Clone)]
pub struct InferParams {
  /// 目标尺寸 (宽, 高)
  pub target_size: (u32, u32),
  /// 网络步长
  pub stride: u32,
  /// 补边量是否按步长取模缩减
  pub pad_to_stride: bool,
  /// 置信度阈值
  pub conf_threshold: f32,
  /// NMS IOU 阈值
  pub iou_threshold: f32,
  /// 是否允许放大图像
  pub allow_upscale: bool,
  /// 补边颜色
  pub pad_color: [u8; 3],
  /// NMS 是否只在同类框之间进行
  pub class_aware_nms: bool,
}

impl Default for InferParams {
  fn default() -> Self {
    Self {
      target_size: (640, 640),
      stride: 32,
      pad_to_stride: false,
      conf_threshold: 0.25,
      iou_threshold: 0.25,
      allow_upscale: false,
      pad_color: [114, 114, 114],
      class_aware_nms: false,
    }
  }
}

#[derive(Error, Debug)]
pub enum InferError<E: std::error::Error + 'static> {
  #[error("Letterbox 计划无效: {0}")]
  Letterbox(#[from] LetterboxError),
  #[error("模型输出张量无效: {0}")]
  Tensor(#[from] TensorError),
  #[error("模型推理失败: {0}")]
  Model(#[source] E),
}

/// 单图推理流水线。
///
/// 固定顺序执行: 缩放计划 -> 张量准备 -> 模型前向传播 -> 解码 ->
/// 非极大值抑制 -> 坐标逆映射。全程同步，调用之间不保留状态，
/// 任一步的前置条件失败都会中止整次调用，不会返回部分结果。
pub struct Pipeline<M> {
  model: M,
}

impl<M: Model> Pipeline<M> {
  pub fn new(model: M) -> Self {
    Self { model }
  }

  pub fn infer(
    &self,
    image: &RgbImage,
    params: &InferParams,
  ) -> Result<DetectResult, InferError<M::Error>> {
    let plan = LetterboxPlan::new(
      (image.width(), image.height()),
      params.target_size,
      params.stride,
      params.allow_upscale,
      params.pad_to_stride,
    )?;

    let input = preprocess(image, &plan, params.pad_color);

    debug!("执行模型前向传播");
    let output = self.model.forward(&input).map_err(InferError::Model)?;

    let candidates = decode(&output, params.conf_threshold)?;
    let survivors = suppress(candidates, params.iou_threshold, params.class_aware_nms);

    let items: Vec<Detection> = survivors
      .into_iter()
      .map(|candidate| Detection {
        rect: plan.map_back(candidate.rect),
        score: candidate.score,
        class_id: candidate.class_id,
      })
      .collect();

    debug!("推理完成, {} 个检测结果", items.len());

    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }
}
