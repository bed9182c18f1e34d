// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/decode.rs - 原始输出张量解码
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

use tracing::debug;

use crate::{
  model::Rect,
  tensor::{OutputTensor, RawOutputView, TensorError},
};

/// 未经抑制的候选检测，边界框位于 letterbox 坐标空间
#[derive(Debug, Clone)]
pub struct Candidate {
  pub rect: Rect,
  pub score: f32,
  pub class_id: usize,
  /// 张量扫描位置，用于得分相同时的确定性排序
  pub index: usize,
}

/// 把原始输出张量解码为候选列表。
///
/// objectness 达到阈值（含相等）的候选才会被保留；
/// 类别取分数最高者，同分时取下标最小者。
/// 中心坐标与宽高向零截断为整数像素，再以整数运算转为左上角形式，
/// 与 [`LetterboxPlan::map_back`](crate::letterbox::LetterboxPlan::map_back)
/// 的四舍五入配对使用。
pub fn decode(output: &OutputTensor, conf_threshold: f32) -> Result<Vec<Candidate>, TensorError> {
  let raw = RawOutputView::new(output)?;
  let mut candidates = Vec::new();

  for i in 0..raw.num_candidates() {
    let objectness = raw.at(i, 4);
    if objectness < conf_threshold {
      continue;
    }

    let mut best_score = f32::MIN;
    let mut best_class_id = 0usize;
    for c in 0..raw.num_classes() {
      let score = raw.at(i, 5 + c);
      if score > best_score {
        best_score = score;
        best_class_id = c;
      }
    }

    let width = raw.at(i, 2) as i32;
    let height = raw.at(i, 3) as i32;
    let center_x = raw.at(i, 0) as i32;
    let center_y = raw.at(i, 1) as i32;

    candidates.push(Candidate {
      rect: Rect {
        x: center_x - width / 2,
        y: center_y - height / 2,
        width,
        height,
      },
      score: objectness * best_score,
      class_id: best_class_id,
      index: i,
    });
  }

  debug!(
    "解码出 {} 个候选, 共 {} 个条目",
    candidates.len(),
    raw.num_candidates()
  );

  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tensor_of(rows: &[&[f32]]) -> OutputTensor {
    let fields = rows[0].len();
    let data: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    OutputTensor::new(vec![1, rows.len(), fields], data)
  }

  #[test]
  fn decode_selects_best_class_and_multiplies_scores() {
    let output = tensor_of(&[&[320.0, 320.0, 100.0, 50.0, 0.9, 0.1, 0.8, 0.2]]);
    let candidates = decode(&output, 0.25).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].class_id, 1);
    assert!((candidates[0].score - 0.72).abs() < 1e-6);
    assert_eq!(
      candidates[0].rect,
      Rect {
        x: 270,
        y: 295,
        width: 100,
        height: 50,
      }
    );
  }

  #[test]
  fn decode_keeps_objectness_at_threshold() {
    let output = tensor_of(&[
      &[10.0, 10.0, 4.0, 4.0, 0.25, 0.5],
      &[10.0, 10.0, 4.0, 4.0, 0.2499, 0.5],
    ]);
    let candidates = decode(&output, 0.25).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].index, 0);
  }

  #[test]
  fn decode_breaks_class_ties_by_lowest_index() {
    let output = tensor_of(&[&[10.0, 10.0, 4.0, 4.0, 0.9, 0.5, 0.5, 0.3]]);
    let candidates = decode(&output, 0.25).unwrap();
    assert_eq!(candidates[0].class_id, 0);
  }

  #[test]
  fn decode_emits_candidates_in_scan_order() {
    let output = tensor_of(&[
      &[10.0, 10.0, 4.0, 4.0, 0.3, 0.5],
      &[20.0, 20.0, 4.0, 4.0, 0.9, 0.5],
      &[30.0, 30.0, 4.0, 4.0, 0.5, 0.5],
    ]);
    let candidates = decode(&output, 0.25).unwrap();
    let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
  }

  #[test]
  fn decode_truncates_geometry_toward_zero() {
    // 中心 (10.9, 10.9), 宽高 (5.9, 5.9) -> 截断为 (10, 10, 5, 5)
    let output = tensor_of(&[&[10.9, 10.9, 5.9, 5.9, 0.9, 0.5]]);
    let candidates = decode(&output, 0.25).unwrap();
    assert_eq!(
      candidates[0].rect,
      Rect {
        x: 8,
        y: 8,
        width: 5,
        height: 5,
      }
    );
  }

  #[test]
  fn decode_propagates_shape_errors() {
    let output = OutputTensor::new(vec![2, 1, 6], vec![0.0; 12]);
    assert!(matches!(
      decode(&output, 0.25),
      Err(TensorError::UnsupportedBatch(2))
    ));
  }
}
