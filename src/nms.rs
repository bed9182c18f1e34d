// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/nms.rs - 非极大值抑制
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

use crate::{decode::Candidate, model::Rect};

/// 计算两个边界框的 IoU
pub fn iou(a: &Rect, b: &Rect) -> f32 {
  let x1 = a.x.max(b.x);
  let y1 = a.y.max(b.y);
  let x2 = a.right().min(b.right());
  let y2 = a.bottom().min(b.bottom());

  let intersection = ((x2 - x1).max(0) as f32) * ((y2 - y1).max(0) as f32);
  let area_a = (a.width as f32) * (a.height as f32);
  let area_b = (b.width as f32) * (b.height as f32);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

/// 贪心非极大值抑制。
///
/// 候选按得分降序处理，得分相同时扫描位置小者优先，保证输出可复现。
/// 与任一已保留框的 IoU 达到阈值的候选被丢弃。
/// 默认跨类别抑制；`class_aware` 为 true 时只有同类框互相抑制。
pub fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32, class_aware: bool) -> Vec<Candidate> {
  candidates.sort_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| a.index.cmp(&b.index))
  });

  let total = candidates.len();
  let mut kept: Vec<Candidate> = Vec::new();
  for candidate in candidates {
    let redundant = kept.iter().any(|best| {
      (!class_aware || best.class_id == candidate.class_id)
        && iou(&best.rect, &candidate.rect) >= iou_threshold
    });
    if !redundant {
      kept.push(candidate);
    }
  }

  debug!("抑制后保留 {} / {} 个候选", kept.len(), total);
  kept
}
