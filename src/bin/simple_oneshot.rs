// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/bin/simple_oneshot.rs - 单图后处理演示
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use guanlan::{
  FromUrl,
  input::ImageFileInput,
  labels::class_name,
  model::ReplayModel,
  output::{Draw, Render, SaveImageFileOutput},
  pipeline::{InferParams, Pipeline},
};

/// Guanlan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型输出张量转储路径 (tensor:/path/to/output.json)
  #[arg(long, value_name = "TENSOR")]
  pub tensor: Url,
  /// 输入来源 (image:/path/to/input.jpg)
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径 (image:/path/to/output.jpg)
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub confidence: f32,
  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub nms_threshold: f32,
  /// NMS 是否只在同类框之间进行
  #[arg(long)]
  pub class_aware: bool,
  /// 标签字体文件路径（可选，未指定时只绘制边框）
  #[arg(long, value_name = "FONT")]
  pub font: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("张量转储路径: {}", args.tensor);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);

  let input = ImageFileInput::from_url(&args.input)?;
  let model = ReplayModel::from_url(&args.tensor)?;
  let mut output = SaveImageFileOutput::from_url(&args.output)?;
  if let Some(font) = &args.font {
    output = output.with_draw(Draw::with_font_file(font)?);
  }

  let pipeline = Pipeline::new(model);
  let params = InferParams {
    conf_threshold: args.confidence,
    iou_threshold: args.nms_threshold,
    class_aware_nms: args.class_aware,
    ..InferParams::default()
  };

  info!("开始推理...");
  let now = std::time::Instant::now();
  for image in input {
    let result = pipeline.infer(&image, &params)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);

    info!("检测到 {} 个物体", result.items.len());
    for det in result.items.iter() {
      info!(
        "  - {}: {:.2}% at ({}, {}, {}x{})",
        class_name(det.class_id),
        det.score * 100.0,
        det.rect.x,
        det.rect.y,
        det.rect.width,
        det.rect.height
      );
    }

    output.render_result(&image, &result)?;
  }

  Ok(())
}
