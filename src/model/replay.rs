// 该文件是 Guanlan （观澜听涛） 项目的一部分。
// src/model/replay.rs - 张量回放模型
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
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::Model,
  tensor::{ChwTensor, OutputTensor},
};

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI scheme mismatch")]
  SchemaMismatch,
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(serde_json::Error),
  #[error("张量转储格式错误: {0}")]
  FormatError(String),
}

impl From<std::io::Error> for ReplayModelError {
  fn from(err: std::io::Error) -> Self {
    ReplayModelError::IoError(err)
  }
}

impl From<serde_json::Error> for ReplayModelError {
  fn from(err: serde_json::Error) -> Self {
    ReplayModelError::JsonError(err)
  }
}

/// 回放外部推理引擎事先转储的输出张量。
///
/// 转储为 JSON 对象 `{"shape": [1, n, k], "data": [...]}`,
/// 由真实引擎在前向传播后写出。回放模型忽略输入张量的内容，
/// 让后处理流水线在没有推理引擎的环境下也能端到端运行。
pub struct ReplayModel {
  output: OutputTensor,
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = "tensor";
}

impl FromUrl for ReplayModel {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayModelError::SchemaMismatch);
    }

    let path = url.path();
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let shape = value
      .get("shape")
      .and_then(|v| v.as_array())
      .ok_or_else(|| ReplayModelError::FormatError("缺少 shape 数组".to_string()))?
      .iter()
      .map(|v| v.as_u64().map(|n| n as usize))
      .collect::<Option<Vec<_>>>()
      .ok_or_else(|| ReplayModelError::FormatError("shape 必须是非负整数数组".to_string()))?;

    let data = value
      .get("data")
      .and_then(|v| v.as_array())
      .ok_or_else(|| ReplayModelError::FormatError("缺少 data 数组".to_string()))?
      .iter()
      .map(|v| v.as_f64().map(|x| x as f32))
      .collect::<Option<Vec<_>>>()
      .ok_or_else(|| ReplayModelError::FormatError("data 必须是数值数组".to_string()))?;

    debug!("回放张量: 形状 {:?}, {} 个元素", shape, data.len());

    Ok(ReplayModel {
      output: OutputTensor::new(shape, data),
    })
  }
}

impl Model for ReplayModel {
  type Error = std::convert::Infallible;

  fn forward(&self, input: &ChwTensor) -> Result<OutputTensor, Self::Error> {
    debug!(
      "回放模型输出, 忽略 {}x{}x{} 输入张量",
      input.channels(),
      input.height(),
      input.width()
    );
    Ok(self.output.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write_dump(name: &str, content: &str) -> Url {
    let path = std::env::temp_dir().join(format!("guanlan-replay-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    Url::parse(&format!("tensor:{}", path.display())).unwrap()
  }

  #[test]
  fn replay_returns_dumped_tensor() {
    let url = write_dump("ok.json", r#"{"shape": [1, 1, 6], "data": [1, 2, 3, 4, 0.5, 0.25]}"#);
    let model = ReplayModel::from_url(&url).unwrap();
    let output = model.forward(&ChwTensor::with_shape(4, 4)).unwrap();
    assert_eq!(output.shape(), &[1, 1, 6]);
    assert_eq!(output.data()[4], 0.5);
  }

  #[test]
  fn replay_rejects_wrong_scheme() {
    let url = Url::parse("image:/tmp/whatever.json").unwrap();
    assert!(matches!(
      ReplayModel::from_url(&url),
      Err(ReplayModelError::SchemaMismatch)
    ));
  }

  #[test]
  fn replay_rejects_missing_shape() {
    let url = write_dump("bad.json", r#"{"data": [1, 2]}"#);
    assert!(matches!(
      ReplayModel::from_url(&url),
      Err(ReplayModelError::FormatError(_))
    ));
  }
}
