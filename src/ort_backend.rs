// ONNX Runtime 推理后端

use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array4;
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

/// 执行后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

impl OrtEP {
    pub fn from_flags(cuda: bool, trt: bool, device_id: i32) -> Self {
        if trt {
            OrtEP::Trt(device_id)
        } else if cuda {
            OrtEP::CUDA(device_id)
        } else {
            OrtEP::CPU
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
    pub intra_threads: usize,
}

/// 原始输出: 扁平数据 + 形状
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        if !Path::new(&config.f).is_file() {
            bail!("模型文件不存在");
        }

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        // 注册执行后端 (不可用时ORT会回退到CPU)
        let builder = match config.ep {
            OrtEP::CPU => builder,
            OrtEP::CUDA(id) => builder.with_execution_providers([
                CUDAExecutionProvider::default().with_device_id(id).build()
            ])?,
            OrtEP::Trt(id) => builder.with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(id)
                    .build(),
                CUDAExecutionProvider::default().with_device_id(id).build(),
            ])?,
        };

        let session = builder
            .commit_from_file(&config.f)
            .context("ONNX模型解析失败")?;

        let inputs: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if inputs.is_empty() || outputs.is_empty() {
            bail!("模型缺少输入或输出节点");
        }

        Ok(Self {
            session,
            ep: config.ep,
            inputs,
            outputs,
        })
    }

    /// 前向推理, 返回第一个输出张量
    pub fn run(&mut self, xs: Array4<f32>, profile: bool) -> Result<RawOutput> {
        let t = std::time::Instant::now();
        let dims = xs.dim();
        let (data, _offset) = xs.into_raw_vec_and_offset();
        let input = Tensor::from_array(([dims.0, dims.1, dims.2, dims.3], data))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .context("推理失败")?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("无法提取输出张量")?;
        let ys = RawOutput {
            shape: shape.iter().copied().collect(),
            data: data.to_vec(),
        };

        if profile {
            tracing::debug!("[ORT H2D + Inference + D2H]: {:?}", t.elapsed());
        }
        Ok(ys)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ep_from_flags() {
        assert_eq!(OrtEP::from_flags(false, false, 0), OrtEP::CPU);
        assert_eq!(OrtEP::from_flags(true, false, 1), OrtEP::CUDA(1));
        // TensorRT 优先于 CUDA
        assert_eq!(OrtEP::from_flags(true, true, 2), OrtEP::Trt(2));
    }

    #[test]
    fn test_build_missing_model() {
        let config = OrtConfig {
            f: "definitely-missing-model.onnx".to_string(),
            ep: OrtEP::CPU,
            intra_threads: 1,
        };
        assert!(OrtBackend::build(config).is_err());
    }
}
