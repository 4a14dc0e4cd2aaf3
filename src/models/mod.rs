/// 模型统一接口与实现
///
/// ## Model Trait
/// 统一的模型接口,定义标准流程: preprocess → run → postprocess
///
/// ```text
/// 采集帧 → preprocess → NCHW张量 [1,3,300,300]
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 → postprocess → 检测记录 (归一化坐标)
/// ```
///
/// 输出张量的布局只在 postprocess 中解释, 检测循环只接触 `Detection`.
use anyhow::Result;
use ndarray::Array4;

use crate::detection::{Detection, Frame};
use crate::ort_backend::RawOutput;

pub trait Model {
    /// 预处理: 采集帧 → NCHW 张量
    fn preprocess(&self, frame: &Frame) -> Result<Array4<f32>>;

    /// 推理: 执行模型前向传播, 返回原始输出(未解码)
    fn run(&mut self, xs: Array4<f32>, profile: bool) -> Result<RawOutput>;

    /// 后处理: 原始输出 → 检测记录
    fn postprocess(&self, ys: RawOutput) -> Result<Vec<Detection>>;

    /// 完整的推理流程: preprocess → run → postprocess
    fn forward(&mut self, frame: &Frame, profile: bool) -> Result<Vec<Detection>> {
        let t = std::time::Instant::now();
        let xs = self.preprocess(frame)?;
        if profile {
            tracing::debug!("[Model Preprocess]: {:?}", t.elapsed());
        }

        let ys = self.run(xs, profile)?;

        let t = std::time::Instant::now();
        let ys = self.postprocess(ys)?;
        if profile {
            tracing::debug!("[Model Postprocess]: {:?}", t.elapsed());
        }
        Ok(ys)
    }

    /// 打印模型信息
    fn summary(&self);
}

pub mod ssd; // MobileNet-SSD (Caffe 导出 ONNX)

pub use ssd::{blob_from_frame, decode_output, decode_rows, MobileNetSsd};
