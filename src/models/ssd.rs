// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// MobileNet-SSD 模型实现 (VOC 21类, 输入300x300)
// 包含: 模型加载、预处理、推理、后处理
//
// 输出格式: [1, 1, N, 7], 每行 [batch_id, class_id, confidence, x1, y1, x2, y2]
// 坐标为相对原图的归一化值, 网络内部已完成 NMS

use anyhow::{bail, Context, Result};
use fast_image_resize as fr;
use ndarray::Array4;

use super::Model;
use crate::config::{Args, BlobParams};
use crate::detection::{Detection, Frame};
use crate::error::SetupError;
use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP, RawOutput};

/// 每行检测结果的字段数
pub const ROW_FIELDS: usize = 7;

/// 采集帧 → 网络输入张量
///
/// 双线性缩放到 size x size, 每通道 (v - mean) * scale, 保持通道顺序 (BGR 不交换)
pub fn blob_from_frame(frame: &Frame, params: &BlobParams) -> Result<Array4<f32>> {
    let size = params.size;
    let src = fr::images::ImageRef::new(
        frame.width,
        frame.height,
        &frame.bgr_data,
        fr::PixelType::U8x3,
    )
    .context("无法创建缩放源图像")?;
    let mut dst = fr::images::Image::new(size, size, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
        )
        .context("缩放失败")?;

    let size = size as usize;
    let mut xs = Array4::<f32>::zeros((1, 3, size, size));
    for (idx, px) in dst.buffer().chunks_exact(3).enumerate() {
        let (y, x) = (idx / size, idx % size);
        for c in 0..3 {
            xs[[0, c, y, x]] = (px[c] as f32 - params.mean[c]) * params.scale;
        }
    }
    Ok(xs)
}

/// 扁平输出 → 检测记录; 末尾不足一行的数据被忽略
pub fn decode_rows(data: &[f32]) -> Vec<Detection> {
    data.chunks_exact(ROW_FIELDS)
        .map(|row| Detection::new(row[1] as i32, row[2], row[3], row[4], row[5], row[6]))
        .collect()
}

/// 原始输出 → 检测记录; 带形状时最后一维必须是 7
pub fn decode_output(ys: &RawOutput) -> Result<Vec<Detection>> {
    if let Some(&fields) = ys.shape.last() {
        if fields != ROW_FIELDS as i64 {
            bail!("输出张量形状 {:?} 不是 [.., {}]", ys.shape, ROW_FIELDS);
        }
    }
    Ok(decode_rows(&ys.data))
}

/// MobileNet-SSD 完整模型结构
pub struct MobileNetSsd {
    engine: OrtBackend,
    blob: BlobParams,
    model_path: String,
}

impl MobileNetSsd {
    /// 从命令行参数加载模型; 失败为致命错误
    pub fn new(args: &Args, blob: BlobParams) -> Result<Self, SetupError> {
        let ort_args = OrtConfig {
            f: args.model.clone(),
            ep: OrtEP::from_flags(args.cuda, args.trt, args.device_id),
            intra_threads: args.intra_threads,
        };
        let engine = OrtBackend::build(ort_args).map_err(|e| SetupError::ModelLoad {
            path: args.model.clone(),
            reason: format!("{:#}", e),
        })?;

        Ok(Self {
            engine,
            blob,
            model_path: args.model.clone(),
        })
    }
}

impl Model for MobileNetSsd {
    fn preprocess(&self, frame: &Frame) -> Result<Array4<f32>> {
        blob_from_frame(frame, &self.blob)
    }

    fn run(&mut self, xs: Array4<f32>, profile: bool) -> Result<RawOutput> {
        self.engine.run(xs, profile)
    }

    fn postprocess(&self, ys: RawOutput) -> Result<Vec<Detection>> {
        decode_output(&ys)
    }

    fn summary(&self) {
        tracing::info!(
            "\nSummary:\n\
            > Model: MobileNet-SSD ({})\n\
            > EP: {:?}\n\
            > Inputs: {:?}, Outputs: {:?}\n\
            > Blob: {}x{}, scale: {:.6}, mean: {:?}\n",
            self.model_path,
            self.engine.ep(),
            self.engine.inputs(),
            self.engine.outputs(),
            self.blob.size,
            self.blob.size,
            self.blob.scale,
            self.blob.mean,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_blob_normalization_keeps_channel_order() {
        let frame = Frame::filled(64, 48, [0, 255, 128]);
        let xs = blob_from_frame(&frame, &BlobParams::default()).unwrap();

        assert_eq!(xs.dim(), (1, 3, 300, 300));
        // 通道0 = B, 通道1 = G, 通道2 = R (允许缩放带来的1级量化误差)
        let tol = 1.5 / 127.5;
        assert!((xs[[0, 0, 10, 10]] + 1.0).abs() < tol);
        assert!((xs[[0, 1, 150, 299]] - 1.0).abs() < tol);
        assert!((xs[[0, 2, 299, 0]] - 0.5 / 127.5).abs() < tol);
    }

    #[test]
    fn test_blob_custom_size() {
        let frame = Frame::filled(10, 10, [127, 127, 127]);
        let params = BlobParams {
            size: 8,
            ..Default::default()
        };
        let xs = blob_from_frame(&frame, &params).unwrap();
        assert_eq!(xs.dim(), (1, 3, 8, 8));
        assert!(xs.iter().all(|v| (v + 0.5 / 127.5).abs() < 1.5 / 127.5));
    }

    #[test]
    fn test_decode_rows() {
        let data = [
            0.0, 15.0, 0.82, 0.1, 0.1, 0.5, 0.5, //
            0.0, 7.0, 0.9, 0.2, 0.3, 0.4, 0.6, //
            0.0, 1.0, // 不完整的一行
        ];
        let dets = decode_rows(&data);
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0], Detection::new(15, 0.82, 0.1, 0.1, 0.5, 0.5));
        assert_eq!(dets[1].class_id, 7);
        assert_eq!(dets[1].y2, 0.6);
    }

    #[test]
    fn test_decode_output_checks_row_width() {
        let ys = RawOutput {
            shape: vec![1, 1, 2, 6],
            data: vec![0.0; 12],
        };
        assert!(decode_output(&ys).is_err());

        let ys = RawOutput {
            shape: vec![1, 1, 1, 7],
            data: vec![0.0, 15.0, 0.9, 0.1, 0.1, 0.2, 0.2],
        };
        assert_eq!(decode_output(&ys).unwrap().len(), 1);

        // 无形状信息时按 7 字段切分
        let ys = RawOutput {
            shape: vec![],
            data: vec![0.0, 7.0, 0.6, 0.1, 0.1, 0.2, 0.2],
        };
        let dets = decode_output(&ys).unwrap();
        assert_eq!(dets, vec![Detection::new(7, 0.6, 0.1, 0.1, 0.2, 0.2)]);
    }

    #[test]
    fn test_missing_model_is_setup_error() {
        let args = Args::parse_from(["ssd-camera", "--model", "no-such-dir/missing.onnx"]);
        match MobileNetSsd::new(&args, BlobParams::default()) {
            Err(SetupError::ModelLoad { path, .. }) => assert_eq!(path, "no-such-dir/missing.onnx"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("model should not load"),
        }
    }
}
