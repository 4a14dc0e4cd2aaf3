// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 配置参数
pub mod detection; // 检测结果扫描与叠加层
pub mod error; // 启动错误与退出码
pub mod input; // 视频输入系统
pub mod logging; // 日志初始化
pub mod models; // 模型接口与具体实现
pub mod ort_backend; // ONNX Runtime 推理后端
pub mod pipeline; // 检测循环
pub mod renderer; // macroquad 显示窗口

pub use crate::config::{Args, DetectorConfig};
pub use crate::error::SetupError;
pub use crate::models::{MobileNetSsd, Model};
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::pipeline::{DetectionLoop, StopReason};
