// 配置参数: 命令行参数 (Args) + 检测器配置 (DetectorConfig)

use clap::Parser;

/// MobileNet-SSD 输入尺寸 (正方形)
pub const INF_SIZE: u32 = 300;

/// VOC 类别表 (索引0为背景,不参与绘制与计数)
pub const VOC_CLASSES: [&str; 21] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "MobileNet-SSD 摄像头实时检测", long_about = None)]
pub struct Args {
    /// ONNX模型路径 (相对于工作目录)
    #[arg(long, default_value = "mobilenet-ssd.onnx")]
    pub model: String,

    /// 摄像头设备索引
    #[arg(long, default_value_t = 0)]
    pub camera: usize,

    /// 使用CUDA执行
    #[arg(long)]
    pub cuda: bool,

    /// 使用TensorRT执行
    #[arg(long)]
    pub trt: bool,

    /// GPU设备ID
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// ORT算子内线程数
    #[arg(long, default_value_t = 4)]
    pub intra_threads: usize,

    /// 列出可用的视频设备后退出
    #[arg(long)]
    pub list_devices: bool,

    /// 打印每帧各阶段耗时
    #[arg(long)]
    pub profile: bool,
}

/// 网络输入张量参数 (blob)
#[derive(Debug, Clone, PartialEq)]
pub struct BlobParams {
    pub size: u32,
    pub scale: f32,
    pub mean: [f32; 3],
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            size: INF_SIZE,
            scale: 1.0 / 127.5,
            mean: [127.5, 127.5, 127.5],
        }
    }
}

/// 需要计数的类别 (HUD显示一行)
#[derive(Debug, Clone, PartialEq)]
pub struct CountedClass {
    pub class_name: String,
    pub caption: String,
    pub color: (u8, u8, u8),
}

impl CountedClass {
    pub fn new(class_name: &str, caption: &str, color: (u8, u8, u8)) -> Self {
        Self {
            class_name: class_name.to_string(),
            caption: caption.to_string(),
            color,
        }
    }
}

/// 检测器配置,构造时传入检测循环
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub class_names: Vec<String>,
    pub conf_threshold: f32,
    pub counted: Vec<CountedClass>,
    pub blob: BlobParams,
    pub box_color: (u8, u8, u8),
    pub fps_color: (u8, u8, u8),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            class_names: VOC_CLASSES.iter().map(|s| s.to_string()).collect(),
            conf_threshold: 0.5,
            counted: vec![
                CountedClass::new("person", "Persons", (0, 0, 255)), // 蓝色
                CountedClass::new("car", "Cars", (0, 255, 255)),     // 青色
            ],
            blob: BlobParams::default(),
            box_color: (0, 255, 0),   // 绿色
            fps_color: (255, 0, 0),   // 红色
        }
    }
}

impl DetectorConfig {
    /// 按索引查找类别名, 越界或负数返回 None
    pub fn class_name(&self, class_id: i32) -> Option<&str> {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.class_names.get(idx))
            .map(String::as_str)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        tracing::info!(
            "🎛️  检测配置: {}类 | 置信度>{:.2} | 输入{}x{} | 计数: {}",
            self.class_names.len(),
            self.conf_threshold,
            self.blob.size,
            self.blob.size,
            self.counted
                .iter()
                .map(|c| c.class_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = DetectorConfig::default();
        assert_eq!(config.class_names.len(), 21);
        assert_eq!(config.class_names[0], "background");
        assert_eq!(config.class_names[7], "car");
        assert_eq!(config.class_names[15], "person");
        assert_eq!(config.conf_threshold, 0.5);
        assert_eq!(config.blob.size, 300);
        assert!((config.blob.scale - 0.007843).abs() < 1e-6);
    }

    #[test]
    fn test_class_name_lookup() {
        let config = DetectorConfig::default();
        assert_eq!(config.class_name(15), Some("person"));
        assert_eq!(config.class_name(-1), None);
        assert_eq!(config.class_name(21), None);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["ssd-camera"]);
        assert_eq!(args.model, "mobilenet-ssd.onnx");
        assert_eq!(args.camera, 0);
        assert!(!args.cuda && !args.trt && !args.list_devices);
    }
}
