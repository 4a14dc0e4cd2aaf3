/// MobileNet-SSD 摄像头实时检测
///
/// 单线程顺序执行:
/// 1. 加载模型 (失败退出码 -1)
/// 2. 打开摄像头 (失败退出码 -1)
/// 3. 检测循环: 采集 → 推理 → 叠加层 → 显示, 直到 ESC 或摄像头断开
use clap::Parser;
use macroquad::prelude::Conf;

use ssd_camera_rs::config::{Args, DetectorConfig};
use ssd_camera_rs::input::{get_video_devices, CameraSource};
use ssd_camera_rs::models::{MobileNetSsd, Model};
use ssd_camera_rs::pipeline::DetectionLoop;
use ssd_camera_rs::renderer::{Window, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};
use ssd_camera_rs::logging;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// 运行期错误的退出码
const RUNTIME_FAILURE_EXIT_CODE: i32 = 1;

fn window_conf() -> Conf {
    Conf {
        window_title: WINDOW_TITLE.to_owned(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        high_dpi: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();
    logging::init(args.profile);

    if args.list_devices {
        let devices = get_video_devices();
        if devices.is_empty() {
            println!("⚠️ 未发现视频设备");
        }
        for dev in devices {
            println!("  [{}] {}", dev.index, dev.name);
        }
        return;
    }

    tracing::info!("🚀 MobileNet-SSD 实时检测启动");
    tracing::info!("📦 检测模型: {}", args.model);

    let config = DetectorConfig::default();

    // ========== 加载模型 ==========
    let model = match MobileNetSsd::new(&args, config.blob.clone()) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };
    model.summary();
    config.print_summary();

    // ========== 打开摄像头 ==========
    let camera = match CameraSource::open(args.camera) {
        Ok(camera) => camera,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    // ========== 检测循环 ==========
    let mut window = Window::new();
    let mut detection_loop = DetectionLoop::new(model, config, args.profile);
    match detection_loop.run(camera, &mut window).await {
        Ok(reason) => {
            tracing::info!("👋 退出: {:?}", reason);
        }
        Err(e) => {
            tracing::error!("❌ 检测循环异常: {:#}", e);
            drop(window);
            std::process::exit(RUNTIME_FAILURE_EXIT_CODE);
        }
    }
}
