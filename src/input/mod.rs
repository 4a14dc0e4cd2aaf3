/// 视频输入系统 (Video Input System)
///
/// - FrameSource:    采集源接口 (检测循环只依赖该接口)
/// - CameraSource:   本地摄像头 (DirectShow/AVFoundation/V4L2)
/// - CaptureFilter:  FFmpeg帧 → Frame
pub mod camera;
pub mod capture_filter;

use anyhow::Result;

use crate::detection::Frame;

pub use camera::{get_camera_devices, CameraSource};
pub use capture_filter::CaptureFilter;

/// 采集源: 阻塞直到拿到一帧; `None` 表示流结束或设备断开
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// 视频设备信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub index: usize,
    pub name: String,
}

/// 获取所有可用的视频设备
pub fn get_video_devices() -> Vec<VideoDevice> {
    get_camera_devices()
        .into_iter()
        .map(|(index, name)| VideoDevice { index, name })
        .collect()
}
