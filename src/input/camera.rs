//! 摄像头输入模块
//!
//! 处理本地摄像头输入,支持 DirectShow(Windows) / AVFoundation(macOS) / V4L2(Linux)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::core::scheduler::ffmpeg_scheduler::{FfmpegScheduler, Running};
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};

use super::capture_filter::CaptureFilter;
use super::FrameSource;
use crate::detection::Frame;
use crate::error::SetupError;

/// 出帧之后, 超过该时长没有新帧视为设备断开 (首帧不限时)
pub const STALL_TIMEOUT: Duration = Duration::from_secs(5);

/// 接收结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecvEnd {
    /// 采集线程退出, 通道关闭
    Disconnected,
    /// 已出帧后长时间无新帧
    Stalled,
}

/// 帧接收: 首帧阻塞等待, 之后按 stall_timeout 判定断开
struct FrameReceiver {
    rx: Receiver<Frame>,
    stall_timeout: Duration,
    received: u64,
}

impl FrameReceiver {
    fn new(rx: Receiver<Frame>, stall_timeout: Duration) -> Self {
        Self {
            rx,
            stall_timeout,
            received: 0,
        }
    }

    fn recv(&mut self) -> Result<Frame, RecvEnd> {
        let frame = if self.received == 0 {
            self.rx.recv().map_err(|_| RecvEnd::Disconnected)?
        } else {
            self.rx
                .recv_timeout(self.stall_timeout)
                .map_err(|e| match e {
                    RecvTimeoutError::Disconnected => RecvEnd::Disconnected,
                    RecvTimeoutError::Timeout => RecvEnd::Stalled,
                })?
        };
        self.received += 1;
        Ok(frame)
    }
}

/// 摄像头采集源
pub struct CameraSource {
    device: String,
    frames: FrameReceiver,
    running: Arc<AtomicBool>,
    scheduler: Option<FfmpegScheduler<Running>>,
}

impl CameraSource {
    /// 打开摄像头; 失败为致命错误, 不重试
    pub fn open(device_index: usize) -> Result<Self, SetupError> {
        let device_name = get_camera_devices()
            .into_iter()
            .find(|(idx, _)| *idx == device_index)
            .map(|(_, name)| name)
            .unwrap_or_default();
        let camera_url = format_camera_url(device_index, &device_name);
        let format = camera_format();
        tracing::info!("📷 设备索引: {} ({})", device_index, device_name);
        tracing::info!("🔍 使用格式: {}, 输入: {}", format, camera_url);

        let open_err = |reason: String| SetupError::CameraOpen {
            device: camera_url.clone(),
            reason,
        };

        // 容量1: 检测循环始终拿到最新帧
        let (tx, rx) = crossbeam_channel::bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        let filter = CaptureFilter::new(tx, rx.clone(), Arc::clone(&running));

        // 构建帧处理管线
        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("capture", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        let input = Input::new(camera_url.as_str()).set_format(format);

        // 滤镜图统一输出 bgr24
        let ctx = FfmpegContext::builder()
            .input(input)
            .filter_descs(["format=bgr24"].into())
            .output(out)
            .build()
            .map_err(|e| open_err(format!("构建失败: {}", e)))?;

        let scheduler = ctx
            .start()
            .map_err(|e| open_err(format!("启动失败: {}", e)))?;

        tracing::info!("✅ 摄像头连接成功,开始采集!");

        Ok(Self {
            device: camera_url,
            frames: FrameReceiver::new(rx, STALL_TIMEOUT),
            running,
            scheduler: Some(scheduler),
        })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.frames.recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvEnd::Disconnected) => {
                tracing::info!("📹 摄像头采集结束");
                Ok(None)
            }
            Err(RecvEnd::Stalled) => {
                tracing::warn!(
                    "⚠️ {:?} 内未收到新帧, 视为摄像头断开: {}",
                    self.frames.stall_timeout,
                    self.device
                );
                Ok(None)
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.abort();
        }
        tracing::info!("📷 摄像头已释放: {}", self.device);
    }
}

/// 格式化摄像头URL - 根据平台选择
fn format_camera_url(index: usize, name: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        let _ = index;
        format!("video={}", name)
    }
    #[cfg(target_os = "macos")]
    {
        let _ = name;
        format!("{}", index)
    }
    #[cfg(target_os = "linux")]
    {
        let _ = name;
        format!("/dev/video{}", index)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        let _ = name;
        format!("{}", index)
    }
}

fn camera_format() -> &'static str {
    #[cfg(target_os = "windows")]
    let format = "dshow"; // DirectShow

    #[cfg(target_os = "macos")]
    let format = "avfoundation"; // AVFoundation

    #[cfg(target_os = "linux")]
    let format = "v4l2"; // Video4Linux2

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    let format = "video4linux2"; // 默认

    format
}

/// 获取可用的摄像头设备列表
pub fn get_camera_devices() -> Vec<(usize, String)> {
    match ez_ffmpeg::device::get_input_video_devices() {
        Ok(devices) => devices.into_iter().enumerate().collect(),
        Err(e) => {
            tracing::warn!("⚠️ 获取摄像头列表失败: {}", e);
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_frame_waits_past_stall_timeout() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut frames = FrameReceiver::new(rx, Duration::from_millis(20));

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            tx.send(Frame::filled(2, 2, [9, 9, 9])).unwrap();
        });

        let frame = frames.recv().unwrap();
        assert_eq!(frame.bgr_data[0], 9);
        sender.join().unwrap();
    }

    #[test]
    fn test_disconnected_ends_stream() {
        let (tx, rx) = crossbeam_channel::bounded::<Frame>(1);
        let mut frames = FrameReceiver::new(rx, Duration::from_millis(20));
        drop(tx);
        assert_eq!(frames.recv().unwrap_err(), RecvEnd::Disconnected);
    }

    #[test]
    fn test_stall_after_first_frame() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut frames = FrameReceiver::new(rx, Duration::from_millis(20));

        tx.send(Frame::filled(1, 1, [1, 1, 1])).unwrap();
        assert!(frames.recv().is_ok());
        assert_eq!(frames.recv().unwrap_err(), RecvEnd::Stalled);

        // 超时前到达的帧正常交付
        tx.send(Frame::filled(1, 1, [2, 2, 2])).unwrap();
        assert_eq!(frames.recv().unwrap().bgr_data, vec![2, 2, 2]);

        drop(tx);
        assert_eq!(frames.recv().unwrap_err(), RecvEnd::Disconnected);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_format_camera_url_linux() {
        assert_eq!(format_camera_url(0, ""), "/dev/video0");
        assert_eq!(format_camera_url(2, "ignored"), "/dev/video2");
        assert_eq!(camera_format(), "v4l2");
    }
}
