/// 检测循环 (Detection Loop)
///
/// 单线程顺序执行, 每帧:
/// ```text
/// 采集 → 推理 → 扫描(阈值/计数/标签) → FPS → 叠加层 → 显示 → 检查ESC
/// ```
/// 采集源在循环结束时释放 (无论正常结束还是出错).
use std::time::Instant;

use anyhow::Result;

use crate::config::DetectorConfig;
use crate::detection::{instant_fps, scan, Overlay};
use crate::input::FrameSource;
use crate::models::Model;
use crate::renderer::DisplaySink;

/// 循环结束原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// 采集源没有更多帧 (设备断开/超时)
    EndOfStream,
    /// 用户按下 ESC
    StopKey,
    /// 推理或显示出错 (错误由 run 返回)
    Failed,
}

/// 循环状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

pub struct DetectionLoop<M: Model> {
    model: M,
    config: DetectorConfig,
    profile: bool,
    state: LoopState,
    frame_count: u64,
}

impl<M: Model> DetectionLoop<M> {
    pub fn new(model: M, config: DetectorConfig, profile: bool) -> Self {
        Self {
            model,
            config,
            profile,
            state: LoopState::Running,
            frame_count: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 运行直到流结束或收到停止键; 采集源在返回前被释放
    ///
    /// 返回后状态总是 `Stopped`, 出错时为 `Stopped(Failed)`.
    pub async fn run<S, D>(&mut self, source: S, display: &mut D) -> Result<StopReason>
    where
        S: FrameSource,
        D: DisplaySink,
    {
        self.state = LoopState::Running;
        tracing::info!("🚀 检测循环启动");

        let result = self.drive(source, display).await;
        let reason = match &result {
            Ok(reason) => *reason,
            Err(_) => StopReason::Failed,
        };

        self.state = LoopState::Stopped(reason);
        tracing::info!("🛑 检测循环结束: {:?} (共 {} 帧)", reason, self.frame_count);
        result
    }

    /// 采集源在此函数返回时释放
    async fn drive<S, D>(&mut self, mut source: S, display: &mut D) -> Result<StopReason>
    where
        S: FrameSource,
        D: DisplaySink,
    {
        let reason = loop {
            let Some(frame) = source.next_frame()? else {
                break StopReason::EndOfStream;
            };

            let t_frame = Instant::now();
            let detections = self.model.forward(&frame, self.profile)?;

            let t = Instant::now();
            let report = scan(&self.config, &detections, frame.width, frame.height);
            if self.profile {
                tracing::debug!(
                    "[Scan]: {:?} ({} 条记录, {} 个框)",
                    t.elapsed(),
                    detections.len(),
                    report.boxes.len()
                );
            }

            let fps = instant_fps(t_frame.elapsed());
            let overlay = Overlay::compose(&self.config, report, fps);

            display.present(&frame, &overlay).await?;
            self.frame_count += 1;

            if display.stop_requested() {
                break StopReason::StopKey;
            }
        };

        // 先释放摄像头
        drop(source);
        Ok(reason)
    }
}
