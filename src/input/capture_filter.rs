/// FFmpeg采集过滤器: 摄像头帧 (bgr24) → Frame → 检测循环
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame as AvFrame};

use crate::detection::Frame;

/// libavutil/pixfmt.h: AV_PIX_FMT_BGR24
const AV_PIX_FMT_BGR24: i32 = 3;

/// 校验帧布局: bgr24 单平面, 每行至少 w*3 字节; 返回 (宽, 高, 步长)
fn check_layout(
    format: i32,
    width: i32,
    height: i32,
    stride: i32,
) -> Result<(usize, usize, usize), String> {
    if format != AV_PIX_FMT_BGR24 {
        return Err(format!("像素格式 {} 不是 bgr24", format));
    }
    if width <= 0 || height <= 0 {
        return Err(format!("非法分辨率 {}x{}", width, height));
    }
    let (w, h) = (width as usize, height as usize);
    if stride < 0 || (stride as usize) < w * 3 {
        return Err(format!("步长异常 stride={}", stride));
    }
    Ok((w, h, stride as usize))
}

/// 去掉行尾填充, 拼成紧密排列的 Frame
fn pack_rows(plane: &[u8], w: usize, h: usize, stride: usize) -> Result<Frame> {
    let mut bgr_data = Vec::with_capacity(w * h * 3);
    for line in plane.chunks(stride).take(h) {
        bgr_data.extend_from_slice(&line[..(w * 3).min(line.len())]);
    }
    Frame::new(bgr_data, w as u32, h as u32)
}

pub struct CaptureFilter {
    tx: Sender<Frame>,
    /// 同一通道的接收端, 队列满时丢弃旧帧 (保留最新)
    drain: Receiver<Frame>,
    running: Arc<AtomicBool>,
    pub total_frames: usize,
    pub dropped_frames: usize,
}

impl CaptureFilter {
    pub fn new(tx: Sender<Frame>, drain: Receiver<Frame>, running: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            drain,
            running,
            total_frames: 0,
            dropped_frames: 0,
        }
    }

    fn drop_frame(&mut self, reason: &str) {
        self.dropped_frames += 1;
        if self.total_frames <= 10 {
            tracing::warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
        }
    }

    /// 交给检测循环; 循环处理不过来时用新帧替换旧帧
    fn hand_over(&mut self, frame: Frame) -> Result<(), String> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(frame)) => {
                if self.drain.try_recv().is_ok() {
                    self.dropped_frames += 1;
                }
                // 仍然满说明循环刚好取走又被填满, 放弃本帧即可
                let _ = self.tx.try_send(frame);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err("检测循环已退出".to_string()),
        }
    }
}

impl FrameFilter for CaptureFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        tracing::info!("✅ 采集线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: AvFrame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<AvFrame>, String> {
        if !self.running.load(Ordering::Relaxed) {
            return Err("摄像头已释放".to_string());
        }

        self.total_frames += 1;

        unsafe {
            // 基本检查：空帧或损坏帧
            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.drop_frame("空帧/损坏帧");
                return Ok(None);
            }

            let av = &*frame.as_ptr();
            let plane = av.data[0];
            let layout = match check_layout(av.format, av.width, av.height, av.linesize[0]) {
                Ok(layout) if !plane.is_null() => layout,
                Ok(_) => {
                    self.drop_frame("平面指针为空");
                    return Ok(None);
                }
                Err(reason) => {
                    self.drop_frame(&reason);
                    return Ok(None);
                }
            };

            let (w, h, stride) = layout;
            let plane = std::slice::from_raw_parts(plane, stride * (h - 1) + w * 3);
            match pack_rows(plane, w, h, stride) {
                Ok(packed) => self.hand_over(packed)?,
                Err(e) => self.drop_frame(&format!("{:#}", e)),
            }
        }

        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rows_strips_padding() {
        // 2x2, 每行 8 字节 (6 字节像素 + 2 字节填充), 最后一行无填充
        let plane = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12];
        let frame = pack_rows(&plane, 2, 2, 8).unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
        assert_eq!(frame.bgr_data, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_pack_rows_rejects_short_plane() {
        assert!(pack_rows(&[0; 10], 2, 2, 6).is_err());
    }

    #[test]
    fn test_check_layout() {
        assert_eq!(check_layout(AV_PIX_FMT_BGR24, 640, 480, 1920), Ok((640, 480, 1920)));
        assert_eq!(check_layout(AV_PIX_FMT_BGR24, 640, 480, 2048), Ok((640, 480, 2048)));
        // rgb24 (2) 同为 3 字节/像素, 步长一致也要丢弃
        assert!(check_layout(2, 640, 480, 1920).is_err());
        assert!(check_layout(0, 640, 480, 1920).is_err());
        assert!(check_layout(AV_PIX_FMT_BGR24, 640, 480, 1919).is_err());
        assert!(check_layout(AV_PIX_FMT_BGR24, 640, 480, -1920).is_err());
        assert!(check_layout(AV_PIX_FMT_BGR24, 0, 480, 0).is_err());
    }

    #[test]
    fn test_hand_over_keeps_newest() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut filter = CaptureFilter::new(tx, rx.clone(), Arc::new(AtomicBool::new(true)));

        filter.hand_over(Frame::filled(1, 1, [1, 1, 1])).unwrap();
        filter.hand_over(Frame::filled(1, 1, [2, 2, 2])).unwrap();

        assert_eq!(filter.dropped_frames, 1);
        assert_eq!(rx.try_recv().unwrap().bgr_data, vec![2, 2, 2]);
        assert!(rx.try_recv().is_err());
    }
}
