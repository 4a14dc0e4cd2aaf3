/// 检测系统数据结构定义

use anyhow::{ensure, Result};

// ========== 数据结构 ==========

/// 采集帧: 按 BGR 顺序紧密排列的 8 位三通道像素 (采集源 → 检测循环)
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub bgr_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(bgr_data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "非法分辨率 {}x{}", width, height);
        ensure!(
            bgr_data.len() == width as usize * height as usize * 3,
            "像素数据长度 {} 与分辨率 {}x{} 不符",
            bgr_data.len(),
            width,
            height
        );
        Ok(Self {
            bgr_data,
            width,
            height,
        })
    }

    /// 纯色帧
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let bgr_data = bgr.repeat(width as usize * height as usize);
        Self {
            bgr_data,
            width,
            height,
        }
    }

    /// BGR → RGBA (显示纹理使用)
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.bgr_data.len() / 3 * 4);
        for px in self.bgr_data.chunks_exact(3) {
            rgba.push(px[2]); // R
            rgba.push(px[1]); // G
            rgba.push(px[0]); // B
            rgba.push(255); // A
        }
        rgba
    }
}

/// 单条检测记录 (归一化坐标, 0-1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class_id: i32,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Detection {
    pub fn new(class_id: i32, confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            class_id,
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }
}

/// 像素坐标检测框 (已裁剪到画面范围内)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

/// 带标签的检测框 (绘制用)
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledBox {
    pub class_id: i32,
    pub confidence: f32,
    pub rect: PixelBox,
    pub label: String,
}

/// 单帧扫描结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub boxes: Vec<LabeledBox>,
    /// 与 DetectorConfig::counted 一一对应
    pub counts: Vec<usize>,
}
