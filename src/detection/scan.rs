// 检测结果扫描: 置信度过滤 → 坐标还原 → 边界裁剪 → 类别计数 → 标签

use super::types::{Detection, FrameReport, LabeledBox, PixelBox};
use crate::config::DetectorConfig;

/// 背景类索引, 不参与绘制与计数
pub const BACKGROUND_CLASS_ID: i32 = 0;

/// 归一化坐标 → 像素坐标, 并裁剪到 [0, width-1] x [0, height-1]
///
/// 像素值按整数截断 (向零取整); 颠倒的角点会被重新排序,
/// 保证 x1 <= x2, y1 <= y2.
pub fn denormalize(det: &Detection, width: u32, height: u32) -> PixelBox {
    let (w, h) = (width as f32, height as f32);
    let max_x = width.saturating_sub(1) as i32;
    let max_y = height.saturating_sub(1) as i32;

    // `as` 对 NaN 取 0, 对溢出饱和
    let x1 = ((det.x1 * w) as i32).clamp(0, max_x);
    let y1 = ((det.y1 * h) as i32).clamp(0, max_y);
    let x2 = ((det.x2 * w) as i32).clamp(0, max_x);
    let y2 = ((det.y2 * h) as i32).clamp(0, max_y);

    PixelBox {
        x1: x1.min(x2),
        y1: y1.min(y2),
        x2: x1.max(x2),
        y2: y1.max(y2),
    }
}

/// 标签格式: "<类别> : <置信度>", 置信度保留前4个字符 (0.82 → "0.82")
pub fn format_label(class_name: &str, confidence: f32) -> String {
    let conf = format!("{:.6}", confidence);
    let conf: String = conf.chars().take(4).collect();
    format!("{} : {}", class_name, conf)
}

/// 扫描单帧全部检测记录
///
/// 仅当 `confidence > conf_threshold` (严格大于) 时绘制并计数.
/// 计数按类别名精确匹配 (区分大小写).
pub fn scan(
    config: &DetectorConfig,
    detections: &[Detection],
    width: u32,
    height: u32,
) -> FrameReport {
    let mut report = FrameReport {
        boxes: Vec::new(),
        counts: vec![0; config.counted.len()],
    };
    if width == 0 || height == 0 {
        return report;
    }

    for det in detections {
        // NaN 比较为 false, 同样被过滤
        if !(det.confidence > config.conf_threshold) || det.class_id == BACKGROUND_CLASS_ID {
            continue;
        }

        let rect = denormalize(det, width, height);
        let label = match config.class_name(det.class_id) {
            Some(name) => {
                for (count, counted) in report.counts.iter_mut().zip(&config.counted) {
                    if counted.class_name == name {
                        *count += 1;
                    }
                }
                format_label(name, det.confidence)
            }
            None => format_label(&format!("class {}", det.class_id), det.confidence),
        };

        report.boxes.push(LabeledBox {
            class_id: det.class_id,
            confidence: det.confidence,
            rect,
            label,
        });
    }

    report
}
