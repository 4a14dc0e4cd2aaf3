// 叠加层: 检测框 + 标签 + 左上角HUD (FPS / 计数)

use std::time::Duration;

use super::types::{FrameReport, LabeledBox};
use crate::config::DetectorConfig;

/// HUD 第一行基线位置, 之后每行下移 HUD_LINE_STEP
pub const HUD_ORIGIN: (f32, f32) = (10.0, 30.0);
pub const HUD_LINE_STEP: f32 = 30.0;
/// 标签相对框顶的偏移
pub const LABEL_OFFSET_Y: f32 = 5.0;

/// 由单帧耗时计算瞬时FPS; 耗时为0或结果非有限值时返回0
pub fn instant_fps(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    let fps = 1.0 / secs;
    if fps.is_finite() {
        fps
    } else {
        0.0
    }
}

/// HUD 文本行
#[derive(Clone, Debug, PartialEq)]
pub struct HudLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: (u8, u8, u8),
}

/// 单帧绘制清单 (像素坐标, 相对原始帧)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub boxes: Vec<LabeledBox>,
    pub box_color: (u8, u8, u8),
    pub hud: Vec<HudLine>,
}

impl Overlay {
    pub fn compose(config: &DetectorConfig, report: FrameReport, fps: f64) -> Self {
        let (x, y0) = HUD_ORIGIN;
        let mut hud = Vec::with_capacity(1 + config.counted.len());
        hud.push(HudLine {
            text: format!("FPS: {}", fps as i64),
            x,
            y: y0,
            color: config.fps_color,
        });
        for (i, (counted, count)) in config.counted.iter().zip(&report.counts).enumerate() {
            hud.push(HudLine {
                text: format!("{}: {}", counted.caption, count),
                x,
                y: y0 + HUD_LINE_STEP * (i + 1) as f32,
                color: counted.color,
            });
        }

        Self {
            boxes: report.boxes,
            box_color: config.box_color,
            hud,
        }
    }

    /// 标签左下角位置 (框左上角上方)
    pub fn label_anchor(b: &LabeledBox) -> (f32, f32) {
        (b.rect.x1 as f32, b.rect.y1 as f32 - LABEL_OFFSET_Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::scan::scan;
    use crate::detection::types::Detection;

    #[test]
    fn test_instant_fps() {
        assert_eq!(instant_fps(Duration::ZERO), 0.0);
        assert!((instant_fps(Duration::from_millis(40)) - 25.0).abs() < 1e-9);
        assert!(instant_fps(Duration::from_nanos(1)).is_finite());
    }

    #[test]
    fn test_hud_lines() {
        let config = DetectorConfig::default();
        let dets = [
            Detection::new(15, 0.9, 0.1, 0.1, 0.2, 0.2),
            Detection::new(15, 0.8, 0.3, 0.3, 0.4, 0.4),
            Detection::new(7, 0.7, 0.5, 0.5, 0.6, 0.6),
        ];
        let report = scan(&config, &dets, 640, 480);
        let overlay = Overlay::compose(&config, report, 29.7);

        let texts: Vec<&str> = overlay.hud.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["FPS: 29", "Persons: 2", "Cars: 1"]);
        assert_eq!((overlay.hud[0].x, overlay.hud[0].y), (10.0, 30.0));
        assert_eq!((overlay.hud[1].x, overlay.hud[1].y), (10.0, 60.0));
        assert_eq!((overlay.hud[2].x, overlay.hud[2].y), (10.0, 90.0));
        assert_eq!(overlay.hud[0].color, (255, 0, 0));
        assert_eq!(overlay.boxes.len(), 3);
    }

    #[test]
    fn test_hud_present_without_detections() {
        let config = DetectorConfig::default();
        let report = scan(&config, &[], 640, 480);
        let overlay = Overlay::compose(&config, report, 0.0);

        assert!(overlay.boxes.is_empty());
        let texts: Vec<&str> = overlay.hud.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["FPS: 0", "Persons: 0", "Cars: 0"]);
    }

    #[test]
    fn test_label_anchor_above_box() {
        let config = DetectorConfig::default();
        let report = scan(
            &config,
            &[Detection::new(15, 0.82, 0.1, 0.1, 0.5, 0.5)],
            640,
            480,
        );
        assert_eq!(Overlay::label_anchor(&report.boxes[0]), (64.0, 43.0));
    }
}
