/// 检测系统 (Detection System)
///
/// - types:   帧 / 检测记录 / 像素框
/// - scan:    阈值过滤、坐标还原、计数、标签
/// - overlay: 绘制清单与FPS
pub mod overlay;
pub mod scan;
pub mod types;

pub use overlay::{instant_fps, HudLine, Overlay};
pub use scan::{denormalize, format_label, scan};
pub use types::{Detection, Frame, FrameReport, LabeledBox, PixelBox};
