//! 渲染显示 (macroquad)
//!
//! 检测循环通过 DisplaySink 接口输出, 窗口实现负责把帧和叠加层画出来并采集 ESC 键

use anyhow::Result;
use macroquad::prelude::*;

use crate::detection::{Frame, Overlay};

/// 窗口标题
pub const WINDOW_TITLE: &str = "MobileNet-SSD Detection";
pub const WINDOW_WIDTH: i32 = 640;
pub const WINDOW_HEIGHT: i32 = 480;

/// 标签字号 / HUD字号 (像素, 相对原始帧)
const LABEL_FONT_SIZE: f32 = 18.0;
const HUD_FONT_SIZE: f32 = 28.0;
const BOX_THICKNESS: f32 = 2.0;

/// 显示输出接口
#[allow(async_fn_in_trait)]
pub trait DisplaySink {
    /// 显示一帧 (含叠加层), 返回前等待一次刷新
    async fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()>;

    /// 上一次刷新期间是否收到停止信号
    fn stop_requested(&self) -> bool;
}

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::from_rgba(color.0, color.1, color.2, 255)
}

/// macroquad 窗口
pub struct Window {
    last_frame: Option<Texture2D>,
    stop: bool,
    render_count: u64,
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    pub fn new() -> Self {
        tracing::info!("🎨 渲染器启动");
        Self {
            last_frame: None,
            stop: false,
            render_count: 0,
        }
    }

    /// 上传帧数据: 只在分辨率变化时重建纹理, 否则更新像素数据
    fn upload(&mut self, frame: &Frame) -> Texture2D {
        let rgba = frame.to_rgba();
        if let Some(tex) = &self.last_frame {
            if tex.width() == frame.width as f32 && tex.height() == frame.height as f32 {
                tex.update(&Image {
                    bytes: rgba,
                    width: frame.width as u16,
                    height: frame.height as u16,
                });
                return tex.clone();
            }
        }

        tracing::info!("🖼️ 纹理尺寸: {}x{}", frame.width, frame.height);
        let texture = Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &rgba);
        texture.set_filter(FilterMode::Linear);
        self.last_frame = Some(texture.clone());
        texture
    }

    fn draw(&self, texture: &Texture2D, overlay: &Overlay) {
        clear_background(BLACK);

        // 画面拉伸到窗口, 叠加层按同一比例换算
        let scale_x = screen_width() / texture.width();
        let scale_y = screen_height() / texture.height();

        draw_texture_ex(
            texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        // 绘制检测框
        let box_color = rgb(overlay.box_color);
        for b in &overlay.boxes {
            draw_rectangle_lines(
                b.rect.x1 as f32 * scale_x,
                b.rect.y1 as f32 * scale_y,
                b.rect.width() as f32 * scale_x,
                b.rect.height() as f32 * scale_y,
                BOX_THICKNESS,
                box_color,
            );

            // 绘制标签
            let (lx, ly) = Overlay::label_anchor(b);
            draw_text(
                &b.label,
                lx * scale_x,
                ly * scale_y,
                LABEL_FONT_SIZE * scale_y,
                box_color,
            );
        }

        // 左上角 HUD
        for line in &overlay.hud {
            draw_text(
                &line.text,
                line.x * scale_x,
                line.y * scale_y,
                HUD_FONT_SIZE * scale_y,
                rgb(line.color),
            );
        }
    }
}

impl DisplaySink for Window {
    async fn present(&mut self, frame: &Frame, overlay: &Overlay) -> Result<()> {
        let texture = self.upload(frame);
        self.draw(&texture, overlay);
        self.render_count += 1;

        // 等待一次刷新, 期间的按键在之后读取
        next_frame().await;
        self.stop = is_key_pressed(KeyCode::Escape);
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.stop
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        tracing::info!("🎨 渲染器关闭 (共显示 {} 帧)", self.render_count);
    }
}
