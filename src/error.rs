// 启动阶段的致命错误 (不重试)

use thiserror::Error;

/// 进程退出码: 模型加载或摄像头打开失败
pub const SETUP_FAILURE_EXIT_CODE: i32 = -1;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("无法加载检测模型 `{path}`: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("无法打开摄像头 `{device}`: {reason}")]
    CameraOpen { device: String, reason: String },
}

impl SetupError {
    pub fn exit_code(&self) -> i32 {
        SETUP_FAILURE_EXIT_CODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_message() {
        let err = SetupError::ModelLoad {
            path: "mobilenet-ssd.onnx".to_string(),
            reason: "文件不存在".to_string(),
        };
        assert!(err.to_string().contains("mobilenet-ssd.onnx"));
        assert_eq!(err.exit_code(), -1);

        let err = SetupError::CameraOpen {
            device: "/dev/video0".to_string(),
            reason: "busy".to_string(),
        };
        assert!(err.to_string().contains("/dev/video0"));
        assert_eq!(err.exit_code(), -1);
    }
}
