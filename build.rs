// 构建脚本: 链接摄像头采集所需的系统库
fn main() {
    // 仅在Windows MSVC环境下: ffmpeg 静态库的 dshow 输入设备依赖
    #[cfg(all(target_os = "windows", target_env = "msvc"))]
    {
        // DirectShow 设备枚举
        println!("cargo:rustc-link-lib=dylib=strmiids");
        println!("cargo:rustc-link-lib=dylib=ole32");

        // OLE 自动化和VFW
        println!("cargo:rustc-link-lib=dylib=oleaut32");
        println!("cargo:rustc-link-lib=dylib=vfw32");
    }
}
