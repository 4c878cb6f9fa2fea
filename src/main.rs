//! # 短链接二维码 — 命令行入口
//!
//! 以页面同样的流程生成一张二维码：打开弹窗 → 可选上传 Logo → 设置样式 → 下载，
//! 下载结果写入 `--out` 目录下的 `qr-code.png`。

use std::path::PathBuf;
use std::sync::Arc;

use shortlink_studio::error::AppError;
use shortlink_studio::qr_studio::{
    DirectoryDownloadSink, LogoUpload, QrConfig, QrModal, QrcodeRenderer, RecordingView,
    StaticPage, StyleParameters, load_config_from_path,
};

const HELP: &str = "\
shortlink-studio

USAGE:
  shortlink-studio --url <URL> [OPTIONS]

OPTIONS:
  --url <URL>         二维码内容（短链接完整地址）
  --logo <FILE>       叠加在中心的 Logo 图片
  --padding <PX>      导出内边距（默认 0）
  --radius <PX>       导出圆角半径（默认 0）
  --out <DIR>         输出目录（默认当前目录）
  --config <FILE>     JSON 配置文件
  -h, --help          显示帮助
";

#[derive(Debug)]
struct Args {
    url: String,
    logo: Option<PathBuf>,
    padding: u32,
    radius: u32,
    out: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Option<Args>, AppError> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        return Ok(None);
    }

    let args = Args {
        url: pargs
            .value_from_str("--url")
            .map_err(|e| AppError::Args(e.to_string()))?,
        logo: pargs
            .opt_value_from_str("--logo")
            .map_err(|e| AppError::Args(e.to_string()))?,
        padding: pargs
            .opt_value_from_str("--padding")
            .map_err(|e| AppError::Args(e.to_string()))?
            .unwrap_or(0),
        radius: pargs
            .opt_value_from_str("--radius")
            .map_err(|e| AppError::Args(e.to_string()))?
            .unwrap_or(0),
        out: pargs
            .opt_value_from_str("--out")
            .map_err(|e| AppError::Args(e.to_string()))?
            .unwrap_or_else(|| PathBuf::from(".")),
        config: pargs
            .opt_value_from_str("--config")
            .map_err(|e| AppError::Args(e.to_string()))?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(AppError::Args(format!("未知参数：{:?}", remaining)));
    }
    Ok(Some(args))
}

/// 按扩展名推断 MIME 类型，与浏览器文件输入框的行为一致。
fn mime_from_path(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => load_config_from_path(path),
        None => QrConfig::default(),
    };
    let revoke_delay = config.download_revoke_delay();
    let filename = config.download_filename.clone();

    let mut modal = QrModal::new(
        config,
        QrcodeRenderer::new(),
        RecordingView::new(),
        &StaticPage::qr_modal(),
    )?;
    modal.open(args.url.as_str())?;

    if let Some(path) = &args.logo {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let upload = LogoUpload::new(file_name, mime_from_path(path), bytes);
        if let Err(err) = modal.upload_logo(upload).await {
            for alert in modal.view().alerts() {
                eprintln!("{}", alert);
            }
            return Err(err.into());
        }
        modal.settle().await?;
    }

    modal.update_style(StyleParameters::new(args.padding, args.radius))?;

    let sink = Arc::new(DirectoryDownloadSink::new(&args.out));
    let url = modal.download(sink.clone()).await?;
    log::info!("✅ 已写入 {}", sink.dir().join(&filename).display());

    // 等待延迟释放完成
    tokio::time::sleep(revoke_delay).await;
    log::debug!("下载地址 {} 已释放：{}", url.0, !sink.is_live(&url));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return,
        Err(err) => {
            eprintln!("{}\n\n{}", err, HELP);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("❌ 无法创建异步运行时：{}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        log::error!("❌ 生成失败：{}", err);
        std::process::exit(1);
    }
}
