// End-to-end QR modal flow: open → upload logo → style → download → scan
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use image::{ImageBuffer, Rgba};
use shortlink_studio::qr_studio::{
    DirectoryDownloadSink, LogoUpload, ModalState, QrConfig, QrModal, QrcodeRenderer,
    RecordingView, StaticPage, StyleParameters,
};

const LONG_URL: &str = "https://sho.rt/a-fairly-long-campaign-slug-2024";

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("shortlink-studio-it-{}-{}", name, nanos))
}

fn logo_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([220u8, 40, 40, 255])
        } else {
            Rgba([40u8, 40, 220, 255])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encode failed");
    bytes
}

fn new_modal() -> QrModal<QrcodeRenderer, RecordingView> {
    QrModal::new(
        QrConfig::default(),
        QrcodeRenderer::new(),
        RecordingView::new(),
        &StaticPage::qr_modal(),
    )
    .expect("modal should build")
}

fn scan(png: &[u8]) -> String {
    let luma = image::load_from_memory(png)
        .expect("png should decode")
        .to_luma8();
    let (w, h) = luma.dimensions();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
        luma.get_pixel(x as u32, y as u32).0[0]
    });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one code");
    let (_, content) = grids[0].decode().expect("code should decode");
    content
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exported_code_without_logo_scans_back_to_url() {
    let dir = temp_dir("plain");
    let sink = Arc::new(DirectoryDownloadSink::new(&dir));
    let mut modal = new_modal();

    modal.open(LONG_URL).expect("open failed");
    modal
        .update_style(StyleParameters::new(16, 0))
        .expect("style failed");
    modal.download(sink.clone()).await.expect("download failed");

    let png = std::fs::read(dir.join("qr-code.png")).expect("download written");
    let decoded = image::load_from_memory(&png).expect("png should decode");
    assert_eq!((decoded.width(), decoded.height()), (256 + 32, 256 + 32));
    assert_eq!(scan(&png), LONG_URL);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logo_overlay_keeps_code_scannable() {
    let dir = temp_dir("logo");
    let sink = Arc::new(DirectoryDownloadSink::new(&dir));
    let mut modal = new_modal();

    modal.open(LONG_URL).expect("open failed");
    modal
        .upload_logo(LogoUpload::new("logo.png", "image/png", logo_png(64, 64)))
        .await
        .expect("upload failed");
    assert_eq!(modal.state(), ModalState::LogoLoaded);

    let geometry = modal
        .settle()
        .await
        .expect("settle failed")
        .expect("logo composited");
    assert!((geometry.width - 76.8).abs() < 1e-9);

    modal
        .update_style(StyleParameters::new(20, 24))
        .expect("style failed");
    let url = modal.download(sink.clone()).await.expect("download failed");

    let png = std::fs::read(dir.join("qr-code.png")).expect("download written");
    let decoded = image::load_from_memory(&png)
        .expect("png should decode")
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (296, 296));
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0, "rounded corner is clipped");
    assert_eq!(decoded.get_pixel(148, 2).0, [255, 255, 255, 255]);
    assert_eq!(scan(&png), LONG_URL);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!sink.is_live(&url), "object url should be revoked");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reopening_discards_previous_logo() {
    let mut modal = new_modal();

    modal.open(LONG_URL).expect("open failed");
    modal
        .upload_logo(LogoUpload::new("logo.png", "image/png", logo_png(30, 90)))
        .await
        .expect("upload failed");
    modal.close();
    assert_eq!(modal.state(), ModalState::Closed);

    modal.open("https://sho.rt/other").expect("reopen failed");
    assert_eq!(modal.state(), ModalState::Fresh);
    assert!(modal.session().logo.is_none());
    assert_eq!(modal.session().target_url, "https://sho.rt/other");
    assert_eq!(modal.listener_count(), 1);
}
