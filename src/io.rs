// ============================================================================
// Raster collaborators — decode, displayed-representation build, file picking
// ============================================================================

use image::RgbaImage;
use image::imageops::{self, FilterType};
use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// Largest the displayed (on-screen) raster is allowed to be. The full
/// resolution stays in memory for cropping; the displayed copy exists so
/// panning and texture upload stay cheap on huge inputs.
pub const DISPLAY_MAX_W: u32 = 1600;
pub const DISPLAY_MAX_H: u32 = 1200;

/// Decode an image file to RGBA at full resolution.
pub fn load_full_resolution(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?;
    Ok(img.into_rgba8())
}

/// Build the downscaled on-screen representation: fit inside the display
/// cap preserving aspect ratio, never upscale. Lanczos3 for quality — this
/// runs once per load, off the UI thread.
pub fn build_displayed(full: &RgbaImage) -> RgbaImage {
    let (w, h) = full.dimensions();
    let scale = (DISPLAY_MAX_W as f64 / w as f64)
        .min(DISPLAY_MAX_H as f64 / h as f64)
        .min(1.0);
    if scale >= 1.0 {
        return full.clone();
    }
    let dw = ((w as f64 * scale) as u32).max(1);
    let dh = ((h as f64 * scale) as u32).max(1);
    imageops::resize(full, dw, dh, FilterType::Lanczos3)
}

/// Native open-image dialog. `None` when the user cancels.
pub fn pick_image_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Image Files", &["png", "jpg", "jpeg", "bmp"])
        .pick_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_images_are_displayed_as_is() {
        let img = RgbaImage::new(800, 600);
        assert_eq!(build_displayed(&img).dimensions(), (800, 600));
    }

    #[test]
    fn large_images_fit_the_display_cap_preserving_aspect() {
        let img = RgbaImage::new(4000, 3000);
        assert_eq!(build_displayed(&img).dimensions(), (1600, 1200));

        let tall = RgbaImage::new(1000, 4800);
        assert_eq!(build_displayed(&tall).dimensions(), (250, 1200));
    }

    #[test]
    fn missing_file_reports_a_recoverable_error() {
        assert!(load_full_resolution(Path::new("/nonexistent/nope.png")).is_err());
    }
}
