// ============================================================================
// Exporter — write clamped crop regions to a timestamped folder
// ============================================================================

use chrono::Local;
use image::RgbaImage;
use image::imageops;
use std::path::{Path, PathBuf};

use crate::guide::CropBox;

/// A crop box reduced to the writable region of the image. Position clamps
/// happened in the planner; the size reduction at image edges happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Clamp a planned box to the image. `None` when nothing writable remains.
pub fn clamp_region(b: &CropBox, image_w: u32, image_h: u32) -> Option<ClampedRegion> {
    let x = b.rect.x.max(0) as u32;
    let y = b.rect.y.max(0) as u32;
    if x >= image_w || y >= image_h {
        return None;
    }
    let w = b.rect.w.min(image_w - x);
    let h = b.rect.h.min(image_h - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(ClampedRegion { x, y, w, h })
}

/// Export every surviving box to `{root}/Crops/{yyyyMMdd_HHmmss}/`, named
/// `crop_{NNN}.png` with NNN starting at 1 and incrementing only for boxes
/// actually written. Returns the number written.
///
/// Zero committed boxes (or zero survivors after clamping) is a no-op:
/// no directory is created and the count is 0.
pub fn export_crops(boxes: &[CropBox], original: &RgbaImage, root: &Path) -> Result<usize, String> {
    let (image_w, image_h) = original.dimensions();
    let regions: Vec<ClampedRegion> = boxes
        .iter()
        .filter_map(|b| clamp_region(b, image_w, image_h))
        .collect();
    if regions.is_empty() {
        return Ok(0);
    }

    let folder = root
        .join("Crops")
        .join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    std::fs::create_dir_all(&folder)
        .map_err(|e| format!("Failed to create {}: {}", folder.display(), e))?;

    let mut index = 1usize;
    for region in &regions {
        let path = folder.join(format!("crop_{:03}.png", index));
        let crop = imageops::crop_imm(original, region.x, region.y, region.w, region.h).to_image();
        crop.save(&path)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        index += 1;
    }
    Ok(index - 1)
}

/// Export destination root: the executable's directory, falling back to
/// the current working directory.
pub fn app_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::{CropAnchor, CropRect, GuideLine};
    use crate::planner;
    use egui::pos2;

    fn boxed(x: i32, y: i32, w: u32, h: u32) -> CropBox {
        CropBox {
            rect: CropRect { x, y, w, h },
            owner: 0,
            hovered: false,
        }
    }

    fn crop_files(dir: &Path) -> Vec<String> {
        let session = std::fs::read_dir(dir.join("Crops"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let mut names: Vec<String> = std::fs::read_dir(session)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn clamping_shrinks_edge_boxes_and_drops_empty_ones() {
        assert_eq!(
            clamp_region(&boxed(-100, -100, 500, 500), 1000, 1000),
            Some(ClampedRegion { x: 0, y: 0, w: 400, h: 400 })
        );
        assert_eq!(
            clamp_region(&boxed(800, 800, 500, 500), 1000, 1000),
            Some(ClampedRegion { x: 800, y: 800, w: 200, h: 200 })
        );
        assert_eq!(clamp_region(&boxed(1000, 0, 500, 500), 1000, 1000), None);
        assert_eq!(clamp_region(&boxed(0, 2000, 500, 500), 1000, 1000), None);
    }

    #[test]
    fn export_with_no_boxes_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::new(100, 100);
        assert_eq!(export_crops(&[], &img, dir.path()), Ok(0));
        assert!(!dir.path().join("Crops").exists());

        // A box entirely outside the image does not survive clamping.
        let gone = boxed(500, 500, 50, 50);
        assert_eq!(export_crops(&[gone], &img, dir.path()), Ok(0));
        assert!(!dir.path().join("Crops").exists());
    }

    #[test]
    fn end_to_end_line_export_writes_sequential_files() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(2000, 1500, image::Rgba([200, 100, 50, 255]));

        let line = GuideLine::new(pos2(100.0, 100.0), pos2(1100.0, 100.0), 500, CropAnchor::Center);
        let boxes = planner::plan(&line, 2000, 1500, 0);
        assert_eq!(boxes.len(), 3);

        let written = export_crops(&boxes, &img, dir.path()).unwrap();
        assert_eq!(written, 3);
        assert_eq!(crop_files(dir.path()), vec!["crop_001.png", "crop_002.png", "crop_003.png"]);

        // Every file decodes and is exactly pitch-sized (no edge clamp in
        // this geometry).
        let session = std::fs::read_dir(dir.path().join("Crops"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        for name in ["crop_001.png", "crop_002.png", "crop_003.png"] {
            let img = image::open(session.join(name)).unwrap();
            assert_eq!((img.width(), img.height()), (500, 500));
        }
    }

    #[test]
    fn index_skips_nothing_when_a_middle_box_dies() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(300, 300, image::Rgba([1, 2, 3, 255]));
        let boxes = [
            boxed(0, 0, 100, 100),
            boxed(900, 900, 100, 100), // outside, skipped
            boxed(100, 100, 100, 100),
        ];
        let written = export_crops(&boxes, &img, dir.path()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(crop_files(dir.path()), vec!["crop_001.png", "crop_002.png"]);
    }

    #[test]
    fn oversized_pitch_exports_the_whole_image() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(640, 480, image::Rgba([9, 9, 9, 255]));
        let written = export_crops(&[boxed(0, 0, 4096, 4096)], &img, dir.path()).unwrap();
        assert_eq!(written, 1);
        let session = std::fs::read_dir(dir.path().join("Crops"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let out = image::open(session.join("crop_001.png")).unwrap();
        assert_eq!((out.width(), out.height()), (640, 480));
    }
}
