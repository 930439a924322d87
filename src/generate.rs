// ABOUTME: Build pipeline for the clickcast editor
// ABOUTME: Turns a presentation and its screenshots into a deployable playback bundle

use crate::config::BuildConfig;
use crate::errors::{CastError, Result};
use crate::html;
use crate::model::Presentation;
use crate::resources::{self, AssetLocation};
use crate::utils;
use image::imageops::FilterType;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What a build wrote.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub html_path: PathBuf,
    pub images: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
    /// Size of the images in the bundle.
    pub image_size: (u32, u32),
}

/// Output size for a source image given the requested size.
///
/// A zero dimension is inferred from the source aspect ratio. When both are
/// set they are used as they are, even if that distorts the image.
pub fn resized_dimensions(source: (u32, u32), requested: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (req_w, req_h) = requested;
    if src_w == 0 || src_h == 0 {
        return requested;
    }
    match (req_w, req_h) {
        (0, 0) => source,
        (0, h) => (scale(src_w, h, src_h), h),
        (w, 0) => (w, scale(src_h, w, src_w)),
        (w, h) => (w, h),
    }
}

/// `value * num / den`, rounded, never below 1.
fn scale(value: u32, num: u32, den: u32) -> u32 {
    let scaled = (value as u64 * num as u64 + den as u64 / 2) / den as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

/// Write a resized copy of `source` to `target`. Returns the size written.
pub fn resize_image(source: &Path, target: &Path, requested: (u32, u32)) -> Result<(u32, u32)> {
    let img = image::open(source).map_err(|e| CastError::ImageError {
        path: source.to_path_buf(),
        source: e,
    })?;
    let original = (img.width(), img.height());
    let (width, height) = resized_dimensions(original, requested);

    if (width, height) == original {
        debug!("Copying {:?} unchanged", source);
        fs::copy(source, target).map_err(|e| CastError::io(target, e))?;
    } else {
        debug!(
            "Resizing {:?} from {}x{} to {}x{}",
            source, original.0, original.1, width, height
        );
        img.resize_exact(width, height, FilterType::Lanczos3)
            .save(target)
            .map_err(|e| CastError::ImageError {
                path: target.to_path_buf(),
                source: e,
            })?;
    }
    Ok((width, height))
}

/// Slide images are flattened into one output directory by file name. Two
/// different image paths sharing a file name, or a screenshot named like a
/// runtime icon, would overwrite each other there.
fn check_output_names(presentation: &Presentation, image_out_dir: &Path) -> Result<()> {
    let reserved: HashSet<&str> = resources::RUNTIME_ASSETS
        .iter()
        .filter(|a| a.location == AssetLocation::Images)
        .map(|a| a.name)
        .collect();

    let mut owners: HashMap<&OsStr, &str> = HashMap::new();
    for slide_image in presentation.image_paths() {
        let Some(file_name) = Path::new(slide_image).file_name() else {
            continue;
        };
        let name = file_name.to_string_lossy();
        let clash = if reserved.contains(&*name) {
            Some("a runtime asset".to_string())
        } else {
            owners
                .insert(file_name, slide_image)
                .map(|other| format!("image {}", other))
        };
        if let Some(other) = clash {
            return Err(CastError::ValidationError {
                path: image_out_dir.join(file_name),
                message: format!("{} would overwrite {}", slide_image, other),
            });
        }
    }
    Ok(())
}

/// Generate the playback bundle for `presentation` into `output_dir`.
///
/// Stops at the first failure. Whatever was already written stays in place.
pub fn generate_build(
    presentation: &Presentation,
    source_image_dir: &Path,
    output_dir: &Path,
    config: &BuildConfig,
) -> Result<BuildReport> {
    info!("Generating build in {:?}", output_dir);
    let start_time = Instant::now();

    utils::ensure_directory_exists(output_dir)?;
    let image_out_dir = output_dir.join(&config.image_dir_name);
    utils::ensure_directory_exists(&image_out_dir)?;

    check_output_names(presentation, &image_out_dir)?;

    let requested = (presentation.output_width, presentation.output_height);
    let mut images = Vec::new();
    let mut image_size = None;
    for slide_image in presentation.image_paths() {
        let file_name = Path::new(slide_image)
            .file_name()
            .ok_or_else(|| CastError::ValidationError {
                path: PathBuf::from(slide_image),
                message: "image path has no file name".to_string(),
            })?;
        let source = source_image_dir.join(file_name);
        utils::validate_file_exists(&source)?;

        let target = image_out_dir.join(file_name);
        let size = resize_image(&source, &target, requested)?;
        if image_size.is_none() {
            image_size = Some(size);
        }
        images.push(target);
    }
    info!("Wrote {} slide images", images.len());

    let image_size = image_size.unwrap_or(requested);
    let state_json =
        html::generate_state_json(presentation, &config.image_dir_name, image_size)?;
    let css = html::generate_css(image_size);
    let html_doc = html::generate_html(&state_json, &css);

    let html_path = output_dir.join(&config.html_file_name);
    html::write_html_to_file(&html_doc, &html_path)?;

    let assets = resources::copy_runtime_assets(
        output_dir,
        &config.image_dir_name,
        config.resource_dir.as_deref(),
    )?;

    info!(
        "Build complete: {} slides in {:.2} seconds",
        presentation.slides.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(BuildReport {
        html_path,
        images,
        assets,
        image_size,
    })
}
