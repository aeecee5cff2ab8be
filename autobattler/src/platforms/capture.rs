//! Screen capture and template matching: the production implementation
//! of the visual sensor.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use tokio::task;

use crate::errors::BotError;
use crate::marker::{AssetCatalog, Marker, MarkerQuery};
use crate::sensor::{Point, ScreenSensor};

// Scanning every pixel of a full screen against every template pixel is
// wasteful at a 100ms poll cadence; both strides trade a little spatial
// precision (bounded by the click jitter anyway) for an order of
// magnitude less work.
const SCAN_STRIDE: usize = 2;
const SAMPLE_STRIDE: usize = 2;

struct Template {
    width: usize,
    height: usize,
    /// Packed RGB, 3 bytes per pixel.
    rgb: Vec<u8>,
    /// Packed luma, 1 byte per pixel.
    luma: Vec<u8>,
}

/// Locates markers by scanning a primary-monitor screenshot for the
/// closest region to the marker's reference image.
pub struct TemplateSensor {
    templates: Arc<HashMap<Marker, Template>>,
}

impl TemplateSensor {
    /// Load every marker template eagerly so a bad asset fails at
    /// startup, not mid-run.
    pub fn load(catalog: &AssetCatalog) -> Result<Self, BotError> {
        let mut templates = HashMap::new();
        for marker in Marker::ALL {
            let path = catalog.path(marker);
            let img = image::open(&path)
                .map_err(|err| BotError::AssetMissing(format!("{}: {err}", path.display())))?;
            let rgb = img.to_rgb8();
            let luma = img.to_luma8();
            templates.insert(
                marker,
                Template {
                    width: rgb.width() as usize,
                    height: rgb.height() as usize,
                    rgb: rgb.into_raw(),
                    luma: luma.into_raw(),
                },
            );
        }
        Ok(Self {
            templates: Arc::new(templates),
        })
    }
}

#[async_trait::async_trait]
impl ScreenSensor for TemplateSensor {
    async fn locate(&self, query: &MarkerQuery) -> Result<Option<Point>, BotError> {
        let templates = Arc::clone(&self.templates);
        let query = *query;
        // Capture and the scan are CPU bound; keep them off the runtime.
        task::spawn_blocking(move || {
            let template = templates
                .get(&query.marker)
                .ok_or_else(|| BotError::Sensor(format!("no template for {}", query.marker)))?;
            let screen = capture_primary()?;
            Ok(best_match(&screen, template, &query))
        })
        .await
        .map_err(|err| BotError::Sensor(format!("capture task failed: {err}")))?
    }
}

fn capture_primary() -> Result<RgbaImage, BotError> {
    let monitors = xcap::Monitor::all()
        .map_err(|err| BotError::PlatformError(format!("failed to enumerate monitors: {err}")))?;
    let primary = monitors
        .into_iter()
        .find(|monitor| monitor.is_primary().unwrap_or(false))
        .ok_or_else(|| BotError::PlatformError("could not find primary monitor".to_string()))?;
    primary
        .capture_image()
        .map_err(|err| BotError::PlatformError(format!("failed to capture screen: {err}")))
}

/// Slide the template over the screenshot and return the center of the
/// best-scoring position, if it clears the query threshold.
fn best_match(screen: &RgbaImage, template: &Template, query: &MarkerQuery) -> Option<Point> {
    let sw = screen.width() as usize;
    let sh = screen.height() as usize;
    let tw = template.width;
    let th = template.height;
    if tw == 0 || th == 0 || tw > sw || th > sh {
        return None;
    }

    let screen_luma = if query.grayscale {
        Some(image::imageops::grayscale(screen))
    } else {
        None
    };

    let mut best_score = f32::MIN;
    let mut best_at = (0usize, 0usize);
    for y in (0..=sh - th).step_by(SCAN_STRIDE) {
        for x in (0..=sw - tw).step_by(SCAN_STRIDE) {
            let score = match &screen_luma {
                Some(luma) => score_luma(luma.as_raw(), sw, template, x, y),
                None => score_rgb(screen.as_raw(), sw, template, x, y),
            };
            if score > best_score {
                best_score = score;
                best_at = (x, y);
            }
        }
    }

    (best_score >= query.threshold).then(|| {
        Point::new(
            (best_at.0 + tw / 2) as i32,
            (best_at.1 + th / 2) as i32,
        )
    })
}

/// Similarity in `0.0..=1.0`: one minus the mean absolute channel
/// difference over the sampled template pixels.
fn score_rgb(screen: &[u8], screen_width: usize, template: &Template, x: usize, y: usize) -> f32 {
    let mut total: u64 = 0;
    let mut samples: u64 = 0;
    for ty in (0..template.height).step_by(SAMPLE_STRIDE) {
        for tx in (0..template.width).step_by(SAMPLE_STRIDE) {
            let s = ((y + ty) * screen_width + (x + tx)) * 4;
            let t = (ty * template.width + tx) * 3;
            for channel in 0..3 {
                total += u64::from(screen[s + channel].abs_diff(template.rgb[t + channel]));
            }
            samples += 3;
        }
    }
    1.0 - (total as f32 / samples as f32) / 255.0
}

fn score_luma(screen: &[u8], screen_width: usize, template: &Template, x: usize, y: usize) -> f32 {
    let mut total: u64 = 0;
    let mut samples: u64 = 0;
    for ty in (0..template.height).step_by(SAMPLE_STRIDE) {
        for tx in (0..template.width).step_by(SAMPLE_STRIDE) {
            let s = (y + ty) * screen_width + (x + tx);
            let t = ty * template.width + tx;
            total += u64::from(screen[s].abs_diff(template.luma[t]));
            samples += 1;
        }
    }
    1.0 - (total as f32 / samples as f32) / 255.0
}
