//! Grayscale template matching for locating an image on a screenshot.
//!
//! Scores are normalized cross-correlation in [-1, 1]. Both images are
//! shrunk first so the smaller template side is about
//! [`MIN_TEMPLATE_SIDE`] pixels, which keeps a full-screen search cheap.

use image::imageops::{self, FilterType};
use image::GrayImage;

use super::Region;

pub const MIN_TEMPLATE_SIDE: u32 = 12;

/// Best match location in `screen` coordinates, with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub region: Region,
    pub score: f32,
}

/// Finds `template` in `screen`; `None` unless the best score reaches `confidence`.
pub fn locate(screen: &GrayImage, template: &GrayImage, confidence: f32) -> Option<Match> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > screen.width() || th > screen.height() {
        return None;
    }

    let factor = (tw.min(th) / MIN_TEMPLATE_SIDE).max(1);
    let (screen_small, template_small) = if factor > 1 {
        (
            imageops::resize(
                screen,
                (screen.width() / factor).max(1),
                (screen.height() / factor).max(1),
                FilterType::Triangle,
            ),
            imageops::resize(
                template,
                (tw / factor).max(1),
                (th / factor).max(1),
                FilterType::Triangle,
            ),
        )
    } else {
        (screen.clone(), template.clone())
    };

    let (x, y, score) = best_match(&screen_small, &template_small)?;
    if score < confidence {
        return None;
    }
    Some(Match {
        region: Region {
            left: (x * factor) as i32,
            top: (y * factor) as i32,
            width: tw,
            height: th,
        },
        score,
    })
}

/// Exhaustive search; returns top-left and score of the best window.
fn best_match(screen: &GrayImage, template: &GrayImage) -> Option<(u32, u32, f32)> {
    let (sw, sh) = screen.dimensions();
    let (tw, th) = template.dimensions();
    if tw > sw || th > sh {
        return None;
    }
    let n = f64::from(tw * th);

    let t_mean = template.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / n;
    let centered: Vec<f64> = template.pixels().map(|p| f64::from(p.0[0]) - t_mean).collect();
    let t_norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();
    if t_norm == 0.0 {
        // a flat template correlates with nothing
        return None;
    }

    let integral = Integral::new(screen);
    let mut best: Option<(u32, u32, f64)> = None;
    for y in 0..=(sh - th) {
        for x in 0..=(sw - tw) {
            let (sum, sum_sq) = integral.window(x, y, tw, th);
            let variance = sum_sq - sum * sum / n;
            if variance <= f64::EPSILON {
                continue;
            }
            let mut cross = 0.0;
            for ty in 0..th {
                let row = (ty * tw) as usize;
                for tx in 0..tw {
                    let pixel = f64::from(screen.get_pixel(x + tx, y + ty).0[0]);
                    cross += centered[row + tx as usize] * pixel;
                }
            }
            let score = cross / (t_norm * variance.sqrt());
            if best.map_or(true, |(_, _, b)| score > b) {
                best = Some((x, y, score));
            }
        }
    }
    best.map(|(x, y, score)| (x, y, score as f32))
}

/// Summed-area tables of pixel values and squared pixel values.
struct Integral {
    width: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        let width = w as usize + 1;
        let mut sum = vec![0.0; width * (h as usize + 1)];
        let mut sum_sq = vec![0.0; width * (h as usize + 1)];
        for y in 0..h as usize {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w as usize {
                let v = f64::from(image.get_pixel(x as u32, y as u32).0[0]);
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * width + x + 1;
                sum[idx] = sum[idx - width] + row_sum;
                sum_sq[idx] = sum_sq[idx - width] + row_sq;
            }
        }
        Self { width, sum, sum_sq }
    }

    fn window(&self, x: u32, y: u32, w: u32, h: u32) -> (f64, f64) {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let at = |table: &[f64], x: usize, y: usize| table[y * self.width + x];
        let area = |table: &[f64]| at(table, x1, y1) - at(table, x0, y1) - at(table, x1, y0) + at(table, x0, y0);
        (area(&self.sum[..]), area(&self.sum_sq[..]))
    }
}
