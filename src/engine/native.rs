use image::RgbaImage;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{ColorConversion, Depth, Engine, Mat, MatData};
use crate::config::EngineSettings;
use crate::error::{Error, Result};
use crate::surface::Surface;

/// Refuse thread counts past this; anything larger is a config typo.
pub const MAX_THREADS: usize = 256;

const HSV_SHIFT: i32 = 12;
const HUE_RANGE: i32 = 180;

// Which of v, v(1-s), v(1-s*f), v(1-s(1-f)) lands in b, g, r for each hue sector.
const SECTOR_DATA: [[usize; 3]; 6] = [
    [1, 3, 0],
    [1, 0, 2],
    [3, 0, 1],
    [0, 2, 1],
    [0, 1, 3],
    [2, 1, 0],
];

/// Fixed-point reciprocals used by the 8-bit RGB -> HSV conversion.
struct HsvTables {
    sdiv: [i32; 256],
    hdiv: [i32; 256],
}

impl HsvTables {
    fn new() -> Self {
        let mut sdiv = [0; 256];
        let mut hdiv = [0; 256];
        for i in 1..256 {
            sdiv[i] = (f64::from(255 << HSV_SHIFT) / i as f64).round() as i32;
            hdiv[i] = (f64::from(HUE_RANGE << HSV_SHIFT) / (6.0 * i as f64)).round() as i32;
        }
        Self { sdiv, hdiv }
    }

    fn rgb_to_hsv(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);
        let round = 1 << (HSV_SHIFT - 1);

        let s = (diff * self.sdiv[v as usize] + round) >> HSV_SHIFT;

        let mut h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        h = (h * self.hdiv[diff as usize] + round) >> HSV_SHIFT;
        if h < 0 {
            h += HUE_RANGE;
        }

        [h as u8, s as u8, v as u8]
    }
}

fn hsv_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    let s = f32::from(s) / 255.0;
    let v = f32::from(v) / 255.0;

    let (r, g, b) = if s == 0.0 {
        (v, v, v)
    } else {
        let mut h = f32::from(h) * (6.0 / HUE_RANGE as f32);
        while h >= 6.0 {
            h -= 6.0;
        }
        let sector = h.floor();
        let f = h - sector;
        let tab = [v, v * (1.0 - s), v * (1.0 - s * f), v * (1.0 - s * (1.0 - f))];
        let idx = SECTOR_DATA[sector as usize % 6];
        (tab[idx[2]], tab[idx[1]], tab[idx[0]])
    };

    [
        saturate_u8(f64::from(r * 255.0)),
        saturate_u8(f64::from(g * 255.0)),
        saturate_u8(f64::from(b * 255.0)),
    ]
}

/// Round half to even, then clamp to 0..=255.
fn saturate_u8(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

fn element(data: &MatData, i: usize) -> f64 {
    match data {
        MatData::U8(v) => f64::from(v[i]),
        MatData::F32(v) => f64::from(v[i]),
    }
}

/// CPU engine following 8-bit OpenCV semantics, parallelized on its own
/// rayon pool.
pub struct NativeEngine {
    pool: ThreadPool,
    tables: HsvTables,
    live: Arc<AtomicUsize>,
}

impl NativeEngine {
    pub fn load(settings: &EngineSettings) -> Result<Self> {
        if settings.threads > MAX_THREADS {
            return Err(Error::EngineLoad(format!(
                "{} threads requested, at most {} allowed",
                settings.threads, MAX_THREADS
            )));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .thread_name(|i| format!("imadjust-engine-{}", i))
            .build()
            .map_err(|e| Error::EngineLoad(format!("failed to build thread pool: {}", e)))?;

        log::debug!(
            "native engine loaded with {} worker threads",
            pool.current_num_threads()
        );

        Ok(Self {
            pool,
            tables: HsvTables::new(),
            live: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn alloc(&self, rows: usize, cols: usize, channels: usize, data: MatData) -> Result<Mat> {
        Ok(Mat::new(rows, cols, channels, data)?.leased(&self.live))
    }
}

impl Engine for NativeEngine {
    fn read(&self, image: &RgbaImage) -> Mat {
        let rows = image.height() as usize;
        let cols = image.width() as usize;
        Mat::from_parts(rows, cols, 4, MatData::U8(image.as_raw().clone())).leased(&self.live)
    }

    fn convert_to(&self, src: &Mat, alpha: f64, beta: f64) -> Mat {
        let data = self.pool.install(|| match src.data() {
            MatData::U8(v) => MatData::U8(
                v.par_iter()
                    .map(|&x| saturate_u8(f64::from(x) * alpha + beta))
                    .collect(),
            ),
            MatData::F32(v) => MatData::F32(
                v.par_iter()
                    .map(|&x| (f64::from(x) * alpha + beta) as f32)
                    .collect(),
            ),
        });
        Mat::from_parts(src.rows(), src.cols(), src.channels(), data).leased(&self.live)
    }

    fn cvt_color(&self, src: &Mat, code: ColorConversion) -> Result<Mat> {
        let input = src.as_u8()?;
        let scn = src.channels();
        let pixels = src.rows() * src.cols();
        let mut out = vec![0u8; pixels * 3];

        match code {
            ColorConversion::RgbToHsv => {
                if scn != 3 && scn != 4 {
                    return Err(Error::Engine(format!(
                        "RGB to HSV needs 3 or 4 channels, got {}",
                        scn
                    )));
                }
                self.pool.install(|| {
                    out.par_chunks_mut(3)
                        .zip(input.par_chunks(scn))
                        .for_each(|(dst, px)| {
                            dst.copy_from_slice(&self.tables.rgb_to_hsv(px[0], px[1], px[2]));
                        });
                });
            }
            ColorConversion::HsvToRgb => {
                if scn != 3 {
                    return Err(Error::Engine(format!(
                        "HSV to RGB needs 3 channels, got {}",
                        scn
                    )));
                }
                self.pool.install(|| {
                    out.par_chunks_mut(3)
                        .zip(input.par_chunks(3))
                        .for_each(|(dst, px)| {
                            dst.copy_from_slice(&hsv_to_rgb(px[0], px[1], px[2]));
                        });
                });
            }
        }

        self.alloc(src.rows(), src.cols(), 3, MatData::U8(out))
    }

    fn split(&self, src: &Mat) -> Vec<Mat> {
        let cn = src.channels();
        (0..cn)
            .map(|c| {
                let data = match src.data() {
                    MatData::U8(v) => MatData::U8(v.iter().skip(c).step_by(cn).copied().collect()),
                    MatData::F32(v) => {
                        MatData::F32(v.iter().skip(c).step_by(cn).copied().collect())
                    }
                };
                Mat::from_parts(src.rows(), src.cols(), 1, data).leased(&self.live)
            })
            .collect()
    }

    fn merge(&self, channels: &[Mat]) -> Result<Mat> {
        let first = channels
            .first()
            .ok_or_else(|| Error::Engine("cannot merge zero channels".to_string()))?;
        for plane in channels {
            if plane.channels() != 1 || !plane.same_shape(first) || plane.depth() != first.depth()
            {
                return Err(Error::Engine(
                    "merge needs single channel mats of equal size and depth".to_string(),
                ));
            }
        }

        let cn = channels.len();
        let pixels = first.rows() * first.cols();
        let data = match first.depth() {
            Depth::U8 => {
                let mut out = vec![0u8; pixels * cn];
                for (c, plane) in channels.iter().enumerate() {
                    for (i, &x) in plane.as_u8()?.iter().enumerate() {
                        out[i * cn + c] = x;
                    }
                }
                MatData::U8(out)
            }
            Depth::F32 => {
                let mut out = vec![0f32; pixels * cn];
                for (c, plane) in channels.iter().enumerate() {
                    if let MatData::F32(v) = plane.data() {
                        for (i, &x) in v.iter().enumerate() {
                            out[i * cn + c] = x;
                        }
                    }
                }
                MatData::F32(out)
            }
        };

        self.alloc(first.rows(), first.cols(), cn, data)
    }

    fn multiply(&self, a: &Mat, b: &Mat) -> Result<Mat> {
        if !a.same_shape(b) {
            return Err(Error::Engine(format!(
                "multiply needs equal shapes, got {}x{}x{} and {}x{}x{}",
                a.rows(),
                a.cols(),
                a.channels(),
                b.rows(),
                b.cols(),
                b.channels()
            )));
        }

        let len = a.data().len();
        let data = self.pool.install(|| match a.depth() {
            Depth::U8 => MatData::U8(
                (0..len)
                    .into_par_iter()
                    .map(|i| saturate_u8(element(a.data(), i) * element(b.data(), i)))
                    .collect(),
            ),
            Depth::F32 => MatData::F32(
                (0..len)
                    .into_par_iter()
                    .map(|i| (element(a.data(), i) * element(b.data(), i)) as f32)
                    .collect(),
            ),
        });

        self.alloc(a.rows(), a.cols(), a.channels(), data)
    }

    fn filled(&self, rows: usize, cols: usize, depth: Depth, value: f64) -> Mat {
        let data = match depth {
            Depth::U8 => MatData::U8(vec![saturate_u8(value); rows * cols]),
            Depth::F32 => MatData::F32(vec![value as f32; rows * cols]),
        };
        Mat::from_parts(rows, cols, 1, data).leased(&self.live)
    }

    fn show(&self, mat: &Mat, surface: &mut Surface) -> Result<()> {
        let input = mat.as_u8()?;
        let rgba: Vec<u8> = match mat.channels() {
            1 => input.iter().flat_map(|&x| [x, x, x, 255]).collect(),
            3 => input
                .chunks(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            4 => input.to_vec(),
            n => {
                return Err(Error::Engine(format!(
                    "cannot display a {} channel mat",
                    n
                )))
            }
        };

        let (width, height) = (mat.cols() as u32, mat.rows() as u32);
        let image = RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| Error::Engine("display buffer size mismatch".to_string()))?;

        if (surface.width(), surface.height()) != (width, height) {
            surface.resize(width, height);
        }
        surface.replace(image)
    }

    fn live_buffers(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}
