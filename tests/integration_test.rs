use image::{Rgba, RgbaImage};

use imadjust::config::{EditorSettings, EngineSettings};
use imadjust::engine::{load_in_background, NativeEngine, MAX_THREADS};
use imadjust::{
    AdjustmentParams, Editor, Engine, EngineHandle, EngineStatus, Outcome, Pipeline, SkipReason,
    SourceImage, Surface,
};

fn ready_pipeline() -> Pipeline<NativeEngine> {
    let engine = NativeEngine::load(&EngineSettings { threads: 2 }).unwrap();
    Pipeline::new(EngineHandle::ready(engine))
}

fn gradient() -> SourceImage {
    let img = RgbaImage::from_fn(16, 16, |x, y| {
        Rgba([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, 255])
    });
    SourceImage::from_rgba(img)
}

fn solid(px: [u8; 3]) -> SourceImage {
    SourceImage::from_rgba(RgbaImage::from_pixel(2, 2, Rgba([px[0], px[1], px[2], 255])))
}

fn render(
    pipeline: &Pipeline<NativeEngine>,
    source: &SourceImage,
    params: AdjustmentParams,
) -> RgbaImage {
    let mut surface = Surface::new();
    let outcome = pipeline
        .adjust(Some(source), &params, Some(&mut surface))
        .unwrap();
    assert!(outcome.is_rendered());
    surface.pixels().clone()
}

fn mean_luma(img: &RgbaImage) -> f64 {
    let total: f64 = img
        .pixels()
        .map(|p| 0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2]))
        .sum();
    total / f64::from(img.width() * img.height())
}

#[test]
fn neutral_params_reproduce_the_source() {
    let pipeline = ready_pipeline();
    let source = gradient();
    let out = render(&pipeline, &source, AdjustmentParams::default());

    assert_eq!(out.dimensions(), source.pixels().dimensions());
    for (got, want) in out.pixels().zip(source.pixels().pixels()) {
        for c in 0..3 {
            let delta = (i32::from(got[c]) - i32::from(want[c])).abs();
            assert!(delta <= 6, "channel {} drifted by {}: {:?} vs {:?}", c, delta, got, want);
        }
        assert_eq!(got[3], 255);
    }
}

#[test]
fn neutral_params_keep_grays_exact() {
    let pipeline = ready_pipeline();
    for level in [0u8, 1, 37, 128, 254, 255] {
        let out = render(&pipeline, &solid([level; 3]), AdjustmentParams::default());
        assert_eq!(out.get_pixel(0, 0).0, [level, level, level, 255]);
    }
}

#[test]
fn brightness_is_monotonic_in_mean_luma() {
    let pipeline = ready_pipeline();
    let source = gradient();

    let darker = mean_luma(&render(&pipeline, &source, AdjustmentParams::new(50, 100, 100)));
    let neutral = mean_luma(&render(&pipeline, &source, AdjustmentParams::default()));
    let brighter = mean_luma(&render(&pipeline, &source, AdjustmentParams::new(150, 100, 100)));

    assert!(darker <= neutral, "{} > {}", darker, neutral);
    assert!(neutral <= brighter, "{} > {}", neutral, brighter);
}

#[test]
fn extremes_stay_in_range() {
    let pipeline = ready_pipeline();
    let source = gradient();

    for brightness in [0, 100, 200] {
        for contrast in [0, 100, 200] {
            for saturation in [0, 100, 200] {
                let params = AdjustmentParams::new(brightness, contrast, saturation);
                let out = render(&pipeline, &source, params);
                assert_eq!(out.dimensions(), (16, 16));
                assert!(out.pixels().all(|p| p[3] == 255));
            }
        }
    }

    // Overflow clamps at white instead of wrapping
    let out = render(&pipeline, &solid([240, 240, 240]), AdjustmentParams::new(200, 200, 100));
    assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255, 255]);

    // Underflow clamps at black
    let out = render(&pipeline, &solid([30, 60, 90]), AdjustmentParams::new(0, 100, 100));
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn repeated_runs_release_every_buffer() {
    let pipeline = ready_pipeline();
    let source = SourceImage::from_rgba(RgbaImage::from_fn(8, 8, |x, y| {
        Rgba([(x * 30) as u8, (y * 30) as u8, 90, 255])
    }));
    let mut surface = Surface::new();

    for i in 0..1000u32 {
        let params = AdjustmentParams::new(
            (i % 201) as u8,
            ((i * 7) % 201) as u8,
            ((i * 13) % 201) as u8,
        );
        pipeline
            .adjust(Some(&source), &params, Some(&mut surface))
            .unwrap();
    }

    let engine = pipeline.engine().engine().unwrap();
    assert_eq!(engine.live_buffers(), 0);
}

#[test]
fn unready_engine_leaves_surface_untouched() {
    let pipeline: Pipeline<NativeEngine> = Pipeline::new(EngineHandle::loading());
    let mut surface = Surface::new();
    surface.resize(2, 2);
    surface
        .replace(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])))
        .unwrap();

    let outcome = pipeline
        .adjust(Some(&gradient()), &AdjustmentParams::new(0, 0, 0), Some(&mut surface))
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::EngineNotReady));
    assert_eq!(surface.pixels().dimensions(), (2, 2));
    assert!(surface.pixels().pixels().all(|p| p.0 == [1, 2, 3, 4]));
}

#[test]
fn zero_saturation_turns_red_gray() {
    let pipeline = ready_pipeline();
    let out = render(&pipeline, &solid([200, 40, 40]), AdjustmentParams::new(100, 100, 0));
    let [r, g, b, _] = out.get_pixel(0, 0).0;
    assert_eq!(r, g);
    assert_eq!(g, b);
    // HSV desaturation keeps the value channel, the brightest component
    assert_eq!(r, 200);
}

#[test]
fn double_saturation_spreads_channels() {
    let pipeline = ready_pipeline();
    let out = render(&pipeline, &solid([150, 120, 120]), AdjustmentParams::new(100, 100, 200));
    let [r, g, b, _] = out.get_pixel(0, 0).0;
    assert_eq!(r, 150);
    assert!(g < 120 && b < 120, "{:?}", (r, g, b));
}

#[test]
fn full_brightness_adds_one_hundred() {
    let pipeline = ready_pipeline();
    let out = render(&pipeline, &solid([50, 50, 50]), AdjustmentParams::new(200, 100, 100));
    for c in 0..3 {
        assert!(out.get_pixel(0, 0)[c] >= 150);
    }
}

#[test]
fn zero_contrast_is_black() {
    let pipeline = ready_pipeline();
    let out = render(&pipeline, &gradient(), AdjustmentParams::new(100, 0, 100));
    assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn file_round_trip_through_editor() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("adjusted-image.png");
    gradient().pixels().save(&input).unwrap();

    let engine = NativeEngine::load(&EngineSettings::default()).unwrap();
    let mut editor = Editor::new(EngineHandle::ready(engine), EditorSettings::default());
    editor.set_params(AdjustmentParams::new(120, 110, 90)).unwrap();
    let outcome = editor.load_image(SourceImage::open(&input).unwrap()).unwrap();
    assert_eq!(outcome, Outcome::Rendered { width: 16, height: 16 });

    assert!(editor.save_png(&output).unwrap());
    let saved = image::open(&output).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (16, 16));
    assert_eq!(&saved, editor.surface().unwrap().pixels());
}

#[tokio::test]
async fn background_load_reports_failure() {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = load_in_background(
        &tokio::runtime::Handle::current(),
        EngineSettings {
            threads: MAX_THREADS + 1,
        },
        move || {
            let _ = tx.send(());
        },
    );

    rx.await.unwrap();
    assert!(matches!(handle.status(), EngineStatus::Failed(_)));
    assert!(!handle.is_ready());
}

#[tokio::test]
async fn editor_renders_once_engine_settles() {
    let source = gradient();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = load_in_background(
        &tokio::runtime::Handle::current(),
        EngineSettings { threads: 1 },
        move || {
            let _ = tx.send(());
        },
    );
    let mut editor = Editor::new(handle, EditorSettings::default());

    // The image may land before or after the engine; either way it renders exactly once.
    let first = editor.load_image(source).unwrap();
    rx.await.unwrap();
    let second = editor.poll_engine().unwrap();
    let third = editor.poll_engine().unwrap();

    let renders = [Some(first), second, third]
        .into_iter()
        .flatten()
        .filter(Outcome::is_rendered)
        .count();
    assert_eq!(renders, 1);
    assert!(editor.surface().unwrap().is_rendered());
}
