//! End-to-end batch pipeline tests
//!
//! Drives whole runs over temp directories with test segmenters, covering
//! failure isolation, eligibility filtering, opacity of outputs, and
//! determinism across repeated runs.

use blackdrop::{
    run_batch, BackdropColor, BatchConfig, BatchProcessor, PassthroughSegmenter, PipelineError,
    Result, Segmenter,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;
use tempfile::tempdir;

fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn opaque_png(width: u32, height: u32, pixel: [u8; 3]) -> Vec<u8> {
    png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb(pixel),
    )))
}

fn subject_with_edges_png() -> Vec<u8> {
    // Opaque center, transparent corners, anti-aliased in between
    let mut image = RgbaImage::new(8, 8);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let alpha = match (x, y) {
            (2..=5, 2..=5) => 255,
            (1..=6, 1..=6) => 128,
            _ => 0,
        };
        *pixel = Rgba([220, 150, 70, alpha]);
    }
    png_bytes(DynamicImage::ImageRgba8(image))
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn processes_only_eligible_files() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    std::fs::write(input.join("a.png"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("b.PNG"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("c.jpeg"), opaque_png(4, 4, [10, 20, 30])).unwrap();
    std::fs::write(input.join("notes.txt"), b"not an image").unwrap();
    std::fs::write(input.join("d.gif"), b"GIF89a...").unwrap();

    let summary = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 3);
    assert!(summary.failed.is_empty());
    assert_eq!(output_files(&output), vec!["a.png", "b.PNG", "c.jpeg"]);
}

#[test]
fn one_segmentation_failure_among_many_is_isolated() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let poison = opaque_png(2, 2, [66, 66, 66]);
    std::fs::write(input.join("a.png"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("b.png"), &poison).unwrap();
    std::fs::write(input.join("c.png"), subject_with_edges_png()).unwrap();

    let trigger = poison.clone();
    let segmenter = move |bytes: &[u8]| -> Result<Vec<u8>> {
        if bytes == trigger.as_slice() {
            Err(PipelineError::segmentation("model returned 500"))
        } else {
            Ok(bytes.to_vec())
        }
    };

    let summary = run_batch(&input, &output, Box::new(segmenter)).unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed_file_names(), vec!["b.png"]);
    assert!(summary.failed[0].reason.contains("segmentation"));
    assert_eq!(output_files(&output), vec!["a.png", "c.png"]);
}

#[test]
fn missing_input_directory_is_fatal_and_writes_nothing() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("never_created");
    let output = temp.path().join("out");

    let err = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap_err();

    assert!(matches!(err, PipelineError::MissingInputDirectory { .. }));
    assert!(err.is_fatal());
    assert!(output_files(&output).is_empty());
}

#[test]
fn outputs_are_opaque_with_source_dimensions() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("subject.png"), subject_with_edges_png()).unwrap();

    run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();

    let written = image::open(output.join("subject.png")).unwrap();
    assert!(!written.color().has_alpha());
    assert_eq!((written.width(), written.height()), (8, 8));

    // Transparent corners became pure backdrop, opaque center kept its color
    let rgb = written.to_rgb8();
    assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(rgb.get_pixel(3, 3).0, [220, 150, 70]);
    // Anti-aliased ring is a proportional blend, not a hard cutout
    let edge = rgb.get_pixel(1, 1).0;
    assert!(edge[0] > 0 && edge[0] < 220, "edge not blended: {edge:?}");
}

#[test]
fn configured_backdrop_replaces_transparent_regions() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let fully_transparent = png_bytes(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        3,
        3,
        Rgba([200, 200, 200, 0]),
    )));
    std::fs::write(input.join("ghost.png"), fully_transparent).unwrap();

    let config = BatchConfig::builder()
        .input_dir(&input)
        .output_dir(&output)
        .backdrop(BackdropColor::new(0, 64, 128))
        .build()
        .unwrap();
    BatchProcessor::new(config, Box::new(PassthroughSegmenter))
        .run()
        .unwrap();

    let written = image::open(output.join("ghost.png")).unwrap().to_rgb8();
    for pixel in written.pixels() {
        assert_eq!(pixel.0, [0, 64, 128]);
    }
}

#[test]
fn unreadable_and_corrupt_files_are_recorded_not_fatal() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    std::fs::write(input.join("good.png"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("broken.png"), b"definitely not a png").unwrap();

    let summary = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed_file_names(), vec!["broken.png"]);
    assert!(summary.failed[0].reason.contains("decode"));
    assert_eq!(output_files(&output), vec!["good.png"]);
}

#[test]
fn repeated_runs_produce_identical_bytes() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("a.png"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("b.jpg"), opaque_png(6, 6, [90, 45, 10])).unwrap();

    let first_out = temp.path().join("out1");
    let second_out = temp.path().join("out2");
    run_batch(&input, &first_out, Box::new(PassthroughSegmenter)).unwrap();
    run_batch(&input, &second_out, Box::new(PassthroughSegmenter)).unwrap();

    for name in ["a.png", "b.jpg"] {
        let first = std::fs::read(first_out.join(name)).unwrap();
        let second = std::fs::read(second_out.join(name)).unwrap();
        assert_eq!(first, second, "output bytes differ for {name}");
    }
}

#[test]
fn rerunning_into_same_output_overwrites_cleanly() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("a.png"), subject_with_edges_png()).unwrap();

    run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();
    let first = std::fs::read(output.join("a.png")).unwrap();

    let summary = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();
    let second = std::fs::read(output.join("a.png")).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(first, second);
    assert_eq!(output_files(&output), vec!["a.png"]);
}

#[test]
fn segmenter_output_format_may_differ_from_input() {
    // A rembg-style service returns PNG even for JPEG inputs; the pipeline
    // must still encode the composite under the source filename's format.
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("photo.jpg"), opaque_png(5, 5, [123, 50, 7])).unwrap();

    let segmenter = |_: &[u8]| -> Result<Vec<u8>> {
        let mut image = RgbaImage::from_pixel(5, 5, Rgba([255, 255, 255, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        Ok(bytes)
    };

    let summary = run_batch(&input, &output, Box::new(segmenter)).unwrap();
    assert_eq!(summary.succeeded, 1);

    let written = image::open(output.join("photo.jpg")).unwrap();
    assert!(!written.color().has_alpha());
    assert_eq!((written.width(), written.height()), (5, 5));
}

#[test]
fn all_files_failing_still_returns_a_summary() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("a.png"), subject_with_edges_png()).unwrap();
    std::fs::write(input.join("b.png"), subject_with_edges_png()).unwrap();

    let segmenter =
        |_: &[u8]| -> Result<Vec<u8>> { Err(PipelineError::segmentation("service offline")) };
    let summary = run_batch(&input, &output, Box::new(segmenter)).unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed_file_names(), vec!["a.png", "b.png"]);
    assert!(output_files(&output).is_empty());
}

#[test]
fn empty_input_directory_yields_empty_summary() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let summary = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();

    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.succeeded, 0);
    assert!(summary.is_complete_success());
    assert!(output.is_dir());
}

#[test]
fn webp_subjects_are_flattened() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();

    let image = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 30, 128]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::WebP,
        )
        .unwrap();
    std::fs::write(input.join("half.webp"), bytes).unwrap();

    let summary = run_batch(&input, &output, Box::new(PassthroughSegmenter)).unwrap();
    assert_eq!(summary.succeeded, 1);

    let written = image::open(output.join("half.webp")).unwrap();
    assert!(!written.color().has_alpha());
    // 50% alpha over black halves each channel (rounded)
    let pixel = written.to_rgb8().get_pixel(0, 0).0;
    assert_eq!(pixel, [5, 100, 15]);
}

#[test]
fn custom_segmenter_trait_objects_work_end_to_end() {
    struct InvertingSegmenter;
    impl Segmenter for InvertingSegmenter {
        fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
            let decoded = image::load_from_memory(image_bytes)
                .map_err(|e| PipelineError::segmentation(format!("decode failed: {e}")))?;
            let mut rgba = decoded.to_rgba8();
            for pixel in rgba.pixels_mut() {
                // Mark everything background except one corner pixel
                pixel.0[3] = 0;
            }
            rgba.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
            let mut bytes = Vec::new();
            DynamicImage::ImageRgba8(rgba)
                .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            Ok(bytes)
        }
    }

    let temp = tempdir().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("a.png"), opaque_png(3, 3, [50, 50, 50])).unwrap();

    run_batch(&input, &output, Box::new(InvertingSegmenter)).unwrap();

    let written = image::open(output.join("a.png")).unwrap().to_rgb8();
    assert_eq!(written.get_pixel(0, 0).0, [255, 0, 0]);
    assert_eq!(written.get_pixel(2, 2).0, [0, 0, 0]);
}
