use anyhow::Result;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mask_kernel::classify::{estimate_face_box, LocatorConfig};
use mask_kernel::detect::{NoFaceFinder, ReplayFaceFinder};
use mask_kernel::reduce::check_shape;
use mask_kernel::{
    reduce, BoundingBox, Detection, EngineConfig, FeatureVector, Frame, FramePipeline,
    MaskLabel, RawDetection, ReducerConfig, RegionClassifier, RegionSource, PERSON_CLASS_ID,
};

const SKIN: Rgb<u8> = Rgb([224, 172, 140]);
const SURGICAL_BLUE: Rgb<u8> = Rgb([90, 140, 200]);

fn det(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32) -> Detection {
    Detection::new(BoundingBox::new(x1, y1, x2, y2).unwrap(), confidence).unwrap()
}

fn person(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> RawDetection {
    RawDetection::new([x1, y1, x2, y2], PERSON_CLASS_ID, confidence)
}

#[test]
fn overlapping_duplicate_keeps_higher_confidence() {
    let input = [det(0, 0, 100, 100, 0.9), det(5, 5, 105, 105, 0.8)];
    let out = reduce(&input, &ReducerConfig::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out.as_slice()[0], input[0]);
}

#[test]
fn small_box_is_rejected_even_at_full_confidence() {
    // 20 x 25 = 500 square pixels, below the 2000 minimum.
    let out = reduce(&[det(0, 0, 20, 25, 1.0)], &ReducerConfig::default());
    assert!(out.is_empty());
}

#[test]
fn barely_visible_skin_is_mask_present() {
    let classifier = RegionClassifier::default();
    let features = FeatureVector {
        skin_ratio: 0.02,
        non_skin_ratio: 0.98,
        mask_color_ratio: 0.0,
        edge_density: 0.08,
        color_variance: 500.0,
        texture_std: 25.0,
    };
    let (breakdown, label) = classifier.decide_features(&features);
    assert!(breakdown.total >= 5, "score {}", breakdown.total);
    assert_eq!(label, MaskLabel::MaskPresent);
}

#[test]
fn mostly_skin_is_mask_absent() {
    let classifier = RegionClassifier::default();
    let features = FeatureVector {
        skin_ratio: 0.70,
        non_skin_ratio: 0.30,
        mask_color_ratio: 0.0,
        edge_density: 0.08,
        color_variance: 500.0,
        texture_std: 25.0,
    };
    let (breakdown, label) = classifier.decide_features(&features);
    assert!(breakdown.total <= -3, "score {}", breakdown.total);
    assert_eq!(label, MaskLabel::MaskAbsent);
}

#[test]
fn missing_face_is_estimated_from_person_box() {
    let face = estimate_face_box(
        &BoundingBox::new(0, 0, 200, 400).unwrap(),
        &LocatorConfig::default(),
    );
    assert_eq!(face, BoundingBox::new(20, 0, 180, 100).unwrap());
}

/// Two people side by side: the left one wears a blue mask over the lower
/// half of the estimated face region, the right one does not.
fn two_person_frame() -> Frame {
    let image = RgbImage::from_fn(440, 400, |x, y| {
        if x < 200 && (50..100).contains(&y) {
            SURGICAL_BLUE
        } else {
            SKIN
        }
    });
    Frame::from_image(image)
}

#[test]
fn end_to_end_masked_and_bare_faces() -> Result<()> {
    let pipeline = FramePipeline::new(EngineConfig::default())?;
    let raw = [
        person(0.0, 0.0, 200.0, 400.0, 0.95),
        person(220.0, 0.0, 420.0, 400.0, 0.85),
        // Near-duplicate of the first person.
        person(4.0, 2.0, 204.0, 402.0, 0.7),
        // Not a person.
        RawDetection::new([0.0, 0.0, 100.0, 100.0], 56, 0.99),
        // Below the detector confidence floor.
        person(300.0, 300.0, 400.0, 400.0, 0.3),
    ];
    let report = pipeline.process(&two_person_frame(), &raw, &mut NoFaceFinder);

    assert_eq!(report.persons.len(), 2);
    let masked = &report.persons[0];
    assert_eq!(masked.detection.confidence(), 0.95);
    assert_eq!(masked.regions.len(), 1);
    assert_eq!(masked.regions[0].source, RegionSource::Estimated);
    assert_eq!(masked.regions[0].label, MaskLabel::MaskPresent);
    assert_eq!(masked.regions[0].score, 14);

    let bare = &report.persons[1];
    assert_eq!(bare.regions[0].label, MaskLabel::MaskAbsent);
    assert_eq!(bare.regions[0].bbox, BoundingBox::new(240, 0, 400, 100)?);

    assert_eq!(report.summary.regions, 2);
    assert_eq!(report.summary.with_mask, 1);
    assert_eq!(report.summary.without_mask, 1);
    assert_eq!(report.summary.unknown, 0);
    Ok(())
}

#[test]
fn end_to_end_with_located_faces() -> Result<()> {
    let pipeline = FramePipeline::new(EngineConfig::default())?;
    let raw = [person(0.0, 0.0, 200.0, 400.0, 0.9)];
    // Face reported where the estimate would have put it.
    let mut finder = ReplayFaceFinder::new(vec![BoundingBox::new(20, 0, 180, 100)?]);
    let report = pipeline.process(&two_person_frame(), &raw, &mut finder);

    let region = &report.persons[0].regions[0];
    assert_eq!(region.source, RegionSource::Located);
    assert_eq!(region.confidence, 0.9);
    assert_eq!(region.label, MaskLabel::MaskPresent);
    Ok(())
}

#[test]
fn frame_processing_is_deterministic() -> Result<()> {
    let pipeline = FramePipeline::new(EngineConfig::default())?;
    let raw = [
        person(0.0, 0.0, 200.0, 400.0, 0.95),
        person(220.0, 0.0, 420.0, 400.0, 0.85),
    ];
    let frame = two_person_frame();
    let first = pipeline.process(&frame, &raw, &mut NoFaceFinder);
    let second = pipeline.process(&frame, &raw, &mut NoFaceFinder);
    assert_eq!(first, second);
    Ok(())
}

fn random_detections(rng: &mut StdRng, count: usize) -> Vec<Detection> {
    (0..count)
        .map(|_| {
            let x1 = rng.gen_range(0..600);
            let y1 = rng.gen_range(0..600);
            let w = rng.gen_range(10..250);
            let h = rng.gen_range(10..250);
            // Coarse confidences so ties actually happen.
            let confidence = rng.gen_range(0..=10) as f32 / 10.0;
            det(x1, y1, x1 + w, y1 + h, confidence)
        })
        .collect()
}

#[test]
fn reducer_invariants_hold_on_random_input() {
    let config = ReducerConfig::default();
    let mut rng = StdRng::seed_from_u64(0x6d61_736b);
    for _ in 0..200 {
        let count = rng.gen_range(0..40);
        let input = random_detections(&mut rng, count);
        let out = reduce(&input, &config);
        let kept = out.as_slice();

        // Every kept box came from the input and passes the shape checks.
        for d in kept {
            assert!(input.contains(d));
            assert!(check_shape(&d.bbox(), &config).is_ok());
        }
        // Confidence descending.
        for pair in kept.windows(2) {
            assert!(pair[0].confidence() >= pair[1].confidence());
        }
        // Pairwise overlap bounded.
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.bbox().iou(&b.bbox()) <= config.iou_threshold);
            }
        }
        // Every dropped box that passes the shape checks is covered by a kept one.
        for d in &input {
            if kept.contains(d) || check_shape(&d.bbox(), &config).is_err() {
                continue;
            }
            assert!(kept.iter().any(|k| k.bbox().iou(&d.bbox()) > config.iou_threshold
                && k.confidence() >= d.confidence()));
        }
        // Idempotent.
        assert_eq!(reduce(kept, &config), out);
    }
}

#[test]
fn reducer_tie_order_follows_input_order() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        // Disjoint, valid boxes on a grid, all with the same confidence.
        let count = rng.gen_range(1..10);
        let input: Vec<Detection> = (0..count)
            .map(|i| det(i * 100, 0, i * 100 + 60, 80, 0.5))
            .collect();
        let out = reduce(&input, &ReducerConfig::default());
        assert_eq!(out.as_slice(), input.as_slice());
    }
}
