// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use pentimento::kurbo::{Point, Rect};
use pentimento::{ClipCoverage, ClipCoverageStack, Entity};
use pentimento_tests::{clip, clip_restore, replay_clip_region, Lcg};

const VIEWPORT: Rect = Rect::new(0., 0., 100., 100.);

fn random_rect(rng: &mut Lcg) -> Rect {
    let x0 = f64::from(rng.below(90));
    let y0 = f64::from(rng.below(90));
    let w = f64::from(rng.below(60) + 1);
    let h = f64::from(rng.below(60) + 1);
    Rect::new(x0, y0, x0 + w, y0 + h)
}

fn apply(stack: &mut ClipCoverageStack, entity: &Entity, floor: usize) -> (bool, bool) {
    let coverage = entity.clip_coverage(stack.current_clip_coverage());
    let result = stack.apply_clip_state(coverage, entity, floor, Point::ORIGIN);
    (result.should_render, result.clip_did_change)
}

fn assert_contiguous(stack: &ClipCoverageStack) {
    let layers = stack.clip_coverage_layers();
    let bottom = layers[0].clip_height;
    for (i, layer) in layers.iter().enumerate() {
        assert_eq!(layer.clip_height, bottom + i);
    }
}

#[test]
fn random_sequences_keep_heights_contiguous_and_replayable() {
    for seed in 0..16 {
        let mut rng = Lcg::new(seed);
        let mut stack = ClipCoverageStack::new(VIEWPORT);
        for _ in 0..200 {
            let top_height = stack.clip_coverage_layers().last().unwrap().clip_height;
            match rng.below(3) {
                0 if top_height > 0 => {
                    let (should_render, clip_did_change) =
                        apply(&mut stack, &clip_restore(top_height - 1), 0);
                    assert!(!should_render);
                    assert!(clip_did_change);
                }
                1 => {
                    let entity = pentimento_tests::solid(
                        random_rect(&mut rng),
                        pentimento::peniko::color::palette::css::RED,
                    );
                    let layers = stack.clip_coverage_layers().to_vec();
                    let (should_render, clip_did_change) = apply(&mut stack, &entity, 0);
                    assert!(should_render);
                    assert!(!clip_did_change);
                    assert_eq!(stack.clip_coverage_layers(), &layers[..]);
                }
                _ => {
                    let (should_render, clip_did_change) =
                        apply(&mut stack, &clip(random_rect(&mut rng)), 0);
                    assert!(should_render);
                    assert!(clip_did_change);
                }
            }
            assert_contiguous(&stack);
            assert_eq!(
                stack.replay_entities().len(),
                stack.clip_coverage_layers().len() - 1
            );
            assert_eq!(replay_clip_region(&stack), stack.current_clip_coverage());
        }
    }
}

#[test]
fn restoring_to_intermediate_layer_reestablishes_its_coverage() {
    let mut stack = ClipCoverageStack::new(VIEWPORT);
    let rects = [
        Rect::new(0., 0., 80., 80.),
        Rect::new(10., 10., 70., 70.),
        Rect::new(20., 20., 60., 60.),
        Rect::new(30., 30., 50., 50.),
    ];
    for rect in rects {
        apply(&mut stack, &clip(rect), 0);
    }
    assert_eq!(stack.clip_coverage_layers().len(), 5);

    apply(&mut stack, &clip_restore(2), 0);
    assert_eq!(stack.clip_coverage_layers().len(), 3);
    assert_eq!(stack.current_clip_coverage(), Some(rects[1]));
    assert_contiguous(&stack);
}

#[test]
fn multi_level_restore_drops_only_latest_record() {
    let mut stack = ClipCoverageStack::new(VIEWPORT);
    apply(&mut stack, &clip(Rect::new(0., 0., 50., 50.)), 0);
    apply(&mut stack, &clip(Rect::new(0., 0., 25., 25.)), 0);
    assert_eq!(stack.replay_entities().len(), 2);

    apply(&mut stack, &clip_restore(0), 0);
    assert_eq!(stack.clip_coverage_layers().len(), 1);
    // A restore undoes one recorded clip shape, however many layers it drops.
    assert_eq!(stack.replay_entities().len(), 1);
    assert_eq!(
        stack.replay_entities()[0].clip_coverage,
        Some(Rect::new(0., 0., 50., 50.))
    );
}

#[test]
fn restore_at_or_above_top_is_noop() {
    let mut stack = ClipCoverageStack::new(VIEWPORT);
    apply(&mut stack, &clip(Rect::new(0., 0., 50., 50.)), 0);
    let layers = stack.clip_coverage_layers().to_vec();
    for height in 1..4 {
        let result = stack.apply_clip_state(
            ClipCoverage::Restore(height),
            &clip_restore(height),
            0,
            Point::ORIGIN,
        );
        assert!(!result.should_render);
        assert!(!result.clip_did_change);
        assert_eq!(result.restore_coverage, None);
        assert_eq!(stack.clip_coverage_layers(), &layers[..]);
    }
}

#[test]
fn nested_subpasses_have_independent_frames() {
    let mut stack = ClipCoverageStack::new(VIEWPORT);
    apply(&mut stack, &clip(Rect::new(0., 0., 60., 60.)), 0);

    stack.push_subpass(Some(Rect::new(0., 0., 60., 60.)), 1);
    apply(&mut stack, &clip(Rect::new(10., 10., 40., 40.)), 1);
    assert_eq!(stack.clip_coverage_layers()[1].clip_height, 2);

    stack.push_subpass(Some(Rect::new(10., 10., 40., 40.)), 2);
    assert!(stack.replay_entities().is_empty());
    apply(&mut stack, &clip(Rect::new(20., 20., 30., 30.)), 2);
    assert_eq!(replay_clip_region(&stack), stack.current_clip_coverage());
    stack.pop_subpass();

    assert_eq!(stack.current_clip_coverage(), Some(Rect::new(10., 10., 40., 40.)));
    assert_eq!(stack.replay_entities().len(), 1);
    stack.pop_subpass();

    assert_eq!(stack.current_clip_coverage(), Some(Rect::new(0., 0., 60., 60.)));
    assert_eq!(stack.depth(), 1);
}

#[test]
fn empty_subpass_pairs_leave_parent_unchanged() {
    let mut stack = ClipCoverageStack::new(VIEWPORT);
    apply(&mut stack, &clip(Rect::new(5., 5., 95., 95.)), 0);
    let layers = stack.clip_coverage_layers().to_vec();
    let replay = stack
        .replay_entities()
        .iter()
        .map(|replay| replay.clip_coverage)
        .collect::<Vec<_>>();

    for _ in 0..3 {
        stack.push_subpass(None, 1);
        stack.pop_subpass();
    }

    assert_eq!(stack.clip_coverage_layers(), &layers[..]);
    assert_eq!(
        stack
            .replay_entities()
            .iter()
            .map(|replay| replay.clip_coverage)
            .collect::<Vec<_>>(),
        replay
    );
}
