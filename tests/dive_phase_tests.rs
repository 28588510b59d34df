use dive_core::{
    Depth, DiveEvent, DiveManager, DivePhase, DiveProfile, DiveSample, ModelSnapshot,
};

fn snap() -> ModelSnapshot {
    ModelSnapshot::default()
}

fn tick(dm: &mut DiveManager, now: &mut u32, depth: f32) -> Option<DiveEvent> {
    *now += 1;
    dm.update(*now, Depth::from_meters(depth), 19., &snap())
}

fn start_dive_at(dm: &mut DiveManager, now: &mut u32, depth: f32) {
    loop {
        if tick(dm, now, depth) == Some(DiveEvent::Started) {
            return;
        }
    }
}

// start fires exactly once after 20 sustained seconds past 1.2 m; end fires
// exactly once after 300 s at or above 0.8 m
#[test]
fn test_start_and_end_fire_exactly_once() {
    let mut dm = DiveManager::new();
    let mut now = 0;

    let mut starts = 0;
    for _ in 0..60 {
        if tick(&mut dm, &mut now, 1.5) == Some(DiveEvent::Started) {
            starts += 1;
        }
    }
    assert_eq!(starts, 1);
    assert!(dm.is_diving());

    let mut ends = 0;
    for _ in 0..700 {
        if tick(&mut dm, &mut now, 0.4) == Some(DiveEvent::Ended) {
            ends += 1;
        }
    }
    assert_eq!(ends, 1);
    assert!(!dm.is_diving());
    assert_eq!(dm.phase(), DivePhase::SurfaceInterval);
}

#[test]
fn test_brief_splash_does_not_start_a_dive() {
    let mut dm = DiveManager::new();
    let mut now = 0;

    for _ in 0..15 {
        tick(&mut dm, &mut now, 2.0);
    }
    for _ in 0..5 {
        tick(&mut dm, &mut now, 0.3);
    }
    for _ in 0..15 {
        tick(&mut dm, &mut now, 2.0);
    }
    assert!(!dm.is_diving());
}

// seeded 1 Hz depth trace: 10.0, 9.7, 9.4, 9.0, 8.5 m trips the fast-ascent
// alarm once smoothing catches up
#[test]
fn test_fast_ascent_alarm_from_depth_trace() {
    let mut dm = DiveManager::new();
    let mut now = 0;
    start_dive_at(&mut dm, &mut now, 10.);
    for _ in 0..60 {
        tick(&mut dm, &mut now, 10.);
    }
    assert!(!dm.ascent_rate_alarm());

    for depth in [9.7, 9.4, 9.0, 8.5] {
        tick(&mut dm, &mut now, depth);
    }
    assert!(dm.ascent_rate_alarm());
    assert!(dm.ascent_rate() > 18.);
}

// safety stop: required after a 18 m dive, held at 5 m; a dip to 3.9 m at
// 170 s resets the countdown
#[test]
fn test_safety_stop_timer_reset_and_completion() {
    let mut dm = DiveManager::new();
    let mut now = 0;
    start_dive_at(&mut dm, &mut now, 18.);
    for _ in 0..60 {
        tick(&mut dm, &mut now, 18.);
    }
    assert!(dm.safety_stop_required());

    for _ in 0..170 {
        tick(&mut dm, &mut now, 5.0);
    }
    assert_eq!(dm.phase(), DivePhase::SafetyStop);
    assert!(!dm.safety_stop_completed());
    assert!(dm.safety_stop_timer() > 0);

    tick(&mut dm, &mut now, 3.9);
    assert_eq!(dm.safety_stop_timer(), 0);
    assert!(!dm.safety_stop_completed());

    for _ in 0..200 {
        tick(&mut dm, &mut now, 5.0);
    }
    assert!(dm.safety_stop_completed());
    assert!(!dm.safety_stop_required());
}

#[test]
fn test_shallow_dive_never_requires_safety_stop() {
    let mut dm = DiveManager::new();
    let mut now = 0;
    start_dive_at(&mut dm, &mut now, 8.);
    for _ in 0..120 {
        tick(&mut dm, &mut now, 8.);
    }
    assert!(!dm.safety_stop_required());
}

// in-place compression halves the sample count, keeps the first sample and
// doubles the cadence
#[test]
fn test_sample_compression_preserves_first_sample() {
    let mut profile = DiveProfile::default();
    for t in 0..1000u16 {
        profile.record_sample(DiveSample {
            time: t,
            depth_cm: 1500,
            ..DiveSample::default()
        });
    }

    let first = profile.samples[0];
    profile.compress_samples();
    assert_eq!(profile.samples.len(), 500);
    assert_eq!(profile.samples[0], first);
    assert_eq!(profile.sample_interval, 2);
    // surviving samples keep their original timestamps
    assert_eq!(profile.samples[10].time, 20);
}

#[test]
fn test_profile_aggregates_over_a_dive() {
    let mut dm = DiveManager::new();
    let mut now = 0;
    start_dive_at(&mut dm, &mut now, 5.);

    for depth in [10., 20., 30., 30., 25., 20., 10.] {
        now += 1;
        dm.update(
            now,
            Depth::from_meters(depth),
            11.5,
            &ModelSnapshot {
                cns: 9,
                gas_index: 0,
                ..ModelSnapshot::default()
            },
        );
    }

    for _ in 0..301 {
        tick(&mut dm, &mut now, 0.2);
    }

    let profile = dm.profile();
    assert!(!dm.is_diving());
    assert_eq!(profile.max_depth, Depth::from_meters(30.));
    assert_eq!(profile.min_temperature, 11.5);
    assert!(profile.duration > 0);
    assert!(profile.avg_depth > Depth::zero());
    assert!(!profile.samples.is_empty());
    assert_eq!(profile.gases_used, 1);
}
