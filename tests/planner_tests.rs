use dive_core::{plan_ascent, Depth, Time};

// square 30 m air dive: NDL on arrival, then a light deco obligation with a
// single shallow stop
#[test]
fn test_square_air_dive() {
    let mut model = fixtures::model_gf((30, 85));
    let ean50 = fixtures::gas_ean50();
    model.gas_table_mut().add_gas(1, ean50);

    model.travel(Depth::from_meters(30.), 20.);

    let ndl = model.ndl();
    assert!(ndl >= Time::from_minutes(14.));
    assert!(ndl <= Time::from_minutes(20.));

    // overstay the NDL
    model.update_tissues(Time::from_minutes(22.));
    assert!(model.in_deco());
    let ceiling = model.ceiling();
    assert_eq!(ceiling, Depth::from_meters(3.));

    let plan = plan_ascent(&model);
    assert!(plan.valid);
    assert!(!plan.truncated);
    assert_eq!(plan.stops.len(), 1);

    let stop = plan.stops[0];
    assert_eq!(stop.depth, Depth::from_meters(3.));
    assert!(stop.duration >= Time::from_minutes(1.));
    assert!(stop.duration <= Time::from_minutes(6.));

    // travel plus the stop, comfortably more than a direct ascent
    assert!(plan.tts > Time::from_minutes(3.));
    assert!(plan.tts <= Time::from_minutes(12.));
}

#[test]
fn test_no_deco_tts_is_direct_ascent() {
    let mut model = fixtures::model_default();
    model.travel(Depth::from_meters(18.), 20.);
    model.update_tissues(Time::from_minutes(10.));

    let plan = plan_ascent(&model);
    assert!(plan.valid);
    assert!(plan.stops.is_empty());
    assert_eq!(plan.first_stop_depth, Depth::zero());
    assert_eq!(plan.tts, Time::from_minutes(1.8));
}

#[test]
fn test_every_stop_gas_legal_at_stop_depth() {
    let mut model = fixtures::model_gf((30, 70));
    model.gas_table_mut().add_gas(1, fixtures::gas_ean50());
    model.travel(Depth::from_meters(45.), 20.);
    model.update_tissues(Time::from_minutes(30.));

    let plan = plan_ascent(&model);
    assert!(plan.valid);
    assert!(!plan.stops.is_empty());

    let surface_pressure = model.config().surface_pressure;
    for stop in plan.stops.iter() {
        let gas = model.gas_table().gas(stop.gas_index).unwrap();
        let pp_o2 = gas.pp_o2_at(stop.depth, surface_pressure);
        let (pp_o2_min, pp_o2_max) = gas.pp_o2_window();
        assert!(pp_o2 >= pp_o2_min && pp_o2 <= pp_o2_max);
    }

    // the rich mix takes over for the shallow stops
    let last_stop = plan.stops.last().unwrap();
    assert_eq!(last_stop.gas_index, 1);
}

#[test]
fn test_stops_monotone_down_to_last_stop_depth() {
    let mut model = fixtures::model_gf((30, 70));
    model.travel(Depth::from_meters(45.), 20.);
    model.update_tissues(Time::from_minutes(30.));

    let plan = plan_ascent(&model);
    for pair in plan.stops.windows(2) {
        assert!(pair[0].depth > pair[1].depth);
    }
    assert_eq!(plan.stops.last().unwrap().depth, Depth::from_meters(3.));
}

#[test]
fn test_planner_idempotent_on_unchanged_model() {
    let mut model = fixtures::model_gf((30, 85));
    model.gas_table_mut().add_gas(1, fixtures::gas_ean50());
    model.travel(Depth::from_meters(40.), 20.);
    model.update_tissues(Time::from_minutes(25.));

    let first = plan_ascent(&model);
    let second = plan_ascent(&model);
    assert_eq!(first.stops, second.stops);
    assert_eq!(first.tts, second.tts);
}

#[test]
fn test_deco_gas_shortens_schedule() {
    let mut air_only = fixtures::model_gf((30, 70));
    air_only.travel(Depth::from_meters(45.), 20.);
    air_only.update_tissues(Time::from_minutes(30.));

    let mut with_deco_gas = air_only.clone();
    with_deco_gas.gas_table_mut().add_gas(1, fixtures::gas_ean50());

    let plan_air = plan_ascent(&air_only);
    let plan_rich = plan_ascent(&with_deco_gas);
    assert!(plan_rich.tts < plan_air.tts);
}
