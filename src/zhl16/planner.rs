use crate::common::{Depth, GasIndex, Sim, Time};
use crate::zhl16::model::Zhl16Model;
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_DECO_STOPS: usize = 20;

// bounded simulation: no single stop may grow past an hour
const MAX_STOP_SECONDS: f32 = 3600.;
const STOP_INTEGRATION_STEP_SECONDS: f32 = 60.;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoStop {
    pub depth: Depth,
    pub duration: Time,
    pub gas_index: GasIndex,
}

/// Result of forward-simulating the remaining ascent.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AscentPlan {
    pub stops: Vec<DecoStop, MAX_DECO_STOPS>,
    pub first_stop_depth: Depth,
    pub tts: Time,
    pub valid: bool,
    /// a simulation cap was hit; the plan covers what was simulated
    pub truncated: bool,
}

impl AscentPlan {
    pub fn tts_minutes(&self) -> f32 {
        self.tts.as_minutes()
    }

    pub fn total_stop_time(&self) -> Time {
        self.stops
            .iter()
            .fold(Time::zero(), |acc, stop| acc + stop.duration)
    }
}

/// Simulate the ascent from the model's current state on a scratch copy,
/// producing the stop schedule that keeps every compartment inside its
/// GF-scaled m-value. The live model is never touched.
pub fn plan_ascent(model: &Zhl16Model) -> AscentPlan {
    let mut plan = AscentPlan::default();
    let config = model.config();
    let ascent_rate = config.ascent_rate;
    let stop_interval = config.last_stop_depth;

    let mut sim = model.fork();
    let start_time = sim.dive_time();

    if !sim.in_deco() {
        plan.tts = Time::from_minutes(sim.depth().as_meters() / ascent_rate);
        plan.valid = true;
        return plan;
    }

    // ascend to the first stop
    let first_stop = sim.ceiling();
    plan.first_stop_depth = first_stop;
    sim.travel(first_stop, ascent_rate);
    let mut current_depth = first_stop;

    while current_depth > Depth::zero() {
        if plan.stops.is_full() {
            plan.truncated = true;
            break;
        }

        // best gas legal at this stop
        if let Some(best) = sim
            .gas_table()
            .best_gas_for(current_depth, config.surface_pressure)
        {
            if best != sim.gas_table().current() {
                sim.gas_table_mut().switch_gas(best);
            }
        }

        // hold until the next stop level clears
        let mut stop = DecoStop {
            depth: current_depth,
            duration: Time::zero(),
            gas_index: sim.gas_table().current(),
        };
        while sim.ceiling() > current_depth - stop_interval {
            sim.update_tissues(Time::from_seconds(STOP_INTEGRATION_STEP_SECONDS));
            stop.duration += Time::from_seconds(STOP_INTEGRATION_STEP_SECONDS);
            if stop.duration.as_seconds() >= MAX_STOP_SECONDS {
                plan.truncated = true;
                break;
            }
        }
        if stop.duration > Time::zero() {
            let _ = plan.stops.push(stop);
        }

        // ascend one stop interval
        let next_depth = if current_depth > stop_interval {
            current_depth - stop_interval
        } else {
            Depth::zero()
        };
        sim.travel(next_depth, ascent_rate);
        current_depth = next_depth;
    }

    plan.tts = sim.dive_time() - start_time;
    plan.valid = true;

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zhl16::DecoConfig;

    #[test]
    fn test_no_deco_plan() {
        let mut model = Zhl16Model::new(DecoConfig::default());
        model.set_depth(Depth::from_meters(20.));
        model.update_tissues(Time::from_minutes(5.));

        let plan = plan_ascent(&model);
        assert!(plan.valid);
        assert!(!plan.truncated);
        assert!(plan.stops.is_empty());
        assert_eq!(plan.tts, Time::from_minutes(2.));
    }

    #[test]
    fn test_stops_strictly_decreasing_to_last_stop() {
        let mut model = Zhl16Model::new(DecoConfig::new().with_gradient_factors(30, 70));
        model.travel(Depth::from_meters(45.), 20.);
        model.update_tissues(Time::from_minutes(25.));

        let plan = plan_ascent(&model);
        assert!(plan.valid);
        assert!(!plan.stops.is_empty());
        for pair in plan.stops.windows(2) {
            assert!(pair[0].depth > pair[1].depth);
        }
        let last = plan.stops.last().unwrap();
        assert_eq!(last.depth, Depth::from_meters(3.));
    }

    #[test]
    fn test_plan_leaves_live_model_untouched() {
        let mut model = Zhl16Model::new(DecoConfig::new().with_gradient_factors(30, 85));
        model.travel(Depth::from_meters(40.), 20.);
        model.update_tissues(Time::from_minutes(20.));

        let tissues_before = *model.tissues();
        let time_before = model.dive_time();
        let _ = plan_ascent(&model);
        assert_eq!(*model.tissues(), tissues_before);
        assert_eq!(model.dive_time(), time_before);
    }

    #[test]
    fn test_planner_idempotence() {
        let mut model = Zhl16Model::new(DecoConfig::new().with_gradient_factors(30, 85));
        model.travel(Depth::from_meters(40.), 20.);
        model.update_tissues(Time::from_minutes(25.));

        let first = plan_ascent(&model);
        let second = plan_ascent(&model);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tts_covers_stops_and_travel() {
        let mut model = Zhl16Model::new(DecoConfig::new().with_gradient_factors(30, 85));
        model.travel(Depth::from_meters(40.), 20.);
        model.update_tissues(Time::from_minutes(25.));

        let plan = plan_ascent(&model);
        assert!(plan.valid);
        assert!(plan.tts > plan.total_stop_time());
    }
}
