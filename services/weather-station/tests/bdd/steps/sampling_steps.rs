//! BDD step definitions for sampling feature

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cucumber::{given, then, when};

use weather_station::clock::{Clock, ManualClock};
use weather_station::config::SamplerConfig;
use weather_station::{new_history, Calibration, Sampler, TickOutcome};

use crate::world::{SwitchableSensor, WeatherWorld};

#[given(expr = "a sampler started at time {int}")]
fn sampler_started(world: &mut WeatherWorld, start: i64) {
    let clock = Arc::new(ManualClock::new(start as f64));
    let sensor = Arc::new(SwitchableSensor::default());
    let (writer, history) = new_history(None);

    let sampler = Sampler::new(
        &SamplerConfig::default(),
        Calibration::default(),
        Arc::clone(&sensor) as Arc<dyn weather_station::Sensor>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        writer,
        vec![],
    );

    world.current = Some(sampler.current());
    world.history = Some(history);
    world.sampler = Some(sampler);
    world.clock = Some(clock);
    world.sensor = Some(sensor);
}

#[when(expr = "the sampler ticks every {int} seconds for {int} seconds")]
async fn tick_for(world: &mut WeatherWorld, every: u32, duration: u32) {
    let clock = world.clock.clone().expect("clock not set");
    let sampler = world.sampler.as_mut().expect("sampler not set");
    for _ in 0..duration / every {
        clock.advance(every as f64);
        world.outcomes.push(sampler.tick().await);
    }
}

#[when(expr = "the clock jumps {int} seconds and the sampler ticks")]
async fn jump_and_tick(world: &mut WeatherWorld, seconds: u32) {
    let clock = world.clock.clone().expect("clock not set");
    let sampler = world.sampler.as_mut().expect("sampler not set");
    clock.advance(seconds as f64);
    world.outcomes.push(sampler.tick().await);
}

#[when("the sensor starts failing")]
fn sensor_fails(world: &mut WeatherWorld) {
    let sensor = world.sensor.as_ref().expect("sensor not set");
    sensor.failing.store(true, Ordering::SeqCst);
}

#[then(expr = "the history holds {int} reading(s)")]
async fn history_size(world: &mut WeatherWorld, count: usize) {
    let history = world.history.as_ref().expect("history not set");
    assert_eq!(history.len().await, count);
}

#[then(expr = "recorded reading {int} has time {int}")]
async fn recorded_time(world: &mut WeatherWorld, index: usize, time: i64) {
    let history = world.history.as_ref().expect("history not set");
    let readings = history.tail(usize::MAX).await;
    assert_eq!(readings[index - 1].time, time);
}

#[then(expr = "the current reading has time {int}")]
fn current_time(world: &mut WeatherWorld, time: i64) {
    let current = world.current.as_ref().expect("sampler not set");
    assert_eq!(current.borrow().map(|r| r.time), Some(time));
}

#[then("the last tick failed")]
fn last_tick_failed(world: &mut WeatherWorld) {
    assert_eq!(world.outcomes.last(), Some(&TickOutcome::Failed));
}

#[then(expr = "{int} tick(s) recorded a reading")]
fn recorded_ticks(world: &mut WeatherWorld, count: usize) {
    let recorded = world
        .outcomes
        .iter()
        .filter(|o| **o == TickOutcome::Recorded)
        .count();
    assert_eq!(recorded, count);
}
