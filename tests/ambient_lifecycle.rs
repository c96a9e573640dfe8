use snowdrift::{
    engine::{START_LABEL, STOP_LABEL},
    graph::ParamKind,
    io::{ContextState, OfflineDevice},
    AmbientConfig, AmbientEngine,
};

const SAMPLE_RATE: f32 = 8_000.0;

fn config(seed: u64) -> AmbientConfig {
    AmbientConfig::default().seed(seed).reverb_seconds(0.5)
}

fn engine(seed: u64) -> AmbientEngine<OfflineDevice> {
    AmbientEngine::new(OfflineDevice::new(SAMPLE_RATE), config(seed))
}

fn now(engine: &AmbientEngine<OfflineDevice>) -> f64 {
    engine.current_time().expect("context should exist")
}

fn advance_until(engine: &mut AmbientEngine<OfflineDevice>, time: f64) {
    let remaining = time - now(engine);
    if remaining > 0.0 {
        engine.advance(remaining);
    }
}

#[test]
fn stop_when_idle_is_a_noop() {
    let mut engine = engine(1);
    engine.stop();
    assert!(engine.context().is_none(), "stop must not open a context");
    assert_eq!(engine.label(), START_LABEL);

    engine.toggle().unwrap();
    engine.toggle().unwrap();
    let nodes = engine.graph().unwrap().node_count();
    engine.stop();
    assert_eq!(engine.graph().unwrap().node_count(), nodes);
    assert_eq!(engine.label(), START_LABEL);
}

#[test]
fn start_then_stop_releases_everything() {
    let mut engine = engine(2);
    engine.set_volume(0.35);
    engine.toggle().unwrap();
    assert_eq!(engine.label(), STOP_LABEL);
    assert_eq!(engine.graph().unwrap().active_generators(), 8);
    assert_eq!(engine.pending_chime_timers(), 1);

    engine.advance(2.0);
    engine.toggle().unwrap();

    {
        let master = engine.master().unwrap();
        let graph = engine.graph().unwrap();
        assert_eq!(graph.active_generators(), 0);
        assert_eq!(graph.node_count(), 2, "only destination and master bus remain");
        assert!(graph.is_connected(master, graph.destination()));
    }
    assert_eq!(engine.pending_chime_timers(), 0);
    assert_eq!(engine.master_gain(), Some(0.35));
}

#[test]
fn volume_survives_stop_and_start() {
    let mut engine = engine(3);
    engine.set_volume(0.8);
    engine.toggle().unwrap();
    assert_eq!(engine.master_gain(), Some(0.8), "context picks up earlier volume");

    engine.set_volume(0.2);
    engine.toggle().unwrap();
    engine.toggle().unwrap();
    assert_eq!(engine.master_gain(), Some(0.2));

    engine.set_volume(1.7);
    assert_eq!(engine.volume(), 1.7, "volume is not clamped");
    assert_eq!(engine.master_gain(), Some(1.7));
}

#[test]
fn pad_swell_rises_then_holds() {
    let mut engine = engine(4);
    engine.toggle().unwrap();
    let pads = engine.session().unwrap().pads.clone();
    assert_eq!(pads.len(), 3);

    let mut previous = vec![0.0f32; pads.len()];
    for _ in 0..80 {
        engine.advance(0.1);
        let graph = engine.graph().unwrap();
        let time = graph.current_time();

        for (i, pad) in pads.iter().enumerate() {
            let gain = graph
                .param(pad.gain, ParamKind::Gain)
                .unwrap()
                .value_at(time);
            assert!(
                gain + 1e-7 >= previous[i],
                "pad {i} gain fell from {} to {gain} at {time:.2}s",
                previous[i]
            );
            if time >= pad.ramp_end {
                assert!(
                    (gain - pad.level).abs() < 1e-6,
                    "pad {i} should hold {} after its swell, got {gain}",
                    pad.level
                );
            }
            previous[i] = gain;
        }
    }
}

#[test]
fn no_chime_spawns_after_stop() {
    let mut engine = engine(5);
    engine.toggle().unwrap();
    let due = engine.next_chime_at().unwrap();

    advance_until(&mut engine, due - 0.05);
    assert_eq!(engine.chimes_spawned(), 0);

    engine.toggle().unwrap();
    engine.advance(60.0);
    assert_eq!(engine.chimes_spawned(), 0);
    assert_eq!(engine.pending_chime_timers(), 0);
}

#[test]
fn chimes_arrive_and_are_released() {
    let mut engine = engine(6);
    engine.toggle().unwrap();

    let mut first = None;
    while now(&engine) < 25.0 {
        engine.advance(0.25);
        if now(&engine) < 12.0 {
            assert_eq!(engine.chimes_spawned(), 0, "no chime before 12 s");
        }
        if first.is_none() {
            first = engine.session().unwrap().chimes.first().map(|p| p.event);
        }
    }

    let event = first.expect("at least one chime by 25 s");
    assert!(event.started_at >= 12.0);
    assert!(event.stop_at >= event.started_at + 4.0);

    advance_until(&mut engine, event.stop_at + 8.0);
    let graph = engine.graph().unwrap();
    for handle in event.handles() {
        assert!(
            !graph.contains(handle.id()),
            "chime node {} still alive 8 s after its stop",
            handle.id()
        );
    }
}

#[test]
fn toggle_resumes_suspended_context() {
    let mut engine = engine(7);
    engine.toggle().unwrap();
    engine.suspend().unwrap();
    assert_eq!(engine.context_state(), Some(ContextState::Suspended));

    let frozen = now(&engine);
    engine.advance(30.0);
    assert_eq!(now(&engine), frozen, "clock must not move while suspended");
    assert_eq!(engine.chimes_spawned(), 0, "timers freeze with the clock");

    engine.toggle().unwrap();
    assert_eq!(engine.context_state(), Some(ContextState::Running));
    assert!(!engine.is_active());
}

#[test]
fn restart_after_shutdown_opens_new_context() {
    let mut engine = engine(8);
    engine.set_volume(0.4);
    engine.toggle().unwrap();
    engine.shutdown();
    assert!(engine.context().is_none());
    assert!(!engine.is_active());

    engine.toggle().unwrap();
    assert!(engine.is_active());
    assert_eq!(engine.device().opened(), 2);
    assert_eq!(engine.master_gain(), Some(0.4));
}

#[test]
fn ringing_chime_outlives_stop_then_is_released() {
    let config = config(9).chime_interval(1.0, 1.0001);
    let mut engine = AmbientEngine::new(OfflineDevice::new(SAMPLE_RATE), config);
    engine.toggle().unwrap();
    engine.advance(1.2);
    assert_eq!(engine.chimes_spawned(), 1);
    let event = engine.session().unwrap().chimes[0].event;

    engine.toggle().unwrap();
    assert_eq!(engine.pending_cleanups(), 1);
    {
        let graph = engine.graph().unwrap();
        assert!(graph.contains(event.oscillator));
        assert_eq!(graph.is_generating(event.oscillator), Ok(true));
    }

    advance_until(&mut engine, event.started_at + 8.1);
    let graph = engine.graph().unwrap();
    assert!(!graph.contains(event.oscillator));
    assert!(!graph.contains(event.highpass));
    assert_eq!(graph.node_count(), 2);
    drop(graph);
    assert_eq!(engine.pending_cleanups(), 0);
}

#[test]
fn finished_chimes_are_released_on_stop() {
    let config = config(10).chime_interval(5.0, 5.0001);
    let mut engine = AmbientEngine::new(OfflineDevice::new(SAMPLE_RATE), config);
    engine.toggle().unwrap();
    advance_until(&mut engine, 12.5);
    assert_eq!(engine.chimes_spawned(), 2);

    let chimes = engine.session().unwrap().chimes.clone();
    let (finished, ringing) = (chimes[0].event, chimes[1].event);
    assert!(finished.stop_at <= 12.5 && ringing.stop_at > 12.5);

    engine.toggle().unwrap();
    let graph = engine.graph().unwrap();
    assert!(!graph.contains(finished.oscillator), "finished chime released at stop");
    assert!(graph.contains(ringing.oscillator), "ringing chime left to decay");
    drop(graph);
    assert_eq!(engine.pending_cleanups(), 1);
}

#[test]
fn session_renders_bounded_audio() {
    let mut engine = engine(11);
    engine.toggle().unwrap();

    let mut peak = 0.0f32;
    let mut finite = true;
    engine.run_for(3.0, |block| {
        for &sample in block {
            finite &= sample.is_finite();
            peak = peak.max(sample.abs());
        }
    });

    assert!(finite, "output must stay finite");
    assert!(peak > 1e-3, "expected audible output, got peak {peak}");
    assert!(peak < 1.0, "expected headroom, got peak {peak}");
}
