mod common;

use std::cell::Cell;
use std::rc::Rc;

use lumen_core::effects::FxLight;
use lumen_core::{DispatchError, Registry};
use lumen_core::discovery::register_all;
use lumen_types::{Value, ValueKind};

#[test]
fn test_set_intensity_by_address() {
    let registry = Registry::new();
    let light = FxLight::new("Light1", 0);
    register_all(&registry, &light, None);

    let events = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(0.0_f32));
    let (e, s) = (Rc::clone(&events), Rc::clone(&seen));
    light.intensity().on_value_changed(move |v| {
        e.set(e.get() + 1);
        s.set(*v);
    });

    registry.set_fx_value("/Light1/FXLight/intensity", 0.75_f32);
    assert_eq!(light.intensity().value(), 0.75);
    assert_eq!(events.get(), 1);
    assert_eq!(seen.get(), 0.75);

    // Same value again: no event.
    registry.set_fx_value("/Light1/FXLight/intensity", 0.75_f32);
    assert_eq!(events.get(), 1);

    assert_eq!(registry.get_fx("/Light1/FXLight/intensity"), Some(Value::Float(0.75)));
}

#[test]
fn test_failed_dispatch_reports_reason() {
    let registry = Registry::new();
    let light = FxLight::new("Light1", 0);
    register_all(&registry, &light, None);

    let err = registry
        .dispatch("/Light1/FXLight/color", &[Value::Float(1.0)])
        .unwrap_err();
    match err {
        DispatchError::TypeMismatch { address, index, .. } => {
            assert_eq!(address, "/Light1/FXLight/color");
            assert_eq!(index, 0);
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    // The swallowing surface just logs.
    registry.set_fx_value("/Light1/FXLight/color", 1.0_f32);
    registry.set_fx("/Nowhere/at/all");
}

#[test]
fn test_dropped_effect_is_pruned_not_called() {
    let registry = Registry::new();
    {
        let light = FxLight::new("Ghost", 0);
        register_all(&registry, &light, None);
    }
    assert_eq!(
        registry.dispatch("/Ghost/FXLight/flash", &[]),
        Err(DispatchError::DanglingEntry("/Ghost/FXLight/flash".into()))
    );
    assert!(!registry.contains("/Ghost/FXLight/flash"));
    assert!(registry.prune_dangling() > 0);
    assert!(registry.is_empty());
}

#[test]
fn test_show_frame_advances_flash() {
    let mut show = common::demo_show();
    show.registry().set_fx("/Light1/FXLight/flash");
    show.tick(1.0 / 60.0);
    let kinds: Vec<ValueKind> = show
        .registry()
        .parameters()
        .iter()
        .map(|(_, p)| p.kind())
        .collect();
    assert!(kinds.contains(&ValueKind::Enum));
    assert!(kinds.contains(&ValueKind::Color));
}

#[test]
fn test_out_of_range_tempo_is_clamped_and_show_keeps_ticking() {
    let mut show = common::demo_show();
    show.registry().set_fx_value("/show/Tempo/bpm", 1000.0_f32);
    assert_eq!(show.tempo().bpm(), 300.0);
    show.registry().set_fx_value("/show/Tempo/bpm", f32::INFINITY);
    assert_eq!(show.tempo().bpm(), 300.0);
    let master = show.group("/Groups/Master").unwrap();
    master.set_num_beats(1e-30);
    for _ in 0..10 {
        show.tick(10.0);
    }
    assert!(master.config().num_beats > 0.0);
}
