mod common;

use std::time::{Duration, Instant};

use common::{bind_bridge, drive_until, unlimited, RawController};
use lumen_core::{Parameter, Registry};
use lumen_net::RateLimiter;
use lumen_types::Value;
use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

const INTENSITY: &str = "/Light1/FXLight/intensity";

#[test]
fn test_set_parameter_over_udp() {
    let registry = Registry::new();
    let intensity = Parameter::new(1.0_f32).at(INTENSITY);
    registry.register_parameter(&intensity, "Light1:FXLight").unwrap();

    let mut bridge = bind_bridge(None, unlimited());
    let controller = RawController::new();
    controller.send(bridge.local_addr().unwrap(), INTENSITY, &[Value::Float(0.75)]);

    drive_until(&mut bridge, &registry, Duration::from_secs(2), || intensity.value() == 0.75);
}

#[test]
fn test_query_replies_to_sender_without_feedback_target() {
    let registry = Registry::new();
    let intensity = Parameter::new(0.5_f32).at(INTENSITY);
    registry.register_parameter(&intensity, "Light1:FXLight").unwrap();

    let mut bridge = bind_bridge(None, unlimited());
    let controller = RawController::new();
    controller.send(bridge.local_addr().unwrap(), "/get/Light1/FXLight/intensity", &[]);

    let start = Instant::now();
    while bridge.poll(&registry) == 0 {
        assert!(start.elapsed() < Duration::from_secs(2), "query never arrived");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(controller.recv(), (INTENSITY.to_string(), vec![Value::Float(0.5)]));
}

#[test]
fn test_pattern_reaches_every_match() {
    let registry = Registry::new();
    let a = Parameter::new(0.0_f32).at("/Light1/FXLight/intensity");
    let b = Parameter::new(0.0_f32).at("/Light2/FXLight/intensity");
    let other = Parameter::new(0.0_f32).at("/Camera/FXBloom/intensity");
    for p in [&a, &b, &other] {
        registry.register_parameter(p, "test").unwrap();
    }

    let mut bridge = bind_bridge(None, unlimited());
    let controller = RawController::new();
    controller.send(bridge.local_addr().unwrap(), "/Light*/FXLight/intensity", &[Value::Float(0.3)]);

    drive_until(&mut bridge, &registry, Duration::from_secs(2), || a.value() == 0.3 && b.value() == 0.3);
    assert_eq!(other.value(), 0.0);
}

#[test]
fn test_bundle_messages_apply_in_order() {
    let registry = Registry::new();
    let level = Parameter::new(0.0_f32).at("/mix/level");
    registry.register_parameter(&level, "test").unwrap();

    let mut bridge = bind_bridge(None, unlimited());
    let set = |v: f64| {
        OscPacket::Message(OscMessage {
            addr: "/mix/level".into(),
            args: vec![OscType::Double(v)],
        })
    };
    let bundle = OscPacket::Bundle(OscBundle {
        timetag: OscTime { seconds: 0, fractional: 1 },
        content: vec![set(0.2), set(0.9)],
    });
    let controller = RawController::new();
    controller.send_raw(bridge.local_addr().unwrap(), &rosc::encoder::encode(&bundle).unwrap());

    let start = Instant::now();
    let mut handled = 0;
    while handled < 2 {
        assert!(start.elapsed() < Duration::from_secs(2), "bundle never arrived");
        handled += bridge.poll(&registry);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(level.value(), 0.9);
}

#[test]
fn test_feedback_coalesces_repeated_changes() {
    let registry = Registry::new();
    let intensity = Parameter::new(0.0_f32).at(INTENSITY);
    registry.register_parameter(&intensity, "Light1:FXLight").unwrap();

    let controller = RawController::new();
    let mut bridge = bind_bridge(Some(controller.addr()), unlimited());
    bridge.attach(&registry);

    intensity.set_value(0.1);
    intensity.set_value(0.2);
    intensity.set_value(0.3);
    assert_eq!(bridge.pending_outbound(), 1);
    assert_eq!(bridge.flush(Instant::now()), 1);
    assert_eq!(controller.recv(), (INTENSITY.to_string(), vec![Value::Float(0.3)]));
}

#[test]
fn test_rate_limit_defers_to_next_window() {
    let registry = Registry::new();
    let a = Parameter::new(0.0_f32).at("/a");
    let b = Parameter::new(0.0_f32).at("/b");
    registry.register_parameter(&a, "test").unwrap();
    registry.register_parameter(&b, "test").unwrap();

    let controller = RawController::new();
    let interval = Duration::from_millis(20);
    let mut bridge = bind_bridge(Some(controller.addr()), RateLimiter::new(1, interval));
    bridge.attach(&registry);

    a.set_value(1.0);
    b.set_value(2.0);
    let now = Instant::now();
    assert_eq!(bridge.flush(now), 1);
    assert_eq!(bridge.flush(now), 0);
    assert_eq!(bridge.flush(now + interval), 1);
    assert_eq!(controller.recv().0, "/a");
    assert_eq!(controller.recv().0, "/b");
}

#[test]
fn test_detached_bridge_queues_nothing() {
    let registry = Registry::new();
    let a = Parameter::new(0.0_f32).at("/a");
    registry.register_parameter(&a, "test").unwrap();

    let controller = RawController::new();
    let mut bridge = bind_bridge(Some(controller.addr()), unlimited());
    bridge.attach(&registry);
    bridge.detach();
    a.set_value(1.0);
    assert_eq!(bridge.pending_outbound(), 0);
    assert!(controller.try_recv(Duration::from_millis(50)).is_none());
}
