use lumen_core::discovery::{member_addresses, register_all, unregister_all};
use lumen_core::effects::{FxLight, FxStrobe};
use lumen_core::Registry;

#[test]
fn test_register_unregister_symmetry() {
    let registry = Registry::new();
    let light = FxLight::new("Light1", 0);
    let strobe = FxStrobe::new("Strobe1");
    register_all(&registry, &light, None);
    register_all(&registry, &strobe, Some("/rig/strobe"));
    let with_both = registry.len();

    unregister_all(&registry, &light);
    assert!(member_addresses(&light).iter().all(|a| !registry.contains(a)));
    assert!(member_addresses(&strobe).iter().all(|a| registry.contains(a)));
    assert!(member_addresses(&strobe).iter().all(|a| a.starts_with("/rig/strobe/")));

    register_all(&registry, &light, None);
    assert_eq!(registry.len(), with_both);
}

#[test]
fn test_second_instance_with_same_name_is_rejected() {
    let registry = Registry::new();
    let first = FxLight::new("Light1", 0);
    let second = FxLight::new("Light1", 0);
    register_all(&registry, &first, None);
    let count = registry.len();
    register_all(&registry, &second, None);
    assert_eq!(registry.len(), count);

    // First registrant keeps the addresses.
    registry.set_fx_value("/Light1/FXLight/intensity", 0.2_f32);
    assert_eq!(first.intensity().value(), 0.2);
    assert_eq!(second.intensity().value(), 1.0);
}

#[test]
fn test_unregistering_rejected_duplicate_keeps_first_registrant() {
    let registry = Registry::new();
    let first = FxLight::new("Light1", 0);
    let second = FxLight::new("Light1", 0);
    register_all(&registry, &first, None);
    let count = registry.len();
    register_all(&registry, &second, None);
    assert_eq!(member_addresses(&second), member_addresses(&first));

    assert_eq!(unregister_all(&registry, &second), 0);
    assert_eq!(registry.len(), count);
    registry.set_fx_value("/Light1/FXLight/intensity", 0.4_f32);
    assert_eq!(first.intensity().value(), 0.4);

    assert_eq!(unregister_all(&registry, &first), count);
    assert_eq!(registry.len(), 0);
}
