//! Preset capture and restore.
//!
//! A preset is every persistable parameter value, bucketed by type, plus the
//! configuration of every live group.

use std::rc::Rc;

use lumen_types::address::{join, with_leading_slash};
use lumen_types::PresetDocument;

use crate::coerce::check_finite;
use crate::group::GroupController;
use crate::registry::Registry;

/// Snapshot persistable parameters (in address order) and group configs.
pub fn capture(registry: &Registry, groups: &[Rc<GroupController>]) -> PresetDocument {
    let mut doc = PresetDocument::new();
    for (address, param) in registry.parameters() {
        if !param.should_persist() {
            continue;
        }
        let value = param.get();
        // JSON has no NaN or infinity.
        if check_finite(&value).is_err() {
            log::warn!(target: "preset", "{}: non-finite value not captured", address);
            continue;
        }
        doc.push(&address, value);
    }
    doc.group_presets = groups.iter().map(|g| g.config()).collect();
    log::debug!(
        target: "preset",
        "captured {} parameter(s), {} group(s)",
        doc.parameter_count(),
        doc.group_presets.len()
    );
    doc
}

/// Counts from a restore, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub groups: usize,
}

/// Apply a preset. Unknown addresses and unknown groups are skipped.
///
/// Group configs go first, then group drivers, then everything else, so a
/// group's fan-out never overwrites a target value stored in the same preset.
pub fn restore(registry: &Registry, groups: &[Rc<GroupController>], doc: &PresetDocument) -> RestoreReport {
    let mut report = RestoreReport::default();

    for config in &doc.group_presets {
        let address = with_leading_slash(&config.address);
        match groups.iter().find(|g| g.address() == address) {
            Some(group) => {
                group.load_config(config);
                report.groups += 1;
            }
            None => log::debug!(target: "preset", "no live group {}, skipping", address),
        }
    }

    let drivers: Vec<String> = groups.iter().map(|g| join(g.address(), "value")).collect();
    let (group_values, rest): (Vec<_>, Vec<_>) = doc
        .parameters()
        .into_iter()
        .partition(|(address, _)| drivers.contains(address));

    for (address, value) in group_values.into_iter().chain(rest) {
        if !registry.contains(&address) {
            log::debug!(target: "preset", "{} not registered, skipping", address);
            report.skipped += 1;
            continue;
        }
        match registry.dispatch(&address, &[value]) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                log::warn!(target: "preset", "restore {}: {}", address, e);
                report.failed += 1;
            }
        }
    }
    log::debug!(target: "preset", "restore: {:?}", report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;
    use lumen_types::{Color, Value};

    #[test]
    fn transient_parameters_are_not_captured() {
        let registry = Registry::new();
        let kept = Parameter::new(0.5_f32).at("/a/kept");
        let skipped = Parameter::new(0.5_f32).at("/a/skipped").transient();
        registry.register_parameter(&kept, "t").unwrap();
        registry.register_parameter(&skipped, "t").unwrap();
        let doc = capture(&registry, &[]);
        assert_eq!(doc.float_parameters.len(), 1);
        assert_eq!(doc.float_parameters[0].key, "/a/kept");
    }

    #[test]
    fn non_finite_values_are_neither_captured_nor_restored() {
        let registry = Registry::new();
        let p = Parameter::new(0.5_f32).at("/a/x");
        let q = Parameter::new(0.5_f32).at("/a/y");
        registry.register_parameter(&p, "t").unwrap();
        registry.register_parameter(&q, "t").unwrap();
        p.set_value(f32::NAN);
        let doc = capture(&registry, &[]);
        assert_eq!(doc.float_parameters.len(), 1);
        assert_eq!(doc.float_parameters[0].key, "/a/y");

        let mut doc = PresetDocument::new();
        doc.push("/a/y", Value::Float(f32::INFINITY));
        let report = restore(&registry, &[], &doc);
        assert_eq!(report.failed, 1);
        assert_eq!(q.value(), 0.5);
    }

    #[test]
    fn buckets_by_type() {
        let registry = Registry::new();
        let params = (
            Parameter::new(1_i32).at("/p/i"),
            Parameter::new(true).at("/p/b"),
            Parameter::new(String::from("hi")).at("/p/s"),
            Parameter::new(Color::BLACK).at("/p/c"),
        );
        registry.register_parameter(&params.0, "t").unwrap();
        registry.register_parameter(&params.1, "t").unwrap();
        registry.register_parameter(&params.2, "t").unwrap();
        registry.register_parameter(&params.3, "t").unwrap();
        let doc = capture(&registry, &[]);
        assert_eq!(doc.int_parameters.len(), 1);
        assert_eq!(doc.bool_parameters.len(), 1);
        assert_eq!(doc.string_parameters.len(), 1);
        assert_eq!(doc.color_parameters.len(), 1);
    }

    #[test]
    fn missing_addresses_are_skipped() {
        let registry = Registry::new();
        let p = Parameter::new(0.0_f32).at("/a/x");
        registry.register_parameter(&p, "t").unwrap();
        let mut doc = PresetDocument::new();
        doc.push("/a/x", Value::Float(0.25));
        doc.push("/gone/y", Value::Float(1.0));
        let report = restore(&registry, &[], &doc);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(p.value(), 0.25);
    }

    #[test]
    fn explicit_target_value_survives_group_fan_out() {
        let registry = Registry::new();
        let target = Parameter::new(0.0_f32).at("/a/x");
        registry.register_parameter(&target, "t").unwrap();
        let group = GroupController::new(&registry, "/g");
        group.add_target("/a/x");
        group.set_value(0.8);
        target.set_value(0.1);
        let groups = vec![group];
        let doc = capture(&registry, &groups);

        groups[0].set_value(0.3);
        restore(&registry, &groups, &doc);
        assert_eq!(groups[0].value(), 0.8);
        assert_eq!(target.value(), 0.1);
        assert_eq!(capture(&registry, &groups), doc);
    }
}
