//! Basic composition tests: stepping, ordering, decorators, dot output.

use crate::component::ComponentStatus;
use crate::composition::CompositionBuilder;
use crate::config::RunSettings;
use crate::decorators::{RunningTotal, Scale};
use crate::example_components::{events, new_log, StepComponent};
use crate::exchange_item::ItemRef;
use crate::link::Link;
use is_close::is_close;
use std::sync::Arc;

#[test]
fn single_component_runs_to_its_horizon() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 3, &log).with_rate(1.0))
        .build()
        .unwrap();

    assert_eq!(composition.status("a").unwrap(), ComponentStatus::Initialized);
    assert_eq!(
        composition
            .output_values("a", "Value")
            .unwrap()
            .get_scalar(0, 0)
            .unwrap(),
        0.0
    );

    assert!(composition.step().unwrap());
    assert_eq!(composition.current_time("a").unwrap(), 10.0);
    assert_eq!(composition.status("a").unwrap(), ComponentStatus::Running);

    composition.run().unwrap();
    assert!(composition.finished());
    assert_eq!(composition.status("a").unwrap(), ComponentStatus::Finished);
    assert_eq!(composition.current_time("a").unwrap(), 30.0);
    assert_eq!(
        composition
            .output_values("a", "Value")
            .unwrap()
            .get_scalar(0, 0)
            .unwrap(),
        30.0
    );
    assert!(!composition.step().unwrap());
    assert_eq!(events(&log), vec!["a@10", "a@20", "a@30", "a finished"]);
}

#[test]
fn providers_are_advanced_on_demand() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("b", 15.0, 2, &log).with_input("Inflow"))
        .with_component(StepComponent::new("a", 10.0, 3, &log).with_rate(1.0))
        .with_link(Link::between("a", "Value", "b", "Inflow"))
        .build()
        .unwrap();
    composition.run().unwrap();

    assert_eq!(
        events(&log),
        vec!["a@10", "a@20", "b@15", "a@30", "a finished", "b@30", "b finished"]
    );

    // (5 * 20 + 10 * 30) / 15, the last consumer step averaged over two provider steps
    let inflow = composition.input_values("b", "Inflow").unwrap();
    assert!(is_close!(inflow.get_scalar(0, 0).unwrap(), 400.0 / 15.0));
}

#[test]
fn ties_follow_link_declaration_order() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("x", 10.0, 1, &log))
        .with_component(StepComponent::new("y", 10.0, 1, &log).with_input("Inflow"))
        .with_component(StepComponent::new("z", 10.0, 1, &log))
        .with_link(Link::between("z", "Value", "y", "Inflow"))
        .build()
        .unwrap();
    assert_eq!(composition.drive_order(), vec!["z", "y", "x"]);

    composition.run().unwrap();
    assert_eq!(
        events(&log),
        vec!["z@10", "z finished", "y@10", "y finished", "x@10", "x finished"]
    );
}

#[test]
fn undecorated_links_share_values() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 2, &log).with_rate(1.0))
        .with_component(StepComponent::new("b", 10.0, 2, &log).with_input("Inflow"))
        .with_link(Link::between("a", "Value", "b", "Inflow"))
        .build()
        .unwrap();
    composition.step().unwrap();
    composition.step().unwrap();

    let output = composition.output_values("a", "Value").unwrap();
    let input = composition.input_values("b", "Inflow").unwrap();
    assert!(Arc::ptr_eq(&output, &input));
}

#[test]
fn decorated_link() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 2, &log).with_rate(1.0))
        .with_component(StepComponent::new("b", 10.0, 2, &log).with_input("Inflow"))
        .with_link(Link::between("a", "Value", "b", "Inflow").with_decorator(Scale::new(2.0)))
        .build()
        .unwrap();
    composition.run().unwrap();

    let output = composition.output_values("a", "Value").unwrap();
    let input = composition.input_values("b", "Inflow").unwrap();
    assert_eq!(output.get_scalar(0, 0).unwrap(), 20.0);
    assert_eq!(input.get_scalar(0, 0).unwrap(), 40.0);
    assert_eq!(
        composition
            .output_values("b", "Value")
            .unwrap()
            .get_scalar(0, 0)
            .unwrap(),
        40.0
    );
}

#[test]
fn accumulating_link() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 3, &log).with_rate(1.0))
        .with_component(StepComponent::new("b", 10.0, 3, &log).with_input("Inflow"))
        .with_link(
            Link::between("a", "Value", "b", "Inflow").with_accumulator(RunningTotal::new()),
        )
        .build()
        .unwrap();
    composition.run().unwrap();

    // 10 + 20 + 30
    let input = composition.input_values("b", "Inflow").unwrap();
    assert_eq!(input.get_scalar(0, 0).unwrap(), 60.0);
}

#[test]
fn end_time_caps_the_run() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 5, &log))
        .with_settings(RunSettings::default().with_end_time(20.0))
        .build()
        .unwrap();
    composition.run().unwrap();
    assert_eq!(composition.current_time("a").unwrap(), 20.0);
    assert_eq!(composition.status("a").unwrap(), ComponentStatus::Finished);
}

#[test]
fn finish_ends_the_run_early() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 5, &log))
        .with_component(StepComponent::new("b", 10.0, 5, &log))
        .build()
        .unwrap();
    composition.step().unwrap();
    composition.finish().unwrap();

    assert!(composition.finished());
    assert_eq!(events(&log), vec!["a@10", "a finished", "b finished"]);
    assert_eq!(composition.current_time("b").unwrap(), 0.0);
}

#[test]
fn external_pull_advances_the_provider() {
    let log = new_log();
    let mut composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 5, &log).with_rate(2.0))
        .build()
        .unwrap();
    let values = composition
        .get_values(
            &ItemRef::new("a", "Value"),
            crate::time::TimeQuery::At(25.0),
        )
        .unwrap();
    assert_eq!(values.get_scalar(0, 0).unwrap(), 60.0);
    assert_eq!(composition.current_time("a").unwrap(), 30.0);
}

#[test]
fn dot() {
    let log = new_log();
    let composition = CompositionBuilder::new()
        .with_component(StepComponent::new("a", 10.0, 2, &log))
        .with_component(StepComponent::new("b", 10.0, 2, &log).with_input("Inflow"))
        .with_link(Link::between("a", "Value", "b", "Inflow"))
        .build()
        .unwrap();

    let dot = composition.as_dot();
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("0 -> 1"));
    assert!(dot.contains("synchronous"));
}
