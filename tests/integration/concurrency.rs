//! Parallel realization and artifact preparation.

use mortar_metadata::test_utils::{
    CountingModel, TestArtifactSource, TestConfiguration, test_component,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_concurrent_realization_builds_once() {
    let component = test_component(CountingModel::new());
    let probe = Arc::new(
        TestConfiguration::new("api")
            .with_dependency("g", "a", "1")
            .extends("default"),
    );
    component.register_configuration(
        Arc::new(TestConfiguration::new("default").with_dependency("g", "base", "1")) as _,
    );
    component.register_configuration(Arc::clone(&probe) as _);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let api = component.get_configuration("api").unwrap().unwrap();
                assert_eq!(api.dependencies().len(), 2);
            });
        }
    });

    // Dependency actions run exactly once however many threads raced.
    assert_eq!(probe.action_runs(), 1);
}

#[test]
fn test_concurrent_preparation_resolves_artifacts_once() {
    let model = CountingModel::new();
    let component = test_component(model.clone());
    let artifact = TestArtifactSource::new("core");
    component.register_configuration(
        TestConfiguration::new("runtime")
            .with_artifacts(vec![artifact.clone()])
            .into_source(),
    );

    let runtime = component.get_configuration("runtime").unwrap().unwrap();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                runtime.prepare_to_resolve_artifacts();
                assert_eq!(runtime.artifacts().unwrap().len(), 1);
            });
        }
    });

    assert_eq!(model.runs(), 1);
    assert_eq!(artifact.resolutions(), 1);
}

#[test]
fn test_independent_configurations_resolve_in_parallel() {
    let model = CountingModel::new();
    let component = test_component(model.clone());
    for name in ["api", "runtime", "docs"] {
        component.register_configuration(
            TestConfiguration::new(name)
                .with_artifacts(vec![TestArtifactSource::new(name)])
                .into_source(),
        );
    }

    let resolved = Arc::new(AtomicUsize::new(0));
    std::thread::scope(|scope| {
        for name in ["api", "runtime", "docs"] {
            let component = Arc::clone(&component);
            let resolved = Arc::clone(&resolved);
            scope.spawn(move || {
                let configuration = component.get_configuration(name).unwrap().unwrap();
                configuration.prepare_to_resolve_artifacts();
                resolved.fetch_add(configuration.artifacts().unwrap().len(), Ordering::SeqCst);
            });
        }
    });

    // Each configuration's cell computed once, on whichever thread got there
    // first.
    assert_eq!(resolved.load(Ordering::SeqCst), 3);
    assert_eq!(model.runs(), 3);
}

#[test]
fn test_hierarchy_artifact_union_under_concurrent_preparation() {
    let model = CountingModel::new();
    let component = test_component(model.clone());
    let base = TestArtifactSource::new("base");
    component.register_configuration(
        TestConfiguration::new("default")
            .with_artifacts(vec![base.clone()])
            .into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("test")
            .extends("default")
            .with_artifacts(vec![TestArtifactSource::new("own")])
            .into_source(),
    );

    let test = component.get_configuration("test").unwrap().unwrap();
    let default = component.get_configuration("default").unwrap().unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            test.prepare_to_resolve_artifacts();
        });
        scope.spawn(|| {
            default.prepare_to_resolve_artifacts();
        });
    });

    // Whichever thread won, the ancestor's cell settled exactly once and the
    // descendant observed the settled value.
    assert_eq!(base.resolutions(), 1);
    assert_eq!(test.artifacts().unwrap().len(), 2);
    assert_eq!(default.artifacts().unwrap().len(), 1);
}
