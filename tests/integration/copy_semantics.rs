//! Identity-preserving copy with memoized transforms.

use mortar_metadata::artifact::LocalArtifactMetadata;
use mortar_metadata::attributes::ImmutableAttributes;
use mortar_metadata::core::ComponentId;
use mortar_metadata::test_utils::{
    CountingModel, TestArtifactSource, TestConfiguration, locked_test_component, test_component,
};
use std::sync::Arc;

#[test]
fn test_identity_copy_is_structurally_equal_and_referentially_distinct() {
    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("default")
            .with_dependency("g", "base", "1")
            .into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("runtime")
            .extends("default")
            .with_attribute("usage", "runtime")
            .with_dependency("g", "own", "1")
            .with_artifacts(vec![TestArtifactSource::new("core")])
            .into_source(),
    );

    let copy = component
        .copy(ComponentId::new("project :core (copy)"), &|artifact| Arc::clone(artifact))
        .unwrap();

    assert_eq!(copy.id().display_name(), "project :core (copy)");
    assert_eq!(copy.module_version_id(), component.module_version_id());
    assert_eq!(copy.configuration_names(), component.configuration_names());

    let original = component.get_configuration("runtime").unwrap().unwrap();
    let copied = copy.get_configuration("runtime").unwrap().unwrap();

    // A new configuration object carrying equal state.
    assert!(!Arc::ptr_eq(&original, &copied));
    assert_eq!(copied.name(), original.name());
    assert_eq!(copied.hierarchy(), original.hierarchy());
    assert_eq!(copied.attributes(), original.attributes());
    assert_eq!(copied.dependencies(), original.dependencies());
    assert_eq!(copied.files(), original.files());
    assert_eq!(copied.excludes(), original.excludes());

    // The copy is fully realized up front.
    assert!(copy.is_configuration_realized("default"));
    assert!(copy.is_configuration_realized("runtime"));
    assert_eq!(
        copied.artifacts().unwrap(),
        original.artifacts().unwrap()
    );
}

#[test]
fn test_copy_forces_realization_of_the_source() {
    let component = locked_test_component();
    component.register_configuration(TestConfiguration::new("api").into_source());
    assert!(!component.is_configuration_realized("api"));

    component
        .copy(ComponentId::new("project :core (copy)"), &|artifact| Arc::clone(artifact))
        .unwrap();

    // Laziness of the source is intentionally destroyed.
    assert!(component.is_configuration_realized("api"));
}

#[test]
fn test_shared_artifact_instance_transforms_exactly_once() {
    let component = locked_test_component();
    let shared = TestArtifactSource::new("shared");
    component.register_configuration(
        TestConfiguration::new("default")
            .with_artifacts(vec![shared.clone()])
            .into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("test").extends("default").into_source(),
    );

    // Resolve before copying: `test` unions the very artifact instance owned
    // by `default`.
    let default = component.get_configuration("default").unwrap().unwrap();
    let test = component.get_configuration("test").unwrap().unwrap();
    default.prepare_to_resolve_artifacts();
    test.prepare_to_resolve_artifacts();
    assert!(Arc::ptr_eq(
        &default.artifacts().unwrap()[0],
        &test.artifacts().unwrap()[0]
    ));

    let transform_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let calls = Arc::clone(&transform_calls);
    let transform = move |artifact: &Arc<LocalArtifactMetadata>| {
        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Arc::new(artifact.relocated("/cache/shared.jar"))
    };
    let copy = component
        .copy(ComponentId::new("project :core (copy)"), &transform)
        .unwrap();

    let copied_default = copy.get_configuration("default").unwrap().unwrap();
    let copied_test = copy.get_configuration("test").unwrap().unwrap();
    let from_default = &copied_default.artifacts().unwrap()[0];
    let from_test = &copied_test.artifacts().unwrap()[0];

    // One transform call, one transformed instance, shared by every referrer.
    assert_eq!(transform_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(from_default, from_test));
    assert_eq!(from_default.file().to_string_lossy(), "/cache/shared.jar");
}

#[test]
fn test_artifact_shared_between_variant_and_configuration_after_union() {
    let component = locked_test_component();
    let shared = TestArtifactSource::new("shared");
    component.register_configuration(
        TestConfiguration::new("api")
            .with_attribute("usage", "api")
            .with_artifacts(vec![shared.clone()])
            .with_own_variant(
                ImmutableAttributes::empty().with("usage", "api"),
                vec![],
                vec![shared.clone()],
            )
            .into_source(),
    );

    let api = component.get_configuration("api").unwrap().unwrap();
    api.prepare_to_resolve_artifacts();

    let copy = component
        .copy(ComponentId::new("project :core (copy)"), &|artifact| {
            Arc::new(artifact.relocated("/cache/shared.jar"))
        })
        .unwrap();

    let copied = copy.get_configuration("api").unwrap().unwrap();
    let configuration_artifact = &copied.artifacts().unwrap()[0];
    let variant_artifact = &copied.variants()[0].artifacts().unwrap()[0];

    // The variant and the configuration wrapped the same source separately,
    // producing value-equal but distinct instances; an identity-keyed memo
    // keeps them independently transformed.
    assert_eq!(configuration_artifact, variant_artifact);
    assert_eq!(configuration_artifact.file(), variant_artifact.file());
    assert!(!Arc::ptr_eq(configuration_artifact, variant_artifact));
}

#[test]
fn test_copy_aborts_on_failed_artifact_resolution() {
    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("broken")
            .with_artifacts(vec![
                TestArtifactSource::failing("broken", "producing task failed"),
            ])
            .into_source(),
    );

    let error = component
        .copy(ComponentId::new("project :core (copy)"), &|artifact| Arc::clone(artifact))
        .unwrap_err();
    assert!(error.to_string().contains("producing task failed"));
}

#[test]
fn test_copy_is_independent_of_the_live_model() {
    let model = CountingModel::new();
    let component = test_component(model.clone());
    component.register_configuration(
        TestConfiguration::new("runtime")
            .with_artifacts(vec![TestArtifactSource::new("core")])
            .into_source(),
    );

    let copy = component
        .copy(ComponentId::new("project :core (copy)"), &|artifact| Arc::clone(artifact))
        .unwrap();
    let runs_after_copy = model.runs();

    // Reading the copy's artifacts re-resolves nothing and never touches the
    // build model again.
    let runtime = copy.get_configuration("runtime").unwrap().unwrap();
    runtime.prepare_to_resolve_artifacts();
    assert_eq!(runtime.artifacts().unwrap().len(), 1);
    assert_eq!(model.runs(), runs_after_copy);
}
