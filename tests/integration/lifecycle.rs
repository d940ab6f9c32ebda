//! Registration, realization, and reevaluation flows.

use mortar_metadata::artifact::ArtifactName;
use mortar_metadata::attributes::ImmutableAttributes;
use mortar_metadata::capability::{Capability, CapabilitySpec};
use mortar_metadata::test_utils::{
    StaticProvider, TestArtifactSource, TestConfiguration, TestFileCollection,
    locked_test_component,
};

#[test]
fn test_full_component_lifecycle() {
    crate::init_tracing();
    let component = locked_test_component();

    // A component shaped like a small library project: a base configuration,
    // an api that extends it, and a runtime carrying the artifacts.
    component.register_configuration(
        TestConfiguration::new("default")
            .described("base dependencies")
            .with_dependency("org.slf4j", "slf4j-api", "2.0.13")
            .with_file_dependency(TestFileCollection::new("local libs", &["libs/local.jar"]))
            .into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("api")
            .extends("default")
            .with_attribute("usage", "api")
            .with_capability(Capability::new("org.mortar", "core", "1.0"))
            .with_own_variant(
                ImmutableAttributes::empty().with("usage", "api"),
                vec![CapabilitySpec::from(Capability::new("org.mortar", "core", "1.0"))],
                vec![TestArtifactSource::new("core-api")],
            )
            .into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("runtime")
            .extends("default")
            .with_attribute("usage", "runtime")
            .with_dependency("com.acme", "collections", "4.1")
            .with_artifacts(vec![TestArtifactSource::new("core")])
            .into_source(),
    );

    assert_eq!(component.configuration_names(), ["default", "api", "runtime"]);
    assert_eq!(component.to_string(), "project :core");
    assert!(component.attributes().is_empty());
    assert_eq!(component.status(), "integration");
    assert_eq!(
        component.status_scheme(),
        ["integration", "milestone", "release"]
    );

    // Nothing realized yet.
    assert!(!component.is_configuration_realized("default"));
    assert!(!component.is_configuration_realized("runtime"));

    let runtime = component.get_configuration("runtime").unwrap().unwrap();
    assert_eq!(runtime.name(), "runtime");
    assert_eq!(runtime.hierarchy(), ["runtime", "default"]);
    assert!(runtime.is_visible());
    assert!(runtime.is_transitive());
    assert!(runtime.can_be_consumed());
    assert!(runtime.can_be_resolved());
    assert_eq!(runtime.to_string(), "configuration 'runtime' of project :core");

    // Aggregated views: own declarations first, ancestors appended.
    let modules: Vec<_> = runtime
        .dependencies()
        .iter()
        .map(|d| format!("{}:{}", d.selector().group, d.selector().module))
        .collect();
    assert_eq!(modules, ["com.acme:collections", "org.slf4j:slf4j-api"]);
    assert_eq!(runtime.files().len(), 1);
    assert_eq!(runtime.files()[0].files(), [std::path::PathBuf::from("libs/local.jar")]);

    // Realizing runtime realized its ancestor for the aggregated views.
    assert!(component.is_configuration_realized("default"));
    assert!(!component.is_configuration_realized("api"));

    // Artifacts resolve on demand.
    runtime.prepare_to_resolve_artifacts();
    let artifact = runtime.artifact(&ArtifactName::new("core", "jar"));
    assert!(artifact.is_present());
    let artifact = artifact.into_present().unwrap();
    assert_eq!(artifact.component_id().display_name(), "project :core");
    assert_eq!(artifact.file().to_string_lossy(), "/build/libs/core.jar");

    // Graph traversal sees the consumable, attributed configurations in
    // registration order; `default` has no attributes and is skipped.
    let variants = component.variants_for_graph_traversal().unwrap();
    let names: Vec<_> = variants.iter().map(|v| v.name().to_string()).collect();
    assert_eq!(names, ["api", "runtime"]);

    // The api configuration carries its declared capability and variant.
    let api = component.get_configuration("api").unwrap().unwrap();
    assert_eq!(api.capabilities().len(), 1);
    assert_eq!(api.capabilities()[0].capability_id(), "org.mortar:core");
    assert_eq!(api.variants().len(), 1);
    assert_eq!(api.variants()[0].name(), "api");
}

#[test]
fn test_consumption_deprecation_is_carried_through() {
    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("compile")
            .deprecated_for_consumption("use 'api' instead")
            .into_source(),
    );

    let compile = component.get_configuration("compile").unwrap().unwrap();
    assert_eq!(compile.consumption_deprecation(), Some("use 'api' instead"));
}

#[test]
fn test_reevaluate_rebuilds_from_current_declarations() {
    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("default").with_dependency("g", "before", "1").into_source(),
    );
    component.register_configuration(
        TestConfiguration::new("test")
            .extends("default")
            .with_dependency("g", "own", "1")
            .into_source(),
    );

    // Realize everything, then mutate the underlying declarations.
    let before = component.get_configuration("test").unwrap().unwrap();
    assert_eq!(before.dependencies().len(), 2);

    let provider = StaticProvider::new()
        .with(
            TestConfiguration::new("default")
                .with_dependency("g", "after", "2")
                .with_dependency("g", "extra", "2")
                .into_source(),
        )
        .with(
            TestConfiguration::new("test")
                .extends("default")
                .with_dependency("g", "own", "1")
                .into_source(),
        );
    component.reevaluate(&provider);

    // Prior lazy entries are discarded wholesale; the next read realizes
    // against the new declarations, keeping registration order.
    assert!(!component.is_configuration_realized("default"));
    assert!(!component.is_configuration_realized("test"));
    assert_eq!(component.configuration_names(), ["default", "test"]);

    let after = component.get_configuration("test").unwrap().unwrap();
    let modules: Vec<_> = after
        .dependencies()
        .iter()
        .map(|d| d.selector().module.clone())
        .collect();
    assert_eq!(modules, ["own", "after", "extra"]);
}

#[test]
fn test_artifact_locations_come_from_the_build_directory() -> anyhow::Result<()> {
    use mortar_metadata::artifact::{ArtifactName, ArtifactSource};
    use mortar_metadata::core::MetadataError;
    use std::path::PathBuf;

    // An artifact source backed by a file that actually exists, the way a
    // producing task would leave it in the build directory.
    #[derive(Debug)]
    struct BuiltArtifact {
        name: ArtifactName,
        file: PathBuf,
    }

    impl ArtifactSource for BuiltArtifact {
        fn name(&self) -> ArtifactName {
            self.name.clone()
        }

        fn file(&self) -> Result<PathBuf, MetadataError> {
            Ok(self.file.clone())
        }
    }

    let build_dir = tempfile::tempdir()?;
    let jar = build_dir.path().join("libs").join("core-1.0.jar");
    std::fs::create_dir_all(jar.parent().expect("jar path has a parent"))?;
    std::fs::write(&jar, b"jar bytes")?;

    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("runtime")
            .with_artifacts(vec![std::sync::Arc::new(BuiltArtifact {
                name: ArtifactName::new("core", "jar"),
                file: jar.clone(),
            })])
            .into_source(),
    );

    let runtime = component
        .get_configuration("runtime")?
        .expect("runtime is registered");
    runtime.prepare_to_resolve_artifacts();
    let artifacts = runtime.artifacts()?;
    assert_eq!(artifacts[0].file(), jar);
    assert!(artifacts[0].file().exists());
    Ok(())
}

#[test]
fn test_unknown_hierarchy_members_are_skipped() {
    let component = locked_test_component();
    component.register_configuration(
        TestConfiguration::new("test")
            .extends("never-registered")
            .with_dependency("g", "own", "1")
            .into_source(),
    );

    // Aggregation iterates registered names filtered to the hierarchy, so a
    // missing ancestor contributes nothing rather than failing.
    let test = component.get_configuration("test").unwrap().unwrap();
    assert_eq!(test.dependencies().len(), 1);
    test.prepare_to_resolve_artifacts();
    assert!(test.artifacts().unwrap().is_empty());
}
