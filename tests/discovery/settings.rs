use strata::{ BuilderSettings, ConfigError, Configuration, Registration };

use crate::{ builder, FixtureLoader, ModuleTree };

#[test]
fn settings_file_configures_the_builder() {
    let tree = ModuleTree::with_modules( &[ "one" ]);
    let directory = tempfile::tempdir().unwrap();
    let file = directory.path().join( "plugins.toml" );
    std::fs::write( &file, format!(
        "search_paths = [ {:?} ]\ndefault_registration = \"transient\"\nprefer_shared_types = true\n",
        tree.path().display().to_string(),
    )).unwrap();

    let settings = BuilderSettings::from_file( &file ).unwrap();
    let loader = FixtureLoader::new();
    let config = builder( &loader ).with_settings( &settings ).unwrap().build();

    assert!( config.search_roots().iter().any(| root | root.as_path() == tree.path() ));
    assert_eq!( config.default_registration(), Registration::Transient );
    assert!( config.prefers_shared_types() );
}

#[test]
fn invalid_registration_fails_before_discovery() {
    let loader = FixtureLoader::new();
    let config = Configuration::from_toml_str( "[plugins]\ndefault_registration = 'eventually'" ).unwrap();
    let settings = BuilderSettings::from_configuration( &config, "plugins" ).unwrap().unwrap();

    let result = builder( &loader ).with_settings( &settings );
    assert!( matches!( result, Err( ConfigError::Registration( _ ))));
    assert!( loader.loads().is_empty() );
}

#[test]
fn unknown_settings_are_rejected() {
    assert!( BuilderSettings::from_toml_str( "search_path = []" ).is_err() );
}
