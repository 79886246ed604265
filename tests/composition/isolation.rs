use std::sync::Arc ;
use strata::{
    BoxError, ComposeError, Configuration, ExportedType, Logger, ModuleManifest, Plugin,
    ResolveError, ServiceCollection, TypeKey,
};

use crate::{ builder, CapturedLog, FixtureLoader, Greeter, ModuleTree };

struct HostOnly ;

struct Counted( &'static str );
impl Plugin for Counted {
    fn configure_services( &self, mut services: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
        services.add_instance::<str>( Arc::from( self.0 ));
        Ok( services )
    }
}

fn configured( services: &ServiceCollection ) -> Vec<String> {
    services.build_provider().get_all::<str>().unwrap().iter().map(| name | name.to_string() ).collect()
}

fn plugin_module() -> ModuleManifest {
    ModuleManifest::new().export( ExportedType::new::<Counted>()
        .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( Counted( "module" )) as Arc<dyn Plugin> )))
}

fn host_with_plugin() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_instance::<dyn Plugin>( Arc::new( Counted( "host" )));
    services
}

#[test]
fn shared_resolution_sees_host_plugins() {
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", plugin_module );
    let services = builder( &loader )
        .add_search_path( tree.path() )
        .build_services( Some( host_with_plugin() ), None, false )
        .unwrap();
    assert_eq!( configured( &services ), vec![ "host", "module" ]);
}

#[test]
fn isolated_resolution_only_sees_discovered_plugins() {
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", plugin_module );
    let services = builder( &loader )
        .add_search_path( tree.path() )
        .build_services( Some( host_with_plugin() ), None, true )
        .unwrap();
    assert_eq!( configured( &services ), vec![ "module" ]);
    assert_eq!( services.descriptors_for( &TypeKey::of::<dyn Plugin>() ).count(), 1 );
}

struct LoggingGreeter( Logger );
impl Greeter for LoggingGreeter { fn greet( &self ) -> String { self.0.name().to_string() }}

struct Snooping ;
impl Greeter for Snooping { fn greet( &self ) -> String { String::new() }}

#[test]
fn module_factories_only_resolve_shared_types() {

    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", || ModuleManifest::new()
        .export( ExportedType::new::<LoggingGreeter>()
            .implements::<dyn Greeter, _>(| resolver | {
                let logger = resolver.get::<Logger>()?;
                Ok( Arc::new( LoggingGreeter( Logger::clone( &logger ))) as Arc<dyn Greeter> )
            }))
        .export( ExportedType::new::<Snooping>()
            .implements::<dyn Greeter, _>(| resolver | {
                resolver.get::<HostOnly>()?;
                Ok( Arc::new( Snooping ) as Arc<dyn Greeter> )
            })));

    let mut host = ServiceCollection::new();
    host.add_instance( Arc::new( Logger::new( "host" )));
    host.add_instance( Arc::new( HostOnly ));

    let provider = builder( &loader )
        .add_search_path( tree.path() )
        .always_load::<dyn Greeter>()
        .build_services( Some( host ), None, false )
        .unwrap()
        .build_provider();

    assert!( provider.get::<HostOnly>().is_ok() );
    assert!( matches!( provider.get::<dyn Greeter>(), Err( ResolveError::NotShared( key )) if key == TypeKey::of::<HostOnly>() ));
    let greeters = provider.get_all::<dyn Greeter>();
    assert!( greeters.is_err() );

    let mut host = ServiceCollection::new();
    host.add_instance( Arc::new( Logger::new( "host" )));
    let only_logging = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", || ModuleManifest::new()
        .export( ExportedType::new::<LoggingGreeter>()
            .implements::<dyn Greeter, _>(| resolver | Ok( Arc::new( LoggingGreeter( Logger::clone( &*resolver.get::<Logger>()? ))) as Arc<dyn Greeter> ))));
    let provider = builder( &loader )
        .add_search_path( only_logging.path() )
        .always_load::<dyn Greeter>()
        .build_services( Some( host ), None, false )
        .unwrap()
        .build_provider();
    assert_eq!( provider.get::<dyn Greeter>().unwrap().greet(), "host" );

}

#[test]
fn bundled_force_load_capability_is_bound_only_when_shared_types_are_preferred() {

    let build = | prefer: bool | {
        let tree = ModuleTree::with_modules( &[ "m" ]);
        let loader = FixtureLoader::new().with_module( "m", || ModuleManifest::new()
            .bundles::<dyn Greeter>()
            .export( ExportedType::new::<Snooping>()
                .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Snooping ) as Arc<dyn Greeter> ))));
        builder( &loader )
            .add_search_path( tree.path() )
            .always_load::<dyn Greeter>()
            .prefer_shared_types( prefer )
            .build_services( None, None, false )
            .unwrap()
    };

    assert!( !build( false ).contains::<dyn Greeter>() );
    assert!( build( true ).contains::<dyn Greeter>() );

}

#[test]
fn bundled_plugin_capability_shadows_unless_shared_types_are_preferred() {

    let build = | prefer: bool, log: &CapturedLog | {
        let tree = ModuleTree::with_modules( &[ "m" ]);
        let loader = FixtureLoader::new().with_module( "m", || plugin_module().bundles::<dyn Plugin>() );
        let services = builder( &loader )
            .add_search_path( tree.path() )
            .prefer_shared_types( prefer )
            .use_log_sink( log.sink() )
            .build_services( None, None, true )
            .unwrap();
        assert_eq!( loader.last_request().map(|( _, prefer )| prefer ), Some( prefer ));
        configured( &services )
    };

    let isolated = CapturedLog::default();
    assert!( build( false, &isolated ).is_empty() );
    assert!( isolated.contains( "Found no compatible plugin types in" ));

    let preferring = CapturedLog::default();
    assert_eq!( build( true, &preferring ), vec![ "module" ]);
    assert!( !preferring.contains( "Found no compatible plugin types in" ));

}

#[test]
fn loader_receives_the_shared_type_allow_list() {
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", plugin_module );
    builder( &loader )
        .add_search_path( tree.path() )
        .share::<HostOnly>()
        .build_services( None, None, false )
        .unwrap();

    let ( shared, _ ) = loader.last_request().unwrap();
    for key in [ TypeKey::of::<dyn Plugin>(), TypeKey::of::<ServiceCollection>(), TypeKey::of::<Logger>(), TypeKey::of::<Configuration>(), TypeKey::of::<HostOnly>() ] {
        assert!( shared.contains( &key ), "{key} was not shared" );
    }
}

#[test]
fn plugin_construction_failures_abort_the_build() {
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", || ModuleManifest::new()
        .export( ExportedType::new::<Counted>()
            .implements::<dyn Plugin, _>(| resolver | {
                resolver.get::<HostOnly>()?;
                Ok( Arc::new( Counted( "never" )) as Arc<dyn Plugin> )
            })));

    let mut host = ServiceCollection::new();
    host.add_instance( Arc::new( HostOnly ));
    let result = builder( &loader )
        .add_search_path( tree.path() )
        .build_services( Some( host ), None, false );
    assert!( matches!( result, Err( ComposeError::Resolve( ResolveError::NotShared( _ )))));
}
