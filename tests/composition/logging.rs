use std::sync::Arc ;
use std::sync::atomic::{ AtomicUsize, Ordering };
use strata::{ ExportedType, Logger, ModuleManifest };

use crate::{ builder, CapturedLog, FixtureLoader, Greeter, ModuleTree, Named };

fn greeter_module() -> ModuleManifest {
    ModuleManifest::new().export( ExportedType::named( "logged::Hi" )
        .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Named( "Hi" )) as Arc<dyn Greeter> )))
}

#[test]
fn host_logger_receives_loader_diagnostics() {
    let tree = ModuleTree::with_modules( &[ "logged" ]);
    let loader = FixtureLoader::new().with_module( "logged", greeter_module );
    let log = CapturedLog::default();

    builder( &loader )
        .add_search_path( tree.path() )
        .always_load::<dyn Greeter>()
        .use_logger( Logger::new( "host" ).with_sink( log.sink() ))
        .build_services( None, None, false )
        .unwrap();

    assert!( log.contains( "Loading all plugins from" ));
    assert!( log.contains( "Plugin located! Loading" ));
    assert!( log.contains( "Found no compatible plugin types in" ));
}

#[test]
fn logger_factory_is_asked_for_every_message() {
    let tree = ModuleTree::with_modules( &[ "logged" ]);
    let loader = FixtureLoader::new().with_module( "logged", greeter_module );
    let log = CapturedLog::default();
    let created = Arc::new( AtomicUsize::new( 0 ));

    let factory_log = log.clone();
    let factory_created = Arc::clone( &created );
    builder( &loader )
        .add_search_path( tree.path() )
        .use_logger_factory( move || {
            factory_created.fetch_add( 1, Ordering::SeqCst );
            Logger::new( "factory" ).with_sink( factory_log.sink() )
        })
        .build_services( None, None, false )
        .unwrap();

    assert!( log.contains( "Plugin located! Loading" ));
    assert!( created.load( Ordering::SeqCst ) >= 2 );
}

#[test]
fn later_logging_choices_replace_earlier_ones() {
    let tree = ModuleTree::with_modules( &[ "logged" ]);
    let loader = FixtureLoader::new().with_module( "logged", greeter_module );
    let replaced = CapturedLog::default();

    builder( &loader )
        .add_search_path( tree.path() )
        .use_logger( Logger::new( "first" ).with_sink( replaced.sink() ))
        .use_console_logging()
        .build_services( None, None, false )
        .unwrap();

    assert!( !replaced.contains( "Plugin located! Loading" ));
}
