use std::sync::Arc ;
use strata::{ BoxError, ComposeError, Configuration, ExportedType, LoadError, ModuleManifest, Plugin, ServiceCollection };

use crate::{ builder, FixtureLoader, Journal, ModuleTree };

struct Failing ;
impl Plugin for Failing {
    fn configure_services( &self, _: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
        Err( "configuration rejected".into() )
    }
}

struct After( Journal );
impl Plugin for After {
    fn configure_services( &self, services: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
        self.0.record( "after" );
        Ok( services )
    }
}

#[test]
fn unknown_modules_fail_to_load() {
    let tree = ModuleTree::with_modules( &[ "stranger" ]);
    let loader = FixtureLoader::new();
    let result = builder( &loader ).add_search_path( tree.path() ).build_services( None, None, false );
    assert!( matches!( result, Err( ComposeError::Load( LoadError::Other { .. }))));
}

#[test]
fn plugin_errors_pass_through_and_stop_the_fold() {

    let journal = Journal::default();
    let module_journal = journal.clone();
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", move || {
        let journal = module_journal.clone();
        ModuleManifest::new()
            .export( ExportedType::new::<Failing>()
                .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( Failing ) as Arc<dyn Plugin> )))
            .export( ExportedType::new::<After>()
                .implements::<dyn Plugin, _>( move | _ | Ok( Arc::new( After( journal.clone() )) as Arc<dyn Plugin> )))
    });

    let error = builder( &loader )
        .add_search_path( tree.path() )
        .build_services( None, None, false )
        .unwrap_err();

    assert!( matches!( error, ComposeError::Configure( _ )));
    assert_eq!( error.to_string(), "configuration rejected" );
    assert!( journal.entries().is_empty() );

}

#[test]
fn hook_errors_pass_through() {
    let tree = ModuleTree::with_modules( &[ "m" ]);
    let loader = FixtureLoader::new().with_module( "m", || ModuleManifest::new()
        .export( ExportedType::new::<Failing>()
            .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( Failing ) as Arc<dyn Plugin> ))));

    let error = builder( &loader )
        .add_search_path( tree.path() )
        .after_discovery(| _ | Err( "hook refused".into() ))
        .build_services( None, None, false )
        .unwrap_err();

    assert!( matches!( error, ComposeError::Hook( _ )));
    assert_eq!( error.to_string(), "hook refused" );
}
