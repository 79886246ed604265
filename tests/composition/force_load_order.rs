use std::sync::Arc ;
use strata::{ ExportedType, Lifetime, ModuleManifest, Registration, ServiceCollection, TypeKey };

use crate::{ builder, FixtureLoader, Greeter, ModuleTree, Named };

fn greeter_module( name: &'static str ) -> impl Fn() -> ModuleManifest + Send + Sync + 'static {
    move || ModuleManifest::new()
        .export( ExportedType::named( name )
            .implements::<dyn Greeter, _>( move | _ | Ok( Arc::new( Named( name )) as Arc<dyn Greeter> )))
}

fn build( registration: Registration ) -> ServiceCollection {
    let a = ModuleTree::with_modules( &[ "a" ]);
    let b = ModuleTree::with_modules( &[ "b" ]);
    let loader = FixtureLoader::new()
        .with_module( "a", greeter_module( "A" ))
        .with_module( "b", greeter_module( "B" ));

    builder( &loader )
        .add_search_path( a.path() )
        .add_search_path( b.path() )
        .always_load::<dyn Greeter>()
        .use_default_registration( registration )
        .build_services( None, None, false )
        .unwrap()
}

#[test]
fn force_loaded_types_follow_root_order() {
    let services = build( Registration::Transient );
    let names = services.build_provider().get_all::<dyn Greeter>().unwrap()
        .iter().map(| greeter | greeter.greet() ).collect::<Vec<_>>();
    assert_eq!( names, vec![ "A", "B" ]);

    let key = TypeKey::of::<dyn Greeter>();
    assert!( services.descriptors_for( &key ).all(| descriptor | descriptor.lifetime() == Lifetime::Transient ));
}

#[test]
fn registration_none_binds_nothing() {
    let services = build( Registration::None );
    assert!( !services.contains::<dyn Greeter>() );
    assert!( services.is_empty() );
}

#[test]
fn scoped_registration_is_per_scope() {
    let provider = build( Registration::Scoped ).build_provider();
    let scope = provider.create_scope();
    let first = scope.get::<dyn Greeter>().unwrap();
    let again = scope.get::<dyn Greeter>().unwrap();
    let other = provider.create_scope().get::<dyn Greeter>().unwrap();
    assert!( Arc::ptr_eq( &first, &again ));
    assert!( !Arc::ptr_eq( &first, &other ));
}
