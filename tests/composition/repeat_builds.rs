use std::sync::Arc ;
use strata::{ ExportedType, ModuleManifest, Registration, ServiceCollection, TypeKey };

use crate::{ builder, FixtureLoader, Greeter, ModuleTree, Named };

fn bindings( services: &ServiceCollection ) -> Vec<( String, String, String )> {
    services.descriptors_for( &TypeKey::of::<dyn Greeter>() )
        .map(| descriptor | (
            descriptor.service().to_string(),
            descriptor.implementation().to_string(),
            descriptor.lifetime().to_string(),
        ))
        .collect()
}

#[test]
fn rebuilding_an_unchanged_tree_yields_the_same_bindings() {

    let tree = ModuleTree::with_modules( &[ "one", "two", "three" ]);
    let manifest = | name: &'static str | move || ModuleManifest::new()
        .export( ExportedType::named( name )
            .implements::<dyn Greeter, _>( move | _ | Ok( Arc::new( Named( name )) as Arc<dyn Greeter> )));
    let loader = FixtureLoader::new()
        .with_module( "one", manifest( "one" ))
        .with_module( "two", manifest( "two" ))
        .with_module( "three", manifest( "three" ));

    let build = || builder( &loader )
        .add_search_path( tree.path() )
        .always_load::<dyn Greeter>()
        .use_default_registration( Registration::Scoped )
        .build_services( None, None, false )
        .unwrap();

    let first = build();
    let second = build();

    assert_eq!( bindings( &first ).len(), 3 );
    assert_eq!( bindings( &first ), bindings( &second ));
    assert_eq!( loader.loads().len(), 6 );

}
