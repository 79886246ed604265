use std::io ;
use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use strata::{ ExportedType, ModuleManifest, SearchConvention, ServiceCollection };

use crate::{ builder, CapturedLog, FixtureLoader, Greeter, ModuleTree, Named, EXTENSION };

/// Every file with the fixture extension in `<root>/bundle`, whatever its name.
#[derive( Default )]
struct BundleDirectory ;

impl SearchConvention for BundleDirectory {
    fn name( &self ) -> &str { "bundle" }
    fn candidates( &self, root: &Path ) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir( root.join( "bundle" ))? {
            let path = entry?.path();
            if path.extension().is_some_and(| extension | extension == EXTENSION ) { files.push( path ) }
        }
        Ok( files )
    }
}

fn greeter( name: &'static str ) -> impl Fn() -> ModuleManifest + Send + Sync + 'static {
    move || ModuleManifest::new().export( ExportedType::named( name )
        .implements::<dyn Greeter, _>( move | _ | Ok( Arc::new( Named( name )) as Arc<dyn Greeter> )))
}

fn bundle( tree: &ModuleTree, stem: &str ) {
    let directory = tree.path().join( "bundle" );
    std::fs::create_dir_all( &directory ).unwrap();
    std::fs::write( directory.join( format!( "{stem}.{EXTENSION}" )), b"" ).unwrap();
}

fn greetings( services: &ServiceCollection ) -> Vec<String> {
    services.build_provider().get_all::<dyn Greeter>().unwrap().iter().map(| greeter | greeter.greet() ).collect()
}

#[test]
fn custom_conventions_replace_the_directory_layout() {
    let tree = ModuleTree::new();
    bundle( &tree, "flat" );
    tree.add( "nested" );
    let loader = FixtureLoader::new().with_module( "flat", greeter( "flat" )).with_module( "nested", greeter( "nested" ));

    let services = builder( &loader )
        .add_search_path( tree.path() )
        .add_convention_type::<BundleDirectory>()
        .always_load::<dyn Greeter>()
        .build_services( None, None, false )
        .unwrap();

    assert_eq!( greetings( &services ), vec![ "flat" ]);
}

#[test]
fn conventions_run_in_registration_order_and_share_candidates() {
    let tree = ModuleTree::new();
    bundle( &tree, "flat" );
    let nested = tree.add( "nested" );
    let loader = FixtureLoader::new().with_module( "flat", greeter( "flat" )).with_module( "nested", greeter( "nested" ));

    let services = builder( &loader )
        .add_search_path( tree.path() )
        .add_convention_fn( "explicit", move | _ | Ok( vec![ nested.clone() ]))
        .add_convention( BundleDirectory )
        .add_convention_fn( "again", | root | Ok( vec![ root.join( "nested" ).join( format!( "nested.{EXTENSION}" ))]))
        .always_load::<dyn Greeter>()
        .build_services( None, None, false )
        .unwrap();

    assert_eq!( greetings( &services ), vec![ "nested", "flat" ]);
    assert_eq!( loader.loads().len(), 2 );
}

#[test]
fn failing_conventions_are_logged_and_skipped() {
    let first = ModuleTree::with_modules( &[ "a" ]);
    let second = ModuleTree::with_modules( &[ "b" ]);
    let loader = FixtureLoader::new().with_module( "a", greeter( "a" )).with_module( "b", greeter( "b" ));
    let log = CapturedLog::default();
    let broken = first.path().to_path_buf();

    let services = builder( &loader )
        .add_search_path( first.path() )
        .add_search_path( second.path() )
        .add_convention_fn( "picky", move | root | {
            if root == broken { return Err( io::Error::new( io::ErrorKind::PermissionDenied, "denied" )) }
            Ok( vec![ root.join( "b" ).join( format!( "b.{EXTENSION}" ))])
        })
        .use_log_sink( log.sink() )
        .always_load::<dyn Greeter>()
        .build_services( None, None, false )
        .unwrap();

    assert_eq!( greetings( &services ), vec![ "b" ]);
    assert!( log.contains( "Search convention 'picky' failed" ));
}
