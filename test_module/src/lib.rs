//! A native module used by the loader's integration tests.

use std::sync::Arc ;
use strata::{ declare_module, BoxError, Configuration, ExportedType, ModuleManifest, Plugin, ServiceCollection };



/// Known only to this module; never shared with the host.
pub trait Farewell: Send + Sync { fn farewell( &self ) -> String ; }

pub struct Goodbye ;
impl Farewell for Goodbye { fn farewell( &self ) -> String { "Goodbye".to_string() }}

pub struct GoodbyePlugin ;

impl Plugin for GoodbyePlugin {
    fn configure_services( &self, services: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
        Ok( services )
    }
}

/// Listed but never bound.
pub struct BasePlugin ;

impl Plugin for BasePlugin {
    fn configure_services( &self, services: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
        Ok( services )
    }
}

declare_module!( ModuleManifest::new()
    .export( ExportedType::new::<GoodbyePlugin>()
        .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( GoodbyePlugin ) as Arc<dyn Plugin> )))
    .export( ExportedType::new::<Goodbye>()
        .implements::<dyn Farewell, _>(| _ | Ok( Arc::new( Goodbye ) as Arc<dyn Farewell> )))
    .export( ExportedType::new::<BasePlugin>()
        .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( BasePlugin ) as Arc<dyn Plugin> ))
        .abstract_type() )
);
