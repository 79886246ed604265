//! Classifying a loaded module's exports.

use crate::container::{ Lifetime, Registration, ServiceDescriptor };
use crate::loader::LoadedModule ;
use crate::type_key::TypeKey ;



/// Counters describing what scanning produced.
#[derive( Debug, Clone, Copy, Default, PartialEq, Eq )]
pub struct ScanReport {
    /// Plugin implementations staged for resolution.
    pub plugins_staged: usize,
    /// Force-load implementations bound into the target collection.
    pub force_loaded: usize,
    /// Force-load implementations found but not bound because registration is `None`.
    pub force_load_skipped: usize,
}

impl ScanReport {
    pub(crate) fn absorb( &mut self, other: ScanReport ) {
        self.plugins_staged += other.plugins_staged ;
        self.force_loaded += other.force_loaded ;
        self.force_load_skipped += other.force_load_skipped ;
    }
}

/// Bindings produced from a single module.
#[derive( Debug, Clone, Default )]
pub struct ModuleScan {
    plugins: Vec<ServiceDescriptor>,
    force_loaded: Vec<ServiceDescriptor>,
    skipped: usize,
}

impl ModuleScan {

    /// Singleton bindings of the plugin capability, bound for the staging registry.
    #[inline] pub fn plugins( &self ) -> &[ServiceDescriptor] { &self.plugins }
    /// Bindings for the target collection.
    #[inline] pub fn force_loaded( &self ) -> &[ServiceDescriptor] { &self.force_loaded }

    pub fn report( &self ) -> ScanReport {
        ScanReport {
            plugins_staged: self.plugins.len(),
            force_loaded: self.force_loaded.len(),
            force_load_skipped: self.skipped,
        }
    }

    pub(crate) fn into_parts( self ) -> ( Vec<ServiceDescriptor>, Vec<ServiceDescriptor> ) {( self.plugins, self.force_loaded )}

}

/// Matches exported types against the plugin capability and the force-load capabilities.
#[derive( Debug, Clone )]
pub struct TypeScanner<'a> {
    plugin_capability: TypeKey,
    force_load: &'a [TypeKey],
    registration: Registration,
}

impl<'a> TypeScanner<'a> {

    pub fn new( plugin_capability: TypeKey, force_load: &'a [TypeKey], registration: Registration ) -> Self {
        Self { plugin_capability, force_load, registration }
    }

    /// Scans one module.
    ///
    /// Plugin bindings follow the module's export order. Force-load bindings are
    /// grouped by capability in force-load order, then by export order; they are
    /// produced whether or not the module exports a plugin.
    pub fn scan( &self, module: &LoadedModule ) -> ModuleScan {

        let plugins = module.exports().iter()
            .filter_map(| exported | exported.assignable_to( &self.plugin_capability )
                .map(| implementation | ServiceDescriptor::new(
                    self.plugin_capability.clone(),
                    exported.name(),
                    Lifetime::Singleton,
                    implementation.factory().clone(),
                )))
            .collect();

        let matches = self.force_load.iter()
            .flat_map(| capability | module.exports().iter()
                .filter_map( move | exported | exported.assignable_to( capability ).map(| implementation | ( capability, exported, implementation ))))
            .collect::<Vec<_>>();

        let force_loaded = match self.registration.lifetime() {
            None => Vec::new(),
            Some( lifetime ) => matches.iter()
                .map(|( capability, exported, implementation )| ServiceDescriptor::new(
                    ( *capability ).clone(),
                    exported.name(),
                    lifetime,
                    implementation.factory().clone(),
                ))
                .collect(),
        };
        let skipped = matches.len() - force_loaded.len();

        ModuleScan { plugins, force_loaded, skipped }

    }

}

#[cfg( test )]
mod tests {

    use std::path::PathBuf ;
    use std::sync::Arc ;

    use super::*;
    use crate::convention::CandidateModule ;
    use crate::loader::{ IsolatedLoader, LoadError, LoadRequest, ModuleLoaderFactory };
    use crate::manifest::{ ExportedType, ModuleManifest };
    use crate::type_key::SharedTypes ;

    trait Greeter: Send + Sync {}
    trait Writer: Send + Sync {}
    trait Extension: Send + Sync {}
    struct Both ;
    impl Greeter for Both {}
    impl Writer for Both {}
    struct Base ;
    impl Greeter for Base {}
    struct Ext ;
    impl Extension for Ext {}

    struct Fixed ;
    impl IsolatedLoader for Fixed {
        fn load( &self, _: &LoadRequest<'_> ) -> Result<ModuleManifest, LoadError> {
            Ok( ModuleManifest::new()
                .export( ExportedType::new::<Both>()
                    .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Both ) as Arc<dyn Greeter> ))
                    .implements::<dyn Writer, _>(| _ | Ok( Arc::new( Both ) as Arc<dyn Writer> )))
                .export( ExportedType::new::<Base>()
                    .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Base ) as Arc<dyn Greeter> ))
                    .abstract_type() )
                .export( ExportedType::new::<Ext>()
                    .implements::<dyn Extension, _>(| _ | Ok( Arc::new( Ext ) as Arc<dyn Extension> ))))
        }
    }

    fn module() -> LoadedModule {
        let shared = [ TypeKey::of::<dyn Greeter>(), TypeKey::of::<dyn Writer>(), TypeKey::of::<dyn Extension>() ]
            .into_iter()
            .collect::<SharedTypes>();
        ModuleLoaderFactory::new( Arc::new( Fixed ), shared, false )
            .load( &CandidateModule::new( PathBuf::from( "/m/m.so" ), "test" ))
            .unwrap()
    }

    #[test]
    fn stages_concrete_plugins_and_force_loads_in_capability_order() {
        let force_load = [ TypeKey::of::<dyn Writer>(), TypeKey::of::<dyn Greeter>() ];
        let scan = TypeScanner::new( TypeKey::of::<dyn Extension>(), &force_load, Registration::Transient ).scan( &module() );

        assert_eq!( scan.plugins().len(), 1 );
        assert_eq!( scan.plugins()[0].implementation(), std::any::type_name::<Ext>() );

        let bound = scan.force_loaded().iter().map(| d | d.service().clone() ).collect::<Vec<_>>();
        assert_eq!( bound, force_load.to_vec() );
        assert!( scan.force_loaded().iter().all(| d | d.lifetime() == Lifetime::Transient ));
        assert_eq!( scan.report(), ScanReport { plugins_staged: 1, force_loaded: 2, force_load_skipped: 0 });
    }

    #[test]
    fn registration_none_scans_without_binding() {
        let force_load = [ TypeKey::of::<dyn Greeter>() ];
        let scan = TypeScanner::new( TypeKey::of::<dyn Writer>(), &force_load, Registration::None ).scan( &module() );
        assert!( scan.force_loaded().is_empty() );
        assert_eq!( scan.report().force_load_skipped, 1 );
        assert_eq!( scan.report().plugins_staged, 1 );
    }

}
