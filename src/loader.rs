//! Loading modules across the isolation boundary.
//!
//! An [`IsolatedLoader`] turns a module file into its [`ModuleManifest`]. The
//! [`ModuleLoaderFactory`] then applies the boundary to what came back: only
//! capability keys on the shared-type allow-list keep the host's identity, and
//! module factories only ever see shared types when they resolve dependencies.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use thiserror::Error ;

use crate::BoxError ;
use crate::convention::CandidateModule ;
use crate::manifest::{ ExportedType, Implementation, ModuleEntry, ModuleManifest, MODULE_ENTRY_SYMBOL };
use crate::type_key::{ SharedTypes, TypeKey };



/// Errors raised while loading a module. Any of them aborts the build.
#[derive( Debug, Error )]
pub enum LoadError {
    #[error( "Failed to open module {}: {source}", .path.display() )]
    Open { path: PathBuf, source: libloading::Error },
    #[error( "Module {} does not export an entry point: {source}", .path.display() )]
    MissingEntry { path: PathBuf, source: libloading::Error },
    /// Raised by custom loaders.
    #[error( "Failed to load module {}: {source}", .path.display() )]
    Other { path: PathBuf, source: BoxError },
}

impl LoadError {
    /// Wraps a custom loader's own failure.
    pub fn other( path: impl Into<PathBuf>, source: impl Into<BoxError> ) -> Self {
        Self::Other { path: path.into(), source: source.into() }
    }
}

/// Everything a loader is told about one load.
#[derive( Debug, Clone, Copy )]
pub struct LoadRequest<'a> {
    path: &'a Path,
    shared_types: &'a SharedTypes,
    prefer_shared_types: bool,
}

impl<'a> LoadRequest<'a> {

    pub fn new( path: &'a Path, shared_types: &'a SharedTypes, prefer_shared_types: bool ) -> Self {
        Self { path, shared_types, prefer_shared_types }
    }

    #[inline] pub fn path( &self ) -> &'a Path { self.path }
    /// Types whose identity is unified with the host's.
    #[inline] pub fn shared_types( &self ) -> &'a SharedTypes { self.shared_types }
    /// Whether the host's copy of a shared type wins over a copy the module bundles.
    #[inline] pub fn prefer_shared_types( &self ) -> bool { self.prefer_shared_types }

}

/// The mechanism that brings a module's code into the process.
///
/// Loading may run module initialisation code; it happens at most once per
/// module per build.
pub trait IsolatedLoader: Send + Sync {
    /// # Errors
    /// Any failure to load the module or read its manifest.
    fn load( &self, request: &LoadRequest<'_> ) -> Result<ModuleManifest, LoadError>;
}

/// Loads native dynamic libraries exporting [`declare_module!`]( crate::declare_module ).
///
/// Libraries stay loaded for the rest of the process; the bindings taken from
/// them point into their code.
#[derive( Debug, Clone, Copy, Default )]
pub struct NativeLoader ;

impl IsolatedLoader for NativeLoader {
    fn load( &self, request: &LoadRequest<'_> ) -> Result<ModuleManifest, LoadError> {
        let path = request.path();

        // SAFETY: loading a library runs its initialisers. Modules are trusted
        // code built against this crate; this is the point where the host opts in.
        let library = unsafe { libloading::Library::new( path ) }
            .map_err(| source | LoadError::Open { path: path.to_path_buf(), source })?;

        let manifest = {
            // SAFETY: `declare_module!` exports the entry point with exactly the
            // `ModuleEntry` signature, and the library outlives the call.
            let entry = unsafe { library.get::<ModuleEntry>( MODULE_ENTRY_SYMBOL ) }
                .map_err(| source | LoadError::MissingEntry { path: path.to_path_buf(), source })?;
            entry()
        };

        std::mem::forget( library );
        Ok( manifest )
    }
}

/// A module after loading, with the isolation boundary applied.
#[derive( Debug, Clone )]
pub struct LoadedModule {
    path: PathBuf,
    exports: Vec<ExportedType>,
}

impl LoadedModule {
    #[inline] pub fn path( &self ) -> &Path { &self.path }
    /// Exported types in the order the module listed them.
    #[inline] pub fn exports( &self ) -> &[ExportedType] { &self.exports }
}

/// Loads candidates with a fixed shared-type allow-list and preference flag.
pub struct ModuleLoaderFactory {
    loader: Arc<dyn IsolatedLoader>,
    shared_types: Arc<SharedTypes>,
    prefer_shared_types: bool,
}

impl ModuleLoaderFactory {

    pub fn new( loader: Arc<dyn IsolatedLoader>, shared_types: SharedTypes, prefer_shared_types: bool ) -> Self {
        Self { loader, shared_types: Arc::new( shared_types ), prefer_shared_types }
    }

    /// Loads `candidate` and passes its manifest through the isolation boundary.
    ///
    /// # Errors
    /// Whatever the underlying loader fails with.
    pub fn load( &self, candidate: &CandidateModule ) -> Result<LoadedModule, LoadError> {
        let path = candidate.path();
        let request = LoadRequest::new( path, &self.shared_types, self.prefer_shared_types );
        let ( exports, bundled ) = self.loader.load( &request )?.into_parts();

        let exports = exports.into_iter()
            .map(| exported | exported.map_implementations(| implementation | self.isolate( implementation, &bundled, path )))
            .collect();

        Ok( LoadedModule { path: path.to_path_buf(), exports })
    }

    fn isolate( &self, implementation: Implementation, bundled: &[TypeKey], module: &Path ) -> Implementation {
        let ( capability, factory ) = implementation.into_parts();
        let shadowed = !self.prefer_shared_types && bundled.contains( &capability );
        let capability = if self.shared_types.contains( &capability ) && !shadowed {
            capability
        } else {
            tracing::trace!( capability = %capability, module = %module.display(), "Capability kept private to module" );
            capability.private_to( module )
        };
        Implementation::new( capability, factory.within( Arc::clone( &self.shared_types )))
    }

}

#[cfg( test )]
mod tests {

    use super::*;

    trait Greeter: Send + Sync {}
    trait Hidden: Send + Sync {}
    struct Hello ;
    impl Greeter for Hello {}
    impl Hidden for Hello {}

    struct Fixed( ModuleManifest );
    impl IsolatedLoader for Fixed {
        fn load( &self, _: &LoadRequest<'_> ) -> Result<ModuleManifest, LoadError> { Ok( self.0.clone() ) }
    }

    fn manifest() -> ModuleManifest {
        ModuleManifest::new().export( ExportedType::new::<Hello>()
            .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Hello ) as Arc<dyn Greeter> ))
            .implements::<dyn Hidden, _>(| _ | Ok( Arc::new( Hello ) as Arc<dyn Hidden> )))
    }

    fn capabilities( module: &LoadedModule ) -> Vec<TypeKey> {
        module.exports()[0].implementations().iter().map(| i | i.capability().clone() ).collect()
    }

    fn shared() -> SharedTypes { std::iter::once( TypeKey::of::<dyn Greeter>() ).collect() }

    #[test]
    fn only_shared_capabilities_keep_host_identity() {
        let factory = ModuleLoaderFactory::new( Arc::new( Fixed( manifest() )), shared(), false );
        let module = factory.load( &CandidateModule::new( PathBuf::from( "/m/m.so" ), "test" )).unwrap();

        let keys = capabilities( &module );
        assert_eq!( keys[0], TypeKey::of::<dyn Greeter>() );
        assert_eq!( keys[1], TypeKey::of::<dyn Hidden>().private_to( Path::new( "/m/m.so" )));
    }

    #[test]
    fn bundled_copies_shadow_unless_shared_types_are_preferred() {
        let bundling = manifest().bundles::<dyn Greeter>();
        let candidate = CandidateModule::new( PathBuf::from( "/m/m.so" ), "test" );

        let isolated = ModuleLoaderFactory::new( Arc::new( Fixed( bundling.clone() )), shared(), false );
        assert!( !capabilities( &isolated.load( &candidate ).unwrap() )[0].is_host() );

        let preferring = ModuleLoaderFactory::new( Arc::new( Fixed( bundling )), shared(), true );
        assert!( capabilities( &preferring.load( &candidate ).unwrap() )[0].is_host() );
    }

    #[test]
    fn native_loader_reports_unloadable_files() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join( "broken.so" );
        std::fs::write( &path, b"not a library" ).unwrap();
        let error = NativeLoader.load( &LoadRequest::new( &path, &SharedTypes::new(), false )).unwrap_err();
        assert!( matches!( error, LoadError::Open { .. }));
    }

}
