//! What a module exports.
//!
//! There is no runtime reflection to enumerate a module's types, so a module
//! describes itself: a [`ModuleManifest`] lists every [`ExportedType`] together
//! with the capabilities it can be bound to and a factory for each. A native
//! module publishes its manifest with [`declare_module!`]( crate::declare_module ).

use std::sync::Arc ;

use crate::container::{ ResolveError, Resolver, ServiceFactory };
use crate::type_key::TypeKey ;



/// Name of the symbol [`declare_module!`]( crate::declare_module ) exports.
pub const MODULE_ENTRY_SYMBOL: &[u8] = b"strata_module_manifest\0";

/// Signature of the module entry point.
pub type ModuleEntry = fn() -> ModuleManifest ;

/// Exports a module's manifest from a `cdylib`/`dylib` crate.
///
/// The module must be built against the same version of this crate and with
/// the same toolchain as the host.
///
/// ```ignore
/// strata::declare_module!( ModuleManifest::new()
///     .export( ExportedType::new::<GreeterPlugin>()
///         .implements::<dyn Plugin, _>(| _ | Ok( Arc::new( GreeterPlugin ) as Arc<dyn Plugin> )))
/// );
/// ```
#[macro_export]
macro_rules! declare_module {
    ( $manifest:expr $(,)? ) => {
        #[no_mangle]
        pub fn strata_module_manifest() -> $crate::ModuleManifest { $manifest }
    };
}

/// One capability an exported type can be bound to.
#[derive( Debug, Clone )]
pub struct Implementation {
    capability: TypeKey,
    factory: ServiceFactory,
}

impl Implementation {

    pub fn new( capability: TypeKey, factory: ServiceFactory ) -> Self {
        Self { capability, factory }
    }

    #[inline] pub fn capability( &self ) -> &TypeKey { &self.capability }
    #[inline] pub fn factory( &self ) -> &ServiceFactory { &self.factory }

    pub(crate) fn into_parts( self ) -> ( TypeKey, ServiceFactory ) {( self.capability, self.factory )}

}

/// A type exported by a module.
///
/// A type is *assignable* to a capability when it is concrete and lists an
/// [`Implementation`] for that capability's key.
#[derive( Debug, Clone )]
pub struct ExportedType {
    name: Arc<str>,
    is_abstract: bool,
    implementations: Vec<Implementation>,
}

impl ExportedType {

    /// Describes `T`, named by its type path.
    pub fn new<T: ?Sized + 'static>() -> Self {
        Self::named( std::any::type_name::<T>() )
    }

    pub fn named( name: impl Into<Arc<str>> ) -> Self {
        Self { name: name.into(), is_abstract: false, implementations: Vec::new() }
    }

    /// Declares that this type can be bound to capability `C`, constructed by `factory`.
    #[must_use]
    pub fn implements<C, F>( self, factory: F ) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<C>, ResolveError> + Send + Sync + 'static,
    {
        self.implementation( Implementation::new( TypeKey::of::<C>(), ServiceFactory::new( factory )))
    }

    #[must_use]
    pub fn implementation( mut self, implementation: Implementation ) -> Self {
        self.implementations.push( implementation );
        self
    }

    /// Marks the type as abstract: it is reported but never bound.
    #[must_use]
    pub fn abstract_type( mut self ) -> Self {
        self.is_abstract = true ;
        self
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn is_abstract( &self ) -> bool { self.is_abstract }
    #[inline] pub fn implementations( &self ) -> &[Implementation] { &self.implementations }

    /// The implementation to bind for `capability`, if this type is assignable to it.
    pub fn assignable_to( &self, capability: &TypeKey ) -> Option<&Implementation> {
        if self.is_abstract { return None }
        self.implementations.iter().find(| implementation | &implementation.capability == capability )
    }

    pub(crate) fn map_implementations( mut self, f: impl FnMut( Implementation ) -> Implementation ) -> Self {
        self.implementations = self.implementations.into_iter().map( f ).collect();
        self
    }

}

/// Everything a module exports.
#[derive( Debug, Clone, Default )]
pub struct ModuleManifest {
    exports: Vec<ExportedType>,
    bundled: Vec<TypeKey>,
}

impl ModuleManifest {

    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn export( mut self, exported: ExportedType ) -> Self {
        self.exports.push( exported );
        self
    }

    /// Declares that the module carries its own private copy of `T`.
    ///
    /// A bundled copy takes precedence over the host's copy of a shared type
    /// unless the host prefers shared types.
    #[must_use]
    pub fn bundles<T: ?Sized + 'static>( self ) -> Self {
        self.bundles_key( TypeKey::of::<T>() )
    }

    #[must_use]
    pub fn bundles_key( mut self, key: TypeKey ) -> Self {
        self.bundled.push( key );
        self
    }

    /// Exported types in the order the module lists them.
    #[inline] pub fn exports( &self ) -> &[ExportedType] { &self.exports }
    #[inline] pub fn bundled( &self ) -> &[TypeKey] { &self.bundled }

    pub(crate) fn into_parts( self ) -> ( Vec<ExportedType>, Vec<TypeKey> ) {( self.exports, self.bundled )}

}

#[cfg( test )]
mod tests {

    use super::*;

    trait Greeter: Send + Sync {}
    trait Farewell: Send + Sync {}
    struct Hello ;
    impl Greeter for Hello {}

    #[test]
    fn abstract_types_are_never_assignable() {
        let concrete = ExportedType::new::<Hello>()
            .implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Hello ) as Arc<dyn Greeter> ));
        let base = concrete.clone().abstract_type();

        assert!( concrete.assignable_to( &TypeKey::of::<dyn Greeter>() ).is_some() );
        assert!( concrete.assignable_to( &TypeKey::of::<dyn Farewell>() ).is_none() );
        assert!( base.assignable_to( &TypeKey::of::<dyn Greeter>() ).is_none() );
        assert_eq!( base.implementations().len(), 1 );
    }

}
