//! Type identity across the module boundary.
//!
//! A module is compiled separately from the host, so the host cannot rely on
//! [`TypeId`]( std::any::TypeId ) to recognise the types a module talks about.
//! Instead every type is named by a [`TypeKey`]. A key carries the type's path
//! and a [`Scope`]: keys minted by the host and keys that were allowed to cross
//! the boundary live in [`Scope::Host`], everything else a module mentions is
//! re-scoped to that module and never compares equal to a host key.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;



/// Where a [`TypeKey`]'s identity lives.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub enum Scope {
    /// The host's copy of the type. Shared types resolve here on both sides.
    Host,
    /// A private copy owned by the module at the given path.
    Module( Arc<Path> ),
}

/// Identity of a type as seen by the container and the module boundary.
///
/// Two keys are equal only when both their names and their scopes match.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct TypeKey {
    name: Arc<str>,
    scope: Scope,
}

impl TypeKey {

    /// Key of `T` in the host scope.
    ///
    /// Works for trait objects too, which is how capabilities are usually named:
    /// `TypeKey::of::<dyn Greeter>()`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named( std::any::type_name::<T>() )
    }

    /// Key for an arbitrary type name in the host scope.
    pub fn named( name: impl Into<Arc<str>> ) -> Self {
        Self { name: name.into(), scope: Scope::Host }
    }

    /// The same type name, owned by the module at `module`.
    pub fn private_to( &self, module: &Path ) -> Self {
        Self { name: Arc::clone( &self.name ), scope: Scope::Module( Arc::from( module )) }
    }

    /// Type path this key was created from.
    #[inline] pub fn name( &self ) -> &str { &self.name }

    /// Identity scope of this key.
    #[inline] pub fn scope( &self ) -> &Scope { &self.scope }

    /// `true` if this key is the host's copy of its type.
    #[inline] pub fn is_host( &self ) -> bool { self.scope == Scope::Host }

    /// Path of the owning module for private keys.
    pub fn module( &self ) -> Option<PathBuf> {
        match &self.scope {
            Scope::Host => None,
            Scope::Module( path ) => Some( path.to_path_buf() ),
        }
    }

}

impl std::fmt::Display for TypeKey {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        match &self.scope {
            Scope::Host => write!( f, "{}", self.name ),
            Scope::Module( path ) => write!( f, "{} (private to {})", self.name, path.display() ),
        }
    }
}

/// The allow-list of types whose identity is unified across the module boundary.
///
/// Keeps insertion order so diagnostics list types the way they were shared.
/// Only host-scoped keys can be shared; a private key is meaningless outside
/// its module.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct SharedTypes {
    keys: Vec<TypeKey>,
}

impl SharedTypes {

    /// An empty allow-list.
    pub fn new() -> Self { Self::default() }

    /// Adds `key`, returning `false` if it was already present or is not a host key.
    pub fn insert( &mut self, key: TypeKey ) -> bool {
        if !key.is_host() || self.keys.contains( &key ) { return false }
        self.keys.push( key );
        true
    }

    /// Adds the key of `T`.
    pub fn share<T: ?Sized + 'static>( &mut self ) -> bool {
        self.insert( TypeKey::of::<T>() )
    }

    /// `true` if `key` may cross the boundary by reference.
    #[inline] pub fn contains( &self, key: &TypeKey ) -> bool { self.keys.contains( key ) }

    /// Shared keys in insertion order.
    pub fn iter( &self ) -> impl Iterator<Item = &TypeKey> { self.keys.iter() }

    #[inline] pub fn len( &self ) -> usize { self.keys.len() }
    #[inline] pub fn is_empty( &self ) -> bool { self.keys.is_empty() }

}

impl Extend<TypeKey> for SharedTypes {
    fn extend<I: IntoIterator<Item = TypeKey>>( &mut self, iter: I ) {
        iter.into_iter().for_each(| key | { self.insert( key ); });
    }
}

impl FromIterator<TypeKey> for SharedTypes {
    fn from_iter<I: IntoIterator<Item = TypeKey>>( iter: I ) -> Self {
        let mut shared = Self::new();
        shared.extend( iter );
        shared
    }
}

#[cfg( test )]
mod tests {

    use super::*;

    trait Greeter {}

    #[test]
    fn private_keys_never_match_host_keys() {
        let host = TypeKey::of::<dyn Greeter>();
        let private = host.private_to( Path::new( "/modules/m1/m1.so" ));
        assert_ne!( host, private );
        assert_eq!( host.name(), private.name() );
        assert_eq!( private.module(), Some( PathBuf::from( "/modules/m1/m1.so" )));
    }

    #[test]
    fn shared_types_keep_first_insertion_and_reject_private_keys() {
        let mut shared = SharedTypes::new();
        assert!( shared.share::<dyn Greeter>() );
        assert!( !shared.share::<dyn Greeter>() );
        assert!( !shared.insert( TypeKey::of::<u8>().private_to( Path::new( "m" ))));
        assert!( shared.share::<u8>() );
        let names = shared.iter().map( TypeKey::name ).collect::<Vec<_>>();
        assert_eq!( names, vec![ std::any::type_name::<dyn Greeter>(), "u8" ]);
    }

}
