use std::collections::HashMap ;
use std::sync::{ Arc, Mutex };
use once_cell::sync::OnceCell ;
use thiserror::Error ;

use crate::BoxError ;
use crate::type_key::{ SharedTypes, TypeKey };
use super::{ Lifetime, ServiceDescriptor };
use super::collection::Instance ;



/// Errors raised while resolving services.
#[derive( Debug, Error )]
pub enum ResolveError {
    /// Nothing is bound for the requested type.
    #[error( "No service registered for {0}" )] NotRegistered( TypeKey ),
    /// Module code asked for a type that is not allowed to cross the module boundary.
    #[error( "{0} is not shared across the module boundary" )] NotShared( TypeKey ),
    /// A binding produced an instance of a different type than the one it was registered under.
    #[error( "Implementation {implementation} does not produce {service}" )]
    TypeMismatch { service: TypeKey, implementation: Arc<str> },
    /// A factory failed for a reason of its own.
    #[error( "Failed to construct {service}: {source}" )]
    Construction { service: TypeKey, source: BoxError },
}

impl ResolveError {
    /// Wraps a factory's own failure.
    pub fn construction<T: ?Sized + 'static>( source: impl Into<BoxError> ) -> Self {
        Self::Construction { service: TypeKey::of::<T>(), source: source.into() }
    }
}

struct ProviderState {
    descriptors: Vec<ServiceDescriptor>,
    singletons: Vec<OnceCell<Instance>>,
}

#[derive( Default )]
struct ScopeState {
    instances: Mutex<HashMap<usize, Instance>>,
}

impl ScopeState {

    fn get( &self, index: usize ) -> Option<Instance> {
        self.instances.lock().unwrap_or_else( std::sync::PoisonError::into_inner ).get( &index ).cloned()
    }

    /// Keeps the first instance stored for `index`; the lock is not held while factories run.
    fn insert( &self, index: usize, instance: Instance ) -> Instance {
        self.instances.lock().unwrap_or_else( std::sync::PoisonError::into_inner )
            .entry( index )
            .or_insert( instance )
            .clone()
    }

}

/// Resolves services out of a snapshot of a [`ServiceCollection`]( crate::ServiceCollection ).
///
/// Cloning a provider is cheap and shares its singleton instances. The provider
/// doubles as the root scope for [`Lifetime::Scoped`] bindings.
#[derive( Clone )]
pub struct ServiceProvider {
    state: Arc<ProviderState>,
    root: Arc<ScopeState>,
}

impl ServiceProvider {

    pub(crate) fn new( descriptors: Vec<ServiceDescriptor> ) -> Self {
        let singletons = descriptors.iter().map(| _ | OnceCell::new() ).collect();
        Self {
            state: Arc::new( ProviderState { descriptors, singletons }),
            root: Arc::new( ScopeState::default() ),
        }
    }

    fn resolver( &self ) -> Resolver<'_> {
        Resolver { state: &self.state, scope: &self.root, boundary: None }
    }

    /// The last binding registered for `T`.
    ///
    /// # Errors
    /// Fails if nothing is bound for `T` or the binding's factory fails.
    pub fn get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Arc<T>, ResolveError> {
        self.resolver().get()
    }

    /// Like [`get`]( Self::get ) but `None` when nothing is bound.
    ///
    /// # Errors
    /// Fails if the binding's factory fails.
    pub fn try_get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Option<Arc<T>>, ResolveError> {
        self.resolver().try_get()
    }

    /// Every binding registered for `T`, in registration order.
    ///
    /// # Errors
    /// Fails if any binding's factory fails.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Vec<Arc<T>>, ResolveError> {
        self.resolver().get_all()
    }

    /// Opens a scope with its own [`Lifetime::Scoped`] instances.
    pub fn create_scope( &self ) -> ServiceScope {
        ServiceScope { provider: self.clone(), scope: ScopeState::default() }
    }

}

impl std::fmt::Debug for ServiceProvider {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "ServiceProvider" )
            .field( "descriptors", &self.state.descriptors )
            .finish_non_exhaustive()
    }
}

/// A resolution scope created by [`ServiceProvider::create_scope`].
pub struct ServiceScope {
    provider: ServiceProvider,
    scope: ScopeState,
}

impl ServiceScope {

    fn resolver( &self ) -> Resolver<'_> {
        Resolver { state: &self.provider.state, scope: &self.scope, boundary: None }
    }

    /// # Errors
    /// See [`ServiceProvider::get`].
    pub fn get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Arc<T>, ResolveError> {
        self.resolver().get()
    }

    /// # Errors
    /// See [`ServiceProvider::try_get`].
    pub fn try_get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Option<Arc<T>>, ResolveError> {
        self.resolver().try_get()
    }

    /// # Errors
    /// See [`ServiceProvider::get_all`].
    pub fn get_all<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Vec<Arc<T>>, ResolveError> {
        self.resolver().get_all()
    }

}

/// The view of the container handed to factories.
///
/// A resolver may be restricted to a [`SharedTypes`] boundary: factories that
/// come from a module only ever see the types the host agreed to share.
pub struct Resolver<'a> {
    state: &'a ProviderState,
    scope: &'a ScopeState,
    boundary: Option<Arc<SharedTypes>>,
}

impl<'a> Resolver<'a> {

    pub(crate) fn restricted( &self, boundary: Arc<SharedTypes> ) -> Resolver<'a> {
        Resolver { state: self.state, scope: self.scope, boundary: Some( boundary ) }
    }

    /// `true` if this resolver only sees shared types.
    #[inline] pub fn is_restricted( &self ) -> bool { self.boundary.is_some() }

    /// # Errors
    /// See [`ServiceProvider::get`]. Restricted resolvers also fail with
    /// [`ResolveError::NotShared`] for types outside their boundary.
    pub fn get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Arc<T>, ResolveError> {
        let key = self.visible_key::<T>()?;
        let index = self.indices( &key ).last().ok_or( ResolveError::NotRegistered( key ))?;
        self.typed( index )
    }

    /// # Errors
    /// See [`ServiceProvider::try_get`].
    pub fn try_get<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Option<Arc<T>>, ResolveError> {
        let key = self.visible_key::<T>()?;
        self.indices( &key ).last().map(| index | self.typed( index )).transpose()
    }

    /// # Errors
    /// See [`ServiceProvider::get_all`].
    pub fn get_all<T: ?Sized + Send + Sync + 'static>( &self ) -> Result<Vec<Arc<T>>, ResolveError> {
        let key = self.visible_key::<T>()?;
        self.indices( &key ).map(| index | self.typed( index )).collect()
    }

    fn visible_key<T: ?Sized + 'static>( &self ) -> Result<TypeKey, ResolveError> {
        let key = TypeKey::of::<T>();
        match &self.boundary {
            Some( boundary ) if !boundary.contains( &key ) => Err( ResolveError::NotShared( key )),
            _ => Ok( key ),
        }
    }

    fn indices<'k>( &'k self, key: &'k TypeKey ) -> impl DoubleEndedIterator<Item = usize> + 'k {
        self.state.descriptors.iter()
            .enumerate()
            .filter( move |( _, descriptor )| descriptor.service() == key )
            .map(|( index, _ )| index )
    }

    fn typed<T: ?Sized + Send + Sync + 'static>( &self, index: usize ) -> Result<Arc<T>, ResolveError> {
        let instance = self.instance( index )?;
        instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
            let descriptor = &self.state.descriptors[index];
            ResolveError::TypeMismatch {
                service: descriptor.service().clone(),
                implementation: Arc::from( descriptor.implementation() ),
            }
        })
    }

    fn instance( &self, index: usize ) -> Result<Instance, ResolveError> {
        let descriptor = &self.state.descriptors[index];
        // Factories always start unrestricted; module factories narrow themselves.
        let resolver = Resolver { state: self.state, scope: self.scope, boundary: None };
        match descriptor.lifetime() {
            Lifetime::Transient => descriptor.factory().create( &resolver ),
            Lifetime::Singleton => self.state.singletons[index]
                .get_or_try_init(|| descriptor.factory().create( &resolver ))
                .cloned(),
            Lifetime::Scoped => match self.scope.get( index ) {
                Some( instance ) => Ok( instance ),
                None => descriptor.factory().create( &resolver )
                    .map(| instance | self.scope.insert( index, instance )),
            },
        }
    }

}
