use std::any::Any ;
use std::sync::Arc ;

use crate::type_key::{ SharedTypes, TypeKey };
use super::{ Lifetime, ResolveError, Resolver, ServiceProvider };



/// A constructed service, type-erased. Always holds an `Arc<T>` for the service type `T`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type FactoryFn = dyn Fn( &Resolver<'_> ) -> Result<Instance, ResolveError> + Send + Sync ;

/// Type-erased constructor of a service.
///
/// Factories receive a [`Resolver`] so they can pull their own dependencies
/// out of the container (constructor injection).
#[derive( Clone )]
pub struct ServiceFactory( Arc<FactoryFn> );

impl ServiceFactory {

    /// Wraps a typed factory producing `Arc<T>`.
    pub fn new<T, F>( factory: F ) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        Self( Arc::new( move | resolver: &Resolver<'_> | factory( resolver ).map(| service | Arc::new( service ) as Instance )))
    }

    /// A factory that always hands out the same instance.
    pub fn from_instance<T>( instance: Arc<T> ) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self::new( move | _: &Resolver<'_> | Ok( Arc::clone( &instance )))
    }

    pub(crate) fn create( &self, resolver: &Resolver<'_> ) -> Result<Instance, ResolveError> {
        ( self.0 )( resolver )
    }

    /// The same factory, but every resolution it performs is limited to `boundary`.
    pub(crate) fn within( &self, boundary: Arc<SharedTypes> ) -> Self {
        let inner = self.clone();
        Self( Arc::new( move | resolver: &Resolver<'_> | inner.create( &resolver.restricted( Arc::clone( &boundary )))))
    }

}

impl std::fmt::Debug for ServiceFactory {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.write_str( "ServiceFactory(<closure>)" )
    }
}

/// One binding of a service type to an implementation.
#[derive( Debug, Clone )]
pub struct ServiceDescriptor {
    service: TypeKey,
    implementation: Arc<str>,
    lifetime: Lifetime,
    factory: ServiceFactory,
}

impl ServiceDescriptor {

    pub fn new(
        service: TypeKey,
        implementation: impl Into<Arc<str>>,
        lifetime: Lifetime,
        factory: ServiceFactory,
    ) -> Self {
        Self { service, implementation: implementation.into(), lifetime, factory }
    }

    /// The capability this binding satisfies.
    #[inline] pub fn service( &self ) -> &TypeKey { &self.service }
    /// Name of the implementing type, used for diagnostics.
    #[inline] pub fn implementation( &self ) -> &str { &self.implementation }
    #[inline] pub fn lifetime( &self ) -> Lifetime { self.lifetime }
    #[inline] pub fn factory( &self ) -> &ServiceFactory { &self.factory }

}

/// An ordered list of service bindings.
///
/// Adding never replaces an earlier binding for the same service: single-value
/// resolution picks the last one, multi-value resolution yields all of them in
/// the order they were added. Plugins receive the collection by value and hand
/// back the one the host should continue with.
#[derive( Debug, Clone, Default )]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {

    pub fn new() -> Self { Self::default() }

    /// Appends a binding.
    pub fn add( &mut self, descriptor: ServiceDescriptor ) -> &mut Self {
        self.descriptors.push( descriptor );
        self
    }

    /// Binds `T` with an explicit lifetime.
    pub fn add_service<T, F>( &mut self, lifetime: Lifetime, factory: F ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.add( ServiceDescriptor::new(
            TypeKey::of::<T>(),
            std::any::type_name::<F>(),
            lifetime,
            ServiceFactory::new( factory ),
        ))
    }

    pub fn add_singleton<T, F>( &mut self, factory: F ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.add_service( Lifetime::Singleton, factory )
    }

    pub fn add_scoped<T, F>( &mut self, factory: F ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.add_service( Lifetime::Scoped, factory )
    }

    pub fn add_transient<T, F>( &mut self, factory: F ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn( &Resolver<'_> ) -> Result<Arc<T>, ResolveError> + Send + Sync + 'static,
    {
        self.add_service( Lifetime::Transient, factory )
    }

    /// Binds an existing instance as a singleton.
    pub fn add_instance<T>( &mut self, instance: Arc<T> ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add( ServiceDescriptor::new(
            TypeKey::of::<T>(),
            std::any::type_name::<T>(),
            Lifetime::Singleton,
            ServiceFactory::from_instance( instance ),
        ))
    }

    /// Drops every binding for `T`, returning how many were removed.
    pub fn remove_all<T: ?Sized + 'static>( &mut self ) -> usize {
        let key = TypeKey::of::<T>();
        let before = self.descriptors.len();
        self.descriptors.retain(| descriptor | descriptor.service != key );
        before - self.descriptors.len()
    }

    /// All bindings in registration order.
    #[inline] pub fn descriptors( &self ) -> &[ServiceDescriptor] { &self.descriptors }

    /// Bindings for `key` in registration order.
    pub fn descriptors_for<'a>( &'a self, key: &'a TypeKey ) -> impl Iterator<Item = &'a ServiceDescriptor> + 'a {
        self.descriptors.iter().filter( move | descriptor | &descriptor.service == key )
    }

    /// `true` if at least one binding exists for `T`.
    pub fn contains<T: ?Sized + 'static>( &self ) -> bool {
        let key = TypeKey::of::<T>();
        self.descriptors.iter().any(| descriptor | descriptor.service == key )
    }

    #[inline] pub fn len( &self ) -> usize { self.descriptors.len() }
    #[inline] pub fn is_empty( &self ) -> bool { self.descriptors.is_empty() }

    /// Snapshots the current bindings into a provider.
    ///
    /// Later changes to this collection are not seen by the provider, and every
    /// provider owns its own singleton instances.
    pub fn build_provider( &self ) -> ServiceProvider {
        ServiceProvider::new( self.descriptors.clone() )
    }

}

impl Extend<ServiceDescriptor> for ServiceCollection {
    fn extend<I: IntoIterator<Item = ServiceDescriptor>>( &mut self, iter: I ) {
        self.descriptors.extend( iter );
    }
}
