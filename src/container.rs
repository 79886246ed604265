//! The service container modules compose into.
//!
//! Bindings are collected in a [`ServiceCollection`] and resolved through a
//! [`ServiceProvider`] built from it. Services are addressed by [`TypeKey`],
//! usually of a trait object (`dyn Greeter`), and handed out as `Arc<T>`.
//!
//! [`TypeKey`]: crate::TypeKey

mod collection ;
mod lifetime ;
mod provider ;

pub use collection::{ ServiceCollection, ServiceDescriptor, ServiceFactory };
pub use lifetime::{ Lifetime, Registration, InvalidRegistration };
pub use provider::{ ServiceProvider, ServiceScope, Resolver, ResolveError };

#[cfg( test )]
mod tests {

    use std::sync::Arc ;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    use super::*;
    use crate::type_key::SharedTypes ;

    trait Writer: Send + Sync { fn id( &self ) -> usize ; }
    struct Numbered( usize );
    impl Writer for Numbered { fn id( &self ) -> usize { self.0 }}

    fn counting( lifetime: Lifetime, counter: &Arc<AtomicUsize> ) -> ServiceCollection {
        let counter = Arc::clone( counter );
        let mut services = ServiceCollection::new();
        services.add_service::<dyn Writer, _>( lifetime, move | _ | {
            Ok( Arc::new( Numbered( counter.fetch_add( 1, Ordering::SeqCst ))) as Arc<dyn Writer> )
        });
        services
    }

    #[test]
    fn last_registration_wins_and_all_are_ordered() {
        let mut services = ServiceCollection::new();
        services.add_instance::<dyn Writer>( Arc::new( Numbered( 1 )));
        services.add_instance::<dyn Writer>( Arc::new( Numbered( 2 )));
        let provider = services.build_provider();

        assert_eq!( provider.get::<dyn Writer>().unwrap().id(), 2 );
        let all = provider.get_all::<dyn Writer>().unwrap().iter().map(| w | w.id() ).collect::<Vec<_>>();
        assert_eq!( all, vec![ 1, 2 ]);
    }

    #[test]
    fn missing_services() {
        let provider = ServiceCollection::new().build_provider();
        assert!( matches!( provider.get::<dyn Writer>(), Err( ResolveError::NotRegistered( _ ))));
        assert!( provider.try_get::<dyn Writer>().unwrap().is_none() );
        assert!( provider.get_all::<dyn Writer>().unwrap().is_empty() );
    }

    #[test]
    fn singletons_are_built_once_per_provider() {
        let counter = Arc::new( AtomicUsize::new( 0 ));
        let services = counting( Lifetime::Singleton, &counter );

        let provider = services.build_provider();
        assert_eq!( provider.get::<dyn Writer>().unwrap().id(), 0 );
        assert_eq!( provider.create_scope().get::<dyn Writer>().unwrap().id(), 0 );

        let other = services.build_provider();
        assert_eq!( other.get::<dyn Writer>().unwrap().id(), 1 );
        assert_eq!( counter.load( Ordering::SeqCst ), 2 );
    }

    #[test]
    fn scoped_instances_are_per_scope() {
        let counter = Arc::new( AtomicUsize::new( 0 ));
        let provider = counting( Lifetime::Scoped, &counter ).build_provider();

        let scope = provider.create_scope();
        assert_eq!( scope.get::<dyn Writer>().unwrap().id(), 0 );
        assert_eq!( scope.get::<dyn Writer>().unwrap().id(), 0 );
        assert_eq!( provider.create_scope().get::<dyn Writer>().unwrap().id(), 1 );
        assert_eq!( provider.get::<dyn Writer>().unwrap().id(), 2 );
    }

    #[test]
    fn transients_are_built_every_time() {
        let counter = Arc::new( AtomicUsize::new( 0 ));
        let provider = counting( Lifetime::Transient, &counter ).build_provider();
        provider.get::<dyn Writer>().unwrap();
        provider.get::<dyn Writer>().unwrap();
        assert_eq!( counter.load( Ordering::SeqCst ), 2 );
    }

    #[test]
    fn factories_inject_dependencies() {
        struct Prefix( String );
        struct Prefixed( Arc<Prefix> );
        impl Writer for Prefixed { fn id( &self ) -> usize { self.0.0.len() }}

        let mut services = ServiceCollection::new();
        services.add_instance( Arc::new( Prefix( "[out]".to_string() )));
        services.add_singleton::<dyn Writer, _>(| resolver | {
            Ok( Arc::new( Prefixed( resolver.get::<Prefix>()? )) as Arc<dyn Writer> )
        });
        assert_eq!( services.build_provider().get::<dyn Writer>().unwrap().id(), 5 );
    }

    #[test]
    fn restricted_factories_only_see_shared_types() {
        struct Secret ;
        let mut services = ServiceCollection::new();
        services.add_instance( Arc::new( Secret ));
        services.add( ServiceDescriptor::new(
            crate::TypeKey::of::<dyn Writer>(),
            "module::Snooper",
            Lifetime::Transient,
            ServiceFactory::new(| resolver | {
                assert!( resolver.is_restricted() );
                resolver.get::<Secret>()?;
                Ok( Arc::new( Numbered( 0 )) as Arc<dyn Writer> )
            }).within( Arc::new( SharedTypes::new() )),
        ));

        let provider = services.build_provider();
        assert!( provider.get::<Secret>().is_ok() );
        assert!( matches!( provider.get::<dyn Writer>(), Err( ResolveError::NotShared( _ ))));
    }

    #[test]
    fn remove_all_drops_every_binding() {
        let mut services = ServiceCollection::new();
        services.add_instance::<dyn Writer>( Arc::new( Numbered( 1 )));
        services.add_instance::<dyn Writer>( Arc::new( Numbered( 2 )));
        assert_eq!( services.remove_all::<dyn Writer>(), 2 );
        assert!( !services.contains::<dyn Writer>() );
    }

    #[test]
    fn contains_only_reports_bound_services() {
        let mut services = ServiceCollection::new();
        assert!( !services.contains::<dyn Writer>() );
        services.add_instance::<dyn Writer>( Arc::new( Numbered( 1 )));
        assert!( services.contains::<dyn Writer>() );
        assert!( !services.contains::<Numbered>() );
        assert_eq!( services.descriptors_for( &crate::TypeKey::of::<dyn Writer>() ).count(), 1 );
    }

}
