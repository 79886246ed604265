//! The capability a module implements to take part in service composition.

use crate::BoxError ;
use crate::configuration::Configuration ;
use crate::container::ServiceCollection ;



/// Entry point of a module into the host's service composition.
///
/// Every plugin discovered during a build receives the host's collection in
/// turn, in discovery order, and returns the collection the next plugin (and
/// finally the host) continues with. A plugin may add bindings, replace them
/// by registering later ones, or remove them.
///
/// Hosts with their own plugin contract declare a sub-trait and build a
/// [`PluginBuilder`]( crate::PluginBuilder ) for `dyn MyPlugin`.
///
/// # Example
///
/// ```
/// use std::sync::Arc ;
/// use strata::{ BoxError, Configuration, Plugin, ServiceCollection };
///
/// trait OutputWriter: Send + Sync { fn write( &self, line: &str ); }
///
/// struct Stdout ;
/// impl OutputWriter for Stdout { fn write( &self, line: &str ) { println!( "{line}" ) }}
///
/// struct WriterPlugin ;
///
/// impl Plugin for WriterPlugin {
///     fn configure_services(
///         &self,
///         mut services: ServiceCollection,
///         _config: Option<&Configuration>,
///     ) -> Result<ServiceCollection, BoxError> {
///         services.add_instance::<dyn OutputWriter>( Arc::new( Stdout ));
///         Ok( services )
///     }
/// }
///
/// let services = WriterPlugin.configure_services( ServiceCollection::new(), None ).unwrap();
/// assert!( services.contains::<dyn OutputWriter>() );
/// ```
pub trait Plugin: Send + Sync {

    /// Adds this plugin's bindings to `services`.
    ///
    /// # Errors
    /// Any error aborts composition and is returned to the host unchanged.
    fn configure_services(
        &self,
        services: ServiceCollection,
        config: Option<&Configuration>,
    ) -> Result<ServiceCollection, BoxError>;

    /// Name used in diagnostics.
    fn name( &self ) -> &'static str { std::any::type_name::<Self>() }

}
