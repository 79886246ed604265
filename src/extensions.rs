use crate::builder::PluginBuilder ;
use crate::compose::ComposeError ;
use crate::container::ServiceCollection ;
use crate::plugin::Plugin ;
use crate::type_key::TypeKey ;



/// Runs a module build directly on a [`ServiceCollection`].
///
/// ```no_run
/// use strata::{ AddPlugins, ServiceCollection };
///
/// let services = ServiceCollection::new()
///     .add_plugins(| builder | builder.add_search_path( "extensions" ))?;
/// # Ok::<(), strata::ComposeError>(())
/// ```
pub trait AddPlugins: Sized {

    /// Builds with a [`PluginBuilder`] for `P` adjusted by `configure`.
    ///
    /// # Errors
    /// See [`BuilderConfig::build_services`]( crate::BuilderConfig::build_services ).
    fn add_plugins_for<P, F>( self, configure: F ) -> Result<ServiceCollection, ComposeError>
    where
        P: ?Sized + Plugin + 'static,
        F: FnOnce( PluginBuilder<P> ) -> PluginBuilder<P> ;

    /// Builds for [`Plugin`] with a builder adjusted by `configure`.
    ///
    /// # Errors
    /// See [`BuilderConfig::build_services`]( crate::BuilderConfig::build_services ).
    fn add_plugins<F>( self, configure: F ) -> Result<ServiceCollection, ComposeError>
    where
        F: FnOnce( PluginBuilder ) -> PluginBuilder,
    {
        self.add_plugins_for::<dyn Plugin, _>( configure )
    }

    /// Builds for [`Plugin`] with the default configuration plus `shared_types`.
    ///
    /// # Errors
    /// See [`BuilderConfig::build_services`]( crate::BuilderConfig::build_services ).
    fn add_plugins_sharing( self, shared_types: impl IntoIterator<Item = TypeKey> ) -> Result<ServiceCollection, ComposeError> {
        self.add_plugins(| builder | builder.share_types( shared_types ))
    }

}

impl AddPlugins for ServiceCollection {
    fn add_plugins_for<P, F>( self, configure: F ) -> Result<ServiceCollection, ComposeError>
    where
        P: ?Sized + Plugin + 'static,
        F: FnOnce( PluginBuilder<P> ) -> PluginBuilder<P>,
    {
        configure( PluginBuilder::for_capability() ).build_services( Some( self ), None, false )
    }
}
