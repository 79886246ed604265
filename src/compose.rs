//! Running a build: discover, load, scan, then let every accepted plugin
//! configure the host's services in turn.

use std::sync::Arc ;
use thiserror::Error ;

use crate::BoxError ;
use crate::builder::{ BuilderConfig, PluginBuilder };
use crate::configuration::Configuration ;
use crate::container::{ ResolveError, ServiceCollection };
use crate::convention::discover ;
use crate::loader::{ LoadError, ModuleLoaderFactory };
use crate::logger::Diagnostics ;
use crate::plugin::Plugin ;
use crate::scanner::{ ScanReport, TypeScanner };
use crate::type_key::TypeKey ;



/// Errors that abort a build.
///
/// Failures of the post-discovery hook and of [`Plugin::configure_services`]
/// are passed through unchanged. Bindings added before the failure stay in
/// the collection that was being built; it is not returned.
#[derive( Debug, Error )]
pub enum ComposeError {
    #[error( transparent )] Load( #[from] LoadError ),
    #[error( "Failed to resolve discovered plugins: {0}" )] Resolve( #[source] ResolveError ),
    #[error( transparent )] Hook( BoxError ),
    #[error( transparent )] Configure( BoxError ),
}

impl<P: ?Sized + Plugin + 'static> BuilderConfig<P> {

    /// Runs discovery, loading and composition once.
    ///
    /// - `services`: the collection to extend, a new one if `None`.
    /// - `config`: handed to every plugin. If `None`, a [`Configuration`]
    ///   registered in `services` is used when there is one.
    /// - `isolate_resolution`: stage discovered plugins in a collection of
    ///   their own instead of `services`, so resolving them cannot see (or be
    ///   shadowed by) the host's own bindings of the plugin capability.
    ///
    /// Force-loaded implementations are always bound into `services`, including
    /// those of modules whose plugin the guard rejects.
    ///
    /// # Errors
    /// Fails if a module cannot be loaded, a plugin cannot be constructed, or
    /// a hook or plugin fails.
    pub fn build_services(
        self,
        services: Option<ServiceCollection>,
        config: Option<Configuration>,
        isolate_resolution: bool,
    ) -> Result<ServiceCollection, ComposeError> {

        let log = Diagnostics::new( self.sink.clone() );
        let mut services = services.unwrap_or_default();
        let config = config.or_else(|| ambient_configuration( &services, &log ));
        let mut staging = isolate_resolution.then( ServiceCollection::new );

        let roots = self.search_paths.resolve();
        roots.iter().for_each(| root | log.debug( &format!( "Loading all plugins from {}", root.display() )));
        let ( candidates, errors ) = discover( &roots, &self.conventions );
        errors.iter().for_each(| error | log.warn( &error.to_string() ));

        let loader = ModuleLoaderFactory::new( Arc::clone( &self.loader ), self.shared_types.clone(), self.prefer_shared_types );
        let scanner = TypeScanner::new( TypeKey::of::<P>(), &self.force_load, self.registration );
        let mut report = ScanReport::default();

        for candidate in &candidates {
            log.debug( &format!( "Plugin located! Loading {}", candidate.path().display() ));
            let module = loader.load( candidate )?;
            let scan = scanner.scan( &module );
            report.absorb( scan.report() );
            if scan.plugins().is_empty() {
                log.debug( &format!( "Found no compatible plugin types in {}", module.path().display() ));
            }

            let ( plugins, force_loaded ) = scan.into_parts();
            staging.as_mut().unwrap_or( &mut services ).extend( plugins );
            services.extend( force_loaded );
        }

        tracing::debug!(
            target: "strata",
            modules = candidates.len(),
            plugins = report.plugins_staged,
            force_loaded = report.force_loaded,
            skipped = report.force_load_skipped,
            "Module scan complete",
        );

        let plugins = staging.as_ref().unwrap_or( &services )
            .build_provider()
            .get_all::<P>()
            .map_err( ComposeError::Resolve )?;

        plugins.into_iter().try_fold( services, | services, plugin | {
            if !( self.guard )( &*plugin ) {
                log.debug( &format!( "Skipping plugin {}", plugin.name() ));
                return Ok( services )
            }
            if let Some( hook ) = &self.hook { hook( &*plugin ).map_err( ComposeError::Hook )? }
            log.debug( &format!( "Configuring services with {}", plugin.name() ));
            plugin.configure_services( services, config.as_ref() ).map_err( ComposeError::Configure )
        })

    }

}

impl<P: ?Sized + Plugin + 'static> PluginBuilder<P> {
    /// Shortcut for `self.build().build_services( .. )`.
    ///
    /// # Errors
    /// See [`BuilderConfig::build_services`].
    pub fn build_services(
        self,
        services: Option<ServiceCollection>,
        config: Option<Configuration>,
        isolate_resolution: bool,
    ) -> Result<ServiceCollection, ComposeError> {
        self.build().build_services( services, config, isolate_resolution )
    }
}

fn ambient_configuration( services: &ServiceCollection, log: &Diagnostics ) -> Option<Configuration> {
    match services.build_provider().try_get::<Configuration>() {
        Ok( config ) => config.map(| config | Configuration::clone( &config )),
        Err( error ) => {
            log.debug( &format!( "No configuration available: {error}" ));
            None
        }
    }
}
