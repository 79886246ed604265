//! Fluent configuration of a module build.

use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use serde::{ Deserialize, Serialize };

use crate::BoxError ;
use crate::configuration::{ ConfigError, Configuration };
use crate::container::{ Registration, ServiceCollection };
use crate::convention::{ CandidateModule, DirectoryNameConvention, DiscoveryError, FnConvention, SearchConvention, discover };
use crate::loader::{ IsolatedLoader, NativeLoader };
use crate::logger::{ LogSink, Logger, console_sink };
use crate::plugin::Plugin ;
use crate::search_paths::SearchPathSet ;
use crate::type_key::{ SharedTypes, TypeKey };
use crate::utils::PartialSuccess ;



pub(crate) type Hook<P> = Arc<dyn Fn( &P ) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type Guard<P> = Arc<dyn Fn( &P ) -> bool + Send + Sync>;

/// Builder options that can be read from configuration.
///
/// ```toml
/// [plugins]
/// search_paths = [ "/opt/app/plugins" ]
/// relative_search_paths = [ "extra" ]
/// default_registration = "transient"
/// prefer_shared_types = true
/// module_extension = "so"
/// console_logging = false
/// ```
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default, deny_unknown_fields )]
pub struct BuilderSettings {
    pub search_paths: Vec<PathBuf>,
    pub relative_search_paths: Vec<PathBuf>,
    /// Parsed like [`PluginBuilder::parse_default_registration`].
    pub default_registration: Option<String>,
    pub prefer_shared_types: Option<bool>,
    pub module_extension: Option<String>,
    pub console_logging: bool,
}

impl BuilderSettings {

    /// Reads settings from the table at `section`, `None` if there is no such table.
    ///
    /// # Errors
    /// Fails if the section does not have the shape of the settings.
    pub fn from_configuration( config: &Configuration, section: &str ) -> Result<Option<Self>, ConfigError> {
        config.get( section )
    }

    /// # Errors
    /// Fails if `source` is not valid TOML or does not have the shape of the settings.
    pub fn from_toml_str( source: &str ) -> Result<Self, ConfigError> {
        Ok( toml::from_str( source )? )
    }

    /// # Errors
    /// Fails if the file cannot be read or does not contain valid settings.
    pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
        Configuration::from_file( path )?.bind()
    }

}

/// Accumulates the configuration of a build.
///
/// `P` is the plugin capability modules implement, `dyn Plugin` unless the host
/// has a contract of its own. The builder starts with the default search roots,
/// shares `P`, [`ServiceCollection`], [`Logger`] and [`Configuration`] with
/// modules, and binds force-loaded implementations as singletons.
///
/// Invalid search paths are ignored rather than reported, so a typo in a path
/// shows up as a build that finds no modules there.
///
/// # Example
///
/// ```no_run
/// use strata::{ PluginBuilder, Registration };
///
/// trait Greeter: Send + Sync { fn greet( &self, name: &str ) -> String ; }
///
/// let services = PluginBuilder::new()
///     .add_search_path( "/opt/app/extensions" )
///     .always_load::<dyn Greeter>()
///     .use_default_registration( Registration::Transient )
///     .use_console_logging()
///     .build_services( None, None, false )?;
///
/// let greeters = services.build_provider().get_all::<dyn Greeter>()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PluginBuilder<P: ?Sized + Plugin + 'static = dyn Plugin> {
    search_paths: SearchPathSet,
    conventions: Vec<Arc<dyn SearchConvention>>,
    shared_types: SharedTypes,
    force_load: Vec<TypeKey>,
    registration: Registration,
    prefer_shared_types: bool,
    sink: Option<LogSink>,
    hook: Option<Hook<P>>,
    guard: Option<Guard<P>>,
    extension: String,
    loader: Arc<dyn IsolatedLoader>,
}

impl PluginBuilder {
    /// A builder for modules implementing [`Plugin`] itself.
    pub fn new() -> Self { Self::for_capability() }
}

impl Default for PluginBuilder {
    fn default() -> Self { Self::new() }
}

impl<P: ?Sized + Plugin + 'static> PluginBuilder<P> {

    /// A builder for modules implementing the capability `P`.
    pub fn for_capability() -> Self {
        let shared_types = [
            TypeKey::of::<P>(),
            TypeKey::of::<ServiceCollection>(),
            TypeKey::of::<Logger>(),
            TypeKey::of::<Configuration>(),
        ].into_iter().collect();
        Self {
            search_paths: SearchPathSet::with_defaults(),
            conventions: Vec::new(),
            shared_types,
            force_load: Vec::new(),
            registration: Registration::default(),
            prefer_shared_types: false,
            sink: None,
            hook: None,
            guard: None,
            extension: std::env::consts::DLL_EXTENSION.to_string(),
            loader: Arc::new( NativeLoader ),
        }
    }

    /// Adds a search root, see [`SearchPathSet::add`].
    ///
    /// Module files directly inside `path` are recognised by the module
    /// extension set at the time of the call.
    #[must_use]
    pub fn add_search_path( mut self, path: impl AsRef<Path> ) -> Self {
        self.search_paths.add( path, &self.extension );
        self
    }

    #[must_use]
    pub fn add_search_paths<I>( self, paths: I ) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        paths.into_iter().fold( self, Self::add_search_path )
    }

    /// Drops every search root added so far, the defaults included.
    #[must_use]
    pub fn clear_search_paths( mut self ) -> Self {
        self.search_paths = SearchPathSet::new();
        self
    }

    /// Adds a search root relative to the running binary's directory.
    #[must_use]
    pub fn add_relative_search_path( mut self, path: impl AsRef<Path> ) -> Self {
        self.search_paths.add_relative( path, &self.extension );
        self
    }

    #[must_use]
    pub fn add_relative_search_paths<I>( self, paths: I ) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        paths.into_iter().fold( self, Self::add_relative_search_path )
    }

    /// Sends diagnostics to `logger` at debug level.
    #[must_use]
    pub fn use_logger( self, logger: Logger ) -> Self {
        self.use_log_sink( move | message | logger.debug( message ))
    }

    /// Sends diagnostics to a logger obtained from `factory` for every message.
    #[must_use]
    pub fn use_logger_factory( self, factory: impl Fn() -> Logger + Send + Sync + 'static ) -> Self {
        self.use_log_sink( move | message | factory().debug( message ))
    }

    /// Prints diagnostics to standard output, prefixed with `PluginLoader:`.
    #[must_use]
    pub fn use_console_logging( mut self ) -> Self {
        self.sink = Some( console_sink() );
        self
    }

    #[must_use]
    pub fn use_log_sink( mut self, sink: impl Fn( &str ) + Send + Sync + 'static ) -> Self {
        self.sink = Some( Arc::new( sink ));
        self
    }

    /// Unifies the identity of `T` across the module boundary.
    #[must_use]
    pub fn share<T: ?Sized + 'static>( mut self ) -> Self {
        self.shared_types.share::<T>();
        self
    }

    #[must_use]
    pub fn share_types( mut self, types: impl IntoIterator<Item = TypeKey> ) -> Self {
        self.shared_types.extend( types );
        self
    }

    /// Binds every implementation of `T` any module exports, with or without a plugin.
    ///
    /// `T` is shared as well, otherwise module implementations could never be
    /// bound as the host's `T`.
    #[must_use]
    pub fn always_load<T: ?Sized + 'static>( self ) -> Self {
        self.always_load_types( std::iter::once( TypeKey::of::<T>() ))
    }

    #[must_use]
    pub fn always_load_types( mut self, types: impl IntoIterator<Item = TypeKey> ) -> Self {
        for key in types {
            self.shared_types.insert( key.clone() );
            if !self.force_load.contains( &key ) { self.force_load.push( key ) }
        }
        self
    }

    /// How force-loaded implementations are bound.
    #[must_use]
    pub fn use_default_registration( mut self, registration: Registration ) -> Self {
        self.registration = registration ;
        self
    }

    /// Like [`use_default_registration`]( Self::use_default_registration ) for a textual value.
    ///
    /// # Errors
    /// Fails immediately for anything other than `none`, `singleton`, `scoped` or `transient`.
    pub fn parse_default_registration( self, registration: &str ) -> Result<Self, ConfigError> {
        Ok( self.use_default_registration( registration.parse()? ))
    }

    /// Adds a search convention. Without any, [`DirectoryNameConvention`] is used.
    #[must_use]
    pub fn add_convention( mut self, convention: impl SearchConvention + 'static ) -> Self {
        self.conventions.push( Arc::new( convention ));
        self
    }

    #[must_use]
    pub fn add_convention_fn<F>( self, name: impl Into<String>, search: F ) -> Self
    where
        F: Fn( &Path ) -> std::io::Result<Vec<PathBuf>> + Send + Sync + 'static,
    {
        self.add_convention( FnConvention::new( name, search ))
    }

    #[must_use]
    pub fn add_convention_type<C: SearchConvention + Default + 'static>( self ) -> Self {
        self.add_convention( C::default() )
    }

    /// Runs `hook` on every accepted plugin right before it configures services.
    #[must_use]
    pub fn after_discovery( mut self, hook: impl Fn( &P ) -> Result<(), BoxError> + Send + Sync + 'static ) -> Self {
        self.hook = Some( Arc::new( hook ));
        self
    }

    /// Plugins for which `guard` returns `false` are skipped.
    #[must_use]
    pub fn with_guard( mut self, guard: impl Fn( &P ) -> bool + Send + Sync + 'static ) -> Self {
        self.guard = Some( Arc::new( guard ));
        self
    }

    /// Whether the host's copy of a shared type wins over a copy a module bundles.
    #[must_use]
    pub fn prefer_shared_types( mut self, prefer: bool ) -> Self {
        self.prefer_shared_types = prefer ;
        self
    }

    /// Extension of module files, without the dot.
    #[must_use]
    pub fn with_module_extension( mut self, extension: impl Into<String> ) -> Self {
        self.extension = extension.into();
        self
    }

    /// Replaces the [`NativeLoader`].
    #[must_use]
    pub fn with_loader( mut self, loader: impl IsolatedLoader + 'static ) -> Self {
        self.loader = Arc::new( loader );
        self
    }

    /// Applies `settings` on top of the current configuration.
    ///
    /// # Errors
    /// Fails immediately if the default registration is not a known value.
    pub fn with_settings( self, settings: &BuilderSettings ) -> Result<Self, ConfigError> {
        let mut builder = match &settings.module_extension {
            Some( extension ) => self.with_module_extension( extension.clone() ),
            None => self,
        };
        if let Some( registration ) = &settings.default_registration {
            builder = builder.parse_default_registration( registration )?;
        }
        if let Some( prefer ) = settings.prefer_shared_types {
            builder = builder.prefer_shared_types( prefer );
        }
        if settings.console_logging { builder = builder.use_console_logging() }
        Ok( builder
            .add_search_paths( &settings.search_paths )
            .add_relative_search_paths( &settings.relative_search_paths ))
    }

    /// Freezes the configuration.
    pub fn build( self ) -> BuilderConfig<P> {
        let conventions = if self.conventions.is_empty() {
            vec![ Arc::new( DirectoryNameConvention::new( self.extension.clone() )) as Arc<dyn SearchConvention> ]
        } else {
            self.conventions
        };
        let guard: Guard<P> = match self.guard {
            Some( guard ) => guard,
            None => Arc::new(| _: &P | true ),
        };
        BuilderConfig {
            search_paths: self.search_paths,
            conventions,
            shared_types: self.shared_types,
            force_load: self.force_load,
            registration: self.registration,
            prefer_shared_types: self.prefer_shared_types,
            sink: self.sink,
            hook: self.hook,
            guard,
            extension: self.extension,
            loader: self.loader,
        }
    }

}

/// A frozen build configuration, consumed by [`build_services`]( BuilderConfig::build_services ).
pub struct BuilderConfig<P: ?Sized + Plugin + 'static = dyn Plugin> {
    pub(crate) search_paths: SearchPathSet,
    pub(crate) conventions: Vec<Arc<dyn SearchConvention>>,
    pub(crate) shared_types: SharedTypes,
    pub(crate) force_load: Vec<TypeKey>,
    pub(crate) registration: Registration,
    pub(crate) prefer_shared_types: bool,
    pub(crate) sink: Option<LogSink>,
    pub(crate) hook: Option<Hook<P>>,
    pub(crate) guard: Guard<P>,
    pub(crate) extension: String,
    pub(crate) loader: Arc<dyn IsolatedLoader>,
}

impl<P: ?Sized + Plugin + 'static> BuilderConfig<P> {

    /// Search roots as registered.
    #[inline] pub fn search_roots( &self ) -> &[PathBuf] { self.search_paths.roots() }
    #[inline] pub fn shared_types( &self ) -> &SharedTypes { &self.shared_types }
    /// Force-load capabilities in registration order.
    #[inline] pub fn force_load_types( &self ) -> &[TypeKey] { &self.force_load }
    #[inline] pub fn default_registration( &self ) -> Registration { self.registration }
    #[inline] pub fn prefers_shared_types( &self ) -> bool { self.prefer_shared_types }
    #[inline] pub fn module_extension( &self ) -> &str { &self.extension }

    pub fn convention_names( &self ) -> impl Iterator<Item = &str> {
        self.conventions.iter().map(| convention | convention.name() )
    }

    /// Lists the module files a build would load, without loading them.
    pub fn discover_candidates( &self ) -> PartialSuccess<Vec<CandidateModule>, DiscoveryError> {
        discover( &self.search_paths.resolve(), &self.conventions )
    }

}

impl<P: ?Sized + Plugin + 'static> std::fmt::Debug for BuilderConfig<P> {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "BuilderConfig" )
            .field( "search_paths", &self.search_paths )
            .field( "conventions", &self.convention_names().collect::<Vec<_>>() )
            .field( "shared_types", &self.shared_types )
            .field( "force_load", &self.force_load )
            .field( "registration", &self.registration )
            .field( "prefer_shared_types", &self.prefer_shared_types )
            .field( "extension", &self.extension )
            .finish_non_exhaustive()
    }
}

#[cfg( test )]
mod tests {

    use super::*;

    trait Greeter: Send + Sync {}
    trait Custom: Plugin {}

    #[test]
    fn shares_the_composition_types_by_default() {
        let config = PluginBuilder::new().build();
        for key in [
            TypeKey::of::<dyn Plugin>(),
            TypeKey::of::<ServiceCollection>(),
            TypeKey::of::<Logger>(),
            TypeKey::of::<Configuration>(),
        ] {
            assert!( config.shared_types().contains( &key ), "{key} is not shared" );
        }
        assert_eq!( config.default_registration(), Registration::Singleton );
        assert!( !config.prefers_shared_types() );
        assert_eq!( config.convention_names().collect::<Vec<_>>(), vec![ "directory-name" ]);
    }

    #[test]
    fn custom_capabilities_are_shared() {
        let config = PluginBuilder::<dyn Custom>::for_capability().build();
        assert!( config.shared_types().contains( &TypeKey::of::<dyn Custom>() ));
    }

    #[test]
    fn always_load_also_shares() {
        let config = PluginBuilder::new()
            .always_load::<dyn Greeter>()
            .always_load_types([ TypeKey::of::<dyn Greeter>(), TypeKey::of::<u32>() ])
            .build();
        assert_eq!( config.force_load_types(), &[ TypeKey::of::<dyn Greeter>(), TypeKey::of::<u32>() ]);
        assert!( config.shared_types().contains( &TypeKey::of::<dyn Greeter>() ));
        assert!( config.shared_types().contains( &TypeKey::of::<u32>() ));
    }

    #[test]
    fn invalid_registration_fails_immediately() {
        assert!( matches!(
            PluginBuilder::new().parse_default_registration( "sometimes" ),
            Err( ConfigError::Registration( _ )),
        ));
        let config = PluginBuilder::new().parse_default_registration( "Scoped" ).unwrap().build();
        assert_eq!( config.default_registration(), Registration::Scoped );
    }

    #[test]
    fn settings_apply_from_configuration() {
        let config = Configuration::from_toml_str( r#"
            [plugins]
            default_registration = "none"
            prefer_shared_types = true
            module_extension = "plugin"
        "# ).unwrap();
        let settings = BuilderSettings::from_configuration( &config, "plugins" ).unwrap().unwrap();
        let built = PluginBuilder::new().with_settings( &settings ).unwrap().build();

        assert_eq!( built.default_registration(), Registration::None );
        assert!( built.prefers_shared_types() );
        assert_eq!( built.module_extension(), "plugin" );

        let broken = BuilderSettings { default_registration: Some( "always".into() ), ..BuilderSettings::default() };
        assert!( PluginBuilder::new().with_settings( &broken ).is_err() );
        assert!( BuilderSettings::from_configuration( &config, "missing" ).unwrap().is_none() );
    }

    #[test]
    fn registration_settings_are_case_insensitive_text() {
        let settings = BuilderSettings::from_toml_str( "default_registration = 'Transient'" ).unwrap();
        let config = PluginBuilder::new().with_settings( &settings ).unwrap().build();
        assert_eq!( config.default_registration(), Registration::Transient );
    }

    #[test]
    fn logging_options_install_a_sink() {
        assert!( PluginBuilder::new().build().sink.is_none() );
        assert!( PluginBuilder::new().use_console_logging().build().sink.is_some() );

        let settings = BuilderSettings { console_logging: true, ..BuilderSettings::default() };
        assert!( PluginBuilder::new().with_settings( &settings ).unwrap().build().sink.is_some() );
    }

    #[test]
    fn explicit_conventions_replace_the_default() {
        #[derive( Default )]
        struct Nothing ;
        impl SearchConvention for Nothing {
            fn name( &self ) -> &str { "nothing" }
            fn candidates( &self, _: &Path ) -> std::io::Result<Vec<PathBuf>> { Ok( Vec::new() ) }
        }

        let config = PluginBuilder::new()
            .add_convention_type::<Nothing>()
            .add_convention_fn( "listed", | _ | Ok( Vec::new() ))
            .build();
        assert_eq!( config.convention_names().collect::<Vec<_>>(), vec![ "nothing", "listed" ]);
    }

}
