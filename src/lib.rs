//! Discovery and composition of independently built modules.
//!
//! A host describes where modules live and which types may cross into them;
//! `strata` finds the modules on disk, loads them, and lets each module's
//! plugin add its own bindings to the host's [`ServiceCollection`].
//!
//! # Core Concepts
//!
//! - [`PluginBuilder`]: Fluent configuration of a build. Frozen into a
//! 	[`BuilderConfig`], which runs the whole pipeline once through
//! 	[`BuilderConfig::build_services`].
//!
//! - [`Plugin`]: The capability a module implements. Every discovered plugin
//! 	receives the service collection in turn and returns the one the next
//! 	plugin continues with.
//!
//! - **Search roots** ([`SearchPathSet`]): Directories searched for modules.
//! 	By default `plugins` and `modules`, both next to the running binary and in
//! 	the working directory.
//!
//! - **Search conventions** ([`SearchConvention`]): Map a root to module files.
//! 	The default, [`DirectoryNameConvention`], expects `<root>/<D>/<D>.<ext>`.
//!
//! - **Shared types** ([`SharedTypes`]): The allow-list of types whose identity
//! 	is unified across the module boundary. Everything else a module mentions
//! 	stays private to it: implementations of a capability that is not shared
//! 	can never be bound as the host's capability, and module factories cannot
//! 	resolve unshared types from the container.
//!
//! - **Force-load types**: Capabilities registered with
//! 	[`PluginBuilder::always_load`]. Every concrete implementation a module
//! 	exports is bound into the host's collection, whether or not the module
//! 	has a plugin, under the builder's default [`Registration`].
//!
//! # Pipeline
//!
//! 1. Resolve the search roots and run every convention over every root.
//! 	Failing conventions are logged and skipped.
//! 2. Load every candidate through the [`IsolatedLoader`] (by default
//! 	[`NativeLoader`]) and apply the isolation boundary to its manifest.
//! 3. Stage plugin implementations for resolution and bind force-load
//! 	implementations.
//! 4. Resolve the staged plugins and fold them, in discovery order, through
//! 	the guard, the post-discovery hook and [`Plugin::configure_services`].
//!
//! # Writing a module
//!
//! A module is a `cdylib` depending on this crate which publishes a
//! [`ModuleManifest`] with [`declare_module!`]:
//!
//! ```ignore
//! use std::sync::Arc ;
//! use strata::{ declare_module, BoxError, Configuration, ExportedType, ModuleManifest, Plugin, ServiceCollection };
//! use host_api::Greeter ;
//!
//! struct Hello ;
//! impl Greeter for Hello { fn greet( &self, name: &str ) -> String { format!( "Hello, {name}" ) }}
//!
//! struct HelloPlugin ;
//! impl Plugin for HelloPlugin {
//! 	fn configure_services( &self, services: ServiceCollection, _: Option<&Configuration> ) -> Result<ServiceCollection, BoxError> {
//! 		Ok( services )
//! 	}
//! }
//!
//! declare_module!( ModuleManifest::new()
//! 	.export( ExportedType::new::<Hello>()
//! 		.implements::<dyn Greeter, _>(| _ | Ok( Arc::new( Hello ) as Arc<dyn Greeter> )))
//! 	.export( ExportedType::new::<HelloPlugin>()
//! 		.implements::<dyn Plugin, _>(| _ | Ok( Arc::new( HelloPlugin ) as Arc<dyn Plugin> )))
//! );
//! ```
//!
//! The module has to be built with the same toolchain and the same version of
//! this crate as the host. Modules are never unloaded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc ;
//! use strata::{ Configuration, PluginBuilder, ServiceCollection };
//!
//! trait Greeter: Send + Sync { fn greet( &self, name: &str ) -> String ; }
//!
//! let mut services = ServiceCollection::new();
//! services.add_instance( Arc::new( Configuration::from_toml_str( "prefix = '>'" )? ));
//!
//! let services = PluginBuilder::new()
//! 	.add_search_path( "/opt/app/extensions" )
//! 	.always_load::<dyn Greeter>()
//! 	.with_guard(| plugin | !plugin.name().contains( "experimental" ))
//! 	.build_services( Some( services ), None, false )?;
//!
//! for greeter in services.build_provider().get_all::<dyn Greeter>()? {
//! 	println!( "{}", greeter.greet( "world" ));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder ;
mod compose ;
mod configuration ;
pub mod container ;
mod convention ;
mod extensions ;
mod loader ;
mod logger ;
mod manifest ;
mod plugin ;
mod scanner ;
mod search_paths ;
mod type_key ;
mod utils ;

pub use builder::{ PluginBuilder, BuilderConfig, BuilderSettings };
pub use compose::ComposeError ;
pub use configuration::{ Configuration, ConfigError };
pub use container::{
    Lifetime, Registration, InvalidRegistration,
    ServiceCollection, ServiceDescriptor, ServiceFactory,
    ServiceProvider, ServiceScope, Resolver, ResolveError,
};
pub use convention::{ SearchConvention, DirectoryNameConvention, FnConvention, CandidateModule, DiscoveryError };
pub use extensions::AddPlugins ;
pub use loader::{ IsolatedLoader, NativeLoader, LoadRequest, LoadedModule, ModuleLoaderFactory, LoadError };
pub use logger::{ Logger, LogSink };
pub use manifest::{ ModuleManifest, ExportedType, Implementation, ModuleEntry, MODULE_ENTRY_SYMBOL };
pub use plugin::Plugin ;
pub use scanner::{ TypeScanner, ModuleScan, ScanReport };
pub use search_paths::SearchPathSet ;
pub use type_key::{ TypeKey, Scope, SharedTypes };
pub use utils::PartialSuccess ;

/// Error type for failures raised by plugin code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
