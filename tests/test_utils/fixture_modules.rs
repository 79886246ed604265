#[allow( dead_code )]
mod fixture_modules {

    use std::collections::HashMap ;
    use std::path::{ Path, PathBuf };
    use std::sync::{ Arc, Mutex };
    use strata::{ IsolatedLoader, LoadError, LoadRequest, ModuleManifest, PluginBuilder, SharedTypes };

    pub const EXTENSION: &str = "module" ;

    pub trait Greeter: Send + Sync { fn greet( &self ) -> String ; }
    pub trait OutputWriter: Send + Sync { fn name( &self ) -> &'static str ; }

    pub struct G1 ;
    impl Greeter for G1 { fn greet( &self ) -> String { "G1".to_string() }}

    pub struct W1 ;
    impl OutputWriter for W1 { fn name( &self ) -> &'static str { "W1" }}

    /// A greeter answering with a fixed name, for modules to export.
    pub struct Named( pub &'static str );
    impl Greeter for Named { fn greet( &self ) -> String { self.0.to_string() }}

    type ManifestFn = Arc<dyn Fn() -> ModuleManifest + Send + Sync>;

    /// Stands in for native loading: module files are matched by file stem.
    #[derive( Clone, Default )]
    pub struct FixtureLoader {
        manifests: HashMap<String, ManifestFn>,
        loads: Arc<Mutex<Vec<PathBuf>>>,
        last_shared: Arc<Mutex<Option<( SharedTypes, bool )>>>,
    }

    impl FixtureLoader {

        pub fn new() -> Self { Self::default() }

        pub fn with_module( mut self, stem: &str, manifest: impl Fn() -> ModuleManifest + Send + Sync + 'static ) -> Self {
            self.manifests.insert( stem.to_string(), Arc::new( manifest ));
            self
        }

        pub fn loads( &self ) -> Vec<PathBuf> { self.loads.lock().unwrap().clone() }

        pub fn last_request( &self ) -> Option<( SharedTypes, bool )> { self.last_shared.lock().unwrap().clone() }

    }

    impl IsolatedLoader for FixtureLoader {
        fn load( &self, request: &LoadRequest<'_> ) -> Result<ModuleManifest, LoadError> {
            self.loads.lock().unwrap().push( request.path().to_path_buf() );
            *self.last_shared.lock().unwrap() = Some(( request.shared_types().clone(), request.prefer_shared_types() ));
            let stem = request.path().file_stem().and_then(| stem | stem.to_str() ).unwrap_or_default();
            match self.manifests.get( stem ) {
                Some( manifest ) => Ok( manifest() ),
                None => Err( LoadError::other( request.path(), format!( "no fixture named '{stem}'" ))),
            }
        }
    }

    /// A search root on disk laid out as `Modules/<name>/<name>.module`.
    pub struct ModuleTree {
        _directory: tempfile::TempDir,
        root: PathBuf,
    }

    impl ModuleTree {

        pub fn new() -> Self {
            let directory = tempfile::tempdir().unwrap();
            let root = directory.path().join( "Modules" );
            std::fs::create_dir( &root ).unwrap();
            Self { _directory: directory, root }
        }

        pub fn with_modules( names: &[&str] ) -> Self {
            let tree = Self::new();
            names.iter().for_each(| name | { tree.add( name ); });
            tree
        }

        pub fn add( &self, name: &str ) -> PathBuf {
            let directory = self.root.join( name );
            std::fs::create_dir_all( &directory ).unwrap();
            let file = directory.join( format!( "{name}.{EXTENSION}" ));
            std::fs::write( &file, b"" ).unwrap();
            file
        }

        pub fn path( &self ) -> &Path { &self.root }

    }

    /// A builder using the fixture loader and extension, searching no default roots.
    pub fn builder( loader: &FixtureLoader ) -> PluginBuilder {
        PluginBuilder::new()
            .clear_search_paths()
            .with_module_extension( EXTENSION )
            .with_loader( loader.clone() )
    }

    /// Collects the loader's diagnostic lines.
    #[derive( Clone, Default )]
    pub struct CapturedLog( Arc<Mutex<Vec<String>>> );

    impl CapturedLog {

        pub fn sink( &self ) -> impl Fn( &str ) + Send + Sync + 'static {
            let lines = Arc::clone( &self.0 );
            move | line: &str | lines.lock().unwrap().push( line.to_string() )
        }

        pub fn contains( &self, fragment: &str ) -> bool {
            self.0.lock().unwrap().iter().any(| line | line.contains( fragment ))
        }

    }

    /// Records the order in which plugins and hooks ran.
    #[derive( Clone, Default )]
    pub struct Journal( Arc<Mutex<Vec<String>>> );

    impl Journal {
        pub fn record( &self, entry: impl Into<String> ) { self.0.lock().unwrap().push( entry.into() ) }
        pub fn entries( &self ) -> Vec<String> { self.0.lock().unwrap().clone() }
    }

}

pub use fixture_modules::*;
