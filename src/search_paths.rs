//! Where modules are looked for.

use std::ffi::OsStr ;
use std::path::{ Path, PathBuf };
use itertools::Itertools ;



const DEFAULT_DIRECTORIES: [&str; 2] = [ "plugins", "modules" ];

/// Paths compare case-insensitively where the default filesystems do.
const CASE_INSENSITIVE: bool = cfg!( any( windows, target_os = "macos" ));

/// Comparison key of a path: lexically normalised, folded where paths are case-insensitive.
pub(crate) fn path_key( path: &Path ) -> String {
    let normalised = path.components().collect::<PathBuf>().to_string_lossy().into_owned();
    if CASE_INSENSITIVE { normalised.to_lowercase() } else { normalised }
}

/// Directory of the running binary, if it can be determined.
pub(crate) fn binary_dir() -> Option<PathBuf> {
    std::env::current_exe().ok()?.parent().map( Path::to_path_buf )
}

/// An ordered, de-duplicated set of root directories to search for modules.
///
/// Roots are stored as given; relative roots are resolved against the working
/// directory only when [`resolve`]( Self::resolve ) is called at build time.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct SearchPathSet {
    roots: Vec<PathBuf>,
}

impl SearchPathSet {

    /// A set without any roots.
    pub fn new() -> Self { Self::default() }

    /// The four default roots: `plugins` and `modules` next to the running
    /// binary and in the working directory.
    ///
    /// Defaults are not validated, a missing one simply yields no modules.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        let bases = binary_dir().into_iter().chain( std::iter::once( PathBuf::new() ));
        bases.cartesian_product( DEFAULT_DIRECTORIES )
            .for_each(|( base, directory )| { set.insert( base.join( directory )); });
        set
    }

    /// Adds `path` if it looks like a module root, returning whether it was accepted.
    ///
    /// A path is accepted only if it is non-blank, is an existing directory and
    /// contains at least one subdirectory or at least one file with the module
    /// `extension`. A directory that holds module files itself is a module
    /// directory, so its parent is added instead. Rejected paths are ignored.
    pub fn add( &mut self, path: impl AsRef<Path>, extension: &str ) -> bool {
        let path = path.as_ref();
        match Self::validate( path, extension ) {
            Some( root ) => self.insert( root ),
            None => {
                tracing::debug!( path = %path.display(), "Ignoring search path" );
                false
            }
        }
    }

    /// Like [`add`]( Self::add ) with `path` taken relative to the running binary's directory.
    pub fn add_relative( &mut self, path: impl AsRef<Path>, extension: &str ) -> bool {
        match binary_dir() {
            Some( base ) => self.add( base.join( path ), extension ),
            None => {
                tracing::debug!( path = %path.as_ref().display(), "Binary directory unavailable, ignoring relative search path" );
                false
            }
        }
    }

    /// Appends `root` unless an equal root is already present.
    pub(crate) fn insert( &mut self, root: PathBuf ) -> bool {
        let key = path_key( &root );
        if self.roots.iter().any(| existing | path_key( existing ) == key ) { return false }
        self.roots.push( root );
        true
    }

    fn validate( path: &Path, extension: &str ) -> Option<PathBuf> {
        if path.as_os_str().to_string_lossy().trim().is_empty() || !path.is_dir() { return None }

        let mut has_subdirectories = false ;
        let mut has_modules = false ;
        for entry in std::fs::read_dir( path ).ok()?.filter_map( Result::ok ) {
            let entry_path = entry.path();
            if entry_path.is_dir() { has_subdirectories = true }
            else if entry_path.extension().is_some_and(| found | found == OsStr::new( extension )) { has_modules = true }
        }

        match ( has_modules, has_subdirectories ) {
            ( true, _ ) => match path.parent() {
                Some( parent ) if parent.as_os_str().is_empty() => Some( PathBuf::from( "." )),
                parent => parent.map( Path::to_path_buf ),
            },
            ( false, true ) => Some( path.to_path_buf() ),
            ( false, false ) => None,
        }
    }

    /// Roots in insertion order, as they were given.
    #[inline] pub fn roots( &self ) -> &[PathBuf] { &self.roots }
    #[inline] pub fn len( &self ) -> usize { self.roots.len() }
    #[inline] pub fn is_empty( &self ) -> bool { self.roots.is_empty() }

    /// Roots made absolute against the current working directory, de-duplicated again
    /// since distinct relative and absolute spellings may now coincide.
    pub fn resolve( &self ) -> Vec<PathBuf> {
        self.roots.iter()
            .filter_map(| root | std::path::absolute( root ).ok() )
            .unique_by(| root | path_key( root ))
            .collect()
    }

}

#[cfg( test )]
mod tests {

    use std::fs ;
    use super::*;

    #[test]
    fn defaults_cover_both_bases() {
        let defaults = SearchPathSet::with_defaults();
        assert!( defaults.roots().contains( &PathBuf::from( "plugins" )));
        assert!( defaults.roots().contains( &PathBuf::from( "modules" )));
        if binary_dir().is_some() { assert_eq!( defaults.len(), 4 ) }
    }

    #[test]
    fn rejects_blank_missing_and_empty_paths() {
        let empty = tempfile::tempdir().unwrap();
        let mut set = SearchPathSet::new();
        for _ in 0..3 {
            assert!( !set.add( "", "so" ));
            assert!( !set.add( "   ", "so" ));
            assert!( !set.add( empty.path().join( "missing" ), "so" ));
            assert!( !set.add( empty.path(), "so" ));
        }
        assert!( set.is_empty() );
    }

    #[test]
    fn accepts_directories_with_subdirectories_once() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir( root.path().join( "m1" )).unwrap();
        let mut set = SearchPathSet::new();
        assert!( set.add( root.path(), "so" ));
        assert!( !set.add( root.path(), "so" ));
        assert!( !set.add( root.path().join( "." ), "so" ));
        assert_eq!( set.roots(), &[ root.path().to_path_buf() ]);
    }

    #[test]
    fn module_directories_are_promoted_to_their_parent() {
        let root = tempfile::tempdir().unwrap();
        let module = root.path().join( "m1" );
        fs::create_dir( &module ).unwrap();
        fs::write( module.join( "m1.so" ), b"" ).unwrap();

        let mut set = SearchPathSet::new();
        assert!( set.add( &module, "so" ));
        assert_eq!( set.roots(), &[ root.path().to_path_buf() ]);
    }

    #[test]
    fn files_with_other_extensions_do_not_count() {
        let root = tempfile::tempdir().unwrap();
        fs::write( root.path().join( "notes.txt" ), b"" ).unwrap();
        assert!( !SearchPathSet::new().add( root.path(), "so" ));
    }

    #[test]
    fn resolving_makes_roots_absolute_and_unique() {
        let cwd = std::env::current_dir().unwrap();
        let mut set = SearchPathSet::new();
        set.insert( PathBuf::from( "plugins" ));
        set.insert( cwd.join( "plugins" ));
        assert_eq!( set.len(), 2 );
        assert_eq!( set.resolve(), vec![ cwd.join( "plugins" )]);
    }

}
