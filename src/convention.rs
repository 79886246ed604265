//! Mapping search roots to candidate module files.

use std::ffi::OsString ;
use std::io ;
use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use itertools::Itertools ;
use pipe_trait::Pipe ;
use thiserror::Error ;

use crate::search_paths::path_key ;
use crate::utils::{ CollectPartial, PartialSuccess };



/// Strategy that lists the module files under one search root.
///
/// Implementations must return a finite list and may be called again for the
/// same root. Paths may be relative to the root or absolute.
pub trait SearchConvention: Send + Sync {
    /// Name used in diagnostics.
    fn name( &self ) -> &str ;
    /// Module files found under `root`.
    ///
    /// # Errors
    /// Any I/O error; the root then contributes no candidates for this convention.
    fn candidates( &self, root: &Path ) -> io::Result<Vec<PathBuf>>;
}

/// One directory per module, holding a single file named after the directory:
/// `<root>/<D>/<D>.<extension>`.
///
/// Subdirectories without that exact file are skipped. Entries come back in
/// the order the operating system lists them.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct DirectoryNameConvention {
    extension: String,
}

impl DirectoryNameConvention {

    pub fn new( extension: impl Into<String> ) -> Self {
        Self { extension: extension.into() }
    }

    #[inline] pub fn extension( &self ) -> &str { &self.extension }

    fn module_file( &self, directory: &Path ) -> Option<PathBuf> {
        let mut file_name = OsString::from( directory.file_name()? );
        if !self.extension.is_empty() {
            file_name.push( "." );
            file_name.push( &self.extension );
        }
        Some( directory.join( file_name )).filter(| file | file.is_file() )
    }

}

impl Default for DirectoryNameConvention {
    fn default() -> Self { Self::new( std::env::consts::DLL_EXTENSION ) }
}

impl SearchConvention for DirectoryNameConvention {

    fn name( &self ) -> &str { "directory-name" }

    fn candidates( &self, root: &Path ) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() { return Ok( Vec::new() ) }
        std::fs::read_dir( root )?
            .map_ok(| entry | entry.path() )
            .filter_ok(| path | path.is_dir() )
            .filter_map_ok(| directory | self.module_file( &directory ))
            .collect()
    }

}

/// A convention backed by a closure.
pub struct FnConvention<F> {
    name: String,
    search: F,
}

impl<F> FnConvention<F>
where
    F: Fn( &Path ) -> io::Result<Vec<PathBuf>> + Send + Sync,
{
    pub fn new( name: impl Into<String>, search: F ) -> Self {
        Self { name: name.into(), search }
    }
}

impl<F> SearchConvention for FnConvention<F>
where
    F: Fn( &Path ) -> io::Result<Vec<PathBuf>> + Send + Sync,
{
    fn name( &self ) -> &str { &self.name }
    fn candidates( &self, root: &Path ) -> io::Result<Vec<PathBuf>> { ( self.search )( root ) }
}

/// A module file found during discovery.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct CandidateModule {
    path: PathBuf,
    convention: Arc<str>,
}

impl CandidateModule {

    pub fn new( path: PathBuf, convention: impl Into<Arc<str>> ) -> Self {
        Self { path, convention: convention.into() }
    }

    /// Absolute path of the module file.
    #[inline] pub fn path( &self ) -> &Path { &self.path }
    /// Name of the convention that found it first.
    #[inline] pub fn convention( &self ) -> &str { &self.convention }

}

/// A convention that failed for one root. Discovery carries on without it.
#[derive( Debug, Error )]
#[error( "Search convention '{convention}' failed for {}: {source}", .root.display() )]
pub struct DiscoveryError {
    pub convention: String,
    pub root: PathBuf,
    pub source: io::Error,
}

/// Runs every convention over every root.
///
/// Candidates come out in root order, then convention order, then the order
/// each convention listed them, with later duplicates of a path dropped.
pub(crate) fn discover(
    roots: &[PathBuf],
    conventions: &[Arc<dyn SearchConvention>],
) -> PartialSuccess<Vec<CandidateModule>, DiscoveryError> {

    roots.iter()
        .cartesian_product( conventions )
        .map(|( root, convention )| search( root, convention.as_ref() ))
        .collect_partial::<Vec<_>>()
        .pipe(|( found, errors )| {
            let candidates = found.into_iter()
                .flatten()
                .unique_by(| candidate | path_key( &candidate.path ))
                .collect::<Vec<_>>();
            ( candidates, errors )
        })

}

fn search( root: &Path, convention: &dyn SearchConvention ) -> Result<Vec<CandidateModule>, DiscoveryError> {
    let files = convention.candidates( root ).map_err(| source | DiscoveryError {
        convention: convention.name().to_string(),
        root: root.to_path_buf(),
        source,
    })?;
    let convention_name: Arc<str> = Arc::from( convention.name() );
    Ok( files.into_iter()
        .map(| file | root.join( file ))
        .map(| file | std::path::absolute( &file ).unwrap_or( file ))
        .map(| file | CandidateModule::new( file, Arc::clone( &convention_name )))
        .collect())
}

#[cfg( test )]
mod tests {

    use std::fs ;
    use super::*;

    fn module( root: &Path, name: &str, extension: &str ) -> PathBuf {
        let directory = root.join( name );
        fs::create_dir_all( &directory ).unwrap();
        let file = directory.join( format!( "{name}.{extension}" ));
        fs::write( &file, b"" ).unwrap();
        file
    }

    #[test]
    fn directory_name_convention_requires_matching_file() {
        let root = tempfile::tempdir().unwrap();
        let good = module( root.path(), "m1", "so" );
        module( root.path(), "m2", "dll" );
        fs::create_dir( root.path().join( "empty" )).unwrap();
        fs::write( root.path().join( "m3.so" ), b"" ).unwrap();

        let found = DirectoryNameConvention::new( "so" ).candidates( root.path() ).unwrap();
        assert_eq!( found, vec![ good ]);
    }

    #[test]
    fn missing_roots_yield_nothing() {
        let root = tempfile::tempdir().unwrap();
        let found = DirectoryNameConvention::new( "so" ).candidates( &root.path().join( "missing" )).unwrap();
        assert!( found.is_empty() );
    }

    #[test]
    fn failures_are_isolated_per_root_and_convention() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = module( first.path(), "a", "so" );
        let b = module( second.path(), "b", "so" );

        let failing: Arc<dyn SearchConvention> = Arc::new( FnConvention::new( "failing", | _: &Path | {
            Err( io::Error::new( io::ErrorKind::PermissionDenied, "denied" ))
        }));
        let conventions = vec![ failing, Arc::new( DirectoryNameConvention::new( "so" )) as Arc<dyn SearchConvention> ];
        let roots = vec![ first.path().to_path_buf(), second.path().to_path_buf() ];

        let ( candidates, errors ) = discover( &roots, &conventions );
        assert_eq!( candidates.iter().map( CandidateModule::path ).collect::<Vec<_>>(), vec![ a.as_path(), b.as_path() ]);
        assert_eq!( errors.len(), 2 );
        assert_eq!( errors[0].convention, "failing" );
    }

    #[test]
    fn duplicates_keep_their_first_finder() {
        let root = tempfile::tempdir().unwrap();
        let file = module( root.path(), "m1", "so" );
        let listed = file.clone();
        let explicit: Arc<dyn SearchConvention> = Arc::new( FnConvention::new( "explicit", move | _: &Path | Ok( vec![ listed.clone() ])));
        let conventions = vec![ explicit, Arc::new( DirectoryNameConvention::new( "so" )) as Arc<dyn SearchConvention> ];
        let roots = vec![ root.path().to_path_buf(), root.path().to_path_buf() ];

        let ( candidates, errors ) = discover( &roots, &conventions );
        assert!( errors.is_empty() );
        assert_eq!( candidates, vec![ CandidateModule::new( file, "explicit" )]);
    }

}
