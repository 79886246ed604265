//! Host configuration handed to plugins.
//!
//! [`Configuration`] is a thin wrapper over a TOML table. Keys are addressed
//! with dots (`"greeting.prefix"`), values are deserialised with serde on
//! demand.

use std::path::{ Path, PathBuf };
use std::str::FromStr ;
use serde::de::DeserializeOwned ;
use thiserror::Error ;

use crate::container::InvalidRegistration ;



/// Errors raised while reading configuration or applying it to a builder.
///
/// All of these surface before discovery starts.
#[derive( Debug, Error )]
pub enum ConfigError {
    #[error( "Failed to read configuration file {}: {source}", .path.display() )]
    Io { path: PathBuf, source: std::io::Error },
    #[error( "Failed to parse configuration: {0}" )] Parse( #[from] toml::de::Error ),
    #[error( "Invalid value for '{key}': {source}" )]
    InvalidValue { key: String, source: toml::de::Error },
    #[error( transparent )] Registration( #[from] InvalidRegistration ),
}

/// A read-only view of TOML configuration.
#[derive( Debug, Clone, Default, PartialEq )]
pub struct Configuration {
    root: toml::Table,
}

impl Configuration {

    pub fn new( root: toml::Table ) -> Self { Self { root } }

    /// Parses a TOML document.
    ///
    /// # Errors
    /// Fails if `source` is not valid TOML.
    pub fn from_toml_str( source: &str ) -> Result<Self, ConfigError> {
        Ok( Self::new( toml::from_str( source )? ))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or is not valid TOML.
    pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string( path )
            .map_err(| source | ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str( &source )
    }

    /// The raw value at a dotted `key`.
    pub fn value( &self, key: &str ) -> Option<&toml::Value> {
        let mut segments = key.split( '.' );
        let first = self.root.get( segments.next()? )?;
        segments.try_fold( first, | value, segment | value.as_table()?.get( segment ))
    }

    /// Deserialises the value at a dotted `key`, `None` if the key is absent.
    ///
    /// # Errors
    /// Fails if the value does not have the shape of `T`.
    pub fn get<T: DeserializeOwned>( &self, key: &str ) -> Result<Option<T>, ConfigError> {
        self.value( key )
            .map(| value | value.clone().try_into::<T>()
                .map_err(| source | ConfigError::InvalidValue { key: key.to_string(), source }))
            .transpose()
    }

    /// The table at a dotted `key` as a configuration of its own.
    pub fn section( &self, key: &str ) -> Option<Configuration> {
        self.value( key )?.as_table().cloned().map( Self::new )
    }

    /// Deserialises the whole configuration.
    ///
    /// # Errors
    /// Fails if the configuration does not have the shape of `T`.
    pub fn bind<T: DeserializeOwned>( &self ) -> Result<T, ConfigError> {
        toml::Value::Table( self.root.clone() ).try_into::<T>()
            .map_err(| source | ConfigError::InvalidValue { key: String::new(), source })
    }

    #[inline] pub fn as_table( &self ) -> &toml::Table { &self.root }

}

impl FromStr for Configuration {
    type Err = ConfigError ;
    fn from_str( source: &str ) -> Result<Self, Self::Err> { Self::from_toml_str( source ) }
}

impl From<toml::Table> for Configuration {
    fn from( root: toml::Table ) -> Self { Self::new( root ) }
}

#[cfg( test )]
mod tests {

    use super::*;

    const SOURCE: &str = r#"
        name = "host"

        [greeting]
        prefix = ">>"
        repeat = 2
    "#;

    #[test]
    fn reads_dotted_keys() {
        let config = Configuration::from_toml_str( SOURCE ).unwrap();
        assert_eq!( config.get::<String>( "name" ).unwrap().as_deref(), Some( "host" ));
        assert_eq!( config.get::<u32>( "greeting.repeat" ).unwrap(), Some( 2 ));
        assert_eq!( config.get::<u32>( "greeting.missing" ).unwrap(), None );
        assert_eq!( config.get::<u32>( "name.nested" ).unwrap(), None );
    }

    #[test]
    fn sections_are_configurations() {
        let config = Configuration::from_toml_str( SOURCE ).unwrap();
        let greeting = config.section( "greeting" ).unwrap();
        assert_eq!( greeting.get::<String>( "prefix" ).unwrap().as_deref(), Some( ">>" ));
        assert!( config.section( "name" ).is_none() );
    }

    #[test]
    fn wrong_shapes_name_the_key() {
        let config = Configuration::from_toml_str( SOURCE ).unwrap();
        let error = config.get::<u32>( "greeting.prefix" ).unwrap_err();
        assert!( matches!( error, ConfigError::InvalidValue { ref key, .. } if key == "greeting.prefix" ));
    }

}
