use std::str::FromStr ;
use thiserror::Error ;



/// Sharing policy of a bound implementation.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum Lifetime {
    /// One instance per provider.
    Singleton,
    /// One instance per [`ServiceScope`]( crate::ServiceScope ); the provider itself acts as the root scope.
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

/// How discovered force-load implementations are registered.
///
/// Unlike [`Lifetime`] this includes [`None`]( Self::None ): the implementation
/// is still scanned (and reported) but never bound.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum Registration {
    /// Scan only.
    None,
    #[default] Singleton,
    Scoped,
    Transient,
}

impl Registration {
    /// The container lifetime this registration binds with, if any.
    pub fn lifetime( self ) -> Option<Lifetime> {
        match self {
            Self::None => None,
            Self::Singleton => Some( Lifetime::Singleton ),
            Self::Scoped => Some( Lifetime::Scoped ),
            Self::Transient => Some( Lifetime::Transient ),
        }
    }
}

impl From<Lifetime> for Registration {
    fn from( lifetime: Lifetime ) -> Self {
        match lifetime {
            Lifetime::Singleton => Self::Singleton,
            Lifetime::Scoped => Self::Scoped,
            Lifetime::Transient => Self::Transient,
        }
    }
}

/// Returned when a registration is spelled with an unknown name.
#[derive( Debug, Clone, Error, PartialEq, Eq )]
#[error( "Invalid registration '{0}', expected one of: none, singleton, scoped, transient" )]
pub struct InvalidRegistration( pub String );

impl FromStr for Registration {
    type Err = InvalidRegistration ;
    fn from_str( value: &str ) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok( Self::None ),
            "singleton" => Ok( Self::Singleton ),
            "scoped" => Ok( Self::Scoped ),
            "transient" => Ok( Self::Transient ),
            _ => Err( InvalidRegistration( value.to_string() )),
        }
    }
}

impl std::fmt::Display for Registration {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        match self {
            Self::None => write!( f, "none" ),
            Self::Singleton => write!( f, "singleton" ),
            Self::Scoped => write!( f, "scoped" ),
            Self::Transient => write!( f, "transient" ),
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        std::fmt::Display::fmt( &Registration::from( *self ), f )
    }
}

#[cfg( test )]
mod tests {

    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!( " Transient ".parse::<Registration>(), Ok( Registration::Transient ));
        assert_eq!( "NONE".parse::<Registration>(), Ok( Registration::None ));
        assert_eq!( Registration::None.lifetime(), None );
        assert_eq!( Registration::Scoped.lifetime(), Some( Lifetime::Scoped ));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!( "forever".parse::<Registration>(), Err( InvalidRegistration( "forever".to_string() )));
    }

}
