//! Logging for the loader and for module code.
//!
//! Everything is emitted as [`tracing`] events. On top of that a builder may be
//! given a [`LogSink`] which receives the loader's diagnostics as plain lines,
//! for hosts that want them on the console or in their own logger.

use std::sync::Arc ;



/// Receives diagnostic lines produced while discovering and loading modules.
pub type LogSink = Arc<dyn Fn( &str ) + Send + Sync>;

/// A named logger that can be shared with modules.
///
/// Events go through [`tracing`] with the logger's name attached as the
/// `logger` field. An optional sink additionally receives every message.
#[derive( Clone )]
pub struct Logger {
    name: Arc<str>,
    sink: Option<LogSink>,
}

impl Logger {

    pub fn new( name: impl Into<Arc<str>> ) -> Self {
        Self { name: name.into(), sink: None }
    }

    /// Also forwards every message to `sink`.
    #[must_use]
    pub fn with_sink( mut self, sink: impl Fn( &str ) + Send + Sync + 'static ) -> Self {
        self.sink = Some( Arc::new( sink ));
        self
    }

    #[inline] pub fn name( &self ) -> &str { &self.name }

    pub fn debug( &self, message: &str ) {
        tracing::debug!( logger = %self.name, "{message}" );
        self.forward( message );
    }

    pub fn info( &self, message: &str ) {
        tracing::info!( logger = %self.name, "{message}" );
        self.forward( message );
    }

    pub fn warn( &self, message: &str ) {
        tracing::warn!( logger = %self.name, "{message}" );
        self.forward( message );
    }

    pub fn error( &self, message: &str ) {
        tracing::error!( logger = %self.name, "{message}" );
        self.forward( message );
    }

    fn forward( &self, message: &str ) {
        if let Some( sink ) = &self.sink { sink( message ) }
    }

}

impl Default for Logger {
    fn default() -> Self { Self::new( "strata" ) }
}

impl std::fmt::Debug for Logger {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Logger" )
            .field( "name", &self.name )
            .field( "sink", &self.sink.is_some() )
            .finish()
    }
}

/// The loader's own diagnostics channel.
#[derive( Clone, Default )]
pub(crate) struct Diagnostics {
    sink: Option<LogSink>,
}

impl Diagnostics {

    pub(crate) fn new( sink: Option<LogSink> ) -> Self { Self { sink }}

    pub(crate) fn debug( &self, message: &str ) {
        tracing::debug!( target: "strata", "{message}" );
        self.forward( message );
    }

    pub(crate) fn warn( &self, message: &str ) {
        tracing::warn!( target: "strata", "{message}" );
        self.forward( message );
    }

    fn forward( &self, message: &str ) {
        if let Some( sink ) = &self.sink { sink( message ) }
    }

}

/// Prints loader diagnostics to standard output.
pub(crate) fn console_sink() -> LogSink {
    Arc::new(| message: &str | println!( "{}", console_line( message )))
}

fn console_line( message: &str ) -> String { format!( "PluginLoader: {message}" ) }

#[cfg( test )]
mod tests {

    use std::sync::Mutex ;
    use super::*;

    #[test]
    fn sinks_receive_every_level() {
        let lines = Arc::new( Mutex::new( Vec::new() ));
        let captured = Arc::clone( &lines );
        let logger = Logger::new( "test" ).with_sink( move | line | captured.lock().unwrap().push( line.to_string() ));

        logger.debug( "one" );
        logger.warn( "two" );
        logger.clone().error( "three" );

        assert_eq!( *lines.lock().unwrap(), vec![ "one", "two", "three" ]);
    }

    #[test]
    fn console_lines_carry_the_loader_prefix() {
        assert_eq!( console_line( "Loading all plugins from /opt" ), "PluginLoader: Loading all plugins from /opt" );
        console_sink()( "console sink smoke line" );
    }

}
