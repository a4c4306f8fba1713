//! Command-line argument parsing for Cadence.

use std::path::PathBuf;

use clap::Parser;


/// Cadence - A terminal music queue and player.
#[derive( Parser, Debug )]
#[command( name = "cadence" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Catalog file to load (defaults to library.json in the data directory).
    #[arg( short, long )]
    pub catalog: Option<PathBuf>,

    /// Index a music directory into the catalog before starting.
    ///
    /// Each sub-directory is a playlist; files are named "Title - Artist".
    #[arg( short, long, value_name = "DIR" )]
    pub index: Option<PathBuf>,

    /// Start playing this playlist.
    #[arg( short, long )]
    pub playlist: Option<String>,

    /// Turn shuffle on, overriding the stored setting.
    #[arg( long )]
    pub shuffle: bool,

    /// Turn repeat on, overriding the stored setting.
    #[arg( long )]
    pub repeat: bool,
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([ "cadence", "--playlist", "Late Night", "--shuffle" ]);
        assert_eq!( args.playlist.as_deref(), Some( "Late Night" ) );
        assert!( args.shuffle );
        assert!( !args.repeat );
        assert!( args.catalog.is_none() );
    }


    #[test]
    fn test_parse_index_dir() {
        let args = Args::parse_from([ "cadence", "-i", "/music", "-c", "/tmp/cat.json" ]);
        assert_eq!( args.index, Some( PathBuf::from( "/music" ) ) );
        assert_eq!( args.catalog, Some( PathBuf::from( "/tmp/cat.json" ) ) );
    }
}
