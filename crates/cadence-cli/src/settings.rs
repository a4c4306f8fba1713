//! Application settings management
//!
//! Handles persistent settings and the play history file. Both are
//! plain JSON; a missing or unreadable file falls back to defaults.

use std::fs;
use std::path::{ Path, PathBuf };
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{ Deserialize, Serialize };

use cadence_core::PlayHistory;


const APP_DIR: &str = "cadence";


/// Application settings.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct Settings {
    /// Shuffle mode at startup
    pub shuffle: bool,

    /// Repeat mode at startup
    pub repeat: bool,

    /// Volume level (0.0 to 1.0)
    pub volume: f32,

    /// Length of every simulated track, in seconds
    pub track_length_secs: u64,

    /// Simulated delay before a track is ready, in milliseconds
    pub load_latency_ms: u64,

    /// Number of tracks on the Discover view
    pub recommendations: usize,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: false,
            volume: 1.0,
            track_length_secs: 180,
            load_latency_ms: 150,
            recommendations: 10,
        }
    }
}


impl Settings {
    /// Returns the path to the settings file.
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( APP_DIR ).join( "settings.json" ) )
    }


    /// Loads settings from disk, or returns defaults if not found.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some( path ) => read_json( &path ).unwrap_or_default(),
            None => Self::default(),
        }
    }


    /// Saves settings to disk.
    pub fn save( &self ) {
        if let Some( path ) = Self::settings_path() {
            write_json( &path, self );
        }
    }


    pub fn track_length( &self ) -> Duration {
        Duration::from_secs( self.track_length_secs.max( 1 ) )
    }


    pub fn load_latency( &self ) -> Duration {
        Duration::from_millis( self.load_latency_ms )
    }
}


/// Returns the application data directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else( || std::env::current_dir().ok() )
        .unwrap_or_else( || PathBuf::from( "." ) )
        .join( APP_DIR )
}


/// Default catalog location.
pub fn default_catalog_path() -> PathBuf {
    data_dir().join( "library.json" )
}


fn history_path() -> PathBuf {
    data_dir().join( "history.json" )
}


/// Loads the play history, or an empty one.
pub fn load_history() -> PlayHistory {
    read_json( &history_path() ).unwrap_or_default()
}


/// Saves the play history.
pub fn save_history( history: &PlayHistory ) {
    write_json( &history_path(), history );
}


/// Reads a JSON file, logging anything other than a missing file.
fn read_json<T: DeserializeOwned>( path: &Path ) -> Option<T> {
    if !path.exists() {
        return None;
    }

    match fs::read_to_string( path ) {
        Ok( contents ) => match serde_json::from_str( &contents ) {
            Ok( value ) => Some( value ),
            Err( e ) => {
                tracing::warn!( "Ignoring malformed {}: {}", path.display(), e );
                None
            }
        },
        Err( e ) => {
            tracing::warn!( "Failed to read {}: {}", path.display(), e );
            None
        }
    }
}


/// Writes a value as pretty JSON, creating parent directories.
fn write_json<T: Serialize>( path: &Path, value: &T ) {
    // Create parent directory if needed
    if let Some( parent ) = path.parent() {
        if !parent.exists() {
            if let Err( e ) = fs::create_dir_all( parent ) {
                tracing::warn!( "Failed to create {}: {}", parent.display(), e );
                return;
            }
        }
    }

    match serde_json::to_string_pretty( value ) {
        Ok( json ) => {
            if let Err( e ) = fs::write( path, json ) {
                tracing::warn!( "Failed to save {}: {}", path.display(), e );
            }
        }
        Err( e ) => {
            tracing::warn!( "Failed to serialize {}: {}", path.display(), e );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use tempfile::TempDir;


    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: Settings = serde_json::from_str( r#"{ "shuffle": true }"# ).unwrap();
        assert!( settings.shuffle );
        assert_eq!( settings.recommendations, 10 );
        assert_eq!( settings.track_length(), Duration::from_secs( 180 ) );
    }


    #[test]
    fn test_json_round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join( "nested" ).join( "settings.json" );
        let settings = Settings { repeat: true, volume: 0.4, ..Settings::default() };

        write_json( &path, &settings );
        let loaded: Settings = read_json( &path ).unwrap();
        assert_eq!( loaded, settings );
    }


    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join( "history.json" );
        fs::write( &path, "not json" ).unwrap();

        assert!( read_json::<PlayHistory>( &path ).is_none() );
        assert!( read_json::<PlayHistory>( &dir.path().join( "missing.json" ) ).is_none() );
    }
}
