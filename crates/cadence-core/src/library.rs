//! Local music library
//!
//! Reads and writes the JSON catalog file the front end plays from,
//! and builds one by indexing a music folder laid out as
//! `<root>/<playlist>/<Title - Artist>.<ext>`.

use std::fs;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::catalog::CatalogProvider;
use crate::track::{ RawTrack, Track, TrackId, UNKNOWN_ARTIST };


/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "m4a", "aac", "opus",
];


/// Errors that can occur during library operations.
#[derive( Debug, Error )]
pub enum LibraryError {
    #[error( "IO error: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "Invalid catalog file: {0}" )]
    Json( #[from] serde_json::Error ),

    #[error( "Path not found: {0}" )]
    NotFound( PathBuf ),
}


/// On-disk catalog layout, matching the backend `/songs` payload.
#[derive( Debug, Default, Serialize, Deserialize )]
struct CatalogFile {
    #[serde( default )]
    songs: Vec<RawTrack>,
}


/// A JSON catalog file.
#[derive( Debug, Clone )]
pub struct Library {
    path: PathBuf,
}


impl Library {
    pub fn new( path: PathBuf ) -> Self {
        Self { path }
    }


    pub fn path( &self ) -> &Path {
        &self.path
    }


    /// Reads the raw entries of the catalog file.
    pub fn read_entries( &self ) -> Result<Vec<RawTrack>, LibraryError> {
        if !self.path.exists() {
            return Err( LibraryError::NotFound( self.path.clone() ) );
        }
        let contents = fs::read_to_string( &self.path )?;
        let file: CatalogFile = serde_json::from_str( &contents )?;
        Ok( file.songs )
    }


    /// Overwrites the catalog file with `tracks`.
    pub fn save( &self, tracks: &[Track] ) -> Result<(), LibraryError> {
        self.write_entries( tracks.iter().map( RawTrack::from ).collect() )
    }


    /// Persists a playlist order by rewriting positions in place.
    ///
    /// Entries are written back as read, so malformed entries survive
    /// untouched. Ids outside the playlist are ignored.
    pub fn write_order( &self, playlist: &str, ids: &[TrackId] ) -> Result<(), LibraryError> {
        let mut entries = self.read_entries()?;

        for ( position, id ) in ids.iter().enumerate() {
            let entry = entries
                .iter_mut()
                .find( |e| e.id == Some( *id ) && e.playlist.as_deref() == Some( playlist ) );
            if let Some( entry ) = entry {
                entry.position = Some( position as i64 );
            }
        }

        self.write_entries( entries )?;
        tracing::info!( "Saved order of '{}' ({} tracks)", playlist, ids.len() );
        Ok(())
    }


    fn write_entries( &self, songs: Vec<RawTrack> ) -> Result<(), LibraryError> {
        if let Some( parent ) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all( parent )?;
            }
        }
        let json = serde_json::to_string_pretty( &CatalogFile { songs } )?;
        fs::write( &self.path, json )?;
        Ok(())
    }
}


impl CatalogProvider for Library {
    type Error = LibraryError;


    fn all_tracks( &self ) -> Result<Vec<Track>, Self::Error> {
        let entries = self.read_entries()?;
        let total = entries.len();

        let tracks: Vec<Track> = entries
            .into_iter()
            .filter_map( |raw| {
                let id = raw.id;
                Track::try_from( raw )
                    .map_err( |e| tracing::warn!( "Skipping catalog entry {:?}: {}", id, e ) )
                    .ok()
            })
            .collect();

        tracing::info!( "Loaded {} of {} catalog entries from {:?}", tracks.len(), total, self.path );
        Ok( tracks )
    }
}


/// Indexes a music folder into tracks.
///
/// Every sub-folder of `root` is a playlist. Files are ranked by name
/// and ids are assigned in scan order, starting at 1.
pub fn index_directory( root: &Path ) -> Result<Vec<Track>, LibraryError> {
    let entries = match fs::read_dir( root ) {
        Ok( e ) => e,
        Err( e ) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err( LibraryError::NotFound( root.to_path_buf() ) );
        }
        Err( e ) => return Err( LibraryError::Io( e ) ),
    };

    let mut playlist_dirs: Vec<PathBuf> = entries
        .flatten()
        .map( |e| e.path() )
        .filter( |p| p.is_dir() )
        .collect();
    playlist_dirs.sort();

    let mut tracks = Vec::new();
    let mut next_id: TrackId = 1;

    for dir in playlist_dirs {
        let Some( playlist ) = dir.file_name().map( |n| n.to_string_lossy().to_string() ) else {
            continue;
        };

        let mut files: Vec<PathBuf> = match fs::read_dir( &dir ) {
            Ok( e ) => e.flatten().map( |e| e.path() ).filter( |p| is_audio_file( p ) ).collect(),
            Err( e ) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                tracing::warn!( "Access denied: {:?}", dir );
                continue;
            }
            Err( e ) => return Err( LibraryError::Io( e ) ),
        };
        files.sort();

        for ( position, file ) in files.into_iter().enumerate() {
            let stem = file.file_stem().map( |s| s.to_string_lossy().to_string() ).unwrap_or_default();
            let ( title, artist ) = split_file_stem( &stem );
            tracks.push( Track {
                id: next_id,
                title,
                artist,
                playlist: playlist.clone(),
                position: position as i64,
                url: file.to_string_lossy().to_string(),
            });
            next_id += 1;
        }
    }

    tracing::info!( "Indexed {} tracks under {:?}", tracks.len(), root );
    Ok( tracks )
}


/// Splits a `Title - Artist` file stem.
fn split_file_stem( stem: &str ) -> ( String, String ) {
    match stem.split_once( " - " ) {
        Some(( title, artist )) => {
            // Anything after a second separator is not part of the artist
            let artist = artist.split( " - " ).next().unwrap_or( artist ).trim();
            let artist = if artist.is_empty() { UNKNOWN_ARTIST } else { artist };
            ( title.trim().to_string(), artist.to_string() )
        }
        None => ( stem.trim().to_string(), UNKNOWN_ARTIST.to_string() ),
    }
}


/// Checks if a file has a supported audio extension.
fn is_audio_file( path: &Path ) -> bool {
    path.is_file() && path.extension()
        .and_then( |e| e.to_str() )
        .map( |e| SUPPORTED_EXTENSIONS.contains( &e.to_lowercase().as_str() ) )
        .unwrap_or( false )
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::catalog::Catalog;


    fn touch( path: &Path ) {
        fs::create_dir_all( path.parent().unwrap() ).unwrap();
        fs::write( path, b"" ).unwrap();
    }


    #[test]
    fn test_split_file_stem() {
        assert_eq!( split_file_stem( "Song - Band" ), ( "Song".into(), "Band".into() ) );
        assert_eq!( split_file_stem( "Song" ), ( "Song".into(), UNKNOWN_ARTIST.into() ) );
        assert_eq!( split_file_stem( "Song - Band - Live" ), ( "Song".into(), "Band".into() ) );
    }


    #[test]
    fn test_index_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch( &dir.path().join( "Chill" ).join( "b - Two.mp3" ) );
        touch( &dir.path().join( "Chill" ).join( "a - One.flac" ) );
        touch( &dir.path().join( "Chill" ).join( "cover.jpg" ) );
        touch( &dir.path().join( "Rock" ).join( "Solo.ogg" ) );

        let tracks = index_directory( dir.path() ).unwrap();

        assert_eq!( tracks.len(), 3 );
        assert_eq!( tracks[ 0 ].title, "a" );
        assert_eq!( tracks[ 0 ].artist, "One" );
        assert_eq!( tracks[ 0 ].position, 0 );
        assert_eq!( tracks[ 1 ].position, 1 );
        assert_eq!( tracks[ 2 ].playlist, "Rock" );
        assert_eq!( tracks[ 2 ].artist, UNKNOWN_ARTIST );
        assert_eq!( tracks.iter().map( |t| t.id ).collect::<Vec<_>>(), vec![ 1, 2, 3 ] );
    }


    #[test]
    fn test_index_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = index_directory( &dir.path().join( "nope" ) );
        assert!( matches!( result, Err( LibraryError::NotFound( _ ) ) ) );
    }


    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        touch( &dir.path().join( "Mix" ).join( "x - A.mp3" ) );
        touch( &dir.path().join( "Mix" ).join( "y - B.mp3" ) );

        let library = Library::new( dir.path().join( "data" ).join( "library.json" ) );
        library.save( &index_directory( dir.path() ).unwrap() ).unwrap();

        let catalog = Catalog::fetch( &library ).unwrap();
        assert_eq!( catalog.len(), 2 );
        assert_eq!( catalog.playlist( "Mix" )[ 0 ].title, "x" );
    }


    #[test]
    fn test_write_order_keeps_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "library.json" );
        fs::write( &path, r#"{"songs": [
            {"id": 1, "title": "One", "artist": "A", "playlist": "Mix", "position": 0, "url": "/1.mp3"},
            {"id": 2, "title": "Two", "artist": "B", "playlist": "Mix", "position": 1, "url": "/2.mp3"},
            {"id": 3, "playlist": "Mix", "position": 2}
        ]}"# ).unwrap();

        let library = Library::new( path );
        library.write_order( "Mix", &[ 2, 1 ] ).unwrap();

        let entries = library.read_entries().unwrap();
        assert_eq!( entries.len(), 3 );

        let catalog = Catalog::fetch( &library ).unwrap();
        let ids: Vec<TrackId> = catalog.playlist( "Mix" ).iter().map( |t| t.id ).collect();
        assert_eq!( ids, vec![ 2, 1 ] );
    }


    #[test]
    fn test_missing_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::new( dir.path().join( "missing.json" ) );
        assert!( matches!( library.all_tracks(), Err( LibraryError::NotFound( _ ) ) ) );
    }
}
