//! Track catalog snapshot and the collaborator seams around it
//!
//! The catalog is owned by a backend. The core keeps an immutable
//! snapshot and asks a provider for a fresh one when needed.

use std::collections::HashSet;

use crate::track::{ RawTrack, Track, TrackId };


/// Source of catalog snapshots.
pub trait CatalogProvider {
    type Error: std::error::Error;

    /// Returns every track currently known to the backend.
    fn all_tracks( &self ) -> Result<Vec<Track>, Self::Error>;
}


/// Receives playlist reorders.
///
/// Implementations must return immediately. Failures are the
/// implementation's to report; the caller never rolls back.
pub trait OrderPersistence {
    fn persist_order( &self, playlist: &str, ids: &[TrackId] );
}


/// Immutable view of all tracks.
#[derive( Debug, Clone, Default )]
pub struct Catalog {
    tracks: Vec<Track>,
}


impl Catalog {
    /// Creates a catalog, dropping entries whose id was already seen.
    pub fn new( tracks: Vec<Track> ) -> Self {
        let mut seen = HashSet::new();
        let tracks = tracks
            .into_iter()
            .filter( |t| {
                let fresh = seen.insert( t.id );
                if !fresh {
                    tracing::warn!( "Duplicate track id {} ignored", t.id );
                }
                fresh
            })
            .collect();
        Self { tracks }
    }


    /// Builds a catalog from unvalidated entries, skipping malformed ones.
    pub fn from_raw( entries: impl IntoIterator<Item = RawTrack> ) -> Self {
        let tracks = entries
            .into_iter()
            .filter_map( |raw| {
                let id = raw.id;
                match Track::try_from( raw ) {
                    Ok( track ) => Some( track ),
                    Err( e ) => {
                        tracing::warn!( "Rejected catalog entry {:?}: {}", id, e );
                        None
                    }
                }
            })
            .collect();
        Self::new( tracks )
    }


    /// Loads a snapshot from a provider.
    pub fn fetch<P: CatalogProvider>( provider: &P ) -> Result<Self, P::Error> {
        Ok( Self::new( provider.all_tracks()? ) )
    }


    pub fn tracks( &self ) -> &[Track] {
        &self.tracks
    }


    pub fn len( &self ) -> usize {
        self.tracks.len()
    }


    pub fn is_empty( &self ) -> bool {
        self.tracks.is_empty()
    }


    /// Looks up a track by id.
    pub fn get( &self, id: TrackId ) -> Option<&Track> {
        self.tracks.iter().find( |t| t.id == id )
    }


    /// Tracks of a playlist, sorted by position.
    ///
    /// Entries sharing a position keep catalog order.
    pub fn playlist( &self, name: &str ) -> Vec<Track> {
        let mut tracks: Vec<Track> = self.tracks
            .iter()
            .filter( |t| t.playlist == name )
            .cloned()
            .collect();
        tracks.sort_by_key( |t| t.position );
        tracks
    }


    /// Playlist names in order of first appearance.
    pub fn playlists( &self ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for track in &self.tracks {
            if !names.contains( &track.playlist ) {
                names.push( track.playlist.clone() );
            }
        }
        names
    }


    /// Tracks by an artist, in catalog order.
    pub fn by_artist<'a>( &'a self, artist: &'a str ) -> impl Iterator<Item = &'a Track> + 'a {
        self.tracks.iter().filter( move |t| t.artist == artist )
    }


    /// Rewrites positions of a playlist to follow `ids`.
    ///
    /// Ids that are not in the playlist are ignored. Tracks of the
    /// playlist missing from `ids` keep their relative order after
    /// the listed ones.
    pub fn apply_order( &mut self, playlist: &str, ids: &[TrackId] ) {
        let mut next = 0_i64;
        let mut placed = HashSet::new();

        for id in ids {
            if let Some( track ) = self.tracks.iter_mut().find( |t| t.id == *id && t.playlist == playlist ) {
                if placed.insert( *id ) {
                    track.position = next;
                    next += 1;
                }
            }
        }

        let mut rest: Vec<&mut Track> = self.tracks
            .iter_mut()
            .filter( |t| t.playlist == playlist && !placed.contains( &t.id ) )
            .collect();
        rest.sort_by_key( |t| t.position );
        for track in rest {
            track.position = next;
            next += 1;
        }
    }
}


#[cfg( test )]
pub( crate ) mod tests {
    use super::*;


    pub fn track( id: TrackId, artist: &str, playlist: &str, position: i64 ) -> Track {
        Track {
            id,
            title: format!( "Song {}", id ),
            artist: artist.to_string(),
            playlist: playlist.to_string(),
            position,
            url: format!( "/music/{}/{}.mp3", playlist, id ),
        }
    }


    #[test]
    fn test_playlist_sorted_by_position() {
        let catalog = Catalog::new( vec![
            track( 1, "X", "Mix", 2 ),
            track( 2, "Y", "Other", 0 ),
            track( 3, "X", "Mix", 0 ),
            track( 4, "Z", "Mix", 1 ),
        ]);

        let ids: Vec<TrackId> = catalog.playlist( "Mix" ).iter().map( |t| t.id ).collect();
        assert_eq!( ids, vec![ 3, 4, 1 ] );
        assert!( catalog.playlist( "Nope" ).is_empty() );
    }


    #[test]
    fn test_duplicate_ids_dropped() {
        let catalog = Catalog::new( vec![ track( 1, "X", "Mix", 0 ), track( 1, "Y", "Mix", 1 ) ] );
        assert_eq!( catalog.len(), 1 );
        assert_eq!( catalog.get( 1 ).unwrap().artist, "X" );
    }


    #[test]
    fn test_from_raw_skips_malformed() {
        let good = RawTrack::from( &track( 1, "X", "Mix", 0 ) );
        let bad = RawTrack { url: None, ..RawTrack::from( &track( 2, "X", "Mix", 1 ) ) };
        let catalog = Catalog::from_raw( vec![ good, bad ] );
        assert_eq!( catalog.len(), 1 );
        assert!( catalog.get( 2 ).is_none() );
    }


    #[test]
    fn test_playlists_in_first_appearance_order() {
        let catalog = Catalog::new( vec![
            track( 1, "X", "B", 0 ),
            track( 2, "X", "A", 0 ),
            track( 3, "X", "B", 1 ),
        ]);
        assert_eq!( catalog.playlists(), vec![ "B".to_string(), "A".to_string() ] );
    }


    #[test]
    fn test_apply_order() {
        let mut catalog = Catalog::new( vec![
            track( 1, "X", "Mix", 0 ),
            track( 2, "X", "Mix", 1 ),
            track( 3, "X", "Mix", 2 ),
            track( 9, "X", "Other", 0 ),
        ]);

        catalog.apply_order( "Mix", &[ 3, 9, 1 ] );

        let ids: Vec<TrackId> = catalog.playlist( "Mix" ).iter().map( |t| t.id ).collect();
        assert_eq!( ids, vec![ 3, 1, 2 ] );
        assert_eq!( catalog.get( 9 ).unwrap().position, 0 );
    }
}
