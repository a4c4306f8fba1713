//! Play history and recommendations
//!
//! Counts completed plays per track. Counts only steer
//! recommendations; playback never depends on them.

use std::collections::{ HashMap, HashSet };

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{ Deserialize, Serialize };

use crate::catalog::Catalog;
use crate::track::{ Track, TrackId };


/// Number of top playlists that seed recommendations.
const SEED_PLAYLISTS: usize = 2;


/// Completed-play counters keyed by track id.
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
#[serde( transparent )]
pub struct PlayHistory {
    counts: HashMap<TrackId, u32>,
}


impl PlayHistory {
    pub fn new() -> Self {
        Self::default()
    }


    /// Counts one completed play.
    pub fn record_play( &mut self, id: TrackId ) {
        let count = self.counts.entry( id ).or_insert( 0 );
        *count = count.saturating_add( 1 );
        tracing::debug!( "Recorded play of track {} (total {})", id, count );
    }


    pub fn count( &self, id: TrackId ) -> u32 {
        self.counts.get( &id ).copied().unwrap_or( 0 )
    }


    pub fn total( &self ) -> u64 {
        self.counts.values().map( |c| u64::from( *c ) ).sum()
    }


    pub fn is_empty( &self ) -> bool {
        self.counts.is_empty()
    }


    /// Playlists with the most plays, highest first.
    ///
    /// Tracks missing from the catalog are ignored. Ties keep catalog
    /// order.
    pub fn top_playlists( &self, catalog: &Catalog, n: usize ) -> Vec<( String, u64 )> {
        let mut totals: Vec<( String, u64 )> = Vec::new();

        for track in catalog.tracks() {
            let count = self.count( track.id );
            if count == 0 {
                continue;
            }
            match totals.iter_mut().find( |( name, _ )| *name == track.playlist ) {
                Some(( _, total )) => *total += u64::from( count ),
                None => totals.push(( track.playlist.clone(), u64::from( count ) )),
            }
        }

        // Stable sort keeps catalog order on ties
        totals.sort_by( |a, b| b.1.cmp( &a.1 ) );
        totals.truncate( n );
        totals
    }


    /// Suggests up to `n` tracks to play after `current`.
    ///
    /// Same-artist tracks come first, then tracks from the two most
    /// played playlists, both in catalog order. Random catalog tracks
    /// fill whatever is left.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        current: &Track,
        catalog: &Catalog,
        n: usize,
        rng: &mut R,
    ) -> Vec<Track> {
        let mut chosen: HashSet<TrackId> = HashSet::new();
        chosen.insert( current.id );

        let top: Vec<String> = self.top_playlists( catalog, SEED_PLAYLISTS )
            .into_iter()
            .map( |( name, _ )| name )
            .collect();

        let same_artist = catalog.by_artist( &current.artist );
        let from_top = top.iter().flat_map( |name| catalog.tracks().iter().filter( move |t| t.playlist == *name ) );

        let mut picks: Vec<Track> = same_artist
            .chain( from_top )
            .filter( |t| chosen.insert( t.id ) )
            .take( n )
            .cloned()
            .collect();

        if picks.len() < n {
            let mut fillers: Vec<&Track> = catalog.tracks()
                .iter()
                .filter( |t| !chosen.contains( &t.id ) )
                .collect();
            fillers.shuffle( rng );
            picks.extend( fillers.into_iter().take( n - picks.len() ).cloned() );
        }

        picks
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;


    fn catalog() -> Catalog {
        Catalog::new( vec![
            track( 1, "A", "Rock", 0 ),
            track( 2, "B", "Rock", 1 ),
            track( 3, "C", "Jazz", 0 ),
            track( 4, "A", "Jazz", 1 ),
            track( 5, "D", "Pop", 0 ),
            track( 6, "E", "Pop", 1 ),
            track( 7, "F", "Folk", 0 ),
        ])
    }


    #[test]
    fn test_record_play() {
        let mut history = PlayHistory::new();
        history.record_play( 3 );
        history.record_play( 3 );
        history.record_play( 5 );
        assert_eq!( history.count( 3 ), 2 );
        assert_eq!( history.count( 9 ), 0 );
        assert_eq!( history.total(), 3 );
    }


    #[test]
    fn test_top_playlists() {
        let mut history = PlayHistory::new();
        history.record_play( 5 );
        history.record_play( 6 );
        history.record_play( 3 );
        history.record_play( 1 );
        history.record_play( 42 );

        let top = history.top_playlists( &catalog(), 2 );
        assert_eq!( top, vec![ ( "Pop".to_string(), 2 ), ( "Rock".to_string(), 1 ) ] );
    }


    #[test]
    fn test_top_playlists_ties_follow_catalog_order() {
        let mut history = PlayHistory::new();
        history.record_play( 7 );
        history.record_play( 3 );

        let top = history.top_playlists( &catalog(), 5 );
        assert_eq!( top, vec![ ( "Jazz".to_string(), 1 ), ( "Folk".to_string(), 1 ) ] );
    }


    #[test]
    fn test_recommend_primary_set_in_discovery_order() {
        let catalog = catalog();
        let mut history = PlayHistory::new();
        history.record_play( 5 );
        history.record_play( 5 );
        history.record_play( 7 );

        let current = catalog.get( 1 ).unwrap().clone();
        let mut rng = StdRng::seed_from_u64( 1 );
        let picks = history.recommend( &current, &catalog, 4, &mut rng );

        let ids: Vec<TrackId> = picks.iter().map( |t| t.id ).collect();
        assert_eq!( ids, vec![ 4, 5, 6, 7 ] );
    }


    #[test]
    fn test_recommend_fills_with_random_tracks() {
        let catalog = catalog();
        let history = PlayHistory::new();
        let current = catalog.get( 1 ).unwrap().clone();
        let mut rng = StdRng::seed_from_u64( 2 );

        let picks = history.recommend( &current, &catalog, 4, &mut rng );

        assert_eq!( picks.len(), 4 );
        assert_eq!( picks[ 0 ].id, 4 );
        let unique: HashSet<TrackId> = picks.iter().map( |t| t.id ).collect();
        assert_eq!( unique.len(), 4 );
        assert!( !unique.contains( &1 ) );
    }


    #[test]
    fn test_recommend_stops_when_catalog_exhausted() {
        let catalog = catalog();
        let history = PlayHistory::new();
        let current = catalog.get( 1 ).unwrap().clone();
        let mut rng = StdRng::seed_from_u64( 3 );

        let picks = history.recommend( &current, &catalog, 50, &mut rng );
        assert_eq!( picks.len(), 6 );
    }


    #[test]
    fn test_history_json_round_trip() {
        let mut history = PlayHistory::new();
        history.record_play( 12 );
        let json = serde_json::to_string( &history ).unwrap();
        assert_eq!( json, r#"{"12":1}"# );
        let back: PlayHistory = serde_json::from_str( &json ).unwrap();
        assert_eq!( back, history );
    }
}
