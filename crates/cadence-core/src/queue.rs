//! Play queue management
//!
//! Handles track ordering, the current position, shuffle and repeat.
//! The queue keeps an unshuffled copy next to the play order so
//! shuffle can be switched off without losing the original sequence.

use std::collections::HashSet;

use rand::Rng;

use crate::catalog::Catalog;
use crate::shuffle::smart_shuffle;
use crate::track::{ Track, TrackId };


/// A track taken out of the queue by [`Queue::remove_at`].
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Removed {
    pub track: Track,
    /// The removed track was the current one; nothing is current now.
    pub was_current: bool,
}


/// Play queue.
#[derive( Debug, Default, Clone )]
pub struct Queue {
    tracks: Vec<Track>,
    // Same tracks in load order, used to undo shuffle
    original: Vec<Track>,
    current_index: Option<usize>,
    shuffle: bool,
    repeat: bool,
    // Playlist the queue was loaded from, if any
    source: Option<String>,
}


impl Queue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }


    /// Replaces the queue with the playlist of `id`, making `id` current.
    ///
    /// Returns the current track, or None (queue untouched) if `id` is
    /// not in the catalog.
    pub fn load_for_track<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        id: TrackId,
        rng: &mut R,
    ) -> Option<&Track> {
        let track = catalog.get( id )?.clone();
        let sorted = catalog.playlist( &track.playlist );

        self.original = sorted.clone();
        self.source = Some( track.playlist.clone() );

        if self.shuffle {
            self.tracks = smart_shuffle( &sorted, Some( &track ), rng );
        } else {
            self.tracks = sorted;
        }
        self.current_index = self.position_of( id );

        tracing::debug!(
            "Loaded '{}' for track {} ({} tracks, index {:?})",
            track.playlist,
            id,
            self.tracks.len(),
            self.current_index
        );
        self.current()
    }


    /// Replaces the queue with a whole playlist, nothing current yet.
    ///
    /// Call [`Queue::advance`] to reach the first track. Returns false
    /// (queue untouched) if the playlist has no tracks.
    pub fn load_playlist<R: Rng + ?Sized>( &mut self, catalog: &Catalog, name: &str, rng: &mut R ) -> bool {
        let sorted = catalog.playlist( name );
        if sorted.is_empty() {
            return false;
        }

        self.original = sorted.clone();
        self.source = Some( name.to_string() );

        if self.shuffle {
            self.tracks = smart_shuffle( &sorted, None, rng );
        } else {
            self.tracks = sorted;
        }
        self.current_index = None;

        tracing::debug!( "Loaded playlist '{}' ({} tracks)", name, self.tracks.len() );
        true
    }


    /// Adds a track to the end of the queue.
    ///
    /// An empty queue becomes a single-track queue with that track
    /// current; returns true in that case.
    pub fn enqueue( &mut self, track: Track ) -> bool {
        if self.tracks.is_empty() {
            self.original = vec![ track.clone() ];
            self.tracks = vec![ track ];
            self.current_index = Some( 0 );
            self.source = None;
            return true;
        }

        self.original.push( track.clone() );
        self.tracks.push( track );
        false
    }


    /// Returns true if a track follows the current one.
    pub fn has_next( &self ) -> bool {
        match self.current_index {
            Some( i ) => i + 1 < self.tracks.len(),
            None => !self.tracks.is_empty(),
        }
    }


    /// Advances to the next track.
    ///
    /// Returns None once the queue is exhausted; the position is left
    /// where it was and the caller is expected to stop.
    pub fn advance( &mut self ) -> Option<&Track> {
        if !self.has_next() {
            return None;
        }
        self.current_index = Some( self.current_index.map_or( 0, |i| i + 1 ) );
        self.current()
    }


    /// Goes back one track. No-op at the start of the queue.
    pub fn retreat( &mut self ) -> Option<&Track> {
        match self.current_index {
            Some( i ) if i > 0 => {
                self.current_index = Some( i - 1 );
                self.current()
            }
            _ => None,
        }
    }


    /// Removes the track at `index`.
    ///
    /// The matching entry of the unshuffled order goes too. Removing the
    /// current track leaves nothing current.
    pub fn remove_at( &mut self, index: usize ) -> Option<Removed> {
        if index >= self.tracks.len() {
            return None;
        }

        let track = self.tracks.remove( index );
        if let Some( pos ) = self.original.iter().position( |t| t.id == track.id ) {
            self.original.remove( pos );
        }

        let mut was_current = false;
        if let Some( current ) = self.current_index {
            if index < current {
                self.current_index = Some( current - 1 );
            } else if index == current {
                self.current_index = None;
                was_current = true;
            }
        }

        Some( Removed { track, was_current } )
    }


    /// Clears the queue, keeping the current track if there is one.
    pub fn clear( &mut self ) {
        match self.current().cloned() {
            Some( track ) => {
                self.original = vec![ track.clone() ];
                self.tracks = vec![ track ];
                self.current_index = Some( 0 );
            }
            None => self.reset(),
        }
    }


    /// Empties the queue unconditionally. Modes are kept.
    pub fn reset( &mut self ) {
        self.tracks.clear();
        self.original.clear();
        self.current_index = None;
        self.source = None;
    }


    /// Sets shuffle mode.
    ///
    /// With a current track, switching on reshuffles the unshuffled
    /// order around it and switching off restores that order. Without
    /// one only the flag changes.
    pub fn set_shuffle<R: Rng + ?Sized>( &mut self, shuffle: bool, rng: &mut R ) {
        if shuffle == self.shuffle {
            return;
        }
        self.shuffle = shuffle;

        let Some( current ) = self.current().cloned() else {
            return;
        };

        if shuffle {
            self.tracks = smart_shuffle( &self.original, Some( &current ), rng );
        } else {
            self.tracks = self.original.clone();
        }
        self.current_index = self.position_of( current.id );
    }


    /// Rebuilds the queue in the order of `ids`.
    ///
    /// Ids are resolved against the queue first, then the catalog;
    /// unknown and repeated ids are skipped. The unshuffled order
    /// becomes the same sequence. Returns false if nothing changed.
    pub fn reorder( &mut self, ids: &[TrackId], catalog: &Catalog ) -> bool {
        let current_id = self.current().map( |t| t.id );

        let mut seen = HashSet::new();
        let rebuilt: Vec<Track> = ids
            .iter()
            .filter( |id| seen.insert( **id ) )
            .filter_map( |id| {
                self.tracks
                    .iter()
                    .find( |t| t.id == *id )
                    .or_else( || catalog.get( *id ) )
                    .cloned()
            })
            .collect();

        let unchanged = rebuilt.len() == self.tracks.len()
            && rebuilt.iter().zip( &self.tracks ).all( |( a, b )| a.id == b.id );
        if unchanged {
            return false;
        }

        self.original = rebuilt.clone();
        self.tracks = rebuilt;

        self.current_index = match current_id {
            _ if self.tracks.is_empty() => None,
            Some( id ) => self.position_of( id ).or( Some( 0 ) ),
            None => None,
        };

        tracing::debug!( "Queue reordered ({} tracks, index {:?})", self.tracks.len(), self.current_index );
        true
    }


    /// Reorders only the unshuffled copy, leaving the play order alone.
    ///
    /// Tracks missing from `ids` keep their relative order at the end.
    pub fn rearrange_original( &mut self, ids: &[TrackId] ) {
        self.original.sort_by_key( |t| ids.iter().position( |id| *id == t.id ).unwrap_or( usize::MAX ) );
    }


    /// Gets the current track.
    pub fn current( &self ) -> Option<&Track> {
        self.current_index.and_then( |i| self.tracks.get( i ) )
    }


    /// Gets the current track index.
    pub fn current_index( &self ) -> Option<usize> {
        self.current_index
    }


    /// Gets the queue in play order.
    pub fn tracks( &self ) -> &[Track] {
        &self.tracks
    }


    /// Gets the queue in unshuffled order.
    pub fn original( &self ) -> &[Track] {
        &self.original
    }


    /// Ids in play order.
    pub fn ids( &self ) -> Vec<TrackId> {
        self.tracks.iter().map( |t| t.id ).collect()
    }


    /// Playlist the queue was loaded from.
    pub fn source( &self ) -> Option<&str> {
        self.source.as_deref()
    }


    pub fn len( &self ) -> usize {
        self.tracks.len()
    }


    pub fn is_empty( &self ) -> bool {
        self.tracks.is_empty()
    }


    pub fn shuffle( &self ) -> bool {
        self.shuffle
    }


    pub fn repeat( &self ) -> bool {
        self.repeat
    }


    pub fn set_repeat( &mut self, repeat: bool ) {
        self.repeat = repeat;
    }


    fn position_of( &self, id: TrackId ) -> Option<usize> {
        self.tracks.iter().position( |t| t.id == id )
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
            track( 3, "Y", "Mix", 2 ),
            track( 1, "X", "Mix", 0 ),
            track( 2, "X", "Mix", 1 ),
            track( 4, "Z", "Mix", 3 ),
            track( 5, "Z", "Other", 0 ),
        ])
    }


    fn rng() -> StdRng {
        StdRng::seed_from_u64( 11 )
    }


    fn ids( tracks: &[Track] ) -> Vec<TrackId> {
        tracks.iter().map( |t| t.id ).collect()
    }


    #[test]
    fn test_load_for_track_sorted() {
        let mut queue = Queue::new();
        let current = queue.load_for_track( &catalog(), 2, &mut rng() ).cloned();

        assert_eq!( current.map( |t| t.id ), Some( 2 ) );
        assert_eq!( queue.ids(), vec![ 1, 2, 3, 4 ] );
        assert_eq!( ids( queue.original() ), vec![ 1, 2, 3, 4 ] );
        assert_eq!( queue.current_index(), Some( 1 ) );
        assert_eq!( queue.source(), Some( "Mix" ) );
    }


    #[test]
    fn test_load_for_track_shuffled_pins_first() {
        let mut queue = Queue::new();
        queue.set_shuffle( true, &mut rng() );
        queue.load_for_track( &catalog(), 3, &mut rng() );

        assert_eq!( queue.current_index(), Some( 0 ) );
        assert_eq!( queue.current().unwrap().id, 3 );
        assert_eq!( ids( queue.original() ), vec![ 1, 2, 3, 4 ] );

        let mut shuffled = queue.ids();
        shuffled.sort();
        assert_eq!( shuffled, vec![ 1, 2, 3, 4 ] );
    }


    #[test]
    fn test_load_for_missing_track_is_noop() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 5, &mut rng() );
        assert!( queue.load_for_track( &catalog(), 99, &mut rng() ).is_none() );
        assert_eq!( queue.ids(), vec![ 5 ] );
        assert_eq!( queue.current_index(), Some( 0 ) );
    }


    #[test]
    fn test_load_playlist_then_advance() {
        let mut queue = Queue::new();
        assert!( queue.load_playlist( &catalog(), "Mix", &mut rng() ) );
        assert_eq!( queue.current_index(), None );

        assert_eq!( queue.advance().map( |t| t.id ), Some( 1 ) );
        assert_eq!( queue.current_index(), Some( 0 ) );
    }


    #[test]
    fn test_load_unknown_playlist() {
        let mut queue = Queue::new();
        assert!( !queue.load_playlist( &catalog(), "Nope", &mut rng() ) );
        assert!( queue.is_empty() );
    }


    #[test]
    fn test_load_playlist_shuffled_has_no_pin() {
        let mut queue = Queue::new();
        queue.set_shuffle( true, &mut rng() );
        queue.load_playlist( &catalog(), "Mix", &mut rng() );

        assert_eq!( queue.current_index(), None );
        let mut shuffled = queue.ids();
        shuffled.sort();
        assert_eq!( shuffled, vec![ 1, 2, 3, 4 ] );
    }


    #[test]
    fn test_enqueue_empty_starts() {
        let mut queue = Queue::new();
        assert!( queue.enqueue( track( 9, "A", "Mix", 0 ) ) );
        assert_eq!( queue.len(), 1 );
        assert_eq!( queue.current_index(), Some( 0 ) );
        assert_eq!( queue.source(), None );
    }


    #[test]
    fn test_enqueue_appends() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        assert!( !queue.enqueue( track( 5, "Z", "Other", 0 ) ) );
        assert_eq!( queue.len(), 5 );
        assert_eq!( queue.current_index(), Some( 1 ) );
        assert_eq!( ids( queue.original() ), vec![ 1, 2, 3, 4, 5 ] );
    }


    #[test]
    fn test_advance_until_exhausted() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 3, &mut rng() );

        assert_eq!( queue.advance().map( |t| t.id ), Some( 4 ) );
        assert!( !queue.has_next() );
        assert!( queue.advance().is_none() );
        assert_eq!( queue.current_index(), Some( 3 ) );
    }


    #[test]
    fn test_retreat_stops_at_start() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        assert_eq!( queue.retreat().map( |t| t.id ), Some( 1 ) );
        assert!( queue.retreat().is_none() );
        assert_eq!( queue.current_index(), Some( 0 ) );
    }


    #[test]
    fn test_remove_before_current() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 3, &mut rng() );

        let removed = queue.remove_at( 0 ).unwrap();
        assert!( !removed.was_current );
        assert_eq!( queue.current_index(), Some( 1 ) );
        assert_eq!( queue.current().unwrap().id, 3 );
        assert_eq!( ids( queue.original() ), vec![ 2, 3, 4 ] );
    }


    #[test]
    fn test_remove_after_current() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        queue.remove_at( 3 );
        assert_eq!( queue.current_index(), Some( 1 ) );
        assert_eq!( queue.ids(), vec![ 1, 2, 3 ] );
    }


    #[test]
    fn test_remove_current() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        let removed = queue.remove_at( 1 ).unwrap();
        assert!( removed.was_current );
        assert_eq!( queue.current_index(), None );
        assert_eq!( queue.ids(), vec![ 1, 3, 4 ] );
    }


    #[test]
    fn test_remove_out_of_range() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );
        assert!( queue.remove_at( 10 ).is_none() );
        assert_eq!( queue.len(), 4 );
    }


    #[test]
    fn test_remove_from_shuffled_syncs_original() {
        let mut queue = Queue::new();
        queue.set_shuffle( true, &mut rng() );
        queue.load_for_track( &catalog(), 1, &mut rng() );

        let last = queue.tracks()[ 3 ].id;
        queue.remove_at( 3 );
        assert!( !ids( queue.original() ).contains( &last ) );
        assert_eq!( queue.original().len(), 3 );
    }


    #[test]
    fn test_clear_keeps_current() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        queue.clear();
        assert_eq!( queue.ids(), vec![ 2 ] );
        assert_eq!( ids( queue.original() ), vec![ 2 ] );
        assert_eq!( queue.current_index(), Some( 0 ) );
    }


    #[test]
    fn test_clear_without_current() {
        let mut queue = Queue::new();
        queue.load_playlist( &catalog(), "Mix", &mut rng() );

        queue.clear();
        assert!( queue.is_empty() );
        assert!( queue.original().is_empty() );
        assert_eq!( queue.current_index(), None );
    }


    #[test]
    fn test_shuffle_round_trip_restores_order() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 3, &mut rng() );

        queue.set_shuffle( true, &mut rng() );
        assert_eq!( queue.current_index(), Some( 0 ) );
        assert_eq!( queue.current().unwrap().id, 3 );

        queue.set_shuffle( false, &mut rng() );
        assert_eq!( queue.ids(), vec![ 1, 2, 3, 4 ] );
        assert_eq!( queue.current_index(), Some( 2 ) );
    }


    #[test]
    fn test_shuffle_without_current_only_flips_flag() {
        let mut queue = Queue::new();
        queue.load_playlist( &catalog(), "Mix", &mut rng() );

        queue.set_shuffle( true, &mut rng() );
        assert!( queue.shuffle() );
        assert_eq!( queue.ids(), vec![ 1, 2, 3, 4 ] );
        assert_eq!( queue.current_index(), None );
    }


    #[test]
    fn test_reorder_relocates_current() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        assert!( queue.reorder( &[ 4, 3, 2, 1 ], &catalog() ) );
        assert_eq!( queue.ids(), vec![ 4, 3, 2, 1 ] );
        assert_eq!( ids( queue.original() ), vec![ 4, 3, 2, 1 ] );
        assert_eq!( queue.current_index(), Some( 2 ) );
    }


    #[test]
    fn test_reorder_current_dropped_falls_back_to_first() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        queue.reorder( &[ 3, 1 ], &catalog() );
        assert_eq!( queue.ids(), vec![ 3, 1 ] );
        assert_eq!( queue.current_index(), Some( 0 ) );
    }


    #[test]
    fn test_reorder_to_empty() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 2, &mut rng() );

        queue.reorder( &[ 77, 78 ], &catalog() );
        assert!( queue.is_empty() );
        assert_eq!( queue.current_index(), None );
    }


    #[test]
    fn test_reorder_skips_unknown_and_repeated_ids() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 1, &mut rng() );

        queue.reorder( &[ 2, 99, 2, 1, 5 ], &catalog() );
        assert_eq!( queue.ids(), vec![ 2, 1, 5 ] );
        assert_eq!( queue.current_index(), Some( 1 ) );
    }


    #[test]
    fn test_rearrange_original_keeps_play_order() {
        let mut queue = Queue::new();
        queue.set_shuffle( true, &mut rng() );
        queue.load_for_track( &catalog(), 2, &mut rng() );
        let play_order = queue.ids();

        queue.rearrange_original( &[ 4, 3 ] );
        assert_eq!( queue.ids(), play_order );
        assert_eq!( ids( queue.original() ), vec![ 4, 3, 1, 2 ] );
    }


    #[test]
    fn test_reorder_then_shuffle_round_trip() {
        let mut queue = Queue::new();
        queue.load_for_track( &catalog(), 1, &mut rng() );
        queue.reorder( &[ 4, 1, 2, 3 ], &catalog() );

        queue.set_shuffle( true, &mut rng() );
        queue.set_shuffle( false, &mut rng() );
        assert_eq!( queue.ids(), vec![ 4, 1, 2, 3 ] );
        assert_eq!( queue.current().unwrap().id, 1 );
    }
}
