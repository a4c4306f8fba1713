//! Artist-spreading shuffle
//!
//! Not a uniform shuffle. Each pick first draws an artist uniformly
//! from those with tracks left, then one of that artist's tracks, so
//! every remaining artist is equally likely to come next whatever the
//! size of its catalogue.

use std::collections::HashMap;

use rand::Rng;

use crate::track::Track;


/// Shuffles `tracks`, placing `pinned` first when given.
///
/// Every track whose id matches `pinned` is taken out of the draw, and
/// `pinned` itself is prepended to the result.
pub fn smart_shuffle<R: Rng + ?Sized>( tracks: &[Track], pinned: Option<&Track>, rng: &mut R ) -> Vec<Track> {
    let mut groups: Vec<( &str, Vec<&Track> )> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();

    for track in tracks {
        if pinned.is_some_and( |p| p.id == track.id ) {
            continue;
        }
        let slot = *group_index.entry( track.artist.as_str() ).or_insert_with( || {
            groups.push(( track.artist.as_str(), Vec::new() ));
            groups.len() - 1
        });
        groups[ slot ].1.push( track );
    }

    let remaining: usize = groups.iter().map( |( _, g )| g.len() ).sum();
    let mut result = Vec::with_capacity( remaining + 1 );

    if let Some( track ) = pinned {
        result.push( track.clone() );
    }

    while !groups.is_empty() {
        let artist = rng.gen_range( 0..groups.len() );
        let group = &mut groups[ artist ].1;
        let pick = rng.gen_range( 0..group.len() );
        result.push( group.remove( pick ).clone() );

        if group.is_empty() {
            groups.remove( artist );
        }
    }

    result
}


/// Number of neighbouring pairs sharing an artist.
pub fn adjacent_same_artist( tracks: &[Track] ) -> usize {
    tracks.windows( 2 ).filter( |w| w[ 0 ].artist == w[ 1 ].artist ).count()
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use crate::track::TrackId;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;


    fn sorted_ids( tracks: &[Track] ) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = tracks.iter().map( |t| t.id ).collect();
        ids.sort();
        ids
    }


    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64( 1 );
        assert!( smart_shuffle( &[], None, &mut rng ).is_empty() );
    }


    #[test]
    fn test_pinned_track_first() {
        let a = track( 1, "X", "Mix", 0 );
        let b = track( 2, "X", "Mix", 1 );
        let c = track( 3, "Y", "Mix", 2 );
        let list = vec![ a.clone(), b, c ];

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64( seed );
            let out = smart_shuffle( &list, Some( &a ), &mut rng );
            assert_eq!( out.len(), 3 );
            assert_eq!( out[ 0 ].id, 1 );
            assert_eq!( sorted_ids( &out ), vec![ 1, 2, 3 ] );
        }
    }


    #[test]
    fn test_pinned_only_track() {
        let a = track( 1, "X", "Mix", 0 );
        let mut rng = StdRng::seed_from_u64( 3 );
        let out = smart_shuffle( &[ a.clone() ], Some( &a ), &mut rng );
        assert_eq!( out, vec![ a ] );
    }


    #[test]
    fn test_single_artist_keeps_all_tracks() {
        let list: Vec<Track> = ( 1..=5 ).map( |i| track( i, "Solo", "Mix", i ) ).collect();
        let mut rng = StdRng::seed_from_u64( 9 );
        let out = smart_shuffle( &list, None, &mut rng );
        assert_eq!( sorted_ids( &out ), vec![ 1, 2, 3, 4, 5 ] );
    }


    #[test]
    fn test_artist_drawn_before_track() {
        // Ten tracks by one artist, one by another: the lone track leads
        // about half the time, where a uniform shuffle gives it 1 in 11.
        let mut list: Vec<Track> = ( 0..10 ).map( |i| track( i, "Big", "Mix", i ) ).collect();
        list.push( track( 10, "Small", "Mix", 10 ) );

        let mut rng = StdRng::seed_from_u64( 42 );
        let trials = 2000;
        let small_first = ( 0..trials )
            .filter( |_| smart_shuffle( &list, None, &mut rng )[ 0 ].artist == "Small" )
            .count();

        let ratio = small_first as f64 / trials as f64;
        assert!( ( 0.4..0.6 ).contains( &ratio ), "lone artist led {:.3} of shuffles", ratio );
    }


    #[test]
    fn test_groups_drain_one_pick_at_a_time() {
        let list = vec![
            track( 1, "A", "Mix", 0 ),
            track( 2, "B", "Mix", 1 ),
            track( 3, "C", "Mix", 2 ),
        ];
        let mut rng = StdRng::seed_from_u64( 5 );
        let out = smart_shuffle( &list, None, &mut rng );
        assert_eq!( adjacent_same_artist( &out ), 0 );
        assert_eq!( sorted_ids( &out ), vec![ 1, 2, 3 ] );
    }


    proptest! {
        #[test]
        fn prop_shuffle_is_permutation( artists in prop::collection::vec( 0u8..5, 0..40 ), seed in any::<u64>() ) {
            let list: Vec<Track> = artists
                .iter()
                .enumerate()
                .map( |( i, a )| track( i as TrackId, &format!( "Artist {}", a ), "Mix", i as i64 ) )
                .collect();
            let mut rng = StdRng::seed_from_u64( seed );

            let out = smart_shuffle( &list, None, &mut rng );

            prop_assert_eq!( sorted_ids( &out ), sorted_ids( &list ) );
        }


        #[test]
        fn prop_pinned_shuffle_starts_with_pin( len in 1usize..30, pin in any::<prop::sample::Index>(), seed in any::<u64>() ) {
            let list: Vec<Track> = ( 0..len )
                .map( |i| track( i as TrackId, &format!( "Artist {}", i % 3 ), "Mix", i as i64 ) )
                .collect();
            let pinned = list[ pin.index( len ) ].clone();
            let mut rng = StdRng::seed_from_u64( seed );

            let out = smart_shuffle( &list, Some( &pinned ), &mut rng );

            prop_assert_eq!( out.len(), len );
            prop_assert_eq!( out[ 0 ].id, pinned.id );
            prop_assert_eq!( sorted_ids( &out ), sorted_ids( &list ) );
        }
    }
}
