//! Core player implementation
//!
//! The Player owns the queue, the catalog snapshot and the single media
//! resource. Every user action and every media signal is handled
//! synchronously, and observers get a fresh [`Snapshot`] after each
//! transition.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::{ Catalog, OrderPersistence };
use crate::history::PlayHistory;
use crate::media::{ LoadToken, MediaEvent, MediaResource, MediaSignal, SeekTarget };
use crate::queue::Queue;
use crate::track::{ Track, TrackId };


/// Current playback state.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum PlaybackState {
    #[default]
    Stopped,
    /// Source set, waiting for the media to report it is loaded.
    Loading,
    Playing,
    Paused,
    /// The current source failed; a skip follows immediately.
    Error,
}


/// Everything a view needs to render the player.
#[derive( Debug, Clone, PartialEq )]
pub struct Snapshot {
    pub state: PlaybackState,
    pub current: Option<Track>,
    pub current_index: Option<usize>,
    pub queue: Vec<Track>,
    pub shuffle: bool,
    pub repeat: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub volume: f32,
}


/// Events emitted by the player for UI updates.
#[derive( Debug, Clone, PartialEq )]
pub enum PlayerEvent {
    /// Sent after every transition.
    Updated( Snapshot ),
    TrackStarted { track: Track },
    /// A track played to its end.
    TrackFinished { track: Track },
    /// A track failed to load and is being skipped.
    Skipping { track: Track, message: String },
    QueueExhausted,
}


/// Callback receiving player events.
pub type Observer = Box<dyn FnMut( &PlayerEvent )>;


/// Core audio player.
pub struct Player<M: MediaResource> {
    media: M,
    catalog: Catalog,
    queue: Queue,
    history: PlayHistory,
    state: PlaybackState,
    /// Token of the load whose signals are accepted
    active_load: Option<LoadToken>,
    next_token: u64,
    position: Duration,
    volume: f32,
    persistence: Option<Box<dyn OrderPersistence>>,
    observers: Vec<Observer>,
    rng: StdRng,
}


impl<M: MediaResource> Player<M> {
    /// Creates a new Player around a media resource.
    pub fn new( media: M, catalog: Catalog ) -> Self {
        Self {
            media,
            catalog,
            queue: Queue::new(),
            history: PlayHistory::new(),
            state: PlaybackState::Stopped,
            active_load: None,
            next_token: 1,
            position: Duration::ZERO,
            volume: 1.0,
            persistence: None,
            observers: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }


    /// Uses a fixed random source, for reproducible shuffles.
    pub fn with_rng( mut self, rng: StdRng ) -> Self {
        self.rng = rng;
        self
    }


    /// Sends playlist reorders to `persistence`.
    pub fn with_persistence( mut self, persistence: Box<dyn OrderPersistence> ) -> Self {
        self.persistence = Some( persistence );
        self
    }


    /// Starts from previously recorded play counts.
    pub fn with_history( mut self, history: PlayHistory ) -> Self {
        self.history = history;
        self
    }


    /// Registers an observer.
    pub fn subscribe( &mut self, observer: impl FnMut( &PlayerEvent ) + 'static ) {
        self.observers.push( Box::new( observer ) );
    }


    /// Plays a track within its playlist.
    ///
    /// Returns false if the id is not in the catalog.
    pub fn play_track( &mut self, id: TrackId ) -> bool {
        if self.queue.load_for_track( &self.catalog, id, &mut self.rng ).is_none() {
            tracing::debug!( "Track {} not in catalog", id );
            return false;
        }
        self.load_current();
        true
    }


    /// Plays a playlist from its first track (or a shuffled one).
    ///
    /// Returns false if the playlist has no tracks.
    pub fn play_playlist( &mut self, name: &str ) -> bool {
        if !self.queue.load_playlist( &self.catalog, name, &mut self.rng ) {
            tracing::debug!( "Playlist '{}' not in catalog", name );
            return false;
        }
        self.queue.advance();
        self.load_current();
        true
    }


    /// Adds a track to the queue, starting playback if the queue was empty.
    pub fn enqueue( &mut self, id: TrackId ) -> bool {
        let Some( track ) = self.catalog.get( id ).cloned() else {
            tracing::debug!( "Track {} not in catalog", id );
            return false;
        };

        tracing::info!( "Queued: {}", track.label() );
        if self.queue.enqueue( track ) {
            self.load_current();
        } else {
            self.notify();
        }
        true
    }


    /// Skips to the next track, stopping at the end of the queue.
    ///
    /// Returns true if a track was started.
    pub fn next( &mut self ) -> bool {
        if self.queue.advance().is_some() {
            self.load_current();
            true
        } else {
            self.finish_queue();
            false
        }
    }


    /// Goes back one track. No-op at the start of the queue.
    pub fn previous( &mut self ) -> bool {
        if self.queue.retreat().is_some() {
            self.load_current();
            true
        } else {
            false
        }
    }


    /// Stops playback and empties the queue.
    pub fn stop( &mut self ) {
        self.queue.reset();
        self.release_media();
        tracing::info!( "Stopped" );
        self.notify();
    }


    /// Clears the queue, keeping the current track.
    pub fn clear_queue( &mut self ) {
        self.queue.clear();
        self.notify();
    }


    /// Removes the track at `index` of the queue.
    ///
    /// Removing the current track halts playback; the rest of the
    /// queue stays.
    pub fn remove_at( &mut self, index: usize ) -> bool {
        let Some( removed ) = self.queue.remove_at( index ) else {
            return false;
        };

        tracing::info!( "Removed from queue: {}", removed.track.label() );
        if removed.was_current {
            self.release_media();
        }
        self.notify();
        true
    }


    /// Reorders the queue to follow `ids`.
    pub fn reorder_queue( &mut self, ids: &[TrackId] ) -> bool {
        let before = self.queue.current().map( |t| t.id );
        if !self.queue.reorder( ids, &self.catalog ) {
            return false;
        }
        let after = self.queue.current().map( |t| t.id );

        if after.is_none() && before.is_some() {
            self.release_media();
            self.notify();
        } else if after != before && self.state != PlaybackState::Stopped {
            self.load_current();
        } else {
            self.notify();
        }
        true
    }


    /// Applies a new order to a playlist.
    ///
    /// The order is persisted, the catalog snapshot updated right away,
    /// and a queue loaded from that playlist follows suit.
    pub fn rearrange_playlist( &mut self, playlist: &str, ids: &[TrackId] ) -> bool {
        if self.catalog.playlist( playlist ).is_empty() {
            return false;
        }

        self.catalog.apply_order( playlist, ids );
        if let Some( persistence ) = &self.persistence {
            persistence.persist_order( playlist, ids );
        }

        if self.queue.source() == Some( playlist ) {
            let order = self.playlist_order_for_queue( playlist );
            if self.queue.shuffle() {
                self.queue.rearrange_original( &order );
                self.notify();
            } else {
                self.reorder_queue( &order );
            }
        }
        true
    }


    /// Replaces the catalog snapshot. The queue is left alone.
    pub fn replace_catalog( &mut self, catalog: Catalog ) {
        tracing::debug!( "Catalog refreshed ({} tracks)", catalog.len() );
        self.catalog = catalog;
    }


    pub fn set_shuffle( &mut self, shuffle: bool ) {
        self.queue.set_shuffle( shuffle, &mut self.rng );
        tracing::info!( "Shuffle {}", if shuffle { "on" } else { "off" } );
        self.notify();
    }


    pub fn toggle_shuffle( &mut self ) -> bool {
        let shuffle = !self.queue.shuffle();
        self.set_shuffle( shuffle );
        shuffle
    }


    pub fn set_repeat( &mut self, repeat: bool ) {
        self.queue.set_repeat( repeat );
        tracing::info!( "Repeat {}", if repeat { "on" } else { "off" } );
        self.notify();
    }


    pub fn toggle_repeat( &mut self ) -> bool {
        let repeat = !self.queue.repeat();
        self.set_repeat( repeat );
        repeat
    }


    /// Pauses playback.
    pub fn pause( &mut self ) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.media.pause();
        self.state = PlaybackState::Paused;
        tracing::info!( "Paused" );
        self.notify();
        true
    }


    /// Resumes playback.
    pub fn resume( &mut self ) -> bool {
        if self.state != PlaybackState::Paused {
            return false;
        }
        self.media.play();
        self.state = PlaybackState::Playing;
        tracing::info!( "Resumed" );
        self.notify();
        true
    }


    /// Toggles between playing and paused.
    pub fn toggle_pause( &mut self ) -> bool {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            _ => false,
        }
    }


    /// Seeks within the current track.
    ///
    /// Ignored while stopped or before the media knows its duration.
    pub fn seek( &mut self, target: SeekTarget ) -> bool {
        if !matches!( self.state, PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused ) {
            return false;
        }
        let Some( duration ) = self.media.duration().filter( |d| !d.is_zero() ) else {
            tracing::debug!( "Seek ignored, duration unknown" );
            return false;
        };

        let Some( position ) = target.resolve( self.media.current_time(), duration ) else {
            tracing::debug!( "Ignoring seek to {:?}", target );
            return false;
        };
        self.media.set_current_time( position );
        self.position = position;
        self.notify();
        true
    }


    /// Sets the volume level (0.0 = mute, 1.0 = full).
    pub fn set_volume( &mut self, volume: f32 ) {
        self.volume = volume.clamp( 0.0, 1.0 );
        self.media.set_volume( self.volume );
        self.notify();
    }


    /// Handles a signal from the media resource.
    pub fn handle_signal( &mut self, signal: MediaSignal ) {
        if self.active_load != Some( signal.token ) {
            tracing::debug!( "Ignoring {:?} from superseded load {:?}", signal.event, signal.token );
            return;
        }

        match signal.event {
            MediaEvent::Loaded => self.on_loaded(),
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error { message } => self.on_error( message ),
            MediaEvent::TimeUpdate { position } => {
                self.position = position;
                self.notify();
            }
            MediaEvent::PlayStarted => {
                if self.state == PlaybackState::Paused {
                    self.state = PlaybackState::Playing;
                    self.notify();
                }
            }
            MediaEvent::PlayPaused => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                    self.notify();
                }
            }
        }
    }


    /// Suggests tracks to follow the current one.
    pub fn recommendations( &mut self, n: usize ) -> Vec<Track> {
        match self.queue.current().cloned() {
            Some( current ) => self.history.recommend( &current, &self.catalog, n, &mut self.rng ),
            None => Vec::new(),
        }
    }


    /// Builds a view of the current state.
    pub fn snapshot( &self ) -> Snapshot {
        let duration = match self.state {
            PlaybackState::Stopped => None,
            _ => self.media.duration(),
        };
        Snapshot {
            state: self.state,
            current: self.queue.current().cloned(),
            current_index: self.queue.current_index(),
            queue: self.queue.tracks().to_vec(),
            shuffle: self.queue.shuffle(),
            repeat: self.queue.repeat(),
            position: self.position,
            duration,
            volume: self.volume,
        }
    }


    pub fn state( &self ) -> PlaybackState {
        self.state
    }


    pub fn current_track( &self ) -> Option<&Track> {
        self.queue.current()
    }


    pub fn queue( &self ) -> &Queue {
        &self.queue
    }


    pub fn catalog( &self ) -> &Catalog {
        &self.catalog
    }


    pub fn history( &self ) -> &PlayHistory {
        &self.history
    }


    pub fn position( &self ) -> Duration {
        self.position
    }


    pub fn volume( &self ) -> f32 {
        self.volume
    }


    pub fn media( &self ) -> &M {
        &self.media
    }


    fn on_loaded( &mut self ) {
        if self.state != PlaybackState::Loading {
            return;
        }
        self.media.play();
        self.state = PlaybackState::Playing;

        if let Some( track ) = self.queue.current().cloned() {
            tracing::info!( "Playing: {}", track.label() );
            self.emit( PlayerEvent::TrackStarted { track } );
        }
        self.notify();
    }


    /// Queue continuation wins over repeat; repeat only loops the last track.
    fn on_ended( &mut self ) {
        if !matches!( self.state, PlaybackState::Playing | PlaybackState::Paused ) {
            return;
        }

        if let Some( track ) = self.queue.current().cloned() {
            self.history.record_play( track.id );
            self.emit( PlayerEvent::TrackFinished { track } );
        }

        if self.queue.has_next() {
            self.queue.advance();
            self.load_current();
        } else if self.queue.repeat() {
            tracing::debug!( "Repeating current track" );
            self.media.set_current_time( Duration::ZERO );
            self.media.play();
            self.position = Duration::ZERO;
            self.state = PlaybackState::Playing;
            self.notify();
        } else {
            self.finish_queue();
        }
    }


    fn on_error( &mut self, message: String ) {
        self.state = PlaybackState::Error;

        if let Some( track ) = self.queue.current().cloned() {
            tracing::warn!( "Error playing {}, skipping: {}", track.label(), message );
            self.emit( PlayerEvent::Skipping { track, message } );
        }
        self.notify();

        if self.queue.advance().is_some() {
            self.load_current();
        } else {
            self.finish_queue();
        }
    }


    fn finish_queue( &mut self ) {
        tracing::info!( "End of queue reached" );
        self.emit( PlayerEvent::QueueExhausted );
        self.stop();
    }


    /// Points the media at the current track and requests a load.
    fn load_current( &mut self ) {
        let Some( track ) = self.queue.current().cloned() else {
            self.stop();
            return;
        };

        let token = LoadToken( self.next_token );
        self.next_token += 1;
        self.active_load = Some( token );
        self.position = Duration::ZERO;
        self.state = PlaybackState::Loading;

        self.media.set_source( &track.url );
        self.media.load( token );

        tracing::debug!( "Loading {} as {:?}", track.label(), token );
        self.notify();
    }


    fn release_media( &mut self ) {
        self.media.pause();
        self.media.clear_source();
        self.active_load = None;
        self.position = Duration::ZERO;
        self.state = PlaybackState::Stopped;
    }


    /// Playlist order restricted to the queue, extras appended.
    fn playlist_order_for_queue( &self, playlist: &str ) -> Vec<TrackId> {
        let queued: Vec<TrackId> = self.queue.original().iter().map( |t| t.id ).collect();
        let mut order: Vec<TrackId> = self.catalog
            .playlist( playlist )
            .iter()
            .map( |t| t.id )
            .filter( |id| queued.contains( id ) )
            .collect();
        for id in queued {
            if !order.contains( &id ) {
                order.push( id );
            }
        }
        order
    }


    fn notify( &mut self ) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.emit( PlayerEvent::Updated( snapshot ) );
    }


    fn emit( &mut self, event: PlayerEvent ) {
        for observer in &mut self.observers {
            observer( &event );
        }
    }
}


impl<M: MediaResource> Drop for Player<M> {
    fn drop( &mut self ) {
        // Leave the media element silent
        self.media.pause();
        self.media.clear_source();
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use std::cell::RefCell;
    use std::rc::Rc;


    #[derive( Debug, Clone, PartialEq )]
    enum Call {
        SetSource( String ),
        Clear,
        Load( LoadToken ),
        Play,
        Pause,
        SetTime( Duration ),
    }


    #[derive( Default )]
    struct FakeMedia {
        calls: Vec<Call>,
        last_token: Option<LoadToken>,
        time: Duration,
        duration: Option<Duration>,
        volume: f32,
    }


    impl FakeMedia {
        fn loads( &self ) -> usize {
            self.calls.iter().filter( |c| matches!( c, Call::Load( _ ) ) ).count()
        }


        fn source( &self ) -> Option<&str> {
            self.calls.iter().rev().find_map( |c| match c {
                Call::SetSource( url ) => Some( url.as_str() ),
                Call::Clear => Some( "" ),
                _ => None,
            })
        }
    }


    impl MediaResource for FakeMedia {
        fn set_source( &mut self, url: &str ) {
            self.calls.push( Call::SetSource( url.to_string() ) );
        }

        fn clear_source( &mut self ) {
            self.duration = None;
            self.calls.push( Call::Clear );
        }

        fn load( &mut self, token: LoadToken ) {
            self.last_token = Some( token );
            self.calls.push( Call::Load( token ) );
        }

        fn play( &mut self ) {
            self.calls.push( Call::Play );
        }

        fn pause( &mut self ) {
            self.calls.push( Call::Pause );
        }

        fn current_time( &self ) -> Duration {
            self.time
        }

        fn set_current_time( &mut self, position: Duration ) {
            self.time = position;
            self.calls.push( Call::SetTime( position ) );
        }

        fn duration( &self ) -> Option<Duration> {
            self.duration
        }

        fn set_volume( &mut self, volume: f32 ) {
            self.volume = volume;
        }
    }


    #[derive( Clone, Default )]
    struct RecordedOrders( Rc<RefCell<Vec<( String, Vec<TrackId> )>>> );


    impl OrderPersistence for RecordedOrders {
        fn persist_order( &self, playlist: &str, ids: &[TrackId] ) {
            self.0.borrow_mut().push(( playlist.to_string(), ids.to_vec() ));
        }
    }


    /// A(X), B(X), C(Y) in playlist "Mix", plus D in "Solo".
    fn catalog() -> Catalog {
        Catalog::new( vec![
            track( 1, "X", "Mix", 0 ),
            track( 2, "X", "Mix", 1 ),
            track( 3, "Y", "Mix", 2 ),
            track( 4, "Z", "Solo", 0 ),
        ])
    }


    fn player() -> Player<FakeMedia> {
        Player::new( FakeMedia::default(), catalog() ).with_rng( StdRng::seed_from_u64( 21 ) )
    }


    fn send( player: &mut Player<FakeMedia>, event: MediaEvent ) {
        let token = player.media().last_token.expect( "no load requested" );
        player.handle_signal( MediaSignal::new( token, event ) );
    }


    fn current_id( player: &Player<FakeMedia> ) -> Option<TrackId> {
        player.current_track().map( |t| t.id )
    }


    #[test]
    fn test_play_track_loads_then_plays() {
        let mut player = player();
        assert!( player.play_track( 2 ) );
        assert_eq!( player.state(), PlaybackState::Loading );
        assert_eq!( player.media().source(), Some( "/music/Mix/2.mp3" ) );
        assert_eq!( player.queue().current_index(), Some( 1 ) );

        send( &mut player, MediaEvent::Loaded );
        assert_eq!( player.state(), PlaybackState::Playing );
        assert_eq!( player.media().calls.last(), Some( &Call::Play ) );
    }


    #[test]
    fn test_play_unknown_track_is_noop() {
        let mut player = player();
        assert!( !player.play_track( 99 ) );
        assert_eq!( player.state(), PlaybackState::Stopped );
        assert_eq!( player.media().loads(), 0 );
    }


    #[test]
    fn test_plays_through_queue_then_stops() {
        let mut player = player();
        player.play_track( 1 );

        for expected in [ 1, 2, 3 ] {
            assert_eq!( current_id( &player ), Some( expected ) );
            send( &mut player, MediaEvent::Loaded );
            send( &mut player, MediaEvent::Ended );
        }

        assert_eq!( player.state(), PlaybackState::Stopped );
        assert!( player.queue().is_empty() );
        assert!( player.queue().original().is_empty() );
        assert_eq!( player.queue().current_index(), None );
        assert_eq!( player.media().source(), Some( "" ) );
    }


    #[test]
    fn test_queue_continuation_beats_repeat() {
        let mut player = player();
        player.set_repeat( true );
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );

        send( &mut player, MediaEvent::Ended );
        assert_eq!( current_id( &player ), Some( 2 ) );
        assert_eq!( player.state(), PlaybackState::Loading );
    }


    #[test]
    fn test_repeat_restarts_last_track() {
        let mut player = player();
        player.set_repeat( true );
        player.play_track( 3 );
        send( &mut player, MediaEvent::Loaded );
        let loads = player.media().loads();

        send( &mut player, MediaEvent::Ended );

        assert_eq!( player.state(), PlaybackState::Playing );
        assert_eq!( current_id( &player ), Some( 3 ) );
        assert_eq!( player.media().loads(), loads );
        let tail = &player.media().calls[ player.media().calls.len() - 2.. ];
        assert_eq!( tail, &[ Call::SetTime( Duration::ZERO ), Call::Play ] );
    }


    #[test]
    fn test_history_counts_only_natural_ends() {
        let mut player = player();
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );
        player.next();
        send( &mut player, MediaEvent::Error { message: "bad file".into() } );
        send( &mut player, MediaEvent::Loaded );
        send( &mut player, MediaEvent::Ended );

        assert_eq!( player.history().count( 1 ), 0 );
        assert_eq!( player.history().count( 2 ), 0 );
        assert_eq!( player.history().count( 3 ), 1 );
    }


    #[test]
    fn test_error_skips_to_next() {
        let mut player = player();
        let events = Rc::new( RefCell::new( Vec::new() ) );
        let sink = Rc::clone( &events );
        player.subscribe( move |e| {
            if let PlayerEvent::Skipping { track, .. } = e {
                sink.borrow_mut().push( track.id );
            }
        });

        player.play_track( 2 );
        send( &mut player, MediaEvent::Error { message: "decode failed".into() } );

        assert_eq!( *events.borrow(), vec![ 2 ] );
        assert_eq!( current_id( &player ), Some( 3 ) );
        assert_eq!( player.state(), PlaybackState::Loading );
        assert_eq!( player.media().source(), Some( "/music/Mix/3.mp3" ) );
    }


    #[test]
    fn test_error_on_last_track_stops() {
        let mut player = player();
        player.play_track( 4 );
        send( &mut player, MediaEvent::Error { message: "404".into() } );

        assert_eq!( player.state(), PlaybackState::Stopped );
        assert!( player.queue().is_empty() );
    }


    #[test]
    fn test_stale_signals_ignored() {
        let mut player = player();
        player.play_track( 1 );
        let first = player.media().last_token.unwrap();
        player.play_track( 3 );

        player.handle_signal( MediaSignal::new( first, MediaEvent::Loaded ) );
        assert_eq!( player.state(), PlaybackState::Loading );

        player.handle_signal( MediaSignal::new( first, MediaEvent::Error { message: "late".into() } ) );
        assert_eq!( current_id( &player ), Some( 3 ) );
        assert_eq!( player.state(), PlaybackState::Loading );

        send( &mut player, MediaEvent::Loaded );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_signals_after_stop_ignored() {
        let mut player = player();
        player.play_track( 1 );
        let token = player.media().last_token.unwrap();
        player.stop();

        player.handle_signal( MediaSignal::new( token, MediaEvent::Loaded ) );
        assert_eq!( player.state(), PlaybackState::Stopped );
    }


    #[test]
    fn test_stop_empties_queue() {
        let mut player = player();
        player.play_track( 2 );
        send( &mut player, MediaEvent::Loaded );

        player.stop();
        assert_eq!( player.state(), PlaybackState::Stopped );
        assert!( player.queue().is_empty() );
        assert_eq!( player.queue().current_index(), None );
    }


    #[test]
    fn test_clear_keeps_playing_track() {
        let mut player = player();
        player.play_track( 2 );
        send( &mut player, MediaEvent::Loaded );

        player.clear_queue();
        assert_eq!( player.queue().ids(), vec![ 2 ] );
        assert_eq!( player.queue().current_index(), Some( 0 ) );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_remove_current_halts() {
        let mut player = player();
        player.play_track( 2 );
        send( &mut player, MediaEvent::Loaded );

        assert!( player.remove_at( 1 ) );
        assert_eq!( player.state(), PlaybackState::Stopped );
        assert_eq!( player.queue().current_index(), None );
        assert_eq!( player.queue().ids(), vec![ 1, 3 ] );
        assert_eq!( player.media().source(), Some( "" ) );
    }


    #[test]
    fn test_remove_before_current_keeps_track() {
        let mut player = player();
        player.play_track( 3 );
        send( &mut player, MediaEvent::Loaded );

        player.remove_at( 0 );
        assert_eq!( player.queue().current_index(), Some( 1 ) );
        assert_eq!( current_id( &player ), Some( 3 ) );
        assert_eq!( player.state(), PlaybackState::Playing );
        assert!( !player.remove_at( 5 ) );
    }


    #[test]
    fn test_enqueue_on_empty_starts_playback() {
        let mut player = player();
        assert!( player.enqueue( 4 ) );
        assert_eq!( player.state(), PlaybackState::Loading );
        assert_eq!( player.queue().len(), 1 );
        assert_eq!( player.queue().current_index(), Some( 0 ) );

        send( &mut player, MediaEvent::Loaded );
        assert!( player.enqueue( 1 ) );
        assert_eq!( player.queue().len(), 2 );
        assert_eq!( player.queue().current_index(), Some( 0 ) );
        assert_eq!( player.media().loads(), 1 );
        assert!( !player.enqueue( 42 ) );
    }


    #[test]
    fn test_play_playlist_starts_first_track() {
        let mut player = player();
        assert!( player.play_playlist( "Mix" ) );
        assert_eq!( player.queue().current_index(), Some( 0 ) );
        assert_eq!( current_id( &player ), Some( 1 ) );
        assert!( !player.play_playlist( "Missing" ) );
    }


    #[test]
    fn test_play_playlist_shuffled() {
        let mut player = player();
        player.set_shuffle( true );
        player.play_playlist( "Mix" );

        assert_eq!( player.queue().current_index(), Some( 0 ) );
        let mut ids = player.queue().ids();
        ids.sort();
        assert_eq!( ids, vec![ 1, 2, 3 ] );
        assert_eq!( player.queue().original().iter().map( |t| t.id ).collect::<Vec<_>>(), vec![ 1, 2, 3 ] );
    }


    #[test]
    fn test_next_at_end_stops() {
        let mut player = player();
        player.play_track( 3 );
        assert!( !player.next() );
        assert_eq!( player.state(), PlaybackState::Stopped );
    }


    #[test]
    fn test_previous_at_start_is_noop() {
        let mut player = player();
        player.play_track( 1 );
        let loads = player.media().loads();
        assert!( !player.previous() );
        assert_eq!( player.media().loads(), loads );

        player.next();
        assert!( player.previous() );
        assert_eq!( current_id( &player ), Some( 1 ) );
    }


    #[test]
    fn test_toggle_pause_without_reload() {
        let mut player = player();
        assert!( !player.toggle_pause() );

        player.play_track( 1 );
        assert!( !player.toggle_pause() );
        send( &mut player, MediaEvent::Loaded );
        let loads = player.media().loads();

        assert!( player.toggle_pause() );
        assert_eq!( player.state(), PlaybackState::Paused );
        assert!( player.toggle_pause() );
        assert_eq!( player.state(), PlaybackState::Playing );
        assert_eq!( player.media().loads(), loads );
    }


    #[test]
    fn test_media_play_pause_signals_sync_state() {
        let mut player = player();
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );

        send( &mut player, MediaEvent::PlayPaused );
        assert_eq!( player.state(), PlaybackState::Paused );
        send( &mut player, MediaEvent::PlayStarted );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_seek_requires_known_duration() {
        let mut player = player();
        assert!( !player.seek( SeekTarget::Fraction( 0.5 ) ) );

        player.play_track( 1 );
        assert!( !player.seek( SeekTarget::Fraction( 0.5 ) ) );

        player.media.duration = Some( Duration::from_secs( 120 ) );
        send( &mut player, MediaEvent::Loaded );
        assert!( player.seek( SeekTarget::Fraction( 0.5 ) ) );
        assert_eq!( player.media().time, Duration::from_secs( 60 ) );
        assert_eq!( player.position(), Duration::from_secs( 60 ) );
    }


    #[test]
    fn test_seek_nan_keeps_position() {
        let mut player = player();
        player.play_track( 1 );
        player.media.duration = Some( Duration::from_secs( 120 ) );
        send( &mut player, MediaEvent::Loaded );
        assert!( player.seek( SeekTarget::Fraction( 0.25 ) ) );

        assert!( !player.seek( SeekTarget::Fraction( f64::NAN ) ) );
        assert!( !player.seek( SeekTarget::Relative( f64::NAN ) ) );
        assert_eq!( player.media().time, Duration::from_secs( 30 ) );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_time_updates_tracked() {
        let mut player = player();
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );
        send( &mut player, MediaEvent::TimeUpdate { position: Duration::from_secs( 7 ) } );
        assert_eq!( player.snapshot().position, Duration::from_secs( 7 ) );
    }


    #[test]
    fn test_shuffle_toggle_while_playing_keeps_track() {
        let mut player = player();
        player.play_track( 2 );
        send( &mut player, MediaEvent::Loaded );
        let loads = player.media().loads();

        assert!( player.toggle_shuffle() );
        assert_eq!( player.queue().current_index(), Some( 0 ) );
        assert_eq!( current_id( &player ), Some( 2 ) );

        assert!( !player.toggle_shuffle() );
        assert_eq!( player.queue().ids(), vec![ 1, 2, 3 ] );
        assert_eq!( player.queue().current_index(), Some( 1 ) );
        assert_eq!( player.media().loads(), loads );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_reorder_queue_follows_current() {
        let mut player = player();
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );

        assert!( player.reorder_queue( &[ 3, 2, 1 ] ) );
        assert_eq!( player.queue().current_index(), Some( 2 ) );
        assert_eq!( player.state(), PlaybackState::Playing );
    }


    #[test]
    fn test_reorder_dropping_current_loads_first() {
        let mut player = player();
        player.play_track( 1 );
        send( &mut player, MediaEvent::Loaded );

        player.reorder_queue( &[ 3, 2 ] );
        assert_eq!( current_id( &player ), Some( 3 ) );
        assert_eq!( player.state(), PlaybackState::Loading );
    }


    #[test]
    fn test_rearrange_playlist_persists_and_reorders_queue() {
        let orders = RecordedOrders::default();
        let mut player = player().with_persistence( Box::new( orders.clone() ) );
        player.play_track( 2 );
        send( &mut player, MediaEvent::Loaded );
        player.enqueue( 4 );

        assert!( player.rearrange_playlist( "Mix", &[ 3, 1, 2 ] ) );

        assert_eq!( *orders.0.borrow(), vec![ ( "Mix".to_string(), vec![ 3, 1, 2 ] ) ] );
        assert_eq!( player.queue().ids(), vec![ 3, 1, 2, 4 ] );
        assert_eq!( current_id( &player ), Some( 2 ) );
        assert_eq!( player.state(), PlaybackState::Playing );

        let catalog_order: Vec<TrackId> = player.catalog().playlist( "Mix" ).iter().map( |t| t.id ).collect();
        assert_eq!( catalog_order, vec![ 3, 1, 2 ] );
        assert!( !player.rearrange_playlist( "Nope", &[ 1 ] ) );
    }


    #[test]
    fn test_rearrange_while_shuffled_updates_original() {
        let mut player = player();
        player.set_shuffle( true );
        player.play_track( 2 );
        let shuffled = player.queue().ids();

        player.rearrange_playlist( "Mix", &[ 3, 2, 1 ] );
        assert_eq!( player.queue().ids(), shuffled );

        player.set_shuffle( false );
        assert_eq!( player.queue().ids(), vec![ 3, 2, 1 ] );
        assert_eq!( current_id( &player ), Some( 2 ) );
    }


    #[test]
    fn test_observer_sees_every_transition() {
        let mut player = player();
        let states = Rc::new( RefCell::new( Vec::new() ) );
        let sink = Rc::clone( &states );
        player.subscribe( move |e| {
            if let PlayerEvent::Updated( snapshot ) = e {
                sink.borrow_mut().push( snapshot.state );
            }
        });

        player.play_track( 3 );
        send( &mut player, MediaEvent::Loaded );
        send( &mut player, MediaEvent::Ended );

        assert_eq!(
            *states.borrow(),
            vec![ PlaybackState::Loading, PlaybackState::Playing, PlaybackState::Stopped ]
        );
    }


    #[test]
    fn test_recommendations_exclude_current() {
        let mut player = player();
        assert!( player.recommendations( 3 ).is_empty() );

        player.play_track( 1 );
        let picks = player.recommendations( 3 );
        assert_eq!( picks.len(), 3 );
        assert_eq!( picks[ 0 ].id, 2 );
        assert!( picks.iter().all( |t| t.id != 1 ) );
    }


    #[test]
    fn test_volume_clamped_and_forwarded() {
        let mut player = player();
        player.set_volume( 1.7 );
        assert_eq!( player.volume(), 1.0 );
        assert_eq!( player.media().volume, 1.0 );
    }
}
