//! Simulated media element
//!
//! Stands in for a real audio output: a tokio task per load waits out
//! the configured latency, reports the track as loaded, then advances
//! a clock while playing and reports the end. Sources without an audio
//! extension fail to load.

use std::path::Path;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use cadence_core::{ LoadToken, MediaEvent, MediaResource, MediaSignal };


/// Supported audio extensions.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "m4a", "aac", "opus", "wma", "aiff", "alac",
];

/// Clock resolution and time update interval.
const TICK: Duration = Duration::from_millis( 250 );


#[derive( Debug, Default )]
struct Clock {
    position: Duration,
    duration: Option<Duration>,
    playing: bool,
}


/// Media resource driven by tokio timers.
pub struct SimulatedMedia {
    runtime: Handle,
    signals: UnboundedSender<MediaSignal>,
    clock: Arc<Mutex<Clock>>,
    source: Option<String>,
    token: Option<LoadToken>,
    task: Option<JoinHandle<()>>,
    track_length: Duration,
    latency: Duration,
    volume: f32,
}


impl SimulatedMedia {
    pub fn new(
        runtime: Handle,
        signals: UnboundedSender<MediaSignal>,
        track_length: Duration,
        latency: Duration,
    ) -> Self {
        Self {
            runtime,
            signals,
            clock: Arc::new( Mutex::new( Clock::default() ) ),
            source: None,
            token: None,
            task: None,
            track_length,
            latency,
            volume: 1.0,
        }
    }


    pub fn volume( &self ) -> f32 {
        self.volume
    }


    fn clock( &self ) -> MutexGuard<'_, Clock> {
        lock( &self.clock )
    }


    /// Abandons the running load and resets the clock.
    fn abort( &mut self ) {
        if let Some( task ) = self.task.take() {
            task.abort();
        }
        *self.clock() = Clock::default();
    }


    fn send( &self, event: MediaEvent ) {
        if let Some( token ) = self.token {
            let _ = self.signals.send( MediaSignal::new( token, event ) );
        }
    }
}


impl MediaResource for SimulatedMedia {
    fn set_source( &mut self, url: &str ) {
        self.abort();
        self.source = Some( url.to_string() );
    }


    fn clear_source( &mut self ) {
        self.abort();
        self.source = None;
        self.token = None;
    }


    fn load( &mut self, token: LoadToken ) {
        self.abort();
        self.token = Some( token );

        let source = self.source.clone().unwrap_or_default();
        let signals = self.signals.clone();
        let clock = Arc::clone( &self.clock );
        let length = self.track_length;
        let latency = self.latency;

        self.task = Some( self.runtime.spawn( async move {
            tokio::time::sleep( latency ).await;

            if !is_audio_source( &source ) {
                let message = format!( "Unsupported source: '{}'", source );
                let _ = signals.send( MediaSignal::new( token, MediaEvent::Error { message } ) );
                return;
            }

            lock( &clock ).duration = Some( length );
            if signals.send( MediaSignal::new( token, MediaEvent::Loaded ) ).is_err() {
                return;
            }

            let mut ticker = tokio::time::interval( TICK );
            loop {
                ticker.tick().await;

                let event = {
                    let mut clock = lock( &clock );
                    if !clock.playing {
                        continue;
                    }
                    clock.position = ( clock.position + TICK ).min( length );
                    if clock.position >= length {
                        clock.playing = false;
                        MediaEvent::Ended
                    } else {
                        MediaEvent::TimeUpdate { position: clock.position }
                    }
                };

                if signals.send( MediaSignal::new( token, event ) ).is_err() {
                    return;
                }
            }
        }));
    }


    fn play( &mut self ) {
        self.clock().playing = true;
        self.send( MediaEvent::PlayStarted );
    }


    fn pause( &mut self ) {
        let was_playing = std::mem::replace( &mut self.clock().playing, false );
        if was_playing {
            self.send( MediaEvent::PlayPaused );
        }
    }


    fn current_time( &self ) -> Duration {
        self.clock().position
    }


    fn set_current_time( &mut self, position: Duration ) {
        let mut clock = self.clock();
        clock.position = match clock.duration {
            Some( duration ) => position.min( duration ),
            None => position,
        };
    }


    fn duration( &self ) -> Option<Duration> {
        self.clock().duration
    }


    fn set_volume( &mut self, volume: f32 ) {
        self.volume = volume.clamp( 0.0, 1.0 );
    }
}


impl Drop for SimulatedMedia {
    fn drop( &mut self ) {
        self.abort();
    }
}


fn lock( clock: &Mutex<Clock> ) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else( PoisonError::into_inner )
}


/// Checks if a source has a supported audio extension.
fn is_audio_source( url: &str ) -> bool {
    Path::new( url )
        .extension()
        .and_then( |e| e.to_str() )
        .map( |e| AUDIO_EXTENSIONS.contains( &e.to_lowercase().as_str() ) )
        .unwrap_or( false )
}


#[cfg( test )]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{ unbounded_channel, UnboundedReceiver };
    use tokio::time::timeout;


    const WAIT: Duration = Duration::from_secs( 5 );


    fn media( length: Duration ) -> ( SimulatedMedia, UnboundedReceiver<MediaSignal> ) {
        let ( tx, rx ) = unbounded_channel();
        let media = SimulatedMedia::new( Handle::current(), tx, length, Duration::ZERO );
        ( media, rx )
    }


    async fn next_event( rx: &mut UnboundedReceiver<MediaSignal> ) -> MediaSignal {
        timeout( WAIT, rx.recv() ).await.expect( "timed out" ).expect( "channel closed" )
    }


    #[test]
    fn test_audio_source_detection() {
        assert!( is_audio_source( "/music/Mix/1.mp3" ) );
        assert!( is_audio_source( "C:/Music/song.FLAC" ) );
        assert!( !is_audio_source( "/music/cover.jpg" ) );
        assert!( !is_audio_source( "" ) );
    }


    #[tokio::test]
    async fn test_load_play_until_ended() {
        let ( mut media, mut rx ) = media( Duration::from_millis( 500 ) );
        media.set_source( "/music/Mix/1.mp3" );
        media.load( LoadToken( 1 ) );

        let loaded = next_event( &mut rx ).await;
        assert_eq!( loaded, MediaSignal::new( LoadToken( 1 ), MediaEvent::Loaded ) );
        assert_eq!( media.duration(), Some( Duration::from_millis( 500 ) ) );

        media.play();

        loop {
            let signal = next_event( &mut rx ).await;
            assert_eq!( signal.token, LoadToken( 1 ) );
            match signal.event {
                MediaEvent::PlayStarted | MediaEvent::TimeUpdate { .. } => continue,
                MediaEvent::Ended => break,
                other => panic!( "unexpected {:?}", other ),
            }
        }
        assert_eq!( media.current_time(), Duration::from_millis( 500 ) );
    }


    #[tokio::test]
    async fn test_unsupported_source_errors() {
        let ( mut media, mut rx ) = media( Duration::from_secs( 1 ) );
        media.set_source( "/music/notes.txt" );
        media.load( LoadToken( 4 ) );

        let signal = next_event( &mut rx ).await;
        assert_eq!( signal.token, LoadToken( 4 ) );
        assert!( matches!( signal.event, MediaEvent::Error { .. } ) );
    }


    #[tokio::test]
    async fn test_new_load_abandons_previous() {
        let ( tx, mut rx ) = unbounded_channel();
        let mut media = SimulatedMedia::new(
            Handle::current(),
            tx,
            Duration::from_secs( 1 ),
            Duration::from_millis( 100 ),
        );
        media.set_source( "/music/a.mp3" );
        media.load( LoadToken( 1 ) );
        media.set_source( "/music/b.mp3" );
        media.load( LoadToken( 2 ) );

        let signal = next_event( &mut rx ).await;
        assert_eq!( signal, MediaSignal::new( LoadToken( 2 ), MediaEvent::Loaded ) );
    }


    #[tokio::test]
    async fn test_seek_clamped_to_duration() {
        let ( mut media, mut rx ) = media( Duration::from_secs( 3 ) );
        media.set_source( "/music/a.ogg" );
        media.load( LoadToken( 1 ) );
        next_event( &mut rx ).await;

        media.set_current_time( Duration::from_secs( 10 ) );
        assert_eq!( media.current_time(), Duration::from_secs( 3 ) );
    }
}
