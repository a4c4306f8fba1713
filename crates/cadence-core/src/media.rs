//! Media resource seam
//!
//! The player drives exactly one media resource. Loading is
//! asynchronous: the resource reports back through [`MediaSignal`]
//! messages tagged with the [`LoadToken`] of the load they belong to,
//! which lets the player drop signals from superseded loads.

use std::time::Duration;


/// Identifies one load request.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord )]
pub struct LoadToken( pub u64 );


/// Lifecycle events reported by a media resource.
#[derive( Debug, Clone, PartialEq )]
pub enum MediaEvent {
    /// Enough data is available to start playback.
    Loaded,
    /// Playback reached the end of the source.
    Ended,
    /// The source could not be loaded or decoded.
    Error { message: String },
    TimeUpdate { position: Duration },
    PlayStarted,
    PlayPaused,
}


/// A media event for a specific load.
#[derive( Debug, Clone, PartialEq )]
pub struct MediaSignal {
    pub token: LoadToken,
    pub event: MediaEvent,
}


impl MediaSignal {
    pub fn new( token: LoadToken, event: MediaEvent ) -> Self {
        Self { token, event }
    }
}


/// A single playable media element.
///
/// All calls return immediately. Outcomes of `load`, `play` and
/// `pause` arrive later as signals carrying the token passed to the
/// most recent `load`.
pub trait MediaResource {
    fn set_source( &mut self, url: &str );

    /// Drops the current source, abandoning any pending load.
    fn clear_source( &mut self );

    fn load( &mut self, token: LoadToken );

    fn play( &mut self );

    fn pause( &mut self );

    fn current_time( &self ) -> Duration;

    fn set_current_time( &mut self, position: Duration );

    /// Total length of the source; None until known.
    fn duration( &self ) -> Option<Duration>;

    /// Output volume, 0.0 to 1.0.
    fn set_volume( &mut self, volume: f32 );
}


/// Seek request.
#[derive( Debug, Clone, Copy, PartialEq )]
pub enum SeekTarget {
    /// Fraction of the duration, clamped to 0.0..=1.0.
    Fraction( f64 ),
    Absolute( Duration ),
    /// Offset from the current position, in seconds.
    Relative( f64 ),
}


impl SeekTarget {
    /// Resolves the target against a known duration.
    ///
    /// @returns None if the target is not a finite number
    pub fn resolve( self, current: Duration, duration: Duration ) -> Option<Duration> {
        let secs = match self {
            SeekTarget::Fraction( f ) => duration.as_secs_f64() * f.clamp( 0.0, 1.0 ),
            SeekTarget::Absolute( d ) => d.as_secs_f64(),
            SeekTarget::Relative( delta ) => current.as_secs_f64() + delta,
        };
        if !secs.is_finite() {
            return None;
        }
        Some( Duration::from_secs_f64( secs.clamp( 0.0, duration.as_secs_f64() ) ) )
    }
}


/// Formats a duration as `M:SS`.
pub fn format_time( d: Duration ) -> String {
    let secs = d.as_secs();
    format!( "{}:{:02}", secs / 60, secs % 60 )
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_seek_fraction() {
        let to = SeekTarget::Fraction( 0.5 ).resolve( Duration::ZERO, Duration::from_secs( 200 ) );
        assert_eq!( to, Some( Duration::from_secs( 100 ) ) );

        let to = SeekTarget::Fraction( 3.0 ).resolve( Duration::ZERO, Duration::from_secs( 200 ) );
        assert_eq!( to, Some( Duration::from_secs( 200 ) ) );
    }


    #[test]
    fn test_seek_absolute_clamped() {
        let to = SeekTarget::Absolute( Duration::from_secs( 500 ) )
            .resolve( Duration::ZERO, Duration::from_secs( 90 ) );
        assert_eq!( to, Some( Duration::from_secs( 90 ) ) );
    }


    #[test]
    fn test_seek_relative() {
        let duration = Duration::from_secs( 60 );
        assert_eq!(
            SeekTarget::Relative( 5.0 ).resolve( Duration::from_secs( 10 ), duration ),
            Some( Duration::from_secs( 15 ) )
        );
        assert_eq!(
            SeekTarget::Relative( -30.0 ).resolve( Duration::from_secs( 10 ), duration ),
            Some( Duration::ZERO )
        );
    }


    #[test]
    fn test_seek_non_finite_ignored() {
        let duration = Duration::from_secs( 100 );
        let current = Duration::from_secs( 10 );
        assert_eq!( SeekTarget::Fraction( f64::NAN ).resolve( current, duration ), None );
        assert_eq!( SeekTarget::Relative( f64::NAN ).resolve( current, duration ), None );
        assert_eq!( SeekTarget::Relative( f64::INFINITY ).resolve( current, duration ), None );
        assert_eq!(
            SeekTarget::Relative( 1e300 ).resolve( current, duration ),
            Some( duration )
        );
    }


    #[test]
    fn test_format_time() {
        assert_eq!( format_time( Duration::from_secs( 0 ) ), "0:00" );
        assert_eq!( format_time( Duration::from_secs( 65 ) ), "1:05" );
        assert_eq!( format_time( Duration::from_secs( 3600 ) ), "60:00" );
    }
}
