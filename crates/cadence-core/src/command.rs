//! Slash command parsing and execution.
//!
//! Commands are parsed from the TUI command line. Playback commands
//! run directly against a [`Player`]; the rest (search, reload, help,
//! quit, recommendations) are left to the caller.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::media::{ MediaResource, SeekTarget };
use crate::player::Player;
use crate::track::TrackId;


/// Errors that can occur during command parsing or execution.
#[derive( Debug, Error )]
pub enum CommandError {
    #[error( "Unknown command: {0}" )]
    Unknown( String ),

    #[error( "Invalid argument: {0}" )]
    InvalidArgument( String ),

    #[error( "Missing argument: {0}" )]
    MissingArgument( String ),

    #[error( "Execution failed: {0}" )]
    ExecutionFailed( String ),
}


/// Parsed slash command.
#[derive( Debug, Clone, PartialEq )]
pub enum Command {
    // Queue commands
    Play { id: TrackId },
    Playlist { name: String },
    Add { id: TrackId },
    /// Zero-based queue position.
    Remove { index: usize },
    Clear,
    Reorder { ids: Vec<TrackId> },
    Arrange { playlist: String, ids: Vec<TrackId> },
    Shuffle { on: Option<bool> },
    Repeat { on: Option<bool> },

    // Playback commands
    Pause,
    Stop,
    Next,
    Prev,
    Seek { target: SeekTarget },
    Volume { level: Option<u32> },

    // UI commands
    Search { term: String },
    Recommend { count: Option<usize> },
    Reload,
    Help,
    Quit,
}


/// On/off switch argument.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct Toggle( pub bool );


impl FromStr for Toggle {
    type Err = CommandError;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" | "1" | "yes" => Ok( Toggle( true ) ),
            "off" | "0" | "no" => Ok( Toggle( false ) ),
            _ => Err( CommandError::InvalidArgument(
                format!( "Invalid switch: '{}'. Use 'on' or 'off'", s )
            )),
        }
    }
}


impl Command {
    /// Parses a command string (without the leading `/`).
    ///
    /// @param input - The command string to parse
    ///
    /// @returns The parsed command or an error
    pub fn parse( input: &str ) -> Result<Self, CommandError> {
        let input = input.trim();
        let mut parts = input.splitn( 2, ' ' );
        let cmd = parts.next().unwrap_or( "" ).to_lowercase();
        let args = parts.next().map( |s| s.trim() ).filter( |s| !s.is_empty() );

        match cmd.as_str() {
            // Queue commands
            "play" | "p" => {
                let id = args.ok_or_else( || CommandError::MissingArgument( "track id".into() ) )?;
                Ok( Command::Play { id: parse_id( id )? } )
            }
            "playlist" | "pl" => {
                let name = args
                    .ok_or_else( || CommandError::MissingArgument( "playlist name".into() ) )?;
                Ok( Command::Playlist { name: name.to_string() } )
            }
            "add" | "a" => {
                let id = args.ok_or_else( || CommandError::MissingArgument( "track id".into() ) )?;
                Ok( Command::Add { id: parse_id( id )? } )
            }
            "remove" | "rm" | "del" => {
                let pos = args.ok_or_else( || CommandError::MissingArgument( "queue position".into() ) )?;
                let pos: usize = pos.parse()
                    .map_err( |_| CommandError::InvalidArgument( format!( "Invalid position: {}", pos ) ) )?;
                if pos == 0 {
                    return Err( CommandError::InvalidArgument( "Positions start at 1".into() ) );
                }
                Ok( Command::Remove { index: pos - 1 } )
            }
            "clear" | "cl" => Ok( Command::Clear ),
            "reorder" | "ro" => {
                let list = args.ok_or_else( || CommandError::MissingArgument( "track ids".into() ) )?;
                Ok( Command::Reorder { ids: parse_id_list( list )? } )
            }
            "arrange" => {
                let args = args
                    .ok_or_else( || CommandError::MissingArgument( "playlist name".into() ) )?;
                let ( playlist, list ) = args
                    .rsplit_once( ' ' )
                    .ok_or_else( || CommandError::MissingArgument( "track ids".into() ) )?;
                Ok( Command::Arrange {
                    playlist: playlist.trim().to_string(),
                    ids: parse_id_list( list )?,
                })
            }
            "shuffle" | "sh" => {
                let on = args.map( |s| s.parse::<Toggle>() ).transpose()?;
                Ok( Command::Shuffle { on: on.map( |t| t.0 ) } )
            }
            "repeat" | "rep" => {
                let on = args.map( |s| s.parse::<Toggle>() ).transpose()?;
                Ok( Command::Repeat { on: on.map( |t| t.0 ) } )
            }

            // Playback commands
            "pause" | "pa" => Ok( Command::Pause ),
            "stop" | "st" => Ok( Command::Stop ),
            "next" | "n" => Ok( Command::Next ),
            "prev" | "previous" | "pr" => Ok( Command::Prev ),
            "seek" | "sk" => {
                let target = args
                    .ok_or_else( || CommandError::MissingArgument( "time position".into() ) )?;
                Ok( Command::Seek { target: parse_seek( target )? } )
            }
            "vol" | "volume" => {
                let level = args.and_then( |s| s.parse().ok() );
                Ok( Command::Volume { level } )
            }

            // UI commands
            "search" | "find" | "?" => {
                let term = args
                    .ok_or_else( || CommandError::MissingArgument( "search term".into() ) )?;
                Ok( Command::Search { term: term.to_string() } )
            }
            "recommend" | "rec" => {
                let count = args.map( |s| s.parse::<usize>() ).transpose()
                    .map_err( |_| CommandError::InvalidArgument( "count must be a number".into() ) )?;
                Ok( Command::Recommend { count } )
            }
            "reload" => Ok( Command::Reload ),
            "help" | "h" => Ok( Command::Help ),
            "quit" | "q" | "exit" => Ok( Command::Quit ),

            "" => Err( CommandError::Unknown( "empty command".into() ) ),
            other => Err( CommandError::Unknown( other.to_string() ) ),
        }
    }


    /// Runs a playback command against `player`.
    ///
    /// Returns a status message, or `Ok( None )` for UI commands the
    /// caller has to handle itself.
    pub fn execute<M: MediaResource>( &self, player: &mut Player<M> ) -> Result<Option<String>, CommandError> {
        let message = match self {
            Command::Play { id } => {
                if !player.play_track( *id ) {
                    return Err( CommandError::ExecutionFailed( format!( "No track with id {}", id ) ) );
                }
                format!( "Playing track {}", id )
            }
            Command::Playlist { name } => {
                if !player.play_playlist( name ) {
                    return Err( CommandError::ExecutionFailed( format!( "No playlist named '{}'", name ) ) );
                }
                format!( "Playing playlist '{}'", name )
            }
            Command::Add { id } => {
                if !player.enqueue( *id ) {
                    return Err( CommandError::ExecutionFailed( format!( "No track with id {}", id ) ) );
                }
                format!( "Queued track {}", id )
            }
            Command::Remove { index } => {
                if !player.remove_at( *index ) {
                    return Err( CommandError::ExecutionFailed(
                        format!( "Queue has no position {}", index + 1 )
                    ));
                }
                format!( "Removed position {}", index + 1 )
            }
            Command::Clear => {
                player.clear_queue();
                "Queue cleared".to_string()
            }
            Command::Reorder { ids } => {
                if player.reorder_queue( ids ) {
                    "Queue reordered".to_string()
                } else {
                    "Queue unchanged".to_string()
                }
            }
            Command::Arrange { playlist, ids } => {
                if !player.rearrange_playlist( playlist, ids ) {
                    return Err( CommandError::ExecutionFailed( format!( "No playlist named '{}'", playlist ) ) );
                }
                format!( "Saved order of '{}'", playlist )
            }
            Command::Shuffle { on } => {
                let on = on.unwrap_or( !player.queue().shuffle() );
                player.set_shuffle( on );
                format!( "Shuffle {}", if on { "on" } else { "off" } )
            }
            Command::Repeat { on } => {
                let on = on.unwrap_or( !player.queue().repeat() );
                player.set_repeat( on );
                format!( "Repeat {}", if on { "on" } else { "off" } )
            }
            Command::Pause => {
                if !player.toggle_pause() {
                    return Err( CommandError::ExecutionFailed( "Nothing is playing".into() ) );
                }
                "Toggled pause".to_string()
            }
            Command::Stop => {
                player.stop();
                "Stopped".to_string()
            }
            Command::Next => {
                if player.next() { "Next track".to_string() } else { "End of queue".to_string() }
            }
            Command::Prev => {
                if player.previous() { "Previous track".to_string() } else { "Start of queue".to_string() }
            }
            Command::Seek { target } => {
                if !player.seek( *target ) {
                    return Err( CommandError::ExecutionFailed( "Cannot seek right now".into() ) );
                }
                "Seeked".to_string()
            }
            Command::Volume { level } => match level {
                Some( level ) => {
                    let level = ( *level ).min( 100 );
                    player.set_volume( level as f32 / 100.0 );
                    format!( "Volume: {}%", level )
                }
                None => format!( "Volume: {}%", ( player.volume() * 100.0 ).round() as u32 ),
            },
            Command::Search { .. }
            | Command::Recommend { .. }
            | Command::Reload
            | Command::Help
            | Command::Quit => return Ok( None ),
        };
        Ok( Some( message ) )
    }


    /// Returns a brief description of the command for help text.
    pub fn description( &self ) -> &'static str {
        match self {
            Command::Play { .. } => "Play track within its playlist",
            Command::Playlist { .. } => "Play playlist from the start",
            Command::Add { .. } => "Add track to queue",
            Command::Remove { .. } => "Remove track from queue",
            Command::Clear => "Clear queue",
            Command::Reorder { .. } => "Reorder queue",
            Command::Arrange { .. } => "Save a playlist order",
            Command::Shuffle { .. } => "Set shuffle",
            Command::Repeat { .. } => "Set repeat",
            Command::Pause => "Toggle pause",
            Command::Stop => "Stop playback",
            Command::Next => "Next track",
            Command::Prev => "Previous track",
            Command::Seek { .. } => "Seek to position",
            Command::Volume { .. } => "Set volume (0-100)",
            Command::Search { .. } => "Search/filter",
            Command::Recommend { .. } => "Show recommendations",
            Command::Reload => "Reload catalog",
            Command::Help => "Show help",
            Command::Quit => "Quit application",
        }
    }
}


fn parse_id( s: &str ) -> Result<TrackId, CommandError> {
    s.trim().parse()
        .map_err( |_| CommandError::InvalidArgument( format!( "Invalid track id: {}", s ) ) )
}


fn parse_id_list( s: &str ) -> Result<Vec<TrackId>, CommandError> {
    s.split( ',' )
        .map( str::trim )
        .filter( |part| !part.is_empty() )
        .map( parse_id )
        .collect()
}


/// Parses a seek argument.
///
/// @param s - "M:SS" or seconds for an absolute position, "NN%" for a
/// fraction of the track, "+N"/"-N" for a relative jump in seconds
///
/// @returns SeekTarget or error
fn parse_seek( s: &str ) -> Result<SeekTarget, CommandError> {
    let s = s.trim();

    if let Some( percent ) = s.strip_suffix( '%' ) {
        let percent: f64 = percent.trim().parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid percentage: {}", s ) ) )?;
        if !percent.is_finite() {
            return Err( CommandError::InvalidArgument( format!( "Invalid percentage: {}", s ) ) );
        }
        return Ok( SeekTarget::Fraction( percent / 100.0 ) );
    }

    if s.starts_with( '+' ) || s.starts_with( '-' ) {
        let delta: f64 = s.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid offset: {}", s ) ) )?;
        if !delta.is_finite() {
            return Err( CommandError::InvalidArgument( format!( "Invalid offset: {}", s ) ) );
        }
        return Ok( SeekTarget::Relative( delta ) );
    }

    parse_time( s ).map( SeekTarget::Absolute )
}


/// Parses a time string like "1:30" or "90" into a Duration.
fn parse_time( s: &str ) -> Result<Duration, CommandError> {
    if let Some(( min, sec )) = s.split_once( ':' ) {
        let minutes: u64 = min.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid minutes: {}", min ) ) )?;
        let seconds: u64 = sec.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid seconds: {}", sec ) ) )?;
        minutes
            .checked_mul( 60 )
            .and_then( |m| m.checked_add( seconds ) )
            .map( Duration::from_secs )
            .ok_or_else( || CommandError::InvalidArgument( format!( "Time out of range: {}", s ) ) )
    } else {
        let seconds: u64 = s.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid time: {}", s ) ) )?;
        Ok( Duration::from_secs( seconds ) )
    }
}


/// Returns help text listing all available commands.
pub fn help_text() -> &'static str {
    r#"Queue Commands:
  /play <id>             Play track within its playlist  [Enter]
  /playlist <name>       Play a whole playlist
  /add <id>              Add track to queue              [a]
  /remove <n>            Remove queue position n         [d]
  /clear                 Clear queue, keep current       [c]
  /reorder <id,id,..>    Reorder queue                   [J/K]
  /arrange <name> <ids>  Save a playlist order
  /shuffle [on|off]      Toggle shuffle                  [z]
  /repeat [on|off]       Toggle repeat                   [r]

Playback Commands:
  /pause                 Toggle pause                    [Space]
  /stop                  Stop and empty queue            [s]
  /next                  Next track                      [n]
  /prev                  Previous track                  [p]
  /seek <pos>            1:30, 90, 50%, +10 or -10       [,/.]
  /vol [0-100]           Set volume                      [+/-]

Other Commands:
  /search <term>         Filter the library
  /recommend [n]         Suggest tracks
  /reload                Reload the catalog
  /help                  Show this help                  [?]
  /quit                  Exit cadence                    [q]"#
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use crate::catalog::Catalog;
    use crate::media::LoadToken;


    #[derive( Default )]
    struct SilentMedia;


    impl MediaResource for SilentMedia {
        fn set_source( &mut self, _url: &str ) {}
        fn clear_source( &mut self ) {}
        fn load( &mut self, _token: LoadToken ) {}
        fn play( &mut self ) {}
        fn pause( &mut self ) {}
        fn current_time( &self ) -> Duration { Duration::ZERO }
        fn set_current_time( &mut self, _position: Duration ) {}
        fn duration( &self ) -> Option<Duration> { None }
        fn set_volume( &mut self, _volume: f32 ) {}
    }


    fn player() -> Player<SilentMedia> {
        let catalog = Catalog::new( vec![
            track( 1, "X", "Mix", 0 ),
            track( 2, "Y", "Mix", 1 ),
            track( 3, "Z", "Late Night", 0 ),
        ]);
        Player::new( SilentMedia, catalog )
    }


    #[test]
    fn test_parse_play() {
        assert_eq!( Command::parse( "play 12" ).unwrap(), Command::Play { id: 12 } );
        assert_eq!( Command::parse( "p 3" ).unwrap(), Command::Play { id: 3 } );
    }


    #[test]
    fn test_parse_play_bad_id() {
        let result = Command::parse( "play abc" );
        assert!( matches!( result, Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_remove_is_one_based() {
        assert_eq!( Command::parse( "rm 2" ).unwrap(), Command::Remove { index: 1 } );
        assert!( matches!( Command::parse( "rm 0" ), Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_reorder() {
        let cmd = Command::parse( "reorder 3, 1,2" ).unwrap();
        assert_eq!( cmd, Command::Reorder { ids: vec![ 3, 1, 2 ] } );
    }


    #[test]
    fn test_parse_arrange_with_spaced_name() {
        let cmd = Command::parse( "arrange Late Night 3,1" ).unwrap();
        assert_eq!( cmd, Command::Arrange { playlist: "Late Night".into(), ids: vec![ 3, 1 ] } );
    }


    #[test]
    fn test_parse_seek_forms() {
        assert_eq!(
            Command::parse( "seek 1:30" ).unwrap(),
            Command::Seek { target: SeekTarget::Absolute( Duration::from_secs( 90 ) ) }
        );
        assert_eq!(
            Command::parse( "sk 45" ).unwrap(),
            Command::Seek { target: SeekTarget::Absolute( Duration::from_secs( 45 ) ) }
        );
        assert_eq!(
            Command::parse( "seek 25%" ).unwrap(),
            Command::Seek { target: SeekTarget::Fraction( 0.25 ) }
        );
        assert_eq!(
            Command::parse( "seek -10" ).unwrap(),
            Command::Seek { target: SeekTarget::Relative( -10.0 ) }
        );
    }


    #[test]
    fn test_parse_seek_rejects_non_finite() {
        for input in [ "seek nan%", "seek -nan", "seek +inf", "seek -infinity", "seek inf%" ] {
            assert!(
                matches!( Command::parse( input ), Err( CommandError::InvalidArgument( _ ) ) ),
                "{} should be rejected",
                input
            );
        }
    }


    #[test]
    fn test_parse_seek_time_overflow() {
        assert!( matches!(
            Command::parse( "seek 999999999999999999:00" ),
            Err( CommandError::InvalidArgument( _ ) )
        ));
        assert!( matches!(
            Command::parse( "seek 307445734561825860:59" ),
            Err( CommandError::InvalidArgument( _ ) )
        ));
    }


    #[test]
    fn test_parse_toggles() {
        assert_eq!( Command::parse( "shuffle" ).unwrap(), Command::Shuffle { on: None } );
        assert_eq!( Command::parse( "rep on" ).unwrap(), Command::Repeat { on: Some( true ) } );
        assert!( matches!( Command::parse( "shuffle maybe" ), Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_unknown() {
        let result = Command::parse( "foobar" );
        assert!( matches!( result, Err( CommandError::Unknown( _ ) ) ) );
    }


    #[test]
    fn test_parse_missing_arg() {
        let result = Command::parse( "add" );
        assert!( matches!( result, Err( CommandError::MissingArgument( _ ) ) ) );
    }


    #[test]
    fn test_execute_play_and_add() {
        let mut player = player();
        let message = Command::Play { id: 2 }.execute( &mut player ).unwrap();
        assert_eq!( message.as_deref(), Some( "Playing track 2" ) );

        Command::Add { id: 3 }.execute( &mut player ).unwrap();
        assert_eq!( player.queue().ids(), vec![ 1, 2, 3 ] );
    }


    #[test]
    fn test_execute_unknown_track_fails() {
        let mut player = player();
        let result = Command::Play { id: 9 }.execute( &mut player );
        assert!( matches!( result, Err( CommandError::ExecutionFailed( _ ) ) ) );
    }


    #[test]
    fn test_execute_toggles_flip_current_mode() {
        let mut player = player();
        Command::Shuffle { on: None }.execute( &mut player ).unwrap();
        assert!( player.queue().shuffle() );
        Command::Repeat { on: Some( false ) }.execute( &mut player ).unwrap();
        assert!( !player.queue().repeat() );
    }


    #[test]
    fn test_execute_volume_capped() {
        let mut player = player();
        let message = Command::Volume { level: Some( 150 ) }.execute( &mut player ).unwrap();
        assert_eq!( message.as_deref(), Some( "Volume: 100%" ) );
        assert_eq!( player.volume(), 1.0 );
    }


    #[test]
    fn test_execute_leaves_ui_commands_to_caller() {
        let mut player = player();
        assert_eq!( Command::Help.execute( &mut player ).unwrap(), None );
        assert_eq!( Command::Reload.execute( &mut player ).unwrap(), None );
    }
}
