//! Cadence CLI - Terminal UI music queue and player

mod browser;
mod cli;
mod input;
mod logging;
mod media;
mod settings;
mod store;
mod view;

use std::io;
use std::sync::mpsc;
use std::time::{ Duration, Instant };

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{ self, Event, KeyCode, KeyEventKind, KeyModifiers },
    terminal::{ disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen },
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{ Block, Borders, List, ListItem, ListState, Paragraph, Wrap },
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{ unbounded_channel, UnboundedReceiver };

use browser::{ EntryKind, LibraryBrowser };
use cli::Args;
use input::{ CommandLine, InputMode };
use media::SimulatedMedia;
use settings::Settings;
use store::{ OrderStore, StoreFailure };
use view::ViewMode;

use cadence_core::{
    command, format_time, library, Catalog, Command, Library, LibraryError, MediaSignal,
    PlaybackState, Player, PlayerEvent, SeekTarget, Track, TrackId,
};


/// Seconds skipped by the seek keys.
const SEEK_STEP: f64 = 5.0;

const VOLUME_STEP: f32 = 0.05;


/// Application state.
struct App {
    player: Player<SimulatedMedia>,
    library: Library,
    should_quit: bool,

    // Channels feeding the UI thread
    signals: UnboundedReceiver<MediaSignal>,
    store_failures: UnboundedReceiver<StoreFailure>,
    player_events: mpsc::Receiver<PlayerEvent>,

    // View state
    view_mode: ViewMode,
    queue_state: ListState,
    browser: LibraryBrowser,
    discover_state: ListState,
    recommendations: Vec<Track>,

    // Flag to scroll to playing track without changing selection
    scroll_to_playing: bool,

    // Input state
    input_mode: InputMode,
    command_line: CommandLine,

    // Help view scroll offset
    help_scroll: u16,

    // Status message (shown in status bar)
    status_message: Option<String>,
    status_clear_at: Option<Instant>,

    settings: Settings,
}


impl App {
    /// Creates a new App instance.
    fn new( args: &Args, runtime: Handle ) -> Result<Self> {
        let settings = Settings::load();

        let catalog_path = args.catalog.clone().unwrap_or_else( settings::default_catalog_path );
        let library = Library::new( catalog_path );

        if let Some( dir ) = &args.index {
            let tracks = library::index_directory( dir )?;
            library.save( &tracks )?;
            tracing::info!( "Indexed {} tracks from {:?} into {:?}", tracks.len(), dir, library.path() );
        }

        let mut status = None;
        let catalog = match Catalog::fetch( &library ) {
            Ok( catalog ) => catalog,
            Err( LibraryError::NotFound( path ) ) => {
                status = Some( format!( "No catalog at {} (use --index <dir>)", path.display() ) );
                Catalog::default()
            }
            Err( e ) => return Err( e.into() ),
        };

        let ( signal_tx, signals ) = unbounded_channel();
        let ( failure_tx, store_failures ) = unbounded_channel();
        let ( event_tx, player_events ) = mpsc::channel();

        let media = SimulatedMedia::new(
            runtime.clone(),
            signal_tx,
            settings.track_length(),
            settings.load_latency(),
        );
        let store = OrderStore::new( runtime, library.clone(), failure_tx );

        let mut player = Player::new( media, catalog.clone() )
            .with_history( settings::load_history() )
            .with_persistence( Box::new( store ) );

        // Snapshots are pulled when drawing; only discrete events are forwarded
        player.subscribe( move |event| {
            if !matches!( event, PlayerEvent::Updated( _ ) ) {
                let _ = event_tx.send( event.clone() );
            }
        });

        player.set_shuffle( settings.shuffle || args.shuffle );
        player.set_repeat( settings.repeat || args.repeat );
        player.set_volume( settings.volume );

        let mut app = Self {
            player,
            library,
            should_quit: false,
            signals,
            store_failures,
            player_events,
            view_mode: ViewMode::default(),
            queue_state: ListState::default(),
            browser: LibraryBrowser::new( catalog ),
            discover_state: ListState::default(),
            recommendations: Vec::new(),
            scroll_to_playing: false,
            input_mode: InputMode::Normal,
            command_line: CommandLine::new(),
            help_scroll: 0,
            status_message: None,
            status_clear_at: None,
            settings,
        };

        if let Some( msg ) = status {
            app.set_status( msg );
        }

        if let Some( name ) = &args.playlist {
            if !app.player.play_playlist( name ) {
                app.set_status( format!( "No playlist named '{}'", name ) );
            }
        }

        Ok( app )
    }


    /// Sets a status message that auto-clears after a delay.
    fn set_status( &mut self, msg: impl Into<String> ) {
        self.status_message = Some( msg.into() );
        self.status_clear_at = Some( Instant::now() + Duration::from_secs( 3 ) );
    }


    /// Updates app state (clears expired messages, feeds media signals to the player).
    fn tick( &mut self ) {
        // Clear expired status messages
        if let Some( clear_at ) = self.status_clear_at {
            if Instant::now() >= clear_at {
                self.status_message = None;
                self.status_clear_at = None;
            }
        }

        while let Ok( signal ) = self.signals.try_recv() {
            self.player.handle_signal( signal );
        }

        while let Ok( event ) = self.player_events.try_recv() {
            match event {
                PlayerEvent::TrackStarted { track } => {
                    self.scroll_to_playing = true;
                    self.set_status( format!( "Playing: {}", track.label() ) );
                }
                PlayerEvent::Skipping { track, message } => {
                    self.set_status( format!( "Skipping {}: {}", track.label(), message ) );
                }
                PlayerEvent::QueueExhausted => {
                    self.set_status( "End of queue" );
                }
                PlayerEvent::TrackFinished { .. } | PlayerEvent::Updated( _ ) => {}
            }
        }

        while let Ok( failure ) = self.store_failures.try_recv() {
            self.set_status( format!( "Could not save order of '{}': {}", failure.playlist, failure.message ) );
            self.reload_catalog();
        }
    }


    /// Re-reads the catalog file into the player and browser.
    fn reload_catalog( &mut self ) {
        match Catalog::fetch( &self.library ) {
            Ok( catalog ) => {
                self.browser.set_catalog( catalog.clone() );
                self.player.replace_catalog( catalog );
            }
            Err( e ) => {
                tracing::warn!( "Catalog reload failed: {}", e );
                self.set_status( format!( "Reload failed: {}", e ) );
            }
        }
    }


    fn refresh_recommendations( &mut self, count: usize ) {
        self.recommendations = self.player.recommendations( count );
        self.discover_state.select( if self.recommendations.is_empty() { None } else { Some( 0 ) } );
    }


    fn set_view( &mut self, view: ViewMode ) {
        self.view_mode = view;
        if view == ViewMode::Discover {
            self.refresh_recommendations( self.settings.recommendations );
        }
    }


    fn handle_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key( code, modifiers ),
            InputMode::Command => self.handle_command_key( code ),
            InputMode::Search => self.handle_search_key( code ),
        }
    }


    fn handle_normal_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        if self.view_mode == ViewMode::Help {
            self.handle_help_key( code );
            return;
        }

        // Global keys (work in any view)
        match code {
            KeyCode::Char( '/' ) => {
                self.input_mode = InputMode::Command;
                self.command_line.clear();
                return;
            }
            KeyCode::Tab => {
                self.set_view( self.view_mode.next_tab() );
                return;
            }
            KeyCode::BackTab => {
                self.set_view( self.view_mode.prev_tab() );
                return;
            }
            KeyCode::Char( '?' ) => {
                self.view_mode = ViewMode::Help;
                return;
            }
            KeyCode::Char( 'q' ) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char( ' ' ) => {
                self.player.toggle_pause();
                return;
            }
            KeyCode::Char( 'n' ) => {
                self.player.next();
                return;
            }
            KeyCode::Char( 'p' ) => {
                self.player.previous();
                return;
            }
            KeyCode::Char( 's' ) => {
                self.player.stop();
                self.queue_state.select( None );
                return;
            }
            KeyCode::Char( 'z' ) => {
                let on = self.player.toggle_shuffle();
                self.set_status( if on { "Shuffle on" } else { "Shuffle off" } );
                return;
            }
            KeyCode::Char( 'r' ) => {
                let on = self.player.toggle_repeat();
                self.set_status( if on { "Repeat on" } else { "Repeat off" } );
                return;
            }
            KeyCode::Char( '+' ) | KeyCode::Char( '=' ) => {
                self.player.set_volume( self.player.volume() + VOLUME_STEP );
                return;
            }
            KeyCode::Char( '-' ) => {
                self.player.set_volume( self.player.volume() - VOLUME_STEP );
                return;
            }
            KeyCode::Char( ',' ) => {
                self.player.seek( SeekTarget::Relative( -SEEK_STEP ) );
                return;
            }
            KeyCode::Char( '.' ) => {
                self.player.seek( SeekTarget::Relative( SEEK_STEP ) );
                return;
            }
            KeyCode::Left if modifiers.contains( KeyModifiers::CONTROL ) => {
                self.player.seek( SeekTarget::Relative( -2.0 * SEEK_STEP ) );
                return;
            }
            KeyCode::Right if modifiers.contains( KeyModifiers::CONTROL ) => {
                self.player.seek( SeekTarget::Relative( 2.0 * SEEK_STEP ) );
                return;
            }
            _ => {}
        }

        // View-specific keys
        match self.view_mode {
            ViewMode::Queue => self.handle_queue_key( code ),
            ViewMode::Library => self.handle_library_key( code ),
            ViewMode::Discover => self.handle_discover_key( code ),
            ViewMode::Help => {}
        }
    }


    fn handle_queue_key( &mut self, code: KeyCode ) {
        let len = self.player.queue().len();
        match code {
            KeyCode::Up | KeyCode::Char( 'k' ) => select_previous( &mut self.queue_state, len ),
            KeyCode::Down | KeyCode::Char( 'j' ) => select_next( &mut self.queue_state, len ),
            KeyCode::Home | KeyCode::Char( 'g' ) if len > 0 => self.queue_state.select( Some( 0 ) ),
            KeyCode::End | KeyCode::Char( 'G' ) if len > 0 => self.queue_state.select( Some( len - 1 ) ),
            KeyCode::Enter => {
                let id = self.selected_queue_track().map( |t| t.id );
                if let Some( id ) = id {
                    self.player.play_track( id );
                }
            }
            KeyCode::Char( 'd' ) | KeyCode::Delete => {
                if let Some( idx ) = self.queue_state.selected() {
                    if self.player.remove_at( idx ) {
                        let len = self.player.queue().len();
                        self.queue_state.select( if len == 0 { None } else { Some( idx.min( len - 1 ) ) } );
                        self.set_status( "Removed from queue" );
                    }
                }
            }
            KeyCode::Char( 'c' ) => {
                self.player.clear_queue();
                self.queue_state.select( self.player.queue().current_index() );
                self.set_status( "Queue cleared" );
            }
            KeyCode::Char( 'J' ) => self.move_queue_track( 1 ),
            KeyCode::Char( 'K' ) => self.move_queue_track( -1 ),
            _ => {}
        }
    }


    fn handle_library_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Up | KeyCode::Char( 'k' ) => self.browser.select_previous(),
            KeyCode::Down | KeyCode::Char( 'j' ) => self.browser.select_next(),
            KeyCode::Home | KeyCode::Char( 'g' ) => self.browser.select_first(),
            KeyCode::End | KeyCode::Char( 'G' ) => self.browser.select_last(),
            KeyCode::Enter => {
                if let Some( track ) = self.browser.enter_selected() {
                    self.player.play_track( track.id );
                }
            }
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char( 'h' ) => self.browser.go_up(),
            KeyCode::Char( 'a' ) => {
                if let Some( track ) = self.browser.selected_track().cloned() {
                    if self.player.enqueue( track.id ) {
                        self.set_status( format!( "Queued: {}", track.label() ) );
                    }
                }
            }
            KeyCode::Char( 'P' ) => {
                if let Some( name ) = self.browser.selected_playlist().map( str::to_string ) {
                    self.player.play_playlist( &name );
                }
            }
            KeyCode::Char( 'f' ) => {
                self.input_mode = InputMode::Search;
                self.command_line.clear();
            }
            KeyCode::Esc if !self.browser.filter().is_empty() => self.browser.clear_filter(),
            KeyCode::Char( 'R' ) => {
                self.reload_catalog();
                self.set_status( "Catalog reloaded" );
            }
            KeyCode::Char( 'J' ) => self.move_playlist_track( 1 ),
            KeyCode::Char( 'K' ) => self.move_playlist_track( -1 ),
            _ => {}
        }
    }


    fn handle_discover_key( &mut self, code: KeyCode ) {
        let len = self.recommendations.len();
        match code {
            KeyCode::Up | KeyCode::Char( 'k' ) => select_previous( &mut self.discover_state, len ),
            KeyCode::Down | KeyCode::Char( 'j' ) => select_next( &mut self.discover_state, len ),
            KeyCode::Enter => {
                if let Some( id ) = self.selected_recommendation() {
                    self.player.play_track( id );
                }
            }
            KeyCode::Char( 'a' ) => {
                if let Some( id ) = self.selected_recommendation() {
                    self.player.enqueue( id );
                    self.set_status( "Added to queue" );
                }
            }
            KeyCode::Char( 'u' ) => self.refresh_recommendations( self.settings.recommendations ),
            _ => {}
        }
    }


    fn handle_help_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Esc | KeyCode::Char( '?' ) | KeyCode::Char( 'q' ) => {
                self.view_mode = ViewMode::Queue;
                self.help_scroll = 0;
            }
            KeyCode::Up | KeyCode::Char( 'k' ) => {
                self.help_scroll = self.help_scroll.saturating_sub( 1 );
            }
            KeyCode::Down | KeyCode::Char( 'j' ) => {
                self.help_scroll = self.help_scroll.saturating_add( 1 );
            }
            KeyCode::PageUp => {
                self.help_scroll = self.help_scroll.saturating_sub( 10 );
            }
            KeyCode::PageDown => {
                self.help_scroll = self.help_scroll.saturating_add( 10 );
            }
            _ => {}
        }
    }


    fn handle_command_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter => {
                let input = self.command_line.submit();
                self.input_mode = InputMode::Normal;
                self.execute_command( &input );
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.command_line.clear();
            }
            KeyCode::Backspace => {
                if self.command_line.is_empty() {
                    self.input_mode = InputMode::Normal;
                } else {
                    self.command_line.backspace();
                }
            }
            KeyCode::Delete => self.command_line.delete(),
            KeyCode::Left => self.command_line.move_left(),
            KeyCode::Right => self.command_line.move_right(),
            KeyCode::Home => self.command_line.move_home(),
            KeyCode::End => self.command_line.move_end(),
            KeyCode::Up => self.command_line.recall_previous(),
            KeyCode::Down => self.command_line.recall_next(),
            KeyCode::Char( c ) => self.command_line.insert( c ),
            _ => {}
        }
    }


    fn handle_search_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                if code == KeyCode::Esc {
                    self.browser.clear_filter();
                }
                self.command_line.clear();
            }
            KeyCode::Backspace => {
                self.command_line.backspace();
                self.browser.set_filter( self.command_line.content().to_string() );
            }
            KeyCode::Char( c ) => {
                self.command_line.insert( c );
                self.browser.set_filter( self.command_line.content().to_string() );
            }
            _ => {}
        }
    }


    fn execute_command( &mut self, input: &str ) {
        let cmd = match Command::parse( input ) {
            Ok( cmd ) => cmd,
            Err( e ) => {
                self.set_status( e.to_string() );
                return;
            }
        };

        match cmd.execute( &mut self.player ) {
            Ok( Some( msg ) ) => {
                if matches!( cmd, Command::Arrange { .. } ) {
                    self.browser.set_catalog( self.player.catalog().clone() );
                }
                if matches!( cmd, Command::Stop ) {
                    self.queue_state.select( None );
                }
                self.set_status( msg );
            }
            Ok( None ) => self.run_ui_command( cmd ),
            Err( e ) => self.set_status( format!( "Error: {}", e ) ),
        }
    }


    /// Handles commands that only touch the front end.
    fn run_ui_command( &mut self, cmd: Command ) {
        match cmd {
            Command::Search { term } => {
                self.view_mode = ViewMode::Library;
                self.browser.set_filter( term );
            }
            Command::Recommend { count } => {
                self.view_mode = ViewMode::Discover;
                self.refresh_recommendations( count.unwrap_or( self.settings.recommendations ) );
            }
            Command::Reload => {
                self.reload_catalog();
                self.set_status( "Catalog reloaded" );
            }
            Command::Help => self.view_mode = ViewMode::Help,
            Command::Quit => self.should_quit = true,
            other => tracing::debug!( "Unhandled command {:?}", other ),
        }
    }


    fn selected_queue_track( &self ) -> Option<&Track> {
        self.queue_state.selected().and_then( |i| self.player.queue().tracks().get( i ) )
    }


    fn selected_recommendation( &self ) -> Option<TrackId> {
        self.discover_state.selected().and_then( |i| self.recommendations.get( i ) ).map( |t| t.id )
    }


    /// Moves the selected queue entry by `delta` places.
    fn move_queue_track( &mut self, delta: isize ) {
        let Some( idx ) = self.queue_state.selected() else {
            return;
        };
        let mut ids = self.player.queue().ids();
        let Some( target ) = swap_target( idx, delta, ids.len() ) else {
            return;
        };

        ids.swap( idx, target );
        if self.player.reorder_queue( &ids ) {
            self.queue_state.select( Some( target ) );
        }
    }


    /// Moves the selected track within its open playlist and saves the order.
    fn move_playlist_track( &mut self, delta: isize ) {
        let Some( playlist ) = self.browser.open_playlist().map( str::to_string ) else {
            return;
        };
        if !self.browser.filter().is_empty() {
            return;
        }

        let mut ids: Vec<TrackId> = self.browser
            .entries()
            .iter()
            .filter_map( |e| match &e.kind {
                EntryKind::Track( t ) => Some( t.id ),
                _ => None,
            })
            .collect();

        // Row 0 is the parent entry
        let Some( idx ) = self.browser.selected_index().checked_sub( 1 ) else {
            return;
        };
        let Some( target ) = swap_target( idx, delta, ids.len() ) else {
            return;
        };

        ids.swap( idx, target );
        if self.player.rearrange_playlist( &playlist, &ids ) {
            self.browser.set_catalog( self.player.catalog().clone() );
            if delta > 0 {
                self.browser.select_next();
            } else {
                self.browser.select_previous();
            }
        }
    }


    /// Saves settings and history for the next start.
    fn save_session( &mut self ) {
        self.settings.shuffle = self.player.queue().shuffle();
        self.settings.repeat = self.player.queue().repeat();
        self.settings.volume = self.player.volume();
        self.settings.save();
        settings::save_history( self.player.history() );
    }
}


/// Index to swap with when moving row `idx` by `delta`; None if either is out of range.
fn swap_target( idx: usize, delta: isize, len: usize ) -> Option<usize> {
    if idx >= len {
        return None;
    }
    idx.checked_add_signed( delta ).filter( |t| *t < len )
}


fn select_next( state: &mut ListState, len: usize ) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some( i ) if i + 1 < len => i + 1,
        _ => 0,
    };
    state.select( Some( i ) );
}


fn select_previous( state: &mut ListState, len: usize ) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some( 0 ) | None => len - 1,
        Some( i ) => ( i - 1 ).min( len - 1 ),
    };
    state.select( Some( i ) );
}


fn main() -> Result<()> {
    let args = Args::parse();

    if let Err( e ) = logging::init( &settings::data_dir().join( "logs" ) ) {
        eprintln!( "Logging disabled: {}", e );
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let mut app = App::new( &args, runtime.handle().clone() )?;

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute( EnterAlternateScreen )?;

    let mut terminal = Terminal::new( CrosstermBackend::new( io::stdout() ) )?;

    // Main loop
    let result = run( &mut terminal, &mut app );
    app.save_session();

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute( LeaveAlternateScreen )?;

    result
}


fn run( terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App ) -> Result<()> {
    loop {
        app.tick();

        terminal.draw( |frame| draw_ui( frame, app ) )?;

        // Handle events with timeout
        if event::poll( Duration::from_millis( 100 ) )? {
            if let Event::Key( key ) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key( key.code, key.modifiers );
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}


/// Draws the main UI.
fn draw_ui( frame: &mut Frame, app: &mut App ) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 2 ),  // Header
            Constraint::Min( 0 ),     // Main content
            Constraint::Length( 5 ),  // Now playing
            Constraint::Length( 1 ),  // Status bar
        ])
        .split( area );

    let header = Paragraph::new( format!( "  CADENCE - {}", app.view_mode.title() ) )
        .style( Style::default().fg( Color::Cyan ).bold() )
        .block( Block::default().borders( Borders::BOTTOM ) );
    frame.render_widget( header, chunks[ 0 ] );

    match app.view_mode {
        ViewMode::Queue => draw_queue( frame, app, chunks[ 1 ] ),
        ViewMode::Library => draw_library( frame, app, chunks[ 1 ] ),
        ViewMode::Discover => draw_discover( frame, app, chunks[ 1 ] ),
        ViewMode::Help => draw_help( frame, app, chunks[ 1 ] ),
    }

    draw_now_playing( frame, app, chunks[ 2 ] );
    draw_status_bar( frame, app, chunks[ 3 ] );
}


fn draw_queue( frame: &mut Frame, app: &mut App, area: Rect ) {
    let queue = app.player.queue();
    let playing_index = queue.current_index();

    // Handle scroll-to-playing without changing selection
    if app.scroll_to_playing {
        if let Some( playing_idx ) = playing_index {
            let visible_height = area.height.saturating_sub( 2 ) as usize;
            let offset = app.queue_state.offset();
            if visible_height > 0 && ( playing_idx < offset || playing_idx >= offset + visible_height ) {
                *app.queue_state.offset_mut() = playing_idx.saturating_sub( visible_height / 2 );
            }
        }
        app.scroll_to_playing = false;
    }

    let items: Vec<ListItem> = queue
        .tracks()
        .iter()
        .enumerate()
        .map( |( i, track )| {
            let prefix = if Some( i ) == playing_index { "▶ " } else { "  " };
            let line = format!( "{}{:>3}. {}  [{}]", prefix, i + 1, track.label(), track.playlist );
            if Some( i ) == playing_index {
                ListItem::new( line ).style( Style::default().fg( Color::Green ) )
            } else {
                ListItem::new( line )
            }
        })
        .collect();

    let source = queue.source().map( |s| format!( "- {} ", s ) ).unwrap_or_default();
    let title = format!(
        " Queue ({}) {}{}{}",
        queue.len(),
        source,
        if queue.shuffle() { "[S] " } else { "" },
        if queue.repeat() { "[R] " } else { "" },
    );

    let widget = List::new( items )
        .block( Block::default().title( title ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );

    frame.render_stateful_widget( widget, area, &mut app.queue_state );
}


fn draw_library( frame: &mut Frame, app: &mut App, area: Rect ) {
    let items: Vec<ListItem> = app.browser.entries()
        .iter()
        .map( |entry| {
            let style = match entry.kind {
                EntryKind::Parent => Style::default().fg( Color::DarkGray ),
                EntryKind::Playlist { .. } => Style::default().fg( Color::Blue ),
                EntryKind::Track( _ ) => Style::default().fg( Color::Green ),
            };
            ListItem::new( format!( " {}", entry.label ) ).style( style )
        })
        .collect();

    let mut state = ListState::default();
    if !app.browser.is_empty() {
        state.select( Some( app.browser.selected_index() ) );
    }

    let widget = List::new( items )
        .block( Block::default().title( format!( " {} ", app.browser.location() ) ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );

    frame.render_stateful_widget( widget, area, &mut state );
}


fn draw_discover( frame: &mut Frame, app: &mut App, area: Rect ) {
    let columns = Layout::default()
        .direction( Direction::Horizontal )
        .constraints([ Constraint::Percentage( 65 ), Constraint::Percentage( 35 ) ])
        .split( area );

    let items: Vec<ListItem> = app.recommendations
        .iter()
        .map( |t| ListItem::new( format!( " {}  [{}]", t.label(), t.playlist ) ) )
        .collect();

    let title = match app.player.current_track() {
        Some( track ) => format!( " Because you're playing {} ", track.title ),
        None => " Play something for recommendations ".to_string(),
    };

    let widget = List::new( items )
        .block( Block::default().title( title ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );
    frame.render_stateful_widget( widget, columns[ 0 ], &mut app.discover_state );

    let history = app.player.history();
    let mut lines: Vec<Line> = history
        .top_playlists( app.player.catalog(), 5 )
        .into_iter()
        .map( |( name, plays )| Line::from( format!( " {:<20} {:>5}", name, plays ) ) )
        .collect();
    if lines.is_empty() {
        lines.push( Line::from( Span::styled( " Nothing played yet", Style::default().fg( Color::DarkGray ) ) ) );
    }
    lines.push( Line::from( "" ) );
    lines.push( Line::from( format!( " {} plays in total", history.total() ) ) );

    let top = Paragraph::new( lines )
        .block( Block::default().title( " Most Played " ).borders( Borders::ALL ) );
    frame.render_widget( top, columns[ 1 ] );
}


fn draw_help( frame: &mut Frame, app: &mut App, area: Rect ) {
    let help_text = command::help_text();
    let line_count = help_text.lines().count() as u16;
    let visible_height = area.height.saturating_sub( 2 );

    // Clamp scroll to valid range
    let max_scroll = line_count.saturating_sub( visible_height );
    if app.help_scroll > max_scroll {
        app.help_scroll = max_scroll;
    }

    let help = Paragraph::new( help_text )
        .block( Block::default()
            .title( " Help (↑↓ scroll, ? or Esc to close) " )
            .borders( Borders::ALL )
        )
        .wrap( Wrap { trim: false } )
        .scroll(( app.help_scroll, 0 ));

    frame.render_widget( help, area );
}


fn draw_now_playing( frame: &mut Frame, app: &App, area: Rect ) {
    let snapshot = app.player.snapshot();

    let state_str = match snapshot.state {
        PlaybackState::Playing => "▶",
        PlaybackState::Paused => "⏸",
        PlaybackState::Loading => "…",
        PlaybackState::Error => "!",
        PlaybackState::Stopped => "■",
    };

    let ( title, details ) = match &snapshot.current {
        Some( track ) => ( track.title.clone(), format!( "{} - {}", track.artist, track.playlist ) ),
        None => ( "No track".to_string(), String::new() ),
    };

    let duration = snapshot.duration.unwrap_or( Duration::ZERO );
    let progress_width = 20;
    let progress = if duration.as_secs_f64() > 0.0 {
        ( snapshot.position.as_secs_f64() / duration.as_secs_f64() ).min( 1.0 )
    } else {
        0.0
    };
    let filled = ( progress * progress_width as f64 ).round() as usize;
    let bar = format!( "[{}{}]", "█".repeat( filled ), "░".repeat( progress_width - filled ) );

    let mut lines = vec![
        Line::from( Span::styled( format!( " {} {} ", state_str, title ), Style::default().bold() ) ),
    ];

    if !details.is_empty() {
        lines.push( Line::from( Span::styled( format!( "   {} ", details ), Style::default().fg( Color::Gray ) ) ) );
    }

    let vol_pct = ( snapshot.volume * 100.0 ).round() as u32;
    let vol_str = if vol_pct == 0 { "muted".to_string() } else { format!( "vol {}%", vol_pct ) };

    lines.push( Line::from( format!(
        " {} {} / {}  {} ",
        bar,
        format_time( snapshot.position ),
        format_time( duration ),
        vol_str
    )));

    let now_playing = Paragraph::new( lines )
        .block( Block::default().title( " Now Playing " ).borders( Borders::ALL ) );

    frame.render_widget( now_playing, area );
}


fn draw_status_bar( frame: &mut Frame, app: &App, area: Rect ) {
    let ( text, style ) = match app.input_mode {
        InputMode::Command => {
            ( format!( "/{}", app.command_line.content() ), Style::default().fg( Color::Yellow ) )
        }
        InputMode::Search => {
            ( format!( "Search: {}", app.command_line.content() ), Style::default().fg( Color::Yellow ) )
        }
        InputMode::Normal => {
            if let Some( ref msg ) = app.status_message {
                ( msg.clone(), Style::default().fg( Color::Green ) )
            } else {
                let hint = match app.view_mode {
                    ViewMode::Queue => " [/]Cmd [Tab]Views [Space]Pause [n/p]Skip [d]Remove [J/K]Move [?]Help [q]Quit ",
                    ViewMode::Library => " [Enter]Open/Play [a]Queue [P]Play list [f]Find [J/K]Move [h]Back [?]Help ",
                    ViewMode::Discover => " [Enter]Play [a]Queue [u]Refresh [Tab]Views [?]Help ",
                    ViewMode::Help => " [?]Close [Esc]Close ",
                };
                ( hint.to_string(), Style::default().fg( Color::DarkGray ) )
            }
        }
    };

    let status = Paragraph::new( text ).style( style );
    frame.render_widget( status, area );

    // Show cursor in command/search mode
    if app.input_mode != InputMode::Normal {
        let prefix = if app.input_mode == InputMode::Command { 1 } else { 8 };
        let cursor_x = area.x + prefix + app.command_line.cursor_column() as u16;
        frame.set_cursor_position(( cursor_x, area.y ));
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_swap_target_bounds() {
        assert_eq!( swap_target( 0, 1, 3 ), Some( 1 ) );
        assert_eq!( swap_target( 2, -1, 3 ), Some( 1 ) );
        assert_eq!( swap_target( 0, -1, 3 ), None );
        assert_eq!( swap_target( 2, 1, 3 ), None );
    }


    #[test]
    fn test_swap_target_stale_selection() {
        // Selection left over from a longer queue
        assert_eq!( swap_target( 5, -1, 3 ), None );
        assert_eq!( swap_target( 3, -1, 3 ), None );
        assert_eq!( swap_target( 0, 1, 0 ), None );
    }


    #[test]
    fn test_select_wraps_both_ways() {
        let mut state = ListState::default();
        select_next( &mut state, 3 );
        assert_eq!( state.selected(), Some( 0 ) );
        select_previous( &mut state, 3 );
        assert_eq!( state.selected(), Some( 2 ) );
        select_next( &mut state, 3 );
        assert_eq!( state.selected(), Some( 0 ) );
    }


    #[test]
    fn test_select_on_empty_list() {
        let mut state = ListState::default();
        select_next( &mut state, 0 );
        select_previous( &mut state, 0 );
        assert_eq!( state.selected(), None );
    }


    #[test]
    fn test_select_previous_clamps_stale_index() {
        let mut state = ListState::default();
        state.select( Some( 9 ) );
        select_previous( &mut state, 3 );
        assert_eq!( state.selected(), Some( 2 ) );
    }
}
