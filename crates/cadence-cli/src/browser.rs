//! Library browser for catalog navigation.
//!
//! Lists playlists at the top level and a playlist's tracks once it
//! is opened. A non-empty filter switches to a flat list of matching
//! tracks across the whole catalog.

use cadence_core::{ Catalog, Track };


/// What a browser row points at.
#[derive( Debug, Clone, PartialEq )]
pub enum EntryKind {
    /// Back to the playlist list.
    Parent,
    Playlist { name: String, tracks: usize },
    Track( Track ),
}


/// A row in the browser.
#[derive( Debug, Clone, PartialEq )]
pub struct BrowserEntry {
    pub label: String,
    pub kind: EntryKind,
}


/// Library browser state.
#[derive( Debug, Default )]
pub struct LibraryBrowser {
    catalog: Catalog,
    open_playlist: Option<String>,
    entries: Vec<BrowserEntry>,
    selected: usize,
    filter: String,
}


impl LibraryBrowser {
    /// Creates a browser over a catalog snapshot.
    pub fn new( catalog: Catalog ) -> Self {
        let mut browser = Self { catalog, ..Self::default() };
        browser.refresh();
        browser
    }


    /// Swaps in a fresh catalog, keeping the open playlist if it still exists.
    pub fn set_catalog( &mut self, catalog: Catalog ) {
        self.catalog = catalog;
        if let Some( name ) = &self.open_playlist {
            if self.catalog.playlist( name ).is_empty() {
                self.open_playlist = None;
            }
        }
        self.refresh();
    }


    /// Rebuilds the listing.
    pub fn refresh( &mut self ) {
        self.entries = if !self.filter.is_empty() {
            self.search_entries()
        } else if let Some( name ) = &self.open_playlist {
            let mut entries = vec![ BrowserEntry { label: "..".to_string(), kind: EntryKind::Parent } ];
            entries.extend( self.catalog.playlist( name ).into_iter().map( track_entry ) );
            entries
        } else {
            self.catalog
                .playlists()
                .into_iter()
                .map( |name| {
                    let tracks = self.catalog.playlist( &name ).len();
                    BrowserEntry {
                        label: format!( "{} ({})", name, tracks ),
                        kind: EntryKind::Playlist { name, tracks },
                    }
                })
                .collect()
        };

        // Adjust selection if out of bounds
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub( 1 );
        }
    }


    fn search_entries( &self ) -> Vec<BrowserEntry> {
        let needle = self.filter.to_lowercase();
        self.catalog
            .tracks()
            .iter()
            .filter( |t| {
                t.title.to_lowercase().contains( &needle )
                    || t.artist.to_lowercase().contains( &needle )
                    || t.playlist.to_lowercase().contains( &needle )
            })
            .cloned()
            .map( track_entry )
            .collect()
    }


    /// Opens the selected playlist or returns the selected track.
    ///
    /// @returns Some(track) if a track was selected, None otherwise
    pub fn enter_selected( &mut self ) -> Option<Track> {
        let entry = self.selected_entry()?.clone();
        match entry.kind {
            EntryKind::Parent => {
                self.go_up();
                None
            }
            EntryKind::Playlist { name, .. } => {
                self.open_playlist = Some( name );
                self.selected = 0;
                self.refresh();
                None
            }
            EntryKind::Track( track ) => Some( track ),
        }
    }


    /// Goes back to the playlist list.
    pub fn go_up( &mut self ) {
        if let Some( name ) = self.open_playlist.take() {
            self.refresh();
            self.selected = self.entries
                .iter()
                .position( |e| matches!( &e.kind, EntryKind::Playlist { name: n, .. } if *n == name ) )
                .unwrap_or( 0 );
        }
    }


    /// Sets the filter text and updates visible entries.
    pub fn set_filter( &mut self, filter: String ) {
        self.filter = filter;
        self.selected = 0;
        self.refresh();
    }


    /// Clears the filter.
    pub fn clear_filter( &mut self ) {
        self.filter.clear();
        self.refresh();
    }


    /// Gets the current filter.
    pub fn filter( &self ) -> &str {
        &self.filter
    }


    /// Moves selection down.
    pub fn select_next( &mut self ) {
        if !self.entries.is_empty() {
            self.selected = ( self.selected + 1 ) % self.entries.len();
        }
    }


    /// Moves selection up.
    pub fn select_previous( &mut self ) {
        if !self.entries.is_empty() {
            self.selected = if self.selected == 0 {
                self.entries.len() - 1
            } else {
                self.selected - 1
            };
        }
    }


    /// Jumps to first entry.
    pub fn select_first( &mut self ) {
        self.selected = 0;
    }


    /// Jumps to last entry.
    pub fn select_last( &mut self ) {
        if !self.entries.is_empty() {
            self.selected = self.entries.len() - 1;
        }
    }


    /// Gets the currently selected entry.
    pub fn selected_entry( &self ) -> Option<&BrowserEntry> {
        self.entries.get( self.selected )
    }


    /// Gets the selected track, if the selection is a track.
    pub fn selected_track( &self ) -> Option<&Track> {
        match &self.selected_entry()?.kind {
            EntryKind::Track( track ) => Some( track ),
            _ => None,
        }
    }


    /// Gets the selected playlist name, if the selection is a playlist.
    pub fn selected_playlist( &self ) -> Option<&str> {
        match &self.selected_entry()?.kind {
            EntryKind::Playlist { name, .. } => Some( name ),
            _ => None,
        }
    }


    pub fn entries( &self ) -> &[BrowserEntry] {
        &self.entries
    }


    /// Gets the selected index for UI state.
    pub fn selected_index( &self ) -> usize {
        self.selected
    }


    /// Title for the browser frame.
    pub fn location( &self ) -> String {
        if !self.filter.is_empty() {
            format!( "Search: {}", self.filter )
        } else {
            match &self.open_playlist {
                Some( name ) => format!( "Library / {}", name ),
                None => "Library".to_string(),
            }
        }
    }


    pub fn open_playlist( &self ) -> Option<&str> {
        self.open_playlist.as_deref()
    }


    /// Gets the total number of visible entries.
    pub fn len( &self ) -> usize {
        self.entries.len()
    }


    /// Returns true if there are no visible entries.
    pub fn is_empty( &self ) -> bool {
        self.entries.is_empty()
    }
}


fn track_entry( track: Track ) -> BrowserEntry {
    BrowserEntry {
        label: format!( "{:>4}  {}", track.id, track.label() ),
        kind: EntryKind::Track( track ),
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use cadence_core::TrackId;


    fn track( id: TrackId, title: &str, artist: &str, playlist: &str, position: i64 ) -> Track {
        Track {
            id,
            title: title.into(),
            artist: artist.into(),
            playlist: playlist.into(),
            position,
            url: format!( "/music/{}/{}.mp3", playlist, id ),
        }
    }


    fn browser() -> LibraryBrowser {
        LibraryBrowser::new( Catalog::new( vec![
            track( 1, "Blue", "Miles", "Jazz", 1 ),
            track( 2, "So What", "Miles", "Jazz", 0 ),
            track( 3, "Paranoid", "Sabbath", "Rock", 0 ),
        ]))
    }


    #[test]
    fn test_lists_playlists() {
        let browser = browser();
        assert_eq!( browser.len(), 2 );
        assert_eq!( browser.selected_playlist(), Some( "Jazz" ) );
        assert_eq!( browser.entries()[ 0 ].label, "Jazz (2)" );
    }


    #[test]
    fn test_open_playlist_sorted_with_parent() {
        let mut browser = browser();
        assert!( browser.enter_selected().is_none() );
        assert_eq!( browser.open_playlist(), Some( "Jazz" ) );
        assert_eq!( browser.entries()[ 0 ].kind, EntryKind::Parent );

        browser.select_next();
        assert_eq!( browser.selected_track().map( |t| t.id ), Some( 2 ) );
        assert_eq!( browser.enter_selected().map( |t| t.id ), Some( 2 ) );
    }


    #[test]
    fn test_parent_returns_to_playlist() {
        let mut browser = browser();
        browser.select_next();
        browser.enter_selected();
        browser.select_first();
        browser.enter_selected();

        assert_eq!( browser.open_playlist(), None );
        assert_eq!( browser.selected_playlist(), Some( "Rock" ) );
    }


    #[test]
    fn test_filter_matches_artist_and_title() {
        let mut browser = browser();
        browser.set_filter( "miles".into() );
        assert_eq!( browser.len(), 2 );

        browser.set_filter( "PARA".into() );
        assert_eq!( browser.selected_track().map( |t| t.id ), Some( 3 ) );
        assert_eq!( browser.location(), "Search: PARA" );

        browser.clear_filter();
        assert_eq!( browser.len(), 2 );
    }


    #[test]
    fn test_selection_wraps() {
        let mut browser = browser();
        browser.select_previous();
        assert_eq!( browser.selected_index(), 1 );
        browser.select_next();
        assert_eq!( browser.selected_index(), 0 );
    }


    #[test]
    fn test_catalog_swap_closes_vanished_playlist() {
        let mut browser = browser();
        browser.enter_selected();
        browser.set_catalog( Catalog::new( vec![ track( 3, "Paranoid", "Sabbath", "Rock", 0 ) ] ) );
        assert_eq!( browser.open_playlist(), None );
        assert_eq!( browser.len(), 1 );
    }
}
