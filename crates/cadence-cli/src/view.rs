//! View mode management for the TUI.
//!
//! Defines the different views available in the application.


/// Current view mode of the application.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum ViewMode {
    /// Queue view - the play queue and current track.
    #[default]
    Queue,

    /// Library view - playlists and tracks from the catalog.
    Library,

    /// Discover view - recommendations and most played playlists.
    Discover,

    /// Help overlay - shows available commands.
    Help,
}


impl ViewMode {
    /// Returns the next view in tab order (excluding Help overlay).
    pub fn next_tab( self ) -> Self {
        match self {
            ViewMode::Queue => ViewMode::Library,
            ViewMode::Library => ViewMode::Discover,
            ViewMode::Discover => ViewMode::Queue,
            ViewMode::Help => ViewMode::Help,
        }
    }


    /// Returns the previous view in tab order (excluding Help overlay).
    pub fn prev_tab( self ) -> Self {
        match self {
            ViewMode::Queue => ViewMode::Discover,
            ViewMode::Library => ViewMode::Queue,
            ViewMode::Discover => ViewMode::Library,
            ViewMode::Help => ViewMode::Help,
        }
    }


    pub fn title( self ) -> &'static str {
        match self {
            ViewMode::Queue => "QUEUE",
            ViewMode::Library => "LIBRARY",
            ViewMode::Discover => "DISCOVER",
            ViewMode::Help => "HELP",
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_tab_cycle() {
        let mut view = ViewMode::default();
        for _ in 0..3 {
            view = view.next_tab();
        }
        assert_eq!( view, ViewMode::Queue );
        assert_eq!( ViewMode::Queue.prev_tab(), ViewMode::Discover );
    }


    #[test]
    fn test_help_stays_until_dismissed() {
        assert_eq!( ViewMode::Help.next_tab(), ViewMode::Help );
        assert_eq!( ViewMode::Help.prev_tab(), ViewMode::Help );
    }
}
