//! Command line editing for the TUI.
//!
//! Tracks the input mode and the text being typed after `/` or in
//! search, with recall of previously entered commands.


/// Most commands kept for recall.
const RECALL_LIMIT: usize = 50;


/// Current input mode of the application.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum InputMode {
    /// Keyboard shortcuts active.
    #[default]
    Normal,

    /// Typing a slash command.
    Command,

    /// Typing a library filter.
    Search,
}


/// Single-line editor with a byte-offset cursor.
#[derive( Debug, Default )]
pub struct CommandLine {
    text: String,
    cursor: usize,
    recall: Vec<String>,
    // Position while stepping through recall; None when editing fresh text
    recall_pos: Option<usize>,
}


impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn insert( &mut self, c: char ) {
        self.text.insert( self.cursor, c );
        self.cursor += c.len_utf8();
    }


    /// Deletes the character before the cursor.
    pub fn backspace( &mut self ) {
        if let Some( prev ) = self.prev_boundary() {
            self.text.remove( prev );
            self.cursor = prev;
        }
    }


    /// Deletes the character under the cursor.
    pub fn delete( &mut self ) {
        if self.cursor < self.text.len() {
            self.text.remove( self.cursor );
        }
    }


    pub fn move_left( &mut self ) {
        if let Some( prev ) = self.prev_boundary() {
            self.cursor = prev;
        }
    }


    pub fn move_right( &mut self ) {
        if let Some( c ) = self.text[ self.cursor.. ].chars().next() {
            self.cursor += c.len_utf8();
        }
    }


    pub fn move_home( &mut self ) {
        self.cursor = 0;
    }


    pub fn move_end( &mut self ) {
        self.cursor = self.text.len();
    }


    /// Empties the line and leaves recall.
    pub fn clear( &mut self ) {
        self.text.clear();
        self.cursor = 0;
        self.recall_pos = None;
    }


    /// Takes the typed text, remembering it for recall.
    pub fn submit( &mut self ) -> String {
        let text = std::mem::take( &mut self.text );
        self.clear();

        let trimmed = text.trim();
        if !trimmed.is_empty() && self.recall.last().map( String::as_str ) != Some( trimmed ) {
            self.recall.push( trimmed.to_string() );
            if self.recall.len() > RECALL_LIMIT {
                self.recall.remove( 0 );
            }
        }
        text
    }


    /// Steps back to an older command.
    pub fn recall_previous( &mut self ) {
        if self.recall.is_empty() {
            return;
        }
        let pos = match self.recall_pos {
            Some( 0 ) => 0,
            Some( p ) => p - 1,
            None => self.recall.len() - 1,
        };
        self.show_recalled( pos );
    }


    /// Steps forward to a newer command, ending on an empty line.
    pub fn recall_next( &mut self ) {
        match self.recall_pos {
            Some( p ) if p + 1 < self.recall.len() => self.show_recalled( p + 1 ),
            Some( _ ) => self.clear(),
            None => {}
        }
    }


    pub fn content( &self ) -> &str {
        &self.text
    }


    /// Cursor position in characters, for display.
    pub fn cursor_column( &self ) -> usize {
        self.text[ ..self.cursor ].chars().count()
    }


    pub fn is_empty( &self ) -> bool {
        self.text.is_empty()
    }


    fn show_recalled( &mut self, pos: usize ) {
        self.text = self.recall[ pos ].clone();
        self.cursor = self.text.len();
        self.recall_pos = Some( pos );
    }


    fn prev_boundary( &self ) -> Option<usize> {
        self.text[ ..self.cursor ].char_indices().next_back().map( |( i, _ )| i )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn typed( s: &str ) -> CommandLine {
        let mut line = CommandLine::new();
        s.chars().for_each( |c| line.insert( c ) );
        line
    }


    #[test]
    fn test_edit_multibyte() {
        let mut line = typed( "héllo" );
        line.move_left();
        line.move_left();
        line.move_left();
        line.backspace();
        assert_eq!( line.content(), "hllo" );
        assert_eq!( line.cursor_column(), 1 );

        line.move_right();
        line.delete();
        assert_eq!( line.content(), "hlo" );
    }


    #[test]
    fn test_submit_remembers_commands() {
        let mut line = typed( "play 3" );
        assert_eq!( line.submit(), "play 3" );
        assert!( line.is_empty() );

        line.insert( 'n' );
        line.submit();
        line.recall_previous();
        assert_eq!( line.content(), "n" );
        line.recall_previous();
        assert_eq!( line.content(), "play 3" );
        line.recall_previous();
        assert_eq!( line.content(), "play 3" );

        line.recall_next();
        assert_eq!( line.content(), "n" );
        line.recall_next();
        assert!( line.is_empty() );
    }


    #[test]
    fn test_repeated_and_blank_commands_not_recalled_twice() {
        let mut line = typed( "next" );
        line.submit();
        "next ".chars().for_each( |c| line.insert( c ) );
        line.submit();
        line.submit();

        line.recall_previous();
        line.recall_previous();
        assert_eq!( line.content(), "next" );
        assert_eq!( line.recall.len(), 1 );
    }
}
