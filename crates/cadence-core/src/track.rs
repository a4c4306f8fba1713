//! Track values and catalog entry normalisation
//!
//! Catalog providers hand over loosely shaped entries. They are checked
//! here once, so the queue and player only ever see complete tracks.

use serde::{ Deserialize, Serialize };
use thiserror::Error;


/// Stable track identifier assigned by the catalog.
pub type TrackId = i64;

/// Artist used when an entry has none.
pub const UNKNOWN_ARTIST: &str = "Unknown";


/// Reasons a catalog entry is rejected.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum TrackError {
    #[error( "Missing field: {0}" )]
    MissingField( &'static str ),

    #[error( "Empty field: {0}" )]
    EmptyField( &'static str ),
}


/// A playable track.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub playlist: String,
    /// Rank within `playlist`.
    pub position: i64,
    pub url: String,
}


impl Track {
    /// Display label used by the front end and in logs.
    pub fn label( &self ) -> String {
        format!( "{} - {}", self.title, self.artist )
    }
}


/// A catalog entry as delivered by a provider, before validation.
///
/// Field names follow the `/songs` payload of the backend.
#[derive( Debug, Clone, Default, PartialEq, Serialize, Deserialize )]
pub struct RawTrack {
    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub id: Option<TrackId>,

    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub title: Option<String>,

    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub artist: Option<String>,

    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub playlist: Option<String>,

    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub position: Option<i64>,

    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub url: Option<String>,
}


impl TryFrom<RawTrack> for Track {
    type Error = TrackError;


    fn try_from( raw: RawTrack ) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or( TrackError::MissingField( "id" ) )?;
        let title = required( raw.title, "title" )?;
        let url = required( raw.url, "url" )?;
        let playlist = required( raw.playlist, "playlist" )?;

        let artist = raw.artist
            .map( |a| a.trim().to_string() )
            .filter( |a| !a.is_empty() )
            .unwrap_or_else( || UNKNOWN_ARTIST.to_string() );

        Ok( Track {
            id,
            title,
            artist,
            playlist,
            // Unranked entries sort after ranked ones
            position: raw.position.unwrap_or( i64::MAX ),
            url,
        })
    }
}


impl From<&Track> for RawTrack {
    fn from( track: &Track ) -> Self {
        Self {
            id: Some( track.id ),
            title: Some( track.title.clone() ),
            artist: Some( track.artist.clone() ),
            playlist: Some( track.playlist.clone() ),
            position: Some( track.position ),
            url: Some( track.url.clone() ),
        }
    }
}


fn required( value: Option<String>, field: &'static str ) -> Result<String, TrackError> {
    let value = value.ok_or( TrackError::MissingField( field ) )?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err( TrackError::EmptyField( field ) );
    }
    Ok( trimmed.to_string() )
}


#[cfg( test )]
mod tests {
    use super::*;


    fn raw() -> RawTrack {
        RawTrack {
            id: Some( 7 ),
            title: Some( "Blue Monday".into() ),
            artist: Some( "New Order".into() ),
            playlist: Some( "Eighties".into() ),
            position: Some( 2 ),
            url: Some( "/music/Eighties/Blue Monday - New Order.mp3".into() ),
        }
    }


    #[test]
    fn test_complete_entry_converts() {
        let track = Track::try_from( raw() ).unwrap();
        assert_eq!( track.id, 7 );
        assert_eq!( track.artist, "New Order" );
        assert_eq!( track.position, 2 );
        assert_eq!( track.label(), "Blue Monday - New Order" );
    }


    #[test]
    fn test_missing_id_rejected() {
        let entry = RawTrack { id: None, ..raw() };
        assert_eq!( Track::try_from( entry ), Err( TrackError::MissingField( "id" ) ) );
    }


    #[test]
    fn test_blank_title_rejected() {
        let entry = RawTrack { title: Some( "   ".into() ), ..raw() };
        assert_eq!( Track::try_from( entry ), Err( TrackError::EmptyField( "title" ) ) );
    }


    #[test]
    fn test_missing_artist_normalised() {
        let entry = RawTrack { artist: None, ..raw() };
        assert_eq!( Track::try_from( entry ).unwrap().artist, UNKNOWN_ARTIST );

        let entry = RawTrack { artist: Some( "".into() ), ..raw() };
        assert_eq!( Track::try_from( entry ).unwrap().artist, UNKNOWN_ARTIST );
    }


    #[test]
    fn test_missing_position_sorts_last() {
        let entry = RawTrack { position: None, ..raw() };
        assert_eq!( Track::try_from( entry ).unwrap().position, i64::MAX );
    }


    #[test]
    fn test_raw_track_parses_backend_payload() {
        let json = r#"{"id": 3, "title": "Song", "artist": null, "url": "/music/a.mp3", "playlist": "Mix", "position": 0}"#;
        let entry: RawTrack = serde_json::from_str( json ).unwrap();
        let track = Track::try_from( entry ).unwrap();
        assert_eq!( track.artist, UNKNOWN_ARTIST );
        assert_eq!( track.playlist, "Mix" );
    }
}
