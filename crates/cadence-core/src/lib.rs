//! Cadence Core - Queue and playback engine
//!
//! This crate provides the core functionality for playing a music
//! catalog: the track catalog, the play queue with its artist-spreading
//! shuffle, the playback state machine and the play history.

pub mod catalog;
pub mod command;
pub mod history;
pub mod library;
pub mod media;
pub mod player;
pub mod queue;
pub mod shuffle;
pub mod track;

pub use catalog::{ Catalog, CatalogProvider, OrderPersistence };
pub use command::{ Command, CommandError };
pub use history::PlayHistory;
pub use library::{ Library, LibraryError };
pub use media::{ format_time, LoadToken, MediaEvent, MediaResource, MediaSignal, SeekTarget };
pub use player::{ PlaybackState, Player, PlayerEvent, Snapshot };
pub use queue::Queue;
pub use track::{ RawTrack, Track, TrackError, TrackId };
