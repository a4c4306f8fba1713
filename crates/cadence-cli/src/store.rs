//! Background playlist order persistence
//!
//! Writes reorders to the catalog file on tokio's blocking pool so the
//! UI never waits on disk. Failures come back on a channel; the app
//! reloads the catalog when it sees one.

use std::sync::{ Arc, Mutex, PoisonError };

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use cadence_core::{ Library, OrderPersistence, TrackId };


/// A reorder that could not be written.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct StoreFailure {
    pub playlist: String,
    pub message: String,
}


/// Persists playlist orders into a [`Library`] file.
pub struct OrderStore {
    runtime: Handle,
    library: Library,
    failures: UnboundedSender<StoreFailure>,
    // Serializes writes to the catalog file
    write_lock: Arc<Mutex<()>>,
}


impl OrderStore {
    pub fn new( runtime: Handle, library: Library, failures: UnboundedSender<StoreFailure> ) -> Self {
        Self {
            runtime,
            library,
            failures,
            write_lock: Arc::new( Mutex::new( () ) ),
        }
    }
}


impl OrderPersistence for OrderStore {
    fn persist_order( &self, playlist: &str, ids: &[TrackId] ) {
        let library = self.library.clone();
        let failures = self.failures.clone();
        let write_lock = Arc::clone( &self.write_lock );
        let playlist = playlist.to_string();
        let ids = ids.to_vec();

        self.runtime.spawn_blocking( move || {
            let _guard = write_lock.lock().unwrap_or_else( PoisonError::into_inner );

            if let Err( e ) = library.write_order( &playlist, &ids ) {
                tracing::warn!( "Failed to save order of '{}': {}", playlist, e );
                let _ = failures.send( StoreFailure { playlist, message: e.to_string() } );
            }
        });
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use cadence_core::Track;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc::unbounded_channel;


    fn track( id: TrackId, position: i64 ) -> Track {
        Track {
            id,
            title: format!( "Song {}", id ),
            artist: "Artist".into(),
            playlist: "Mix".into(),
            position,
            url: format!( "/music/Mix/{}.mp3", id ),
        }
    }


    #[tokio::test]
    async fn test_order_written_in_background() {
        let dir = TempDir::new().unwrap();
        let library = Library::new( dir.path().join( "library.json" ) );
        library.save( &[ track( 1, 0 ), track( 2, 1 ), track( 3, 2 ) ] ).unwrap();

        let ( tx, mut rx ) = unbounded_channel();
        let store = OrderStore::new( Handle::current(), library.clone(), tx );
        store.persist_order( "Mix", &[ 3, 1, 2 ] );
        drop( store );

        // Channel closes once the write task has finished
        assert!( tokio::time::timeout( Duration::from_secs( 5 ), rx.recv() ).await.unwrap().is_none() );

        let catalog = cadence_core::Catalog::fetch( &library ).unwrap();
        let order: Vec<TrackId> = catalog.playlist( "Mix" ).iter().map( |t| t.id ).collect();
        assert_eq!( order, vec![ 3, 1, 2 ] );
    }


    #[tokio::test]
    async fn test_failure_reported() {
        let dir = TempDir::new().unwrap();
        let library = Library::new( dir.path().join( "missing.json" ) );

        let ( tx, mut rx ) = unbounded_channel();
        let store = OrderStore::new( Handle::current(), library, tx );
        store.persist_order( "Mix", &[ 1 ] );

        let failure = tokio::time::timeout( Duration::from_secs( 5 ), rx.recv() ).await.unwrap().unwrap();
        assert_eq!( failure.playlist, "Mix" );
    }
}
