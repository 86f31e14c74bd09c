//! Finished-game archive
//!
//! Exports are written as `<unix seconds>-<game id>.pgn` under the configured
//! directory. Without a directory the export is only logged.

use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rookwire_core::traits::{GameArchive, GameRecord};
use tracing::{debug, info};

pub struct DirectoryArchive {
    dir: Option<PathBuf>,
}

impl DirectoryArchive {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn file_name(record: &GameRecord) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        format!("{}-{}.pgn", secs, record.game_id)
    }
}

impl GameArchive for DirectoryArchive {
    type Error = io::Error;

    async fn store(&mut self, record: &GameRecord, pgn: &str) -> Result<(), Self::Error> {
        let Some(dir) = &self.dir else {
            debug!(game = %record.game_id, pgn, "no archive directory, export not saved");
            return Ok(());
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(record));
        std::fs::write(&path, pgn)?;
        info!(
            game = %record.game_id,
            result = record.outcome.result_for(record.local),
            path = %path.display(),
            "game archived"
        );
        Ok(())
    }
}
