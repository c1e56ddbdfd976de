//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per l'azzeramento delle date
//! dei file. La strategia viene scelta una sola volta all'avvio, mai per singola chiamata:
//!
//! - **Windows**: API native (`FileTimes` con `set_created`), azzera anche la data di creazione
//! - **Unix-like**: `filetime`, azzera accesso e modifica (la creazione non è impostabile)
//!
//! La data sentinella è l'epoch Unix (1970-01-01T00:00:00Z).

use filetime::FileTime;
use std::fs::{FileTimes, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

/// Istante a cui vengono riportate tutte le date
pub const SENTINEL: SystemTime = SystemTime::UNIX_EPOCH;

/// Azzera le date di un file
pub trait TimestampWiper: Send + Sync {
    fn wipe(&self, path: &Path) -> io::Result<()>;

    /// Nome della strategia per il logging
    fn name(&self) -> &'static str;
}

/// Creazione + accesso + modifica tramite le API native del sistema
#[derive(Debug, Default)]
pub struct NativeFileTimes;

impl TimestampWiper for NativeFileTimes {
    fn wipe(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        let times = FileTimes::new()
            .set_accessed(SENTINEL)
            .set_modified(SENTINEL);

        #[cfg(windows)]
        let times = {
            use std::os::windows::fs::FileTimesExt;
            times.set_created(SENTINEL)
        };

        file.set_times(times)
    }

    fn name(&self) -> &'static str {
        "native file times (created/accessed/modified)"
    }
}

/// Solo accesso + modifica, valido ovunque
#[derive(Debug, Default)]
pub struct AccessModifyTimes;

impl TimestampWiper for AccessModifyTimes {
    fn wipe(&self, path: &Path) -> io::Result<()> {
        let sentinel = FileTime::from_system_time(SENTINEL);
        filetime::set_file_times(path, sentinel, sentinel)
    }

    fn name(&self) -> &'static str {
        "access/modify reset"
    }
}

/// Strategia della piattaforma corrente (singleton)
pub fn timestamp_wiper() -> Arc<dyn TimestampWiper> {
    static INSTANCE: OnceLock<Arc<dyn TimestampWiper>> = OnceLock::new();
    INSTANCE
        .get_or_init(|| {
            let wiper: Arc<dyn TimestampWiper> = if cfg!(windows) {
                Arc::new(NativeFileTimes)
            } else {
                Arc::new(AccessModifyTimes)
            };
            tracing::debug!("Timestamp strategy: {}", wiper.name());
            wiper
        })
        .clone()
}
