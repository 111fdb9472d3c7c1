use std::fmt;

/// Phase of an upload, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UploadPhase {
    /// Resolving the data source into a grid.
    Parsing,
    /// Clearing the destination sheet (replace mode only).
    Clearing,
    /// Writing chunks.
    Uploading,
    /// All rows written.
    Complete,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parsing => "parsing",
            Self::Clearing => "clearing",
            Self::Uploading => "uploading",
            Self::Complete => "complete",
        })
    }
}

/// Progress report emitted at phase boundaries and after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: UploadPhase,
    /// `processed_rows / total_rows` as a rounded percentage; 100 when there are no rows.
    pub percent: u8,
    pub total_rows: usize,
    pub processed_rows: usize,
}

impl ProgressEvent {
    pub fn new(phase: UploadPhase, processed_rows: usize, total_rows: usize) -> Self {
        let percent = if total_rows == 0 {
            100
        } else {
            ((processed_rows as f64 / total_rows as f64) * 100.0)
                .round()
                .clamp(0.0, 100.0) as u8
        };
        Self {
            phase,
            percent,
            total_rows,
            processed_rows,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}% ({}/{} rows)",
            self.phase, self.percent, self.processed_rows, self.total_rows
        )
    }
}

/// Receives progress events.
///
/// Called synchronously on the uploading thread; a slow observer slows the upload.
/// Closures `Fn(&ProgressEvent)` implement this trait.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}
