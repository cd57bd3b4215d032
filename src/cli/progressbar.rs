use crate::upload::{LogObserver, UploadEvent, UploadObserver, UploadState};
use indicatif::{ProgressBar, ProgressStyle};

// "█▉▊▋▌▍▎▏  ·"
const PROGRES_CHARS: &str =
    "\u{2588}\u{2589}\u{258a}\u{258b}\u{258c}\u{258d}\u{258e}\u{258f}  \u{b7}";

#[derive(Default, Debug)]
pub struct Bar {
    pub progress: Option<ProgressBar>,
}

impl Bar {
    #[must_use]
    pub fn new(file_size: u64, quiet: bool) -> Self {
        if quiet {
            return Self::default();
        }

        let pb = ProgressBar::new(file_size);

        let style_result = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:50.green/blue} {bytes}/{total_bytes} ({bytes_per_sec} - {eta})");

        let style = match style_result {
            Ok(style) => style,
            Err(err) => {
                eprintln!("Error creating progress bar style: {err}");
                return Self { progress: None };
            }
        };

        pb.set_style(style.progress_chars(PROGRES_CHARS));

        Self { progress: Some(pb) }
    }
}

/// Logs every event and moves the bar as parts are uploaded
#[derive(Debug, Default)]
pub struct ProgressObserver {
    bar: Bar,
    log: LogObserver,
}

impl ProgressObserver {
    #[must_use]
    pub fn new(file_size: u64, quiet: bool) -> Self {
        Self {
            bar: Bar::new(file_size, quiet),
            log: LogObserver,
        }
    }
}

impl UploadObserver for ProgressObserver {
    fn on_event(&self, event: &UploadEvent) {
        self.log.on_event(event);

        let Some(pb) = self.bar.progress.as_ref() else {
            return;
        };

        match event {
            UploadEvent::PartUploaded { size, .. } => pb.inc(*size),
            UploadEvent::Completed { size, .. } => {
                pb.set_position(*size);
                pb.finish();
            }
            UploadEvent::AbortIssued { .. }
            | UploadEvent::CompletionFailed { .. }
            | UploadEvent::StateChanged {
                to: UploadState::Cancelled,
                ..
            } => {
                pb.abandon();
            }
            _ => (),
        }
    }
}
