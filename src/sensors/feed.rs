use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use log::{info, warn};
use serde::Deserialize;

use crate::config::deserialize_opt_duration;
use crate::experiment::Experiment;
use crate::fault::{FaultSender, FaultSource};
use crate::telemetry::{SampleUpdate, SharedSample};

/// Where sensor readings come from: an acquisition process piping JSON lines
/// into stdin, or a recorded flight on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
}

impl FeedSource {
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            FeedSource::Stdin
        } else {
            FeedSource::File(path.to_path_buf())
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedLine {
    /// Wait this long before applying the reading.
    #[serde(default, deserialize_with = "deserialize_opt_duration")]
    after: Option<Duration>,
    #[serde(flatten)]
    update: SampleUpdate,
}

pub fn spawn_feed(
    source: FeedSource,
    sample: Arc<SharedSample>,
    experiment: Arc<Experiment>,
    faults: FaultSender,
) -> io::Result<thread::JoinHandle<()>> {
    let reader: Box<dyn BufRead + Send> = match &source {
        FeedSource::Stdin => Box::new(BufReader::new(io::stdin())),
        FeedSource::File(path) => Box::new(BufReader::new(File::open(path)?)),
    };
    info!("Reading sensor feed from {:?}", source);

    Ok(thread::spawn(move || {
        let applied = run_feed(reader, &sample, &experiment, &faults);
        info!("Sensor feed ended after {} readings", applied);
    }))
}

/// Applies every reading in `reader` and returns how many were applied.
fn run_feed<R: BufRead>(
    reader: R,
    sample: &SharedSample,
    experiment: &Experiment,
    faults: &FaultSender,
) -> usize {
    let mut applied = 0;

    for (n, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                faults.report(FaultSource::Sensors, format!("feed read failed: {}", e));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reading: FeedLine = match serde_json::from_str(line) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Sensor feed line {}: {}", n + 1, e);
                continue;
            }
        };

        if let Some(delay) = reading.after {
            thread::sleep(delay);
        }

        sample.apply(&reading.update);
        applied += 1;

        if let Some(altitude) = reading.update.altitude {
            if let Err(e) = experiment.observe_altitude(altitude, Instant::now()) {
                faults.report(FaultSource::Relay, e);
            }
        }
    }

    applied
}
