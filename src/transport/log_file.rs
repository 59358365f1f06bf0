use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

/// Append-only copy of every transmitted sentence.
pub struct TelemetryLog {
    file: File,
}

impl TelemetryLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("Telemetry logging to {}", path.display());
        Ok(Self { file })
    }

    pub fn append(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_across_reopen() {
        let path = std::env::temp_dir().join(format!(
            "stratoschem-telemetry-{}.txt",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        TelemetryLog::open(&path).unwrap().append(b"$$A,1*0000\n").unwrap();
        TelemetryLog::open(&path).unwrap().append(b"$$A,2*0000\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "$$A,1*0000\n$$A,2*0000\n"
        );
        fs::remove_file(path).unwrap();
    }
}
