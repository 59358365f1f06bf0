use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use log::{debug, info};

use super::{Level, OutputPin, PinError};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Linux sysfs GPIO line, addressed by its BCM number.
pub struct SysfsPin {
    root: PathBuf,
    pin: u32,
    configured: bool,
}

impl SysfsPin {
    pub fn new(root: impl Into<PathBuf>, pin: u32) -> Self {
        Self {
            root: root.into(),
            pin,
            configured: false,
        }
    }

    fn line_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    fn io_err(&self) -> impl Fn(io::Error) -> PinError + '_ {
        move |source| PinError::Io {
            pin: self.pin,
            source,
        }
    }

    fn write(&self, path: &Path, value: &str) -> Result<(), PinError> {
        debug!("{} <- {}", path.display(), value);
        fs::write(path, value).map_err(self.io_err())
    }
}

impl OutputPin for SysfsPin {
    fn configure_output(&mut self) -> Result<(), PinError> {
        let line = self.line_dir();
        if !line.exists() {
            self.write(&self.root.join("export"), &self.pin.to_string())?;
            // udev needs a moment to hand over the new attribute files
            let mut waited = 0;
            while !line.join("direction").exists() && waited < 20 {
                thread::sleep(Duration::from_millis(50));
                waited += 1;
            }
        }

        self.write(&line.join("direction"), "out")?;
        self.configured = true;
        info!("gpio {} configured as output", self.pin);
        Ok(())
    }

    fn set_output(&mut self, level: Level) -> Result<(), PinError> {
        if !self.configured {
            return Err(PinError::NotConfigured(self.pin));
        }
        let value = match level {
            Level::High => "1",
            Level::Low => "0",
        };
        self.write(&self.line_dir().join("value"), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "stratoschem-gpio-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("gpio17")).unwrap();
        root
    }

    #[test]
    fn drives_value_file_after_configuration() {
        let root = scratch_root("drive");
        let mut pin = SysfsPin::new(&root, 17);

        pin.configure_output().unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio17/direction")).unwrap(), "out");

        pin.set_output(Level::Low).unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio17/value")).unwrap(), "0");
        pin.set_output(Level::High).unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio17/value")).unwrap(), "1");

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn refuses_to_drive_unconfigured_line() {
        let root = scratch_root("unconfigured");
        let mut pin = SysfsPin::new(&root, 17);

        assert!(matches!(
            pin.set_output(Level::High),
            Err(PinError::NotConfigured(17))
        ));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn missing_gpio_root_is_an_io_error() {
        let mut pin = SysfsPin::new("/nonexistent/stratoschem/gpio", 4);
        assert!(matches!(pin.configure_output(), Err(PinError::Io { pin: 4, .. })));
    }
}
