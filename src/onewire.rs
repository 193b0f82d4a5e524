//! 1-Wire temperature probes through the kernel's sysfs interface.
//!
//! The w1 bus driver enumerates every slave as a directory under
//! `/sys/bus/w1/devices`, named `<family>-<serial>`. Reading a probe's
//! `w1_slave` file triggers a conversion and yields two lines: the raw
//! scratchpad with the bus CRC verdict, then the temperature in
//! millidegrees Celsius.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::string::{String, ToString};
use std::vec::Vec;

/// Where the w1 bus driver lists its slaves.
pub const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";

const SLAVE_FILE: &str = "w1_slave";

/// Possible errors from reading a single probe.
#[derive(Debug)]
pub enum ProbeError {
    /// Reading the device file failed.
    Io(io::Error),
    /// The device file did not have the expected two-line shape.
    Malformed,
    /// The probe answered but the bus CRC check rejected the data.
    CrcFailed,
}

impl From<io::Error> for ProbeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "reading device file failed: {e}"),
            Self::Malformed => write!(f, "unexpected device file format"),
            Self::CrcFailed => write!(f, "bus CRC check failed"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Scanner for the 1-Wire temperature probes on a bus.
pub struct OneWireScanner {
    base: PathBuf,
    devices: Vec<PathBuf>,
}

impl OneWireScanner {
    /// Scanner over the standard sysfs location.
    pub fn new() -> Self {
        Self::with_base(W1_DEVICES_DIR)
    }

    /// Scanner over an alternative device tree.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        OneWireScanner {
            base: base.into(),
            devices: Vec::new(),
        }
    }

    /// Re-enumerates probe directories and returns how many were found.
    ///
    /// Slave directories are named after their decimal family code; bus
    /// master entries do not start with a digit and are skipped.
    pub fn scan(&mut self) -> io::Result<usize> {
        self.devices.clear();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            let path = entry.path();
            let named_like_a_slave = entry
                .file_name()
                .to_string_lossy()
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());
            if named_like_a_slave && path.is_dir() {
                self.devices.push(path);
            }
        }
        self.devices.sort();
        Ok(self.devices.len())
    }

    /// The probe directories found by the last [`scan`](Self::scan).
    pub fn devices(&self) -> &[PathBuf] {
        &self.devices
    }

    /// Reads every scanned probe, keyed by its id.
    ///
    /// Each probe gets its own result; one failing conversion does not
    /// spoil the rest. Reading blocks per probe while the conversion runs
    /// (~750 ms for a DS18B20 at full resolution).
    pub fn read_all(&self) -> BTreeMap<String, Result<f32, ProbeError>> {
        let mut readings = BTreeMap::new();
        for dir in &self.devices {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            readings.insert(probe_id(&name), read_probe(&dir.join(SLAVE_FILE)));
        }
        readings
    }
}

impl Default for OneWireScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and parses one `w1_slave` file into degrees Celsius.
pub fn read_probe(path: &Path) -> Result<f32, ProbeError> {
    parse_slave_file(&fs::read_to_string(path)?)
}

/// Parses the two-line `w1_slave` format:
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
fn parse_slave_file(content: &str) -> Result<f32, ProbeError> {
    let mut lines = content.lines();
    let crc_line = lines.next().ok_or(ProbeError::Malformed)?;
    let data_line = lines.next().ok_or(ProbeError::Malformed)?;

    if !crc_line.trim_end().ends_with("YES") {
        return Err(ProbeError::CrcFailed);
    }

    let (_, field) = data_line.split_once("t=").ok_or(ProbeError::Malformed)?;
    let millidegrees: f32 = field.trim().parse().map_err(|_| ProbeError::Malformed)?;
    // Probes resolve to 1/16 degree; round to tenths.
    Ok((millidegrees / 100.0).round() / 10.0)
}

/// Probe id: the directory name with the family-code prefix and the
/// serial's leading zeros stripped, `28-00000a2b3c4d` -> `a2b3c4d`.
fn probe_id(dir_name: &str) -> String {
    let serial = dir_name.split_once('-').map_or(dir_name, |(_, s)| s);
    let trimmed = serial.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }.to_string()
}
