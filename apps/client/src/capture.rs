//! Capture-device ownership.
//!
//! The turn controller is the single owner of every device handle. Devices
//! stop before each submission and restart when the next question arrives;
//! `CaptureSet` stops everything on drop, so teardown on any exit path
//! releases the hardware.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device failed to start: {0}")]
    StartFailed(String),
}

/// A microphone, camera, or similar handle owned by the turn controller.
pub trait CaptureDevice: Send {
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stops the device. Must be idempotent: it is called on every terminal
    /// path, including drop.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// The full set of devices for a session, started and stopped as a unit.
pub struct CaptureSet {
    devices: Vec<Box<dyn CaptureDevice>>,
}

impl CaptureSet {
    pub fn new(devices: Vec<Box<dyn CaptureDevice>>) -> Self {
        Self { devices }
    }

    /// A set with no devices, for text-only sessions.
    pub fn empty() -> Self {
        Self { devices: vec![] }
    }

    /// Starts every device. If one fails, the ones already started are
    /// stopped again before the error is returned.
    pub fn start_all(&mut self) -> Result<(), CaptureError> {
        for i in 0..self.devices.len() {
            if let Err(e) = self.devices[i].start() {
                for device in &mut self.devices[..=i] {
                    device.stop();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn stop_all(&mut self) {
        for device in &mut self.devices {
            device.stop();
        }
    }

    pub fn any_active(&self) -> bool {
        self.devices.iter().any(|d| d.is_active())
    }
}

impl Drop for CaptureSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub(crate) struct DeviceLog {
        pub starts: usize,
        pub stops: usize,
        pub active: bool,
    }

    pub(crate) struct FakeDevice {
        log: Arc<Mutex<DeviceLog>>,
        fail_start: bool,
    }

    impl FakeDevice {
        pub(crate) fn new(log: Arc<Mutex<DeviceLog>>) -> Self {
            Self {
                log,
                fail_start: false,
            }
        }

        fn failing(log: Arc<Mutex<DeviceLog>>) -> Self {
            Self {
                log,
                fail_start: true,
            }
        }
    }

    impl CaptureDevice for FakeDevice {
        fn start(&mut self) -> Result<(), CaptureError> {
            if self.fail_start {
                return Err(CaptureError::StartFailed("no permission".to_string()));
            }
            let mut log = self.log.lock().unwrap();
            log.starts += 1;
            log.active = true;
            Ok(())
        }

        fn stop(&mut self) {
            let mut log = self.log.lock().unwrap();
            if log.active {
                log.stops += 1;
                log.active = false;
            }
        }

        fn is_active(&self) -> bool {
            self.log.lock().unwrap().active
        }
    }

    #[test]
    fn test_start_all_then_stop_all() {
        let log = Arc::new(Mutex::new(DeviceLog::default()));
        let mut set = CaptureSet::new(vec![Box::new(FakeDevice::new(log.clone()))]);

        set.start_all().unwrap();
        assert!(set.any_active());
        set.stop_all();
        assert!(!set.any_active());
        assert_eq!(log.lock().unwrap().stops, 1);
    }

    #[test]
    fn test_failed_start_rolls_back_started_devices() {
        let mic = Arc::new(Mutex::new(DeviceLog::default()));
        let cam = Arc::new(Mutex::new(DeviceLog::default()));
        let mut set = CaptureSet::new(vec![
            Box::new(FakeDevice::new(mic.clone())),
            Box::new(FakeDevice::failing(cam)),
        ]);

        assert!(set.start_all().is_err());
        assert!(!set.any_active());
        assert_eq!(mic.lock().unwrap().starts, 1);
        assert_eq!(mic.lock().unwrap().stops, 1);
    }

    #[test]
    fn test_drop_releases_devices() {
        let log = Arc::new(Mutex::new(DeviceLog::default()));
        {
            let mut set = CaptureSet::new(vec![Box::new(FakeDevice::new(log.clone()))]);
            set.start_all().unwrap();
        }
        assert!(!log.lock().unwrap().active);
    }
}
