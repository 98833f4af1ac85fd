//! OV2640 camera through the `esp32-camera` component.
//!
//! The vendor driver is a process-wide singleton: [`Esp32Camera::init`]
//! brings it up once, and the returned handle is `Copy`, so each HTTP
//! server can own one without sharing a lock.
//!
//! Frame buffers come from the driver's pool. An [`Esp32Frame`] hands its
//! buffer back with `esp_camera_fb_return` when dropped.

use core::marker::PhantomData;

use esp_idf_svc::sys::camera::{
    camera_config_t, camera_fb_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY, camera_fb_location_t_CAMERA_FB_IN_PSRAM,
    camera_fb_t, esp_camera_fb_get, esp_camera_fb_return, esp_camera_init, esp_camera_sensor_get,
    framesize_t, ledc_channel_t_LEDC_CHANNEL_0, ledc_timer_t_LEDC_TIMER_0, pixformat_t_PIXFORMAT_JPEG,
};
use esp_idf_svc::sys::{esp, EspError};
use thiserror::Error;

use super::pins;
use crate::config::CameraConfig;
use crate::traits::{CameraControl, CameraStatus, FrameSource};

/// Camera driver failure.
#[derive(Debug, Error)]
pub enum CameraError {
    /// `esp_camera_init` or a driver call failed.
    #[error("camera init failed: {0}")]
    Init(#[from] EspError),

    /// The driver initialized but found no sensor.
    #[error("no camera sensor detected")]
    NoSensor,

    /// The sensor returned a non-zero code from a setter.
    #[error("sensor rejected {setting}={value} (code {code})")]
    Rejected {
        /// Setter name, as logged.
        setting: &'static str,
        /// Requested value.
        value: i32,
        /// Driver return code.
        code: i32,
    },

    /// `esp_camera_fb_get` returned null.
    #[error("frame buffer unavailable")]
    NoFrame,
}

/// Handle to the initialized camera driver.
#[derive(Clone, Copy, Debug)]
pub struct Esp32Camera {
    _initialized: (),
}

impl Esp32Camera {
    /// Initialize the driver with JPEG output and the boot settings in
    /// `config`.
    pub fn init(config: &CameraConfig) -> Result<Self, CameraError> {
        let mut cam = camera_config_t::default();

        cam.pin_pwdn = pins::CAM_PWDN;
        cam.pin_reset = pins::CAM_RESET;
        cam.pin_xclk = pins::CAM_XCLK;
        cam.pin_d7 = pins::CAM_Y9;
        cam.pin_d6 = pins::CAM_Y8;
        cam.pin_d5 = pins::CAM_Y7;
        cam.pin_d4 = pins::CAM_Y6;
        cam.pin_d3 = pins::CAM_Y5;
        cam.pin_d2 = pins::CAM_Y4;
        cam.pin_d1 = pins::CAM_Y3;
        cam.pin_d0 = pins::CAM_Y2;
        cam.pin_vsync = pins::CAM_VSYNC;
        cam.pin_href = pins::CAM_HREF;
        cam.pin_pclk = pins::CAM_PCLK;
        cam.__bindgen_anon_1.pin_sccb_sda = pins::CAM_SIOD;
        cam.__bindgen_anon_2.pin_sccb_scl = pins::CAM_SIOC;

        cam.xclk_freq_hz = config.xclk_hz as i32;
        cam.ledc_timer = ledc_timer_t_LEDC_TIMER_0;
        cam.ledc_channel = ledc_channel_t_LEDC_CHANNEL_0;

        cam.pixel_format = pixformat_t_PIXFORMAT_JPEG;
        cam.frame_size = config.frame_size as framesize_t;
        cam.jpeg_quality = config.quality;
        cam.fb_count = usize::from(config.frame_buffers);
        cam.fb_location = camera_fb_location_t_CAMERA_FB_IN_PSRAM;
        cam.grab_mode = camera_fb_grab_mode_t_CAMERA_GRAB_WHEN_EMPTY;

        // SAFETY: `cam` is fully initialized and outlives the call.
        esp!(unsafe { esp_camera_init(&cam) })?;

        log::info!(
            "Camera ready: framesize {}, quality {}, {} frame buffers",
            config.frame_size,
            config.quality,
            config.frame_buffers
        );
        Ok(Self { _initialized: () })
    }

    fn sensor(&self) -> Result<&mut esp_idf_svc::sys::camera::sensor_t, CameraError> {
        // SAFETY: the driver is initialized; the sensor lives as long as it does.
        unsafe { esp_camera_sensor_get().as_mut() }.ok_or(CameraError::NoSensor)
    }
}

impl CameraControl for Esp32Camera {
    type Error = CameraError;

    fn set_frame_size(&mut self, index: i32) -> Result<(), CameraError> {
        let sensor = self.sensor()?;
        // Frame size only applies to JPEG output
        if sensor.pixformat != pixformat_t_PIXFORMAT_JPEG {
            log::warn!("framesize ignored: sensor is not in JPEG mode");
            return Ok(());
        }
        let setter = sensor.set_framesize;
        let code = match setter {
            // SAFETY: driver-provided callback invoked on its own sensor.
            Some(set) => unsafe { set(sensor, index as framesize_t) },
            None => -1,
        };
        check("framesize", index, code)
    }

    fn set_quality(&mut self, quality: i32) -> Result<(), CameraError> {
        let sensor = self.sensor()?;
        let setter = sensor.set_quality;
        let code = match setter {
            // SAFETY: driver-provided callback invoked on its own sensor.
            Some(set) => unsafe { set(sensor, quality) },
            None => -1,
        };
        check("quality", quality, code)
    }

    fn status(&self) -> CameraStatus {
        match self.sensor() {
            Ok(sensor) => CameraStatus {
                framesize: sensor.status.framesize as i32,
                quality: i32::from(sensor.status.quality),
            },
            Err(_) => CameraStatus::default(),
        }
    }
}

fn check(setting: &'static str, value: i32, code: i32) -> Result<(), CameraError> {
    if code == 0 {
        Ok(())
    } else {
        Err(CameraError::Rejected {
            setting,
            value,
            code,
        })
    }
}

/// A JPEG frame buffer on loan from the driver.
pub struct Esp32Frame<'a> {
    fb: *mut camera_fb_t,
    _camera: PhantomData<&'a mut Esp32Camera>,
}

impl AsRef<[u8]> for Esp32Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: `fb` is non-null and owned by us until drop. The struct
        // is packed in some driver versions, so read the fields unaligned.
        unsafe {
            let buf = core::ptr::addr_of!((*self.fb).buf).read_unaligned();
            let len = core::ptr::addr_of!((*self.fb).len).read_unaligned();
            core::slice::from_raw_parts(buf, len)
        }
    }
}

impl Drop for Esp32Frame<'_> {
    fn drop(&mut self) {
        // SAFETY: returned exactly once, after the last borrow of its data.
        unsafe { esp_camera_fb_return(self.fb) };
    }
}

impl FrameSource for Esp32Camera {
    type Error = CameraError;
    type Frame<'a> = Esp32Frame<'a>;

    fn capture(&mut self) -> Result<Esp32Frame<'_>, CameraError> {
        // SAFETY: the driver is initialized by `init`.
        let fb = unsafe { esp_camera_fb_get() };
        if fb.is_null() {
            return Err(CameraError::NoFrame);
        }
        Ok(Esp32Frame {
            fb,
            _camera: PhantomData,
        })
    }
}
