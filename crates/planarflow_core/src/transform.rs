//! Conversions between data units and pixel units along a single axis.
//!
//! Every function takes the pixel extent `size` of the axis and its data extent
//! `[min, max]`. Callers guarantee `max > min` and `size > 0`; see
//! [`Viewport::validate`](crate::settings::Viewport::validate).

use crate::traits::Scalar;

/// Absolute data coordinate to absolute pixel coordinate, origin at `min`.
pub fn to_pixel<T: Scalar>(value: T, size: T, min: T, max: T) -> T {
    (value - min) * size / (max - min)
}

/// Data-space length to pixel length.
pub fn to_pixel_delta<T: Scalar>(value: T, size: T, min: T, max: T) -> T {
    value * size / (max - min)
}

/// Inverse of [`to_pixel`].
pub fn from_pixel<T: Scalar>(pixel: T, size: T, min: T, max: T) -> T {
    min + pixel * (max - min) / size
}

/// Inverse of [`to_pixel_delta`].
pub fn from_pixel_delta<T: Scalar>(pixel: T, size: T, min: T, max: T) -> T {
    pixel * (max - min) / size
}

/// One axis of a viewport: a data extent paired with its pixel extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
    pub size: f64,
}

impl AxisScale {
    pub fn new(min: f64, max: f64, size: f64) -> Self {
        Self { min, max, size }
    }

    pub fn to_pixel(&self, value: f64) -> f64 {
        to_pixel(value, self.size, self.min, self.max)
    }

    pub fn to_pixel_delta(&self, value: f64) -> f64 {
        to_pixel_delta(value, self.size, self.min, self.max)
    }

    pub fn from_pixel(&self, pixel: f64) -> f64 {
        from_pixel(pixel, self.size, self.min, self.max)
    }

    pub fn from_pixel_delta(&self, pixel: f64) -> f64 {
        from_pixel_delta(pixel, self.size, self.min, self.max)
    }
}
